//! Queue closure ordering.
//!
//! Two forwarders move tasks from the stage queues onto the shared job queue.
//! Each one enters a task into its phase before the task reaches the job
//! queue, so once a forwarder's source is closed and drained, an idle phase
//! means no task of that phase exists anywhere. Only then is the next queue
//! closed:
//!
//! 1. page queue drained and page phase idle: close the product queue;
//! 2. product queue drained and product phase idle: close the job queue and
//!    the result stream.
//!
//! Closing means dropping the coordinator's sender. Every in-flight task owns
//! its own clone of the queue it writes to, so a channel cannot disconnect
//! while a task that could still write to it is alive.
//!
//! Page jobs block their worker while the product queue is full, and the
//! product queue only drains through the job queue. At most `workers - 1`
//! page jobs exist at any time, so one worker is always left to run product
//! jobs and the two phases cannot wedge each other.

use crate::catalog::ProductRecord;
use crate::phase::{Phase, PhaseGuard, PhaseTracker};
use crate::task::{FetchTask, Job, PageTask, ProductTask};
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc, watch};
use tracing::{debug, info, warn};

/// Where a run is in its bootstrap/shutdown protocol. Only ever advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CrawlState {
    Bootstrapping,
    Seeding,
    Paginating,
    ProductDraining,
    Finished,
}

#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    page_phase: PhaseTracker,
    product_phase: PhaseTracker,
    page_slots: Arc<Semaphore>,
    state: watch::Sender<CrawlState>,
}

impl ShutdownCoordinator {
    pub fn new(workers: usize) -> Self {
        let (state, _) = watch::channel(CrawlState::Bootstrapping);
        Self {
            page_phase: PhaseTracker::new(Phase::Page),
            product_phase: PhaseTracker::new(Phase::Product),
            page_slots: Arc::new(Semaphore::new(workers.saturating_sub(1).max(1))),
            state,
        }
    }

    pub fn page_phase(&self) -> &PhaseTracker {
        &self.page_phase
    }

    pub fn product_phase(&self) -> &PhaseTracker {
        &self.product_phase
    }

    /// Registers page-phase work done outside the job queue (seeding the
    /// first page's products).
    pub fn enter_page_phase(&self) -> PhaseGuard {
        self.page_phase.enter()
    }

    pub fn subscribe(&self) -> watch::Receiver<CrawlState> {
        self.state.subscribe()
    }

    /// Moves the run forward; stale transitions racing a later one are ignored.
    pub fn advance(&self, next: CrawlState) {
        let advanced = self.state.send_if_modified(|current| {
            if next > *current {
                *current = next;
                true
            } else {
                false
            }
        });
        if advanced {
            info!(state = ?next, "crawl state changed");
        }
    }

    /// Feeds page tasks into the job queue, then closes the product queue once
    /// no page work is left.
    pub async fn drive_pages(
        self,
        mut pages: mpsc::Receiver<PageTask>,
        jobs: mpsc::Sender<Job>,
        products: mpsc::Sender<ProductTask>,
    ) {
        while let Some(task) = pages.recv().await {
            let slot = match self.page_slots.clone().acquire_owned().await {
                Ok(slot) => slot,
                Err(_) => {
                    warn!("page slots closed before page queue drained");
                    break;
                }
            };
            let guard = self.page_phase.enter();
            let job = Job {
                task: FetchTask::Page {
                    task,
                    products: products.clone(),
                },
                guard,
                slot: Some(slot),
            };
            if jobs.send(job).await.is_err() {
                warn!("job queue closed before page queue drained");
                break;
            }
        }
        drop(jobs);
        debug!("page queue drained");

        self.page_phase.wait_idle().await;
        drop(products);
        info!("page phase complete, product queue closed");
        self.advance(CrawlState::ProductDraining);
    }

    /// Feeds product tasks into the job queue, then closes the job queue and
    /// the result stream once no product work is left.
    pub async fn drive_products(
        self,
        mut products: mpsc::Receiver<ProductTask>,
        jobs: mpsc::Sender<Job>,
        results: mpsc::Sender<ProductRecord>,
    ) {
        while let Some(task) = products.recv().await {
            let guard = self.product_phase.enter();
            let job = Job {
                task: FetchTask::Product {
                    task,
                    results: results.clone(),
                },
                guard,
                slot: None,
            };
            if jobs.send(job).await.is_err() {
                warn!("job queue closed before product queue drained");
                break;
            }
        }
        debug!("product queue drained");

        self.product_phase.wait_idle().await;
        drop(jobs);
        drop(results);
        info!("product phase complete, job queue and result stream closed");
    }
}
