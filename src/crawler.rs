//! Pipeline entry point: bootstrap from the first listing page, then wire the
//! queues, the worker pool and the shutdown coordinator together.

use crate::catalog::{self, ProductRecord};
use crate::config::CrawlerConfig;
use crate::error::CrawlError;
use crate::http_client::Transport;
use crate::phase::PhaseGuard;
use crate::planner;
use crate::pool;
use crate::shutdown::{CrawlState, ShutdownCoordinator};
use crate::stage::Stages;
use crate::stats::{CrawlStats, CrawlSummary};
use crate::task::{PageTask, ProductTask};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

pub struct Crawler {
    config: CrawlerConfig,
    transport: Arc<dyn Transport>,
}

impl Crawler {
    pub fn new(config: CrawlerConfig, transport: Arc<dyn Transport>) -> Result<Self, CrawlError> {
        config.validate()?;
        Ok(Self { config, transport })
    }

    /// Fetches the first listing page of `category` and starts the pipeline.
    ///
    /// Any failure on the first page is returned before a single task is
    /// spawned. Once this returns, records are read from the handle as they
    /// complete.
    pub async fn start(&self, category: u64) -> Result<CrawlHandle, CrawlError> {
        let config = &self.config;
        let stats = Arc::new(CrawlStats::new());
        let coordinator = ShutdownCoordinator::new(config.workers);
        let stages = Arc::new(Stages::new(
            self.transport.clone(),
            config.product_url.clone(),
            stats.clone(),
        ));

        let first_url = catalog::search_url(&config.search_url, category, 0)?;
        info!(category, url = %first_url, "fetching first page");
        let first = stages.fetch_listing(&first_url).await?;
        stats.pages_fetched.fetch_add(1, Ordering::Relaxed);

        let offsets = planner::plan(&first.pagination, config.max_offset);
        info!(
            limit = first.pagination.limit,
            total = first.pagination.total,
            first_page_products = first.product_ids.len(),
            pages = offsets.len(),
            "planned pagination"
        );
        let page_tasks = offsets
            .into_iter()
            .map(|offset| {
                catalog::search_url(&config.search_url, category, offset)
                    .map(|url| PageTask { url, offset })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (page_tx, page_rx) = mpsc::channel(config.page_queue_capacity);
        let (product_tx, product_rx) = mpsc::channel(config.product_queue_capacity);
        let (job_tx, job_rx) = mpsc::channel(config.job_queue_capacity);
        let (result_tx, result_rx) = mpsc::channel(config.result_capacity);

        // Entered before anything is spawned so the page phase cannot look
        // idle while seeds are still pending.
        let seed_guard = coordinator.enter_page_phase();
        coordinator.advance(CrawlState::Seeding);

        let tasks = vec![
            tokio::spawn(pool::run(job_rx, config.workers, stages.clone())),
            tokio::spawn(
                coordinator
                    .clone()
                    .drive_products(product_rx, job_tx.clone(), result_tx),
            ),
            tokio::spawn(coordinator.clone().drive_pages(page_rx, job_tx, product_tx.clone())),
            tokio::spawn(seed(
                coordinator.clone(),
                stages,
                first.product_ids,
                seed_guard,
                product_tx,
                page_tasks,
                page_tx,
            )),
        ];

        Ok(CrawlHandle {
            results: result_rx,
            coordinator,
            stats,
            tasks,
            received: 0,
        })
    }
}

/// Enqueues the first page's products and the planned listing pages, then
/// closes the page queue.
async fn seed(
    coordinator: ShutdownCoordinator,
    stages: Arc<Stages>,
    product_ids: Vec<u64>,
    guard: PhaseGuard,
    products: mpsc::Sender<ProductTask>,
    page_tasks: Vec<PageTask>,
    pages: mpsc::Sender<PageTask>,
) {
    let seed_products = async move {
        let seeded = stages.enqueue_products(&product_ids, &products).await;
        drop(products);
        drop(guard);
        info!(seeded, "first page products enqueued");
    };

    let seed_pages = async move {
        for task in page_tasks {
            if pages.send(task).await.is_err() {
                break;
            }
        }
        drop(pages);
        coordinator.advance(CrawlState::Paginating);
    };

    tokio::join!(seed_products, seed_pages);
}

/// A running crawl. Records arrive in completion order.
pub struct CrawlHandle {
    results: mpsc::Receiver<ProductRecord>,
    coordinator: ShutdownCoordinator,
    stats: Arc<CrawlStats>,
    tasks: Vec<JoinHandle<()>>,
    received: usize,
}

impl CrawlHandle {
    /// Next finished record, or `None` once the result stream is closed.
    pub async fn next(&mut self) -> Option<ProductRecord> {
        let record = self.results.recv().await?;
        self.received += 1;
        Some(record)
    }

    pub fn subscribe(&self) -> watch::Receiver<CrawlState> {
        self.coordinator.subscribe()
    }

    /// Drains whatever the caller has not read (those records are counted
    /// but discarded), waits for every pipeline task and reports the run.
    pub async fn finish(mut self) -> CrawlSummary {
        while self.next().await.is_some() {}

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                error!("pipeline task failed: {}", e);
            }
        }
        self.coordinator.advance(CrawlState::Finished);

        let summary = self.stats.snapshot(self.received);
        info!(
            items = summary.items,
            pages_failed = summary.pages_failed,
            products_failed = summary.products_failed,
            elapsed = ?summary.elapsed,
            "crawl finished"
        );
        summary
    }
}
