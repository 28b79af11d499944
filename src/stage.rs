//! Handlers for the two kinds of fetch task.

use crate::catalog::{self, ListingPage, ProductRecord};
use crate::error::CrawlError;
use crate::http_client::Transport;
use crate::stats::CrawlStats;
use crate::task::{FetchTask, Job, PageTask, ProductTask};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub struct Stages {
    transport: Arc<dyn Transport>,
    product_url: String,
    stats: Arc<CrawlStats>,
}

impl Stages {
    pub fn new(transport: Arc<dyn Transport>, product_url: String, stats: Arc<CrawlStats>) -> Self {
        Self {
            transport,
            product_url,
            stats,
        }
    }

    /// Runs one job to completion. Failures are logged and the task dropped;
    /// the phase guard is released whatever the outcome.
    pub async fn execute(&self, job: Job) {
        let Job { task, guard, slot } = job;
        let phase = guard.phase();
        let url = task.url().to_string();

        let outcome = match task {
            FetchTask::Page { task, products } => {
                let result = self.page(task, products).await;
                let counter = if result.is_ok() {
                    &self.stats.pages_fetched
                } else {
                    &self.stats.pages_failed
                };
                counter.fetch_add(1, Ordering::Relaxed);
                result.map(|found| debug!(url = %url, found, "page done"))
            }
            FetchTask::Product { task, results } => {
                let result = self.product(task, results).await;
                let counter = if result.is_ok() {
                    &self.stats.products_fetched
                } else {
                    &self.stats.products_failed
                };
                counter.fetch_add(1, Ordering::Relaxed);
                result
            }
        };

        if let Err(e) = outcome {
            warn!(phase = %phase, error = %e, "dropping task");
        }
        drop(slot);
        drop(guard);
    }

    pub async fn fetch_listing(&self, url: &str) -> Result<ListingPage, CrawlError> {
        let body = self
            .transport
            .fetch(url)
            .await
            .map_err(|e| CrawlError::network(url, e))?;
        catalog::parse_listing(&body, url)
    }

    /// Pushes one product task per id, waiting whenever the queue is full.
    /// Returns how many were enqueued.
    pub async fn enqueue_products(
        &self,
        ids: &[u64],
        products: &mpsc::Sender<ProductTask>,
    ) -> usize {
        let mut enqueued = 0;
        for &id in ids {
            let url = match catalog::product_url(&self.product_url, id) {
                Ok(url) => url,
                Err(e) => {
                    warn!(id, error = %e, "skipping product");
                    continue;
                }
            };
            if products.send(ProductTask { url, id }).await.is_err() {
                warn!(id, "product queue closed while enqueueing");
                break;
            }
            enqueued += 1;
        }
        self.stats
            .products_enqueued
            .fetch_add(enqueued, Ordering::Relaxed);
        enqueued
    }

    async fn page(
        &self,
        task: PageTask,
        products: mpsc::Sender<ProductTask>,
    ) -> Result<usize, CrawlError> {
        let page = self.fetch_listing(&task.url).await?;
        debug!(offset = task.offset, ids = page.product_ids.len(), "listing page decoded");
        Ok(self.enqueue_products(&page.product_ids, &products).await)
    }

    async fn product(
        &self,
        task: ProductTask,
        results: mpsc::Sender<ProductRecord>,
    ) -> Result<(), CrawlError> {
        let body = self
            .transport
            .fetch(&task.url)
            .await
            .map_err(|e| CrawlError::network(&task.url, e))?;
        let record = catalog::parse_product(&body, &task.url)?;

        if results.send(record).await.is_err() {
            debug!(id = task.id, "result stream dropped by consumer");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::phase::{Phase, PhaseTracker};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct Fixed(HashMap<String, String>);

    #[async_trait]
    impl Transport for Fixed {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.0.get(url).cloned().ok_or(FetchError::HttpError(404))
        }
    }

    fn stages(routes: &[(&str, &str)]) -> (Stages, Arc<CrawlStats>) {
        let map = routes
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let stats = Arc::new(CrawlStats::new());
        let stages = Stages::new(
            Arc::new(Fixed(map)),
            "https://catalog.test/product".to_string(),
            stats.clone(),
        );
        (stages, stats)
    }

    #[tokio::test]
    async fn page_job_enqueues_every_id() {
        let (stages, stats) = stages(&[(
            "page",
            r#"{"_result":{"limit":2,"offset":2,"total":4},"products":[{"id":3},{"id":4}]}"#,
        )]);
        let tracker = PhaseTracker::new(Phase::Page);
        let (tx, mut rx) = mpsc::channel(10);

        stages
            .execute(Job {
                task: FetchTask::Page {
                    task: PageTask {
                        url: "page".to_string(),
                        offset: 2,
                    },
                    products: tx,
                },
                guard: tracker.enter(),
                slot: None,
            })
            .await;

        assert!(tracker.is_idle());
        let ids: Vec<u64> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![3, 4]);
        assert_eq!(stats.pages_fetched.load(Ordering::Relaxed), 1);
        assert_eq!(stats.products_enqueued.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn failed_product_is_dropped_and_released() {
        let (stages, stats) = stages(&[]);
        let tracker = PhaseTracker::new(Phase::Product);
        let (tx, mut rx) = mpsc::channel(1);

        stages
            .execute(Job {
                task: FetchTask::Product {
                    task: ProductTask {
                        url: "missing".to_string(),
                        id: 1,
                    },
                    results: tx,
                },
                guard: tracker.enter(),
                slot: None,
            })
            .await;

        assert!(tracker.is_idle());
        assert_eq!(stats.products_failed.load(Ordering::Relaxed), 1);
        // The task owned the only sender, so the stream is closed and empty.
        assert!(rx.recv().await.is_none());
    }
}
