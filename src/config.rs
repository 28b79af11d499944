use crate::error::CrawlError;
use std::time::Duration;

pub const SEARCH_URL: &str = "https://mystique-v1-submarino.b2w.io/mystique/search";
pub const PRODUCT_URL: &str =
    "https://pdgnamedquery-v1-submarino.b2w.io/run-pdg/product-without-promotion/revision/8";

pub const DEFAULT_WORKERS: usize = 25;
pub const DEFAULT_MAX_OFFSET: u32 = 480;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

const PAGE_QUEUE_CAPACITY: usize = 10;
const PRODUCT_QUEUE_CAPACITY: usize = 10;
const JOB_QUEUE_CAPACITY: usize = 30;
const RESULT_CAPACITY: usize = 50;

/// Tunables for a single crawl run.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub search_url: String,
    pub product_url: String,
    pub workers: usize,
    /// Deepest listing offset the crawler will request.
    pub max_offset: u32,
    pub request_timeout: Duration,
    pub page_queue_capacity: usize,
    pub product_queue_capacity: usize,
    pub job_queue_capacity: usize,
    pub result_capacity: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            search_url: SEARCH_URL.to_string(),
            product_url: PRODUCT_URL.to_string(),
            workers: DEFAULT_WORKERS,
            max_offset: DEFAULT_MAX_OFFSET,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_queue_capacity: PAGE_QUEUE_CAPACITY,
            product_queue_capacity: PRODUCT_QUEUE_CAPACITY,
            job_queue_capacity: JOB_QUEUE_CAPACITY,
            result_capacity: RESULT_CAPACITY,
        }
    }
}

impl CrawlerConfig {
    /// Rejects settings that would panic the runtime or stall the pipeline
    /// before it ever starts (bounded channels cannot have zero capacity).
    pub fn validate(&self) -> Result<(), CrawlError> {
        // One worker is always kept free of page jobs, see ShutdownCoordinator.
        if self.workers < 2 {
            return Err(CrawlError::Configuration(
                "worker count must be at least 2".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(CrawlError::Configuration(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        let capacities = [
            ("page queue", self.page_queue_capacity),
            ("product queue", self.product_queue_capacity),
            ("job queue", self.job_queue_capacity),
            ("result stream", self.result_capacity),
        ];
        if let Some((name, _)) = capacities.iter().find(|(_, cap)| *cap == 0) {
            return Err(CrawlError::Configuration(format!(
                "{} capacity must be at least 1",
                name
            )));
        }

        for url in [&self.search_url, &self.product_url] {
            url::Url::parse(url).map_err(|source| CrawlError::Url {
                url: url.clone(),
                source,
            })?;
        }

        Ok(())
    }
}

/// Validates a category supplied on the command line.
pub fn parse_category(raw: Option<i64>) -> Result<u64, CrawlError> {
    match raw {
        Some(category) if category > 0 => Ok(category as u64),
        Some(category) => Err(CrawlError::Configuration(format!(
            "category must be a positive integer, got {}",
            category
        ))),
        None => Err(CrawlError::Configuration(
            "please inform the category (-c <id>)".to_string(),
        )),
    }
}
