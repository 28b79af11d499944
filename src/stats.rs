use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct CrawlStats {
    pub pages_fetched: AtomicUsize,
    pub pages_failed: AtomicUsize,
    pub products_fetched: AtomicUsize,
    pub products_failed: AtomicUsize,
    pub products_enqueued: AtomicUsize,
    pub start_time: Instant,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            pages_fetched: AtomicUsize::new(0),
            pages_failed: AtomicUsize::new(0),
            products_fetched: AtomicUsize::new(0),
            products_failed: AtomicUsize::new(0),
            products_enqueued: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Freezes the counters; `items` is the number of records handed to the
    /// consumer.
    pub fn snapshot(&self, items: usize) -> CrawlSummary {
        CrawlSummary {
            items,
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            pages_failed: self.pages_failed.load(Ordering::Relaxed),
            products_fetched: self.products_fetched.load(Ordering::Relaxed),
            products_failed: self.products_failed.load(Ordering::Relaxed),
            products_enqueued: self.products_enqueued.load(Ordering::Relaxed),
            elapsed: self.start_time.elapsed(),
        }
    }
}

/// Counters of a finished (or finishing) run.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSummary {
    pub items: usize,
    /// Listing pages fetched, the first page included.
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub products_fetched: usize,
    pub products_failed: usize,
    pub products_enqueued: usize,
    pub elapsed: Duration,
}
