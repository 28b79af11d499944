pub mod catalog;
pub mod config;
pub mod crawler;
pub mod error;
pub mod http_client;
pub mod logging;
pub mod phase;
pub mod planner;
pub mod pool;
pub mod report;
pub mod shutdown;
pub mod stage;
pub mod stats;
pub mod task;

pub use catalog::{PaginationMetadata, ProductRecord};
pub use config::CrawlerConfig;
pub use crawler::{CrawlHandle, Crawler};
pub use error::{CrawlError, FetchError};
pub use http_client::{HttpClient, Transport};
pub use shutdown::CrawlState;
pub use stats::CrawlSummary;
