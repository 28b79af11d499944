use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use subcrawl::config::{self, CrawlerConfig};
use subcrawl::logging;
use subcrawl::report::Reporter;
use subcrawl::{Crawler, HttpClient};

#[derive(Parser, Debug)]
#[command(author, version, about = "Prints price and name of every product in a catalog category")]
struct Args {
    /// Category id to crawl
    #[arg(short, long)]
    category: Option<i64>,

    /// Number of concurrent fetches
    #[arg(long, default_value_t = config::DEFAULT_WORKERS)]
    workers: usize,

    /// Deepest listing offset to request
    #[arg(long, default_value_t = config::DEFAULT_MAX_OFFSET)]
    max_offset: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Listing endpoint
    #[arg(long, default_value = config::SEARCH_URL)]
    search_url: String,

    /// Product detail endpoint
    #[arg(long, default_value = config::PRODUCT_URL)]
    product_url: String,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let category = match config::parse_category(args.category) {
        Ok(category) => category,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", Args::command().render_usage());
            return Ok(());
        }
    };

    let config = CrawlerConfig {
        search_url: args.search_url,
        product_url: args.product_url,
        workers: args.workers,
        max_offset: args.max_offset,
        request_timeout: Duration::from_secs(args.timeout_secs),
        ..CrawlerConfig::default()
    };

    let http_client =
        HttpClient::new(config.request_timeout).context("Failed to create HTTP client")?;
    let crawler = Crawler::new(config, Arc::new(http_client))?;

    let mut handle = crawler
        .start(category)
        .await
        .context("could not fetch the first page")?;

    let mut reporter = Reporter::new(io::stdout());
    while let Some(record) = handle.next().await {
        reporter.record(&record).context("Failed to write result")?;
    }

    let summary = handle.finish().await;
    reporter.summary(&summary).context("Failed to write summary")?;

    Ok(())
}
