use crate::catalog::ProductRecord;
use crate::stats::CrawlSummary;
use std::io::{self, Write};

/// `<price with 2 decimals>;<name>`
pub fn format_record(record: &ProductRecord) -> String {
    format!("{:.2};{}", record.price, record.name)
}

pub fn format_summary(summary: &CrawlSummary) -> String {
    format!(
        "Done: {} products after {:?}",
        summary.items, summary.elapsed
    )
}

/// Line writer for finished records. Every line is flushed as soon as it is
/// written so results show up while the crawl is still running.
pub struct Reporter<W: Write> {
    writer: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn record(&mut self, record: &ProductRecord) -> io::Result<()> {
        writeln!(self.writer, "{}", format_record(record))?;
        self.writer.flush()
    }

    pub fn summary(&mut self, summary: &CrawlSummary) -> io::Result<()> {
        writeln!(self.writer, "{}", format_summary(summary))?;
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
