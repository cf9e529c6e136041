//! Output module for crawl records and run statistics
//!
//! This module handles:
//! - The record sink the crawler streams rows into
//! - CSV output with a fixed header
//! - Recording and printing crawl statistics

mod csv;
pub mod stats;
mod traits;

pub use self::csv::{write_row, CsvSink};
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{OutputError, OutputResult, RecordSink};

#[cfg(test)]
pub(crate) use traits::MemorySink;
