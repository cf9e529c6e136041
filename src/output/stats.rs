//! Crawl statistics
//!
//! Counters accumulated by the coordinator during one run and printed when
//! the run ends.

use chrono::{DateTime, Utc};

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Letters whose listing was attempted
    pub letters_attempted: u32,

    /// Letters whose listing could not be loaded or read
    pub letters_failed: Vec<char>,

    /// Letters whose listing loaded with no members on it
    pub letters_empty: Vec<char>,

    /// Listing pages rendered, across all letters
    pub pages_visited: u64,

    /// Detail links found on listing pages
    pub links_found: u64,

    /// Detail links given up on
    pub detail_failures: u64,

    /// Organizations successfully extracted
    pub organizations: u64,

    /// Rows handed to the sink
    pub rows_written: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CrawlStatistics {
    /// Starts a fresh set of counters, stamped now
    pub fn start() -> Self {
        Self {
            letters_attempted: 0,
            letters_failed: Vec::new(),
            letters_empty: Vec::new(),
            pages_visited: 0,
            links_found: 0,
            detail_failures: 0,
            organizations: 0,
            rows_written: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Stamps the end of the run
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Whole seconds between start and finish, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Share of detail links that produced records, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.links_found == 0 {
            return 0.0;
        }
        (self.organizations as f64 / self.links_found as f64) * 100.0
    }
}

impl Default for CrawlStatistics {
    fn default() -> Self {
        Self::start()
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Run:");
    println!("  Started: {}", stats.started_at.to_rfc3339());
    match (&stats.finished_at, stats.duration_seconds()) {
        (Some(finished), Some(seconds)) => {
            println!("  Finished: {} ({}s)", finished.to_rfc3339(), seconds)
        }
        _ => println!("  Finished: -"),
    }
    println!();

    println!("Listings:");
    println!("  Letters attempted: {}", stats.letters_attempted);
    if stats.letters_failed.is_empty() {
        println!("  Letters failed: 0");
    } else {
        let failed: String = stats.letters_failed.iter().collect();
        println!(
            "  Letters failed: {} ({})",
            stats.letters_failed.len(),
            failed
        );
    }
    if !stats.letters_empty.is_empty() {
        let empty: String = stats.letters_empty.iter().collect();
        println!("  Letters without members: {} ({})", stats.letters_empty.len(), empty);
    }
    println!("  Pages visited: {}", stats.pages_visited);
    println!();

    println!("Details:");
    println!("  Links found: {}", stats.links_found);
    println!("  Organizations extracted: {}", stats.organizations);
    println!("  Fetches failed: {}", stats.detail_failures);
    println!("  Rows written: {}", stats.rows_written);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} detail pages extracted)",
        stats.success_rate(),
        stats.organizations,
        stats.links_found
    );
}
