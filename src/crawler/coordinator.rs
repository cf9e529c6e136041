//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the alphabet-driven outer loop that coordinates a
//! whole run:
//! - Opening one listing session per letter
//! - Handing each detail link to the fetcher, one at a time
//! - Streaming the resulting records into the sink
//! - Advancing the listing until it is exhausted
//!
//! Only the engine, the sink and the statistics are mutable here, and they
//! are owned by the coordinator. Detail fetches run strictly one after the
//! other against the same engine.

use super::detail::DetailFetcher;
use super::pagination::{listing_url, ListingSession, ListingSettings};
use crate::browser::{BrowserEngine, HttpEngine};
use crate::config::Config;
use crate::output::{CrawlStatistics, CsvSink, RecordSink};
use crate::state::ListingState;
use crate::DirectoryError;
use std::fs::File;
use std::io::BufWriter;

/// How one letter ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LetterOutcome {
    Crawled,
    Empty,
    Failed,
}

/// Main crawler coordinator structure
pub struct Coordinator<E: BrowserEngine, S: RecordSink> {
    config: Config,
    engine: E,
    sink: S,
    detail: DetailFetcher,
    listing: ListingSettings,
    stats: CrawlStatistics,
}

impl Coordinator<HttpEngine, CsvSink<BufWriter<File>>> {
    /// Creates a coordinator crawling over HTTP into the configured CSV file
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Engine built and output file created
    /// * `Err(DirectoryError)` - Failed to build the engine or create the file
    pub fn new(config: Config) -> Result<Self, DirectoryError> {
        let engine = HttpEngine::from_config(&config)?;
        let sink = CsvSink::create(&config.output.csv_path)?;
        tracing::info!("Writing rows to {}", config.output.csv_path);
        Ok(Self::with_parts(config, engine, sink))
    }
}

impl<E: BrowserEngine, S: RecordSink> Coordinator<E, S> {
    /// Creates a coordinator around an existing engine and sink
    pub fn with_parts(config: Config, engine: E, sink: S) -> Self {
        Self {
            detail: DetailFetcher::from_config(&config),
            listing: ListingSettings::from_config(&config),
            stats: CrawlStatistics::start(),
            config,
            engine,
            sink,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn stats(&self) -> &CrawlStatistics {
        &self.stats
    }

    /// Gives the sink back, e.g. to inspect what was written
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Runs the main crawl loop
    ///
    /// Every configured letter is attempted. A letter whose listing cannot be
    /// loaded is logged and skipped; only a sink that stops accepting rows
    /// ends the run early.
    pub async fn run(&mut self) -> Result<CrawlStatistics, DirectoryError> {
        let letters = self.config.crawler.letter_list();
        tracing::info!(
            "Starting crawl of {} letter(s): {}",
            letters.len(),
            self.config.crawler.letters
        );

        self.stats = CrawlStatistics::start();
        for letter in letters {
            tracing::info!("==== Processing letter {} ====", letter);
            self.stats.letters_attempted += 1;

            match self.crawl_letter(letter).await {
                Ok(LetterOutcome::Crawled) => {}
                Ok(LetterOutcome::Empty) => self.stats.letters_empty.push(letter),
                Ok(LetterOutcome::Failed) => self.stats.letters_failed.push(letter),
                Err(e) => {
                    tracing::error!("Stopping crawl at letter {}: {}", letter, e);
                    self.stats.finish();
                    return Err(e);
                }
            }
        }

        self.sink.finish()?;
        self.stats.finish();

        tracing::info!(
            "Crawl completed: {} row(s) from {} organization(s) in {}s",
            self.stats.rows_written,
            self.stats.organizations,
            self.stats.duration_seconds().unwrap_or_default()
        );

        Ok(self.stats.clone())
    }

    /// Crawls one letter
    ///
    /// A listing that fails is not fatal; `Err` is only for sink failures.
    async fn crawl_letter(&mut self, letter: char) -> Result<LetterOutcome, DirectoryError> {
        let url = match listing_url(
            &self.config.crawler.listing_url,
            self.config.crawler.search_type,
            letter,
        ) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Bad listing URL for letter {}: {}", letter, e);
                return Ok(LetterOutcome::Failed);
            }
        };

        let mut session =
            match ListingSession::open(&mut self.engine, letter, &url, self.listing).await {
                Ok(session) => session,
                Err(e @ DirectoryError::ListingEmpty { .. }) => {
                    tracing::info!("{}", e);
                    return Ok(LetterOutcome::Empty);
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    return Ok(LetterOutcome::Failed);
                }
            };
        self.stats.pages_visited += 1;

        // The listing context is released whatever happens below.
        let result = self.drain(&mut session).await;
        session.close(&mut self.engine).await;
        result
    }

    /// Processes every page of an open session until it is exhausted
    async fn drain(
        &mut self,
        session: &mut ListingSession,
    ) -> Result<LetterOutcome, DirectoryError> {
        let letter = session.letter();

        loop {
            let links = match session.links(&self.engine) {
                Ok(links) => links,
                Err(e) => {
                    tracing::error!(
                        "Listing {} for letter {} unreadable: {}",
                        session.state(),
                        letter,
                        e
                    );
                    return Ok(LetterOutcome::Failed);
                }
            };

            tracing::info!(
                "Letter {}, {}: {} detail link(s)",
                letter,
                session.state(),
                links.len()
            );
            self.stats.links_found += links.len() as u64;

            for link in &links {
                let records = self.detail.fetch(&mut self.engine, link).await;
                if records.is_empty() {
                    self.stats.detail_failures += 1;
                    continue;
                }

                self.stats.organizations += 1;
                for record in &records {
                    self.sink.write_record(record)?;
                    self.stats.rows_written += 1;
                }
            }

            match session.advance(&mut self.engine).await {
                ListingState::PageLoaded(page) => {
                    self.stats.pages_visited += 1;
                    tracing::debug!("Letter {}: moved to page {}", letter, page);
                }
                ListingState::Exhausted(reason) => {
                    if reason.is_natural_end() {
                        tracing::info!("Letter {} done: {}", letter, reason);
                    } else {
                        tracing::warn!("Letter {} stopped early: {}", letter, reason);
                    }
                    return Ok(LetterOutcome::Crawled);
                }
            }
        }
    }
}

/// Runs the main crawl operation
///
/// Builds an [`HttpEngine`] and a [`CsvSink`] from `config` and crawls every
/// configured letter.
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Every letter was attempted
/// * `Err(DirectoryError)` - The engine or the output could not be set up,
///   or the output stopped accepting rows
///
/// # Example
///
/// ```no_run
/// use fti_directory::config::load_config;
/// use fti_directory::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let stats = run_crawl(config).await?;
/// println!("{} rows written", stats.rows_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlStatistics, DirectoryError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
