//! Crawler module: listing traversal and detail fetching
//!
//! This module contains the core crawling logic, including:
//! - Listing sessions and the pagination state machine
//! - Detail fetches in short-lived, isolated contexts
//! - Bounded retry with backoff
//! - Overall crawl coordination

mod coordinator;
mod detail;
mod pagination;
mod retry;

pub use coordinator::{run_crawl, Coordinator};
pub use detail::{DetailFetcher, DETAIL_READY_SELECTOR};
pub use pagination::{
    extract_detail_links, listing_url, page_target, plan_advance, read_pager, Advance,
    DetailLink, ListingSession, ListingSettings, PagerState, DETAIL_LINK_SELECTOR,
    PAGER_ROW_SELECTOR,
};
pub use retry::RetryPolicy;

use crate::config::Config;
use crate::output::CrawlStatistics;
use crate::DirectoryError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP engine and create the CSV output
/// 2. Walk every configured letter's listing, page by page
/// 3. Extract each organization's detail page into rows
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Crawl completed
/// * `Err(DirectoryError)` - Crawl could not start or its output failed
pub async fn crawl(config: Config) -> Result<CrawlStatistics, DirectoryError> {
    run_crawl(config).await
}
