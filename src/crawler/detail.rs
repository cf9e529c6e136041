//! Detail page fetching
//!
//! Every detail page is loaded in a context of its own, opened for the fetch
//! and closed right after it, so whatever the page does can never disturb
//! the listing session it was reached from.

use super::pagination::DetailLink;
use super::retry::RetryPolicy;
use crate::browser::{BrowserEngine, ContextHandle};
use crate::config::Config;
use crate::extract::{extract_records, OrganizationRecord};
use crate::DirectoryError;
use std::time::Duration;

/// Elements whose presence marks a detail page as rendered
///
/// Any one of the member blocks will do, so a member page with no company
/// name still yields a row of sentinels. A bare server form does not count:
/// error pages carry one too.
pub const DETAIL_READY_SELECTOR: &str =
    "span#comp_person_name, span#comp_address, table#ContactFTI, table#ContactNonFTI";

/// Fetches detail pages in isolated contexts
#[derive(Debug, Clone, Copy)]
pub struct DetailFetcher {
    readiness_timeout: Duration,
    retry: RetryPolicy,
}

impl DetailFetcher {
    pub fn new(readiness_timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            readiness_timeout,
            retry,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.crawler.readiness_timeout(),
            RetryPolicy::for_details(&config.retry),
        )
    }

    /// Fetches one detail page and returns its records
    ///
    /// Never fails. A page that cannot be loaded after every retry is logged
    /// and yields no records; a page that loads always yields at least one.
    ///
    /// # Arguments
    ///
    /// * `engine` - The browsing engine hosting the contexts
    /// * `link` - The detail page to load
    pub async fn fetch<E: BrowserEngine>(
        &self,
        engine: &mut E,
        link: &DetailLink,
    ) -> Vec<OrganizationRecord> {
        let mut last_error = None;

        for attempt in 0..self.retry.attempts() {
            self.retry.pause_before(attempt).await;
            match self.fetch_once(engine, link).await {
                Ok(records) => {
                    tracing::debug!("{} -> {} record(s)", link, records.len());
                    return records;
                }
                Err(e) => {
                    tracing::warn!(
                        "Detail fetch failed for {} (attempt {}/{}): {}",
                        link,
                        attempt + 1,
                        self.retry.attempts(),
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        if let Some(e) = last_error {
            tracing::error!("Error processing {}: {}", link, e);
        }
        Vec::new()
    }

    async fn fetch_once<E: BrowserEngine>(
        &self,
        engine: &mut E,
        link: &DetailLink,
    ) -> Result<Vec<OrganizationRecord>, DirectoryError> {
        let context = engine.open_context().await?;
        let result = self.load(engine, &context, link).await;

        let id = context.id();
        if let Err(e) = engine.close_context(context).await {
            tracing::warn!("Failed to close detail context #{}: {}", id, e);
        }

        result
    }

    async fn load<E: BrowserEngine>(
        &self,
        engine: &mut E,
        context: &ContextHandle,
        link: &DetailLink,
    ) -> Result<Vec<OrganizationRecord>, DirectoryError> {
        engine.navigate(context, link.url()).await?;
        let page = engine
            .wait_for(context, DETAIL_READY_SELECTOR, self.readiness_timeout)
            .await?;
        Ok(extract_records(&page))
    }
}
