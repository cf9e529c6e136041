use serde::Deserialize;
use std::time::Duration;

/// The full alphabet index walked by default
pub const DEFAULT_LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Main configuration structure for the directory crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Listing endpoint, queried with the search type and one letter
    #[serde(rename = "listing-url", default = "default_listing_url")]
    pub listing_url: String,

    /// Value of the `ts` query parameter
    #[serde(rename = "search-type", default = "default_search_type")]
    pub search_type: u32,

    /// Letters of the index to walk, in order
    #[serde(default = "default_letters")]
    pub letters: String,

    /// Upper bound for readiness waits (milliseconds)
    #[serde(rename = "readiness-timeout-ms", default = "default_readiness_timeout")]
    pub readiness_timeout_ms: u64,

    /// Upper bound for a single HTTP exchange (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Hard stop for pagination within one letter
    #[serde(rename = "max-pages-per-letter", default = "default_max_pages")]
    pub max_pages_per_letter: u32,
}

impl CrawlerConfig {
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Letters as characters, in configured order
    pub fn letter_list(&self) -> Vec<char> {
        self.letters.chars().collect()
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            search_type: default_search_type(),
            letters: default_letters(),
            readiness_timeout_ms: default_readiness_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_pages_per_letter: default_max_pages(),
        }
    }
}

/// Bounded retry for detail fetches and page advances
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Attempts per detail link (1 = no retry)
    #[serde(rename = "detail-attempts", default = "default_attempts")]
    pub detail_attempts: u32,

    /// Attempts per next-page navigation (1 = no retry)
    #[serde(rename = "advance-attempts", default = "default_attempts")]
    pub advance_attempts: u32,

    /// Base delay before the first retry (milliseconds)
    #[serde(rename = "backoff-ms", default = "default_backoff")]
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            detail_attempts: default_attempts(),
            advance_attempts: default_attempts(),
            backoff_ms: default_backoff(),
        }
    }
}

/// How the crawler introduces itself to the directory
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Product token, e.g. `FtiDirectory`
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// Page describing who runs the crawl
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Where the directory operators can reach us
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Where the rows go
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the CSV file rows are streamed to
    #[serde(rename = "csv-path")]
    pub csv_path: String,
}

fn default_listing_url() -> String {
    "https://ftimember.off.fti.or.th/_layouts/membersearch/resultEN.aspx".to_string()
}

fn default_search_type() -> u32 {
    4
}

fn default_letters() -> String {
    DEFAULT_LETTERS.to_string()
}

fn default_readiness_timeout() -> u64 {
    10_000
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_max_pages() -> u32 {
    1_000
}

fn default_attempts() -> u32 {
    2
}

fn default_backoff() -> u64 {
    500
}
