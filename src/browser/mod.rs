//! Browsing engine collaborator
//!
//! The crawler never touches a browser directly. Everything it needs is
//! expressed through [`BrowserEngine`]:
//! - isolated browsing contexts addressed by explicit, move-only handles
//! - navigation to a URL and execution of client-side navigation directives
//! - immutable snapshots of the rendered document
//! - bounded readiness waits that fail with a typed, recoverable error
//!
//! [`HttpEngine`] is the shipped implementation. It talks HTTP directly and
//! emulates ASP.NET postbacks by submitting the page's server form.

mod http;
mod postback;
mod snapshot;

#[cfg(test)]
pub(crate) mod fake;

pub use http::{build_http_client, HttpEngine};
pub use postback::{build_postback_form, parse_directive, NavigationDirective};
pub use snapshot::{compile_selector, PageSnapshot};

use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Interval between readiness probes in the default [`BrowserEngine::wait_for`]
pub const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors raised by a browsing engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown browsing context #{0}")]
    UnknownContext(u64),

    #[error("Browsing context #{0} has no document loaded")]
    NoDocument(u64),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Page not ready: '{selector}' absent after {waited:?}")]
    NotReady { selector: String, waited: Duration },

    #[error("No form to submit on {url}")]
    NoForm { url: String },

    #[error("Unsupported navigation script: {0}")]
    UnsupportedScript(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Handle to one browsing context
///
/// Not `Clone`. Closing consumes the handle, so a closed context cannot be
/// addressed again.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ContextHandle(u64);

impl ContextHandle {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Numeric id, for logging
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A browsing engine able to host several isolated contexts
pub trait BrowserEngine {
    /// Opens a new isolated context with no document loaded
    fn open_context(&mut self) -> impl Future<Output = EngineResult<ContextHandle>>;

    /// Tears down a context and everything it holds
    fn close_context(&mut self, handle: ContextHandle) -> impl Future<Output = EngineResult<()>>;

    /// Loads `url` into the context
    fn navigate(
        &mut self,
        ctx: &ContextHandle,
        url: &url::Url,
    ) -> impl Future<Output = EngineResult<PageSnapshot>>;

    /// Runs a client-side navigation directive against the current document
    fn execute(
        &mut self,
        ctx: &ContextHandle,
        directive: &NavigationDirective,
    ) -> impl Future<Output = EngineResult<PageSnapshot>>;

    /// The context's current document
    fn snapshot(&self, ctx: &ContextHandle) -> EngineResult<PageSnapshot>;

    /// Number of contexts currently open
    fn open_contexts(&self) -> usize;

    /// Waits until `selector` matches in the current document
    ///
    /// The default implementation polls [`BrowserEngine::snapshot`] every
    /// [`READINESS_POLL_INTERVAL`] until `timeout` elapses.
    fn wait_for(
        &mut self,
        ctx: &ContextHandle,
        selector: &str,
        timeout: Duration,
    ) -> impl Future<Output = EngineResult<PageSnapshot>> {
        async move {
            let start = Instant::now();
            loop {
                let snapshot = self.snapshot(ctx)?;
                if snapshot.matches(selector)? {
                    tracing::debug!(
                        "'{}' present in context #{} after {:?}",
                        selector,
                        ctx.id(),
                        start.elapsed()
                    );
                    return Ok(snapshot);
                }
                if start.elapsed() >= timeout {
                    return Err(EngineError::NotReady {
                        selector: selector.to_string(),
                        waited: start.elapsed(),
                    });
                }
                tokio::time::sleep(READINESS_POLL_INTERVAL).await;
            }
        }
    }
}
