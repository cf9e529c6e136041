//! HTTP-backed browsing engine
//!
//! Each context owns its own reqwest client and cookie store, so contexts
//! share no session state. Documents arrive complete, which makes the
//! readiness wait a single check against the current snapshot.

use super::{
    build_postback_form, BrowserEngine, ContextHandle, EngineError, EngineResult,
    NavigationDirective, PageSnapshot,
};
use crate::config::Config;
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client for one browsing context
///
/// # Arguments
///
/// * `user_agent` - Value of the `User-Agent` header
/// * `timeout` - Upper bound for a whole request/response exchange
///
/// # Example
///
/// ```no_run
/// use fti_directory::browser::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client("FtiDirectory/1.0", Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// State of one open context
struct BrowsingContext {
    client: Client,
    current: Option<PageSnapshot>,
}

/// Browsing engine speaking plain HTTP
pub struct HttpEngine {
    user_agent: String,
    request_timeout: Duration,
    contexts: HashMap<u64, BrowsingContext>,
    next_id: u64,
}

impl HttpEngine {
    pub fn new(user_agent: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            request_timeout,
            contexts: HashMap::new(),
            next_id: 1,
        }
    }

    /// Builds an engine with the configured user agent and request timeout
    ///
    /// A client is built once up front so a broken TLS or client setup
    /// surfaces here instead of on the first context.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let user_agent = config.user_agent.header_value();
        let request_timeout = config.crawler.request_timeout();
        build_http_client(&user_agent, request_timeout)?;
        Ok(Self::new(user_agent, request_timeout))
    }

    fn context(&self, ctx: &ContextHandle) -> EngineResult<&BrowsingContext> {
        self.contexts
            .get(&ctx.id())
            .ok_or(EngineError::UnknownContext(ctx.id()))
    }

    fn context_mut(&mut self, ctx: &ContextHandle) -> EngineResult<&mut BrowsingContext> {
        self.contexts
            .get_mut(&ctx.id())
            .ok_or(EngineError::UnknownContext(ctx.id()))
    }

    /// Turns a response into a snapshot and makes it the context's document
    async fn load(
        &mut self,
        ctx: &ContextHandle,
        requested: &Url,
        response: Result<Response, reqwest::Error>,
    ) -> EngineResult<PageSnapshot> {
        let response = response.map_err(|source| EngineError::Http {
            url: requested.to_string(),
            source,
        })?;

        let status = response.status();
        let final_url = response.url().clone();
        if !status.is_success() {
            return Err(EngineError::Status {
                url: final_url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| EngineError::Http {
            url: final_url.to_string(),
            source,
        })?;

        let snapshot = PageSnapshot::new(final_url, body);
        self.context_mut(ctx)?.current = Some(snapshot.clone());
        Ok(snapshot)
    }
}

impl BrowserEngine for HttpEngine {
    async fn open_context(&mut self) -> EngineResult<ContextHandle> {
        let client = build_http_client(&self.user_agent, self.request_timeout).map_err(
            |source| EngineError::Http {
                url: String::new(),
                source,
            },
        )?;

        let id = self.next_id;
        self.next_id += 1;
        self.contexts.insert(
            id,
            BrowsingContext {
                client,
                current: None,
            },
        );
        tracing::debug!("Opened browsing context #{}", id);
        Ok(ContextHandle::new(id))
    }

    async fn close_context(&mut self, handle: ContextHandle) -> EngineResult<()> {
        self.contexts
            .remove(&handle.id())
            .ok_or(EngineError::UnknownContext(handle.id()))?;
        tracing::debug!("Closed browsing context #{}", handle.id());
        Ok(())
    }

    async fn navigate(&mut self, ctx: &ContextHandle, url: &Url) -> EngineResult<PageSnapshot> {
        tracing::debug!("Context #{} navigating to {}", ctx.id(), url);
        let response = self.context(ctx)?.client.get(url.clone()).send().await;
        self.load(ctx, url, response).await
    }

    async fn execute(
        &mut self,
        ctx: &ContextHandle,
        directive: &NavigationDirective,
    ) -> EngineResult<PageSnapshot> {
        let (target, argument) = match directive {
            NavigationDirective::Postback { target, argument } => (target, argument),
            NavigationDirective::Script(script) => {
                return Err(EngineError::UnsupportedScript(script.clone()))
            }
        };

        let page = self
            .context(ctx)?
            .current
            .clone()
            .ok_or(EngineError::NoDocument(ctx.id()))?;
        let (action, fields) = build_postback_form(&page, target, argument)?;

        tracing::debug!(
            "Context #{} posting back {}={} to {}",
            ctx.id(),
            target,
            argument,
            action
        );
        let response = self
            .context(ctx)?
            .client
            .post(action.clone())
            .header(reqwest::header::REFERER, page.url().as_str())
            .form(&fields)
            .send()
            .await;
        self.load(ctx, &action, response).await
    }

    fn snapshot(&self, ctx: &ContextHandle) -> EngineResult<PageSnapshot> {
        self.context(ctx)?
            .current
            .clone()
            .ok_or(EngineError::NoDocument(ctx.id()))
    }

    fn open_contexts(&self) -> usize {
        self.contexts.len()
    }

    async fn wait_for(
        &mut self,
        ctx: &ContextHandle,
        selector: &str,
        _timeout: Duration,
    ) -> EngineResult<PageSnapshot> {
        // A served document never changes after arrival, so one probe decides.
        let snapshot = self.snapshot(ctx)?;
        if snapshot.matches(selector)? {
            Ok(snapshot)
        } else {
            Err(EngineError::NotReady {
                selector: selector.to_string(),
                waited: Duration::ZERO,
            })
        }
    }
}
