//! In-memory engine for unit tests

use super::{
    BrowserEngine, ContextHandle, EngineError, EngineResult, NavigationDirective, PageSnapshot,
};
use std::collections::{HashMap, HashSet};
use url::Url;

/// Serves canned documents by URL and postback argument
#[derive(Default)]
pub(crate) struct FakeEngine {
    pages: HashMap<String, String>,
    postbacks: HashMap<(String, String), String>,
    failing: HashSet<String>,
    contexts: HashMap<u64, Option<PageSnapshot>>,
    next_id: u64,
    pub opened_total: usize,
    pub navigations: Vec<String>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Registers the document served when `argument` is posted back from `url`
    pub fn postback(mut self, url: &str, argument: &str, html: &str) -> Self {
        self.postbacks
            .insert((url.to_string(), argument.to_string()), html.to_string());
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    fn store(&mut self, ctx: &ContextHandle, snapshot: &PageSnapshot) -> EngineResult<()> {
        let slot = self
            .contexts
            .get_mut(&ctx.id())
            .ok_or(EngineError::UnknownContext(ctx.id()))?;
        *slot = Some(snapshot.clone());
        Ok(())
    }
}

impl BrowserEngine for FakeEngine {
    async fn open_context(&mut self) -> EngineResult<ContextHandle> {
        self.next_id += 1;
        self.opened_total += 1;
        self.contexts.insert(self.next_id, None);
        Ok(ContextHandle::new(self.next_id))
    }

    async fn close_context(&mut self, handle: ContextHandle) -> EngineResult<()> {
        self.contexts
            .remove(&handle.id())
            .map(|_| ())
            .ok_or(EngineError::UnknownContext(handle.id()))
    }

    async fn navigate(&mut self, ctx: &ContextHandle, url: &Url) -> EngineResult<PageSnapshot> {
        if !self.contexts.contains_key(&ctx.id()) {
            return Err(EngineError::UnknownContext(ctx.id()));
        }
        self.navigations.push(url.to_string());
        if self.failing.contains(url.as_str()) {
            return Err(EngineError::Status {
                url: url.to_string(),
                status: 500,
            });
        }
        let html = self.pages.get(url.as_str()).ok_or(EngineError::Status {
            url: url.to_string(),
            status: 404,
        })?;
        let snapshot = PageSnapshot::new(url.clone(), html.clone());
        self.store(ctx, &snapshot)?;
        Ok(snapshot)
    }

    async fn execute(
        &mut self,
        ctx: &ContextHandle,
        directive: &NavigationDirective,
    ) -> EngineResult<PageSnapshot> {
        let current = self.snapshot(ctx)?;
        let argument = match directive {
            NavigationDirective::Postback { argument, .. } => argument,
            NavigationDirective::Script(script) => {
                return Err(EngineError::UnsupportedScript(script.clone()))
            }
        };
        let key = (current.url().to_string(), argument.clone());
        let html = self.postbacks.get(&key).ok_or(EngineError::Status {
            url: current.url().to_string(),
            status: 500,
        })?;
        let snapshot = PageSnapshot::new(current.url().clone(), html.clone());
        self.store(ctx, &snapshot)?;
        Ok(snapshot)
    }

    fn snapshot(&self, ctx: &ContextHandle) -> EngineResult<PageSnapshot> {
        self.contexts
            .get(&ctx.id())
            .ok_or(EngineError::UnknownContext(ctx.id()))?
            .clone()
            .ok_or(EngineError::NoDocument(ctx.id()))
    }

    fn open_contexts(&self) -> usize {
        self.contexts.len()
    }
}
