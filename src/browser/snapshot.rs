//! Immutable page snapshots
//!
//! A snapshot is the rendered document of a context at one instant. It owns
//! the raw markup and re-parses on demand, so it can be held across await
//! points while the parsed tree never is.

use super::{EngineError, EngineResult};
use scraper::{Html, Selector};
use url::Url;

/// The document a context showed at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    url: Url,
    html: String,
}

impl PageSnapshot {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }

    /// URL the document was served from (after redirects)
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Raw markup
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Parses the markup into a queryable document
    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }

    /// Returns true if at least one element matches `selector`
    pub fn matches(&self, selector: &str) -> EngineResult<bool> {
        let selector = compile_selector(selector)?;
        let document = self.document();
        let found = document.select(&selector).next().is_some();
        Ok(found)
    }
}

/// Compiles a CSS selector, mapping parse failures to [`EngineError`]
pub fn compile_selector(css: &str) -> EngineResult<Selector> {
    Selector::parse(css).map_err(|e| EngineError::InvalidSelector(format!("{}: {:?}", css, e)))
}
