//! Resilient element lookups
//!
//! Lookups never fail: a bad selector, a missing element or an element with
//! no text all come back as [`Lookup::NotFound`]. Callers turn `NotFound`
//! into the sentinel once, when a record is assembled.

use super::SENTINEL;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Outcome of looking up one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(String),
    NotFound,
}

impl Lookup {
    /// Wraps raw text, treating blank text as absent
    pub fn from_text(raw: &str) -> Self {
        let normalized = normalize_whitespace(raw);
        if normalized.is_empty() {
            Self::NotFound
        } else {
            Self::Found(normalized)
        }
    }

    /// Resolves to the value or the sentinel
    pub fn or_sentinel(self) -> String {
        match self {
            Self::Found(value) => value,
            Self::NotFound => SENTINEL.to_string(),
        }
    }

    /// Joins two optional parts with a single space
    pub fn join(self, other: Lookup) -> Lookup {
        match (self, other) {
            (Self::Found(a), Self::Found(b)) => Self::Found(format!("{} {}", a, b)),
            (Self::Found(a), Self::NotFound) | (Self::NotFound, Self::Found(a)) => Self::Found(a),
            (Self::NotFound, Self::NotFound) => Self::NotFound,
        }
    }
}

/// Collapses whitespace runs to single spaces and trims
pub fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compiles a selector, logging and returning `None` when it does not parse
pub fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!("Ignoring invalid selector '{}': {:?}", css, e);
            None
        }
    }
}

/// Elements whose edges separate words in rendered text
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "blockquote", "caption", "dd", "div", "dl", "dt", "h1", "h2", "h3",
    "h4", "h5", "h6", "hr", "li", "ol", "p", "section", "table", "tbody", "td", "tfoot", "th",
    "thead", "tr", "ul",
];

/// Visible text of an element, whitespace-normalized
///
/// Inline markup is transparent, so `02-123-<b>4567</b>` reads as one
/// value. Line breaks and block or cell edges become spaces.
pub fn element_text(element: ElementRef<'_>) -> Lookup {
    let mut text = String::new();
    collect_text(element, &mut text);
    Lookup::from_text(&text)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(inner) => match inner.name() {
                "br" => out.push(' '),
                "script" | "style" | "template" => {}
                name => {
                    let block = BLOCK_ELEMENTS.contains(&name);
                    if block {
                        out.push(' ');
                    }
                    if let Some(nested) = ElementRef::wrap(child) {
                        collect_text(nested, out);
                    }
                    if block {
                        out.push(' ');
                    }
                }
            },
            _ => {}
        }
    }
}

/// First element matching `css` in the document
pub fn first_match<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = selector(css)?;
    let found = document.select(&selector).next();
    found
}

/// Text of the first element matching `css`
pub fn lookup_text(document: &Html, css: &str) -> Lookup {
    first_match(document, css).map_or(Lookup::NotFound, element_text)
}

/// Attribute of the first element matching `css`
pub fn lookup_attribute(document: &Html, css: &str, attr: &str) -> Lookup {
    first_match(document, css)
        .and_then(|element| element.value().attr(attr))
        .map_or(Lookup::NotFound, Lookup::from_text)
}

/// Link target of the first element matching `css`, made absolute
///
/// A target that cannot be resolved is kept verbatim.
pub fn lookup_href(document: &Html, css: &str, base: &Url) -> Lookup {
    match lookup_attribute(document, css, "href") {
        Lookup::Found(href) => match base.join(&href) {
            Ok(resolved) => Lookup::Found(resolved.to_string()),
            Err(_) => Lookup::Found(href),
        },
        Lookup::NotFound => Lookup::NotFound,
    }
}

/// Sentinel-resolving text lookup
pub fn extract_text(document: &Html, css: &str) -> String {
    lookup_text(document, css).or_sentinel()
}

/// Sentinel-resolving attribute lookup
pub fn extract_attribute(document: &Html, css: &str, attr: &str) -> String {
    lookup_attribute(document, css, attr).or_sentinel()
}
