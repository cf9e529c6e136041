//! Listing sessions and the pagination state machine
//!
//! The listing for one letter is rendered page by page. The URL never
//! changes between pages: the next page is reached by running the pager's
//! postback, so "is there a next page" has to be read off the rendered pager
//! every time. Reading the pager and planning the next step are pure
//! functions over a [`PageSnapshot`]; [`ListingSession`] only drives them.

use super::retry::RetryPolicy;
use crate::browser::{
    parse_directive, BrowserEngine, ContextHandle, EngineError, NavigationDirective, PageSnapshot,
};
use crate::config::Config;
use crate::extract::normalize_whitespace;
use crate::state::{ExhaustReason, ListingState};
use crate::DirectoryError;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Detail-page anchors on a listing page
pub const DETAIL_LINK_SELECTOR: &str = r#"td[align="left"] a[href^="MemberDetailEN.aspx"]"#;

/// Rows holding the pager widget
pub const PAGER_ROW_SELECTOR: &str = r#"tr[style*="background-color:#284775"]"#;

/// Token preceding the page number in a pager postback argument
const PAGE_TOKEN: &str = "Page$";

/// Reference to one organization's detail page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DetailLink(Url);

impl DetailLink {
    pub fn new(url: Url) -> Self {
        Self(url)
    }

    pub fn url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for DetailLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the pager on the current render says
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerState {
    /// Number shown in the one pager cell that is not a link
    pub current: u32,

    /// Href of the link to page `current + 1`, if offered
    pub next_href: Option<String>,
}

/// Next step for a listing session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Navigate {
        to: u32,
        directive: NavigationDirective,
    },
    Exhausted(ExhaustReason),
}

/// Builds the listing URL for one letter
///
/// # Example
///
/// ```
/// use fti_directory::crawler::listing_url;
///
/// let url = listing_url("https://example.com/resultEN.aspx", 4, 'B').unwrap();
/// assert_eq!(url.as_str(), "https://example.com/resultEN.aspx?ts=4&texts=B");
/// ```
pub fn listing_url(base: &str, search_type: u32, letter: char) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    url.query_pairs_mut()
        .append_pair("ts", &search_type.to_string())
        .append_pair("texts", &letter.to_string());
    Ok(url)
}

/// Detail links on a listing page, in document order, made absolute
pub fn extract_detail_links(page: &PageSnapshot) -> Vec<DetailLink> {
    let document = page.document();
    let Ok(selector) = Selector::parse(DETAIL_LINK_SELECTOR) else {
        return Vec::new();
    };

    let links = document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| match page.url().join(href.trim()) {
            Ok(url) => Some(DetailLink::new(url)),
            Err(e) => {
                tracing::debug!("Skipping unresolvable detail link {}: {}", href, e);
                None
            }
        })
        .collect();
    links
}

/// Page number a pager href points at
///
/// For a postback only the argument is read, and it must be exactly
/// `Page$<digits>`: a control id that happens to contain `Page$` is never
/// mistaken for it. Any other href is scanned for the token so that a next
/// link the engine cannot follow still surfaces as one.
pub fn page_target(href: &str) -> Option<u32> {
    match parse_directive(href) {
        Some(NavigationDirective::Postback { argument, .. }) => {
            let digits = argument.trim().strip_prefix(PAGE_TOKEN)?;
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            digits.parse().ok()
        }
        _ => {
            let start = href.rfind(PAGE_TOKEN)? + PAGE_TOKEN.len();
            let digits: String = href[start..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        }
    }
}

/// Reads the pager of a rendered listing page
///
/// Pager layouts vary between one and several rows and may be repeated
/// above and below the grid; every pager row is read and the results must
/// agree. Any disagreement ends pagination instead of guessing.
pub fn read_pager(document: &Html) -> Result<PagerState, ExhaustReason> {
    let (Ok(pager_rows), Ok(cells), Ok(anchors)) = (
        Selector::parse(PAGER_ROW_SELECTOR),
        Selector::parse("td"),
        Selector::parse("a[href]"),
    ) else {
        return Err(ExhaustReason::UnreadablePager);
    };

    let rows: Vec<_> = document.select(&pager_rows).collect();
    if rows.is_empty() {
        return Err(ExhaustReason::NoPager);
    }

    // Leaf cells without a link hold the current page number.
    let mut current_numbers = BTreeSet::new();
    for row in &rows {
        for cell in row.select(&cells) {
            let is_leaf = cell.select(&cells).next().is_none();
            let is_link = cell.select(&anchors).next().is_some();
            if !is_leaf || is_link {
                continue;
            }
            let text = normalize_whitespace(&cell.text().collect::<String>());
            if let Ok(number) = text.parse::<u32>() {
                current_numbers.insert(number);
            }
        }
    }

    let current = match current_numbers.len() {
        0 => return Err(ExhaustReason::UnreadablePager),
        1 => current_numbers
            .into_iter()
            .next()
            .ok_or(ExhaustReason::UnreadablePager)?,
        _ => return Err(ExhaustReason::AmbiguousPager),
    };

    // A pager repeated above and below the grid yields the same href twice;
    // identical hrefs are one target. Only distinct hrefs for the next page
    // are ambiguous.
    let wanted = current.checked_add(1);
    let next_hrefs: BTreeSet<String> = rows
        .iter()
        .flat_map(|row| row.select(&anchors))
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| wanted.is_some() && page_target(href) == wanted)
        .map(|href| href.trim().to_string())
        .collect();

    if next_hrefs.len() > 1 {
        return Err(ExhaustReason::AmbiguousTarget);
    }

    Ok(PagerState {
        current,
        next_href: next_hrefs.into_iter().next(),
    })
}

/// Decides how a session on `page` should advance
pub fn plan_advance(page: &PageSnapshot, max_pages: u32) -> Advance {
    let pager = match read_pager(&page.document()) {
        Ok(pager) => pager,
        Err(reason) => return Advance::Exhausted(reason),
    };

    let Some(href) = pager.next_href else {
        return Advance::Exhausted(ExhaustReason::LastPage);
    };

    let to = pager.current.saturating_add(1);
    if to > max_pages {
        return Advance::Exhausted(ExhaustReason::PageLimit);
    }

    match parse_directive(&href) {
        Some(directive) => Advance::Navigate { to, directive },
        None => Advance::Exhausted(ExhaustReason::NoDirective),
    }
}

/// Knobs shared by every listing session
#[derive(Debug, Clone, Copy)]
pub struct ListingSettings {
    pub readiness_timeout: Duration,
    pub max_pages: u32,
    pub retry: RetryPolicy,
}

impl ListingSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            readiness_timeout: config.crawler.readiness_timeout(),
            max_pages: config.crawler.max_pages_per_letter,
            retry: RetryPolicy::for_advance(&config.retry),
        }
    }
}

/// One letter's listing, rendered in a context the session owns
pub struct ListingSession {
    letter: char,
    context: ContextHandle,
    state: ListingState,
    settings: ListingSettings,
}

impl ListingSession {
    /// Opens a context and loads page 1 of the listing
    ///
    /// A listing that loads but never shows a detail link is
    /// [`DirectoryError::ListingEmpty`]; one that cannot be loaded at all is
    /// [`DirectoryError::ListingUnavailable`]. Either way the context is
    /// closed again before returning.
    pub async fn open<E: BrowserEngine>(
        engine: &mut E,
        letter: char,
        url: &Url,
        settings: ListingSettings,
    ) -> Result<Self, DirectoryError> {
        let context = engine.open_context().await?;

        let unavailable = |e: EngineError| DirectoryError::ListingUnavailable {
            letter,
            reason: e.to_string(),
        };
        let failure = match engine.navigate(&context, url).await {
            Ok(_) => match engine
                .wait_for(&context, DETAIL_LINK_SELECTOR, settings.readiness_timeout)
                .await
            {
                Ok(_) => None,
                Err(EngineError::NotReady { .. }) => Some(DirectoryError::ListingEmpty { letter }),
                Err(e) => Some(unavailable(e)),
            },
            Err(e) => Some(unavailable(e)),
        };

        let Some(error) = failure else {
            tracing::debug!("Letter {} listing loaded in context #{}", letter, context.id());
            return Ok(Self {
                letter,
                context,
                state: ListingState::PageLoaded(1),
                settings,
            });
        };

        if let Err(close_err) = engine.close_context(context).await {
            tracing::warn!("Failed to close listing context: {}", close_err);
        }
        Err(error)
    }

    pub fn letter(&self) -> char {
        self.letter
    }

    pub fn state(&self) -> ListingState {
        self.state
    }

    /// Detail links on the currently loaded page
    pub fn links<E: BrowserEngine>(&self, engine: &E) -> Result<Vec<DetailLink>, DirectoryError> {
        let page = engine.snapshot(&self.context)?;
        Ok(extract_detail_links(&page))
    }

    /// Moves to the next page, or to `Exhausted`
    ///
    /// Every call either raises the loaded page number or ends the session,
    /// so a session advances at most `max_pages` times.
    pub async fn advance<E: BrowserEngine>(&mut self, engine: &mut E) -> ListingState {
        let Some(loaded) = self.state.page() else {
            return self.state;
        };

        let plan = match engine.snapshot(&self.context) {
            Ok(page) => plan_advance(&page, self.settings.max_pages),
            Err(e) => {
                tracing::warn!("Letter {}: listing document lost: {}", self.letter, e);
                Advance::Exhausted(ExhaustReason::NavigationFailed)
            }
        };

        let next = match plan {
            Advance::Exhausted(reason) => ListingState::Exhausted(reason),
            Advance::Navigate { to, directive } => {
                tracing::debug!("Letter {}: page {} -> {}", self.letter, loaded, to);
                self.navigate(engine, loaded, to, &directive).await
            }
        };
        self.state = next;
        self.state
    }

    async fn navigate<E: BrowserEngine>(
        &self,
        engine: &mut E,
        loaded: u32,
        to: u32,
        directive: &NavigationDirective,
    ) -> ListingState {
        let retry = self.settings.retry;
        let mut navigated = false;
        for attempt in 0..retry.attempts() {
            retry.pause_before(attempt).await;
            match engine.execute(&self.context, directive).await {
                Ok(_) => {
                    navigated = true;
                    break;
                }
                Err(e) => tracing::warn!(
                    "Letter {}: navigation to page {} failed (attempt {}/{}): {}",
                    self.letter,
                    to,
                    attempt + 1,
                    retry.attempts(),
                    e
                ),
            }
        }
        if !navigated {
            return ListingState::Exhausted(ExhaustReason::NavigationFailed);
        }

        let page = match engine
            .wait_for(
                &self.context,
                DETAIL_LINK_SELECTOR,
                self.settings.readiness_timeout,
            )
            .await
        {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Letter {}: page {} never became ready: {}", self.letter, to, e);
                return ListingState::Exhausted(ExhaustReason::NavigationFailed);
            }
        };

        // The pager is re-read: navigation may land somewhere other than asked.
        match read_pager(&page.document()) {
            Ok(pager) if pager.current > loaded => {
                if pager.current != to {
                    tracing::warn!(
                        "Letter {}: asked for page {}, landed on page {}",
                        self.letter,
                        to,
                        pager.current
                    );
                }
                ListingState::PageLoaded(pager.current)
            }
            Ok(pager) => {
                tracing::warn!(
                    "Letter {}: pager still shows page {} after navigating from {}",
                    self.letter,
                    pager.current,
                    loaded
                );
                ListingState::Exhausted(ExhaustReason::Stalled)
            }
            Err(_) => ListingState::PageLoaded(to),
        }
    }

    /// Releases the listing context
    pub async fn close<E: BrowserEngine>(self, engine: &mut E) {
        let id = self.context.id();
        if let Err(e) = engine.close_context(self.context).await {
            tracing::warn!("Failed to close listing context #{}: {}", id, e);
        }
    }
}
