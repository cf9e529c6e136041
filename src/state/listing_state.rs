//! Listing session state definitions
//!
//! A listing session is a small state machine: it sits on a loaded page
//! until advancing either loads the next page or ends the letter.

use std::fmt;

/// Why a listing session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExhaustReason {
    /// No pager on the page: the letter fits on a single page
    NoPager,

    /// Pager present but no current-page number could be read
    UnreadablePager,

    /// Several different current-page numbers on one page
    AmbiguousPager,

    /// The pager offers no link to the following page
    LastPage,

    /// Several different links claim the following page
    AmbiguousTarget,

    /// The next-page link carries no client-side navigation directive
    NoDirective,

    /// Running the navigation failed after all attempts
    NavigationFailed,

    /// Navigation landed on a page at or before the previous one
    Stalled,

    /// The configured page limit for one letter was reached
    PageLimit,
}

impl ExhaustReason {
    /// Returns true if the session ended because the listing ran out of pages
    ///
    /// Everything else means pagination was cut short by the page itself.
    pub fn is_natural_end(&self) -> bool {
        matches!(self, Self::NoPager | Self::LastPage)
    }

    /// Stable identifier used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPager => "no_pager",
            Self::UnreadablePager => "unreadable_pager",
            Self::AmbiguousPager => "ambiguous_pager",
            Self::LastPage => "last_page",
            Self::AmbiguousTarget => "ambiguous_target",
            Self::NoDirective => "no_directive",
            Self::NavigationFailed => "navigation_failed",
            Self::Stalled => "stalled",
            Self::PageLimit => "page_limit",
        }
    }

    /// Returns all possible reasons
    pub fn all_reasons() -> Vec<Self> {
        vec![
            Self::NoPager,
            Self::UnreadablePager,
            Self::AmbiguousPager,
            Self::LastPage,
            Self::AmbiguousTarget,
            Self::NoDirective,
            Self::NavigationFailed,
            Self::Stalled,
            Self::PageLimit,
        ]
    }
}

impl fmt::Display for ExhaustReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current state of a letter's listing session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingState {
    /// Listing page `n` is rendered and its links are available
    PageLoaded(u32),

    /// Terminal: no further pages for this letter
    Exhausted(ExhaustReason),
}

impl ListingState {
    /// Returns true once the session can no longer advance
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted(_))
    }

    /// The loaded page number, if any
    pub fn page(&self) -> Option<u32> {
        match self {
            Self::PageLoaded(n) => Some(*n),
            Self::Exhausted(_) => None,
        }
    }
}

impl fmt::Display for ListingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageLoaded(n) => write!(f, "page {}", n),
            Self::Exhausted(reason) => write!(f, "exhausted ({})", reason),
        }
    }
}
