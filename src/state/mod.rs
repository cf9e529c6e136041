//! State module for tracking pagination progress
//!
//! # Components
//!
//! - `ListingState`: where a letter's listing session stands (a page is loaded, or it is exhausted)
//! - `ExhaustReason`: why a listing session stopped advancing

mod listing_state;

// Re-export main types
pub use listing_state::{ExhaustReason, ListingState};
