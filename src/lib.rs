//! FTI Directory: a crawler for the FTI member directory
//!
//! This crate walks the alphabet-indexed member listing, follows every
//! organization's detail page in an isolated browsing context, extracts a
//! fixed schema of fields and streams the resulting rows to a CSV sink.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for directory crawl operations
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser engine error: {0}")]
    Engine(#[from] browser::EngineError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Listing for letter {letter} unavailable: {reason}")]
    ListingUnavailable { letter: char, reason: String },

    #[error("Listing for letter {letter} has no members")]
    ListingEmpty { letter: char },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{OrganizationRecord, SENTINEL};
pub use state::{ExhaustReason, ListingState};
