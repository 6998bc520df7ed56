//! Paper-Harvest: a checkpointing crawler for paginated document catalogs
//!
//! This crate walks the listing pages of a public document catalog, fetches
//! each item's own page to build a detail record, optionally downloads the
//! linked files, and persists accumulated records to CSV as the crawl goes.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Paper-Harvest operations
///
/// Per-item network failures never surface here; they are folded into the
/// record's error column. What remains is configuration trouble, navigation
/// misuse and filesystem failures that make progress impossible to persist.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Invalid walker transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::WalkerPhase,
        to: state::WalkerPhase,
    },
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

    #[error("Invalid selector '{selector}' for {field}")]
    InvalidSelector { field: &'static str, selector: String },
}

/// Result type alias for Paper-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, CrawlReport, DetailRecord, ItemStub, PaperRecord};
pub use state::{CrawlState, WalkerPhase};
