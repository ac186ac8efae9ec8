//! Ripple-Scan: a layered, bounded-concurrency site scanner
//!
//! This crate implements a breadth-first web crawler that starts at a seed URL,
//! fetches each layer of discovered pages in parallel, looks for a search text
//! in every page and reports progress to an injected observer. A run can be
//! paused, resumed and stopped from another task while it is in flight.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for Ripple-Scan operations
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Link extraction failed for {url}: {message}")]
    Extract { url: String, message: String },

    #[error("Worker failure: {0}")]
    Worker(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// One or more violated rules, one message per line
    #[error("{0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors produced while retrieving a single page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("Request timed out")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(reqwest::Error),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Request(err)
        }
    }
}

/// Result type alias for Ripple-Scan operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for page fetches
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::{ScanOptions, ScannerConfig};
pub use crawler::{Scanner, Site, StartOutcome};
pub use output::{Disposition, RunSummary, ScanEvent, ScanObserver};
pub use state::{RunState, SiteStatus};
