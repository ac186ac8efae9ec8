//! Crawler module for layered page scanning
//!
//! This module contains the core scanning logic, including:
//! - HTTP fetching behind the `Fetcher` capability
//! - HTML link extraction and text matching
//! - The visited set and next-layer frontier
//! - Bounded-concurrency layer execution
//! - The run controller with pause, resume and stop

mod controller;
mod executor;
mod fetcher;
mod frontier;
mod parser;
mod site;

#[cfg(test)]
mod testing;

pub use controller::{Scanner, StartOutcome};
pub use executor::{LayerExecutor, LayerReport};
pub use fetcher::{build_http_client, fetch_url, Fetcher, HttpFetcher};
pub use frontier::{Frontier, VisitedSet};
pub use parser::{page_matches, HtmlLinkExtractor, LinkExtractor};
pub use site::Site;

use crate::config::{ScanOptions, ScannerConfig};
use crate::output::{RunSummary, TracingObserver};
use crate::ScanError;
use std::sync::Arc;

/// Runs a complete scan with HTTP fetching and log-only reporting
///
/// Convenience entry point for callers that do not need to pause or stop
/// the run. It will:
/// 1. Build the HTTP client from `config`
/// 2. Validate `options`
/// 3. Scan layer by layer until the frontier drains or the cap is reached
///
/// # Arguments
///
/// * `config` - Fetcher and controller settings
/// * `options` - What to scan for and where
///
/// # Returns
///
/// * `Ok(RunSummary)` - Scan finished
/// * `Err(ScanError)` - Client construction or option validation failed
pub async fn scan(config: &ScannerConfig, options: ScanOptions) -> Result<RunSummary, ScanError> {
    let scanner = Scanner::from_config(config, Arc::new(TracingObserver))?;
    match scanner.start(options).await? {
        StartOutcome::Completed(summary) => Ok(summary),
        // A fresh scanner is always stopped
        StartOutcome::Resumed | StartOutcome::Ignored => {
            Err(ScanError::Worker("scanner was already running".to_string()))
        }
    }
}
