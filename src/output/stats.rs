//! End-of-run summary
//!
//! This module builds the summary returned by a finished run and renders it
//! for the command line.

use crate::crawler::Site;
use crate::output::Disposition;
use crate::state::SiteStatus;
use chrono::{DateTime, Utc};

/// Outcome of a finished scan run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub disposition: Disposition,

    /// Every site that reached a terminal status, in completion order
    pub handled: Vec<Site>,

    /// Number of distinct URLs assigned an id
    pub registered: usize,

    /// Number of layers executed, retried layers included
    pub layers: usize,

    pub scan_url_count: usize,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Number of handled sites with the given status
    pub fn count(&self, status: SiteStatus) -> usize {
        self.handled.iter().filter(|s| s.status == status).count()
    }

    /// URLs of the sites whose content matched, in completion order
    pub fn found_urls(&self) -> Vec<&str> {
        self.handled
            .iter()
            .filter(|s| s.status == SiteStatus::Found)
            .map(|s| s.url.as_str())
            .collect()
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Prints a run summary to stdout in a formatted manner
pub fn print_summary(summary: &RunSummary) {
    println!("=== Scan Summary ===\n");

    println!("Result: {}", summary.disposition.message());
    println!(
        "  Started: {}",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  Duration: {}s", summary.duration_seconds());
    println!("  Layers: {}", summary.layers);
    println!(
        "  URLs registered: {} (cap {})",
        summary.registered, summary.scan_url_count
    );
    println!();

    let handled = summary.handled.len();
    println!("Sites by Status:");
    for status in [SiteStatus::Found, SiteStatus::NotFound, SiteStatus::Error] {
        let count = summary.count(status);
        let percentage = if handled > 0 {
            (count as f64 / handled as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!();

    let found = summary.found_urls();
    if !found.is_empty() {
        println!("Matches ({}):", found.len());
        for url in found {
            println!("  - {}", url);
        }
        println!();
    }

    let errors: Vec<&Site> = summary
        .handled
        .iter()
        .filter(|s| s.status == SiteStatus::Error)
        .collect();
    if !errors.is_empty() {
        println!("Errors ({}):", errors.len());
        for site in errors {
            println!(
                "  - {}: {}",
                site.url,
                site.error_text.as_deref().unwrap_or("")
            );
        }
    }
}
