//! Ripple-Scan main entry point
//!
//! This is the command-line interface for the Ripple-Scan site scanner.

use anyhow::Context;
use clap::Parser;
use ripple_scan::config::{load_config, PartialScanOptions, ScannerConfig};
use ripple_scan::output::{print_summary, TracingObserver};
use ripple_scan::{Scanner, StartOutcome};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Ripple-Scan: a layered site scanner
///
/// Ripple-Scan crawls outward from a base URL one link layer at a time,
/// fetching each layer in parallel and reporting every page that contains
/// the searched text.
///
/// While a scan runs, type `pause`, `resume` or `stop` followed by Enter to
/// control it. Ctrl-C stops the scan and still prints the summary.
#[derive(Parser, Debug)]
#[command(name = "ripple-scan")]
#[command(version)]
#[command(about = "A layered site scanner", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Base URL to start scanning from
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Maximum number of pages fetched at once
    #[arg(long, value_name = "N")]
    threads: Option<usize>,

    /// Text to search for (case-sensitive)
    #[arg(long, value_name = "TEXT")]
    text: Option<String>,

    /// Maximum number of distinct URLs to scan, base URL included
    #[arg(long, value_name = "N")]
    max_urls: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn scan_overrides(&self) -> PartialScanOptions {
        PartialScanOptions {
            base_url: self.url.clone(),
            thread_count: self.threads,
            searched_text: self.text.clone(),
            scan_url_count: self.max_urls,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => ScannerConfig::default(),
    };
    if let Some(timeout) = cli.timeout {
        config.fetcher.timeout_secs = timeout.max(1);
    }

    let options = config.scan.clone().merge(cli.scan_overrides()).into_options();

    let scanner = Arc::new(
        Scanner::from_config(&config, Arc::new(TracingObserver))
            .context("failed to build the scanner")?,
    );

    spawn_command_reader(scanner.clone());
    spawn_interrupt_handler(scanner.clone());

    match scanner.start(options).await? {
        StartOutcome::Completed(summary) => {
            if !cli.quiet {
                println!();
                print_summary(&summary);
            }
            Ok(())
        }
        StartOutcome::Resumed | StartOutcome::Ignored => {
            anyhow::bail!("scanner was unexpectedly busy")
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_scan=info,warn"),
            1 => EnvFilter::new("ripple_scan=debug,info"),
            2 => EnvFilter::new("ripple_scan=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Reads control commands from stdin on a dedicated thread
///
/// The thread is left blocked on stdin when the scan ends; the process exits
/// regardless.
fn spawn_command_reader(scanner: Arc<Scanner>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match line.trim() {
                "" => {}
                "pause" => {
                    if !scanner.pause() {
                        tracing::warn!("Nothing to pause (scan is {})", scanner.state());
                    }
                }
                "resume" | "start" => {
                    if !scanner.resume() {
                        tracing::warn!("Nothing to resume (scan is {})", scanner.state());
                    }
                }
                "stop" => {
                    if !scanner.stop() {
                        tracing::warn!("Nothing to stop (scan is {})", scanner.state());
                    }
                }
                other => {
                    tracing::warn!("Unknown command {:?}; use pause, resume or stop", other)
                }
            }
        }
    });
}

/// Turns Ctrl-C into a stop request
fn spawn_interrupt_handler(scanner: Arc<Scanner>) {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                return;
            }
            tracing::info!("Interrupt received, stopping scan");
            scanner.stop();
        }
    });
}
