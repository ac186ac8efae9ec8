//! Scan controller - run lifecycle and layer loop
//!
//! This module contains the outer run loop that coordinates a scan:
//! - Validating options and resetting per-run state
//! - Driving successive layers through the layer executor
//! - Arbitrating start / pause / resume / stop commands
//! - Reporting the final disposition

use crate::config::{validate_scan_options, ScanOptions, ScannerConfig};
use crate::crawler::executor::LayerExecutor;
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::{HtmlLinkExtractor, LinkExtractor};
use crate::crawler::Site;
use crate::output::{Disposition, RunSummary, ScanObserver};
use crate::state::{RunState, StateCell};
use crate::ScanError;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What a call to [`Scanner::start`] did
#[derive(Debug)]
pub enum StartOutcome {
    /// A new run was executed to the end
    Completed(RunSummary),

    /// A paused run was resumed; its loop continues in the original caller
    Resumed,

    /// A run already owns the loop, nothing was done
    Ignored,
}

/// The scan engine
///
/// One instance serves any number of consecutive runs, one at a time. The
/// command methods take `&self`, so a `Scanner` behind an `Arc` can be driven
/// from several tasks while [`Scanner::start`] executes a run in another.
pub struct Scanner {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    observer: Arc<dyn ScanObserver>,
    state: StateCell,

    /// Token of the layer currently executing
    cancel: Mutex<CancellationToken>,

    /// Held for the whole lifetime of a run
    run_guard: tokio::sync::Mutex<()>,

    handled: Arc<Mutex<Vec<Site>>>,
    pause_poll: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl Scanner {
    /// Creates a scanner from its collaborators
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn LinkExtractor>,
        observer: Arc<dyn ScanObserver>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            observer,
            state: StateCell::new(RunState::Stopped),
            cancel: Mutex::new(CancellationToken::new()),
            run_guard: tokio::sync::Mutex::new(()),
            handled: Arc::new(Mutex::new(Vec::new())),
            pause_poll: Duration::from_millis(100),
        }
    }

    /// Creates a scanner using HTTP fetching and HTML link extraction
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ripple_scan::config::ScannerConfig;
    /// use ripple_scan::output::TracingObserver;
    /// use ripple_scan::{ScanOptions, Scanner};
    /// use std::sync::Arc;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let scanner = Scanner::from_config(&ScannerConfig::default(), Arc::new(TracingObserver))?;
    /// let options = ScanOptions::new("https://example.com/", 4, "needle", 50);
    /// scanner.start(options).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_config(
        config: &ScannerConfig,
        observer: Arc<dyn ScanObserver>,
    ) -> Result<Self, ScanError> {
        let fetcher = HttpFetcher::new(&config.fetcher)?;
        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(HtmlLinkExtractor::new()),
            observer,
        )
        .with_pause_poll(Duration::from_millis(config.controller.pause_poll_ms)))
    }

    /// Sets the upper bound on how long a paused run sleeps between checks
    pub fn with_pause_poll(mut self, interval: Duration) -> Self {
        self.pause_poll = interval;
        self
    }

    pub fn state(&self) -> RunState {
        self.state.get()
    }

    /// Snapshot of the sites handled so far by the current or last run
    pub fn handled_sites(&self) -> Vec<Site> {
        lock(&self.handled).clone()
    }

    /// Starts a new run, or resumes a paused one
    ///
    /// While `Stopped`, validates `options` and executes a whole run,
    /// returning when it ends. While `Paused`, resumes the run and returns
    /// immediately, ignoring `options`. While `Active` or while a stopped
    /// run is still winding down, does nothing.
    ///
    /// # Returns
    ///
    /// * `Ok(StartOutcome)` - What the call did
    /// * `Err(ScanError::Config)` - `options` failed validation; state is unchanged
    pub async fn start(&self, options: ScanOptions) -> Result<StartOutcome, ScanError> {
        match self.state.get() {
            RunState::Paused => {
                if self.resume() {
                    return Ok(StartOutcome::Resumed);
                }
                // Stopped in the meantime, fall through to a fresh start
            }
            RunState::Active => {
                tracing::debug!("Start ignored: a scan is already active");
                return Ok(StartOutcome::Ignored);
            }
            RunState::Stopped => {}
        }

        let Ok(_run) = self.run_guard.try_lock() else {
            tracing::debug!("Start ignored: previous scan is still finishing");
            return Ok(StartOutcome::Ignored);
        };

        if let Err(err) = validate_scan_options(&options) {
            tracing::warn!("Invalid scan options:\n{}", err);
            self.observer.log(&err.to_string());
            return Err(err.into());
        }

        let summary = self.run(&options).await;
        Ok(StartOutcome::Completed(summary))
    }

    /// Resumes a paused run
    ///
    /// Returns false if the scanner was not paused.
    pub fn resume(&self) -> bool {
        let resumed = self.state.transition(RunState::Paused, RunState::Active);
        if resumed {
            tracing::info!("Scan resumed");
            self.observer.log("Scan resumed");
        }
        resumed
    }

    /// Suspends an active run, interrupting the in-flight layer
    ///
    /// Returns false if no run was active.
    pub fn pause(&self) -> bool {
        // State first, so a layer armed after this sees Paused before it starts
        if !self.state.transition(RunState::Active, RunState::Paused) {
            return false;
        }
        self.cancel_current_layer();
        tracing::info!("Scan paused");
        self.observer.log("Scan paused");
        true
    }

    /// Terminates an active or paused run, interrupting the in-flight layer
    ///
    /// Returns false if no run was in progress.
    pub fn stop(&self) -> bool {
        let stopped = self.state.transition(RunState::Active, RunState::Stopped)
            || self.state.transition(RunState::Paused, RunState::Stopped);
        if !stopped {
            return false;
        }
        self.cancel_current_layer();
        tracing::info!("Scan stop requested");
        true
    }

    fn cancel_current_layer(&self) {
        lock(&self.cancel).cancel();
    }

    /// Installs a fresh cancellation token for the next layer
    fn arm_cancellation(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *lock(&self.cancel) = token.clone();
        token
    }

    /// Executes one run from reset to work-completed
    async fn run(&self, options: &ScanOptions) -> RunSummary {
        let started_at = Utc::now();

        lock(&self.handled).clear();
        self.observer.reset();

        let (frontier, seed) = Frontier::seeded(&options.base_url, options.scan_url_count);
        let frontier = Arc::new(frontier);
        self.arm_cancellation();
        self.state.set(RunState::Active);

        tracing::info!(
            "Scanning {} for {:?} with {} workers, up to {} URLs",
            options.base_url,
            options.searched_text,
            options.thread_count,
            options.scan_url_count
        );

        let executor = LayerExecutor::new(
            self.fetcher.clone(),
            self.extractor.clone(),
            self.observer.clone(),
            frontier.clone(),
            self.handled.clone(),
            &options.searched_text,
            options.thread_count,
            options.scan_url_count,
        );

        let mut layers = 0;
        let disposition = match self.drive(&executor, &frontier, seed, &mut layers).await {
            Ok(()) if self.state.get() == RunState::Stopped => Disposition::Canceled,
            Ok(()) => Disposition::Completed,
            Err(err) => {
                tracing::error!("Scan loop failed: {}", err);
                self.observer.log(&format!("Scan failed: {}", err));
                Disposition::Canceled
            }
        };

        self.observer.work_completed(disposition);
        self.state.set(RunState::Stopped);

        let handled = self.handled_sites();
        tracing::info!(
            "Scan {}: {} sites handled in {} layers",
            disposition,
            handled.len(),
            layers
        );

        RunSummary {
            disposition,
            handled,
            registered: frontier.registered(),
            layers,
            scan_url_count: options.scan_url_count,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Runs layers until the frontier drains or the run is stopped
    async fn drive(
        &self,
        executor: &LayerExecutor,
        frontier: &Frontier,
        seed: Site,
        layers: &mut usize,
    ) -> Result<(), ScanError> {
        let mut current = vec![seed];

        loop {
            match self.state.get() {
                RunState::Stopped => return Ok(()),
                RunState::Paused => {
                    self.state
                        .wait_while_paused(self.pause_poll, || tracing::trace!("Still paused"))
                        .await;
                    continue;
                }
                RunState::Active => {}
            }

            if current.is_empty() {
                current = frontier.take_next_layer();
                if current.is_empty() {
                    return Ok(());
                }
            }

            let cancel = self.arm_cancellation();
            if self.state.get() != RunState::Active {
                // Paused or stopped between the check above and arming
                continue;
            }

            *layers += 1;
            tracing::debug!("Layer {}: {} sites", layers, current.len());

            let report = executor
                .run_layer(std::mem::take(&mut current), cancel)
                .await?;

            if report.was_interrupted() {
                tracing::info!(
                    "Layer {} interrupted: {} of {} sites done, {} to retry",
                    layers,
                    report.completed,
                    report.total,
                    report.abandoned.len()
                );
            }

            // Interrupted sites are retried before the next layer
            current = report.abandoned;
        }
    }
}
