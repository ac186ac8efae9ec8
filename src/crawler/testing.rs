//! Scripted collaborators for engine tests

use crate::crawler::fetcher::Fetcher;
use crate::output::{Disposition, ScanEvent, ScanObserver};
use crate::state::SiteStatus;
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

#[derive(Clone)]
enum Behavior {
    Page(String),
    Fail,
    Panic,
    Hang,
    Gated(String),
}

/// In-memory [`Fetcher`] answering from a script of URLs
///
/// Unknown URLs fail with HTTP 404.
pub struct MockFetcher {
    script: Mutex<HashMap<String, Behavior>>,
    fetches: Mutex<HashMap<String, usize>>,
    delay: Duration,
    gate: Arc<Semaphore>,
    in_flight: AtomicUsize,
    peak: Arc<AtomicUsize>,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(HashMap::new()),
            fetches: Mutex::new(HashMap::new()),
            delay: Duration::ZERO,
            gate: Arc::new(Semaphore::new(0)),
            in_flight: AtomicUsize::new(0),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn script(self, url: &str, behavior: Behavior) -> Self {
        self.script.lock().unwrap().insert(url.to_string(), behavior);
        self
    }

    pub fn page(self, url: &str, body: &str) -> Self {
        self.script(url, Behavior::Page(body.to_string()))
    }

    pub fn add_page(&self, url: &str, body: &str) {
        self.script
            .lock()
            .unwrap()
            .insert(url.to_string(), Behavior::Page(body.to_string()));
    }

    pub fn failing(self, url: &str) -> Self {
        self.script(url, Behavior::Fail)
    }

    pub fn panicking(self, url: &str) -> Self {
        self.script(url, Behavior::Panic)
    }

    /// The fetch never completes
    pub fn hanging(self, url: &str) -> Self {
        self.script(url, Behavior::Hang)
    }

    /// The fetch completes with `body` once [`MockFetcher::gate`] is opened
    pub fn gated(self, url: &str, body: &str) -> Self {
        self.script(url, Behavior::Gated(body.to_string()))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Handle to the gate releasing gated fetches
    pub fn gate(&self) -> Arc<Semaphore> {
        self.gate.clone()
    }

    /// Highest number of fetches observed in flight at once
    pub fn peak_in_flight(&self) -> Arc<AtomicUsize> {
        self.peak.clone()
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        *self.fetches.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let behavior = self.script.lock().unwrap().get(url).cloned();
        match behavior {
            Some(Behavior::Page(body)) => Ok(body),
            Some(Behavior::Fail) => Err(FetchError::Body("connection reset by peer".to_string())),
            Some(Behavior::Panic) => panic!("scripted panic for {}", url),
            Some(Behavior::Hang) => std::future::pending().await,
            Some(Behavior::Gated(body)) => {
                let _permit = self.gate.acquire().await;
                Ok(body)
            }
            None => Err(FetchError::Status { status: 404 }),
        }
    }
}

/// Shared-gate helper: releases every gated fetch, present and future
pub fn open_gate(gate: &Semaphore) {
    gate.add_permits(Semaphore::MAX_PERMITS / 2);
}

/// [`ScanObserver`] keeping every event in memory
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<ScanEvent>>,
    changed: Notify,
}

impl Recorder {
    fn push(&self, event: ScanEvent) {
        self.events.lock().unwrap().push(event);
        self.changed.notify_waiters();
    }

    pub fn events(&self) -> Vec<ScanEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Highest global progress reported so far
    pub fn handled(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                ScanEvent::GlobalProgress { handled, .. } => Some(*handled),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    pub fn global_progress(&self) -> Vec<usize> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                ScanEvent::GlobalProgress { handled, .. } => Some(*handled),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&ScanEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }

    /// Waits until global progress reaches `n`, panicking after 10 seconds
    pub async fn wait_for_handled(&self, n: usize) {
        self.wait_until(|recorder| recorder.handled() >= n).await
    }

    pub async fn wait_until(&self, condition: impl Fn(&Self) -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            let notified = self.changed.notified();
            if condition(self) {
                return;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                panic!("timed out waiting for scan events: {:?}", self.events());
            }
        }
    }
}

impl ScanObserver for Recorder {
    fn reset(&self) {
        self.push(ScanEvent::Reset);
    }

    fn site_downloading(&self, url: &str, id: usize, status: SiteStatus) {
        self.push(ScanEvent::SiteDownloading {
            url: url.to_string(),
            id,
            status,
        });
    }

    fn site_terminal(&self, id: usize, status: SiteStatus, error: Option<&str>) {
        self.push(ScanEvent::SiteTerminal {
            id,
            status,
            error: error.map(str::to_string),
        });
    }

    fn layer_progress(&self, completed: usize, total: usize) {
        self.push(ScanEvent::LayerProgress { completed, total });
    }

    fn global_progress(&self, handled: usize, scan_url_count: usize) {
        self.push(ScanEvent::GlobalProgress {
            handled,
            scan_url_count,
        });
    }

    fn discovery(&self, url: &str) {
        self.push(ScanEvent::Discovery {
            url: url.to_string(),
        });
    }

    fn log(&self, message: &str) {
        self.push(ScanEvent::Log {
            message: message.to_string(),
        });
    }

    fn work_completed(&self, disposition: Disposition) {
        self.push(ScanEvent::WorkCompleted { disposition });
    }
}
