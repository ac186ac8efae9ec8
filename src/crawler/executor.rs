//! Layer executor
//!
//! Runs one breadth-first layer: a pool of workers drains the layer's sites
//! from a shared queue, fetching, classifying and registering links for each
//! one, while progress is reported through the observer.
//!
//! Cancellation is cooperative. Workers check the layer's token before taking
//! a site, and an in-flight fetch races the token. A site whose fetch loses
//! that race goes back to `Waiting` and is returned in
//! [`LayerReport::abandoned`], together with every site no worker had
//! started, so the controller can retry them.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::{page_matches, LinkExtractor};
use crate::crawler::Site;
use crate::output::ScanObserver;
use crate::state::SiteStatus;
use crate::ScanError;
use futures::FutureExt;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Result of running one layer
#[derive(Debug, Default)]
pub struct LayerReport {
    /// Number of sites the layer started with
    pub total: usize,

    /// Number of sites that reached a terminal status
    pub completed: usize,

    /// Sites left `Waiting` by cancellation, ordered by id
    pub abandoned: Vec<Site>,
}

impl LayerReport {
    pub fn was_interrupted(&self) -> bool {
        !self.abandoned.is_empty()
    }
}

/// Collaborators and per-run settings shared by every worker
#[derive(Clone)]
pub struct LayerExecutor {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    observer: Arc<dyn ScanObserver>,
    frontier: Arc<Frontier>,
    handled: Arc<Mutex<Vec<Site>>>,
    searched_text: Arc<str>,
    thread_count: usize,
    scan_url_count: usize,
}

/// How a single visit ended
enum Visit {
    Classified(SiteStatus),
    Failed(String),
    Interrupted,
}

/// State of the layer currently being executed
struct LayerRun {
    executor: LayerExecutor,
    queue: Mutex<VecDeque<Site>>,
    abandoned: Mutex<Vec<Site>>,
    completed: AtomicUsize,
    total: usize,
    cancel: CancellationToken,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl LayerExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn LinkExtractor>,
        observer: Arc<dyn ScanObserver>,
        frontier: Arc<Frontier>,
        handled: Arc<Mutex<Vec<Site>>>,
        searched_text: &str,
        thread_count: usize,
        scan_url_count: usize,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            observer,
            frontier,
            handled,
            searched_text: Arc::from(searched_text),
            thread_count: thread_count.max(1),
            scan_url_count,
        }
    }

    /// Fetches and classifies `sites` with at most `thread_count` in flight
    ///
    /// Returns once every site is terminal or the layer was abandoned through
    /// `cancel`. Newly discovered links are queued on the frontier as a side
    /// effect. An error means a worker died outside per-site isolation.
    pub async fn run_layer(
        &self,
        sites: Vec<Site>,
        cancel: CancellationToken,
    ) -> Result<LayerReport, ScanError> {
        let total = sites.len();
        if total == 0 {
            return Ok(LayerReport::default());
        }

        let layer = Arc::new(LayerRun {
            executor: self.clone(),
            queue: Mutex::new(sites.into_iter().collect()),
            abandoned: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
            total,
            cancel,
        });

        let workers = self.thread_count.min(total);
        tracing::debug!("Running layer of {} sites on {} workers", total, workers);

        let mut pool = JoinSet::new();
        for _ in 0..workers {
            let layer = layer.clone();
            pool.spawn(async move { layer.work().await });
        }

        let mut failure = None;
        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Layer worker failed: {}", e);
                failure.get_or_insert_with(|| ScanError::Worker(e.to_string()));
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }

        // Sites no worker got to before cancellation
        let mut abandoned = std::mem::take(&mut *lock(&layer.abandoned));
        abandoned.extend(lock(&layer.queue).drain(..));
        abandoned.sort_by_key(|site| site.id);

        Ok(LayerReport {
            total,
            completed: layer.completed.load(Ordering::SeqCst),
            abandoned,
        })
    }

    /// Fetches one site and decides its terminal status
    async fn visit(&self, site: &mut Site, cancel: &CancellationToken) -> Visit {
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Visit::Interrupted,
            fetched = self.fetcher.fetch(&site.url) => fetched,
        };

        let content = match fetched {
            Ok(content) => content,
            Err(e) => return Visit::Failed(e.to_string()),
        };

        match self.extractor.extract_links(&content) {
            Ok(links) => site.links = links,
            Err(message) => {
                let err = ScanError::Extract {
                    url: site.url.clone(),
                    message,
                };
                tracing::warn!("{}", err);
                return Visit::Failed(err.to_string());
            }
        }

        if page_matches(&content, &self.searched_text) {
            Visit::Classified(SiteStatus::Found)
        } else {
            Visit::Classified(SiteStatus::NotFound)
        }
    }

    /// Queues the site's links for the next layer
    fn register_links(&self, site: &Site) {
        for link in &site.links {
            if self.frontier.is_full() {
                break;
            }
            if let Some(id) = self.frontier.offer(link) {
                tracing::trace!("Registered {} as site {}", link, id);
            }
        }
    }
}

impl LayerRun {
    fn next_site(&self) -> Option<Site> {
        lock(&self.queue).pop_front()
    }

    async fn work(&self) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            let Some(site) = self.next_site() else {
                break;
            };
            if let Some(site) = self.process(site).await {
                lock(&self.abandoned).push(site);
            }
        }
    }

    /// Runs one site to a terminal status, or returns it if interrupted
    async fn process(&self, mut site: Site) -> Option<Site> {
        let executor = &self.executor;
        let observer = &executor.observer;

        site.transition(SiteStatus::Downloading);
        observer.site_downloading(&site.url, site.id, site.status);

        let outcome = AssertUnwindSafe(executor.visit(&mut site, &self.cancel))
            .catch_unwind()
            .await;
        let visit = outcome.unwrap_or_else(|panic| {
            let message = format!("Unexpected failure: {}", panic_message(panic.as_ref()));
            tracing::error!("Site {} ({}): {}", site.id, site.url, message);
            observer.log(&format!("{}: {}", site.url, message));
            Visit::Failed(message)
        });

        match visit {
            Visit::Interrupted => {
                tracing::debug!("Site {} interrupted, returning it for retry", site.id);
                site.transition(SiteStatus::Waiting);
                return Some(site);
            }
            Visit::Failed(error) => site.fail(error),
            Visit::Classified(status) => {
                site.transition(status);
                executor.register_links(&site);
            }
        }

        self.finish(site);
        None
    }

    /// Records a terminal site and reports progress
    fn finish(&self, site: Site) {
        let executor = &self.executor;
        let observer = &executor.observer;

        observer.site_terminal(site.id, site.status, site.error_text.as_deref());
        if site.status == SiteStatus::Found {
            observer.discovery(&site.url);
        }

        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        observer.layer_progress(completed, self.total);

        // Reported under the lock so global progress never goes backwards
        let mut handled = lock(&executor.handled);
        handled.push(site);
        observer.global_progress(handled.len(), executor.scan_url_count);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}
