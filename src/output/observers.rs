//! Stock [`ScanObserver`] implementations

use crate::output::traits::{Disposition, ScanEvent, ScanObserver};
use crate::state::SiteStatus;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Forwards every notification onto an unbounded channel
///
/// The receiving end is meant to be drained by a separate forwarding task,
/// e.g. one relaying events to a remote UI. Events sent after the receiver
/// was dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: UnboundedSender<ScanEvent>,
}

impl ChannelObserver {
    /// Creates an observer together with the receiving end of its channel
    pub fn new() -> (Self, UnboundedReceiver<ScanEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: ScanEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("Event receiver dropped, discarding event");
        }
    }
}

impl ScanObserver for ChannelObserver {
    fn reset(&self) {
        self.send(ScanEvent::Reset);
    }

    fn site_downloading(&self, url: &str, id: usize, status: SiteStatus) {
        self.send(ScanEvent::SiteDownloading {
            url: url.to_string(),
            id,
            status,
        });
    }

    fn site_terminal(&self, id: usize, status: SiteStatus, error: Option<&str>) {
        self.send(ScanEvent::SiteTerminal {
            id,
            status,
            error: error.map(str::to_string),
        });
    }

    fn layer_progress(&self, completed: usize, total: usize) {
        self.send(ScanEvent::LayerProgress { completed, total });
    }

    fn global_progress(&self, handled: usize, scan_url_count: usize) {
        self.send(ScanEvent::GlobalProgress {
            handled,
            scan_url_count,
        });
    }

    fn discovery(&self, url: &str) {
        self.send(ScanEvent::Discovery {
            url: url.to_string(),
        });
    }

    fn log(&self, message: &str) {
        self.send(ScanEvent::Log {
            message: message.to_string(),
        });
    }

    fn work_completed(&self, disposition: Disposition) {
        self.send(ScanEvent::WorkCompleted { disposition });
    }
}

/// Renders notifications as tracing events
///
/// Per-site chatter is logged at debug level; discoveries, layer boundaries
/// and the final disposition at info.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ScanObserver for TracingObserver {
    fn reset(&self) {
        tracing::info!("Starting new scan");
    }

    fn site_downloading(&self, url: &str, id: usize, status: SiteStatus) {
        tracing::debug!("[{}] {} {}", id, status, url);
    }

    fn site_terminal(&self, id: usize, status: SiteStatus, error: Option<&str>) {
        match error {
            Some(error) => tracing::warn!("[{}] {}: {}", id, status, error),
            None => tracing::debug!("[{}] {}", id, status),
        }
    }

    fn layer_progress(&self, completed: usize, total: usize) {
        tracing::trace!("Layer progress: {}/{}", completed, total);
        if completed == total {
            tracing::info!("Layer finished: {} sites", total);
        }
    }

    fn global_progress(&self, handled: usize, scan_url_count: usize) {
        tracing::debug!("Global progress: {}/{}", handled, scan_url_count);
    }

    fn discovery(&self, url: &str) {
        tracing::info!("Found: {}", url);
    }

    fn log(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn work_completed(&self, disposition: Disposition) {
        tracing::info!("{}", disposition.message());
    }
}
