//! Observer trait and event types
//!
//! The scan engine reports everything it does through a [`ScanObserver`]
//! handed to it at construction. The notification set mirrors what a remote
//! UI needs to render a live node list and progress bars.

use crate::state::SiteStatus;
use serde::Serialize;
use std::fmt;

/// Final disposition of a run, carried by the work-completed notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Disposition {
    /// The frontier drained or the distinct-URL cap was reached
    Completed,

    /// The run was stopped, or its loop failed
    Canceled,
}

impl Disposition {
    /// Returns the message shown to the user when a run ends
    pub fn message(&self) -> &'static str {
        match self {
            Self::Completed => "Process completed successfully!",
            Self::Canceled => "Process canceled!",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Canceled => f.write_str("canceled"),
        }
    }
}

/// A single notification emitted by the scan engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ScanEvent {
    /// A new run was validated and begins; clear any previous visualization
    Reset,

    /// A site began fetching
    SiteDownloading {
        url: String,
        id: usize,
        status: SiteStatus,
    },

    /// A site reached Found, NotFound or Error
    SiteTerminal {
        id: usize,
        status: SiteStatus,
        error: Option<String>,
    },

    /// A site of the current layer completed
    LayerProgress { completed: usize, total: usize },

    /// A site of any layer completed
    GlobalProgress { handled: usize, scan_url_count: usize },

    /// A site's content matched the searched text
    Discovery { url: String },

    /// Diagnostic message, not authoritative
    Log { message: String },

    /// The run loop exited
    WorkCompleted { disposition: Disposition },
}

/// Receiver of scan notifications
///
/// Implementations must be thread-safe: workers of the same layer call into
/// the observer concurrently. Calls must not block, since some of them are
/// made while the engine holds a lock that orders global progress.
pub trait ScanObserver: Send + Sync {
    /// Called once a new run has passed validation
    fn reset(&self);

    /// Called when a site starts fetching
    fn site_downloading(&self, url: &str, id: usize, status: SiteStatus);

    /// Called when a site reaches a terminal status
    fn site_terminal(&self, id: usize, status: SiteStatus, error: Option<&str>);

    /// Called after each site of a layer completes
    fn layer_progress(&self, completed: usize, total: usize);

    /// Called after each site completes, with the run-wide handled count
    fn global_progress(&self, handled: usize, scan_url_count: usize);

    /// Called with the URL of a site whose content matched
    fn discovery(&self, url: &str);

    /// Called with free-text diagnostics
    fn log(&self, message: &str);

    /// Called when the run loop exits
    fn work_completed(&self, disposition: Disposition);

    /// Dispatches a [`ScanEvent`] to the matching method
    fn emit(&self, event: &ScanEvent) {
        match event {
            ScanEvent::Reset => self.reset(),
            ScanEvent::SiteDownloading { url, id, status } => {
                self.site_downloading(url, *id, *status)
            }
            ScanEvent::SiteTerminal { id, status, error } => {
                self.site_terminal(*id, *status, error.as_deref())
            }
            ScanEvent::LayerProgress { completed, total } => {
                self.layer_progress(*completed, *total)
            }
            ScanEvent::GlobalProgress {
                handled,
                scan_url_count,
            } => self.global_progress(*handled, *scan_url_count),
            ScanEvent::Discovery { url } => self.discovery(url),
            ScanEvent::Log { message } => self.log(message),
            ScanEvent::WorkCompleted { disposition } => self.work_completed(*disposition),
        }
    }
}
