/// Site status definitions for tracking scan progress
///
/// A site moves `Waiting -> Downloading -> {Found | NotFound | Error}`.
/// The last three are terminal: a site in one of them is never processed again
/// within the same run.
use serde::Serialize;
use std::fmt;

/// Represents the current status of a site in the scan process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SiteStatus {
    // ===== Active States =====
    /// Site is queued and waiting to be fetched
    Waiting,

    /// Site is currently being fetched
    Downloading,

    // ===== Terminal States =====
    /// Page content contains the searched text
    Found,

    /// Page content does not contain the searched text
    NotFound,

    /// Page could not be fetched or processed
    Error,
}

impl SiteStatus {
    /// Returns true if this is a terminal status (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Found | Self::NotFound | Self::Error)
    }

    /// Returns true if the transition `self -> next` is allowed
    ///
    /// `Downloading -> Waiting` is allowed: a fetch interrupted by pause or
    /// stop hands its site back for retry.
    pub fn can_transition_to(&self, next: SiteStatus) -> bool {
        match (self, next) {
            (Self::Waiting, Self::Downloading) => true,
            (Self::Downloading, Self::Waiting) => true,
            (Self::Downloading, next) => next.is_terminal(),
            _ => false,
        }
    }

    /// Returns the status name as shown to observers
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::Downloading => "Downloading",
            Self::Found => "Found",
            Self::NotFound => "NotFound",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
