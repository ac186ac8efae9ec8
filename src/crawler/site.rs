use crate::state::SiteStatus;

/// One discovered URL under traversal
///
/// `id` is assigned once, when the URL first passes the visited-set check,
/// and never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub id: usize,
    pub url: String,
    pub status: SiteStatus,

    /// Outbound links, populated after a successful fetch
    pub links: Vec<String>,

    /// Set only when `status` is `Error`
    pub error_text: Option<String>,
}

impl Site {
    /// Creates a freshly discovered site in the `Waiting` status
    pub fn new(url: impl Into<String>, id: usize) -> Self {
        Self {
            id,
            url: url.into(),
            status: SiteStatus::Waiting,
            links: Vec::new(),
            error_text: None,
        }
    }

    /// Moves the site to `next`, ignoring transitions the status machine forbids
    ///
    /// Returns true if the status changed.
    pub fn transition(&mut self, next: SiteStatus) -> bool {
        if !self.status.can_transition_to(next) {
            tracing::warn!(
                "Ignoring invalid transition for site {}: {} -> {}",
                self.id,
                self.status,
                next
            );
            return false;
        }
        self.status = next;
        true
    }

    /// Marks the site as failed with a non-empty error text
    pub fn fail(&mut self, error: impl Into<String>) {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "Unknown error".to_string();
        }
        if self.transition(SiteStatus::Error) {
            self.error_text = Some(error);
        }
    }
}
