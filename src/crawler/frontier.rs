//! Frontier and visited set for a single run
//!
//! This module handles:
//! - Deduplicating discovered URLs by exact string equality
//! - Assigning stable, monotonically increasing site ids
//! - Enforcing the distinct-URL cap
//! - Queueing newly registered sites for the next layer

use crate::crawler::Site;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// URL to id map, capped at a fixed number of entries
///
/// This is the sole deduplication authority of a run: a URL present here is
/// never queued, fetched or assigned an id again.
#[derive(Debug)]
pub struct VisitedSet {
    ids: HashMap<String, usize>,

    /// URLs in discovery order; the index is the id
    order: Vec<String>,

    cap: usize,
}

impl VisitedSet {
    pub fn new(cap: usize) -> Self {
        Self {
            ids: HashMap::new(),
            order: Vec::new(),
            cap,
        }
    }

    /// Registers `url` if it is new and the cap is not reached
    ///
    /// Returns the URL's id and whether it was newly registered. A URL seen
    /// before yields its existing id; a new URL rejected by the cap yields
    /// `None`. Nothing is mutated unless the second element is `true`.
    pub fn try_register(&mut self, url: &str) -> (Option<usize>, bool) {
        if let Some(&id) = self.ids.get(url) {
            return (Some(id), false);
        }

        if self.order.len() >= self.cap {
            return (None, false);
        }

        let id = self.order.len();
        self.ids.insert(url.to_string(), id);
        self.order.push(url.to_string());
        (Some(id), true)
    }

    pub fn get(&self, url: &str) -> Option<usize> {
        self.ids.get(url).copied()
    }

    /// Number of ids assigned so far
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.order.len() >= self.cap
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Registered URLs in id order
    pub fn urls(&self) -> &[String] {
        &self.order
    }
}

/// Visited set plus the queue of sites waiting for the next layer
///
/// Shared by every worker of a layer. Registration and enqueueing happen
/// under the same lock, so two workers discovering the same link cannot both
/// queue it and the cap cannot be overrun.
#[derive(Debug)]
pub struct Frontier {
    inner: Mutex<FrontierInner>,
}

#[derive(Debug)]
struct FrontierInner {
    visited: VisitedSet,
    next: VecDeque<Site>,
}

impl Frontier {
    /// Creates a frontier seeded with `base_url` as site 0
    pub fn seeded(base_url: &str, cap: usize) -> (Self, Site) {
        let mut visited = VisitedSet::new(cap.max(1));
        let (id, _) = visited.try_register(base_url);
        let seed = Site::new(base_url, id.unwrap_or(0));

        let frontier = Self {
            inner: Mutex::new(FrontierInner {
                visited,
                next: VecDeque::new(),
            }),
        };
        (frontier, seed)
    }

    fn lock(&self) -> MutexGuard<'_, FrontierInner> {
        // Both collections stay consistent across a panicking holder
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers a discovered link, queueing a new `Waiting` site if it is new
    ///
    /// Returns the queued site's id.
    pub fn offer(&self, url: &str) -> Option<usize> {
        let mut inner = self.lock();
        match inner.visited.try_register(url) {
            (Some(id), true) => {
                inner.next.push_back(Site::new(url, id));
                Some(id)
            }
            _ => None,
        }
    }

    /// Returns true if no more URLs can be registered
    pub fn is_full(&self) -> bool {
        self.lock().visited.is_full()
    }

    /// Removes and returns every site queued for the next layer
    pub fn take_next_layer(&self) -> Vec<Site> {
        self.lock().next.drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.lock().next.len()
    }

    /// Number of distinct URLs assigned an id so far
    pub fn registered(&self) -> usize {
        self.lock().visited.len()
    }

    /// Id previously assigned to `url`, if any
    pub fn id_of(&self, url: &str) -> Option<usize> {
        self.lock().visited.get(url)
    }
}
