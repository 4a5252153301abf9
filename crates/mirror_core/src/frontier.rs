use std::collections::{HashSet, VecDeque};

use url::Url;

/// Default bound for the pending-work queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Outcome of offering a URL to the frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Newly seen and appended to the work queue.
    Enqueued,
    /// Already recorded earlier in the crawl; dropped.
    AlreadySeen,
    /// Newly seen, but the queue is at capacity. The URL is recorded in the
    /// viewed set; the caller must `push_deferred` it once space frees up.
    Deferred,
}

/// Single-threaded frontier state: the set of every URL ever admitted plus
/// the FIFO queue of URLs awaiting fetch.
///
/// The viewed set only ever grows. A URL enters it exactly once, in `admit`,
/// so a URL popped from the queue can never be admitted again.
#[derive(Debug)]
pub struct FrontierState {
    viewed: HashSet<String>,
    queue: VecDeque<String>,
    capacity: usize,
}

impl FrontierState {
    pub fn new(capacity: usize) -> Self {
        Self {
            viewed: HashSet::new(),
            queue: VecDeque::new(),
            capacity,
        }
    }

    /// Check-and-insert against the viewed set, then queue when possible.
    pub fn admit(&mut self, url: &Url) -> Admission {
        let key = url.as_str();
        if self.viewed.contains(key) {
            return Admission::AlreadySeen;
        }
        self.viewed.insert(key.to_string());
        if self.queue.len() < self.capacity {
            self.queue.push_back(key.to_string());
            Admission::Enqueued
        } else {
            Admission::Deferred
        }
    }

    /// Appends a URL that `admit` previously returned `Deferred` for.
    ///
    /// The caller is responsible for waiting until `has_capacity` holds.
    pub fn push_deferred(&mut self, url: String) {
        debug_assert!(self.viewed.contains(&url));
        self.queue.push_back(url);
    }

    pub fn pop(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn has_capacity(&self) -> bool {
        self.queue.len() < self.capacity
    }

    /// Number of distinct URLs ever admitted, queued or not.
    pub fn seen_count(&self) -> usize {
        self.viewed.len()
    }
}
