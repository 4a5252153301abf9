use std::sync::atomic::{AtomicBool, Ordering};

use mirror_core::{Admission, FrontierState};
use tokio::sync::{Mutex, Notify};
use url::Url;

/// Deduplicating work queue shared by every in-flight fetch.
///
/// Wraps the single-threaded [`FrontierState`] in a mutex so the viewed-set
/// check and the queue append happen under one lock acquisition: concurrent
/// enqueues of the same URL produce exactly one queue entry. The queue is
/// bounded; producers wait for space instead of growing it.
pub struct Frontier {
    state: Mutex<FrontierState>,
    items: Notify,
    space: Notify,
    closed: AtomicBool,
}

impl Frontier {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(FrontierState::new(capacity)),
            items: Notify::new(),
            space: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Admits a URL, returning whether it was newly added.
    ///
    /// A duplicate returns `false` immediately. A new URL is recorded in the
    /// viewed set exactly once; if the queue is full this waits until a
    /// consumer frees space before appending.
    pub async fn enqueue(&self, url: &Url) -> bool {
        let admission = self.state.lock().await.admit(url);
        match admission {
            Admission::AlreadySeen => false,
            Admission::Enqueued => {
                self.items.notify_one();
                true
            }
            Admission::Deferred => {
                let mut pending = url.as_str().to_string();
                loop {
                    let space = self.space.notified();
                    {
                        let mut state = self.state.lock().await;
                        if state.has_capacity() {
                            state.push_deferred(std::mem::take(&mut pending));
                            self.items.notify_one();
                            return true;
                        }
                    }
                    if self.closed.load(Ordering::Acquire) {
                        // Shutting down; the URL stays viewed but is dropped.
                        return true;
                    }
                    space.await;
                }
            }
        }
    }

    /// Pops the oldest pending URL, suspending until one is available.
    /// Returns `None` once the frontier is closed and drained.
    pub async fn dequeue(&self) -> Option<String> {
        loop {
            let items = self.items.notified();
            if let Some(url) = self.pop_front().await {
                return Some(url);
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            items.await;
        }
    }

    /// Non-blocking variant of [`Frontier::dequeue`].
    pub async fn try_dequeue(&self) -> Option<String> {
        self.pop_front().await
    }

    async fn pop_front(&self) -> Option<String> {
        let mut state = self.state.lock().await;
        let next = state.pop();
        if next.is_some() {
            self.space.notify_one();
        }
        next
    }

    /// Whether the work queue currently holds no items. Does not imply the
    /// crawl is finished; an in-flight fetch may still enqueue more.
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.is_empty()
    }

    /// Number of distinct URLs ever admitted.
    pub async fn seen_count(&self) -> usize {
        self.state.lock().await.seen_count()
    }

    /// Permanently closes the frontier, waking all waiters.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.items.notify_waiters();
        self.space.notify_waiters();
    }
}
