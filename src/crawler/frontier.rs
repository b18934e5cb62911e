//! Shared frontier of discovered-but-unprocessed URLs
//!
//! This module handles:
//! - The lock-free multi-producer multi-consumer queue workers pull from
//! - The pending-work counter that decides when a crawl has run dry
//! - Waking idle workers when new work arrives or the crawl drains
//!
//! # Termination
//!
//! `pending` counts every URL pushed (the seed included) that has not yet
//! been fully processed. A worker holds a [`PendingUrl`] while it processes
//! a URL and pushes the links found on it *before* the guard is dropped, so
//! the counter can only reach zero once no worker can produce more work.
//! Workers stop when the queue is empty and the counter is zero.

use crossbeam_queue::SegQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Work queue shared by all workers of one crawl
#[derive(Debug, Default)]
pub struct Frontier {
    queue: SegQueue<String>,
    pending: AtomicUsize,
    wakeup: Notify,
}

/// A URL taken from the frontier
///
/// Dropping it marks the URL as fully processed, including when the worker
/// holding it is cancelled or panics.
#[derive(Debug)]
pub struct PendingUrl {
    url: String,
    frontier: Arc<Frontier>,
}

impl PendingUrl {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PendingUrl {
    fn drop(&mut self) {
        self.frontier.complete_one();
    }
}

impl Frontier {
    /// Creates a frontier holding only the seed URL
    pub fn with_seed(seed: impl Into<String>) -> Self {
        let frontier = Self::default();
        frontier.push(seed.into());
        frontier
    }

    /// Adds one URL to the frontier
    pub fn push(&self, url: String) {
        self.pending.fetch_add(1, Ordering::AcqRel);
        self.queue.push(url);
        self.wakeup.notify_waiters();
    }

    /// Adds every URL in `urls`, returning how many were pushed
    pub fn extend<I>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut count = 0;
        for url in urls {
            self.pending.fetch_add(1, Ordering::AcqRel);
            self.queue.push(url);
            count += 1;
        }
        if count > 0 {
            self.wakeup.notify_waiters();
        }
        count
    }

    /// URLs waiting in the queue
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// URLs pushed but not yet fully processed (queued or in flight)
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Returns true once every pushed URL has been fully processed
    pub fn is_drained(&self) -> bool {
        self.pending() == 0
    }

    /// Takes the next URL, waiting while other workers may still add work
    ///
    /// Returns `None` once the frontier is drained. Waiting is driven by
    /// notifications, not polling; callers that need to stop early should
    /// race this against their own cancellation signal.
    pub async fn next(self: &Arc<Self>) -> Option<PendingUrl> {
        loop {
            let notified = self.wakeup.notified();
            tokio::pin!(notified);
            // Register before checking so a push between the check and the
            // await still wakes us
            notified.as_mut().enable();

            if let Some(url) = self.queue.pop() {
                return Some(PendingUrl {
                    url,
                    frontier: Arc::clone(self),
                });
            }

            if self.is_drained() {
                return None;
            }

            notified.await;
        }
    }

    fn complete_one(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.wakeup.notify_waiters();
        }
    }
}
