use crate::job::{CrawlStatus, JobId};
use chrono::{DateTime, Utc};
use dashmap::DashSet;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Shared state of one crawl
///
/// A job is created by the registry and mutated only by the workers of the
/// single engine run assigned to it. Every operation is non-blocking and
/// safe to call from any thread; readers may observe the sets and the status
/// change underneath them, but never see a partially applied update of a
/// single URL.
///
/// Invariants:
/// - a URL enters `visited` at most once (the claim is the dedup gate)
/// - `matched` is a subset of `visited`
/// - status moves from `Active` to `Done` exactly once
#[derive(Debug)]
pub struct CrawlJob {
    id: JobId,
    keyword: String,
    done: AtomicBool,
    visited: DashSet<String>,
    matched: DashSet<String>,
    matches_recorded: AtomicUsize,
    created_at: DateTime<Utc>,
}

/// Snapshot of a job as returned to API callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlView {
    pub id: JobId,
    pub status: CrawlStatus,
    /// Matched URLs, sorted
    pub urls: Vec<String>,
}

impl CrawlJob {
    /// Creates a new active job; the keyword is stored lowercased
    pub fn new(id: JobId, keyword: &str) -> Self {
        Self {
            id,
            keyword: keyword.to_lowercase(),
            done: AtomicBool::new(false),
            visited: DashSet::new(),
            matched: DashSet::new(),
            matches_recorded: AtomicUsize::new(0),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Time since the job was created
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }

    pub fn status(&self) -> CrawlStatus {
        if self.done.load(Ordering::Acquire) {
            CrawlStatus::Done
        } else {
            CrawlStatus::Active
        }
    }

    pub fn is_done(&self) -> bool {
        self.status().is_terminal()
    }

    /// Attempts to claim a URL for processing
    ///
    /// Returns true only for the first claim of a given URL across all
    /// workers; every later attempt returns false.
    pub fn claim(&self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    /// Records a URL whose content contains the keyword
    ///
    /// Idempotent. Returns the number of matches recorded so far, this one
    /// included, if the URL was newly recorded; each count is handed out
    /// exactly once. URLs that were never claimed, or that arrive after the
    /// job is done, are ignored.
    pub fn record_match(&self, url: &str) -> Option<usize> {
        if self.is_done() || !self.visited.contains(url) {
            return None;
        }
        if !self.matched.insert(url.to_string()) {
            return None;
        }
        Some(self.matches_recorded.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Transitions the job to `Done`
    ///
    /// Returns true on the transition, false if the job was already done.
    pub fn mark_done(&self) -> bool {
        !self.done.swap(true, Ordering::AcqRel)
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn is_matched(&self, url: &str) -> bool {
        self.matched.contains(url)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn matched_count(&self) -> usize {
        self.matched.len()
    }

    /// Sorted snapshot of the visited set
    pub fn visited_urls(&self) -> Vec<String> {
        snapshot(&self.visited)
    }

    /// Sorted snapshot of the matched set
    pub fn matched_urls(&self) -> Vec<String> {
        snapshot(&self.matched)
    }

    /// Snapshot for API responses
    pub fn view(&self) -> CrawlView {
        CrawlView {
            id: self.id.clone(),
            status: self.status(),
            urls: self.matched_urls(),
        }
    }
}

fn snapshot(set: &DashSet<String>) -> Vec<String> {
    let mut urls: Vec<String> = set.iter().map(|entry| entry.key().clone()).collect();
    urls.sort();
    urls
}
