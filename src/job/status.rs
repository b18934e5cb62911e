//! Crawl status definitions
//!
//! A crawl starts `Active` and moves to `Done` exactly once, when the engine
//! that owns it has stopped all of its workers.

use serde::Serialize;
use std::fmt;

/// Represents the lifecycle state of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    /// Workers may still be visiting pages
    Active,

    /// All workers have stopped; visited and matched sets are final
    Done,
}

impl CrawlStatus {
    /// Returns true if no further changes will be made to the job
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns the wire representation of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
