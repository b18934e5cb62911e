//! Crawl job state
//!
//! This module provides the shared state of one crawl.
//!
//! # Components
//!
//! - `JobId`: Opaque identifier handed out by the registry
//! - `CrawlStatus`: `Active` until the owning engine stops, then `Done`
//! - `CrawlJob`: Keyword, status, visited set and matched set of one crawl
//! - `CrawlView`: Serializable snapshot returned to API callers

mod crawl_job;
mod id;
mod status;

// Re-export main types
pub use crawl_job::{CrawlJob, CrawlView};
pub use id::JobId;
pub use status::CrawlStatus;
