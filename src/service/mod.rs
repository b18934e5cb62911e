//! Job registry and admission control
//!
//! This module owns every crawl job created by the process and decides
//! whether a new crawl may start:
//! - Keyword validation before anything is stored
//! - Bounded admission (running slots plus a waiting backlog)
//! - Spawning admitted crawls and tracking them until shutdown

mod registry;

pub use registry::{validate_keyword, JobRegistry, MAX_KEYWORD_LEN, MIN_KEYWORD_LEN};
