//! Crawler module for page retrieval and crawl execution
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with bounded timeouts
//! - HTML parsing and same-host link extraction
//! - The shared frontier and its termination accounting
//! - The worker pool that drives one crawl job to completion

mod engine;
mod fetcher;
mod frontier;
mod parser;

pub use engine::{CrawlEngine, EngineConfig};
pub use fetcher::{build_http_client, fetch_page, FetchError, HttpPageFetcher, PageFetcher};
pub use frontier::{Frontier, PendingUrl};
pub use parser::{extract_links, HtmlLinkExtractor, LinkExtractor};
