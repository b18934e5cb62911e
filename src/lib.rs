//! Keyword Crawler: a same-host keyword search crawler
//!
//! This crate crawls a website from a configured seed address, follows
//! same-host hyperlinks with a small pool of parallel workers, and records
//! which visited pages contain a requested keyword. Crawls are submitted and
//! inspected through a bounded job registry and a small HTTP API.

pub mod api;
pub mod config;
pub mod crawler;
pub mod job;
pub mod service;
pub mod url;

use thiserror::Error;

/// Main error type for process-level operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors surfaced to callers of the job registry
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The request was malformed (blank id, bad keyword, ...)
    #[error("{0}")]
    InvalidRequest(String),

    /// No job exists with the requested id
    #[error("No crawl found with id: {0}")]
    NotFound(String),

    /// Admission capacity is exhausted; the caller may retry later
    #[error("Crawl job could not be started due to system overload. Please try again later.")]
    Overloaded,
}

/// Result type alias for registry operations
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlEngine, EngineConfig, FetchError, HtmlLinkExtractor, HttpPageFetcher};
pub use job::{CrawlJob, CrawlStatus, CrawlView, JobId};
pub use service::JobRegistry;
