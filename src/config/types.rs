use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure
///
/// Every section and key has a default, so an empty file is a valid
/// configuration apart from the base URL, which must come from the file,
/// the command line, or the `BASE_URL` environment variable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub fetcher: FetcherConfig,
    pub admission: AdmissionConfig,
    pub server: ServerConfig,
}

/// Per-crawl engine behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Seed URL used by every crawl in this process
    pub base_url: String,

    /// Number of parallel workers per crawl
    pub workers: usize,

    /// Wall-clock ceiling for one crawl (seconds)
    pub timeout_secs: u64,

    /// Time given to workers to stop cooperatively after the ceiling (seconds)
    pub shutdown_grace_secs: u64,

    /// Matched-URL count at which a progress milestone is logged
    pub milestone: usize,
}

impl CrawlConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            workers: 4,
            timeout_secs: 180,
            shutdown_grace_secs: 5,
            milestone: 100,
        }
    }
}

/// Page fetcher settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// User-Agent header sent with every request
    pub user_agent: String,

    /// TCP connect timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Timeout for receiving the full response (milliseconds)
    pub read_timeout_ms: u64,
}

impl FetcherConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0".to_string(),
            connect_timeout_ms: 3000,
            read_timeout_ms: 3000,
        }
    }
}

/// Admission control for concurrently running crawl jobs
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AdmissionConfig {
    /// Crawls allowed to run at the same time
    pub max_concurrent_jobs: usize,

    /// Admitted crawls allowed to wait for a running slot
    pub backlog: usize,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 16,
            backlog: 100,
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Socket address the API listens on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:4567".to_string(),
        }
    }
}
