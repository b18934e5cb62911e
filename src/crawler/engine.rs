//! Crawl engine - drives one crawl job to completion
//!
//! This module contains the worker pool that coordinates all aspects of
//! one crawl, including:
//! - Seeding the frontier from the base URL
//! - Claiming, fetching and matching pages in parallel workers
//! - Pushing extracted same-host links back onto the frontier
//! - Enforcing the wall-clock ceiling and stopping workers
//! - Marking the job done, whatever happened before

use crate::config::Config;
use crate::crawler::frontier::Frontier;
use crate::crawler::{FetchError, HtmlLinkExtractor, HttpPageFetcher, LinkExtractor, PageFetcher};
use crate::job::CrawlJob;
use crate::url::{extract_domain, same_host};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

/// Tunables for a crawl engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Parallel workers per crawl
    pub workers: usize,

    /// Wall-clock ceiling for one crawl
    pub crawl_timeout: Duration,

    /// Cooperative stop window before remaining workers are aborted
    pub shutdown_grace: Duration,

    /// Matched-URL count at which a milestone is logged
    pub milestone: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            crawl_timeout: Duration::from_secs(180),
            shutdown_grace: Duration::from_secs(5),
            milestone: 100,
        }
    }
}

impl From<&crate::config::CrawlConfig> for EngineConfig {
    fn from(config: &crate::config::CrawlConfig) -> Self {
        Self {
            workers: config.workers,
            crawl_timeout: config.timeout(),
            shutdown_grace: config.shutdown_grace(),
            milestone: config.milestone,
        }
    }
}

/// Runs crawls with a fixed-size worker pool
///
/// One engine may run any number of crawls, each with its own frontier and
/// workers; the fetcher and extractor are shared.
#[derive(Clone)]
pub struct CrawlEngine {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn LinkExtractor>,
    config: EngineConfig,
}

/// How the wait for workers ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitOutcome {
    Drained,
    TimedOut,
    Interrupted,
}

/// What a worker did with one URL taken from the frontier
#[derive(Debug)]
enum UrlOutcome {
    AlreadyVisited,
    Unparseable(url::ParseError),
    External,
    FetchFailed(FetchError),
    Processed { matched: bool, links: usize },
    Panicked(String),
}

impl CrawlEngine {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn LinkExtractor>,
        config: EngineConfig,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            config,
        }
    }

    /// Builds an engine with the HTTP fetcher and HTML extractor
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            Arc::new(HttpPageFetcher::new(&config.fetcher)?),
            Arc::new(HtmlLinkExtractor),
            EngineConfig::from(&config.crawl),
        ))
    }

    /// Crawls from `base_url`, recording results in `job`
    ///
    /// Returns once the frontier is drained or the wall-clock ceiling has
    /// passed and the workers have been stopped. The job is always `Done`
    /// afterwards.
    pub async fn run(&self, base_url: &str, job: Arc<CrawlJob>) {
        self.run_until(base_url, job, CancellationToken::new()).await
    }

    /// Like [`run`](Self::run), but also stops early when `shutdown` is
    /// cancelled. Results recorded up to that point are kept.
    pub async fn run_until(&self, base_url: &str, job: Arc<CrawlJob>, shutdown: CancellationToken) {
        match Url::parse(base_url) {
            Ok(seed) if seed.host_str().is_some() => {
                self.crawl(seed, &job, &shutdown).await;
            }
            Ok(_) => {
                error!(job_id = %job.id(), base_url, "Base URL has no host");
            }
            Err(e) => {
                error!(job_id = %job.id(), base_url, error = %e, "Malformed base URL");
            }
        }

        job.mark_done();
        info!(
            job_id = %job.id(),
            elapsed_ms = job.elapsed().num_milliseconds(),
            visited = job.visited_count(),
            matched = job.matched_count(),
            "Crawl finished"
        );
    }

    async fn crawl(&self, seed: Url, job: &Arc<CrawlJob>, shutdown: &CancellationToken) {
        info!(
            job_id = %job.id(),
            host = %extract_domain(&seed).unwrap_or_default(),
            workers = self.config.workers,
            "Starting crawl"
        );

        let frontier = Arc::new(Frontier::with_seed(seed.to_string()));
        let cancel = shutdown.child_token();
        let mut workers = JoinSet::new();

        for id in 0..self.config.workers {
            let worker = Worker {
                id,
                job: Arc::clone(job),
                frontier: Arc::clone(&frontier),
                fetcher: Arc::clone(&self.fetcher),
                extractor: Arc::clone(&self.extractor),
                seed: seed.clone(),
                cancel: cancel.clone(),
                milestone: self.config.milestone,
            };
            workers.spawn(worker.run());
        }

        let outcome = tokio::select! {
            drained = tokio::time::timeout(self.config.crawl_timeout, join_workers(&mut workers, job)) => {
                match drained {
                    Ok(()) => WaitOutcome::Drained,
                    Err(_) => WaitOutcome::TimedOut,
                }
            }
            _ = shutdown.cancelled() => WaitOutcome::Interrupted,
        };

        match outcome {
            WaitOutcome::Drained if frontier.is_drained() => {
                debug!(job_id = %job.id(), "All workers finished");
            }
            WaitOutcome::Drained => {
                error!(
                    job_id = %job.id(),
                    pending = frontier.pending(),
                    "All workers stopped with work still pending"
                );
            }
            WaitOutcome::TimedOut => {
                warn!(
                    job_id = %job.id(),
                    timeout_secs = self.config.crawl_timeout.as_secs(),
                    pending = frontier.pending(),
                    "Timeout waiting for workers"
                );
            }
            WaitOutcome::Interrupted => {
                warn!(job_id = %job.id(), pending = frontier.pending(), "Crawl interrupted by shutdown");
            }
        }

        if outcome != WaitOutcome::Drained {
            self.stop_workers(&mut workers, &cancel, job).await;
        }
    }

    /// Asks workers to stop, then aborts whatever is left after the grace period
    async fn stop_workers(
        &self,
        workers: &mut JoinSet<()>,
        cancel: &CancellationToken,
        job: &Arc<CrawlJob>,
    ) {
        cancel.cancel();

        let stopped =
            tokio::time::timeout(self.config.shutdown_grace, join_workers(workers, job)).await;
        if stopped.is_err() {
            warn!(
                job_id = %job.id(),
                remaining = workers.len(),
                "Workers did not terminate cleanly, aborting"
            );
            workers.abort_all();
            join_workers(workers, job).await;
        }
    }
}

/// Waits for every worker in the set, logging any that panicked
async fn join_workers(workers: &mut JoinSet<()>, job: &CrawlJob) {
    while let Some(result) = workers.join_next().await {
        if let Err(e) = result {
            if e.is_panic() {
                error!(job_id = %job.id(), error = %e, "Worker terminated unexpectedly");
            }
        }
    }
}

/// One member of a crawl's worker pool
struct Worker {
    id: usize,
    job: Arc<CrawlJob>,
    frontier: Arc<Frontier>,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn LinkExtractor>,
    seed: Url,
    cancel: CancellationToken,
    milestone: usize,
}

impl Worker {
    async fn run(self) {
        debug!(job_id = %self.job.id(), worker = self.id, "Worker started");

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                next = self.frontier.next() => next,
            };

            // None means the frontier has drained
            let Some(item) = next else { break };

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(job_id = %self.job.id(), worker = self.id, url = item.url(), "Stopped mid-page");
                    break;
                }
                outcome = AssertUnwindSafe(self.process(item.url())).catch_unwind() => {
                    let outcome = outcome.unwrap_or_else(|payload| UrlOutcome::Panicked(panic_message(payload)));
                    self.log_outcome(item.url(), &outcome);
                }
            }
        }

        debug!(job_id = %self.job.id(), worker = self.id, "Worker stopped");
    }

    async fn process(&self, url: &str) -> UrlOutcome {
        if !self.job.claim(url) {
            return UrlOutcome::AlreadyVisited;
        }

        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => return UrlOutcome::Unparseable(e),
        };

        if !same_host(&parsed, &self.seed) {
            return UrlOutcome::External;
        }

        let content = match self.fetcher.fetch(&parsed).await {
            Ok(content) => content,
            Err(e) => return UrlOutcome::FetchFailed(e),
        };

        let matched = content.contains(self.job.keyword());
        if matched && self.job.record_match(url) == Some(self.milestone) {
            info!(
                job_id = %self.job.id(),
                milestone = self.milestone,
                elapsed_ms = self.job.elapsed().num_milliseconds(),
                "Reached matched URL milestone"
            );
        }

        let links = self.extractor.extract(&parsed, &content);
        let links = self.frontier.extend(links);

        UrlOutcome::Processed { matched, links }
    }

    fn log_outcome(&self, url: &str, outcome: &UrlOutcome) {
        let job_id = self.job.id();
        let worker = self.id;

        match outcome {
            UrlOutcome::AlreadyVisited => {
                debug!(%job_id, worker, url, "Skipping already visited URL");
            }
            UrlOutcome::Unparseable(e) => {
                warn!(%job_id, worker, url, error = %e, "Error processing URL");
            }
            UrlOutcome::External => {
                debug!(%job_id, worker, url, "Skipping external URL");
            }
            UrlOutcome::FetchFailed(e) => {
                info!(%job_id, worker, url, error = %e, "Skipping URL");
            }
            UrlOutcome::Processed { matched: true, links } => {
                info!(%job_id, worker, url, links, "Found keyword");
            }
            UrlOutcome::Processed { matched: false, links } => {
                info!(%job_id, worker, url, links, "Processed URL");
            }
            UrlOutcome::Panicked(message) => {
                error!(%job_id, worker, url, error = %message, "Unexpected failure processing URL");
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
