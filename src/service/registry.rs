use crate::config::{AdmissionConfig, Config};
use crate::crawler::CrawlEngine;
use crate::job::{CrawlJob, CrawlView, JobId};
use crate::{ServiceError, ServiceResult};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// Shortest accepted keyword, in characters
pub const MIN_KEYWORD_LEN: usize = 4;

/// Longest accepted keyword, in characters
pub const MAX_KEYWORD_LEN: usize = 32;

/// Process-wide table of crawl jobs plus the pool that runs them
///
/// Admission is two-level: `admission` holds one permit per job that is
/// running or waiting (running slots plus backlog) and is taken without
/// waiting, so a full pool rejects immediately; `running` bounds how many
/// admitted jobs crawl at the same time.
pub struct JobRegistry {
    jobs: DashMap<JobId, Arc<CrawlJob>>,
    engine: CrawlEngine,
    base_url: Arc<str>,
    admission: Arc<Semaphore>,
    running: Arc<Semaphore>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl JobRegistry {
    pub fn new(engine: CrawlEngine, base_url: impl Into<String>, admission: &AdmissionConfig) -> Self {
        let running = admission.max_concurrent_jobs;
        let admitted = running.saturating_add(admission.backlog);

        Self {
            jobs: DashMap::new(),
            engine,
            base_url: Arc::from(base_url.into()),
            admission: Arc::new(Semaphore::new(admitted)),
            running: Arc::new(Semaphore::new(running)),
            tracker: TaskTracker::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Builds a registry with an HTTP-backed engine
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            CrawlEngine::from_config(config)?,
            config.crawl.base_url.clone(),
            &config.admission,
        ))
    }

    /// Validates the keyword, stores a new active job and starts its crawl
    ///
    /// Must be called from within a tokio runtime. Nothing is stored when
    /// the request is rejected.
    ///
    /// # Errors
    ///
    /// * `InvalidRequest` - blank keyword, or length outside 4..=32 characters
    /// * `Overloaded` - every running slot and backlog place is taken, or the
    ///   registry is shutting down
    pub fn create_job(&self, keyword: &str) -> ServiceResult<JobId> {
        validate_keyword(keyword)?;

        let admitted = Arc::clone(&self.admission)
            .try_acquire_owned()
            .map_err(|_| {
                error!(keyword, "Rejected crawl job due to system overload");
                ServiceError::Overloaded
            })?;

        let job = self.insert_new_job(keyword);
        info!(job_id = %job.id(), keyword = job.keyword(), "Crawl job created");

        let id = job.id().clone();
        self.spawn_run(job, admitted);
        Ok(id)
    }

    /// Returns a snapshot of the job with the given id
    ///
    /// # Errors
    ///
    /// * `InvalidRequest` - the id is blank
    /// * `NotFound` - no job has this id
    pub fn get_job(&self, id: &str) -> ServiceResult<CrawlView> {
        if id.trim().is_empty() {
            warn!("Attempted to get crawl results with a blank id");
            return Err(ServiceError::InvalidRequest(
                "Crawl id cannot be empty.".to_string(),
            ));
        }

        let job = self.job(id).ok_or_else(|| {
            warn!(job_id = id, "Crawl job not found");
            ServiceError::NotFound(id.to_string())
        })?;

        debug!(job_id = id, status = %job.status(), "Retrieved crawl results");
        Ok(job.view())
    }

    /// Shared handle to a stored job
    pub fn job(&self, id: &str) -> Option<Arc<CrawlJob>> {
        self.jobs.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of stored jobs, finished ones included
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Jobs that have not reached `Done` yet
    pub fn active_count(&self) -> usize {
        self.jobs.iter().filter(|entry| !entry.value().is_done()).count()
    }

    /// Stops admitting jobs, interrupts running crawls and waits for them
    ///
    /// Every stored job is `Done` once this returns.
    pub async fn shutdown(&self) {
        info!(running = self.tracker.len(), "Shutting down job registry");

        self.admission.close();
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;

        info!(jobs = self.jobs.len(), "All crawl jobs stopped");
    }

    fn insert_new_job(&self, keyword: &str) -> Arc<CrawlJob> {
        loop {
            let id = JobId::generate();
            if let Entry::Vacant(entry) = self.jobs.entry(id.clone()) {
                let job = Arc::new(CrawlJob::new(id, keyword));
                entry.insert(Arc::clone(&job));
                return job;
            }
            debug!(job_id = %id, "Generated job id already in use, retrying");
        }
    }

    fn spawn_run(&self, job: Arc<CrawlJob>, admitted: OwnedSemaphorePermit) {
        let engine = self.engine.clone();
        let base_url = Arc::clone(&self.base_url);
        let running = Arc::clone(&self.running);
        let shutdown = self.shutdown.child_token();

        self.tracker.spawn(async move {
            let _admitted = admitted;
            let _done = DoneGuard(Arc::clone(&job));

            let slot = tokio::select! {
                slot = running.acquire_owned() => slot,
                _ = shutdown.cancelled() => {
                    warn!(job_id = %job.id(), "Shutdown before crawl started");
                    return;
                }
            };
            let Ok(_slot) = slot else {
                return;
            };

            debug!(job_id = %job.id(), "Crawl job started");
            engine.run_until(&base_url, job, shutdown).await;
        });
    }
}

/// Marks a job done when its run ends, even if the engine never got to
struct DoneGuard(Arc<CrawlJob>);

impl Drop for DoneGuard {
    fn drop(&mut self) {
        if self.0.mark_done() {
            warn!(job_id = %self.0.id(), "Crawl job ended without finishing its crawl");
        }
    }
}

/// Checks a crawl keyword
///
/// The keyword must not be blank, and its length in characters (surrounding
/// whitespace included) must be within `MIN_KEYWORD_LEN..=MAX_KEYWORD_LEN`.
pub fn validate_keyword(keyword: &str) -> ServiceResult<()> {
    if keyword.trim().is_empty() {
        warn!("Received invalid crawl request: blank keyword");
        return Err(ServiceError::InvalidRequest(
            "Crawl request cannot be null and keyword cannot be empty".to_string(),
        ));
    }

    let len = keyword.chars().count();
    if !(MIN_KEYWORD_LEN..=MAX_KEYWORD_LEN).contains(&len) {
        warn!(keyword, len, "Keyword length out of bounds");
        return Err(ServiceError::InvalidRequest(format!(
            "Keyword must be between {} and {} characters.",
            MIN_KEYWORD_LEN, MAX_KEYWORD_LEN
        )));
    }

    Ok(())
}
