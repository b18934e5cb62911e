use super::ApiError;
use crate::job::{CrawlView, JobId};
use crate::service::JobRegistry;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Body of `POST /crawl`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlRequest {
    /// Missing is treated like blank
    #[serde(default)]
    pub keyword: String,
}

/// Body returned for a newly created crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedResponse {
    pub id: JobId,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub jobs: usize,
}

pub(super) async fn create_crawl(
    State(registry): State<Arc<JobRegistry>>,
    request: Result<Json<CrawlRequest>, JsonRejection>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let Json(request) = request?;
    let id = registry.create_job(&request.keyword)?;
    info!(job_id = %id, "Accepted crawl request");
    Ok(Json(CreatedResponse { id }))
}

pub(super) async fn get_crawl(
    State(registry): State<Arc<JobRegistry>>,
    Path(id): Path<String>,
) -> Result<Json<CrawlView>, ApiError> {
    Ok(Json(registry.get_job(&id)?))
}

pub(super) async fn health(State(registry): State<Arc<JobRegistry>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        jobs: registry.len(),
    })
}
