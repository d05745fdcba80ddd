use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::models::{AppState, JobStatusResponse};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/job-status", get(job_status))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct JobStatusQuery {
    #[serde(rename = "jobId")]
    pub job_id: Option<String>,
}

/// Read-only poll endpoint. The job id is opaque to callers and shared
/// across both queues, so the lookup probes both result namespaces.
async fn job_status(
    State(state): State<AppState>,
    Query(query): Query<JobStatusQuery>,
) -> AppResult<Json<JobStatusResponse>> {
    let job_id = query
        .job_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::InvalidRequest("Missing jobId".to_string()))?;

    let status = state.results.lookup_status(&job_id).await?;
    Ok(Json(status))
}
