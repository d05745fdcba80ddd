use axum::{extract::State, routing::post, Json, Router};
use tracing::info;

use crate::models::{AnalyzeRequest, AppState, JobSubmission};
use crate::queue::job::{Job, JobPayload, JobType};
use crate::queue::results::{JobState, JobStateRecord};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/analyze", post(submit_analysis))
        .with_state(state)
}

/// Enqueue an analysis job for a transcript and return its id without
/// waiting for execution; callers poll `/api/job-status` for the outcome.
async fn submit_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> AppResult<Json<JobSubmission>> {
    if request.transcript.trim().is_empty() {
        return Err(AppError::InvalidRequest("Transcript is required".to_string()));
    }

    let job = Job::new(
        JobType::Analysis,
        JobPayload::Analysis {
            transcript: request.transcript,
        },
    );

    // Queued state is written before the job becomes visible to workers.
    state
        .results
        .set_state(
            job.job_type,
            &job.id,
            &JobStateRecord::new(JobState::Queued, 0, None),
        )
        .await?;
    state.queue.enqueue(&job).await?;

    info!(job_id = %job.id, "Analysis job submitted");
    Ok(Json(JobSubmission::queued(job.id)))
}
