use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use crate::models::{AppState, DiarizeUrlRequest, JobSubmission};
use crate::queue::job::{DiarizationInput, Job, JobPayload, JobType};
use crate::queue::results::{JobState, JobStateRecord};
use crate::types::{AppError, AppResult};

/// Upper bound on accepted audio payloads (50 MiB).
const MAX_AUDIO_BYTES: usize = 50 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/diarize", post(submit_diarization))
        .with_state(state)
}

/// Enqueue a diarization job. Accepts `{"url": ...}` JSON, a multipart
/// form with an `audio` field, or the raw audio bytes with their content
/// type, mirroring what the upstream diarization endpoint understands.
async fn submit_diarization(
    State(state): State<AppState>,
    request: Request,
) -> AppResult<Json<JobSubmission>> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let input = if content_type.starts_with(mime::APPLICATION_JSON.essence_str()) {
        parse_url_body(request).await?
    } else if content_type.starts_with(mime::MULTIPART_FORM_DATA.essence_str()) {
        parse_multipart_body(request).await?
    } else if !content_type.is_empty() {
        parse_raw_body(content_type, request).await?
    } else {
        return Err(AppError::InvalidRequest(
            "Unsupported Content-Type".to_string(),
        ));
    };

    let job = Job::new(JobType::Diarization, JobPayload::Diarization { input });

    state
        .results
        .set_state(
            job.job_type,
            &job.id,
            &JobStateRecord::new(JobState::Queued, 0, None),
        )
        .await?;
    state.queue.enqueue(&job).await?;

    info!(job_id = %job.id, "Diarization job submitted");
    Ok(Json(JobSubmission::queued(job.id)))
}

async fn parse_url_body(request: Request) -> AppResult<DiarizationInput> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_AUDIO_BYTES)
        .await
        .map_err(|e| AppError::InvalidRequest(format!("unreadable body: {}", e)))?;
    let body: DiarizeUrlRequest = serde_json::from_slice(&bytes)
        .map_err(|_| AppError::InvalidRequest("Audio URL is required".to_string()))?;
    if body.url.trim().is_empty() {
        return Err(AppError::InvalidRequest("Audio URL is required".to_string()));
    }
    Ok(DiarizationInput::Url { url: body.url })
}

async fn parse_multipart_body(request: Request) -> AppResult<DiarizationInput> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| AppError::InvalidRequest(format!("invalid multipart body: {}", e)))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidRequest(format!("unreadable audio field: {}", e)))?;
        if data.is_empty() {
            break;
        }
        return Ok(DiarizationInput::Bytes {
            content_type,
            data: data.to_vec(),
        });
    }

    Err(AppError::InvalidRequest("Audio file is required".to_string()))
}

async fn parse_raw_body(content_type: String, request: Request) -> AppResult<DiarizationInput> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_AUDIO_BYTES)
        .await
        .map_err(|e| AppError::InvalidRequest(format!("unreadable body: {}", e)))?;
    if bytes.is_empty() {
        return Err(AppError::InvalidRequest("Audio payload is required".to_string()));
    }
    Ok(DiarizationInput::Bytes {
        content_type,
        data: bytes.to_vec(),
    })
}
