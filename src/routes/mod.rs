//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `/api/analyze` - Submit a transcript for insight extraction
//! - `/api/diarize` - Submit audio (URL, raw bytes, or multipart) for diarization
//! - `/api/job-status` - Poll a submitted job by id
//! - `/api/health` - Health checks

pub mod analyze;
pub mod diarize;
pub mod health;
pub mod job_status;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let allowed_origins = state.config.server.cors_allowed_origins.clone();
    let api_router = Router::new()
        .merge(analyze::router(state.clone()))
        .merge(diarize::router(state.clone()))
        .merge(job_status::router(state.clone()))
        .merge(health::router(state));

    apply_cors(api_router, &allowed_origins).layer(TraceLayer::new_for_http())
}
