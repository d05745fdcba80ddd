// Medscribe - asynchronous diarization and medical-insight pipeline

pub mod config;
pub mod diarization;
pub mod insights;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod queue;
pub mod redis;
pub mod routes;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
