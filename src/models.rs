use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::queue::job::JobType;
use crate::queue::queue::JobQueue;
use crate::queue::results::ResultStore;
use crate::redis::RedisClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub redis: RedisClient,
    pub queue: JobQueue,
    pub results: ResultStore,
}

// API Request/Response types

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub transcript: String,
}

#[derive(Debug, Deserialize)]
pub struct DiarizeUrlRequest {
    pub url: String,
}

/// Returned by both submission endpoints once the queue accepts the job.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSubmission {
    pub job_id: String,
    pub status: String,
}

impl JobSubmission {
    pub fn queued(job_id: String) -> Self {
        Self {
            job_id,
            status: "queued".to_string(),
        }
    }
}

/// Poll response. `completed` carries the stored result together with the
/// queue type the id resolved under.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatusResponse {
    Processing,
    Completed {
        #[serde(rename = "type")]
        job_type: JobType,
        result: serde_json::Value,
    },
    Failed {
        error: String,
    },
}

/// Structured medical insight extracted from a transcript. This is the
/// fixed shape every analysis result conforms to, parsed or fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub follow_up: Vec<String>,
    #[serde(default)]
    pub medical_terms: Vec<MedicalTerm>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub treatment_plan: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalTerm {
    pub term: String,
    pub definition: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub redis: String,
}
