// Result and job-state stores.
//
// Completed job outputs are published under `{type}:result:{jobId}` with a
// fixed retention window; polling callers read them through the status
// lookup. Job state transitions (queued/running/succeeded/failed) are
// tracked separately under `{type}:state:{jobId}` so an exhausted-retry
// failure is distinguishable from "still running".

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use crate::models::JobStatusResponse;
use crate::queue::job::JobType;
use crate::types::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStateRecord {
    pub state: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempts: u32,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl JobStateRecord {
    pub fn new(state: JobState, attempts: u32, error: Option<String>) -> Self {
        Self {
            state,
            error,
            attempts,
            updated_at: chrono::Utc::now(),
        }
    }
}

#[derive(Clone)]
pub struct ResultStore {
    conn: ConnectionManager,
    ttl_seconds: u64,
}

impl ResultStore {
    pub fn new(conn: ConnectionManager, ttl_seconds: u64) -> Self {
        Self { conn, ttl_seconds }
    }

    pub fn result_key(job_type: JobType, job_id: &str) -> String {
        format!("{}:result:{}", job_type, job_id)
    }

    pub fn state_key(job_type: JobType, job_id: &str) -> String {
        format!("{}:state:{}", job_type, job_id)
    }

    /// Publish a completed job's output. Written once per job; entries
    /// expire after the retention window and are never deleted otherwise.
    pub async fn put_result(
        &self,
        job_type: JobType,
        job_id: &str,
        result: &serde_json::Value,
    ) -> AppResult<()> {
        let encoded = serde_json::to_string(result)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(Self::result_key(job_type, job_id), encoded, self.ttl_seconds)
            .await?;
        Ok(())
    }

    pub async fn get_result(
        &self,
        job_type: JobType,
        job_id: &str,
    ) -> AppResult<Option<serde_json::Value>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(Self::result_key(job_type, job_id)).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn set_state(
        &self,
        job_type: JobType,
        job_id: &str,
        record: &JobStateRecord,
    ) -> AppResult<()> {
        let encoded = serde_json::to_string(record)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(Self::state_key(job_type, job_id), encoded, self.ttl_seconds)
            .await?;
        Ok(())
    }

    pub async fn get_state(
        &self,
        job_type: JobType,
        job_id: &str,
    ) -> AppResult<Option<JobStateRecord>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(Self::state_key(job_type, job_id)).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Status lookup used by the polling endpoint. The id space is shared
    /// between both queues, so both result namespaces are probed; the
    /// analysis namespace is checked first and the first hit wins.
    pub async fn lookup_status(&self, job_id: &str) -> AppResult<JobStatusResponse> {
        for job_type in JobType::ALL {
            if let Some(result) = self.get_result(job_type, job_id).await? {
                return Ok(JobStatusResponse::Completed { job_type, result });
            }
        }
        for job_type in JobType::ALL {
            if let Some(record) = self.get_state(job_type, job_id).await? {
                return Ok(resolve_from_state(&record));
            }
        }
        Ok(JobStatusResponse::Processing)
    }
}

/// Map a state record (no result present) to the externally visible
/// status. Queued, running, and in-retry jobs all read as `processing`;
/// only an exhausted-retry failure surfaces as `failed`.
fn resolve_from_state(record: &JobStateRecord) -> JobStatusResponse {
    match record.state {
        JobState::Failed => JobStatusResponse::Failed {
            error: record
                .error
                .clone()
                .unwrap_or_else(|| "job failed".to_string()),
        },
        _ => JobStatusResponse::Processing,
    }
}
