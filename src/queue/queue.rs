// Durable FIFO job queue on Redis lists.
//
// Jobs are LPUSHed onto `queue:{type}` and consumed with BRPOPLPUSH into
// `queue:{type}:processing`, so a worker crash leaves the in-flight job
// visible for requeueing instead of losing it (at-least-once delivery).
// Acking removes the entry from the processing list; jobs that exhaust
// their retries are parked on `queue:{type}:dead`.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::queue::job::{Job, JobType};
use crate::types::AppResult;

/// How long a blocking dequeue waits before returning empty-handed.
/// Kept short so worker loops stay responsive to shutdown.
const DEQUEUE_BLOCK_SECONDS: f64 = 5.0;

/// A dequeued job together with the exact list entry it was delivered as,
/// needed to ack (LREM) it from the processing list afterwards.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub job: Job,
    raw: String,
}

#[derive(Clone)]
pub struct JobQueue {
    conn: ConnectionManager,
}

impl JobQueue {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub fn pending_key(job_type: JobType) -> String {
        format!("queue:{}", job_type)
    }

    pub fn processing_key(job_type: JobType) -> String {
        format!("queue:{}:processing", job_type)
    }

    pub fn dead_letter_key(job_type: JobType) -> String {
        format!("queue:{}:dead", job_type)
    }

    /// Push a job onto its type's queue. Returns immediately once Redis
    /// accepts the entry; execution happens out-of-band in a worker.
    pub async fn enqueue(&self, job: &Job) -> AppResult<()> {
        let encoded = serde_json::to_string(job)?;
        let mut conn = self.conn.clone();
        let _: () = conn.lpush(Self::pending_key(job.job_type), encoded).await?;
        debug!(job_id = %job.id, job_type = %job.job_type, "Job enqueued");
        Ok(())
    }

    /// Blocking consumer-side pull. Atomically moves the oldest pending
    /// entry to the processing list and returns it, or `None` if nothing
    /// arrived within the block window.
    pub async fn dequeue(&self, job_type: JobType) -> AppResult<Option<Delivery>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .brpoplpush(
                Self::pending_key(job_type),
                Self::processing_key(job_type),
                DEQUEUE_BLOCK_SECONDS,
            )
            .await?;

        match raw {
            Some(raw) => {
                let job: Job = serde_json::from_str(&raw)?;
                Ok(Some(Delivery { job, raw }))
            }
            None => Ok(None),
        }
    }

    /// Remove a delivered job from the processing list once its outcome
    /// (success or terminal failure) has been recorded.
    pub async fn ack(&self, delivery: &Delivery) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .lrem(Self::processing_key(delivery.job.job_type), 1, &delivery.raw)
            .await?;
        Ok(())
    }

    /// Park a job that exhausted its retries on the dead-letter list for
    /// later inspection.
    pub async fn dead_letter(&self, job: &Job) -> AppResult<()> {
        let encoded = serde_json::to_string(job)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .lpush(Self::dead_letter_key(job.job_type), encoded)
            .await?;
        Ok(())
    }

    /// Move entries stranded on the processing list by a crashed worker
    /// back onto the pending queue. Called once at worker startup, before
    /// the consume loop begins.
    pub async fn recover_orphans(&self, job_type: JobType) -> AppResult<u64> {
        let mut conn = self.conn.clone();
        let mut recovered = 0u64;
        loop {
            let moved: Option<String> = conn
                .rpoplpush(Self::processing_key(job_type), Self::pending_key(job_type))
                .await?;
            if moved.is_none() {
                break;
            }
            recovered += 1;
        }
        if recovered > 0 {
            info!(job_type = %job_type, recovered, "Requeued orphaned in-flight jobs");
        }
        Ok(recovered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::job::JobPayload;
    use crate::redis::RedisClient;

    fn transcript_job(text: &str) -> Job {
        Job::new(
            JobType::Analysis,
            JobPayload::Analysis {
                transcript: text.to_string(),
            },
        )
    }

    async fn test_queue() -> JobQueue {
        let client = RedisClient::connect("redis://localhost:6379")
            .await
            .expect("redis");
        JobQueue::new(client.connection())
    }

    #[test]
    fn test_key_layout() {
        assert_eq!(JobQueue::pending_key(JobType::Analysis), "queue:analysis");
        assert_eq!(
            JobQueue::processing_key(JobType::Diarization),
            "queue:diarization:processing"
        );
        assert_eq!(
            JobQueue::dead_letter_key(JobType::Analysis),
            "queue:analysis:dead"
        );
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_enqueue_dequeue_fifo() {
        let queue = test_queue().await;
        let first = transcript_job("first");
        let second = transcript_job("second");
        queue.enqueue(&first).await.unwrap();
        queue.enqueue(&second).await.unwrap();

        let a = queue.dequeue(JobType::Analysis).await.unwrap().unwrap();
        let b = queue.dequeue(JobType::Analysis).await.unwrap().unwrap();
        assert_eq!(a.job.id, first.id);
        assert_eq!(b.job.id, second.id);

        queue.ack(&a).await.unwrap();
        queue.ack(&b).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_unacked_job_survives_via_recovery() {
        let queue = test_queue().await;
        let job = transcript_job("orphan");
        queue.enqueue(&job).await.unwrap();

        // Simulate a crash: dequeue without acking, then recover.
        let delivery = queue.dequeue(JobType::Analysis).await.unwrap().unwrap();
        assert_eq!(delivery.job.id, job.id);
        let recovered = queue.recover_orphans(JobType::Analysis).await.unwrap();
        assert!(recovered >= 1);

        let redelivered = queue.dequeue(JobType::Analysis).await.unwrap().unwrap();
        assert_eq!(redelivered.job.id, job.id);
        queue.ack(&redelivered).await.unwrap();
    }
}
