// Per-type worker loops.
//
// One worker runs continuously per job type: pull the next job, invoke the
// external service under a deadline, normalize the output, publish it to
// the result store. Upstream failures are retried with bounded exponential
// backoff; a job that exhausts its attempts is recorded as failed and
// parked on the dead-letter list. Per-job errors never take the loop down.
// Queue or store connectivity errors do: they propagate out of `run` so
// process supervision can restart the worker.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

use crate::diarization::DiarizationClient;
use crate::insights;
use crate::llm::{ChatMessage, CompletionRequest, LlmAdapter};
use crate::queue::job::{Job, JobPayload, JobType, RetryPolicy};
use crate::queue::queue::{Delivery, JobQueue};
use crate::queue::results::{JobState, JobStateRecord, ResultStore};
use crate::types::{AppError, AppResult};

/// Executes one job against its external service and returns the
/// normalized result to store.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, job: &Job) -> AppResult<serde_json::Value>;
}

/// Analysis jobs: transcript in, structured insight report out.
pub struct AnalysisExecutor {
    llm: Arc<dyn LlmAdapter>,
    max_tokens: u32,
    temperature: f32,
}

impl AnalysisExecutor {
    pub fn new(llm: Arc<dyn LlmAdapter>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            llm,
            max_tokens,
            temperature,
        }
    }
}

#[async_trait]
impl JobExecutor for AnalysisExecutor {
    async fn execute(&self, job: &Job) -> AppResult<serde_json::Value> {
        let JobPayload::Analysis { transcript } = &job.payload else {
            return Err(AppError::Internal(format!(
                "analysis worker received a {} payload",
                job.job_type
            )));
        };

        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(insights::SYSTEM_PROMPT),
                ChatMessage::user(insights::user_prompt(transcript)),
            ],
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
        };

        let response = self.llm.create_chat_completion(&request).await?;
        let report = insights::normalize(&response.content);
        Ok(serde_json::to_value(report)?)
    }
}

/// Diarization jobs: audio reference in, upstream JSON passed through.
pub struct DiarizationExecutor {
    client: DiarizationClient,
}

impl DiarizationExecutor {
    pub fn new(client: DiarizationClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JobExecutor for DiarizationExecutor {
    async fn execute(&self, job: &Job) -> AppResult<serde_json::Value> {
        let JobPayload::Diarization { input } = &job.payload else {
            return Err(AppError::Internal(format!(
                "diarization worker received a {} payload",
                job.job_type
            )));
        };
        self.client.diarize(input).await
    }
}

pub struct Worker {
    job_type: JobType,
    queue: JobQueue,
    results: ResultStore,
    executor: Box<dyn JobExecutor>,
    retry: RetryPolicy,
    job_timeout: Duration,
}

impl Worker {
    pub fn new(
        job_type: JobType,
        queue: JobQueue,
        results: ResultStore,
        executor: Box<dyn JobExecutor>,
        retry: RetryPolicy,
        job_timeout: Duration,
    ) -> Self {
        Self {
            job_type,
            queue,
            results,
            executor,
            retry,
            job_timeout,
        }
    }

    /// Consume jobs until a queue/store connectivity error occurs. Only
    /// infrastructure errors escape this loop.
    pub async fn run(self) -> AppResult<()> {
        info!(job_type = %self.job_type, "Worker started");
        loop {
            match self.queue.dequeue(self.job_type).await? {
                Some(delivery) => self.process(delivery).await?,
                None => continue,
            }
        }
    }

    /// Run one delivered job to a terminal outcome. The returned error is
    /// infrastructure-only; external-service failures are absorbed into
    /// the retry/dead-letter path.
    pub async fn process(&self, delivery: Delivery) -> AppResult<()> {
        let job = &delivery.job;
        self.results
            .set_state(
                job.job_type,
                &job.id,
                &JobStateRecord::new(JobState::Running, 0, None),
            )
            .await?;

        let mut last_error = String::new();
        for attempt in 1..=self.retry.max_attempts {
            let outcome = timeout(self.job_timeout, self.executor.execute(job)).await;
            match outcome {
                Ok(Ok(result)) => {
                    self.results.put_result(job.job_type, &job.id, &result).await?;
                    self.results
                        .set_state(
                            job.job_type,
                            &job.id,
                            &JobStateRecord::new(JobState::Succeeded, attempt, None),
                        )
                        .await?;
                    self.queue.ack(&delivery).await?;
                    info!(job_id = %job.id, job_type = %job.job_type, attempt, "Job completed");
                    return Ok(());
                }
                Ok(Err(err)) => {
                    last_error = err.to_string();
                }
                Err(_) => {
                    last_error = AppError::Timeout(self.job_timeout.as_secs()).to_string();
                }
            }

            warn!(
                job_id = %job.id,
                job_type = %job.job_type,
                attempt,
                max_attempts = self.retry.max_attempts,
                error = %last_error,
                "Job attempt failed"
            );

            if attempt < self.retry.max_attempts {
                self.results
                    .set_state(
                        job.job_type,
                        &job.id,
                        &JobStateRecord::new(JobState::Running, attempt, Some(last_error.clone())),
                    )
                    .await?;
                sleep(self.retry.delay_after(attempt)).await;
            }
        }

        // Retries exhausted: record the terminal failure, park the job,
        // drop it from the processing list. No result is ever written.
        self.results
            .set_state(
                job.job_type,
                &job.id,
                &JobStateRecord::new(
                    JobState::Failed,
                    self.retry.max_attempts,
                    Some(last_error.clone()),
                ),
            )
            .await?;
        self.queue.dead_letter(job).await?;
        self.queue.ack(&delivery).await?;
        error!(
            job_id = %job.id,
            job_type = %job.job_type,
            error = %last_error,
            "Job failed after exhausting retries"
        );
        Ok(())
    }
}
