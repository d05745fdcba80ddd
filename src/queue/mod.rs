//! Asynchronous job pipeline: queue, workers, and result store.
//!
//! Submission hands a job to a durable Redis-backed FIFO queue and
//! returns its id immediately; a long-running worker per job type pulls
//! jobs, calls the external service (LLM completion for analysis, the
//! diarization HTTP endpoint for diarization), and publishes the
//! normalized output to an expiring result store. Polling callers resolve
//! the id through the status lookup until a result (or terminal failure)
//! appears.
//!
//! ```text
//!   submit ──▶ queue:{type} ──▶ worker ──▶ external service
//!                                  │
//!                                  ▼
//!   poll  ◀── {type}:result:{id} / {type}:state:{id}
//! ```
//!
//! Delivery is at-least-once: in-flight jobs live on a processing list
//! and are requeued if a worker dies holding them. Jobs that exhaust
//! their retries land on a dead-letter list with a recorded failure
//! reason.

pub mod job;
pub mod queue;
pub mod results;
pub mod worker;

pub use job::{DiarizationInput, Job, JobPayload, JobType, RetryPolicy};
pub use queue::{Delivery, JobQueue};
pub use results::{JobState, JobStateRecord, ResultStore};
pub use worker::{AnalysisExecutor, DiarizationExecutor, JobExecutor, Worker};
