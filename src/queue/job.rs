// Job definitions for the diarization/analysis pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which queue a job belongs to and which worker handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Analysis,
    Diarization,
}

impl JobType {
    pub const ALL: [JobType; 2] = [JobType::Analysis, JobType::Diarization];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Analysis => "analysis",
            JobType::Diarization => "diarization",
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio input for a diarization job. URL submissions are forwarded as
/// JSON; raw uploads travel through the queue as base64.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiarizationInput {
    Url {
        url: String,
    },
    Bytes {
        content_type: String,
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobPayload {
    Analysis { transcript: String },
    Diarization { input: DiarizationInput },
}

/// A unit of asynchronous work. The id is minted at submission time and
/// doubles as the result-store lookup key for polling callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub job_type: JobType,
    pub payload: JobPayload,
    pub enqueued_at: chrono::DateTime<chrono::Utc>,
}

impl Job {
    pub fn new(job_type: JobType, payload: JobPayload) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            job_type,
            payload,
            enqueued_at: chrono::Utc::now(),
        }
    }
}

/// Bounded exponential backoff applied between attempts of a single job.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay before the attempt following `attempt` (1-based). Doubles per
    /// attempt, capped at 2^5 times the base delay.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(5);
        self.base_delay * 2u32.pow(exponent)
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ids_are_unique() {
        let a = Job::new(
            JobType::Analysis,
            JobPayload::Analysis {
                transcript: "Doctor: Hello".to_string(),
            },
        );
        let b = Job::new(
            JobType::Analysis,
            JobPayload::Analysis {
                transcript: "Doctor: Hello".to_string(),
            },
        );
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_payload_round_trip_url() {
        let payload = JobPayload::Diarization {
            input: DiarizationInput::Url {
                url: "https://x/audio.wav".to_string(),
            },
        };
        let encoded = serde_json::to_string(&payload).unwrap();
        let decoded: JobPayload = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_payload_round_trip_bytes() {
        let payload = JobPayload::Diarization {
            input: DiarizationInput::Bytes {
                content_type: "audio/wav".to_string(),
                data: vec![0x52, 0x49, 0x46, 0x46, 0x00],
            },
        };
        let encoded = serde_json::to_string(&payload).unwrap();
        // Raw bytes must not appear in the JSON text
        assert!(encoded.contains("UklGRgA="));
        let decoded: JobPayload = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_job_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobType::Diarization).unwrap(),
            "\"diarization\""
        );
        assert_eq!(JobType::Analysis.to_string(), "analysis");
    }

    #[test]
    fn test_retry_delay_doubles_and_caps() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
        assert_eq!(policy.delay_after(10), Duration::from_secs(32));
    }
}
