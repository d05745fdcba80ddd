use anyhow::Result;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub llm: LlmConfig,
    pub diarization: DiarizationConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    /// Retention window for result and state entries, in seconds.
    pub result_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub azure_endpoint: String,
    pub azure_api_key: String,
    pub azure_api_version: String,
    pub azure_deployment: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiarizationConfig {
    pub api_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Deadline for a single external call (LLM or diarization), in seconds.
    pub job_timeout_seconds: u64,
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
                result_ttl_seconds: env::var("RESULT_TTL_SECONDS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()?,
            },
            llm: LlmConfig {
                azure_endpoint: env::var("AZURE_OPENAI_ENDPOINT").unwrap_or_default(),
                azure_api_key: env::var("AZURE_OPENAI_API_KEY").unwrap_or_default(),
                azure_api_version: env::var("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|_| "2024-02-15-preview".to_string()),
                azure_deployment: env::var("AZURE_OPENAI_DEPLOYMENT").unwrap_or_default(),
                max_tokens: env::var("LLM_MAX_TOKENS")
                    .unwrap_or_else(|_| "1500".to_string())
                    .parse()?,
                temperature: env::var("LLM_TEMPERATURE")
                    .unwrap_or_else(|_| "0.3".to_string())
                    .parse()?,
            },
            diarization: DiarizationConfig {
                api_url: env::var("DIARIZATION_API_URL")
                    .unwrap_or_else(|_| "http://localhost:5286/diarize".to_string()),
            },
            worker: WorkerConfig {
                job_timeout_seconds: env::var("JOB_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()?,
                max_attempts: env::var("JOB_MAX_ATTEMPTS")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()?,
                retry_base_delay_ms: env::var("JOB_RETRY_BASE_DELAY_MS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()?,
            },
        })
    }
}
