use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medscribe::diarization::DiarizationClient;
use medscribe::llm::AzureOpenAiAdapter;
use medscribe::queue::{
    AnalysisExecutor, DiarizationExecutor, JobExecutor, JobQueue, JobType, ResultStore,
    RetryPolicy, Worker,
};
use medscribe::redis::RedisClient;
use medscribe::types::AppResult;
use medscribe::{config::Config, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medscribe=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config.server);

    // Shared client for the HTTP handlers
    let redis = RedisClient::connect(&config.redis.url).await?;
    let queue = JobQueue::new(redis.connection());
    let results = ResultStore::new(redis.connection(), config.redis.result_ttl_seconds);

    let retry = RetryPolicy::new(
        config.worker.max_attempts,
        Duration::from_millis(config.worker.retry_base_delay_ms),
    );
    let job_timeout = Duration::from_secs(config.worker.job_timeout_seconds);

    // One worker per job type, each with a dedicated connection: the
    // blocking dequeue must not stall the connection the handlers share.
    let mut workers: FuturesUnordered<JoinHandle<AppResult<()>>> = FuturesUnordered::new();
    for job_type in JobType::ALL {
        let worker_redis = RedisClient::connect(&config.redis.url).await?;
        let worker_queue = JobQueue::new(worker_redis.connection());
        worker_queue.recover_orphans(job_type).await?;
        let worker_results =
            ResultStore::new(worker_redis.connection(), config.redis.result_ttl_seconds);

        let executor: Box<dyn JobExecutor> = match job_type {
            JobType::Analysis => Box::new(AnalysisExecutor::new(
                Arc::new(AzureOpenAiAdapter::new(&config.llm)),
                config.llm.max_tokens,
                config.llm.temperature,
            )),
            JobType::Diarization => Box::new(DiarizationExecutor::new(DiarizationClient::new(
                config.diarization.api_url.clone(),
            ))),
        };

        let worker = Worker::new(
            job_type,
            worker_queue,
            worker_results,
            executor,
            retry.clone(),
            job_timeout,
        );
        workers.push(tokio::spawn(worker.run()));
    }

    // Create shared state and router
    let state = AppState {
        config: config.clone(),
        redis,
        queue,
        results,
    };
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(&addr).await?;

    // A worker exiting means the queue or store connection is gone; bail
    // out so process supervision restarts the whole service.
    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            result.map_err(|e| anyhow::anyhow!("Server error: {}", e))?;
        }
        Some(finished) = workers.next() => {
            match finished {
                Ok(Ok(())) => anyhow::bail!("worker exited unexpectedly"),
                Ok(Err(e)) => {
                    error!("Worker failed: {}", e);
                    anyhow::bail!("worker failed: {}", e);
                }
                Err(e) => anyhow::bail!("worker panicked: {}", e),
            }
        }
    }

    Ok(())
}
