//! clarity-grader - website clarity analysis service
//!
//! Scrapes pages, grades their plain-language clarity with a local language
//! model, and runs slow analyses as durable background jobs.

use std::sync::Arc;

use anyhow::{Context, Result};
use clarity_common::config::RootFolderInitializer;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use clarity_grader::config::GraderConfig;
use clarity_grader::services::{
    AnalysisOrchestrator, AnalysisService, HtmlFetcher, JobQueue, JsonFileStore, OllamaInvoker,
};
use clarity_grader::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // The config file is read before logging starts; its level seeds the filter
    let config = GraderConfig::load();

    let default_directive = format!(
        "clarity_grader={level},clarity_common={level},tower_http={level}",
        level = config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting clarity-grader v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE"),
    );

    // Step 1: Resolve and create the root folder
    let initializer = RootFolderInitializer::new(config.root_folder());
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;
    info!("Root folder: {}", initializer.root_folder().display());

    // Step 2: Analysis components
    let analysis = config.analysis_settings();
    let model = config.model_settings();
    info!(
        server = %model.server_url,
        model = %model.model,
        default_tier = %analysis.default_flags.select(),
        "Model configured"
    );

    let invoker = Arc::new(OllamaInvoker::new(&model).context("Failed to build model client")?);
    let fetcher = Arc::new(
        HtmlFetcher::new(analysis.fetch_timeout).context("Failed to build page fetcher")?,
    );
    let job_pause = analysis.job_pause;
    let orchestrator = Arc::new(AnalysisOrchestrator::new(invoker, analysis));
    let runner = Arc::new(AnalysisService::new(fetcher.clone(), orchestrator.clone()));

    // Step 3: Job table (re-queues interrupted jobs and starts the worker)
    let jobs_path = initializer.jobs_file_path();
    info!("Job store: {}", jobs_path.display());
    let store = Arc::new(JsonFileStore::new(jobs_path));
    let jobs = JobQueue::load(store, runner, job_pause).await;

    let state = AppState::new(jobs, orchestrator, fetcher);
    let app = clarity_grader::build_router(state);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
