//! clarity-grader library interface
//!
//! Exposes the router and application state for integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::{AnalysisOrchestrator, ContentFetcher, JobQueue};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Background job queue (sole owner of the job table)
    pub jobs: JobQueue,
    /// Tier selection and model calls for the synchronous path
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub fetcher: Arc<dyn ContentFetcher>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        jobs: JobQueue,
        orchestrator: Arc<AnalysisOrchestrator>,
        fetcher: Arc<dyn ContentFetcher>,
    ) -> Self {
        Self {
            jobs,
            orchestrator,
            fetcher,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::analyze_routes())
        .merge(api::scrape_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
