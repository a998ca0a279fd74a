//! End-to-end analysis of one URL: validate, scrape, analyze
//!
//! The job queue depends on [`AnalysisRunner`] only, so the worker can be
//! driven by a stub in tests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{AnalysisOutcome, TierFlags};
use crate::services::fetcher::ContentFetcher;
use crate::services::orchestrator::{validate_url, AnalysisError, AnalysisOrchestrator};

/// Executes one queued analysis
#[async_trait]
pub trait AnalysisRunner: Send + Sync {
    async fn run(&self, url: &str) -> Result<AnalysisOutcome, AnalysisError>;
}

/// Production runner: fetcher followed by the orchestrator at the configured tier
pub struct AnalysisService {
    fetcher: Arc<dyn ContentFetcher>,
    orchestrator: Arc<AnalysisOrchestrator>,
}

impl AnalysisService {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, orchestrator: Arc<AnalysisOrchestrator>) -> Self {
        Self {
            fetcher,
            orchestrator,
        }
    }
}

#[async_trait]
impl AnalysisRunner for AnalysisService {
    async fn run(&self, url: &str) -> Result<AnalysisOutcome, AnalysisError> {
        let url = validate_url(url)?;
        let scraped = self.fetcher.scrape(url.as_str()).await;
        let tier = self.orchestrator.select_tier(TierFlags::default());

        tracing::debug!(url = %url, tier = %tier, "Running queued analysis");
        self.orchestrator.analyze(&scraped, url.as_str(), tier).await
    }
}
