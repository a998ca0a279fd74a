//! Analysis endpoints
//!
//! - `POST /analyze`: scrape and analyze within the request
//! - `POST /analyze/submit`: scrape, queue a background job, return a heuristic preview
//! - `GET /analyze/status?jobId=...`: poll a job
//! - `GET /analyze/jobs`: list jobs, newest first

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AnalysisJob, AnalysisOutcome, JobStatus, ScrapeResult, TierFlags};
use crate::services::validate_url;
use crate::{ApiError, ApiResult, AppState};

/// Body of `POST /analyze`
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(flatten)]
    pub flags: TierFlags,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub ok: bool,
    pub scraped: ScrapeResult,
    pub analysis: AnalysisOutcome,
}

/// Body of `POST /analyze/submit`
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub ok: bool,
    pub job_id: Uuid,
    pub scraped: ScrapeResult,
    /// Heuristic-only report computed before queuing
    pub partial: AnalysisOutcome,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(rename = "jobId", default)]
    pub job_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub ok: bool,
    pub job: AnalysisJob,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub ok: bool,
    pub jobs: Vec<AnalysisJob>,
}

fn required_url(url: Option<String>) -> ApiResult<String> {
    url.map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing url field".to_string()))
}

/// POST /analyze
///
/// The page is scraped first; the analysis then runs under a caller-side
/// timeout of max(30s, tier budget + 5s).
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let Json(request) = payload?;
    let url = validate_url(&required_url(request.url)?)?;
    let tier = state.orchestrator.select_tier(request.flags);
    let budget = state.orchestrator.settings().request_budget(tier);

    tracing::info!(
        url = %url,
        tier = %tier,
        budget_ms = budget.as_millis() as u64,
        "Synchronous analysis"
    );

    let scraped = state.fetcher.scrape(url.as_str()).await;
    let analysis = tokio::time::timeout(
        budget,
        state.orchestrator.analyze(&scraped, url.as_str(), tier),
    )
    .await
    .map_err(|_| ApiError::Timeout("Timed out".to_string()))??;

    Ok(Json(AnalyzeResponse {
        ok: true,
        scraped,
        analysis,
    }))
}

/// POST /analyze/submit
///
/// Returns as soon as the job is recorded; the worker runs it later.
pub async fn submit_analysis(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> ApiResult<Json<SubmitResponse>> {
    let Json(request) = payload?;
    let url = required_url(request.url)?;

    let scraped = state.fetcher.scrape(&url).await;
    let tier = state.orchestrator.select_tier(TierFlags::default());
    let partial = state
        .orchestrator
        .heuristic_outcome(&scraped.text_content, tier);

    let job_id = state.jobs.submit(url).await;

    Ok(Json(SubmitResponse {
        ok: true,
        job_id,
        scraped,
        partial,
    }))
}

/// GET /analyze/status?jobId=...
///
/// A PENDING job nudges the worker in case it is not running.
pub async fn job_status(
    State(state): State<AppState>,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let Query(query) = query?;
    let raw_id = query
        .job_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing jobId".to_string()))?;

    let not_found = || ApiError::NotFound("Job not found".to_string());
    let job_id = Uuid::parse_str(&raw_id).map_err(|_| not_found())?;
    let job = state.jobs.get_job(job_id).await.ok_or_else(not_found)?;

    if job.status == JobStatus::Pending && state.jobs.ensure_processing().await {
        tracing::info!(job_id = %job_id, "Status poll restarted the job worker");
    }

    tracing::debug!(job_id = %job_id, status = %job.status, "Status query");
    Ok(Json(StatusResponse { ok: true, job }))
}

/// GET /analyze/jobs
pub async fn list_jobs(State(state): State<AppState>) -> Json<JobListResponse> {
    Json(JobListResponse {
        ok: true,
        jobs: state.jobs.list_jobs().await,
    })
}

/// Build analysis routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/analyze/submit", post(submit_analysis))
        .route("/analyze/status", get(job_status))
        .route("/analyze/jobs", get(list_jobs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_request_reads_flags() {
        let request: AnalyzeRequest = serde_json::from_str(
            r#"{"url": "https://example.com", "ultralite": true, "superlite": true}"#,
        )
        .unwrap();
        assert_eq!(request.url.as_deref(), Some("https://example.com"));
        assert!(request.flags.ultralite);
        assert!(!request.flags.lite);
    }

    #[test]
    fn test_required_url() {
        assert!(required_url(None).is_err());
        assert!(required_url(Some("   ".to_string())).is_err());
        assert_eq!(
            required_url(Some(" https://example.com ".to_string())).unwrap(),
            "https://example.com"
        );
    }
}
