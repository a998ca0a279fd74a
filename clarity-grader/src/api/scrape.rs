//! Page scrape endpoint

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::models::ScrapeResult;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ScrapeQuery {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub ok: bool,
    pub scraped: ScrapeResult,
}

/// GET /scrape?url=...
///
/// Fetch failures are reported inside `scraped`, not as an HTTP error.
pub async fn scrape_page(
    State(state): State<AppState>,
    query: Result<Query<ScrapeQuery>, QueryRejection>,
) -> ApiResult<Json<ScrapeResponse>> {
    let Query(query) = query?;
    let url = query
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing url query parameter".to_string()))?;

    let scraped = state.fetcher.scrape(&url).await;
    Ok(Json(ScrapeResponse { ok: true, scraped }))
}

/// Build scrape routes
pub fn scrape_routes() -> Router<AppState> {
    Router::new().route("/scrape", get(scrape_page))
}
