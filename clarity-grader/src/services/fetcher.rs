//! Page retrieval and content extraction
//!
//! [`ContentFetcher::scrape`] never fails: transport errors, non-2xx
//! responses and timeouts come back as [`ScrapeResult::failed`] payloads.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::models::ScrapeResult;

const USER_AGENT: &str = concat!("clarity-grader/", env!("CARGO_PKG_VERSION"));

/// Retrieves a URL and returns normalized text, structure and image metadata
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn scrape(&self, url: &str) -> ScrapeResult;
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(String),

    #[error("Failed to fetch page: {0} {1}")]
    Status(u16, String),
}

/// reqwest-backed fetcher with HTML extraction
pub struct HtmlFetcher {
    http_client: reqwest::Client,
}

impl HtmlFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self { http_client })
    }

    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("").to_string(),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}

#[async_trait]
impl ContentFetcher for HtmlFetcher {
    async fn scrape(&self, url: &str) -> ScrapeResult {
        match self.fetch_html(url).await {
            Ok(html) => {
                let scraped = extract_page(&html);
                tracing::debug!(
                    url = %url,
                    chars = scraped.text_content.chars().count(),
                    "Page scraped"
                );
                scraped
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Page fetch failed");
                ScrapeResult::failed(url, &e.to_string())
            }
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct PageHeadings {
    h1: Vec<String>,
    h2: Vec<String>,
    h3: Vec<String>,
    h4: Vec<String>,
    h5: Vec<String>,
    h6: Vec<String>,
}

impl PageHeadings {
    fn total(&self) -> usize {
        [&self.h1, &self.h2, &self.h3, &self.h4, &self.h5, &self.h6]
            .iter()
            .map(|level| level.len())
            .sum()
    }
}

#[derive(Debug, Serialize)]
struct ImageInfo {
    src: String,
    alt: String,
    title: String,
}

/// Extract text, structure and image metadata from an HTML document
pub fn extract_page(html: &str) -> ScrapeResult {
    let document = Html::parse_document(html);

    let title = select_texts(&document, "title")
        .into_iter()
        .next()
        .unwrap_or_default();
    let paragraphs = select_texts(&document, "p");
    let text_content = std::iter::once(title)
        .chain(paragraphs)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let headings = PageHeadings {
        h1: select_texts(&document, "h1"),
        h2: select_texts(&document, "h2"),
        h3: select_texts(&document, "h3"),
        h4: select_texts(&document, "h4"),
        h5: select_texts(&document, "h5"),
        h6: select_texts(&document, "h6"),
    };

    let lists: Vec<Vec<String>> = match (Selector::parse("ul, ol"), Selector::parse("li")) {
        (Ok(list_sel), Ok(item_sel)) => document
            .select(&list_sel)
            .map(|list| {
                list.select(&item_sel)
                    .map(element_text)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .collect(),
        _ => Vec::new(),
    };

    let images: Vec<ImageInfo> = match Selector::parse("img") {
        Ok(sel) => document
            .select(&sel)
            .map(|img| {
                let attr = |name: &str| img.value().attr(name).unwrap_or("").trim().to_string();
                let src = Some(attr("src"))
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| attr("data-src"));
                ImageInfo {
                    src,
                    alt: attr("alt"),
                    title: attr("title"),
                }
            })
            .collect(),
        Err(_) => Vec::new(),
    };

    let structure = json!({
        "totalHeadings": headings.total(),
        "listsCount": lists.len(),
        "totalLists": lists.len(),
        "headings": headings,
        "lists": lists,
    });

    ScrapeResult {
        text_content,
        structure: structure.to_string(),
        image_metadata: serde_json::to_string(&images).unwrap_or_else(|_| "[]".to_string()),
        raw_html: Some(html.to_string()),
    }
}

fn select_texts(document: &Html, selector: &str) -> Vec<String> {
    let Ok(sel) = Selector::parse(selector) else {
        return Vec::new();
    };
    document
        .select(&sel)
        .map(element_text)
        .filter(|s| !s.is_empty())
        .collect()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
