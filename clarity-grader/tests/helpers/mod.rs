//! Shared test doubles for clarity-grader integration tests
//!
//! Model, fetcher, store and runner stubs plus an in-process app builder.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tower::ServiceExt;
use uuid::Uuid;

use clarity_grader::config::AnalysisSettings;
use clarity_grader::models::{
    AnalysisJob, AnalysisOutcome, AnalysisSource, CanonicalReport, ScrapeResult, Tier,
};
use clarity_grader::services::{
    AnalysisError, AnalysisOrchestrator, AnalysisRunner, AnalysisService, ContentFetcher,
    JobQueue, JobStore, ModelError, ModelInvoker, PromptName, StoreError,
};
use clarity_grader::{build_router, AppState};

pub const SAMPLE_TEXT: &str = "Clarity Test Page\n\n\
    Short sentences help readers. Plain words keep them reading.\n\n\
    Each paragraph should carry one idea. Headings should say what follows.";

/// Reply that satisfies the full-tier schema
pub fn full_reply() -> Value {
    json!({
        "overallScore": 82,
        "textClarityScore": 78,
        "structureClarityScore": 85,
        "visualClarityScore": 80,
        "textClarityFeedback": "Mostly plain language.",
        "totalWords": 26,
        "totalSentences": 4,
        "tone": "Friendly",
        "readabilityScores": {"fleschReadingEase": 71.2}
    })
}

/// Reply that satisfies the ultra-lite and super-lite schema
pub fn brief_reply() -> Value {
    json!({"overallScore": 74, "shortFeedback": "Readable, a little dense."})
}

/// How a [`ScriptedInvoker`] answers every call
#[derive(Debug, Clone)]
pub enum ModelBehavior {
    Reply(Value),
    Fail(String),
    Hang,
}

/// Model invoker with a fixed behavior that records the prompts it saw
pub struct ScriptedInvoker {
    behavior: ModelBehavior,
    pub prompts: Mutex<Vec<PromptName>>,
}

impl ScriptedInvoker {
    pub fn new(behavior: ModelBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(value: Value) -> Arc<Self> {
        Self::new(ModelBehavior::Reply(value))
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelInvoker for ScriptedInvoker {
    async fn invoke(&self, prompt: PromptName, _input: Value) -> Result<Value, ModelError> {
        self.prompts.lock().unwrap().push(prompt);
        match &self.behavior {
            ModelBehavior::Reply(value) => Ok(value.clone()),
            ModelBehavior::Fail(message) => Err(ModelError::Api(503, message.clone())),
            ModelBehavior::Hang => std::future::pending().await,
        }
    }
}

/// Fetcher that serves the same text for every URL
pub struct StaticFetcher {
    text: String,
    pub calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ContentFetcher for StaticFetcher {
    async fn scrape(&self, _url: &str) -> ScrapeResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ScrapeResult {
            text_content: self.text.clone(),
            structure: json!({"totalHeadings": 1, "listsCount": 0}).to_string(),
            image_metadata: "[]".to_string(),
            raw_html: None,
        }
    }
}

/// In-memory job table
#[derive(Default)]
pub struct MemoryStore {
    jobs: Mutex<Vec<AnalysisJob>>,
    pub saves: AtomicUsize,
}

impl MemoryStore {
    pub fn with_jobs(jobs: Vec<AnalysisJob>) -> Arc<Self> {
        Arc::new(Self {
            jobs: Mutex::new(jobs),
            saves: AtomicUsize::new(0),
        })
    }

    pub fn snapshot(&self) -> Vec<AnalysisJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn load(&self) -> Result<Vec<AnalysisJob>, StoreError> {
        Ok(self.snapshot())
    }

    async fn save(&self, jobs: &[AnalysisJob]) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.jobs.lock().unwrap() = jobs.to_vec();
        Ok(())
    }
}

/// Store whose writes always fail
pub struct FailingStore;

#[async_trait]
impl JobStore for FailingStore {
    async fn load(&self) -> Result<Vec<AnalysisJob>, StoreError> {
        Ok(Vec::new())
    }

    async fn save(&self, _jobs: &[AnalysisJob]) -> Result<(), StoreError> {
        Err(StoreError::Io {
            path: "/unwritable/analysis-jobs.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

/// Runner that records execution order and peak concurrency
///
/// URLs containing "fail" return an error; URLs containing "panic" panic.
pub struct RecordingRunner {
    delay: Duration,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub order: Mutex<Vec<String>>,
}

impl RecordingRunner {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            order: Mutex::new(Vec::new()),
        })
    }

    pub fn order(&self) -> Vec<String> {
        self.order.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisRunner for RecordingRunner {
    async fn run(&self, url: &str) -> Result<AnalysisOutcome, AnalysisError> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        self.order.lock().unwrap().push(url.to_string());

        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        if url.contains("panic") {
            panic!("runner exploded on {url}");
        }
        if url.contains("fail") {
            return Err(AnalysisError::InvalidUrl);
        }
        Ok(stub_outcome())
    }
}

/// Runner that signals when a job starts and waits to be released
pub struct GatedRunner {
    pub started: Notify,
    pub release: Notify,
}

impl GatedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Notify::new(),
            release: Notify::new(),
        })
    }
}

#[async_trait]
impl AnalysisRunner for GatedRunner {
    async fn run(&self, _url: &str) -> Result<AnalysisOutcome, AnalysisError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(stub_outcome())
    }
}

pub fn stub_outcome() -> AnalysisOutcome {
    AnalysisOutcome {
        tier: Tier::Full,
        source: AnalysisSource::Model,
        message: Tier::Full.success_message().to_string(),
        analysis: CanonicalReport::default(),
    }
}

/// Poll until the job reaches a terminal state
pub async fn wait_for_terminal(queue: &JobQueue, id: Uuid) -> AnalysisJob {
    for _ in 0..500 {
        if let Some(job) = queue.get_job(id).await {
            if job.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} did not finish");
}

/// Poll until the worker has gone idle
pub async fn wait_for_idle(queue: &JobQueue) {
    for _ in 0..500 {
        if !queue.is_processing().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("worker did not go idle");
}

/// Test application with in-memory storage and a static fetcher
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub fetcher: Arc<StaticFetcher>,
}

pub async fn create_test_app(invoker: Arc<dyn ModelInvoker>, settings: AnalysisSettings) -> TestApp {
    let store = Arc::new(MemoryStore::default());
    let fetcher = StaticFetcher::new(SAMPLE_TEXT);
    let orchestrator = Arc::new(AnalysisOrchestrator::new(invoker, settings));
    let runner = Arc::new(AnalysisService::new(fetcher.clone(), orchestrator.clone()));

    let jobs = JobQueue::load(store.clone(), runner, Duration::from_millis(1)).await;
    let state = AppState::new(jobs, orchestrator, fetcher.clone());

    TestApp {
        router: build_router(state.clone()),
        state,
        store,
        fetcher,
    }
}

/// Send one request through the router and decode the JSON body
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
