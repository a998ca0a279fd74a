//! Analysis services
//!
//! Leaf-first: fetcher and model invoker (external collaborators), heuristic
//! and normalizer (pure), orchestrator (tiers and fallback), then the job
//! store, pipeline runner and job queue.

pub mod fetcher;
pub mod heuristic;
pub mod job_queue;
pub mod job_store;
pub mod model_invoker;
pub mod normalizer;
pub mod orchestrator;
pub mod pipeline;

pub use fetcher::{ContentFetcher, FetchError, HtmlFetcher};
pub use heuristic::{analyze_text, HeuristicReport};
pub use job_queue::JobQueue;
pub use job_store::{JobStore, JsonFileStore, StoreError};
pub use model_invoker::{ModelError, ModelInvoker, OllamaInvoker, PromptName};
pub use normalizer::normalize;
pub use orchestrator::{
    truncate_chars, validate_url, AnalysisError, AnalysisOrchestrator, Excerpt, TierOutput,
    TRUNCATION_MARKER,
};
pub use pipeline::{AnalysisRunner, AnalysisService};
