//! Background analysis job queue
//!
//! Single owner of the job table. HTTP handlers submit and read jobs; one
//! worker task drains the FIFO queue strictly one job at a time.
//!
//! **Lifecycle:**
//! - `submit` records a PENDING job, persists the table and starts the worker
//! - the worker marks the job RUNNING, runs the analysis, then marks it
//!   COMPLETED or FAILED, persisting after every transition
//! - the worker pauses between jobs and exits once the queue is empty
//! - `load` re-queues jobs left PENDING or RUNNING by a previous process
//!
//! Persistence failures are logged and never block submission or execution.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::{AnalysisJob, StateTransition};
use crate::services::job_store::JobStore;
use crate::services::pipeline::AnalysisRunner;

#[derive(Default)]
struct QueueState {
    jobs: HashMap<Uuid, AnalysisJob>,
    queue: VecDeque<Uuid>,
    /// True while a worker task owns the queue
    processing: bool,
    /// Most recent persistence failure, cleared by the next successful write
    last_error: Option<String>,
}

impl QueueState {
    /// Pop queued ids until one can be started; clears `processing` when drained
    fn claim_next(&mut self) -> Option<(Uuid, String)> {
        while let Some(id) = self.queue.pop_front() {
            let Some(job) = self.jobs.get_mut(&id) else {
                continue;
            };
            match job.start() {
                Ok(transition) => {
                    log_transition(&transition);
                    return Some((id, job.url.clone()));
                }
                Err(e) => warn!(job_id = %id, error = %e, "Skipping queued job"),
            }
        }
        self.processing = false;
        None
    }
}

fn log_transition(transition: &StateTransition) {
    debug!(
        job_id = %transition.job_id,
        from = %transition.old_status,
        to = %transition.new_status,
        at_ms = transition.transitioned_at.timestamp_millis(),
        "Job state transition"
    );
}

struct Inner {
    state: RwLock<QueueState>,
    /// Serializes store writes so the newest snapshot always lands last
    persist_lock: Mutex<()>,
    store: Arc<dyn JobStore>,
    runner: Arc<dyn AnalysisRunner>,
    pause: Duration,
}

/// Handle to the shared job queue (cheap to clone)
#[derive(Clone)]
pub struct JobQueue {
    inner: Arc<Inner>,
}

impl JobQueue {
    /// Restore the job table from `store` and resume interrupted work
    ///
    /// Non-terminal jobs are reset to PENDING and queued in creation order.
    /// Duplicate ids in the stored table keep their first record. An
    /// unreadable store starts an empty table.
    pub async fn load(
        store: Arc<dyn JobStore>,
        runner: Arc<dyn AnalysisRunner>,
        pause: Duration,
    ) -> Self {
        let stored = match store.load().await {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!(error = %e, "Failed to load job table; starting empty");
                Vec::new()
            }
        };

        let mut state = QueueState::default();
        let mut requeued = Vec::new();
        for mut job in stored {
            if state.jobs.contains_key(&job.id) {
                warn!(job_id = %job.id, "Ignoring duplicate stored job");
                continue;
            }
            if job.requeue() {
                requeued.push((job.created_at, job.id));
            } else {
                job.reconcile();
            }
            state.jobs.insert(job.id, job);
        }
        requeued.sort();
        state.queue = requeued.into_iter().map(|(_, id)| id).collect();

        let requeued_count = state.queue.len();
        let total = state.jobs.len();

        let queue = Self {
            inner: Arc::new(Inner {
                state: RwLock::new(state),
                persist_lock: Mutex::new(()),
                store,
                runner,
                pause,
            }),
        };

        info!(total, requeued = requeued_count, "Job table loaded");
        if requeued_count > 0 {
            queue.persist().await;
        }
        queue.ensure_processing().await;
        queue
    }

    /// Record a new PENDING job and start the worker; returns immediately
    ///
    /// The URL is stored as given and validated when the job runs.
    pub async fn submit(&self, url: impl Into<String>) -> Uuid {
        let job = AnalysisJob::new(url);
        let id = job.id;
        let url = job.url.clone();

        {
            let mut state = self.inner.state.write().await;
            state.jobs.insert(id, job);
            state.queue.push_back(id);
        }

        info!(job_id = %id, url = %url, "Analysis job submitted");
        self.persist().await;
        self.ensure_processing().await;
        id
    }

    /// Copy of a job's current record
    pub async fn get_job(&self, id: Uuid) -> Option<AnalysisJob> {
        self.inner.state.read().await.jobs.get(&id).cloned()
    }

    /// Start the worker unless it is already running or there is nothing queued
    ///
    /// Returns true when a new worker task was spawned.
    pub async fn ensure_processing(&self) -> bool {
        {
            let mut state = self.inner.state.write().await;
            if state.processing || state.queue.is_empty() {
                return false;
            }
            state.processing = true;
        }

        let queue = self.clone();
        tokio::spawn(async move {
            queue.run_worker().await;
        });
        true
    }

    /// All jobs, newest first
    pub async fn list_jobs(&self) -> Vec<AnalysisJob> {
        let state = self.inner.state.read().await;
        let mut jobs: Vec<AnalysisJob> = state.jobs.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// Jobs waiting for the worker
    pub async fn queue_depth(&self) -> usize {
        self.inner.state.read().await.queue.len()
    }

    /// Whether a worker task currently owns the queue
    pub async fn is_processing(&self) -> bool {
        self.inner.state.read().await.processing
    }

    /// Most recent persistence failure, if the last write failed
    pub async fn last_error(&self) -> Option<String> {
        self.inner.state.read().await.last_error.clone()
    }

    async fn run_worker(self) {
        info!("Job worker started");

        loop {
            let next = self.inner.state.write().await.claim_next();
            let Some((id, url)) = next else {
                info!("Job queue drained; worker idle");
                return;
            };

            info!(job_id = %id, url = %url, "Processing job");
            self.persist().await;

            // Run on its own task so a panicking analysis fails the job
            // instead of killing the worker
            let runner = Arc::clone(&self.inner.runner);
            let task_url = url.clone();
            let joined = tokio::spawn(async move { runner.run(&task_url).await }).await;

            let finished = {
                let mut state = self.inner.state.write().await;
                let finished = match state.jobs.get_mut(&id) {
                    Some(job) => match joined {
                        Ok(Ok(outcome)) => {
                            let fallback = outcome.is_fallback();
                            job.complete(outcome)
                                .inspect(|_| info!(job_id = %id, fallback, "Job completed"))
                        }
                        Ok(Err(e)) => job
                            .fail(e.to_string())
                            .inspect(|_| error!(job_id = %id, error = %e, "Job failed")),
                        Err(join_error) => {
                            let message = format!("Analysis task aborted: {}", join_error);
                            error!(job_id = %id, error = %message, "Job failed");
                            job.fail(message)
                        }
                    },
                    None => {
                        warn!(job_id = %id, "Job vanished while running");
                        continue;
                    }
                };
                finished
            };

            match finished {
                Ok(transition) => log_transition(&transition),
                Err(e) => warn!(job_id = %id, error = %e, "Job finished in unexpected state"),
            }

            self.persist().await;
            tokio::time::sleep(self.inner.pause).await;
        }
    }

    /// Write the full table; failures are logged only
    async fn persist(&self) {
        let _guard = self.inner.persist_lock.lock().await;

        let snapshot: Vec<AnalysisJob> = {
            let state = self.inner.state.read().await;
            let mut jobs: Vec<AnalysisJob> = state.jobs.values().cloned().collect();
            jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            jobs
        };

        let outcome = self.inner.store.save(&snapshot).await;
        if let Err(e) = &outcome {
            warn!(error = %e, jobs = snapshot.len(), "Failed to persist job table");
        }
        self.inner.state.write().await.last_error = outcome.err().map(|e| e.to_string());
    }
}
