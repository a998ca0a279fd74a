//! Analysis job state machine
//!
//! PENDING → RUNNING → COMPLETED | FAILED
//!
//! Terminal states never change. A job carries `result` only when COMPLETED
//! and `error` only when FAILED.

use chrono::{DateTime, Utc};
use clarity_common::time;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::AnalysisOutcome;

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Queued, waiting for the worker
    Pending,
    /// Currently executing on the worker
    Running,
    /// Finished with a report
    Completed,
    /// Finished with an error message
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Rejected state transition
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid job transition for {job_id}: {from} -> {to}")]
pub struct InvalidTransition {
    pub job_id: Uuid,
    pub from: JobStatus,
    pub to: JobStatus,
}

/// State transition record (for logging)
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub job_id: Uuid,
    pub old_status: JobStatus,
    pub new_status: JobStatus,
    pub transitioned_at: DateTime<Utc>,
}

/// A unit of deferred analysis work
///
/// Timestamps serialize as epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisJob {
    pub id: Uuid,
    pub url: String,
    pub status: JobStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisJob {
    /// Create a new pending job
    pub fn new(url: impl Into<String>) -> Self {
        let now = time::now();
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
            result: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// PENDING → RUNNING
    pub fn start(&mut self) -> Result<StateTransition, InvalidTransition> {
        self.transition(JobStatus::Pending, JobStatus::Running)
    }

    /// RUNNING → COMPLETED, attaching the report
    pub fn complete(&mut self, result: AnalysisOutcome) -> Result<StateTransition, InvalidTransition> {
        let transition = self.transition(JobStatus::Running, JobStatus::Completed)?;
        self.result = Some(result);
        self.error = None;
        Ok(transition)
    }

    /// RUNNING → FAILED, attaching the error message
    pub fn fail(&mut self, error: impl Into<String>) -> Result<StateTransition, InvalidTransition> {
        let transition = self.transition(JobStatus::Running, JobStatus::Failed)?;
        self.result = None;
        self.error = Some(error.into());
        Ok(transition)
    }

    /// Reset an interrupted (non-terminal) job so it can run again from scratch
    ///
    /// Returns false for terminal jobs, which are left untouched.
    pub fn requeue(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        if self.status != JobStatus::Pending {
            self.status = JobStatus::Pending;
            self.updated_at = time::now_after(self.updated_at);
        }
        self.result = None;
        self.error = None;
        true
    }

    /// Restore the result/error invariant on a terminal record read from storage
    ///
    /// A COMPLETED record without a result cannot be rendered and is demoted
    /// to FAILED; stray fields on the opposite side are dropped.
    pub fn reconcile(&mut self) {
        match self.status {
            JobStatus::Completed if self.result.is_none() => {
                self.status = JobStatus::Failed;
                self.error = Some("Stored job was missing its analysis result".to_string());
            }
            JobStatus::Completed => self.error = None,
            JobStatus::Failed => {
                self.result = None;
                if self.error.is_none() {
                    self.error = Some("Job failed".to_string());
                }
            }
            JobStatus::Pending | JobStatus::Running => {}
        }
        if self.updated_at < self.created_at {
            self.updated_at = self.created_at;
        }
    }

    fn transition(
        &mut self,
        expected: JobStatus,
        new_status: JobStatus,
    ) -> Result<StateTransition, InvalidTransition> {
        if self.status != expected {
            return Err(InvalidTransition {
                job_id: self.id,
                from: self.status,
                to: new_status,
            });
        }

        let transition = StateTransition {
            job_id: self.id,
            old_status: self.status,
            new_status,
            transitioned_at: time::now_after(self.updated_at),
        };
        self.status = new_status;
        self.updated_at = transition.transitioned_at;
        Ok(transition)
    }
}
