//! Queue operations over the record store.
//!
//! Thin by design: ordering and claim atomicity live in the storage layer,
//! the queue enforces the lifecycle rules. `complete` and `fail` only act on
//! a `running` job; called in any other state they are a no-op that leaves
//! the stored record untouched.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::job::{Job, JobPatch, JobStatus, JobType};
use crate::storage::RecordStore;

pub struct JobQueue {
    store: Arc<dyn RecordStore>,
}

impl JobQueue {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Create and persist a queued job.
    pub async fn create(&self, job_type: JobType, payload: Value) -> Result<Job> {
        let job = Job::new(job_type, payload);
        self.store.insert_job(&job).await?;
        debug!(job_id = %job.id, job_type = %job.job_type, "job created");
        Ok(job)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Job>> {
        self.store.get_job(id).await
    }

    /// Snapshot of current jobs, most-recently-created first.
    pub async fn list(&self, limit: usize) -> Result<Vec<Job>> {
        self.store.list_jobs(limit).await
    }

    /// Claim the oldest queued job; `None` means idle, not error.
    pub async fn claim_next(&self) -> Result<Option<Job>> {
        self.store.claim_next_job().await
    }

    /// `running -> done`. No-op (returns `None`) unless the job exists and
    /// is currently running.
    pub async fn complete(&self, id: Uuid, result: Value) -> Result<Option<Job>> {
        let Some(job) = self.store.get_job(id).await? else {
            return Ok(None);
        };
        if job.status != JobStatus::Running {
            debug!(job_id = %id, status = job.status.as_str(), "complete ignored");
            return Ok(None);
        }
        self.store
            .patch_job(id, &JobPatch::done(result, Utc::now()))
            .await
    }

    /// `running -> failed`. Same no-op rule as `complete`.
    pub async fn fail(&self, id: Uuid, error: String) -> Result<Option<Job>> {
        let Some(job) = self.store.get_job(id).await? else {
            return Ok(None);
        };
        if job.status != JobStatus::Running {
            debug!(job_id = %id, status = job.status.as_str(), "fail ignored");
            return Ok(None);
        }
        self.store
            .patch_job(id, &JobPatch::failed(error, Utc::now()))
            .await
    }
}
