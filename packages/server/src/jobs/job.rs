//! Job model and lifecycle.
//!
//! A job is one unit of pipeline work. Its status only ever moves
//! `queued -> running -> {done | failed}`; both terminal states are final and
//! retry means a fresh job created by whoever scheduled the first one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    Scrape,
    Enrich,
    GenerateSite,
    Send,
    DailySet,
    DailyRun,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Scrape => "scrape",
            JobType::Enrich => "enrich",
            JobType::GenerateSite => "generate-site",
            JobType::Send => "send",
            JobType::DailySet => "daily-set",
            JobType::DailyRun => "daily-run",
        }
    }
}

impl std::str::FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scrape" => Ok(JobType::Scrape),
            "enrich" => Ok(JobType::Enrich),
            "generate-site" => Ok(JobType::GenerateSite),
            "send" => Ok(JobType::Send),
            "daily-set" => Ok(JobType::DailySet),
            "daily-run" => Ok(JobType::DailyRun),
            other => Err(other.to_string()),
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub job_type: JobType,
    #[serde(default)]
    pub payload: Value,
    pub status: JobStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "startedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "finishedAt")]
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub result: Option<Value>,
}

impl Job {
    /// Create a queued job with a fresh id; `startedAt`/`finishedAt` stay
    /// null until the lifecycle sets them.
    pub fn new(job_type: JobType, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type,
            payload,
            status: JobStatus::Queued,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            error: None,
            result: None,
        }
    }
}

/// Partial update applied to a stored job. Fields left `None` keep their
/// current value.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub result: Option<Value>,
}

impl JobPatch {
    pub fn running(now: DateTime<Utc>) -> Self {
        Self {
            status: Some(JobStatus::Running),
            started_at: Some(now),
            ..Default::default()
        }
    }

    pub fn done(result: Value, now: DateTime<Utc>) -> Self {
        Self {
            status: Some(JobStatus::Done),
            finished_at: Some(now),
            result: Some(result),
            ..Default::default()
        }
    }

    pub fn failed(error: String, now: DateTime<Utc>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            finished_at: Some(now),
            error: Some(error),
            ..Default::default()
        }
    }

    /// Merge into an owned job record (local backend semantics).
    pub fn apply(&self, job: &mut Job) {
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(started_at) = self.started_at {
            job.started_at = Some(started_at);
        }
        if let Some(finished_at) = self.finished_at {
            job.finished_at = Some(finished_at);
        }
        if let Some(error) = &self.error {
            job.error = Some(error.clone());
        }
        if let Some(result) = &self.result {
            job.result = Some(result.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_job_is_queued_with_null_timestamps() {
        let job = Job::new(JobType::Scrape, json!({"query": "plumbers"}));
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.started_at.is_none());
        assert!(job.finished_at.is_none());
        assert!(job.error.is_none());
        assert!(job.result.is_none());
    }

    #[test]
    fn job_type_round_trips_kebab_case() {
        let v = serde_json::to_value(JobType::GenerateSite).unwrap();
        assert_eq!(v, json!("generate-site"));
        let back: JobType = serde_json::from_value(v).unwrap();
        assert_eq!(back, JobType::GenerateSite);
        assert_eq!("daily-run".parse::<JobType>().unwrap(), JobType::DailyRun);
        assert!("reticulate".parse::<JobType>().is_err());
    }

    #[test]
    fn patch_apply_keeps_unset_fields() {
        let mut job = Job::new(JobType::Send, json!({}));
        let started = Utc::now();
        JobPatch::running(started).apply(&mut job);
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.started_at, Some(started));
        assert!(job.finished_at.is_none());

        JobPatch::done(json!({"sent": 2}), Utc::now()).apply(&mut job);
        assert_eq!(job.status, JobStatus::Done);
        // startedAt survives the completion patch
        assert_eq!(job.started_at, Some(started));
        assert!(job.finished_at.is_some());
    }
}
