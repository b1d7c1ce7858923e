//! Single-step job processing: claim, dispatch by type, record the outcome.
//!
//! A stage error fails the job with the error's message verbatim; partial
//! failures inside a stage are already folded into the stage's own result
//! and never reach this layer.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::job::{Job, JobType};
use super::queue::JobQueue;
use crate::domains::daily::{run_daily, set_daily_target};
use crate::domains::leads::{run_enrich, run_scrape, ScrapeParams};
use crate::domains::outreach::run_send;
use crate::domains::websites::{run_generate, GenerateParams};
use crate::error::StageResult;
use crate::kernel::PipelineDeps;

#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub ok: bool,
    pub idle: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<Job>,
}

/// Claim and fully execute one job. Returns `idle` when nothing is queued.
pub async fn process_next_job(deps: &PipelineDeps) -> Result<ProcessOutcome> {
    let queue = JobQueue::new(deps.store.clone());
    let Some(job) = queue.claim_next().await? else {
        return Ok(ProcessOutcome {
            ok: true,
            idle: true,
            job: None,
        });
    };

    match execute_stage(deps, &job).await {
        Ok(result) => {
            info!(job_id = %job.id, job_type = %job.job_type, "job done");
            let done = queue.complete(job.id, result).await?;
            Ok(ProcessOutcome {
                ok: true,
                idle: false,
                job: done,
            })
        }
        Err(error) => {
            warn!(job_id = %job.id, job_type = %job.job_type, %error, "job failed");
            let failed = queue.fail(job.id, error.to_string()).await?;
            Ok(ProcessOutcome {
                ok: false,
                idle: false,
                job: failed,
            })
        }
    }
}

async fn execute_stage(deps: &PipelineDeps, job: &Job) -> StageResult<Value> {
    let result = match job.job_type {
        JobType::Scrape => {
            let params: ScrapeParams = parse_payload(&job.payload)?;
            serde_json::to_value(run_scrape(deps, params).await?)
        }
        JobType::Enrich => {
            let leads_file = payload_str(&job.payload, "leadsFile")?;
            serde_json::to_value(run_enrich(deps, &leads_file).await?)
        }
        JobType::GenerateSite => {
            let params: GenerateParams = parse_payload(&job.payload)?;
            serde_json::to_value(run_generate(deps, params).await?)
        }
        JobType::Send => {
            let leads_file = payload_str(&job.payload, "leadsFile")?;
            serde_json::to_value(run_send(deps, &leads_file).await?)
        }
        JobType::DailySet => {
            let query = payload_str(&job.payload, "query")?;
            let location = payload_str(&job.payload, "location")?;
            serde_json::to_value(set_daily_target(deps, &query, &location).await?)
        }
        JobType::DailyRun => serde_json::to_value(run_daily(deps).await?),
    };
    result.context("serializing stage result").map_err(Into::into)
}

fn parse_payload<T: serde::de::DeserializeOwned>(payload: &Value) -> StageResult<T> {
    serde_json::from_value(payload.clone())
        .context("invalid job payload")
        .map_err(Into::into)
}

fn payload_str(payload: &Value, key: &str) -> StageResult<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .with_context(|| format!("payload missing {key}"))
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::jobs::JobStatus;
    use crate::testing::TestDeps;

    #[tokio::test]
    async fn idle_when_queue_is_empty() {
        let harness = TestDeps::new();
        let outcome = process_next_job(&harness.deps).await.unwrap();
        assert!(outcome.ok);
        assert!(outcome.idle);
        assert!(outcome.job.is_none());
    }

    #[tokio::test]
    async fn send_without_transport_config_fails_the_job() {
        let mut harness = TestDeps::new();
        harness.deps.mailer = None;

        let queue = JobQueue::new(harness.deps.store.clone());
        queue
            .create(
                JobType::Send,
                json!({"leadsFile": "leads-plumbers-austin.json"}),
            )
            .await
            .unwrap();

        let outcome = process_next_job(&harness.deps).await.unwrap();
        assert!(!outcome.ok);
        assert!(!outcome.idle);
        let job = outcome.job.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("smtp_config_missing"));
        assert!(job.finished_at.is_some());
    }

    #[tokio::test]
    async fn scrape_job_runs_and_stores_its_result() {
        let harness = TestDeps::new();
        harness.queue_discovery(vec![harness.lead("Ace", "1 Oak St")]);

        let queue = JobQueue::new(harness.deps.store.clone());
        queue
            .create(
                JobType::Scrape,
                json!({"query": "plumbers", "location": "Austin"}),
            )
            .await
            .unwrap();

        let outcome = process_next_job(&harness.deps).await.unwrap();
        assert!(outcome.ok);
        let job = outcome.job.unwrap();
        assert_eq!(job.status, JobStatus::Done);
        let result = job.result.unwrap();
        assert_eq!(result["newCount"], json!(1));
        assert_eq!(result["outFile"], json!("leads-plumbers-austin.json"));
    }

    #[tokio::test]
    async fn malformed_payload_fails_cleanly() {
        let harness = TestDeps::new();
        let queue = JobQueue::new(harness.deps.store.clone());
        queue
            .create(JobType::GenerateSite, json!({"nope": true}))
            .await
            .unwrap();

        let outcome = process_next_job(&harness.deps).await.unwrap();
        assert!(!outcome.ok);
        let job = outcome.job.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error.unwrap().contains("invalid job payload"));
    }
}
