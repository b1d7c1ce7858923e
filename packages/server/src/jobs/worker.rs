//! Cooperative worker loop.
//!
//! Single-threaded and strictly sequential: one claim, one full stage, one
//! recorded outcome, then immediately poll again. Idle polls sleep for the
//! configured interval. The loop owns no cancellation of in-flight stages;
//! the stop token is only checked between iterations.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::runner::process_next_job;
use crate::kernel::PipelineDeps;

pub struct Worker {
    deps: Arc<PipelineDeps>,
    poll_interval: Duration,
}

impl Worker {
    pub fn new(deps: Arc<PipelineDeps>, poll_interval: Duration) -> Self {
        Self {
            deps,
            poll_interval,
        }
    }

    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!(poll_ms = self.poll_interval.as_millis() as u64, "worker started");

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            match process_next_job(&self.deps).await {
                Ok(outcome) if outcome.idle => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
                Ok(outcome) => {
                    if let Some(job) = &outcome.job {
                        info!(
                            job_id = %job.id,
                            job_type = %job.job_type,
                            status = job.status.as_str(),
                            ok = outcome.ok,
                            "job processed"
                        );
                    }
                    // A job just finished; poll again without delay.
                }
                Err(err) => {
                    error!(error = %err, "failed to process next job");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                    }
                }
            }
        }

        info!("worker stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::jobs::{JobQueue, JobStatus, JobType};
    use crate::testing::TestDeps;

    #[tokio::test]
    async fn drains_the_queue_then_idles_until_cancelled() {
        let harness = TestDeps::new();
        harness.queue_discovery(vec![harness.lead("Ace", "1 Oak St")]);

        let queue = JobQueue::new(harness.deps.store.clone());
        let scrape = queue
            .create(
                JobType::Scrape,
                json!({"query": "plumbers", "location": "Austin"}),
            )
            .await
            .unwrap();
        let enrich = queue
            .create(
                JobType::Enrich,
                json!({"leadsFile": "leads-plumbers-austin.json"}),
            )
            .await
            .unwrap();

        let deps = Arc::new(harness.deps.clone());
        let worker = Worker::new(Arc::clone(&deps), Duration::from_millis(10));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(worker.run(shutdown.clone()));

        // Both jobs settle, oldest first, then the loop just polls.
        let queue = JobQueue::new(deps.store.clone());
        for _ in 0..100 {
            let done = queue.get(enrich.id).await.unwrap().unwrap();
            if done.status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(
            queue.get(scrape.id).await.unwrap().unwrap().status,
            JobStatus::Done
        );
        assert_eq!(
            queue.get(enrich.id).await.unwrap().unwrap().status,
            JobStatus::Done
        );

        shutdown.cancel();
        handle.await.unwrap().unwrap();
    }
}
