//! Remote-first decorator with silent local fallback.
//!
//! When the remote backend is configured, every operation is tried there
//! first; any remote error downgrades that single operation to the local
//! file and the caller never sees the failure. There is no retry queue and
//! no reconciliation: a job created remotely and patched locally ends up
//! split across the two backends. That trade keeps the pipeline moving when
//! the remote is down, and the local files stay a complete, authoritative
//! store on their own.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use super::{LocalStore, RecordStore, RemoteStore};
use crate::domains::leads::Lead;
use crate::domains::outreach::OutreachEntry;
use crate::domains::websites::WebsiteRecord;
use crate::jobs::{Job, JobPatch};

pub struct FallbackStore {
    local: Arc<LocalStore>,
    remote: Option<RemoteStore>,
}

impl FallbackStore {
    pub fn new(local: Arc<LocalStore>, remote: Option<RemoteStore>) -> Self {
        Self { local, remote }
    }

    pub fn is_remote_available(&self) -> bool {
        self.remote.is_some()
    }
}

/// Try the remote backend when present, fall back to local on any error.
macro_rules! remote_first {
    ($self:ident, $op:literal, $method:ident ( $($arg:expr),* )) => {{
        if let Some(remote) = &$self.remote {
            match remote.$method($($arg),*).await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    warn!(op = $op, %error, "remote backend failed, using local file");
                }
            }
        }
        $self.local.$method($($arg),*).await
    }};
}

#[async_trait]
impl RecordStore for FallbackStore {
    async fn insert_job(&self, job: &Job) -> Result<()> {
        remote_first!(self, "insert_job", insert_job(job))
    }

    async fn patch_job(&self, id: Uuid, patch: &JobPatch) -> Result<Option<Job>> {
        remote_first!(self, "patch_job", patch_job(id, patch))
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>> {
        remote_first!(self, "get_job", get_job(id))
    }

    async fn list_jobs(&self, limit: usize) -> Result<Vec<Job>> {
        remote_first!(self, "list_jobs", list_jobs(limit))
    }

    async fn claim_next_job(&self) -> Result<Option<Job>> {
        remote_first!(self, "claim_next_job", claim_next_job())
    }

    async fn load_leads(&self, source_file: &str) -> Result<Vec<Lead>> {
        remote_first!(self, "load_leads", load_leads(source_file))
    }

    async fn upsert_leads(&self, source_file: &str, leads: &[Lead]) -> Result<()> {
        remote_first!(self, "upsert_leads", upsert_leads(source_file, leads))
    }

    async fn list_websites(&self) -> Result<Vec<WebsiteRecord>> {
        remote_first!(self, "list_websites", list_websites())
    }

    async fn upsert_website(&self, record: &WebsiteRecord) -> Result<()> {
        remote_first!(self, "upsert_website", upsert_website(record))
    }

    async fn list_outreach(&self) -> Result<Vec<OutreachEntry>> {
        remote_first!(self, "list_outreach", list_outreach())
    }

    async fn upsert_outreach(&self, entries: &[OutreachEntry]) -> Result<()> {
        remote_first!(self, "upsert_outreach", upsert_outreach(entries))
    }

    async fn write_artifact(&self, kind: &str, key: &str, data: Value) -> Result<()> {
        if let Some(remote) = &self.remote {
            match remote.write_artifact(kind, key, data.clone()).await {
                Ok(()) => return Ok(()),
                Err(error) => {
                    warn!(op = "write_artifact", %error, "remote backend failed, using local file");
                }
            }
        }
        self.local.write_artifact(kind, key, data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::common::DataPaths;
    use crate::config::SupabaseConfig;
    use crate::jobs::JobType;

    fn local() -> (tempfile::TempDir, Arc<LocalStore>) {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        paths.ensure_dirs().unwrap();
        (dir, Arc::new(LocalStore::new(paths)))
    }

    #[tokio::test]
    async fn without_remote_everything_lands_locally() {
        let (_dir, local) = local();
        let store = FallbackStore::new(local.clone(), None);
        assert!(!store.is_remote_available());

        let job = Job::new(JobType::Scrape, json!({}));
        store.insert_job(&job).await.unwrap();
        assert!(local.get_job(job.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unreachable_remote_falls_back_silently() {
        let (_dir, local) = local();
        // Nothing listens here; every remote call errors out fast.
        let remote = RemoteStore::new(&SupabaseConfig {
            url: "http://127.0.0.1:9".into(),
            service_role_key: "k".into(),
        });
        let store = FallbackStore::new(local.clone(), Some(remote));

        let job = Job::new(JobType::Send, json!({}));
        store.insert_job(&job).await.unwrap();

        // The operation reported success and the record is in the local file.
        let claimed = store.claim_next_job().await.unwrap().unwrap();
        assert_eq!(claimed.id, job.id);
    }
}
