//! Local JSON-file backend.
//!
//! Each record family is one file under the data directory, loaded and saved
//! whole. A single async mutex serializes every load-modify-save cycle, which
//! is what makes `claim_next_job` atomic within a process; saves go through a
//! temp file + rename so a crash never leaves a half-written file. Missing
//! files read as empty; unreadable files are a fatal storage error.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::RecordStore;
use crate::common::DataPaths;
use crate::domains::daily::DailyState;
use crate::domains::leads::Lead;
use crate::domains::outreach::{EmailTemplate, OutreachEntry};
use crate::domains::websites::WebsiteRecord;
use crate::jobs::{Job, JobPatch, JobStatus};

pub struct LocalStore {
    paths: DataPaths,
    lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(paths: DataPaths) -> Self {
        Self {
            paths,
            lock: Mutex::new(()),
        }
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    async fn load_json<T: DeserializeOwned>(path: &Path, fallback: T) -> Result<T> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => serde_json::from_str(&text)
                .with_context(|| format!("corrupt data file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(fallback),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(data)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, text)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }

    // Singleton files outside the dual-backend record families.

    pub async fn daily_state(&self) -> Result<DailyState> {
        let _guard = self.lock.lock().await;
        Self::load_json(&self.paths.daily_state_file(), DailyState::default()).await
    }

    pub async fn set_daily_state(&self, state: &DailyState) -> Result<()> {
        let _guard = self.lock.lock().await;
        Self::save_json(&self.paths.daily_state_file(), state).await
    }

    pub async fn templates(&self) -> Result<Vec<EmailTemplate>> {
        let _guard = self.lock.lock().await;
        Self::load_json(&self.paths.templates_file(), Vec::new()).await
    }

    pub async fn set_templates(&self, templates: &[EmailTemplate]) -> Result<()> {
        let _guard = self.lock.lock().await;
        Self::save_json(&self.paths.templates_file(), &templates).await
    }
}

#[async_trait]
impl RecordStore for LocalStore {
    async fn insert_job(&self, job: &Job) -> Result<()> {
        let _guard = self.lock.lock().await;
        let path = self.paths.jobs_file();
        let mut jobs: Vec<Job> = Self::load_json(&path, Vec::new()).await?;
        jobs.push(job.clone());
        Self::save_json(&path, &jobs).await
    }

    async fn patch_job(&self, id: Uuid, patch: &JobPatch) -> Result<Option<Job>> {
        let _guard = self.lock.lock().await;
        let path = self.paths.jobs_file();
        let mut jobs: Vec<Job> = Self::load_json(&path, Vec::new()).await?;
        let Some(job) = jobs.iter_mut().find(|j| j.id == id) else {
            return Ok(None);
        };
        patch.apply(job);
        let updated = job.clone();
        Self::save_json(&path, &jobs).await?;
        Ok(Some(updated))
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>> {
        let _guard = self.lock.lock().await;
        let jobs: Vec<Job> = Self::load_json(&self.paths.jobs_file(), Vec::new()).await?;
        Ok(jobs.into_iter().find(|j| j.id == id))
    }

    async fn list_jobs(&self, limit: usize) -> Result<Vec<Job>> {
        let _guard = self.lock.lock().await;
        let jobs: Vec<Job> = Self::load_json(&self.paths.jobs_file(), Vec::new()).await?;
        // File order is insertion order; newest first for callers.
        Ok(jobs.into_iter().rev().take(limit).collect())
    }

    async fn claim_next_job(&self) -> Result<Option<Job>> {
        // Hold the lock across find + flip + save: at most one caller can
        // move any given job out of `queued`.
        let _guard = self.lock.lock().await;
        let path = self.paths.jobs_file();
        let mut jobs: Vec<Job> = Self::load_json(&path, Vec::new()).await?;
        let Some(job) = jobs.iter_mut().find(|j| j.status == JobStatus::Queued) else {
            return Ok(None);
        };
        JobPatch::running(Utc::now()).apply(job);
        let claimed = job.clone();
        Self::save_json(&path, &jobs).await?;
        Ok(Some(claimed))
    }

    async fn load_leads(&self, source_file: &str) -> Result<Vec<Lead>> {
        let _guard = self.lock.lock().await;
        Self::load_json(&self.paths.leads_file(source_file), Vec::new()).await
    }

    async fn upsert_leads(&self, source_file: &str, leads: &[Lead]) -> Result<()> {
        let _guard = self.lock.lock().await;
        Self::save_json(&self.paths.leads_file(source_file), &leads).await
    }

    async fn list_websites(&self) -> Result<Vec<WebsiteRecord>> {
        let _guard = self.lock.lock().await;
        Self::load_json(&self.paths.site_index(), Vec::new()).await
    }

    async fn upsert_website(&self, record: &WebsiteRecord) -> Result<()> {
        let _guard = self.lock.lock().await;
        let path = self.paths.site_index();
        let mut index: Vec<WebsiteRecord> = Self::load_json(&path, Vec::new()).await?;
        match index.iter_mut().find(|r| r.slug == record.slug) {
            Some(existing) => *existing = record.clone(),
            None => index.push(record.clone()),
        }
        Self::save_json(&path, &index).await
    }

    async fn list_outreach(&self) -> Result<Vec<OutreachEntry>> {
        let _guard = self.lock.lock().await;
        Self::load_json(&self.paths.outreach_log(), Vec::new()).await
    }

    async fn upsert_outreach(&self, entries: &[OutreachEntry]) -> Result<()> {
        let _guard = self.lock.lock().await;
        Self::save_json(&self.paths.outreach_log(), &entries).await
    }

    async fn write_artifact(&self, kind: &str, key: &str, data: Value) -> Result<()> {
        let _guard = self.lock.lock().await;
        let path = self.paths.artifacts_file();
        let mut rows: Vec<Value> = Self::load_json(&path, Vec::new()).await?;
        rows.push(serde_json::json!({
            "kind": kind,
            "key": key,
            "created_at": Utc::now(),
            "data": data,
        }));
        Self::save_json(&path, &rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::jobs::JobType;

    fn store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path());
        paths.ensure_dirs().unwrap();
        (dir, LocalStore::new(paths))
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let (_dir, store) = store();
        let job = Job::new(JobType::Scrape, json!({"query": "plumbers"}));
        store.insert_job(&job).await.unwrap();
        let loaded = store.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, job.id);
        assert_eq!(loaded.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn list_jobs_is_newest_first_and_bounded() {
        let (_dir, store) = store();
        for i in 0..5 {
            store
                .insert_job(&Job::new(JobType::Enrich, json!({ "i": i })))
                .await
                .unwrap();
        }
        let listed = store.list_jobs(3).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].payload["i"], json!(4));
        assert_eq!(listed[2].payload["i"], json!(2));
    }

    #[tokio::test]
    async fn claim_takes_oldest_queued() {
        let (_dir, store) = store();
        let first = Job::new(JobType::Scrape, json!({}));
        let second = Job::new(JobType::Enrich, json!({}));
        store.insert_job(&first).await.unwrap();
        store.insert_job(&second).await.unwrap();

        let claimed = store.claim_next_job().await.unwrap().unwrap();
        assert_eq!(claimed.id, first.id);
        assert_eq!(claimed.status, JobStatus::Running);
        assert!(claimed.started_at.is_some());

        let claimed = store.claim_next_job().await.unwrap().unwrap();
        assert_eq!(claimed.id, second.id);
        assert!(store.claim_next_job().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_claims_take_distinct_jobs() {
        let (_dir, store) = store();
        let store = std::sync::Arc::new(store);
        store
            .insert_job(&Job::new(JobType::Send, json!({})))
            .await
            .unwrap();

        let claims = futures::future::join_all(
            (0..8).map(|_| {
                let store = store.clone();
                async move { store.claim_next_job().await.unwrap() }
            }),
        )
        .await;

        let won: Vec<_> = claims.into_iter().flatten().collect();
        assert_eq!(won.len(), 1, "exactly one concurrent claim may win");
    }

    #[tokio::test]
    async fn missing_files_read_as_empty() {
        let (_dir, store) = store();
        assert!(store.list_outreach().await.unwrap().is_empty());
        assert!(store.load_leads("leads-x.json").await.unwrap().is_empty());
        assert!(store.list_jobs(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_website_replaces_by_slug() {
        let (_dir, store) = store();
        let mut record = WebsiteRecord {
            slug: "ace-austin".into(),
            business_name: "Ace".into(),
            city: "Austin".into(),
            industry: "plumbers".into(),
            template_style: "modern".into(),
            file_path: "websites/ace-austin.html".into(),
            source_file: "leads-plumbers-austin.json".into(),
            created_at: Utc::now(),
        };
        store.upsert_website(&record).await.unwrap();
        record.template_style = "bold".into();
        store.upsert_website(&record).await.unwrap();

        let index = store.list_websites().await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].template_style, "bold");
    }
}
