//! Record persistence behind one interface, two backends.
//!
//! Every read and write the core performs is defined against [`RecordStore`].
//! [`LocalStore`] keeps plain JSON files under the data directory;
//! [`RemoteStore`] talks to the Supabase tables; [`FallbackStore`] composes
//! them with the availability-over-consistency policy: prefer remote when
//! credentials exist, fall back silently to the local file on any remote
//! error, one operation at a time.

mod fallback;
mod local;
mod remote;

pub use fallback::FallbackStore;
pub use local::LocalStore;
pub use remote::RemoteStore;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::domains::leads::Lead;
use crate::domains::outreach::OutreachEntry;
use crate::domains::websites::WebsiteRecord;
use crate::jobs::{Job, JobPatch};

/// Storage interface shared by the local-file and remote backends.
///
/// Upserts are idempotent by conflict key (`source_file + lead_key` for
/// leads, entry id for outreach, slug for websites): re-running a stage must
/// never create duplicate rows. `claim_next_job` is the one operation with a
/// hard atomicity requirement — a single conditional `queued -> running`
/// flip, safe under concurrent callers.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // Jobs
    async fn insert_job(&self, job: &Job) -> Result<()>;
    async fn patch_job(&self, id: Uuid, patch: &JobPatch) -> Result<Option<Job>>;
    async fn get_job(&self, id: Uuid) -> Result<Option<Job>>;
    /// Snapshot of current jobs, most-recently-created first.
    async fn list_jobs(&self, limit: usize) -> Result<Vec<Job>>;
    /// Atomically claim the oldest queued job, or `None` when idle.
    async fn claim_next_job(&self) -> Result<Option<Job>>;

    // Leads, one logical set per source file
    async fn load_leads(&self, source_file: &str) -> Result<Vec<Lead>>;
    async fn upsert_leads(&self, source_file: &str, leads: &[Lead]) -> Result<()>;

    // Website artifact index
    async fn list_websites(&self) -> Result<Vec<WebsiteRecord>>;
    async fn upsert_website(&self, record: &WebsiteRecord) -> Result<()>;

    // Outreach log (append-only; callers pass the full log)
    async fn list_outreach(&self) -> Result<Vec<OutreachEntry>>;
    async fn upsert_outreach(&self, entries: &[OutreachEntry]) -> Result<()>;

    /// Additive audit history; never used for dedup.
    async fn write_artifact(&self, kind: &str, key: &str, data: Value) -> Result<()>;
}
