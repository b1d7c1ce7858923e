//! Row types for the four pipeline tables.
//!
//! Columns mirror what the core reads and writes; anything else the tables
//! carry server-side (defaults, RLS metadata) is ignored on decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Row in `website_biz_jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRow {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub job_type: String,
    pub payload: Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub result: Option<Value>,
}

/// Row in `website_biz_leads`, upserted on `(source_file, lead_key)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadRow {
    pub source_file: String,
    pub lead_key: String,
    /// Insertion order within the source file; list reads sort on this.
    pub position: i64,
    /// Identifier assigned by the scrape backend.
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub rating: Option<f64>,
    pub reviews: i64,
    pub industry: String,
    pub city: String,
    pub slug: String,
    pub email: String,
    pub email_secondary: String,
    pub email_status: String,
    pub socials: Value,
    pub website_url: String,
    pub enriched: bool,
}

/// Row in `website_biz_websites`, upserted on `slug`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsiteRow {
    pub slug: String,
    pub business_name: String,
    pub city: String,
    pub industry: String,
    pub template_style: String,
    pub file_path: String,
    pub source_file: String,
    pub created_at: DateTime<Utc>,
}

/// Row in `website_biz_outreach`, upserted on `id` (append-only log).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachRow {
    pub id: Uuid,
    pub email: String,
    pub business_name: String,
    pub template_id: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub status: String,
    pub error: Option<String>,
}

/// Row in `website_biz_artifacts`, insert-only audit history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRow {
    pub kind: String,
    pub key: String,
    pub data: Value,
}
