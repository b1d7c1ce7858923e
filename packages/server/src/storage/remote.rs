//! Remote tabular backend over Supabase PostgREST.
//!
//! Four logical tables, addressed by conflict-key upserts. Claiming uses a
//! conditional PATCH filtered on `status=eq.queued`: an empty representation
//! means another worker won the race, which callers treat as idle.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use supabase_client::{JobRow, LeadRow, OutreachRow, SupabaseClient, WebsiteRow};
use uuid::Uuid;

use super::RecordStore;
use crate::config::SupabaseConfig;
use crate::domains::leads::{EmailStatus, Lead};
use crate::domains::outreach::{OutreachEntry, OutreachStatus};
use crate::domains::websites::WebsiteRecord;
use crate::jobs::{Job, JobPatch, JobStatus};

const JOBS_TABLE: &str = "website_biz_jobs";
const LEADS_TABLE: &str = "website_biz_leads";
const WEBSITES_TABLE: &str = "website_biz_websites";
const OUTREACH_TABLE: &str = "website_biz_outreach";
const ARTIFACTS_TABLE: &str = "website_biz_artifacts";

pub struct RemoteStore {
    client: SupabaseClient,
}

impl RemoteStore {
    pub fn new(config: &SupabaseConfig) -> Self {
        Self {
            client: SupabaseClient::new(config.url.clone(), config.service_role_key.clone()),
        }
    }
}

fn job_to_row(job: &Job) -> JobRow {
    JobRow {
        id: job.id,
        job_type: job.job_type.to_string(),
        payload: job.payload.clone(),
        status: job.status.as_str().to_string(),
        created_at: job.created_at,
        started_at: job.started_at,
        finished_at: job.finished_at,
        error: job.error.clone(),
        result: job.result.clone(),
    }
}

fn job_from_row(row: JobRow) -> Result<Job> {
    Ok(Job {
        id: row.id,
        job_type: row
            .job_type
            .parse()
            .map_err(|t| anyhow!("unknown_job_type:{t}"))?,
        payload: row.payload,
        status: serde_json::from_value(Value::String(row.status.clone()))
            .with_context(|| format!("unknown job status {}", row.status))?,
        created_at: row.created_at,
        started_at: row.started_at,
        finished_at: row.finished_at,
        error: row.error,
        result: row.result,
    })
}

/// PATCH body with only the fields the patch sets; absent keys keep their
/// stored values (serializing `None` would null the column instead).
fn patch_body(patch: &JobPatch) -> Value {
    let mut body = serde_json::Map::new();
    if let Some(status) = patch.status {
        body.insert("status".into(), json!(status));
    }
    if let Some(started_at) = patch.started_at {
        body.insert("started_at".into(), json!(started_at));
    }
    if let Some(finished_at) = patch.finished_at {
        body.insert("finished_at".into(), json!(finished_at));
    }
    if let Some(error) = &patch.error {
        body.insert("error".into(), json!(error));
    }
    if let Some(result) = &patch.result {
        body.insert("result".into(), json!(result));
    }
    Value::Object(body)
}

fn lead_to_row(source_file: &str, position: usize, lead: &Lead) -> LeadRow {
    LeadRow {
        source_file: source_file.to_string(),
        lead_key: lead.identity_key(),
        position: position as i64,
        place_id: lead.id.clone(),
        name: lead.name.clone(),
        address: lead.address.clone(),
        phone: lead.phone.clone(),
        website: lead.website.clone(),
        rating: lead.rating,
        reviews: lead.reviews as i64,
        industry: lead.industry.clone(),
        city: lead.city.clone(),
        slug: lead.slug.clone(),
        email: lead.email.clone(),
        email_secondary: lead.email_secondary.clone(),
        email_status: match lead.email_status {
            EmailStatus::Pending => "pending",
            EmailStatus::Scraped => "scraped",
            EmailStatus::NotFound => "not_found",
        }
        .to_string(),
        socials: serde_json::to_value(&lead.socials).unwrap_or(Value::Null),
        website_url: lead.website_url.clone(),
        enriched: lead.enriched,
    }
}

fn lead_from_row(row: LeadRow) -> Lead {
    Lead {
        id: row.place_id,
        name: row.name,
        address: row.address,
        phone: row.phone,
        website: row.website,
        rating: row.rating,
        reviews: row.reviews.max(0) as u32,
        industry: row.industry,
        city: row.city,
        slug: row.slug,
        email: row.email,
        email_secondary: row.email_secondary,
        email_status: match row.email_status.as_str() {
            "scraped" => EmailStatus::Scraped,
            "not_found" => EmailStatus::NotFound,
            _ => EmailStatus::Pending,
        },
        socials: serde_json::from_value(row.socials).unwrap_or_default(),
        website_url: row.website_url,
        enriched: row.enriched,
    }
}

fn outreach_to_row(entry: &OutreachEntry) -> OutreachRow {
    OutreachRow {
        id: entry.id,
        email: entry.email.clone(),
        business_name: entry.business_name.clone(),
        template_id: entry.template_id.clone(),
        sent_at: entry.sent_at,
        status: match entry.status {
            OutreachStatus::Sent => "sent",
            OutreachStatus::Failed => "failed",
        }
        .to_string(),
        error: entry.error.clone(),
    }
}

fn outreach_from_row(row: OutreachRow) -> OutreachEntry {
    OutreachEntry {
        id: row.id,
        email: row.email,
        business_name: row.business_name,
        template_id: row.template_id,
        sent_at: row.sent_at,
        status: match row.status.as_str() {
            "sent" => OutreachStatus::Sent,
            _ => OutreachStatus::Failed,
        },
        error: row.error,
    }
}

fn website_to_row(record: &WebsiteRecord) -> WebsiteRow {
    WebsiteRow {
        slug: record.slug.clone(),
        business_name: record.business_name.clone(),
        city: record.city.clone(),
        industry: record.industry.clone(),
        template_style: record.template_style.clone(),
        file_path: record.file_path.clone(),
        source_file: record.source_file.clone(),
        created_at: record.created_at,
    }
}

fn website_from_row(row: WebsiteRow) -> WebsiteRecord {
    WebsiteRecord {
        slug: row.slug,
        business_name: row.business_name,
        city: row.city,
        industry: row.industry,
        template_style: row.template_style,
        file_path: row.file_path,
        source_file: row.source_file,
        created_at: row.created_at,
    }
}

#[async_trait]
impl RecordStore for RemoteStore {
    async fn insert_job(&self, job: &Job) -> Result<()> {
        let _: Vec<JobRow> = self.client.insert(JOBS_TABLE, &[job_to_row(job)]).await?;
        Ok(())
    }

    async fn patch_job(&self, id: Uuid, patch: &JobPatch) -> Result<Option<Job>> {
        let id_filter = format!("eq.{id}");
        let rows: Vec<JobRow> = self
            .client
            .update(JOBS_TABLE, &[("id", id_filter.as_str())], &patch_body(patch))
            .await?;
        rows.into_iter().next().map(job_from_row).transpose()
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>> {
        let id_filter = format!("eq.{id}");
        let rows: Vec<JobRow> = self
            .client
            .select(JOBS_TABLE, &[("id", id_filter.as_str()), ("limit", "1")])
            .await?;
        rows.into_iter().next().map(job_from_row).transpose()
    }

    async fn list_jobs(&self, limit: usize) -> Result<Vec<Job>> {
        let limit = limit.to_string();
        let rows: Vec<JobRow> = self
            .client
            .select(
                JOBS_TABLE,
                &[("order", "created_at.desc"), ("limit", limit.as_str())],
            )
            .await?;
        rows.into_iter().map(job_from_row).collect()
    }

    async fn claim_next_job(&self) -> Result<Option<Job>> {
        let rows: Vec<JobRow> = self
            .client
            .select(
                JOBS_TABLE,
                &[
                    ("status", "eq.queued"),
                    ("order", "created_at.asc"),
                    ("limit", "1"),
                ],
            )
            .await?;
        let Some(candidate) = rows.into_iter().next() else {
            return Ok(None);
        };

        // Conditional flip; an empty result means another worker claimed it
        // between our read and this write.
        let id_filter = format!("eq.{}", candidate.id);
        let claimed: Vec<JobRow> = self
            .client
            .update(
                JOBS_TABLE,
                &[("id", id_filter.as_str()), ("status", "eq.queued")],
                &patch_body(&JobPatch::running(Utc::now())),
            )
            .await?;
        claimed.into_iter().next().map(job_from_row).transpose()
    }

    async fn load_leads(&self, source_file: &str) -> Result<Vec<Lead>> {
        let file_filter = format!("eq.{source_file}");
        let rows: Vec<LeadRow> = self
            .client
            .select(
                LEADS_TABLE,
                &[
                    ("source_file", file_filter.as_str()),
                    ("order", "position.asc"),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(lead_from_row).collect())
    }

    async fn upsert_leads(&self, source_file: &str, leads: &[Lead]) -> Result<()> {
        if leads.is_empty() {
            return Ok(());
        }
        let rows: Vec<LeadRow> = leads
            .iter()
            .enumerate()
            .map(|(i, lead)| lead_to_row(source_file, i, lead))
            .collect();
        self.client
            .upsert(LEADS_TABLE, "source_file,lead_key", &rows)
            .await?;
        Ok(())
    }

    async fn list_websites(&self) -> Result<Vec<WebsiteRecord>> {
        let rows: Vec<WebsiteRow> = self
            .client
            .select(WEBSITES_TABLE, &[("order", "created_at.asc")])
            .await?;
        Ok(rows.into_iter().map(website_from_row).collect())
    }

    async fn upsert_website(&self, record: &WebsiteRecord) -> Result<()> {
        self.client
            .upsert(WEBSITES_TABLE, "slug", &[website_to_row(record)])
            .await?;
        Ok(())
    }

    async fn list_outreach(&self) -> Result<Vec<OutreachEntry>> {
        let rows: Vec<OutreachRow> = self.client.select(OUTREACH_TABLE, &[]).await?;
        Ok(rows.into_iter().map(outreach_from_row).collect())
    }

    async fn upsert_outreach(&self, entries: &[OutreachEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let rows: Vec<OutreachRow> = entries.iter().map(outreach_to_row).collect();
        self.client.upsert(OUTREACH_TABLE, "id", &rows).await?;
        Ok(())
    }

    async fn write_artifact(&self, kind: &str, key: &str, data: Value) -> Result<()> {
        let row = json!({ "kind": kind, "key": key, "data": data });
        let _: Vec<Value> = self.client.insert(ARTIFACTS_TABLE, &[row]).await?;
        Ok(())
    }
}
