//! Enrich stage: visit each lead's website and pull contact details.
//!
//! Per-lead fetch failures are data, not errors: the lead ends up with
//! `email_status = not_found` and the stage moves on. Only storage failures
//! abort the stage.

use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::extract::{extract_emails, extract_socials};
use super::model::EmailStatus;
use crate::common::DataPaths;
use crate::error::StageResult;
use crate::kernel::PipelineDeps;
use crate::storage::RecordStore;

const PER_LEAD_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Serialize)]
pub struct EnrichOutcome {
    pub total: usize,
    pub processed: usize,
    #[serde(rename = "withEmail")]
    pub with_email: usize,
}

pub async fn run_enrich(deps: &PipelineDeps, leads_file: &str) -> StageResult<EnrichOutcome> {
    let source_name = DataPaths::source_name(leads_file);
    let mut leads = deps.store.load_leads(&source_name).await?;

    let mut processed = 0;
    for lead in leads.iter_mut() {
        if lead.enriched && lead.email_status != EmailStatus::Pending {
            continue;
        }
        processed += 1;

        let html = if lead.website.is_empty() {
            String::new()
        } else {
            fetch_text(&deps.http, &lead.website).await
        };

        let emails = extract_emails(&html);
        lead.email = emails.first().cloned().unwrap_or_default();
        lead.email_secondary = emails.get(1).cloned().unwrap_or_default();
        lead.email_status = if emails.is_empty() {
            EmailStatus::NotFound
        } else {
            EmailStatus::Scraped
        };
        for (network, url) in extract_socials(&html) {
            lead.socials.insert(network, url);
        }
        lead.enriched = true;

        tokio::time::sleep(PER_LEAD_DELAY).await;
    }

    deps.store.upsert_leads(&source_name, &leads).await?;

    let with_email = leads.iter().filter(|l| !l.email.is_empty()).count();
    let outcome = EnrichOutcome {
        total: leads.len(),
        processed,
        with_email,
    };

    // Audit history only; never worth failing the stage over.
    if let Err(error) = deps
        .store
        .write_artifact(
            "leads",
            &source_name,
            json!({ "total": outcome.total, "withEmail": outcome.with_email }),
        )
        .await
    {
        debug!(%error, "artifact write skipped");
    }

    Ok(outcome)
}

/// Fetch a page body; anything that goes wrong reads as an empty page.
async fn fetch_text(client: &reqwest::Client, url: &str) -> String {
    match client.get(url).send().await {
        Ok(resp) if resp.status().is_success() => resp.text().await.unwrap_or_default(),
        Ok(_) | Err(_) => String::new(),
    }
}
