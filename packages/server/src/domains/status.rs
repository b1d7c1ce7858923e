//! Read-only summaries over the data directory.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::domains::leads::Lead;
use crate::domains::outreach::{ensure_templates, OutreachStatus};
use crate::kernel::PipelineDeps;
use crate::storage::RecordStore;

#[derive(Debug, Clone, Serialize)]
pub struct LeadsFileSummary {
    pub file: String,
    pub total: usize,
    #[serde(rename = "withEmail")]
    pub with_email: usize,
    pub enriched: usize,
    pub websites: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    #[serde(rename = "leadsSummary")]
    pub leads_summary: Vec<LeadsFileSummary>,
    pub websites: usize,
    #[serde(rename = "outreachTotal")]
    pub outreach_total: usize,
    pub templates: usize,
    #[serde(rename = "defaultTemplate")]
    pub default_template: Option<String>,
    pub daily: Value,
}

pub async fn get_status(deps: &PipelineDeps) -> Result<StatusReport> {
    let mut leads_summary = Vec::new();
    for file in deps.paths.list_leads_files() {
        let leads = deps.store.load_leads(&file).await?;
        leads_summary.push(summarize(&file, &leads));
    }

    let websites = deps.store.list_websites().await?.len();
    let outreach_total = deps
        .store
        .list_outreach()
        .await?
        .iter()
        .filter(|e| e.status == OutreachStatus::Sent)
        .count();
    let templates = ensure_templates(&deps.local).await?;
    let daily = serde_json::to_value(deps.local.daily_state().await?)?;

    Ok(StatusReport {
        leads_summary,
        websites,
        outreach_total,
        default_template: templates
            .iter()
            .find(|t| t.is_default)
            .map(|t| t.name.clone()),
        templates: templates.len(),
        daily,
    })
}

/// Deeper dump than `get_status`: per-file lead samples plus the full
/// website index and outreach log.
pub async fn get_history(deps: &PipelineDeps, limit_per_file: usize) -> Result<Value> {
    let mut files = Vec::new();
    for file in deps.paths.list_leads_files() {
        let leads = deps.store.load_leads(&file).await?;
        let sample: Vec<Value> = leads
            .iter()
            .take(limit_per_file)
            .map(|l| {
                serde_json::json!({
                    "name": l.name,
                    "industry": l.industry,
                    "city": l.city,
                    "email": if l.email.is_empty() { Value::Null } else { l.email.clone().into() },
                    "phone": if l.phone.is_empty() { Value::Null } else { l.phone.clone().into() },
                    "website_url": if l.website_url.is_empty() { Value::Null } else { l.website_url.clone().into() },
                    "enriched": l.enriched,
                })
            })
            .collect();
        files.push(serde_json::json!({
            "file": file,
            "total": leads.len(),
            "sample": sample,
        }));
    }

    Ok(serde_json::json!({
        "leads": files,
        "websites": deps.store.list_websites().await?,
        "outreach": deps.store.list_outreach().await?,
    }))
}

fn summarize(file: &str, leads: &[Lead]) -> LeadsFileSummary {
    LeadsFileSummary {
        file: file.to_string(),
        total: leads.len(),
        with_email: leads.iter().filter(|l| !l.email.is_empty()).count(),
        enriched: leads.iter().filter(|l| l.enriched).count(),
        websites: leads.iter().filter(|l| !l.website_url.is_empty()).count(),
    }
}
