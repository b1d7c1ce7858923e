//! Send stage: rate-limited outreach over the append-only log.
//!
//! Two distinct policies meet here and must not be conflated:
//! - throttling counts only entries that actually went out today
//!   (`sent_at` set), so failed attempts never eat tomorrow's budget;
//! - eligibility dedup counts every log entry ever, any status, so an
//!   address whose only attempt failed is still never re-targeted without
//!   an operator clearing the row.

use std::collections::HashSet;

use chrono::Local;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use super::model::{OutreachEntry, OutreachStatus};
use super::templates::{ensure_templates, substitute};
use crate::common::DataPaths;
use crate::error::{StageError, StageResult};
use crate::kernel::PipelineDeps;
use crate::storage::RecordStore;

#[derive(Debug, Clone, Serialize)]
pub struct SendOutcome {
    pub sent: usize,
    pub attempted: usize,
    /// Slots left in today's budget after this run.
    pub remaining: usize,
}

pub async fn run_send(deps: &PipelineDeps, leads_file: &str) -> StageResult<SendOutcome> {
    let mailer = deps
        .mailer
        .as_ref()
        .ok_or(StageError::Config("smtp_config_missing"))?;
    let daily_limit = deps
        .config
        .smtp
        .as_ref()
        .map(|s| s.daily_limit as usize)
        .unwrap_or(25);

    let source_name = DataPaths::source_name(leads_file);
    let leads = deps.store.load_leads(&source_name).await?;
    let templates = ensure_templates(&deps.local).await?;
    let template = templates
        .iter()
        .find(|t| t.is_default)
        .unwrap_or(&templates[0]);

    let mut log = deps.store.list_outreach().await?;

    let today = Local::now().date_naive();
    let sent_today = log
        .iter()
        .filter(|e| {
            e.sent_at
                .map(|t| t.with_timezone(&Local).date_naive() == today)
                .unwrap_or(false)
        })
        .count();
    let remaining = daily_limit.saturating_sub(sent_today);

    let already: HashSet<&str> = log.iter().map(|e| e.email.as_str()).collect();
    let eligible: Vec<_> = leads
        .iter()
        .filter(|l| {
            !l.email.is_empty() && !l.website_url.is_empty() && !already.contains(l.email.as_str())
        })
        .take(remaining)
        .collect();

    let attempted = eligible.len();
    let mut sent = 0;
    for lead in eligible {
        let vars: Vec<(&str, String)> = vec![
            ("business_name", lead.name.clone()),
            ("city", lead.city.clone()),
            ("industry", lead.industry.clone()),
            ("website_url", lead.website_url.clone()),
            ("phone", lead.phone.clone()),
            ("rating", lead.rating.map(|r| r.to_string()).unwrap_or_default()),
            ("reviews", lead.reviews.to_string()),
            ("sender_name", deps.config.sender_name.clone()),
        ];
        let subject = substitute(&template.subject, &vars);
        let body = substitute(&template.body, &vars);

        let mut entry = OutreachEntry {
            id: Uuid::new_v4(),
            email: lead.email.clone(),
            business_name: lead.name.clone(),
            template_id: template.id.clone(),
            sent_at: None,
            status: OutreachStatus::Failed,
            error: None,
        };
        match mailer.send(&lead.email, &subject, &body).await {
            Ok(()) => {
                entry.status = OutreachStatus::Sent;
                entry.sent_at = Some(chrono::Utc::now());
                sent += 1;
            }
            Err(error) => {
                info!(email = %lead.email, %error, "outreach delivery failed");
                entry.error = Some(error.to_string());
            }
        }
        log.push(entry);
    }

    deps.store.upsert_outreach(&log).await?;

    if let Err(error) = deps
        .store
        .write_artifact(
            "outreach",
            &source_name,
            json!({ "total": log.len(), "sent": sent, "attempted": attempted }),
        )
        .await
    {
        debug!(%error, "artifact write skipped");
    }

    Ok(SendOutcome {
        sent,
        attempted,
        remaining: remaining.saturating_sub(sent),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestDeps;

    fn ready_lead(harness: &TestDeps, name: &str, email: &str) -> crate::domains::leads::Lead {
        let mut lead = harness.lead(name, &format!("{name} street"));
        lead.email = email.into();
        lead.website_url = format!("websites/{}.html", lead.slug);
        lead
    }

    #[tokio::test]
    async fn missing_smtp_config_fails_the_whole_stage() {
        let mut harness = TestDeps::new();
        harness.deps.mailer = None;
        let err = run_send(&harness.deps, "leads-plumbers-austin.json")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "smtp_config_missing");
    }

    #[tokio::test]
    async fn sends_to_eligible_leads_and_logs_each_attempt() {
        let harness = TestDeps::new();
        // One fully eligible lead, one with no generated site, one with no email.
        let mut no_site = harness.lead("Budget", "Budget street");
        no_site.email = "info@budget.com".into();
        let mut no_email = harness.lead("Mute", "Mute street");
        no_email.website_url = "websites/mute.html".into();
        let leads = vec![ready_lead(&harness, "Ace", "ace@ace.com"), no_site, no_email];
        harness
            .deps
            .store
            .upsert_leads("leads-plumbers-austin.json", &leads)
            .await
            .unwrap();

        let outcome = run_send(&harness.deps, "leads-plumbers-austin.json")
            .await
            .unwrap();
        assert_eq!(outcome.attempted, 1);
        assert_eq!(outcome.sent, 1);

        let log = harness.deps.store.list_outreach().await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].email, "ace@ace.com");
        assert_eq!(log[0].status, OutreachStatus::Sent);
        assert!(log[0].sent_at.is_some());

        let delivered = harness.mailer.sent.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0].1.contains("Ace"), "subject is templated");
    }

    #[tokio::test]
    async fn lifetime_dedup_never_retargets_a_logged_address() {
        let harness = TestDeps::new();
        harness
            .deps
            .store
            .upsert_leads(
                "leads-plumbers-austin.json",
                &[ready_lead(&harness, "Ace", "ace@ace.com")],
            )
            .await
            .unwrap();

        let first = run_send(&harness.deps, "leads-plumbers-austin.json")
            .await
            .unwrap();
        assert_eq!(first.sent, 1);

        // Same file, fresh day budget: the address is already in the log.
        let second = run_send(&harness.deps, "leads-plumbers-austin.json")
            .await
            .unwrap();
        assert_eq!(second.attempted, 0);
        assert_eq!(second.sent, 0);
        assert_eq!(harness.deps.store.list_outreach().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_attempts_are_logged_but_do_not_consume_quota() {
        let harness = TestDeps::new();
        harness
            .mailer
            .fail_for
            .lock()
            .unwrap()
            .insert("ace@ace.com".into());
        harness
            .deps
            .store
            .upsert_leads(
                "leads-plumbers-austin.json",
                &[ready_lead(&harness, "Ace", "ace@ace.com")],
            )
            .await
            .unwrap();

        let outcome = run_send(&harness.deps, "leads-plumbers-austin.json")
            .await
            .unwrap();
        assert_eq!(outcome.attempted, 1);
        assert_eq!(outcome.sent, 0);
        // The failure did not shrink the day's budget.
        assert_eq!(outcome.remaining, harness.daily_limit());

        let log = harness.deps.store.list_outreach().await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].status, OutreachStatus::Failed);
        assert!(log[0].sent_at.is_none());
        assert!(log[0].error.is_some());

        // Policy: the failed address still participates in lifetime dedup.
        harness.mailer.fail_for.lock().unwrap().clear();
        let retry = run_send(&harness.deps, "leads-plumbers-austin.json")
            .await
            .unwrap();
        assert_eq!(retry.attempted, 0, "failed address is not auto-retried");
    }

    #[tokio::test]
    async fn daily_budget_truncates_eligible_leads() {
        let harness = TestDeps::with_daily_limit(2);
        let leads: Vec<_> = (0..4)
            .map(|i| ready_lead(&harness, &format!("Biz{i}"), &format!("b{i}@biz.com")))
            .collect();
        harness
            .deps
            .store
            .upsert_leads("leads-plumbers-austin.json", &leads)
            .await
            .unwrap();

        let outcome = run_send(&harness.deps, "leads-plumbers-austin.json")
            .await
            .unwrap();
        assert_eq!(outcome.attempted, 2);
        assert_eq!(outcome.sent, 2);
        assert_eq!(outcome.remaining, 0);

        // Budget exhausted: nothing more goes out today.
        let again = run_send(&harness.deps, "leads-plumbers-austin.json")
            .await
            .unwrap();
        assert_eq!(again.attempted, 0);
    }
}
