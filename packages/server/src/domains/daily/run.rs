//! The composite daily stages.
//!
//! `daily-set` pins the recurring query/location; `daily-run` executes
//! scrape -> enrich -> send against it, sequentially and without rollback:
//! a failure partway leaves the earlier stages' counter updates standing.

use chrono::Local;
use serde::Serialize;

use super::model::DailyState;
use crate::domains::leads::{run_enrich, run_scrape, EnrichOutcome, ScrapeOutcome, ScrapeParams};
use crate::domains::outreach::{run_send, SendOutcome};
use crate::error::{StageError, StageResult};
use crate::kernel::PipelineDeps;

#[derive(Debug, Clone, Serialize)]
pub struct DailyOutcome {
    pub scrape: ScrapeOutcome,
    pub enrich: EnrichOutcome,
    pub outreach: SendOutcome,
    pub state: DailyState,
}

pub async fn set_daily_target(
    deps: &PipelineDeps,
    query: &str,
    location: &str,
) -> StageResult<DailyState> {
    let mut state = deps.local.daily_state().await?;
    state.query = Some(query.to_string());
    state.location = Some(location.to_string());
    deps.local.set_daily_state(&state).await?;
    Ok(state)
}

pub async fn run_daily(deps: &PipelineDeps) -> StageResult<DailyOutcome> {
    let mut state = deps.local.daily_state().await?;
    let (query, location) = match (state.query.clone(), state.location.clone()) {
        (Some(q), Some(l)) => (q, l),
        _ => return Err(StageError::DailyTargetNotSet),
    };

    let today = Local::now().format("%Y-%m-%d").to_string();
    if state.last_run.as_deref() != Some(today.as_str()) {
        state.roll_over(&today);
    }

    let scrape = run_scrape(
        deps,
        ScrapeParams {
            query,
            location,
            max_results: Some(state.daily_limits.scrape as usize),
        },
    )
    .await?;
    state.leads_scraped_today = scrape.new_count as u32;
    // Persist before the fallible later stages so the scrape's progress
    // survives an enrich or send failure.
    deps.local.set_daily_state(&state).await?;

    let enrich = run_enrich(deps, &scrape.out_file).await?;
    let outreach = run_send(deps, &scrape.out_file).await?;

    state.emails_sent_today += outreach.sent as u32;
    deps.local.set_daily_state(&state).await?;

    Ok(DailyOutcome {
        scrape,
        enrich,
        outreach,
        state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    use crate::testing::TestDeps;

    #[tokio::test]
    async fn fails_without_a_configured_target() {
        let harness = TestDeps::new();
        let err = run_daily(&harness.deps).await.unwrap_err();
        assert_eq!(err.to_string(), "daily_target_not_set");
    }

    #[tokio::test]
    async fn same_day_runs_do_not_reset_counters() {
        let harness = TestDeps::new();
        set_daily_target(&harness.deps, "plumbers", "Austin")
            .await
            .unwrap();

        harness.queue_discovery(vec![harness.lead("Ace", "1 Oak St")]);
        let first = run_daily(&harness.deps).await.unwrap();
        assert_eq!(first.state.leads_scraped_today, 1);
        assert_eq!(
            first.state.last_run.as_deref(),
            Some(Local::now().format("%Y-%m-%d").to_string().as_str())
        );

        // Second run the same day: no reset; the scrape counter carries the
        // latest run's delta as reported by the stage.
        harness.queue_discovery(vec![harness.lead("Budget", "2 Elm Ave")]);
        let second = run_daily(&harness.deps).await.unwrap();
        assert_eq!(second.state.leads_scraped_today, 1);
        assert_eq!(second.scrape.count, 2, "leads file keeps accumulating");
    }

    #[tokio::test]
    async fn a_new_day_resets_all_three_counters() {
        let harness = TestDeps::new();
        set_daily_target(&harness.deps, "plumbers", "Austin")
            .await
            .unwrap();

        // Pretend yesterday's run left counters behind.
        let mut stale = harness.deps.local.daily_state().await.unwrap();
        stale.last_run = Some("2001-01-01".into());
        stale.leads_scraped_today = 40;
        stale.websites_generated_today = 7;
        stale.emails_sent_today = 12;
        harness.deps.local.set_daily_state(&stale).await.unwrap();

        harness.queue_discovery(Vec::new());
        let outcome = run_daily(&harness.deps).await.unwrap();
        assert_eq!(outcome.state.leads_scraped_today, 0);
        assert_eq!(outcome.state.websites_generated_today, 0);
        assert_eq!(outcome.state.emails_sent_today, 0);
        assert_ne!(outcome.state.last_run.as_deref(), Some("2001-01-01"));
    }

    #[tokio::test]
    async fn send_failure_keeps_the_scrape_counter() {
        let mut harness = TestDeps::new();
        harness.deps.mailer = None; // send stage will fail outright
        set_daily_target(&harness.deps, "plumbers", "Austin")
            .await
            .unwrap();

        harness.queue_discovery(vec![harness.lead("Ace", "1 Oak St")]);
        let err = run_daily(&harness.deps).await.unwrap_err();
        assert_eq!(err.to_string(), "smtp_config_missing");

        let state = harness.deps.local.daily_state().await.unwrap();
        assert_eq!(state.leads_scraped_today, 1, "advance what you can");
    }
}
