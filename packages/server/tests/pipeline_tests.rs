//! End-to-end pipeline runs through the job queue, against a temp data dir
//! and mock collaborators.

use serde_json::json;

use leadgen_core::domains::leads::EmailStatus;
use leadgen_core::jobs::{process_next_job, JobQueue, JobStatus, JobType};
use leadgen_core::storage::RecordStore;
use leadgen_core::testing::TestDeps;

#[tokio::test]
async fn repeated_scrapes_merge_instead_of_duplicating() {
    let harness = TestDeps::new();
    let queue = JobQueue::new(harness.deps.store.clone());

    // First run discovers two businesses.
    harness.queue_discovery(vec![
        harness.lead("Ace Plumbing", "42 Oak St"),
        harness.lead("Budget Pipes", "9 Elm Ave"),
    ]);
    queue
        .create(
            JobType::Scrape,
            json!({"query": "plumbers", "location": "Austin"}),
        )
        .await
        .unwrap();
    let first = process_next_job(&harness.deps).await.unwrap();
    let first_result = first.job.unwrap().result.unwrap();
    assert_eq!(first_result["count"], json!(2));
    assert_eq!(first_result["newCount"], json!(2));

    // Second run rediscovers Ace and finds one genuinely new lead.
    harness.queue_discovery(vec![
        harness.lead("ACE PLUMBING", "42 Oak St."),
        harness.lead("Drain Kings", "7 Pine Rd"),
    ]);
    queue
        .create(
            JobType::Scrape,
            json!({"query": "plumbers", "location": "Austin"}),
        )
        .await
        .unwrap();
    let second = process_next_job(&harness.deps).await.unwrap();
    let second_result = second.job.unwrap().result.unwrap();
    assert_eq!(second_result["newCount"], json!(1));
    assert_eq!(second_result["count"], json!(3));

    // The merged set is a superset of the first run with unique keys.
    let leads = harness
        .deps
        .store
        .load_leads("leads-plumbers-austin.json")
        .await
        .unwrap();
    assert_eq!(leads.len(), 3);
    let keys: std::collections::HashSet<String> =
        leads.iter().map(|l| l.identity_key()).collect();
    assert_eq!(keys.len(), 3);
    assert_eq!(leads[0].name, "Ace Plumbing", "first-run record untouched");
}

#[tokio::test]
async fn full_pipeline_scrape_enrich_generate_send() {
    let harness = TestDeps::new();
    let queue = JobQueue::new(harness.deps.store.clone());

    harness.queue_discovery(vec![harness.lead("Ace Plumbing", "42 Oak St")]);
    for (job_type, payload) in [
        (
            JobType::Scrape,
            json!({"query": "plumbers", "location": "Austin"}),
        ),
        (
            JobType::Enrich,
            json!({"leadsFile": "leads-plumbers-austin.json"}),
        ),
        (
            JobType::GenerateSite,
            json!({"leadsFile": "leads-plumbers-austin.json", "index": 0}),
        ),
    ] {
        queue.create(job_type, payload).await.unwrap();
        let outcome = process_next_job(&harness.deps).await.unwrap();
        assert!(outcome.ok, "{job_type:?} should succeed");
    }

    // The lead has no website to enrich from, so send finds no email and
    // attempts nothing; the stage still completes.
    let leads = harness
        .deps
        .store
        .load_leads("leads-plumbers-austin.json")
        .await
        .unwrap();
    assert_eq!(leads[0].email_status, EmailStatus::NotFound);
    assert!(!leads[0].website_url.is_empty());

    // Hand the lead an email, then drive a send job through the queue.
    let mut leads = leads;
    leads[0].email = "owner@aceplumbing.com".into();
    harness
        .deps
        .store
        .upsert_leads("leads-plumbers-austin.json", &leads)
        .await
        .unwrap();

    queue
        .create(
            JobType::Send,
            json!({"leadsFile": "leads-plumbers-austin.json"}),
        )
        .await
        .unwrap();
    let outcome = process_next_job(&harness.deps).await.unwrap();
    assert!(outcome.ok);
    let result = outcome.job.unwrap().result.unwrap();
    assert_eq!(result["sent"], json!(1));
    assert_eq!(result["attempted"], json!(1));

    let delivered = harness.mailer.sent.lock().unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, "owner@aceplumbing.com");
    // Template placeholders were substituted with lead fields.
    assert!(delivered[0].1.contains("Ace Plumbing"));
    assert!(delivered[0].2.contains(&leads[0].website_url));
}

#[tokio::test]
async fn daily_set_then_daily_run_through_the_queue() {
    let harness = TestDeps::new();
    let queue = JobQueue::new(harness.deps.store.clone());

    queue
        .create(
            JobType::DailySet,
            json!({"query": "plumbers", "location": "Austin"}),
        )
        .await
        .unwrap();
    assert!(process_next_job(&harness.deps).await.unwrap().ok);

    harness.queue_discovery(vec![harness.lead("Ace Plumbing", "42 Oak St")]);
    queue.create(JobType::DailyRun, json!({})).await.unwrap();
    let outcome = process_next_job(&harness.deps).await.unwrap();
    assert!(outcome.ok);
    let result = outcome.job.unwrap().result.unwrap();
    assert_eq!(result["scrape"]["newCount"], json!(1));
    assert_eq!(result["state"]["leads_scraped_today"], json!(1));

    // daily-run without a target configured fails the job instead.
    let fresh = TestDeps::new();
    let queue = JobQueue::new(fresh.deps.store.clone());
    queue.create(JobType::DailyRun, json!({})).await.unwrap();
    let outcome = process_next_job(&fresh.deps).await.unwrap();
    assert!(!outcome.ok);
    let job = outcome.job.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("daily_target_not_set"));
}
