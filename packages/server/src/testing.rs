//! Test doubles and a deps harness for unit and integration tests.
//!
//! Everything here runs against a throwaway data directory and in-memory
//! stand-ins for the three external collaborators. No network, no SMTP.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::common::slug::lead_slug;
use crate::common::DataPaths;
use crate::config::{Config, SmtpConfig};
use crate::domains::leads::Lead;
use crate::kernel::traits::{LeadSource, Mailer, SiteGenerator};
use crate::kernel::PipelineDeps;
use crate::storage::{FallbackStore, LocalStore, RecordStore};

/// Lead source returning pre-queued batches, one per `discover` call.
#[derive(Default)]
pub struct MockLeadSource {
    pub batches: Mutex<VecDeque<Vec<Lead>>>,
}

#[async_trait]
impl LeadSource for MockLeadSource {
    async fn discover(
        &self,
        _query: &str,
        _location: &str,
        max_results: usize,
        known: &HashSet<String>,
    ) -> Result<Vec<Lead>> {
        let batch = self.batches.lock().unwrap().pop_front().unwrap_or_default();
        let budget = max_results.saturating_sub(known.len());
        Ok(batch.into_iter().take(budget).collect())
    }
}

/// Mailer recording deliveries; addresses in `fail_for` bounce.
#[derive(Default)]
pub struct MockMailer {
    pub sent: Mutex<Vec<(String, String, String)>>,
    pub fail_for: Mutex<HashSet<String>>,
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        if self.fail_for.lock().unwrap().contains(to) {
            return Err(anyhow!("smtp_550_mailbox_unavailable"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

/// Generator producing a tiny document that still exercises substitution.
pub struct MockSiteGenerator;

#[async_trait]
impl SiteGenerator for MockSiteGenerator {
    async fn generate_html(&self, _lead: &Lead) -> Result<String> {
        Ok("<!doctype html><html><body>\
            <img src=\"{{HERO_IMAGE}}\"><h1>{{business_name}}</h1>\
            <p>{{industry}} in {{city}} - {{phone}} - {{rating}} ({{reviews}})</p>\
            </body></html>"
            .to_string())
    }
}

/// A full [`PipelineDeps`] over a temp data dir, with all three collaborator
/// slots filled by the mocks above.
pub struct TestDeps {
    pub deps: PipelineDeps,
    pub source: Arc<MockLeadSource>,
    pub mailer: Arc<MockMailer>,
    data_dir: std::path::PathBuf,
}

impl TestDeps {
    pub fn new() -> Self {
        Self::with_daily_limit(25)
    }

    pub fn with_daily_limit(daily_limit: u32) -> Self {
        let data_dir =
            std::env::temp_dir().join(format!("leadgen-test-{}", uuid::Uuid::new_v4()));
        let config = Config {
            data_dir: data_dir.clone(),
            port: 0,
            worker_poll_ms: 10,
            worker_token: None,
            max_results: 60,
            sender_name: "Founder".into(),
            openai_api_key: None,
            openai_model: "gpt-4.1".into(),
            places_api_key: None,
            supabase: None,
            smtp: Some(SmtpConfig {
                host: "localhost".into(),
                port: 587,
                user: "test".into(),
                pass: "test".into(),
                from: "Founder <founder@example.com>".into(),
                daily_limit,
            }),
        };

        let paths = DataPaths::new(&config.data_dir);
        paths.ensure_dirs().expect("test data dir");
        let local = Arc::new(LocalStore::new(paths.clone()));
        let store: Arc<dyn RecordStore> =
            Arc::new(FallbackStore::new(Arc::clone(&local), None));

        let source = Arc::new(MockLeadSource::default());
        let mailer = Arc::new(MockMailer::default());

        let deps = PipelineDeps {
            config,
            paths,
            local,
            store,
            source: Some(source.clone() as Arc<dyn LeadSource>),
            generator: Some(Arc::new(MockSiteGenerator) as Arc<dyn SiteGenerator>),
            mailer: Some(mailer.clone() as Arc<dyn Mailer>),
            http: reqwest::Client::new(),
        };

        Self {
            deps,
            source,
            mailer,
            data_dir,
        }
    }

    /// Queue the next `discover` result for the mock lead source.
    pub fn queue_discovery(&self, leads: Vec<Lead>) {
        self.source.batches.lock().unwrap().push_back(leads);
    }

    pub fn daily_limit(&self) -> usize {
        self.deps
            .config
            .smtp
            .as_ref()
            .map(|s| s.daily_limit as usize)
            .unwrap_or(0)
    }

    /// A bare scraped lead: no email, no site, not enriched.
    pub fn lead(&self, name: &str, address: &str) -> Lead {
        Lead {
            id: format!("place-{}", name.to_lowercase()),
            slug: lead_slug(name, "Austin"),
            name: name.into(),
            address: address.into(),
            phone: String::new(),
            website: String::new(),
            rating: Some(4.8),
            reviews: 12,
            industry: "plumbers".into(),
            city: "Austin".into(),
            email: String::new(),
            email_secondary: String::new(),
            email_status: Default::default(),
            socials: Default::default(),
            website_url: String::new(),
            enriched: false,
        }
    }
}

impl Drop for TestDeps {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}
