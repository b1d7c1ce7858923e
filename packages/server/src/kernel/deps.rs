//! Central dependency container handed to every stage.
//!
//! Built once at startup from config. Capabilities whose configuration is
//! absent stay `None`; the stage that needs one fails its job with a config
//! error when it finds the slot empty.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use super::mailer::SmtpMailer;
use super::places::PlacesClient;
use super::site_generator::OpenAiGenerator;
use super::traits::{LeadSource, Mailer, SiteGenerator};
use crate::common::DataPaths;
use crate::config::Config;
use crate::storage::{FallbackStore, LocalStore, RecordStore, RemoteStore};

/// Timeout for fetching a lead's own website during enrichment.
const ENRICH_FETCH_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Clone)]
pub struct PipelineDeps {
    pub config: Config,
    pub paths: DataPaths,
    /// Local backend, also reachable directly for the singleton files
    /// (daily state, templates) that never replicate remotely.
    pub local: Arc<LocalStore>,
    /// Dual-backend record store every stage reads and writes through.
    pub store: Arc<dyn RecordStore>,
    pub source: Option<Arc<dyn LeadSource>>,
    pub generator: Option<Arc<dyn SiteGenerator>>,
    pub mailer: Option<Arc<dyn Mailer>>,
    /// Plain client for fetching lead websites during enrichment.
    pub http: reqwest::Client,
}

impl PipelineDeps {
    pub fn from_config(config: Config) -> Result<Self> {
        let paths = DataPaths::new(&config.data_dir);
        paths.ensure_dirs()?;

        let local = Arc::new(LocalStore::new(paths.clone()));
        let remote = config.supabase.as_ref().map(RemoteStore::new);
        let store: Arc<dyn RecordStore> =
            Arc::new(FallbackStore::new(Arc::clone(&local), remote));

        let source = config
            .places_api_key
            .clone()
            .map(|key| Arc::new(PlacesClient::new(key)) as Arc<dyn LeadSource>);

        let generator = config.openai_api_key.clone().map(|key| {
            Arc::new(OpenAiGenerator::new(key, config.openai_model.clone()))
                as Arc<dyn SiteGenerator>
        });

        let mailer = match &config.smtp {
            Some(smtp) => {
                Some(Arc::new(SmtpMailer::from_config(smtp)?) as Arc<dyn Mailer>)
            }
            None => None,
        };

        let http = reqwest::Client::builder()
            .timeout(ENRICH_FETCH_TIMEOUT)
            .user_agent("Mozilla/5.0")
            .build()?;

        Ok(Self {
            config,
            paths,
            local,
            store,
            source,
            generator,
            mailer,
            http,
        })
    }
}
