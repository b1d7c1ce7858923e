use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::slug::lead_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    Pending,
    Scraped,
    NotFound,
}

impl Default for EmailStatus {
    fn default() -> Self {
        EmailStatus::Pending
    }
}

/// One discovered business. Created by `scrape`, mutated in place by
/// `enrich` and `generate-site`, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    /// Source identifier from the scrape backend (place id).
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    /// The business's own site, if it has one. Enrichment reads it.
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub reviews: u32,
    pub industry: String,
    pub city: String,
    /// Artifact key; unique per business within a location.
    pub slug: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub email_secondary: String,
    #[serde(default)]
    pub email_status: EmailStatus,
    #[serde(default)]
    pub socials: BTreeMap<String, String>,
    /// Pointer to the generated artifact; empty until `generate-site`
    /// succeeds for this lead.
    #[serde(default)]
    pub website_url: String,
    #[serde(default)]
    pub enriched: bool,
}

impl Lead {
    /// Stable dedup key: two scrape runs for the same business must collide
    /// here no matter how the source formats name or address.
    pub fn identity_key(&self) -> String {
        lead_key(&self.name, &self.address)
    }
}
