//! Seams for the three external collaborators a pipeline run touches.
//!
//! Stages depend on these traits, never on concrete clients, so tests swap
//! in stubs and a different scrape backend or mail provider is one new impl.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;

use crate::domains::leads::Lead;

/// Source of raw business listings for a query + location.
#[async_trait]
pub trait LeadSource: Send + Sync {
    /// Discover up to `max_results` businesses. `known` carries the identity
    /// keys already persisted so the source can skip detail lookups for
    /// businesses a previous run found; the scrape stage still re-checks
    /// keys when merging.
    async fn discover(
        &self,
        query: &str,
        location: &str,
        max_results: usize,
        known: &HashSet<String>,
    ) -> Result<Vec<Lead>>;
}

/// Produces a complete HTML document for a lead's preview site, with the
/// image and business placeholders still in place.
#[async_trait]
pub trait SiteGenerator: Send + Sync {
    async fn generate_html(&self, lead: &Lead) -> Result<String>;
}

/// Outbound mail delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}
