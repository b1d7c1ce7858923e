//! Pure Supabase PostgREST client.
//!
//! A minimal client for the Supabase REST API (`/rest/v1`). Supports inserts,
//! conflict-key upserts, filtered updates and filtered selects against the
//! pipeline tables. No retry logic lives here; callers decide what a failed
//! call means.
//!
//! # Example
//!
//! ```rust,ignore
//! use supabase_client::SupabaseClient;
//!
//! let client = SupabaseClient::new(
//!     "https://project.supabase.co".into(),
//!     "service-role-key".into(),
//! );
//!
//! let rows: Vec<JobRow> = client
//!     .select("website_biz_jobs", &[("status", "eq.queued"), ("limit", "1")])
//!     .await?;
//! ```

pub mod error;
pub mod types;

pub use error::{Result, SupabaseError};
pub use types::{ArtifactRow, JobRow, LeadRow, OutreachRow, WebsiteRow};

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct SupabaseClient {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(base_url: String, service_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        }
    }

    fn url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(table))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn check<T: DeserializeOwned>(resp: reqwest::Response) -> Result<Vec<T>> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message,
            });
        }
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        let body = resp.text().await?;
        if body.is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Insert rows, returning the stored representation.
    pub async fn insert<T, R>(&self, table: &str, rows: &[T]) -> Result<Vec<R>>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let resp = self
            .request(reqwest::Method::POST, table)
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?;
        Self::check(resp).await
    }

    /// Upsert rows keyed on `on_conflict` columns; repeated writes of the
    /// same row merge instead of duplicating.
    pub async fn upsert<T: Serialize>(
        &self,
        table: &str,
        on_conflict: &str,
        rows: &[T],
    ) -> Result<()> {
        tracing::debug!(table, on_conflict, rows = rows.len(), "upserting rows");
        let resp = self
            .request(reqwest::Method::POST, table)
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows)
            .send()
            .await?;
        let _: Vec<serde_json::Value> = Self::check(resp).await?;
        Ok(())
    }

    /// Update rows matching the eq-filters, returning the affected rows.
    ///
    /// An empty result means the filters matched nothing — for conditional
    /// updates (`status=eq.queued`) that is how callers detect a lost race.
    pub async fn update<T, R>(
        &self,
        table: &str,
        filters: &[(&str, &str)],
        patch: &T,
    ) -> Result<Vec<R>>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let resp = self
            .request(reqwest::Method::PATCH, table)
            .query(filters)
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await?;
        Self::check(resp).await
    }

    /// Select rows with raw PostgREST query pairs (`("status", "eq.queued")`,
    /// `("order", "created_at.asc")`, `("limit", "1")`, ...).
    pub async fn select<R: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<R>> {
        let resp = self
            .request(reqwest::Method::GET, table)
            .query(query)
            .query(&[("select", "*")])
            .send()
            .await?;
        Self::check(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_trimmed() {
        let client = SupabaseClient::new("https://x.supabase.co/".into(), "k".into());
        assert_eq!(client.url("jobs"), "https://x.supabase.co/rest/v1/jobs");
    }
}
