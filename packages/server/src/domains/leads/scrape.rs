//! Scrape stage: discover businesses and merge them into the leads file.
//!
//! The merge is the invariant that matters: a later scrape only appends
//! leads whose identity key is new. Records already in the file, including
//! any enrichment they carry, are never touched.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::model::Lead;
use crate::common::DataPaths;
use crate::error::{StageError, StageResult};
use crate::kernel::PipelineDeps;
use crate::storage::RecordStore;

#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeParams {
    pub query: String,
    pub location: String,
    #[serde(rename = "maxResults", default)]
    pub max_results: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScrapeOutcome {
    #[serde(rename = "outFile")]
    pub out_file: String,
    pub count: usize,
    #[serde(rename = "newCount")]
    pub new_count: usize,
}

pub async fn run_scrape(deps: &PipelineDeps, params: ScrapeParams) -> StageResult<ScrapeOutcome> {
    let source = deps
        .source
        .as_ref()
        .ok_or(StageError::Config("places_api_key_missing"))?;

    let out_file = DataPaths::leads_file_name(&params.query, &params.location);
    let existing = deps.store.load_leads(&out_file).await?;
    let known: HashSet<String> = existing.iter().map(|l| l.identity_key()).collect();

    let max_results = params
        .max_results
        .unwrap_or(deps.config.max_results as usize);
    let found = source
        .discover(&params.query, &params.location, max_results, &known)
        .await?;

    let (merged, new_count) = merge_leads(existing, found);
    deps.store.upsert_leads(&out_file, &merged).await?;

    Ok(ScrapeOutcome {
        count: merged.len(),
        new_count,
        out_file,
    })
}

/// Append newly found leads whose identity key is unseen; keep every
/// existing record exactly as it was.
pub fn merge_leads(existing: Vec<Lead>, found: Vec<Lead>) -> (Vec<Lead>, usize) {
    let mut keys: HashSet<String> = existing.iter().map(|l| l.identity_key()).collect();
    let mut merged = existing;
    let mut new_count = 0;
    for lead in found {
        if keys.insert(lead.identity_key()) {
            merged.push(lead);
            new_count += 1;
        }
    }
    (merged, new_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::leads::EmailStatus;

    fn lead(name: &str, address: &str) -> Lead {
        Lead {
            id: format!("id-{name}"),
            name: name.into(),
            address: address.into(),
            phone: String::new(),
            website: String::new(),
            rating: None,
            reviews: 0,
            industry: "plumbers".into(),
            city: "Austin".into(),
            slug: name.to_lowercase(),
            email: String::new(),
            email_secondary: String::new(),
            email_status: EmailStatus::Pending,
            socials: Default::default(),
            website_url: String::new(),
            enriched: false,
        }
    }

    #[test]
    fn second_run_appends_only_new_keys() {
        let first = vec![lead("Ace Plumbing", "42 Oak St")];
        // Second run rediscovers Ace (different casing) plus one new lead.
        let rediscovered = lead("ACE PLUMBING", "42 Oak St.");
        let fresh = lead("Budget Pipes", "9 Elm Ave");

        let (merged, new_count) = merge_leads(first.clone(), vec![rediscovered, fresh]);
        assert_eq!(new_count, 1);
        assert_eq!(merged.len(), first.len() + 1);
        assert_eq!(merged[1].name, "Budget Pipes");
    }

    #[test]
    fn existing_enrichment_is_never_overwritten() {
        let mut enriched = lead("Ace Plumbing", "42 Oak St");
        enriched.email = "owner@aceplumbing.com".into();
        enriched.enriched = true;

        let mut rediscovered = lead("Ace Plumbing", "42 Oak St");
        rediscovered.phone = "512-555-0100".into();

        let (merged, new_count) = merge_leads(vec![enriched], vec![rediscovered]);
        assert_eq!(new_count, 0);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].email, "owner@aceplumbing.com");
        assert!(merged[0].phone.is_empty(), "later scrape must not patch fields");
    }

    #[test]
    fn merged_set_has_no_duplicate_keys() {
        let (merged, _) = merge_leads(
            vec![lead("A", "1"), lead("B", "2")],
            vec![lead("A", "1"), lead("B", "2"), lead("C", "3"), lead("C", "3")],
        );
        let keys: HashSet<String> = merged.iter().map(|l| l.identity_key()).collect();
        assert_eq!(keys.len(), merged.len());
    }
}
