//! Google Places implementation of [`LeadSource`].
//!
//! Text search pages through results (the API wants a pause before a page
//! token becomes valid), then fetches details per new place. Transport
//! errors propagate and fail the scrape job; a non-OK response status just
//! ends pagination with whatever was found so far.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::traits::LeadSource;
use crate::common::slug::{lead_key, lead_slug};
use crate::domains::leads::Lead;

const BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";
const PAGE_TOKEN_DELAY: Duration = Duration::from_millis(2500);
const DETAILS_DELAY: Duration = Duration::from_millis(300);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

pub struct PlacesClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceSummary>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceSummary {
    place_id: String,
    name: String,
    formatted_address: Option<String>,
    rating: Option<f64>,
    user_ratings_total: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    result: Option<PlaceDetails>,
}

#[derive(Debug, Default, Deserialize)]
struct PlaceDetails {
    name: Option<String>,
    formatted_phone_number: Option<String>,
    website: Option<String>,
    formatted_address: Option<String>,
    rating: Option<f64>,
    user_ratings_total: Option<u32>,
}

impl PlacesClient {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client");
        Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    async fn fetch_page(
        &self,
        query: &str,
        location: &str,
        page_token: Option<&str>,
    ) -> Result<TextSearchResponse> {
        let url = match page_token {
            Some(token) => format!(
                "{}/textsearch/json?pagetoken={}&key={}",
                self.base_url, token, self.api_key
            ),
            None => format!(
                "{}/textsearch/json?query={}&key={}",
                self.base_url,
                urlencoding::encode(&format!("{} in {}", query, location)),
                self.api_key
            ),
        };
        let page = self
            .client
            .get(url)
            .send()
            .await
            .context("places text search request failed")?
            .json()
            .await
            .context("places text search returned malformed json")?;
        Ok(page)
    }

    async fn details(&self, place_id: &str) -> Result<PlaceDetails> {
        let url = format!(
            "{}/details/json?place_id={}&fields=name,formatted_phone_number,website,formatted_address,rating,user_ratings_total&key={}",
            self.base_url, place_id, self.api_key
        );
        let resp: DetailsResponse = self
            .client
            .get(url)
            .send()
            .await
            .context("places details request failed")?
            .json()
            .await
            .context("places details returned malformed json")?;
        Ok(resp.result.unwrap_or_default())
    }
}

#[async_trait]
impl LeadSource for PlacesClient {
    async fn discover(
        &self,
        query: &str,
        location: &str,
        max_results: usize,
        known: &HashSet<String>,
    ) -> Result<Vec<Lead>> {
        let mut seen = known.clone();
        let mut found = Vec::new();
        let mut token: Option<String> = None;
        let mut page = 0usize;

        while known.len() + found.len() < max_results {
            if page > 0 {
                tokio::time::sleep(PAGE_TOKEN_DELAY).await;
            }
            let data = self.fetch_page(query, location, token.as_deref()).await?;
            if data.status != "OK" && data.status != "ZERO_RESULTS" {
                debug!(status = %data.status, "places search ended pagination");
                break;
            }

            for place in data.results {
                if known.len() + found.len() >= max_results {
                    break;
                }
                let summary_address = place.formatted_address.clone().unwrap_or_default();
                if seen.contains(&lead_key(&place.name, &summary_address)) {
                    continue;
                }

                let details = self.details(&place.place_id).await?;
                tokio::time::sleep(DETAILS_DELAY).await;

                let name = details.name.unwrap_or(place.name);
                let address = details.formatted_address.unwrap_or(summary_address);
                let key = lead_key(&name, &address);
                if seen.contains(&key) {
                    continue;
                }
                seen.insert(key);

                found.push(Lead {
                    id: place.place_id,
                    slug: lead_slug(&name, location),
                    name,
                    address,
                    phone: details.formatted_phone_number.unwrap_or_default(),
                    website: details.website.unwrap_or_default(),
                    rating: details.rating.or(place.rating),
                    reviews: details.user_ratings_total.or(place.user_ratings_total).unwrap_or(0),
                    industry: query.to_string(),
                    city: location.to_string(),
                    email: String::new(),
                    email_secondary: String::new(),
                    email_status: Default::default(),
                    socials: Default::default(),
                    website_url: String::new(),
                    enriched: false,
                });
            }

            token = data.next_page_token;
            if token.is_none() {
                break;
            }
            page += 1;
        }

        Ok(found)
    }
}
