//! OpenAI-backed implementation of [`SiteGenerator`].
//!
//! One call to the Responses API per lead. The model is asked for a full
//! HTML document with image and business placeholders left in; substitution
//! happens in the generate stage, not here.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::traits::SiteGenerator;
use crate::domains::leads::Lead;

const RESPONSES_URL: &str = "https://api.openai.com/v1/responses";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const SYSTEM_PROMPT: &str = "Return only complete HTML document for a premium local business site. \
Include placeholders {{HERO_IMAGE}} {{SERVICE_IMAGE_1}} {{SERVICE_IMAGE_2}} {{SERVICE_IMAGE_3}} \
{{GALLERY_IMAGE_1}} {{GALLERY_IMAGE_2}} {{ABOUT_IMAGE}} {{TESTIMONIAL_BG}} and business placeholders \
{{business_name}} {{city}} {{phone}} {{email}} {{address}} {{rating}} {{reviews}} {{industry}} \
{{instagram}} {{facebook}} {{tiktok}} {{linkedin}}.";

const FALLBACK_HTML: &str =
    "<!doctype html><html><body><h1>{{business_name}}</h1></body></html>";

pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentItem>,
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client");
        Self {
            client,
            api_key,
            model,
            base_url: RESPONSES_URL.to_string(),
        }
    }

    fn prompt_for(lead: &Lead) -> String {
        format!(
            "Generate a stunning, production-ready website for this local business:\n\
             Business: {}\nIndustry: {}\nCity: {}\nAddress: {}\nPhone: {}\nRating: {} ({} reviews)",
            lead.name,
            lead.industry,
            lead.city,
            if lead.address.is_empty() { "local area" } else { &lead.address },
            if lead.phone.is_empty() { "contact us" } else { &lead.phone },
            lead.rating.map(|r| r.to_string()).unwrap_or_else(|| "5.0".into()),
            if lead.reviews == 0 { 50 } else { lead.reviews },
        )
    }
}

#[async_trait]
impl SiteGenerator for OpenAiGenerator {
    async fn generate_html(&self, lead: &Lead) -> Result<String> {
        let body = json!({
            "model": self.model,
            "temperature": 0.8,
            "input": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": Self::prompt_for(lead) },
            ],
        });

        let resp = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("site generation request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            anyhow::bail!("openai_{}_{}", status.as_u16(), message);
        }

        let reply: ResponsesReply = resp
            .json()
            .await
            .context("site generation returned malformed json")?;

        let html: String = reply
            .output
            .iter()
            .flat_map(|item| item.content.iter())
            .filter(|c| c.kind == "output_text")
            .filter_map(|c| c.text.as_deref())
            .collect();

        if html.is_empty() {
            return Ok(FALLBACK_HTML.to_string());
        }
        Ok(html)
    }
}
