//! Generate-site stage: one HTML preview per lead, keyed by slug.
//!
//! Regeneration policy: if the lead already points at an artifact the stage
//! skips, unless `forceRegenerate` is set, in which case the HTML is
//! overwritten and the index row for the slug is updated in place.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::model::WebsiteRecord;
use crate::common::DataPaths;
use crate::domains::leads::Lead;
use crate::error::{StageError, StageResult};
use crate::kernel::PipelineDeps;
use crate::storage::RecordStore;

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateParams {
    #[serde(rename = "leadsFile")]
    pub leads_file: String,
    pub index: usize,
    #[serde(rename = "templateStyle", default)]
    pub template_style: Option<String>,
    #[serde(rename = "forceRegenerate", default)]
    pub force_regenerate: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateOutcome {
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub website: String,
}

/// Image slots the generator leaves in the document, with seeded fallbacks
/// used when the per-slug manifest has no entry.
const IMAGE_SLOTS: &[(&str, &str, &str)] = &[
    ("{{HERO_IMAGE}}", "heroImage", "https://picsum.photos/seed/hero/1920/1080"),
    ("{{SERVICE_IMAGE_1}}", "serviceImage1", "https://picsum.photos/seed/s1/800/600"),
    ("{{SERVICE_IMAGE_2}}", "serviceImage2", "https://picsum.photos/seed/s2/800/600"),
    ("{{SERVICE_IMAGE_3}}", "serviceImage3", "https://picsum.photos/seed/s3/800/600"),
    ("{{GALLERY_IMAGE_1}}", "galleryImage1", "https://picsum.photos/seed/g1/800/800"),
    ("{{GALLERY_IMAGE_2}}", "galleryImage2", "https://picsum.photos/seed/g2/800/800"),
    ("{{ABOUT_IMAGE}}", "aboutImage", "https://picsum.photos/seed/about/1200/800"),
    ("{{TESTIMONIAL_BG}}", "testimonialBg", "https://picsum.photos/seed/tbg/1920/1080"),
];

pub async fn run_generate(
    deps: &PipelineDeps,
    params: GenerateParams,
) -> StageResult<GenerateOutcome> {
    let generator = deps
        .generator
        .as_ref()
        .ok_or(StageError::Config("openai_api_key_missing"))?;

    let source_name = DataPaths::source_name(&params.leads_file);
    let mut leads = deps.store.load_leads(&source_name).await?;
    let lead = leads
        .get(params.index)
        .cloned()
        .ok_or(StageError::LeadNotFound)?;

    if !lead.website_url.is_empty() && !params.force_regenerate {
        return Ok(GenerateOutcome {
            skipped: true,
            reason: Some("already_generated".into()),
            website: lead.website_url,
        });
    }

    let raw_html = generator.generate_html(&lead).await?;
    let manifest = load_image_manifest(deps, &lead.slug).await;
    let html = fill_placeholders(&raw_html, &lead, &manifest);

    let out_path = deps.paths.site_file(&lead.slug);
    tokio::fs::write(&out_path, html)
        .await
        .map_err(|e| StageError::Other(e.into()))?;
    let website = out_path.display().to_string();

    let record = WebsiteRecord {
        slug: lead.slug.clone(),
        business_name: lead.name.clone(),
        city: lead.city.clone(),
        industry: lead.industry.clone(),
        template_style: params.template_style.unwrap_or_else(|| "default".into()),
        file_path: website.clone(),
        source_file: source_name.clone(),
        created_at: Utc::now(),
    };
    deps.store.upsert_website(&record).await?;

    leads[params.index].website_url = website.clone();
    deps.store.upsert_leads(&source_name, &leads).await?;

    if let Err(error) = deps
        .store
        .write_artifact("website", &lead.slug, json!({ "file": website }))
        .await
    {
        debug!(%error, "artifact write skipped");
    }

    Ok(GenerateOutcome {
        skipped: false,
        reason: None,
        website,
    })
}

async fn load_image_manifest(deps: &PipelineDeps, slug: &str) -> BTreeMap<String, String> {
    match tokio::fs::read_to_string(deps.paths.image_manifest(slug)).await {
        Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
        Err(_) => BTreeMap::new(),
    }
}

/// Substitute image slots, then business fields.
fn fill_placeholders(html: &str, lead: &Lead, manifest: &BTreeMap<String, String>) -> String {
    let mut out = html.to_string();
    for (slot, manifest_key, fallback) in IMAGE_SLOTS {
        let url = manifest
            .get(*manifest_key)
            .map(String::as_str)
            .unwrap_or(fallback);
        out = out.replace(slot, url);
    }

    let rating = lead
        .rating
        .map(|r| r.to_string())
        .unwrap_or_else(|| "5.0".into());
    let reviews = if lead.reviews == 0 {
        "50".to_string()
    } else {
        lead.reviews.to_string()
    };
    let social = |network: &str| {
        lead.socials
            .get(network)
            .map(String::as_str)
            .unwrap_or("")
            .to_string()
    };

    let fields: &[(&str, String)] = &[
        ("{{business_name}}", lead.name.clone()),
        ("{{city}}", lead.city.clone()),
        ("{{phone}}", lead.phone.clone()),
        ("{{email}}", lead.email.clone()),
        ("{{address}}", lead.address.clone()),
        ("{{rating}}", rating),
        ("{{reviews}}", reviews),
        ("{{industry}}", lead.industry.clone()),
        ("{{instagram}}", social("instagram")),
        ("{{facebook}}", social("facebook")),
        ("{{tiktok}}", social("tiktok")),
        ("{{linkedin}}", social("linkedin")),
    ];
    for (slot, value) in fields {
        out = out.replace(slot, value);
    }
    out
}
