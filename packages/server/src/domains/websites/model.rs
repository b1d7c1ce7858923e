use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Index entry for one generated site, keyed by lead slug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsiteRecord {
    pub slug: String,
    pub business_name: String,
    pub city: String,
    pub industry: String,
    #[serde(default)]
    pub template_style: String,
    pub file_path: String,
    /// Leads file the business came from.
    #[serde(default)]
    pub source_file: String,
    pub created_at: DateTime<Utc>,
}
