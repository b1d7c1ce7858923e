use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutreachStatus {
    Sent,
    Failed,
}

/// One attempt in the append-only outreach log. Never mutated after append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachEntry {
    pub id: Uuid,
    pub email: String,
    pub business_name: String,
    pub template_id: String,
    /// Null when the attempt failed; throttling only counts entries where
    /// this lands on today.
    pub sent_at: Option<DateTime<Utc>>,
    pub status: OutreachStatus,
    pub error: Option<String>,
}

/// Outreach email template with `{{var}}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}
