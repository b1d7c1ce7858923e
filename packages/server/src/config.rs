use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
///
/// API keys and the mail/remote-backend groups are optional at load time:
/// a stage that needs a missing capability fails its own job with a
/// configuration error instead of preventing startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub port: u16,
    pub worker_poll_ms: u64,
    pub worker_token: Option<String>,
    pub max_results: u32,
    pub sender_name: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub places_api_key: Option<String>,
    pub supabase: Option<SupabaseConfig>,
    pub smtp: Option<SmtpConfig>,
}

/// Remote tabular backend credentials. Present iff both vars are set.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_role_key: String,
}

/// SMTP transport settings. Present iff host, user, pass and from are set.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
    pub daily_limit: u32,
}

/// Environment keys a fully configured deployment needs. `check` reports
/// which are missing; nothing here is required to boot.
const REQUIRED_KEYS: &[&str] = &[
    "OPENAI_API_KEY",
    "GOOGLE_PLACES_API_KEY",
    "SMTP_HOST",
    "SMTP_USER",
    "SMTP_PASS",
    "SMTP_FROM",
];

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let data_dir = env::var("WEBSITE_BIZ_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("website-biz"));

        let supabase = match (
            env::var("SUPABASE_URL").ok(),
            env::var("SUPABASE_SERVICE_ROLE_KEY").ok(),
        ) {
            (Some(url), Some(service_role_key)) => Some(SupabaseConfig {
                url,
                service_role_key,
            }),
            _ => None,
        };

        let smtp = match (
            env::var("SMTP_HOST").ok(),
            env::var("SMTP_USER").ok(),
            env::var("SMTP_PASS").ok(),
            env::var("SMTP_FROM").ok(),
        ) {
            (Some(host), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse()
                    .context("SMTP_PORT must be a valid number")?,
                user,
                pass,
                from,
                daily_limit: env::var("SMTP_DAILY_LIMIT")
                    .unwrap_or_else(|_| "25".to_string())
                    .parse()
                    .context("SMTP_DAILY_LIMIT must be a valid number")?,
            }),
            _ => None,
        };

        Ok(Self {
            data_dir,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8787".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            worker_poll_ms: env::var("WORKER_POLL_MS")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("WORKER_POLL_MS must be a valid number")?,
            worker_token: env::var("WORKER_TOKEN").ok(),
            max_results: env::var("MAX_RESULTS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("MAX_RESULTS must be a valid number")?,
            sender_name: env::var("SENDER_NAME").unwrap_or_else(|_| "Founder".to_string()),
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4.1".to_string()),
            places_api_key: env::var("GOOGLE_PLACES_API_KEY").ok(),
            supabase,
            smtp,
        })
    }

    /// Report which required environment keys are absent.
    pub fn check() -> EnvCheck {
        let missing: Vec<String> = REQUIRED_KEYS
            .iter()
            .filter(|k| env::var(k).is_err())
            .map(|k| k.to_string())
            .collect();
        EnvCheck {
            ok: missing.is_empty(),
            missing,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct EnvCheck {
    pub ok: bool,
    pub missing: Vec<String>,
}
