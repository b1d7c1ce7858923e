use serde::{Deserialize, Serialize};

/// Per-day caps for the recurring run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyLimits {
    pub scrape: u32,
    pub generate: u32,
    pub email: u32,
}

impl Default for DailyLimits {
    fn default() -> Self {
        Self {
            scrape: 60,
            generate: 25,
            email: 25,
        }
    }
}

/// Singleton record tracking the active recurring target and today's
/// counters. Counters reset exactly once per calendar-day change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyState {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Local calendar day (`%Y-%m-%d`) of the last `daily-run`.
    #[serde(default)]
    pub last_run: Option<String>,
    #[serde(default)]
    pub leads_scraped_today: u32,
    #[serde(default)]
    pub websites_generated_today: u32,
    #[serde(default)]
    pub emails_sent_today: u32,
    #[serde(default)]
    pub daily_limits: DailyLimits,
}

impl DailyState {
    /// Zero the counters for a new calendar day and stamp it.
    pub fn roll_over(&mut self, today: &str) {
        self.last_run = Some(today.to_string());
        self.leads_scraped_today = 0;
        self.websites_generated_today = 0;
        self.emails_sent_today = 0;
    }
}
