use std::time::Duration;

use anyhow::{Context, Result, bail};
use platform_api::ApiConfig;
use products_crm::{BoardSettings, DEFAULT_POLL_INTERVAL};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api/";

/// Everything the binary reads from the environment.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub poll_interval: Duration,
}

impl AppConfig {
    /// Read `.env` (if any) and then the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let base_url = var("CRM_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut api = ApiConfig::new(&base_url).context("CRM_API_BASE_URL")?;
        if let Some(leads_url) = var("CRM_LEADS_URL") {
            api = api.with_leads_url(&leads_url).context("CRM_LEADS_URL")?;
        }
        let timeout = var("CRM_REQUEST_TIMEOUT_SECS")
            .map(|raw| positive_secs("CRM_REQUEST_TIMEOUT_SECS", &raw))
            .transpose()?;
        let poll_interval = var("CRM_POLL_INTERVAL_SECS")
            .map(|raw| positive_secs("CRM_POLL_INTERVAL_SECS", &raw))
            .transpose()?
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        Ok(Self {
            api: api.with_timeout(timeout),
            poll_interval,
        })
    }

    pub fn board_settings(&self) -> BoardSettings {
        BoardSettings {
            poll_interval: self.poll_interval,
        }
    }
}

fn positive_secs(key: &str, raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .parse()
        .with_context(|| format!("{key} must be a whole number of seconds, got `{raw}`"))?;
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
