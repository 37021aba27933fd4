use std::env;
use std::time::Duration;

use anyhow::Context;

use crate::models::{parse_weekdays, ClockTime, OpeningHours};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Sqlite,
    Rest,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::Rest => "rest",
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub backend: BackendKind,
    pub backend_url: String,
    pub backend_api_key: String,
    pub backend_timeout: Duration,
    pub hours: OpeningHours,
    pub success_reset: Duration,
    pub wizard_idle_ttl: Duration,
    pub session_ttl: chrono::Duration,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: "salon.db".to_string(),
            backend: BackendKind::Sqlite,
            backend_url: String::new(),
            backend_api_key: String::new(),
            backend_timeout: Duration::from_secs(10),
            hours: OpeningHours::default(),
            success_reset: Duration::from_secs(3),
            wizard_idle_ttl: Duration::from_secs(30 * 60),
            session_ttl: chrono::Duration::hours(12),
            admin_email: None,
            admin_password: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match var("BACKEND").as_deref().map(str::trim) {
            None | Some("sqlite") => BackendKind::Sqlite,
            Some("rest") => BackendKind::Rest,
            Some(other) => anyhow::bail!("unknown BACKEND {other:?}, expected sqlite or rest"),
        };

        let mut hours = defaults.hours.clone();
        if let Some(days) = var("CLOSED_WEEKDAYS") {
            hours.closed_weekdays = parse_weekdays(&days).context("invalid CLOSED_WEEKDAYS")?;
        }
        if let Some(open) = var("OPENING_TIME") {
            hours.opens_at = ClockTime::parse(&open).context("invalid OPENING_TIME")?;
        }
        if let Some(close) = var("CLOSING_TIME") {
            hours.closes_at = ClockTime::parse(&close).context("invalid CLOSING_TIME")?;
        }
        if let Some(slot) = var("SLOT_MINUTES") {
            hours.slot_minutes = slot.trim().parse().context("invalid SLOT_MINUTES")?;
        }
        anyhow::ensure!(hours.slot_minutes > 0, "SLOT_MINUTES must be positive");
        anyhow::ensure!(
            hours.opens_at < hours.closes_at,
            "OPENING_TIME must be before CLOSING_TIME"
        );

        Ok(Self {
            port: var("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            backend,
            backend_url: var("BACKEND_URL").unwrap_or_default(),
            backend_api_key: var("BACKEND_API_KEY").unwrap_or_default(),
            backend_timeout: var("BACKEND_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.backend_timeout),
            hours,
            success_reset: var("SUCCESS_RESET_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.success_reset),
            wizard_idle_ttl: var("WIZARD_IDLE_MINUTES")
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|m| *m > 0)
                .map(|m| Duration::from_secs(m * 60))
                .unwrap_or(defaults.wizard_idle_ttl),
            session_ttl: var("SESSION_TTL_HOURS")
                .and_then(|v| v.parse().ok())
                .map(chrono::Duration::hours)
                .unwrap_or(defaults.session_ttl),
            admin_email: var("ADMIN_EMAIL"),
            admin_password: var("ADMIN_PASSWORD"),
        })
    }
}
