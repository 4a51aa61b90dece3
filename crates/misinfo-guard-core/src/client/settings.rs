use anyhow::{Context, Result};
use std::{collections::HashMap, time::Duration};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the risk-check endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Base URL; `/v1/check` is appended.
    pub endpoint: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("misinfo-guard/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientSettings {
    const ENDPOINT_ENV: &'static str = "MISINFO_GUARD_ENDPOINT";
    const TIMEOUT_ENV: &'static str = "MISINFO_GUARD_TIMEOUT";

    /// Load settings from environment variables on top of the defaults.
    ///
    /// * `MISINFO_GUARD_ENDPOINT` — base URL of the risk engine.
    /// * `MISINFO_GUARD_TIMEOUT`  — request timeout (`45s`, `2m`, or bare seconds).
    pub fn from_env() -> Result<Self> {
        Self::default().overlay_env()
    }

    /// Apply environment overrides to already-loaded settings.
    pub fn overlay_env(self) -> Result<Self> {
        self.overlay_map(&std::env::vars().collect())
    }

    fn overlay_map(mut self, vars: &HashMap<String, String>) -> Result<Self> {
        if let Some(endpoint) = vars
            .get(Self::ENDPOINT_ENV)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
        {
            self.endpoint = endpoint.to_string();
        }
        if let Some(raw) = vars
            .get(Self::TIMEOUT_ENV)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
        {
            self.timeout = parse_timeout(raw)
                .with_context(|| format!("invalid {} value `{raw}`", Self::TIMEOUT_ENV))?;
        }
        Ok(self)
    }

    /// Full URL of the check operation.
    pub fn check_url(&self) -> String {
        format!("{}/v1/check", self.endpoint.trim_end_matches('/'))
    }
}

/// Parse a humantime duration, treating a bare integer as seconds.
pub fn parse_timeout(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(raw).with_context(|| format!("`{raw}` is not a duration"))
}
