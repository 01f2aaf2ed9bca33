//! Application configuration
//!
//! Loaded from YAML, then overridden by `STUDYLOG_*` environment variables,
//! then by CLI flags.

use action_flow::Credential;
use cdp_adapter::CdpConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const USERNAME_ENV: &str = "STUDYLOG_USERNAME";
pub const PASSWORD_ENV: &str = "STUDYLOG_PASSWORD";
pub const HEADLESS_ENV: &str = "STUDYLOG_HEADLESS";
pub const CHROME_ENV: &str = "STUDYLOG_CHROME";
pub const BIND_ENV: &str = "STUDYLOG_BIND";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub browser: CdpConfig,
    pub timing: TimingConfig,
    pub server: ServerConfig,
    pub credentials: CredentialConfig,
}

/// Bounds for the synchronization policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub wait_timeout_ms: u64,
    pub network_quiet_ms: u64,
    pub poll_interval_ms: u64,
    /// Pause after confirming the record, before the screenshot
    pub settle_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: 30_000,
            network_quiet_ms: 500,
            poll_interval_ms: 100,
            settle_delay_ms: 1_000,
        }
    }
}

impl TimingConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8787)),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CredentialConfig {
    /// Both halves present and non-blank.
    pub fn credential(&self) -> Option<Credential> {
        let username = self.username.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
        let password = self.password.as_deref().filter(|v| !v.is_empty())?;
        Some(Credential::new(username, password))
    }
}

impl AppConfig {
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`; blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(username) = get(USERNAME_ENV) {
            self.credentials.username = Some(username);
        }
        if let Some(password) = get(PASSWORD_ENV) {
            self.credentials.password = Some(password);
        }
        if let Some(raw) = get(HEADLESS_ENV) {
            self.browser.headless = parse_flag(&raw).unwrap_or(self.browser.headless);
        }
        if let Some(raw) = get(CHROME_ENV) {
            self.browser.executable = PathBuf::from(raw.trim());
        }
        if let Some(raw) = get(BIND_ENV) {
            match raw.trim().parse() {
                Ok(bind) => self.server.bind = bind,
                Err(err) => tracing::warn!(value = %raw, %err, "ignoring invalid {BIND_ENV}"),
            }
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
