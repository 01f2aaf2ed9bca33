use crate::detect_chrome_executable;
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};

/// Configuration for launching and tuning browser sessions.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CdpConfig {
    /// Chrome/Chromium binary; empty lets chromiumoxide pick its default.
    pub executable: PathBuf,
    pub headless: bool,
    /// Attach to an existing DevTools endpoint instead of launching.
    pub websocket_url: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
    pub disable_sandbox: bool,
    /// Per-command deadline handed to chromiumoxide.
    pub default_deadline_ms: u64,
    pub launch_timeout_ms: u64,
}

impl Default for CdpConfig {
    fn default() -> Self {
        Self {
            executable: detect_chrome_executable().unwrap_or_default(),
            headless: resolve_headless_default(),
            websocket_url: None,
            window_width: 1280,
            window_height: 2000,
            disable_sandbox: resolve_disable_sandbox(),
            default_deadline_ms: 30_000,
            launch_timeout_ms: 20_000,
        }
    }
}

fn resolve_headless_default() -> bool {
    // "0", "false", "no", "off" means headful
    match env::var("STUDYLOG_HEADLESS") {
        Ok(value) => {
            let lower = value.to_ascii_lowercase();
            !matches!(lower.as_str(), "0" | "false" | "no" | "off")
        }
        Err(_) => true,
    }
}

fn resolve_disable_sandbox() -> bool {
    env::var("STUDYLOG_DISABLE_SANDBOX")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
