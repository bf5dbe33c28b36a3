//! Configuration management
//!
//! Compatible with the desktop/web shell settings.json format:
//! ```json
//! {
//!   "app": { "backendUrl": "...", "apiKey": "...", "demoMode": false, "theme": "system" },
//!   "lastRoute": "/dashboard"
//! }
//! ```
//! Unmanaged fields are preserved on save.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

const DEFAULT_SESSION_POLL_SECS: u64 = 300;

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    /// Last route the router served; read by recovery/diagnostic tooling
    #[serde(default)]
    last_route: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    backend_url: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    demo_mode: bool,
    #[serde(default)]
    theme: Option<String>,
    #[serde(default)]
    session_poll_secs: Option<u64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Task Flow configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: Option<String>,
    pub api_key: Option<String>,
    pub demo_mode: bool,
    pub theme: String,
    pub session_poll_secs: u64,
    pub last_route: Option<String>,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: None,
            api_key: None,
            demo_mode: false,
            theme: "system".to_string(),
            session_poll_secs: DEFAULT_SESSION_POLL_SECS,
            last_route: None,
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the Task Flow directory
    ///
    /// Environment overrides (for CI and ad hoc testing):
    /// TASKFLOW_DEMO_MODE, TASKFLOW_BACKEND_URL, TASKFLOW_API_KEY.
    pub fn load(taskflow_dir: &Path) -> Result<Self> {
        let settings_path = taskflow_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let demo_mode = match std::env::var("TASKFLOW_DEMO_MODE").ok().as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => true,
            Some("false" | "0" | "no" | "FALSE" | "NO") => false,
            _ => raw.app.demo_mode,
        };

        let backend_url = std::env::var("TASKFLOW_BACKEND_URL")
            .ok()
            .or_else(|| raw.app.backend_url.clone());
        let api_key = std::env::var("TASKFLOW_API_KEY")
            .ok()
            .or_else(|| raw.app.api_key.clone());

        Ok(Self {
            backend_url,
            api_key,
            demo_mode,
            theme: raw.app.theme.clone().unwrap_or_else(|| "system".to_string()),
            session_poll_secs: raw
                .app
                .session_poll_secs
                .unwrap_or(DEFAULT_SESSION_POLL_SECS),
            last_route: raw.last_route.clone(),
            _raw_settings: raw,
        })
    }

    /// Save config to the Task Flow directory
    /// Preserves settings this crate doesn't manage
    pub fn save(&self, taskflow_dir: &Path) -> Result<()> {
        let settings_path = taskflow_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        settings.app.backend_url = self.backend_url.clone();
        settings.app.api_key = self.api_key.clone();
        settings.app.demo_mode = self.demo_mode;
        settings.app.theme = Some(self.theme.clone());
        settings.app.session_poll_secs = Some(self.session_poll_secs);
        settings.last_route = self.last_route.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Enable demo mode
    pub fn enable_demo_mode(&mut self) {
        self.demo_mode = true;
    }

    /// Disable demo mode
    pub fn disable_demo_mode(&mut self) {
        self.demo_mode = false;
    }

    /// Record the route to restore on next startup
    pub fn record_last_route(&mut self, route: impl Into<String>) {
        self.last_route = Some(route.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(!config.demo_mode);
        assert_eq!(config.theme, "system");
        assert_eq!(config.session_poll_secs, DEFAULT_SESSION_POLL_SECS);
        assert!(config.last_route.is_none());
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("settings.json"), "{not json").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(!config.demo_mode);
    }

    #[test]
    fn test_round_trip_preserves_unmanaged_fields() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"app":{"demoMode":true,"theme":"dark"},"plugins":{"keep":"me"}}"#,
        )
        .unwrap();

        let mut config = Config::load(dir.path()).unwrap();
        assert!(config.demo_mode);
        assert_eq!(config.theme, "dark");

        config.record_last_route("/app/acme");
        config.save(dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join("settings.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["lastRoute"], "/app/acme");
        assert_eq!(value["plugins"]["keep"], "me");
        assert_eq!(value["app"]["theme"], "dark");
    }
}
