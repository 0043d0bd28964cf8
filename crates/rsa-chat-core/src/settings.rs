use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const GATEWAY_URL_ENV: &str = "RSA_CHAT_GATEWAY_URL";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewaySettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiSettings {
    #[serde(default)]
    pub start_with_signature_mode: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub ui: UiSettings,
}

fn default_base_url() -> String {
    "http://localhost:5000".into()
}

fn default_user_agent() -> String {
    concat!("rsa-chat/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
        }
    }
}

impl Settings {
    /// Reads a JSON settings file; missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
    }

    /// Like [`Settings::load`] but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Environment first, then an explicit override (e.g. a CLI flag).
    pub fn apply_overrides(&mut self, gateway_url: Option<String>) {
        if let Ok(url) = std::env::var(GATEWAY_URL_ENV) {
            if !url.trim().is_empty() {
                self.gateway.base_url = url;
            }
        }
        if let Some(url) = gateway_url {
            self.gateway.base_url = url;
        }
        self.gateway.base_url = self.gateway.base_url.trim_end_matches('/').to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"gateway": {"base_url": "http://10.0.0.2:8080"}}"#).unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.gateway.base_url, "http://10.0.0.2:8080");
        assert!(settings.gateway.user_agent.starts_with("rsa-chat/"));
        assert!(!settings.ui.start_with_signature_mode);
    }

    #[test]
    fn empty_gateway_section_uses_defaults() {
        let parsed: Settings =
            serde_json::from_str(r#"{"gateway": {}, "ui": {}}"#).unwrap();
        assert_eq!(parsed, Settings::default());
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempdir().unwrap();
        let settings = Settings::load_or_default(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn explicit_override_wins_and_trailing_slash_dropped() {
        let mut settings = Settings::default();
        settings.apply_overrides(Some("http://example.test:9000/".into()));
        assert_eq!(settings.gateway.base_url, "http://example.test:9000");
    }

    #[test]
    fn garbage_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(Settings::load(&path).is_err());
    }
}
