//! Configuration Management
//!
//! Handles persistent configuration storage for gce-agents.

use crate::error::ComputeError;
use crate::gcp::auth::{get_default_project, get_default_zone};
use crate::gcp::client::DEFAULT_ENDPOINT;
use crate::windows::WindowsConfiguration;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Project agents are provisioned in
    #[serde(default)]
    pub project_id: Option<String>,
    /// Default zone for new agents
    #[serde(default)]
    pub zone: Option<String>,
    /// Compute API endpoint override
    #[serde(default)]
    pub endpoint: Option<String>,
    /// YAML file holding agent credentials
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
    /// Windows agent access
    #[serde(default)]
    pub windows: Option<WindowsConfiguration>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gce-agents").join("config.json"))
    }

    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring unreadable config: {:#}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective project (CLI > config > gcloud default)
    pub fn effective_project(&self, cli: Option<&str>) -> String {
        cli.map(|s| s.to_string())
            .or_else(|| self.project_id.clone())
            .or_else(get_default_project)
            .unwrap_or_default()
    }

    /// Effective project, rejecting an empty one before any client or
    /// credential is set up
    pub fn require_project(&self, cli: Option<&str>) -> Result<String, ComputeError> {
        let project = self.effective_project(cli);
        let project = project.trim();
        if project.is_empty() {
            return Err(ComputeError::Configuration(
                "no GCP project configured. Set GOOGLE_CLOUD_PROJECT or use --project".to_string(),
            ));
        }
        Ok(project.to_string())
    }

    /// Get effective zone (CLI > config > gcloud default)
    pub fn effective_zone(&self, cli: Option<&str>) -> String {
        cli.map(|s| s.to_string())
            .or_else(|| self.zone.clone())
            .or_else(get_default_zone)
            .unwrap_or_else(|| "us-central1-a".to_string())
    }

    /// Get effective endpoint (CLI > config > public API)
    pub fn effective_endpoint(&self, cli: Option<&str>) -> String {
        cli.map(|s| s.to_string())
            .or_else(|| self.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_value_wins() {
        let config = Config {
            project_id: Some("from-config".to_string()),
            endpoint: Some("http://localhost:8080".to_string()),
            ..Config::default()
        };
        assert_eq!(config.effective_project(Some("from-cli")), "from-cli");
        assert_eq!(config.effective_project(None), "from-config");
        assert_eq!(config.effective_endpoint(None), "http://localhost:8080");
        assert_eq!(Config::default().effective_endpoint(None), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_require_project() {
        let config = Config {
            project_id: Some("build-agents".to_string()),
            ..Config::default()
        };
        assert_eq!(config.require_project(None).unwrap(), "build-agents");
        assert_eq!(config.require_project(Some(" cli-project ")).unwrap(), "cli-project");

        let err = config.require_project(Some("  ")).unwrap_err();
        assert!(matches!(err, ComputeError::Configuration(_)));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            project_id: Some("build-agents".to_string()),
            zone: Some("europe-west1-b".to_string()),
            windows: Some(WindowsConfiguration::new(Some("pw"), None).unwrap()),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.project_id.as_deref(), Some("build-agents"));
        assert_eq!(loaded.effective_zone(None), "europe-west1-b");
        assert_eq!(loaded.windows, config.windows);
    }

    #[test]
    fn test_load_from_rejects_empty_windows_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"project_id": "build-agents", "windows": {}}"#).unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
