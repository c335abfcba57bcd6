//! Configuration for craftd

use std::path::{Path, PathBuf};

use eyre::Result;
use serde::{Deserialize, Serialize};

use crate::fishing::FishingConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::workflow::WorkflowConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR); overridden by --log-level
    #[serde(default)]
    pub log_level: Option<String>,

    /// Shared timing and retry knobs for the craft and gather orchestrators
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub fishing: FishingConfig,
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            return Ok(config);
        }

        // Try default locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("craftd").join("config.yml")),
            Some(PathBuf::from("craftd.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let config: Config = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Config::default())
    }

    /// Peek at just the log level, before logging is initialized
    ///
    /// Any load error is swallowed here; the full `load` will report it once
    /// logging is up.
    pub fn load_log_level(path: Option<&PathBuf>) -> Option<String> {
        Config::load(path).ok().and_then(|c| c.log_level)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.log_level.is_none());
        assert_eq!(config.orchestrator.retry_cap, 2);
        assert_eq!(config.fishing.spot_radius, 150.0);
        assert!(!config.workflow.strict_materials);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let path = PathBuf::from("/nonexistent/craftd.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");

        let mut config = Config::default();
        config.log_level = Some("DEBUG".to_string());
        config.orchestrator.retry_cap = 4;
        config.workflow.strict_materials = true;
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.log_level.as_deref(), Some("DEBUG"));
        assert_eq!(loaded.orchestrator.retry_cap, 4);
        assert!(loaded.workflow.strict_materials);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "orchestrator:\n  retry_delay_ms: 500\n").unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.orchestrator.retry_delay_ms, 500);
        assert_eq!(loaded.orchestrator.poll_interval_ms, 1_000);
        assert_eq!(loaded.fishing.nav_timeout_ms, 60_000);
    }
}
