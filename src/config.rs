use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LiftRsError;
use crate::logging::LogConfig;
use crate::metrics::OneRepMaxFormula;
use crate::overload::OverloadThresholds;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Analysis defaults
    pub analysis: AnalysisSettings,

    /// Data import preferences
    pub import: ImportSettings,

    /// Logging setup
    pub logging: LogConfig,
}

/// Defaults applied when a command does not override them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// 1RM formula used when none is given
    pub default_formula: OneRepMaxFormula,

    /// Progressive overload slope thresholds
    pub overload: OverloadThresholds,

    /// Moving average window in sessions
    pub moving_average_window: usize,

    /// Days ahead for trend projections
    pub projection_days: u32,

    /// Breaks longer than this many days are reported as gaps
    pub gap_threshold_days: i64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            default_formula: OneRepMaxFormula::Epley,
            overload: OverloadThresholds::default(),
            moving_average_window: 3,
            projection_days: 7,
            gap_threshold_days: 10,
        }
    }
}

/// Data import preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Directory searched for workout files
    pub data_dir: PathBuf,

    /// File loaded when no input path is given
    pub default_file: String,
}

impl Default for ImportSettings {
    fn default() -> Self {
        ImportSettings {
            data_dir: PathBuf::from("./data"),
            default_file: "sample_workout.csv".to_string(),
        }
    }
}

impl ImportSettings {
    /// Path of the default workout file
    pub fn default_input(&self) -> PathBuf {
        self.data_dir.join(&self.default_file)
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".liftrs")
            .join("config.toml")
    }

    /// Load the default config file, falling back to defaults when it is absent
    ///
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path();
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_file(&config_path)
    }

    /// Reject settings the analyses cannot run with
    pub fn validate(&self) -> std::result::Result<(), LiftRsError> {
        let analysis = &self.analysis;

        if analysis.moving_average_window == 0 {
            return Err(LiftRsError::Configuration(
                "analysis.moving_average_window must be at least 1".to_string(),
            ));
        }
        if analysis.gap_threshold_days < 1 {
            return Err(LiftRsError::Configuration(
                "analysis.gap_threshold_days must be at least 1".to_string(),
            ));
        }

        let thresholds = &analysis.overload;
        for (name, value) in [
            ("weight_slope", thresholds.weight_slope),
            ("volume_slope", thresholds.volume_slope),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(LiftRsError::Configuration(format!(
                    "analysis.overload.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, deserialized);
        assert!(toml_str.contains("default_formula = \"epley\""));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [analysis]
            default_formula = "brzycki"

            [analysis.overload]
            weight_slope = 1.0
            volume_slope = 50.0

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.analysis.default_formula, OneRepMaxFormula::Brzycki);
        assert_eq!(config.analysis.overload.weight_slope, 1.0);
        assert_eq!(config.analysis.moving_average_window, 3);
        assert_eq!(config.analysis.gap_threshold_days, 10);
        assert_eq!(config.import.default_input(), PathBuf::from("./data/sample_workout.csv"));
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original_config = AppConfig::default();
        original_config.analysis.projection_days = 14;
        original_config.import.data_dir = PathBuf::from("/srv/training");

        original_config.save_to_file(&config_path).unwrap();
        let loaded_config = AppConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded_config, original_config);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[analysis]\nmoving_average_window = 0\n").unwrap();

        let err = AppConfig::load_from_file(&config_path).unwrap_err();
        assert!(err.to_string().contains("moving_average_window"));

        fs::write(&config_path, "[analysis\n").unwrap();
        assert!(AppConfig::load_from_file(&config_path).is_err());
    }
}
