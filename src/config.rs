use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants;
use crate::error::{DedupError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub normalize: NormalizeConfig,
    pub diagnostics: DiagnosticsConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// District qualifiers kept in the canonical address. Empty disables extraction.
    pub districts: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Match reason that marks a record found only by the secondary verification pass
    pub secondary_reason: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub file_prefix: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Where to write the Prometheus text exposition after a run
    pub textfile: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(constants::DEFAULT_INPUT_PATH),
            output_path: PathBuf::from(constants::DEFAULT_OUTPUT_PATH),
            normalize: NormalizeConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            districts: vec![constants::DEFAULT_DISTRICT.to_string()],
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            secondary_reason: constants::SECONDARY_VERIFICATION_REASON.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(constants::DEFAULT_LOG_DIR),
            file_prefix: constants::DEFAULT_LOG_FILE_PREFIX.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file, or from `store_dedup.toml` when it exists.
    ///
    /// An explicitly requested file must exist. Environment overrides
    /// (`STORE_DEDUP_INPUT`, `STORE_DEDUP_OUTPUT`, `STORE_DEDUP_LOG_DIR`) are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(constants::DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DedupError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(input) = std::env::var("STORE_DEDUP_INPUT") {
            self.input_path = PathBuf::from(input);
        }
        if let Ok(output) = std::env::var("STORE_DEDUP_OUTPUT") {
            self.output_path = PathBuf::from(output);
        }
        if let Ok(dir) = std::env::var("STORE_DEDUP_LOG_DIR") {
            self.logging.dir = PathBuf::from(dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();

        assert_eq!(config.input_path, PathBuf::from("matched_stores.csv"));
        assert_eq!(config.output_path, PathBuf::from("matched_stores_unique.csv"));
        assert_eq!(config.normalize.districts, vec!["영등포구".to_string()]);
        assert_eq!(config.diagnostics.secondary_reason, "2차검증");
        assert!(config.metrics.textfile.is_none());
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            input_path = "data/stores.csv"

            [normalize]
            districts = ["영등포구", "마포구"]

            [metrics]
            textfile = "metrics/store_dedup.prom"
            "#,
        )
        .unwrap();

        assert_eq!(config.input_path, PathBuf::from("data/stores.csv"));
        assert_eq!(config.output_path, PathBuf::from("matched_stores_unique.csv"));
        assert_eq!(config.normalize.districts.len(), 2);
        assert_eq!(config.logging.dir, PathBuf::from("logs"));
        assert_eq!(
            config.metrics.textfile,
            Some(PathBuf::from("metrics/store_dedup.prom"))
        );
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let result = Config::from_toml_str("input_path = [");
        assert!(matches!(result, Err(DedupError::Toml(_))));
    }

    #[test]
    fn test_missing_explicit_file_is_a_config_error() {
        let result = Config::load(Some(Path::new("/nonexistent/store_dedup.toml")));
        assert!(matches!(result, Err(DedupError::Config(_))));
    }
}
