//! typeflow configuration system
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high → low):
//! 1. CLI flags (-a, -p, -P, -D)
//! 2. Single-key overrides (-C KEY=VAL)
//! 3. Configuration file (-c FILE, TOML)
//! 4. Default values
//! ```
//!
//! # Usage
//!
//! ```rust
//! use typeflow::util::config::AnalyzerConfig;
//!
//! let mut config = AnalyzerConfig::default();
//! config.apply_override("raise_uncertain=true").unwrap();
//! assert!(config.raise_uncertain);
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Analyzer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Report "maybe" diagnostics as well as certain ones
    #[serde(default)]
    pub raise_uncertain: bool,
    /// Silently skip operations applied to `None`
    #[serde(default = "default_true")]
    pub ignore_none: bool,
    /// Do not report failed imports
    #[serde(default)]
    pub ignore_import_errors: bool,
    /// Upper bound of diagnostics listed per frame in the report (0 = unlimited)
    #[serde(default)]
    pub max_errors_per_frame: usize,
    /// Extra module directories
    #[serde(default)]
    pub module_path: Vec<PathBuf>,
    /// Extra stub directories, searched before the module path
    #[serde(default)]
    pub stub_path: Vec<PathBuf>,
    /// Include the bundled stub directory
    #[serde(default = "default_true")]
    pub use_default_path: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            raise_uncertain: false,
            ignore_none: true,
            ignore_import_errors: false,
            max_errors_per_frame: 0,
            module_path: Vec::new(),
            stub_path: Vec::new(),
            use_default_path: true,
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(ConfigError::IoError)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::ParseError)
    }

    /// Serialize to TOML text
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::SerializeError)
    }

    /// Apply a single `KEY=VAL` override
    pub fn apply_override(
        &mut self,
        assignment: &str,
    ) -> Result<(), ConfigError> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidOverride(assignment.to_string()))?;
        let key = key.trim();
        let value = value.trim();

        match key {
            "raise_uncertain" => self.raise_uncertain = parse_bool(key, value)?,
            "ignore_none" => self.ignore_none = parse_bool(key, value)?,
            "ignore_import_errors" => self.ignore_import_errors = parse_bool(key, value)?,
            "use_default_path" => self.use_default_path = parse_bool(key, value)?,
            "max_errors_per_frame" => {
                self.max_errors_per_frame =
                    value.parse().map_err(|_| ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                    })?
            }
            "module_path" => self.module_path.extend(split_path_list(value)),
            "stub_path" => self.stub_path.extend(split_path_list(value)),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Directories searched for stubs, in order
    pub fn stub_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.stub_path.clone();
        if self.use_default_path {
            dirs.push(default_stub_dir());
        }
        dirs
    }

    /// Directories searched for modules, in order
    pub fn module_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.module_path.clone();
        if self.use_default_path {
            dirs.push(PathBuf::from("."));
        }
        dirs
    }
}

/// The stub directory shipped with the crate
pub fn default_stub_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("stubs")
}

/// Split a colon separated path list
pub fn split_path_list(value: &str) -> Vec<PathBuf> {
    value
        .split(':')
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn parse_bool(
    key: &str,
    value: &str,
) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[source] std::io::Error),

    #[error("Config parse error: {0}")]
    ParseError(#[source] toml::de::Error),

    #[error("Config serialize error: {0}")]
    SerializeError(#[source] toml::ser::Error),

    #[error("Expected KEY=VAL, got '{0}'")]
    InvalidOverride(String),

    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert!(!config.raise_uncertain);
        assert!(config.ignore_none);
        assert!(config.use_default_path);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = AnalyzerConfig::from_toml("raise_uncertain = true\n").unwrap();
        assert!(config.raise_uncertain);
        assert!(config.ignore_none);
    }

    #[test]
    fn test_override() {
        let mut config = AnalyzerConfig::default();
        config.apply_override("ignore_none = off").unwrap();
        assert!(!config.ignore_none);
        config.apply_override("stub_path=a:b").unwrap();
        assert_eq!(config.stub_path.len(), 2);
        assert!(matches!(
            config.apply_override("nope=1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            config.apply_override("raise_uncertain=maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.apply_override("raise_uncertain"),
            Err(ConfigError::InvalidOverride(_))
        ));
    }

    #[test]
    fn test_toml_roundtrip_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("typeflow.toml");
        let mut config = AnalyzerConfig::default();
        config.raise_uncertain = true;
        fs::write(&path, config.to_toml().unwrap()).unwrap();
        let loaded = AnalyzerConfig::load(&path).unwrap();
        assert!(loaded.raise_uncertain);
    }
}
