//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Fully qualified type a rule method must accept.
pub const DEFAULT_CLASSES_TYPE: &str = "com.tngtech.archunit.core.domain.JavaClasses";

/// Passthrough parameter overriding [`DiscoveryConfig::replace_underscores_by_spaces`].
pub const PARAM_REPLACE_UNDERSCORES: &str = "archunit.junit.displayName.replaceUnderscoresBySpaces";

/// Passthrough parameter overriding [`DiscoveryConfig::classes_type_name`].
pub const PARAM_CLASSES_TYPE: &str = "archunit.junit.classesTypeName";

/// Passthrough parameter overriding [`DiscoveryConfig::class_file_extension`].
pub const PARAM_CLASS_FILE_EXTENSION: &str = "archunit.junit.classFileExtension";

/// Top-level engine configuration, usually read from `arch-test.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Discovery settings.
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl EngineConfig {
    /// Creates a default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Returns a copy with overrides from passthrough request parameters.
    ///
    /// Unknown keys are ignored; unparsable boolean values are reported.
    ///
    /// # Errors
    ///
    /// Returns an error if a known key has an invalid value.
    pub fn with_parameters(&self, parameters: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = self.clone();
        if let Some(value) = parameters.get(PARAM_REPLACE_UNDERSCORES) {
            config.discovery.replace_underscores_by_spaces =
                value.trim().parse().map_err(|_| ConfigError::InvalidParameter {
                    key: PARAM_REPLACE_UNDERSCORES.to_string(),
                    value: value.clone(),
                })?;
        }
        if let Some(value) = parameters.get(PARAM_CLASSES_TYPE) {
            config.discovery.classes_type_name = value.trim().to_string();
        }
        if let Some(value) = parameters.get(PARAM_CLASS_FILE_EXTENSION) {
            config.discovery.class_file_extension = value.trim().trim_start_matches('.').to_string();
        }
        Ok(config)
    }
}

/// Discovery-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Replace `_` by spaces in rule display names.
    #[serde(default)]
    pub replace_underscores_by_spaces: bool,

    /// Type a rule method's single parameter must have.
    #[serde(default = "default_classes_type")]
    pub classes_type_name: String,

    /// File extension of class files found under classpath roots.
    #[serde(default = "default_class_file_extension")]
    pub class_file_extension: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            replace_underscores_by_spaces: false,
            classes_type_name: default_classes_type(),
            class_file_extension: default_class_file_extension(),
        }
    }
}

impl DiscoveryConfig {
    /// Formats a member name for display.
    #[must_use]
    pub fn display_name(&self, member: &str) -> String {
        if self.replace_underscores_by_spaces {
            member.replace('_', " ")
        } else {
            member.to_string()
        }
    }
}

fn default_classes_type() -> String {
    DEFAULT_CLASSES_TYPE.to_string()
}

fn default_class_file_extension() -> String {
    "class".to_string()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// A passthrough parameter has an invalid value.
    #[error("Invalid value `{value}` for parameter {key}")]
    InvalidParameter {
        /// Parameter key.
        key: String,
        /// Rejected value.
        value: String,
    },
}
