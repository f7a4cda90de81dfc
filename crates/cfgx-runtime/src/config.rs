#![forbid(unsafe_code)]

//! Loading [`HistoryConfig`] from TOML or JSON.
//!
//! ```toml
//! # cfgx.toml
//! max_depth = 50
//! max_redo_depth = 50
//! provisional_prefix = "client"
//! ```
//!
//! ```rust,ignore
//! let config = HistoryConfig::from_toml_file("cfgx.toml")?;
//! let config = HistoryConfig::from_json_str(json)?;
//! ```
//!
//! Missing keys take their defaults. Loaded values are validated with
//! [`HistoryConfig::validate`].

use std::path::Path;

use thiserror::Error;

use crate::undo::HistoryConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl HistoryConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.checked()
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.checked()
    }

    /// Serialize to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    fn checked(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}
