//! Configuration errors shared by every medkg crate.

use thiserror::Error;

/// Result type for configuration checks.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Misconfiguration detected before any question is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A required setting (credential, endpoint) is absent.
    #[error("Missing required setting: {0}")]
    MissingField(String),

    /// A setting is present but unusable.
    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn missing(field: impl Into<String>) -> Self {
        ConfigError::MissingField(field.into())
    }

    pub fn invalid(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Fail with [`ConfigError::MissingField`] when a required value is blank.
pub fn require(field: &str, value: Option<&str>) -> ConfigResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ConfigError::missing(field)),
    }
}
