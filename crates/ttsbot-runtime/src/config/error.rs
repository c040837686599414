//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating the configuration.
///
/// Validation variants name the offending key as `Section.key`, using the
/// section names of the document.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("config file {} does not exist", .0.display())]
    FileNotFound(PathBuf),

    /// The file extension has no enabled format.
    #[error("config file {} has an unsupported format (enabled: {enabled})", .path.display())]
    UnsupportedFormat {
        path: PathBuf,
        /// Comma-separated list of enabled extensions.
        enabled: String,
    },

    /// A source could not be read or did not match the schema.
    #[error("failed to read configuration: {0}")]
    Extract(#[source] Box<figment::Error>),

    /// A required key is absent or blank.
    #[error("`{field}` is required")]
    MissingField { field: String },

    /// A required notification channel has no webhook.
    #[error("no webhook configured for the `{0}` channel")]
    MissingChannel(String),

    /// A URL-valued key is not an http(s) URL with a host.
    #[error("`{field}` is not a valid http(s) URL ({reason}): {url:?}")]
    InvalidUrl {
        field: String,
        url: String,
        reason: String,
    },

    /// A key holds a value outside its allowed range.
    #[error("`{field}` {reason}")]
    OutOfRange { field: String, reason: &'static str },
}

impl ConfigError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub(crate) fn out_of_range(field: impl Into<String>, reason: &'static str) -> Self {
        Self::OutOfRange {
            field: field.into(),
            reason,
        }
    }

    /// Returns the `Section.key` path the error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field }
            | Self::InvalidUrl { field, .. }
            | Self::OutOfRange { field, .. } => Some(field),
            Self::FileNotFound(_)
            | Self::UnsupportedFormat { .. }
            | Self::Extract(_)
            | Self::MissingChannel(_) => None,
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Extract(Box::new(e))
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
