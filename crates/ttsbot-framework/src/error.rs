//! Error types for the framework layer.

use thiserror::Error;

/// Failure while activating the extension list.
#[derive(Debug, Error)]
pub enum ExtensionError {
    /// The extension's activation entry point returned an error.
    #[error("extension '{name}' failed to activate: {source}")]
    Activation {
        /// Name of the failing extension.
        name: &'static str,
        /// Underlying cause.
        #[source]
        source: anyhow::Error,
    },

    /// Another extension with the same name was already activated.
    #[error("extension '{name}' is registered more than once")]
    Duplicate {
        /// The duplicated name.
        name: &'static str,
    },
}

impl ExtensionError {
    /// Returns the name of the offending extension.
    pub fn extension_name(&self) -> &'static str {
        match self {
            Self::Activation { name, .. } | Self::Duplicate { name } => name,
        }
    }
}

/// A startup hook returned an error.
#[derive(Debug, Error)]
#[error("{phase} startup hook '{name}' failed: {source}")]
pub struct StartupHookError {
    /// Name of the failing hook.
    pub name: &'static str,
    /// Phase it ran in.
    pub phase: crate::hooks::StartupPhase,
    /// Underlying cause.
    #[source]
    pub source: anyhow::Error,
}

/// Invalid notification channel mapping.
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    /// A required logical channel is not configured.
    #[error("required notification channel '{0}' is not configured")]
    Missing(&'static str),
}

/// A settings store was installed twice.
#[derive(Debug, Clone, Error)]
#[error("a settings store is already installed")]
pub struct SettingsInstallError;
