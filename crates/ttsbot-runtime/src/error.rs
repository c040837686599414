//! Runtime error types.

use thiserror::Error;

use ttsbot_core::BackendError;
use ttsbot_framework::{ChannelError, ExtensionError, StartupHookError};

pub use crate::config::{ConfigError, ConfigResult};

/// Fatal errors raised before the readiness race starts.
///
/// Each one means no backend handle is left held.
#[derive(Error, Debug)]
pub enum StartupError {
    /// The configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A notification sink could not be built or a required one is absent.
    #[error("Notification channel setup failed: {0}")]
    Channels(#[from] ChannelError),

    /// A notification sink rejected its endpoint.
    #[error("Failed to build notification sink {channel:?}: {source}")]
    Sink {
        channel: String,
        #[source]
        source: BackendError,
    },

    /// A backend handle could not be acquired.
    #[error("Failed to acquire backend: {0}")]
    Backend(#[source] BackendError),

    /// An extension failed to activate.
    #[error(transparent)]
    Extension(#[from] ExtensionError),

    /// A startup hook failed.
    #[error(transparent)]
    Hook(#[from] StartupHookError),

    /// Shutdown was requested before startup finished.
    #[error("Shutdown requested during startup")]
    Interrupted,
}

impl StartupError {
    /// Returns `true` if startup stopped because shutdown was requested.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

/// Errors returned by [`TtsRuntime`](crate::TtsRuntime).
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Startup failed; nothing was served.
    #[error("Startup failed: {0}")]
    Startup(#[from] StartupError),
}

impl From<ConfigError> for RuntimeError {
    fn from(e: ConfigError) -> Self {
        Self::Startup(StartupError::Config(e))
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
