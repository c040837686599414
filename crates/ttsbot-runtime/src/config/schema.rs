//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ttsbot_core::{BackendParams, Presence, SpeechSettings, UserId, VenueId};
use ttsbot_framework::DEFAULT_PREFIX;

/// Root configuration structure.
///
/// Section names are matched exactly, spaces included.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TtsBotConfig {
    /// Account token, operators and the home venue.
    #[serde(rename = "Main", default)]
    pub main: MainConfig,

    /// Presence announced at login.
    #[serde(rename = "Activity", default)]
    pub activity: Presence,

    /// Cache connection parameters, passed verbatim to the backend factory.
    #[serde(rename = "Redis Info", default)]
    pub redis: BackendParams,

    /// Database connection parameters, passed verbatim to the backend factory.
    #[serde(rename = "PostgreSQL Info", default)]
    pub postgres: BackendParams,

    /// Logical channel name to webhook URL.
    #[serde(rename = "Webhook URLs", default)]
    pub webhooks: BTreeMap<String, String>,

    /// Speech API settings.
    #[serde(rename = "Speech Info", default)]
    pub speech: SpeechSettings,

    /// Startup and shutdown tuning.
    #[serde(rename = "Lifecycle", default)]
    pub lifecycle: LifecycleConfig,

    /// Local log output.
    #[serde(rename = "Logging", default)]
    pub logging: LoggingConfig,
}

/// The `Main` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MainConfig {
    /// Chat service account token.
    #[serde(default)]
    pub token: String,

    /// Operators allowed to run privileged commands.
    #[serde(default)]
    pub trusted_ids: Vec<UserId>,

    /// The bot's home venue.
    #[serde(default)]
    pub main_server: VenueId,
}

/// The `Lifecycle` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Command prefix used when a venue has none configured.
    #[serde(default = "default_prefix")]
    pub default_prefix: String,

    /// Deadline for the whole shutdown sequence, in seconds.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            default_prefix: default_prefix(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl LifecycleConfig {
    /// The shutdown deadline.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_shutdown_timeout_secs() -> u64 {
    5
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `Compact` otherwise.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// The `Logging` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level. `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file path, used when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-module level overrides, e.g. `ttsbot_runtime = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,
}
