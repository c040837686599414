//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! ```rust,ignore
//! use ttsbot_runtime::logging::LoggingBuilder;
//!
//! let _guard = LoggingBuilder::new()
//!     .directive("ttsbot_runtime=debug")
//!     .init();
//! ```
//!
//! File output goes through a non-blocking writer; keep the returned
//! [`LoggingGuard`] alive or buffered lines are lost on exit.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogOutput, LoggingConfig};

/// Backend client crates that are noisy below `warn`.
const QUIET_TARGETS: &[&str] = &[
    "tokio_postgres=warn",
    "redis=warn",
    "reqwest=warn",
    "hyper_util=warn",
    "rustls=warn",
];

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Keeps the background log writer alive.
#[derive(Default)]
#[must_use = "dropping the guard stops the file writer"]
pub struct LoggingGuard(Option<WorkerGuard>);

impl LoggingGuard {
    /// Returns `true` if a background writer is attached.
    pub fn is_active(&self) -> bool {
        self.0.is_some()
    }
}

impl std::fmt::Debug for LoggingGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("LoggingGuard").field(&self.is_active()).finish()
    }
}

/// Initialize logging from the `Logging` config section.
///
/// Leaves an already installed global subscriber in place.
pub fn init_from_config(config: &LoggingConfig) -> LoggingGuard {
    LoggingBuilder::from_config(config)
        .try_init()
        .unwrap_or_default()
}

/// A builder for configuring logging.
pub struct LoggingBuilder {
    level: tracing::Level,
    directives: Vec<String>,
    quiet_backends: bool,
    format: LogFormat,
    output: LogOutput,
    file_path: Option<PathBuf>,
    with_target: bool,
    with_thread_ids: bool,
    with_file_location: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingBuilder {
    /// Create a builder logging at `info` to stdout.
    pub fn new() -> Self {
        Self {
            level: tracing::Level::INFO,
            directives: Vec::new(),
            quiet_backends: true,
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            with_target: true,
            with_thread_ids: false,
            with_file_location: false,
        }
    }

    /// Create a builder mirroring a `LoggingConfig`.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let directives = config
            .filters
            .iter()
            .map(|(target, level)| format!("{target}={level}"))
            .collect();

        Self {
            level: config.level.to_tracing_level(),
            directives,
            format: config.format,
            output: config.output,
            file_path: config.file_path.clone(),
            with_thread_ids: config.thread_ids,
            with_file_location: config.file_location,
            ..Self::new()
        }
    }

    /// Set the base level. `RUST_LOG` still wins when present.
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self
    }

    /// Add a filter directive, e.g. `ttsbot_framework=trace`.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Keep backend client crates at their own levels instead of `warn`.
    pub fn verbose_backends(mut self) -> Self {
        self.quiet_backends = false;
        self
    }

    /// Set the output format.
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the output destination.
    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Set the log file; used with [`LogOutput::File`].
    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Include the target (module path) in log output.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Include thread IDs in log output.
    pub fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.with_thread_ids = enabled;
        self
    }

    /// Include file names and line numbers in log output.
    pub fn with_file_location(mut self, enabled: bool) -> Self {
        self.with_file_location = enabled;
        self
    }

    /// Builds the filter, returning directives that failed to parse.
    fn build_filter(&self) -> (EnvFilter, Vec<String>) {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str().to_lowercase()));
        let mut rejected = Vec::new();

        let quiet = QUIET_TARGETS
            .iter()
            .filter(|_| self.quiet_backends)
            .map(|d| d.to_string());
        for directive in quiet.chain(self.directives.iter().cloned()) {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(_) => rejected.push(directive),
            }
        }

        (filter, rejected)
    }

    fn fmt_layer<W>(&self, writer: W) -> BoxedLayer
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let layer = fmt::layer()
            .with_writer(writer)
            .with_target(self.with_target)
            .with_thread_ids(self.with_thread_ids)
            .with_file(self.with_file_location)
            .with_line_number(self.with_file_location);

        match self.format {
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Full => layer.boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            #[cfg(feature = "json-log")]
            LogFormat::Json => layer.json().boxed(),
            #[cfg(not(feature = "json-log"))]
            LogFormat::Json => layer.compact().boxed(),
        }
    }

    /// Initialize the logging system, ignoring an existing subscriber.
    pub fn init(self) -> LoggingGuard {
        self.try_init().unwrap_or_default()
    }

    /// Try to initialize the logging system.
    pub fn try_init(self) -> Result<LoggingGuard, TryInitError> {
        let (filter, rejected) = self.build_filter();

        let mut guard = None;
        let mut fallback_to_stdout = false;
        let layer = match self.output {
            LogOutput::Stdout => self.fmt_layer(std::io::stdout),
            LogOutput::Stderr => self.fmt_layer(std::io::stderr),
            LogOutput::File => match self.file_path.as_deref() {
                Some(path) => {
                    let appender = tracing_appender::rolling::daily(
                        path.parent().unwrap_or_else(|| Path::new(".")),
                        path.file_name().unwrap_or_else(|| OsStr::new("ttsbot.log")),
                    );
                    let (writer, worker) = tracing_appender::non_blocking(appender);
                    guard = Some(worker);
                    self.fmt_layer(writer)
                }
                None => {
                    fallback_to_stdout = true;
                    self.fmt_layer(std::io::stdout)
                }
            },
        };

        tracing_subscriber::registry()
            .with(layer.with_filter(filter))
            .try_init()?;

        if fallback_to_stdout {
            warn!("File output requested without `file_path`, logging to stdout");
        }
        #[cfg(not(feature = "json-log"))]
        if self.format == LogFormat::Json {
            warn!("JSON log format requires the `json-log` feature, using compact");
        }
        for directive in rejected {
            warn!(%directive, "Ignoring invalid log directive");
        }

        Ok(LoggingGuard(guard))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_from_config_collects_filters() {
        let config = LoggingConfig {
            level: LogLevel::Warn,
            filters: BTreeMap::from([
                ("ttsbot_runtime".to_string(), LogLevel::Debug),
                ("ttsbot_framework".to_string(), LogLevel::Trace),
            ]),
            file_location: true,
            ..Default::default()
        };

        let builder = LoggingBuilder::from_config(&config);
        assert_eq!(builder.level, tracing::Level::WARN);
        assert_eq!(
            builder.directives,
            ["ttsbot_framework=trace", "ttsbot_runtime=debug"]
        );
        assert!(builder.with_file_location);
        assert!(builder.quiet_backends);
    }

    #[test]
    fn test_invalid_directives_are_reported() {
        let builder = LoggingBuilder::new()
            .directive("ttsbot_runtime=debug")
            .directive("ttsbot_core=loud");

        let (_, rejected) = builder.build_filter();
        assert_eq!(rejected, ["ttsbot_core=loud"]);
    }
}
