//! TTS Bot Runtime - process lifecycle orchestration.
//!
//! This crate provides:
//! - Configuration loading and validation (`config`)
//! - Logging setup (`logging`)
//! - The Resource Initializer (`resources`)
//! - The Readiness Race (`readiness`)
//! - The Shutdown Coordinator (`shutdown`)
//! - The top-level [`TtsRuntime`] tying them together
//!
//! ```ignore
//! use ttsbot_runtime::TtsRuntime;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = TtsRuntime::builder(factory, chat)
//!         .extensions(&[SETTINGS, ANALYTICS])
//!         .build()?;
//!
//!     // Run until Ctrl+C
//!     let summary = runtime.run().await?;
//!     println!("ready: {}", summary.was_ready());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod readiness;
pub mod resources;
pub mod runtime;
pub mod shutdown;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, TtsBotConfig};
pub use error::{RuntimeError, RuntimeResult, StartupError};
pub use logging::{LoggingBuilder, LoggingGuard};
pub use readiness::{LifecycleState, ReadinessOutcome};
pub use resources::ResourceInitializer;
pub use runtime::{RunSummary, RuntimeBuilder, TtsRuntime, shutdown_signal};
pub use shutdown::{
    ReleaseStatus, ReleaseTarget, ShutdownCoordinator, ShutdownReport, ShutdownTrigger,
};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
