//! # TTS Bot
//!
//! Process lifecycle orchestration for a text-to-speech chat bot.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌─────────────────┐   ┌─────────────┐
//! │    config    │──▶│   resources   │──▶│   extensions    │──▶│  readiness  │
//! │  (validate)  │   │ cache/db/tts  │   │ core, auxiliary │   │    race     │
//! └──────────────┘   └───────────────┘   └─────────────────┘   └──────┬──────┘
//!                                                                      │
//!                     ┌────────────────────────────────────────────────┘
//!                     ▼
//!              ┌─────────────┐
//!              │  shutdown   │  notice → release everything → deadline
//!              └─────────────┘
//! ```
//!
//! - **Core**: backend handle traits and the chat backend seam
//! - **Framework**: the instance, extensions, analytics and message dispatch
//! - **Runtime**: config, logging, startup, the readiness race and shutdown
//! - **Backends**: webhook, speech API, PostgreSQL and Redis handles
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ttsbot::prelude::*;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let factory = Arc::new(DefaultBackendFactory::new()?);
//!     let runtime = TtsRuntime::builder(factory, Arc::new(MyChat::new()))
//!         .extensions(&[SETTINGS])
//!         .build()?;
//!
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` / `yaml-config`: config file formats
//! - `json-log`: JSON log output

pub use ttsbot_backends as backends;
pub use ttsbot_core as core;
pub use ttsbot_framework as framework;
pub use ttsbot_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use ttsbot::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use ttsbot_runtime::{RunSummary, TtsRuntime};

    // Extensions
    pub use ttsbot_framework::{
        ExtensionDescriptor, ExtensionTier, Instance, Looper, StartupHook, StartupPhase,
        define_extension, define_startup_hook,
    };

    // Dispatch
    pub use ttsbot_framework::{CommandInvoker, InvocationContext, Scope};

    // Chat backend seam
    pub use ttsbot_core::{
        Author, BackendError, BackendKind, BackendResult, ChatBackend, ChatSession, CurrentUser,
        Message, Venue,
    };

    // Production backends
    pub use ttsbot_backends::DefaultBackendFactory;
}
