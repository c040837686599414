//! Console Bot Example
//!
//! Runs the full TTS Bot lifecycle against in-memory backends, with stdin as
//! the chat service. Type `-help` once the bot reports it is ready; Ctrl+C or
//! end of input shuts it down.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot -- --config demos/console_bot/config.toml
//! ```
//!
//! Pass `--production` to use the real Redis, PostgreSQL, speech and webhook
//! backends from the config file instead.

mod commands;
mod console;
mod extensions;
mod memory;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;

use ttsbot::core::BackendFactory;
use ttsbot::prelude::*;
use ttsbot::runtime::{ConfigLoader, RuntimeError};

use crate::commands::DemoCommands;
use crate::console::ConsoleBackend;
use crate::extensions::{ANALYTICS, DATABASE_CHECK, SETTINGS, SPEECH_CHECK};
use crate::memory::MemoryFactory;

#[derive(Debug, Parser)]
#[command(about = "Drive the TTS Bot lifecycle from the terminal")]
struct Args {
    /// Configuration file.
    #[arg(short, long, default_value = "demos/console_bot/config.toml")]
    config: PathBuf,

    /// Configuration profile (overrides `TTSBOT_PROFILE`).
    #[arg(long)]
    profile: Option<String>,

    /// Use the production backends instead of in-memory ones.
    #[arg(long)]
    production: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new().file(&args.config);
    if let Some(profile) = &args.profile {
        loader = loader.profile(profile);
    }
    let config = loader.load()?;

    let factory: Arc<dyn BackendFactory> = if args.production {
        Arc::new(DefaultBackendFactory::new()?)
    } else {
        Arc::new(MemoryFactory)
    };
    let chat = Arc::new(ConsoleBackend::new(config.main.main_server));

    let runtime = TtsRuntime::builder(factory, chat)
        .config(config)
        .extensions(&[SETTINGS, ANALYTICS])
        .startup_hooks(&[DATABASE_CHECK, SPEECH_CHECK])
        .commands(Arc::new(DemoCommands))
        .build()?;

    match runtime.run().await {
        Ok(summary) => {
            if let Some(e) = &summary.serve_error {
                error!(error = %e, "Chat backend stopped with an error");
            }
            if summary.was_ready() && summary.shutdown.is_clean() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Err(RuntimeError::Startup(e)) if e.is_interrupted() => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!("{e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
