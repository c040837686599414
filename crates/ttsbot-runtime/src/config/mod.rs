//! Configuration loading and validation.
//!
//! The configuration document is organised in the sections the bot has always
//! used (`Main`, `Activity`, `Redis Info`, `PostgreSQL Info`, `Webhook URLs`)
//! plus a few Rust-side additions (`Speech Info`, `Lifecycle`, `Logging`).

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_FILE_ENV, ConfigLoader, FileFormat, Profile};
pub use schema::{
    LifecycleConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, MainConfig, TtsBotConfig,
};
pub use validation::validate_config;
