//! # TTS Bot Framework
//!
//! The pieces that sit between the raw backend contracts in `ttsbot-core` and
//! the lifecycle orchestration in `ttsbot-runtime`:
//!
//! - [`Instance`] — the single owned aggregate of every live backend handle
//! - [`ExtensionDescriptor`] / [`ExtensionLoader`] — a fixed, ordered list of
//!   feature modules activated against the instance
//! - [`AnalyticsBuffer`] — process-wide event accumulator
//! - [`PrefixResolver`] / [`InvocationContext`] / [`CommandDispatcher`] — the
//!   per-message dispatch pipeline with its central precondition checks
//! - [`StartupHook`] — one-shot steps run before and after extension loading
//! - [`Looper`] — periodic background work scheduled by extensions

pub mod analytics;
pub mod channels;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod extension;
pub mod hooks;
pub mod instance;
pub mod loader;
pub mod looper;
pub mod prefix;

#[cfg(test)]
mod testing;

pub use analytics::{AnalyticsBuffer, AnalyticsEvent};
pub use channels::{LOGS_CHANNEL, NotificationChannels};
pub use context::{InvocationContext, Scope};
pub use dispatch::{CheckFn, CommandDispatcher, CommandInvoker, DispatchOutcome, only_available};
pub use error::{ChannelError, ExtensionError, SettingsInstallError, StartupHookError};
pub use extension::{ActivateFn, ActivateResult, ExtensionDescriptor, ExtensionTier};
pub use hooks::{StartupHook, StartupPhase, run_startup_hooks};
pub use instance::{Instance, Resources};
pub use loader::{ExtensionLoadState, ExtensionLoader};
pub use looper::Looper;
pub use prefix::{DEFAULT_PREFIX, PrefixResolver};
