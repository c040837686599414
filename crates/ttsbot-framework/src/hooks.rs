//! Startup hooks.
//!
//! One-shot async steps that run against the live [`Instance`] at fixed
//! points of startup, outside the extension list:
//!
//! - [`StartupPhase::Early`] runs once the instance exists, before any
//!   extension activates.
//! - [`StartupPhase::Normal`] runs after every extension is active and the
//!   startup notice has gone out, right before login.
//!
//! Within a phase hooks run one at a time in registration order. The first
//! failure stops the phase and is fatal to startup.
//!
//! ```rust,ignore
//! pub static MIGRATE: StartupHook = define_startup_hook! {
//!     name: "migrate",
//!     phase: Early,
//!     run: |instance| {
//!         instance.database().ping().await?;
//!         Ok(())
//!     },
//! };
//! ```

use std::sync::Arc;

use tracing::{Instrument, debug, info_span};

use crate::error::StartupHookError;
use crate::extension::ActivateFn;
use crate::instance::Instance;

/// Where in startup a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartupPhase {
    /// Before extensions load.
    Early,
    /// After extensions load, before login.
    Normal,
}

impl std::fmt::Display for StartupPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Early => f.write_str("early"),
            Self::Normal => f.write_str("normal"),
        }
    }
}

/// A named async step bound to a [`StartupPhase`].
#[derive(Clone, Copy)]
pub struct StartupHook {
    pub name: &'static str,
    pub phase: StartupPhase,
    pub run: ActivateFn,
}

impl std::fmt::Debug for StartupHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartupHook")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

/// Runs every hook of `phase` in order, stopping at the first failure.
pub async fn run_startup_hooks(
    hooks: &[StartupHook],
    phase: StartupPhase,
    instance: &Arc<Instance>,
) -> Result<(), StartupHookError> {
    for hook in hooks.iter().filter(|hook| hook.phase == phase) {
        let span = info_span!("startup_hook", name = hook.name, %phase);
        (hook.run)(instance)
            .instrument(span)
            .await
            .map_err(|source| StartupHookError {
                name: hook.name,
                phase,
                source,
            })?;
        debug!(hook = hook.name, %phase, "Startup hook finished");
    }
    Ok(())
}

/// Builds a [`StartupHook`] from an async body, like
/// [`define_extension!`](crate::define_extension).
#[macro_export]
macro_rules! define_startup_hook {
    (
        name: $name:literal,
        phase: $phase:ident,
        run: |$instance:ident| { $($body:tt)* } $(,)?
    ) => {
        $crate::hooks::StartupHook {
            name: $name,
            phase: $crate::hooks::StartupPhase::$phase,
            run: {
                #[allow(unreachable_code)]
                fn __run(
                    $instance: &::std::sync::Arc<$crate::instance::Instance>,
                ) -> $crate::extension::__BoxFuture<'_, $crate::extension::ActivateResult> {
                    ::std::boxed::Box::pin(async move {
                        let __result: $crate::extension::ActivateResult = { $($body)* };
                        __result
                    })
                }
                __run
            },
        }
    };
}
