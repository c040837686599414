//! Extension descriptors — the static handle to a feature module.
//!
//! An extension is a named activation entry point run once against the live
//! [`Instance`] during startup. It may register settings stores, spawn
//! loopers, or read any backend handle; it may not replace handles.
//!
//! # Defining an extension
//!
//! ```rust,ignore
//! use ttsbot_framework::define_extension;
//!
//! pub static GREETER: ExtensionDescriptor = define_extension! {
//!     name: "greeter",
//!     tier: Core,
//!     activate: |instance| {
//!         instance.log("greeter_loaded");
//!         Ok(())
//!     },
//! };
//! ```

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::instance::Instance;

#[doc(hidden)]
pub use futures::future::BoxFuture as __BoxFuture;

/// Result returned by an activation entry point.
pub type ActivateResult = anyhow::Result<()>;

/// Activation entry point signature.
pub type ActivateFn = for<'a> fn(&'a Arc<Instance>) -> BoxFuture<'a, ActivateResult>;

/// Load tier. All `Core` extensions activate before any `Auxiliary` one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExtensionTier {
    /// Feature modules (commands, voice handling, …).
    Core,
    /// Supporting modules (caches, reporters, database handlers, …).
    Auxiliary,
}

impl std::fmt::Display for ExtensionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Core => f.write_str("core"),
            Self::Auxiliary => f.write_str("auxiliary"),
        }
    }
}

/// A static, `Copy` descriptor that identifies and activates an extension.
#[derive(Clone, Copy)]
pub struct ExtensionDescriptor {
    /// Unique extension name (used in logs and errors).
    pub name: &'static str,
    /// Load tier.
    pub tier: ExtensionTier,
    /// Activation entry point.
    pub activate: ActivateFn,
}

impl ExtensionDescriptor {
    /// Runs the activation entry point.
    pub fn activate<'a>(&self, instance: &'a Arc<Instance>) -> BoxFuture<'a, ActivateResult> {
        (self.activate)(instance)
    }
}

impl std::fmt::Debug for ExtensionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionDescriptor")
            .field("name", &self.name)
            .field("tier", &self.tier)
            .finish_non_exhaustive()
    }
}

/// Builds an [`ExtensionDescriptor`] from an async activation body.
///
/// The body is an `async move` block with the named `Arc<Instance>` binding
/// in scope; it must evaluate to `anyhow::Result<()>`.
#[macro_export]
macro_rules! define_extension {
    (
        name: $name:literal,
        tier: $tier:ident,
        activate: |$instance:ident| { $($body:tt)* } $(,)?
    ) => {
        $crate::extension::ExtensionDescriptor {
            name: $name,
            tier: $crate::extension::ExtensionTier::$tier,
            activate: {
                #[allow(unreachable_code)]
                fn __activate(
                    $instance: &::std::sync::Arc<$crate::instance::Instance>,
                ) -> $crate::extension::__BoxFuture<'_, $crate::extension::ActivateResult> {
                    ::std::boxed::Box::pin(async move {
                        let __result: $crate::extension::ActivateResult = { $($body)* };
                        __result
                    })
                }
                __activate
            },
        }
    };
}
