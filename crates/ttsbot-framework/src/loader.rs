//! Ordered extension activation.
//!
//! [`ExtensionLoader`] owns a fixed list of [`ExtensionDescriptor`]s and
//! activates them against the live [`Instance`]:
//!
//! - tier by tier (every `Core` extension before any `Auxiliary` one),
//! - in registration order within a tier,
//! - one at a time, each activation awaited before the next starts.
//!
//! The first failure aborts the load. The failing extension is marked
//! [`ExtensionLoadState::Failed`], everything after it
//! [`ExtensionLoadState::Skipped`], and the error names the extension.
//! Partial feature availability is never treated as success.
//!
//! ```text
//! register() ──► Registered
//!   load_all() ──► Active   (activation returned Ok)
//!              ──► Failed   (activation returned Err, or duplicate name)
//!              ──► Skipped  (an earlier extension failed)
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info, info_span, Instrument};

use crate::error::ExtensionError;
use crate::extension::ExtensionDescriptor;
use crate::instance::Instance;

/// Load state of one registered extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionLoadState {
    /// Registered but not yet activated.
    Registered,
    /// Activated successfully.
    Active,
    /// Activation failed; the load was aborted here.
    Failed,
    /// Never attempted because an earlier extension failed.
    Skipped,
}

struct ExtensionEntry {
    descriptor: ExtensionDescriptor,
    state: ExtensionLoadState,
}

/// Activates a fixed list of extensions in declared order.
#[derive(Default)]
pub struct ExtensionLoader {
    entries: Vec<ExtensionEntry>,
}

impl ExtensionLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an extension to the list.
    pub fn register(&mut self, descriptor: ExtensionDescriptor) {
        self.entries.push(ExtensionEntry {
            descriptor,
            state: ExtensionLoadState::Registered,
        });
    }

    /// Appends several extensions, preserving their order.
    pub fn register_all(&mut self, descriptors: &[ExtensionDescriptor]) {
        for descriptor in descriptors {
            self.register(*descriptor);
        }
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, descriptor: ExtensionDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Number of registered extensions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load state of the first extension called `name`.
    pub fn state(&self, name: &str) -> Option<ExtensionLoadState> {
        self.entries
            .iter()
            .find(|e| e.descriptor.name == name)
            .map(|e| e.state)
    }

    /// Names in activation order.
    pub fn activation_order(&self) -> Vec<&'static str> {
        self.ordered_indices()
            .into_iter()
            .map(|i| self.entries[i].descriptor.name)
            .collect()
    }

    /// Activates every registered extension, stopping at the first failure.
    pub async fn load_all(&mut self, instance: &Arc<Instance>) -> Result<(), ExtensionError> {
        let order = self.ordered_indices();
        let mut loaded: HashSet<&'static str> = HashSet::new();

        for (pos, &i) in order.iter().enumerate() {
            let descriptor = self.entries[i].descriptor;

            let result = if loaded.insert(descriptor.name) {
                let span = info_span!("extension", name = descriptor.name, tier = %descriptor.tier);
                descriptor
                    .activate(instance)
                    .instrument(span)
                    .await
                    .map_err(|source| ExtensionError::Activation {
                        name: descriptor.name,
                        source,
                    })
            } else {
                Err(ExtensionError::Duplicate {
                    name: descriptor.name,
                })
            };

            match result {
                Ok(()) => {
                    self.entries[i].state = ExtensionLoadState::Active;
                    info!(extension = descriptor.name, tier = %descriptor.tier, "Extension loaded");
                }
                Err(e) => {
                    self.entries[i].state = ExtensionLoadState::Failed;
                    for &rest in &order[pos + 1..] {
                        self.entries[rest].state = ExtensionLoadState::Skipped;
                    }
                    error!(
                        extension = descriptor.name,
                        error = %e,
                        "Extension failed to load, aborting"
                    );
                    return Err(e);
                }
            }
        }

        info!(count = order.len(), "All extensions loaded");
        Ok(())
    }

    /// Indices sorted by tier, keeping registration order within a tier.
    fn ordered_indices(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        order.sort_by_key(|&i| (self.entries[i].descriptor.tier, i));
        order
    }
}

impl std::fmt::Debug for ExtensionLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (e.descriptor.name, e.state)))
            .finish()
    }
}
