//! Command prefix resolution.
//!
//! Direct messages always use the default prefix. Venue messages use the
//! venue's configured prefix when a settings store is installed and has one;
//! otherwise they fall back to the default. A store lookup error is logged
//! and also falls back, so a settings outage never blocks commands.

use tracing::warn;

use ttsbot_core::{Message, SettingsStore};

/// Default command prefix.
pub const DEFAULT_PREFIX: &str = "-";

/// Resolves the command prefix applicable to a message.
#[derive(Debug, Clone)]
pub struct PrefixResolver {
    default: String,
}

impl Default for PrefixResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl PrefixResolver {
    /// Creates a resolver with the given fallback prefix.
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
        }
    }

    /// The fallback prefix.
    pub fn default_prefix(&self) -> &str {
        &self.default
    }

    /// Returns the prefix for `message`.
    pub async fn resolve(&self, message: &Message, store: Option<&dyn SettingsStore>) -> String {
        let (Some(venue), Some(store)) = (&message.venue, store) else {
            return self.default.clone();
        };

        match store.venue_prefix(venue.id).await {
            Ok(Some(prefix)) if !prefix.is_empty() => prefix,
            Ok(_) => self.default.clone(),
            Err(e) => {
                warn!(venue = %venue.id, error = %e, "Prefix lookup failed, using default");
                self.default.clone()
            }
        }
    }
}
