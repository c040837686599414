//! Demo extensions.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use ttsbot::core::{BackendResult, CacheClient, SettingsStore, SpeechStatus, VenueId};
use ttsbot::prelude::*;

// ============================================================================
// Settings (core tier)
// ============================================================================

/// Cache key holding a venue's prefix.
pub fn prefix_key(venue: VenueId) -> String {
    format!("prefix:{venue}")
}

/// Per-venue settings kept in the cache.
struct CacheSettings {
    cache: Arc<dyn CacheClient>,
}

#[async_trait]
impl SettingsStore for CacheSettings {
    async fn venue_prefix(&self, venue: VenueId) -> BackendResult<Option<String>> {
        let raw = self.cache.get(&prefix_key(venue)).await?;
        Ok(raw.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }
}

pub static SETTINGS: ExtensionDescriptor = define_extension! {
    name: "settings",
    tier: Core,
    activate: |instance| {
        let store = CacheSettings {
            cache: Arc::clone(instance.cache()),
        };
        instance.install_settings(Arc::new(store))?;
        Ok(())
    },
};

// ============================================================================
// Analytics reporter (auxiliary tier)
// ============================================================================

struct AnalyticsReporter {
    instance: Arc<Instance>,
}

impl Looper for AnalyticsReporter {
    const NAME: &'static str = "Analytics Reporter";
    const INTERVAL: Duration = Duration::from_secs(30);

    async fn loop_func(&self) -> anyhow::Result<()> {
        let counts = self.instance.analytics().drain_counts();
        if counts.is_empty() {
            return Ok(());
        }

        let payload = serde_json::to_vec(&counts)?;
        self.instance.cache().set("analytics:last", &payload).await?;
        info!(?counts, "Analytics flushed");
        Ok(())
    }
}

pub static ANALYTICS: ExtensionDescriptor = define_extension! {
    name: "analytics",
    tier: Auxiliary,
    activate: |instance| {
        instance.spawn_looper(AnalyticsReporter {
            instance: Arc::clone(instance),
        });
        Ok(())
    },
};

// ============================================================================
// Startup hooks
// ============================================================================

/// Fails startup early if the database cannot answer a query.
pub static DATABASE_CHECK: StartupHook = define_startup_hook! {
    name: "database_check",
    phase: Early,
    run: |instance| {
        instance.database().ping().await?;
        Ok(())
    },
};

/// Probes the speech API right before login; throttling is not fatal.
pub static SPEECH_CHECK: StartupHook = define_startup_hook! {
    name: "speech_check",
    phase: Normal,
    run: |instance| {
        match instance.speech().check().await? {
            SpeechStatus::Available => info!("Speech API available"),
            SpeechStatus::RateLimited => warn!("Speech API is rate limited"),
        }
        Ok(())
    },
};
