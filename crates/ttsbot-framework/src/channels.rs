//! Logical notification channels.

use std::collections::BTreeMap;
use std::sync::Arc;

use ttsbot_core::NotificationSink;

use crate::error::ChannelError;

/// Name of the channel that receives startup, ready and shutdown notices.
pub const LOGS_CHANNEL: &str = "logs";

/// Read-only mapping from logical channel name to notification sink.
///
/// Construction guarantees that [`LOGS_CHANNEL`] is present.
#[derive(Clone)]
pub struct NotificationChannels {
    logs: Arc<dyn NotificationSink>,
    sinks: BTreeMap<String, Arc<dyn NotificationSink>>,
}

impl NotificationChannels {
    /// Wraps a channel map, rejecting it if `logs` is missing.
    pub fn new(sinks: BTreeMap<String, Arc<dyn NotificationSink>>) -> Result<Self, ChannelError> {
        let logs = sinks
            .get(LOGS_CHANNEL)
            .cloned()
            .ok_or(ChannelError::Missing(LOGS_CHANNEL))?;
        Ok(Self { logs, sinks })
    }

    /// The operational log channel.
    pub fn logs(&self) -> &Arc<dyn NotificationSink> {
        &self.logs
    }

    /// Looks up a channel by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn NotificationSink>> {
        self.sinks.get(name)
    }

    /// Iterates over the configured channel names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sinks.keys().map(String::as_str)
    }

    /// Number of configured channels.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns `true` if no channels are configured.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for NotificationChannels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationChannels")
            .field("channels", &self.sinks.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use ttsbot_core::BackendResult;

    use super::*;

    struct NullSink;

    #[async_trait]
    impl NotificationSink for NullSink {
        async fn send(&self, _content: &str) -> BackendResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_logs_channel_is_required() {
        let mut sinks: BTreeMap<String, Arc<dyn NotificationSink>> = BTreeMap::new();
        sinks.insert("errors".to_string(), Arc::new(NullSink));
        assert!(matches!(
            NotificationChannels::new(sinks.clone()),
            Err(ChannelError::Missing("logs"))
        ));

        sinks.insert(LOGS_CHANNEL.to_string(), Arc::new(NullSink));
        let channels = NotificationChannels::new(sinks).unwrap();
        assert_eq!(channels.names().collect::<Vec<_>>(), ["errors", "logs"]);
        assert!(channels.get("errors").is_some());
        assert!(channels.get("missing").is_none());
    }
}
