//! The production [`BackendFactory`].

use std::sync::Arc;
#[cfg(feature = "http")]
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use ttsbot_core::{
    BackendError, BackendFactory, BackendKind, BackendParams, BackendResult, CacheClient,
    DatabasePool, NotificationSink, SpeechClient, SpeechSettings,
};

/// Timeout applied to every outbound HTTP request.
#[cfg(feature = "http")]
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Creates the concrete handles enabled by this crate's features.
///
/// Webhook sinks and the speech client share one HTTP session.
pub struct DefaultBackendFactory {
    #[cfg(feature = "http")]
    http: reqwest::Client,
}

impl DefaultBackendFactory {
    /// Creates a factory with a fresh HTTP session.
    pub fn new() -> BackendResult<Self> {
        Ok(Self {
            #[cfg(feature = "http")]
            http: reqwest::ClientBuilder::new()
                .timeout(HTTP_TIMEOUT)
                .build()
                .map_err(|e| BackendError::unavailable(BackendKind::Notification, e.to_string()))?,
        })
    }

    /// Creates a factory reusing an existing HTTP session.
    #[cfg(feature = "http")]
    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[allow(dead_code)]
fn disabled(kind: BackendKind, feature: &str) -> BackendError {
    BackendError::rejected(kind, format!("built without the `{feature}` feature"))
}

#[async_trait]
impl BackendFactory for DefaultBackendFactory {
    async fn create_cache(&self, params: &BackendParams) -> BackendResult<Arc<dyn CacheClient>> {
        #[cfg(feature = "redis")]
        {
            let cache = crate::cache::RedisCache::connect(params).await?;
            Ok(Arc::new(cache))
        }
        #[cfg(not(feature = "redis"))]
        {
            let _ = params;
            Err(disabled(BackendKind::Cache, "redis"))
        }
    }

    async fn create_database(
        &self,
        params: &BackendParams,
    ) -> BackendResult<Arc<dyn DatabasePool>> {
        #[cfg(feature = "postgres")]
        {
            let pool = crate::database::PostgresPool::connect(params).await?;
            Ok(Arc::new(pool))
        }
        #[cfg(not(feature = "postgres"))]
        {
            let _ = params;
            Err(disabled(BackendKind::Database, "postgres"))
        }
    }

    async fn create_speech(
        &self,
        settings: &SpeechSettings,
    ) -> BackendResult<Arc<dyn SpeechClient>> {
        #[cfg(feature = "http")]
        {
            let client = crate::speech::HttpSpeechClient::new(self.http.clone(), settings)?;
            debug!(endpoint = %client.endpoint(), "Speech client ready");
            Ok(Arc::new(client))
        }
        #[cfg(not(feature = "http"))]
        {
            let _ = settings;
            Err(disabled(BackendKind::Speech, "http"))
        }
    }

    fn create_sink(&self, name: &str, url: &str) -> BackendResult<Arc<dyn NotificationSink>> {
        #[cfg(feature = "http")]
        {
            let sink = crate::webhook::WebhookSink::new(self.http.clone(), name, url)?;
            debug!(channel = name, "Webhook sink created");
            Ok(Arc::new(sink))
        }
        #[cfg(not(feature = "http"))]
        {
            let _ = (name, url);
            Err(disabled(BackendKind::Notification, "http"))
        }
    }
}

impl std::fmt::Debug for DefaultBackendFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultBackendFactory").finish_non_exhaustive()
    }
}

#[cfg(all(test, feature = "http"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sink_and_speech_need_no_io() {
        let factory = DefaultBackendFactory::new().unwrap();

        assert!(factory
            .create_sink("logs", "https://example.com/api/webhooks/1/token")
            .is_ok());
        let err = factory.create_sink("logs", "nope").err().unwrap();
        assert_eq!(err.kind(), BackendKind::Notification);

        let speech = factory.create_speech(&SpeechSettings::default()).await.unwrap();
        assert!(speech.as_any().downcast::<crate::HttpSpeechClient>().is_ok());
    }
}
