//! Webhook-backed notification sinks.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::json;
use tracing::debug;

use ttsbot_core::{BackendError, BackendKind, BackendResult, NotificationSink};

/// Posts notices to a chat-service webhook URL.
///
/// Construction only parses the URL; nothing is sent until [`send`](NotificationSink::send).
pub struct WebhookSink {
    client: Client,
    name: String,
    url: Url,
}

impl WebhookSink {
    /// Creates a sink for the channel `name`, sharing `client`'s HTTP session.
    pub fn new(client: Client, name: impl Into<String>, url: &str) -> BackendResult<Self> {
        let url = Url::parse(url).map_err(|e| {
            BackendError::rejected(BackendKind::Notification, format!("invalid webhook URL: {e}"))
        })?;

        Ok(Self {
            client,
            name: name.into(),
            url,
        })
    }

    /// The logical channel name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn send(&self, content: &str) -> BackendResult<()> {
        debug!(channel = %self.name, "Sending webhook notice");

        let resp = self
            .client
            .post(self.url.clone())
            .json(&json!({ "content": content }))
            .send()
            .await
            .map_err(|e| BackendError::unavailable(BackendKind::Notification, e.to_string()))?;

        match status_error(BackendKind::Notification, resp.status()) {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for WebhookSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The URL embeds the webhook token.
        f.debug_struct("WebhookSink")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Maps a non-success HTTP status onto the backend error taxonomy.
pub(crate) fn status_error(kind: BackendKind, status: StatusCode) -> Option<BackendError> {
    if status.is_success() {
        None
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        Some(BackendError::RateLimited { kind })
    } else if status.is_client_error() {
        Some(BackendError::rejected(kind, format!("HTTP {}", status.as_u16())))
    } else {
        Some(BackendError::unavailable(kind, format!("HTTP {}", status.as_u16())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let kind = BackendKind::Notification;
        assert!(status_error(kind, StatusCode::NO_CONTENT).is_none());
        assert!(matches!(
            status_error(kind, StatusCode::TOO_MANY_REQUESTS),
            Some(BackendError::RateLimited { .. })
        ));
        assert!(matches!(
            status_error(kind, StatusCode::NOT_FOUND),
            Some(BackendError::Rejected { .. })
        ));
        assert!(matches!(
            status_error(kind, StatusCode::BAD_GATEWAY),
            Some(BackendError::Unavailable { .. })
        ));
    }

    #[test]
    fn test_invalid_url_is_rejected_without_io() {
        let err = WebhookSink::new(Client::new(), "logs", "not a url").unwrap_err();
        assert_eq!(err.kind(), BackendKind::Notification);

        let sink = WebhookSink::new(Client::new(), "logs", "https://example.com/api/webhooks/1/x")
            .unwrap();
        assert_eq!(sink.name(), "logs");
        assert!(!format!("{sink:?}").contains("example.com"));
    }
}
