//! HTTP speech API client.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use ttsbot_core::{
    BackendError, BackendKind, BackendResult, SpeechClient, SpeechSettings, SpeechStatus,
};

use crate::webhook::status_error;

/// Base URL used when the configuration does not override it.
pub const DEFAULT_BASE_URL: &str = "https://translate.google.com";

/// Text and language of the rate-limit probe.
const PROBE: (&str, &str) = ("RL Test", "en");

/// Speech client speaking the translate TTS endpoint.
pub struct HttpSpeechClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    closed: AtomicBool,
}

impl HttpSpeechClient {
    /// Creates a client sharing `client`'s HTTP session.
    pub fn new(client: Client, settings: &SpeechSettings) -> BackendResult<Self> {
        let base = settings.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let endpoint = Url::parse(base)
            .and_then(|base| base.join("translate_tts"))
            .map_err(|e| {
                BackendError::rejected(BackendKind::Speech, format!("invalid base URL: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key.clone(),
            closed: AtomicBool::new(false),
        })
    }

    /// The resolved synthesis endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_url(&self, text: &str, lang: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("ie", "UTF-8")
            .append_pair("client", "tw-ob")
            .append_pair("tl", lang)
            .append_pair("q", text);
        url
    }
}

#[async_trait]
impl SpeechClient for HttpSpeechClient {
    async fn synthesize(&self, text: &str, lang: &str) -> BackendResult<Vec<u8>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BackendError::Closed {
                kind: BackendKind::Speech,
            });
        }

        let mut req = self.client.get(self.request_url(text, lang));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| BackendError::unavailable(BackendKind::Speech, e.to_string()))?;
        if let Some(err) = status_error(BackendKind::Speech, resp.status()) {
            return Err(err);
        }

        let audio = resp
            .bytes()
            .await
            .map_err(|e| BackendError::unavailable(BackendKind::Speech, e.to_string()))?;
        debug!(lang, bytes = audio.len(), "Synthesized speech");
        Ok(audio.to_vec())
    }

    async fn check(&self) -> BackendResult<SpeechStatus> {
        let (text, lang) = PROBE;
        match self.synthesize(text, lang).await {
            Ok(_) => Ok(SpeechStatus::Available),
            Err(BackendError::RateLimited { .. }) => {
                warn!("Speech API is rate limited");
                Ok(SpeechStatus::RateLimited)
            }
            Err(e) => Err(e),
        }
    }

    async fn close(&self) -> BackendResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_resolution() {
        let client = HttpSpeechClient::new(Client::new(), &SpeechSettings::default()).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://translate.google.com/translate_tts"
        );

        let settings = SpeechSettings {
            base_url: Some("http://tts.internal:8080/api/".into()),
            api_key: None,
        };
        let client = HttpSpeechClient::new(Client::new(), &settings).unwrap();
        let url = client.request_url("hello world", "en");
        assert_eq!(url.path(), "/api/translate_tts");
        assert!(url.query().is_some_and(|q| q.contains("q=hello+world")));
    }

    #[test]
    fn test_invalid_base_url() {
        let settings = SpeechSettings {
            base_url: Some("::".into()),
            api_key: None,
        };
        let err = HttpSpeechClient::new(Client::new(), &settings).err().unwrap();
        assert_eq!(err.kind(), BackendKind::Speech);
    }

    #[tokio::test]
    async fn test_closed_client_refuses_requests() {
        let client = HttpSpeechClient::new(Client::new(), &SpeechSettings::default()).unwrap();
        tokio_test::assert_ok!(client.close().await);

        let err = client.synthesize("hi", "en").await.unwrap_err();
        assert!(matches!(err, BackendError::Closed { kind: BackendKind::Speech }));
        assert!(client.check().await.is_err());
    }
}
