//! Backend handle traits.
//!
//! Every external dependency the bot holds a live session to is modelled as a
//! trait object shared through `Arc<dyn …>`. The orchestrator owns the handles
//! for the lifetime of the process; extensions and command handlers may use
//! them, but only the shutdown path calls `close`.
//!
//! Handles expose `as_any` so that an extension which knows the concrete type
//! (say, the Redis-backed cache) can downcast and reach backend-specific APIs.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BackendResult;
use crate::message::VenueId;

/// Key/value cache handle.
#[async_trait]
pub trait CacheClient: Send + Sync {
    /// Reads a value.
    async fn get(&self, key: &str) -> BackendResult<Option<Vec<u8>>>;

    /// Writes a value.
    async fn set(&self, key: &str, value: &[u8]) -> BackendResult<()>;

    /// Releases the underlying connection.
    async fn close(&self) -> BackendResult<()>;

    /// Upcasts for downcasting to the concrete client.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Relational database pool handle.
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Round-trips a trivial statement to verify the pool is usable.
    async fn ping(&self) -> BackendResult<()>;

    /// Closes every pooled connection.
    async fn close(&self) -> BackendResult<()>;

    /// Upcasts for downcasting to the concrete pool.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Result of probing the speech API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechStatus {
    /// Requests are being served.
    Available,
    /// The API is throttling us; callers should fall back.
    RateLimited,
}

/// Speech (text-to-voice) API client handle.
#[async_trait]
pub trait SpeechClient: Send + Sync {
    /// Synthesizes `text` in `lang`, returning encoded audio.
    async fn synthesize(&self, text: &str, lang: &str) -> BackendResult<Vec<u8>>;

    /// Probes the API with a tiny request.
    ///
    /// Rate limiting is reported as [`SpeechStatus::RateLimited`], not as an
    /// error; any other failure is returned as `Err`.
    async fn check(&self) -> BackendResult<SpeechStatus>;

    /// Releases the HTTP session.
    async fn close(&self) -> BackendResult<()>;

    /// Upcasts for downcasting to the concrete client.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A pre-resolved delivery endpoint for operational notices.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers a plain-text notice.
    async fn send(&self, content: &str) -> BackendResult<()>;
}

/// Per-venue settings lookup.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Returns the configured dispatch trigger for a venue.
    ///
    /// `Ok(None)` means the venue has no stored configuration.
    async fn venue_prefix(&self, venue: VenueId) -> BackendResult<Option<String>>;
}
