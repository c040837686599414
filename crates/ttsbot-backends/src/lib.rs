//! # TTS Bot Backends
//!
//! Concrete implementations of the backend handle traits from `ttsbot-core`,
//! plus the [`DefaultBackendFactory`] that wires them to configuration.
//!
//! | Handle | Type | Feature |
//! |--------|------|---------|
//! | Notification sink | [`WebhookSink`] | `http` |
//! | Speech client | [`HttpSpeechClient`] | `http` |
//! | Database pool | [`PostgresPool`] | `postgres` |
//! | Cache | [`RedisCache`] | `redis` |
//!
//! A factory built without one of the features rejects requests for that
//! backend instead of failing to compile.

pub mod factory;
pub mod params;

#[cfg(feature = "redis")]
pub mod cache;
#[cfg(feature = "postgres")]
pub mod database;
#[cfg(feature = "http")]
pub mod speech;
#[cfg(feature = "http")]
pub mod webhook;

pub use factory::DefaultBackendFactory;

#[cfg(feature = "redis")]
pub use cache::RedisCache;
#[cfg(feature = "postgres")]
pub use database::PostgresPool;
#[cfg(feature = "http")]
pub use speech::HttpSpeechClient;
#[cfg(feature = "http")]
pub use webhook::WebhookSink;
