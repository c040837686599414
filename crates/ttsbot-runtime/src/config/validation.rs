//! Configuration validation utilities.
//!
//! Runs before any backend is contacted, so a bad document never causes a
//! connection attempt.

use ttsbot_framework::LOGS_CHANNEL;
use url::Url;

use super::error::{ConfigError, ConfigResult};
use super::schema::TtsBotConfig;

/// Validates the entire configuration.
pub fn validate_config(config: &TtsBotConfig) -> ConfigResult<()> {
    validate_main(config)?;
    validate_webhooks(config)?;
    validate_speech(config)?;
    validate_lifecycle(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_main(config: &TtsBotConfig) -> ConfigResult<()> {
    if config.main.token.trim().is_empty() {
        return Err(ConfigError::missing("Main.token"));
    }
    if config.main.main_server.get() == 0 {
        return Err(ConfigError::missing("Main.main_server"));
    }
    Ok(())
}

fn validate_webhooks(config: &TtsBotConfig) -> ConfigResult<()> {
    if !config.webhooks.contains_key(LOGS_CHANNEL) {
        return Err(ConfigError::MissingChannel(LOGS_CHANNEL.to_string()));
    }
    for (name, url) in &config.webhooks {
        check_http_url(&format!("Webhook URLs.{name}"), url)?;
    }
    Ok(())
}

fn validate_speech(config: &TtsBotConfig) -> ConfigResult<()> {
    match &config.speech.base_url {
        Some(url) => check_http_url("Speech Info.base_url", url),
        None => Ok(()),
    }
}

fn validate_lifecycle(config: &TtsBotConfig) -> ConfigResult<()> {
    if config.lifecycle.default_prefix.trim().is_empty() {
        return Err(ConfigError::missing("Lifecycle.default_prefix"));
    }
    if config.lifecycle.shutdown_timeout_secs == 0 {
        return Err(ConfigError::out_of_range(
            "Lifecycle.shutdown_timeout_secs",
            "must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_logging(config: &TtsBotConfig) -> ConfigResult<()> {
    if config.logging.filters.keys().any(|m| m.trim().is_empty()) {
        return Err(ConfigError::out_of_range(
            "Logging.filters",
            "cannot contain an empty target",
        ));
    }
    Ok(())
}

fn check_http_url(field: &str, raw: &str) -> ConfigResult<()> {
    if raw.trim().is_empty() {
        return Err(ConfigError::missing(field));
    }
    let invalid = |reason: String| ConfigError::InvalidUrl {
        field: field.to_owned(),
        url: raw.to_owned(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.host().is_none() {
        return Err(invalid("missing host".to_owned()));
    }
    Ok(())
}
