//! Translation of free-form configuration sections into connection strings.
//!
//! The `Redis Info` and `PostgreSQL Info` sections are passed through as
//! [`BackendParams`]; this module decides which keys mean what.

use serde_json::Value;
use url::Url;

use ttsbot_core::{BackendError, BackendKind, BackendParams, BackendResult};

/// Pool size used when `max_size` is absent.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Keys in `PostgreSQL Info` that tune the pool instead of the connection.
const POOL_KEYS: &[&str] = &["min_size", "max_size", "max_queries", "command_timeout"];

/// Builds a libpq-style `key=value` connection string.
///
/// `database` is accepted as an alias of `dbname`; pool tuning keys are
/// skipped. Values are single-quoted with `\` and `'` escaped.
pub fn postgres_conninfo(params: &BackendParams) -> BackendResult<String> {
    let mut parts = Vec::with_capacity(params.len());

    for (key, value) in params {
        if POOL_KEYS.contains(&key.as_str()) {
            continue;
        }
        let key = match key.as_str() {
            "database" => "dbname",
            other => other,
        };
        let value = scalar(BackendKind::Database, key, value)?;
        parts.push(format!("{key}={}", quote(&value)));
    }

    Ok(parts.join(" "))
}

/// Number of connections the pool opens.
pub fn pool_size(params: &BackendParams) -> usize {
    params
        .get("max_size")
        .and_then(Value::as_u64)
        .map_or(DEFAULT_POOL_SIZE, |n| n.max(1) as usize)
}

/// Resolves the Redis connection URL.
///
/// An explicit `url` wins. Otherwise the URL is assembled from `host`,
/// `port`, `db` and `password`, defaulting to `redis://localhost:6379/0`.
/// The password is percent-encoded.
pub fn redis_url(params: &BackendParams) -> BackendResult<String> {
    if let Some(url) = params.get("url") {
        return url.as_str().map(str::to_owned).ok_or_else(|| {
            BackendError::rejected(BackendKind::Cache, "`url` must be a string")
        });
    }

    let rejected = |message: String| BackendError::rejected(BackendKind::Cache, message);
    let field = |key: &str| {
        params
            .get(key)
            .map(|v| scalar(BackendKind::Cache, key, v))
            .transpose()
    };

    let mut url = Url::parse("redis://localhost:6379/0")
        .map_err(|e| rejected(format!("default URL: {e}")))?;
    if let Some(host) = field("host")? {
        url.set_host(Some(&host))
            .map_err(|e| rejected(format!("invalid `host` {host:?}: {e}")))?;
    }
    if let Some(port) = field("port")? {
        let port: u16 = port
            .parse()
            .map_err(|_| rejected(format!("invalid `port` {port:?}")))?;
        url.set_port(Some(port))
            .map_err(|()| rejected("`port` cannot be set".to_owned()))?;
    }
    if let Some(db) = field("db")? {
        url.set_path(&format!("/{db}"));
    }
    if let Some(password) = field("password")? {
        url.set_password(Some(&password))
            .map_err(|()| rejected("`password` cannot be set".to_owned()))?;
    }

    Ok(url.into())
}

fn scalar(kind: BackendKind, key: &str, value: &Value) -> BackendResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(BackendError::rejected(
            kind,
            format!("`{key}` must be a string, number or boolean"),
        )),
    }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}
