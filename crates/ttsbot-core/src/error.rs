//! Backend error taxonomy.

use thiserror::Error;

/// Identifies which external dependency an error or handle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BackendKind {
    /// Key/value cache.
    Cache,
    /// Relational database pool.
    Database,
    /// Speech (text-to-voice) API client.
    Speech,
    /// Chat service connection.
    Chat,
    /// Notification delivery endpoint.
    Notification,
    /// Per-venue settings store.
    Settings,
}

impl BackendKind {
    /// Returns the lowercase name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Database => "database",
            Self::Speech => "speech",
            Self::Chat => "chat",
            Self::Notification => "notification",
            Self::Settings => "settings",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by backend handles.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Creating or reaching the backend failed.
    #[error("{kind} backend unavailable: {reason}")]
    Unavailable {
        /// Which backend failed.
        kind: BackendKind,
        /// Reason for failure.
        reason: String,
    },

    /// The backend rejected the request or configuration.
    #[error("{kind} backend rejected request: {reason}")]
    Rejected {
        /// Which backend rejected the request.
        kind: BackendKind,
        /// Reason for rejection.
        reason: String,
    },

    /// The backend asked us to slow down.
    #[error("{kind} backend is rate limited")]
    RateLimited {
        /// Which backend is rate limited.
        kind: BackendKind,
    },

    /// The handle was already released.
    #[error("{kind} handle is closed")]
    Closed {
        /// Which backend handle is closed.
        kind: BackendKind,
    },
}

impl BackendError {
    /// Creates an `Unavailable` error.
    pub fn unavailable(kind: BackendKind, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            kind,
            reason: reason.into(),
        }
    }

    /// Creates a `Rejected` error.
    pub fn rejected(kind: BackendKind, reason: impl Into<String>) -> Self {
        Self::Rejected {
            kind,
            reason: reason.into(),
        }
    }

    /// Returns the backend this error belongs to.
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Unavailable { kind, .. }
            | Self::Rejected { kind, .. }
            | Self::RateLimited { kind }
            | Self::Closed { kind } => *kind,
        }
    }
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
