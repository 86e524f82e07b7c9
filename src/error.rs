use std::fmt;

use thiserror::Error;

/// Which kind of store item an identifier failed to resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Calendar,
    Reminder,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Calendar => f.write_str("calendar"),
            ItemKind::Reminder => f.write_str("reminder"),
        }
    }
}

/// Errors delivered to completions and observer events.
///
/// Values are cloned into both output channels, so every variant carries
/// owned, plain data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An identifier did not resolve to a live calendar or reminder.
    #[error("{kind} not found: {identifier}")]
    NotFound { kind: ItemKind, identifier: String },

    /// The event store rejected the request; passed through unchanged.
    #[error("event store error ({domain} {code}): {message}")]
    Store {
        domain: String,
        code: i64,
        message: String,
    },

    #[error("no tokio runtime is running to host background work")]
    NoRuntime,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn not_found(kind: ItemKind, identifier: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            identifier: identifier.into(),
        }
    }

    pub fn store(domain: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Error::Store {
            domain: domain.into(),
            code,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
