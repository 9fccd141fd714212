//! # API Errors
//!
//! [`ApiError`] is what collaborator calls return; [`FailureKind`] is the
//! comparable classification that actually travels inside actions. Actions
//! must support value equality, so they carry the kind, never the raw
//! error object.

use std::fmt;

/// Errors from marketplace API calls.
/// Variants carry enough info to determine retryability (future use).
#[derive(Debug)]
pub enum ApiError {
    /// Transport-level failure (DNS, refused connection, timeout). The
    /// request may never have reached the server. Retryable.
    Network(String),
    /// The server answered with a non-success status. Retryable if
    /// status >= 500 or 429.
    Api { status: u16, message: String },
    /// The response arrived but its payload could not be normalized into
    /// domain types. Not retryable.
    Decode(String),
}

impl ApiError {
    /// Collapse into the comparable category carried by actions.
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Network(_) => FailureKind::Network,
            ApiError::Api { status: 401, .. } | ApiError::Api { status: 403, .. } => {
                FailureKind::Unauthorized
            }
            ApiError::Api { status, .. } => FailureKind::Api { status: *status },
            ApiError::Decode(_) => FailureKind::Decode,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Api { status, message } => {
                write!(f, "API error (HTTP {status}): {message}")
            }
            ApiError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Normalized failure category. This is the only failure representation a
/// reducer ever sees: two failures of the same kind compare equal no
/// matter what messages the underlying errors carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The request never produced a response.
    Network,
    /// The server rejected the credentials or token.
    Unauthorized,
    /// Any other non-success HTTP status.
    Api { status: u16 },
    /// The payload could not be normalized.
    Decode,
    /// Local persistence failed.
    Storage,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Network => write!(f, "network unavailable"),
            FailureKind::Unauthorized => write!(f, "not authorized"),
            FailureKind::Api { status } => write!(f, "server error (HTTP {status})"),
            FailureKind::Decode => write!(f, "unreadable server response"),
            FailureKind::Storage => write!(f, "local storage failure"),
        }
    }
}
