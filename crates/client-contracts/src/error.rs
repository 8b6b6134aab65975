//! Error types for the client boundary

use thiserror::Error;

/// Errors surfaced by a [`DocumentClient`](crate::client::DocumentClient)
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Database security rules denied the read/write
    #[error("permission denied by database rules")]
    PermissionDenied,

    /// The client has no signed-in session
    #[error("client is not signed in")]
    NotSignedIn,

    /// Any other backend failure
    #[error("database client error: {0}")]
    Backend(String),
}

impl ClientError {
    /// Whether this error is a rules denial (drives sticky node status)
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, ClientError::PermissionDenied)
    }
}

/// A string failed to parse into one of a closed set of variants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {what}: received '{value}'")]
pub struct UnknownVariant {
    /// What was being parsed ("filter", "direction", ...)
    pub what: &'static str,
    /// The offending input
    pub value: String,
}

impl UnknownVariant {
    pub fn new(what: &'static str, value: impl Into<String>) -> Self {
        Self {
            what,
            value: value.into(),
        }
    }
}
