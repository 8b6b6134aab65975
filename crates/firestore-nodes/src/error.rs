//! Error types for the Firestore nodes

use thiserror::Error;

use fireflow_client_contracts::ClientError;
use fireflow_query::NormalizeError;

/// Result type alias using NodeError
pub type Result<T> = std::result::Result<T, NodeError>;

/// Errors raised by the Firestore nodes around the normalizer core
#[derive(Debug, Error)]
pub enum NodeError {
    /// No database is configured or the config node is disabled
    #[error("Database not configured or disabled!")]
    DatabaseNotReady,

    /// `msg.method` is absent while the node defers the method to the message
    #[error("msg.method do not exist!")]
    MissingMethod,

    /// `msg.method` is not a string
    #[error("msg.method must be a string!")]
    MethodNotString,

    /// `msg.method` is outside the closed method set
    #[error("msg.method must be one of 'delete', 'set' or 'update', received '{0}'")]
    UnknownMethod(String),

    /// `msg.options.merge` is neither a boolean nor a string array
    #[error("msg.options.merge must be boolean or a string array")]
    InvalidMergeOption,

    /// The subscription filter is outside the closed change-type set
    #[error("Unknown filter (DocumentChangeType): received '{0}'")]
    UnknownChangeFilter(String),

    /// `msg.constraints` does not deserialize into a constraint set
    #[error("msg.constraints is not a valid constraint set: {0}")]
    InvalidConstraintsOverride(String),

    /// Failure inside the query/payload normalizer
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// Failure reported by the database client
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NodeError {
    /// Whether the underlying failure is a rules denial
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, NodeError::Client(err) if err.is_permission_denied())
    }
}
