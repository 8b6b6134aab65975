//! Error types for the palette contracts

use thiserror::Error;

/// Result type alias using PaletteError
pub type Result<T> = std::result::Result<T, PaletteError>;

/// Errors that can occur in palette plumbing
#[derive(Debug, Error)]
pub enum PaletteError {
    /// Node type not present in the registry
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// A node descriptor was registered twice with conflicting metadata
    #[error("Duplicate registration for node type: {0}")]
    DuplicateNodeType(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
