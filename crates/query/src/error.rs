//! Error taxonomy of the normalizer
//!
//! Every error aborts the whole normalization attempt: no partial
//! constraint sets and no partially expanded payloads ever escape.

use std::fmt;

use thiserror::Error;

use crate::typed::TypeTag;

/// Result type alias using NormalizeError
pub type Result<T> = std::result::Result<T, NormalizeError>;

/// The constraint kinds a query configuration may declare, in the
/// fixed order the builder resolves them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    EndAt,
    EndBefore,
    StartAt,
    StartAfter,
    LimitToFirst,
    LimitToLast,
    Offset,
    OrderBy,
    Select,
    Where,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintKind::EndAt => "endAt",
            ConstraintKind::EndBefore => "endBefore",
            ConstraintKind::StartAt => "startAt",
            ConstraintKind::StartAfter => "startAfter",
            ConstraintKind::LimitToFirst => "limitToFirst",
            ConstraintKind::LimitToLast => "limitToLast",
            ConstraintKind::Offset => "offset",
            ConstraintKind::OrderBy => "orderBy",
            ConstraintKind::Select => "select",
            ConstraintKind::Where => "where",
        };
        write!(f, "{}", name)
    }
}

/// Errors produced while normalizing a query or a write payload
#[derive(Debug, Clone, Error)]
pub enum NormalizeError {
    /// A message-dependent field was evaluated without a message
    #[error("incoming message missing to evaluate the '{value}' ({tag}) property")]
    MissingContext { value: String, tag: TypeTag },

    /// A field lookup or parse failed
    #[error("failed to evaluate the '{value}' ({tag}) property: {reason}")]
    Eval {
        value: String,
        tag: TypeTag,
        reason: String,
    },

    /// A declared type tag is not allowed for its constraint kind
    #[error("invalid type ({tag}) for the {kind} field, please reconfigure this node")]
    InvalidFieldType { kind: ConstraintKind, tag: TypeTag },

    /// A resolved constraint value failed its kind-specific shape check
    #[error("invalid {kind} value: {reason}")]
    InvalidConstraintValue {
        kind: ConstraintKind,
        reason: String,
    },

    /// The write payload is not an object
    #[error("write payload must be an object: {0}")]
    InvalidPayloadShape(String),

    /// The operand of an increment/decrement keyword is not a number
    #[error("the delta of the increment keyword must be a valid number, received '{0}'")]
    InvalidIncrementDelta(String),

    /// A filter or direction string is outside its closed set
    #[error("unknown {what}: received '{value}'")]
    UnknownFilterOrDirection { what: &'static str, value: String },
}

impl NormalizeError {
    pub(crate) fn eval(value: &str, tag: TypeTag, reason: impl Into<String>) -> Self {
        Self::Eval {
            value: value.to_string(),
            tag,
            reason: reason.into(),
        }
    }

    pub(crate) fn constraint(kind: ConstraintKind, reason: impl Into<String>) -> Self {
        Self::InvalidConstraintValue {
            kind,
            reason: reason.into(),
        }
    }
}

impl From<fireflow_client_contracts::UnknownVariant> for NormalizeError {
    fn from(err: fireflow_client_contracts::UnknownVariant) -> Self {
        Self::UnknownFilterOrDirection {
            what: err.what,
            value: err.value,
        }
    }
}
