//! Fireflow Query Normalizer
//!
//! Turns a node's declarative configuration plus an optional incoming
//! message into the validated, typed query or write payload the
//! database client consumes:
//!
//! - [`typed`] resolves `(value, type)` property pairs against the
//!   message and the scoped context stores
//! - [`constraints`] builds and validates the query constraint set
//! - [`payload`] expands reserved write-payload keywords into special
//!   field-value directives
//! - [`target`] resolves the target scope and assembles the final
//!   [`QueryConfig`](fireflow_client_contracts::QueryConfig)
//!
//! The normalizer is pure apart from the injected resolver: it performs
//! no I/O of its own, never logs, never retries, and any failure aborts
//! the whole attempt — partial results never escape.

pub mod constraints;
pub mod error;
pub mod path;
pub mod payload;
pub mod target;
pub mod typed;

// Re-export key types
pub use constraints::{
    build_constraints, resolve_constraints, OneOrMany, RawConstraints, RawOrderBy, RawTypedField,
    RawWhere,
};
pub use error::{ConstraintKind, NormalizeError, Result};
pub use path::lookup_path;
pub use payload::expand_payload;
pub use target::{build_read_query, build_write_query, RawTarget};
pub use typed::{evaluate_property, PropertyResolver, ResolveError, StaticResolver, TypeTag};
