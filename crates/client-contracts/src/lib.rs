//! Fireflow Client Contracts
//!
//! The boundary between the Fireflow palette and the document-database
//! client it drives:
//!
//! - Query shapes ([`QueryConfig`], [`QueryConstraints`], [`QueryMethod`],
//!   [`SetOptions`])
//! - Snapshot shapes ([`DataSnapshot`], [`DocumentChange`])
//! - The [`DocumentClient`] trait and [`Subscription`] handle
//! - The [`FieldValueFactory`] directive factory
//! - The companion version gate ([`CompanionGate`])
//! - A [`MockClient`] test double
//!
//! The real client (connection, auth, transport, snapshot delivery) is
//! an external collaborator implementing these contracts.

pub mod client;
pub mod error;
pub mod field_value;
pub mod mock;
pub mod query;
pub mod snapshot;
pub mod version;

// Re-export key types
pub use client::{DocumentClient, ErrorHandler, SnapshotHandler, Subscription};
pub use error::{ClientError, UnknownVariant};
pub use field_value::{FieldValueFactory, SentinelFieldValues, FIELD_VALUE_TAG};
pub use mock::{MockClient, RecordedWrite};
pub use query::{
    Direction, OrderByClause, QueryConfig, QueryConstraints, QueryMethod, SetOptions, WhereClause,
    WhereFilter,
};
pub use snapshot::{DataSnapshot, DocumentChange, DocumentChangeType};
pub use version::{CompanionGate, CompanionVersion, REQUIRED_COMPANION_VERSION};
