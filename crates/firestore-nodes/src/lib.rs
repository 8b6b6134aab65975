//! Fireflow Firestore Nodes
//!
//! Document-database flow nodes for the Fireflow palette:
//!
//! - **firestore-get**: one-shot query, triggered by messages
//! - **firestore-in**: live subscription pushing snapshot messages
//! - **firestore-out**: `set`/`update`/`delete` mutations
//!
//! Every node operation normalizes into a [`FlowRequest`] — the typed
//! query or write the database client consumes — through the
//! `fireflow-query` normalizer. The client itself and the workflow
//! runtime are external collaborators injected at construction.

pub mod config;
pub mod error;
pub mod firestore_get;
pub mod firestore_in;
pub mod firestore_out;
pub mod message;
pub mod request;
pub mod status;

// Re-export the node types and their building blocks
pub use config::{ChangeFilter, GetNodeConfig, InNodeConfig, MethodSelector, OutNodeConfig};
pub use error::{NodeError, Result};
pub use firestore_get::FirestoreGetTask;
pub use firestore_in::{FirestoreInTask, MessageSender};
pub use firestore_out::FirestoreOutTask;
pub use message::FlowMessage;
pub use request::{FlowRequest, ReadRequest, SubscribeRequest, WriteRequest};
pub use status::StatusController;
