//! Fireflow Node Contracts
//!
//! Contracts shared between Fireflow palette nodes and the host workflow
//! runtime:
//!
//! - Node descriptors and port metadata ([`TaskDescriptor`], [`TaskMetadata`])
//! - A palette registry with link-time descriptor collection ([`NodeRegistry`])
//! - Context-key conventions for message exchange ([`ContextKeys`])
//! - Status reporting ([`NodeStatus`], [`StatusSink`])
//!
//! The graph execution engine itself is an external collaborator; this
//! crate only defines how nodes describe themselves to it.

pub mod descriptor;
pub mod error;
pub mod registry;
pub mod status;
pub mod types;

// Re-export key types
pub use descriptor::{PortMetadata, TaskDescriptor, TaskMetadata};
pub use error::{PaletteError, Result};
pub use registry::{DescriptorFn, NodeRegistry};
pub use status::{LogStatusSink, NodeStatus, StatusFill, StatusShape, StatusSink};
pub use types::{ContextKeys, ExecutionMode, NodeCategory, NodeId, PortDataType, PortId};
