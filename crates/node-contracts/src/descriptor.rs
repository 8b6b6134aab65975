//! Node descriptor trait and metadata types
//!
//! This module provides the `TaskDescriptor` trait that allows palette
//! nodes to self-describe their metadata (ports, category, label, etc.).
//!
//! The node implementation defines both its behavior AND its metadata,
//! so there is a single source of truth for what the palette exposes.

use serde::{Deserialize, Serialize};

use crate::types::{ExecutionMode, NodeCategory, PortDataType};

/// Trait for nodes that can describe their metadata
///
/// Implementing this trait allows a node to provide its metadata for
/// palette listing and connection validation without a separate
/// registry definition.
pub trait TaskDescriptor {
    /// Get the static metadata for this node type
    fn descriptor() -> TaskMetadata
    where
        Self: Sized;
}

/// Complete metadata for a node type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetadata {
    /// Unique type identifier (e.g., "firestore-get")
    pub node_type: String,
    /// Category for palette grouping
    pub category: NodeCategory,
    /// Human-readable label
    pub label: String,
    /// Description of what the node does
    pub description: String,
    /// Input port definitions
    pub inputs: Vec<PortMetadata>,
    /// Output port definitions
    pub outputs: Vec<PortMetadata>,
    /// Execution mode
    pub execution_mode: ExecutionMode,
}

/// Metadata for a port (input or output)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMetadata {
    /// Port identifier (used in context keys)
    pub id: String,
    /// Human-readable label
    pub label: String,
    /// Data type
    pub data_type: PortDataType,
    /// Whether this input is required
    pub required: bool,
    /// Whether multiple connections are allowed
    pub multiple: bool,
}

impl PortMetadata {
    /// Create a new port metadata
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        data_type: PortDataType,
        required: bool,
        multiple: bool,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            data_type,
            required,
            multiple,
        }
    }

    /// Create a required port
    pub fn required(
        id: impl Into<String>,
        label: impl Into<String>,
        data_type: PortDataType,
    ) -> Self {
        Self::new(id, label, data_type, true, false)
    }

    /// Create an optional port
    pub fn optional(
        id: impl Into<String>,
        label: impl Into<String>,
        data_type: PortDataType,
    ) -> Self {
        Self::new(id, label, data_type, false, false)
    }

    /// Set this port to accept multiple connections
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_metadata_required() {
        let port = PortMetadata::required("message", "Message", PortDataType::Message);
        assert_eq!(port.id, "message");
        assert_eq!(port.label, "Message");
        assert!(port.required);
        assert!(!port.multiple);
    }

    #[test]
    fn test_port_metadata_optional() {
        let port = PortMetadata::optional("message", "Message", PortDataType::Message);
        assert!(!port.required);
        assert!(!port.multiple);
    }

    #[test]
    fn test_task_metadata_serialization() {
        let metadata = TaskMetadata {
            node_type: "firestore-get".to_string(),
            category: NodeCategory::Storage,
            label: "Firestore Get".to_string(),
            description: "Runs a one-shot document query".to_string(),
            inputs: vec![PortMetadata::required(
                "message",
                "Message",
                PortDataType::Message,
            )],
            outputs: vec![PortMetadata::optional(
                "message",
                "Message",
                PortDataType::Message,
            )],
            execution_mode: ExecutionMode::Reactive,
        };

        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.contains("firestore-get"));
        assert!(json.contains("nodeType")); // camelCase
        assert!(json.contains("\"storage\""));
    }
}
