//! Core types shared between the palette and its host
//!
//! These types describe how Fireflow nodes present themselves to the
//! surrounding workflow runtime: port typing, palette categories and
//! the context-key conventions nodes use to exchange messages.

use serde::{Deserialize, Serialize};

/// Unique identifier for a node instance
pub type NodeId = String;

/// Unique identifier for a port
pub type PortId = String;

/// The data type of a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDataType {
    /// Accepts any type
    Any,
    /// Text string
    String,
    /// Numeric value
    Number,
    /// Boolean value
    Boolean,
    /// JSON object
    Json,
    /// A flow message (JSON envelope routed between nodes)
    Message,
    /// A database snapshot (documents plus changes)
    Snapshot,
    /// Reference to a database connection
    DatabaseHandle,
}

impl PortDataType {
    /// Check if this type can connect to another type
    pub fn is_compatible_with(&self, other: &PortDataType) -> bool {
        // Any type is compatible with everything
        if matches!(self, PortDataType::Any) || matches!(other, PortDataType::Any) {
            return true;
        }

        // A message is a JSON envelope, so the two interconnect
        if matches!(self, PortDataType::Message) && matches!(other, PortDataType::Json) {
            return true;
        }
        if matches!(self, PortDataType::Json) && matches!(other, PortDataType::Message) {
            return true;
        }

        // Exact type match
        self == other
    }
}

/// Category of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    /// Input nodes (listeners, external data sources)
    Input,
    /// Output nodes (display, export, etc.)
    Output,
    /// Processing nodes (transforms, filters)
    Processing,
    /// Storage nodes (file and database operations)
    Storage,
    /// Control flow nodes (conditionals, loops, etc.)
    Control,
}

/// Execution mode for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Execute once when inputs are available
    Batch,
    /// Execute reactively when inputs change
    Reactive,
    /// Emits messages on its own (listener nodes)
    Push,
}

/// Helper for building context keys
///
/// Nodes communicate through the shared runtime context, storing inputs
/// and outputs with well-defined key patterns:
///
/// - Inputs: `{task_id}.input.{port}`
/// - Outputs: `{task_id}.output.{port}`
/// - Metadata: `{task_id}.meta.{field}`
pub struct ContextKeys;

impl ContextKeys {
    /// Build an input key: `{task_id}.input.{port}`
    pub fn input(task_id: &str, port: &str) -> String {
        format!("{}.input.{}", task_id, port)
    }

    /// Build an output key: `{task_id}.output.{port}`
    pub fn output(task_id: &str, port: &str) -> String {
        format!("{}.output.{}", task_id, port)
    }

    /// Build a metadata key: `{task_id}.meta.{field}`
    pub fn meta(task_id: &str, field: &str) -> String {
        format!("{}.meta.{}", task_id, field)
    }
}
