//! Static node configurations
//!
//! These are the shapes the editor persists for each node kind, with
//! target scope and constraints stored as typed references. The
//! back-compat `orderBy`/`where` single-or-sequence shape is handled by
//! the raw constraint types at deserialization time.

use serde::{Deserialize, Serialize};

use fireflow_client_contracts::{QueryMethod, SetOptions};
use fireflow_query::{RawConstraints, RawTarget};

/// Which document changes a subscription forwards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFilter {
    Added,
    Modified,
    Removed,
    /// Forward every change
    #[default]
    None,
    /// The incoming message chooses the filter
    Msg,
}

/// Where a write node takes its mutation method from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodSelector {
    Set,
    Update,
    Delete,
    /// The incoming message chooses the method
    #[default]
    Msg,
}

impl MethodSelector {
    /// The fixed method, when the selector does not defer to the message
    pub fn fixed(&self) -> Option<QueryMethod> {
        match self {
            MethodSelector::Set => Some(QueryMethod::Set),
            MethodSelector::Update => Some(QueryMethod::Update),
            MethodSelector::Delete => Some(QueryMethod::Delete),
            MethodSelector::Msg => None,
        }
    }
}

/// Configuration of the `firestore-get` node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetNodeConfig {
    /// Identifier of the companion database config node
    pub database: String,
    #[serde(flatten)]
    pub target: RawTarget,
    pub constraints: RawConstraints,
    /// Forward the incoming message alongside the snapshot payload
    pub pass_through: bool,
}

/// Configuration of the `firestore-in` node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InNodeConfig {
    /// Identifier of the companion database config node
    pub database: String,
    #[serde(flatten)]
    pub target: RawTarget,
    pub constraints: RawConstraints,
    pub filter: ChangeFilter,
    /// 1 when the node has an input wire, making its config dynamic
    pub inputs: u8,
    pub pass_through: bool,
}

impl InNodeConfig {
    /// Whether the node awaits messages to (re)configure its subscription
    pub fn is_dynamic(&self) -> bool {
        self.inputs == 1
    }
}

/// Configuration of the `firestore-out` node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutNodeConfig {
    /// Identifier of the companion database config node
    pub database: String,
    #[serde(flatten)]
    pub target: RawTarget,
    pub query_method: MethodSelector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_options: Option<SetOptions>,
}
