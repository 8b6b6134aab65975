//! Node status reporting
//!
//! Nodes report their lifecycle state (querying, subscribed, permission
//! denied, ...) to the host through a [`StatusSink`]. The sink abstracts
//! over the transport (UI channel, log, test buffer) so nodes stay
//! decoupled from how the host renders status.

use serde::{Deserialize, Serialize};

/// Status badge fill color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFill {
    Red,
    Blue,
    Grey,
}

/// Status badge shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusShape {
    Dot,
    Ring,
}

/// Lifecycle state a node reports to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum NodeStatus {
    /// No activity; clears any previous badge
    Idle,
    /// A query is in flight
    Querying,
    /// The last query completed
    QueryDone,
    /// Waiting for a message to start a subscription
    Waiting,
    /// A subscription is live
    Subscribed,
    /// The subscription was detached
    Unsubscribed,
    /// The database denied the read/write (rules)
    PermissionDenied,
    /// The companion database node does not satisfy the required version
    InvalidDatabaseVersion,
    /// The configured database is missing or disabled
    DatabaseNotReady,
    /// Any other failure
    Error,
}

impl NodeStatus {
    /// Badge rendering for this state, `None` when the badge clears
    pub fn badge(&self) -> Option<(StatusFill, StatusShape, &'static str)> {
        match self {
            NodeStatus::Idle => None,
            NodeStatus::Querying => Some((StatusFill::Blue, StatusShape::Dot, "Querying...")),
            NodeStatus::QueryDone => Some((StatusFill::Blue, StatusShape::Dot, "Query Done!")),
            NodeStatus::Waiting => Some((
                StatusFill::Blue,
                StatusShape::Ring,
                "Waiting for Subscription...",
            )),
            NodeStatus::Subscribed => Some((StatusFill::Blue, StatusShape::Dot, "Subscribed")),
            NodeStatus::Unsubscribed => Some((StatusFill::Blue, StatusShape::Dot, "Unsubscribed")),
            NodeStatus::PermissionDenied => {
                Some((StatusFill::Red, StatusShape::Ring, "Permission Denied!"))
            }
            NodeStatus::InvalidDatabaseVersion => {
                Some((StatusFill::Red, StatusShape::Ring, "Invalid Database Version!"))
            }
            NodeStatus::DatabaseNotReady => {
                Some((StatusFill::Red, StatusShape::Ring, "Database not ready!"))
            }
            NodeStatus::Error => Some((StatusFill::Red, StatusShape::Dot, "Error")),
        }
    }
}

/// Trait for receiving node status updates
pub trait StatusSink: Send + Sync {
    /// Report a status change for the given node
    fn report(&self, node_id: &str, status: NodeStatus);
}

/// A sink that forwards status changes to the `log` facade.
///
/// Useful for headless hosts and tests that only need visibility.
pub struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn report(&self, node_id: &str, status: NodeStatus) {
        match status.badge() {
            Some((fill, _, text)) => {
                log::debug!("node {} status: {} ({:?})", node_id, text, fill)
            }
            None => log::debug!("node {} status cleared", node_id),
        }
    }
}
