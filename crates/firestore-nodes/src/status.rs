//! Node status lifecycle
//!
//! Wraps a [`StatusSink`] with the transitions the Firestore nodes
//! share: transient states reset to idle after a delay, and a rules
//! denial stays sticky until the next successful delivery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use fireflow_node_contracts::{NodeStatus, StatusSink};

use crate::error::NodeError;

/// Per-node status state machine
pub struct StatusController {
    node_id: String,
    sink: Option<Arc<dyn StatusSink>>,
    permission_denied: Arc<AtomicBool>,
    reset_task: Mutex<Option<JoinHandle<()>>>,
}

impl StatusController {
    /// A controller without a sink (status changes are dropped)
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            sink: None,
            permission_denied: Arc::new(AtomicBool::new(false)),
            reset_task: Mutex::new(None),
        }
    }

    /// A controller reporting to the given sink
    pub fn with_sink(node_id: impl Into<String>, sink: Arc<dyn StatusSink>) -> Self {
        Self {
            sink: Some(sink),
            ..Self::new(node_id)
        }
    }

    /// Report a status, cancelling any pending timed reset
    pub fn set(&self, status: NodeStatus) {
        self.cancel_reset();
        self.emit(status);
    }

    /// Report a status, then fall back to the base status after `delay`.
    ///
    /// Needs a tokio runtime; without one the status simply stays.
    pub fn set_timed(&self, status: NodeStatus, delay: Duration) {
        self.cancel_reset();
        self.emit(status);

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let sink = self.sink.clone();
            let node_id = self.node_id.clone();
            let permission_denied = Arc::clone(&self.permission_denied);
            let task = handle.spawn(async move {
                tokio::time::sleep(delay).await;
                let base = base_status(&permission_denied);
                if let Some(sink) = sink {
                    sink.report(&node_id, base);
                }
            });
            if let Ok(mut reset) = self.reset_task.lock() {
                *reset = Some(task);
            }
        }
    }

    /// Report the base status (idle, or the sticky permission denial)
    pub fn clear(&self) {
        self.set(base_status(&self.permission_denied));
    }

    /// Record a failure: rules denials become sticky, everything else
    /// shows as a transient error
    pub fn report_error(&self, error: &NodeError) {
        if error.is_permission_denied() {
            self.permission_denied.store(true, Ordering::SeqCst);
            self.set(NodeStatus::PermissionDenied);
        } else {
            self.set_timed(NodeStatus::Error, Duration::from_secs(5));
        }
    }

    /// A successful delivery clears a sticky permission denial
    pub fn on_delivery(&self) {
        if self.permission_denied.swap(false, Ordering::SeqCst) {
            self.set(NodeStatus::Idle);
        }
    }

    fn emit(&self, status: NodeStatus) {
        if let Some(sink) = &self.sink {
            sink.report(&self.node_id, status);
        }
    }

    fn cancel_reset(&self) {
        if let Ok(mut reset) = self.reset_task.lock() {
            if let Some(task) = reset.take() {
                task.abort();
            }
        }
    }
}

fn base_status(permission_denied: &AtomicBool) -> NodeStatus {
    if permission_denied.load(Ordering::SeqCst) {
        NodeStatus::PermissionDenied
    } else {
        NodeStatus::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fireflow_client_contracts::ClientError;
    use std::sync::mpsc;

    struct ChannelSink(Mutex<mpsc::Sender<NodeStatus>>);

    impl StatusSink for ChannelSink {
        fn report(&self, _node_id: &str, status: NodeStatus) {
            if let Ok(tx) = self.0.lock() {
                tx.send(status).ok();
            }
        }
    }

    fn controller() -> (StatusController, mpsc::Receiver<NodeStatus>) {
        let (tx, rx) = mpsc::channel();
        let controller =
            StatusController::with_sink("node-1", Arc::new(ChannelSink(Mutex::new(tx))));
        (controller, rx)
    }

    #[test]
    fn test_set_reports_to_sink() {
        let (controller, rx) = controller();
        controller.set(NodeStatus::Querying);
        assert_eq!(rx.try_recv().unwrap(), NodeStatus::Querying);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_status_resets_to_idle() {
        let (controller, rx) = controller();
        controller.set_timed(NodeStatus::QueryDone, Duration::from_millis(500));
        assert_eq!(rx.try_recv().unwrap(), NodeStatus::QueryDone);

        tokio::time::sleep(Duration::from_millis(600)).await;
        tokio::task::yield_now().await;
        assert_eq!(rx.try_recv().unwrap(), NodeStatus::Idle);
    }

    #[tokio::test]
    async fn test_permission_denied_is_sticky_until_delivery() {
        let (controller, rx) = controller();
        controller.report_error(&NodeError::from(ClientError::PermissionDenied));
        assert_eq!(rx.try_recv().unwrap(), NodeStatus::PermissionDenied);

        // clear() keeps showing the denial
        controller.clear();
        assert_eq!(rx.try_recv().unwrap(), NodeStatus::PermissionDenied);

        // a successful delivery resets it
        controller.on_delivery();
        assert_eq!(rx.try_recv().unwrap(), NodeStatus::Idle);
        controller.clear();
        assert_eq!(rx.try_recv().unwrap(), NodeStatus::Idle);
    }

    #[tokio::test]
    async fn test_other_errors_are_transient() {
        let (controller, rx) = controller();
        controller.report_error(&NodeError::from(ClientError::Backend("boom".to_string())));
        assert_eq!(rx.try_recv().unwrap(), NodeStatus::Error);

        controller.on_delivery();
        // not sticky: on_delivery has nothing to clear
        assert!(rx.try_recv().is_err());
    }
}
