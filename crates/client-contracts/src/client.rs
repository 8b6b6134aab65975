//! The document-database client trait
//!
//! Fireflow nodes drive a [`DocumentClient`] and never a concrete SDK.
//! The real implementation (connection, auth, snapshot delivery) is an
//! external collaborator; the palette ships only this contract and a
//! mock for tests.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::ClientError;
use crate::field_value::FieldValueFactory;
use crate::query::{QueryConfig, QueryMethod, SetOptions};
use crate::snapshot::DataSnapshot;

/// Callback invoked with every snapshot delivered to a subscription
pub type SnapshotHandler = Box<dyn Fn(DataSnapshot) + Send + Sync>;

/// Callback invoked when a subscription fails
pub type ErrorHandler = Box<dyn Fn(ClientError) + Send + Sync>;

/// Handle to a live subscription
///
/// Call [`Subscription::unsubscribe`] to detach the listener. Dropping
/// the handle without unsubscribing leaves the listener attached, like
/// the underlying SDKs do.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a cancellation closure
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Detach the listener
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Client-shaped interface the palette consumes
#[async_trait]
pub trait DocumentClient: Send + Sync {
    /// Run a one-shot query
    async fn get(&self, query: &QueryConfig) -> Result<DataSnapshot, ClientError>;

    /// Apply a mutation
    async fn modify(
        &self,
        method: QueryMethod,
        query: &QueryConfig,
        payload: Option<Map<String, Value>>,
        options: Option<SetOptions>,
    ) -> Result<(), ClientError>;

    /// Attach a snapshot listener
    fn subscribe(
        &self,
        query: QueryConfig,
        on_snapshot: SnapshotHandler,
        on_error: ErrorHandler,
    ) -> Result<Subscription, ClientError>;

    /// Whether the client currently holds a signed-in session
    async fn signed_in(&self) -> bool;

    /// The directive factory matching this client's encoding
    fn field_values(&self) -> Arc<dyn FieldValueFactory>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_unsubscribe_runs_cancel_once() {
        static CANCELLED: AtomicBool = AtomicBool::new(false);
        let subscription = Subscription::new(|| CANCELLED.store(true, Ordering::SeqCst));
        subscription.unsubscribe();
        assert!(CANCELLED.load(Ordering::SeqCst));
    }
}
