//! In-memory test double for [`DocumentClient`]
//!
//! Serves a canned snapshot, records every mutation, and lets tests
//! push snapshots to live subscribers. Not a database: reads never
//! reflect writes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::client::{DocumentClient, ErrorHandler, SnapshotHandler, Subscription};
use crate::error::ClientError;
use crate::field_value::{FieldValueFactory, SentinelFieldValues};
use crate::query::{QueryConfig, QueryMethod, SetOptions};
use crate::snapshot::DataSnapshot;

/// A mutation captured by the mock
#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub method: QueryMethod,
    pub query: QueryConfig,
    pub payload: Option<Map<String, Value>>,
    pub options: Option<SetOptions>,
}

type SubscriberMap = Arc<Mutex<HashMap<Uuid, SnapshotHandler>>>;

/// Mock document client for palette tests
pub struct MockClient {
    snapshot: Mutex<DataSnapshot>,
    writes: Mutex<Vec<RecordedWrite>>,
    subscribers: SubscriberMap,
    signed_in: AtomicBool,
    failure: Mutex<Option<ClientError>>,
    last_query: Mutex<Option<QueryConfig>>,
    field_values: Arc<SentinelFieldValues>,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            snapshot: Mutex::new(DataSnapshot::empty()),
            writes: Mutex::new(Vec::new()),
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            signed_in: AtomicBool::new(true),
            failure: Mutex::new(None),
            last_query: Mutex::new(None),
            field_values: Arc::new(SentinelFieldValues),
        }
    }

    /// Serve the given snapshot from `get` and initial subscriptions
    pub fn with_snapshot(snapshot: DataSnapshot) -> Self {
        let client = Self::new();
        *client.snapshot.lock().expect("snapshot lock") = snapshot;
        client
    }

    /// Replace the canned snapshot
    pub fn set_snapshot(&self, snapshot: DataSnapshot) {
        *self.snapshot.lock().expect("snapshot lock") = snapshot;
    }

    /// Deliver a snapshot to every live subscriber
    pub fn push_snapshot(&self, snapshot: DataSnapshot) {
        let subscribers = self.subscribers.lock().expect("subscriber lock");
        for handler in subscribers.values() {
            handler(snapshot.clone());
        }
    }

    /// Every mutation recorded so far
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().expect("write lock").clone()
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().expect("subscriber lock").len()
    }

    /// The query most recently passed to `get` or `subscribe`
    pub fn last_query(&self) -> Option<QueryConfig> {
        self.last_query.lock().expect("query lock").clone()
    }

    /// Simulate a signed-out client
    pub fn set_signed_in(&self, signed_in: bool) {
        self.signed_in.store(signed_in, Ordering::SeqCst);
    }

    /// Make every subsequent `get`/`modify` fail with the given error
    pub fn fail_with(&self, error: ClientError) {
        *self.failure.lock().expect("failure lock") = Some(error);
    }

    /// Stop failing
    pub fn recover(&self) {
        *self.failure.lock().expect("failure lock") = None;
    }

    fn check_failure(&self) -> Result<(), ClientError> {
        match self.failure.lock().expect("failure lock").as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn record_query(&self, query: &QueryConfig) {
        *self.last_query.lock().expect("query lock") = Some(query.clone());
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentClient for MockClient {
    async fn get(&self, query: &QueryConfig) -> Result<DataSnapshot, ClientError> {
        self.check_failure()?;
        self.record_query(query);
        Ok(self.snapshot.lock().expect("snapshot lock").clone())
    }

    async fn modify(
        &self,
        method: QueryMethod,
        query: &QueryConfig,
        payload: Option<Map<String, Value>>,
        options: Option<SetOptions>,
    ) -> Result<(), ClientError> {
        self.check_failure()?;
        self.writes.lock().expect("write lock").push(RecordedWrite {
            method,
            query: query.clone(),
            payload,
            options,
        });
        Ok(())
    }

    fn subscribe(
        &self,
        query: QueryConfig,
        on_snapshot: SnapshotHandler,
        _on_error: ErrorHandler,
    ) -> Result<Subscription, ClientError> {
        self.record_query(&query);

        let id = Uuid::new_v4();
        let subscribers = Arc::clone(&self.subscribers);
        subscribers
            .lock()
            .expect("subscriber lock")
            .insert(id, on_snapshot);

        Ok(Subscription::new(move || {
            subscribers.lock().expect("subscriber lock").remove(&id);
        }))
    }

    async fn signed_in(&self) -> bool {
        self.signed_in.load(Ordering::SeqCst)
    }

    fn field_values(&self) -> Arc<dyn FieldValueFactory> {
        Arc::clone(&self.field_values) as Arc<dyn FieldValueFactory>
    }
}
