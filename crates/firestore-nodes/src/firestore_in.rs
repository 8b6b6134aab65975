//! Firestore In node
//!
//! Subscribes to a document query and emits a message for every
//! snapshot the database delivers, optionally filtered by change type.
//! Nodes with an input wire run in dynamic mode: the subscription is
//! (re)configured by incoming messages, and a `filter: "reset"` message
//! detaches it.
//!
//! # Inputs (from context)
//! - `{task_id}.input.message` (optional) - Dynamic (re)configuration;
//!   may carry a `constraints` override and a `filter` field
//!
//! # Outputs
//! - Snapshot messages are pushed through the node's [`MessageSender`]
//! - `{task_id}.output.message` - The passed-through incoming message,
//!   when pass-through is configured

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use serde_json::Value;
use tokio::sync::Mutex;

use fireflow_client_contracts::{
    ClientError, CompanionGate, DocumentChangeType, DocumentClient, ErrorHandler, SnapshotHandler,
    Subscription,
};
use fireflow_node_contracts::{
    ContextKeys, ExecutionMode, NodeCategory, NodeStatus, PortDataType, PortMetadata, StatusSink,
    TaskDescriptor, TaskMetadata,
};
use fireflow_query::PropertyResolver;

use crate::config::{ChangeFilter, InNodeConfig};
use crate::error::{NodeError, Result};
use crate::message::FlowMessage;
use crate::request::{FlowRequest, SubscribeRequest};
use crate::status::StatusController;

/// Callback the node pushes snapshot messages through
pub type MessageSender = Arc<dyn Fn(Value) + Send + Sync>;

/// How a (re)configuration resolved the change filter
enum ResolvedFilter {
    /// Config defers to the message and none arrived yet
    Deferred,
    /// Subscribe, forwarding changes matching the filter
    Apply(Option<DocumentChangeType>),
}

/// Firestore In node
pub struct FirestoreInTask {
    /// Unique identifier for this node instance
    task_id: String,
    config: InNodeConfig,
    client: Arc<dyn DocumentClient>,
    resolver: Arc<dyn PropertyResolver>,
    gate: Arc<CompanionGate>,
    status: Arc<StatusController>,
    sender: MessageSender,
    /// The one live subscription; a new subscribe replaces it
    subscription: Mutex<Option<Subscription>>,
}

impl FirestoreInTask {
    /// Port ID for the message input and pass-through output
    pub const PORT_MESSAGE: &'static str = "message";

    /// Create a new listener node
    pub fn new(
        task_id: impl Into<String>,
        config: InNodeConfig,
        client: Arc<dyn DocumentClient>,
        resolver: Arc<dyn PropertyResolver>,
        sender: MessageSender,
    ) -> Self {
        let task_id = task_id.into();
        Self {
            status: Arc::new(StatusController::new(task_id.clone())),
            task_id,
            config,
            client,
            resolver,
            gate: Arc::new(CompanionGate::assume_satisfied()),
            sender,
            subscription: Mutex::new(None),
        }
    }

    /// Gate the node behind the companion version capability
    pub fn with_gate(mut self, gate: Arc<CompanionGate>) -> Self {
        if !gate.is_satisfied() {
            log::error!(
                "{}: companion config node version not satisfied, node stays inactive",
                self.task_id
            );
        }
        self.gate = gate;
        self
    }

    /// Report status changes to the given sink
    pub fn with_status_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.status = Arc::new(StatusController::with_sink(self.task_id.clone(), sink));
        self
    }

    /// Get the task ID
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// (Re)configure the subscription.
    ///
    /// Called with no message at startup (static configuration) and
    /// with a message for every dynamic reconfiguration. Returns the
    /// message to pass through, if any.
    pub async fn subscribe(&self, msg: Option<&FlowMessage>) -> Result<Option<Value>> {
        if !self.gate.is_satisfied() {
            self.status.set(NodeStatus::InvalidDatabaseVersion);
            return Ok(None);
        }

        let pass_through = match (self.config.pass_through, msg) {
            (true, Some(message)) => Some(message.as_value().clone()),
            _ => None,
        };

        // A reset message detaches the listener and passes through
        if let Some(message) = msg {
            if message.filter() == Some("reset") {
                self.unsubscribe().await;
                self.status.set(NodeStatus::Unsubscribed);
                return Ok(pass_through);
            }
        }

        self.status.set(NodeStatus::Waiting);

        let filter = match self.resolve_filter(msg)? {
            ResolvedFilter::Deferred => return Ok(None),
            ResolvedFilter::Apply(filter) => filter,
        };

        // Dynamic nodes skip the startup subscription and await a message
        if self.config.is_dynamic() && msg.is_none() {
            return Ok(None);
        }

        let request = SubscribeRequest::build(&self.config, filter, msg, self.resolver.as_ref())
            .await?;

        if !self.client.signed_in().await {
            return Ok(None);
        }

        log::debug!(
            "{}: {}",
            self.task_id,
            FlowRequest::Subscribe(request.clone()).describe()
        );

        self.unsubscribe().await;

        let status = Arc::clone(&self.status);
        let sender = Arc::clone(&self.sender);
        let task_id = self.task_id.clone();
        let on_snapshot: SnapshotHandler = Box::new(move |snapshot| {
            let snapshot = SubscribeRequest::apply_filter(snapshot, filter);
            status.on_delivery();
            match serde_json::to_value(&snapshot) {
                Ok(payload) => sender(FlowMessage::outgoing(None, payload)),
                Err(error) => {
                    log::error!("{}: snapshot serialization failed: {}", task_id, error)
                }
            }
        });

        let error_status = Arc::clone(&self.status);
        let error_task_id = self.task_id.clone();
        let on_error: ErrorHandler = Box::new(move |error: ClientError| {
            log::error!("{}: subscription error: {}", error_task_id, error);
            error_status.report_error(&NodeError::from(error));
        });

        let subscription = self
            .client
            .subscribe(request.query.clone(), on_snapshot, on_error)?;
        *self.subscription.lock().await = Some(subscription);

        self.status
            .set_timed(NodeStatus::Subscribed, Duration::from_secs(2));

        Ok(pass_through)
    }

    /// Detach the live subscription, if any
    pub async fn unsubscribe(&self) {
        if let Some(subscription) = self.subscription.lock().await.take() {
            subscription.unsubscribe();
        }
    }

    /// Detach and clear status; called when the node shuts down
    pub async fn close(&self) {
        self.unsubscribe().await;
        self.status.clear();
    }

    fn resolve_filter(&self, msg: Option<&FlowMessage>) -> Result<ResolvedFilter> {
        let filter = match self.config.filter {
            ChangeFilter::Added => return Ok(ResolvedFilter::Apply(Some(DocumentChangeType::Added))),
            ChangeFilter::Modified => {
                return Ok(ResolvedFilter::Apply(Some(DocumentChangeType::Modified)))
            }
            ChangeFilter::Removed => {
                return Ok(ResolvedFilter::Apply(Some(DocumentChangeType::Removed)))
            }
            ChangeFilter::None => return Ok(ResolvedFilter::Apply(None)),
            ChangeFilter::Msg => match msg {
                // Dynamic filter: skip the static subscription
                None => return Ok(ResolvedFilter::Deferred),
                Some(message) => message
                    .filter()
                    .ok_or_else(|| NodeError::UnknownChangeFilter("undefined".to_string()))?,
            },
        };

        match filter {
            "none" => Ok(ResolvedFilter::Apply(None)),
            other => other
                .parse::<DocumentChangeType>()
                .map(|change_type| ResolvedFilter::Apply(Some(change_type)))
                .map_err(|err| NodeError::UnknownChangeFilter(err.value)),
        }
    }
}

impl TaskDescriptor for FirestoreInTask {
    fn descriptor() -> TaskMetadata {
        TaskMetadata {
            node_type: "firestore-in".to_string(),
            category: NodeCategory::Input,
            label: "Firestore In".to_string(),
            description: "Subscribes to a document query and emits every change".to_string(),
            inputs: vec![PortMetadata::optional(
                Self::PORT_MESSAGE,
                "Message",
                PortDataType::Message,
            )],
            outputs: vec![PortMetadata::optional(
                Self::PORT_MESSAGE,
                "Message",
                PortDataType::Message,
            )],
            execution_mode: ExecutionMode::Push,
        }
    }
}

inventory::submit!(fireflow_node_contracts::DescriptorFn(
    FirestoreInTask::descriptor
));

#[async_trait]
impl Task for FirestoreInTask {
    fn id(&self) -> &str {
        &self.task_id
    }

    async fn run(&self, context: Context) -> graph_flow::Result<TaskResult> {
        let msg_key = ContextKeys::input(&self.task_id, Self::PORT_MESSAGE);
        let msg = context.get::<Value>(&msg_key).await.map(FlowMessage::new);

        match self.subscribe(msg.as_ref()).await {
            Ok(pass_through) => {
                if let Some(pass_through) = pass_through {
                    let out_key = ContextKeys::output(&self.task_id, Self::PORT_MESSAGE);
                    context.set(&out_key, pass_through).await;
                }
                Ok(TaskResult::new(
                    Some("subscription updated".to_string()),
                    NextAction::Continue,
                ))
            }
            Err(error) => {
                self.status.report_error(&error);
                Err(GraphError::TaskExecutionFailed(error.to_string()))
            }
        }
    }
}
