//! Firestore Get node
//!
//! Runs a one-shot query against the document database whenever a
//! message arrives, and emits the resulting snapshot as the outgoing
//! payload.
//!
//! # Inputs (from context)
//! - `{task_id}.input.message` (required) - The triggering flow message;
//!   may carry a `constraints` override used verbatim
//!
//! # Outputs (to context)
//! - `{task_id}.output.message` - The snapshot message (the incoming
//!   message is passed through when the node is configured to)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use serde_json::Value;

use fireflow_client_contracts::{CompanionGate, DataSnapshot, DocumentClient};
use fireflow_node_contracts::{
    ContextKeys, ExecutionMode, NodeCategory, NodeStatus, PortDataType, PortMetadata, StatusSink,
    TaskDescriptor, TaskMetadata,
};
use fireflow_query::PropertyResolver;

use crate::config::GetNodeConfig;
use crate::error::Result;
use crate::message::FlowMessage;
use crate::request::{FlowRequest, ReadRequest};
use crate::status::StatusController;

/// Firestore Get node
pub struct FirestoreGetTask {
    /// Unique identifier for this node instance
    task_id: String,
    config: GetNodeConfig,
    client: Arc<dyn DocumentClient>,
    resolver: Arc<dyn PropertyResolver>,
    gate: Arc<CompanionGate>,
    status: Arc<StatusController>,
}

impl FirestoreGetTask {
    /// Port ID for the message input and output
    pub const PORT_MESSAGE: &'static str = "message";

    /// Create a new get node
    pub fn new(
        task_id: impl Into<String>,
        config: GetNodeConfig,
        client: Arc<dyn DocumentClient>,
        resolver: Arc<dyn PropertyResolver>,
    ) -> Self {
        let task_id = task_id.into();
        Self {
            status: Arc::new(StatusController::new(task_id.clone())),
            task_id,
            config,
            client,
            resolver,
            gate: Arc::new(CompanionGate::assume_satisfied()),
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

    /// Build and run the query; `None` when the client is signed out
    async fn query(&self, msg: Option<&FlowMessage>) -> Result<Option<DataSnapshot>> {
        let request = ReadRequest::build(&self.config, msg, self.resolver.as_ref()).await?;

        if !self.client.signed_in().await {
            return Ok(None);
        }

        log::debug!(
            "{}: {}",
            self.task_id,
            FlowRequest::Read(request.clone()).describe()
        );
        let snapshot = request.run(self.client.as_ref()).await?;
        Ok(Some(snapshot))
    }
}

impl TaskDescriptor for FirestoreGetTask {
    fn descriptor() -> TaskMetadata {
        TaskMetadata {
            node_type: "firestore-get".to_string(),
            category: NodeCategory::Storage,
            label: "Firestore Get".to_string(),
            description: "Runs a one-shot query against a document database".to_string(),
            inputs: vec![PortMetadata::required(
                Self::PORT_MESSAGE,
                "Message",
                PortDataType::Message,
            )],
            outputs: vec![PortMetadata::optional(
                Self::PORT_MESSAGE,
                "Message",
                PortDataType::Message,
            )],
            execution_mode: ExecutionMode::Reactive,
        }
    }
}

inventory::submit!(fireflow_node_contracts::DescriptorFn(
    FirestoreGetTask::descriptor
));

#[async_trait]
impl Task for FirestoreGetTask {
    fn id(&self) -> &str {
        &self.task_id
    }

    async fn run(&self, context: Context) -> graph_flow::Result<TaskResult> {
        let msg_key = ContextKeys::input(&self.task_id, Self::PORT_MESSAGE);
        let msg = context.get::<Value>(&msg_key).await.map(FlowMessage::new);

        if !self.gate.is_satisfied() {
            self.status.set(NodeStatus::InvalidDatabaseVersion);
            return Ok(TaskResult::new(
                Some("database not ready".to_string()),
                NextAction::Continue,
            ));
        }

        self.status.set(NodeStatus::Querying);

        match self.query(msg.as_ref()).await {
            Ok(Some(snapshot)) => {
                self.status.on_delivery();

                let payload = serde_json::to_value(&snapshot).map_err(|e| {
                    GraphError::TaskExecutionFailed(format!(
                        "snapshot serialization failed: {}",
                        e
                    ))
                })?;
                let base = if self.config.pass_through {
                    msg.as_ref()
                } else {
                    None
                };
                let outgoing = FlowMessage::outgoing(base, payload);

                let out_key = ContextKeys::output(&self.task_id, Self::PORT_MESSAGE);
                context.set(&out_key, outgoing).await;

                self.status
                    .set_timed(NodeStatus::QueryDone, Duration::from_millis(500));

                Ok(TaskResult::new(
                    Some(format!("{} document(s)", snapshot.size)),
                    NextAction::Continue,
                ))
            }
            // Signed-out client: finish silently, no message is emitted
            Ok(None) => {
                self.status.clear();
                Ok(TaskResult::new(None, NextAction::Continue))
            }
            Err(error) => {
                self.status.report_error(&error);
                Err(GraphError::TaskExecutionFailed(error.to_string()))
            }
        }
    }
}
