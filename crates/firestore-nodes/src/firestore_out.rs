//! Firestore Out node
//!
//! Applies a `set`, `update` or `delete` mutation for every incoming
//! message. The write payload is expanded for reserved keywords before
//! it reaches the client; the method and merge options come from the
//! node configuration or the message.
//!
//! # Inputs (from context)
//! - `{task_id}.input.message` (required) - The message carrying the
//!   write `payload` and, when configured so, `method` and `options`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use serde_json::Value;

use fireflow_client_contracts::{CompanionGate, DocumentClient};
use fireflow_node_contracts::{
    ContextKeys, ExecutionMode, NodeCategory, NodeStatus, PortDataType, PortMetadata, StatusSink,
    TaskDescriptor, TaskMetadata,
};
use fireflow_query::PropertyResolver;

use crate::config::OutNodeConfig;
use crate::error::Result;
use crate::message::FlowMessage;
use crate::request::{FlowRequest, WriteRequest};
use crate::status::StatusController;

/// Firestore Out node
pub struct FirestoreOutTask {
    /// Unique identifier for this node instance
    task_id: String,
    config: OutNodeConfig,
    client: Arc<dyn DocumentClient>,
    resolver: Arc<dyn PropertyResolver>,
    gate: Arc<CompanionGate>,
    status: Arc<StatusController>,
}

impl FirestoreOutTask {
    /// Port ID for the message input
    pub const PORT_MESSAGE: &'static str = "message";

    /// Create a new write node
    pub fn new(
        task_id: impl Into<String>,
        config: OutNodeConfig,
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

    /// Normalize and apply the mutation; `None` when the client is
    /// signed out
    async fn modify(&self, msg: &FlowMessage) -> Result<Option<String>> {
        let request = WriteRequest::build(
            &self.config,
            msg,
            self.resolver.as_ref(),
            self.client.field_values().as_ref(),
        )
        .await?;

        if !self.client.signed_in().await {
            return Ok(None);
        }

        let summary = FlowRequest::Write(request.clone()).describe();
        log::debug!("{}: {}", self.task_id, summary);

        request.run(self.client.as_ref()).await?;
        Ok(Some(summary))
    }
}

impl TaskDescriptor for FirestoreOutTask {
    fn descriptor() -> TaskMetadata {
        TaskMetadata {
            node_type: "firestore-out".to_string(),
            category: NodeCategory::Storage,
            label: "Firestore Out".to_string(),
            description: "Sets, updates or deletes documents in a document database".to_string(),
            inputs: vec![PortMetadata::required(
                Self::PORT_MESSAGE,
                "Message",
                PortDataType::Message,
            )],
            outputs: vec![],
            execution_mode: ExecutionMode::Reactive,
        }
    }
}

inventory::submit!(fireflow_node_contracts::DescriptorFn(
    FirestoreOutTask::descriptor
));

#[async_trait]
impl Task for FirestoreOutTask {
    fn id(&self) -> &str {
        &self.task_id
    }

    async fn run(&self, context: Context) -> graph_flow::Result<TaskResult> {
        let msg_key = ContextKeys::input(&self.task_id, Self::PORT_MESSAGE);
        let msg: Value = context.get(&msg_key).await.ok_or_else(|| {
            GraphError::TaskExecutionFailed(format!(
                "Missing required input 'message' at key '{}'",
                msg_key
            ))
        })?;
        let msg = FlowMessage::new(msg);

        if !self.gate.is_satisfied() {
            self.status.set(NodeStatus::InvalidDatabaseVersion);
            return Ok(TaskResult::new(
                Some("database not ready".to_string()),
                NextAction::Continue,
            ));
        }

        self.status.set(NodeStatus::Querying);

        match self.modify(&msg).await {
            Ok(Some(summary)) => {
                self.status.on_delivery();
                self.status
                    .set_timed(NodeStatus::QueryDone, Duration::from_millis(500));
                Ok(TaskResult::new(Some(summary), NextAction::Continue))
            }
            // Signed-out client: finish silently, nothing is written
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

#[cfg(test)]
mod tests {
    use super::*;
    use fireflow_client_contracts::{MockClient, QueryMethod, FIELD_VALUE_TAG};
    use fireflow_query::StaticResolver;
    use serde_json::json;

    fn out_config(config: serde_json::Value) -> OutNodeConfig {
        serde_json::from_value(config).expect("valid out config")
    }

    fn task(config: OutNodeConfig, client: Arc<MockClient>) -> FirestoreOutTask {
        FirestoreOutTask::new(
            "firestore-out-1",
            config,
            client,
            Arc::new(StaticResolver::new()),
        )
    }

    async fn run_with_msg(task: &FirestoreOutTask, msg: Value) -> graph_flow::Result<TaskResult> {
        let context = Context::new();
        let in_key = ContextKeys::input("firestore-out-1", "message");
        context.set(&in_key, msg).await;
        task.run(context).await
    }

    #[test]
    fn test_descriptor() {
        let meta = FirestoreOutTask::descriptor();
        assert_eq!(meta.node_type, "firestore-out");
        assert!(meta.outputs.is_empty());
        assert!(meta.inputs[0].required);
    }

    #[tokio::test]
    async fn test_set_write_with_expanded_payload() {
        let client = Arc::new(MockClient::new());
        let config = out_config(json!({
            "collection": "users",
            "document": "alice",
            "queryMethod": "set",
            "queryOptions": {"merge": true},
        }));

        run_with_msg(
            &task(config, Arc::clone(&client)),
            json!({"payload": {"age": "INCREMENT 1", "joined": "TIMESTAMP"}}),
        )
        .await
        .unwrap();

        let writes = client.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].method, QueryMethod::Set);
        assert_eq!(writes[0].query.document.as_deref(), Some("alice"));

        let payload = writes[0].payload.as_ref().unwrap();
        assert_eq!(payload["age"][FIELD_VALUE_TAG], "increment");
        assert_eq!(payload["joined"][FIELD_VALUE_TAG], "serverTimestamp");
        assert_eq!(writes[0].options.as_ref().unwrap().merge, Some(true));
    }

    #[tokio::test]
    async fn test_method_from_message() {
        let client = Arc::new(MockClient::new());
        let config = out_config(json!({
            "collection": "users",
            "document": "alice",
            "queryMethod": "msg",
        }));

        run_with_msg(
            &task(config, Arc::clone(&client)),
            json!({"method": "delete"}),
        )
        .await
        .unwrap();

        let writes = client.writes();
        assert_eq!(writes[0].method, QueryMethod::Delete);
        assert!(writes[0].payload.is_none());
    }

    #[tokio::test]
    async fn test_invalid_payload_shape_fails() {
        let client = Arc::new(MockClient::new());
        let config = out_config(json!({
            "collection": "users",
            "document": "alice",
            "queryMethod": "set",
        }));

        let result = run_with_msg(
            &task(config, Arc::clone(&client)),
            json!({"payload": [1, 2, 3]}),
        )
        .await;
        assert!(result.is_err());
        assert!(client.writes().is_empty());
    }

    #[tokio::test]
    async fn test_missing_message_input_fails() {
        let client = Arc::new(MockClient::new());
        let config = out_config(json!({"collection": "users", "queryMethod": "set"}));
        let task = task(config, client);

        assert!(task.run(Context::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_unsatisfied_gate_never_writes() {
        let client = Arc::new(MockClient::new());
        let config = out_config(json!({
            "collection": "users",
            "document": "alice",
            "queryMethod": "set",
        }));
        let task = task(config, Arc::clone(&client)).with_gate(Arc::new(CompanionGate::unsatisfied()));

        run_with_msg(&task, json!({"payload": {}})).await.unwrap();
        assert!(client.writes().is_empty());
    }

    #[tokio::test]
    async fn test_signed_out_finishes_silently() {
        let client = Arc::new(MockClient::new());
        client.set_signed_in(false);
        let config = out_config(json!({
            "collection": "users",
            "document": "alice",
            "queryMethod": "set",
        }));

        let result = run_with_msg(&task(config, Arc::clone(&client)), json!({"payload": {}}))
            .await
            .unwrap();
        assert!(matches!(result.next_action, NextAction::Continue));
        assert!(client.writes().is_empty());
    }
}
