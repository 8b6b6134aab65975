//! The request model
//!
//! Every node operation normalizes into one of three request variants —
//! read, subscribe, write — built from the node configuration plus the
//! incoming message, then dispatched against the database client by
//! pattern match. The closed set replaces runtime node-kind probing.

use serde_json::{Map, Value};

use fireflow_client_contracts::{
    DataSnapshot, DocumentChangeType, DocumentClient, FieldValueFactory, QueryConfig, QueryMethod,
    SetOptions,
};
use fireflow_query::{build_read_query, build_write_query, expand_payload, PropertyResolver};

use crate::config::{GetNodeConfig, InNodeConfig, OutNodeConfig};
use crate::error::{NodeError, Result};
use crate::message::FlowMessage;

/// A one-shot query
#[derive(Debug, Clone)]
pub struct ReadRequest {
    pub query: QueryConfig,
}

/// A snapshot listener registration
#[derive(Debug, Clone)]
pub struct SubscribeRequest {
    pub query: QueryConfig,
    /// Forward only changes of this type; `None` forwards everything
    pub filter: Option<DocumentChangeType>,
}

/// A mutation
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub method: QueryMethod,
    pub query: QueryConfig,
    pub payload: Option<Map<String, Value>>,
    pub options: Option<SetOptions>,
}

/// A normalized node operation
#[derive(Debug, Clone)]
pub enum FlowRequest {
    Read(ReadRequest),
    Subscribe(SubscribeRequest),
    Write(WriteRequest),
}

impl FlowRequest {
    /// The query this request submits
    pub fn query(&self) -> &QueryConfig {
        match self {
            FlowRequest::Read(request) => &request.query,
            FlowRequest::Subscribe(request) => &request.query,
            FlowRequest::Write(request) => &request.query,
        }
    }

    /// Short description for logs and task summaries
    pub fn describe(&self) -> String {
        let scope = |query: &QueryConfig| {
            query
                .collection_group
                .clone()
                .or_else(|| match (&query.collection, &query.document) {
                    (Some(collection), Some(document)) => {
                        Some(format!("{}/{}", collection, document))
                    }
                    (Some(collection), None) => Some(collection.clone()),
                    (None, Some(document)) => Some(document.clone()),
                    (None, None) => None,
                })
                .unwrap_or_else(|| "<unscoped>".to_string())
        };

        match self {
            FlowRequest::Read(request) => format!("get {}", scope(&request.query)),
            FlowRequest::Subscribe(request) => format!("subscribe {}", scope(&request.query)),
            FlowRequest::Write(request) => {
                format!("{} {}", request.method, scope(&request.query))
            }
        }
    }
}

impl ReadRequest {
    /// Normalize a get-node invocation.
    ///
    /// A `msg.constraints` override is used verbatim; otherwise the
    /// node's declared constraints are built.
    pub async fn build(
        config: &GetNodeConfig,
        msg: Option<&FlowMessage>,
        resolver: &dyn PropertyResolver,
    ) -> Result<Self> {
        let override_ = match msg {
            Some(message) => message.constraints_override()?,
            None => None,
        };
        let query = build_read_query(
            &config.target,
            Some(&config.constraints),
            override_,
            resolver,
            msg.map(FlowMessage::as_value),
        )
        .await?;

        Ok(Self { query })
    }

    /// Run the query
    pub async fn run(&self, client: &dyn DocumentClient) -> Result<DataSnapshot> {
        Ok(client.get(&self.query).await?)
    }
}

impl SubscribeRequest {
    /// Normalize a subscription (re)registration
    pub async fn build(
        config: &InNodeConfig,
        filter: Option<DocumentChangeType>,
        msg: Option<&FlowMessage>,
        resolver: &dyn PropertyResolver,
    ) -> Result<Self> {
        let override_ = match msg {
            Some(message) => message.constraints_override()?,
            None => None,
        };
        let query = build_read_query(
            &config.target,
            Some(&config.constraints),
            override_,
            resolver,
            msg.map(FlowMessage::as_value),
        )
        .await?;

        Ok(Self {
            query,
            filter,
        })
    }

    /// Drop the changes a snapshot carries that the filter excludes
    pub fn apply_filter(mut snapshot: DataSnapshot, filter: Option<DocumentChangeType>) -> DataSnapshot {
        if let Some(change_type) = filter {
            snapshot
                .changes
                .retain(|change| change.change_type == change_type);
        }
        snapshot
    }
}

impl WriteRequest {
    /// Normalize a write-node invocation: method, expanded payload,
    /// merge options and target query.
    pub async fn build(
        config: &OutNodeConfig,
        msg: &FlowMessage,
        resolver: &dyn PropertyResolver,
        field_values: &dyn FieldValueFactory,
    ) -> Result<Self> {
        let method = resolve_method(config, msg)?;
        // The payload is expanded (and therefore validated) before the
        // method dispatch, delete simply does not forward it.
        let payload = expand_payload(msg.payload().cloned(), field_values)?;
        let options = resolve_options(config.query_options.as_ref(), msg)?;
        let query = build_write_query(&config.target, resolver, Some(msg.as_value())).await?;

        Ok(Self {
            method,
            query,
            payload: match method {
                QueryMethod::Set | QueryMethod::Update => Some(payload),
                QueryMethod::Delete => None,
            },
            options: match method {
                QueryMethod::Set => options,
                QueryMethod::Update | QueryMethod::Delete => None,
            },
        })
    }

    /// Apply the mutation
    pub async fn run(self, client: &dyn DocumentClient) -> Result<()> {
        Ok(client
            .modify(self.method, &self.query, self.payload, self.options)
            .await?)
    }
}

/// Resolve the write method from the node config or the message
fn resolve_method(config: &OutNodeConfig, msg: &FlowMessage) -> Result<QueryMethod> {
    if let Some(method) = config.query_method.fixed() {
        return Ok(method);
    }

    let raw = msg.method().ok_or(NodeError::MissingMethod)?;
    let text = raw.as_str().ok_or(NodeError::MethodNotString)?;
    text.parse()
        .map_err(|_| NodeError::UnknownMethod(text.to_string()))
}

/// Resolve the set options: message options override the node's
fn resolve_options(node_options: Option<&SetOptions>, msg: &FlowMessage) -> Result<Option<SetOptions>> {
    let mut options = node_options.cloned().unwrap_or_default();

    if let Some(merge) = msg.options().and_then(|options| options.get("merge")) {
        match merge {
            Value::Bool(merge) => {
                options.merge = Some(*merge);
                options.merge_fields = None;
            }
            Value::Array(items) => {
                let fields = items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or(NodeError::InvalidMergeOption)?;
                options.merge_fields = Some(fields);
                options.merge = None;
            }
            _ => return Err(NodeError::InvalidMergeOption),
        }
    }

    Ok(if options.is_empty() { None } else { Some(options) })
}
