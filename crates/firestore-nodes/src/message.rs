//! The flow message envelope
//!
//! Messages are arbitrary JSON objects routed between nodes. A handful
//! of well-known fields steer the Firestore nodes: `payload` (write
//! body), `constraints` (request-time constraint override), `filter`
//! (subscription change filter or `reset`), `method` and `options`
//! (write method and merge options).

use serde_json::Value;

use fireflow_client_contracts::QueryConstraints;

use crate::error::{NodeError, Result};

/// An incoming flow message
#[derive(Debug, Clone)]
pub struct FlowMessage {
    inner: Value,
}

impl FlowMessage {
    /// Wrap a raw message value
    pub fn new(inner: Value) -> Self {
        Self { inner }
    }

    /// An empty message
    pub fn empty() -> Self {
        Self {
            inner: Value::Object(Default::default()),
        }
    }

    /// The raw message, for typed-property evaluation
    pub fn as_value(&self) -> &Value {
        &self.inner
    }

    /// Consume the wrapper
    pub fn into_value(self) -> Value {
        self.inner
    }

    /// The message payload, if any
    pub fn payload(&self) -> Option<&Value> {
        self.inner.get("payload")
    }

    /// The request-time constraint override, deserialized verbatim
    pub fn constraints_override(&self) -> Result<Option<QueryConstraints>> {
        match self.inner.get("constraints") {
            None => Ok(None),
            Some(raw) => serde_json::from_value(raw.clone())
                .map(Some)
                .map_err(|e| NodeError::InvalidConstraintsOverride(e.to_string())),
        }
    }

    /// The subscription filter field (`added`, `none`, `reset`, ...)
    pub fn filter(&self) -> Option<&str> {
        self.inner.get("filter").and_then(Value::as_str)
    }

    /// The raw `method` field
    pub fn method(&self) -> Option<&Value> {
        self.inner.get("method")
    }

    /// The raw `options` field
    pub fn options(&self) -> Option<&Value> {
        self.inner.get("options")
    }

    /// Build an outgoing message carrying `payload`, keeping the other
    /// fields of `base` when a message is passed through
    pub fn outgoing(base: Option<&FlowMessage>, payload: Value) -> Value {
        let mut out = match base {
            Some(message) if message.inner.is_object() => message.inner.clone(),
            _ => Value::Object(Default::default()),
        };
        out["payload"] = payload;
        out
    }
}

impl Default for FlowMessage {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_well_known_fields() {
        let msg = FlowMessage::new(json!({
            "topic": "users",
            "payload": {"name": "alice"},
            "filter": "added",
            "method": "set",
        }));

        assert_eq!(msg.payload(), Some(&json!({"name": "alice"})));
        assert_eq!(msg.filter(), Some("added"));
        assert_eq!(msg.method(), Some(&json!("set")));
        assert_eq!(msg.options(), None);
    }

    #[test]
    fn test_constraints_override_roundtrip() {
        let msg = FlowMessage::new(json!({
            "constraints": {"limitToFirst": 2},
        }));

        let constraints = msg.constraints_override().unwrap().unwrap();
        assert_eq!(constraints.limit_to_first, Some(2));
    }

    #[test]
    fn test_invalid_constraints_override() {
        let msg = FlowMessage::new(json!({
            "constraints": {"limitToFirst": "lots"},
        }));

        let err = msg.constraints_override().unwrap_err();
        assert!(matches!(err, NodeError::InvalidConstraintsOverride(_)));
    }

    #[test]
    fn test_absent_constraints_is_none() {
        let msg = FlowMessage::new(json!({"topic": "users"}));
        assert!(msg.constraints_override().unwrap().is_none());
    }

    #[test]
    fn test_outgoing_with_pass_through() {
        let msg = FlowMessage::new(json!({"topic": "users", "payload": "old"}));
        let out = FlowMessage::outgoing(Some(&msg), json!({"size": 1}));

        assert_eq!(out["topic"], "users");
        assert_eq!(out["payload"], json!({"size": 1}));
    }

    #[test]
    fn test_outgoing_without_base() {
        let out = FlowMessage::outgoing(None, json!({"size": 0}));
        assert_eq!(out, json!({"payload": {"size": 0}}));
    }
}
