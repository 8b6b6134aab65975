//! Typed-field evaluation
//!
//! Node properties are stored as a `(value, type)` pair: the value is
//! always a string, the type tag says how to turn it into a runtime
//! value. Static tags parse the literal; dynamic tags look the value up
//! in the message or in the scoped context stores behind a
//! [`PropertyResolver`].

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

use crate::error::{NormalizeError, Result};
use crate::path::lookup_path;

/// How a stored property string resolves to a runtime value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    /// The literal string
    Str,
    /// A decimal number literal
    Num,
    /// A boolean literal
    Bool,
    /// The current time in epoch milliseconds
    Date,
    /// JSON null
    Null,
    /// A JSON document literal
    Json,
    /// A JSON array of strings literal
    Array,
    /// An environment variable name
    Env,
    /// A path into the flow-scoped context store
    Flow,
    /// A path into the global-scoped context store
    Global,
    /// A path into the incoming message
    Msg,
    /// An expression evaluated against the message
    Jsonata,
}

impl TypeTag {
    /// Tags resolved through the message or the context stores
    pub fn is_dynamic(&self) -> bool {
        matches!(
            self,
            TypeTag::Flow | TypeTag::Global | TypeTag::Jsonata | TypeTag::Msg
        )
    }

    /// Whether resolving `value` under this tag requires a message.
    ///
    /// `msg` always does; an expression only when its text reaches into
    /// the message.
    pub fn needs_message(&self, value: &str) -> bool {
        self.is_dynamic() && (*self == TypeTag::Msg || value.contains("[msg."))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Str => "str",
            TypeTag::Num => "num",
            TypeTag::Bool => "bool",
            TypeTag::Date => "date",
            TypeTag::Null => "null",
            TypeTag::Json => "json",
            TypeTag::Array => "array",
            TypeTag::Env => "env",
            TypeTag::Flow => "flow",
            TypeTag::Global => "global",
            TypeTag::Msg => "msg",
            TypeTag::Jsonata => "jsonata",
        };
        write!(f, "{}", name)
    }
}

/// Failure inside a [`PropertyResolver`] implementation
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ResolveError(pub String);

/// Access to the context stores a node evaluates properties against.
///
/// Implemented by the host runtime: the scoped stores may live behind
/// asynchronous persistence, so lookups are awaited one at a time.
#[async_trait]
pub trait PropertyResolver: Send + Sync {
    /// Look up a path in the flow-scoped store
    async fn flow_value(&self, path: &str) -> std::result::Result<Option<Value>, ResolveError>;

    /// Look up a path in the global-scoped store
    async fn global_value(&self, path: &str) -> std::result::Result<Option<Value>, ResolveError>;

    /// Read an environment variable
    fn env_value(&self, name: &str) -> Option<String>;

    /// Evaluate an expression, optionally against the message
    async fn evaluate_expression(
        &self,
        expr: &str,
        msg: Option<&Value>,
    ) -> std::result::Result<Value, ResolveError>;
}

/// Resolve a `(value, tag)` property pair to a runtime value.
///
/// Message-dependent properties fail with
/// [`NormalizeError::MissingContext`] when no message is supplied; any
/// lookup or parse failure is reported as [`NormalizeError::Eval`]
/// carrying the offending pair.
pub async fn evaluate_property(
    value: &str,
    tag: TypeTag,
    resolver: &dyn PropertyResolver,
    msg: Option<&Value>,
) -> Result<Value> {
    if msg.is_none() && tag.needs_message(value) {
        return Err(NormalizeError::MissingContext {
            value: value.to_string(),
            tag,
        });
    }

    match tag {
        TypeTag::Str => Ok(Value::String(value.to_string())),
        TypeTag::Num => parse_number(value),
        TypeTag::Bool => match value.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(NormalizeError::eval(value, tag, "not a boolean literal")),
        },
        TypeTag::Date => Ok(Value::from(chrono::Utc::now().timestamp_millis())),
        TypeTag::Null => Ok(Value::Null),
        TypeTag::Json => serde_json::from_str(value)
            .map_err(|e| NormalizeError::eval(value, tag, e.to_string())),
        TypeTag::Array => {
            let parsed: Value = serde_json::from_str(value)
                .map_err(|e| NormalizeError::eval(value, tag, e.to_string()))?;
            match &parsed {
                Value::Array(items) if items.iter().all(Value::is_string) => Ok(parsed),
                _ => Err(NormalizeError::eval(value, tag, "not an array of strings")),
            }
        }
        // Unset environment variables resolve to the empty string, the
        // same contract the host runtime exposes.
        TypeTag::Env => Ok(Value::String(resolver.env_value(value).unwrap_or_default())),
        TypeTag::Flow => resolver
            .flow_value(value)
            .await
            .map_err(|e| NormalizeError::eval(value, tag, e.to_string()))?
            .ok_or_else(|| NormalizeError::eval(value, tag, "flow context has no such value")),
        TypeTag::Global => resolver
            .global_value(value)
            .await
            .map_err(|e| NormalizeError::eval(value, tag, e.to_string()))?
            .ok_or_else(|| NormalizeError::eval(value, tag, "global context has no such value")),
        TypeTag::Msg => {
            let Some(message) = msg else {
                return Err(NormalizeError::MissingContext {
                    value: value.to_string(),
                    tag,
                });
            };
            lookup_path(message, value)
                .ok_or_else(|| NormalizeError::eval(value, tag, "message has no such property"))
        }
        TypeTag::Jsonata => resolver
            .evaluate_expression(value, msg)
            .await
            .map_err(|e| NormalizeError::eval(value, tag, e.to_string())),
    }
}

fn parse_number(value: &str) -> Result<Value> {
    let trimmed = value.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Ok(Value::Number(Number::from(int)));
    }
    let float = trimmed
        .parse::<f64>()
        .map_err(|e| NormalizeError::eval(value, TypeTag::Num, e.to_string()))?;
    Number::from_f64(float)
        .map(Value::Number)
        .ok_or_else(|| NormalizeError::eval(value, TypeTag::Num, "not a finite number"))
}

/// A map-backed resolver for tests and embedders with fixed context
#[derive(Default)]
pub struct StaticResolver {
    flow: HashMap<String, Value>,
    global: HashMap<String, Value>,
    env: HashMap<String, String>,
    expressions: HashMap<String, Value>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flow-scoped value
    pub fn with_flow(mut self, path: impl Into<String>, value: Value) -> Self {
        self.flow.insert(path.into(), value);
        self
    }

    /// Add a global-scoped value
    pub fn with_global(mut self, path: impl Into<String>, value: Value) -> Self {
        self.global.insert(path.into(), value);
        self
    }

    /// Add an environment variable
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Add a canned expression result
    pub fn with_expression(mut self, expr: impl Into<String>, result: Value) -> Self {
        self.expressions.insert(expr.into(), result);
        self
    }
}

#[async_trait]
impl PropertyResolver for StaticResolver {
    async fn flow_value(&self, path: &str) -> std::result::Result<Option<Value>, ResolveError> {
        Ok(self.flow.get(path).cloned())
    }

    async fn global_value(&self, path: &str) -> std::result::Result<Option<Value>, ResolveError> {
        Ok(self.global.get(path).cloned())
    }

    fn env_value(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }

    async fn evaluate_expression(
        &self,
        expr: &str,
        _msg: Option<&Value>,
    ) -> std::result::Result<Value, ResolveError> {
        self.expressions
            .get(expr)
            .cloned()
            .ok_or_else(|| ResolveError(format!("no result registered for expression '{}'", expr)))
    }
}
