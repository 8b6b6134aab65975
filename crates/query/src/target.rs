//! Target scope resolution and query assembly
//!
//! The target scope of a node — collection, document, and for
//! read/subscribe nodes a collection group — is declared as typed
//! references like every other property. This module resolves them and
//! assembles the final [`QueryConfig`] handed to the database client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use fireflow_client_contracts::{QueryConfig, QueryConstraints};

use crate::constraints::{resolve_constraints, RawConstraints};
use crate::error::{NormalizeError, Result};
use crate::typed::{evaluate_property, PropertyResolver, TypeTag};

/// The target scope block of a node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTarget {
    #[serde(default)]
    pub collection: String,
    #[serde(default = "str_tag")]
    pub collection_type: TypeTag,
    #[serde(default)]
    pub document: String,
    #[serde(default = "str_tag")]
    pub document_type: TypeTag,
    /// Only read/subscribe nodes declare a collection group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_group: Option<String>,
    #[serde(default = "str_tag")]
    pub collection_group_type: TypeTag,
}

fn str_tag() -> TypeTag {
    TypeTag::Str
}

impl Default for RawTarget {
    fn default() -> Self {
        Self {
            collection: String::new(),
            collection_type: TypeTag::Str,
            document: String::new(),
            document_type: TypeTag::Str,
            collection_group: None,
            collection_group_type: TypeTag::Str,
        }
    }
}

/// Build the query for a read or subscribe request.
///
/// Resolves the whole target scope and attaches the resolved
/// constraints (request-time override first, declared config
/// otherwise).
pub async fn build_read_query(
    target: &RawTarget,
    constraints: Option<&RawConstraints>,
    override_: Option<QueryConstraints>,
    resolver: &dyn PropertyResolver,
    msg: Option<&Value>,
) -> Result<QueryConfig> {
    let collection =
        resolve_scope_field(&target.collection, target.collection_type, resolver, msg).await?;
    let document =
        resolve_scope_field(&target.document, target.document_type, resolver, msg).await?;
    let collection_group = match &target.collection_group {
        Some(group) => {
            resolve_scope_field(group, target.collection_group_type, resolver, msg).await?
        }
        None => None,
    };

    let constraints = resolve_constraints(constraints, override_, resolver, msg).await?;

    Ok(QueryConfig {
        collection,
        document,
        collection_group,
        constraints: Some(constraints),
    })
}

/// Build the query for a write request.
///
/// Mutations target a collection/document pair only: a declared
/// collection group or constraint block never reaches the client.
pub async fn build_write_query(
    target: &RawTarget,
    resolver: &dyn PropertyResolver,
    msg: Option<&Value>,
) -> Result<QueryConfig> {
    let collection =
        resolve_scope_field(&target.collection, target.collection_type, resolver, msg).await?;
    let document =
        resolve_scope_field(&target.document, target.document_type, resolver, msg).await?;

    Ok(QueryConfig {
        collection,
        document,
        collection_group: None,
        constraints: None,
    })
}

/// Resolve one scope field to its path, treating empty and null
/// resolutions as "not set"
async fn resolve_scope_field(
    value: &str,
    tag: TypeTag,
    resolver: &dyn PropertyResolver,
    msg: Option<&Value>,
) -> Result<Option<String>> {
    if value.is_empty() && tag == TypeTag::Str {
        return Ok(None);
    }

    match evaluate_property(value, tag, resolver, msg).await? {
        Value::String(path) if path.is_empty() => Ok(None),
        Value::String(path) => Ok(Some(path)),
        Value::Null => Ok(None),
        _ => Err(NormalizeError::eval(value, tag, "must resolve to a string")),
    }
}
