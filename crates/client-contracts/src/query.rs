//! Query description handed to the database client
//!
//! A [`QueryConfig`] names the target scope (collection, document or
//! collection group) and, for read/subscribe queries, the resolved
//! [`QueryConstraints`]. These are the already-normalized shapes: every
//! field holds a concrete runtime value, never a typed reference.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::UnknownVariant;

/// Sort direction for an `orderBy` clause
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl FromStr for Direction {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            other => Err(UnknownVariant::new("direction", other)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => write!(f, "asc"),
            Direction::Desc => write!(f, "desc"),
        }
    }
}

/// Comparison operator of a `where` clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhereFilter {
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "array-contains")]
    ArrayContains,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not-in")]
    NotIn,
    #[serde(rename = "array-contains-any")]
    ArrayContainsAny,
}

impl FromStr for WhereFilter {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(WhereFilter::LessThan),
            "<=" => Ok(WhereFilter::LessThanOrEqual),
            "==" => Ok(WhereFilter::Equal),
            "!=" => Ok(WhereFilter::NotEqual),
            ">=" => Ok(WhereFilter::GreaterThanOrEqual),
            ">" => Ok(WhereFilter::GreaterThan),
            "array-contains" => Ok(WhereFilter::ArrayContains),
            "in" => Ok(WhereFilter::In),
            "not-in" => Ok(WhereFilter::NotIn),
            "array-contains-any" => Ok(WhereFilter::ArrayContainsAny),
            other => Err(UnknownVariant::new("filter", other)),
        }
    }
}

/// A resolved `orderBy` clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderByClause {
    pub field_path: String,
    #[serde(default)]
    pub direction: Direction,
}

/// A resolved `where` clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhereClause {
    pub field_path: String,
    pub filter: WhereFilter,
    pub value: Value,
}

/// The resolved constraint set of a query
///
/// Kinds are independent except `order_by` and `where_`, which are
/// ordered sequences evaluated in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_before: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_after: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_to_first: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_to_last: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderByClause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
    #[serde(rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub where_: Vec<WhereClause>,
}

impl QueryConstraints {
    /// Whether no constraint kind is present
    pub fn is_empty(&self) -> bool {
        self == &QueryConstraints::default()
    }
}

/// Target scope and constraints of a query
///
/// Exactly one of `collection`, `document` or `collection_group`
/// identifies the target scope per node kind; mutation queries never
/// carry `collection_group` or `constraints`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<QueryConstraints>,
}

/// Mutation method of a write query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMethod {
    Set,
    Update,
    Delete,
}

impl FromStr for QueryMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "set" => Ok(QueryMethod::Set),
            "update" => Ok(QueryMethod::Update),
            "delete" => Ok(QueryMethod::Delete),
            other => Err(UnknownVariant::new("method", other)),
        }
    }
}

impl fmt::Display for QueryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryMethod::Set => write!(f, "set"),
            QueryMethod::Update => write!(f, "update"),
            QueryMethod::Delete => write!(f, "delete"),
        }
    }
}

/// Options applied to a `set` mutation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SetOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_fields: Option<Vec<String>>,
}

impl SetOptions {
    /// Merge the whole payload into the existing document
    pub fn merge(merge: bool) -> Self {
        Self {
            merge: Some(merge),
            merge_fields: None,
        }
    }

    /// Merge only the named field paths
    pub fn merge_fields(fields: Vec<String>) -> Self {
        Self {
            merge: None,
            merge_fields: Some(fields),
        }
    }

    /// Whether no option is set
    pub fn is_empty(&self) -> bool {
        self.merge.is_none() && self.merge_fields.is_none()
    }
}
