//! Query constraint configuration and builder
//!
//! A node declares its constraints as typed references — the editor
//! stores `(value, valueType)` pairs — and the builder resolves them
//! into the concrete [`QueryConstraints`] handed to the database
//! client.
//!
//! Kinds are resolved in a fixed order — range bounds, limits, offset,
//! ordering, selection, filters — and `orderBy`/`where` clauses keep
//! their declaration order. Any validation failure aborts the whole
//! build; a partial constraint set never escapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use fireflow_client_contracts::{
    Direction, OrderByClause, QueryConstraints, WhereClause, WhereFilter,
};

use crate::error::{ConstraintKind, NormalizeError, Result};
use crate::typed::{evaluate_property, PropertyResolver, TypeTag};

/// Tags allowed for range-bound values (`endAt`, `endBefore`,
/// `startAt`, `startAfter`) and `where` values
const RANGE_FIELD_TAGS: &[TypeTag] = &[
    TypeTag::Bool,
    TypeTag::Date,
    TypeTag::Env,
    TypeTag::Flow,
    TypeTag::Global,
    TypeTag::Json,
    TypeTag::Jsonata,
    TypeTag::Msg,
    TypeTag::Null,
    TypeTag::Num,
    TypeTag::Str,
];

/// Tags allowed for `limitToFirst`, `limitToLast` and `offset`
const LIMIT_FIELD_TAGS: &[TypeTag] = &[
    TypeTag::Env,
    TypeTag::Flow,
    TypeTag::Global,
    TypeTag::Jsonata,
    TypeTag::Msg,
    TypeTag::Num,
];

/// Tags allowed for `orderBy`/`where` field paths
const PATH_FIELD_TAGS: &[TypeTag] = &[
    TypeTag::Env,
    TypeTag::Flow,
    TypeTag::Global,
    TypeTag::Jsonata,
    TypeTag::Msg,
    TypeTag::Str,
];

/// Tags allowed for `select`
const SELECT_FIELD_TAGS: &[TypeTag] = &[
    TypeTag::Env,
    TypeTag::Flow,
    TypeTag::Global,
    TypeTag::Jsonata,
    TypeTag::Msg,
    TypeTag::Str,
    TypeTag::Json,
    TypeTag::Array,
];

/// Either a single entry or a sequence of entries.
///
/// Early configurations stored a single `orderBy`/`where` object; the
/// editor now always writes a sequence. Both shapes deserialize here
/// and normalize to a sequence at the loading boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// View the entries as a slice, whatever the stored shape
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(entry) => std::slice::from_ref(entry),
            OneOrMany::Many(entries) => entries,
        }
    }
}

/// A `(value, valueType)` pair as stored in the node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTypedField {
    pub value: String,
    pub value_type: TypeTag,
}

/// A declared `orderBy` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOrderBy {
    pub path: String,
    pub path_type: TypeTag,
    #[serde(default = "default_direction")]
    pub direction: String,
}

fn default_direction() -> String {
    "asc".to_string()
}

/// A declared `where` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWhere {
    pub path: String,
    pub path_type: TypeTag,
    pub filter: String,
    pub value: String,
    pub value_type: TypeTag,
}

/// The constraint block of a node configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<RawTypedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_before: Option<RawTypedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<RawTypedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_after: Option<RawTypedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_to_first: Option<RawTypedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_to_last: Option<RawTypedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<RawTypedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OneOrMany<RawOrderBy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<RawTypedField>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_: Option<OneOrMany<RawWhere>>,
}

/// Resolve the constraints of a request.
///
/// A request-time override is used verbatim — the node configuration
/// contributes nothing to it. Otherwise the declared constraints are
/// built; an absent block yields the empty set.
pub async fn resolve_constraints(
    raw: Option<&RawConstraints>,
    override_: Option<QueryConstraints>,
    resolver: &dyn PropertyResolver,
    msg: Option<&Value>,
) -> Result<QueryConstraints> {
    if let Some(given) = override_ {
        return Ok(given);
    }

    match raw {
        Some(raw) => build_constraints(raw, resolver, msg).await,
        None => Ok(QueryConstraints::default()),
    }
}

/// Build the declared constraints into a resolved [`QueryConstraints`]
pub async fn build_constraints(
    raw: &RawConstraints,
    resolver: &dyn PropertyResolver,
    msg: Option<&Value>,
) -> Result<QueryConstraints> {
    let mut constraints = QueryConstraints::default();

    if let Some(field) = &raw.end_at {
        constraints.end_at =
            Some(resolve_range(ConstraintKind::EndAt, field, resolver, msg).await?);
    }
    if let Some(field) = &raw.end_before {
        constraints.end_before =
            Some(resolve_range(ConstraintKind::EndBefore, field, resolver, msg).await?);
    }
    if let Some(field) = &raw.start_at {
        constraints.start_at =
            Some(resolve_range(ConstraintKind::StartAt, field, resolver, msg).await?);
    }
    if let Some(field) = &raw.start_after {
        constraints.start_after =
            Some(resolve_range(ConstraintKind::StartAfter, field, resolver, msg).await?);
    }

    if let Some(field) = &raw.limit_to_first {
        constraints.limit_to_first =
            Some(resolve_limit(ConstraintKind::LimitToFirst, field, resolver, msg).await?);
    }
    if let Some(field) = &raw.limit_to_last {
        constraints.limit_to_last =
            Some(resolve_limit(ConstraintKind::LimitToLast, field, resolver, msg).await?);
    }
    if let Some(field) = &raw.offset {
        constraints.offset =
            Some(resolve_limit(ConstraintKind::Offset, field, resolver, msg).await?);
    }

    if let Some(entries) = &raw.order_by {
        for entry in entries.as_slice() {
            ensure_allowed(ConstraintKind::OrderBy, entry.path_type, PATH_FIELD_TAGS)?;

            let resolved =
                evaluate_property(&entry.path, entry.path_type, resolver, msg).await?;
            let field_path = require_field_path(ConstraintKind::OrderBy, &resolved)?;
            let direction: Direction = entry.direction.parse()?;

            constraints.order_by.push(OrderByClause {
                field_path,
                direction,
            });
        }
    }

    if let Some(field) = &raw.select {
        constraints.select = Some(resolve_select(field, resolver, msg).await?);
    }

    if let Some(entries) = &raw.where_ {
        for entry in entries.as_slice() {
            ensure_allowed(ConstraintKind::Where, entry.value_type, RANGE_FIELD_TAGS)?;
            ensure_allowed(ConstraintKind::Where, entry.path_type, PATH_FIELD_TAGS)?;

            let resolved =
                evaluate_property(&entry.path, entry.path_type, resolver, msg).await?;
            let field_path = require_field_path(ConstraintKind::Where, &resolved)?;
            let filter: WhereFilter = entry.filter.parse()?;
            let value = evaluate_property(&entry.value, entry.value_type, resolver, msg).await?;

            constraints.where_.push(WhereClause {
                field_path,
                filter,
                value,
            });
        }
    }

    Ok(constraints)
}

fn ensure_allowed(kind: ConstraintKind, tag: TypeTag, allowed: &[TypeTag]) -> Result<()> {
    if allowed.contains(&tag) {
        Ok(())
    } else {
        Err(NormalizeError::InvalidFieldType { kind, tag })
    }
}

async fn resolve_range(
    kind: ConstraintKind,
    field: &RawTypedField,
    resolver: &dyn PropertyResolver,
    msg: Option<&Value>,
) -> Result<Value> {
    ensure_allowed(kind, field.value_type, RANGE_FIELD_TAGS)?;
    evaluate_property(&field.value, field.value_type, resolver, msg).await
}

async fn resolve_limit(
    kind: ConstraintKind,
    field: &RawTypedField,
    resolver: &dyn PropertyResolver,
    msg: Option<&Value>,
) -> Result<i64> {
    ensure_allowed(kind, field.value_type, LIMIT_FIELD_TAGS)?;

    let resolved = evaluate_property(&field.value, field.value_type, resolver, msg).await?;
    let limit = resolved
        .as_i64()
        .ok_or_else(|| NormalizeError::constraint(kind, "must resolve to an integer"))?;
    if limit <= 0 {
        return Err(NormalizeError::constraint(
            kind,
            "must be a positive integer",
        ));
    }
    Ok(limit)
}

async fn resolve_select(
    field: &RawTypedField,
    resolver: &dyn PropertyResolver,
    msg: Option<&Value>,
) -> Result<Vec<String>> {
    ensure_allowed(ConstraintKind::Select, field.value_type, SELECT_FIELD_TAGS)?;

    let resolved = evaluate_property(&field.value, field.value_type, resolver, msg).await?;
    match resolved {
        Value::String(path) => Ok(vec![path]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(path) => Ok(path),
                _ => Err(NormalizeError::constraint(
                    ConstraintKind::Select,
                    "must resolve to a string or an array of strings",
                )),
            })
            .collect(),
        _ => Err(NormalizeError::constraint(
            ConstraintKind::Select,
            "must resolve to a string or an array of strings",
        )),
    }
}

fn require_field_path(kind: ConstraintKind, resolved: &Value) -> Result<String> {
    match resolved {
        Value::String(path) if !path.is_empty() => Ok(path.clone()),
        _ => Err(NormalizeError::constraint(
            kind,
            "fieldPath must resolve to a non-empty string",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed::StaticResolver;
    use serde_json::json;

    fn raw(config: serde_json::Value) -> RawConstraints {
        serde_json::from_value(config).expect("valid raw constraints")
    }

    fn resolver() -> StaticResolver {
        StaticResolver::new()
            .with_flow("page.size", json!(25))
            .with_global("cursor", json!("doc-42"))
    }

    #[tokio::test]
    async fn test_empty_config_builds_empty_set() {
        let constraints = build_constraints(&RawConstraints::default(), &resolver(), None)
            .await
            .unwrap();
        assert!(constraints.is_empty());
    }

    #[tokio::test]
    async fn test_range_bound_resolution() {
        let config = raw(json!({
            "startAt": {"value": "cursor", "valueType": "global"},
            "endAt": {"value": "25", "valueType": "num"},
        }));

        let constraints = build_constraints(&config, &resolver(), None).await.unwrap();
        assert_eq!(constraints.start_at, Some(json!("doc-42")));
        assert_eq!(constraints.end_at, Some(json!(25)));
    }

    #[tokio::test]
    async fn test_range_bound_rejects_array_tag() {
        let config = raw(json!({
            "endAt": {"value": "[\"a\"]", "valueType": "array"},
        }));

        let err = build_constraints(&config, &resolver(), None).await.unwrap_err();
        match err {
            NormalizeError::InvalidFieldType { kind, tag } => {
                assert_eq!(kind, ConstraintKind::EndAt);
                assert_eq!(tag, TypeTag::Array);
            }
            other => panic!("expected InvalidFieldType, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_limit_rejects_out_of_list_tag() {
        let config = raw(json!({
            "limitToFirst": {"value": "true", "valueType": "bool"},
        }));

        let err = build_constraints(&config, &resolver(), None).await.unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::InvalidFieldType {
                kind: ConstraintKind::LimitToFirst,
                tag: TypeTag::Bool,
            }
        ));
    }

    #[tokio::test]
    async fn test_limit_resolution_from_flow() {
        let config = raw(json!({
            "limitToFirst": {"value": "page.size", "valueType": "flow"},
        }));

        let constraints = build_constraints(&config, &resolver(), None).await.unwrap();
        assert_eq!(constraints.limit_to_first, Some(25));
    }

    #[tokio::test]
    async fn test_limit_zero_negative_and_fractional_are_invalid() {
        for value in ["0", "-3"] {
            let config = raw(json!({
                "offset": {"value": value, "valueType": "num"},
            }));
            let err = build_constraints(&config, &resolver(), None).await.unwrap_err();
            assert!(
                matches!(
                    err,
                    NormalizeError::InvalidConstraintValue {
                        kind: ConstraintKind::Offset,
                        ..
                    }
                ),
                "value {value} should be rejected"
            );
        }

        let config = raw(json!({
            "limitToLast": {"value": "2.5", "valueType": "num"},
        }));
        let err = build_constraints(&config, &resolver(), None).await.unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::InvalidConstraintValue {
                kind: ConstraintKind::LimitToLast,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_order_by_single_and_sequence_normalize_alike() {
        let single = raw(json!({
            "orderBy": {"path": "age", "pathType": "str", "direction": "desc"},
        }));
        let sequence = raw(json!({
            "orderBy": [{"path": "age", "pathType": "str", "direction": "desc"}],
        }));

        let from_single = build_constraints(&single, &resolver(), None).await.unwrap();
        let from_sequence = build_constraints(&sequence, &resolver(), None).await.unwrap();

        assert_eq!(from_single, from_sequence);
        assert_eq!(from_single.order_by.len(), 1);
        assert_eq!(from_single.order_by[0].field_path, "age");
        assert_eq!(from_single.order_by[0].direction, Direction::Desc);
    }

    #[tokio::test]
    async fn test_order_by_preserves_declaration_order() {
        let config = raw(json!({
            "orderBy": [
                {"path": "age", "pathType": "str"},
                {"path": "name", "pathType": "str", "direction": "desc"},
            ],
        }));

        let constraints = build_constraints(&config, &resolver(), None).await.unwrap();
        let paths: Vec<&str> = constraints
            .order_by
            .iter()
            .map(|c| c.field_path.as_str())
            .collect();
        assert_eq!(paths, vec!["age", "name"]);
    }

    #[tokio::test]
    async fn test_order_by_empty_path_rejected() {
        let config = raw(json!({
            "orderBy": {"path": "", "pathType": "str"},
        }));

        let err = build_constraints(&config, &resolver(), None).await.unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::InvalidConstraintValue {
                kind: ConstraintKind::OrderBy,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unknown_direction() {
        let config = raw(json!({
            "orderBy": {"path": "age", "pathType": "str", "direction": "sideways"},
        }));

        let err = build_constraints(&config, &resolver(), None).await.unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::UnknownFilterOrDirection { what: "direction", .. }
        ));
    }

    #[tokio::test]
    async fn test_select_string_normalizes_to_list() {
        let config = raw(json!({
            "select": {"value": "name", "valueType": "str"},
        }));

        let constraints = build_constraints(&config, &resolver(), None).await.unwrap();
        assert_eq!(constraints.select, Some(vec!["name".to_string()]));
    }

    #[tokio::test]
    async fn test_select_array_literal() {
        let config = raw(json!({
            "select": {"value": "[\"name\", \"age\"]", "valueType": "array"},
        }));

        let constraints = build_constraints(&config, &resolver(), None).await.unwrap();
        assert_eq!(
            constraints.select,
            Some(vec!["name".to_string(), "age".to_string()])
        );
    }

    #[tokio::test]
    async fn test_select_non_string_rejected() {
        let config = raw(json!({
            "select": {"value": "[1, 2]", "valueType": "json"},
        }));

        let err = build_constraints(&config, &resolver(), None).await.unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::InvalidConstraintValue {
                kind: ConstraintKind::Select,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_where_single_and_sequence_normalize_alike() {
        let single = raw(json!({
            "where": {
                "path": "age", "pathType": "str",
                "filter": ">=",
                "value": "18", "valueType": "num",
            },
        }));
        let sequence = raw(json!({
            "where": [{
                "path": "age", "pathType": "str",
                "filter": ">=",
                "value": "18", "valueType": "num",
            }],
        }));

        let from_single = build_constraints(&single, &resolver(), None).await.unwrap();
        let from_sequence = build_constraints(&sequence, &resolver(), None).await.unwrap();

        assert_eq!(from_single, from_sequence);
        assert_eq!(from_single.where_[0].filter, WhereFilter::GreaterThanOrEqual);
        assert_eq!(from_single.where_[0].value, json!(18));
    }

    #[tokio::test]
    async fn test_where_path_from_message() {
        let config = raw(json!({
            "where": {
                "path": "topic", "pathType": "msg",
                "filter": "==",
                "value": "paris", "valueType": "str",
            },
        }));
        let msg = json!({"topic": "city"});

        let constraints = build_constraints(&config, &resolver(), Some(&msg))
            .await
            .unwrap();
        assert_eq!(constraints.where_[0].field_path, "city");
    }

    #[tokio::test]
    async fn test_where_msg_path_without_message_is_missing_context() {
        let config = raw(json!({
            "where": {
                "path": "topic", "pathType": "msg",
                "filter": "==",
                "value": "paris", "valueType": "str",
            },
        }));

        let err = build_constraints(&config, &resolver(), None).await.unwrap_err();
        assert!(matches!(err, NormalizeError::MissingContext { .. }));
    }

    #[tokio::test]
    async fn test_unknown_filter() {
        let config = raw(json!({
            "where": {
                "path": "age", "pathType": "str",
                "filter": "~=",
                "value": "18", "valueType": "num",
            },
        }));

        let err = build_constraints(&config, &resolver(), None).await.unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::UnknownFilterOrDirection { what: "filter", .. }
        ));
    }

    #[tokio::test]
    async fn test_override_wins_verbatim() {
        let override_: QueryConstraints = serde_json::from_value(json!({
            "limitToFirst": 3,
            "where": [{"fieldPath": "age", "filter": ">", "value": 21}],
        }))
        .unwrap();

        // Two wildly different configs, same override: identical result,
        // and the config's own (invalid) entries are never touched.
        let broken_config = raw(json!({
            "limitToFirst": {"value": "true", "valueType": "bool"},
        }));
        let other_config = raw(json!({
            "orderBy": {"path": "name", "pathType": "str"},
        }));

        let a = resolve_constraints(
            Some(&broken_config),
            Some(override_.clone()),
            &resolver(),
            None,
        )
        .await
        .unwrap();
        let b = resolve_constraints(
            Some(&other_config),
            Some(override_.clone()),
            &resolver(),
            None,
        )
        .await
        .unwrap();

        assert_eq!(a, b);
        assert_eq!(a, override_);
    }

    #[tokio::test]
    async fn test_failure_aborts_whole_build() {
        // A valid orderBy before an invalid where: nothing is returned.
        let config = raw(json!({
            "orderBy": {"path": "age", "pathType": "str"},
            "where": {
                "path": "age", "pathType": "str",
                "filter": "==",
                "value": "nope", "valueType": "num",
            },
        }));

        assert!(build_constraints(&config, &resolver(), None).await.is_err());
    }
}
