//! Write payload keyword expansion
//!
//! Outgoing write payloads may carry reserved sentinels — the string
//! values `TIMESTAMP`, `DELETE`, `INCREMENT n`, `DECREMENT n`, and the
//! marker keys `ARRAY_UNION`, `ARRAY_REMOVE`, `GEO_POINT` — which are
//! replaced with the client's special field-value directives before the
//! payload is forwarded.
//!
//! Keywords cannot be used inside an array: the underlying stores do
//! not accept transforms in array elements, so recursion only applies
//! to objects and everything else passes through untouched.

use serde_json::{Map, Value};

use fireflow_client_contracts::FieldValueFactory;

use crate::error::{NormalizeError, Result};

/// Expand the reserved keywords of a write payload into directives.
///
/// A missing payload normalizes to an empty object; any other
/// non-object payload is rejected with
/// [`NormalizeError::InvalidPayloadShape`].
pub fn expand_payload(
    payload: Option<Value>,
    field_values: &dyn FieldValueFactory,
) -> Result<Map<String, Value>> {
    match payload {
        None => Ok(Map::new()),
        Some(Value::Object(map)) => expand_object(map, field_values),
        Some(other) => Err(NormalizeError::InvalidPayloadShape(format!(
            "expected an object, received {}",
            type_name(&other)
        ))),
    }
}

fn expand_object(
    map: Map<String, Value>,
    field_values: &dyn FieldValueFactory,
) -> Result<Map<String, Value>> {
    let mut expanded = Map::with_capacity(map.len());

    for (key, value) in map {
        let replacement = match value {
            Value::String(text) => match match_sentinel(&text, field_values)? {
                Some(directive) => directive,
                None => Value::String(text),
            },
            Value::Object(object) => match match_marker(&object, field_values)? {
                Some(directive) => directive,
                None => Value::Object(expand_object(object, field_values)?),
            },
            // Arrays, null and the remaining scalar types pass through
            other => other,
        };
        expanded.insert(key, replacement);
    }

    Ok(expanded)
}

/// Match a string value against the reserved sentinel patterns,
/// ignoring surrounding whitespace. First match wins.
fn match_sentinel(text: &str, field_values: &dyn FieldValueFactory) -> Result<Option<Value>> {
    let trimmed = text.trim();

    if trimmed == "TIMESTAMP" {
        return Ok(Some(field_values.server_timestamp()));
    }
    if trimmed == "DELETE" {
        return Ok(Some(field_values.delete_field()));
    }
    if let Some(operand) = trimmed.strip_prefix("INCREMENT") {
        let delta = parse_delta(operand, text)?;
        return Ok(Some(field_values.increment(delta)));
    }
    if let Some(operand) = trimmed.strip_prefix("DECREMENT") {
        let delta = parse_delta(operand, text)?;
        return Ok(Some(field_values.increment(-delta)));
    }

    Ok(None)
}

fn parse_delta(operand: &str, raw: &str) -> Result<f64> {
    let delta: f64 = operand
        .trim()
        .parse()
        .map_err(|_| NormalizeError::InvalidIncrementDelta(raw.to_string()))?;
    if !delta.is_finite() {
        return Err(NormalizeError::InvalidIncrementDelta(raw.to_string()));
    }
    Ok(delta)
}

/// Match an object value against the reserved marker keys
fn match_marker(
    object: &Map<String, Value>,
    field_values: &dyn FieldValueFactory,
) -> Result<Option<Value>> {
    if let Some(elements) = object.get("ARRAY_UNION") {
        return Ok(Some(field_values.array_union(elements.clone())));
    }
    if let Some(elements) = object.get("ARRAY_REMOVE") {
        return Ok(Some(field_values.array_remove(elements.clone())));
    }
    if let Some(point) = object.get("GEO_POINT") {
        let latitude = point.get("latitude").and_then(Value::as_f64);
        let longitude = point.get("longitude").and_then(Value::as_f64);
        return match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => {
                Ok(Some(field_values.geo_point(latitude, longitude)))
            }
            _ => Err(NormalizeError::InvalidPayloadShape(
                "GEO_POINT requires numeric 'latitude' and 'longitude'".to_string(),
            )),
        };
    }

    Ok(None)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
