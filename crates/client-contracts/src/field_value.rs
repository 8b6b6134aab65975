//! Special field-value directives
//!
//! A directive is an opaque instruction the database client understands
//! (server timestamp, delete-field, numeric increment, array union and
//! removal, geo point). The payload expander asks a [`FieldValueFactory`]
//! to produce them so it never depends on a concrete client encoding.

use serde_json::{json, Value};

/// Factory for the special field-value directives a client supports
pub trait FieldValueFactory: Send + Sync {
    /// The server-side write timestamp
    fn server_timestamp(&self) -> Value;

    /// Remove the field from the document
    fn delete_field(&self) -> Value;

    /// Add `delta` to the field's current numeric value
    fn increment(&self, delta: f64) -> Value;

    /// Append the given elements to the field's array, deduplicated
    fn array_union(&self, elements: Value) -> Value;

    /// Remove the given elements from the field's array
    fn array_remove(&self, elements: Value) -> Value;

    /// A geographic point
    fn geo_point(&self, latitude: f64, longitude: f64) -> Value;
}

/// Reference factory encoding directives as single-tag JSON objects.
///
/// Concrete clients translate these tags into their own transform
/// representation; tests match on them directly.
pub struct SentinelFieldValues;

/// Tag key used by [`SentinelFieldValues`]
pub const FIELD_VALUE_TAG: &str = "_fieldValue";

impl FieldValueFactory for SentinelFieldValues {
    fn server_timestamp(&self) -> Value {
        json!({ FIELD_VALUE_TAG: "serverTimestamp" })
    }

    fn delete_field(&self) -> Value {
        json!({ FIELD_VALUE_TAG: "delete" })
    }

    fn increment(&self, delta: f64) -> Value {
        json!({ FIELD_VALUE_TAG: "increment", "operand": delta })
    }

    fn array_union(&self, elements: Value) -> Value {
        json!({ FIELD_VALUE_TAG: "arrayUnion", "elements": elements })
    }

    fn array_remove(&self, elements: Value) -> Value {
        json!({ FIELD_VALUE_TAG: "arrayRemove", "elements": elements })
    }

    fn geo_point(&self, latitude: f64, longitude: f64) -> Value {
        json!({ FIELD_VALUE_TAG: "geoPoint", "latitude": latitude, "longitude": longitude })
    }
}
