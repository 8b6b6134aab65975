//! JSON path lookup
//!
//! Resolves `msg`-typed property references against a message using
//! simple dot notation and array indexing.

use serde_json::Value;

/// Extract a value from JSON using a path expression.
///
/// Supports:
/// - Dot notation: `field.nested.value`
/// - Array indexing: `[0]`, `items[1]`
/// - Combined: `data.items[0].name`
///
/// An empty path returns the whole value.
pub fn lookup_path(json: &Value, path: &str) -> Option<Value> {
    if path.is_empty() {
        return Some(json.clone());
    }

    let mut current = json;
    let mut remaining = path;

    while !remaining.is_empty() {
        // Handle array indexing at start: [0]
        if remaining.starts_with('[') {
            if let Some(end) = remaining.find(']') {
                let index_str = &remaining[1..end];
                if let Ok(index) = index_str.parse::<usize>() {
                    current = current.get(index)?;
                    remaining = &remaining[end + 1..];
                    // Skip leading dot after array index
                    if remaining.starts_with('.') {
                        remaining = &remaining[1..];
                    }
                    continue;
                }
            }
            return None;
        }

        // Handle object field access
        let (field, rest) = if let Some(dot_pos) = remaining.find('.') {
            let bracket_pos = remaining.find('[').unwrap_or(remaining.len());
            if dot_pos < bracket_pos {
                (&remaining[..dot_pos], &remaining[dot_pos + 1..])
            } else {
                (&remaining[..bracket_pos], &remaining[bracket_pos..])
            }
        } else if let Some(bracket_pos) = remaining.find('[') {
            (&remaining[..bracket_pos], &remaining[bracket_pos..])
        } else {
            (remaining, "")
        };

        if !field.is_empty() {
            current = current.get(field)?;
        }
        remaining = rest;
    }

    Some(current.clone())
}
