//! Snapshot types delivered by the database client
//!
//! A [`DataSnapshot`] carries the matched documents plus the ordered
//! list of changes since the previous snapshot (for subscriptions).

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::UnknownVariant;

/// Kind of change a document underwent between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentChangeType {
    Added,
    Modified,
    Removed,
}

impl FromStr for DocumentChangeType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "added" => Ok(DocumentChangeType::Added),
            "modified" => Ok(DocumentChangeType::Modified),
            "removed" => Ok(DocumentChangeType::Removed),
            other => Err(UnknownVariant::new("DocumentChangeType", other)),
        }
    }
}

/// A single document change within a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChange {
    /// Document identifier
    pub id: String,
    /// The document's fields after the change
    pub doc: Value,
    /// Index of the document in the new snapshot (-1 when removed)
    pub new_index: i64,
    /// Index of the document in the previous snapshot (-1 when added)
    pub old_index: i64,
    /// What happened to the document
    #[serde(rename = "type")]
    pub change_type: DocumentChangeType,
}

/// Data returned by a query or delivered to a subscription
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataSnapshot {
    /// Number of matched documents
    pub size: usize,
    /// Matched documents, keyed by document id
    pub docs: Map<String, Value>,
    /// Changes since the previous snapshot, in delivery order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<DocumentChange>,
}

impl DataSnapshot {
    /// Create an empty snapshot
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot from documents and changes
    pub fn new(docs: Map<String, Value>, changes: Vec<DocumentChange>) -> Self {
        Self {
            size: docs.len(),
            docs,
            changes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_change_type_parse() {
        assert_eq!(
            "modified".parse::<DocumentChangeType>().unwrap(),
            DocumentChangeType::Modified
        );
        assert!("replaced".parse::<DocumentChangeType>().is_err());
    }

    #[test]
    fn test_snapshot_size_matches_docs() {
        let mut docs = Map::new();
        docs.insert("alice".to_string(), json!({"age": 30}));
        docs.insert("bob".to_string(), json!({"age": 25}));

        let snapshot = DataSnapshot::new(docs, Vec::new());
        assert_eq!(snapshot.size, 2);
    }

    #[test]
    fn test_change_serialization_uses_type_key() {
        let change = DocumentChange {
            id: "alice".to_string(),
            doc: json!({"age": 30}),
            new_index: 0,
            old_index: -1,
            change_type: DocumentChangeType::Added,
        };

        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["type"], "added");
        assert_eq!(json["newIndex"], 0);
    }
}
