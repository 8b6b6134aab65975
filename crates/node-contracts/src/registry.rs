//! Node type registry for palette listing
//!
//! Maps node type strings to their metadata so hosts can enumerate the
//! palette, group nodes by category, and validate connections. Node
//! crates register their descriptors at link time via `inventory`, and
//! hosts collect them with [`NodeRegistry::with_builtins`].

use std::collections::HashMap;

use crate::descriptor::TaskMetadata;
use crate::error::{PaletteError, Result};
use crate::types::NodeCategory;

/// Link-time registration of a node descriptor.
///
/// The field is a const function pointer that produces the node's
/// [`TaskMetadata`] at runtime:
///
/// ```ignore
/// inventory::submit!(fireflow_node_contracts::DescriptorFn(MyTask::descriptor));
/// ```
pub struct DescriptorFn(pub fn() -> TaskMetadata);

inventory::collect!(DescriptorFn);

/// Registry of node types and their metadata
///
/// Registries can be composed by merging:
/// ```ignore
/// let mut registry = NodeRegistry::with_builtins();
/// registry.merge(plugin_registry);
/// ```
pub struct NodeRegistry {
    entries: HashMap<String, TaskMetadata>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Create a registry populated with every descriptor submitted via
    /// `inventory` by the crates linked into this binary
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for descriptor in inventory::iter::<DescriptorFn> {
            registry.register((descriptor.0)());
        }
        registry
    }

    /// Register a node type
    pub fn register(&mut self, metadata: TaskMetadata) {
        self.entries.insert(metadata.node_type.clone(), metadata);
    }

    /// Get metadata for a node type
    pub fn get_metadata(&self, node_type: &str) -> Option<&TaskMetadata> {
        self.entries.get(node_type)
    }

    /// Get metadata for a node type, erroring when absent
    pub fn require_metadata(&self, node_type: &str) -> Result<&TaskMetadata> {
        self.entries
            .get(node_type)
            .ok_or_else(|| PaletteError::UnknownNodeType(node_type.to_string()))
    }

    /// Get all registered metadata
    pub fn all_metadata(&self) -> Vec<&TaskMetadata> {
        self.entries.values().collect()
    }

    /// Get metadata grouped by category
    pub fn metadata_by_category(&self) -> HashMap<NodeCategory, Vec<&TaskMetadata>> {
        let mut grouped: HashMap<NodeCategory, Vec<&TaskMetadata>> = HashMap::new();
        for metadata in self.entries.values() {
            grouped.entry(metadata.category).or_default().push(metadata);
        }
        grouped
    }

    /// Check if a node type is registered
    pub fn has_node_type(&self, node_type: &str) -> bool {
        self.entries.contains_key(node_type)
    }

    /// List all registered node type strings
    pub fn node_types(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }

    /// Merge another registry into this one
    ///
    /// Entries from `other` override entries in `self` if they share the
    /// same node_type.
    pub fn merge(&mut self, other: NodeRegistry) {
        self.entries.extend(other.entries);
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PortMetadata;
    use crate::types::{ExecutionMode, PortDataType};

    fn test_metadata(node_type: &str) -> TaskMetadata {
        TaskMetadata {
            node_type: node_type.to_string(),
            category: NodeCategory::Storage,
            label: format!("Test {}", node_type),
            description: "Test node".to_string(),
            inputs: vec![PortMetadata::optional(
                "message",
                "Message",
                PortDataType::Message,
            )],
            outputs: vec![PortMetadata::optional(
                "message",
                "Message",
                PortDataType::Message,
            )],
            execution_mode: ExecutionMode::Reactive,
        }
    }

    #[test]
    fn test_register_and_lookup_metadata() {
        let mut registry = NodeRegistry::new();
        registry.register(test_metadata("test-node"));

        assert!(registry.has_node_type("test-node"));
        assert!(!registry.has_node_type("unknown"));

        let meta = registry.get_metadata("test-node").unwrap();
        assert_eq!(meta.label, "Test test-node");
    }

    #[test]
    fn test_require_metadata_unknown() {
        let registry = NodeRegistry::new();
        let err = registry.require_metadata("missing").unwrap_err();
        assert!(matches!(err, PaletteError::UnknownNodeType(_)));
    }

    #[test]
    fn test_all_metadata() {
        let mut registry = NodeRegistry::new();
        registry.register(test_metadata("node-a"));
        registry.register(test_metadata("node-b"));

        assert_eq!(registry.all_metadata().len(), 2);
        assert_eq!(registry.node_types().len(), 2);
    }

    #[test]
    fn test_merge_override() {
        let mut registry1 = NodeRegistry::new();
        let mut meta1 = test_metadata("node-a");
        meta1.label = "Original".to_string();
        registry1.register(meta1);

        let mut registry2 = NodeRegistry::new();
        let mut meta2 = test_metadata("node-a");
        meta2.label = "Override".to_string();
        registry2.register(meta2);

        registry1.merge(registry2);
        assert_eq!(registry1.get_metadata("node-a").unwrap().label, "Override");
    }

    #[test]
    fn test_metadata_by_category() {
        let mut registry = NodeRegistry::new();

        let mut meta_input = test_metadata("firestore-in");
        meta_input.category = NodeCategory::Input;
        registry.register(meta_input);

        let meta_storage = test_metadata("firestore-get");
        registry.register(meta_storage);

        let grouped = registry.metadata_by_category();
        assert_eq!(grouped.get(&NodeCategory::Input).unwrap().len(), 1);
        assert_eq!(grouped.get(&NodeCategory::Storage).unwrap().len(), 1);
    }
}
