//! Key index for named children.
//!
//! [`KeyIndex`] is a thin wrapper around [`IndexMap`] mapping a child key to
//! the child's handle. Inserting an existing key replaces the association, so
//! with duplicate keys the most recently associated child wins.

use crate::node::NodeId;
use indexmap::IndexMap;

#[derive(Debug, Clone, Default)]
pub(crate) struct KeyIndex(IndexMap<String, NodeId>);

impl KeyIndex {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        KeyIndex(IndexMap::with_capacity(capacity))
    }

    pub(crate) fn insert(&mut self, key: String, node: NodeId) {
        self.0.insert(key, node);
    }

    pub(crate) fn get(&self, key: &str) -> Option<NodeId> {
        self.0.get(key).copied()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}
