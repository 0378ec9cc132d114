//! Key-path navigation and attribute access.
//!
//! A key path is a `/`-separated list of child keys. Leading slashes and runs
//! of slashes count as a single separator. There is no parent segment: `..`
//! is looked up like any other key.
//!
//! ## Examples
//!
//! ```rust
//! use serde_tabtree::Tree;
//!
//! let mut tree = Tree::new();
//! let root = tree.root();
//! tree.write_attr(root, "server/port", &8080).unwrap();
//!
//! let port: u16 = tree.read_attr(root, "/server//port").unwrap();
//! assert_eq!(port, 8080);
//!
//! let node = tree.inner_node_by_key_path(root, "server/port").unwrap();
//! assert_eq!(tree.key_path(node, root), "server/port");
//! ```

use crate::node::{NodeId, Tree};
use crate::{de, ser, Error, Result};
use serde::{Deserialize, Serialize};

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

impl Tree {
    /// Resolves `path` below `id`. Returns `None` as soon as a segment is missing.
    pub fn inner_node_by_key_path(&self, id: NodeId, path: &str) -> Option<NodeId> {
        segments(path).try_fold(id, |node, key| self.child_by_key(node, key))
    }

    /// Resolves `path` below `id`, creating empty nodes for missing segments.
    pub fn inner_node_by_key_path_or_insert(&mut self, id: NodeId, path: &str) -> NodeId {
        segments(path).fold(id, |node, key| self.child_by_key_or_insert(node, key))
    }

    /// Rebuilds the key path leading from `ancestor` down to `id`.
    ///
    /// Returns `"/"` if `id` is `ancestor`, and an empty string if `id` is not
    /// below `ancestor` or a node on the way has no key.
    pub fn key_path(&self, id: NodeId, ancestor: NodeId) -> String {
        if id == ancestor {
            return "/".to_string();
        }
        let mut keys = Vec::new();
        let mut current = id;
        while current != ancestor {
            let key = self.key(current);
            if key.is_empty() {
                return String::new();
            }
            keys.push(key);
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return String::new(),
            }
        }
        keys.reverse();
        keys.join("/")
    }

    /// Lists the descendants of `id` in pre-order, subject to three filters.
    ///
    /// A node is left out if it has children and `leaf_only` is set, if its value
    /// is empty and `ignore_void` is set, or if its key is empty and `named_only`
    /// is set. Nodes with children are descended into whether listed or not.
    ///
    /// Each level down, `leaf_only` and `named_only` trade places: the filters
    /// applied to grandchildren are `(ignore_void, named_only, leaf_only)`.
    pub fn inner_nodes(
        &self,
        id: NodeId,
        ignore_void: bool,
        leaf_only: bool,
        named_only: bool,
    ) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        self.collect_inner_nodes(id, ignore_void, leaf_only, named_only, &mut nodes);
        nodes
    }

    fn collect_inner_nodes(
        &self,
        id: NodeId,
        ignore_void: bool,
        leaf_only: bool,
        named_only: bool,
        nodes: &mut Vec<NodeId>,
    ) {
        for &child in self.children(id) {
            let has_children = self.child_count(child) > 0;
            let skip = (leaf_only && has_children)
                || (ignore_void && self.value(child).is_empty())
                || (named_only && self.key(child).is_empty());
            if !skip {
                nodes.push(child);
            }
            if has_children {
                self.collect_inner_nodes(child, ignore_void, named_only, leaf_only, nodes);
            }
        }
    }

    /// Lists the key paths of the named descendants of `id`.
    pub fn inner_key_paths(&self, id: NodeId, ignore_void: bool, leaf_only: bool) -> Vec<String> {
        self.inner_nodes(id, ignore_void, leaf_only, true)
            .into_iter()
            .map(|node| self.key_path(node, id))
            .filter(|path| !path.is_empty())
            .collect()
    }

    /// Deserializes the node at `path` below `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchKey`] if the path does not resolve, or any mapping error.
    pub fn read_attr<'de, T>(&'de self, id: NodeId, path: &str) -> Result<T>
    where
        T: Deserialize<'de>,
    {
        let node = self
            .inner_node_by_key_path(id, path)
            .ok_or_else(|| Error::no_such_key(path))?;
        de::from_node(self, node)
    }

    /// Serializes `value` into the node at `path` below `id`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyKey`] if `path` has no segments, [`Error::InvalidNode`]
    /// if `id` is stale, or any mapping error. On error the tree is unchanged.
    pub fn write_attr<T>(&mut self, id: NodeId, path: &str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        if segments(path).next().is_none() {
            return Err(Error::EmptyKey);
        }
        if !self.contains(id) {
            return Err(Error::InvalidNode);
        }
        let scratch = ser::to_standalone(self, value)?;
        let node = self.inner_node_by_key_path_or_insert(id, path);
        self.take_content(node, scratch);
        Ok(())
    }
}
