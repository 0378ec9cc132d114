//! The mutable document tree.
//!
//! A [`Tree`] is an arena of nodes addressed by [`NodeId`] handles. Every node
//! has a key (empty means unnamed), a value (empty means no scalar value) and an
//! ordered list of children. Parents own their children; a child only records
//! its parent's handle.
//!
//! ## Ownership
//!
//! A node belongs to at most one parent. [`Tree::add_child`] attaches a deep
//! copy whenever the node is already owned (it has a parent, or it is the
//! document root), so a subtree is never shared between two places.
//! [`Tree::detach`] turns a node back into a standalone subtree root which may
//! be attached again or dropped with [`Tree::discard`].
//!
//! ## Key index
//!
//! Lookups by key go through an index that is built on the first lookup and
//! kept up to date by later insertions. Detaching a named child drops the
//! whole index, which is rebuilt lazily on the next lookup. With duplicate
//! keys the index returns the most recently associated child, while
//! [`Tree::children`] still lists all of them.
//!
//! ## Examples
//!
//! ```rust
//! use serde_tabtree::Tree;
//!
//! let mut tree = Tree::new();
//! let root = tree.root();
//! let child = tree.push_child(root, "name", "Alice");
//!
//! assert_eq!(tree.child_by_key(root, "name"), Some(child));
//! assert_eq!(tree.value(child), "Alice");
//! assert_eq!(tree.parent(child), Some(root));
//! ```

use crate::map::KeyIndex;
use std::cell::OnceCell;
use std::mem;

/// Handle of a node inside a [`Tree`].
///
/// Handles stay valid until the node is discarded. A discarded slot may be
/// reused, but with a new generation, so [`Tree::contains`] can tell a stale
/// handle from a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct NodeData {
    pub(crate) key: String,
    pub(crate) value: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) named: usize,
    pub(crate) index: OnceCell<KeyIndex>,
}

impl NodeData {
    fn new(key: String, value: String) -> Self {
        NodeData {
            key,
            value,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// An arena holding a document root and any standalone subtrees.
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Tree {
    /// Compares the document roots by key, value and shape.
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}

impl Tree {
    /// Creates a tree holding a single empty root.
    #[must_use]
    pub fn new() -> Self {
        let mut tree = Tree {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        };
        tree.root = tree.alloc(NodeData::default());
        tree
    }

    /// Creates a tree whose root has the given key and value.
    #[must_use]
    pub fn with_root(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut tree = Tree::new();
        let root = tree.root;
        let node = tree.node_mut(root);
        node.key = key.into();
        node.value = value.into();
        tree
    }

    /// Returns the document root.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns `true` if `id` refers to a live node of this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.slots
            .get(id.index)
            .is_some_and(|slot| slot.generation == id.generation && slot.data.is_some())
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.data = Some(data);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    data: Some(data),
                });
                NodeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    /// # Panics
    ///
    /// Panics if `id` is stale or belongs to another tree.
    pub(crate) fn node(&self, id: NodeId) -> &NodeData {
        match self.slots.get(id.index) {
            Some(Slot {
                generation,
                data: Some(data),
            }) if *generation == id.generation => data,
            _ => panic!("stale node handle {:?}", id),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        match self.slots.get_mut(id.index) {
            Some(Slot {
                generation,
                data: Some(data),
            }) if *generation == id.generation => data,
            _ => panic!("stale node handle {:?}", id),
        }
    }

    /// Creates a standalone node (no parent) in this tree.
    pub fn create_node(&mut self, key: impl Into<String>, value: impl Into<String>) -> NodeId {
        self.alloc(NodeData::new(key.into(), value.into()))
    }

    pub fn key(&self, id: NodeId) -> &str {
        &self.node(id).key
    }

    pub fn value(&self, id: NodeId) -> &str {
        &self.node(id).value
    }

    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        self.node_mut(id).value = value.into();
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the children of `id` in order, duplicates included.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Returns the `i`-th child of `id`.
    pub fn child(&self, id: NodeId, i: usize) -> Option<NodeId> {
        self.node(id).children.get(i).copied()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.node(id).children.len()
    }

    /// Returns the number of children with a non-empty key.
    pub fn named_count(&self, id: NodeId) -> usize {
        self.node(id).named
    }

    /// Returns `true` if the node has neither a value nor children.
    pub fn is_void(&self, id: NodeId) -> bool {
        let node = self.node(id);
        node.value.is_empty() && node.children.is_empty()
    }

    /// Returns the number of ancestors of `id`.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent).parent;
        }
        depth
    }

    fn is_owned(&self, id: NodeId) -> bool {
        id == self.root || self.node(id).parent.is_some()
    }

    /// Returns `true` if `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.node(node).parent;
        }
        false
    }

    /// Changes the key of `id`, keeping the parent's named count and index in sync.
    pub fn set_key(&mut self, id: NodeId, key: impl Into<String>) {
        let key = key.into();
        let node = self.node_mut(id);
        if node.key == key {
            return;
        }
        let old = mem::replace(&mut node.key, key.clone());
        let Some(parent) = node.parent else {
            return;
        };

        let parent = self.node_mut(parent);
        match (old.is_empty(), key.is_empty()) {
            (true, false) => parent.named += 1,
            (false, true) => parent.named -= 1,
            _ => {}
        }

        let mut invalidate = parent.named == 0;
        if let Some(index) = parent.index.get_mut() {
            // The old key may still be held by a duplicate, which a rebuild will find.
            if !old.is_empty() && index.get(&old) == Some(id) {
                invalidate = true;
            } else if !key.is_empty() {
                index.insert(key, id);
            }
        }
        if invalidate {
            parent.index.take();
        }
    }

    /// Appends `child` to the children of `parent` and returns the attached handle.
    ///
    /// If `child` is already owned, or attaching it would create a cycle, a deep
    /// copy is attached instead and its handle returned. Duplicate keys are
    /// accepted.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> NodeId {
        let child = if self.is_owned(child) || self.is_ancestor_or_self(child, parent) {
            self.clone_node(child)
        } else {
            child
        };
        self.attach(parent, child);
        child
    }

    /// Creates a node and appends it to the children of `parent`.
    pub fn push_child(
        &mut self,
        parent: NodeId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> NodeId {
        let child = self.create_node(key, value);
        self.attach(parent, child);
        child
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        let node = self.node_mut(child);
        node.parent = Some(parent);
        let key = (!node.key.is_empty()).then(|| node.key.clone());

        let parent = self.node_mut(parent);
        parent.children.push(child);
        if let Some(key) = key {
            parent.named += 1;
            if let Some(index) = parent.index.get_mut() {
                index.insert(key, child);
            }
        }
    }

    /// Looks up the child of `parent` keyed `key`.
    ///
    /// The first lookup builds the index by scanning the children once. An
    /// empty key is never found.
    pub fn child_by_key(&self, parent: NodeId, key: &str) -> Option<NodeId> {
        if key.is_empty() {
            return None;
        }
        let node = self.node(parent);
        if node.named == 0 {
            return None;
        }
        let index = node.index.get_or_init(|| {
            let mut index = KeyIndex::with_capacity(node.named);
            for &child in &node.children {
                let key = &self.node(child).key;
                if !key.is_empty() {
                    index.insert(key.clone(), child);
                }
            }
            index
        });
        index.get(key)
    }

    /// Looks up the child of `parent` keyed `key`, appending an empty one if missing.
    pub fn child_by_key_or_insert(&mut self, parent: NodeId, key: &str) -> NodeId {
        match self.child_by_key(parent, key) {
            Some(child) => child,
            None => self.push_child(parent, key, ""),
        }
    }

    /// Resizes the children of `id` to `len`.
    ///
    /// Truncation discards the trailing subtrees; growth appends blank children.
    pub fn set_len(&mut self, id: NodeId, len: usize) {
        let current = self.node(id).children.len();
        if len < current {
            let removed: Vec<NodeId> = self.node_mut(id).children.drain(len..).collect();
            let mut named = 0;
            for child in removed {
                if !self.node(child).key.is_empty() {
                    named += 1;
                }
                self.free_subtree(child);
            }
            if named > 0 {
                let node = self.node_mut(id);
                node.named -= named;
                node.index.take();
            }
        } else {
            for _ in current..len {
                self.push_child(id, "", "");
            }
        }
    }

    /// Removes `id` from its parent and returns it as a standalone subtree root.
    ///
    /// Removal is by identity, so duplicate keys are harmless. If the node was
    /// named, the parent's index is dropped and rebuilt on the next lookup.
    pub fn detach(&mut self, id: NodeId) -> NodeId {
        let node = self.node_mut(id);
        let Some(parent) = node.parent.take() else {
            return id;
        };
        let named = !node.key.is_empty();

        let parent = self.node_mut(parent);
        if let Some(pos) = parent.children.iter().position(|&child| child == id) {
            parent.children.remove(pos);
        }
        if named {
            parent.named -= 1;
            parent.index.take();
        }
        id
    }

    /// Detaches `id` and frees its whole subtree.
    ///
    /// The document root cannot be freed; it is cleared instead.
    pub fn discard(&mut self, id: NodeId) {
        if id == self.root {
            self.clear(id);
            return;
        }
        self.detach(id);
        self.free_subtree(id);
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let slot = &mut self.slots[id.index];
            if let Some(data) = slot.data.take() {
                pending.extend(data.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
            }
        }
    }

    /// Deep-copies the subtree at `id`. The copy has no parent.
    pub fn clone_node(&mut self, id: NodeId) -> NodeId {
        let node = self.node(id);
        let data = NodeData::new(node.key.clone(), node.value.clone());
        let children = node.children.clone();

        let copy = self.alloc(data);
        for child in children {
            let child = self.clone_node(child);
            self.attach(copy, child);
        }
        copy
    }

    /// Deep-copies the subtree at `id` of `other` into this tree as a standalone node.
    pub fn import(&mut self, other: &Tree, id: NodeId) -> NodeId {
        let node = other.node(id);
        let copy = self.create_node(node.key.clone(), node.value.clone());
        for &child in &node.children {
            let child = self.import(other, child);
            self.attach(copy, child);
        }
        copy
    }

    /// Copies the subtree at `id` into a new, independent tree.
    #[must_use]
    pub fn extract(&self, id: NodeId) -> Tree {
        let node = self.node(id);
        let mut tree = Tree::with_root(node.key.clone(), node.value.clone());
        let root = tree.root;
        for &child in &node.children {
            let child = tree.import(self, child);
            tree.attach(root, child);
        }
        tree
    }

    /// Appends copies of the children of `src` to `dst`, keeping the existing ones.
    pub fn copy_children_from(&mut self, dst: NodeId, src: NodeId) {
        if dst == src {
            return;
        }
        let children = self.node(src).children.clone();
        for child in children {
            let copy = self.clone_node(child);
            self.attach(dst, copy);
        }
    }

    /// Drops all children, the value and the index of `id`. The key is kept.
    pub fn clear(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        let children = mem::take(&mut node.children);
        node.value.clear();
        node.named = 0;
        node.index.take();
        for child in children {
            self.free_subtree(child);
        }
    }

    /// Replaces the value and children of `dst` with those of the standalone
    /// node `src`, then frees `src`. The key of `dst` is kept.
    pub(crate) fn take_content(&mut self, dst: NodeId, src: NodeId) {
        self.clear(dst);
        let source = self.node_mut(src);
        let value = mem::take(&mut source.value);
        let children = mem::take(&mut source.children);
        let named = mem::replace(&mut source.named, 0);
        source.index.take();
        for &child in &children {
            self.node_mut(child).parent = Some(dst);
        }

        let target = self.node_mut(dst);
        target.value = value;
        target.children = children;
        target.named = named;
        self.free_subtree(src);
    }

    /// Stable sort of the children of `id` by key.
    pub(crate) fn sort_children_by_key(&mut self, id: NodeId) {
        let mut children = mem::take(&mut self.node_mut(id).children);
        children.sort_by(|a, b| self.node(*a).key.cmp(&self.node(*b).key));
        self.node_mut(id).children = children;
    }

    /// Compares two subtrees by key, value and shape.
    pub fn subtree_eq(&self, id: NodeId, other: &Tree, other_id: NodeId) -> bool {
        let a = self.node(id);
        let b = other.node(other_id);
        a.key == b.key
            && a.value == b.value
            && a.children.len() == b.children.len()
            && a.children
                .iter()
                .zip(&b.children)
                .all(|(&x, &y)| self.subtree_eq(x, other, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(tree: &Tree, id: NodeId) -> Vec<&str> {
        tree.children(id).iter().map(|&c| tree.key(c)).collect()
    }

    #[test]
    fn test_add_child_updates_named_count() {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.push_child(root, "a", "1");
        tree.push_child(root, "", "2");
        tree.push_child(root, "b", "3");

        assert_eq!(tree.child_count(root), 3);
        assert_eq!(tree.named_count(root), 2);
    }

    #[test]
    fn test_child_by_key_builds_index_lazily() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree.push_child(root, "a", "1");
        assert!(tree.node(root).index.get().is_none());

        assert_eq!(tree.child_by_key(root, "a"), Some(a));
        assert_eq!(tree.node(root).index.get().map(|i| i.len()), Some(1));

        // Later insertions keep the built index current.
        let b = tree.push_child(root, "b", "2");
        assert_eq!(tree.child_by_key(root, "b"), Some(b));
        assert_eq!(tree.child_by_key(root, "c"), None);
    }

    #[test]
    fn test_empty_key_is_never_found() {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.push_child(root, "", "x");
        tree.push_child(root, "a", "y");
        assert_eq!(tree.child_by_key(root, ""), None);
    }

    #[test]
    fn test_duplicate_keys_most_recent_wins() {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.push_child(root, "dup", "first");
        let second = tree.push_child(root, "dup", "second");

        assert_eq!(tree.child_by_key(root, "dup"), Some(second));
        assert_eq!(keys(&tree, root), vec!["dup", "dup"]);

        let third = tree.push_child(root, "dup", "third");
        assert_eq!(tree.child_by_key(root, "dup"), Some(third));
    }

    #[test]
    fn test_child_by_key_or_insert() {
        let mut tree = Tree::new();
        let root = tree.root();
        let created = tree.child_by_key_or_insert(root, "x");
        assert_eq!(tree.key(created), "x");
        assert!(tree.is_void(created));
        assert_eq!(tree.child_by_key_or_insert(root, "x"), created);
        assert_eq!(tree.child_count(root), 1);
    }

    #[test]
    fn test_set_key_transitions() {
        let mut tree = Tree::new();
        let root = tree.root();
        let child = tree.push_child(root, "", "v");
        assert_eq!(tree.named_count(root), 0);

        tree.set_key(child, "a");
        assert_eq!(tree.named_count(root), 1);
        assert_eq!(tree.child_by_key(root, "a"), Some(child));

        tree.set_key(child, "b");
        assert_eq!(tree.named_count(root), 1);
        assert_eq!(tree.child_by_key(root, "a"), None);
        assert_eq!(tree.child_by_key(root, "b"), Some(child));

        tree.set_key(child, "");
        assert_eq!(tree.named_count(root), 0);
        assert_eq!(tree.child_by_key(root, "b"), None);
    }

    #[test]
    fn test_set_key_before_index_exists() {
        let mut tree = Tree::new();
        let root = tree.root();
        let child = tree.push_child(root, "a", "");
        tree.set_key(child, "b");
        assert_eq!(tree.child_by_key(root, "b"), Some(child));
        assert_eq!(tree.child_by_key(root, "a"), None);
    }

    #[test]
    fn test_set_key_with_duplicate_falls_back() {
        let mut tree = Tree::new();
        let root = tree.root();
        let first = tree.push_child(root, "k", "1");
        let second = tree.push_child(root, "k", "2");
        assert_eq!(tree.child_by_key(root, "k"), Some(second));

        tree.set_key(second, "other");
        assert_eq!(tree.child_by_key(root, "k"), Some(first));
        assert_eq!(tree.child_by_key(root, "other"), Some(second));
    }

    #[test]
    fn test_detach_by_identity() {
        let mut tree = Tree::new();
        let root = tree.root();
        let first = tree.push_child(root, "dup", "1");
        let second = tree.push_child(root, "dup", "2");
        assert_eq!(tree.child_by_key(root, "dup"), Some(second));

        let detached = tree.detach(second);
        assert_eq!(detached, second);
        assert_eq!(tree.parent(second), None);
        assert_eq!(tree.children(root), &[first]);
        assert_eq!(tree.named_count(root), 1);
        assert_eq!(tree.child_by_key(root, "dup"), Some(first));

        // The orphan stays valid and can be attached again.
        assert_eq!(tree.add_child(root, second), second);
        assert_eq!(tree.child_by_key(root, "dup"), Some(second));
    }

    #[test]
    fn test_add_owned_child_attaches_copy() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree.push_child(root, "a", "1");
        tree.push_child(a, "inner", "2");
        let b = tree.push_child(root, "b", "");

        let copy = tree.add_child(b, a);
        assert_ne!(copy, a);
        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.parent(copy), Some(b));
        assert!(tree.subtree_eq(a, &tree, copy));
    }

    #[test]
    fn test_add_ancestor_attaches_copy() {
        let mut tree = Tree::new();
        let top = tree.create_node("top", "");
        let below = tree.push_child(top, "below", "");

        let copy = tree.add_child(below, top);
        assert_ne!(copy, top);
        assert_eq!(tree.parent(top), None);
        assert_eq!(tree.depth(copy), 2);
    }

    #[test]
    fn test_set_len_truncates_and_grows() {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.push_child(root, "a", "1");
        let b = tree.push_child(root, "b", "2");
        let grandchild = tree.push_child(b, "c", "3");

        tree.set_len(root, 1);
        assert_eq!(keys(&tree, root), vec!["a"]);
        assert_eq!(tree.named_count(root), 1);
        assert!(!tree.contains(b));
        assert!(!tree.contains(grandchild));
        assert_eq!(tree.child_by_key(root, "b"), None);

        tree.set_len(root, 3);
        assert_eq!(keys(&tree, root), vec!["a", "", ""]);
        assert_eq!(tree.named_count(root), 1);
    }

    #[test]
    fn test_discarded_slot_reuse_invalidates_handle() {
        let mut tree = Tree::new();
        let root = tree.root();
        let old = tree.push_child(root, "old", "");
        tree.discard(old);
        let new = tree.push_child(root, "new", "");

        assert!(!tree.contains(old));
        assert!(tree.contains(new));
        assert_eq!(tree.children(root), &[new]);
    }

    #[test]
    fn test_clone_is_deep_and_parentless() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree.push_child(root, "a", "1");
        tree.push_child(a, "b", "2");

        let copy = tree.clone_node(a);
        assert_eq!(tree.parent(copy), None);
        assert!(tree.subtree_eq(a, &tree, copy));

        let inner = tree.child(copy, 0).unwrap();
        tree.set_value(inner, "changed");
        assert_eq!(tree.value(tree.child(a, 0).unwrap()), "2");
    }

    #[test]
    fn test_copy_children_from() {
        let mut tree = Tree::new();
        let root = tree.root();
        let src = tree.push_child(root, "src", "");
        tree.push_child(src, "x", "1");
        tree.push_child(src, "y", "2");
        let dst = tree.push_child(root, "dst", "");
        tree.push_child(dst, "keep", "0");

        tree.copy_children_from(dst, src);
        assert_eq!(keys(&tree, dst), vec!["keep", "x", "y"]);
        assert_eq!(tree.named_count(dst), 3);

        tree.copy_children_from(dst, dst);
        assert_eq!(tree.child_count(dst), 3);
    }

    #[test]
    fn test_clear_keeps_key() {
        let mut tree = Tree::with_root("root", "v");
        let root = tree.root();
        let child = tree.push_child(root, "a", "1");
        tree.clear(root);

        assert_eq!(tree.key(root), "root");
        assert!(tree.is_void(root));
        assert_eq!(tree.named_count(root), 0);
        assert!(!tree.contains(child));
        assert_eq!(tree.child_by_key(root, "a"), None);
    }

    #[test]
    fn test_extract_and_import() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree.push_child(root, "a", "1");
        tree.push_child(a, "b", "2");

        let extracted = tree.extract(a);
        assert_eq!(extracted.key(extracted.root()), "a");
        assert!(extracted.subtree_eq(extracted.root(), &tree, a));

        let mut other = Tree::new();
        let imported = other.import(&tree, a);
        let other_root = other.root();
        other.add_child(other_root, imported);
        assert_eq!(other.child_by_key(other_root, "a"), Some(imported));
        assert_eq!(other.depth(other.child(imported, 0).unwrap()), 2);
    }

    #[test]
    fn test_sort_children_by_key_is_stable() {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.push_child(root, "b", "1");
        tree.push_child(root, "a", "2");
        tree.push_child(root, "b", "3");
        tree.sort_children_by_key(root);

        let values: Vec<&str> = tree.children(root).iter().map(|&c| tree.value(c)).collect();
        assert_eq!(values, vec!["2", "1", "3"]);
    }
}
