//! Key-addressed node store for one evaluation.

use std::collections::HashMap;
use std::sync::Arc;

use slab::Slab;

use crate::node::{Node, NodeIndex};
use crate::Key;

/// Graph is a mapping from keys to nodes, scoped to one evaluation.
///
/// Nodes live in an arena and are addressed by [`NodeIndex`]. The graph is
/// append-only: there is no removal, so indices stay valid for its lifetime.
#[derive(Debug)]
pub struct Graph<K, V> {
    nodes: Slab<Node<K, V>>,
    index: HashMap<K, NodeIndex, ahash::RandomState>,
}

impl<K, V> Default for Graph<K, V> {
    fn default() -> Self {
        Self {
            nodes: Slab::new(),
            index: HashMap::default(),
        }
    }
}

impl<K: Key, V> Graph<K, V> {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Default::default()
    }

    /// Get the index of the node for a key, creating a pending node if absent.
    pub fn get_or_create(&mut self, key: &K) -> NodeIndex {
        if let Some(index) = self.index.get(key) {
            return *index;
        }
        let index = NodeIndex(self.nodes.insert(Node::new(key.clone())));
        self.index.insert(key.clone(), index);
        index
    }

    /// Look up the index of an existing node.
    pub fn index_of(&self, key: &K) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    /// Get the node for a key.
    pub fn get(&self, key: &K) -> Option<&Node<K, V>> {
        self.index_of(key).map(|index| &self.nodes[index.0])
    }

    /// Returns true if the key has a computed value.
    pub fn is_done(&self, key: &K) -> bool {
        self.get(key).is_some_and(Node::is_done)
    }

    /// The computed value for a key, if done.
    pub fn value(&self, key: &K) -> Option<Arc<V>> {
        self.get(key).and_then(|node| node.value().cloned())
    }

    /// Keys this key has requested, in first-request order.
    pub fn direct_deps(&self, key: &K) -> Vec<K> {
        self.get(key)
            .map(|node| node.direct_deps().iter().map(|i| self.key_at(i).clone()).collect())
            .unwrap_or_default()
    }

    /// Keys that requested this key, in first-request order.
    pub fn reverse_deps(&self, key: &K) -> Vec<K> {
        self.get(key)
            .map(|node| node.reverse_deps().iter().map(|i| self.key_at(i).clone()).collect())
            .unwrap_or_default()
    }

    /// Iterate over all nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Node<K, V>> + '_ {
        self.nodes.iter().map(|(_, node)| node)
    }

    /// Keys of nodes that are not done.
    pub fn pending_keys(&self) -> Vec<K> {
        self.iter()
            .filter(|node| !node.is_done())
            .map(|node| node.key().clone())
            .collect()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn node(&self, index: NodeIndex) -> &Node<K, V> {
        &self.nodes[index.0]
    }

    pub(crate) fn node_mut(&mut self, index: NodeIndex) -> &mut Node<K, V> {
        &mut self.nodes[index.0]
    }

    pub(crate) fn key_at(&self, index: NodeIndex) -> &K {
        self.nodes[index.0].key()
    }

    /// Record `parent -> dep` in both directions. Returns true if the edge was new.
    ///
    /// An edge to a dependency that is already done counts as signaled at once,
    /// so the parent's signaled count always equals its number of done deps.
    pub(crate) fn add_edge(&mut self, parent: NodeIndex, dep: NodeIndex) -> bool {
        if !self.nodes[parent.0].add_direct_dep(dep) {
            return false;
        }
        self.nodes[dep.0].add_reverse_dep(parent);
        if self.nodes[dep.0].is_done() {
            self.nodes[parent.0].signal();
        }
        true
    }
}
