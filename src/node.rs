use std::sync::Arc;

use indexmap::IndexSet;

/// Stable index of a node inside its [`Graph`](crate::Graph).
///
/// Indices are never reused within one graph because nodes are never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    /// Get the raw arena slot.
    pub fn raw(&self) -> usize {
        self.0
    }
}

/// Evaluation state of a node. `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// The value has not been computed yet.
    Pending,
    /// The value is computed and immutable.
    Done,
}

/// Node is the per-key record of evaluation state, value, and dependency edges.
///
/// Only the [`Executor`](crate::Executor) mutates a node. Edge sets are
/// append-only for the lifetime of the graph.
#[derive(Debug, Clone)]
pub struct Node<K, V> {
    key: K,
    state: NodeState,
    value: Option<Arc<V>>,
    direct_deps: Edges,
    reverse_deps: Edges,
    signaled_count: usize,
    /// Set from the first enqueue until the node is done.
    scheduled: bool,
    invocations: usize,
}

impl<K, V> Node<K, V> {
    pub(crate) fn new(key: K) -> Self {
        Self {
            key,
            state: NodeState::Pending,
            value: None,
            direct_deps: Edges::default(),
            reverse_deps: Edges::default(),
            signaled_count: 0,
            scheduled: false,
            invocations: 0,
        }
    }

    /// The key this node computes.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Current state.
    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Returns true if the value is computed.
    pub fn is_done(&self) -> bool {
        self.state == NodeState::Done
    }

    /// The computed value, present iff the node is done.
    pub fn value(&self) -> Option<&Arc<V>> {
        self.value.as_ref()
    }

    /// Keys this node has ever requested, in first-request order.
    pub fn direct_deps(&self) -> &Edges {
        &self.direct_deps
    }

    /// Nodes that have requested this node, in first-request order.
    pub fn reverse_deps(&self) -> &Edges {
        &self.reverse_deps
    }

    /// Number of direct dependencies known to be done.
    pub fn signaled_count(&self) -> usize {
        self.signaled_count
    }

    /// Number of times the function for this node was invoked.
    pub fn invocations(&self) -> usize {
        self.invocations
    }

    /// Returns true if every currently recorded dependency is done.
    ///
    /// Always compares against the live size of `direct_deps`, which can grow
    /// between restarts.
    pub fn is_ready(&self) -> bool {
        self.signaled_count == self.direct_deps.len()
    }

    pub(crate) fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub(crate) fn mark_scheduled(&mut self) {
        self.scheduled = true;
    }

    pub(crate) fn record_invocation(&mut self) {
        self.invocations += 1;
    }

    /// Transition to `Done`. Panics if the node is already done.
    pub(crate) fn complete(&mut self, value: Arc<V>) {
        assert!(!self.is_done(), "a done node must never be reassigned");
        self.state = NodeState::Done;
        self.value = Some(value);
        self.scheduled = false;
    }

    /// Returns true if the edge was new.
    pub(crate) fn add_direct_dep(&mut self, dep: NodeIndex) -> bool {
        self.direct_deps.insert(dep)
    }

    pub(crate) fn add_reverse_dep(&mut self, parent: NodeIndex) -> bool {
        self.reverse_deps.insert(parent)
    }

    pub(crate) fn signal(&mut self) {
        debug_assert!(self.signaled_count < self.direct_deps.len());
        self.signaled_count += 1;
    }
}

/// Append-only, order-preserving set of node indices.
///
/// Iteration by position stays valid while new edges are appended, so the
/// executor can walk a node's parents while signaling them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Edges(IndexSet<NodeIndex, ahash::RandomState>);

impl Edges {
    fn insert(&mut self, index: NodeIndex) -> bool {
        self.0.insert(index)
    }

    /// Returns true if there are no edges.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of edges.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Get the edge at a position.
    pub fn get(&self, position: usize) -> Option<NodeIndex> {
        self.0.get_index(position).copied()
    }

    /// Returns true if the edge exists.
    pub fn contains(&self, index: NodeIndex) -> bool {
        self.0.contains(&index)
    }

    /// Iterate over the edges in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.0.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_is_pending_and_ready() {
        let node: Node<&str, i32> = Node::new("a");
        assert_eq!(node.state(), NodeState::Pending);
        assert!(node.value().is_none());
        assert!(node.direct_deps().is_empty());
        assert!(node.is_ready());
    }

    #[test]
    fn test_edges_deduplicate_and_keep_order() {
        let mut node: Node<&str, i32> = Node::new("a");
        assert!(node.add_direct_dep(NodeIndex(3)));
        assert!(node.add_direct_dep(NodeIndex(1)));
        assert!(!node.add_direct_dep(NodeIndex(3)));
        assert_eq!(
            node.direct_deps().iter().collect::<Vec<_>>(),
            vec![NodeIndex(3), NodeIndex(1)]
        );
        assert_eq!(node.direct_deps().get(1), Some(NodeIndex(1)));
    }

    #[test]
    fn test_readiness_uses_live_dep_count() {
        let mut node: Node<&str, i32> = Node::new("a");
        node.add_direct_dep(NodeIndex(1));
        node.signal();
        assert!(node.is_ready());

        node.add_direct_dep(NodeIndex(2));
        assert!(!node.is_ready());
        node.signal();
        assert!(node.is_ready());
    }

    #[test]
    fn test_complete_is_terminal() {
        let mut node: Node<&str, i32> = Node::new("a");
        node.mark_scheduled();
        node.complete(Arc::new(7));
        assert!(node.is_done());
        assert!(!node.is_scheduled());
        assert_eq!(node.value().map(|v| **v), Some(7));
    }

    #[test]
    #[should_panic]
    fn test_complete_twice_panics() {
        let mut node: Node<&str, i32> = Node::new("a");
        node.complete(Arc::new(1));
        node.complete(Arc::new(2));
    }
}
