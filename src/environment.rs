//! Dependency broker handed to one function invocation.

use std::sync::Arc;

use indexmap::IndexSet;

use crate::function::Computed;
use crate::graph::Graph;
use crate::node::NodeIndex;
use crate::queue::WorkQueue;
use crate::tracer::Tracer;
use crate::Key;

/// Environment mediates the dependency requests of exactly one function
/// invocation and remembers which of them were unresolved.
///
/// A fresh environment is bound for every invocation and dropped when the
/// function returns.
pub struct Environment<'a, K, V> {
    graph: &'a mut Graph<K, V>,
    queue: &'a mut WorkQueue,
    tracer: &'a dyn Tracer,
    current: NodeIndex,
    /// Distinct dependencies requested by this invocation, in request order.
    requested: IndexSet<NodeIndex, ahash::RandomState>,
    missing: usize,
}

impl<'a, K: Key, V> Environment<'a, K, V> {
    pub(crate) fn new(
        graph: &'a mut Graph<K, V>,
        queue: &'a mut WorkQueue,
        tracer: &'a dyn Tracer,
        current: NodeIndex,
    ) -> Self {
        Self {
            graph,
            queue,
            tracer,
            current,
            requested: IndexSet::default(),
            missing: 0,
        }
    }

    /// The key being computed.
    pub fn key(&self) -> &K {
        self.graph.key_at(self.current)
    }

    /// Request the value of a dependency.
    ///
    /// Returns the value if the dependency is done. Otherwise the dependency is
    /// scheduled (unless it already is), this invocation is marked as missing a
    /// dependency, and `None` is returned.
    ///
    /// The edge from the current key to `key` is recorded the first time this
    /// invocation sees `key`; repeated requests in one pass are free.
    pub fn get_value(&mut self, key: &K) -> Option<Arc<V>> {
        let dep = self.graph.get_or_create(key);
        let first_request = self.requested.insert(dep);

        if first_request && self.graph.add_edge(self.current, dep) {
            self.tracer.on_dependency_registered(
                self.graph.key_at(self.current),
                key,
                self.graph.node(dep).is_done(),
            );
        }

        if let Some(value) = self.graph.node(dep).value() {
            return Some(value.clone());
        }

        if first_request {
            self.missing += 1;
        }
        let node = self.graph.node_mut(dep);
        if !node.is_scheduled() {
            node.mark_scheduled();
            self.queue.push(dep);
        }
        None
    }

    /// Returns true if any request in this invocation returned `None`.
    pub fn nodes_missing(&self) -> bool {
        self.missing > 0
    }

    /// Wrap `value` as the result of this invocation.
    ///
    /// Returns [`Computed::NotFinished`] instead if any dependency was missing,
    /// so a function cannot finish with a value built from absent inputs.
    pub fn finish(&self, value: V) -> Computed<V> {
        if self.nodes_missing() {
            Computed::NotFinished
        } else {
            Computed::Done(value)
        }
    }

    /// Number of distinct dependencies found unresolved in this invocation.
    pub fn missing_count(&self) -> usize {
        self.missing
    }

    /// Distinct dependency keys requested so far in this invocation, in request order.
    pub fn requested(&self) -> Vec<K> {
        self.requested
            .iter()
            .map(|index| self.graph.key_at(*index).clone())
            .collect()
    }
}
