//! De-duplicating FIFO of nodes awaiting an invocation.

use std::collections::{HashSet, VecDeque};

use crate::node::NodeIndex;

/// FIFO of pending work. A node appears at most once while queued.
#[derive(Debug, Default)]
pub(crate) struct WorkQueue {
    order: VecDeque<NodeIndex>,
    queued: HashSet<NodeIndex, ahash::RandomState>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push to the back. Returns false if the node is already queued.
    pub fn push(&mut self, index: NodeIndex) -> bool {
        if !self.queued.insert(index) {
            return false;
        }
        self.order.push_back(index);
        true
    }

    pub fn pop(&mut self) -> Option<NodeIndex> {
        let index = self.order.pop_front()?;
        self.queued.remove(&index);
        Some(index)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}
