// This module implements IdtPreorderQueue, which linearizes the dependency tree into DP rows.
// Nodes are handed out by decreasing benefit, ties broken by increasing cost and then by global
// index, but a node only becomes eligible once its parent has been handed out: the queue starts
// with the root and every popped node pushes its children. Ancestors therefore always receive
// smaller row numbers than their descendants, including children whose benefit exceeds their
// parent's. Rows are materialized on demand and cached, so get(i) may be called in any order.

//! Preorder priority order over the tree.

use crate::idt::{Idt, NodeId};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy)]
struct Entry {
    id: NodeId,
    benefit: f64,
    cost: u32,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    /// Greater means popped first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.benefit
            .total_cmp(&other.benefit)
            .then_with(|| other.cost.cmp(&self.cost))
            .then_with(|| other.id.cmp(&self.id))
    }
}

pub struct IdtPreorderQueue<'t, 'arena, M> {
    tree: &'t Idt<'arena, M>,
    heap: BinaryHeap<Entry>,
    order: Vec<NodeId>,
}

impl<'t, 'arena, M: Copy> IdtPreorderQueue<'t, 'arena, M> {
    pub fn new(tree: &'t Idt<'arena, M>) -> Self {
        let mut queue = Self {
            tree,
            heap: BinaryHeap::with_capacity(tree.num_nodes()),
            order: Vec::with_capacity(tree.num_nodes()),
        };
        queue.push(NodeId::ROOT);
        queue
    }

    pub fn size(&self) -> usize {
        self.tree.num_nodes()
    }

    /// Node assigned to row `idx`.
    pub fn get(&mut self, idx: usize) -> NodeId {
        assert!(idx < self.size(), "Row {} out of range ({} nodes)", idx, self.size());
        while self.order.len() <= idx {
            let Some(entry) = self.heap.pop() else {
                unreachable!("Preorder queue exhausted before row {}", idx);
            };
            self.order.push(entry.id);
            for child in self.tree.children(entry.id) {
                self.push(*child);
            }
        }
        self.order[idx]
    }

    fn push(&mut self, id: NodeId) {
        let node = self.tree.node(id);
        self.heap.push(Entry { id, benefit: node.benefit(), cost: node.cost() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::absint::InliningMethodSummary;
    use crate::core::{CallKind, InliningSession};
    use bumpalo::Bump;

    #[test]
    fn test_order_respects_benefit_then_cost() {
        let arena = Bump::new();
        let session = InliningSession::new(&arena);
        let mut idt = Idt::new(&session, 0u32, "root", 10, 100);
        let low = idt.add_child(NodeId::ROOT, 1, "low", CallKind::Static, 0, 0.2, 5);
        let cheap = idt.add_child(NodeId::ROOT, 2, "cheap", CallKind::Static, 1, 1.0, 5);
        let dear = idt.add_child(NodeId::ROOT, 3, "dear", CallKind::Static, 2, 1.0, 50);

        let mut queue = IdtPreorderQueue::new(&idt);
        assert_eq!(queue.size(), 4);
        assert_eq!(queue.get(3), low);
        assert_eq!(queue.get(0), NodeId::ROOT);
        assert_eq!(queue.get(1), cheap);
        assert_eq!(queue.get(2), dear);
    }

    #[test]
    fn test_child_with_higher_benefit_follows_parent() {
        let arena = Bump::new();
        let session = InliningSession::new(&arena);
        let mut idt = Idt::new(&session, 0u32, "root", 10, 100);
        let parent = idt.add_child(NodeId::ROOT, 1, "parent", CallKind::Static, 0, 0.5, 5);
        let sibling = idt.add_child(NodeId::ROOT, 2, "sibling", CallKind::Static, 1, 0.8, 5);
        let child = idt.add_child(parent, 3, "child", CallKind::Static, 0, 1.0, 5);
        idt.set_summary(child, InliningMethodSummary::new(), 9);
        assert!(idt.benefit(child) > idt.benefit(parent));

        let mut queue = IdtPreorderQueue::new(&idt);
        let order: Vec<_> = (0..queue.size()).map(|i| queue.get(i)).collect();
        assert_eq!(order, vec![NodeId::ROOT, sibling, parent, child]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_get_past_end_panics() {
        let arena = Bump::new();
        let session = InliningSession::new(&arena);
        let idt = Idt::new(&session, 0u32, "root", 10, 100);
        IdtPreorderQueue::new(&idt).get(1);
    }
}
