// This module implements inlining proposals, the candidate answers of the packing algorithm. A
// proposal is a set of tree nodes stored as a bit set keyed by global index + 1. Two types split
// the lifecycle: InliningProposal is the mutable builder that owns its bits and lazily caches its
// (cost, benefit) pair, cleared by every mutation; freeze() consumes the builder and copies the
// bits into the session arena as a FrozenProposal whose cost and benefit are fixed. Frozen
// proposals are shared by reference between DP table cells and can never be mutated again, so no
// runtime frozen flag exists. The NodeSet trait gives both types the read-only set operations
// (membership, intersection, node iteration) used by the packing algorithm and the inlining pass.

//! Inlining proposals.

use super::bitset::{self, Keys, NodeBitSet};
use crate::idt::{Idt, NodeId};
use std::cell::Cell;
use std::fmt::Write as _;

/// Read-only view of a node set.
pub trait NodeSet {
    /// Packed keys (`global_index + 1`).
    fn words(&self) -> &[u64];

    fn is_node_in_proposal(&self, id: NodeId) -> bool {
        bitset::contains(self.words(), id.index() + 1)
    }

    fn intersects<S: NodeSet + ?Sized>(&self, other: &S) -> bool {
        bitset::intersects(self.words(), other.words())
    }

    fn is_empty(&self) -> bool {
        self.words().iter().all(|word| *word == 0)
    }

    fn num_nodes(&self) -> usize {
        bitset::count(self.words())
    }

    /// Selected nodes in increasing global index order.
    fn nodes(&self) -> NodeIds<'_> {
        NodeIds { keys: Keys::new(self.words()) }
    }
}

/// Iterator over the nodes of a [`NodeSet`].
pub struct NodeIds<'w> {
    keys: Keys<'w>,
}

impl Iterator for NodeIds<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        self.keys.next().map(|key| NodeId(key as u32 - 1))
    }
}

fn render<M: Copy>(set: &impl NodeSet, idt: &Idt<'_, M>, cost: u64, benefit: f64) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Proposal: {} nodes, cost {}, benefit {:.2}",
        set.num_nodes(),
        cost,
        benefit
    );
    for id in set.nodes() {
        let node = idt.node(id);
        let _ = writeln!(
            out,
            "  #{} bc={} {} cost={} benefit={:.2}",
            id.0,
            node.bc_index(),
            node.signature(),
            node.cost(),
            node.benefit()
        );
    }
    out
}

/// Mutable proposal under construction.
pub struct InliningProposal<'t, 'arena, M> {
    tree: &'t Idt<'arena, M>,
    bits: NodeBitSet,
    /// `(cost, benefit)`; `None` until computed after the last mutation.
    cache: Cell<Option<(u64, f64)>>,
}

impl<'t, 'arena, M: Copy> InliningProposal<'t, 'arena, M> {
    pub fn new(tree: &'t Idt<'arena, M>) -> Self {
        Self {
            tree,
            bits: NodeBitSet::with_capacity(tree.num_nodes() + 1),
            cache: Cell::new(None),
        }
    }

    pub fn tree(&self) -> &'t Idt<'arena, M> {
        self.tree
    }

    pub fn add_node(&mut self, id: NodeId) {
        assert!(
            id.index() < self.tree.num_nodes(),
            "Node {} is not part of the tree ({} nodes)",
            id.0,
            self.tree.num_nodes()
        );
        self.bits.insert(id.index() + 1);
        self.cache.set(None);
    }

    /// Become the union of `a` and `b`.
    pub fn merge<A: NodeSet + ?Sized, B: NodeSet + ?Sized>(&mut self, a: &A, b: &B) {
        self.bits.assign_union(a.words(), b.words());
        self.cache.set(None);
    }

    /// Add every node of `other`.
    pub fn union_with<S: NodeSet + ?Sized>(&mut self, other: &S) {
        self.bits.union_with(other.words());
        self.cache.set(None);
    }

    pub fn clear(&mut self) {
        self.bits.clear();
        self.cache.set(None);
    }

    pub fn cost(&self) -> u64 {
        self.cost_and_benefit().0
    }

    pub fn benefit(&self) -> f64 {
        self.cost_and_benefit().1
    }

    fn cost_and_benefit(&self) -> (u64, f64) {
        if let Some(cached) = self.cache.get() {
            return cached;
        }
        let computed = self.nodes().fold((0u64, 0.0f64), |(cost, benefit), id| {
            let node = self.tree.node(id);
            (cost + node.cost() as u64, benefit + node.benefit())
        });
        self.cache.set(Some(computed));
        computed
    }

    /// Commit the proposal into the session arena.
    pub fn freeze(self) -> &'arena FrozenProposal<'arena> {
        let (cost, benefit) = self.cost_and_benefit();
        let session = self.tree.session();
        let bits = session.alloc_slice(self.bits.as_words());
        session.record_proposal_frozen();
        session.alloc(FrozenProposal { bits, cost, benefit })
    }

    pub fn print(&self) -> String {
        render(self, self.tree, self.cost(), self.benefit())
    }
}

impl<M> NodeSet for InliningProposal<'_, '_, M> {
    fn words(&self) -> &[u64] {
        self.bits.as_words()
    }
}

/// Committed, immutable proposal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrozenProposal<'arena> {
    bits: &'arena [u64],
    cost: u64,
    benefit: f64,
}

static EMPTY_PROPOSAL: FrozenProposal<'static> = FrozenProposal { bits: &[], cost: 0, benefit: 0.0 };

impl<'arena> FrozenProposal<'arena> {
    /// The shared empty proposal.
    pub fn empty() -> &'arena FrozenProposal<'arena> {
        &EMPTY_PROPOSAL
    }

    pub fn cost(&self) -> u64 {
        self.cost
    }

    pub fn benefit(&self) -> f64 {
        self.benefit
    }

    pub fn print<M: Copy>(&self, idt: &Idt<'_, M>) -> String {
        render(self, idt, self.cost, self.benefit)
    }
}

impl NodeSet for FrozenProposal<'_> {
    fn words(&self) -> &[u64] {
        self.bits
    }
}
