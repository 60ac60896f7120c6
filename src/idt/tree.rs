// This module implements Idt, the inlining dependency tree of one compilation attempt. Nodes
// live in a dense Vec indexed by their global index, so a NodeId is a stable arena handle and
// lookups by global index are O(1) without a separate flattening pass; flatten_idt() simply
// exposes that dense array to the packing algorithm. add_child() derives the child's cost from
// the callee size, its budget from the parent's budget and its root call ratio from the parent's,
// and appends it to the parent's compact child list. Recursive cost, child lookup by bytecode
// index and an indented textual dump are provided for the orchestrator and for diagnostics.

//! The inlining dependency tree.

use super::node::{Children, IdtNode, NodeId};
use crate::absint::InliningMethodSummary;
use crate::core::{CallKind, InliningSession};
use std::collections::VecDeque;
use std::fmt::Write as _;

/// Inlining dependency tree rooted at the method being compiled.
#[derive(Debug)]
pub struct Idt<'arena, M> {
    session: &'arena InliningSession<'arena>,
    nodes: Vec<IdtNode<'arena, M>>,
}

impl<'arena, M: Copy> Idt<'arena, M> {
    /// Create a tree holding only the root.
    pub fn new(
        session: &'arena InliningSession<'arena>,
        method: M,
        signature: &str,
        method_size: u32,
        budget: i64,
    ) -> Self {
        session.record_node_created();
        let root = IdtNode {
            global_index: NodeId::ROOT,
            bc_index: 0,
            method,
            signature: session.intern_str(signature),
            kind: None,
            callee_size: method_size,
            static_benefit: 0,
            call_ratio: 1.0,
            root_call_ratio: 1.0,
            budget,
            parent: None,
            children: Children::None,
            caller_index: 0,
            summary: InliningMethodSummary::new(),
        };
        Self { session, nodes: vec![root] }
    }

    pub fn session(&self) -> &'arena InliningSession<'arena> {
        self.session
    }

    pub fn root(&self) -> &IdtNode<'arena, M> {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> &IdtNode<'arena, M> {
        self.get_node_by_global_index(id.index())
    }

    pub fn get_node_by_global_index(&self, idx: usize) -> &IdtNode<'arena, M> {
        assert!(idx < self.nodes.len(), "Node index {} out of range ({})", idx, self.nodes.len());
        &self.nodes[idx]
    }

    /// Dense array of all nodes, indexed by global index.
    pub fn flatten_idt(&self) -> &[IdtNode<'arena, M>] {
        &self.nodes
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Budget of the whole compilation (the root's budget).
    pub fn budget(&self) -> i64 {
        self.root().budget
    }

    /// Add a call target below `parent`.
    ///
    /// The child pays `callee_size` out of the parent's remaining budget; the
    /// result may be negative for a leaf that does not fit.
    #[allow(clippy::too_many_arguments)]
    pub fn add_child(
        &mut self,
        parent: NodeId,
        method: M,
        signature: &str,
        kind: CallKind,
        bc_index: u32,
        call_ratio: f64,
        callee_size: u32,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let parent_node = self.node(parent);
        let child = IdtNode {
            global_index: id,
            bc_index,
            method,
            signature: self.session.intern_str(signature),
            kind: Some(kind),
            callee_size,
            static_benefit: 0,
            call_ratio,
            root_call_ratio: parent_node.root_call_ratio * call_ratio,
            budget: parent_node.budget - callee_size as i64,
            parent: Some(parent),
            children: Children::None,
            caller_index: parent_node.caller_index + 1,
            summary: InliningMethodSummary::new(),
        };
        self.nodes.push(child);
        self.nodes[parent.index()].children.push(id);
        self.session.record_node_created();
        log::trace!(
            "IDT node {} <- {} at bc {}: {} (cost {}, budget {})",
            id.0,
            parent.0,
            bc_index,
            signature,
            callee_size,
            self.nodes[id.index()].budget
        );
        id
    }

    /// Record the abstract-interpretation result for `id`.
    pub fn set_summary(&mut self, id: NodeId, summary: InliningMethodSummary, static_benefit: u32) {
        let node = &mut self.nodes[id.index()];
        node.summary = summary;
        node.static_benefit = static_benefit;
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }

    pub fn num_children(&self, id: NodeId) -> usize {
        self.node(id).num_children()
    }

    pub fn child(&self, id: NodeId, idx: usize) -> NodeId {
        self.node(id).child(idx)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn cost(&self, id: NodeId) -> u32 {
        self.node(id).cost()
    }

    pub fn benefit(&self, id: NodeId) -> f64 {
        self.node(id).benefit()
    }

    /// First child called from bytecode index `bc_index`.
    pub fn find_child_with_bytecode_index(&self, id: NodeId, bc_index: u32) -> Option<NodeId> {
        match &self.node(id).children {
            Children::None => None,
            Children::One(child) => (self.node(*child).bc_index == bc_index).then_some(*child),
            Children::Many(children) => children
                .iter()
                .copied()
                .find(|child| self.node(*child).bc_index == bc_index),
        }
    }

    /// Cost of `id` plus the cost of all its descendants.
    pub fn recursive_cost(&self, id: NodeId) -> u64 {
        let mut total = 0u64;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            total += self.cost(current) as u64;
            stack.extend_from_slice(self.children(current));
        }
        total
    }

    /// Cost of inlining every node in the tree.
    pub fn total_cost(&self) -> u64 {
        self.recursive_cost(NodeId::ROOT)
    }

    /// Whether `ancestor` lies on the path from `id` to the root (inclusive).
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Node ids in breadth-first order, root first.
    pub fn breadth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::from([NodeId::ROOT]);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            queue.extend(self.children(id).iter().copied());
        }
        order
    }

    /// Indented dump of the tree.
    pub fn print(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(NodeId::ROOT, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id);
            let _ = writeln!(
                out,
                "{}#{} bc={} {} cost={} benefit={:.2} budget={}",
                "  ".repeat(depth),
                id.0,
                node.bc_index,
                node.signature,
                node.cost(),
                node.benefit(),
                node.budget
            );
            for child in node.children().iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        out
    }
}
