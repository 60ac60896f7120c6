// This module defines IdtNode, one real or candidate call target in the inlining dependency tree,
// together with NodeId (the node's global index inside its tree) and Children, the compact child
// list. Trees of inlining candidates are shallow and wide with many single-child chains, so
// Children stores no container for zero or one child and only spills to a Vec from the second
// child on; as_slice() presents every state uniformly as a slice. A node records its call-site
// bytecode index, callee handle and interned signature, cost (callee bytecode size, 0 for the
// root), static benefit, call ratio and accumulated root call ratio, remaining budget, parent
// link and the caller depth it was discovered at.

//! Dependency-tree nodes.

use crate::absint::InliningMethodSummary;
use crate::core::CallKind;
use std::slice;

/// Global index of a node inside its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Child list of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Children {
    #[default]
    None,
    One(NodeId),
    Many(Vec<NodeId>),
}

impl Children {
    pub fn push(&mut self, child: NodeId) {
        match self {
            Children::None => *self = Children::One(child),
            Children::One(first) => *self = Children::Many(vec![*first, child]),
            Children::Many(children) => children.push(child),
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Children::None)
    }

    pub fn get(&self, idx: usize) -> Option<NodeId> {
        self.as_slice().get(idx).copied()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        match self {
            Children::None => &[],
            Children::One(child) => slice::from_ref(child),
            Children::Many(children) => children,
        }
    }
}

/// One node of the inlining dependency tree.
#[derive(Debug, Clone)]
pub struct IdtNode<'arena, M> {
    pub(super) global_index: NodeId,
    pub(super) bc_index: u32,
    pub(super) method: M,
    pub(super) signature: &'arena str,
    pub(super) kind: Option<CallKind>,
    pub(super) callee_size: u32,
    pub(super) static_benefit: u32,
    pub(super) call_ratio: f64,
    pub(super) root_call_ratio: f64,
    pub(super) budget: i64,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Children,
    pub(super) caller_index: u32,
    pub(super) summary: InliningMethodSummary,
}

impl<'arena, M: Copy> IdtNode<'arena, M> {
    /// Factor applied to every benefit so small ratios stay comparable.
    pub const BENEFIT_SCALE: f64 = 10.0;

    pub fn global_index(&self) -> NodeId {
        self.global_index
    }

    /// Bytecode index of the call site in the parent; 0 for the root.
    pub fn bc_index(&self) -> u32 {
        self.bc_index
    }

    pub fn method(&self) -> M {
        self.method
    }

    pub fn signature(&self) -> &'arena str {
        self.signature
    }

    /// Dispatch kind of the call site; `None` for the root.
    pub fn kind(&self) -> Option<CallKind> {
        self.kind
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Code growth caused by inlining this node.
    pub fn cost(&self) -> u32 {
        if self.is_root() {
            0
        } else {
            self.callee_size
        }
    }

    /// Bytecode size of the method itself, also for the root.
    pub fn callee_size(&self) -> u32 {
        self.callee_size
    }

    pub fn static_benefit(&self) -> u32 {
        self.static_benefit
    }

    pub fn call_ratio(&self) -> f64 {
        self.call_ratio
    }

    pub fn root_call_ratio(&self) -> f64 {
        self.root_call_ratio
    }

    /// `root_call_ratio * (1 + static_benefit) * 10`.
    pub fn benefit(&self) -> f64 {
        self.root_call_ratio * (1.0 + self.static_benefit as f64) * Self::BENEFIT_SCALE
    }

    /// Budget left after paying for this node and all its ancestors.
    pub fn budget(&self) -> i64 {
        self.budget
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        self.children.as_slice()
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, idx: usize) -> NodeId {
        match self.children.get(idx) {
            Some(child) => child,
            None => panic!(
                "Child {} out of range for node {} with {} children",
                idx,
                self.global_index.0,
                self.children.len()
            ),
        }
    }

    /// Depth of the caller chain this node was discovered at.
    pub fn caller_index(&self) -> u32 {
        self.caller_index
    }

    pub fn summary(&self) -> &InliningMethodSummary {
        &self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_encoding_transitions() {
        let mut children = Children::default();
        assert!(children.is_empty());
        assert_eq!(children.len(), 0);
        assert_eq!(children.as_slice(), &[]);

        children.push(NodeId(3));
        assert_eq!(children, Children::One(NodeId(3)));
        assert_eq!(children.len(), 1);
        assert_eq!(children.get(0), Some(NodeId(3)));
        assert_eq!(children.as_slice(), &[NodeId(3)]);

        children.push(NodeId(5));
        children.push(NodeId(8));
        assert_eq!(children.as_slice(), &[NodeId(3), NodeId(5), NodeId(8)]);
        assert_eq!(children.get(3), None);
        assert!(matches!(children, Children::Many(_)));
    }
}
