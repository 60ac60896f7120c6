// This module provides arena-based session management for one inlining attempt using the bumpalo
// crate. InliningSession owns a reference to the arena that backs every committed (frozen)
// proposal and every interned method signature, so the dependency tree, the DP table and the
// final proposal all share one lifetime that ends with the compilation attempt. The session also
// tracks the method currently being planned and gathers statistics: tree nodes created, targets
// rejected by policy, proposals frozen into the DP table, cells filled, whether the everything-fits
// fast path was taken, and how many call sites the transformation inlined or declined.
// SessionStats implements Display for diagnostic dumps from the CLI.

//! Arena-based inlining session management.
//!
//! All objects that outlive a single algorithm step (frozen proposals, interned
//! signatures) are allocated in the session arena and dropped together when the
//! compilation attempt is abandoned or finished.

use bumpalo::Bump;
use std::collections::HashMap;
use std::cell::RefCell;
use std::fmt;

/// Arena-based inlining session.
///
/// One session corresponds to one compilation attempt of one root method. Nothing
/// allocated here is shared across sessions.
#[derive(Debug)]
pub struct InliningSession<'arena> {
    /// Arena allocator for committed objects.
    arena: &'arena Bump,

    /// Session statistics for debugging and tuning.
    stats: RefCell<SessionStats>,

    /// Interned method signatures.
    interned_strings: RefCell<HashMap<String, &'arena str>>,

    /// Root method currently being planned.
    current_method: RefCell<Option<String>>,
}

impl<'arena> InliningSession<'arena> {
    /// Create a new session over the given arena.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            stats: RefCell::new(SessionStats::default()),
            interned_strings: RefCell::new(HashMap::new()),
            current_method: RefCell::new(None),
        }
    }

    /// Get access to the arena allocator.
    pub fn arena(&self) -> &'arena Bump {
        self.arena
    }

    /// Allocate an object in the session arena.
    pub fn alloc<T>(&self, value: T) -> &'arena mut T {
        self.arena.alloc(value)
    }

    /// Allocate a slice in the session arena.
    pub fn alloc_slice<T>(&self, slice: &[T]) -> &'arena [T]
    where
        T: Copy,
    {
        self.arena.alloc_slice_copy(slice)
    }

    /// Intern a string in the arena.
    pub fn intern_str(&self, s: &str) -> &'arena str {
        let mut strings = self.interned_strings.borrow_mut();
        if let Some(&interned) = strings.get(s) {
            return interned;
        }

        let interned = self.arena.alloc_str(s);
        strings.insert(s.to_string(), interned);
        interned
    }

    /// Set the root method being planned.
    pub fn set_current_method(&self, name: &str) {
        *self.current_method.borrow_mut() = Some(name.to_string());
    }

    /// Root method being planned, if any.
    pub fn current_method(&self) -> Option<String> {
        self.current_method.borrow().clone()
    }

    /// Record a node added to the dependency tree.
    pub fn record_node_created(&self) {
        self.stats.borrow_mut().nodes_created += 1;
    }

    /// Record a call target dropped by the tree-building policy.
    pub fn record_target_rejected(&self) {
        self.stats.borrow_mut().targets_rejected += 1;
    }

    /// Record a proposal committed to the arena.
    pub fn record_proposal_frozen(&self) {
        self.stats.borrow_mut().proposals_frozen += 1;
    }

    /// Record a DP table cell computed.
    pub fn record_cell_filled(&self) {
        self.stats.borrow_mut().dp_cells_filled += 1;
    }

    /// Record that the whole tree fit into the budget.
    pub fn record_fast_path(&self) {
        self.stats.borrow_mut().fast_path_taken = true;
    }

    /// Record a call site the transformation inlined.
    pub fn record_inlined(&self) {
        self.stats.borrow_mut().call_sites_inlined += 1;
    }

    /// Record a call site the transformation declined.
    pub fn record_declined(&self) {
        self.stats.borrow_mut().call_sites_declined += 1;
    }

    /// Get session statistics.
    pub fn stats(&self) -> SessionStats {
        self.stats.borrow().clone()
    }
}

/// Inlining session statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// Nodes created in the dependency tree, root included.
    pub nodes_created: usize,

    /// Call targets dropped by policy while building the tree.
    pub targets_rejected: usize,

    /// Proposals committed to the arena.
    pub proposals_frozen: usize,

    /// DP table cells that received a new proposal.
    pub dp_cells_filled: usize,

    /// Whether the everything-fits fast path was taken.
    pub fast_path_taken: bool,

    /// Call sites inlined by the transformation.
    pub call_sites_inlined: usize,

    /// Call sites the transformation declined.
    pub call_sites_declined: usize,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Inlining Session Statistics:")?;
        writeln!(f, "  Tree nodes created: {}", self.nodes_created)?;
        writeln!(f, "  Targets rejected: {}", self.targets_rejected)?;
        writeln!(f, "  Proposals frozen: {}", self.proposals_frozen)?;
        writeln!(f, "  DP cells filled: {}", self.dp_cells_filled)?;
        writeln!(f, "  Fast path taken: {}", self.fast_path_taken)?;
        writeln!(f, "  Call sites inlined: {}", self.call_sites_inlined)?;
        writeln!(f, "  Call sites declined: {}", self.call_sites_declined)?;
        Ok(())
    }
}
