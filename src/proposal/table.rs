// This module implements InliningProposalTable, the memo table of the packing algorithm. It is a
// dense rows x (budget + 1) grid of references to frozen proposals living in the session arena;
// rows follow the preorder priority order of the tree nodes and columns are remaining-budget
// values. Cells that were never filled, and every lookup that would step before row 0 or column 0,
// yield the shared empty proposal, so the recurrence can look up and to the left by arbitrary
// offsets without underflowing.

//! DP memo table of frozen proposals.

use super::set::FrozenProposal;

pub struct InliningProposalTable<'arena> {
    rows: usize,
    cols: usize,
    cells: Vec<Option<&'arena FrozenProposal<'arena>>>,
}

impl<'arena> InliningProposalTable<'arena> {
    /// Table for `rows` nodes and budgets `0..=budget`.
    pub fn new(rows: usize, budget: usize) -> Self {
        let cols = budget + 1;
        Self { rows, cols, cells: vec![None; rows * cols] }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> &'arena FrozenProposal<'arena> {
        self.cells[self.index(row, col)].unwrap_or_else(FrozenProposal::empty)
    }

    pub fn set(&mut self, row: usize, col: usize, proposal: &'arena FrozenProposal<'arena>) {
        let idx = self.index(row, col);
        self.cells[idx] = Some(proposal);
    }

    /// `get(row - row_offset, col - col_offset)`, or the empty proposal if
    /// either index would be negative.
    pub fn get_by_offset(
        &self,
        row: usize,
        row_offset: usize,
        col: usize,
        col_offset: usize,
    ) -> &'arena FrozenProposal<'arena> {
        match (row.checked_sub(row_offset), col.checked_sub(col_offset)) {
            (Some(row), Some(col)) => self.get(row, col),
            _ => FrozenProposal::empty(),
        }
    }

    fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "Table cell ({}, {}) out of range ({} x {})",
            row,
            col,
            self.rows,
            self.cols
        );
        row * self.cols + col
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CallKind, InliningSession};
    use crate::idt::{Idt, NodeId};
    use crate::proposal::{InliningProposal, NodeSet};
    use bumpalo::Bump;

    #[test]
    fn test_unset_cells_are_empty() {
        let table = InliningProposalTable::new(3, 10);
        assert_eq!(table.rows(), 3);
        assert_eq!(table.cols(), 11);
        assert!(table.get(2, 10).is_empty());
        assert!(std::ptr::eq(table.get(0, 0), FrozenProposal::empty()));
    }

    #[test]
    fn test_get_by_offset() {
        let arena = Bump::new();
        let session = InliningSession::new(&arena);
        let mut idt = Idt::new(&session, 0u32, "root", 10, 20);
        idt.add_child(NodeId::ROOT, 1, "a", CallKind::Static, 0, 1.0, 5);

        let mut proposal = InliningProposal::new(&idt);
        proposal.add_node(NodeId(1));
        let frozen = proposal.freeze();

        let mut table = InliningProposalTable::new(2, 20);
        table.set(0, 15, frozen);
        assert!(std::ptr::eq(table.get(0, 15), frozen));
        assert!(std::ptr::eq(table.get_by_offset(1, 1, 20, 5), frozen));
        assert!(table.get_by_offset(1, 0, 20, 5).is_empty());
        assert!(table.get_by_offset(0, 1, 15, 0).is_empty());
        assert!(table.get_by_offset(1, 1, 3, 5).is_empty());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_panics() {
        let table = InliningProposalTable::new(2, 4);
        table.get(2, 0);
    }
}
