// This module implements the packing step: choosing the subset of dependency-tree nodes with the
// highest total benefit whose total cost fits the budget, under the constraint that a node is only
// chosen together with its parent. When the whole tree fits, every node is selected without
// building a table. Otherwise a knapsack-style DP runs over rows given by IdtPreorderQueue and
// columns 1..=budget. For each cell the current node is paired with the ancestors the base cell
// (one row back, left by the candidate's cost) does not already provide; the base is then moved
// further back while it overlaps the candidate or lacks the candidate's topmost missing parent.
// If no usable base remains, the candidate is completed up to the root on its own. The merged set
// is committed when it fits the column and beats the cell above; otherwise the cell above is
// carried forward by reference. Every committed cell is closed under parents.

//! Knapsack packing over the dependency tree.

use super::queue::IdtPreorderQueue;
use crate::idt::{Idt, NodeId};
use crate::proposal::{FrozenProposal, InliningProposal, InliningProposalTable, NodeSet};

/// Best proposal for `idt` within the root budget.
///
/// Uses [`select_all`] when the whole tree fits and [`knapsack`] otherwise.
pub fn pack<'t, 'arena, M: Copy>(idt: &'t Idt<'arena, M>) -> InliningProposal<'t, 'arena, M> {
    let budget = idt.budget();
    assert!(budget >= 0, "Packing requires a non-negative budget, got {}", budget);

    let total_cost = idt.total_cost();
    if total_cost <= budget as u64 {
        log::debug!(
            "Whole tree fits: cost {} within budget {}, selecting all {} nodes",
            total_cost,
            budget,
            idt.num_nodes()
        );
        idt.session().record_fast_path();
        return select_all(idt);
    }

    log::debug!(
        "Tree cost {} exceeds budget {}, packing {} nodes",
        total_cost,
        budget,
        idt.num_nodes()
    );
    knapsack(idt)
}

/// Proposal containing every node, added breadth-first.
pub fn select_all<'t, 'arena, M: Copy>(idt: &'t Idt<'arena, M>) -> InliningProposal<'t, 'arena, M> {
    let mut proposal = InliningProposal::new(idt);
    for id in idt.breadth_first() {
        proposal.add_node(id);
    }
    proposal
}

/// Run the DP over the whole tree regardless of its total cost.
pub fn knapsack<'t, 'arena, M: Copy>(idt: &'t Idt<'arena, M>) -> InliningProposal<'t, 'arena, M> {
    let budget = idt.budget().max(0) as usize;
    let rows = idt.num_nodes();
    let session = idt.session();

    let mut queue = IdtPreorderQueue::new(idt);
    let mut table = InliningProposalTable::new(rows, budget);
    let mut candidate = InliningProposal::new(idt);

    for row in 0..rows {
        let current = queue.get(row);
        for col in 1..=budget {
            candidate.clear();
            candidate.add_node(current);

            // Pull in the ancestors the base cell does not provide.
            let mut top = current;
            while let Some(parent) = idt.parent(top) {
                let base = table.get_by_offset(row, 1, col, candidate.cost() as usize);
                if base.is_node_in_proposal(parent) {
                    break;
                }
                candidate.add_node(parent);
                top = parent;
            }

            let mut row_offset = 1;
            let mut base = table.get_by_offset(row, row_offset, col, candidate.cost() as usize);
            while !base.is_empty()
                && (candidate.intersects(base) || !provides_parent(idt, base, top))
            {
                row_offset += 1;
                base = table.get_by_offset(row, row_offset, col, candidate.cost() as usize);
            }

            if base.is_empty() {
                while let Some(parent) = idt.parent(top) {
                    candidate.add_node(parent);
                    top = parent;
                }
            }

            let mut merged = InliningProposal::new(idt);
            merged.merge(base, &candidate);

            let previous = table.get_by_offset(row, 1, col, 0);
            if merged.cost() <= col as u64 && merged.benefit() > previous.benefit() {
                table.set(row, col, merged.freeze());
                session.record_cell_filled();
            } else {
                table.set(row, col, previous);
            }
        }

        log::trace!(
            "Row {} (node {}): best at full budget has benefit {:.2}",
            row,
            current.0,
            table.get(row, budget).benefit()
        );
    }

    let mut result = InliningProposal::new(idt);
    result.merge(FrozenProposal::empty(), table.get(rows - 1, budget));
    result.add_node(NodeId::ROOT);
    result
}

/// Whether `base` already contains the parent `top` is missing.
fn provides_parent<M: Copy>(idt: &Idt<'_, M>, base: &FrozenProposal<'_>, top: NodeId) -> bool {
    idt.parent(top).is_some_and(|parent| base.is_node_in_proposal(parent))
}
