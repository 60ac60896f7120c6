// This module implements BenefitInliner, the orchestrator of one inlining attempt. It computes
// the budget (an explicit override or the hotness-based default), builds the dependency tree
// through the abstract-interpreter collaborator, packs the tree into the best proposal and finally
// drives the inlining transformer. The inlining pass walks the root body's real call sites in IR
// order, matches each to the tree child scored for the same bytecode index and, when that child is
// in the proposal, asks the transformer to inline it and recurses into the inlined body against
// the child's own subtree. A declined inline is counted and logged; its subtree is skipped and the
// walk continues. InliningReport summarizes the attempt for logging and the CLI.

//! End-to-end inlining driver.

use super::budget::compute_budget;
use super::packing;
use crate::core::{
    AbstractInterpreter, InlinerConfig, InlinerError, InlinerResult, InliningSession,
    InliningTransformer,
};
use crate::idt::{Idt, IdtBuilder, NodeId};
use crate::proposal::{InliningProposal, NodeSet};
use std::fmt;

/// Counts from the inlining pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InliningOutcome {
    pub inlined: usize,
    pub declined: usize,
}

/// Summary of one inlining attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct InliningReport {
    pub method: String,
    pub budget: i64,
    pub tree_nodes: usize,
    pub tree_cost: u64,
    pub selected_nodes: usize,
    pub selected_cost: u64,
    pub selected_benefit: f64,
    pub outcome: InliningOutcome,
}

impl fmt::Display for InliningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Inlining report for {}:", self.method)?;
        writeln!(f, "  Budget: {}", self.budget)?;
        writeln!(f, "  Tree: {} nodes, total cost {}", self.tree_nodes, self.tree_cost)?;
        writeln!(
            f,
            "  Selected: {} nodes, cost {}, benefit {:.2}",
            self.selected_nodes, self.selected_cost, self.selected_benefit
        )?;
        writeln!(
            f,
            "  Call sites: {} inlined, {} declined",
            self.outcome.inlined, self.outcome.declined
        )
    }
}

/// Benefit-driven inliner for one compilation attempt.
pub struct BenefitInliner<'c, 'arena> {
    session: &'arena InliningSession<'arena>,
    config: &'c InlinerConfig,
}

impl<'c, 'arena> BenefitInliner<'c, 'arena> {
    pub fn new(session: &'arena InliningSession<'arena>, config: &'c InlinerConfig) -> Self {
        Self { session, config }
    }

    pub fn session(&self) -> &'arena InliningSession<'arena> {
        self.session
    }

    /// Budget for a root method of `method_size` bytecodes.
    pub fn budget_for(&self, method_size: u32) -> InlinerResult<i64> {
        let budget = self
            .config
            .budget
            .unwrap_or_else(|| compute_budget(method_size, self.config.hotness));
        if budget < 0 {
            return Err(InlinerError::InvalidBudget { budget });
        }
        Ok(budget)
    }

    /// Build the dependency tree for `root`.
    pub fn obtain_idt<A: AbstractInterpreter>(
        &self,
        interpreter: &mut A,
        root: A::MethodRef,
    ) -> InlinerResult<Idt<'arena, A::MethodRef>> {
        let budget = self.budget_for(interpreter.bytecode_size(root))?;
        self.session.set_current_method(interpreter.signature(root));
        Ok(IdtBuilder::new(interpreter, self.config).build(self.session, root, budget))
    }

    /// Choose the nodes to inline.
    pub fn compute_proposal<'t, M: Copy>(
        &self,
        idt: &'t Idt<'arena, M>,
    ) -> InliningProposal<'t, 'arena, M> {
        packing::pack(idt)
    }

    /// Inline every call site of the root body whose tree node is in `proposal`.
    pub fn perform_inlining<T, S>(
        &self,
        idt: &Idt<'arena, T::MethodRef>,
        proposal: &S,
        transformer: &mut T,
    ) -> InliningOutcome
    where
        T: InliningTransformer,
        S: NodeSet + ?Sized,
    {
        let mut outcome = InliningOutcome::default();
        let body = transformer.root_body();
        self.inline_body(idt, proposal, transformer, NodeId::ROOT, body, &mut outcome);
        outcome
    }

    fn inline_body<T, S>(
        &self,
        idt: &Idt<'arena, T::MethodRef>,
        proposal: &S,
        transformer: &mut T,
        node: NodeId,
        body: T::BodyRef,
        outcome: &mut InliningOutcome,
    ) where
        T: InliningTransformer,
        S: NodeSet + ?Sized,
    {
        let calls: Vec<T::CallRef> = transformer.body_calls(body).collect();
        for call in calls {
            let bc_index = transformer.call_bc_index(call);
            let Some(child) = idt.find_child_with_bytecode_index(node, bc_index) else {
                continue;
            };
            if !proposal.is_node_in_proposal(child) {
                continue;
            }

            let target = idt.node(child).method();
            match transformer.inline_call(call, target) {
                Some(inlined) => {
                    log::trace!("Inlined {} at bc {}", idt.node(child).signature(), bc_index);
                    self.session.record_inlined();
                    outcome.inlined += 1;
                    self.inline_body(idt, proposal, transformer, child, inlined, outcome);
                }
                None => {
                    log::debug!(
                        "Inlining of {} at bc {} declined, skipping its subtree",
                        idt.node(child).signature(),
                        bc_index
                    );
                    self.session.record_declined();
                    outcome.declined += 1;
                }
            }
        }
    }

    /// Build, pack and inline for `root`.
    pub fn run<A, T>(
        &self,
        interpreter: &mut A,
        transformer: &mut T,
        root: A::MethodRef,
    ) -> InlinerResult<InliningReport>
    where
        A: AbstractInterpreter,
        T: InliningTransformer<MethodRef = A::MethodRef>,
    {
        let idt = self.obtain_idt(interpreter, root)?;
        let proposal = self.compute_proposal(&idt);
        let outcome = self.perform_inlining(&idt, &proposal, transformer);

        let report = InliningReport {
            method: idt.root().signature().to_string(),
            budget: idt.budget(),
            tree_nodes: idt.num_nodes(),
            tree_cost: idt.total_cost(),
            selected_nodes: proposal.num_nodes(),
            selected_cost: proposal.cost(),
            selected_benefit: proposal.benefit(),
            outcome,
        };
        log::info!(
            "{}: budget {}, {} of {} nodes selected (cost {}, benefit {:.2}), {} inlined, {} declined",
            report.method,
            report.budget,
            report.selected_nodes,
            report.tree_nodes,
            report.selected_cost,
            report.selected_benefit,
            outcome.inlined,
            outcome.declined
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CallKind, MethodHotness};
    use bumpalo::Bump;

    /// Bodies are numbered; body 0 is the root. Each body lists `(bc, call id)`.
    struct Bodies {
        calls: Vec<Vec<(u32, u32)>>,
        decline: Vec<u32>,
        inlined: Vec<(u32, u32)>,
    }

    impl InliningTransformer for Bodies {
        type MethodRef = u32;
        type BodyRef = usize;
        type CallRef = (u32, usize);

        fn root_body(&self) -> usize {
            0
        }

        fn body_calls(&self, body: usize) -> Box<dyn Iterator<Item = (u32, usize)> + '_> {
            Box::new(self.calls[body].iter().map(|&(bc, callee)| (bc, callee as usize)))
        }

        fn call_bc_index(&self, call: (u32, usize)) -> u32 {
            call.0
        }

        fn inline_call(&mut self, call: (u32, usize), target: u32) -> Option<usize> {
            if self.decline.contains(&target) {
                return None;
            }
            self.inlined.push((call.0, target));
            Some(call.1)
        }
    }

    fn tree<'a>(session: &'a InliningSession<'a>) -> Idt<'a, u32> {
        // root -> a@1 -> c@4
        //      -> b@2
        let mut idt = Idt::new(session, 0, "root", 10, 100);
        let a = idt.add_child(NodeId::ROOT, 1, "a", CallKind::Static, 1, 1.0, 10);
        idt.add_child(NodeId::ROOT, 2, "b", CallKind::Static, 2, 1.0, 10);
        idt.add_child(a, 3, "c", CallKind::Static, 4, 1.0, 10);
        idt
    }

    fn bodies() -> Bodies {
        // body 1 is a's body, body 2 b's, body 3 c's; bc 9 has no tree node.
        Bodies {
            calls: vec![vec![(1, 1), (2, 2), (9, 3)], vec![(4, 3)], vec![], vec![]],
            decline: Vec::new(),
            inlined: Vec::new(),
        }
    }

    #[test]
    fn test_budget_for() {
        let arena = Bump::new();
        let session = InliningSession::new(&arena);

        let config = InlinerConfig::default().with_hotness(MethodHotness::Cold);
        assert_eq!(BenefitInliner::new(&session, &config).budget_for(500), Ok(25));

        let config = InlinerConfig::default().with_budget(7);
        assert_eq!(BenefitInliner::new(&session, &config).budget_for(500), Ok(7));

        let config = InlinerConfig::default().with_budget(-1);
        assert_eq!(
            BenefitInliner::new(&session, &config).budget_for(500),
            Err(InlinerError::InvalidBudget { budget: -1 })
        );
    }

    #[test]
    fn test_inlines_selected_nodes_in_preorder() {
        let arena = Bump::new();
        let session = InliningSession::new(&arena);
        let idt = tree(&session);
        let config = InlinerConfig::default();
        let inliner = BenefitInliner::new(&session, &config);

        let mut proposal = InliningProposal::new(&idt);
        proposal.add_node(NodeId::ROOT);
        proposal.add_node(NodeId(1));
        proposal.add_node(NodeId(3));

        let mut transformer = bodies();
        let outcome = inliner.perform_inlining(&idt, &proposal, &mut transformer);
        assert_eq!(outcome, InliningOutcome { inlined: 2, declined: 0 });
        assert_eq!(transformer.inlined, vec![(1, 1), (4, 3)]);
        assert_eq!(session.stats().call_sites_inlined, 2);
    }

    #[test]
    fn test_declined_inline_skips_subtree() {
        let arena = Bump::new();
        let session = InliningSession::new(&arena);
        let idt = tree(&session);
        let config = InlinerConfig::default();
        let inliner = BenefitInliner::new(&session, &config);

        let mut proposal = InliningProposal::new(&idt);
        for id in 0..4 {
            proposal.add_node(NodeId(id));
        }
        let frozen = proposal.freeze();

        let mut transformer = bodies();
        transformer.decline.push(1);
        let outcome = inliner.perform_inlining(&idt, frozen, &mut transformer);
        assert_eq!(outcome, InliningOutcome { inlined: 1, declined: 1 });
        assert_eq!(transformer.inlined, vec![(2, 2)]);
        assert_eq!(session.stats().call_sites_declined, 1);
    }

    #[test]
    fn test_report_display() {
        let report = InliningReport {
            method: "main".to_string(),
            budget: 100,
            tree_nodes: 4,
            tree_cost: 30,
            selected_nodes: 4,
            selected_cost: 30,
            selected_benefit: 40.0,
            outcome: InliningOutcome { inlined: 3, declined: 0 },
        };
        let text = report.to_string();
        assert!(text.starts_with("Inlining report for main:"));
        assert!(text.contains("  Selected: 4 nodes, cost 30, benefit 40.00"));
        assert!(text.contains("  Call sites: 3 inlined, 0 declined"));
    }
}
