//! Packing tests over a parsed program.
//!
//! Sweeps the budget across the whole range below the tree's total cost and
//! checks what every selected proposal must satisfy.

use benefit_inliner::core::{InlinerConfig, InliningSession};
use benefit_inliner::idt::{Idt, NodeId};
use benefit_inliner::inliner::{knapsack, BenefitInliner, IdtPreorderQueue};
use benefit_inliner::proposal::{InliningProposal, NodeSet};
use benefit_inliner::test_ir::{parse_program, MethodId, TestProgram, TestProgramAdaptor};
use bumpalo::Bump;
use std::fs;
use std::path::Path;

fn load_program(filename: &str) -> TestProgram {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/programs").join(filename);
    let contents = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    parse_program(&contents).unwrap_or_else(|e| panic!("Failed to parse {filename}: {e}"))
}

fn assert_parent_closed<S: NodeSet>(idt: &Idt<'_, MethodId>, proposal: &S) {
    for id in proposal.nodes() {
        if let Some(parent) = idt.parent(id) {
            assert!(
                proposal.is_node_in_proposal(parent),
                "Node #{} selected without its parent #{}",
                id.0,
                parent.0
            );
        }
    }
}

#[test]
fn test_budget_sweep_keeps_proposals_valid() {
    let _ = env_logger::builder().is_test(true).try_init();
    let program = load_program("shapes.tir");

    // Build the full tree once with a generous budget.
    let mut adaptor = TestProgramAdaptor::new(&program, "main").unwrap();
    let arena = Bump::new();
    let session = InliningSession::new(&arena);
    let config = InlinerConfig::default().with_budget(500);
    let inliner = BenefitInliner::new(&session, &config);
    let root = adaptor.root();
    let full = inliner.obtain_idt(&mut adaptor, root).unwrap();
    assert_eq!(full.total_cost(), 197);

    for budget in 0..full.total_cost() as i64 {
        let arena = Bump::new();
        let session = InliningSession::new(&arena);
        let config = InlinerConfig::default().with_budget(budget);
        let inliner = BenefitInliner::new(&session, &config);
        let idt = inliner.obtain_idt(&mut adaptor, root).unwrap();
        let proposal = inliner.compute_proposal(&idt);

        assert!(proposal.cost() <= budget as u64, "budget {}: cost {}", budget, proposal.cost());
        assert!(proposal.is_node_in_proposal(NodeId::ROOT));
        assert_parent_closed(&idt, &proposal);

        // Never worse than the root alone or the root with any fitting child.
        let root_benefit = idt.benefit(NodeId::ROOT);
        assert!(proposal.benefit() >= root_benefit);
        for &child in idt.children(NodeId::ROOT) {
            if idt.cost(child) as i64 <= budget {
                assert!(
                    proposal.benefit() >= root_benefit + idt.benefit(child),
                    "budget {}: benefit {} below root plus {}",
                    budget,
                    proposal.benefit(),
                    idt.node(child).signature()
                );
            }
        }
    }
}

#[test]
fn test_knapsack_on_fitting_tree_matches_select_all() {
    let _ = env_logger::builder().is_test(true).try_init();
    let program = load_program("shapes.tir");
    let mut adaptor = TestProgramAdaptor::new(&program, "main").unwrap();
    let arena = Bump::new();
    let session = InliningSession::new(&arena);
    let config = InlinerConfig::default().with_budget(197);
    let inliner = BenefitInliner::new(&session, &config);
    let root = adaptor.root();
    let idt = inliner.obtain_idt(&mut adaptor, root).unwrap();

    let fast = inliner.compute_proposal(&idt);
    assert!(session.stats().fast_path_taken);
    assert_eq!(fast.num_nodes(), idt.num_nodes());

    let packed = knapsack(&idt);
    assert_eq!(packed.cost(), fast.cost());
    assert_eq!(packed.benefit(), fast.benefit());
    assert!(session.stats().dp_cells_filled > 0);
}

#[test]
fn test_preorder_queue_visits_parents_first() {
    let program = load_program("shapes.tir");
    let mut adaptor = TestProgramAdaptor::new(&program, "main").unwrap();
    let arena = Bump::new();
    let session = InliningSession::new(&arena);
    let config = InlinerConfig::default();
    let inliner = BenefitInliner::new(&session, &config);
    let root = adaptor.root();
    let idt = inliner.obtain_idt(&mut adaptor, root).unwrap();

    let mut queue = IdtPreorderQueue::new(&idt);
    assert_eq!(queue.size(), idt.num_nodes());
    let order: Vec<NodeId> = (0..queue.size()).map(|row| queue.get(row)).collect();
    assert_eq!(order[0], NodeId::ROOT);
    for (row, id) in order.iter().enumerate() {
        if let Some(parent) = idt.parent(*id) {
            let parent_row = order.iter().position(|other| *other == parent).unwrap();
            assert!(parent_row < row, "#{} comes before its parent", id.0);
        }
    }
}

#[test]
fn test_proposal_sums_and_merge() {
    let program = load_program("nested.tir");
    let mut adaptor = TestProgramAdaptor::new(&program, "main").unwrap();
    let arena = Bump::new();
    let session = InliningSession::new(&arena);
    let config = InlinerConfig::default();
    let inliner = BenefitInliner::new(&session, &config);
    let root = adaptor.root();
    let idt = inliner.obtain_idt(&mut adaptor, root).unwrap();
    let gate = idt.find_child_with_bytecode_index(NodeId::ROOT, 1).unwrap();
    let prize = idt.find_child_with_bytecode_index(gate, 4).unwrap();
    let filler = idt.find_child_with_bytecode_index(NodeId::ROOT, 2).unwrap();

    let mut left = InliningProposal::new(&idt);
    left.add_node(NodeId::ROOT);
    left.add_node(gate);
    assert_eq!(left.cost(), 20);
    assert_eq!(left.benefit(), 20.0);

    let mut right = InliningProposal::new(&idt);
    right.add_node(prize);
    right.add_node(filler);
    let right = right.freeze();
    assert_eq!(right.cost(), 35);
    assert_eq!(right.benefit(), 80.0);
    assert!(!left.intersects(right));

    let mut merged = InliningProposal::new(&idt);
    merged.merge(&left, right);
    assert_eq!(merged.num_nodes(), 4);
    assert_eq!(merged.cost(), left.cost() + right.cost());
    assert_eq!(merged.benefit(), left.benefit() + right.benefit());
    for id in [NodeId::ROOT, gate, prize, filler] {
        assert!(merged.is_node_in_proposal(id));
    }

    let text = merged.print();
    assert!(text.starts_with("Proposal: 4 nodes, cost 55, benefit 100.00"));
    assert!(text.contains("prize cost=10 benefit=60.00"));
}
