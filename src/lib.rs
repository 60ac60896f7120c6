//! Benefit-driven inlining decisions for a JIT compiler.
//!
//! Given a root method and a code-growth budget, the inliner builds an
//! inlining dependency tree (IDT) of candidate call targets, scores every
//! candidate with benefits derived from abstract interpretation, picks the
//! most beneficial subset that fits the budget with a tree-constrained
//! knapsack, and finally drives the inlining transformation over that subset.
//!
//! # Primary Usage
//!
//! ```ignore
//! use benefit_inliner::core::{InlinerConfig, InliningSession};
//! use benefit_inliner::inliner::BenefitInliner;
//! use benefit_inliner::test_ir::{parse_program, TestProgramAdaptor};
//! use bumpalo::Bump;
//!
//! // Create inlining session with arena allocation
//! let arena = Bump::new();
//! let session = InliningSession::new(&arena);
//!
//! let program = parse_program(&text)?;
//! let mut adaptor = TestProgramAdaptor::new(&program, "main")?;
//! let config = InlinerConfig::default();
//! let inliner = BenefitInliner::new(&session, &config);
//!
//! let root = adaptor.root();
//! let idt = inliner.obtain_idt(&mut adaptor, root)?;
//! let proposal = inliner.compute_proposal(&idt);
//! let outcome = inliner.perform_inlining(&idt, &proposal, &mut adaptor);
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Shared infrastructure (session, errors, configuration, collaborator traits)
//! - [`absint`] - Abstract values, frame containers and method summaries
//! - [`idt`] - The inlining dependency tree and its builder
//! - [`proposal`] - Inlining proposals and the packing memo table
//! - [`inliner`] - Budget, packing algorithm and the end-to-end driver
//! - [`test_ir`] - Textual test programs implementing every collaborator

pub mod core;
pub mod absint;
pub mod idt;
pub mod proposal;
pub mod inliner;
pub mod test_ir;

// Re-export common types from organized modules
pub use core::{
    // Collaborator traits
    AbstractInterpreter, CallTargetResolver, ClassHierarchy, InliningTransformer,
    // Session management
    InliningSession, SessionStats,
    // Configuration and errors
    InlinerConfig, InlinerError, InlinerResult, MethodHotness,
};
pub use absint::{AbsValue, InliningMethodSummary, PotentialOptimizationPredicate};
pub use idt::{Idt, IdtNode, NodeId};
pub use proposal::{FrozenProposal, InliningProposal, InliningProposalTable, NodeSet};
pub use inliner::{BenefitInliner, InliningReport};
