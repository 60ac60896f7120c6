//! Packing orchestrator.
//!
//! - [`compute_budget`] - budget granted by method hotness
//! - [`IdtPreorderQueue`] - linearization of the tree into DP rows
//! - [`packing`] - everything-fits fast path and the knapsack DP
//! - [`BenefitInliner`] - build, pack and inline for one compilation attempt

pub mod budget;
pub mod queue;
pub mod packing;
pub mod driver;

pub use budget::compute_budget;
pub use queue::IdtPreorderQueue;
pub use packing::{knapsack, pack, select_all};
pub use driver::{BenefitInliner, InliningOutcome, InliningReport};
