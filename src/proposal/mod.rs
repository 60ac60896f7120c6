//! Selection sets: inlining proposals and the packing memo table.

pub mod bitset;
pub mod set;
pub mod table;

pub use bitset::NodeBitSet;
pub use set::{FrozenProposal, InliningProposal, NodeIds, NodeSet};
pub use table::InliningProposalTable;
