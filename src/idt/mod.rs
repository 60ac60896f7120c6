//! Inlining dependency tree.
//!
//! - [`IdtNode`] - one call target with its cost, benefit and remaining budget
//! - [`Idt`] - the dense, index-addressed tree of one compilation attempt
//! - [`IdtBuilder`] - depth-first construction through the collaborator traits

pub mod node;
pub mod tree;
pub mod builder;

pub use node::{Children, IdtNode, NodeId};
pub use tree::Idt;
pub use builder::IdtBuilder;
