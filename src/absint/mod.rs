//! Abstract interpretation domain.
//!
//! The lattice the abstract interpreter collaborator works with, plus the
//! per-method summaries it produces:
//!
//! - [`AbsValue`] - one abstract value (Top, integer range or object constraint)
//! - [`AbsOperandStack`] / [`AbsLocalsArray`] - the interpreter frame containers
//! - [`AbsState`] - stack plus locals at a block boundary
//! - [`InliningMethodSummary`] - optimizations unlocked by precise arguments

pub mod value;
pub mod stack;
pub mod locals;
pub mod state;
pub mod summary;

pub use value::{AbsValue, ClassId, Constraint, DataType, Nullness, ObjectConstraint};
pub use stack::AbsOperandStack;
pub use locals::AbsLocalsArray;
pub use state::AbsState;
pub use summary::{InliningMethodSummary, PotentialOptimization, PotentialOptimizationPredicate};
