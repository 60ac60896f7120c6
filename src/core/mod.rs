// This module serves as the hub for the inliner's shared infrastructure: the per-compilation
// session (arena allocation and statistics), the error type, and the collaborator traits through
// which the engine reaches call-target resolution, abstract interpretation, the class hierarchy
// and the inlining transformation.

//! Core inliner infrastructure.
//!
//! # Key Components
//!
//! ## Session Management (`session`)
//! - Arena-based allocation using `bumpalo` for committed proposals
//! - Statistics about tree building, packing and inlining
//!
//! ## Collaborators (`adaptor`)
//! - [`CallTargetResolver`], [`AbstractInterpreter`], [`ClassHierarchy`]
//! - [`InliningTransformer`] for the final IR mutation
//!
//! ## Configuration (`config`)
//! - [`InlinerConfig`] budget, hotness and tree-building limits

pub mod session;
pub mod error;
pub mod adaptor;
pub mod config;

pub use session::{InliningSession, SessionStats};

pub use error::{InlinerError, InlinerResult};

pub use config::{InlinerConfig, MethodHotness};

pub use adaptor::{
    AbstractInterpreter,
    CallKind,
    CallSiteInfo,
    CallTarget,
    CallTargetResolver,
    ClassHierarchy,
    InliningTransformer,
    MethodAnalysis,
    TypeRelation,
};
