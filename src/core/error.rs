// This module defines error types for the benefit inliner using the thiserror crate for
// idiomatic Rust error handling. InlinerError covers the recoverable failure scenarios of one
// compilation attempt: a budget that cannot be computed, a method handle the collaborators do not
// know, a root method without a body, and malformed test programs. Invariant violations inside
// the tree or the packing algorithm are not represented here; they are assertions and abort the
// attempt. The module also provides InlinerResult<T> as a convenience alias.

//! Error types for the benefit inliner.
//!
//! Using thiserror for more idiomatic error handling.

use thiserror::Error;

/// Main error type for an inlining attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InlinerError {
    #[error("Invalid inlining budget: {budget}")]
    InvalidBudget {
        budget: i64,
    },

    #[error("Unknown method: {name}")]
    UnknownMethod {
        name: String,
    },

    #[error("Method {name} has no body to inline into")]
    MissingBody {
        name: String,
    },

    #[error("Test program parse error at line {line}: {reason}")]
    Parse {
        line: usize,
        reason: String,
    },

    #[error("Test program is invalid: {reason}")]
    InvalidProgram {
        reason: String,
    },
}

/// Result type alias for inliner operations.
pub type InlinerResult<T> = Result<T, InlinerError>;
