//! Test program format for exercising the inliner.
//!
//! This module provides a small textual format describing a class hierarchy
//! and a set of methods, so inlining scenarios can be written without a real
//! bytecode front end. Each method carries its bytecode size, the call sites
//! an abstract interpreter would find in it, and the optimization predicates
//! its summary would record. The format is designed to be:
//! - Human-readable and writable
//! - Easy to parse
//! - Sufficient to drive every collaborator the inliner needs
//!
//! # Format
//!
//! ```text
//! ; Comments start with semicolon
//! class Animal
//! class Dog extends Animal
//!
//! method main(int, ref) size 60 {
//!     call 3 static helper(%0, int[1, 4]) freq 0.5
//!     call 9 virtual Animal.speak|Dog.speak(%1)
//! }
//! method helper(int, int) size 40 {
//!     pred %1 12 branch int[0, 10]
//! }
//! method Animal.speak(ref) size 20 decline
//! method Dog.speak(ref) size 15 {
//!     pred %0 4 checkcast class Dog
//! }
//! ```
//!
//! Operands are `%N` (the caller's parameter N), a literal value, or
//! `merge(a, b, ...)` joining several operands. Literal values are
//! `int[lo, hi]`, `int N`, `null`, `nonnull`, `[nonnull] class C`,
//! `[nonnull] exact C`, `classobj C` and `top [type]`. Method flags:
//! `noinline` (the resolver vetoes it), `inlined` (already inlined
//! elsewhere) and `decline` (the transformer refuses to inline it). A method
//! without a body is a declaration and can never be inlined.

use crate::absint::{AbsValue, DataType, PotentialOptimizationPredicate};
use crate::core::CallKind;

pub mod parser;
pub mod adaptor;

pub use adaptor::{BodyCall, InlineEvent, TestProgramAdaptor};
pub use parser::parse_program;

/// Index of a method in [`TestProgram::methods`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(pub u32);

impl MethodId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TestProgram {
    pub classes: Vec<Class>,
    pub methods: Vec<Method>,
}

impl TestProgram {
    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.index()]
    }

    pub fn find_method(&self, name: &str) -> Option<MethodId> {
        self.methods
            .iter()
            .position(|m| m.name == name)
            .map(|idx| MethodId(idx as u32))
    }

    pub fn find_class(&self, name: &str) -> Option<u32> {
        self.classes.iter().position(|c| c.name == name).map(|idx| idx as u32)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: String,
    pub is_interface: bool,
    /// Direct supertypes (indices into `classes`).
    pub supers: Vec<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodFlags {
    pub noinline: bool,
    pub inlined: bool,
    pub decline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub params: Vec<DataType>,
    pub size: u32,
    pub flags: MethodFlags,
    /// No body was given.
    pub declaration: bool,
    pub calls: Vec<Call>,
    pub predicates: Vec<Predicate>,
}

impl Method {
    pub fn call_at(&self, bc_index: u32) -> Option<&Call> {
        self.calls.iter().find(|call| call.bc_index == bc_index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub bc_index: u32,
    pub kind: CallKind,
    /// Feasible targets, the statically referenced one first.
    pub targets: Vec<MethodId>,
    pub call_ratio: f64,
    pub arguments: Vec<Operand>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Incoming parameter of the caller.
    Param(u32),
    Value(AbsValue),
    /// Join of several operands, as at a control-flow merge.
    Merge(Vec<Operand>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub param: u32,
    pub predicate: PotentialOptimizationPredicate,
}
