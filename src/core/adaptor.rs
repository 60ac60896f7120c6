// This module defines the traits through which the inliner talks to the rest of the compiler.
// The inlining-decision engine itself never parses bytecode, resolves symbols or rewrites IR;
// those jobs belong to collaborators. CallTargetResolver maps a call site to its feasible callee
// targets and reports each callee's bytecode size (its cost) and parameter types.
// AbstractInterpreter walks a method's control-flow graph with incoming abstract arguments and
// returns the call sites it met plus the method's InliningMethodSummary. ClassHierarchy answers
// the subtype queries the checkcast/instanceof predicates need. InliningTransformer enumerates
// the real call sites of an IR body and performs the actual inlining, reporting failure by
// returning None. Associated handle types keep the engine independent of any concrete IR.

//! Collaborator traits.
//!
//! The inliner assumes:
//! - Every method has a stable, copyable handle and a bytecode size.
//! - Call sites are identified inside their caller by bytecode index.
//! - A call site resolves to zero or more targets; devirtualization happens
//!   behind [`CallTargetResolver::resolve_targets`].
//! - Inlining a call yields a handle to the inlined body, whose calls can be
//!   enumerated again with [`InliningTransformer::body_calls`].

use crate::absint::{AbsValue, ClassId, DataType, InliningMethodSummary};
use core::fmt::Debug;
use core::hash::Hash;

/// Answer to "is every instance of X an instance of Y".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRelation {
    Yes,
    No,
    Maybe,
}

/// Subtype queries over the class hierarchy.
pub trait ClassHierarchy {
    /// Whether `sub` is `sup` or one of its subtypes.
    fn is_subclass_of(&self, sub: ClassId, sup: ClassId) -> bool;

    fn is_interface(&self, _class: ClassId) -> bool {
        false
    }

    /// Relation between a value of static class `class` and `target`.
    ///
    /// A non-exact class can be a runtime subclass, so a supertype of `target`
    /// (or any class, when `target` is an interface) only yields `Maybe`.
    fn instance_relation(&self, class: ClassId, exact: bool, target: ClassId) -> TypeRelation {
        if self.is_subclass_of(class, target) {
            TypeRelation::Yes
        } else if !exact && (self.is_subclass_of(target, class) || self.is_interface(target)) {
            TypeRelation::Maybe
        } else {
            TypeRelation::No
        }
    }
}

/// How a call site dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Static,
    Special,
    Virtual,
    Interface,
}

impl CallKind {
    pub fn name(self) -> &'static str {
        match self {
            CallKind::Static => "static",
            CallKind::Special => "special",
            CallKind::Virtual => "virtual",
            CallKind::Interface => "interface",
        }
    }

    pub fn is_indirect(self) -> bool {
        matches!(self, CallKind::Virtual | CallKind::Interface)
    }
}

/// A call site met during abstract interpretation.
#[derive(Debug, Clone)]
pub struct CallSiteInfo<M> {
    pub bc_index: u32,
    pub kind: CallKind,
    /// Statically referenced method.
    pub callee: M,
    /// Execution frequency relative to the caller's entry.
    pub call_ratio: f64,
    /// Abstract values of the arguments at the call.
    pub arguments: Vec<AbsValue>,
}

/// One feasible target of a call site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallTarget<M> {
    pub method: M,
    /// Already inlined elsewhere in this compilation.
    pub already_inlined: bool,
    /// The resolver's own veto (native, synchronized, unresolved, ...).
    pub inlineable: bool,
}

impl<M> CallTarget<M> {
    pub fn new(method: M) -> Self {
        Self { method, already_inlined: false, inlineable: true }
    }
}

/// Result of abstractly interpreting one method.
#[derive(Debug, Clone)]
pub struct MethodAnalysis<M> {
    pub call_sites: Vec<CallSiteInfo<M>>,
    pub summary: InliningMethodSummary,
}

/// Call-target resolution.
pub trait CallTargetResolver {
    type MethodRef: Copy + Eq + Hash + Debug;

    /// Feasible targets of `site` inside `caller`.
    fn resolve_targets(
        &self,
        caller: Self::MethodRef,
        site: &CallSiteInfo<Self::MethodRef>,
    ) -> Vec<CallTarget<Self::MethodRef>>;

    /// Maximum bytecode index of `method`, used as its inlining cost.
    fn bytecode_size(&self, method: Self::MethodRef) -> u32;

    /// Human readable signature for tracing.
    fn signature(&self, method: Self::MethodRef) -> &str;

    /// Types of the formal parameters, receiver first.
    fn parameter_types(&self, method: Self::MethodRef) -> Vec<DataType>;
}

/// Abstract interpretation of method bodies.
pub trait AbstractInterpreter: CallTargetResolver {
    /// Walk `method` with the given incoming arguments.
    fn interpret(
        &mut self,
        method: Self::MethodRef,
        arguments: &[AbsValue],
    ) -> MethodAnalysis<Self::MethodRef>;

    fn class_hierarchy(&self) -> &dyn ClassHierarchy;
}

/// The IR mutation that performs inlining.
pub trait InliningTransformer {
    type MethodRef: Copy + Eq + Debug;
    type BodyRef: Copy + Eq + Debug;
    type CallRef: Copy + Eq + Debug;

    /// Body of the method being compiled.
    fn root_body(&self) -> Self::BodyRef;

    /// Real call sites of a body, in IR order.
    fn body_calls(&self, body: Self::BodyRef) -> Box<dyn Iterator<Item = Self::CallRef> + '_>;

    /// Bytecode index of a call inside its own method.
    fn call_bc_index(&self, call: Self::CallRef) -> u32;

    /// Replace `call` with the body of `target`.
    ///
    /// Returns the inlined body, or `None` if the transformation declined.
    fn inline_call(&mut self, call: Self::CallRef, target: Self::MethodRef) -> Option<Self::BodyRef>;
}
