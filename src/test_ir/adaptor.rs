//! Test program adaptor implementing the inliner's collaborators.
//!
//! The adaptor plays every role around the inliner for a parsed
//! [`TestProgram`]: class hierarchy, call-target resolver, abstract
//! interpreter and inlining transformer. Interpretation seeds an entry frame
//! with the incoming arguments, evaluates each call's operands onto the
//! operand stack and pops them off as the call's arguments, the way an
//! `invoke` bytecode consumes them. Inlining instantiates a fresh body for
//! the callee and records the event.

use super::{Method, MethodId, Operand, TestProgram};
use crate::absint::{
    AbsOperandStack, AbsState, AbsValue, ClassId, DataType, InliningMethodSummary,
};
use crate::core::{
    AbstractInterpreter, CallSiteInfo, CallTarget, CallTargetResolver, ClassHierarchy,
    InlinerError, InlinerResult, InliningTransformer, MethodAnalysis,
};
use std::fmt::Write as _;

/// A call site inside one instantiated body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyCall {
    pub body: usize,
    pub index: usize,
}

/// One performed inlining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineEvent {
    pub caller_body: usize,
    pub bc_index: u32,
    pub target: MethodId,
    pub body: usize,
}

/// Adaptor that implements the collaborator traits for a TestProgram
pub struct TestProgramAdaptor<'p> {
    program: &'p TestProgram,
    root: MethodId,
    /// Method of each instantiated body; body 0 is the root.
    bodies: Vec<MethodId>,
    events: Vec<InlineEvent>,
    interpreted: usize,
}

impl<'p> TestProgramAdaptor<'p> {
    /// Adaptor compiling the method named `root`.
    pub fn new(program: &'p TestProgram, root: &str) -> InlinerResult<Self> {
        let id = program
            .find_method(root)
            .ok_or_else(|| InlinerError::UnknownMethod { name: root.to_string() })?;
        if program.method(id).declaration {
            return Err(InlinerError::MissingBody { name: root.to_string() });
        }
        Ok(Self { program, root: id, bodies: vec![id], events: Vec::new(), interpreted: 0 })
    }

    pub fn program(&self) -> &'p TestProgram {
        self.program
    }

    pub fn root(&self) -> MethodId {
        self.root
    }

    /// Get the method of an instantiated body
    pub fn body_method(&self, body: usize) -> MethodId {
        self.bodies[body]
    }

    /// Inlining events in the order they happened.
    pub fn events(&self) -> &[InlineEvent] {
        &self.events
    }

    /// Names of the inlined methods in inlining order.
    pub fn inlined_methods(&self) -> Vec<&'p str> {
        self.events
            .iter()
            .map(|event| self.program.method(event.target).name.as_str())
            .collect()
    }

    /// Number of abstract interpretations performed.
    pub fn num_interpreted(&self) -> usize {
        self.interpreted
    }

    /// One line per inlining, indented by nesting depth.
    pub fn describe_inlining(&self) -> String {
        let mut depth = vec![0usize; self.bodies.len()];
        let mut out = String::new();
        for event in &self.events {
            depth[event.body] = depth[event.caller_body] + 1;
            let caller = self.program.method(self.bodies[event.caller_body]);
            let _ = writeln!(
                out,
                "{}{}@{} -> {}",
                "  ".repeat(depth[event.body] - 1),
                caller.name,
                event.bc_index,
                self.program.method(event.target).name
            );
        }
        out
    }

    fn method(&self, id: MethodId) -> &'p Method {
        self.program.method(id)
    }

    fn evaluate(&self, operand: &Operand, state: &AbsState) -> AbsValue {
        match operand {
            Operand::Param(idx) => state
                .locals
                .get(*idx as usize)
                .cloned()
                .unwrap_or_else(|| AbsValue::top(DataType::Unknown)),
            Operand::Value(value) => value.clone(),
            Operand::Merge(operands) => {
                let mut values = operands.iter().map(|operand| self.evaluate(operand, state));
                let Some(mut merged) = values.next() else {
                    return AbsValue::top(DataType::Unknown);
                };
                for value in values {
                    merged.merge(&value);
                }
                merged
            }
        }
    }
}

impl ClassHierarchy for TestProgramAdaptor<'_> {
    fn is_subclass_of(&self, sub: ClassId, sup: ClassId) -> bool {
        let mut worklist = vec![sub.0];
        let mut visited = vec![false; self.program.classes.len()];
        while let Some(class) = worklist.pop() {
            if class == sup.0 {
                return true;
            }
            let Some(seen) = visited.get_mut(class as usize) else {
                continue;
            };
            if *seen {
                continue;
            }
            *seen = true;
            worklist.extend_from_slice(&self.program.classes[class as usize].supers);
        }
        false
    }

    fn is_interface(&self, class: ClassId) -> bool {
        self.program
            .classes
            .get(class.0 as usize)
            .is_some_and(|class| class.is_interface)
    }
}

impl CallTargetResolver for TestProgramAdaptor<'_> {
    type MethodRef = MethodId;

    fn resolve_targets(
        &self,
        caller: MethodId,
        site: &CallSiteInfo<MethodId>,
    ) -> Vec<CallTarget<MethodId>> {
        let Some(call) = self.method(caller).call_at(site.bc_index) else {
            log::warn!(
                "No call at bc {} in {}",
                site.bc_index,
                self.method(caller).name
            );
            return Vec::new();
        };
        call.targets
            .iter()
            .map(|&target| {
                let method = self.method(target);
                CallTarget {
                    method: target,
                    already_inlined: method.flags.inlined,
                    inlineable: !method.flags.noinline && !method.declaration,
                }
            })
            .collect()
    }

    fn bytecode_size(&self, method: MethodId) -> u32 {
        self.method(method).size
    }

    fn signature(&self, method: MethodId) -> &str {
        &self.method(method).name
    }

    fn parameter_types(&self, method: MethodId) -> Vec<DataType> {
        self.method(method).params.clone()
    }
}

impl AbstractInterpreter for TestProgramAdaptor<'_> {
    fn interpret(&mut self, method: MethodId, arguments: &[AbsValue]) -> MethodAnalysis<MethodId> {
        self.interpreted += 1;
        let m = self.method(method);
        let mut state = AbsState::method_entry(arguments, m.params.len().max(arguments.len()));

        let mut call_sites = Vec::with_capacity(m.calls.len());
        for call in &m.calls {
            for operand in &call.arguments {
                let value = self.evaluate(operand, &state);
                state.stack.push(value);
            }
            let arguments = pop_arguments(&mut state.stack, call.arguments.len());
            call_sites.push(CallSiteInfo {
                bc_index: call.bc_index,
                kind: call.kind,
                callee: call.targets[0],
                call_ratio: call.call_ratio,
                arguments,
            });
        }

        let mut summary = InliningMethodSummary::new();
        for predicate in &m.predicates {
            summary.add_predicate(predicate.param, predicate.predicate.clone());
        }
        log::trace!("Interpreted {} with entry state\n{}", m.name, state);

        MethodAnalysis { call_sites, summary }
    }

    fn class_hierarchy(&self) -> &dyn ClassHierarchy {
        self
    }
}

fn pop_arguments(stack: &mut AbsOperandStack, count: usize) -> Vec<AbsValue> {
    let mut arguments: Vec<AbsValue> = (0..count).map(|_| stack.pop()).collect();
    arguments.reverse();
    arguments
}

impl InliningTransformer for TestProgramAdaptor<'_> {
    type MethodRef = MethodId;
    type BodyRef = usize;
    type CallRef = BodyCall;

    fn root_body(&self) -> usize {
        0
    }

    fn body_calls(&self, body: usize) -> Box<dyn Iterator<Item = BodyCall> + '_> {
        let count = self.method(self.bodies[body]).calls.len();
        Box::new((0..count).map(move |index| BodyCall { body, index }))
    }

    fn call_bc_index(&self, call: BodyCall) -> u32 {
        self.method(self.bodies[call.body]).calls[call.index].bc_index
    }

    fn inline_call(&mut self, call: BodyCall, target: MethodId) -> Option<usize> {
        let site = &self.method(self.bodies[call.body]).calls[call.index];
        if !site.targets.contains(&target) {
            log::warn!(
                "{} is not a target of the call at bc {}",
                self.method(target).name,
                site.bc_index
            );
            return None;
        }
        let callee = self.method(target);
        if callee.flags.decline || callee.declaration {
            return None;
        }

        let body = self.bodies.len();
        self.bodies.push(target);
        self.events.push(InlineEvent {
            caller_body: call.body,
            bc_index: site.bc_index,
            target,
            body,
        });
        Some(body)
    }
}
