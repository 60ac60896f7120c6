//! Abstract frame state at a basic-block boundary.

use super::locals::AbsLocalsArray;
use super::stack::AbsOperandStack;
use super::value::AbsValue;
use std::fmt;

/// Operand stack plus locals, the unit a CFG walk merges at join points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsState {
    pub stack: AbsOperandStack,
    pub locals: AbsLocalsArray,
}

impl AbsState {
    /// Empty state with `num_locals` uninitialized slots.
    pub fn new(num_locals: usize) -> Self {
        Self { stack: AbsOperandStack::new(), locals: AbsLocalsArray::new(num_locals) }
    }

    /// Method-entry state: the first slots hold the incoming arguments, each
    /// tagged with its formal parameter position.
    pub fn method_entry(arguments: &[AbsValue], num_locals: usize) -> Self {
        assert!(
            arguments.len() <= num_locals,
            "{} arguments do not fit into {} locals",
            arguments.len(),
            num_locals
        );
        let mut state = Self::new(num_locals);
        for (pos, arg) in arguments.iter().enumerate() {
            state.locals.set(pos, arg.clone().with_param_position(pos as u32));
        }
        state
    }

    /// Join `other` into this state.
    pub fn merge(&mut self, other: &AbsState) {
        self.stack.merge(&other.stack);
        self.locals.merge(&other.locals);
    }
}

impl fmt::Display for AbsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "stack: {}", self.stack)?;
        write!(f, "{}", self.locals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_entry_tags_parameters() {
        let state = AbsState::method_entry(&[AbsValue::int_const(1), AbsValue::null()], 4);
        assert_eq!(state.locals.get(0).unwrap().param_position(), Some(0));
        assert_eq!(state.locals.get(1).unwrap().param_position(), Some(1));
        assert!(state.locals.get(1).unwrap().is_null());
        assert_eq!(state.locals.get(2), None);
        assert!(state.stack.is_empty());
    }

    #[test]
    fn test_merge_joins_both_parts() {
        let mut a = AbsState::method_entry(&[AbsValue::int_const(1)], 2);
        a.stack.push(AbsValue::int_const(0));

        let mut b = AbsState::method_entry(&[AbsValue::int_const(3)], 2);
        b.stack.push(AbsValue::int_const(8));
        b.locals.set(1, AbsValue::non_null());

        a.merge(&b);
        assert_eq!(a.stack.peek().unwrap().int_range_bounds(), Some((0, 8)));
        let param = a.locals.get(0).unwrap();
        assert_eq!(param.int_range_bounds(), Some((1, 3)));
        assert_eq!(param.param_position(), Some(0));
        assert!(a.locals.get(1).unwrap().is_non_null());
    }
}
