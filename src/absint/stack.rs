//! Abstract operand stack.
//!
//! Models the interpreter's operand stack during abstract interpretation. Merging
//! two stacks pairs up slots from the bottom; the stacks must have the same depth
//! at a control-flow join, anything else is a defect in the CFG walk.

use super::value::AbsValue;
use std::fmt;

/// Operand stack of abstract values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbsOperandStack {
    slots: Vec<AbsValue>,
}

impl AbsOperandStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: AbsValue) {
        self.slots.push(value);
    }

    /// Pop the top value.
    ///
    /// Popping an empty stack means the bytecode walk is broken and aborts.
    pub fn pop(&mut self) -> AbsValue {
        match self.slots.pop() {
            Some(value) => value,
            None => panic!("Pop from an empty abstract operand stack"),
        }
    }

    /// Top value, if any.
    pub fn peek(&self) -> Option<&AbsValue> {
        self.slots.last()
    }

    /// Value `depth` slots below the top (0 is the top).
    pub fn peek_at(&self, depth: usize) -> Option<&AbsValue> {
        self.slots.len().checked_sub(depth + 1).map(|idx| &self.slots[idx])
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Values from bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &AbsValue> {
        self.slots.iter()
    }

    /// Join `other` into this stack slot by slot.
    pub fn merge(&mut self, other: &AbsOperandStack) {
        assert_eq!(
            self.slots.len(),
            other.slots.len(),
            "Merging operand stacks of different depth"
        );
        for (mine, theirs) in self.slots.iter_mut().zip(other.slots.iter()) {
            mine.merge(theirs);
        }
    }
}

impl fmt::Display for AbsOperandStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, value) in self.slots.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, "]")
    }
}
