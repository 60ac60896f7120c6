//! Abstract local-variable array.

use super::value::AbsValue;
use std::fmt;

/// Fixed-size array of local slots; `None` marks an uninitialized slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsLocalsArray {
    slots: Vec<Option<AbsValue>>,
}

impl AbsLocalsArray {
    /// Array of `size` uninitialized slots.
    pub fn new(size: usize) -> Self {
        Self { slots: vec![None; size] }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, idx: usize) -> Option<&AbsValue> {
        assert!(idx < self.slots.len(), "Local slot {} out of range ({})", idx, self.slots.len());
        self.slots[idx].as_ref()
    }

    pub fn set(&mut self, idx: usize, value: AbsValue) {
        assert!(idx < self.slots.len(), "Local slot {} out of range ({})", idx, self.slots.len());
        self.slots[idx] = Some(value);
    }

    /// Mark a slot uninitialized again.
    pub fn clear(&mut self, idx: usize) {
        assert!(idx < self.slots.len(), "Local slot {} out of range ({})", idx, self.slots.len());
        self.slots[idx] = None;
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&AbsValue>> {
        self.slots.iter().map(Option::as_ref)
    }

    /// Join `other` into this array slot by slot.
    ///
    /// Initialized slots are joined, a slot initialized on one side only takes
    /// that value, and slots uninitialized on both sides stay uninitialized.
    pub fn merge(&mut self, other: &AbsLocalsArray) {
        assert_eq!(
            self.slots.len(),
            other.slots.len(),
            "Merging locals arrays of different size"
        );
        for (mine, theirs) in self.slots.iter_mut().zip(other.slots.iter()) {
            let Some(other_value) = theirs else {
                continue;
            };
            if let Some(value) = mine {
                value.merge(other_value);
            } else {
                *mine = Some(other_value.clone());
            }
        }
    }
}

impl fmt::Display for AbsLocalsArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, slot) in self.slots.iter().enumerate() {
            match slot {
                Some(value) => writeln!(f, "  local {}: {}", idx, value)?,
                None => writeln!(f, "  local {}: uninitialized", idx)?,
            }
        }
        Ok(())
    }
}
