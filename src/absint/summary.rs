// This module implements the InliningMethodSummary, the per-candidate record of speculative
// optimizations that become safe once the candidate is inlined with sufficiently precise
// arguments. Each formal parameter position maps to a list of PotentialOptimizationPredicates;
// a predicate holds the bytecode index of the foldable instruction, the kind of folding and the
// constraint an argument must satisfy. test() implements a kind-specific partial order: integer
// ranges must be contained, nullness must agree exactly, and checkcast/instanceof consult the
// class-hierarchy collaborator for a definite subtype answer. The summed number of matching
// predicates over all arguments becomes the static benefit of a dependency-tree node.

//! Inlining method summaries and potential-optimization predicates.

use super::value::{AbsValue, Nullness};
use crate::core::adaptor::{ClassHierarchy, TypeRelation};
use hashbrown::HashMap;
use std::fmt;

/// Optimization a predicate unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PotentialOptimization {
    /// Integer compare-and-branch folds to one successor.
    BranchFolding,
    /// `ifnull`/`ifnonnull` folds to one successor.
    NullBranchFolding,
    /// Implicit null check can be removed.
    NullCheckFolding,
    /// `instanceof` folds to a constant.
    InstanceOfFolding,
    /// `checkcast` can be removed.
    CheckCastFolding,
}

impl PotentialOptimization {
    pub fn name(self) -> &'static str {
        match self {
            PotentialOptimization::BranchFolding => "branch-folding",
            PotentialOptimization::NullBranchFolding => "null-branch-folding",
            PotentialOptimization::NullCheckFolding => "null-check-folding",
            PotentialOptimization::InstanceOfFolding => "instanceof-folding",
            PotentialOptimization::CheckCastFolding => "checkcast-folding",
        }
    }
}

/// A speculative optimization guarded by an argument constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PotentialOptimizationPredicate {
    pub bc_index: u32,
    pub kind: PotentialOptimization,
    pub constraint: AbsValue,
}

impl PotentialOptimizationPredicate {
    pub fn new(bc_index: u32, kind: PotentialOptimization, constraint: AbsValue) -> Self {
        Self { bc_index, kind, constraint }
    }

    /// Whether `value` is at least as precise as the recorded constraint.
    pub fn test(&self, value: &AbsValue, hierarchy: &dyn ClassHierarchy) -> bool {
        match self.kind {
            PotentialOptimization::BranchFolding => self.test_int_range(value),
            PotentialOptimization::NullBranchFolding | PotentialOptimization::NullCheckFolding => {
                self.test_nullness(value)
            }
            PotentialOptimization::CheckCastFolding => self.test_checkcast(value, hierarchy),
            PotentialOptimization::InstanceOfFolding => self.test_instanceof(value, hierarchy),
        }
    }

    fn test_int_range(&self, value: &AbsValue) -> bool {
        match (value.int_range_bounds(), self.constraint.int_range_bounds()) {
            (Some((low, high)), Some((c_low, c_high))) => c_low <= low && high <= c_high,
            _ => false,
        }
    }

    fn test_nullness(&self, value: &AbsValue) -> bool {
        matches!(
            (value.nullness(), self.constraint.nullness()),
            (Nullness::NonNull, Nullness::NonNull) | (Nullness::Null, Nullness::Null)
        )
    }

    fn test_checkcast(&self, value: &AbsValue, hierarchy: &dyn ClassHierarchy) -> bool {
        if value.is_null() {
            return true;
        }
        match self.relation(value, hierarchy) {
            Some((_, relation)) => relation == TypeRelation::Yes,
            None => false,
        }
    }

    fn test_instanceof(&self, value: &AbsValue, hierarchy: &dyn ClassHierarchy) -> bool {
        if value.is_null() {
            return true;
        }
        match self.relation(value, hierarchy) {
            Some((nullness, TypeRelation::Yes)) => nullness == Nullness::NonNull,
            Some((_, TypeRelation::No)) => true,
            _ => false,
        }
    }

    /// Relation between the value's class and the constraint's class. `None` when
    /// either class is unknown or the value is a class object.
    fn relation(
        &self,
        value: &AbsValue,
        hierarchy: &dyn ClassHierarchy,
    ) -> Option<(Nullness, TypeRelation)> {
        let obj = value.object_constraint()?;
        if obj.class_object {
            return None;
        }
        let class = obj.class?;
        let target = self.constraint.object_constraint()?.class?;
        Some((obj.nullness, hierarchy.instance_relation(class, obj.exact, target)))
    }
}

impl fmt::Display for PotentialOptimizationPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bc {} {} if {}", self.bc_index, self.kind.name(), self.constraint)
    }
}

/// Potential optimizations of one method, keyed by formal parameter position.
#[derive(Debug, Clone, Default)]
pub struct InliningMethodSummary {
    predicates: HashMap<u32, Vec<PotentialOptimizationPredicate>>,
}

impl InliningMethodSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_predicate(&mut self, param_position: u32, predicate: PotentialOptimizationPredicate) {
        self.predicates.entry(param_position).or_default().push(predicate);
    }

    pub fn predicates_for(&self, param_position: u32) -> &[PotentialOptimizationPredicate] {
        self.predicates.get(&param_position).map_or(&[], Vec::as_slice)
    }

    pub fn num_predicates(&self) -> usize {
        self.predicates.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.num_predicates() == 0
    }

    /// Number of predicates at `arg_pos` that `arg` satisfies.
    pub fn test_argument(
        &self,
        arg: Option<&AbsValue>,
        arg_pos: u32,
        hierarchy: &dyn ClassHierarchy,
    ) -> u32 {
        let Some(arg) = arg else {
            return 0;
        };
        self.predicates_for(arg_pos)
            .iter()
            .filter(|predicate| predicate.test(arg, hierarchy))
            .count() as u32
    }

    /// Sum of [`test_argument`](Self::test_argument) over all arguments.
    pub fn static_benefit(&self, arguments: &[AbsValue], hierarchy: &dyn ClassHierarchy) -> u32 {
        arguments
            .iter()
            .enumerate()
            .map(|(pos, arg)| self.test_argument(Some(arg), pos as u32, hierarchy))
            .sum()
    }
}

impl fmt::Display for InliningMethodSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut positions: Vec<_> = self.predicates.keys().copied().collect();
        positions.sort_unstable();
        for pos in positions {
            for predicate in &self.predicates[&pos] {
                writeln!(f, "  param {}: {}", pos, predicate)?;
            }
        }
        Ok(())
    }
}
