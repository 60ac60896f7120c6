//! Inliner configuration.
//!
//! Knobs that shape one inlining attempt. Defaults match what a warm
//! compilation would use; the `inliner` binary maps its flags onto these.

use std::fmt;

/// How hot the method being compiled is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub enum MethodHotness {
    Cold,
    Warm,
    Hot,
    VeryHot,
    Scorching,
}

impl fmt::Display for MethodHotness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MethodHotness::Cold => "cold",
            MethodHotness::Warm => "warm",
            MethodHotness::Hot => "hot",
            MethodHotness::VeryHot => "very-hot",
            MethodHotness::Scorching => "scorching",
        };
        f.write_str(name)
    }
}

/// Configuration of one inlining attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct InlinerConfig {
    /// Explicit budget; computed from hotness and method size when `None`.
    pub budget: Option<i64>,
    pub hotness: MethodHotness,
    /// How many times a method may appear on the inlining call stack.
    pub self_inlining_limit: usize,
    /// Maximum caller depth explored while building the tree.
    pub max_depth: u32,
    /// Keep every target of a polymorphic call site instead of the first.
    pub allow_multiple_targets: bool,
}

impl Default for InlinerConfig {
    fn default() -> Self {
        Self {
            budget: None,
            hotness: MethodHotness::Warm,
            self_inlining_limit: 3,
            max_depth: 32,
            allow_multiple_targets: false,
        }
    }
}

impl InlinerConfig {
    pub fn with_budget(mut self, budget: i64) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_hotness(mut self, hotness: MethodHotness) -> Self {
        self.hotness = hotness;
        self
    }
}
