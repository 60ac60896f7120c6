//! Inlining budget by method hotness.

use crate::core::MethodHotness;

/// Budget granted to a root method of `size` bytecodes at `hotness`.
pub fn compute_budget(size: u32, hotness: MethodHotness) -> i64 {
    let size = size as i64;
    match hotness {
        MethodHotness::Scorching => (size * 2).max(1500),
        MethodHotness::Hot | MethodHotness::VeryHot => (size + size / 4).max(1500),
        MethodHotness::Warm if size < 250 => 250,
        MethodHotness::Warm if size < 700 => (size + size / 4).max(700),
        MethodHotness::Warm => size + size / 8,
        MethodHotness::Cold => 25,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hot_budgets() {
        assert_eq!(compute_budget(100, MethodHotness::Scorching), 1500);
        assert_eq!(compute_budget(1000, MethodHotness::Scorching), 2000);
        assert_eq!(compute_budget(100, MethodHotness::Hot), 1500);
        assert_eq!(compute_budget(2000, MethodHotness::VeryHot), 2500);
    }

    #[test]
    fn test_warm_budgets() {
        assert_eq!(compute_budget(0, MethodHotness::Warm), 250);
        assert_eq!(compute_budget(249, MethodHotness::Warm), 250);
        assert_eq!(compute_budget(250, MethodHotness::Warm), 700);
        assert_eq!(compute_budget(600, MethodHotness::Warm), 750);
        assert_eq!(compute_budget(800, MethodHotness::Warm), 900);
    }

    #[test]
    fn test_cold_budget() {
        assert_eq!(compute_budget(10_000, MethodHotness::Cold), 25);
    }
}
