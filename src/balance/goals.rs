//! Goal derivation: weighted-proportional targets with integer leftover
//! accounting.

use serde::{Deserialize, Serialize};

use crate::balance::weights::WeightTable;
use crate::balance_error::BalanceError;

/// Per-rank target counts plus the flooring remainder.
///
/// `goal[r] = floor(total * weight[r])`, so `sum(goals) <= total`; the
/// deficit is tracked in `leftovers` and handed back out one unit at a time
/// by the planner. Ranks whose goal is exactly 0 are being drained on purpose
/// (weight set to 0) and never take part in leftover distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalTable {
    goals: Vec<u64>,
    leftovers: u64,
    zero_goal_count: usize,
}

impl GoalTable {
    /// Derive goals from per-rank counts and a **normalized** weight table.
    ///
    /// # Errors
    /// `WeightCountMismatch` if the table does not cover one weight per rank.
    pub fn compute(counts: &[u64], weights: &WeightTable) -> Result<Self, BalanceError> {
        if counts.len() != weights.len() {
            return Err(BalanceError::WeightCountMismatch {
                expected: weights.len(),
                actual: counts.len(),
            });
        }
        let total: u64 = counts.iter().sum();
        let goals: Vec<u64> = weights
            .as_slice()
            .iter()
            .map(|&w| (total as f64 * w).floor() as u64)
            .collect();
        let assigned: u64 = goals.iter().sum();
        debug_assert!(assigned <= total, "floored goals exceed the total");
        let leftovers = total.saturating_sub(assigned);
        let zero_goal_count = goals.iter().filter(|&&g| g == 0).count();
        Ok(Self {
            goals,
            leftovers,
            zero_goal_count,
        })
    }

    pub fn goals(&self) -> &[u64] {
        &self.goals
    }

    pub fn goal(&self, rank: usize) -> u64 {
        self.goals[rank]
    }

    /// Integer remainder `total - sum(goals)`; fully redistributed by the
    /// planner so no cells are dropped.
    pub fn leftovers(&self) -> u64 {
        self.leftovers
    }

    /// Number of ranks with goal exactly 0.
    pub fn zero_goal_count(&self) -> usize {
        self.zero_goal_count
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }
}
