//! Per-rank weight table for proportional cell redistribution.

use serde::{Deserialize, Serialize};

use crate::balance_error::BalanceError;

/// Ordered per-rank weights, indexed by rank id.
///
/// Entries are non-negative; [`WeightTable::normalize`] rescales them to sum
/// to 1 before a planning run. Construct with [`WeightTable::uniform`] when
/// every rank should carry an equal share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    weights: Vec<f64>,
}

impl WeightTable {
    /// Equal weight `1/n_ranks` for every rank.
    pub fn uniform(n_ranks: usize) -> Self {
        let w = if n_ranks == 0 { 0.0 } else { 1.0 / n_ranks as f64 };
        Self {
            weights: vec![w; n_ranks],
        }
    }

    /// Adopt an explicit weight vector.
    ///
    /// # Errors
    /// `NegativeWeight` if any entry is below zero.
    pub fn from_weights(weights: Vec<f64>) -> Result<Self, BalanceError> {
        for (rank, &value) in weights.iter().enumerate() {
            if value < 0.0 {
                return Err(BalanceError::NegativeWeight { rank, value });
            }
        }
        Ok(Self { weights })
    }

    /// Assign `value` to every rank id in `[lo, hi]` (inclusive).
    ///
    /// # Errors
    /// `RankRangeOutOfBounds` if `lo > hi` or `hi` is past the table;
    /// `NegativeWeight` if `value < 0`.
    pub fn set_weight(&mut self, lo: usize, hi: usize, value: f64) -> Result<(), BalanceError> {
        if lo > hi || hi >= self.weights.len() {
            return Err(BalanceError::RankRangeOutOfBounds {
                lo,
                hi,
                n_ranks: self.weights.len(),
            });
        }
        if value < 0.0 {
            return Err(BalanceError::NegativeWeight { rank: lo, value });
        }
        for w in &mut self.weights[lo..=hi] {
            *w = value;
        }
        Ok(())
    }

    /// Rescale so the weights sum to 1. If the sum is not positive (all
    /// weights zero), substitutes uniform weights instead. Idempotent; run
    /// once at the start of every planning run.
    pub fn normalize(&mut self) {
        let n = self.weights.len();
        if n == 0 {
            return;
        }
        let sum: f64 = self.weights.iter().sum();
        if sum <= 0.0 {
            log::warn!("weight table sums to {sum}; substituting uniform weights");
            self.weights.fill(1.0 / n as f64);
        } else {
            for w in &mut self.weights {
                *w /= sum;
            }
        }
    }

    /// Normalized copy, leaving `self` untouched for reuse between runs.
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        out.normalize();
        out
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn get(&self, rank: usize) -> f64 {
        self.weights[rank]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }
}
