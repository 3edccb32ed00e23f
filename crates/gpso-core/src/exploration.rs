//! The UCB exploration-constant schedule `ς: ℕ → ℝ₊`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Either a fixed exploration constant, or the `eta`-calibrated schedule
/// `ς(M) = √max(0, 4·ln(π·M) − 2·ln(12·η))`, where `M` is the number of
/// GP-based samples and `η` is the configured probability that the UCB
/// underestimates the true objective.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExplorationSchedule {
    Constant(f64),
    Eta(f64),
}

impl ExplorationSchedule {
    /// `ς(M)`, evaluated at the current count of GP-based samples.
    pub fn eval(&self, m_ng: usize) -> f64 {
        match self {
            ExplorationSchedule::Constant(c) => *c,
            ExplorationSchedule::Eta(eta) => {
                // M must be at least 1 for ln(pi*M) to be meaningful; the
                // schedule is only ever queried once at least one GP-based
                // sample exists.
                let m = (m_ng.max(1)) as f64;
                let inner = 4.0 * (std::f64::consts::PI * m).ln() - 2.0 * (12.0 * eta).ln();
                inner.max(0.0).sqrt()
            }
        }
    }
}
