//! The optimizer's configuration surface: `{sigma, eta|varsigma, upc, N_max,
//! verbose, max_train_iter}`, replacing variadic keyword arguments with an
//! explicit, validated struct.

use gpso_core::ExplorationSchedule;
use gpso_error::{GpsoResult, gpso_err};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dimension-dependent cap on the look-ahead depth parameter `XI`.
pub fn xi_max(dim: usize) -> f64 {
    if dim < 10 {
        8.0
    } else if dim < 20 {
        5.0
    } else {
        3.0
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizerConfig {
    /// Initial log-noise level handed to the GP likelihood. Default `1e-4`.
    pub sigma: f64,
    /// The exploration-constant schedule: either a fixed `varsigma`, or an
    /// `eta`-calibrated one. Default `Eta(0.05)`.
    pub varsigma: ExplorationSchedule,
    /// Retrain cadence constant. Default `2 * dim`.
    pub upc: f64,
    /// Evaluation budget; must exceed 1.
    pub n_max: usize,
    /// If set, a tracing subscriber is installed at `Optimizer::builder()`
    /// time via `init_logging`.
    pub verbose: bool,
    /// Iterations handed to `gp_train`'s internal gradient descent.
    pub max_train_iter: usize,
}

impl OptimizerConfig {
    pub fn new(dim: usize) -> Self {
        Self {
            sigma: 1e-4,
            varsigma: ExplorationSchedule::Eta(0.05),
            upc: 2.0 * dim as f64,
            n_max: 100,
            verbose: false,
            max_train_iter: 100,
        }
    }

    pub fn validate(&self) -> GpsoResult<()> {
        if self.n_max <= 1 {
            return Err(gpso_err!(Configuration: "N_max must exceed 1, got {}", self.n_max));
        }
        if self.upc <= 0.0 {
            return Err(gpso_err!(Configuration: "upc must be positive, got {}", self.upc));
        }
        if self.sigma <= 0.0 {
            return Err(gpso_err!(Configuration: "sigma must be positive, got {}", self.sigma));
        }
        Ok(())
    }
}
