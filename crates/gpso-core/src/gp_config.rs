//! `GPConfig`: the hyperparameters and tagged mean/covariance/likelihood
//! variants a [`crate::Surrogate`] hands to the external `gp_predict`/
//! `gp_train` functions, plus the cached exploration schedule.

use crate::exploration::ExplorationSchedule;
use gpso_gp::{ConstMean, CovFn, GaussLik, Hyperparameters};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GPConfig {
    pub hyp: Hyperparameters,
    pub mean_fn: ConstMean,
    pub cov_fn: CovFn,
    pub lik_fn: GaussLik,
    pub varsigma: ExplorationSchedule,
}

impl GPConfig {
    /// `sigma` is the initial log-noise-space noise level (default `1e-4`);
    /// `dim` sizes any future ARD hyperparameters. Defaults to isotropic
    /// Matern `nu=5/2` covariance.
    pub fn new(dim: usize, sigma: f64, varsigma: ExplorationSchedule) -> Self {
        Self {
            hyp: Hyperparameters::initial(dim, sigma),
            mean_fn: ConstMean,
            cov_fn: CovFn::MaternIso { nu: 2.5 },
            lik_fn: GaussLik,
            varsigma,
        }
    }

    pub fn schedule(&self, m_ng: usize) -> f64 {
        self.varsigma.eval(m_ng)
    }
}
