//! Hyperparameter vectors consumed by [`crate::predict::gp_predict`] and
//! produced by [`crate::train::gp_train`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lower/upper bound clamped onto the log-noise hyperparameter after every
/// `gp_train` call. The `gp_predict` retry ramp (see `Surrogate::predict`)
/// uses its own, tighter ceiling and is not governed by this bound.
pub const LIK_BND: (f64, f64) = (-12.0, -1.0);

/// `hyp = {mean, cov, lik}` — the flat hyperparameter vectors handed to the
/// mean/covariance/likelihood functions. Kept deliberately untyped (plain
/// `Vec<f64>` / `f64`) because this struct crosses the boundary into the
/// external numeric library and must round-trip through serde untouched.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hyperparameters {
    /// Mean-function hyperparameters, e.g. `[const_mean]`.
    pub mean: Vec<f64>,
    /// Covariance-function hyperparameters, `[log_length_scale, log_signal_var]`.
    pub cov: Vec<f64>,
    /// Log observation-noise standard deviation.
    pub lik: f64,
}

impl Hyperparameters {
    pub fn new(mean: Vec<f64>, cov: Vec<f64>, lik: f64) -> Self {
        Self { mean, cov, lik }
    }

    /// `sigma` is the configured initial log-noise (default `1e-4`); a
    /// unit length-scale and unit signal variance are reasonable
    /// scale-free starting points before any data has been observed.
    pub fn initial(dim: usize, sigma: f64) -> Self {
        Self {
            mean: vec![0.0],
            cov: vec![0.0, 0.0],
            lik: sigma.max(f64::MIN_POSITIVE).ln(),
        }
        .with_dim_hint(dim)
    }

    fn with_dim_hint(self, _dim: usize) -> Self {
        // The isotropic kernels used here don't scale hyperparameter count
        // with dimensionality, but the hint is threaded through so a future
        // ARD covariance can size `cov` correctly without touching callers.
        self
    }

    /// Clamps `lik` into `[LIK_BND.0, LIK_BND.1]`, as required after every
    /// `gp_train` call.
    pub fn clamp_lik(&mut self) {
        self.lik = self.lik.clamp(LIK_BND.0, LIK_BND.1);
    }
}
