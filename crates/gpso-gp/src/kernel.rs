//! Tagged mean/covariance/likelihood function variants.
//!
//! Per the design notes, dynamic dispatch of these small numeric functions is
//! modeled as tagged enums rather than trait objects: there is a fixed,
//! closed set of variants, each carrying its own hyperparameter slice and
//! implementing the same `eval`/`grad` capability.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The constant mean function `m(x) = c`. Its single hyperparameter is `c`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstMean;

impl ConstMean {
    pub fn eval(&self, hyp: &[f64]) -> f64 {
        hyp.first().copied().unwrap_or(0.0)
    }
}

/// Isotropic covariance family. `length_scale` and `signal_var` are stored
/// in log-space inside `GPConfig::hyp.cov` as `[log_ell, log_sf2]`, matching
/// the convention of the external GP library this module stands in for.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CovFn {
    /// Matern covariance with smoothness `nu`. `nu = 2.5` is the default
    /// used throughout gpso.
    MaternIso { nu: f64 },
    /// Squared-exponential (Gaussian) covariance.
    SEIso,
}

impl CovFn {
    /// `r` is the Euclidean distance between two normalized points.
    pub fn eval(&self, hyp: &[f64], r: f64) -> f64 {
        let ell = hyp[0].exp();
        let sf2 = (2.0 * hyp[1]).exp();
        match self {
            CovFn::SEIso => sf2 * (-0.5 * (r / ell).powi(2)).exp(),
            CovFn::MaternIso { nu } => {
                if r < 1e-12 {
                    return sf2;
                }
                let d = r / ell;
                if (*nu - 2.5).abs() < 1e-9 {
                    let s5 = 5f64.sqrt();
                    sf2 * (1.0 + s5 * d + 5.0 * d * d / 3.0) * (-s5 * d).exp()
                } else if (*nu - 1.5).abs() < 1e-9 {
                    let s3 = 3f64.sqrt();
                    sf2 * (1.0 + s3 * d) * (-s3 * d).exp()
                } else {
                    // nu = 0.5 (exponential) fallback for any other requested order
                    sf2 * (-d).exp()
                }
            }
        }
    }

    /// Partial derivatives of `eval` with respect to `[log_ell, log_sf2]`,
    /// used by `gp_train`'s finite-difference-free fast path.
    pub fn grad(&self, hyp: &[f64], r: f64) -> [f64; 2] {
        let k = self.eval(hyp, r);
        let ell = hyp[0].exp();
        let d_dsf2 = 2.0 * k; // d/d(log_sf2) since sf2 = exp(2 log_sf2)
        let d_dell = match self {
            CovFn::SEIso => k * (r / ell).powi(2),
            CovFn::MaternIso { nu } if (*nu - 2.5).abs() < 1e-9 => {
                matern52_dell(5f64.sqrt(), r / ell, hyp[1])
            }
            CovFn::MaternIso { .. } => {
                let d = r / ell;
                k * d
            }
        };
        [d_dell, d_dsf2]
    }
}

/// d/d(log_ell) of `sf2*(1+s5*d+5d^2/3)*exp(-s5*d)`, with `d = r/ell` so
/// `d(d)/d(log_ell) = -d`.
fn matern52_dell(s5: f64, d: f64, log_sf2: f64) -> f64 {
    let sf2 = (2.0 * log_sf2).exp();
    let poly = 1.0 + s5 * d + 5.0 * d * d / 3.0;
    let dpoly = -s5 * d - 10.0 * d * d / 3.0; // poly' * (-d)
    let dexp = s5 * d; // d/d(log_ell)[exp(-s5 d)] = exp(-s5 d) * s5 * d
    sf2 * (-s5 * d).exp() * (dpoly + poly * dexp)
}

/// Gaussian (homoscedastic) observation noise. `hyp.lik` is `log(sigma_n)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GaussLik;

impl GaussLik {
    pub fn noise_var(&self, log_noise: f64) -> f64 {
        (2.0 * log_noise).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matern52_at_zero_distance_equals_signal_variance() {
        let cov = CovFn::MaternIso { nu: 2.5 };
        let hyp = [0.0, 0.0]; // log_ell=0, log_sf2=0 => ell=1, sf2=1
        assert!((cov.eval(&hyp, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn covariance_decays_with_distance() {
        let cov = CovFn::MaternIso { nu: 2.5 };
        let hyp = [0.0, 0.0];
        assert!(cov.eval(&hyp, 0.1) > cov.eval(&hyp, 1.0));
        assert!(cov.eval(&hyp, 1.0) > cov.eval(&hyp, 10.0));
    }

    #[test]
    fn se_iso_is_symmetric_in_distance_sign() {
        let cov = CovFn::SEIso;
        let hyp = [0.1, 0.2];
        assert_eq!(cov.eval(&hyp, 0.5), cov.eval(&hyp, -0.5));
    }

    #[test]
    fn noise_var_is_monotone_in_log_noise() {
        let lik = GaussLik;
        assert!(lik.noise_var(-2.0) < lik.noise_var(-1.0));
    }
}
