//! `gp_train`: hyperparameter optimization by minimizing the negative log
//! marginal likelihood. The external library this module stands in for
//! uses conjugate gradients; here a backtracking gradient descent plays
//! the same role; both converge to a local optimum of the same objective
//! in roughly the same number of steps for the low-dimensional
//! hyperparameter vectors gpso trains.

use crate::hyper::Hyperparameters;
use crate::kernel::{ConstMean, CovFn, GaussLik};
use crate::predict::neg_log_marginal_likelihood;
use gpso_error::GpsoResult;
use tracing::debug;

const STEP: f64 = 0.1;
const FD_EPS: f64 = 1e-4;

fn numerical_grad(
    hyp: &Hyperparameters,
    mean_fn: ConstMean,
    cov_fn: CovFn,
    lik_fn: GaussLik,
    x_train: &[Vec<f64>],
    y_train: &[f64],
) -> GpsoResult<(Vec<f64>, f64)> {
    let base = neg_log_marginal_likelihood(hyp, mean_fn, cov_fn, lik_fn, x_train, y_train)?;

    let mut cov_grad = Vec::with_capacity(hyp.cov.len());
    for i in 0..hyp.cov.len() {
        let mut bumped = hyp.clone();
        bumped.cov[i] += FD_EPS;
        let f_plus = neg_log_marginal_likelihood(&bumped, mean_fn, cov_fn, lik_fn, x_train, y_train)?;
        cov_grad.push((f_plus - base) / FD_EPS);
    }

    let mut bumped = hyp.clone();
    bumped.lik += FD_EPS;
    let f_plus = neg_log_marginal_likelihood(&bumped, mean_fn, cov_fn, lik_fn, x_train, y_train)?;
    let lik_grad = (f_plus - base) / FD_EPS;

    Ok((cov_grad, lik_grad))
}

/// Optimizes `hyp0` against `(x_train, y_train)` for up to `max_iter`
/// iterations, minimizing the negative log marginal likelihood. The
/// caller (`Surrogate::train`) is responsible for clamping `hyp.lik` into
/// `LIK_BND` afterwards.
pub fn gp_train(
    hyp0: &Hyperparameters,
    mean_fn: ConstMean,
    cov_fn: CovFn,
    lik_fn: GaussLik,
    x_train: &[Vec<f64>],
    y_train: &[f64],
    max_iter: usize,
) -> GpsoResult<Hyperparameters> {
    let mut hyp = hyp0.clone();
    if x_train.len() < 2 {
        // Not enough data to inform a fit; keep the prior hyperparameters.
        return Ok(hyp);
    }

    let mut step = STEP;
    let mut prev = neg_log_marginal_likelihood(&hyp, mean_fn, cov_fn, lik_fn, x_train, y_train)?;

    for iter in 0..max_iter {
        let (cov_grad, lik_grad) = numerical_grad(&hyp, mean_fn, cov_fn, lik_fn, x_train, y_train)?;

        let mut candidate = hyp.clone();
        for (c, g) in candidate.cov.iter_mut().zip(cov_grad.iter()) {
            *c -= step * g;
        }
        candidate.lik -= step * lik_grad;

        match neg_log_marginal_likelihood(&candidate, mean_fn, cov_fn, lik_fn, x_train, y_train) {
            Ok(nlml) if nlml < prev => {
                hyp = candidate;
                prev = nlml;
                step *= 1.1;
            }
            _ => {
                step *= 0.5;
                if step < 1e-8 {
                    debug!(iter, "gp_train: step size collapsed, stopping early");
                    break;
                }
            }
        }
    }

    Ok(hyp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_improves_or_matches_the_initial_fit() {
        let x_train = vec![
            vec![0.0, 0.0],
            vec![0.2, 0.1],
            vec![0.5, 0.5],
            vec![0.9, 0.8],
            vec![1.0, 1.0],
        ];
        let y_train = vec![1.0, 0.9, 0.3, -0.5, -1.0];

        let hyp0 = Hyperparameters::new(vec![0.0], vec![0.0, 0.0], (1e-4f64).ln());
        let trained = gp_train(
            &hyp0,
            ConstMean,
            CovFn::MaternIso { nu: 2.5 },
            GaussLik,
            &x_train,
            &y_train,
            50,
        )
        .unwrap();

        let before =
            neg_log_marginal_likelihood(&hyp0, ConstMean, CovFn::MaternIso { nu: 2.5 }, GaussLik, &x_train, &y_train)
                .unwrap();
        let after = neg_log_marginal_likelihood(
            &trained,
            ConstMean,
            CovFn::MaternIso { nu: 2.5 },
            GaussLik,
            &x_train,
            &y_train,
        )
        .unwrap();

        assert!(after <= before + 1e-6);
    }

    #[test]
    fn training_with_too_few_points_is_a_no_op() {
        let hyp0 = Hyperparameters::new(vec![0.0], vec![0.1, 0.2], (1e-4f64).ln());
        let trained = gp_train(
            &hyp0,
            ConstMean,
            CovFn::MaternIso { nu: 2.5 },
            GaussLik,
            &[vec![0.0]],
            &[1.0],
            50,
        )
        .unwrap();
        assert_eq!(trained, hyp0);
    }
}
