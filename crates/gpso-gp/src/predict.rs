//! Exact Gaussian-Process regression: the `gp_predict` half of the external
//! GP library contract gpso is built against.

use crate::hyper::Hyperparameters;
use crate::kernel::{ConstMean, CovFn, GaussLik};
use gpso_error::{GpsoResult, gpso_err};
use nalgebra::{Cholesky, DMatrix, DVector};

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(p, q)| (p - q).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn covariance_matrix(cov_fn: CovFn, cov_hyp: &[f64], x: &[Vec<f64>], noise_var: f64) -> DMatrix<f64> {
    let n = x.len();
    let mut k = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in i..n {
            let r = euclidean(&x[i], &x[j]);
            let mut kij = cov_fn.eval(cov_hyp, r);
            if i == j {
                kij += noise_var;
            }
            k[(i, j)] = kij;
            k[(j, i)] = kij;
        }
    }
    k
}

/// Computes the posterior mean/variance of `x_query` given `(x_train,
/// y_train)` under `hyp`. Only ever called by `Surrogate::predict` with
/// evaluated samples as training data.
///
/// Returns `Err(GpsoError::Numerical)` if the training covariance is not
/// positive-definite at the current noise level; the caller is responsible
/// for bumping `hyp.lik` and retrying, per the GP library contract.
pub fn gp_predict(
    hyp: &Hyperparameters,
    mean_fn: ConstMean,
    cov_fn: CovFn,
    lik_fn: GaussLik,
    x_train: &[Vec<f64>],
    y_train: &[f64],
    x_query: &[Vec<f64>],
) -> GpsoResult<(Vec<f64>, Vec<f64>)> {
    let n = x_train.len();
    if n == 0 {
        let mean_const = mean_fn.eval(&hyp.mean);
        let sf2 = (2.0 * hyp.cov[1]).exp();
        let mu = vec![mean_const; x_query.len()];
        let var = vec![sf2; x_query.len()];
        return Ok((mu, var));
    }
    if n != y_train.len() {
        return Err(gpso_err!(
            Numerical: "x_train and y_train length mismatch ({} vs {})",
            n,
            y_train.len()
        ));
    }

    let noise_var = lik_fn.noise_var(hyp.lik);
    let k = covariance_matrix(cov_fn, &hyp.cov, x_train, noise_var);

    let chol = Cholesky::new(k).ok_or_else(|| {
        gpso_err!(Numerical: "training covariance is not positive-definite at lik={}", hyp.lik)
    })?;

    let mean_const = mean_fn.eval(&hyp.mean);
    let y_centered = DVector::from_iterator(n, y_train.iter().map(|y| y - mean_const));
    let alpha = chol.solve(&y_centered);

    let mut mu = Vec::with_capacity(x_query.len());
    let mut var = Vec::with_capacity(x_query.len());
    let k_ss = cov_fn.eval(&hyp.cov, 0.0);

    for xq in x_query {
        let k_star = DVector::from_iterator(
            n,
            x_train.iter().map(|xt| cov_fn.eval(&hyp.cov, euclidean(xt, xq))),
        );

        let mean = mean_const + k_star.dot(&alpha);
        let v = chol.solve(&k_star);
        let variance = (k_ss - k_star.dot(&v)).max(0.0);

        mu.push(mean);
        var.push(variance);
    }

    Ok((mu, var))
}

/// Negative log marginal likelihood of `(x_train, y_train)` under `hyp`,
/// the objective `gp_train` minimizes.
pub(crate) fn neg_log_marginal_likelihood(
    hyp: &Hyperparameters,
    mean_fn: ConstMean,
    cov_fn: CovFn,
    lik_fn: GaussLik,
    x_train: &[Vec<f64>],
    y_train: &[f64],
) -> GpsoResult<f64> {
    let n = x_train.len();
    let noise_var = lik_fn.noise_var(hyp.lik);
    let k = covariance_matrix(cov_fn, &hyp.cov, x_train, noise_var);

    let chol = Cholesky::new(k).ok_or_else(|| {
        gpso_err!(Numerical: "training covariance is not positive-definite at lik={}", hyp.lik)
    })?;

    let mean_const = mean_fn.eval(&hyp.mean);
    let y_centered = DVector::from_iterator(n, y_train.iter().map(|y| y - mean_const));
    let alpha = chol.solve(&y_centered);

    let data_fit = 0.5 * y_centered.dot(&alpha);
    let log_det = chol.l().diagonal().iter().map(|d| d.ln()).sum::<f64>();
    let complexity = log_det; // 0.5 * log|K| = sum(log(diag(L)))
    let norm_const = 0.5 * (n as f64) * (2.0 * std::f64::consts::PI).ln();

    let nlml = data_fit + complexity + norm_const;
    if !nlml.is_finite() {
        return Err(gpso_err!(Numerical: "non-finite marginal likelihood"));
    }
    Ok(nlml)
}
