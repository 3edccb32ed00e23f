//! The GP surrogate: a growable table of sample points in normalized
//! coordinates, carrying a three-column score `(μ, σ, u)` and distinguishing
//! truly evaluated samples (`σ = 0`) from GP-predicted ones (`σ > 0`).

use crate::domain::Domain;
use crate::gp_config::GPConfig;
use gpso_error::{GpsoResult, gpso_err};
use gpso_gp::{gp_predict, gp_train};
use tracing::{trace, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The smallest posterior std a GP-based row is allowed to report, so a
/// predicted point can never look evaluated by numerical accident.
const SIGMA_FLOOR: f64 = 1e-9;

/// The `gp_predict` noise-bump retry ramp stops once `hyp.lik` would reach
/// this ceiling, independent of the (wider) `LIK_BND` clamp applied after
/// `train()`.
const RETRY_CEILING: f64 = 0.0;

/// A single row of the surrogate table. Returned by accessor methods;
/// the table itself is stored column-wise for cache-friendly bulk updates.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub x: Vec<f64>,
    pub mu: f64,
    pub sigma: f64,
    pub u: f64,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Surrogate {
    lower: Vec<f64>,
    upper: Vec<f64>,
    x: Vec<Vec<f64>>,
    mu: Vec<f64>,
    sigma: Vec<f64>,
    u: Vec<f64>,
    ne: usize,
    ng: usize,
    pub config: GPConfig,
}

impl Surrogate {
    /// `init(domain)`: stores bounds, clears the table.
    pub fn init(domain: &Domain, config: GPConfig) -> Self {
        Self {
            lower: domain.lower().to_vec(),
            upper: domain.upper().to_vec(),
            x: Vec::new(),
            mu: Vec::new(),
            sigma: Vec::new(),
            u: Vec::new(),
            ne: 0,
            ng: 0,
            config,
        }
    }

    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn evaluated_count(&self) -> usize {
        self.ne
    }

    pub fn gp_based_count(&self) -> usize {
        self.ng
    }

    fn delta(&self, i: usize) -> f64 {
        self.upper[i] - self.lower[i]
    }

    pub fn normalize(&self, x: &[f64]) -> Vec<f64> {
        (0..self.dim())
            .map(|i| (x[i] - self.lower[i]) / self.delta(i))
            .collect()
    }

    pub fn denormalize(&self, x: &[f64]) -> Vec<f64> {
        (0..self.dim())
            .map(|i| self.lower[i] + x[i] * self.delta(i))
            .collect()
    }

    pub fn record(&self, k: usize) -> SampleRecord {
        SampleRecord {
            x: self.x[k].clone(),
            mu: self.mu[k],
            sigma: self.sigma[k],
            u: self.u[k],
        }
    }

    pub fn x_at(&self, k: usize) -> &[f64] {
        &self.x[k]
    }

    pub fn mu_at(&self, k: usize) -> f64 {
        self.mu[k]
    }

    pub fn sigma_at(&self, k: usize) -> f64 {
        self.sigma[k]
    }

    pub fn u_at(&self, k: usize) -> f64 {
        self.u[k]
    }

    /// `σ[k] > 0`.
    pub fn is_gp_based(&self, k: usize) -> bool {
        self.sigma[k] > 0.0
    }

    /// Appends rows. `xs` is taken in normalized coordinates if
    /// `already_normalized`, otherwise each point is normalized first.
    /// Rows with `σ = 0` count as evaluated, `σ > 0` as GP-based. Returns
    /// the indices of the newly appended rows.
    pub fn append(
        &mut self,
        xs: &[Vec<f64>],
        mus: &[f64],
        sigmas: &[f64],
        already_normalized: bool,
    ) -> Vec<usize> {
        assert_eq!(xs.len(), mus.len());
        assert_eq!(xs.len(), sigmas.len());

        let mut indices = Vec::with_capacity(xs.len());
        for i in 0..xs.len() {
            assert!(sigmas[i] >= 0.0, "negative sigma is a programmer error: {}", sigmas[i]);
            let x = if already_normalized {
                xs[i].clone()
            } else {
                self.normalize(&xs[i])
            };
            let sigma = if sigmas[i] > 0.0 { sigmas[i].max(SIGMA_FLOOR) } else { 0.0 };
            if sigma == 0.0 {
                self.ne += 1;
            } else {
                self.ng += 1;
            }
            let u = if sigma == 0.0 { mus[i] } else { mus[i] + self.config.schedule(self.ng) * sigma };

            let idx = self.x.len();
            self.x.push(x);
            self.mu.push(mus[i]);
            self.sigma.push(sigma);
            self.u.push(u);
            indices.push(idx);
        }
        indices
    }

    /// `update(k, μ, σ)`: overwrites rows at `k`, maintaining `Ne`/`Ng` by
    /// diffing the previous vs. new `σ` nonzero-ness.
    pub fn update(&mut self, indices: &[usize], mus: &[f64], sigmas: &[f64]) {
        assert_eq!(indices.len(), mus.len());
        assert_eq!(indices.len(), sigmas.len());

        for (pos, &k) in indices.iter().enumerate() {
            assert!(sigmas[pos] >= 0.0, "negative sigma is a programmer error: {}", sigmas[pos]);
            let was_evaluated = self.sigma[k] == 0.0;
            let sigma = if sigmas[pos] > 0.0 { sigmas[pos].max(SIGMA_FLOOR) } else { 0.0 };
            let is_evaluated = sigma == 0.0;

            match (was_evaluated, is_evaluated) {
                (false, true) => {
                    self.ng -= 1;
                    self.ne += 1;
                }
                (true, false) => {
                    self.ne -= 1;
                    self.ng += 1;
                }
                _ => {}
            }

            self.mu[k] = mus[pos];
            self.sigma[k] = sigma;
            self.u[k] = if sigma == 0.0 {
                mus[pos]
            } else {
                mus[pos] + self.config.schedule(self.ng) * sigma
            };
        }
    }

    /// Recomputes `u ← μ + ς(Ng)·σ` for every GP-based row; evaluated rows
    /// keep `u = μ`.
    pub fn ucb_refresh(&mut self) {
        let varsigma = self.config.schedule(self.ng);
        for k in 0..self.x.len() {
            self.u[k] = if self.sigma[k] == 0.0 {
                self.mu[k]
            } else {
                self.mu[k] + varsigma * self.sigma[k]
            };
        }
    }

    fn evaluated_training_set(&self) -> (Vec<Vec<f64>>, Vec<f64>) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for k in 0..self.x.len() {
            if self.sigma[k] == 0.0 {
                xs.push(self.x[k].clone());
                ys.push(self.mu[k]);
            }
        }
        (xs, ys)
    }

    /// `predict(x_query)`: normalized inputs, evaluated samples only as
    /// training data. On `gp_predict` failure, bumps `hyp.lik` and retries
    /// until it would cross `LIK_BND.1`, at which point the failure is
    /// fatal.
    pub fn predict(&mut self, x_query: &[Vec<f64>]) -> GpsoResult<(Vec<f64>, Vec<f64>)> {
        let (x_train, y_train) = self.evaluated_training_set();

        loop {
            let attempt = gp_predict(
                &self.config.hyp,
                self.config.mean_fn,
                self.config.cov_fn,
                self.config.lik_fn,
                &x_train,
                &y_train,
                x_query,
            );

            match attempt {
                Ok((mu, var)) => {
                    let sigma = var.into_iter().map(|v| v.sqrt().max(SIGMA_FLOOR)).collect();
                    return Ok((mu, sigma));
                }
                Err(e) => {
                    if self.config.hyp.lik >= RETRY_CEILING {
                        return Err(e.with_context("gp_predict failed after exhausting the noise ramp"));
                    }
                    warn!(lik = self.config.hyp.lik, "gp_predict failed, bumping log-noise and retrying");
                    self.config.hyp.lik = (self.config.hyp.lik + 1.0).min(RETRY_CEILING);
                }
            }
        }
    }

    /// `train()`: optimizes `hyp` against the evaluated samples, clamps
    /// `hyp.lik` into `LIK_BND`, then refreshes every GP-based row's
    /// `(μ, σ, u)` by re-predicting at its `x`.
    pub fn train(&mut self, max_iter: usize) -> GpsoResult<()> {
        let (x_train, y_train) = self.evaluated_training_set();

        let trained = gp_train(
            &self.config.hyp,
            self.config.mean_fn,
            self.config.cov_fn,
            self.config.lik_fn,
            &x_train,
            &y_train,
            max_iter,
        )?;

        self.config.hyp = trained;
        self.config.hyp.clamp_lik();
        trace!(lik = self.config.hyp.lik, ne = self.ne, "trained GP hyperparameters");

        let gp_indices: Vec<usize> = (0..self.x.len()).filter(|&k| self.sigma[k] > 0.0).collect();
        if !gp_indices.is_empty() {
            let queries: Vec<Vec<f64>> = gp_indices.iter().map(|&k| self.x[k].clone()).collect();
            let (mus, sigmas) = self.predict(&queries)?;
            self.update(&gp_indices, &mus, &sigmas);
            self.ucb_refresh();
        }

        Ok(())
    }

    /// `best_evaluated()`: argmax of `μ` over evaluated rows.
    pub fn best_evaluated(&self) -> GpsoResult<(Vec<f64>, f64, usize)> {
        let mut best: Option<(f64, usize)> = None;
        for k in 0..self.x.len() {
            if self.sigma[k] == 0.0 {
                match best {
                    Some((best_mu, _)) if self.mu[k] <= best_mu => {}
                    _ => best = Some((self.mu[k], k)),
                }
            }
        }
        match best {
            Some((mu, k)) => Ok((self.x[k].clone(), mu, k)),
            None => Err(gpso_err!(Configuration: "no evaluated samples; surrogate has not been initialized")),
        }
    }

    /// `Ne + Ng = Ns` and `Ne` equals the count of rows with `σ = 0`.
    #[cfg(test)]
    fn invariant_holds(&self) -> bool {
        let sigma_zero = self.sigma.iter().filter(|&&s| s == 0.0).count();
        self.ne + self.ng == self.x.len() && self.ne == sigma_zero
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exploration::ExplorationSchedule;

    fn domain() -> Domain {
        Domain::new(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap()
    }

    fn surrogate() -> Surrogate {
        let cfg = GPConfig::new(2, 1e-4, ExplorationSchedule::Constant(3.0));
        Surrogate::init(&domain(), cfg)
    }

    #[test]
    fn append_evaluated_row_counts_as_ne() {
        let mut s = surrogate();
        let idx = s.append(&[vec![0.5, 0.5]], &[1.0], &[0.0], true);
        assert_eq!(idx, vec![0]);
        assert_eq!(s.evaluated_count(), 1);
        assert_eq!(s.gp_based_count(), 0);
        assert!(s.invariant_holds());
    }

    #[test]
    #[should_panic(expected = "negative sigma is a programmer error")]
    fn append_rejects_negative_sigma() {
        let mut s = surrogate();
        s.append(&[vec![0.5, 0.5]], &[1.0], &[-0.1], true);
    }

    #[test]
    #[should_panic(expected = "negative sigma is a programmer error")]
    fn update_rejects_negative_sigma() {
        let mut s = surrogate();
        s.append(&[vec![0.5, 0.5]], &[1.0], &[0.0], true);
        s.update(&[0], &[1.0], &[-0.1]);
    }

    #[test]
    fn append_gp_based_row_counts_as_ng() {
        let mut s = surrogate();
        s.append(&[vec![0.5, 0.5]], &[1.0], &[0.2], true);
        assert_eq!(s.evaluated_count(), 0);
        assert_eq!(s.gp_based_count(), 1);
        assert!(s.is_gp_based(0));
        assert!(s.invariant_holds());
    }

    #[test]
    fn update_transitions_gp_based_to_evaluated() {
        let mut s = surrogate();
        s.append(&[vec![0.5, 0.5]], &[1.0], &[0.2], true);
        assert_eq!(s.gp_based_count(), 1);

        s.update(&[0], &[1.5], &[0.0]);
        assert_eq!(s.evaluated_count(), 1);
        assert_eq!(s.gp_based_count(), 0);
        assert_eq!(s.u_at(0), 1.5);
        assert!(s.invariant_holds());
    }

    #[test]
    fn ucb_refresh_leaves_evaluated_rows_at_mu() {
        let mut s = surrogate();
        s.append(&[vec![0.1, 0.1]], &[2.0], &[0.0], true);
        s.ucb_refresh();
        assert_eq!(s.u_at(0), 2.0);
    }

    #[test]
    fn ucb_refresh_recomputes_gp_based_rows() {
        let mut s = surrogate();
        s.append(&[vec![0.1, 0.1]], &[2.0], &[0.5], true);
        s.ucb_refresh();
        assert!((s.u_at(0) - (2.0 + 3.0 * 0.5)).abs() < 1e-9);
    }

    #[test]
    fn best_evaluated_ignores_gp_based_rows() {
        let mut s = surrogate();
        s.append(&[vec![0.1, 0.1], vec![0.9, 0.9]], &[1.0, 5.0], &[0.0, 0.3], true);
        let (x, mu, k) = s.best_evaluated().unwrap();
        assert_eq!(k, 0);
        assert_eq!(mu, 1.0);
        assert_eq!(x, vec![0.1, 0.1]);
    }

    #[test]
    fn predict_on_empty_training_set_returns_prior() {
        let mut s = surrogate();
        let (mu, sigma) = s.predict(&[vec![0.5, 0.5]]).unwrap();
        assert_eq!(mu.len(), 1);
        assert!(sigma[0] > 0.0);
    }

    #[test]
    fn train_is_a_no_op_below_two_evaluated_samples() {
        let mut s = surrogate();
        s.append(&[vec![0.5, 0.5]], &[1.0], &[0.0], true);
        let hyp_before = s.config.hyp.clone();
        s.train(50).unwrap();
        assert_eq!(s.config.hyp, hyp_before);
    }

    #[test]
    fn predicted_points_never_report_zero_sigma() {
        let mut s = surrogate();
        s.append(
            &[vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]],
            &[1.0, -1.0, 0.5],
            &[0.0, 0.0, 0.0],
            true,
        );
        let (_, sigma) = s.predict(&[vec![0.0, 0.0]]).unwrap();
        assert!(sigma[0] > 0.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip_preserves_every_row_exactly() {
        let mut s = surrogate();
        s.append(&[vec![0.1, 0.2], vec![0.8, 0.9]], &[1.0, 2.0], &[0.0, 0.3], true);

        let json = serde_json::to_string(&s).unwrap();
        let restored: Surrogate = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.len(), s.len());
        assert_eq!(restored.evaluated_count(), s.evaluated_count());
        assert_eq!(restored.gp_based_count(), s.gp_based_count());
        for k in 0..s.len() {
            assert_eq!(restored.x_at(k), s.x_at(k));
            assert_eq!(restored.mu_at(k), s.mu_at(k));
            assert_eq!(restored.sigma_at(k), s.sigma_at(k));
            assert_eq!(restored.u_at(k), s.u_at(k));
        }
    }
}
