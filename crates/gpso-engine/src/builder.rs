//! `OptimizerBuilder`: a fluent configuration surface over
//! [`OptimizerConfig`] that performs a run's opening phase — normalizing
//! the domain, evaluating the center, training the initial
//! hyperparameters, and seeding the partition tree — before handing back a
//! ready-to-iterate [`Optimizer`].

use gpso_core::{Domain, ExplorationSchedule, GPConfig, PartitionTree, Surrogate};
use gpso_error::GpsoResult;

use crate::config::OptimizerConfig;
use crate::events::Observer;
use crate::optimizer::Optimizer;

pub struct OptimizerBuilder {
    config: OptimizerConfig,
    observers: Vec<Box<dyn Observer>>,
}

impl OptimizerBuilder {
    pub fn new(dim: usize) -> Self {
        Self {
            config: OptimizerConfig::new(dim),
            observers: Vec::new(),
        }
    }

    pub fn from_config(config: OptimizerConfig) -> Self {
        Self { config, observers: Vec::new() }
    }

    pub fn sigma(mut self, sigma: f64) -> Self {
        self.config.sigma = sigma;
        self
    }

    /// Sets the `eta`-calibrated exploration schedule (the probability that
    /// the UCB underestimates the true objective).
    pub fn eta(mut self, eta: f64) -> Self {
        self.config.varsigma = ExplorationSchedule::Eta(eta);
        self
    }

    /// Sets a fixed exploration constant, overriding `eta`.
    pub fn varsigma(mut self, constant: f64) -> Self {
        self.config.varsigma = ExplorationSchedule::Constant(constant);
        self
    }

    pub fn upc(mut self, upc: f64) -> Self {
        self.config.upc = upc;
        self
    }

    pub fn n_max(mut self, n_max: usize) -> Self {
        self.config.n_max = n_max;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn max_train_iter(mut self, max_train_iter: usize) -> Self {
        self.config.max_train_iter = max_train_iter;
        self
    }

    pub fn observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Validates the configuration, evaluates the single initial sample at
    /// the domain midpoint, trains the GP on it, and seeds the partition
    /// tree — returning a fully initialized [`Optimizer`] ready to iterate.
    pub fn build<F>(self, domain: Domain, objective: F) -> GpsoResult<Optimizer<F>>
    where
        F: Fn(&[f64]) -> f64,
    {
        if self.config.verbose {
            crate::init_logging();
        }
        self.config.validate()?;

        let gp_config = GPConfig::new(domain.dim(), self.config.sigma, self.config.varsigma);
        let mut surrogate = Surrogate::init(&domain, gp_config);

        let center_normalized = domain.unit_center();
        let center_original = domain.denormalize(&center_normalized);
        let f0 = objective(&center_original);
        let center_idx = surrogate.append(&[center_normalized], &[f0], &[0.0], true);
        let k_center = center_idx[0];

        surrogate.train(self.config.max_train_iter)?;

        let tree = PartitionTree::init(domain.dim(), k_center);

        let mut optimizer = Optimizer::new(domain, surrogate, tree, objective, self.config, f0, self.observers);
        optimizer.fire_post_initialise()?;

        Ok(optimizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_evaluates_the_domain_center_exactly_once() {
        let domain = Domain::new(vec![0.0, 0.0], vec![2.0, 2.0]).unwrap();
        let optimizer = OptimizerBuilder::new(2).n_max(5).build(domain, |x: &[f64]| x[0] + x[1]).unwrap();
        assert_eq!(optimizer.surrogate().len(), 1);
        assert_eq!(optimizer.lb(), 2.0); // center (1,1) => f = 2
    }

    #[test]
    fn rejects_invalid_n_max_before_evaluating_the_objective() {
        let domain = Domain::new(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
        let calls = std::cell::Cell::new(0);
        let result = OptimizerBuilder::new(2).n_max(1).build(domain, |_: &[f64]| {
            calls.set(calls.get() + 1);
            0.0
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 0);
    }
}
