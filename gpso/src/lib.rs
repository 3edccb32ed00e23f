//! GPSO: a global black-box optimizer that **maximizes** an expensive
//! objective `f: ℝ^d → ℝ` over a hyper-rectangular domain under a fixed
//! evaluation budget.
//!
//! The algorithm combines a Gaussian-Process surrogate with an
//! Upper-Confidence-Bound acquisition rule and a DIRECT-style ternary
//! partition of the normalized search domain: the [`Surrogate`] tracks both
//! truly evaluated and GP-predicted samples, the [`PartitionTree`] refines
//! the unit hypercube's most promising leaves, and the [`Optimizer`]
//! orchestrates the two across a four-step iteration (opportunistic
//! evaluation, Pareto-by-depth selection, look-ahead pruning, commit).
//!
//! ```no_run
//! use gpso::{Domain, maximize};
//!
//! let domain = Domain::new(vec![-1.0, -1.0], vec![1.0, 1.0]).unwrap();
//! let result = maximize(|x| -(x[0] - 0.3).powi(2) - (x[1] + 0.4).powi(2), domain, 50).unwrap();
//! println!("best: {:?} -> {}", result.solution.0, result.solution.1);
//! ```

pub use gpso_core::{Domain, ExplorationSchedule, GPConfig, PartitionTree, SampleRecord, Surrogate};
pub use gpso_error::{ErrorCode, GpsoError, GpsoResult};
pub use gpso_engine::{Engine, EngineExt, IterationRecord, Observer, Optimizer, OptimizerBuilder, OptimizerConfig, Snapshot, Solution};

#[cfg(feature = "serde")]
pub use gpso_engine::{Checkpoint, from_json, to_json};

pub mod prelude {
    pub use crate::{Domain, ExplorationSchedule, GpsoError, GpsoResult, Optimizer, OptimizerBuilder, Solution, maximize};
}

/// Convenience entry point: maximizes `objective` over `domain` with the
/// default configuration (`sigma=1e-4`, `eta`-calibrated exploration,
/// `upc = 2*dim`), running until `n_max` evaluations have been spent.
///
/// For control over `upc`, `varsigma`, observers, or checkpointing, build an
/// [`Optimizer`] directly via [`OptimizerBuilder`].
pub fn maximize<F>(objective: F, domain: Domain, n_max: usize) -> GpsoResult<Solution>
where
    F: Fn(&[f64]) -> f64,
{
    let mut optimizer = OptimizerBuilder::new(domain.dim()).n_max(n_max).build(domain, objective)?;
    optimizer.run_to_completion()?;
    optimizer.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maximize_converges_near_the_quadratic_optimum() {
        let domain = Domain::new(vec![-1.0, -1.0], vec![1.0, 1.0]).unwrap();
        let c = [0.3, -0.4];
        let mut optimizer = OptimizerBuilder::new(2)
            .n_max(50)
            .varsigma(3.0)
            .build(domain, move |x: &[f64]| -((x[0] - c[0]).powi(2) + (x[1] - c[1]).powi(2)))
            .unwrap();
        optimizer.run_to_completion().unwrap();
        let result = optimizer.finalize().unwrap();

        let (x_star, f_star) = result.solution;
        let dist = ((x_star[0] - c[0]).powi(2) + (x_star[1] - c[1]).powi(2)).sqrt();
        assert!(dist < 0.05, "distance to optimum was {dist}");
        assert!(f_star >= -0.01, "f* was {f_star}");
    }

    #[test]
    fn maximize_finds_the_sinusoid_peak() {
        let domain = Domain::new(vec![0.0], vec![std::f64::consts::PI]).unwrap();
        let mut optimizer = OptimizerBuilder::new(1)
            .n_max(30)
            .varsigma(3.0)
            .build(domain, |x: &[f64]| (5.0 * x[0]).sin())
            .unwrap();
        optimizer.run_to_completion().unwrap();
        let result = optimizer.finalize().unwrap();

        let (x_star, f_star) = result.solution;
        assert!((0.30..=0.34).contains(&x_star[0]), "x* was {}", x_star[0]);
        assert!(f_star >= 0.999, "f* was {f_star}");
    }

    #[test]
    fn maximize_rejects_bad_n_max() {
        let domain = Domain::new(vec![0.0], vec![1.0]).unwrap();
        let result = maximize(|x: &[f64]| x[0], domain, 1);
        assert!(result.is_err());
    }
}
