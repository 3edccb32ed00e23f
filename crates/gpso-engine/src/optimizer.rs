//! The `Optimizer`: initialization, the four-step iteration (opportunistic
//! evaluation, Pareto-by-depth selection with forced sampling, look-ahead
//! pruning, commit), the adaptive `XI` depth bound, and the quadratic
//! hyperparameter retrain cadence.

use gpso_core::{Domain, PartitionTree, Surrogate, box_center, ternary_split_geometry};
use gpso_error::{ErrorCode, GpsoResult, gpso_err};
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{OptimizerConfig, xi_max};
use crate::engine::Engine;
use crate::events::{Observer, Snapshot};

/// One row of the persisted `iter` log: `[XI, n_selected, LB]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IterationRecord {
    pub xi: f64,
    pub n_selected: usize,
    pub lb: f64,
}

/// The optimizer's return value: every truly evaluated `(x, f)` pair in
/// original coordinates, and the argmax among them.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub samples: Vec<(Vec<f64>, f64)>,
    pub solution: (Vec<f64>, f64),
}

/// Orchestrates a GPSO run. Owns the [`Surrogate`] and [`PartitionTree`]
/// exclusively — per the concurrency model, no other component reaches
/// into their state.
pub struct Optimizer<F> {
    pub(crate) domain: Domain,
    pub(crate) surrogate: Surrogate,
    pub(crate) tree: PartitionTree,
    objective: F,
    pub(crate) config: OptimizerConfig,
    pub(crate) xi: f64,
    pub(crate) lb: f64,
    pub(crate) retrain_n: usize,
    pub(crate) iter_count: usize,
    pub(crate) history: Vec<IterationRecord>,
    pub(crate) observers: Vec<Box<dyn Observer>>,
}

impl<F> Optimizer<F>
where
    F: Fn(&[f64]) -> f64,
{
    pub(crate) fn new(
        domain: Domain,
        surrogate: Surrogate,
        tree: PartitionTree,
        objective: F,
        config: OptimizerConfig,
        lb: f64,
        observers: Vec<Box<dyn Observer>>,
    ) -> Self {
        Self {
            domain,
            surrogate,
            tree,
            objective,
            config,
            xi: 1.0,
            lb,
            retrain_n: 1,
            iter_count: 0,
            history: Vec::new(),
            observers,
        }
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn surrogate(&self) -> &Surrogate {
        &self.surrogate
    }

    pub fn tree(&self) -> &PartitionTree {
        &self.tree
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn xi(&self) -> f64 {
        self.xi
    }

    pub fn lb(&self) -> f64 {
        self.lb
    }

    pub fn iteration(&self) -> usize {
        self.iter_count
    }

    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }

    /// `Ne ≥ N_max`: the budget is exhausted, whether because construction
    /// itself already met it or because enough iterations have run.
    pub fn should_stop(&self) -> bool {
        self.surrogate.evaluated_count() >= self.config.n_max
    }

    pub(crate) fn fire_post_initialise(&mut self) -> GpsoResult<()> {
        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            observer.post_initialise(&snapshot)?;
        }
        Ok(())
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            iteration: self.iter_count,
            xi: self.xi,
            lb: self.lb,
            ne: self.surrogate.evaluated_count(),
            ng: self.surrogate.gp_based_count(),
            ns: self.surrogate.len(),
        }
    }

    /// Step 1 — opportunistic evaluation: promote every row whose UCB
    /// already exceeds `LB`.
    fn step1_opportunistic(&mut self) -> GpsoResult<()> {
        self.surrogate.ucb_refresh();
        let candidates: Vec<usize> = (0..self.surrogate.len())
            .filter(|&k| self.surrogate.u_at(k) > self.lb)
            .collect();
        if candidates.is_empty() {
            return Ok(());
        }

        let mut mus = Vec::with_capacity(candidates.len());
        let sigmas = vec![0.0; candidates.len()];
        for &k in &candidates {
            let x = self.domain.denormalize(self.surrogate.x_at(k));
            mus.push((self.objective)(&x));
        }
        self.surrogate.update(&candidates, &mus, &sigmas);
        self.surrogate.ucb_refresh();
        for &mu in &mus {
            if mu > self.lb {
                self.lb = mu;
            }
        }
        Ok(())
    }

    /// Step 2 — Pareto-by-depth leaf selection with forced sampling. One
    /// entry per depth `1..=tree.depth()`, `None` where no leaf qualified.
    fn step2_pareto_selection(&mut self) -> GpsoResult<Vec<Option<(usize, usize, f64)>>> {
        let depth = self.tree.depth();
        let mut selections = Vec::with_capacity(depth);
        let mut v_max = f64::NEG_INFINITY;

        for h in 1..=depth {
            let v_max_at_entry = v_max;
            loop {
                let mut best: Option<(usize, usize, f64)> = None;
                for i in 0..self.tree.width(h) {
                    if !self.tree.leaf(h, i) {
                        continue;
                    }
                    let k = self.tree.sample(h, i);
                    let u = self.surrogate.u_at(k);
                    if u > v_max_at_entry {
                        match best {
                            Some((_, _, best_u)) if u <= best_u => {}
                            _ => best = Some((i, k, u)),
                        }
                    }
                }

                match best {
                    None => {
                        selections.push(None);
                        break;
                    }
                    Some((i, k, u)) => {
                        if self.surrogate.is_gp_based(k) {
                            let x = self.domain.denormalize(self.surrogate.x_at(k));
                            let f = (self.objective)(&x);
                            self.surrogate.update(&[k], &[f], &[0.0]);
                            self.surrogate.ucb_refresh();
                            if f > self.lb {
                                self.lb = f;
                            }
                            // restart this depth's scan against the same v_max_at_entry
                        } else {
                            selections.push(Some((i, k, u)));
                            v_max = u;
                            break;
                        }
                    }
                }
            }
        }

        Ok(selections)
    }

    /// Step 3 — bounded virtual ternary expansion to confirm a selected
    /// leaf is worth splitting; drops selections that can't plausibly
    /// catch up with the next selected depth's UCB.
    fn step3_lookahead(&mut self, selections: &mut [Option<(usize, usize, f64)>]) -> GpsoResult<()> {
        let depth = self.tree.depth();
        let n_sel = selections.iter().filter(|s| s.is_some()).count();

        for h in 1..=depth {
            let idx = h - 1;
            let (i_sel, _k_sel, g_sel) = match selections[idx] {
                Some(t) => t,
                None => continue,
            };

            let next_selected_offset = selections[idx + 1..].iter().position(|s| s.is_some());
            let offset = match next_selected_offset {
                None => continue, // deepest selection: nothing to catch up to, keep it
                Some(offset) => offset,
            };
            let (_, _, target_bound) = selections[idx + 1 + offset].expect("position() found a Some entry");
            let h_prime = idx + 1 + offset + 1;

            let raw_distance = h_prime - h;
            let capped = depth.min(((h as f64) + self.xi).ceil() as usize).saturating_sub(h);
            let sdepth = raw_distance.min(capped);

            if sdepth == 0 {
                selections[idx] = None;
                continue;
            }

            let lower0 = self.tree.lower(h, i_sel).to_vec();
            let upper0 = self.tree.upper(h, i_sel).to_vec();
            let survives = self.virtual_lookahead(&lower0, &upper0, g_sel, target_bound, sdepth, n_sel)?;
            if !survives {
                selections[idx] = None;
            }
        }

        Ok(())
    }

    /// Virtually grows a ternary tree rooted at `(lower0, upper0)` to depth
    /// `sdepth`, predicting both outer-child centers at each level (the
    /// middle inherits its parent's value) and tracking the best UCB seen.
    /// Terminates early the moment that UCB reaches `target_bound`.
    fn virtual_lookahead(
        &mut self,
        lower0: &[f64],
        upper0: &[f64],
        g_sel: f64,
        target_bound: f64,
        sdepth: usize,
        n_sel: usize,
    ) -> GpsoResult<bool> {
        let mut z_max = g_sel;
        if z_max >= target_bound {
            return Ok(true);
        }

        let mut frontier = vec![(lower0.to_vec(), upper0.to_vec())];
        for level_offset in 1..=sdepth {
            let m2 = self.surrogate.gp_based_count() as i64 + 2 * (n_sel as i64 + level_offset as i64 - 1);
            let m2 = m2.max(0) as usize;
            let varsigma = self.surrogate.config.schedule(m2);

            let mut next_frontier = Vec::with_capacity(frontier.len() * 3);
            for (lo, hi) in &frontier {
                let (lowers, uppers, _axis) = ternary_split_geometry(lo, hi);
                for outer in [0usize, 2usize] {
                    let center = box_center(&lowers[outer], &uppers[outer]);
                    let (mu, sigma) = self.surrogate.predict(&[center])?;
                    let z = mu[0] + varsigma * sigma[0];
                    if z > z_max {
                        z_max = z;
                    }
                    if z_max >= target_bound {
                        return Ok(true);
                    }
                    next_frontier.push((lowers[outer].clone(), uppers[outer].clone()));
                }
                next_frontier.push((lowers[1].clone(), uppers[1].clone()));
            }
            frontier = next_frontier;
        }

        Ok(z_max >= target_bound)
    }

    /// Step 4 — for each surviving selection, predict its two outer
    /// children, append them as GP-based samples, and split the tree.
    fn step4_commit(&mut self, selections: &[Option<(usize, usize, f64)>]) -> GpsoResult<usize> {
        let mut n_committed = 0;
        for (idx, sel) in selections.iter().enumerate() {
            let (i, _k, _u) = match sel {
                Some(t) => *t,
                None => continue,
            };
            let h = idx + 1;

            let lower_parent = self.tree.lower(h, i).to_vec();
            let upper_parent = self.tree.upper(h, i).to_vec();
            let parent_sample = self.tree.sample(h, i);

            let (lowers, uppers, _axis) = ternary_split_geometry(&lower_parent, &upper_parent);
            let g_center = box_center(&lowers[0], &uppers[0]);
            let d_center = box_center(&lowers[2], &uppers[2]);

            let (mus, sigmas) = self.surrogate.predict(&[g_center.clone(), d_center.clone()])?;
            let new_idx = self.surrogate.append(&[g_center, d_center], &mus, &sigmas, true);
            let (k_lo, k_hi) = (new_idx[0], new_idx[1]);

            self.tree.split(h, i, lowers, uppers, [k_lo, parent_sample, k_hi]);
            n_committed += 1;
        }
        if n_committed > 0 {
            self.surrogate.ucb_refresh();
        }
        Ok(n_committed)
    }

    /// Retrains on the quadratic cadence `2·Ns ≥ upc·n·(n+1)`, then sets
    /// `n ← ⌈(√(1 + 8·Ns/upc) − 1)/2⌉`.
    fn maybe_retrain(&mut self) -> GpsoResult<()> {
        let ns = self.tree.split_count() as f64;
        let n = self.retrain_n as f64;
        if 2.0 * ns < self.config.upc * n * (n + 1.0) {
            return Ok(());
        }

        self.surrogate.train(self.config.max_train_iter)?;
        let next_n = ((1.0 + 8.0 * ns / self.config.upc).sqrt() - 1.0) / 2.0;
        self.retrain_n = next_n.ceil().max(1.0) as usize;
        debug!(ns, retrain_n = self.retrain_n, "retrained GP hyperparameters");

        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            observer.post_update(&snapshot)?;
        }
        Ok(())
    }

    /// Runs to completion: steps until `Ne ≥ N_max`, treating a
    /// search-exhaustion condition as an early, non-fatal stop.
    pub fn run_to_completion(&mut self) -> GpsoResult<()> {
        while !self.should_stop() {
            match self.next() {
                Ok(_) => {}
                Err(e) if !e.is_fatal() => {
                    warn!("{e}");
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Gathers every evaluated `(x, f)` in original coordinates and their
    /// argmax.
    pub fn finalize(&mut self) -> GpsoResult<Solution> {
        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            observer.pre_finalise(&snapshot)?;
        }

        let mut samples = Vec::new();
        for k in 0..self.surrogate.len() {
            if !self.surrogate.is_gp_based(k) {
                let x = self.domain.denormalize(self.surrogate.x_at(k));
                samples.push((x, self.surrogate.mu_at(k)));
            }
        }

        let (x_star, f_star, _k) = self.surrogate.best_evaluated()?;
        let x_star = self.domain.denormalize(&x_star);

        Ok(Solution { samples, solution: (x_star, f_star) })
    }
}

impl<F> Engine for Optimizer<F>
where
    F: Fn(&[f64]) -> f64,
{
    type Epoch = IterationRecord;

    fn next(&mut self) -> GpsoResult<IterationRecord> {
        let lb_before = self.lb;

        self.step1_opportunistic()?;
        let mut selections = self.step2_pareto_selection()?;
        if selections.iter().all(Option::is_none) {
            return Err(gpso_err!(
                SearchExhausted: "Step 2 selected no leaves at iteration {}",
                self.iter_count + 1
            ));
        }
        self.step3_lookahead(&mut selections)?;
        let n_selected = self.step4_commit(&selections)?;

        self.xi = if self.lb > lb_before {
            (self.xi + 4.0).min(xi_max(self.domain.dim()))
        } else {
            (self.xi - 0.5).max(1.0)
        };

        self.maybe_retrain()?;

        self.iter_count += 1;
        let record = IterationRecord { xi: self.xi, n_selected, lb: self.lb };
        self.history.push(record);

        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            observer.post_iteration(&snapshot)?;
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::OptimizerBuilder;
    use gpso_core::Domain;

    fn sphere(dim: usize) -> impl Fn(&[f64]) -> f64 {
        move |x: &[f64]| -x[..dim].iter().map(|v| v * v).sum::<f64>()
    }

    #[test]
    fn minimal_budget_runs_exactly_one_further_evaluation_round() {
        let domain = Domain::new(vec![-1.0, -1.0], vec![1.0, 1.0]).unwrap();
        let mut optimizer = OptimizerBuilder::new(2).n_max(2).build(domain, sphere(2)).unwrap();
        assert_eq!(optimizer.surrogate().evaluated_count(), 1);
        optimizer.run_to_completion().unwrap();
        assert!(optimizer.surrogate().evaluated_count() >= 2);
    }

    #[test]
    fn lb_is_monotone_non_decreasing_across_iterations() {
        let domain = Domain::new(vec![-1.0, -1.0], vec![1.0, 1.0]).unwrap();
        let mut optimizer = OptimizerBuilder::new(2)
            .n_max(15)
            .varsigma(3.0)
            .build(domain, sphere(2))
            .unwrap();

        let mut last_lb = optimizer.lb();
        while !optimizer.should_stop() {
            match optimizer.next() {
                Ok(record) => {
                    assert!(record.lb >= last_lb - 1e-12);
                    last_lb = record.lb;
                }
                Err(e) if e.code() == ErrorCode::SearchExhausted => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
    }

    #[test]
    fn finalize_returns_the_best_evaluated_sample() {
        let domain = Domain::new(vec![-1.0, -1.0], vec![1.0, 1.0]).unwrap();
        let mut optimizer = OptimizerBuilder::new(2)
            .n_max(20)
            .varsigma(3.0)
            .build(domain, sphere(2))
            .unwrap();
        optimizer.run_to_completion().unwrap();
        let solution = optimizer.finalize().unwrap();
        assert!(!solution.samples.is_empty());
        let (_, f_star) = &solution.solution;
        assert!(solution.samples.iter().all(|(_, f)| f <= f_star));
    }

    #[test]
    fn step1_promotes_a_gp_based_row_whose_ucb_beats_lb() {
        let domain = Domain::new(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
        let mut optimizer = OptimizerBuilder::new(2)
            .n_max(5)
            .varsigma(3.0)
            .build(domain, |_: &[f64]| 7.5)
            .unwrap();

        optimizer.lb = 9.0;
        let injected = optimizer.surrogate.append(&[vec![0.2, 0.2]], &[10.0], &[0.1], true);
        let k = injected[0];
        assert!(optimizer.surrogate.is_gp_based(k));

        optimizer.step1_opportunistic().unwrap();

        assert!(!optimizer.surrogate.is_gp_based(k), "row should have been evaluated");
        assert_eq!(optimizer.surrogate.sigma_at(k), 0.0);
        assert_eq!(optimizer.surrogate.mu_at(k), 7.5);
    }
}
