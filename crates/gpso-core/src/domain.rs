//! The hyper-rectangular search domain and the affine maps between its
//! original coordinates and the normalized unit hypercube gpso searches
//! internally.

use gpso_error::{GpsoResult, gpso_err};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A box `[lower, upper] ⊂ ℝ^d` with `upper_i > lower_i` for every `i`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Domain {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Domain {
    /// Validates and constructs a domain. Fails with `GpsoError::Configuration`
    /// if the domain is empty, of mismatched dimension, or has zero or
    /// negative width along any axis.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> GpsoResult<Self> {
        if lower.is_empty() || upper.is_empty() {
            return Err(gpso_err!(Configuration: "domain must have at least one dimension"));
        }
        if lower.len() != upper.len() {
            return Err(gpso_err!(
                Configuration: "lower/upper dimension mismatch ({} vs {})",
                lower.len(),
                upper.len()
            ));
        }
        for (i, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if !(hi > lo) {
                return Err(gpso_err!(
                    Configuration: "domain axis {} has non-positive width: lower={}, upper={}",
                    i,
                    lo,
                    hi
                ));
            }
        }
        Ok(Self { lower, upper })
    }

    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    fn delta(&self, i: usize) -> f64 {
        self.upper[i] - self.lower[i]
    }

    /// Maps a point in original coordinates to `[0,1]^d`.
    pub fn normalize(&self, x: &[f64]) -> Vec<f64> {
        (0..self.dim())
            .map(|i| (x[i] - self.lower[i]) / self.delta(i))
            .collect()
    }

    /// Maps a point in `[0,1]^d` back to original coordinates.
    pub fn denormalize(&self, x: &[f64]) -> Vec<f64> {
        (0..self.dim())
            .map(|i| self.lower[i] + x[i] * self.delta(i))
            .collect()
    }

    /// The geometric center of the domain in normalized coordinates:
    /// `(0.5, …, 0.5)`.
    pub fn unit_center(&self) -> Vec<f64> {
        vec![0.5; self.dim()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_domain() {
        assert!(Domain::new(vec![], vec![]).is_err());
    }

    #[test]
    fn rejects_zero_width_axis() {
        assert!(Domain::new(vec![0.0, 1.0], vec![1.0, 1.0]).is_err());
    }

    #[test]
    fn rejects_mismatched_dimension() {
        assert!(Domain::new(vec![0.0, 0.0], vec![1.0]).is_err());
    }

    #[test]
    fn normalize_denormalize_round_trips() {
        let domain = Domain::new(vec![-1.0, -1.0], vec![1.0, 1.0]).unwrap();
        let x = vec![0.3, -0.4];
        let normalized = domain.normalize(&x);
        for v in &normalized {
            assert!((0.0..=1.0).contains(v));
        }
        let back = domain.denormalize(&normalized);
        for (a, b) in x.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn unit_center_maps_to_domain_midpoint() {
        let domain = Domain::new(vec![0.0, -2.0], vec![4.0, 2.0]).unwrap();
        let mid = domain.denormalize(&domain.unit_center());
        assert!((mid[0] - 2.0).abs() < 1e-12);
        assert!((mid[1] - 0.0).abs() < 1e-12);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip_preserves_bounds_exactly() {
        let domain = Domain::new(vec![-1.0, 0.0, 2.5], vec![1.0, 4.0, 9.25]).unwrap();
        let json = serde_json::to_string(&domain).unwrap();
        let restored: Domain = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, domain);
    }
}
