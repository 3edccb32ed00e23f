//! The ternary `PartitionTree`: a depth-indexed tree of axis-aligned boxes
//! over the unit hypercube, each referencing its representative sample by
//! index into a [`crate::Surrogate`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One depth of the tree, stored as parallel arrays — `lower[i]`/`upper[i]`
/// are the box extents of node `i`, `sample_idx[i]` its representative
/// sample, `leaf[i]` whether it is still eligible for refinement.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct Level {
    lower: Vec<Vec<f64>>,
    upper: Vec<Vec<f64>>,
    sample_idx: Vec<usize>,
    leaf: Vec<bool>,
}

impl Level {
    fn width(&self) -> usize {
        self.sample_idx.len()
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartitionTree {
    levels: Vec<Level>,
    /// Total number of splits performed across the whole tree.
    splits: usize,
}

/// Given a parent box, selects the longest axis (ties to the lowest index)
/// and returns the three child boxes `(lo, mid, hi)` tiling it along that
/// axis, plus the axis chosen. The middle child's center coincides exactly
/// with the parent's center; callers must not create a new sample for it.
pub fn ternary_split_geometry(
    lower: &[f64],
    upper: &[f64],
) -> ([Vec<f64>; 3], [Vec<f64>; 3], usize) {
    let dim = lower.len();
    let mut axis = 0;
    let mut best_width = upper[0] - lower[0];
    for i in 1..dim {
        let width = upper[i] - lower[i];
        if width > best_width {
            best_width = width;
            axis = i;
        }
    }

    let t_min = lower[axis];
    let t_max = upper[axis];
    let span = t_max - t_min;

    let mut lowers = [lower.to_vec(), lower.to_vec(), lower.to_vec()];
    let mut uppers = [upper.to_vec(), upper.to_vec(), upper.to_vec()];

    lowers[0][axis] = t_min;
    uppers[0][axis] = t_min + span / 3.0;

    lowers[1][axis] = t_min + span / 3.0;
    uppers[1][axis] = t_min + 2.0 * span / 3.0;

    lowers[2][axis] = t_min + 2.0 * span / 3.0;
    uppers[2][axis] = t_max;

    (lowers, uppers, axis)
}

/// The center of a box, used to place the two outer children's new samples.
pub fn box_center(lower: &[f64], upper: &[f64]) -> Vec<f64> {
    lower.iter().zip(upper.iter()).map(|(lo, hi)| 0.5 * (lo + hi)).collect()
}

impl PartitionTree {
    /// `init(d, k_center)`: creates depth 1 with one leaf `[0,1]^d` whose
    /// sample index is `k_center`.
    pub fn init(dim: usize, k_center: usize) -> Self {
        let root = Level {
            lower: vec![vec![0.0; dim]],
            upper: vec![vec![1.0; dim]],
            sample_idx: vec![k_center],
            leaf: vec![true],
        };
        Self {
            levels: vec![root],
            splits: 0,
        }
    }

    /// Maximum depth currently present (≥ 1).
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Total number of splits performed so far (`Ns`).
    pub fn split_count(&self) -> usize {
        self.splits
    }

    /// `width(h)`: number of nodes at depth `h` (1-indexed).
    pub fn width(&self, h: usize) -> usize {
        self.levels[h - 1].width()
    }

    pub fn leaf(&self, h: usize, i: usize) -> bool {
        self.levels[h - 1].leaf[i]
    }

    pub fn sample(&self, h: usize, i: usize) -> usize {
        self.levels[h - 1].sample_idx[i]
    }

    pub fn lower(&self, h: usize, i: usize) -> &[f64] {
        &self.levels[h - 1].lower[i]
    }

    pub fn upper(&self, h: usize, i: usize) -> &[f64] {
        &self.levels[h - 1].upper[i]
    }

    /// `split(h, i, lower₃, upper₃, idx₃)`: marks `(h, i)` non-leaf and
    /// appends three nodes at depth `h+1` with the given extents and
    /// sample indices, all flagged as leaves. `idx3` must list the low,
    /// mid, high children in that order; the caller is responsible for
    /// having set the middle entry to the parent's own sample index.
    pub fn split(&mut self, h: usize, i: usize, lower3: [Vec<f64>; 3], upper3: [Vec<f64>; 3], idx3: [usize; 3]) {
        self.levels[h - 1].leaf[i] = false;

        if self.levels.len() == h {
            self.levels.push(Level::default());
        }
        let child_level = &mut self.levels[h];
        for ((lo, hi), idx) in lower3.into_iter().zip(upper3).zip(idx3) {
            child_level.lower.push(lo);
            child_level.upper.push(hi);
            child_level.sample_idx.push(idx);
            child_level.leaf.push(true);
        }
        self.splits += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_single_root_leaf() {
        let tree = PartitionTree::init(3, 0);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.width(1), 1);
        assert!(tree.leaf(1, 0));
        assert_eq!(tree.sample(1, 0), 0);
        assert_eq!(tree.lower(1, 0), &[0.0, 0.0, 0.0]);
        assert_eq!(tree.upper(1, 0), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn ternary_split_picks_longest_axis_ties_to_lowest_index() {
        let (lowers, uppers, axis) = ternary_split_geometry(&[0.0, 0.0, 0.0], &[1.0, 1.0, 1.0]);
        assert_eq!(axis, 0);
        assert_eq!(lowers[0], vec![0.0, 0.0, 0.0]);
        assert_eq!(uppers[0], vec![1.0 / 3.0, 1.0, 1.0]);
        assert_eq!(lowers[1], vec![1.0 / 3.0, 0.0, 0.0]);
        assert_eq!(uppers[1], vec![2.0 / 3.0, 1.0, 1.0]);
        assert_eq!(lowers[2], vec![2.0 / 3.0, 0.0, 0.0]);
        assert_eq!(uppers[2], vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn ternary_split_picks_the_actual_longest_axis() {
        let (_, _, axis) = ternary_split_geometry(&[0.0, 0.0], &[1.0, 4.0]);
        assert_eq!(axis, 1);
    }

    #[test]
    fn middle_child_center_equals_box_center() {
        let (lowers, uppers, _) = ternary_split_geometry(&[0.0, 0.0, 0.0], &[1.0, 1.0, 1.0]);
        let parent_center = box_center(&[0.0, 0.0, 0.0], &[1.0, 1.0, 1.0]);
        let mid_center = box_center(&lowers[1], &uppers[1]);
        assert_eq!(mid_center, parent_center);
    }

    #[test]
    fn split_marks_parent_non_leaf_and_appends_three_leaves() {
        let mut tree = PartitionTree::init(3, 0);
        let (lowers, uppers, _) = ternary_split_geometry(tree.lower(1, 0), tree.upper(1, 0));
        tree.split(1, 0, lowers, uppers, [1, 2, 0]);

        assert!(!tree.leaf(1, 0));
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.width(2), 3);
        assert!(tree.leaf(2, 0));
        assert!(tree.leaf(2, 1));
        assert!(tree.leaf(2, 2));
        assert_eq!(tree.sample(2, 1), 2); // middle child inherits parent's sample
        assert_eq!(tree.split_count(), 1);
    }

    #[test]
    fn child_boxes_are_contained_in_parent_and_tile_one_axis() {
        let mut tree = PartitionTree::init(2, 0);
        let (lowers, uppers, axis) = ternary_split_geometry(tree.lower(1, 0), tree.upper(1, 0));
        tree.split(1, 0, lowers, uppers, [1, 2, 0]);

        for i in 0..3 {
            for d in 0..2 {
                assert!(tree.lower(2, i)[d] >= tree.lower(1, 0)[d] - 1e-12);
                assert!(tree.upper(2, i)[d] <= tree.upper(1, 0)[d] + 1e-12);
                if d != axis {
                    assert_eq!(tree.lower(2, i)[d], tree.lower(1, 0)[d]);
                    assert_eq!(tree.upper(2, i)[d], tree.upper(1, 0)[d]);
                }
            }
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip_preserves_every_level_exactly() {
        let mut tree = PartitionTree::init(3, 0);
        let (lowers, uppers, _) = ternary_split_geometry(tree.lower(1, 0), tree.upper(1, 0));
        tree.split(1, 0, lowers, uppers, [1, 2, 0]);

        let json = serde_json::to_string(&tree).unwrap();
        let restored: PartitionTree = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.depth(), tree.depth());
        assert_eq!(restored.split_count(), tree.split_count());
        for h in 1..=tree.depth() {
            assert_eq!(restored.width(h), tree.width(h));
            for i in 0..tree.width(h) {
                assert_eq!(restored.leaf(h, i), tree.leaf(h, i));
                assert_eq!(restored.sample(h, i), tree.sample(h, i));
                assert_eq!(restored.lower(h, i), tree.lower(h, i));
                assert_eq!(restored.upper(h, i), tree.upper(h, i));
            }
        }
    }
}
