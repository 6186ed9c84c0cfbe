//! Broad Phase
//!
//! Coarse candidate search over per-instance bounds. Returns index pairs
//! `(i, j)` with `i < j`, sorted, so the narrow phase visits pairs in the
//! same order for the same input.

use crate::geometry::Aabb;

/// Candidate pair search.
pub trait BroadPhase {
    /// All pairs whose bounds overlap.
    fn pairs(&self, bounds: &[Aabb]) -> Vec<(usize, usize)>;
}

/// Sort-and-sweep along X.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepAndPrune;

impl BroadPhase for SweepAndPrune {
    fn pairs(&self, bounds: &[Aabb]) -> Vec<(usize, usize)> {
        let mut order: Vec<usize> = (0..bounds.len()).collect();
        order.sort_by(|&a, &b| {
            bounds[a]
                .min
                .x
                .total_cmp(&bounds[b].min.x)
                .then(a.cmp(&b))
        });

        let mut active: Vec<usize> = Vec::new();
        let mut out = Vec::new();
        for &i in &order {
            let current = &bounds[i];
            active.retain(|&j| bounds[j].max.x >= current.min.x);
            for &j in &active {
                if bounds[j].intersects(current) {
                    out.push((i.min(j), i.max(j)));
                }
            }
            active.push(i);
        }
        out.sort_unstable();
        out
    }
}

/// Every pair tested. Reference for small sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForce;

impl BroadPhase for BruteForce {
    fn pairs(&self, bounds: &[Aabb]) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for i in 0..bounds.len() {
            for j in (i + 1)..bounds.len() {
                if bounds[i].intersects(&bounds[j]) {
                    out.push((i, j));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use proptest::prelude::*;

    fn boxed(x: f64, y: f64) -> Aabb {
        Aabb::from_center(DVec3::new(x, y, 0.0), DVec3::splat(0.5))
    }

    #[test]
    fn test_sweep_finds_overlaps() {
        let bounds = vec![boxed(0.0, 0.0), boxed(0.8, 0.0), boxed(5.0, 0.0), boxed(0.5, 3.0)];
        assert_eq!(SweepAndPrune.pairs(&bounds), vec![(0, 1)]);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(SweepAndPrune.pairs(&[]).is_empty());
        assert!(SweepAndPrune.pairs(&[boxed(0.0, 0.0)]).is_empty());
    }

    proptest! {
        #[test]
        fn prop_sweep_matches_brute_force(
            centers in proptest::collection::vec((-10.0f64..10.0, -10.0f64..10.0), 0..40)
        ) {
            let bounds: Vec<Aabb> = centers.iter().map(|&(x, y)| boxed(x, y)).collect();
            prop_assert_eq!(SweepAndPrune.pairs(&bounds), BruteForce.pairs(&bounds));
        }
    }
}
