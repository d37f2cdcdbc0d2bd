//! Candidate pair generation from cached bounds.
//!
//! Both routines return the same set of index pairs `(i, j)` with `i < j`,
//! sorted, so the narrow phase sees pairs in a deterministic order.

use super::bounds::Bounds;

/// Tests every pair. Kept as the reference for the sweep.
pub fn naive_pairs(bounds: &[Bounds]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..bounds.len() {
        if bounds[i].is_empty() {
            continue;
        }
        for j in (i + 1)..bounds.len() {
            if !bounds[j].is_empty() && bounds[i].intersects_bounds(&bounds[j]) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Sort-and-sweep along x. Touching boxes are reported, as in `intersects_bounds`.
pub fn sort_and_sweep_pairs(bounds: &[Bounds]) -> Vec<(usize, usize)> {
    let mut order: Vec<usize> = (0..bounds.len()).filter(|&i| !bounds[i].is_empty()).collect();
    order.sort_by(|&a, &b| {
        bounds[a]
            .mins
            .x
            .total_cmp(&bounds[b].mins.x)
            .then(a.cmp(&b))
    });

    let mut pairs = Vec::new();
    for (k, &i) in order.iter().enumerate() {
        let max_x = bounds[i].maxs.x;
        for &j in &order[k + 1..] {
            if bounds[j].mins.x > max_x {
                break;
            }
            if bounds[i].intersects_bounds(&bounds[j]) {
                pairs.push((i.min(j), i.max(j)));
            }
        }
    }
    pairs.sort_unstable();
    pairs
}
