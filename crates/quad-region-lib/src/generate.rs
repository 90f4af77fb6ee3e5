//! Random tree growth
//!
//! Grows an index by repeatedly splitting a randomly chosen leaf until the
//! node table reaches a target size. Useful for building large fixtures and
//! benchmark trees that look like the result of many interactive subdivisions.

use crate::{QuadPath, SpatialIndex};
use rand::Rng;

/// Subdivide random leaves of `index` until it holds at least `target_nodes` entries
///
/// Leaves at `max_depth` or deeper are never split, so growth stops early if
/// every remaining leaf is that deep. Returns the number of subdivisions made.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn grow_random<R: Rng + ?Sized>(
    index: &mut SpatialIndex,
    target_nodes: usize,
    max_depth: u8,
    rng: &mut R,
) -> usize {
    let mut candidates: Vec<QuadPath> = index
        .iter()
        .filter(|(path, node)| node.is_leaf() && path.depth() < max_depth)
        .map(|(path, _)| *path)
        .collect();
    // Table iteration order varies between runs; sort so a seeded rng is reproducible
    candidates.sort_unstable();
    let mut subdivisions = 0;

    while index.len() < target_nodes && !candidates.is_empty() {
        let picked = candidates.swap_remove(rng.random_range(0..candidates.len()));
        if !index.subdivide(&picked) {
            continue;
        }
        subdivisions += 1;

        if let Some(children) = picked.children() {
            candidates.extend(children.into_iter().filter(|c| c.depth() < max_depth));
        }
    }

    tracing::debug!(
        subdivisions,
        nodes = index.len(),
        target_nodes,
        "grew random tree"
    );
    subdivisions
}
