//! Big-street propagation: flag ways near the arterial network

use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::progress::ProgressTracker;
use crate::routing::Routing;
use crate::types::WayIdx;
use crate::ways::Ways;

impl Ways {
    /// Flags every way within two way-adjacency hops of an originally-tagged
    /// big street. Runs data-parallel per way: the original flags are
    /// snapshotted up front, every task reads only that snapshot and the
    /// read-only adjacency, and each result lands in its own disjoint slot.
    pub fn compute_big_street_neighbors(&mut self, progress: &dyn ProgressTracker) {
        progress.status("Big street neighbors");
        progress.set_total(self.routing.n_ways() as u64);

        let is_orig: Vec<bool> = self
            .routing
            .way_properties
            .iter()
            .map(|p| p.is_big_street)
            .collect();
        let routing = &self.routing;

        let flagged: Vec<bool> = (0..is_orig.len())
            .into_par_iter()
            .map(|w| {
                if is_orig[w] {
                    progress.update(w as u64);
                    return false;
                }
                let hit = near_big_street(routing, &is_orig, WayIdx(w as u32));
                progress.update(w as u64);
                hit
            })
            .collect();

        for (w, hit) in flagged.into_iter().enumerate() {
            if hit {
                self.routing.way_properties[w].is_big_street = true;
            }
        }
    }
}

/// Two-hop bounded expansion from `way`: direct neighbors through shared
/// graph nodes, then their neighbors, no further.
fn near_big_street(r: &Routing, is_orig: &[bool], way: WayIdx) -> bool {
    let mut visited = FxHashSet::default();
    visited.insert(way);

    for node in r.way_nodes.bucket(way.0 as usize) {
        for &neighbor in r.node_ways.bucket(node.0 as usize) {
            if is_orig[neighbor.0 as usize] {
                return true;
            }
            if visited.insert(neighbor) {
                for node2 in r.way_nodes.bucket(neighbor.0 as usize) {
                    for &second in r.node_ways.bucket(node2.0 as usize) {
                        if is_orig[second.0 as usize] {
                            return true;
                        }
                        visited.insert(second);
                    }
                }
            }
        }
    }
    false
}
