//! Connected-component labeling over way adjacency

use std::collections::VecDeque;

use crate::progress::ProgressTracker;
use crate::routing::Routing;
use crate::types::{ComponentIdx, WayIdx};
use crate::ways::Ways;

impl Ways {
    /// Labels every way with a component id. Two ways share a component iff
    /// they are connected through a path of shared graph nodes.
    ///
    /// Ways are scanned in ascending id order and each unlabeled way seeds a
    /// worklist flood fill, so component id assignment is reproducible.
    pub fn build_components(&mut self, progress: &dyn ProgressTracker) {
        progress.status("Build components");
        progress.set_total(self.routing.n_ways() as u64);

        let Routing {
            way_nodes,
            node_ways,
            way_component,
            ..
        } = &mut self.routing;

        let n_ways = way_nodes.len();
        *way_component = vec![None; n_ways];

        let mut next_component = 0u32;
        let mut queue: VecDeque<WayIdx> = VecDeque::new();
        for w in 0..n_ways {
            if way_component[w].is_some() {
                progress.increment();
                continue;
            }
            let c = ComponentIdx(next_component);
            next_component += 1;
            way_component[w] = Some(c);

            queue.push_back(WayIdx(w as u32));
            while let Some(way) = queue.pop_front() {
                for node in way_nodes.bucket(way.0 as usize) {
                    for &other in node_ways.bucket(node.0 as usize) {
                        let slot = &mut way_component[other.0 as usize];
                        if slot.is_none() {
                            *slot = Some(c);
                            queue.push_back(other);
                        }
                    }
                }
            }
            progress.increment();
        }
    }
}
