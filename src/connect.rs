//! Graph construction: node deduplication, edges and distances

use tracing::warn;

use crate::error::{Error, Result};
use crate::geo;
use crate::progress::ProgressTracker;
use crate::store::MmPagedVecVec;
use crate::types::{NodeIdx, OsmNodeId, Point, WayIdx};
use crate::ways::Ways;

impl Ways {
    /// Builds the routing graph from the raw way columns.
    ///
    /// Pass 1 assigns dense graph node ids to every multiply-referenced
    /// external node, in ascending external-id order. Pass 2 walks each way's
    /// node/point sequence, reduces it to graph-node references with rounded
    /// inter-node distances and records the node-way adjacency through an
    /// on-disk staging area that is deleted once copied into the routing
    /// graph.
    ///
    /// In-way positions and distances saturate at `u16::MAX`; saturation is a
    /// non-fatal diagnostic naming the external way id, not an error.
    pub fn connect_ways(&mut self, progress: &dyn ProgressTracker) -> Result<()> {
        // Assign graph node ids to every node with more than one way.
        progress.status("Create graph nodes");
        progress.set_total(self.node_way_counter.capacity_bits());

        let mut push_err = None;
        self.node_way_counter.multi().for_each_set_bit(|bit| {
            if push_err.is_some() {
                return;
            }
            if let Err(e) = self.node_to_osm.push(OsmNodeId(bit)) {
                push_err = Some(e);
            }
            progress.update(bit);
        });
        if let Some(e) = push_err {
            return Err(e);
        }
        let n_nodes = self.node_to_osm.len();
        self.routing.node_is_restricted.resize(n_nodes);

        // Build edges.
        progress.status("Connect ways");
        progress.set_total(self.way_osm_idx.len() as u64);

        let mut node_ways_tmp: MmPagedVecVec<WayIdx> = MmPagedVecVec::create(
            self.dir().join("tmp_node_ways_data.bin"),
            self.dir().join("tmp_node_ways_index.bin"),
        )?;
        let mut node_in_way_idx_tmp: MmPagedVecVec<u16> = MmPagedVecVec::create(
            self.dir().join("tmp_node_in_way_idx_data.bin"),
            self.dir().join("tmp_node_in_way_idx_index.bin"),
        )?;
        node_ways_tmp.resize(n_nodes)?;
        node_in_way_idx_tmp.resize(n_nodes)?;

        let r = &mut self.routing;
        let node_to_osm = self.node_to_osm.as_slice();
        let way_osm_idx = self.way_osm_idx.as_slice();

        for w in 0..way_osm_idx.len() {
            let osm_nodes = self.way_osm_nodes.bucket(w);
            let polyline = self.way_polylines.bucket(w);

            let way_idx = WayIdx(r.way_nodes.len() as u32);
            r.way_nodes.add_back();
            r.way_node_dist.add_back();

            let mut pred: Option<Point> = None;
            let mut from: Option<NodeIdx> = None;
            let mut distance = 0.0f64;
            let mut pos: u16 = 0;
            let mut saturated = false;

            for (osm_node, point) in osm_nodes.iter().zip(polyline) {
                if let Some(p) = pred {
                    distance += geo::distance(p, *point);
                }

                if self.node_way_counter.is_multi(osm_node.0) {
                    let to = node_to_osm
                        .binary_search(osm_node)
                        .map(|i| NodeIdx(i as u32))
                        .map_err(|_| {
                            Error::corrupt(format!(
                                "graph node for OSM node {} not found",
                                osm_node.0
                            ))
                        })?;
                    node_ways_tmp.push(to.0 as usize, way_idx)?;
                    node_in_way_idx_tmp.push(to.0 as usize, pos)?;
                    r.way_nodes.push_to_last(to);

                    if from.is_some() {
                        let rounded = distance.round();
                        let dist = if rounded > f64::from(u16::MAX) {
                            saturated = true;
                            u16::MAX
                        } else {
                            rounded as u16
                        };
                        r.way_node_dist.push_to_last(dist);
                    }

                    distance = 0.0;
                    from = Some(to);

                    if pos == u16::MAX {
                        saturated = true;
                    } else {
                        pos += 1;
                    }
                }

                pred = Some(*point);
            }

            if saturated {
                warn!(
                    way = way_osm_idx[w].0,
                    "in-way position or segment distance saturated at 16 bits"
                );
            }
            progress.increment();
        }

        // Copy the staged adjacency into the routing graph, then drop the
        // staging files.
        for n in 0..n_nodes {
            r.node_ways
                .push_bucket(node_ways_tmp.bucket(n).iter().copied());
            r.node_in_way_idx
                .push_bucket(node_in_way_idx_tmp.bucket(n).iter().copied());
        }
        node_ways_tmp.remove_files();
        node_in_way_idx_tmp.remove_files();

        Ok(())
    }
}
