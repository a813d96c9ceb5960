//! Turn-restriction resolution into per-junction forbidden transition pairs

use crate::routing::{way_pos, Routing};
use crate::types::{ResolvedRestriction, Restriction, RestrictionKind, WayPos};
use crate::ways::Ways;

impl Ways {
    /// Folds a batch of resolved restriction records into the per-junction
    /// forbidden-pair lists. An empty batch is a no-op; batches may arrive
    /// repeatedly and append-only (duplicate pairs from a reapplied batch are
    /// tolerated, not deduplicated).
    ///
    /// `No` forbids exactly the from->to transition. `Only` materializes the
    /// complement: every transition out of the from way except the one to the
    /// allowed to way, since the per-junction representation stores only
    /// prohibitions.
    pub fn add_restrictions(&mut self, mut batch: Vec<ResolvedRestriction>) {
        if batch.is_empty() {
            return;
        }
        batch.sort_by_key(|r| r.via);

        let Routing {
            node_ways,
            node_restrictions,
            node_is_restricted,
            ..
        } = &mut self.routing;

        for group in batch.chunk_by(|a, b| a.via == b.via) {
            let via = group[0].via;
            node_is_restricted.set(u64::from(via.0));
            let list = node_restrictions.entry(via).or_default();
            let ways_at_via = node_ways.bucket(via.0 as usize);

            for record in group {
                match record.kind {
                    RestrictionKind::No => {
                        list.push(Restriction {
                            from: way_pos(ways_at_via, record.from),
                            to: way_pos(ways_at_via, record.to),
                        });
                    }
                    RestrictionKind::Only => {
                        for (i, &from) in ways_at_via.iter().enumerate() {
                            for (j, &to) in ways_at_via.iter().enumerate() {
                                if from == record.from && to != record.to {
                                    list.push(Restriction {
                                        from: i as WayPos,
                                        to: j as WayPos,
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::progress::NoopProgress;
    use crate::store::OpenMode;
    use crate::types::{
        NodeIdx, OsmNodeId, OsmWayId, Point, ResolvedRestriction, Restriction, RestrictionKind,
        WayIdx, WayProperties,
    };
    use crate::ways::Ways;
    use tempfile::tempdir;

    /// Three ways meeting at external node 50 (graph node 0).
    fn junction() -> (tempfile::TempDir, Ways) {
        let dir = tempdir().unwrap();
        let mut w = Ways::open(dir.path(), OpenMode::Write).unwrap();
        for (id, other) in [(1u64, 10u64), (2, 20), (3, 30)] {
            w.add_way(
                OsmWayId(id),
                "",
                &[OsmNodeId(other), OsmNodeId(50)],
                &[
                    Point::new(48.0 + other as f64 * 1e-4, 11.0),
                    Point::new(48.0, 11.0),
                ],
                WayProperties::default(),
            )
            .unwrap();
        }
        w.connect_ways(&NoopProgress).unwrap();
        (dir, w)
    }

    #[test]
    fn test_no_restriction_adds_one_pair() {
        let (_dir, mut w) = junction();
        let via = w.get_node_idx(OsmNodeId(50)).unwrap();
        w.add_restrictions(vec![ResolvedRestriction {
            kind: RestrictionKind::No,
            via,
            from: WayIdx(0),
            to: WayIdx(1),
        }]);

        let r = &w.routing;
        let from = r.get_way_pos(via, WayIdx(0));
        let to = r.get_way_pos(via, WayIdx(1));
        assert_eq!(r.node_restrictions(via), &[Restriction { from, to }]);
        assert!(r.is_restricted(via, from, to));
        assert!(!r.is_restricted(via, to, from));
    }

    #[test]
    fn test_only_restriction_materializes_complement() {
        let (_dir, mut w) = junction();
        let via = w.get_node_idx(OsmNodeId(50)).unwrap();
        // Only A (way 0) -> B (way 1) allowed through the junction.
        w.add_restrictions(vec![ResolvedRestriction {
            kind: RestrictionKind::Only,
            via,
            from: WayIdx(0),
            to: WayIdx(1),
        }]);

        let r = &w.routing;
        let a = r.get_way_pos(via, WayIdx(0));
        let b = r.get_way_pos(via, WayIdx(1));
        let c = r.get_way_pos(via, WayIdx(2));
        // A->B stays allowed, everything else out of A is forbidden,
        // including the U-turn back onto A.
        assert!(!r.is_restricted(via, a, b));
        assert!(r.is_restricted(via, a, c));
        assert!(r.is_restricted(via, a, a));
        // Transitions not out of A are untouched by this record.
        assert!(!r.is_restricted(via, b, c));
        assert_eq!(r.node_restrictions(via).len(), 2);
    }

    #[test]
    fn test_reapplied_batch_appends_duplicates() {
        let (_dir, mut w) = junction();
        let via = w.get_node_idx(OsmNodeId(50)).unwrap();
        let batch = vec![ResolvedRestriction {
            kind: RestrictionKind::No,
            via,
            from: WayIdx(0),
            to: WayIdx(1),
        }];
        w.add_restrictions(batch.clone());
        w.add_restrictions(batch);

        let r = &w.routing;
        // Duplicate pairs are tolerated; the semantics are unchanged.
        assert_eq!(r.node_restrictions(via).len(), 2);
        let from = r.get_way_pos(via, WayIdx(0));
        let to = r.get_way_pos(via, WayIdx(1));
        assert!(r.is_restricted(via, from, to));
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let (_dir, mut w) = junction();
        w.add_restrictions(vec![]);
        assert!(w.routing.node_restrictions.is_empty());
    }

    #[test]
    fn test_unnamed_node_is_unrestricted() {
        let (_dir, mut w) = junction();
        let via = w.get_node_idx(OsmNodeId(50)).unwrap();
        w.add_restrictions(vec![ResolvedRestriction {
            kind: RestrictionKind::No,
            via,
            from: WayIdx(0),
            to: WayIdx(1),
        }]);
        // Any node never named by a batch yields an empty list.
        assert!(w.routing.node_restrictions(NodeIdx(7)).is_empty());
        assert!(!w.routing.node_is_restricted.test(7));
    }
}
