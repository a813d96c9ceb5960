//! End-to-end build scenarios: write, build, sync, reopen

use tempfile::tempdir;
use waygraph::{
    ComponentIdx, NoopProgress, OpenMode, OsmNodeId, OsmWayId, Point, ResolvedRestriction,
    Restriction, RestrictionKind, WayIdx, WayProperties, Ways,
};

fn pt(n: u64) -> Point {
    Point::new(48.0 + n as f64 * 1e-4, 11.5)
}

fn add_way(w: &mut Ways, id: u64, nodes: &[u64], big: bool) -> WayIdx {
    let osm_nodes: Vec<OsmNodeId> = nodes.iter().map(|&n| OsmNodeId(n)).collect();
    let polyline: Vec<Point> = nodes.iter().map(|&n| pt(n)).collect();
    w.add_way(
        OsmWayId(id),
        "",
        &osm_nodes,
        &polyline,
        WayProperties { is_big_street: big },
    )
    .unwrap()
}

#[test]
fn full_build_and_reopen() {
    let dir = tempdir().unwrap();

    // W1 (big) shares node 100 with W2; W2 shares node 200 with W3.
    // A separate island: W4 and W5 share node 300.
    {
        let mut w = Ways::open(dir.path(), OpenMode::Write).unwrap();
        add_way(&mut w, 1, &[10, 100], true);
        add_way(&mut w, 2, &[100, 11, 200], false);
        add_way(&mut w, 3, &[200, 12], false);
        add_way(&mut w, 4, &[20, 300], false);
        add_way(&mut w, 5, &[300, 21], false);

        w.connect_ways(&NoopProgress).unwrap();
        w.build_components(&NoopProgress);

        let via = w.get_node_idx(OsmNodeId(100)).unwrap();
        w.add_restrictions(vec![ResolvedRestriction {
            kind: RestrictionKind::No,
            via,
            from: WayIdx(0),
            to: WayIdx(1),
        }]);

        w.compute_big_street_neighbors(&NoopProgress);

        w.sync().unwrap();
        w.write_routing().unwrap();
    }

    // Reopen read-only: the mapping is the data, nothing is rebuilt.
    let w = Ways::open(dir.path(), OpenMode::Read).unwrap();
    let r = &w.routing;

    assert_eq!(w.n_ways(), 5);
    // Shared nodes 100, 200, 300 become graph nodes, in ascending order.
    assert_eq!(w.n_nodes(), 3);
    assert_eq!(
        w.node_to_osm.as_slice(),
        &[OsmNodeId(100), OsmNodeId(200), OsmNodeId(300)]
    );

    // Distances: one entry fewer than graph nodes per way.
    for way in 0..r.n_ways() {
        let nodes = r.way_nodes.bucket(way).len();
        assert_eq!(
            r.way_node_dist.bucket(way).len(),
            nodes.saturating_sub(1),
            "way {way}"
        );
    }
    // W2 runs 100 -> (11) -> 200: two graph nodes, one accumulated distance.
    assert_eq!(r.way_nodes.bucket(1).len(), 2);
    assert!(r.way_node_dist.bucket(1)[0] > 0);

    // Components: {W1, W2, W3} and {W4, W5}.
    assert_eq!(r.way_component(WayIdx(0)), Some(ComponentIdx(0)));
    assert_eq!(r.way_component(WayIdx(1)), Some(ComponentIdx(0)));
    assert_eq!(r.way_component(WayIdx(2)), Some(ComponentIdx(0)));
    assert_eq!(r.way_component(WayIdx(3)), Some(ComponentIdx(1)));
    assert_eq!(r.way_component(WayIdx(4)), Some(ComponentIdx(1)));

    // The restriction survived the round trip.
    let via = w.get_node_idx(OsmNodeId(100)).unwrap();
    let from = r.get_way_pos(via, WayIdx(0));
    let to = r.get_way_pos(via, WayIdx(1));
    assert_eq!(r.node_restrictions(via), &[Restriction { from, to }]);
    assert!(r.is_restricted(via, from, to));

    // Big streets: W1 tagged, W2 one hop, W3 two hops; the island stays off.
    let flags: Vec<bool> = r.way_properties.iter().map(|p| p.is_big_street).collect();
    assert_eq!(flags, vec![true, true, true, false, false]);

    // Staging files are build-internal and must be gone.
    assert!(!dir.path().join("tmp_node_ways_data.bin").exists());
    assert!(!dir.path().join("tmp_node_in_way_idx_data.bin").exists());
}

#[test]
fn conditional_access_survives_reopen() {
    let dir = tempdir().unwrap();
    {
        let mut w = Ways::open(dir.path(), OpenMode::Write).unwrap();
        add_way(&mut w, 7, &[1, 2], false);
        add_way(&mut w, 8, &[2, 3], false);
        let s = w.add_string("no @ (Oct-May)").unwrap();
        w.set_conditional_access_no(WayIdx(1), s).unwrap();
        w.connect_ways(&NoopProgress).unwrap();
        w.build_components(&NoopProgress);
        w.sync().unwrap();
        w.write_routing().unwrap();
    }

    let w = Ways::open(dir.path(), OpenMode::Read).unwrap();
    assert_eq!(w.get_access_restriction(WayIdx(0)).unwrap(), None);
    assert_eq!(
        w.get_access_restriction(WayIdx(1)).unwrap(),
        Some("no @ (Oct-May)")
    );
}

#[test]
fn corrupted_blob_fails_to_open() {
    let dir = tempdir().unwrap();
    {
        let mut w = Ways::open(dir.path(), OpenMode::Write).unwrap();
        add_way(&mut w, 1, &[1, 2], false);
        add_way(&mut w, 2, &[2, 3], false);
        w.connect_ways(&NoopProgress).unwrap();
        w.sync().unwrap();
        w.write_routing().unwrap();
    }

    let blob = dir.path().join("routing.bin");
    let mut bytes = std::fs::read(&blob).unwrap();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0x55;
    std::fs::write(&blob, &bytes).unwrap();

    assert!(Ways::open(dir.path(), OpenMode::Read).is_err());
}

#[test]
fn only_restriction_end_to_end() {
    let dir = tempdir().unwrap();
    let mut w = Ways::open(dir.path(), OpenMode::Write).unwrap();
    // Four-way junction at node 50.
    add_way(&mut w, 1, &[10, 50], false);
    add_way(&mut w, 2, &[20, 50], false);
    add_way(&mut w, 3, &[30, 50], false);
    add_way(&mut w, 4, &[40, 50], false);
    w.connect_ways(&NoopProgress).unwrap();

    let via = w.get_node_idx(OsmNodeId(50)).unwrap();
    w.add_restrictions(vec![ResolvedRestriction {
        kind: RestrictionKind::Only,
        via,
        from: WayIdx(0),
        to: WayIdx(2),
    }]);

    let r = &w.routing;
    let a = r.get_way_pos(via, WayIdx(0));
    for other in 0..4u32 {
        let slot = r.get_way_pos(via, WayIdx(other));
        if other == 2 {
            assert!(!r.is_restricted(via, a, slot), "allowed turn forbidden");
        } else {
            assert!(r.is_restricted(via, a, slot), "turn onto way {other}");
        }
    }
    // Three forbidden pairs: everything out of way 0 except onto way 2.
    assert_eq!(r.node_restrictions(via).len(), 3);
}
