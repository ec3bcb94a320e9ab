mod common;

use butterfly_routing::cost::{AlternativeRouteCostFunction, CachedCostFunction, EdgeFactorCache, TurnCostFactorCache};
use butterfly_routing::cost::ProfileCostFunction;
use butterfly_routing::search::{self, MAX_OFFSET};
use butterfly_routing::{
    CarProfile, EdgeBasedDijkstra, Location, RouterDb, RoutingConfig, SnapPoint, VertexDijkstra,
};

use common::{grid, tags, try_init};

#[test]
fn snap_then_route_across_the_grid() {
    try_init();
    let db = RouterDb::new(RoutingConfig::default()).unwrap();
    let mut mutator = db.mutate().unwrap();
    let grid = grid(&mut mutator, Location::new(4.340, 50.850));
    let network = mutator.commit();

    let cost = ProfileCostFunction::new(&CarProfile);
    let source = search::snap(
        &network,
        &Location::new(4.3405, 50.85002),
        &db.config().snap,
        search::acceptable(&cost),
    )
    .unwrap()
    .unwrap();
    let target = search::snap(
        &network,
        &Location::new(4.3415, 50.85102),
        &db.config().snap,
        search::acceptable(&cost),
    )
    .unwrap()
    .unwrap();
    assert_eq!(source.edge, grid.horizontal[0]);
    assert_eq!(target.edge, grid.horizontal[3]);

    let mut dijkstra = VertexDijkstra::new(db.config().search);
    let (path, seconds) = dijkstra.run(&network, source, target, &cost).unwrap().unwrap();
    assert_eq!(path.len(), 3);
    assert_eq!(path.first(), Some((grid.horizontal[0], true)));
    assert_eq!(path.last(), Some((grid.horizontal[3], true)));

    // one block at 30 km/h is about 70 m, the route is about two blocks
    let meters = path.length(&network).unwrap();
    assert!(meters > 150.0 && meters < 220.0, "length {meters}");
    assert!((seconds - meters * 3.6 / 30.0).abs() < 1.0);
}

#[test]
fn cached_and_direct_costs_agree() {
    try_init();
    let db = RouterDb::new(RoutingConfig::default()).unwrap();
    let mut mutator = db.mutate().unwrap();
    let grid = grid(&mut mutator, Location::new(4.340, 50.850));
    let network = mutator.commit();

    let source = SnapPoint::new(grid.horizontal[0], 1000);
    let target = SnapPoint::new(grid.horizontal[3], 60000);

    let direct = ProfileCostFunction::new(&CarProfile);
    let edge_factors = EdgeFactorCache::from_settings(&db.config().cache);
    let turn_cost_factors = TurnCostFactorCache::from_settings(&db.config().cache);
    let cached = CachedCostFunction::new(&CarProfile, &edge_factors, &turn_cost_factors);

    let mut dijkstra = EdgeBasedDijkstra::default();
    let (direct_path, direct_cost) = dijkstra.run(&network, source, target, &direct).unwrap().unwrap();
    let (cached_path, cached_cost) = dijkstra.run(&network, source, target, &cached).unwrap().unwrap();
    assert_eq!(direct_path, cached_path);
    assert!((direct_cost - cached_cost).abs() < 1e-9);
    assert_eq!(edge_factors.len(), 1);
}

#[test]
fn alternative_route_avoids_the_first_one() {
    try_init();
    let db = RouterDb::new(RoutingConfig::default()).unwrap();
    let mut mutator = db.mutate().unwrap();
    let grid = grid(&mut mutator, Location::new(4.340, 50.850));
    let network = mutator.commit();

    // from the bottom-left corner to the top-right corner: two equivalent
    // staircase routes, the penalty must push the search onto another one
    let source = SnapPoint::new(grid.vertical[0], 0);
    let target = SnapPoint::new(grid.vertical[2], MAX_OFFSET);
    let cost = ProfileCostFunction::new(&CarProfile);

    let mut dijkstra = VertexDijkstra::default();
    let (first, _) = dijkstra.run(&network, source, target, &cost).unwrap().unwrap();
    let used: Vec<_> = first.iter().map(|(edge, _, _, _)| edge).collect();

    let alternative = AlternativeRouteCostFunction::new(&cost, used.iter().copied());
    let (second, _) = dijkstra.run(&network, source, target, &alternative).unwrap().unwrap();
    let second_edges: Vec<_> = second.iter().map(|(edge, _, _, _)| edge).collect();
    assert_ne!(used, second_edges);
}

#[test]
fn restriction_only_binds_the_edge_based_search() {
    try_init();
    let db = RouterDb::new(RoutingConfig::default()).unwrap();
    let mut mutator = db.mutate().unwrap();
    let grid = grid(&mut mutator, Location::new(4.340, 50.850));
    // no left turn from the first bottom block onto the middle vertical
    let middle = grid.vertices[1];
    mutator
        .add_turn_costs(
            middle,
            &tags(&[("type", "restriction"), ("restriction", "no_left_turn")]),
            &[grid.horizontal[0], grid.vertical[1]],
            &[0, 1, 0, 0],
            &[],
        )
        .unwrap();
    let network = mutator.commit();

    let source = SnapPoint::new(grid.horizontal[0], MAX_OFFSET / 2);
    let target = SnapPoint::new(grid.vertical[1], MAX_OFFSET / 2);
    let cost = ProfileCostFunction::new(&CarProfile);

    let (plain, plain_cost) = VertexDijkstra::default()
        .run(&network, source, target, &cost)
        .unwrap()
        .unwrap();
    assert_eq!(plain.len(), 2);

    let (restricted, restricted_cost) = EdgeBasedDijkstra::default()
        .run(&network, source, target, &cost)
        .unwrap()
        .unwrap();
    assert!(restricted.len() > 2);
    assert!(restricted_cost > plain_cost);
    assert_eq!(restricted.last(), Some((grid.vertical[1], false)));
}

#[test]
fn prefixed_restriction_only_binds_the_matching_approach() {
    try_init();
    // no right turn at the top-middle vertex from the middle vertical onto
    // the top-right block, but only when the vertical was entered from the
    // bottom block given by `prefix`
    let build = |prefix: usize| {
        let db = RouterDb::new(RoutingConfig::default()).unwrap();
        let mut mutator = db.mutate().unwrap();
        let grid = grid(&mut mutator, Location::new(4.340, 50.850));
        mutator
            .add_turn_costs(
                grid.vertices[4],
                &tags(&[("type", "restriction"), ("restriction", "no_right_turn")]),
                &[grid.vertical[1], grid.horizontal[3]],
                &[0, 1, 0, 0],
                &[grid.horizontal[prefix]],
            )
            .unwrap();
        (mutator.commit(), grid)
    };
    let cost = ProfileCostFunction::new(&CarProfile);

    let (network, grid) = build(0);
    let source = SnapPoint::new(grid.horizontal[0], MAX_OFFSET / 2);
    let target = SnapPoint::new(grid.horizontal[3], MAX_OFFSET / 2);
    let (plain, plain_cost) = VertexDijkstra::default()
        .run(&network, source, target, &cost)
        .unwrap()
        .unwrap();
    assert_eq!(plain.len(), 3);
    assert_eq!(plain.last(), Some((grid.horizontal[3], true)));

    // approaching through the prefix: detour over one of the outer verticals
    let (detour, detour_cost) = EdgeBasedDijkstra::default()
        .run(&network, source, target, &cost)
        .unwrap()
        .unwrap();
    let edges: Vec<_> = detour.iter().map(|(edge, _, _, _)| edge).collect();
    assert_eq!(edges.len(), 4);
    assert_eq!(edges[0], grid.horizontal[0]);
    assert_eq!(edges[3], grid.horizontal[3]);
    assert!(!edges.contains(&grid.vertical[1]));
    assert!(detour_cost > plain_cost);

    // same turn, but the table asks for another approach: no detour
    let (network, grid) = build(1);
    let (direct, direct_cost) = EdgeBasedDijkstra::default()
        .run(&network, source, target, &cost)
        .unwrap()
        .unwrap();
    let edges: Vec<_> = direct.iter().map(|(edge, _, _, _)| edge).collect();
    assert_eq!(edges, vec![grid.horizontal[0], grid.vertical[1], grid.horizontal[3]]);
    assert!((direct_cost - plain_cost).abs() < 1e-6);
}
