use butterfly_common::{EdgeId, VertexId};

use super::SearchMode;

/// Settles every vertex once; turn costs are not seen.
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexBased;

impl SearchMode for VertexBased {
    type Key = VertexId;

    const TURN_COSTS: bool = false;

    fn key(_edge: EdgeId, vertex: VertexId) -> VertexId {
        vertex
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::Distance;
    use super::super::VertexDijkstra;
    use crate::config::SearchSettings;
    use crate::network::RoutingNetwork;
    use crate::search::{SnapPoint, MAX_OFFSET};
    use butterfly_common::Location;

    // a - b - c - d - e, source on ab, targets on bc and de
    fn chain() -> (RoutingNetwork, Vec<butterfly_common::EdgeId>) {
        let network = RoutingNetwork::new(14).unwrap();
        let mut mutator = network.mutate();
        let vertices: Vec<_> = (0..5)
            .map(|i| mutator.add_vertex(Location::new(4.340 + 0.001 * i as f64, 50.85)))
            .collect();
        let edges = vertices
            .windows(2)
            .map(|w| mutator.add_edge(w[0], w[1], &[], &[]).unwrap())
            .collect();
        (mutator.commit(), edges)
    }

    #[test]
    fn one_to_many_reports_each_target() {
        let (network, edges) = chain();
        let mut dijkstra = VertexDijkstra::default();
        let source = SnapPoint::new(edges[0], MAX_OFFSET / 2);
        let targets = [
            SnapPoint::new(edges[3], MAX_OFFSET / 2),
            SnapPoint::new(edges[1], MAX_OFFSET / 2),
        ];
        let results = dijkstra.run_many(&network, source, &targets, Distance).unwrap();

        let (far, far_cost) = results[0].as_ref().unwrap();
        let (near, near_cost) = results[1].as_ref().unwrap();
        assert_eq!(far.len(), 4);
        assert_eq!(near.len(), 2);
        assert!(near_cost < far_cost);
        assert_eq!((near.offset1, near.offset2), (MAX_OFFSET / 2, MAX_OFFSET / 2));
    }

    #[test]
    fn settled_hook_excludes_vertices() {
        let (network, edges) = chain();
        let mut enumerator = network.edge_enumerator();
        enumerator.move_to_edge(edges[2], true);
        let blocked = enumerator.from();

        let mut dijkstra = VertexDijkstra::default();
        let source = SnapPoint::new(edges[0], 0);
        let target = SnapPoint::new(edges[3], MAX_OFFSET);
        let result = dijkstra
            .run_with(&network, source, target, Distance, |v| v == blocked, |_| false)
            .unwrap();
        assert!(result.is_none());

        let result = dijkstra
            .run_with(&network, source, target, Distance, |_| false, |e| e.edge_id() == edges[2])
            .unwrap();
        assert!(result.is_none());

        assert!(dijkstra.run(&network, source, target, Distance).unwrap().is_some());
    }

    #[test]
    fn budget_exhaustion_is_no_route() {
        let (network, edges) = chain();
        let settings = SearchSettings {
            max_settled: 2,
            ..SearchSettings::default()
        };
        let mut dijkstra = VertexDijkstra::new(settings);
        let result = dijkstra
            .run(&network, SnapPoint::new(edges[0], 0), SnapPoint::new(edges[3], MAX_OFFSET), Distance)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn budget_drops_candidates_that_are_not_proven() {
        // a - b - c with a short spur at b, target at c
        let network = RoutingNetwork::new(14).unwrap();
        let mut mutator = network.mutate();
        let a = mutator.add_vertex(Location::new(4.340, 50.85));
        let b = mutator.add_vertex(Location::new(4.341, 50.85));
        let c = mutator.add_vertex(Location::new(4.342, 50.85));
        let spur = mutator.add_vertex(Location::new(4.341, 50.8502));
        let ab = mutator.add_edge(a, b, &[], &[]).unwrap();
        let bc = mutator.add_edge(b, c, &[], &[]).unwrap();
        mutator.add_edge(b, spur, &[], &[]).unwrap();
        let network = mutator.commit();

        let source = SnapPoint::new(ab, 0);
        let target = SnapPoint::new(bc, MAX_OFFSET);

        // bc is a candidate once b is settled, the spur is popped before it
        // is proven
        let tight = SearchSettings {
            max_settled: 2,
            ..SearchSettings::default()
        };
        let result = VertexDijkstra::new(tight).run(&network, source, target, Distance).unwrap();
        assert!(result.is_none());

        let enough = SearchSettings {
            max_settled: 3,
            ..SearchSettings::default()
        };
        let (path, _) = VertexDijkstra::new(enough)
            .run(&network, source, target, Distance)
            .unwrap()
            .unwrap();
        assert_eq!(path.len(), 2);
    }
}
