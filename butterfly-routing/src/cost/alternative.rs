use butterfly_common::EdgeId;
use rustc_hash::FxHashSet;

use super::{CostFunction, Costs, PreviousEdge};
use crate::enumerator::RoutingNetworkEdgeEnumerator;

/// Multiplier applied to edges of an earlier route.
pub const DEFAULT_PENALTY: f64 = 2.0;

/// Wraps a cost function and penalizes edges already used, to steer a new
/// search toward an alternative route. Turn costs are left as is.
#[derive(Debug, Clone)]
pub struct AlternativeRouteCostFunction<C> {
    inner: C,
    used: FxHashSet<EdgeId>,
    penalty: f64,
}

impl<C: CostFunction> AlternativeRouteCostFunction<C> {
    pub fn new<I>(inner: C, used: I) -> Self
    where
        I: IntoIterator<Item = EdgeId>,
    {
        Self::with_penalty(inner, used, DEFAULT_PENALTY)
    }

    pub fn with_penalty<I>(inner: C, used: I, penalty: f64) -> Self
    where
        I: IntoIterator<Item = EdgeId>,
    {
        Self {
            inner,
            used: used.into_iter().collect(),
            penalty,
        }
    }

    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    pub fn is_used(&self, edge: EdgeId) -> bool {
        self.used.contains(&edge)
    }
}

impl<C: CostFunction> CostFunction for AlternativeRouteCostFunction<C> {
    fn get(
        &self,
        enumerator: &RoutingNetworkEdgeEnumerator<'_>,
        forward: bool,
        previous_edges: &[PreviousEdge],
    ) -> Costs {
        let mut costs = self.inner.get(enumerator, forward, previous_edges);
        if costs.can_access && self.used.contains(&enumerator.edge_id()) {
            costs.cost *= self.penalty;
        }
        costs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::RoutingNetwork;
    use butterfly_common::Location;

    struct UnitCost;

    impl CostFunction for UnitCost {
        fn get(&self, _: &RoutingNetworkEdgeEnumerator<'_>, _: bool, _: &[PreviousEdge]) -> Costs {
            Costs {
                can_access: true,
                can_stop: true,
                cost: 1.0,
                turn_cost: 0.5,
            }
        }
    }

    #[test]
    fn used_edges_cost_more() {
        let network = RoutingNetwork::new(14).unwrap();
        let mut mutator = network.mutate();
        let a = mutator.add_vertex(Location::new(4.34, 50.85));
        let b = mutator.add_vertex(Location::new(4.341, 50.85));
        let c = mutator.add_vertex(Location::new(4.342, 50.85));
        let ab = mutator.add_edge(a, b, &[], &[]).unwrap();
        let bc = mutator.add_edge(b, c, &[], &[]).unwrap();
        let network = mutator.commit();

        let cost = AlternativeRouteCostFunction::new(UnitCost, [ab]);
        assert!(cost.is_used(ab));
        let mut enumerator = network.edge_enumerator();

        enumerator.move_to_edge(ab, true);
        let used = cost.get(&enumerator, true, &[]);
        assert_eq!(used.cost, 2.0);
        assert_eq!(used.turn_cost, 0.5);

        enumerator.move_to_edge(bc, false);
        assert_eq!(cost.get(&enumerator, false, &[]).cost, 1.0);

        let steep = AlternativeRouteCostFunction::with_penalty(UnitCost, [bc], 5.0);
        assert_eq!(steep.get(&enumerator, true, &[]).cost, 5.0);
    }
}
