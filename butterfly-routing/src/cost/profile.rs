use super::{edge_costs, turn_cost, CostFunction, Costs, PreviousEdge};
use crate::enumerator::RoutingNetworkEdgeEnumerator;
use crate::profile::Profile;

/// Evaluates the profile on every call.
#[derive(Debug, Clone, Copy)]
pub struct ProfileCostFunction<'a, P: ?Sized> {
    profile: &'a P,
}

impl<'a, P: Profile + ?Sized> ProfileCostFunction<'a, P> {
    pub fn new(profile: &'a P) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &'a P {
        self.profile
    }
}

impl<P: Profile + ?Sized> CostFunction for ProfileCostFunction<'_, P> {
    fn get(
        &self,
        enumerator: &RoutingNetworkEdgeEnumerator<'_>,
        forward: bool,
        previous_edges: &[PreviousEdge],
    ) -> Costs {
        let factor = self.profile.factor(enumerator.attributes());
        let turn_cost = turn_cost(enumerator, forward, previous_edges, |entry| {
            self.profile
                .turn_cost_factor(enumerator.turn_cost_attributes(entry))
        });
        edge_costs(enumerator, forward, factor, turn_cost)
    }
}
