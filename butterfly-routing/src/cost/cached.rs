use parking_lot::RwLock;

use super::{edge_costs, turn_cost, CostFunction, Costs, PreviousEdge};
use crate::config::CacheSettings;
use crate::enumerator::RoutingNetworkEdgeEnumerator;
use crate::profile::{EdgeFactor, Profile, TurnCostFactor};

/// Fixed-capacity memo of profile results by type id.
///
/// Type ids are small dense integers and are never renumbered, so a slot
/// stays valid for the lifetime of the network. Ids beyond the capacity are
/// not cached. One cache serves one profile.
#[derive(Debug)]
pub struct FactorCache<T> {
    slots: RwLock<Vec<Option<T>>>,
}

pub type EdgeFactorCache = FactorCache<EdgeFactor>;
pub type TurnCostFactorCache = FactorCache<TurnCostFactor>;

impl<T: Copy> FactorCache<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: RwLock::new(vec![None; capacity]),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.read().len()
    }

    pub fn get(&self, type_id: u32) -> Option<T> {
        self.slots.read().get(type_id as usize).copied().flatten()
    }

    pub fn get_or_insert_with<F: FnOnce() -> T>(&self, type_id: u32, compute: F) -> T {
        if let Some(value) = self.get(type_id) {
            return value;
        }
        let value = compute();
        if let Some(slot) = self.slots.write().get_mut(type_id as usize) {
            *slot = Some(value);
        }
        value
    }

    /// Number of filled slots.
    pub fn len(&self) -> usize {
        self.slots.read().iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.slots.write().iter_mut().for_each(|slot| *slot = None);
    }
}

impl EdgeFactorCache {
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.edge_factor_capacity)
    }
}

impl TurnCostFactorCache {
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.turn_cost_factor_capacity)
    }
}

/// Profile costs memoized per edge-type and turn-cost-type id.
///
/// Edge factors are cached in stored orientation and reversed for the other
/// direction. Edges whose tile has no current type id fall back to the raw
/// attributes, uncached.
pub struct CachedCostFunction<'a, P: ?Sized> {
    profile: &'a P,
    edge_factors: &'a EdgeFactorCache,
    turn_cost_factors: &'a TurnCostFactorCache,
}

impl<'a, P: Profile + ?Sized> CachedCostFunction<'a, P> {
    pub fn new(
        profile: &'a P,
        edge_factors: &'a EdgeFactorCache,
        turn_cost_factors: &'a TurnCostFactorCache,
    ) -> Self {
        Self {
            profile,
            edge_factors,
            turn_cost_factors,
        }
    }

    fn edge_factor(&self, enumerator: &RoutingNetworkEdgeEnumerator<'_>) -> EdgeFactor {
        let index = enumerator.network().edge_type_index();
        match enumerator.edge_type_id() {
            Some(type_id) => self.edge_factors.get_or_insert_with(type_id, || {
                self.profile
                    .factor(index.get_by_id(type_id).unwrap_or(&[]))
            }),
            None => self.profile.factor(enumerator.attributes()),
        }
    }
}

impl<P: Profile + ?Sized> CostFunction for CachedCostFunction<'_, P> {
    fn get(
        &self,
        enumerator: &RoutingNetworkEdgeEnumerator<'_>,
        forward: bool,
        previous_edges: &[PreviousEdge],
    ) -> Costs {
        let factor = self.edge_factor(enumerator);
        let index = enumerator.network().turn_cost_type_index();
        let turn_cost = turn_cost(enumerator, forward, previous_edges, |entry| {
            match enumerator.turn_cost_type_id(entry) {
                Some(type_id) => self.turn_cost_factors.get_or_insert_with(type_id, || {
                    self.profile
                        .turn_cost_factor(index.get_by_id(type_id).unwrap_or(&[]))
                }),
                None => self
                    .profile
                    .turn_cost_factor(enumerator.turn_cost_attributes(entry)),
            }
        });
        edge_costs(enumerator, forward, factor, turn_cost)
    }
}
