//! Cost functions used by the searches
//!
//! A cost function prices traversing the edge an enumerator is positioned on
//! and turning onto it. Three variants are provided:
//!
//! - [`ProfileCostFunction`] evaluates a [`Profile`](crate::profile::Profile)
//!   on the raw edge attributes,
//! - [`CachedCostFunction`] memoizes profile results per edge-type id,
//! - [`AlternativeRouteCostFunction`] penalizes edges already used by an
//!   earlier route.

mod alternative;
mod cached;
mod profile;

pub use alternative::{AlternativeRouteCostFunction, DEFAULT_PENALTY};
pub use cached::{CachedCostFunction, EdgeFactorCache, FactorCache, TurnCostFactorCache};
pub use profile::ProfileCostFunction;

use butterfly_common::EdgeId;

use crate::enumerator::RoutingNetworkEdgeEnumerator;
use crate::profile::{EdgeFactor, TurnCostFactor};
use crate::tile::TurnCostEntry;

/// An edge travelled before the current one, with its turn order at the
/// vertex it shares with the edge after it.
pub type PreviousEdge = (EdgeId, Option<u8>);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Costs {
    pub can_access: bool,
    pub can_stop: bool,
    pub cost: f64,
    pub turn_cost: f64,
}

impl Costs {
    pub const NO_ACCESS: Costs = Costs {
        can_access: false,
        can_stop: false,
        cost: 0.0,
        turn_cost: 0.0,
    };
}

pub trait CostFunction {
    /// Costs of the edge under `enumerator`.
    ///
    /// With `forward` the edge is travelled from `from()` to `to()`,
    /// otherwise from `to()` to `from()` as in a search running backward from
    /// the target. `previous_edges` is the search history, most recent first:
    /// the edge before this one in search order comes first.
    fn get(
        &self,
        enumerator: &RoutingNetworkEdgeEnumerator<'_>,
        forward: bool,
        previous_edges: &[PreviousEdge],
    ) -> Costs;
}

impl<C: CostFunction + ?Sized> CostFunction for &C {
    fn get(
        &self,
        enumerator: &RoutingNetworkEdgeEnumerator<'_>,
        forward: bool,
        previous_edges: &[PreviousEdge],
    ) -> Costs {
        (**self).get(enumerator, forward, previous_edges)
    }
}

/// Prices the edge from a factor expressed in stored orientation.
fn edge_costs(
    enumerator: &RoutingNetworkEdgeEnumerator<'_>,
    forward: bool,
    factor: EdgeFactor,
    turn_cost: f64,
) -> Costs {
    let along = enumerator.forward() == forward;
    let factor = if along { factor } else { factor.reverse() };
    if !factor.can_access(true) {
        return Costs::NO_ACCESS;
    }
    Costs {
        can_access: true,
        can_stop: factor.can_stop,
        cost: factor.forward_factor * enumerator.length(),
        turn_cost,
    }
}

/// Sum of the turn costs between the previous edge and the current one.
///
/// Forward, the turn at `from()` is from the previous edge onto this one and
/// entries with a prefix only apply when the history before the previous edge
/// matches it. Backward, the turn is from this edge onto the previous one;
/// the edges before this one are not known yet, so entries with a prefix are
/// not applied.
fn turn_cost<F>(
    enumerator: &RoutingNetworkEdgeEnumerator<'_>,
    forward: bool,
    previous_edges: &[PreviousEdge],
    mut factor: F,
) -> f64
where
    F: FnMut(&TurnCostEntry) -> TurnCostFactor,
{
    let Some(&(_, Some(order))) = previous_edges.first() else {
        return 0.0;
    };

    if forward {
        let history = &previous_edges[1..];
        enumerator
            .turn_cost_to(order)
            .filter(|entry| prefix_matches(&entry.prefix, history))
            .map(|entry| factor(entry).apply(entry.cost))
            .sum()
    } else {
        enumerator
            .turn_cost_from(order)
            .filter(|entry| entry.prefix.is_empty())
            .map(|entry| factor(entry).apply(entry.cost))
            .sum()
    }
}

/// `prefix` is oldest first, `history` most recent first.
fn prefix_matches(prefix: &[EdgeId], history: &[PreviousEdge]) -> bool {
    prefix.len() <= history.len()
        && prefix
            .iter()
            .rev()
            .zip(history)
            .all(|(expected, (edge, _))| expected == edge)
}
