//! Dijkstra searches between snap points
//!
//! One search engine, two state models:
//!
//! - [`VertexDijkstra`] settles each vertex once and ignores turn costs,
//! - [`EdgeBasedDijkstra`] settles (arriving edge, vertex) pairs and hands the
//!   cost function the edge history, so turn costs and restrictions apply.
//!
//! An engine keeps its queue, visit tree and settled set between runs. Keep
//! one per worker thread and reuse it; every run starts by clearing it.

mod edge;
pub mod heap;
mod vertex;

pub use edge::EdgeBased;
pub use heap::BinaryHeap;
pub use vertex::VertexBased;

use butterfly_common::{EdgeId, Error, Result, VertexId};
use rustc_hash::FxHashSet;
use std::hash::Hash;
use std::marker::PhantomData;

use crate::config::SearchSettings;
use crate::cost::{CostFunction, PreviousEdge};
use crate::enumerator::RoutingNetworkEdgeEnumerator;
use crate::network::RoutingNetwork;
use crate::path::Path;
use crate::search::{SnapPoint, MAX_OFFSET};

pub type VertexDijkstra = Dijkstra<VertexBased>;
pub type EdgeBasedDijkstra = Dijkstra<EdgeBased>;

/// State model of a search.
pub trait SearchMode {
    /// Identity of a settled state.
    type Key: Copy + Eq + Hash;

    /// Whether the cost function sees the arriving edges.
    const TURN_COSTS: bool;

    fn key(edge: EdgeId, vertex: VertexId) -> Self::Key;
}

const NO_VISIT: u32 = u32::MAX;

/// Node of the visit tree: `vertex` reached over `edge`.
#[derive(Debug, Clone, Copy)]
struct Visit {
    vertex: VertexId,
    edge: EdgeId,
    forward: bool,
    /// Turn order of `edge` at `vertex`.
    order: Option<u8>,
    previous: u32,
}

/// Best way found so far to reach one target.
#[derive(Debug, Clone, Copy)]
struct Finish {
    cost: f64,
    /// Visit the target edge is entered from, `NO_VISIT` when source and
    /// target share the edge.
    visit: u32,
    forward: bool,
}

pub struct Dijkstra<M: SearchMode> {
    settings: SearchSettings,
    heap: BinaryHeap<u32>,
    tree: Vec<Visit>,
    settled: FxHashSet<M::Key>,
    history: Vec<PreviousEdge>,
    _mode: PhantomData<M>,
}

impl<M: SearchMode> Default for Dijkstra<M> {
    fn default() -> Self {
        Self::new(SearchSettings::default())
    }
}

impl<M: SearchMode> Dijkstra<M> {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            settings,
            heap: BinaryHeap::new(),
            tree: Vec::new(),
            settled: FxHashSet::default(),
            history: Vec::new(),
            _mode: PhantomData,
        }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// States settled by the last run.
    pub fn settled_count(&self) -> usize {
        self.settled.len()
    }

    /// Drops the scratch state of the last run, keeping allocations.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.tree.clear();
        self.settled.clear();
        self.history.clear();
    }

    /// Best path from `source` to `target` with its cost.
    ///
    /// `Ok(None)` when the target is unreachable or the search budget ran
    /// out. When both points are on the same edge and the target is ahead in
    /// an accessible direction, that stretch is returned without searching.
    pub fn run<C: CostFunction>(
        &mut self,
        network: &RoutingNetwork,
        source: SnapPoint,
        target: SnapPoint,
        cost: C,
    ) -> Result<Option<(Path, f64)>> {
        self.run_with(network, source, target, cost, |_| false, |_| false)
    }

    /// [`run`](Self::run) with hooks, see [`run_many_with`](Self::run_many_with).
    pub fn run_with<C, S, Q>(
        &mut self,
        network: &RoutingNetwork,
        source: SnapPoint,
        target: SnapPoint,
        cost: C,
        settled: S,
        queued: Q,
    ) -> Result<Option<(Path, f64)>>
    where
        C: CostFunction,
        S: FnMut(VertexId) -> bool,
        Q: FnMut(&RoutingNetworkEdgeEnumerator<'_>) -> bool,
    {
        self.clear();
        if let Some(finish) = direct(network, source, target, &cost)? {
            tracing::trace!(edge = %source.edge, cost = finish.cost, "source and target share an edge");
            let path = self.path(network, source, target, finish)?;
            return Ok(Some((path, finish.cost)));
        }

        let mut results = self.run_many_with(network, source, &[target], cost, settled, queued)?;
        Ok(results.pop().flatten())
    }

    /// Best paths from `source` to each target, in target order.
    ///
    /// When the search budget runs out, targets whose best candidate is not
    /// proven optimal yet come back as `None`.
    pub fn run_many<C: CostFunction>(
        &mut self,
        network: &RoutingNetwork,
        source: SnapPoint,
        targets: &[SnapPoint],
        cost: C,
    ) -> Result<Vec<Option<(Path, f64)>>> {
        self.run_many_with(network, source, targets, cost, |_| false, |_| false)
    }

    /// One-to-many search with hooks.
    ///
    /// `settled` is called with each vertex as it is settled; returning true
    /// excludes it, nothing is finished or expanded from there. `queued` is
    /// called with the enumerator on each candidate edge; returning true
    /// keeps the candidate out of the queue. A cancelled search can simply
    /// answer true to both.
    pub fn run_many_with<C, S, Q>(
        &mut self,
        network: &RoutingNetwork,
        source: SnapPoint,
        targets: &[SnapPoint],
        cost: C,
        mut settled: S,
        mut queued: Q,
    ) -> Result<Vec<Option<(Path, f64)>>>
    where
        C: CostFunction,
        S: FnMut(VertexId) -> bool,
        Q: FnMut(&RoutingNetworkEdgeEnumerator<'_>) -> bool,
    {
        self.clear();
        let mut enumerator = network.edge_enumerator();
        let mut best: Vec<Option<Finish>> = Vec::with_capacity(targets.len());
        for target in targets {
            best.push(direct(network, source, *target, &cost)?);
        }

        // both ways out of the source edge, each scaled by what is left of it
        for forward in [true, false] {
            if !enumerator.move_to_edge(source.edge, forward) {
                return Err(Error::EdgeNotFound(source.edge));
            }
            let costs = cost.get(&enumerator, true, &[]);
            if !costs.can_access {
                continue;
            }
            let remaining = if forward {
                1.0 - source.fraction()
            } else {
                source.fraction()
            };
            let seed = self.visit(Visit {
                vertex: enumerator.to(),
                edge: source.edge,
                forward,
                order: enumerator.head_order(),
                previous: NO_VISIT,
            });
            self.heap.push(seed, costs.cost * remaining);
        }

        while let Some((index, current)) = self.heap.pop() {
            if best.iter().all(|b| b.is_some_and(|finish| finish.cost <= current)) {
                break;
            }

            let visit = self.tree[index as usize];
            if !self.settled.insert(M::key(visit.edge, visit.vertex)) {
                continue;
            }
            if self.settled.len() > self.settings.max_settled {
                tracing::debug!(
                    max_settled = self.settings.max_settled,
                    "search budget exhausted"
                );
                // a candidate above the last popped cost may still be beaten
                for finish in best.iter_mut() {
                    if finish.is_some_and(|f| f.cost > current) {
                        *finish = None;
                    }
                }
                break;
            }
            if settled(visit.vertex) {
                continue;
            }
            self.load_history(index);

            for (target, best) in targets.iter().zip(best.iter_mut()) {
                if target.edge == visit.edge {
                    continue;
                }
                for forward in [true, false] {
                    if !enumerator.move_to_edge(target.edge, forward) || enumerator.from() != visit.vertex {
                        continue;
                    }
                    let costs = cost.get(&enumerator, true, &self.history);
                    if !costs.can_access {
                        continue;
                    }
                    let covered = if forward {
                        target.fraction()
                    } else {
                        1.0 - target.fraction()
                    };
                    let total = current + costs.turn_cost + costs.cost * covered;
                    if total.is_finite() && best.map_or(true, |b| total < b.cost) {
                        *best = Some(Finish {
                            cost: total,
                            visit: index,
                            forward,
                        });
                    }
                }
            }

            if !enumerator.move_to(visit.vertex) {
                continue;
            }
            while enumerator.move_next() {
                // no u-turns
                if enumerator.edge_id() == visit.edge {
                    continue;
                }
                if self.settled.contains(&M::key(enumerator.edge_id(), enumerator.to())) {
                    continue;
                }
                let costs = cost.get(&enumerator, true, &self.history);
                if !costs.can_access {
                    continue;
                }
                let total = current + costs.cost + costs.turn_cost;
                if !total.is_finite() || queued(&enumerator) {
                    continue;
                }
                let next = self.visit(Visit {
                    vertex: enumerator.to(),
                    edge: enumerator.edge_id(),
                    forward: enumerator.forward(),
                    order: enumerator.head_order(),
                    previous: index,
                });
                self.heap.push(next, total);
            }
        }

        tracing::debug!(
            settled = self.settled.len(),
            visits = self.tree.len(),
            found = best.iter().filter(|b| b.is_some()).count(),
            targets = targets.len(),
            "search finished"
        );

        targets
            .iter()
            .zip(best)
            .map(|(target, finish)| match finish {
                Some(finish) => Ok(Some((self.path(network, source, *target, finish)?, finish.cost))),
                None => Ok(None),
            })
            .collect()
    }

    fn visit(&mut self, visit: Visit) -> u32 {
        self.tree.push(visit);
        (self.tree.len() - 1) as u32
    }

    /// Fills the history handed to the cost function, most recent first.
    fn load_history(&mut self, mut index: u32) {
        self.history.clear();
        if !M::TURN_COSTS {
            return;
        }
        while index != NO_VISIT && self.history.len() < self.settings.max_previous_edges {
            let visit = self.tree[index as usize];
            self.history.push((visit.edge, visit.order));
            index = visit.previous;
        }
    }

    fn path(
        &self,
        network: &RoutingNetwork,
        source: SnapPoint,
        target: SnapPoint,
        finish: Finish,
    ) -> Result<Path> {
        let mut enumerator = network.edge_enumerator();
        let mut path = Path::new();
        if !enumerator.move_to_edge(target.edge, finish.forward) {
            return Err(Error::EdgeNotFound(target.edge));
        }
        path.append(&enumerator)?;

        let mut index = finish.visit;
        while index != NO_VISIT {
            let visit = self.tree[index as usize];
            if !enumerator.move_to_edge(visit.edge, visit.forward) {
                return Err(Error::EdgeNotFound(visit.edge));
            }
            path.prepend(&enumerator)?;
            index = visit.previous;
        }

        if let Some((_, forward)) = path.first() {
            path.offset1 = if forward { source.offset } else { MAX_OFFSET - source.offset };
        }
        if let Some((_, forward)) = path.last() {
            path.offset2 = if forward { target.offset } else { MAX_OFFSET - target.offset };
        }
        Ok(path)
    }
}

/// Cost of going straight from source to target along their shared edge.
fn direct<C: CostFunction>(
    network: &RoutingNetwork,
    source: SnapPoint,
    target: SnapPoint,
    cost: &C,
) -> Result<Option<Finish>> {
    let mut enumerator = network.edge_enumerator();
    if !enumerator.move_to_edge(target.edge, true) {
        return Err(Error::EdgeNotFound(target.edge));
    }
    if source.edge != target.edge {
        return Ok(None);
    }

    let forward = source.offset <= target.offset;
    enumerator.move_to_edge(source.edge, forward);
    let costs = cost.get(&enumerator, true, &[]);
    if !costs.can_access {
        return Ok(None);
    }
    let covered = (target.fraction() - source.fraction()).abs();
    Ok(Some(Finish {
        cost: costs.cost * covered,
        visit: NO_VISIT,
        forward,
    }))
}
