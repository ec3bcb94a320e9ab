//! Edge enumeration over a network snapshot
//!
//! [`RoutingNetworkEdgeEnumerator`] is a cursor: move it to a vertex and step
//! through that vertex's edges, or move it straight to one edge in a given
//! direction. The enumerator borrows the snapshot and is cheap to create;
//! use one per search or per thread.

use butterfly_common::{EdgeId, Location, VertexId};
use std::iter::FusedIterator;
use std::slice;

use crate::network::RoutingNetwork;
use crate::tile::{EdgeRecord, NetworkTile, TurnCostEntry, NO_EDGE};
use crate::type_index::Attribute;

#[derive(Clone)]
pub struct RoutingNetworkEdgeEnumerator<'a> {
    network: &'a RoutingNetwork,
    tile: Option<&'a NetworkTile>,
    vertex: VertexId,
    next: u32,
    record: EdgeRecord,
    forward: bool,
}

impl<'a> RoutingNetworkEdgeEnumerator<'a> {
    pub fn new(network: &'a RoutingNetwork) -> Self {
        Self {
            network,
            tile: None,
            vertex: VertexId::EMPTY,
            next: NO_EDGE,
            record: EdgeRecord::EMPTY,
            forward: true,
        }
    }

    pub fn network(&self) -> &'a RoutingNetwork {
        self.network
    }

    /// Positions before the first edge of `vertex`.
    ///
    /// Returns false when the vertex does not exist or its tile is not loaded.
    pub fn move_to(&mut self, vertex: VertexId) -> bool {
        self.reset();
        let Some(tile) = self.network.tile(vertex.tile_id) else {
            return false;
        };
        if !tile.has_vertex(vertex) {
            return false;
        }

        self.tile = Some(tile.as_ref());
        self.vertex = vertex;
        self.next = tile.first_edge(vertex.local_id);
        true
    }

    /// Moves to the next edge of the vertex last moved to.
    ///
    /// Edges are oriented away from that vertex: `from()` is the vertex.
    pub fn move_next(&mut self) -> bool {
        let Some(tile) = self.tile else {
            return false;
        };
        if self.next == NO_EDGE {
            return false;
        }
        let Some(record) = tile.record(self.next) else {
            return false;
        };

        self.forward = record.vertex1 == self.vertex;
        self.next = if self.forward { record.next1 } else { record.next2 };
        self.record = *record;
        true
    }

    /// Positions on one edge, traversed `forward` (vertex1 to vertex2) or
    /// backward.
    ///
    /// The record is always taken from the tile of the tail vertex, so the
    /// turn table of `from()` is reachable. When that tile is not loaded the
    /// canonical record is used instead.
    pub fn move_to_edge(&mut self, edge: EdgeId, forward: bool) -> bool {
        self.reset();
        let Some(tile) = self.network.tile(edge.tile_id) else {
            return false;
        };
        let Some(record) = tile.record(edge.local_id).filter(|r| r.id == edge) else {
            return false;
        };

        let tail = if forward { record.vertex1 } else { record.vertex2 };
        let (tile, record) = match self.network.tile(tail.tile_id) {
            Some(tail_tile) if tail.tile_id != tile.tile_id() => {
                match tail_tile
                    .find_record_at(tail, edge)
                    .and_then(|pos| tail_tile.record(pos as u32))
                {
                    Some(mirror) => (tail_tile.as_ref(), mirror),
                    None => (tile.as_ref(), record),
                }
            }
            _ => (tile.as_ref(), record),
        };

        self.tile = Some(tile);
        self.vertex = tail;
        self.record = *record;
        self.forward = forward;
        true
    }

    /// True when positioned on an edge.
    pub fn is_positioned(&self) -> bool {
        !self.record.id.is_empty()
    }

    pub fn edge_id(&self) -> EdgeId {
        self.record.id
    }

    /// True when the edge is traversed in its stored direction.
    pub fn forward(&self) -> bool {
        self.forward
    }

    pub fn from(&self) -> VertexId {
        if self.forward {
            self.record.vertex1
        } else {
            self.record.vertex2
        }
    }

    pub fn to(&self) -> VertexId {
        if self.forward {
            self.record.vertex2
        } else {
            self.record.vertex1
        }
    }

    pub fn from_location(&self) -> Option<Location> {
        self.network.location(self.from())
    }

    pub fn to_location(&self) -> Option<Location> {
        self.network.location(self.to())
    }

    /// Length in meters.
    pub fn length(&self) -> f64 {
        self.record.length_cm as f64 / 100.0
    }

    /// Intermediate shape points in traversal order.
    pub fn shape(&self) -> ShapeIter<'a> {
        let points: &'a [Location] = match self.tile {
            Some(tile) if self.is_positioned() => tile.shape(&self.record),
            _ => &[],
        };
        ShapeIter {
            points: points.iter(),
            forward: self.forward,
        }
    }

    /// Shape with both endpoint locations, in traversal order.
    ///
    /// Endpoints of tiles that are not loaded are left out.
    pub fn complete_shape(&self) -> Vec<Location> {
        let shape = self.shape();
        let mut points = Vec::with_capacity(shape.len() + 2);
        points.extend(self.from_location());
        points.extend(shape);
        points.extend(self.to_location());
        points
    }

    /// Raw attributes stored with the edge.
    pub fn attributes(&self) -> &'a [Attribute] {
        match self.tile {
            Some(tile) if self.is_positioned() => tile.attributes(&self.record),
            _ => &[],
        }
    }

    /// Cached edge-type id, `None` while the tile was derived by an older
    /// grouping function.
    pub fn edge_type_id(&self) -> Option<u32> {
        let tile = self.tile?;
        if tile.edge_type_map_version() != self.network.edge_type_index().version() {
            return None;
        }
        self.record.edge_type_id
    }

    /// Turn order of this edge at `from()`.
    pub fn tail_order(&self) -> Option<u8> {
        self.record.order_at(self.from())
    }

    /// Turn order of this edge at `to()`.
    pub fn head_order(&self) -> Option<u8> {
        self.record.order_at(self.to())
    }

    /// Turn costs at `from()` for turning from the edge with order
    /// `from_order` onto this edge.
    pub fn turn_cost_to(&self, from_order: u8) -> impl Iterator<Item = &'a TurnCostEntry> + 'a {
        let tail = self.tail_order();
        self.from_turn_table()
            .iter()
            .filter(move |entry| entry.from_order == from_order && Some(entry.to_order) == tail)
    }

    /// Turn costs at `from()` for turning from this edge onto the edge with
    /// order `to_order`.
    pub fn turn_cost_from(&self, to_order: u8) -> impl Iterator<Item = &'a TurnCostEntry> + 'a {
        let tail = self.tail_order();
        self.from_turn_table()
            .iter()
            .filter(move |entry| entry.to_order == to_order && Some(entry.from_order) == tail)
    }

    /// Raw attributes of a turn-cost entry returned by this enumerator.
    pub fn turn_cost_attributes(&self, entry: &TurnCostEntry) -> &'a [Attribute] {
        match self.tile {
            Some(tile) => tile.turn_cost_attributes(entry),
            None => &[],
        }
    }

    /// Cached turn-cost type id of an entry, `None` while stale.
    pub fn turn_cost_type_id(&self, entry: &TurnCostEntry) -> Option<u32> {
        let tile = self.tile?;
        if tile.turn_cost_type_map_version() != self.network.turn_cost_type_index().version() {
            return None;
        }
        Some(entry.turn_cost_type_id)
    }

    fn from_turn_table(&self) -> &'a [TurnCostEntry] {
        let from = self.from();
        match self.tile {
            Some(tile) if self.is_positioned() && tile.tile_id() == from.tile_id => {
                tile.turn_costs_at(from.local_id)
            }
            _ => &[],
        }
    }

    fn reset(&mut self) {
        self.tile = None;
        self.vertex = VertexId::EMPTY;
        self.next = NO_EDGE;
        self.record = EdgeRecord::EMPTY;
        self.forward = true;
    }
}

/// Shape points of one edge, reversed for backward traversal.
#[derive(Debug, Clone)]
pub struct ShapeIter<'a> {
    points: slice::Iter<'a, Location>,
    forward: bool,
}

impl Iterator for ShapeIter<'_> {
    type Item = Location;

    fn next(&mut self) -> Option<Location> {
        if self.forward {
            self.points.next().copied()
        } else {
            self.points.next_back().copied()
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.points.size_hint()
    }
}

impl DoubleEndedIterator for ShapeIter<'_> {
    fn next_back(&mut self) -> Option<Location> {
        if self.forward {
            self.points.next_back().copied()
        } else {
            self.points.next().copied()
        }
    }
}

impl ExactSizeIterator for ShapeIter<'_> {}

impl FusedIterator for ShapeIter<'_> {}
