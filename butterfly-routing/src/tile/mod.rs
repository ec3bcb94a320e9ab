//! Network tiles
//!
//! A tile owns every vertex located inside it, the edges leaving or entering
//! those vertices, their shapes and raw attributes, and the turn-cost tables
//! of its vertices. Edges crossing a tile boundary are stored in both tiles
//! under the same [`EdgeId`]; the record at `EdgeId::local_id` in the first
//! vertex's tile is the canonical one, the other is its mirror.
//!
//! Adjacency is a forward-star: every vertex points at its first edge record
//! and every record carries a `next` pointer per local endpoint.
//!
//! Tiles are plain values. Once a tile is part of a published snapshot it is
//! only ever replaced, never changed, see [`crate::network::NetworkMutator`].

pub mod codec;
pub mod turn_order;

use butterfly_common::{EdgeId, Error, Location, Result, VertexId};
use rustc_hash::FxHashMap;

use crate::tiles::Tile;
use crate::type_index::{Attribute, AttributeSetIndex};
use turn_order::MAX_ORDERS;

pub(crate) const NO_EDGE: u32 = u32::MAX;

/// One stored edge record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EdgeRecord {
    /// Canonical id, differs from the record position for mirror records.
    pub id: EdgeId,
    pub vertex1: VertexId,
    pub vertex2: VertexId,
    pub next1: u32,
    pub next2: u32,
    pub length_cm: u32,
    pub edge_type_id: Option<u32>,
    pub shape_start: u32,
    pub shape_len: u32,
    pub attributes: Option<u32>,
    pub turn_orders: u8,
}

impl EdgeRecord {
    pub(crate) const EMPTY: EdgeRecord = EdgeRecord {
        id: EdgeId::EMPTY,
        vertex1: VertexId::EMPTY,
        vertex2: VertexId::EMPTY,
        next1: NO_EDGE,
        next2: NO_EDGE,
        length_cm: 0,
        edge_type_id: None,
        shape_start: 0,
        shape_len: 0,
        attributes: None,
        turn_orders: 0,
    };

    /// Turn order of this edge at one of its endpoints.
    pub(crate) fn order_at(&self, vertex: VertexId) -> Option<u8> {
        let (tail, head) = turn_order::unpack(self.turn_orders);
        if self.vertex1 == vertex {
            tail
        } else if self.vertex2 == vertex {
            head
        } else {
            None
        }
    }

    fn set_order_at(&mut self, vertex: VertexId, order: u8) {
        let (tail, head) = turn_order::unpack(self.turn_orders);
        self.turn_orders = if self.vertex1 == vertex {
            turn_order::pack(Some(order), head)
        } else {
            turn_order::pack(tail, Some(order))
        };
    }
}

/// One cell of a vertex's turn-cost table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnCostEntry {
    pub turn_cost_type_id: u32,
    pub from_order: u8,
    pub to_order: u8,
    pub cost: u32,
    /// Index of the raw attribute set in the tile.
    pub(crate) attributes: u32,
    /// Edges that must precede the `from` edge, oldest first.
    pub prefix: Vec<EdgeId>,
}

/// Order slot given to an edge while adding a turn table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnOrderAssignment {
    pub edge: EdgeId,
    /// Endpoint of the edge opposite the turn table's vertex.
    pub other: VertexId,
    pub order: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkTile {
    tile_id: u32,
    zoom: u32,
    edge_type_map_version: u32,
    turn_cost_type_map_version: u32,
    locations: Vec<Location>,
    first_edges: Vec<u32>,
    edges: Vec<EdgeRecord>,
    shapes: Vec<Location>,
    attribute_sets: Vec<Vec<Attribute>>,
    turn_costs: FxHashMap<u32, Vec<TurnCostEntry>>,
    turn_cost_attributes: Vec<Vec<Attribute>>,
}

impl NetworkTile {
    pub fn new(tile_id: u32, zoom: u32) -> Self {
        Self::with_versions(tile_id, zoom, 0, 0)
    }

    pub fn with_versions(
        tile_id: u32,
        zoom: u32,
        edge_type_map_version: u32,
        turn_cost_type_map_version: u32,
    ) -> Self {
        Self {
            tile_id,
            zoom,
            edge_type_map_version,
            turn_cost_type_map_version,
            locations: Vec::new(),
            first_edges: Vec::new(),
            edges: Vec::new(),
            shapes: Vec::new(),
            attribute_sets: Vec::new(),
            turn_costs: FxHashMap::default(),
            turn_cost_attributes: Vec::new(),
        }
    }

    pub fn tile_id(&self) -> u32 {
        self.tile_id
    }

    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    pub fn tile(&self) -> Tile {
        Tile::from_local_id(self.tile_id, self.zoom)
    }

    /// Version of the edge-type grouping function the cached ids came from.
    pub fn edge_type_map_version(&self) -> u32 {
        self.edge_type_map_version
    }

    pub fn turn_cost_type_map_version(&self) -> u32 {
        self.turn_cost_type_map_version
    }

    pub fn vertex_count(&self) -> usize {
        self.locations.len()
    }

    /// Number of edge records, mirrors of boundary-crossing edges included.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn has_vertex(&self, vertex: VertexId) -> bool {
        vertex.tile_id == self.tile_id && (vertex.local_id as usize) < self.locations.len()
    }

    pub fn location(&self, local_id: u32) -> Option<Location> {
        self.locations.get(local_id as usize).copied()
    }

    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, Location)> + '_ {
        let tile_id = self.tile_id;
        self.locations
            .iter()
            .enumerate()
            .map(move |(i, l)| (VertexId::new(tile_id, i as u32), *l))
    }

    pub fn add_vertex(&mut self, location: Location) -> VertexId {
        let id = VertexId::new(self.tile_id, self.locations.len() as u32);
        self.locations.push(location);
        self.first_edges.push(NO_EDGE);
        id
    }

    /// Store an edge and link it into the forward-star of its local endpoints.
    ///
    /// The length is computed from the geometry when not given, which needs
    /// both endpoints in this tile. `mirror_of` stores a copy of an edge whose
    /// canonical record lives in another tile.
    #[allow(clippy::too_many_arguments)]
    pub fn add_edge(
        &mut self,
        vertex1: VertexId,
        vertex2: VertexId,
        shape: &[Location],
        attributes: &[Attribute],
        length: Option<f64>,
        edge_type_id: Option<u32>,
        mirror_of: Option<EdgeId>,
    ) -> Result<EdgeId> {
        let local1 = vertex1.tile_id == self.tile_id;
        let local2 = vertex2.tile_id == self.tile_id;
        if !local1 && !local2 {
            return Err(Error::VertexNotFound(vertex1));
        }
        for (vertex, local) in [(vertex1, local1), (vertex2, local2)] {
            if local && !self.has_vertex(vertex) {
                return Err(Error::VertexNotFound(vertex));
            }
        }

        let length = match length {
            Some(length) => length,
            None => {
                let (Some(from), Some(to)) = (self.local_location(vertex1), self.local_location(vertex2)) else {
                    let foreign = if local1 { vertex2 } else { vertex1 };
                    return Err(Error::VertexNotFound(foreign));
                };
                shape_length(&from, shape, &to)
            }
        };

        let pos = self.edges.len() as u32;
        let id = mirror_of.unwrap_or(EdgeId::new(self.tile_id, pos));

        let shape_start = self.shapes.len() as u32;
        self.shapes.extend_from_slice(shape);

        let mut record = EdgeRecord {
            id,
            vertex1,
            vertex2,
            next1: NO_EDGE,
            next2: NO_EDGE,
            length_cm: to_centimeters(length),
            edge_type_id,
            shape_start,
            shape_len: shape.len() as u32,
            attributes: self.push_attributes(attributes),
            turn_orders: 0,
        };

        if local1 {
            let first = &mut self.first_edges[vertex1.local_id as usize];
            record.next1 = *first;
            *first = pos;
        }
        // self loops are linked once, through vertex1
        if local2 && !(local1 && vertex1 == vertex2) {
            let first = &mut self.first_edges[vertex2.local_id as usize];
            record.next2 = *first;
            *first = pos;
        }

        self.edges.push(record);
        Ok(id)
    }

    /// Store a turn-cost table at `vertex`.
    ///
    /// `costs` is the row-major `edges.len() x edges.len()` matrix, rows
    /// being the edge turned from. Zero cells are not stored. Edges without
    /// an order slot at this vertex get the next free one.
    pub fn add_turn_costs(
        &mut self,
        vertex: VertexId,
        turn_cost_type_id: u32,
        attributes: &[Attribute],
        edges: &[EdgeId],
        costs: &[u32],
        prefix: &[EdgeId],
    ) -> Result<Vec<TurnOrderAssignment>> {
        if !self.has_vertex(vertex) {
            return Err(Error::VertexNotFound(vertex));
        }
        let n = edges.len();
        if costs.len() != n * n {
            return Err(Error::InvalidTurnCostMatrix {
                expected: n * n,
                found: costs.len(),
            });
        }
        if !prefix.is_empty() && n != 2 {
            return Err(Error::UnsupportedTurnCostPrefix { edges: n });
        }

        let mut positions = Vec::with_capacity(n);
        for &edge in edges {
            let pos = self
                .find_record_at(vertex, edge)
                .ok_or(Error::EdgeNotFound(edge))?;
            positions.push(pos);
        }

        // resolve all orders before touching anything
        let mut next_order = self.max_order_at(vertex).map_or(0, |o| o as usize + 1);
        let mut assignments = Vec::with_capacity(n);
        let mut new_orders = Vec::new();
        for &pos in &positions {
            let record = &self.edges[pos];
            let order = match record.order_at(vertex) {
                Some(order) => order,
                None => match new_orders.iter().find(|(p, _)| *p == pos) {
                    Some(&(_, order)) => order,
                    None => {
                        if next_order >= MAX_ORDERS {
                            return Err(Error::TooManyTurnOrders {
                                vertex,
                                max: MAX_ORDERS,
                            });
                        }
                        let order = next_order as u8;
                        next_order += 1;
                        new_orders.push((pos, order));
                        order
                    }
                },
            };
            let other = if record.vertex1 == vertex {
                record.vertex2
            } else {
                record.vertex1
            };
            assignments.push(TurnOrderAssignment {
                edge: record.id,
                other,
                order,
            });
        }

        for (pos, order) in new_orders {
            self.edges[pos].set_order_at(vertex, order);
        }

        let attributes = self.push_turn_cost_attributes(attributes);
        let table = self.turn_costs.entry(vertex.local_id).or_default();
        for (i, from) in assignments.iter().enumerate() {
            for (j, to) in assignments.iter().enumerate() {
                let cost = costs[i * n + j];
                if cost == 0 {
                    continue;
                }
                table.push(TurnCostEntry {
                    turn_cost_type_id,
                    from_order: from.order,
                    to_order: to.order,
                    cost,
                    attributes,
                    prefix: prefix.to_vec(),
                });
            }
        }

        Ok(assignments)
    }

    /// Set the order of `edge` at `vertex` on the record found through
    /// `local_vertex`'s forward-star.
    ///
    /// Used to keep the mirror of a boundary-crossing edge in sync with the
    /// order assigned in the other tile.
    pub fn set_turn_order(
        &mut self,
        edge: EdgeId,
        local_vertex: VertexId,
        vertex: VertexId,
        order: u8,
    ) -> Result<()> {
        if !self.has_vertex(local_vertex) {
            return Err(Error::VertexNotFound(local_vertex));
        }
        let pos = self
            .find_record_at(local_vertex, edge)
            .ok_or(Error::EdgeNotFound(edge))?;
        self.edges[pos].set_order_at(vertex, order);
        Ok(())
    }

    /// Copy of this tile with edge-type ids recomputed from the raw attributes.
    pub fn apply_edge_type_map(&self, index: &mut AttributeSetIndex) -> NetworkTile {
        let mut tile = self.clone();
        for record in &mut tile.edges {
            let attributes = match record.attributes {
                Some(ptr) => tile.attribute_sets[ptr as usize].as_slice(),
                None => &[],
            };
            record.edge_type_id = Some(index.get(attributes));
        }
        tile.edge_type_map_version = index.version();
        tile
    }

    /// Copy of this tile with turn-cost type ids recomputed from the raw
    /// attributes.
    pub fn apply_turn_cost_type_map(&self, index: &mut AttributeSetIndex) -> NetworkTile {
        let mut tile = self.clone();
        for entries in tile.turn_costs.values_mut() {
            for entry in entries {
                let attributes = &tile.turn_cost_attributes[entry.attributes as usize];
                entry.turn_cost_type_id = index.get(attributes);
            }
        }
        tile.turn_cost_type_map_version = index.version();
        tile
    }

    pub(crate) fn record(&self, pos: u32) -> Option<&EdgeRecord> {
        self.edges.get(pos as usize)
    }

    pub(crate) fn first_edge(&self, local_id: u32) -> u32 {
        self.first_edges
            .get(local_id as usize)
            .copied()
            .unwrap_or(NO_EDGE)
    }

    pub(crate) fn shape(&self, record: &EdgeRecord) -> &[Location] {
        let start = record.shape_start as usize;
        &self.shapes[start..start + record.shape_len as usize]
    }

    pub(crate) fn attributes(&self, record: &EdgeRecord) -> &[Attribute] {
        match record.attributes {
            Some(ptr) => &self.attribute_sets[ptr as usize],
            None => &[],
        }
    }

    pub(crate) fn turn_costs_at(&self, local_id: u32) -> &[TurnCostEntry] {
        self.turn_costs
            .get(&local_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn turn_cost_attributes(&self, entry: &TurnCostEntry) -> &[Attribute] {
        &self.turn_cost_attributes[entry.attributes as usize]
    }

    /// Record positions in the forward-star of a local vertex.
    pub(crate) fn star(&self, vertex: VertexId) -> Star<'_> {
        let next = if vertex.tile_id == self.tile_id {
            self.first_edge(vertex.local_id)
        } else {
            NO_EDGE
        };
        Star {
            tile: self,
            vertex,
            next,
        }
    }

    /// Position of the record of `edge` in `vertex`'s forward-star.
    pub(crate) fn find_record_at(&self, vertex: VertexId, edge: EdgeId) -> Option<usize> {
        self.star(vertex)
            .find(|&pos| self.edges[pos as usize].id == edge)
            .map(|pos| pos as usize)
    }

    fn max_order_at(&self, vertex: VertexId) -> Option<u8> {
        self.star(vertex)
            .filter_map(|pos| self.edges[pos as usize].order_at(vertex))
            .max()
    }

    fn local_location(&self, vertex: VertexId) -> Option<Location> {
        if vertex.tile_id != self.tile_id {
            return None;
        }
        self.location(vertex.local_id)
    }

    fn push_attributes(&mut self, attributes: &[Attribute]) -> Option<u32> {
        if attributes.is_empty() {
            return None;
        }
        // consecutive edges usually come from the same way
        if let Some(last) = self.attribute_sets.last() {
            if last.as_slice() == attributes {
                return Some(self.attribute_sets.len() as u32 - 1);
            }
        }
        self.attribute_sets.push(attributes.to_vec());
        Some(self.attribute_sets.len() as u32 - 1)
    }

    fn push_turn_cost_attributes(&mut self, attributes: &[Attribute]) -> u32 {
        if let Some(pos) = self
            .turn_cost_attributes
            .iter()
            .position(|a| a.as_slice() == attributes)
        {
            return pos as u32;
        }
        self.turn_cost_attributes.push(attributes.to_vec());
        self.turn_cost_attributes.len() as u32 - 1
    }
}

/// Iterator over the record positions linked to one vertex.
pub(crate) struct Star<'a> {
    tile: &'a NetworkTile,
    vertex: VertexId,
    next: u32,
}

impl Iterator for Star<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.next == NO_EDGE {
            return None;
        }
        let pos = self.next;
        let record = &self.tile.edges[pos as usize];
        self.next = if record.vertex1 == self.vertex {
            record.next1
        } else {
            record.next2
        };
        Some(pos)
    }
}

/// Length in meters of the polyline `from`, `shape...`, `to`.
pub fn shape_length(from: &Location, shape: &[Location], to: &Location) -> f64 {
    let mut length = 0.0;
    let mut previous = from;
    for point in shape.iter().chain(std::iter::once(to)) {
        length += previous.distance(point);
        previous = point;
    }
    length
}

pub(crate) fn to_centimeters(length_m: f64) -> u32 {
    (length_m * 100.0).round().clamp(0.0, u32::MAX as f64) as u32
}
