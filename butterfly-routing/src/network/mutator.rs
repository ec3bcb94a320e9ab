use butterfly_common::{EdgeId, Error, Location, Result, VertexId};
use rustc_hash::{FxHashMap, FxHashSet};
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;

use super::RoutingNetwork;
use crate::tile::{shape_length, NetworkTile};
use crate::tiles::Tile;
use crate::type_index::{Attribute, EdgeTypeIndex, GroupingFunction, TurnCostTypeIndex};

/// Copy-on-write writer session over a [`RoutingNetwork`].
///
/// The mutator starts from the snapshot's tile map. Tiles are shared with the
/// snapshot until first written, then copied once. Tiles whose cached type ids
/// were derived by an older grouping function are upgraded at that point.
/// Nothing is visible to readers until [`commit`](Self::commit).
pub struct NetworkMutator {
    id: Uuid,
    zoom: u32,
    tiles: FxHashMap<u32, Arc<NetworkTile>>,
    edge_type_index: Arc<EdgeTypeIndex>,
    turn_cost_type_index: Arc<TurnCostTypeIndex>,
    touched: FxHashSet<u32>,
}

impl NetworkMutator {
    pub(crate) fn new(network: &RoutingNetwork) -> Self {
        Self {
            id: network.id,
            zoom: network.zoom,
            tiles: network.tiles.clone(),
            edge_type_index: network.edge_type_index.clone(),
            turn_cost_type_index: network.turn_cost_type_index.clone(),
            touched: FxHashSet::default(),
        }
    }

    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    pub fn edge_type_index(&self) -> &EdgeTypeIndex {
        &self.edge_type_index
    }

    pub fn turn_cost_type_index(&self) -> &TurnCostTypeIndex {
        &self.turn_cost_type_index
    }

    /// Number of tiles written through this mutator.
    pub fn touched_tiles(&self) -> usize {
        self.touched.len()
    }

    pub fn has_vertex(&self, vertex: VertexId) -> bool {
        self.tiles
            .get(&vertex.tile_id)
            .is_some_and(|tile| tile.has_vertex(vertex))
    }

    pub fn location(&self, vertex: VertexId) -> Option<Location> {
        self.tiles.get(&vertex.tile_id)?.location(vertex.local_id)
    }

    /// Adds a vertex to the tile containing `location`.
    pub fn add_vertex(&mut self, location: Location) -> VertexId {
        let tile_id = Tile::containing(&location, self.zoom).local_id();
        match self.write_tile(tile_id, |tile| Ok::<_, Infallible>(tile.add_vertex(location))) {
            Ok(vertex) => vertex,
            Err(never) => match never {},
        }
    }

    /// Adds an edge between two existing vertices.
    ///
    /// The length is computed from the endpoints and the shape. When the
    /// endpoints live in different tiles the canonical record goes to the
    /// tile of `vertex1` and a mirror record to the tile of `vertex2`.
    pub fn add_edge(
        &mut self,
        vertex1: VertexId,
        vertex2: VertexId,
        shape: &[Location],
        attributes: &[Attribute],
    ) -> Result<EdgeId> {
        let from = self
            .location(vertex1)
            .ok_or(Error::VertexNotFound(vertex1))?;
        let to = self
            .location(vertex2)
            .ok_or(Error::VertexNotFound(vertex2))?;
        let length = shape_length(&from, shape, &to);
        let edge_type_id = Arc::make_mut(&mut self.edge_type_index).get(attributes);

        let edge = self.write_tile(vertex1.tile_id, |tile| {
            tile.add_edge(
                vertex1,
                vertex2,
                shape,
                attributes,
                Some(length),
                Some(edge_type_id),
                None,
            )
        })?;

        if vertex2.tile_id != vertex1.tile_id {
            self.write_tile(vertex2.tile_id, |tile| {
                tile.add_edge(
                    vertex1,
                    vertex2,
                    shape,
                    attributes,
                    Some(length),
                    Some(edge_type_id),
                    Some(edge),
                )
            })?;
            tracing::trace!(%edge, from_tile = vertex1.tile_id, to_tile = vertex2.tile_id, "mirrored boundary edge");
        }
        Ok(edge)
    }

    /// Adds a turn-cost table at `vertex`.
    ///
    /// `costs` is the row-major square matrix over `edges`, rows being the
    /// edge turned from. `prefix` lists edges that must have been travelled,
    /// oldest first, before the from edge for the costs to apply; it is only
    /// supported on tables of exactly two edges.
    pub fn add_turn_costs(
        &mut self,
        vertex: VertexId,
        attributes: &[Attribute],
        edges: &[EdgeId],
        costs: &[u32],
        prefix: &[EdgeId],
    ) -> Result<()> {
        if !self.has_vertex(vertex) {
            return Err(Error::VertexNotFound(vertex));
        }
        let turn_cost_type_id = Arc::make_mut(&mut self.turn_cost_type_index).get(attributes);

        let assignments = self.write_tile(vertex.tile_id, |tile| {
            tile.add_turn_costs(vertex, turn_cost_type_id, attributes, edges, costs, prefix)
        })?;

        // keep the mirror copies of boundary edges in sync, a tile that is
        // not loaded has no mirror to update
        for assignment in assignments {
            let other_tile = assignment.other.tile_id;
            if other_tile == vertex.tile_id || !self.tiles.contains_key(&other_tile) {
                continue;
            }
            self.write_tile(other_tile, |tile| {
                tile.set_turn_order(assignment.edge, assignment.other, vertex, assignment.order)
            })?;
        }
        Ok(())
    }

    /// Installs a new edge-type grouping function.
    ///
    /// Tiles re-derive their edge-type ids the next time they are written.
    pub fn set_edge_type_map(&mut self, function: GroupingFunction) {
        self.edge_type_index = Arc::new(self.edge_type_index.next(function));
        tracing::debug!(version = self.edge_type_index.version(), "installed edge type map");
    }

    /// Installs a new turn-cost-type grouping function.
    pub fn set_turn_cost_type_map(&mut self, function: GroupingFunction) {
        self.turn_cost_type_index = Arc::new(self.turn_cost_type_index.next(function));
        tracing::debug!(version = self.turn_cost_type_index.version(), "installed turn cost type map");
    }

    /// Snapshot of the current state without ending the session.
    pub fn to_network(&self) -> RoutingNetwork {
        RoutingNetwork::from_parts(
            self.id,
            self.zoom,
            self.tiles.clone(),
            self.edge_type_index.clone(),
            self.turn_cost_type_index.clone(),
        )
    }

    /// Ends the session and returns the new snapshot.
    pub fn commit(self) -> RoutingNetwork {
        tracing::debug!(
            network = %self.id,
            touched = self.touched.len(),
            tiles = self.tiles.len(),
            "committing network mutator"
        );
        RoutingNetwork::from_parts(
            self.id,
            self.zoom,
            self.tiles,
            self.edge_type_index,
            self.turn_cost_type_index,
        )
    }

    /// Runs `write` against a tile, creating or upgrading it as needed.
    ///
    /// A tile still shared with a snapshot, or carrying type ids from an
    /// older grouping function, is written through a private copy that only
    /// replaces it once `write` succeeds. When `write` fails the tile map and
    /// the touched set are left as they were.
    fn write_tile<T, E>(
        &mut self,
        tile_id: u32,
        write: impl FnOnce(&mut NetworkTile) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let edge_version = self.edge_type_index.version();
        let turn_version = self.turn_cost_type_index.version();

        // owned by this session and current: tile writes validate before they mutate
        let owned = self.tiles.get_mut(&tile_id).and_then(|slot| {
            let current = slot.edge_type_map_version() == edge_version
                && slot.turn_cost_type_map_version() == turn_version;
            if current {
                Arc::get_mut(slot)
            } else {
                None
            }
        });
        if let Some(tile) = owned {
            let out = write(tile)?;
            self.touched.insert(tile_id);
            return Ok(out);
        }

        let mut tile = match self.tiles.get(&tile_id) {
            Some(tile) => NetworkTile::clone(tile),
            None => {
                tracing::trace!(tile_id, "creating tile");
                NetworkTile::with_versions(tile_id, self.zoom, edge_version, turn_version)
            }
        };
        if tile.edge_type_map_version() != edge_version {
            tracing::debug!(
                tile_id,
                from = tile.edge_type_map_version(),
                to = edge_version,
                "upgrading tile edge types"
            );
            tile = tile.apply_edge_type_map(Arc::make_mut(&mut self.edge_type_index));
        }
        if tile.turn_cost_type_map_version() != turn_version {
            tracing::debug!(
                tile_id,
                from = tile.turn_cost_type_map_version(),
                to = turn_version,
                "upgrading tile turn cost types"
            );
            tile = tile.apply_turn_cost_type_map(Arc::make_mut(&mut self.turn_cost_type_index));
        }

        let out = write(&mut tile)?;
        self.tiles.insert(tile_id, Arc::new(tile));
        self.touched.insert(tile_id);
        Ok(out)
    }
}
