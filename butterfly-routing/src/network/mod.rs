//! Routing network snapshots
//!
//! A [`RoutingNetwork`] is an immutable snapshot: a sparse map of tile id to
//! shared tile, the zoom level and the two type indexes. Snapshots are cheap
//! to clone and safe to read from any number of threads. Changes go through a
//! [`NetworkMutator`] which produces the next snapshot.

mod mutator;

pub use mutator::NetworkMutator;

use butterfly_common::{Error, Location, Result, VertexId};
use butterfly_io::{ChecksumReader, ChecksumWriter, ReadExt, WriteExt};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::enumerator::RoutingNetworkEdgeEnumerator;
use crate::tile::NetworkTile;
use crate::tiles::check_zoom;
use crate::type_index::{identity, EdgeTypeIndex, GroupingFunction, TurnCostTypeIndex};

const MAGIC: u32 = 0x424E_4554; // "BNET"
const VERSION: u16 = 1;

#[derive(Debug, Clone)]
pub struct RoutingNetwork {
    id: Uuid,
    zoom: u32,
    tiles: FxHashMap<u32, Arc<NetworkTile>>,
    edge_type_index: Arc<EdgeTypeIndex>,
    turn_cost_type_index: Arc<TurnCostTypeIndex>,
}

impl RoutingNetwork {
    /// Empty network with a fresh id and identity type indexes.
    pub fn new(zoom: u32) -> Result<Self> {
        Self::with_indexes(zoom, EdgeTypeIndex::new(), TurnCostTypeIndex::new())
    }

    pub fn with_indexes(
        zoom: u32,
        edge_type_index: EdgeTypeIndex,
        turn_cost_type_index: TurnCostTypeIndex,
    ) -> Result<Self> {
        check_zoom(zoom)?;
        Ok(Self {
            id: Uuid::new_v4(),
            zoom,
            tiles: FxHashMap::default(),
            edge_type_index: Arc::new(edge_type_index),
            turn_cost_type_index: Arc::new(turn_cost_type_index),
        })
    }

    pub(crate) fn from_parts(
        id: Uuid,
        zoom: u32,
        tiles: FxHashMap<u32, Arc<NetworkTile>>,
        edge_type_index: Arc<EdgeTypeIndex>,
        turn_cost_type_index: Arc<TurnCostTypeIndex>,
    ) -> Self {
        Self {
            id,
            zoom,
            tiles,
            edge_type_index,
            turn_cost_type_index,
        }
    }

    /// Identity of the network, shared by all of its snapshots.
    pub fn id(&self) -> Uuid {
        self.id
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

    pub fn tile(&self, tile_id: u32) -> Option<&Arc<NetworkTile>> {
        self.tiles.get(&tile_id)
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Ids of the stored tiles in ascending order.
    pub fn tile_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.tiles.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn has_vertex(&self, vertex: VertexId) -> bool {
        self.tile(vertex.tile_id)
            .is_some_and(|tile| tile.has_vertex(vertex))
    }

    /// Location of a vertex, `None` when its tile is not loaded.
    pub fn location(&self, vertex: VertexId) -> Option<Location> {
        self.tile(vertex.tile_id)?.location(vertex.local_id)
    }

    pub fn vertex_count(&self) -> usize {
        self.tiles.values().map(|tile| tile.vertex_count()).sum()
    }

    /// Number of distinct edges, mirror records not counted.
    pub fn edge_count(&self) -> usize {
        self.tiles
            .values()
            .map(|tile| {
                (0..tile.edge_count() as u32)
                    .filter_map(|pos| tile.record(pos))
                    .filter(|record| record.id.tile_id == tile.tile_id())
                    .count()
            })
            .sum()
    }

    /// Writer session producing the next snapshot.
    pub fn mutate(&self) -> NetworkMutator {
        NetworkMutator::new(self)
    }

    pub fn edge_enumerator(&self) -> RoutingNetworkEdgeEnumerator<'_> {
        RoutingNetworkEdgeEnumerator::new(self)
    }

    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        let mut w = ChecksumWriter::new(&mut *writer);

        w.write_u32_le(MAGIC)?;
        w.write_u16_le(VERSION)?;
        w.write_guid(&self.id)?;
        w.write_var_u32(self.zoom)?;
        self.edge_type_index.write_to(&mut w)?;
        self.turn_cost_type_index.write_to(&mut w)?;

        let ids = self.tile_ids();
        w.write_var_u32(ids.len() as u32)?;
        for id in ids {
            self.tiles[&id].write_to(&mut w)?;
        }

        let (crc, inner) = w.finish();
        inner.write_u64_le(crc)?;
        Ok(())
    }

    /// Reads a network written by [`write_to`](Self::write_to).
    ///
    /// Grouping functions are code and not stored. `edge_types` and
    /// `turn_cost_types` must be the functions that produced the stored ids,
    /// the indexes keep their stored versions so loaded tiles stay current.
    /// A different grouping is installed afterwards through
    /// [`NetworkMutator::set_edge_type_map`], which makes every tile stale.
    pub fn read_from<R: Read + ?Sized>(
        reader: &mut R,
        edge_types: GroupingFunction,
        turn_cost_types: GroupingFunction,
    ) -> Result<Self> {
        let mut r = ChecksumReader::new(&mut *reader);

        let magic = r.read_u32_le()?;
        if magic != MAGIC {
            return Err(Error::Format(format!("invalid network magic {magic:#010x}")));
        }
        let version = r.read_u16_le()?;
        if version != VERSION {
            return Err(Error::Format(format!("unsupported network version {version}")));
        }

        let id = r.read_guid()?;
        let zoom = r.read_var_u32()?;
        check_zoom(zoom)?;
        let edge_type_index = EdgeTypeIndex::read_from(&mut r, edge_types)?;
        let turn_cost_type_index = TurnCostTypeIndex::read_from(&mut r, turn_cost_types)?;

        let count = r.read_var_u32()?;
        let mut tiles = FxHashMap::default();
        for _ in 0..count {
            let tile = NetworkTile::read_from(&mut r)?;
            if tile.zoom() != zoom {
                return Err(Error::ZoomMismatch {
                    expected: zoom,
                    found: tile.zoom(),
                });
            }
            if tiles.insert(tile.tile_id(), Arc::new(tile)).is_some() {
                return Err(Error::Format("duplicate tile in network".into()));
            }
        }

        let (computed, inner) = r.finish();
        let stored = inner.read_u64_le()?;
        if computed != stored {
            return Err(Error::Format(format!(
                "network checksum mismatch: computed {computed:#018x}, stored {stored:#018x}"
            )));
        }

        Ok(Self::from_parts(
            id,
            zoom,
            tiles,
            Arc::new(edge_type_index),
            Arc::new(turn_cost_type_index),
        ))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;

        tracing::info!(
            path = %path.display(),
            network = %self.id,
            tiles = self.tiles.len(),
            "saved routing network"
        );
        Ok(())
    }

    /// Loads a saved network, see [`read_from`](Self::read_from) for the
    /// grouping functions.
    pub fn load<P: AsRef<Path>>(
        path: P,
        edge_types: GroupingFunction,
        turn_cost_types: GroupingFunction,
    ) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        let network = Self::read_from(&mut reader, edge_types, turn_cost_types)?;

        tracing::info!(
            path = %path.display(),
            network = %network.id,
            tiles = network.tiles.len(),
            "loaded routing network"
        );
        Ok(network)
    }

    /// Loads a network that was built with the identity grouping functions.
    pub fn load_ungrouped<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load(path, identity(), identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_index::{identity, keep_keys};
    use butterfly_common::EdgeId;

    #[test]
    fn zoom_is_validated() {
        assert!(RoutingNetwork::new(14).is_ok());
        assert!(matches!(
            RoutingNetwork::new(17),
            Err(Error::InvalidZoom { zoom: 17, .. })
        ));
    }

    #[test]
    fn counts_skip_mirror_records() {
        let network = RoutingNetwork::new(14).unwrap();
        let mut mutator = network.mutate();
        // a and c share a tile, b is in the tile east of it
        let a = mutator.add_vertex(Location::new(4.34, 50.85));
        let b = mutator.add_vertex(Location::new(4.36, 50.85));
        let c = mutator.add_vertex(Location::new(4.3401, 50.8501));
        assert_ne!(a.tile_id, b.tile_id);

        mutator.add_edge(a, b, &[], &[]).unwrap();
        mutator.add_edge(a, c, &[], &[]).unwrap();
        let network = mutator.commit();

        assert_eq!(network.vertex_count(), 3);
        assert_eq!(network.edge_count(), 2);
        assert_eq!(network.tile_count(), 2);
        assert_eq!(network.location(c), Some(Location::new(4.3401, 50.8501)));
        assert_eq!(network.location(VertexId::new(a.tile_id, 9)), None);
    }

    #[test]
    fn network_survives_a_write_read_cycle() {
        let network = RoutingNetwork::new(14).unwrap();
        let mut mutator = network.mutate();
        mutator.set_edge_type_map(keep_keys(["highway"]));
        let a = mutator.add_vertex(Location::new(4.35, 50.85));
        let b = mutator.add_vertex(Location::new(4.351, 50.85));
        let tags = vec![("highway".to_string(), "primary".to_string())];
        let e = mutator.add_edge(a, b, &[], &tags).unwrap();
        let network = mutator.commit();

        let mut buf = Vec::new();
        network.write_to(&mut buf).unwrap();
        let back =
            RoutingNetwork::read_from(&mut buf.as_slice(), keep_keys(["highway"]), identity())
                .unwrap();

        assert_eq!(back.id(), network.id());
        assert_eq!(back.zoom(), 14);
        assert_eq!(back.edge_type_index().version(), 1);
        assert_eq!(back.edge_type_index().count(), network.edge_type_index().count());
        assert_eq!(back.tile(a.tile_id).map(|t| t.as_ref()), network.tile(a.tile_id).map(|t| t.as_ref()));

        let mut enumerator = back.edge_enumerator();
        assert!(enumerator.move_to_edge(e, true));
        assert_eq!(enumerator.to(), b);
        assert_ne!(e, EdgeId::EMPTY);
    }

    #[test]
    fn corrupted_network_is_rejected() {
        let network = RoutingNetwork::new(14).unwrap();
        let mut mutator = network.mutate();
        mutator.add_vertex(Location::new(4.35, 50.85));
        let network = mutator.commit();

        let mut buf = Vec::new();
        network.write_to(&mut buf).unwrap();
        // inside the GUID, not covered by any tile checksum
        buf[8] ^= 0x01;
        assert!(RoutingNetwork::read_from(&mut buf.as_slice(), identity(), identity()).is_err());
    }
}
