//! Tiled routing network for butterfly-osm
//!
//! The network is split into fixed-zoom Web Mercator tiles. Each tile stores
//! its vertices, the edges touching them and their turn-cost tables. Readers
//! work on immutable [`RoutingNetwork`] snapshots through a
//! [`RoutingNetworkEdgeEnumerator`]; writers go through a copy-on-write
//! [`NetworkMutator`], usually obtained from a [`RouterDb`].
//!
//! On top of the network sit spatial search and snapping ([`search`]), cost
//! functions built from routing profiles ([`cost`], [`profile`]) and
//! vertex-based and edge-based Dijkstra searches producing a [`Path`].

pub mod config;
pub mod cost;
pub mod dijkstra;
pub mod enumerator;
pub mod network;
pub mod path;
pub mod profile;
pub mod router_db;
pub mod search;
pub mod tile;
pub mod tiles;
pub mod type_index;

pub use config::RoutingConfig;
pub use cost::{CostFunction, Costs};
pub use dijkstra::{EdgeBasedDijkstra, VertexDijkstra};
pub use enumerator::RoutingNetworkEdgeEnumerator;
pub use network::{NetworkMutator, RoutingNetwork};
pub use path::Path;
pub use profile::{CarProfile, EdgeFactor, Profile, TurnCostFactor};
pub use router_db::{RouterDb, RouterDbMutator};
pub use search::SnapPoint;
pub use tile::NetworkTile;
pub use tiles::{Tile, TileRange};
pub use type_index::{Attribute, GroupingFunction};

pub use butterfly_common::{BoundingBox, EdgeId, Error, Location, Result, VertexId};
