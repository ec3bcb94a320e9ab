//! Error types for the butterfly routing network
//!
//! Precondition violations (unknown vertices or edges, malformed turn tables,
//! broken path continuity) are reported as errors. The absence of a result,
//! like no route between two points, is never an error and is represented
//! with `Option` by the callers.

use thiserror::Error;

use crate::ids::{EdgeId, VertexId};

/// Errors raised by the network, its codecs and its searches.
#[derive(Error, Debug)]
pub enum Error {
    /// The vertex does not exist in the network or tile it was looked up in.
    #[error("vertex {0} not found")]
    VertexNotFound(VertexId),

    /// The edge does not exist in the network or tile it was looked up in.
    #[error("edge {0} not found")]
    EdgeNotFound(EdgeId),

    /// No tile is stored under this id.
    #[error("tile {0} not found")]
    TileNotFound(u32),

    /// Data built for one zoom level was used with another.
    #[error("zoom mismatch: expected zoom {expected}, found {found}")]
    ZoomMismatch { expected: u32, found: u32 },

    /// Zoom level outside of what tile ids can represent.
    #[error("invalid zoom level {zoom}, expected at most {max}")]
    InvalidZoom { zoom: u32, max: u32 },

    /// Tile ranges crossing the antimeridian cannot be enumerated.
    #[error("tile range crosses the antimeridian: left {left} > right {right}")]
    AntimeridianRange { left: f64, right: f64 },

    /// Turn cost prefixes are only supported on a from/to pair of edges.
    #[error("turn cost prefix edges require exactly 2 edges in the turn table, got {edges}")]
    UnsupportedTurnCostPrefix { edges: usize },

    /// A vertex ran out of turn order slots.
    #[error("vertex {vertex} has no free turn order slot left (max {max})")]
    TooManyTurnOrders { vertex: VertexId, max: usize },

    /// The cost matrix does not match the number of edges.
    #[error("invalid turn cost matrix: expected {expected} cells, found {found}")]
    InvalidTurnCostMatrix { expected: usize, found: usize },

    /// An edge appended or prepended to a path does not connect to it.
    #[error("edge {edge} does not continue the path: expected vertex {expected}, found {found}")]
    PathDiscontinuity {
        edge: EdgeId,
        expected: VertexId,
        found: VertexId,
    },

    /// A second mutator was requested while one is still open.
    #[error("a network mutator is already open")]
    MutatorAlreadyOpen,

    /// Binary data could not be decoded.
    #[error("format error: {0}")]
    Format(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error during read/write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for network operations.
pub type Result<T> = std::result::Result<T, Error>;
