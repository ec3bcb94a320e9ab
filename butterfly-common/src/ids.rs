//! Tile-scoped identifiers for vertices and edges

use serde::{Deserialize, Serialize};
use std::fmt;

/// A vertex, identified by the tile that stores it and its index in that tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId {
    pub tile_id: u32,
    pub local_id: u32,
}

impl VertexId {
    /// Sentinel for "no vertex".
    pub const EMPTY: VertexId = VertexId {
        tile_id: u32::MAX,
        local_id: u32::MAX,
    };

    pub const fn new(tile_id: u32, local_id: u32) -> Self {
        Self { tile_id, local_id }
    }

    pub const fn is_empty(&self) -> bool {
        self.local_id == u32::MAX
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tile_id, self.local_id)
    }
}

/// An edge, identified by the tile holding its canonical record and its
/// position in that tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId {
    pub tile_id: u32,
    pub local_id: u32,
}

impl EdgeId {
    /// Sentinel for "no edge".
    pub const EMPTY: EdgeId = EdgeId {
        tile_id: u32::MAX,
        local_id: u32::MAX,
    };

    pub const fn new(tile_id: u32, local_id: u32) -> Self {
        Self { tile_id, local_id }
    }

    pub const fn is_empty(&self) -> bool {
        self.local_id == u32::MAX
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tile_id, self.local_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sentinels() {
        assert!(VertexId::EMPTY.is_empty());
        assert!(EdgeId::EMPTY.is_empty());
        assert!(!VertexId::new(0, 0).is_empty());
        assert!(!EdgeId::new(12, 4).is_empty());
    }

    #[test]
    fn ids_serialize_as_plain_pairs() {
        let json = serde_json::to_string(&VertexId::new(5, 9)).unwrap();
        assert_eq!(json, r#"{"tile_id":5,"local_id":9}"#);
        let back: VertexId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, VertexId::new(5, 9));
    }
}
