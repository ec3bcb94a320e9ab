use butterfly_common::{EdgeId, VertexId};

use super::SearchMode;

/// Settles (arriving edge, vertex) pairs, so a vertex can be passed again
/// over another edge when a turn restriction makes that cheaper.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeBased;

impl SearchMode for EdgeBased {
    type Key = (EdgeId, VertexId);

    const TURN_COSTS: bool = true;

    fn key(edge: EdgeId, vertex: VertexId) -> (EdgeId, VertexId) {
        (edge, vertex)
    }
}
