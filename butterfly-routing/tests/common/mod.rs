#![allow(dead_code)]

use butterfly_routing::{Attribute, EdgeId, Location, NetworkMutator, VertexId};
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once per test binary, filtered by
/// `RUST_LOG`.
pub fn try_init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn tags(pairs: &[(&str, &str)]) -> Vec<Attribute> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Small street grid around Brussels' Grand-Place, three columns wide and
/// two rows high, 0.001 degrees apart. Returns the vertices row by row and
/// the edges, horizontal ones first.
pub struct Grid {
    pub vertices: Vec<VertexId>,
    pub horizontal: Vec<EdgeId>,
    pub vertical: Vec<EdgeId>,
}

pub fn grid(mutator: &mut NetworkMutator, origin: Location) -> Grid {
    let road = tags(&[("highway", "residential")]);
    let mut vertices = Vec::new();
    for row in 0..2 {
        for column in 0..3 {
            vertices.push(mutator.add_vertex(Location::new(
                origin.lon + 0.001 * column as f64,
                origin.lat + 0.001 * row as f64,
            )));
        }
    }

    let mut horizontal = Vec::new();
    for row in 0..2 {
        for column in 0..2 {
            let from = vertices[row * 3 + column];
            let to = vertices[row * 3 + column + 1];
            horizontal.push(mutator.add_edge(from, to, &[], &road).unwrap());
        }
    }
    let mut vertical = Vec::new();
    for column in 0..3 {
        vertical.push(mutator.add_edge(vertices[column], vertices[3 + column], &[], &road).unwrap());
    }

    Grid {
        vertices,
        horizontal,
        vertical,
    }
}
