//! Common identifiers, geometry and errors for the butterfly routing network

pub mod error;
pub mod ids;
pub mod location;

pub use error::{Error, Result};
pub use ids::{EdgeId, VertexId};
pub use location::{BoundingBox, Location};
