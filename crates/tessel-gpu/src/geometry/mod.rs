//! Vertex/index buffers and the attribute layout that reads them.

mod error;
mod geometry;
mod layout;

pub use error::GeometryError;
pub use geometry::{DrawMode, Geometry};
pub use layout::{AttributeLayout, MAX_STRIDE, MAX_VERTEX_ATTRIBUTES, VertexAttribute};
