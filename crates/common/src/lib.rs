//! Shared value types for the tableau renderer.
//!
//! Everything here is plain data: no GPU handles, no behavior beyond
//! constructors. The registry, camera and compositor crates all speak in
//! these types so scene manifests can be serialized without pulling in a
//! backend.

mod types;

pub use types::{
    DrawCommand, MAX_POINT_LIGHTS, MeshHandle, PointLight, Primitive, ProjectionMode, Surface,
    TransformParams,
};
