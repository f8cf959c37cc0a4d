//! wgpu backend for the tableau renderer.
//!
//! Implements the texture, uniform and mesh traits on top of one Phong
//! pipeline. Uniform names are mapped onto two Pod blocks; textures are
//! uploaded as sRGB RGBA8 with a CPU-built mip chain.
//!
//! # Invariants
//! - Texture units follow the registry's slot order, 16 at most.
//! - A draw whose unit is negative or unbound samples a 1x1 white texture.
//! - Uniform state set before a `draw_mesh` is what that draw renders with.

mod gpu;
pub mod meshes;
mod shaders;
pub mod textures;
pub mod uniforms;

pub use gpu::{BackendError, WgpuBackend};
pub use shaders::SCENE_SHADER;
