//! Backend-agnostic binding core.
//!
//! Turns registry contents, camera state and a draw list into named uniform
//! uploads and mesh draws. Everything GPU-facing goes through
//! [`ShaderUniforms`], [`MeshDrawer`] and [`tableau_assets::TextureBackend`].
//!
//! # Invariants
//! - Model matrices are always `T * Rz * Ry * Rx * S`.
//! - A draw whose material does not resolve leaves the previous material
//!   uniforms in place.
//! - Held projection actions are evaluated perspective first, orthographic last.

pub mod camera;
pub mod compositor;
pub mod lights;
pub mod recording;
pub mod transform;
pub mod uniforms;

pub use camera::{CameraConfig, CameraController, CameraSignal, ViewProjection};
pub use compositor::{CompositorError, FrameStats, LookupMode, MeshTable, SceneCompositor};
pub use lights::{set_lighting_enabled, upload_lights};
pub use recording::{RecordedCall, RecordingBackend};
pub use transform::{compose, compose_params};
pub use uniforms::{MeshDrawer, ShaderUniforms, UniformValue};
