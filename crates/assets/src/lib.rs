//! Texture and material registries plus the scene manifest format.
//!
//! The renderer consumes textures by slot and materials by tag, never by raw
//! file paths. Image decoding happens here; allocation and binding are handed
//! to a [`TextureBackend`].
//!
//! # Invariants
//! - Texture slot *i* is the *i*-th successful load and binds to unit *i*.
//! - At most [`MAX_TEXTURE_SLOTS`] textures are registered.
//! - Material lookup is first-match-wins in definition order.

mod backend;
pub mod manifest;
mod registry;

pub use backend::{
    FilterMode, PixelLayout, SamplerConfig, TextureBackend, TextureHandle, TextureUpload, WrapMode,
};
pub use manifest::{ManifestError, ManifestReport, SceneManifest, TextureSource};
pub use registry::{
    DecodedImage, MAX_TEXTURE_SLOTS, MaterialEntry, MaterialError, NO_TEXTURE_SLOT,
    ResourceRegistry, TextureEntry, TextureError,
};
