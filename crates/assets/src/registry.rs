use std::path::{Path, PathBuf};

use glam::Vec3;
use image::GenericImageView;
use serde::{Deserialize, Serialize};

use crate::backend::{PixelLayout, SamplerConfig, TextureBackend, TextureHandle, TextureUpload};

/// Texture units available to the binding stage.
pub const MAX_TEXTURE_SLOTS: usize = 16;

/// Slot reported for a tag that is not registered. Uploaded verbatim to the
/// shader, where it means "no texture bound".
pub const NO_TEXTURE_SLOT: i32 = -1;

/// Errors from loading a texture into the registry.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    /// The file could not be read at all. Together with [`Self::ImageDecode`]
    /// this covers every way a path fails to yield an image; the split keeps
    /// the OS error apart from the codec error.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode image for '{tag}': {source}")]
    ImageDecode {
        tag: String,
        #[source]
        source: image::ImageError,
    },
    #[error("image for '{tag}' has {channels} channels, only RGB and RGBA are supported")]
    UnsupportedChannelLayout { tag: String, channels: u8 },
    #[error("texture registry is full ({capacity} slots), cannot load '{tag}'")]
    RegistryFull { tag: String, capacity: usize },
    #[error("texture tag '{0}' is already registered")]
    DuplicateTag(String),
}

/// Errors from material lookup.
#[derive(Debug, thiserror::Error)]
pub enum MaterialError {
    #[error("no materials defined, cannot resolve '{0}'")]
    MaterialNotFound(String),
}

/// A loaded texture and the tag it was registered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureEntry {
    pub tag: String,
    pub handle: TextureHandle,
}

/// Surface properties uploaded alongside a draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub tag: String,
    pub diffuse_color: Vec3,
    pub specular_color: Vec3,
    pub shininess: f32,
}

impl MaterialEntry {
    pub fn new(tag: &str, diffuse_color: Vec3, specular_color: Vec3, shininess: f32) -> Self {
        Self {
            tag: tag.to_string(),
            diffuse_color,
            specular_color,
            shininess,
        }
    }

    /// All-zero material with an empty tag.
    pub fn zeroed() -> Self {
        Self {
            tag: String::new(),
            diffuse_color: Vec3::ZERO,
            specular_color: Vec3::ZERO,
            shininess: 0.0,
        }
    }
}

/// Pixels decoded from an image file, narrowed to 8 bits per channel.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Decode encoded image bytes. Only 3- and 4-channel images are accepted.
    pub fn decode(bytes: &[u8], tag: &str) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes).map_err(|source| TextureError::ImageDecode {
            tag: tag.to_string(),
            source,
        })?;
        let channels = img.color().channel_count();
        let layout = PixelLayout::from_channels(channels).ok_or_else(|| {
            TextureError::UnsupportedChannelLayout {
                tag: tag.to_string(),
                channels,
            }
        })?;
        let (width, height) = img.dimensions();
        let pixels = match layout {
            PixelLayout::Rgb8 => img.to_rgb8().into_raw(),
            PixelLayout::Rgba8 => img.to_rgba8().into_raw(),
        };
        Ok(Self {
            width,
            height,
            layout,
            pixels,
        })
    }
}

/// Owns every tagged texture and material in the scene.
///
/// Textures live in at most [`MAX_TEXTURE_SLOTS`] slots; slot *i* is bound to
/// texture unit *i*. Materials are an unbounded list where duplicate tags are
/// allowed and the first registered wins on lookup.
///
/// GPU work is delegated to a [`TextureBackend`] passed into each call, so the
/// registry itself holds no graphics context.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    textures: Vec<TextureEntry>,
    materials: Vec<MaterialEntry>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an image file and register it under `tag`. Returns the slot.
    pub fn load_texture<B: TextureBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        path: impl AsRef<Path>,
        tag: &str,
    ) -> Result<usize, TextureError> {
        let path = path.as_ref();
        let result = self.check_slot_available(tag).and_then(|()| {
            let bytes = std::fs::read(path).map_err(|source| TextureError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            self.register_decoded(backend, &bytes, tag)
        });
        if let Err(e) = &result {
            tracing::warn!(path = %path.display(), tag, "texture load failed: {e}");
        }
        result
    }

    /// Register a texture from encoded image bytes already in memory.
    pub fn load_texture_bytes<B: TextureBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        bytes: &[u8],
        tag: &str,
    ) -> Result<usize, TextureError> {
        let result = self
            .check_slot_available(tag)
            .and_then(|()| self.register_decoded(backend, bytes, tag));
        if let Err(e) = &result {
            tracing::warn!(tag, "texture load failed: {e}");
        }
        result
    }

    fn check_slot_available(&self, tag: &str) -> Result<(), TextureError> {
        if self.is_full() {
            return Err(TextureError::RegistryFull {
                tag: tag.to_string(),
                capacity: MAX_TEXTURE_SLOTS,
            });
        }
        if self.texture_slot(tag).is_some() {
            return Err(TextureError::DuplicateTag(tag.to_string()));
        }
        Ok(())
    }

    fn register_decoded<B: TextureBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        bytes: &[u8],
        tag: &str,
    ) -> Result<usize, TextureError> {
        let image = DecodedImage::decode(bytes, tag)?;
        let handle = backend.create_texture(&TextureUpload {
            label: tag,
            width: image.width,
            height: image.height,
            layout: image.layout,
            pixels: &image.pixels,
            sampler: SamplerConfig::default(),
        });
        let slot = self.textures.len();
        self.textures.push(TextureEntry {
            tag: tag.to_string(),
            handle,
        });
        tracing::info!(
            tag,
            slot,
            width = image.width,
            height = image.height,
            layout = ?image.layout,
            "texture registered"
        );
        Ok(slot)
    }

    /// Bind every registered texture to the unit matching its slot.
    pub fn bind_all<B: TextureBackend + ?Sized>(&self, backend: &mut B) {
        for (unit, entry) in self.textures.iter().enumerate() {
            backend.bind_texture(unit as u32, entry.handle);
        }
        tracing::debug!(count = self.textures.len(), "textures bound");
    }

    /// Slot of the first texture registered under `tag`, or [`NO_TEXTURE_SLOT`].
    pub fn find_texture_slot(&self, tag: &str) -> i32 {
        self.texture_slot(tag)
            .map_or(NO_TEXTURE_SLOT, |slot| slot as i32)
    }

    pub fn texture_slot(&self, tag: &str) -> Option<usize> {
        self.textures.iter().position(|t| t.tag == tag)
    }

    /// Append a material. Duplicate tags are accepted.
    pub fn define_material(&mut self, material: MaterialEntry) {
        self.materials.push(material);
    }

    /// Resolve a material by tag, first registered wins.
    ///
    /// Fails only when no materials are defined at all. When materials exist
    /// but none matches, a zeroed material is returned instead of an error;
    /// callers that need to tell the two apart should use [`Self::material`].
    pub fn find_material(&self, tag: &str) -> Result<MaterialEntry, MaterialError> {
        if self.materials.is_empty() {
            return Err(MaterialError::MaterialNotFound(tag.to_string()));
        }
        Ok(self.material(tag).cloned().unwrap_or_else(MaterialEntry::zeroed))
    }

    pub fn material(&self, tag: &str) -> Option<&MaterialEntry> {
        self.materials.iter().find(|m| m.tag == tag)
    }

    /// Release every texture handle. Safe to call repeatedly.
    pub fn destroy_all<B: TextureBackend + ?Sized>(&mut self, backend: &mut B) {
        let count = self.textures.len();
        for entry in self.textures.drain(..) {
            backend.delete_texture(entry.handle);
        }
        if count > 0 {
            tracing::info!(count, "textures destroyed");
        }
    }

    pub fn textures(&self) -> &[TextureEntry] {
        &self.textures
    }

    pub fn materials(&self) -> &[MaterialEntry] {
        &self.materials
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn is_full(&self) -> bool {
        self.textures.len() >= MAX_TEXTURE_SLOTS
    }
}
