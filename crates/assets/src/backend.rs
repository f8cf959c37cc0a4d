//! The GPU side of texture management, as seen by the registry.

/// Opaque texture id handed out by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

/// 8-bit-per-channel pixel layouts accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Rgb8,
    Rgba8,
}

impl PixelLayout {
    pub fn from_channels(channels: u8) -> Option<Self> {
        match channels {
            3 => Some(Self::Rgb8),
            4 => Some(Self::Rgba8),
            _ => None,
        }
    }

    pub fn channels(self) -> u8 {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    ClampToEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Linear,
    Nearest,
}

/// Sampling state configured when a texture is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub generate_mipmaps: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            wrap_u: WrapMode::Repeat,
            wrap_v: WrapMode::Repeat,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            generate_mipmaps: true,
        }
    }
}

/// Decoded pixels plus everything a backend needs to allocate the texture.
#[derive(Debug, Clone, Copy)]
pub struct TextureUpload<'a> {
    pub label: &'a str,
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    /// Tightly packed rows, `width * height * layout.channels()` bytes.
    pub pixels: &'a [u8],
    pub sampler: SamplerConfig,
}

/// Texture operations the registry delegates to the graphics API.
///
/// Units are the binding points the shader samples from; the registry
/// assigns them by insertion order.
pub trait TextureBackend {
    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> TextureHandle;

    fn bind_texture(&mut self, unit: u32, handle: TextureHandle);

    fn delete_texture(&mut self, handle: TextureHandle);
}
