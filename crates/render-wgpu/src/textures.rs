use image::RgbaImage;
use image::imageops::{self, FilterType};
use tableau_assets::{FilterMode, PixelLayout, SamplerConfig, TextureUpload, WrapMode};

/// Texture format for every uploaded image. Sources are color data.
pub const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Number of levels in a full mip chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    let max_dimension = width.max(height).max(1);
    u32::BITS - max_dimension.leading_zeros()
}

/// Widen upload pixels to RGBA8. wgpu has no three-channel 8-bit format.
///
/// Returns `None` when the pixel buffer does not match the declared size.
pub fn to_rgba(upload: &TextureUpload<'_>) -> Option<RgbaImage> {
    let (w, h) = (upload.width, upload.height);
    match upload.layout {
        PixelLayout::Rgba8 => RgbaImage::from_raw(w, h, upload.pixels.to_vec()),
        PixelLayout::Rgb8 => {
            let rgb = image::RgbImage::from_raw(w, h, upload.pixels.to_vec())?;
            Some(image::DynamicImage::ImageRgb8(rgb).to_rgba8())
        }
    }
}

/// Level 0 followed by successively halved levels, each built from the one before.
pub fn mip_chain(base: RgbaImage, generate: bool) -> Vec<RgbaImage> {
    let levels = if generate {
        mip_level_count(base.width(), base.height())
    } else {
        1
    };
    let mut chain = Vec::with_capacity(levels as usize);
    chain.push(base);
    for _ in 1..levels {
        let Some(prev) = chain.last() else { break };
        let (w, h) = ((prev.width() / 2).max(1), (prev.height() / 2).max(1));
        let next = imageops::resize(prev, w, h, FilterType::Triangle);
        chain.push(next);
    }
    chain
}

fn address_mode(wrap: WrapMode) -> wgpu::AddressMode {
    match wrap {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
    }
}

fn filter_mode(filter: FilterMode) -> wgpu::FilterMode {
    match filter {
        FilterMode::Linear => wgpu::FilterMode::Linear,
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
    }
}

pub fn sampler_descriptor(config: &SamplerConfig) -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        label: Some("texture_sampler"),
        address_mode_u: address_mode(config.wrap_u),
        address_mode_v: address_mode(config.wrap_v),
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: filter_mode(config.mag_filter),
        min_filter: filter_mode(config.min_filter),
        mipmap_filter: if config.generate_mipmaps {
            wgpu::FilterMode::Linear
        } else {
            wgpu::FilterMode::Nearest
        },
        ..Default::default()
    }
}

/// A texture resident on the GPU, ready to bind in group 2.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub bind_group: wgpu::BindGroup,
}

impl GpuTexture {
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    /// Upload `chain` (level 0 first) and build its bind group.
    pub fn create(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        chain: &[RgbaImage],
        sampler: &SamplerConfig,
    ) -> Option<Self> {
        let base = chain.first()?;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: base.width(),
                height: base.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: chain.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, image) in chain.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                image.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * image.width()),
                    rows_per_image: Some(image.height()),
                },
                wgpu::Extent3d {
                    width: image.width(),
                    height: image.height(),
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&sampler_descriptor(sampler));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        Some(Self {
            texture,
            bind_group,
        })
    }

    /// 1x1 opaque white, sampled when no texture is bound.
    pub fn white(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
    ) -> Option<Self> {
        let pixel = RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        let sampler = SamplerConfig {
            generate_mipmaps: false,
            ..SamplerConfig::default()
        };
        Self::create(device, queue, layout, "fallback_white", &[pixel], &sampler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload<'a>(layout: PixelLayout, pixels: &'a [u8], w: u32, h: u32) -> TextureUpload<'a> {
        TextureUpload {
            label: "t",
            width: w,
            height: h,
            layout,
            pixels,
            sampler: SamplerConfig::default(),
        }
    }

    #[test]
    fn mip_counts() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 2), 2);
        assert_eq!(mip_level_count(256, 64), 9);
        assert_eq!(mip_level_count(300, 10), 9);
        assert_eq!(mip_level_count(0, 0), 1);
    }

    #[test]
    fn rgb_is_widened_with_opaque_alpha() {
        let pixels = [10, 20, 30, 40, 50, 60];
        let rgba = to_rgba(&upload(PixelLayout::Rgb8, &pixels, 2, 1)).unwrap();
        assert_eq!(rgba.as_raw(), &vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn short_buffers_are_rejected() {
        let pixels = [0u8; 5];
        assert!(to_rgba(&upload(PixelLayout::Rgb8, &pixels, 2, 1)).is_none());
        assert!(to_rgba(&upload(PixelLayout::Rgba8, &pixels, 2, 1)).is_none());
    }

    #[test]
    fn chain_halves_to_one_pixel() {
        let base = RgbaImage::from_pixel(8, 2, image::Rgba([100, 150, 200, 255]));
        let chain = mip_chain(base, true);
        let sizes: Vec<(u32, u32)> = chain.iter().map(|i| i.dimensions()).collect();
        assert_eq!(sizes, [(8, 2), (4, 1), (2, 1), (1, 1)]);
        // a flat color stays flat
        assert_eq!(chain[3].get_pixel(0, 0), &image::Rgba([100, 150, 200, 255]));
    }

    #[test]
    fn chain_without_mipmaps_is_just_the_base() {
        let base = RgbaImage::new(4, 4);
        assert_eq!(mip_chain(base, false).len(), 1);
    }

    #[test]
    fn sampler_follows_config() {
        let desc = sampler_descriptor(&SamplerConfig::default());
        assert_eq!(desc.address_mode_u, wgpu::AddressMode::Repeat);
        assert_eq!(desc.min_filter, wgpu::FilterMode::Linear);
        assert_eq!(desc.mipmap_filter, wgpu::FilterMode::Linear);

        let clamped = sampler_descriptor(&SamplerConfig {
            wrap_u: WrapMode::ClampToEdge,
            mag_filter: FilterMode::Nearest,
            ..SamplerConfig::default()
        });
        assert_eq!(clamped.address_mode_u, wgpu::AddressMode::ClampToEdge);
        assert_eq!(clamped.mag_filter, wgpu::FilterMode::Nearest);
    }
}
