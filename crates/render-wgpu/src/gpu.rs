use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroU64;

use tableau_assets::{MAX_TEXTURE_SLOTS, TextureBackend, TextureHandle, TextureUpload};
use tableau_common::{MeshHandle, Primitive};
use tableau_render::{MeshDrawer, MeshTable, ShaderUniforms, UniformValue};
use wgpu::util::DeviceExt;

use crate::meshes::{self, Vertex};
use crate::shaders;
use crate::textures::{self, GpuTexture};
use crate::uniforms::{Applied, FrameUniforms, OBJECT_STRIDE, ObjectUniforms, UniformState};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const INITIAL_DRAW_CAPACITY: u64 = 64;

/// One queued draw: the mesh plus the uniform state it was issued with.
#[derive(Debug, Clone, Copy)]
struct DrawRecord {
    mesh: MeshHandle,
    object: ObjectUniforms,
    /// Texture resolved from the unit table at draw time, `None` for the fallback.
    texture: Option<TextureHandle>,
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// Errors raised while bringing up the GPU backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("failed to create the fallback texture")]
    FallbackTexture,
}

/// wgpu implementation of the texture, uniform and mesh traits.
///
/// Uniform writes update a CPU-side [`UniformState`]; each `draw_mesh`
/// snapshots the object block into a [`DrawRecord`]. [`Self::render`] uploads
/// the frame block once, every record at a 256-byte dynamic offset, and
/// replays the records in a single pass.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    object_capacity: u64,
    texture_layout: wgpu::BindGroupLayout,
    textures: BTreeMap<TextureHandle, GpuTexture>,
    next_texture: u64,
    units: [Option<TextureHandle>; MAX_TEXTURE_SLOTS],
    fallback: GpuTexture,
    meshes: Vec<GpuMesh>,
    mesh_table: MeshTable,
    state: UniformState,
    draws: Vec<DrawRecord>,
    warned: BTreeSet<String>,
    depth: wgpu::TextureView,
}

impl WgpuBackend {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, BackendError> {
        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ObjectUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });
        let (object_buffer, object_bind_group) =
            Self::create_object_buffer(&device, &object_layout, INITIAL_DRAW_CAPACITY);

        let texture_layout = GpuTexture::bind_group_layout(&device);
        let fallback = GpuTexture::white(&device, &queue, &texture_layout)
            .ok_or(BackendError::FallbackTexture)?;

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &object_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                        2 => Float32x2,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let mut meshes = Vec::with_capacity(Primitive::ALL.len());
        let mut mesh_table = MeshTable::new();
        for primitive in Primitive::ALL {
            let data = meshes::build(primitive);
            let label = format!("{primitive:?}");
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&label),
                contents: bytemuck::cast_slice(&data.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&label),
                contents: bytemuck::cast_slice(&data.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            mesh_table.insert(primitive, MeshHandle(meshes.len() as u32));
            meshes.push(GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count: data.indices.len() as u32,
            });
        }

        let depth = Self::create_depth_texture(&device, width, height);

        tracing::info!(meshes = meshes.len(), ?surface_format, "wgpu backend ready");

        Ok(Self {
            device,
            queue,
            pipeline,
            frame_buffer,
            frame_bind_group,
            object_layout,
            object_buffer,
            object_bind_group,
            object_capacity: INITIAL_DRAW_CAPACITY,
            texture_layout,
            textures: BTreeMap::new(),
            next_texture: 0,
            units: [None; MAX_TEXTURE_SLOTS],
            fallback,
            meshes,
            mesh_table,
            state: UniformState::default(),
            draws: Vec::new(),
            warned: BTreeSet::new(),
            depth,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Handles for the built-in primitives, for the compositor.
    pub fn mesh_table(&self) -> MeshTable {
        self.mesh_table.clone()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.depth = Self::create_depth_texture(&self.device, width, height);
    }

    /// Submit every draw recorded since the last call into `view`.
    pub fn render(&mut self, view: &wgpu::TextureView) {
        self.queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&self.state.frame),
        );

        let count = self.draws.len() as u64;
        if count > self.object_capacity {
            let capacity = count.next_power_of_two();
            let (buffer, bind_group) =
                Self::create_object_buffer(&self.device, &self.object_layout, capacity);
            self.object_buffer = buffer;
            self.object_bind_group = bind_group;
            self.object_capacity = capacity;
            tracing::debug!(capacity, "object uniform buffer grown");
        }
        for (i, record) in self.draws.iter().enumerate() {
            self.queue.write_buffer(
                &self.object_buffer,
                i as u64 * OBJECT_STRIDE,
                bytemuck::bytes_of(&record.object),
            );
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            for (i, record) in self.draws.iter().enumerate() {
                let Some(mesh) = self.meshes.get(record.mesh.0 as usize) else {
                    continue;
                };
                let texture = record
                    .texture
                    .and_then(|h| self.textures.get(&h))
                    .unwrap_or(&self.fallback);
                let offset = (i as u64 * OBJECT_STRIDE) as u32;
                pass.set_bind_group(1, &self.object_bind_group, &[offset]);
                pass.set_bind_group(2, &texture.bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        self.draws.clear();
    }

    fn create_object_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("object_uniforms"),
            size: capacity * OBJECT_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<ObjectUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

/// Texture `object` samples, if any. A negative or out-of-range unit never
/// falls back to unit 0.
fn resolve_unit(units: &[Option<TextureHandle>], object: &ObjectUniforms) -> Option<TextureHandle> {
    if !object.use_texture() {
        return None;
    }
    let unit = usize::try_from(object.texture_unit()).ok()?;
    units.get(unit).copied().flatten()
}

impl TextureBackend for WgpuBackend {
    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> TextureHandle {
        self.next_texture += 1;
        let handle = TextureHandle(self.next_texture);

        let Some(rgba) = textures::to_rgba(upload) else {
            tracing::warn!(
                label = upload.label,
                width = upload.width,
                height = upload.height,
                "pixel buffer does not match dimensions, texture left unbacked"
            );
            return handle;
        };
        let chain = textures::mip_chain(rgba, upload.sampler.generate_mipmaps);
        let levels = chain.len();
        match GpuTexture::create(
            &self.device,
            &self.queue,
            &self.texture_layout,
            upload.label,
            &chain,
            &upload.sampler,
        ) {
            Some(texture) => {
                tracing::debug!(label = upload.label, levels, handle = handle.0, "texture uploaded");
                self.textures.insert(handle, texture);
            }
            None => tracing::warn!(label = upload.label, "empty mip chain, texture left unbacked"),
        }
        handle
    }

    fn bind_texture(&mut self, unit: u32, handle: TextureHandle) {
        match self.units.get_mut(unit as usize) {
            Some(slot) => *slot = Some(handle),
            None => tracing::warn!(unit, "texture unit out of range"),
        }
    }

    fn delete_texture(&mut self, handle: TextureHandle) {
        if let Some(texture) = self.textures.remove(&handle) {
            texture.texture.destroy();
        }
        for unit in self.units.iter_mut().filter(|u| **u == Some(handle)) {
            *unit = None;
        }
    }
}

impl ShaderUniforms for WgpuBackend {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        if self.state.apply(name, value) == Applied::Ignored && self.warned.insert(name.to_string())
        {
            tracing::warn!(name, ?value, "uniform not in the shader contract, ignored");
        }
    }
}

impl MeshDrawer for WgpuBackend {
    fn draw_mesh(&mut self, mesh: MeshHandle) {
        let texture = resolve_unit(&self.units, &self.state.object);
        self.draws.push(DrawRecord {
            mesh,
            object: self.state.object,
            texture,
        });
    }
}
