use std::collections::BTreeMap;

use glam::Vec3;
use tableau_assets::{MaterialEntry, ResourceRegistry, TextureBackend};
use tableau_common::{DrawCommand, MeshHandle, Primitive, Surface};

use crate::camera::ViewProjection;
use crate::transform::compose_params;
use crate::uniforms::{self, MeshDrawer, ShaderUniforms, UniformValue};

/// How the compositor treats tags that resolve to nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LookupMode {
    /// Unknown textures upload slot -1 and unknown materials leave the
    /// previous material uniforms in effect.
    #[default]
    Compatible,
    /// Unknown tags fail the draw before anything is uploaded.
    Strict,
}

#[derive(Debug, thiserror::Error)]
pub enum CompositorError {
    #[error("draw issued outside begin_frame/end_frame")]
    FrameNotStarted,
    #[error("texture '{0}' is not registered")]
    TextureNotFound(String),
    #[error("material '{0}' is not defined")]
    MaterialNotFound(String),
    #[error("no mesh loaded for {0:?}")]
    MeshNotLoaded(Primitive),
}

/// Counters for one frame, returned by [`SceneCompositor::end_frame`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draws: usize,
    pub texture_misses: usize,
    pub material_misses: usize,
}

/// Backend mesh handle for each primitive the scene may draw.
#[derive(Debug, Clone, Default)]
pub struct MeshTable {
    meshes: BTreeMap<Primitive, MeshHandle>,
}

impl MeshTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, primitive: Primitive, handle: MeshHandle) {
        self.meshes.insert(primitive, handle);
    }

    pub fn get(&self, primitive: Primitive) -> Option<MeshHandle> {
        self.meshes.get(&primitive).copied()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

impl FromIterator<(Primitive, MeshHandle)> for MeshTable {
    fn from_iter<I: IntoIterator<Item = (Primitive, MeshHandle)>>(iter: I) -> Self {
        Self {
            meshes: iter.into_iter().collect(),
        }
    }
}

/// Resolved texture binding for one draw.
enum Shading {
    Texture { slot: i32 },
    Color(glam::Vec4),
}

/// Turns draw commands into uniform uploads and mesh draws.
///
/// Holds no textures or materials itself; each frame borrows the registry.
/// Material uniforms are only written when a material resolves, so a draw
/// without one inherits whatever the previous draw left behind.
#[derive(Debug, Clone)]
pub struct SceneCompositor {
    meshes: MeshTable,
    mode: LookupMode,
    frame: Option<FrameStats>,
    frame_index: u64,
}

impl SceneCompositor {
    pub fn new(meshes: MeshTable) -> Self {
        Self {
            meshes,
            mode: LookupMode::default(),
            frame: None,
            frame_index: 0,
        }
    }

    pub fn with_mode(mut self, mode: LookupMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn in_frame(&self) -> bool {
        self.frame.is_some()
    }

    /// Bind every registered texture to its unit and open a frame.
    ///
    /// Calling it again while a frame is open discards the open frame's stats.
    pub fn begin_frame<B: TextureBackend + ?Sized>(
        &mut self,
        registry: &ResourceRegistry,
        target: &mut B,
    ) {
        self.frame_index += 1;
        let _span = tracing::debug_span!("begin_frame", frame = self.frame_index).entered();
        if self.frame.is_some() {
            tracing::debug!("previous frame was never ended");
        }
        registry.bind_all(target);
        self.frame = Some(FrameStats::default());
    }

    pub fn set_view<T: ShaderUniforms + ?Sized>(
        &self,
        target: &mut T,
        view_projection: &ViewProjection,
        eye: Vec3,
    ) {
        target.set_uniform(uniforms::VIEW, UniformValue::Mat4(view_projection.view));
        target.set_uniform(
            uniforms::PROJECTION,
            UniformValue::Mat4(view_projection.projection),
        );
        target.set_uniform(uniforms::VIEW_POSITION, UniformValue::Vec3(eye));
    }

    /// Upload one command's uniforms and draw its mesh.
    ///
    /// Everything is resolved before the first upload, so a failing draw
    /// leaves the target untouched.
    pub fn draw<T: ShaderUniforms + MeshDrawer + ?Sized>(
        &mut self,
        registry: &ResourceRegistry,
        target: &mut T,
        command: &DrawCommand,
    ) -> Result<(), CompositorError> {
        let mode = self.mode;
        let stats = self.frame.as_mut().ok_or(CompositorError::FrameNotStarted)?;

        let mesh = self
            .meshes
            .get(command.mesh)
            .ok_or(CompositorError::MeshNotLoaded(command.mesh))?;

        let shading = match &command.surface {
            Surface::Texture(tag) => match (registry.texture_slot(tag), mode) {
                (Some(slot), _) => Shading::Texture { slot: slot as i32 },
                (None, LookupMode::Strict) => {
                    return Err(CompositorError::TextureNotFound(tag.clone()));
                }
                (None, LookupMode::Compatible) => {
                    tracing::debug!(tag = %tag, "texture miss, sampling slot -1");
                    Shading::Texture {
                        slot: registry.find_texture_slot(tag),
                    }
                }
            },
            Surface::Color(color) => Shading::Color(*color),
        };

        let material: Option<&MaterialEntry> = match &command.material {
            None => None,
            Some(tag) => match (registry.material(tag), mode) {
                (Some(found), _) => Some(found),
                (None, LookupMode::Strict) => {
                    return Err(CompositorError::MaterialNotFound(tag.clone()));
                }
                (None, LookupMode::Compatible) => {
                    tracing::debug!(tag = %tag, "material miss, keeping previous material");
                    stats.material_misses += 1;
                    None
                }
            },
        };

        target.set_uniform(
            uniforms::MODEL,
            UniformValue::Mat4(compose_params(&command.transform)),
        );
        match shading {
            Shading::Texture { slot } => {
                if slot < 0 {
                    stats.texture_misses += 1;
                }
                target.set_uniform(uniforms::USE_TEXTURE, UniformValue::Bool(true));
                target.set_uniform(uniforms::OBJECT_TEXTURE, UniformValue::Sampler(slot));
            }
            Shading::Color(color) => {
                target.set_uniform(uniforms::OBJECT_COLOR, UniformValue::Vec4(color));
                target.set_uniform(uniforms::USE_TEXTURE, UniformValue::Bool(false));
            }
        }
        if let Some(uv) = command.uv_scale {
            target.set_uniform(uniforms::UV_SCALE, UniformValue::Vec2(uv));
        }
        if let Some(material) = material {
            target.set_uniform(
                uniforms::MATERIAL_DIFFUSE,
                UniformValue::Vec3(material.diffuse_color),
            );
            target.set_uniform(
                uniforms::MATERIAL_SPECULAR,
                UniformValue::Vec3(material.specular_color),
            );
            target.set_uniform(
                uniforms::MATERIAL_SHININESS,
                UniformValue::Float(material.shininess),
            );
        }
        target.draw_mesh(mesh);
        stats.draws += 1;
        Ok(())
    }

    /// Draw a whole list in order, stopping at the first error.
    pub fn draw_all<T: ShaderUniforms + MeshDrawer + ?Sized>(
        &mut self,
        registry: &ResourceRegistry,
        target: &mut T,
        commands: &[DrawCommand],
    ) -> Result<(), CompositorError> {
        for command in commands {
            self.draw(registry, target, command)?;
        }
        Ok(())
    }

    /// Close the frame and hand back its counters.
    pub fn end_frame(&mut self) -> Result<FrameStats, CompositorError> {
        let stats = self.frame.take().ok_or(CompositorError::FrameNotStarted)?;
        tracing::debug!(
            frame = self.frame_index,
            draws = stats.draws,
            texture_misses = stats.texture_misses,
            material_misses = stats.material_misses,
            "frame ended"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraController;
    use crate::recording::{RecordedCall, RecordingBackend};
    use glam::{Mat4, Vec2, Vec4};
    use tableau_assets::NO_TEXTURE_SLOT;
    use tableau_common::TransformParams;

    fn png_bytes() -> Vec<u8> {
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::RgbImage::from_pixel(2, 2, image::Rgb([10, 20, 30]))
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    fn scene(gpu: &mut RecordingBackend) -> ResourceRegistry {
        let mut reg = ResourceRegistry::new();
        let png = png_bytes();
        reg.load_texture_bytes(gpu, &png, "wood").unwrap();
        reg.load_texture_bytes(gpu, &png, "tea").unwrap();
        reg.define_material(MaterialEntry::new(
            "Material1",
            Vec3::new(0.3, 0.3, 0.3),
            Vec3::splat(0.1),
            1.0,
        ));
        reg.define_material(MaterialEntry::new(
            "Material2",
            Vec3::new(0.8, 0.5, 0.2),
            Vec3::splat(0.6),
            32.0,
        ));
        reg
    }

    fn compositor() -> SceneCompositor {
        SceneCompositor::new(RecordingBackend::mesh_table())
    }

    fn textured(tag: &str) -> DrawCommand {
        DrawCommand::textured(Primitive::Box, TransformParams::default(), tag)
    }

    #[test]
    fn draw_outside_frame_fails() {
        let mut gpu = RecordingBackend::new();
        let reg = scene(&mut gpu);
        let mut comp = compositor();
        let err = comp.draw(&reg, &mut gpu, &textured("wood")).unwrap_err();
        assert!(matches!(err, CompositorError::FrameNotStarted));
        assert!(matches!(
            comp.end_frame(),
            Err(CompositorError::FrameNotStarted)
        ));
        assert_eq!(gpu.draw_count(), 0);
    }

    #[test]
    fn begin_frame_binds_in_slot_order() {
        let mut gpu = RecordingBackend::new();
        let reg = scene(&mut gpu);
        gpu.clear_calls();
        let mut comp = compositor();
        comp.begin_frame(&reg, &mut gpu);

        let binds: Vec<u32> = gpu
            .calls()
            .iter()
            .filter_map(|c| match c {
                RecordedCall::BindTexture { unit, .. } => Some(*unit),
                _ => None,
            })
            .collect();
        assert_eq!(binds, [0, 1]);
        assert_eq!(gpu.bound_unit(1), Some(reg.textures()[1].handle));
        assert!(comp.in_frame());
    }

    #[test]
    fn textured_draw_uploads_in_order() {
        let mut gpu = RecordingBackend::new();
        let reg = scene(&mut gpu);
        let mut comp = compositor();
        comp.begin_frame(&reg, &mut gpu);
        gpu.clear_calls();

        let transform = TransformParams::scaled_at(Vec3::splat(2.0), Vec3::new(1.0, 0.0, 0.0));
        let cmd = DrawCommand::textured(Primitive::Cylinder, transform, "tea")
            .with_uv_scale(2.0, 1.0)
            .with_material("Material2");
        comp.draw(&reg, &mut gpu, &cmd).unwrap();

        let names: Vec<&str> = gpu
            .calls()
            .iter()
            .filter_map(|c| match c {
                RecordedCall::SetUniform { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            names,
            [
                uniforms::MODEL,
                uniforms::USE_TEXTURE,
                uniforms::OBJECT_TEXTURE,
                uniforms::UV_SCALE,
                uniforms::MATERIAL_DIFFUSE,
                uniforms::MATERIAL_SPECULAR,
                uniforms::MATERIAL_SHININESS,
            ]
        );
        assert_eq!(
            gpu.calls().last(),
            Some(&RecordedCall::DrawMesh(MeshHandle(2)))
        );
        assert_eq!(
            gpu.uniform(uniforms::MODEL),
            Some(UniformValue::Mat4(compose_params(&transform)))
        );
        assert_eq!(
            gpu.uniform(uniforms::OBJECT_TEXTURE),
            Some(UniformValue::Sampler(1))
        );
        assert_eq!(
            gpu.uniform(uniforms::UV_SCALE),
            Some(UniformValue::Vec2(Vec2::new(2.0, 1.0)))
        );
        assert_eq!(
            gpu.uniform(uniforms::MATERIAL_SHININESS),
            Some(UniformValue::Float(32.0))
        );
    }

    #[test]
    fn unknown_texture_uploads_minus_one() {
        let mut gpu = RecordingBackend::new();
        let reg = scene(&mut gpu);
        let mut comp = compositor();
        comp.begin_frame(&reg, &mut gpu);
        comp.draw(&reg, &mut gpu, &textured("marble")).unwrap();

        assert_eq!(
            gpu.uniform(uniforms::OBJECT_TEXTURE),
            Some(UniformValue::Sampler(NO_TEXTURE_SLOT))
        );
        assert_eq!(gpu.uniform(uniforms::USE_TEXTURE), Some(UniformValue::Bool(true)));
        let stats = comp.end_frame().unwrap();
        assert_eq!(stats.texture_misses, 1);
        assert_eq!(stats.draws, 1);
    }

    #[test]
    fn material_miss_keeps_previous_values() {
        let mut gpu = RecordingBackend::new();
        let reg = scene(&mut gpu);
        let mut comp = compositor();
        comp.begin_frame(&reg, &mut gpu);

        comp.draw(&reg, &mut gpu, &textured("wood").with_material("Material2"))
            .unwrap();
        comp.draw(&reg, &mut gpu, &textured("wood").with_material("Material9"))
            .unwrap();
        comp.draw(&reg, &mut gpu, &textured("tea")).unwrap();

        assert_eq!(
            gpu.uniform(uniforms::MATERIAL_DIFFUSE),
            Some(UniformValue::Vec3(Vec3::new(0.8, 0.5, 0.2)))
        );
        assert_eq!(
            gpu.uniform(uniforms::MATERIAL_SHININESS),
            Some(UniformValue::Float(32.0))
        );
        let stats = comp.end_frame().unwrap();
        assert_eq!(stats.draws, 3);
        assert_eq!(stats.material_misses, 1);
    }

    #[test]
    fn color_surface_disables_texturing() {
        let mut gpu = RecordingBackend::new();
        let reg = scene(&mut gpu);
        let mut comp = compositor();
        comp.begin_frame(&reg, &mut gpu);

        let cmd = DrawCommand {
            mesh: Primitive::Sphere,
            transform: TransformParams::default(),
            surface: Surface::Color(Vec4::new(1.0, 0.0, 0.0, 1.0)),
            material: None,
            uv_scale: None,
        };
        comp.draw(&reg, &mut gpu, &cmd).unwrap();
        assert_eq!(gpu.uniform(uniforms::USE_TEXTURE), Some(UniformValue::Bool(false)));
        assert_eq!(
            gpu.uniform(uniforms::OBJECT_COLOR),
            Some(UniformValue::Vec4(Vec4::new(1.0, 0.0, 0.0, 1.0)))
        );
        assert_eq!(gpu.uniform(uniforms::OBJECT_TEXTURE), None);
        assert_eq!(gpu.uniform(uniforms::UV_SCALE), None);
    }

    #[test]
    fn strict_mode_rejects_unknown_tags_without_uploading() {
        let mut gpu = RecordingBackend::new();
        let reg = scene(&mut gpu);
        let mut comp = compositor().with_mode(LookupMode::Strict);
        comp.begin_frame(&reg, &mut gpu);
        gpu.clear_calls();

        let err = comp.draw(&reg, &mut gpu, &textured("marble")).unwrap_err();
        assert!(matches!(err, CompositorError::TextureNotFound(ref t) if t == "marble"));

        let err = comp
            .draw(&reg, &mut gpu, &textured("wood").with_material("Material9"))
            .unwrap_err();
        assert!(matches!(err, CompositorError::MaterialNotFound(ref m) if m == "Material9"));

        assert!(gpu.calls().is_empty());
        assert_eq!(comp.end_frame().unwrap().draws, 0);
    }

    #[test]
    fn missing_mesh_is_an_error() {
        let mut gpu = RecordingBackend::new();
        let reg = scene(&mut gpu);
        let mut comp = SceneCompositor::new(MeshTable::new());
        comp.begin_frame(&reg, &mut gpu);
        let err = comp.draw(&reg, &mut gpu, &textured("wood")).unwrap_err();
        assert!(matches!(err, CompositorError::MeshNotLoaded(Primitive::Box)));
    }

    #[test]
    fn set_view_uploads_camera_state() {
        let mut gpu = RecordingBackend::new();
        let camera = CameraController::default();
        let vp = camera.build_view_projection(4.0 / 3.0);
        compositor().set_view(&mut gpu, &vp, camera.position());

        assert_eq!(gpu.uniform(uniforms::VIEW), Some(UniformValue::Mat4(vp.view)));
        assert_eq!(
            gpu.uniform(uniforms::PROJECTION),
            Some(UniformValue::Mat4(vp.projection))
        );
        assert_eq!(
            gpu.uniform(uniforms::VIEW_POSITION),
            Some(UniformValue::Vec3(Vec3::new(0.0, 5.0, 12.0)))
        );
        assert_ne!(vp.view, Mat4::IDENTITY);
    }

    #[test]
    fn still_life_draws_completely() {
        let mut gpu = RecordingBackend::new();
        let manifest = tableau_assets::SceneManifest::still_life();
        let mut reg = ResourceRegistry::new();
        for m in &manifest.materials {
            reg.define_material(m.clone());
        }
        let mut comp = compositor();
        comp.begin_frame(&reg, &mut gpu);
        comp.draw_all(&reg, &mut gpu, &manifest.draws).unwrap();
        let stats = comp.end_frame().unwrap();

        assert_eq!(stats.draws, manifest.draws.len());
        assert_eq!(stats.material_misses, 0);
        assert_eq!(gpu.draw_count(), manifest.draws.len());
    }
}
