//! Maps the name-addressed uniform contract onto Pod blocks the GPU can read.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use tableau_common::MAX_POINT_LIGHTS;
use tableau_render::uniforms::{self, LightField, parse_point_light_uniform};
use tableau_render::UniformValue;

/// Byte stride between per-draw uniform blocks in the object buffer.
///
/// wgpu's default `min_uniform_buffer_offset_alignment` is 256.
pub const OBJECT_STRIDE: u64 = 256;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    /// `w` is 1.0 when the light is active.
    pub position: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

/// Written once per frame: camera and lights.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_position: [f32; 4],
    /// `x`: lighting enabled.
    pub flags: [u32; 4],
    pub lights: [LightUniform; MAX_POINT_LIGHTS],
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY.to_cols_array_2d(),
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            ..Zeroable::zeroed()
        }
    }
}

/// Snapshotted for every draw and addressed with a dynamic offset.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    pub object_color: [f32; 4],
    /// `w` holds shininess.
    pub material_diffuse: [f32; 4],
    pub material_specular: [f32; 4],
    /// `xy`: UV scale.
    pub uv_scale: [f32; 4],
    /// `x`: use texture, `y`: texture unit (negative for none).
    pub texture: [i32; 4],
}

impl Default for ObjectUniforms {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            object_color: [1.0; 4],
            uv_scale: [1.0, 1.0, 0.0, 0.0],
            ..Zeroable::zeroed()
        }
    }
}

impl ObjectUniforms {
    pub fn use_texture(&self) -> bool {
        self.texture[0] != 0
    }

    pub fn texture_unit(&self) -> i32 {
        self.texture[1]
    }
}

/// Which block a name landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Frame,
    Object,
    /// Unknown name, or a value of the wrong shape for it.
    Ignored,
}

/// Current values of every uniform the shader reads.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UniformState {
    pub frame: FrameUniforms,
    pub object: ObjectUniforms,
}

impl UniformState {
    pub fn apply(&mut self, name: &str, value: UniformValue) -> Applied {
        use UniformValue as V;

        if let Some((index, field)) = parse_point_light_uniform(name) {
            let Some(light) = self.frame.lights.get_mut(index) else {
                return Applied::Ignored;
            };
            match (field, value) {
                (LightField::Position, V::Vec3(v)) => {
                    light.position = v.extend(light.position[3]).to_array();
                }
                (LightField::Ambient, V::Vec3(v)) => light.ambient = v.extend(0.0).to_array(),
                (LightField::Diffuse, V::Vec3(v)) => light.diffuse = v.extend(0.0).to_array(),
                (LightField::Specular, V::Vec3(v)) => light.specular = v.extend(0.0).to_array(),
                (LightField::Active, V::Bool(b)) => light.position[3] = if b { 1.0 } else { 0.0 },
                _ => return Applied::Ignored,
            }
            return Applied::Frame;
        }

        if apply_frame(&mut self.frame, name, value) {
            Applied::Frame
        } else if apply_object(&mut self.object, name, value) {
            Applied::Object
        } else {
            Applied::Ignored
        }
    }
}

fn apply_frame(frame: &mut FrameUniforms, name: &str, value: UniformValue) -> bool {
    use UniformValue as V;
    match (name, value) {
        (uniforms::VIEW, V::Mat4(m)) => frame.view = m.to_cols_array_2d(),
        (uniforms::PROJECTION, V::Mat4(m)) => frame.projection = m.to_cols_array_2d(),
        (uniforms::VIEW_POSITION, V::Vec3(v)) => frame.view_position = v.extend(1.0).to_array(),
        (uniforms::USE_LIGHTING, V::Bool(b)) => frame.flags[0] = u32::from(b),
        _ => return false,
    }
    true
}

fn apply_object(object: &mut ObjectUniforms, name: &str, value: UniformValue) -> bool {
    use UniformValue as V;
    match (name, value) {
        (uniforms::MODEL, V::Mat4(m)) => object.model = m.to_cols_array_2d(),
        (uniforms::OBJECT_COLOR, V::Vec4(c)) => object.object_color = c.to_array(),
        (uniforms::USE_TEXTURE, V::Bool(b)) => object.texture[0] = i32::from(b),
        (uniforms::OBJECT_TEXTURE, V::Sampler(unit)) => object.texture[1] = unit,
        (uniforms::MATERIAL_DIFFUSE, V::Vec3(v)) => {
            let shininess = object.material_diffuse[3];
            object.material_diffuse = v.extend(shininess).to_array();
        }
        (uniforms::MATERIAL_SPECULAR, V::Vec3(v)) => {
            object.material_specular = v.extend(0.0).to_array();
        }
        (uniforms::MATERIAL_SHININESS, V::Float(s)) => object.material_diffuse[3] = s,
        (uniforms::UV_SCALE, V::Vec2(uv)) => {
            object.uv_scale[0] = uv.x;
            object.uv_scale[1] = uv.y;
        }
        _ => return false,
    }
    true
}
