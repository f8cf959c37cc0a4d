//! The shader-side contract: uniform names and the traits a backend implements.
//!
//! Names are emitted verbatim; the shader collaborator looks them up by string.

use glam::{Mat4, Vec2, Vec3, Vec4};
use tableau_common::MeshHandle;

pub const MODEL: &str = "model";
pub const VIEW: &str = "view";
pub const PROJECTION: &str = "projection";
pub const VIEW_POSITION: &str = "viewPosition";
pub const OBJECT_COLOR: &str = "objectColor";
pub const OBJECT_TEXTURE: &str = "objectTexture";
pub const USE_TEXTURE: &str = "bUseTexture";
pub const USE_LIGHTING: &str = "bUseLighting";
pub const MATERIAL_DIFFUSE: &str = "material.diffuseColor";
pub const MATERIAL_SPECULAR: &str = "material.specularColor";
pub const MATERIAL_SHININESS: &str = "material.shininess";
pub const UV_SCALE: &str = "UVscale";

/// Fields of one entry in the `pointLights` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightField {
    Position,
    Ambient,
    Diffuse,
    Specular,
    Active,
}

impl LightField {
    pub const ALL: [LightField; 5] = [
        LightField::Position,
        LightField::Ambient,
        LightField::Diffuse,
        LightField::Specular,
        LightField::Active,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Ambient => "ambient",
            Self::Diffuse => "diffuse",
            Self::Specular => "specular",
            Self::Active => "bActive",
        }
    }
}

/// `pointLights[index].field`
pub fn point_light_uniform(index: usize, field: LightField) -> String {
    format!("pointLights[{index}].{}", field.name())
}

/// Split `pointLights[i].field` back into its index and field.
pub fn parse_point_light_uniform(name: &str) -> Option<(usize, LightField)> {
    let rest = name.strip_prefix("pointLights[")?;
    let (index, field) = rest.split_once("].")?;
    let index = index.parse().ok()?;
    let field = LightField::ALL.into_iter().find(|f| f.name() == field)?;
    Some((index, field))
}

/// A value for one named uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Mat4(Mat4),
    Vec4(Vec4),
    Vec3(Vec3),
    Vec2(Vec2),
    Float(f32),
    Bool(bool),
    /// Texture unit a sampler reads from. Negative means no texture.
    Sampler(i32),
}

/// Name-addressed uniform upload into the active shader.
pub trait ShaderUniforms {
    fn set_uniform(&mut self, name: &str, value: UniformValue);
}

/// Submits one draw of a backend-owned mesh with the current uniform state.
pub trait MeshDrawer {
    fn draw_mesh(&mut self, mesh: MeshHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_light_names() {
        assert_eq!(
            point_light_uniform(0, LightField::Position),
            "pointLights[0].position"
        );
        assert_eq!(
            point_light_uniform(3, LightField::Active),
            "pointLights[3].bActive"
        );
    }

    #[test]
    fn point_light_names_parse_back() {
        for index in 0..4 {
            for field in LightField::ALL {
                let name = point_light_uniform(index, field);
                assert_eq!(parse_point_light_uniform(&name), Some((index, field)));
            }
        }
        assert_eq!(parse_point_light_uniform("pointLights[x].position"), None);
        assert_eq!(parse_point_light_uniform("pointLights[0].color"), None);
        assert_eq!(parse_point_light_uniform(MODEL), None);
    }
}
