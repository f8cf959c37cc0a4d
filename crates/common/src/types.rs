use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Maximum number of point lights the shader contract exposes.
pub const MAX_POINT_LIGHTS: usize = 4;

/// Opaque reference to a mesh owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshHandle(pub u32);

/// Built-in primitive shapes a scene can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Plane,
    Box,
    Cylinder,
    TaperedCylinder,
    Sphere,
    Torus,
}

impl Primitive {
    pub const ALL: [Primitive; 6] = [
        Primitive::Plane,
        Primitive::Box,
        Primitive::Cylinder,
        Primitive::TaperedCylinder,
        Primitive::Sphere,
        Primitive::Torus,
    ];
}

/// Which projection the camera produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionMode {
    #[default]
    Perspective,
    Orthographic,
}

/// Scale, per-axis rotation (degrees) and translation for one draw.
///
/// Consumed immediately to build a model matrix; never stored by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformParams {
    pub scale: Vec3,
    pub rotation_degrees: Vec3,
    pub translation: Vec3,
}

impl TransformParams {
    pub fn new(scale: Vec3, rotation_degrees: Vec3, translation: Vec3) -> Self {
        Self {
            scale,
            rotation_degrees,
            translation,
        }
    }

    /// Scale and translate without rotation.
    pub fn scaled_at(scale: Vec3, translation: Vec3) -> Self {
        Self::new(scale, Vec3::ZERO, translation)
    }
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            rotation_degrees: Vec3::ZERO,
            translation: Vec3::ZERO,
        }
    }
}

/// A point light forwarded verbatim to the shader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            ambient: Vec3::splat(0.05),
            diffuse: Vec3::splat(0.8),
            specular: Vec3::splat(0.2),
            active: true,
        }
    }
}

/// How a draw is shaded: sampled from a tagged texture or a flat color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Texture(String),
    Color(Vec4),
}

/// One entry of a scene's draw list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawCommand {
    pub mesh: Primitive,
    #[serde(default)]
    pub transform: TransformParams,
    pub surface: Surface,
    /// Material tag. `None` leaves whatever material was last uploaded.
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub uv_scale: Option<Vec2>,
}

impl DrawCommand {
    pub fn textured(mesh: Primitive, transform: TransformParams, texture: &str) -> Self {
        Self {
            mesh,
            transform,
            surface: Surface::Texture(texture.to_string()),
            material: None,
            uv_scale: None,
        }
    }

    pub fn with_material(mut self, material: &str) -> Self {
        self.material = Some(material.to_string());
        self
    }

    pub fn with_uv_scale(mut self, u: f32, v: f32) -> Self {
        self.uv_scale = Some(Vec2::new(u, v));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = TransformParams::default();
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.rotation_degrees, Vec3::ZERO);
        assert_eq!(t.translation, Vec3::ZERO);
    }

    #[test]
    fn projection_defaults_to_perspective() {
        assert_eq!(ProjectionMode::default(), ProjectionMode::Perspective);
    }

    #[test]
    fn draw_command_builder() {
        let cmd = DrawCommand::textured(Primitive::Cylinder, TransformParams::default(), "wood")
            .with_material("Material2")
            .with_uv_scale(2.0, 1.0);
        assert_eq!(cmd.surface, Surface::Texture("wood".into()));
        assert_eq!(cmd.material.as_deref(), Some("Material2"));
        assert_eq!(cmd.uv_scale, Some(Vec2::new(2.0, 1.0)));
    }

    #[test]
    fn draw_command_from_minimal_json() {
        let json = r#"{ "mesh": "tapered_cylinder", "surface": { "texture": "tea" } }"#;
        let cmd: DrawCommand = serde_json::from_str(json).unwrap();
        assert_eq!(cmd.mesh, Primitive::TaperedCylinder);
        assert_eq!(cmd.transform, TransformParams::default());
        assert!(cmd.material.is_none());
    }

    #[test]
    fn point_light_active_by_default_in_json() {
        let json = r#"{
            "position": [0.0, 6.0, 2.0],
            "ambient": [0.05, 0.05, 0.05],
            "diffuse": [1.0, 1.0, 1.0],
            "specular": [0.2, 0.2, 0.2]
        }"#;
        let light: PointLight = serde_json::from_str(json).unwrap();
        assert!(light.active);
        assert_eq!(light.position, Vec3::new(0.0, 6.0, 2.0));
    }
}
