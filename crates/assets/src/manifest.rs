//! JSON scene manifests.
//!
//! A manifest lists the textures to load, the materials to define, the
//! lights to forward and the draw list. Scene content lives here as data so
//! the renderer crates stay free of layout code.
//!
//! ```text
//! {
//!   "textures":  [{ "tag": "woodTexture", "path": "textures/wood.jpg" }],
//!   "materials": [{ "tag": "Material2", "diffuse_color": [0.6, 0.5, 0.2], ... }],
//!   "lights":    [{ "position": [-4.0, 4.0, 4.0], ... }],
//!   "draws":     [{ "mesh": "cylinder", "surface": { "texture": "woodTexture" }, ... }]
//! }
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tableau_common::{DrawCommand, PointLight, Primitive, Surface, TransformParams};

use crate::backend::TextureBackend;
use crate::registry::{MaterialEntry, ResourceRegistry, TextureError};

/// Errors from reading or writing a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A texture file and the tag it is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureSource {
    pub tag: String,
    pub path: PathBuf,
}

/// Outcome of [`SceneManifest::apply`]. Texture failures are collected, not fatal.
#[derive(Debug, Default)]
pub struct ManifestReport {
    pub loaded: Vec<String>,
    pub failed: Vec<(String, TextureError)>,
    pub materials_defined: usize,
}

impl ManifestReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Serializable description of one tableau.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneManifest {
    #[serde(default)]
    pub textures: Vec<TextureSource>,
    #[serde(default)]
    pub materials: Vec<MaterialEntry>,
    #[serde(default)]
    pub lights: Vec<PointLight>,
    #[serde(default)]
    pub draws: Vec<DrawCommand>,
    /// Directory relative texture paths resolve against.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl SceneManifest {
    /// Read a manifest. Relative texture paths resolve against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let mut manifest: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        manifest.base_dir = path.parent().map(Path::to_path_buf);
        tracing::info!(
            path = %path.display(),
            textures = manifest.textures.len(),
            materials = manifest.materials.len(),
            draws = manifest.draws.len(),
            "manifest loaded"
        );
        Ok(manifest)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ManifestError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Override the directory relative texture paths resolve against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn resolve(&self, source: &TextureSource) -> PathBuf {
        match &self.base_dir {
            Some(dir) if source.path.is_relative() => dir.join(&source.path),
            _ => source.path.clone(),
        }
    }

    /// Load every texture and define every material into `registry`.
    ///
    /// A texture that fails to load is reported and skipped; the scene
    /// renders without it.
    pub fn apply<B: TextureBackend + ?Sized>(
        &self,
        registry: &mut ResourceRegistry,
        backend: &mut B,
    ) -> ManifestReport {
        let mut report = ManifestReport::default();
        for source in &self.textures {
            match registry.load_texture(backend, self.resolve(source), &source.tag) {
                Ok(_) => report.loaded.push(source.tag.clone()),
                Err(e) => report.failed.push((source.tag.clone(), e)),
            }
        }
        for material in &self.materials {
            registry.define_material(material.clone());
        }
        report.materials_defined = self.materials.len();
        if !report.is_clean() {
            tracing::warn!(
                failed = report.failed.len(),
                loaded = report.loaded.len(),
                "some textures could not be loaded"
            );
        }
        report
    }

    /// Texture and material tags the draw list uses but the manifest never declares.
    pub fn dangling_references(&self) -> Vec<String> {
        let textures: BTreeSet<&str> = self.textures.iter().map(|t| t.tag.as_str()).collect();
        let materials: BTreeSet<&str> = self.materials.iter().map(|m| m.tag.as_str()).collect();
        let mut dangling = BTreeSet::new();
        for draw in &self.draws {
            if let Surface::Texture(tag) = &draw.surface {
                if !textures.contains(tag.as_str()) {
                    dangling.insert(format!("texture:{tag}"));
                }
            }
            if let Some(tag) = &draw.material {
                if !materials.contains(tag.as_str()) {
                    dangling.insert(format!("material:{tag}"));
                }
            }
        }
        dangling.into_iter().collect()
    }

    /// The built-in still life: a table with a teapot and two cups on a rug,
    /// flanked by two barrels.
    pub fn still_life() -> Self {
        let textures = [
            ("teaTexture", "textures/tea.jpg"),
            ("woodTexture", "textures/wood.jpg"),
            ("treeTexture", "textures/tree.jpg"),
            ("floorTexture", "textures/floor.jpg"),
            ("bambooTexture", "textures/bamboo.jpg"),
            ("rugTexture", "textures/rug.jpg"),
            ("wood2Texture", "textures/wood2.jpg"),
        ]
        .into_iter()
        .map(|(tag, path)| TextureSource {
            tag: tag.into(),
            path: path.into(),
        })
        .collect();

        let materials = vec![
            MaterialEntry::new("Material1", Vec3::new(0.8, 0.4, 0.8), Vec3::splat(0.2), 1.0),
            MaterialEntry::new("Material2", Vec3::new(0.6, 0.5, 0.2), Vec3::new(0.1, 0.2, 0.2), 1.0),
            MaterialEntry::new("Material3", Vec3::new(0.3, 0.3, 0.2), Vec3::new(0.7, 0.7, 0.8), 8.0),
            MaterialEntry::new("Material4", Vec3::new(0.3, 0.3, 0.2), Vec3::new(0.9, 0.9, 0.8), 10.0),
            MaterialEntry::new("Material5", Vec3::splat(0.5), Vec3::splat(0.7), 6.0),
            MaterialEntry::new("Material6", Vec3::splat(0.5), Vec3::new(0.73, 0.3, 0.3), 6.0),
        ];

        let light = |position: Vec3, diffuse: f32, specular: f32| PointLight {
            position,
            ambient: Vec3::splat(0.05),
            diffuse: Vec3::splat(diffuse),
            specular: Vec3::splat(specular),
            active: true,
        };
        let lights = vec![
            light(Vec3::new(-4.0, 4.0, 4.0), 0.8, 0.2),
            light(Vec3::new(4.0, 4.0, 4.0), 0.8, 0.2),
            light(Vec3::new(0.0, 6.0, 2.0), 1.0, 0.2),
            light(Vec3::new(-3.0, 6.0, 6.0), 0.3, 0.8),
        ];

        let at = |sx: f32, sy: f32, sz: f32, x: f32, y: f32, z: f32| {
            TransformParams::scaled_at(Vec3::new(sx, sy, sz), Vec3::new(x, y, z))
        };
        let wood = |t| DrawCommand::textured(Primitive::Cylinder, t, "woodTexture").with_material("Material2");
        let tea = |mesh, t| DrawCommand::textured(mesh, t, "teaTexture").with_material("Material4");

        let mut draws = vec![
            // plate and table top
            DrawCommand::textured(Primitive::Cylinder, at(4.0, 0.05, 4.0, 0.0, -0.8, 0.0), "bambooTexture")
                .with_material("Material2"),
            wood(at(10.0, 0.01, 10.0, 0.0, -1.0, 0.0)),
        ];
        // legs
        for (x, z) in [(-4.0, 4.0), (4.0, 4.0), (-4.0, -4.0), (4.0, -4.0)] {
            draws.push(wood(at(0.2, 10.0, 0.2, x, -11.0, z)));
        }
        // teapot
        draws.extend([
            tea(Primitive::Sphere, at(1.2, 0.5, 1.2, 0.0, -0.5, 0.0)),
            tea(Primitive::Sphere, at(0.6, 0.3, 0.6, 0.0, 0.0, 0.0)),
            tea(Primitive::Sphere, at(0.1, 0.2, 0.1, 0.0, 0.3, 0.0)),
            tea(Primitive::TaperedCylinder, at(0.2, 0.4, 0.2, 1.0, -0.3, 0.0)),
            tea(Primitive::Torus, at(0.15, 0.5, 0.15, -1.0, 0.0, 0.0)),
        ]);
        // cups
        for (x, handle_x) in [(2.5, 2.0), (-1.5, -2.0)] {
            draws.extend([
                tea(Primitive::Cylinder, at(0.5, 0.3, 0.5, x, -0.75, 1.5)),
                tea(Primitive::Cylinder, at(0.45, 0.05, 0.45, x, -0.8, 1.5)),
                tea(Primitive::Torus, at(0.1, 0.3, 0.1, handle_x, -0.5, 1.5)),
            ]);
        }
        // room
        draws.push(
            DrawCommand::textured(Primitive::Plane, at(30.0, 1.0, 30.0, 0.0, -11.5, 0.0), "floorTexture")
                .with_material("Material6"),
        );
        // the rug keeps the floor's material
        draws.push(DrawCommand::textured(
            Primitive::Cylinder,
            at(15.0, 0.5, 15.0, 0.0, -11.01, 0.0),
            "rugTexture",
        ));
        for x in [-12.0, 12.0] {
            draws.push(
                DrawCommand::textured(Primitive::Cylinder, at(3.0, 6.5, 3.0, x, -11.5, 0.0), "wood2Texture")
                    .with_material("Material2"),
            );
        }

        Self {
            textures,
            materials,
            lights,
            draws,
            base_dir: None,
        }
    }
}
