//! CPU-only backend that remembers what the core asked of the GPU.

use std::collections::{BTreeMap, BTreeSet};

use tableau_assets::{TextureBackend, TextureHandle, TextureUpload};
use tableau_common::{MeshHandle, Primitive};

use crate::compositor::MeshTable;
use crate::uniforms::{MeshDrawer, ShaderUniforms, UniformValue};

/// One call made against the backend, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    CreateTexture { handle: TextureHandle, label: String },
    BindTexture { unit: u32, handle: TextureHandle },
    DeleteTexture(TextureHandle),
    SetUniform { name: String, value: UniformValue },
    DrawMesh(MeshHandle),
}

/// Implements every backend trait without touching a GPU.
///
/// Keeps the latest value per uniform name, so a test can inspect the
/// state a draw would have seen.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_texture: u64,
    calls: Vec<RecordedCall>,
    uniforms: BTreeMap<String, UniformValue>,
    units: BTreeMap<u32, TextureHandle>,
    live: BTreeSet<TextureHandle>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles `0..` in [`Primitive::ALL`] order.
    pub fn mesh_table() -> MeshTable {
        Primitive::ALL
            .into_iter()
            .enumerate()
            .map(|(i, p)| (p, MeshHandle(i as u32)))
            .collect()
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }

    pub fn uniforms(&self) -> &BTreeMap<String, UniformValue> {
        &self.uniforms
    }

    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn bound_unit(&self, unit: u32) -> Option<TextureHandle> {
        self.units.get(&unit).copied()
    }

    pub fn live_textures(&self) -> usize {
        self.live.len()
    }

    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, RecordedCall::DrawMesh(_)))
            .count()
    }

    /// Human-readable call log, one line per call.
    pub fn render_log(&self) -> String {
        let mut out = String::new();
        for call in &self.calls {
            let line = match call {
                RecordedCall::CreateTexture { handle, label } => {
                    format!("create_texture #{} '{label}'", handle.0)
                }
                RecordedCall::BindTexture { unit, handle } => {
                    format!("bind_texture unit={unit} #{}", handle.0)
                }
                RecordedCall::DeleteTexture(handle) => format!("delete_texture #{}", handle.0),
                RecordedCall::SetUniform { name, value } => {
                    format!("  {name} = {}", format_value(value))
                }
                RecordedCall::DrawMesh(mesh) => format!("draw_mesh {}", mesh.0),
            };
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

fn format_value(value: &UniformValue) -> String {
    match value {
        UniformValue::Mat4(m) => {
            let c = m.to_cols_array();
            let cols: Vec<String> = c
                .chunks(4)
                .map(|col| format!("[{:.3}, {:.3}, {:.3}, {:.3}]", col[0], col[1], col[2], col[3]))
                .collect();
            format!("mat4 {}", cols.join(" "))
        }
        UniformValue::Vec4(v) => format!("({:.3}, {:.3}, {:.3}, {:.3})", v.x, v.y, v.z, v.w),
        UniformValue::Vec3(v) => format!("({:.3}, {:.3}, {:.3})", v.x, v.y, v.z),
        UniformValue::Vec2(v) => format!("({:.3}, {:.3})", v.x, v.y),
        UniformValue::Float(f) => format!("{f:.3}"),
        UniformValue::Bool(b) => b.to_string(),
        UniformValue::Sampler(unit) => format!("sampler {unit}"),
    }
}

impl TextureBackend for RecordingBackend {
    fn create_texture(&mut self, upload: &TextureUpload<'_>) -> TextureHandle {
        self.next_texture += 1;
        let handle = TextureHandle(self.next_texture);
        self.live.insert(handle);
        self.calls.push(RecordedCall::CreateTexture {
            handle,
            label: upload.label.to_string(),
        });
        handle
    }

    fn bind_texture(&mut self, unit: u32, handle: TextureHandle) {
        self.units.insert(unit, handle);
        self.calls.push(RecordedCall::BindTexture { unit, handle });
    }

    fn delete_texture(&mut self, handle: TextureHandle) {
        self.live.remove(&handle);
        self.units.retain(|_, h| *h != handle);
        self.calls.push(RecordedCall::DeleteTexture(handle));
    }
}

impl ShaderUniforms for RecordingBackend {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.uniforms.insert(name.to_string(), value);
        self.calls.push(RecordedCall::SetUniform {
            name: name.to_string(),
            value,
        });
    }
}

impl MeshDrawer for RecordingBackend {
    fn draw_mesh(&mut self, mesh: MeshHandle) {
        self.calls.push(RecordedCall::DrawMesh(mesh));
    }
}
