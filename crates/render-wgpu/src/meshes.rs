//! CPU-side geometry for the built-in primitives.
//!
//! Conventions: plane spans [-1, 1] on X and Z at y = 0; box is a unit cube
//! centered on the origin; cylinders stand on y = 0 with height 1 and radius
//! 1 (the tapered top has radius 0.5); sphere has radius 1; torus has a main
//! radius of 1 and a tube radius of 0.1, lying in the XY plane.

use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use tableau_common::Primitive;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

fn v(position: Vec3, normal: Vec3, uv: Vec2) -> Vertex {
    Vertex {
        position: position.to_array(),
        normal: normal.to_array(),
        uv: uv.to_array(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    fn push_quad(&mut self, corners: [Vertex; 4]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(corners);
        self.indices
            .extend([base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

const SEGMENTS: u32 = 36;
const RINGS: u32 = 18;

pub fn build(primitive: Primitive) -> MeshData {
    match primitive {
        Primitive::Plane => plane(),
        Primitive::Box => cube(),
        Primitive::Cylinder => cylinder(1.0, 1.0, SEGMENTS),
        Primitive::TaperedCylinder => cylinder(1.0, 0.5, SEGMENTS),
        Primitive::Sphere => sphere(SEGMENTS, RINGS),
        Primitive::Torus => torus(1.0, 0.1, SEGMENTS, RINGS),
    }
}

pub fn plane() -> MeshData {
    let mut mesh = MeshData::default();
    let n = Vec3::Y;
    mesh.push_quad([
        v(Vec3::new(-1.0, 0.0, 1.0), n, Vec2::new(0.0, 0.0)),
        v(Vec3::new(1.0, 0.0, 1.0), n, Vec2::new(1.0, 0.0)),
        v(Vec3::new(1.0, 0.0, -1.0), n, Vec2::new(1.0, 1.0)),
        v(Vec3::new(-1.0, 0.0, -1.0), n, Vec2::new(0.0, 1.0)),
    ]);
    mesh
}

pub fn cube() -> MeshData {
    let mut mesh = MeshData::default();
    // (normal, u axis, v axis) per face
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];
    for (n, u, w) in faces {
        let c = n * 0.5;
        mesh.push_quad([
            v(c - u * 0.5 - w * 0.5, n, Vec2::new(0.0, 0.0)),
            v(c + u * 0.5 - w * 0.5, n, Vec2::new(1.0, 0.0)),
            v(c + u * 0.5 + w * 0.5, n, Vec2::new(1.0, 1.0)),
            v(c - u * 0.5 + w * 0.5, n, Vec2::new(0.0, 1.0)),
        ]);
    }
    mesh
}

/// Capped cylinder from y = 0 to y = 1.
pub fn cylinder(bottom_radius: f32, top_radius: f32, segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let slope = bottom_radius - top_radius;

    for i in 0..segments {
        let (a0, a1) = (
            TAU * i as f32 / segments as f32,
            TAU * (i + 1) as f32 / segments as f32,
        );
        let dir = |a: f32| Vec3::new(a.cos(), 0.0, -a.sin());
        let side_normal = |a: f32| (dir(a) + Vec3::Y * slope).normalize();
        let (u0, u1) = (i as f32 / segments as f32, (i + 1) as f32 / segments as f32);
        mesh.push_quad([
            v(dir(a0) * bottom_radius, side_normal(a0), Vec2::new(u0, 0.0)),
            v(dir(a1) * bottom_radius, side_normal(a1), Vec2::new(u1, 0.0)),
            v(dir(a1) * top_radius + Vec3::Y, side_normal(a1), Vec2::new(u1, 1.0)),
            v(dir(a0) * top_radius + Vec3::Y, side_normal(a0), Vec2::new(u0, 1.0)),
        ]);
    }

    for (y, radius, normal) in [(0.0, bottom_radius, Vec3::NEG_Y), (1.0, top_radius, Vec3::Y)] {
        let center = mesh.vertices.len() as u32;
        mesh.vertices
            .push(v(Vec3::new(0.0, y, 0.0), normal, Vec2::splat(0.5)));
        for i in 0..=segments {
            let a = TAU * i as f32 / segments as f32;
            let (s, c) = a.sin_cos();
            mesh.vertices.push(v(
                Vec3::new(c * radius, y, -s * radius),
                normal,
                Vec2::new(0.5 + c * 0.5, 0.5 + s * 0.5),
            ));
        }
        for i in 0..segments {
            let (a, b) = (center + 1 + i, center + 2 + i);
            if normal.y > 0.0 {
                mesh.indices.extend([center, a, b]);
            } else {
                mesh.indices.extend([center, b, a]);
            }
        }
    }
    mesh
}

pub fn sphere(segments: u32, rings: u32) -> MeshData {
    let mut mesh = MeshData::default();
    for ring in 0..=rings {
        let phi = PI * ring as f32 / rings as f32;
        for segment in 0..=segments {
            let theta = TAU * segment as f32 / segments as f32;
            let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            let uv = Vec2::new(
                segment as f32 / segments as f32,
                ring as f32 / rings as f32,
            );
            mesh.vertices.push(v(n, n, uv));
        }
    }
    grid_indices(&mut mesh.indices, segments, rings);
    mesh
}

pub fn torus(main_radius: f32, tube_radius: f32, segments: u32, sides: u32) -> MeshData {
    let mut mesh = MeshData::default();
    for ring in 0..=sides {
        let phi = TAU * ring as f32 / sides as f32;
        for segment in 0..=segments {
            let theta = TAU * segment as f32 / segments as f32;
            let center = Vec3::new(theta.cos(), theta.sin(), 0.0) * main_radius;
            let n = Vec3::new(phi.cos() * theta.cos(), phi.cos() * theta.sin(), phi.sin());
            let uv = Vec2::new(
                segment as f32 / segments as f32,
                ring as f32 / sides as f32,
            );
            mesh.vertices.push(v(center + n * tube_radius, n, uv));
        }
    }
    grid_indices(&mut mesh.indices, segments, sides);
    mesh
}

fn grid_indices(indices: &mut Vec<u32>, columns: u32, rows: u32) {
    for row in 0..rows {
        for col in 0..columns {
            let current = row * (columns + 1) + col;
            let next = current + columns + 1;
            indices.extend([current, next, current + 1, current + 1, next, next + 1]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_indices(mesh: &MeshData) {
        assert_eq!(mesh.indices.len() % 3, 0);
        let n = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < n));
    }

    #[test]
    fn every_primitive_builds() {
        for p in Primitive::ALL {
            let mesh = build(p);
            assert!(!mesh.vertices.is_empty(), "{p:?}");
            check_indices(&mesh);
        }
    }

    #[test]
    fn cube_has_six_faces() {
        let mesh = cube();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        for vert in &mesh.vertices {
            for c in vert.position {
                assert!((c.abs() - 0.5).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn sphere_vertices_are_on_the_unit_sphere() {
        let mesh = sphere(12, 6);
        for vert in &mesh.vertices {
            let len = Vec3::from_array(vert.position).length();
            assert!((len - 1.0).abs() < 1e-5);
        }
        assert_eq!(mesh.triangle_count(), 12 * 6 * 2);
    }

    #[test]
    fn tapered_cylinder_narrows_at_the_top() {
        let mesh = cylinder(1.0, 0.5, 16);
        let top_max = mesh
            .vertices
            .iter()
            .filter(|v| v.position[1] > 0.99)
            .map(|v| Vec2::new(v.position[0], v.position[2]).length())
            .fold(0.0_f32, f32::max);
        assert!((top_max - 0.5).abs() < 1e-5);
        let side = mesh.vertices[0];
        assert!(side.normal[1] > 0.0, "side normals lean outward and up");
    }

    #[test]
    fn torus_stays_within_its_radii() {
        let mesh = torus(1.0, 0.1, 24, 8);
        for vert in &mesh.vertices {
            let p = Vec3::from_array(vert.position);
            let ring = Vec2::new(p.x, p.y).length();
            assert!(ring > 0.89 && ring < 1.11, "{ring}");
        }
    }

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }
}
