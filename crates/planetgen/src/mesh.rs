//! Vertex and index buffers handed to the renderer.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};
use rayon::prelude::*;

use crate::color::ColorGenerator;
use crate::error::{PlanetError, Result};

/// Vertex for planet meshes. Layout matches the terrain shader input.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PlanetVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 4],
    /// `x` carries the biome blend once colours are generated.
    pub uv: [f32; 2],
}

impl PlanetVertex {
    pub fn new(position: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: [0.0, 1.0, 0.0],
            tangent: [1.0, 0.0, 0.0, -1.0],
            uv: uv.to_array(),
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from(self.normal)
    }

    pub fn tangent(&self) -> Vec4 {
        Vec4::from(self.tangent)
    }

    pub fn uv(&self) -> Vec2 {
        Vec2::from(self.uv)
    }
}

/// Tangent for a unit normal: `(-n.y, n.z, n.x)` made orthogonal to `n`, with `w = -1`.
pub fn tangent_from_normal(normal: Vec3) -> Vec4 {
    let t = Vec3::new(-normal.y, normal.z, normal.x);
    let t = t - normal * normal.dot(t);
    let t = if t.length_squared() > 1e-6 {
        t.normalize()
    } else {
        normal.any_orthonormal_vector()
    };
    t.extend(-1.0)
}

/// Triangle mesh: vertex buffer plus index triples.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<PlanetVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Build a mesh and derive its normals and tangents from the topology.
    pub fn from_parts(positions: &[Vec3], uvs: &[Vec2], indices: Vec<u32>) -> Self {
        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, &p)| PlanetVertex::new(p, uvs.get(i).copied().unwrap_or(Vec2::ZERO)))
            .collect();
        let mut mesh = Self { vertices, indices };
        mesh.recalculate_normals();
        mesh.recalculate_tangents();
        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn positions(&self) -> Vec<Vec3> {
        self.vertices.iter().map(PlanetVertex::position).collect()
    }

    pub fn normals(&self) -> Vec<Vec3> {
        self.vertices.iter().map(PlanetVertex::normal).collect()
    }

    pub fn tangents(&self) -> Vec<Vec4> {
        self.vertices.iter().map(PlanetVertex::tangent).collect()
    }

    pub fn uvs(&self) -> Vec<Vec2> {
        self.vertices.iter().map(PlanetVertex::uv).collect()
    }

    /// Overwrite UVs in vertex order. Extra values are ignored.
    pub fn set_uvs(&mut self, uvs: impl IntoIterator<Item = Vec2>) {
        for (vertex, uv) in self.vertices.iter_mut().zip(uvs) {
            vertex.uv = uv.to_array();
        }
    }

    /// Recalculate vertex normals from positions and triangles.
    ///
    /// Each triangle adds its unnormalized face normal to its three corners, so
    /// larger triangles weigh more. Vertices no triangle touches point radially.
    pub fn recalculate_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        for tri in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let v0 = self.vertices[i0].position();
            let v1 = self.vertices[i1].position();
            let v2 = self.vertices[i2].position();

            let n = (v1 - v0).cross(v2 - v0);
            normals[i0] += n;
            normals[i1] += n;
            normals[i2] += n;
        }

        for (vertex, n) in self.vertices.iter_mut().zip(normals) {
            let n = n
                .try_normalize()
                .or_else(|| vertex.position().try_normalize())
                .unwrap_or(Vec3::Y);
            vertex.normal = n.to_array();
        }
    }

    pub fn recalculate_tangents(&mut self) {
        for vertex in &mut self.vertices {
            vertex.tangent = tangent_from_normal(vertex.normal()).to_array();
        }
    }

    /// Structural check: whole triangles, indices in range, three distinct corners.
    pub fn validate(&self) -> Result<()> {
        if self.indices.len() % 3 != 0 {
            return Err(PlanetError::MalformedMesh(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        let count = self.vertices.len();
        for (t, tri) in self.indices.chunks_exact(3).enumerate() {
            if let Some(&bad) = tri.iter().find(|&&i| i as usize >= count) {
                return Err(PlanetError::MalformedMesh(format!(
                    "triangle {} references vertex {} of {}",
                    t, bad, count
                )));
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                return Err(PlanetError::MalformedMesh(format!(
                    "triangle {} repeats a vertex: {:?}",
                    t, tri
                )));
            }
        }
        Ok(())
    }

    /// Raw vertex bytes for GPU upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// A built surface: the mesh plus the unit sphere point behind every vertex.
#[derive(Debug, Clone, Default)]
pub struct SurfaceMesh {
    pub mesh: MeshData,
    pub unit_points: Vec<Vec3>,
}

impl SurfaceMesh {
    /// Replace the UVs with `(biome blend, 0)` per vertex.
    pub fn update_uvs(&mut self, colors: &ColorGenerator) {
        let uvs: Vec<Vec2> = self
            .unit_points
            .par_iter()
            .map(|&p| Vec2::new(colors.biome_blend_from_point(p), 0.0))
            .collect();
        self.mesh.set_uvs(uvs);
    }
}
