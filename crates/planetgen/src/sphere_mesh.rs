//! Seam-free sphere from a subdivided octahedron.
//!
//! Every edge and corner vertex is stored once and shared by all triangles that
//! touch it. Buffer sizes are known up front from the division count.

use glam::Vec3;

use crate::displace::{displace_points, BuildMode};
use crate::error::{PlanetError, Result};
use crate::mesh::{MeshData, SurfaceMesh};
use crate::shape::ShapeGenerator;

/// Keeps the vertex count inside a `u32` index buffer.
pub const MAX_DIVISIONS: u32 = 32_000;

const BASE_VERTICES: [Vec3; 6] = [
    Vec3::Y,
    Vec3::NEG_X,
    Vec3::NEG_Z,
    Vec3::X,
    Vec3::Z,
    Vec3::NEG_Y,
];

// Corner pairs of the 12 octahedron edges.
const VERTEX_PAIRS: [(u32, u32); 12] = [
    (0, 1),
    (0, 2),
    (0, 3),
    (0, 4),
    (1, 2),
    (2, 3),
    (3, 4),
    (4, 1),
    (5, 1),
    (5, 2),
    (5, 3),
    (5, 4),
];

// (side A, side B, bottom) edges of the 8 faces. The lower four wind the other way.
const EDGE_TRIPLETS: [[usize; 3]; 8] = [
    [0, 1, 4],
    [1, 2, 5],
    [2, 3, 6],
    [3, 0, 7],
    [8, 9, 4],
    [9, 10, 5],
    [10, 11, 6],
    [11, 8, 7],
];

/// Vertices in one face's triangle, shared edges included.
pub fn vertices_per_face(divisions: u32) -> usize {
    let d = divisions as usize;
    (d + 3) * (d + 2) / 2
}

/// Exact vertex count of the whole sphere.
pub fn vertex_count(divisions: u32) -> usize {
    let d = divisions as usize;
    vertices_per_face(divisions) * 8 - (d + 2) * 12 + 6
}

pub fn triangle_count(divisions: u32) -> usize {
    let d = divisions as usize;
    (d + 1) * (d + 1) * 8
}

/// Spherical interpolation between two unit vectors.
fn slerp(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    let dot = a.dot(b).clamp(-1.0, 1.0);
    let theta = dot.acos() * t;
    let relative = (b - a * dot).normalize_or_zero();
    a * theta.cos() + relative * theta.sin()
}

/// Unit sphere tessellated from an octahedron.
#[derive(Debug, Clone)]
pub struct SphereMesh {
    divisions: u32,
    vertices: Vec<Vec3>,
    triangles: Vec<u32>,
}

impl SphereMesh {
    /// Subdivide each octahedron edge with `divisions` extra vertices.
    pub fn new(divisions: u32) -> Result<Self> {
        Self::check_divisions(divisions)?;

        let d = divisions as usize;
        let mut vertices = Vec::with_capacity(vertex_count(divisions));
        let mut triangles = Vec::with_capacity(triangle_count(divisions) * 3);
        vertices.extend_from_slice(&BASE_VERTICES);

        let mut edges: Vec<Vec<u32>> = Vec::with_capacity(VERTEX_PAIRS.len());
        for &(start, end) in &VERTEX_PAIRS {
            let a = vertices[start as usize];
            let b = vertices[end as usize];
            let mut edge = Vec::with_capacity(d + 2);
            edge.push(start);
            for i in 0..d {
                let t = (i + 1) as f32 / (d + 1) as f32;
                edge.push(vertices.len() as u32);
                vertices.push(slerp(a, b, t));
            }
            edge.push(end);
            edges.push(edge);
        }

        for (face, &[side_a, side_b, bottom]) in EDGE_TRIPLETS.iter().enumerate() {
            Self::create_face(
                &mut vertices,
                &mut triangles,
                divisions,
                &edges[side_a],
                &edges[side_b],
                &edges[bottom],
                face >= 4,
            );
        }

        debug_assert_eq!(vertices.len(), vertex_count(divisions));
        debug_assert_eq!(triangles.len(), triangle_count(divisions) * 3);

        Ok(Self {
            divisions,
            vertices,
            triangles,
        })
    }

    pub fn check_divisions(divisions: u32) -> Result<()> {
        if divisions > MAX_DIVISIONS {
            return Err(PlanetError::invalid(format!(
                "sphere divisions must be at most {}, got {}",
                MAX_DIVISIONS, divisions
            )));
        }
        Ok(())
    }

    fn create_face(
        vertices: &mut Vec<Vec3>,
        triangles: &mut Vec<u32>,
        divisions: u32,
        side_a: &[u32],
        side_b: &[u32],
        bottom: &[u32],
        reverse: bool,
    ) {
        let points_in_edge = side_a.len();

        // Row r of the face holds r + 1 vertices: the corner, then the side A vertex,
        // the inner points and the side B vertex, with the bottom edge as last row.
        let mut vertex_map = Vec::with_capacity(vertices_per_face(divisions));
        vertex_map.push(side_a[0]);

        for i in 1..points_in_edge - 1 {
            vertex_map.push(side_a[i]);

            let a = vertices[side_a[i] as usize];
            let b = vertices[side_b[i] as usize];
            let inner = i - 1;
            for j in 0..inner {
                let t = (j + 1) as f32 / (inner + 1) as f32;
                vertex_map.push(vertices.len() as u32);
                vertices.push(slerp(a, b, t));
            }

            vertex_map.push(side_b[i]);
        }
        vertex_map.extend_from_slice(bottom);

        let rows = divisions as usize + 1;
        for row in 0..rows {
            // First vertex of rows r and r + 1: triangular numbers r(r + 1) / 2.
            let mut top = ((row + 1) * (row + 1) - row - 1) / 2;
            let mut below = ((row + 2) * (row + 2) - row - 2) / 2;

            for column in 0..(1 + 2 * row) {
                let (v0, v1, v2) = if column % 2 == 0 {
                    let tri = (top, below + 1, below);
                    top += 1;
                    below += 1;
                    tri
                } else {
                    (top, below, top - 1)
                };

                let (v1, v2) = if reverse { (v2, v1) } else { (v1, v2) };
                triangles.extend([vertex_map[v0], vertex_map[v1], vertex_map[v2]]);
            }
        }
    }

    pub fn divisions(&self) -> u32 {
        self.divisions
    }

    /// Unit sphere vertices.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[u32] {
        &self.triangles
    }

    /// Push every vertex out to the planet surface and derive normals/tangents.
    pub fn displace(&self, shape: &mut ShapeGenerator, mode: BuildMode) -> Result<SurfaceMesh> {
        let positions = displace_points(shape, &self.vertices, mode, "octahedron sphere")?;
        let mesh = MeshData::from_parts(&positions, &[], self.triangles.clone());

        log::debug!(
            "Built octahedron sphere: {} divisions, {} vertices, {} triangles ({:?})",
            self.divisions,
            mesh.vertex_count(),
            mesh.triangle_count(),
            mode
        );

        Ok(SurfaceMesh {
            mesh,
            unit_points: self.vertices.clone(),
        })
    }
}
