//! One of the six cube faces, projected onto the sphere and displaced.
//!
//! Each face is an `R x R` vertex grid laid across the cube face, normalized onto
//! the unit sphere and pushed outwards by the [`ShapeGenerator`].

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::displace::{displace_points, BuildMode};
use crate::error::{PlanetError, Result};
use crate::mesh::{MeshData, SurfaceMesh};
use crate::shape::ShapeGenerator;

/// Smallest usable grid: one quad per face.
pub const MIN_RESOLUTION: u32 = 2;
/// Largest grid whose vertex indices still fit in a `u32` index buffer.
pub const MAX_RESOLUTION: u32 = 65_535;

/// The six faces of the cube, in generation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CubeFace {
    Top,
    Bottom,
    Left,
    Right,
    Front,
    Back,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::Top,
        CubeFace::Bottom,
        CubeFace::Left,
        CubeFace::Right,
        CubeFace::Front,
        CubeFace::Back,
    ];

    /// Outward unit normal of the face.
    pub fn local_up(self) -> Vec3 {
        match self {
            CubeFace::Top => Vec3::Y,
            CubeFace::Bottom => Vec3::NEG_Y,
            CubeFace::Left => Vec3::NEG_X,
            CubeFace::Right => Vec3::X,
            CubeFace::Front => Vec3::Z,
            CubeFace::Back => Vec3::NEG_Z,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            CubeFace::Top => "top",
            CubeFace::Bottom => "bottom",
            CubeFace::Left => "left",
            CubeFace::Right => "right",
            CubeFace::Front => "front",
            CubeFace::Back => "back",
        }
    }
}

/// Which faces a pass builds. Faces outside the mask get no buffers at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FaceRenderMask {
    #[default]
    All,
    Top,
    Bottom,
    Left,
    Right,
    Front,
    Back,
}

impl FaceRenderMask {
    pub fn includes(self, face: CubeFace) -> bool {
        match self {
            FaceRenderMask::All => true,
            FaceRenderMask::Top => face == CubeFace::Top,
            FaceRenderMask::Bottom => face == CubeFace::Bottom,
            FaceRenderMask::Left => face == CubeFace::Left,
            FaceRenderMask::Right => face == CubeFace::Right,
            FaceRenderMask::Front => face == CubeFace::Front,
            FaceRenderMask::Back => face == CubeFace::Back,
        }
    }

    pub fn faces(self) -> impl Iterator<Item = CubeFace> {
        CubeFace::ALL.into_iter().filter(move |&f| self.includes(f))
    }
}

/// Orthonormal frame of a face: `up` points out, `right`/`forward` span the face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBasis {
    pub up: Vec3,
    pub right: Vec3,
    pub forward: Vec3,
}

impl FaceBasis {
    /// Frame from the face's outward unit vector. When `up` is parallel to +Z the
    /// reference axis falls back to +X.
    pub fn from_up(up: Vec3) -> Self {
        let right = up
            .cross(Vec3::Z)
            .try_normalize()
            .unwrap_or_else(|| up.cross(Vec3::X).normalize());
        let forward = up.cross(right);
        Self { up, right, forward }
    }

    /// Point on the cube face for grid percentages in [0, 1].
    pub fn point_on_cube(&self, percent: Vec2) -> Vec3 {
        self.up
            + self.right * ((percent.x - 0.5) * 2.0)
            + self.forward * ((percent.y - 0.5) * 2.0)
    }
}

/// Grid builder for one cube face.
#[derive(Debug, Clone)]
pub struct TerrainFace {
    face: CubeFace,
    basis: FaceBasis,
    resolution: u32,
}

impl TerrainFace {
    pub fn new(face: CubeFace, resolution: u32) -> Result<Self> {
        if !(MIN_RESOLUTION..=MAX_RESOLUTION).contains(&resolution) {
            return Err(PlanetError::invalid(format!(
                "face resolution must be in {}..={}, got {}",
                MIN_RESOLUTION, MAX_RESOLUTION, resolution
            )));
        }
        Ok(Self {
            face,
            basis: FaceBasis::from_up(face.local_up()),
            resolution,
        })
    }

    pub fn face(&self) -> CubeFace {
        self.face
    }

    pub fn basis(&self) -> FaceBasis {
        self.basis
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn vertex_count(&self) -> usize {
        let r = self.resolution as usize;
        r * r
    }

    pub fn index_count(&self) -> usize {
        let cells = self.resolution as usize - 1;
        cells * cells * 6
    }

    fn percent(&self, x: u32, y: u32) -> Vec2 {
        Vec2::new(x as f32, y as f32) / (self.resolution - 1) as f32
    }

    /// Unit sphere point for grid vertex `(x, y)`.
    pub fn point_on_unit_sphere(&self, x: u32, y: u32) -> Vec3 {
        self.basis.point_on_cube(self.percent(x, y)).normalize()
    }

    /// Unit sphere points in vertex order (`x + y * R`).
    pub fn unit_sphere_points(&self) -> Vec<Vec3> {
        let r = self.resolution;
        (0..r)
            .flat_map(|y| (0..r).map(move |x| (x, y)))
            .map(|(x, y)| self.point_on_unit_sphere(x, y))
            .collect()
    }

    /// Grid-parametric UVs in vertex order.
    pub fn grid_uvs(&self) -> Vec<Vec2> {
        let r = self.resolution;
        (0..r)
            .flat_map(|y| (0..r).map(move |x| (x, y)))
            .map(|(x, y)| self.percent(x, y))
            .collect()
    }

    /// Two triangles per grid cell, wound outwards.
    pub fn triangles(&self) -> Vec<u32> {
        let r = self.resolution;
        let mut indices = Vec::with_capacity(self.index_count());
        for y in 0..r - 1 {
            for x in 0..r - 1 {
                let i = x + y * r;
                indices.extend([i, i + r + 1, i + r]);
                indices.extend([i, i + 1, i + r + 1]);
            }
        }
        indices
    }

    /// Build the displaced mesh. Elevations are recorded into `shape`'s range.
    ///
    /// Normals come from this face's triangles only, so vertices on a cube edge get
    /// a different normal on each side and lighting can show a seam. Use the
    /// octahedron topology ([`crate::SphereMesh`]) for a seam-free surface.
    pub fn construct_mesh(&self, shape: &mut ShapeGenerator, mode: BuildMode) -> Result<SurfaceMesh> {
        let unit_points = self.unit_sphere_points();
        let positions = displace_points(shape, &unit_points, mode, self.face.name())?;
        let mesh = MeshData::from_parts(&positions, &self.grid_uvs(), self.triangles());

        log::debug!(
            "Built {} face: {} vertices, {} triangles ({:?})",
            self.face.name(),
            mesh.vertex_count(),
            mesh.triangle_count(),
            mode
        );

        Ok(SurfaceMesh { mesh, unit_points })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NoiseLayerConfig, ShapeConfig};
    use crate::noise_filter::NoiseSettings;

    fn flat_shape(radius: f32) -> ShapeGenerator {
        let config = ShapeConfig {
            radius,
            layers: vec![NoiseLayerConfig::simple(NoiseSettings::default()).disabled()],
            ..Default::default()
        };
        ShapeGenerator::new(config).unwrap()
    }

    #[test]
    fn basis_is_orthonormal_for_every_face() {
        for face in CubeFace::ALL {
            let b = FaceBasis::from_up(face.local_up());
            for v in [b.up, b.right, b.forward] {
                assert!((v.length() - 1.0).abs() < 1e-6, "{:?} basis not unit", face);
            }
            assert!(b.up.dot(b.right).abs() < 1e-6);
            assert!(b.up.dot(b.forward).abs() < 1e-6);
            assert!(b.right.dot(b.forward).abs() < 1e-6);
        }
    }

    #[test]
    fn degenerate_reference_axis_falls_back() {
        for up in [Vec3::Z, Vec3::NEG_Z] {
            let b = FaceBasis::from_up(up);
            assert!(b.right.is_finite() && b.right.length() > 0.5);
            assert!(b.forward.is_finite() && b.forward.length() > 0.5);
        }
    }

    #[test]
    fn rejects_resolution_below_two() {
        for r in [0, 1] {
            assert!(matches!(
                TerrainFace::new(CubeFace::Top, r),
                Err(PlanetError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn buffer_sizes_follow_resolution() {
        for r in [2u32, 3, 8, 17] {
            let face = TerrainFace::new(CubeFace::Front, r).unwrap();
            let mut shape = flat_shape(1.0);
            let built = face.construct_mesh(&mut shape, BuildMode::Sequential).unwrap();
            let n = r as usize;
            assert_eq!(built.mesh.vertex_count(), n * n);
            assert_eq!(built.mesh.indices.len(), (n - 1) * (n - 1) * 6);
            assert!(built.mesh.validate().is_ok());
        }
    }

    #[test]
    fn triangles_face_outwards_on_every_face() {
        for face in CubeFace::ALL {
            let builder = TerrainFace::new(face, 6).unwrap();
            let mut shape = flat_shape(3.0);
            let built = builder.construct_mesh(&mut shape, BuildMode::Sequential).unwrap();
            let positions = built.mesh.positions();
            for tri in built.mesh.indices.chunks_exact(3) {
                let (a, b, c) = (
                    positions[tri[0] as usize],
                    positions[tri[1] as usize],
                    positions[tri[2] as usize],
                );
                let normal = (b - a).cross(c - a);
                let centroid = (a + b + c) / 3.0;
                assert!(normal.dot(centroid) > 0.0, "{:?} has an inward triangle", face);
            }
            for (n, p) in built.mesh.normals().iter().zip(&positions) {
                assert!(n.dot(p.normalize()) > 0.8);
            }
        }
    }

    #[test]
    fn undisplaced_vertices_sit_on_radius() {
        let face = TerrainFace::new(CubeFace::Left, 9).unwrap();
        let mut shape = flat_shape(4.0);
        let built = face.construct_mesh(&mut shape, BuildMode::Parallel).unwrap();
        for p in built.mesh.positions() {
            assert!((p.length() - 4.0).abs() < 1e-5);
        }
        assert_eq!(shape.elevation_range().min, 0.0);
        assert_eq!(shape.elevation_range().max, 0.0);
    }

    #[test]
    fn parallel_matches_sequential() {
        let face = TerrainFace::new(CubeFace::Right, 48).unwrap();
        let mut seq_shape = ShapeGenerator::new(ShapeConfig::default()).unwrap();
        let mut par_shape = ShapeGenerator::new(ShapeConfig::default()).unwrap();

        let seq = face.construct_mesh(&mut seq_shape, BuildMode::Sequential).unwrap();
        let par = face.construct_mesh(&mut par_shape, BuildMode::Parallel).unwrap();

        for (a, b) in seq.mesh.positions().iter().zip(par.mesh.positions()) {
            assert!((*a - b).length() < 1e-5);
        }
        let (rs, rp) = (seq_shape.elevation_range(), par_shape.elevation_range());
        assert!((rs.min - rp.min).abs() < 1e-5);
        assert!((rs.max - rp.max).abs() < 1e-5);
    }

    #[test]
    fn grid_uvs_span_unit_square() {
        let face = TerrainFace::new(CubeFace::Back, 5).unwrap();
        let uvs = face.grid_uvs();
        assert_eq!(uvs[0], Vec2::ZERO);
        assert_eq!(uvs[4], Vec2::new(1.0, 0.0));
        assert_eq!(uvs[24], Vec2::ONE);
    }

    #[test]
    fn render_mask_selects_single_face() {
        let faces: Vec<_> = FaceRenderMask::Top.faces().collect();
        assert_eq!(faces, vec![CubeFace::Top]);
        assert_eq!(FaceRenderMask::All.faces().count(), 6);
    }

    #[test]
    fn adjacent_faces_share_edge_points() {
        // The top face's forward edge and the back face meet on the same sphere arc.
        let top = TerrainFace::new(CubeFace::Top, 5).unwrap();
        let back = TerrainFace::new(CubeFace::Back, 5).unwrap();
        let back_points = back.unit_sphere_points();
        for x in 0..5 {
            let p = top.point_on_unit_sphere(x, 4);
            assert!(
                back_points.iter().any(|q| (p - *q).length() < 1e-5),
                "top edge point {} missing from back face",
                p
            );
        }
    }
}
