//! Whole-planet regeneration: settings in, meshes + shading data out.

use serde::{Deserialize, Serialize};

use crate::color::{BiomeConfig, ColorGenerator, ShadingData};
use crate::config::ShapeConfig;
use crate::displace::BuildMode;
use crate::elevation::ElevationRange;
use crate::error::Result;
use crate::mesh::SurfaceMesh;
use crate::shape::ShapeGenerator;
use crate::sphere_mesh::SphereMesh;
use crate::terrain_face::{CubeFace, FaceRenderMask, TerrainFace};

/// Vertices per cube face edge when nothing else is configured.
pub const DEFAULT_RESOLUTION: u32 = 32;

/// How the unit sphere is tessellated before displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshTopology {
    /// Six normalized cube faces, each an R x R grid.
    CubeFaces { resolution: u32 },
    /// One seamless mesh from a subdivided octahedron.
    Octahedron { divisions: u32 },
}

impl Default for MeshTopology {
    fn default() -> Self {
        MeshTopology::CubeFaces {
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

/// Everything one regeneration pass reads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanetSettings {
    pub topology: MeshTopology,
    /// Only consulted for [`MeshTopology::CubeFaces`].
    pub face_render_mask: FaceRenderMask,
    pub build_mode: BuildMode,
    pub shape: ShapeConfig,
    pub color: BiomeConfig,
}

impl PlanetSettings {
    pub fn validate(&self) -> Result<()> {
        self.shape.validate()?;
        self.color.validate()?;
        match self.topology {
            MeshTopology::CubeFaces { resolution } => {
                TerrainFace::new(CubeFace::Top, resolution)?;
            }
            MeshTopology::Octahedron { divisions } => {
                SphereMesh::check_divisions(divisions)?;
            }
        }
        Ok(())
    }
}

/// Meshes produced by the last successful pass.
#[derive(Debug, Clone, Default)]
pub struct PlanetSurface {
    /// Indexed by [`CubeFace::index`]. Masked-out faces are `None`.
    pub faces: [Option<SurfaceMesh>; 6],
    /// Set for [`MeshTopology::Octahedron`].
    pub sphere: Option<SurfaceMesh>,
    /// Unscaled elevation range over every vertex built.
    pub elevation_range: ElevationRange,
}

impl PlanetSurface {
    pub fn face(&self, face: CubeFace) -> Option<&SurfaceMesh> {
        self.faces[face.index()].as_ref()
    }

    /// Every built mesh, faces first.
    pub fn meshes(&self) -> impl Iterator<Item = &SurfaceMesh> {
        self.faces.iter().flatten().chain(self.sphere.as_ref())
    }

    fn meshes_mut(&mut self) -> impl Iterator<Item = &mut SurfaceMesh> {
        self.faces.iter_mut().flatten().chain(self.sphere.as_mut())
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes().map(|m| m.mesh.vertex_count()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes().map(|m| m.mesh.triangle_count()).sum()
    }
}

/// A procedurally generated planet.
///
/// Each regeneration entry point either completes and replaces the previous
/// output, or fails and leaves it untouched.
#[derive(Debug, Clone)]
pub struct Planet {
    settings: PlanetSettings,
    shape: ShapeGenerator,
    colors: ColorGenerator,
    surface: PlanetSurface,
}

impl Planet {
    /// Build a planet and run a full pass.
    pub fn new(settings: PlanetSettings) -> Result<Self> {
        settings.validate()?;
        let mut shape = ShapeGenerator::new(settings.shape.clone())?;
        let mut colors = ColorGenerator::new(settings.color.clone())?;
        let surface = build_surface(&settings, &mut shape, &mut colors)?;

        Ok(Self {
            settings,
            shape,
            colors,
            surface,
        })
    }

    /// Full pass: meshes, elevation range, lookup texture and biome UVs.
    pub fn regenerate(&mut self, settings: PlanetSettings) -> Result<()> {
        *self = Self::new(settings)?;
        Ok(())
    }

    /// Rebuild the meshes for a new shape, keeping the colour settings.
    pub fn regenerate_shape(&mut self, shape_config: ShapeConfig) -> Result<()> {
        let mut settings = self.settings.clone();
        settings.shape = shape_config;
        settings.validate()?;

        let mut shape = ShapeGenerator::new(settings.shape.clone())?;
        let mut colors = self.colors.clone();
        let surface = build_surface(&settings, &mut shape, &mut colors)?;

        self.settings = settings;
        self.shape = shape;
        self.colors = colors;
        self.surface = surface;
        Ok(())
    }

    /// Rebuild the lookup texture and biome UVs on the existing meshes.
    pub fn regenerate_colors(&mut self, color_config: BiomeConfig) -> Result<()> {
        let mut colors = ColorGenerator::new(color_config.clone())?;
        colors.update_elevation(self.surface.elevation_range);
        colors.rebuild_lookup_texture();

        let mut surface = self.surface.clone();
        for mesh in surface.meshes_mut() {
            mesh.update_uvs(&colors);
        }

        self.settings.color = color_config;
        self.colors = colors;
        self.surface = surface;
        Ok(())
    }

    pub fn settings(&self) -> &PlanetSettings {
        &self.settings
    }

    pub fn shape(&self) -> &ShapeGenerator {
        &self.shape
    }

    pub fn colors(&self) -> &ColorGenerator {
        &self.colors
    }

    pub fn surface(&self) -> &PlanetSurface {
        &self.surface
    }

    pub fn elevation_range(&self) -> ElevationRange {
        self.surface.elevation_range
    }

    pub fn shading_data(&self) -> ShadingData<'_> {
        self.colors.shading_data()
    }
}

fn build_surface(
    settings: &PlanetSettings,
    shape: &mut ShapeGenerator,
    colors: &mut ColorGenerator,
) -> Result<PlanetSurface> {
    shape.reset_range();
    let mut surface = PlanetSurface::default();

    match settings.topology {
        MeshTopology::CubeFaces { resolution } => {
            for face in settings.face_render_mask.faces() {
                let built = TerrainFace::new(face, resolution)?.construct_mesh(shape, settings.build_mode)?;
                built.mesh.validate()?;
                surface.faces[face.index()] = Some(built);
            }
        }
        MeshTopology::Octahedron { divisions } => {
            let built = SphereMesh::new(divisions)?.displace(shape, settings.build_mode)?;
            built.mesh.validate()?;
            surface.sphere = Some(built);
        }
    }
    surface.elevation_range = shape.elevation_range();

    colors.update_elevation(surface.elevation_range);
    colors.rebuild_lookup_texture();
    for mesh in surface.meshes_mut() {
        mesh.update_uvs(colors);
    }

    log::info!(
        "Planet regenerated: {} meshes, {} vertices, {} triangles, elevation [{:.4}, {:.4}]",
        surface.meshes().count(),
        surface.vertex_count(),
        surface.triangle_count(),
        surface.elevation_range.min,
        surface.elevation_range.max
    );

    Ok(surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanetError;
    use glam::Vec3;

    fn small(topology: MeshTopology, mode: BuildMode) -> PlanetSettings {
        PlanetSettings {
            topology,
            build_mode: mode,
            ..Default::default()
        }
    }

    fn cube(resolution: u32) -> MeshTopology {
        MeshTopology::CubeFaces { resolution }
    }

    #[test]
    fn top_mask_builds_a_single_face() {
        let settings = PlanetSettings {
            face_render_mask: FaceRenderMask::Top,
            ..small(cube(8), BuildMode::Parallel)
        };
        let planet = Planet::new(settings).unwrap();
        let surface = planet.surface();

        assert_eq!(surface.meshes().count(), 1);
        assert!(surface.face(CubeFace::Top).is_some());
        for face in CubeFace::ALL.into_iter().filter(|&f| f != CubeFace::Top) {
            assert!(surface.face(face).is_none(), "{:?} should not be built", face);
        }
        assert_eq!(surface.vertex_count(), 64);
    }

    #[test]
    fn elevation_range_matches_vertex_magnitudes() {
        let planet = Planet::new(small(cube(16), BuildMode::Parallel)).unwrap();
        let range = planet.elevation_range();
        assert!(!range.is_empty());

        let positions: Vec<Vec3> = planet
            .surface()
            .meshes()
            .flat_map(|m| m.mesh.positions())
            .collect();
        let magnitudes = ElevationRange::from_magnitudes(&positions);

        let shape = planet.shape();
        assert!((magnitudes.min - shape.scale_point(range.min)).abs() < 1e-5);
        assert!((magnitudes.max - shape.scale_point(range.max)).abs() < 1e-5);
    }

    #[test]
    fn sequential_and_parallel_planets_agree() {
        for topology in [cube(12), MeshTopology::Octahedron { divisions: 6 }] {
            let seq = Planet::new(small(topology, BuildMode::Sequential)).unwrap();
            let par = Planet::new(small(topology, BuildMode::Parallel)).unwrap();

            let a: Vec<Vec3> = seq.surface().meshes().flat_map(|m| m.mesh.positions()).collect();
            let b: Vec<Vec3> = par.surface().meshes().flat_map(|m| m.mesh.positions()).collect();
            assert_eq!(a.len(), b.len());
            for (p, q) in a.iter().zip(&b) {
                assert!((*p - *q).length() < 1e-5, "{} vs {}", p, q);
            }

            let (ra, rb) = (seq.elevation_range(), par.elevation_range());
            assert!((ra.min - rb.min).abs() < 1e-5 && (ra.max - rb.max).abs() < 1e-5);
        }
    }

    #[test]
    fn octahedron_topology_builds_one_sphere() {
        let planet = Planet::new(small(MeshTopology::Octahedron { divisions: 3 }, BuildMode::Parallel)).unwrap();
        let surface = planet.surface();
        assert!(surface.faces.iter().all(Option::is_none));
        let sphere = surface.sphere.as_ref().unwrap();
        assert_eq!(sphere.mesh.vertex_count(), crate::sphere_mesh::vertex_count(3));
    }

    #[test]
    fn uvs_carry_biome_blend() {
        let planet = Planet::new(small(cube(6), BuildMode::Parallel)).unwrap();
        for mesh in planet.surface().meshes() {
            for (uv, &p) in mesh.mesh.uvs().iter().zip(&mesh.unit_points) {
                assert_eq!(uv.y, 0.0);
                assert_eq!(uv.x, planet.colors().biome_blend_from_point(p));
            }
        }
        let shading = planet.shading_data();
        assert_eq!(shading.elevation_min_max, planet.elevation_range().as_vec2());
        assert_eq!(shading.lookup.height, planet.settings().color.biomes.len() as u32);
    }

    #[test]
    fn regenerate_colors_keeps_geometry() {
        let mut planet = Planet::new(small(cube(6), BuildMode::Parallel)).unwrap();
        let before: Vec<Vec3> = planet.surface().meshes().flat_map(|m| m.mesh.positions()).collect();

        let mut color = planet.settings().color.clone();
        color.biomes.truncate(1);
        planet.regenerate_colors(color).unwrap();

        let after: Vec<Vec3> = planet.surface().meshes().flat_map(|m| m.mesh.positions()).collect();
        assert_eq!(before, after);
        assert_eq!(planet.colors().texture().height, 1);
        for mesh in planet.surface().meshes() {
            assert!(mesh.mesh.uvs().iter().all(|uv| uv.x == 0.0));
        }
    }

    #[test]
    fn regenerate_shape_resets_the_range() {
        let mut planet = Planet::new(small(cube(8), BuildMode::Parallel)).unwrap();
        let flat = ShapeConfig {
            layers: vec![crate::config::NoiseLayerConfig::default().disabled()],
            radius: 2.0,
            ..Default::default()
        };
        planet.regenerate_shape(flat).unwrap();

        let range = planet.elevation_range();
        assert_eq!(range.min, 0.0);
        assert_eq!(range.max, 0.0);
        assert_eq!(planet.colors().elevation_range(), range);
        for p in planet.surface().meshes().flat_map(|m| m.mesh.positions()) {
            assert!((p.length() - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn invalid_settings_leave_previous_output() {
        let mut planet = Planet::new(small(cube(4), BuildMode::Sequential)).unwrap();
        let vertices = planet.surface().vertex_count();

        let bad = PlanetSettings {
            shape: ShapeConfig {
                radius: -1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = planet.regenerate(bad).unwrap_err();
        assert!(matches!(err, PlanetError::InvalidConfiguration(_)));

        assert!(matches!(
            planet.regenerate(small(cube(1), BuildMode::Parallel)),
            Err(PlanetError::InvalidConfiguration(_))
        ));
        assert!(planet
            .regenerate_shape(ShapeConfig {
                layers: Vec::new(),
                ..Default::default()
            })
            .is_err());

        assert_eq!(planet.surface().vertex_count(), vertices);
        assert_eq!(planet.settings().topology, cube(4));
    }
}
