//! Moves unit sphere points onto the planet surface, one vertex at a time or in
//! parallel chunks.

use glam::Vec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::elevation::ElevationRange;
use crate::error::{PlanetError, Result};
use crate::shape::ShapeGenerator;

/// Vertices handed to one parallel worker.
pub const CHUNK_SIZE: usize = 1024;

/// How per-vertex work is executed. Both modes compute the same positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BuildMode {
    /// Single-threaded reference path.
    Sequential,
    /// Chunks of vertices on the rayon pool, elevation ranges reduced afterwards.
    #[default]
    Parallel,
}

/// Displace every point by the shape's elevation and record the range seen.
///
/// Any non-finite result fails the whole call; no partial output is returned.
pub fn displace_points(
    shape: &mut ShapeGenerator,
    points: &[Vec3],
    mode: BuildMode,
    mesh: &'static str,
) -> Result<Vec<Vec3>> {
    match mode {
        BuildMode::Sequential => {
            let mut positions = Vec::with_capacity(points.len());
            for (index, &p) in points.iter().enumerate() {
                let position = shape.point_on_planet(p);
                if !position.is_finite() {
                    return Err(PlanetError::NonFiniteVertex { mesh, index });
                }
                positions.push(position);
            }
            Ok(positions)
        }
        BuildMode::Parallel => {
            let mut positions = vec![Vec3::ZERO; points.len()];
            let generator: &ShapeGenerator = shape;

            let range = positions
                .par_chunks_mut(CHUNK_SIZE)
                .zip(points.par_chunks(CHUNK_SIZE))
                .enumerate()
                .map(|(chunk, (dst, src))| {
                    let mut local = ElevationRange::new();
                    for (offset, (slot, &p)) in dst.iter_mut().zip(src).enumerate() {
                        let elevation = generator.unscaled_elevation(p);
                        local.add_value(elevation);
                        let position = p * generator.scale_point(elevation);
                        if !position.is_finite() {
                            return Err(PlanetError::NonFiniteVertex {
                                mesh,
                                index: chunk * CHUNK_SIZE + offset,
                            });
                        }
                        *slot = position;
                    }
                    Ok(local)
                })
                .try_reduce(ElevationRange::new, |a, b| Ok(a.merged(b)))?;

            shape.record_range(range);
            Ok(positions)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NoiseLayerConfig, ShapeConfig};
    use crate::noise_filter::NoiseSettings;

    fn spiral(n: usize) -> Vec<Vec3> {
        (0..n)
            .map(|i| {
                let t = i as f32 * 0.37;
                Vec3::new(t.cos(), (i as f32 / n as f32) * 2.0 - 1.0, t.sin()).normalize()
            })
            .collect()
    }

    #[test]
    fn sequential_and_parallel_agree_exactly() {
        // More points than one chunk so the reduction is exercised.
        let points = spiral(CHUNK_SIZE * 3 + 17);
        let mut seq = ShapeGenerator::new(ShapeConfig::default()).unwrap();
        let mut par = ShapeGenerator::new(ShapeConfig::default()).unwrap();

        let a = displace_points(&mut seq, &points, BuildMode::Sequential, "test").unwrap();
        let b = displace_points(&mut par, &points, BuildMode::Parallel, "test").unwrap();

        assert_eq!(a, b);
        assert_eq!(seq.elevation_range(), par.elevation_range());
    }

    #[test]
    fn non_finite_vertex_fails_the_pass() {
        let config = ShapeConfig {
            floor_clamp: false,
            layers: vec![NoiseLayerConfig::simple(NoiseSettings {
                strength: f32::MAX,
                min_value: -f32::MAX,
                ..Default::default()
            })],
            ..Default::default()
        };
        let points = spiral(64);
        for mode in [BuildMode::Sequential, BuildMode::Parallel] {
            let mut shape = ShapeGenerator::new(config.clone()).unwrap();
            let result = displace_points(&mut shape, &points, mode, "test");
            assert!(
                matches!(result, Err(PlanetError::NonFiniteVertex { .. })),
                "{:?} should fail",
                mode
            );
        }
    }

    #[test]
    fn empty_input_leaves_range_empty() {
        let mut shape = ShapeGenerator::new(ShapeConfig::default()).unwrap();
        let out = displace_points(&mut shape, &[], BuildMode::Parallel, "test").unwrap();
        assert!(out.is_empty());
        assert!(shape.elevation_range().is_empty());
    }
}
