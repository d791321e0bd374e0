//! planet-bake: regenerate a planet from a RON config and export its lookup texture.
//!
//! Usage: `planet-bake [config.ron]`. A missing config file is created with defaults.

mod config;

use anyhow::{Context, Result};
use planetgen::{ColorLookupTexture, CubeFace, Planet, SurfaceMesh};
use std::path::{Path, PathBuf};
use std::time::Instant;

use config::BakeConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("planet.ron"));
    let config = BakeConfig::load(&config_path);
    if !config_path.exists() {
        log::info!("Writing default config to {:?}", config_path);
        config.save(&config_path);
    }

    let start = Instant::now();
    let planet = Planet::new(config.planet_settings()).context("planet regeneration failed")?;
    log::info!("Regenerated in {:.1?}", start.elapsed());

    let surface = planet.surface();
    for face in CubeFace::ALL {
        if let Some(mesh) = surface.face(face) {
            log_buffers(face.name(), mesh);
        }
    }
    if let Some(sphere) = &surface.sphere {
        log_buffers("octahedron sphere", sphere);
    }

    let shading = planet.shading_data();
    log::info!(
        "Elevation min/max: ({:.4}, {:.4})",
        shading.elevation_min_max.x,
        shading.elevation_min_max.y
    );
    write_lookup_png(shading.lookup, &config.lookup_texture_path)?;

    Ok(())
}

fn log_buffers(name: &str, surface: &SurfaceMesh) {
    log::info!(
        "{}: {} vertices ({} bytes), {} triangles ({} bytes)",
        name,
        surface.mesh.vertex_count(),
        surface.mesh.vertex_bytes().len(),
        surface.mesh.triangle_count(),
        surface.mesh.index_bytes().len()
    );
}

fn write_lookup_png(texture: &ColorLookupTexture, path: &Path) -> Result<()> {
    let image = image::RgbaImage::from_raw(texture.width, texture.height, texture.to_rgba8())
        .context("lookup texture size does not match its pixel buffer")?;
    image
        .save(path)
        .with_context(|| format!("could not write lookup texture to {}", path.display()))?;
    log::info!(
        "Wrote {}x{} lookup texture to {}",
        texture.width,
        texture.height,
        path.display()
    );
    Ok(())
}
