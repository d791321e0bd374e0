//! Biome colours: per-point biome blend and the colour lookup texture.
//!
//! The renderer samples the lookup texture with `u` from elevation and `v` from the
//! biome blend stored in each vertex's UV.

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::elevation::ElevationRange;
use crate::error::{PlanetError, Result};
use crate::noise_filter::{NoiseFilter, NoiseKind, NoiseSettings};

/// Texels per lookup texture row.
pub const DEFAULT_TEXTURE_RESOLUTION: u32 = 50;
/// Widest lookup texture row accepted.
pub const MAX_TEXTURE_RESOLUTION: u32 = 4096;

// Keeps the blend band non-empty when blend_amount is 0.
const BLEND_EPSILON: f32 = 0.001;

/// Colour stop of a [`Gradient`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientKey {
    /// Position along the gradient in [0, 1].
    pub time: f32,
    /// Linear RGBA.
    pub color: Vec4,
}

impl GradientKey {
    pub fn new(time: f32, color: Vec4) -> Self {
        Self { time, color }
    }
}

/// Piecewise linear colour ramp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gradient {
    pub keys: Vec<GradientKey>,
}

impl Default for Gradient {
    fn default() -> Self {
        Self::new(vec![
            GradientKey::new(0.0, Vec4::ONE),
            GradientKey::new(1.0, Vec4::ONE),
        ])
    }
}

impl Gradient {
    /// Keys are sorted by time.
    pub fn new(mut keys: Vec<GradientKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn two(from: Vec4, to: Vec4) -> Self {
        Self::new(vec![GradientKey::new(0.0, from), GradientKey::new(1.0, to)])
    }

    /// Colour at `t`, clamped to the first and last key.
    pub fn evaluate(&self, t: f32) -> Vec4 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Vec4::ONE,
        };
        if t.is_nan() || t <= first.time {
            return first.color;
        }
        if t >= last.time {
            return last.color;
        }

        let upper = self.keys.partition_point(|k| k.time <= t);
        let (a, b) = (&self.keys[upper - 1], &self.keys[upper]);
        let span = b.time - a.time;
        if span <= 0.0 {
            return b.color;
        }
        a.color.lerp(b.color, (t - a.time) / span)
    }

    fn validate(&self) -> Result<()> {
        for key in &self.keys {
            if !(0.0..=1.0).contains(&key.time) || !key.color.is_finite() {
                return Err(PlanetError::invalid(format!(
                    "gradient key {:?} must have time in [0, 1] and a finite colour",
                    key
                )));
            }
        }
        if self.keys.windows(2).any(|w| w[0].time > w[1].time) {
            return Err(PlanetError::invalid("gradient keys must be sorted by time"));
        }
        Ok(())
    }
}

/// A height band with its own colour ramp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Biome {
    pub gradient: Gradient,
    pub tint: Vec4,
    /// Height percent in [0, 1] where this biome takes over.
    pub start_height: f32,
    /// How much of `tint` is mixed into the gradient, in [0, 1].
    pub tint_percent: f32,
}

impl Default for Biome {
    fn default() -> Self {
        Self {
            gradient: Gradient::default(),
            tint: Vec4::ONE,
            start_height: 0.0,
            tint_percent: 0.0,
        }
    }
}

/// Biomes in ascending height order plus the noise that wobbles their borders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeConfig {
    pub biomes: Vec<Biome>,
    pub noise_kind: NoiseKind,
    pub noise: NoiseSettings,
    pub noise_seed: u32,
    /// Subtracted from the noise sample before scaling.
    pub noise_offset: f32,
    pub noise_strength: f32,
    /// Width of the blend band between neighbouring biomes, in [0, 1].
    pub blend_amount: f32,
    pub texture_resolution: u32,
}

impl Default for BiomeConfig {
    fn default() -> Self {
        let rgb = |r: f32, g: f32, b: f32| Vec4::new(r, g, b, 1.0);
        Self {
            biomes: vec![
                Biome {
                    gradient: Gradient::two(rgb(0.55, 0.60, 0.68), rgb(0.92, 0.95, 1.0)),
                    tint: rgb(0.8, 0.9, 1.0),
                    start_height: 0.0,
                    tint_percent: 0.1,
                },
                Biome {
                    gradient: Gradient::new(vec![
                        GradientKey::new(0.0, rgb(0.76, 0.70, 0.50)),
                        GradientKey::new(0.3, rgb(0.22, 0.48, 0.20)),
                        GradientKey::new(0.8, rgb(0.40, 0.36, 0.30)),
                        GradientKey::new(1.0, rgb(0.95, 0.95, 0.95)),
                    ]),
                    tint: rgb(0.3, 0.5, 0.2),
                    start_height: 0.15,
                    tint_percent: 0.0,
                },
                Biome {
                    gradient: Gradient::two(rgb(0.60, 0.65, 0.72), rgb(1.0, 1.0, 1.0)),
                    tint: rgb(0.8, 0.9, 1.0),
                    start_height: 0.85,
                    tint_percent: 0.1,
                },
            ],
            noise_kind: NoiseKind::Simple,
            noise: NoiseSettings {
                octaves: 3,
                frequency: 2.5,
                ..Default::default()
            },
            noise_seed: 0,
            noise_offset: 0.5,
            noise_strength: 0.15,
            blend_amount: 0.15,
            texture_resolution: DEFAULT_TEXTURE_RESOLUTION,
        }
    }
}

impl BiomeConfig {
    pub fn validate(&self) -> Result<()> {
        if !(2..=MAX_TEXTURE_RESOLUTION).contains(&self.texture_resolution) {
            return Err(PlanetError::invalid(format!(
                "texture resolution must be in 2..={}, got {}",
                MAX_TEXTURE_RESOLUTION, self.texture_resolution
            )));
        }
        if !(0.0..=1.0).contains(&self.blend_amount) {
            return Err(PlanetError::invalid(format!(
                "blend amount must be in [0, 1], got {}",
                self.blend_amount
            )));
        }
        if !self.noise_offset.is_finite() || !self.noise_strength.is_finite() {
            return Err(PlanetError::invalid("biome noise offset and strength must be finite"));
        }
        self.noise.validate()?;

        for (i, biome) in self.biomes.iter().enumerate() {
            if !(0.0..=1.0).contains(&biome.start_height) {
                return Err(PlanetError::invalid(format!(
                    "biome {} start height must be in [0, 1], got {}",
                    i, biome.start_height
                )));
            }
            if !(0.0..=1.0).contains(&biome.tint_percent) {
                return Err(PlanetError::invalid(format!(
                    "biome {} tint percent must be in [0, 1], got {}",
                    i, biome.tint_percent
                )));
            }
            if !biome.tint.is_finite() {
                return Err(PlanetError::invalid(format!("biome {} tint must be finite", i)));
            }
            biome.gradient.validate()?;
        }
        Ok(())
    }
}

/// Width x height RGBA grid, one row per biome.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorLookupTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec4>,
}

impl ColorLookupTexture {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Vec4::new(0.0, 0.0, 0.0, 1.0); width as usize * height as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Vec4> {
        if x < self.width && y < self.height {
            self.pixels.get(y as usize * self.width as usize + x as usize).copied()
        } else {
            None
        }
    }

    pub fn row(&self, y: u32) -> Option<&[Vec4]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.width as usize;
        self.pixels.get(start..start + self.width as usize)
    }

    /// Packed 8-bit RGBA, row-major.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|c| {
                let c = c.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
                [c.x as u8, c.y as u8, c.z as u8, c.w as u8]
            })
            .collect()
    }
}

/// What the renderer binds for terrain shading.
#[derive(Debug, Clone, Copy)]
pub struct ShadingData<'a> {
    /// Min and max unscaled elevation of the current meshes.
    pub elevation_min_max: Vec2,
    pub lookup: &'a ColorLookupTexture,
}

#[inline]
fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

/// Produces biome blend values and the colour lookup texture.
#[derive(Debug, Clone)]
pub struct ColorGenerator {
    config: BiomeConfig,
    biome_filter: NoiseFilter,
    texture: ColorLookupTexture,
    elevation_range: ElevationRange,
}

impl ColorGenerator {
    pub fn new(config: BiomeConfig) -> Result<Self> {
        config.validate()?;

        if config.biomes.is_empty() {
            log::warn!("No biomes configured, using a single white gradient");
        } else if config
            .biomes
            .windows(2)
            .any(|w| w[0].start_height > w[1].start_height)
        {
            log::warn!("Biome start heights are not ascending; blending will be uneven");
        }

        let biome_filter = NoiseFilter::new(config.noise_kind, config.noise.clone(), config.noise_seed)?;
        let rows = config.biomes.len().max(1) as u32;
        let texture = ColorLookupTexture::new(config.texture_resolution, rows);

        Ok(Self {
            config,
            biome_filter,
            texture,
            elevation_range: ElevationRange::new(),
        })
    }

    pub fn config(&self) -> &BiomeConfig {
        &self.config
    }

    /// Publish the elevation range of the latest meshes.
    pub fn update_elevation(&mut self, range: ElevationRange) {
        self.elevation_range = range;
    }

    pub fn elevation_range(&self) -> ElevationRange {
        self.elevation_range
    }

    /// Biome blend in [0, 1]: 0 is the first biome, 1 the last.
    pub fn biome_blend_from_point(&self, point_on_unit_sphere: Vec3) -> f32 {
        let config = &self.config;
        let mut height_percent = (point_on_unit_sphere.y + 1.0) / 2.0;
        height_percent += (self.biome_filter.evaluate(point_on_unit_sphere) - config.noise_offset)
            * config.noise_strength;

        let blend_range = config.blend_amount / 2.0 + BLEND_EPSILON;
        let mut biome_index = 0.0;
        for (i, biome) in config.biomes.iter().enumerate() {
            let dst = height_percent - biome.start_height;
            let weight = inverse_lerp(-blend_range, blend_range, dst);
            biome_index *= 1.0 - weight;
            biome_index += i as f32 * weight;
        }

        biome_index / config.biomes.len().saturating_sub(1).max(1) as f32
    }

    /// Resample every biome gradient into its texture row, mixed with the tint.
    pub fn rebuild_lookup_texture(&mut self) {
        let width = self.texture.width;
        let fallback = [Biome::default()];
        let biomes: &[Biome] = if self.config.biomes.is_empty() {
            &fallback
        } else {
            &self.config.biomes
        };

        let mut pixels = Vec::with_capacity(width as usize * self.texture.height as usize);
        for biome in biomes {
            for i in 0..width {
                let t = i as f32 / (width - 1) as f32;
                let gradient = biome.gradient.evaluate(t);
                pixels.push(gradient * (1.0 - biome.tint_percent) + biome.tint * biome.tint_percent);
            }
        }
        self.texture.pixels = pixels;

        log::debug!("Rebuilt colour lookup texture {}x{}", width, self.texture.height);
    }

    pub fn texture(&self) -> &ColorLookupTexture {
        &self.texture
    }

    pub fn shading_data(&self) -> ShadingData<'_> {
        ShadingData {
            elevation_min_max: self.elevation_range.as_vec2(),
            lookup: &self.texture,
        }
    }
}
