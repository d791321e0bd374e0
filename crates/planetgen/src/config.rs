//! Shape configuration: planet radius plus the ordered noise layer stack.

use glam::Vec3;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PlanetError, Result};
use crate::noise_filter::{NoiseKind, NoiseSettings};

/// One layer of the elevation stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseLayerConfig {
    pub kind: NoiseKind,
    /// Disabled layers are skipped. Layer 0 is still evaluated for its mask value.
    pub enabled: bool,
    /// Multiply this layer by layer 0's raw value.
    pub use_first_layer_as_mask: bool,
    pub noise: NoiseSettings,
}

impl Default for NoiseLayerConfig {
    fn default() -> Self {
        Self {
            kind: NoiseKind::Simple,
            enabled: true,
            use_first_layer_as_mask: false,
            noise: NoiseSettings::default(),
        }
    }
}

impl NoiseLayerConfig {
    pub fn simple(noise: NoiseSettings) -> Self {
        Self {
            kind: NoiseKind::Simple,
            noise,
            ..Default::default()
        }
    }

    pub fn rigid(noise: NoiseSettings) -> Self {
        Self {
            kind: NoiseKind::Rigid,
            noise,
            ..Default::default()
        }
    }

    pub fn masked(mut self) -> Self {
        self.use_first_layer_as_mask = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Planet radius and the noise layers that displace its surface.
///
/// Layer order matters: layer 0 doubles as the mask source for later layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    /// Radius of the undisplaced sphere, in world units.
    pub radius: f32,
    /// Gradient noise permutation seed shared by all layers.
    pub seed: u32,
    /// Clamp negative elevation to zero so no vertex sinks below `radius`.
    pub floor_clamp: bool,
    pub layers: Vec<NoiseLayerConfig>,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        let continents = NoiseSettings {
            strength: 0.12,
            octaves: 4,
            frequency: 1.2,
            roughness: 2.2,
            persistence: 0.5,
            center: Vec3::ZERO,
            min_value: 0.95,
            weight_multiplier: 0.8,
        };
        let ridges = NoiseSettings {
            strength: 0.6,
            octaves: 5,
            frequency: 1.5,
            roughness: 2.4,
            persistence: 0.5,
            center: Vec3::new(4.0, -2.0, 7.5),
            min_value: 0.4,
            weight_multiplier: 0.8,
        };
        Self {
            radius: 1.0,
            seed: 0,
            floor_clamp: true,
            layers: vec![
                NoiseLayerConfig::simple(continents),
                NoiseLayerConfig::rigid(ridges).masked(),
            ],
        }
    }
}

impl ShapeConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(PlanetError::invalid(format!(
                "planet radius must be positive and finite, got {}",
                self.radius
            )));
        }
        if self.layers.is_empty() {
            return Err(PlanetError::invalid("shape needs at least one noise layer"));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            layer.noise.validate().map_err(|e| match e {
                PlanetError::InvalidConfiguration(msg) => {
                    PlanetError::invalid(format!("noise layer {}: {}", i, msg))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    /// Copy of `self` with every layer center jittered from `seed`.
    /// The same seed always yields the same shape.
    pub fn randomized(&self, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut config = self.clone();
        config.seed = rng.gen();
        for layer in &mut config.layers {
            layer.noise.center += Vec3::new(
                rng.gen_range(-100.0..100.0),
                rng.gen_range(-100.0..100.0),
                rng.gen_range(-100.0..100.0),
            );
        }
        config
    }
}
