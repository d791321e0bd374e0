//! Fractal noise filters layered on top of 3D gradient noise.
//!
//! A [`NoiseFilter`] is a pure function of its settings and the sample point, so
//! the same filter can be shared by any number of worker threads.

use glam::Vec3;
use noise::{NoiseFn, Simplex};
use serde::{Deserialize, Serialize};

use crate::error::{PlanetError, Result};

/// Highest octave count a layer may request.
pub const MAX_OCTAVES: u32 = 8;

/// Stateless gradient noise: maps a 3D point to a scalar in [-1, 1].
#[derive(Clone)]
pub struct NoiseEvaluator {
    seed: u32,
    simplex: Simplex,
}

impl NoiseEvaluator {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            simplex: Simplex::new(seed),
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Sample the noise field. Total over finite input.
    #[inline]
    pub fn evaluate(&self, point: Vec3) -> f32 {
        let v = self
            .simplex
            .get([point.x as f64, point.y as f64, point.z as f64]);
        (v as f32).clamp(-1.0, 1.0)
    }
}

impl Default for NoiseEvaluator {
    fn default() -> Self {
        Self::new(0)
    }
}

impl std::fmt::Debug for NoiseEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseEvaluator").field("seed", &self.seed).finish()
    }
}

/// Which octave accumulation a filter uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoiseKind {
    /// Smooth rolling fBm, floored at zero.
    #[default]
    Simple,
    /// Ridged noise with per-octave weight feedback.
    Rigid,
}

/// Parameters of one fractal noise signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Final multiplier applied after the min-value offset.
    pub strength: f32,
    /// Number of noise layers summed (1..=8).
    pub octaves: u32,
    /// Frequency of the first octave.
    pub frequency: f32,
    /// Frequency multiplier per octave.
    pub roughness: f32,
    /// Amplitude multiplier per octave.
    pub persistence: f32,
    /// Offset added to every sample point.
    pub center: Vec3,
    /// Subtracted from the accumulated value before scaling.
    pub min_value: f32,
    /// Weight feedback gain. Only read by [`NoiseKind::Rigid`].
    pub weight_multiplier: f32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            strength: 1.0,
            octaves: 3,
            frequency: 1.0,
            roughness: 2.0,
            persistence: 0.5,
            center: Vec3::ZERO,
            min_value: 0.0,
            weight_multiplier: 0.8,
        }
    }
}

impl NoiseSettings {
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_OCTAVES).contains(&self.octaves) {
            return Err(PlanetError::invalid(format!(
                "octaves must be in 1..={}, got {}",
                MAX_OCTAVES, self.octaves
            )));
        }
        let scalars = [
            ("strength", self.strength),
            ("frequency", self.frequency),
            ("roughness", self.roughness),
            ("persistence", self.persistence),
            ("min_value", self.min_value),
            ("weight_multiplier", self.weight_multiplier),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(PlanetError::invalid(format!("{} must be finite, got {}", name, value)));
            }
        }
        if !self.center.is_finite() {
            return Err(PlanetError::invalid(format!("center must be finite, got {}", self.center)));
        }
        Ok(())
    }
}

/// A configured fractal noise signal. The kind is fixed at construction.
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    kind: NoiseKind,
    settings: NoiseSettings,
    noise: NoiseEvaluator,
}

impl NoiseFilter {
    pub fn new(kind: NoiseKind, settings: NoiseSettings, seed: u32) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            kind,
            settings,
            noise: NoiseEvaluator::new(seed),
        })
    }

    pub fn kind(&self) -> NoiseKind {
        self.kind
    }

    pub fn settings(&self) -> &NoiseSettings {
        &self.settings
    }

    /// Evaluate the filter at `point`.
    pub fn evaluate(&self, point: Vec3) -> f32 {
        match self.kind {
            NoiseKind::Simple => self.evaluate_simple(point),
            NoiseKind::Rigid => self.evaluate_rigid(point),
        }
    }

    fn evaluate_simple(&self, point: Vec3) -> f32 {
        let s = &self.settings;
        let mut value = 0.0;
        let mut frequency = s.frequency;
        let mut amplitude = 1.0;

        for _ in 0..s.octaves {
            let v = self.noise.evaluate(point * frequency + s.center);
            value += (v + 1.0) * 0.5 * amplitude;
            frequency *= s.roughness;
            amplitude *= s.persistence;
        }

        (value - s.min_value).max(0.0) * s.strength
    }

    // Octaves must run in order: each weight depends on the previous octave.
    fn evaluate_rigid(&self, point: Vec3) -> f32 {
        let s = &self.settings;
        let mut value = 0.0;
        let mut frequency = s.frequency;
        let mut amplitude = 1.0;
        let mut weight = 1.0;

        for _ in 0..s.octaves {
            let mut v = 1.0 - self.noise.evaluate(point * frequency + s.center).abs();
            v *= v;
            v *= weight;
            weight = (v * s.weight_multiplier).clamp(0.0, 1.0);

            value += v * amplitude;
            frequency *= s.roughness;
            amplitude *= s.persistence;
        }

        (value - s.min_value) * s.strength
    }
}
