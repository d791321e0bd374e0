//! Elevation from the layered noise stack.

use glam::Vec3;

use crate::config::ShapeConfig;
use crate::elevation::ElevationRange;
use crate::error::Result;
use crate::noise_filter::NoiseFilter;

/// Turns points on the unit sphere into surface elevations.
///
/// Holds one [`NoiseFilter`] per configured layer and the elevation range observed
/// since the last [`ShapeGenerator::reset_range`].
#[derive(Debug, Clone)]
pub struct ShapeGenerator {
    config: ShapeConfig,
    filters: Vec<NoiseFilter>,
    elevation_range: ElevationRange,
}

impl ShapeGenerator {
    /// Validate `config` and build its filters. Fails fast on degenerate settings.
    pub fn new(config: ShapeConfig) -> Result<Self> {
        config.validate()?;
        let filters = config
            .layers
            .iter()
            .map(|layer| NoiseFilter::new(layer.kind, layer.noise.clone(), config.seed))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Shape generator: radius {}, {} noise layers ({} enabled)",
            config.radius,
            filters.len(),
            config.layers.iter().filter(|l| l.enabled).count()
        );

        Ok(Self {
            config,
            filters,
            elevation_range: ElevationRange::new(),
        })
    }

    pub fn config(&self) -> &ShapeConfig {
        &self.config
    }

    pub fn radius(&self) -> f32 {
        self.config.radius
    }

    /// Elevation at `point_on_unit_sphere` without touching the shared range.
    ///
    /// Layer 0 is always evaluated since later layers may use it as a mask; it only
    /// contributes to the elevation when enabled. Other disabled layers are skipped.
    pub fn unscaled_elevation(&self, point_on_unit_sphere: Vec3) -> f32 {
        let layers = &self.config.layers;
        let first_layer_value = self.filters[0].evaluate(point_on_unit_sphere);
        let mut elevation = if layers[0].enabled {
            first_layer_value
        } else {
            0.0
        };

        for (filter, layer) in self.filters.iter().zip(layers).skip(1) {
            if !layer.enabled {
                continue;
            }
            let mask = if layer.use_first_layer_as_mask {
                first_layer_value
            } else {
                1.0
            };
            elevation += filter.evaluate(point_on_unit_sphere) * mask;
        }

        elevation
    }

    /// Elevation at `point_on_unit_sphere`, recorded into the elevation range.
    pub fn evaluate_elevation(&mut self, point_on_unit_sphere: Vec3) -> f32 {
        let elevation = self.unscaled_elevation(point_on_unit_sphere);
        self.elevation_range.add_value(elevation);
        elevation
    }

    /// Distance from the planet center for an unscaled elevation.
    pub fn scale_point(&self, unscaled_elevation: f32) -> f32 {
        let elevation = if self.config.floor_clamp {
            unscaled_elevation.max(0.0)
        } else {
            unscaled_elevation
        };
        self.config.radius * (1.0 + elevation)
    }

    /// Displaced surface position for a unit sphere point. Records the elevation.
    pub fn point_on_planet(&mut self, point_on_unit_sphere: Vec3) -> Vec3 {
        let elevation = self.evaluate_elevation(point_on_unit_sphere);
        point_on_unit_sphere * self.scale_point(elevation)
    }

    pub fn elevation_range(&self) -> ElevationRange {
        self.elevation_range
    }

    /// Fold a worker's local range into the shared one.
    pub fn record_range(&mut self, range: ElevationRange) {
        self.elevation_range.widen(range);
    }

    /// Start a fresh pass.
    pub fn reset_range(&mut self) {
        self.elevation_range = ElevationRange::new();
    }
}
