//! Running min/max of observed elevations.

use glam::{Vec2, Vec3};

/// Min/max pair that only ever widens.
///
/// Before any value is added the range is empty (`min = +inf`, `max = -inf`).
/// [`ElevationRange::widen`] is commutative and associative, so partial ranges
/// from parallel workers can be folded in any order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationRange {
    pub min: f32,
    pub max: f32,
}

impl Default for ElevationRange {
    fn default() -> Self {
        Self::new()
    }
}

impl ElevationRange {
    pub const EMPTY: Self = Self {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };

    pub fn new() -> Self {
        Self::EMPTY
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn add_value(&mut self, value: f32) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Fold another range into this one.
    pub fn widen(&mut self, other: ElevationRange) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn merged(mut self, other: ElevationRange) -> Self {
        self.widen(other);
        self
    }

    /// Range of distances from the origin over `positions`.
    pub fn from_magnitudes(positions: &[Vec3]) -> Self {
        positions.iter().fold(Self::new(), |mut range, p| {
            range.add_value(p.length());
            range
        })
    }

    /// `(min, max)` packed for a shader uniform.
    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let range = ElevationRange::new();
        assert!(range.is_empty());
        assert_eq!(range.min, f32::INFINITY);
        assert_eq!(range.max, f32::NEG_INFINITY);
    }

    #[test]
    fn single_value_collapses_range() {
        let mut range = ElevationRange::new();
        range.add_value(0.25);
        assert!(!range.is_empty());
        assert_eq!(range.min, 0.25);
        assert_eq!(range.max, 0.25);
    }

    #[test]
    fn widen_is_order_independent() {
        let values = [0.3, -1.2, 4.0, 0.0, 2.5, -0.1];
        let parts: Vec<ElevationRange> = values
            .chunks(2)
            .map(|c| {
                let mut r = ElevationRange::new();
                c.iter().for_each(|&v| r.add_value(v));
                r
            })
            .collect();

        let forward = parts.iter().fold(ElevationRange::new(), |a, &b| a.merged(b));
        let backward = parts.iter().rev().fold(ElevationRange::new(), |a, &b| a.merged(b));
        assert_eq!(forward, backward);
        assert_eq!(forward.min, -1.2);
        assert_eq!(forward.max, 4.0);
    }

    #[test]
    fn widening_with_empty_is_identity() {
        let mut range = ElevationRange::new();
        range.add_value(1.0);
        range.add_value(2.0);
        assert_eq!(range.merged(ElevationRange::EMPTY), range);
    }

    #[test]
    fn magnitudes() {
        let range = ElevationRange::from_magnitudes(&[
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(3.0, 0.0, 4.0),
            Vec3::new(0.0, 0.0, -1.5),
        ]);
        assert_eq!(range.min, 1.5);
        assert_eq!(range.max, 5.0);
    }
}
