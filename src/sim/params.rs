//! World parameters
//!
//! Owned by the driver and passed by reference into every advance call.
//! Loadable from partial JSON documents; missing fields take defaults.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::spatial::sanitize_cell_size;
use crate::consts::*;
use crate::error::Result;

/// Global forces, tunables and world bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldParameters {
    /// Downward acceleration (pixels/s², +y is down)
    pub gravity: f32,
    /// Global quadratic air drag coefficient
    pub quadratic_drag: f32,
    /// Global linear drag coefficient
    pub linear_drag: f32,
    /// Air velocity drag is measured against
    pub wind: Vec2,
    /// Substeps per advance call (at least 1)
    pub substeps: u32,
    /// Broadphase cell size, ideally near the median particle diameter
    pub cell_size: f32,
    /// Fraction of pair overlap removed per substep (0..=1)
    pub correction_percent: f32,
    /// World rectangle is [0, width] x [0, height], floor at y = height
    pub width: f32,
    pub height: f32,
}

impl Default for WorldParameters {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            quadratic_drag: QUADRATIC_DRAG,
            linear_drag: LINEAR_DRAG,
            wind: Vec2::ZERO,
            substeps: SUBSTEPS,
            cell_size: CELL_SIZE,
            correction_percent: CORRECTION_PERCENT,
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
        }
    }
}

impl WorldParameters {
    /// Parameters with every force switched off (no gravity, drag or wind)
    pub fn frictionless() -> Self {
        Self {
            gravity: 0.0,
            quadratic_drag: 0.0,
            linear_drag: 0.0,
            ..Default::default()
        }
    }

    pub fn with_bounds(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_substeps(mut self, substeps: u32) -> Self {
        self.substeps = substeps;
        self
    }

    /// Parse a JSON document; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        Ok(params.sanitized())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Effective substep count
    #[inline]
    pub fn substep_count(&self) -> u32 {
        self.substeps.max(1)
    }

    /// Copy with out-of-range tunables clamped to valid values
    ///
    /// Tunables never fail: a bad value degrades the simulation, not the process.
    pub fn sanitized(&self) -> Self {
        let mut out = self.clone();
        if out.substeps != self.substep_count() {
            log::warn!(
                "substeps {} out of range, using {}",
                self.substeps,
                self.substep_count()
            );
            out.substeps = self.substep_count();
        }
        let cell_size = sanitize_cell_size(self.cell_size);
        if cell_size != self.cell_size {
            log::warn!("cell size {} invalid, using {}", self.cell_size, cell_size);
            out.cell_size = cell_size;
        }
        if !(0.0..=1.0).contains(&self.correction_percent) {
            let percent = if self.correction_percent.is_nan() {
                CORRECTION_PERCENT
            } else {
                self.correction_percent.clamp(0.0, 1.0)
            };
            log::warn!(
                "correction percent {} out of range, using {}",
                self.correction_percent,
                percent
            );
            out.correction_percent = percent;
        }
        if !self.gravity.is_finite() {
            log::warn!("gravity {} invalid, using 0", self.gravity);
            out.gravity = 0.0;
        }
        if !self.wind.is_finite() {
            log::warn!("wind {} invalid, using zero", self.wind);
            out.wind = Vec2::ZERO;
        }
        for (name, value) in [
            ("quadratic drag", &mut out.quadratic_drag),
            ("linear drag", &mut out.linear_drag),
        ] {
            if !value.is_finite() || *value < 0.0 {
                log::warn!("{name} {value} invalid, using 0");
                *value = 0.0;
            }
        }
        out
    }

    /// Size of the world rectangle
    #[inline]
    pub fn bounds(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = WorldParameters::default();
        assert_eq!(params.gravity, 980.0);
        assert_eq!(params.substeps, 2);
        assert_eq!(params.cell_size, 80.0);
        assert_eq!(params.correction_percent, 0.8);
        assert_eq!(params.wind, Vec2::ZERO);
    }

    #[test]
    fn test_partial_json_keeps_defaults() -> Result<()> {
        let params = WorldParameters::from_json(r#"{ "gravity": 0.0, "wind": [10.0, -5.0] }"#)?;
        assert_eq!(params.gravity, 0.0);
        assert_eq!(params.wind, Vec2::new(10.0, -5.0));
        assert_eq!(params.substeps, SUBSTEPS);
        assert_eq!(params.width, WORLD_WIDTH);
        Ok(())
    }

    #[test]
    fn test_json_roundtrip() -> Result<()> {
        let params = WorldParameters::frictionless().with_bounds(320.0, 240.0);
        let back = WorldParameters::from_json(&params.to_json()?)?;
        assert_eq!(back, params);
        Ok(())
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = WorldParameters::from_json("{ gravity: }").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_sanitize_clamps_tunables() {
        let params = WorldParameters {
            substeps: 0,
            cell_size: -3.0,
            correction_percent: 4.0,
            quadratic_drag: -1.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(params.substeps, 1);
        assert_eq!(params.cell_size, MIN_CELL_SIZE);
        assert_eq!(params.correction_percent, 1.0);
        assert_eq!(params.quadratic_drag, 0.0);

        let many = WorldParameters::default().with_substeps(10_000).sanitized();
        assert_eq!(many.substeps, 10_000);
        assert_eq!(many.substep_count(), 10_000);
    }

    #[test]
    fn test_sanitize_zeroes_non_finite_forces() {
        let params = WorldParameters {
            gravity: f32::NAN,
            wind: Vec2::new(f32::INFINITY, 0.0),
            ..Default::default()
        }
        .sanitized();
        assert_eq!(params.gravity, 0.0);
        assert_eq!(params.wind, Vec2::ZERO);
    }
}
