//! Square falloff mask based on the Chebyshev (infinity) norm.
//!
//! Independent of the noise-shaped world border: the falloff pulls every edge of
//! the square down uniformly before the border shaper runs.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::field::grid::ScalarField;

/// Parameters for the falloff mask.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FalloffSettings {
    pub enabled: bool,
    /// Exponent `a` of `v^a / (v^a + (b - b v)^a)`.
    pub slope: f32,
    /// Shift `b` of the curve; larger values push the falloff toward the edge.
    pub position: f32,
    /// Post-falloff boost, applied as `1 + multiplier * 0.025`.
    pub multiplier: u32,
}

impl Default for FalloffSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            slope: 3.0,
            position: 2.2,
            multiplier: 0,
        }
    }
}

impl FalloffSettings {
    pub fn enabled(slope: f32, position: f32, multiplier: u32) -> Self {
        Self {
            enabled: true,
            slope,
            position,
            multiplier,
        }
    }
}

/// Falloff curve for a Chebyshev distance `value` in `[0, 1]`.
pub fn falloff_value(value: f32, slope: f32, position: f32) -> f32 {
    let a = value.powf(slope);
    let b = (position - position * value).powf(slope);
    let denom = a + b;
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    a / denom
}

/// Build a `dim` x `dim` falloff mask.
pub fn falloff_map(dim: usize, settings: &FalloffSettings) -> ScalarField {
    ScalarField::from_fn(dim, dim, |x, y| {
        let rel_y = y as f32 / dim as f32 * 2.0 - 1.0;
        let rel_x = x as f32 / dim as f32 * 2.0 - 1.0;
        let v = rel_y.abs().max(rel_x.abs());
        falloff_value(v, settings.slope, settings.position)
    })
}

/// Subtract `falloff` from `noise` and apply the boost, clamping into `[0, 1]`.
pub fn apply_falloff(noise: &mut ScalarField, falloff: &ScalarField, multiplier: u32) {
    debug_assert_eq!(noise.len(), falloff.len(), "falloff mask size mismatch");
    let boost = 1.0 + multiplier as f32 * 0.025;
    for (n, f) in noise.data_mut().iter_mut().zip(falloff.data()) {
        let v = (*n - *f).clamp(0.0, 1.0);
        *n = (v * boost).clamp(0.0, 1.0);
    }
}
