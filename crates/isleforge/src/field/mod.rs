//! Scalar fields and the noise that fills them.
//!
//! This module groups the grid storage ([`ScalarField`]), the fractal noise sampler
//! ([`NoiseField`]), the square falloff mask, and the response curves used when
//! shaping heights.
pub mod curve;
pub mod falloff;
pub mod grid;
pub mod noise;

pub use curve::{Curve, CurveKey};
pub use falloff::{apply_falloff, falloff_map, falloff_value, FalloffSettings};
pub use grid::{Heightfield, ScalarField, SpawnEligibilityField};
pub use self::noise::{NoiseField, NoiseSettings};

/// Position of `v` between `a` and `b`, clamped into `[0, 1]`. Returns 0 when `a == b`.
#[inline]
pub fn inverse_lerp(a: f32, b: f32, v: f32) -> f32 {
    if a == b {
        return 0.0;
    }
    ((v - a) / (b - a)).clamp(0.0, 1.0)
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
