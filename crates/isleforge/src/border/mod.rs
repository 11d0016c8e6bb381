//! Irregular world border derived from angular fractal noise.
//!
//! The border is a function `angle -> normalized radius` evaluated on demand. Points
//! are tested in normalized `(u, v)` space: the coordinate is recentred into
//! `[-1, 1]^2`, its radius is re-projected onto the bounding square along its
//! direction, and the result is compared against [`WorldBorder::border_radius`].
//!
//! The same test drives [`WorldBorder::apply_to_heights`], which raises a ridge just
//! inside the border and fades the terrain to zero just outside it, and
//! [`WorldBorder::apply_to_spawn_map`], which blocks spawning on and near the edge.
use std::f32::consts::PI;

use ::noise::Perlin;
use glam::{Vec2, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::field::noise::perlin01;
use crate::field::{inverse_lerp, lerp, Curve, ScalarField};

/// Scales at or below zero are replaced by this value.
pub const MIN_BORDER_SCALE: f32 = 1e-4;

const CENTER_EPSILON: f32 = 1e-6;
const AXIS_EPSILON: f32 = 1e-4;

/// Shape and edge-treatment parameters of the world border.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct BorderSettings {
    /// Base radius of the border relative to the half-extent of the world.
    pub radius_size: f32,
    /// How far the noise may push the radius in or out.
    pub irregularity: f32,
    /// Radius of the circle the main noise is sampled on.
    pub noise_scale: f32,
    pub octaves: u32,
    pub persistence: f32,
    pub lacunarity: f32,

    /// Strength of the angular pre-warp; zero disables the warp sample.
    pub warp_strength: f32,
    pub warp_scale: f32,

    /// Raise a ridge of mountains just inside the border.
    pub use_mountains: bool,
    /// Width of the ridge ring inside the border.
    pub inner_width: f32,
    /// Width of the fade-to-void ring outside the border.
    pub outer_width: f32,
    pub ridge_add_height: f32,
    pub ridge_noise_amplitude: f32,
    pub ridge_noise_scale: f32,
    pub inner_curve: Curve,
    pub outer_curve: Curve,

    /// Spawning is blocked this far inside the border.
    pub no_spawn_near_border: f32,
}

impl Default for BorderSettings {
    fn default() -> Self {
        Self {
            radius_size: 0.9,
            irregularity: 0.12,
            noise_scale: 2.2,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            warp_strength: 0.12,
            warp_scale: 1.1,
            use_mountains: true,
            inner_width: 0.06,
            outer_width: 0.10,
            ridge_add_height: 0.20,
            ridge_noise_amplitude: 0.10,
            ridge_noise_scale: 8.0,
            inner_curve: Curve::EaseInOut,
            outer_curve: Curve::EaseInOut,
            no_spawn_near_border: 0.06,
        }
    }
}

impl BorderSettings {
    pub fn with_shape(mut self, radius_size: f32, irregularity: f32) -> Self {
        self.radius_size = radius_size;
        self.irregularity = irregularity;
        self
    }

    pub fn with_warp(mut self, strength: f32, scale: f32) -> Self {
        self.warp_strength = strength;
        self.warp_scale = scale;
        self
    }

    pub fn with_mountains(mut self, use_mountains: bool) -> Self {
        self.use_mountains = use_mountains;
        self
    }

    pub fn with_widths(mut self, inner_width: f32, outer_width: f32) -> Self {
        self.inner_width = inner_width;
        self.outer_width = outer_width;
        self
    }

    pub fn with_no_spawn_near_border(mut self, width: f32) -> Self {
        self.no_spawn_near_border = width;
        self
    }

    /// Validates the settings, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if !(self.radius_size > 0.0 && self.radius_size <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "border radius_size must be in (0, 1], got {}",
                self.radius_size
            )));
        }
        if self.octaves == 0 {
            return Err(Error::InvalidConfig("border octaves must be >= 1".into()));
        }
        Ok(())
    }
}

/// Polar description of a point relative to the border.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BorderSample {
    /// Radius of the point re-projected onto the bounding square, 1 at the square edge.
    pub r_norm: f32,
    /// Border radius along the point's direction.
    pub r_border: f32,
}

/// Seeded world border.
#[derive(Clone, Debug)]
pub struct WorldBorder {
    settings: BorderSettings,
    seed: i32,
    perlin: Perlin,
}

impl WorldBorder {
    pub fn new(settings: BorderSettings, seed: i32) -> Self {
        Self {
            settings,
            seed,
            perlin: Perlin::new(seed as u32),
        }
    }

    pub fn try_new(settings: BorderSettings, seed: i32) -> Result<Self> {
        settings.validate()?;
        Ok(Self::new(settings, seed))
    }

    pub fn settings(&self) -> &BorderSettings {
        &self.settings
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }

    /// Border radius in `[0, 1]` for an angle in radians (as returned by `atan2`).
    pub fn border_radius(&self, angle: f32) -> f32 {
        let s = &self.settings;
        let theta01 = (angle + PI) / (2.0 * PI);

        let warp = if s.warp_strength > 0.0 {
            let w = self.fbm_on_circle(theta01, s.warp_scale);
            (w - 0.5) * 2.0 * s.warp_strength
        } else {
            0.0
        };

        let n = self.fbm_on_circle(theta01 + warp, s.noise_scale);
        let signed = (n - 0.5) * 2.0;
        (s.radius_size + signed * s.irregularity).clamp(0.0, 1.0)
    }

    /// Polar sample for a normalized coordinate, `None` at the exact centre or along a
    /// degenerate direction (both count as inside).
    pub fn sample_uv(&self, u01: f32, v01: f32) -> Option<BorderSample> {
        let cx = (u01 - 0.5) * 2.0;
        let cy = (v01 - 0.5) * 2.0;
        self.sample_centered(cx, cy)
    }

    fn sample_centered(&self, cx: f32, cy: f32) -> Option<BorderSample> {
        let r = (cx * cx + cy * cy).sqrt();
        if r < CENTER_EPSILON {
            return None;
        }
        let dir = Vec2::new(cx / r, cy / r);
        let r_max = ray_to_square_max_radius(dir);
        if r_max < CENTER_EPSILON {
            return None;
        }
        Some(BorderSample {
            r_norm: r / r_max,
            r_border: self.border_radius(cy.atan2(cx)),
        })
    }

    /// Whether a normalized coordinate lies inside the border.
    pub fn is_inside_uv(&self, u01: f32, v01: f32) -> bool {
        match self.sample_uv(u01, v01) {
            Some(s) => s.r_norm <= s.r_border,
            None => true,
        }
    }

    /// Whether a world position lies inside the border of a terrain at `origin` with
    /// extent `size`. Positions outside the terrain rectangle are outside the world.
    pub fn is_inside_world(&self, pos: Vec3, origin: Vec3, size: Vec3) -> bool {
        let u = unclamped_inverse_lerp(origin.x, origin.x + size.x, pos.x);
        let v = unclamped_inverse_lerp(origin.z, origin.z + size.z, pos.z);
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return false;
        }
        self.is_inside_uv(u, v)
    }

    /// Shape the heights near the border: a ridge blended in over the inner ring, a
    /// fade to zero over the outer ring, and zero beyond it.
    pub fn apply_to_heights(&self, heights: &mut ScalarField) {
        let s = &self.settings;
        let in_w = s.inner_width.max(0.0);
        let out_w = s.outer_width.max(0.0);
        let (w, h) = (heights.width(), heights.height());
        let mut voided = 0usize;

        for y in 0..h {
            for x in 0..w {
                let (u01, v01) = heights.cell_uv(x, y);
                let Some(BorderSample { r_norm, r_border }) = self.sample_uv(u01, v01) else {
                    continue;
                };

                let outer_end = r_border + out_w;
                if r_norm > outer_end {
                    heights.set(x, y, 0.0);
                    voided += 1;
                    continue;
                }

                let original = heights.get(x, y);
                let ridge = if s.use_mountains {
                    let n = self.ridged_noise(u01, v01, s.ridge_noise_scale);
                    let signed = (n - 0.5) * 2.0;
                    let add = s.ridge_add_height + signed * s.ridge_noise_amplitude;
                    (original + add.max(0.0)).clamp(0.0, 1.0)
                } else {
                    original
                };

                if out_w > 0.0 && r_norm > r_border {
                    let t = inverse_lerp(r_border, outer_end, r_norm);
                    let wc = s.outer_curve.evaluate(t).clamp(0.0, 1.0);
                    heights.set(x, y, lerp(ridge, 0.0, wc));
                    continue;
                }

                if s.use_mountains && in_w > 0.0 {
                    let inner_start = r_border - in_w;
                    if r_norm > inner_start {
                        let t = inverse_lerp(inner_start, r_border, r_norm);
                        let wc = s.inner_curve.evaluate(t).clamp(0.0, 1.0);
                        let target = original.max(ridge);
                        heights.set(x, y, lerp(original, target, wc));
                    }
                }
            }
        }

        debug!(
            "Border applied to {}x{} heights; {} cells voided.",
            w, h, voided
        );
    }

    /// Zero spawn eligibility outside the border and within the inward no-spawn buffer.
    pub fn apply_to_spawn_map(&self, spawn_map: &mut ScalarField) {
        let block = self.settings.no_spawn_near_border.max(0.0);
        let (w, h) = (spawn_map.width(), spawn_map.height());

        for y in 0..h {
            for x in 0..w {
                let (u01, v01) = spawn_map.cell_uv(x, y);
                let cx = (u01 - 0.5) * 2.0;
                let cy = (v01 - 0.5) * 2.0;

                let r = (cx * cx + cy * cy).sqrt();
                if r < CENTER_EPSILON {
                    continue;
                }
                let dir = Vec2::new(cx / r, cy / r);
                let r_max = ray_to_square_max_radius(dir);
                if r_max < CENTER_EPSILON {
                    spawn_map.set(x, y, 0.0);
                    continue;
                }

                let r_norm = r / r_max;
                let r_border = self.border_radius(cy.atan2(cx));
                if r_norm > r_border || (block > 0.0 && r_norm > r_border - block) {
                    spawn_map.set(x, y, 0.0);
                }
            }
        }
    }

    fn fbm_on_circle(&self, theta01: f32, scale: f32) -> f32 {
        let s = &self.settings;
        let scale = guard_scale(scale);
        let base_angle = theta01 * 2.0 * PI;

        let mut amp = 1.0f32;
        let mut freq = 1.0f32;
        let mut sum = 0.0f32;
        let mut norm = 0.0f32;

        for _ in 0..s.octaves {
            let a = base_angle * freq;
            let sx = a.cos() * scale + self.seed as f32 * 0.013;
            let sy = a.sin() * scale + self.seed as f32 * 0.017;

            sum += perlin01(&self.perlin, sx, sy) * amp;
            norm += amp;

            amp *= s.persistence;
            freq *= s.lacunarity;
        }

        if norm > 0.0 {
            sum / norm
        } else {
            0.5
        }
    }

    fn ridged_noise(&self, u01: f32, v01: f32, scale: f32) -> f32 {
        let scale = guard_scale(scale);
        let x = u01 * scale + self.seed as f32 * 0.021;
        let y = v01 * scale + self.seed as f32 * 0.037;
        let n = perlin01(&self.perlin, x, y);
        1.0 - (2.0 * n - 1.0).abs()
    }
}

/// Parametric distance from the centre to the edge of the `[-1, 1]^2` square along `dir`.
pub fn ray_to_square_max_radius(dir: Vec2) -> f32 {
    let ax = dir.x.abs();
    let ay = dir.y.abs();
    let tx = if ax > AXIS_EPSILON { 1.0 / ax } else { f32::INFINITY };
    let ty = if ay > AXIS_EPSILON { 1.0 / ay } else { f32::INFINITY };
    tx.min(ty)
}

#[inline]
fn guard_scale(scale: f32) -> f32 {
    if scale <= 0.0 || !scale.is_finite() {
        MIN_BORDER_SCALE
    } else {
        scale
    }
}

#[inline]
fn unclamped_inverse_lerp(a: f32, b: f32, v: f32) -> f32 {
    if a == b {
        return 0.0;
    }
    (v - a) / (b - a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn border(seed: i32) -> WorldBorder {
        WorldBorder::new(BorderSettings::default().with_shape(0.9, 0.12), seed)
    }

    #[test]
    fn radius_is_unit_range_for_all_angles() {
        for seed in [0, 1, 42, -7, 9999] {
            let b = border(seed);
            for i in 0..360 {
                let angle = (i as f32).to_radians() - PI;
                let r = b.border_radius(angle);
                assert!((0.0..=1.0).contains(&r), "seed {seed} angle {angle}: {r}");
            }
        }
    }

    #[test]
    fn centre_is_always_inside() {
        for seed in 0..32 {
            let settings = BorderSettings::default().with_shape(0.1, 0.5);
            assert!(WorldBorder::new(settings, seed).is_inside_uv(0.5, 0.5));
        }
    }

    #[test]
    fn seed_42_scenario_corner_is_outside() {
        let b = border(42);
        assert!(b.is_inside_uv(0.5, 0.5));
        assert!(!b.is_inside_uv(0.01, 0.01));
    }

    #[test]
    fn ray_to_square_matches_axis_and_diagonal() {
        assert_eq!(ray_to_square_max_radius(Vec2::new(1.0, 0.0)), 1.0);
        let d = Vec2::new(1.0, 1.0).normalize();
        assert!((ray_to_square_max_radius(d) - 2f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn world_positions_outside_terrain_are_outside() {
        let b = border(3);
        let origin = Vec3::ZERO;
        let size = Vec3::new(100.0, 50.0, 100.0);
        assert!(b.is_inside_world(Vec3::new(50.0, 0.0, 50.0), origin, size));
        assert!(!b.is_inside_world(Vec3::new(-1.0, 0.0, 50.0), origin, size));
        assert!(!b.is_inside_world(Vec3::new(50.0, 0.0, 101.0), origin, size));
    }

    #[test]
    fn heights_are_voided_beyond_the_outer_ring() {
        let b = border(42);
        let mut heights = ScalarField::from_fn(65, 65, |_, _| 0.5);
        b.apply_to_heights(&mut heights);
        // Corners sit at r_norm = 1 which exceeds any border + outer width below 1.
        let s = b.sample_uv(0.0, 0.0).expect("corner has a direction");
        if s.r_norm > s.r_border + b.settings().outer_width {
            assert_eq!(heights.get(0, 0), 0.0);
        }
        // The centre is untouched.
        assert_eq!(heights.get(32, 32), 0.5);
        assert!(heights.data().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn ridge_never_lowers_inner_ring_heights() {
        let b = border(5);
        let original = ScalarField::from_fn(65, 65, |x, y| ((x + y) % 7) as f32 / 7.0);
        let mut shaped = original.clone();
        b.apply_to_heights(&mut shaped);
        for y in 0..65 {
            for x in 0..65 {
                let (u, v) = original.cell_uv(x, y);
                if let Some(s) = b.sample_uv(u, v) {
                    if s.r_norm <= s.r_border {
                        assert!(shaped.get(x, y) >= original.get(x, y) - 1e-6);
                    }
                }
            }
        }
    }

    #[test]
    fn spawn_map_is_blocked_outside_and_near_the_border() {
        let b = border(11);
        let mut spawn = ScalarField::from_fn(65, 65, |_, _| 1.0);
        b.apply_to_spawn_map(&mut spawn);
        let block = b.settings().no_spawn_near_border;
        for y in 0..65 {
            for x in 0..65 {
                let (u, v) = spawn.cell_uv(x, y);
                if let Some(s) = b.sample_uv(u, v) {
                    let blocked = s.r_norm > s.r_border - block;
                    assert_eq!(spawn.get(x, y) == 0.0, blocked, "cell ({x}, {y})");
                }
            }
        }
        assert_eq!(spawn.get(32, 32), 1.0);
    }

    #[test]
    fn zero_radius_fails_validation() {
        let settings = BorderSettings::default().with_shape(0.0, 0.1);
        assert!(WorldBorder::try_new(settings, 1).is_err());
    }
}
