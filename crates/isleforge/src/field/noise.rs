//! Deterministic multi-octave fractal noise.
//!
//! [`NoiseField`] derives one pseudo-random `(offset_x, offset_y)` pair per octave
//! from its seed when constructed, so identical settings reproduce bit-identical
//! output. Frequency starts at 1 and is multiplied by `lacunarity` each octave;
//! amplitude starts at 1 and is multiplied by `persistence`.
use glam::Vec2;
use ::noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::SeedableRng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::field::grid::ScalarField;
use crate::field::inverse_lerp;
use crate::sampling::range_i32;

/// Scales at or below zero are replaced by this value.
pub const MIN_NOISE_SCALE: f32 = 0.0001;

/// Octave offsets are drawn from `[-OCTAVE_OFFSET_RANGE, OCTAVE_OFFSET_RANGE)`.
pub const OCTAVE_OFFSET_RANGE: i32 = 1000;

/// Parameters of a fractal noise field.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseSettings {
    /// Feature size in cells. Larger values produce smoother noise.
    pub scale: f32,
    /// Number of layers summed together.
    pub octaves: u32,
    /// Amplitude multiplier applied after each octave.
    pub persistence: f32,
    /// Frequency multiplier applied after each octave.
    pub lacunarity: f32,
    /// Seed for the octave offsets and the gradient table.
    pub seed: i32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            scale: 10.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            seed: 0,
        }
    }
}

impl NoiseSettings {
    pub fn new(scale: f32, octaves: u32, persistence: f32, lacunarity: f32, seed: i32) -> Self {
        Self {
            scale,
            octaves,
            persistence,
            lacunarity,
            seed,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_seed(mut self, seed: i32) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves;
        self
    }

    /// Validates the settings, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.octaves == 0 {
            return Err(Error::InvalidConfig("noise octaves must be >= 1".into()));
        }
        if !self.persistence.is_finite() || !self.lacunarity.is_finite() {
            return Err(Error::InvalidConfig(
                "noise persistence and lacunarity must be finite".into(),
            ));
        }
        Ok(())
    }

    /// Scale with the non-positive guard applied.
    pub fn effective_scale(&self) -> f32 {
        if self.scale <= 0.0 || !self.scale.is_finite() {
            MIN_NOISE_SCALE
        } else {
            self.scale
        }
    }
}

/// Fractal Perlin noise sampler with per-octave offsets.
#[derive(Clone, Debug)]
pub struct NoiseField {
    settings: NoiseSettings,
    perlin: Perlin,
    offsets: Vec<Vec2>,
}

impl NoiseField {
    /// Build the sampler, deriving the octave offsets from `settings.seed`.
    pub fn new(settings: NoiseSettings) -> Self {
        let mut rng = StdRng::seed_from_u64(settings.seed as i64 as u64);
        let offsets = (0..settings.octaves)
            .map(|_| {
                let x = range_i32(&mut rng, -OCTAVE_OFFSET_RANGE, OCTAVE_OFFSET_RANGE);
                let y = range_i32(&mut rng, -OCTAVE_OFFSET_RANGE, OCTAVE_OFFSET_RANGE);
                Vec2::new(x as f32, y as f32)
            })
            .collect();

        Self {
            settings,
            perlin: Perlin::new(settings.seed as u32),
            offsets,
        }
    }

    pub fn settings(&self) -> &NoiseSettings {
        &self.settings
    }

    /// Offsets applied to each octave, in octave order.
    pub fn octave_offsets(&self) -> &[Vec2] {
        &self.offsets
    }

    /// Signed fractal sum at `(x, y)`, not normalized.
    pub fn raw(&self, x: f32, y: f32) -> f32 {
        let scale = self.settings.effective_scale();
        let mut amplitude = 1.0f32;
        let mut frequency = 1.0f32;
        let mut sum = 0.0f32;

        for offset in &self.offsets {
            let sx = (x / scale) * frequency + offset.x;
            let sy = (y / scale) * frequency + offset.y;
            sum += perlin_signed(&self.perlin, sx, sy) * amplitude;

            amplitude *= self.settings.persistence;
            frequency *= self.settings.lacunarity;
        }
        sum
    }

    /// Fractal sample at `(x, y)` normalized by the total amplitude into `[0, 1]`.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let scale = self.settings.effective_scale();
        let mut amplitude = 1.0f32;
        let mut frequency = 1.0f32;
        let mut sum = 0.0f32;
        let mut norm = 0.0f32;

        for offset in &self.offsets {
            let sx = (x / scale) * frequency + offset.x;
            let sy = (y / scale) * frequency + offset.y;
            sum += perlin01(&self.perlin, sx, sy) * amplitude;
            norm += amplitude;

            amplitude *= self.settings.persistence;
            frequency *= self.settings.lacunarity;
        }

        if norm > 0.0 {
            (sum / norm).clamp(0.0, 1.0)
        } else {
            0.5
        }
    }

    /// Generate a `width` x `height` field, min/max normalized into `[0, 1]`.
    ///
    /// The first pass stores the raw fractal sum per cell while tracking the global
    /// range; the second pass rescales every cell with `inverse_lerp(min, max, raw)`.
    pub fn generate(&self, width: usize, height: usize) -> ScalarField {
        let mut min = f32::MAX;
        let mut max = f32::MIN;

        let mut field = ScalarField::from_fn(width, height, |x, y| {
            let v = self.raw(x as f32, y as f32);
            min = min.min(v);
            max = max.max(v);
            v
        });

        field.map_in_place(|v| inverse_lerp(min, max, v));
        field
    }
}

/// Convenience wrapper: build a [`NoiseField`] and generate a normalized grid.
pub fn generate(width: usize, height: usize, settings: NoiseSettings) -> ScalarField {
    NoiseField::new(settings).generate(width, height)
}

/// Perlin sample remapped into `[-1, 1]`.
#[inline]
pub fn perlin_signed(perlin: &Perlin, x: f32, y: f32) -> f32 {
    (perlin.get([x as f64, y as f64]) as f32).clamp(-1.0, 1.0)
}

/// Perlin sample remapped into `[0, 1]`.
#[inline]
pub fn perlin01(perlin: &Perlin, x: f32, y: f32) -> f32 {
    perlin_signed(perlin, x, y) * 0.5 + 0.5
}
