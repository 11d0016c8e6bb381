//! Heightfield generation and the committed terrain.
//!
//! [`TerrainGenerator::generate`] runs the full height pipeline:
//! base fractal noise, the optional Chebyshev falloff, the height curve and multiplier,
//! and finally border shaping. The result is a [`Terrain`] that carries the heights,
//! the world-space height range derived from the curve, and the region table in
//! material layout.
//!
//! Spawn masks are separate noise fields produced by [`TerrainGenerator::spawn_mask`]
//! and shaped by the border's no-spawn buffer.
pub mod region;

use glam::{Vec2, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::border::WorldBorder;
use crate::error::{Error, Result};
use crate::field::{
    apply_falloff, falloff_map, inverse_lerp, Curve, FalloffSettings, Heightfield, NoiseField,
    NoiseSettings, SpawnEligibilityField,
};

pub use region::{RegionShaderParams, RegionTable, TerrainRegion, MAX_REGIONS};

/// Parameters of the terrain pipeline.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainSettings {
    /// Samples per side of the square heightfield.
    pub resolution: usize,
    /// World-space extent of the terrain (X width, Y max height, Z depth).
    pub size: Vec3,
    /// World-space position of cell `(0, 0)` at height zero.
    pub origin: Vec3,
    /// Base noise. Its seed is replaced by the generation seed.
    pub noise: NoiseSettings,
    pub height_multiplier: f32,
    pub height_curve: Curve,
    pub falloff: FalloffSettings,
    pub spawn_assets: bool,
    pub spawn_creatures: bool,
    /// Noise scale of the spawn masks. Octaves, persistence and lacunarity follow `noise`.
    pub asset_noise_scale: f32,
    pub regions: RegionTable,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            resolution: 1025,
            size: Vec3::splat(1000.0),
            origin: Vec3::ZERO,
            noise: NoiseSettings::default(),
            height_multiplier: 0.03,
            height_curve: Curve::Linear,
            falloff: FalloffSettings::default(),
            spawn_assets: true,
            spawn_creatures: true,
            asset_noise_scale: 20.0,
            regions: RegionTable::default(),
        }
    }
}

impl TerrainSettings {
    pub fn new(resolution: usize, size: Vec3) -> Self {
        Self {
            resolution,
            size,
            ..Default::default()
        }
    }

    pub fn with_origin(mut self, origin: Vec3) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_noise(mut self, noise: NoiseSettings) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_height(mut self, multiplier: f32, curve: Curve) -> Self {
        self.height_multiplier = multiplier;
        self.height_curve = curve;
        self
    }

    pub fn with_falloff(mut self, falloff: FalloffSettings) -> Self {
        self.falloff = falloff;
        self
    }

    pub fn with_spawning(mut self, assets: bool, creatures: bool) -> Self {
        self.spawn_assets = assets;
        self.spawn_creatures = creatures;
        self
    }

    pub fn with_asset_noise_scale(mut self, scale: f32) -> Self {
        self.asset_noise_scale = scale;
        self
    }

    pub fn with_regions(mut self, regions: RegionTable) -> Self {
        self.regions = regions;
        self
    }

    /// Validates the settings, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.resolution < 2 {
            return Err(Error::InvalidConfig(format!(
                "heightmap resolution must be >= 2, got {}",
                self.resolution
            )));
        }
        if !(self.size.x > 0.0 && self.size.y > 0.0 && self.size.z > 0.0) {
            return Err(Error::InvalidConfig(
                "terrain size must be > 0 on all axes".into(),
            ));
        }
        self.noise.validate()
    }
}

/// A committed heightfield with its world placement.
#[derive(Clone, Debug)]
pub struct Terrain {
    heights: Heightfield,
    origin: Vec3,
    size: Vec3,
    max_multiplier: f32,
    min_world_height: f32,
    max_world_height: f32,
    regions: RegionShaderParams,
}

impl Terrain {
    /// Wrap an existing heightfield. The height range is derived from `multiplier` and
    /// the largest value of `curve`.
    pub fn from_heights(
        heights: Heightfield,
        origin: Vec3,
        size: Vec3,
        multiplier: f32,
        curve: &Curve,
    ) -> Self {
        let max_multiplier = (multiplier * curve.max_value()).clamp(0.0, 1.0);
        let min_world_height = origin.y;
        let max_world_height = min_world_height + max_multiplier * size.y;
        Self {
            heights,
            origin,
            size,
            max_multiplier,
            min_world_height,
            max_world_height,
            regions: RegionShaderParams::default(),
        }
    }

    fn with_regions(mut self, regions: RegionShaderParams) -> Self {
        self.regions = regions;
        self
    }

    pub fn heights(&self) -> &Heightfield {
        &self.heights
    }

    pub fn resolution(&self) -> usize {
        self.heights.width()
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn size(&self) -> Vec3 {
        self.size
    }

    /// Largest normalized height the curve and multiplier can produce.
    pub fn max_multiplier(&self) -> f32 {
        self.max_multiplier
    }

    pub fn min_world_height(&self) -> f32 {
        self.min_world_height
    }

    pub fn max_world_height(&self) -> f32 {
        self.max_world_height
    }

    pub fn region_params(&self) -> &RegionShaderParams {
        &self.regions
    }

    /// Unclamped normalized coordinate of a world position.
    pub fn world_to_uv(&self, x: f32, z: f32) -> Vec2 {
        Vec2::new(
            (x - self.origin.x) / self.size.x,
            (z - self.origin.z) / self.size.z,
        )
    }

    /// Whether the world position lies over the terrain rectangle.
    pub fn contains_xz(&self, x: f32, z: f32) -> bool {
        let uv = self.world_to_uv(x, z);
        (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y)
    }

    /// World Y of the surface at `(x, z)`, bilinearly interpolated. Positions off the
    /// terrain are clamped to its edge.
    pub fn sample_height(&self, x: f32, z: f32) -> f32 {
        let uv = self.world_to_uv(x, z);
        self.origin.y + self.heights.sample_bilinear(uv.x, uv.y) * self.size.y
    }

    /// World position of a heightfield cell, on the surface.
    pub fn cell_to_world(&self, x: usize, y: usize) -> Vec3 {
        let (u, v) = self.heights.cell_uv(x, y);
        let wx = self.origin.x + u * self.size.x;
        let wz = self.origin.z + v * self.size.z;
        Vec3::new(wx, self.sample_height(wx, wz), wz)
    }

    /// Cell height relative to the tallest possible height, in `[0, 1]`.
    pub fn normalized_height(&self, x: usize, y: usize) -> f32 {
        if self.max_multiplier > 0.0 {
            (self.heights.get(x, y) / self.max_multiplier).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// World Y mapped into the world height band, in `[0, 1]`.
    pub fn height01(&self, world_y: f32) -> f32 {
        inverse_lerp(self.min_world_height, self.max_world_height, world_y)
    }
}

/// Runs the height pipeline and builds spawn masks.
#[derive(Clone, Debug, Default)]
pub struct TerrainGenerator {
    settings: TerrainSettings,
}

impl TerrainGenerator {
    pub fn new(settings: TerrainSettings) -> Self {
        Self { settings }
    }

    pub fn try_new(settings: TerrainSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::new(settings))
    }

    pub fn settings(&self) -> &TerrainSettings {
        &self.settings
    }

    /// Generate and commit the terrain for `seed`, shaped by `border`.
    pub fn generate(&self, seed: i32, border: &WorldBorder) -> Terrain {
        let s = &self.settings;
        let res = s.resolution;
        info!("Generating {}x{} terrain with seed {}", res, res, seed);

        let mut noise = NoiseField::new(s.noise.with_seed(seed)).generate(res, res);

        if s.falloff.enabled {
            let mask = falloff_map(res, &s.falloff);
            apply_falloff(&mut noise, &mask, s.falloff.multiplier);
            debug!(
                "Applied falloff (slope {}, position {})",
                s.falloff.slope, s.falloff.position
            );
        }

        let curve = &s.height_curve;
        let multiplier = s.height_multiplier;
        noise.map_in_place(|n| n * multiplier * curve.evaluate(n));

        border.apply_to_heights(&mut noise);

        let terrain = Terrain::from_heights(noise, s.origin, s.size, multiplier, curve)
            .with_regions(s.regions.shader_params());

        info!(
            "Terrain committed; world height range [{:.2}, {:.2}]",
            terrain.min_world_height, terrain.max_world_height
        );
        terrain
    }

    /// Spawn-rate mask for `seed`, zeroed outside and near the border.
    pub fn spawn_mask(&self, seed: i32, border: &WorldBorder) -> SpawnEligibilityField {
        let s = &self.settings;
        let settings = s
            .noise
            .with_scale(s.asset_noise_scale)
            .with_seed(seed);
        let mut mask = NoiseField::new(settings).generate(s.resolution, s.resolution);
        border.apply_to_spawn_map(&mut mask);
        mask
    }
}
