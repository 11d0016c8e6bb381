//! Height-banded colour regions handed to the terrain material.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of regions the material accepts.
pub const MAX_REGIONS: usize = 8;

/// A named colour band starting at a normalized height.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainRegion {
    pub name: String,
    /// Normalized height where this region begins.
    pub start_height: f32,
    /// Linear RGBA colour.
    pub colour: [f32; 4],
    /// Blend width in percent of the height range, `0..=20` in practice.
    pub blend: u32,
}

impl TerrainRegion {
    pub fn new(name: impl Into<String>, start_height: f32, colour: [f32; 4], blend: u32) -> Self {
        Self {
            name: name.into(),
            start_height,
            colour,
            blend,
        }
    }
}

/// Ordered list of regions, lowest first.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionTable {
    regions: Vec<TerrainRegion>,
}

impl RegionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: TerrainRegion) -> Self {
        self.regions.push(region);
        self
    }

    pub fn push(&mut self, region: TerrainRegion) {
        self.regions.push(region);
    }

    pub fn regions(&self) -> &[TerrainRegion] {
        &self.regions
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Flatten the first [`MAX_REGIONS`] regions into material parameters.
    pub fn shader_params(&self) -> RegionShaderParams {
        let used = &self.regions[..self.regions.len().min(MAX_REGIONS)];
        RegionShaderParams {
            count: used.len(),
            colours: used.iter().map(|r| r.colour).collect(),
            heights: used.iter().map(|r| r.start_height.clamp(0.0, 1.0)).collect(),
            blends: used
                .iter()
                .map(|r| (r.blend as f32 * 0.01).clamp(0.0, 1.0))
                .collect(),
        }
    }
}

/// Region arrays in the layout the terrain material consumes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionShaderParams {
    pub count: usize,
    pub colours: Vec<[f32; 4]>,
    pub heights: Vec<f32>,
    pub blends: Vec<f32>,
}
