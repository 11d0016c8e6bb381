//! World-level configuration.
use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::border::BorderSettings;
use crate::error::{Error, Result};
use crate::grid::GridSettings;
use crate::population::daynight::DayNightCycle;
use crate::terrain::TerrainSettings;

/// Everything needed to generate and run a world, apart from the template catalog.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct WorldConfig {
    pub terrain: TerrainSettings,
    pub border: BorderSettings,
    pub grid: GridSettings,
    /// Without a cycle it is always day.
    pub day_night: Option<DayNightCycle>,
    /// Terrain and border seed. The spawn seed is derived from it.
    pub seed: i32,
    /// Recycle despawned members through an [`crate::population::ObjectPool`].
    pub use_pool: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            terrain: TerrainSettings::default(),
            border: BorderSettings::default(),
            grid: GridSettings::default(),
            day_night: None,
            seed: 0,
            use_pool: true,
        }
    }
}

impl WorldConfig {
    /// A world of `resolution` samples per side covering `size`.
    pub fn new(resolution: usize, size: Vec3) -> Self {
        Self {
            terrain: TerrainSettings::new(resolution, size),
            ..Default::default()
        }
    }

    pub fn with_terrain(mut self, terrain: TerrainSettings) -> Self {
        self.terrain = terrain;
        self
    }

    pub fn with_border(mut self, border: BorderSettings) -> Self {
        self.border = border;
        self
    }

    pub fn with_grid(mut self, grid: GridSettings) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_day_night(mut self, cycle: DayNightCycle) -> Self {
        self.day_night = Some(cycle);
        self
    }

    pub fn with_seed(mut self, seed: i32) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_pool(mut self, use_pool: bool) -> Self {
        self.use_pool = use_pool;
        self
    }

    /// Parse a RON document.
    #[cfg(feature = "ron")]
    pub fn from_ron_str(source: &str) -> Result<Self> {
        ron::de::from_str(source).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Validates every section, returning the first error found.
    pub fn validate(&self) -> Result<()> {
        self.terrain.validate()?;
        self.border.validate()?;
        self.grid.validate()?;
        if let Some(cycle) = &self.day_night {
            if !(cycle.day_length_seconds > 0.0) || !cycle.day_length_seconds.is_finite() {
                return Err(Error::InvalidConfig(format!(
                    "day_length_seconds must be a finite value > 0, got {}",
                    cycle.day_length_seconds
                )));
            }
        }
        Ok(())
    }
}
