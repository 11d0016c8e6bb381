use glam::Vec3;
use isleforge::prelude::*;

/// Sea, sand, grass, forest, rock and snow bands.
pub fn island_regions() -> RegionTable {
    RegionTable::new()
        .with_region(TerrainRegion::new("deep water", 0.0, [0.05, 0.15, 0.45, 1.0], 0))
        .with_region(TerrainRegion::new("shallows", 0.2, [0.15, 0.35, 0.65, 1.0], 10))
        .with_region(TerrainRegion::new("sand", 0.3, [0.85, 0.8, 0.55, 1.0], 5))
        .with_region(TerrainRegion::new("grass", 0.36, [0.35, 0.6, 0.25, 1.0], 8))
        .with_region(TerrainRegion::new("forest", 0.55, [0.2, 0.4, 0.15, 1.0], 10))
        .with_region(TerrainRegion::new("rock", 0.75, [0.45, 0.4, 0.38, 1.0], 10))
        .with_region(TerrainRegion::new("snow", 0.9, [0.95, 0.95, 0.97, 1.0], 5))
}

/// A 640 x 640 island with a mountain-ringed border and a five minute day.
pub fn island_config(seed: i32) -> WorldConfig {
    let terrain = TerrainSettings::new(129, Vec3::new(640.0, 60.0, 640.0))
        .with_noise(NoiseSettings::default().with_scale(40.0).with_octaves(5))
        .with_height(1.0, Curve::EaseInOut)
        .with_regions(island_regions());
    WorldConfig::default()
        .with_terrain(terrain)
        .with_border(BorderSettings::default().with_no_spawn_near_border(0.08))
        .with_grid(GridSettings::default().with_chunk_size(64.0).with_active_radius(2))
        .with_day_night(DayNightCycle::new(300.0))
        .with_seed(seed)
}
