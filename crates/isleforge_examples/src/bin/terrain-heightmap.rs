use isleforge::prelude::*;
use isleforge_examples::{
    init_tracing, island_config, render_field_to_png, render_world_to_png, RenderConfig,
};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let seed = std::env::args()
        .nth(1)
        .map(|s| s.parse::<i32>())
        .transpose()?
        .unwrap_or(1337);

    let mut world = WorldAssembler::try_new(
        island_config(seed),
        TemplateCatalog::new(),
        Vec::new(),
        Vec::new(),
    )?;
    world.generate();

    let terrain = world
        .terrain()
        .ok_or_else(|| anyhow::anyhow!("terrain missing after generation"))?;
    info!(
        seed,
        min = terrain.min_world_height(),
        max = terrain.max_world_height(),
        "Terrain committed"
    );

    render_field_to_png(terrain.heights(), "terrain-heightmap-raw.png")?;
    if let Some(mask) = world.asset_mask() {
        render_field_to_png(mask, "terrain-heightmap-asset-mask.png")?;
    }

    let mut cfg = RenderConfig::new((768, 768));
    cfg.shade_inactive = false;
    render_world_to_png(&world, &cfg, "terrain-heightmap.png")?;
    Ok(())
}
