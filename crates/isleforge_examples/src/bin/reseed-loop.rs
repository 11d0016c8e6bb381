use isleforge::prelude::*;
use isleforge_examples::{init_tracing, island_config, render_world_to_png, RenderConfig};
use tracing::info;

const CATALOG: &str = include_str!("../../assets/catalog.ron");

fn main() -> anyhow::Result<()> {
    init_tracing();

    let def = CatalogDef::from_ron_str(CATALOG)?;
    let mut world = WorldAssembler::from_catalog_def(island_config(1), &def)?
        .with_navigation(|_: &Terrain| {});

    for seed in [1, 2, 3, 1] {
        let summary = world.set_seed(seed);
        info!(
            seed,
            spawn_seed = world.spawn_seed(),
            clusters = world.cluster_count(),
            members = summary.members,
            scene = world.scene().len(),
            pool_created = world.pool().map(|p| p.created()).unwrap_or(0),
            "Reseeded"
        );
        render_world_to_png(
            &world,
            &RenderConfig::new((512, 512)),
            format!("reseed-loop-{seed}.png"),
        )?;
    }
    Ok(())
}
