use glam::Vec3;
use isleforge::prelude::*;
use isleforge_examples::{
    init_tracing, island_config, render_world_to_png, wind_sway_factory, Grazer, RenderConfig,
};
use tracing::info;

const CATALOG: &str = include_str!("../../assets/catalog.ron");

fn main() -> anyhow::Result<()> {
    init_tracing();

    let def = CatalogDef::from_ron_str(CATALOG)?;
    let mut world = WorldAssembler::from_catalog_def(island_config(2024), &def)?
        .with_navigation(|terrain: &Terrain| {
            info!(
                resolution = terrain.resolution(),
                "Baking navigation over committed terrain"
            );
        });
    world.catalog_mut().set_behaviour("pine", wind_sway_factory(7))?;
    world.catalog_mut().set_behaviour("fern", wind_sway_factory(11))?;
    world.catalog_mut().set_behaviour("deer", || {
        Box::new(Grazer::new(Vec3::new(1.0, 0.0, 0.4), 1.5, 45.0)) as Box<dyn Tickable>
    })?;

    let mut events = VecSink::new();
    let summary = world.generate_with_events(&mut events);
    info!(?summary, "Generated");

    let mut toggles = VecSink::only([
        WorldEventKind::ChunkActivationChanged,
        WorldEventKind::MemberSpawned,
        WorldEventKind::MemberDespawned,
    ]);

    // The player circles the island once over two simulated days.
    let dt = 1.0 / 30.0;
    let frames = 30 * 600;
    let centre = Vec3::new(320.0, 0.0, 320.0);
    for frame in 0..frames {
        let angle = frame as f32 / frames as f32 * std::f32::consts::TAU;
        let player = centre + Vec3::new(angle.cos(), 0.0, angle.sin()) * 180.0;
        let report = world.step_with_events(dt, &player, &mut toggles);
        if frame % (30 * 60) == 0 {
            info!(
                time = report.time,
                night = report.is_night,
                live = world.scene().len(),
                ticked = report.ticked,
                "Minute"
            );
        }
    }

    info!(
        toggles = toggles.count(WorldEventKind::ChunkActivationChanged),
        spawned = toggles.count(WorldEventKind::MemberSpawned),
        despawned = toggles.count(WorldEventKind::MemberDespawned),
        pool_created = world.pool().map(|p| p.created()).unwrap_or(0),
        "Walkthrough finished"
    );

    render_world_to_png(&world, &RenderConfig::new((768, 768)), "world-walkthrough.png")?;
    Ok(())
}
