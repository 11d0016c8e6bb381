//! World assembly and the per-frame simulation entry point.
//!
//! [`WorldAssembler::generate`] runs the whole pipeline for the current seed:
//! tear down the previous population, shape and commit the terrain, scan the asset
//! spawn mask for cluster sites, build navigation, then scan the creature mask.
//! [`WorldAssembler::step`] is called once per frame. It updates chunk activation
//! from the player's position first, then lets clusters in active chunks adjust
//! their population, then runs each active chunk's scheduler.
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, trace, warn};

use crate::border::WorldBorder;
use crate::error::Result;
use crate::field::SpawnEligibilityField;
use crate::grid::SpatialGrid;
use crate::population::cluster::{
    ClusterController, ClusterEnv, ClusterId, ClusterParams, PopulationContext,
};
use crate::population::pool::ObjectPool;
use crate::population::scene::{InstanceId, Parent, Scene};
use crate::sampling::{rand01, range_i32};
use crate::terrain::{Terrain, TerrainGenerator};
use crate::world::catalog::{CatalogDef, SpawnCategory, SpawnDefinition, TemplateCatalog, TemplateId};
use crate::world::config::WorldConfig;
use crate::world::events::{EventSink, WorldEvent, WorldEventKind};

/// Source of the player's position, polled once per [`WorldAssembler::step`].
pub trait PlayerLocator {
    /// `None` leaves chunk activation unchanged and disables distance gating.
    fn player_position(&self) -> Option<Vec3>;
}

impl PlayerLocator for Vec3 {
    fn player_position(&self) -> Option<Vec3> {
        Some(*self)
    }
}

impl PlayerLocator for Option<Vec3> {
    fn player_position(&self) -> Option<Vec3> {
        *self
    }
}

impl PlayerLocator for mint::Vector3<f32> {
    fn player_position(&self) -> Option<Vec3> {
        Some(Vec3::from(*self))
    }
}

/// No player.
impl PlayerLocator for () {
    fn player_position(&self) -> Option<Vec3> {
        None
    }
}

/// External navigation-mesh builder. Invoked once per generation after the terrain
/// is committed and before creature clusters are populated.
pub trait NavigationBuilder {
    fn build(&mut self, terrain: &Terrain);
}

impl<F> NavigationBuilder for F
where
    F: FnMut(&Terrain),
{
    fn build(&mut self, terrain: &Terrain) {
        self(terrain)
    }
}

/// What one generation produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub asset_clusters: usize,
    pub creature_clusters: usize,
    /// Members placed by initial population passes.
    pub members: usize,
    pub chunks: usize,
}

/// What one [`WorldAssembler::step`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Simulation time after the step.
    pub time: f32,
    pub is_night: bool,
    /// Chunks whose activation flipped.
    pub toggled: usize,
    pub spawned: usize,
    pub despawned: usize,
    /// Behaviours run by the chunk schedulers.
    pub ticked: usize,
}

#[derive(Clone, Debug)]
struct ResolvedDefinition {
    def: SpawnDefinition,
    template: TemplateId,
}

#[derive(Clone, Debug)]
struct ClusterSlot {
    controller: ClusterController,
    category: SpawnCategory,
}

/// Owns a generated world and its runtime population.
pub struct WorldAssembler {
    config: WorldConfig,
    catalog: TemplateCatalog,
    assets: Vec<ResolvedDefinition>,
    creatures: Vec<ResolvedDefinition>,
    prewarm: Vec<(TemplateId, usize)>,
    prewarmed: bool,
    generator: TerrainGenerator,
    border: WorldBorder,
    terrain: Option<Terrain>,
    asset_mask: Option<SpawnEligibilityField>,
    creature_mask: Option<SpawnEligibilityField>,
    grid: SpatialGrid,
    scene: Scene,
    pool: Option<ObjectPool>,
    clusters: Vec<ClusterSlot>,
    navigation: Option<Box<dyn NavigationBuilder>>,
    rng: StdRng,
    seed: i32,
    spawn_seed: i32,
    time: f32,
}

impl WorldAssembler {
    /// Validate `config` and resolve every definition against `catalog`.
    pub fn try_new(
        config: WorldConfig,
        catalog: TemplateCatalog,
        assets: Vec<SpawnDefinition>,
        creatures: Vec<SpawnDefinition>,
    ) -> Result<Self> {
        config.validate()?;
        let assets = resolve(&catalog, assets)?;
        let creatures = resolve(&catalog, creatures)?;
        let seed = config.seed;
        let spawn_seed = seed.wrapping_mul(100);

        Ok(Self {
            generator: TerrainGenerator::new(config.terrain.clone()),
            border: WorldBorder::new(config.border.clone(), seed),
            grid: SpatialGrid::new(config.grid),
            pool: config.use_pool.then(ObjectPool::new),
            config,
            catalog,
            assets,
            creatures,
            prewarm: Vec::new(),
            prewarmed: false,
            terrain: None,
            asset_mask: None,
            creature_mask: None,
            scene: Scene::new(),
            clusters: Vec::new(),
            navigation: None,
            rng: StdRng::seed_from_u64(spawn_seed as u64),
            seed,
            spawn_seed,
            time: 0.0,
        })
    }

    /// Build the catalog, definitions and prewarm list from a data document.
    pub fn from_catalog_def(config: WorldConfig, def: &CatalogDef) -> Result<Self> {
        let catalog = def.build_catalog()?;
        let prewarm = def
            .prewarm
            .iter()
            .map(|entry| Ok((catalog.resolve(&entry.template)?, entry.count)))
            .collect::<Result<Vec<_>>>()?;
        let assembler = Self::try_new(
            config,
            catalog,
            def.definitions(SpawnCategory::Asset).to_vec(),
            def.definitions(SpawnCategory::Creature).to_vec(),
        )?;
        Ok(assembler.with_prewarm(prewarm))
    }

    pub fn with_navigation(mut self, builder: impl NavigationBuilder + 'static) -> Self {
        self.navigation = Some(Box::new(builder));
        self
    }

    /// Instances to pool before the first generation.
    pub fn with_prewarm(mut self, entries: Vec<(TemplateId, usize)>) -> Self {
        self.prewarm = entries;
        self
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Templates may gain behaviours until they are first instantiated.
    pub fn catalog_mut(&mut self) -> &mut TemplateCatalog {
        &mut self.catalog
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }

    pub fn spawn_seed(&self) -> i32 {
        self.spawn_seed
    }

    pub fn border(&self) -> &WorldBorder {
        &self.border
    }

    /// The committed terrain, once generated.
    pub fn terrain(&self) -> Option<&Terrain> {
        self.terrain.as_ref()
    }

    pub fn asset_mask(&self) -> Option<&SpawnEligibilityField> {
        self.asset_mask.as_ref()
    }

    pub fn creature_mask(&self) -> Option<&SpawnEligibilityField> {
        self.creature_mask.as_ref()
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn pool(&self) -> Option<&ObjectPool> {
        self.pool.as_ref()
    }

    pub fn clusters(&self) -> impl Iterator<Item = &ClusterController> {
        self.clusters.iter().map(|slot| &slot.controller)
    }

    pub fn cluster(&self, id: ClusterId) -> Option<&ClusterController> {
        self.clusters.get(id.index()).map(|slot| &slot.controller)
    }

    pub fn cluster_category(&self, id: ClusterId) -> Option<SpawnCategory> {
        self.clusters.get(id.index()).map(|slot| slot.category)
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Seconds simulated so far.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_night(&self) -> bool {
        self.config
            .day_night
            .is_some_and(|cycle| cycle.is_night(self.time))
    }

    /// Replace the seed and regenerate everything.
    pub fn set_seed(&mut self, seed: i32) -> GenerationSummary {
        self.set_seed_with_events(seed, &mut ())
    }

    pub fn set_seed_with_events(&mut self, seed: i32, sink: &mut dyn EventSink) -> GenerationSummary {
        self.seed = seed;
        self.spawn_seed = seed.wrapping_mul(100);
        self.generate_with_events(sink)
    }

    /// Generate the world for the current seed, replacing any previous one.
    pub fn generate(&mut self) -> GenerationSummary {
        self.generate_with_events(&mut ())
    }

    pub fn generate_with_events(&mut self, sink: &mut dyn EventSink) -> GenerationSummary {
        info!(
            "Generating world: seed {}, spawn seed {}",
            self.seed, self.spawn_seed
        );
        if sink.wants(WorldEventKind::GenerationStarted) {
            sink.send(WorldEvent::GenerationStarted {
                seed: self.seed,
                spawn_seed: self.spawn_seed,
            });
        }

        self.teardown();
        self.prewarm_pool();
        self.rng = StdRng::seed_from_u64(self.spawn_seed as u64);
        self.border = WorldBorder::new(self.config.border.clone(), self.seed);

        let terrain = self.generator.generate(self.seed, &self.border);
        if sink.wants(WorldEventKind::TerrainCommitted) {
            sink.send(WorldEvent::TerrainCommitted {
                resolution: terrain.resolution(),
                min_world_height: terrain.min_world_height(),
                max_world_height: terrain.max_world_height(),
            });
        }
        self.terrain = Some(terrain);

        let mut summary = GenerationSummary::default();

        if self.config.terrain.spawn_assets {
            let mask = self.generator.spawn_mask(self.spawn_seed, &self.border);
            let (clusters, members) = self.spawn_pass(SpawnCategory::Asset, &mask, sink);
            summary.asset_clusters = clusters;
            summary.members += members;
            self.asset_mask = Some(mask);
        }

        if self.config.terrain.spawn_creatures {
            let mask = self
                .generator
                .spawn_mask(self.spawn_seed.wrapping_mul(1000), &self.border);
            self.build_navigation(sink);
            let (clusters, members) = self.spawn_pass(SpawnCategory::Creature, &mask, sink);
            summary.creature_clusters = clusters;
            summary.members += members;
            self.creature_mask = Some(mask);
        }

        summary.chunks = self.grid.chunk_count();
        info!(
            "World generated: {} asset clusters, {} creature clusters, {} members in {} chunks",
            summary.asset_clusters, summary.creature_clusters, summary.members, summary.chunks
        );
        if sink.wants(WorldEventKind::GenerationFinished) {
            sink.send(WorldEvent::GenerationFinished { summary });
        }
        summary
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32, player: &dyn PlayerLocator) -> StepReport {
        self.step_with_events(dt, player, &mut ())
    }

    pub fn step_with_events(
        &mut self,
        dt: f32,
        player: &dyn PlayerLocator,
        sink: &mut dyn EventSink,
    ) -> StepReport {
        self.time += dt;
        let now = self.time;
        let is_night = self.is_night();
        let player_position = player.player_position();
        let mut report = StepReport {
            time: now,
            is_night,
            ..Default::default()
        };

        let Self {
            catalog,
            terrain,
            border,
            grid,
            scene,
            pool,
            clusters,
            rng,
            ..
        } = self;

        // Activation must settle before any cluster is queried or ticked.
        if let Some(position) = player_position {
            for toggle in grid.update_player(position) {
                report.toggled += 1;
                if let Some(chunk) = grid.chunk(toggle.coord) {
                    for id in chunk.clusters() {
                        let Some(slot) = clusters.get_mut(id.index()) else {
                            continue;
                        };
                        slot.controller.set_active(toggle.active);
                        for member in slot.controller.members(scene).to_vec() {
                            scene.set_active(member, toggle.active);
                        }
                    }
                }
                if sink.wants(WorldEventKind::ChunkActivationChanged) {
                    sink.send(WorldEvent::ChunkActivationChanged {
                        coord: toggle.coord,
                        active: toggle.active,
                    });
                }
            }
        }

        let env = ClusterEnv {
            is_night,
            player_position,
        };
        let mut changes = Vec::new();
        {
            let mut ctx = PopulationContext {
                scene: &mut *scene,
                pool: pool.as_mut(),
                catalog: &*catalog,
                terrain: terrain.as_ref(),
                border: Some(&*border),
                grid: Some(&*grid),
                rng: &mut *rng,
            };
            for slot in clusters.iter_mut() {
                if !slot.controller.is_active() {
                    continue;
                }
                let step = slot.controller.update(dt, &env, &mut ctx);
                if step.spawned.is_some() || step.despawned.is_some() {
                    changes.push((slot.controller.id(), slot.controller.chunk(), step));
                }
            }
        }

        // Applied in order: a released member may already be checked out again.
        for (cluster, chunk, step) in changes {
            let Some(coord) = chunk else {
                continue;
            };
            let Some(scheduler) = grid.scheduler_mut(coord) else {
                continue;
            };
            if let Some(member) = step.despawned {
                scheduler.unregister(member);
                report.despawned += 1;
                if sink.wants(WorldEventKind::MemberDespawned) {
                    sink.send(WorldEvent::MemberDespawned {
                        cluster: Some(cluster),
                        member,
                    });
                }
            }
            if let Some(member) = step.spawned {
                scheduler.register(member);
                report.spawned += 1;
                if sink.wants(WorldEventKind::MemberSpawned) {
                    let position = scene
                        .get(member)
                        .map_or(Vec3::ZERO, |i| i.transform.position);
                    sink.send(WorldEvent::MemberSpawned {
                        cluster,
                        member,
                        position,
                    });
                }
            }
        }

        let mut requests: Vec<InstanceId> = Vec::new();
        for chunk in grid.chunks_mut() {
            if !chunk.is_active() {
                continue;
            }
            let tick = chunk.scheduler_mut().run(now, scene);
            report.ticked += tick.ticked.len();
            requests.extend(tick.despawn_requests);
        }
        requests.sort();

        for member in requests {
            let cluster = match scene.get(member).map(|i| i.parent()) {
                Some(Parent::Cluster(id)) => Some(id),
                _ => None,
            };
            let released = match pool.as_mut() {
                Some(pool) => pool.release(member, scene, catalog),
                None => scene.despawn(member),
            };
            if released {
                report.despawned += 1;
                if sink.wants(WorldEventKind::MemberDespawned) {
                    sink.send(WorldEvent::MemberDespawned { cluster, member });
                }
            }
        }

        trace!(
            "Step t={:.2}: {} toggled, {} spawned, {} despawned, {} ticked",
            now,
            report.toggled,
            report.spawned,
            report.despawned,
            report.ticked
        );
        report
    }

    fn teardown(&mut self) {
        if self.clusters.is_empty() {
            self.grid.clear_all();
            return;
        }
        let mut released = 0;
        {
            let mut ctx = PopulationContext {
                scene: &mut self.scene,
                pool: self.pool.as_mut(),
                catalog: &self.catalog,
                terrain: None,
                border: None,
                grid: None,
                rng: &mut self.rng,
            };
            for slot in &mut self.clusters {
                released += slot.controller.teardown(&mut ctx).len();
            }
        }
        debug!(
            "Tore down {} clusters, releasing {} members",
            self.clusters.len(),
            released
        );
        self.clusters.clear();
        self.grid.clear_all();
    }

    fn prewarm_pool(&mut self) {
        if self.prewarmed {
            return;
        }
        self.prewarmed = true;
        if let Some(pool) = self.pool.as_mut() {
            if !self.prewarm.is_empty() {
                pool.prewarm(&self.prewarm, &mut self.scene, &self.catalog);
            }
        }
    }

    fn build_navigation(&mut self, sink: &mut dyn EventSink) {
        let Some(terrain) = self.terrain.as_ref() else {
            return;
        };
        match self.navigation.as_mut() {
            Some(builder) => {
                builder.build(terrain);
                debug!("Navigation built");
                if sink.wants(WorldEventKind::NavigationBuilt) {
                    sink.send(WorldEvent::NavigationBuilt);
                }
            }
            None => {
                warn!("No navigation builder configured; creatures spawn without navigation.");
                if sink.wants(WorldEventKind::Warning) {
                    sink.send(WorldEvent::warning(
                        "navigation",
                        "no navigation builder configured",
                    ));
                }
            }
        }
    }

    /// Scan `mask` and create at most one cluster per cell. Returns the clusters and
    /// members created.
    fn spawn_pass(
        &mut self,
        category: SpawnCategory,
        mask: &SpawnEligibilityField,
        sink: &mut dyn EventSink,
    ) -> (usize, usize) {
        let Self {
            catalog,
            assets,
            creatures,
            terrain,
            border,
            grid,
            scene,
            pool,
            clusters,
            rng,
            ..
        } = self;
        let Some(terrain) = terrain.as_ref() else {
            return (0, 0);
        };
        let definitions = match category {
            SpawnCategory::Asset => &assets[..],
            SpawnCategory::Creature => &creatures[..],
        };
        if definitions.is_empty() {
            debug!("No {:?} definitions; skipping spawn pass.", category);
            return (0, 0);
        }

        let world_height = (terrain.min_world_height(), terrain.max_world_height());
        let wants_clusters = sink.wants(WorldEventKind::ClusterSpawned);
        let wants_members = sink.wants(WorldEventKind::MemberSpawned);
        let mut created = 0;
        let mut members = 0;

        for y in 0..mask.height() {
            for x in 0..mask.width() {
                let rate = mask.get(x, y);
                let height01 = terrain.normalized_height(x, y);

                for resolved in definitions {
                    let def = &resolved.def;
                    if !def.accepts_cell(x, y, rate) {
                        continue;
                    }
                    if rand01(&mut *rng) > def.random_spawn_chance * 0.1 {
                        continue;
                    }
                    if !def.accepts_height(height01) {
                        continue;
                    }

                    let origin = terrain.cell_to_world(x, y);
                    if def.overlap_avoid {
                        let coord = grid.world_to_chunk(origin);
                        if grid.is_position_too_close(origin, def.overlap_radius, coord, &*scene) {
                            continue;
                        }
                    }

                    let (min, max) = def.cluster_bounds();
                    let target = range_i32(&mut *rng, min as i32, max as i32 + 1).max(0) as usize;
                    let id = ClusterId::new(clusters.len() as u32);
                    let mut controller = ClusterController::new(
                        id,
                        resolved.template,
                        origin,
                        ClusterParams::from_definition(def, target),
                        world_height,
                    );
                    let (chunk, active) = grid.register_cluster(id, origin);
                    controller.set_chunk(chunk);

                    let spawned = {
                        let mut ctx = PopulationContext {
                            scene: &mut *scene,
                            pool: pool.as_mut(),
                            catalog: &*catalog,
                            terrain: Some(terrain),
                            border: Some(&*border),
                            grid: Some(&*grid),
                            rng: &mut *rng,
                        };
                        controller.spawn_initial_population(&mut ctx)
                    };

                    if let Some(scheduler) = grid.scheduler_mut(chunk) {
                        for member in &spawned {
                            scheduler.register(*member);
                        }
                    }
                    if !active {
                        controller.set_active(false);
                        for member in &spawned {
                            scene.set_active(*member, false);
                        }
                    }

                    trace!(
                        "Cluster {:?} '{}' at ({:.1}, {:.1}, {:.1}): {}/{} members",
                        id,
                        def.name,
                        origin.x,
                        origin.y,
                        origin.z,
                        spawned.len(),
                        target
                    );
                    if wants_members {
                        for member in &spawned {
                            let position = scene
                                .get(*member)
                                .map_or(origin, |i| i.transform.position);
                            sink.send(WorldEvent::MemberSpawned {
                                cluster: id,
                                member: *member,
                                position,
                            });
                        }
                    }
                    if wants_clusters {
                        sink.send(WorldEvent::ClusterSpawned {
                            cluster: id,
                            definition: def.name.clone(),
                            category,
                            chunk,
                            origin,
                            target,
                            initial: spawned.len(),
                        });
                    }

                    created += 1;
                    members += spawned.len();
                    clusters.push(ClusterSlot {
                        controller,
                        category,
                    });
                    break;
                }
            }
        }

        debug!(
            "{:?} pass created {} clusters with {} members",
            category, created, members
        );
        (created, members)
    }
}

fn resolve(
    catalog: &TemplateCatalog,
    definitions: Vec<SpawnDefinition>,
) -> Result<Vec<ResolvedDefinition>> {
    definitions
        .into_iter()
        .map(|def| {
            let template = catalog.resolve(&def.template)?;
            Ok(ResolvedDefinition { def, template })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::error::Error;
    use crate::field::{Curve, NoiseSettings};
    use crate::grid::GridSettings;
    use crate::population::scheduler::{TickContext, Tickable};
    use crate::terrain::TerrainSettings;
    use crate::world::catalog::Template;
    use crate::world::events::VecSink;

    /// Asks to leave the world on its first tick.
    struct Skittish;

    impl Tickable for Skittish {
        fn tick(&mut self, ctx: &mut TickContext<'_>) {
            ctx.request_despawn();
        }
    }

    fn config() -> WorldConfig {
        let terrain = TerrainSettings::new(33, Vec3::new(320.0, 100.0, 320.0))
            .with_height(1.0, Curve::Linear)
            .with_noise(NoiseSettings::new(8.0, 3, 0.5, 2.0, 0))
            .with_asset_noise_scale(6.0);
        WorldConfig::default()
            .with_terrain(terrain)
            .with_grid(GridSettings::default().with_chunk_size(50.0))
            .with_seed(42)
    }

    fn catalog() -> TemplateCatalog {
        TemplateCatalog::new()
            .with_template(Template::new("pine").with_base_scale(Vec3::splat(1.5)))
            .and_then(|c| {
                c.with_template(
                    Template::new("deer").with_behaviour(|| Box::new(Skittish) as Box<dyn Tickable>),
                )
            })
            .expect("templates register")
    }

    fn pines() -> SpawnDefinition {
        SpawnDefinition::new("pines", "pine")
            .with_step(4)
            .with_random_spawn_chance(10.0)
            .with_spawn_threshold(0.01, 1.0)
            .with_cluster(2, 3, 6.0)
    }

    fn deer() -> SpawnDefinition {
        SpawnDefinition::new("deer", "deer")
            .with_step(8)
            .with_random_spawn_chance(10.0)
            .with_spawn_threshold(0.01, 1.0)
            .with_cluster(1, 2, 6.0)
    }

    fn assembler() -> WorldAssembler {
        WorldAssembler::try_new(config(), catalog(), vec![pines()], vec![deer()])
            .expect("valid world")
    }

    fn pooled_total(world: &WorldAssembler) -> usize {
        let pool = world.pool().expect("pooling enabled");
        world
            .catalog()
            .iter()
            .map(|(id, _)| pool.available(id))
            .sum()
    }

    #[test]
    fn unknown_templates_fail_assembly() {
        let err = WorldAssembler::try_new(
            config(),
            catalog(),
            vec![SpawnDefinition::new("ghosts", "ghost")],
            Vec::new(),
        )
        .err()
        .expect("ghost is not in the catalog");
        assert!(matches!(err, Error::MissingTemplate { name } if name == "ghost"));
    }

    #[test]
    fn invalid_chunk_size_fails_assembly() {
        let bad = config().with_grid(GridSettings::default().with_chunk_size(-1.0));
        let result = WorldAssembler::try_new(bad, catalog(), Vec::new(), Vec::new());
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn generation_is_deterministic_for_a_seed() {
        let mut a = assembler();
        let mut b = assembler();
        let sa = a.generate();
        let sb = b.generate();
        assert_eq!(sa, sb);
        assert!(sa.asset_clusters > 0);
        assert!(sa.creature_clusters > 0);
        let origins_a: Vec<Vec3> = a.clusters().map(|c| c.origin()).collect();
        let origins_b: Vec<Vec3> = b.clusters().map(|c| c.origin()).collect();
        assert_eq!(origins_a, origins_b);
    }

    #[test]
    fn clusters_only_start_inside_the_border() {
        let mut world = assembler();
        world.generate();
        let terrain = world.terrain().expect("generated");
        for cluster in world.clusters() {
            assert!(world
                .border()
                .is_inside_world(cluster.origin(), terrain.origin(), terrain.size()));
        }
    }

    #[test]
    fn reseeding_recycles_the_previous_population() {
        let mut world = assembler();
        world.generate();
        let before = world.scene().len();
        assert!(before > 0);

        world.set_seed(7);
        assert_eq!(world.seed(), 7);
        assert_eq!(world.spawn_seed(), 700);
        let live: usize = world.clusters().map(|c| c.live_count(world.scene())).sum();
        let pool = world.pool().expect("pooling enabled");
        assert_eq!(world.scene().len(), pool.created());
        assert_eq!(live + pooled_total(&world), world.scene().len());
        for cluster in world.clusters() {
            assert!(cluster.live_count(world.scene()) <= cluster.params().target_count);
        }
    }

    #[test]
    fn navigation_is_built_between_the_passes() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut world = assembler().with_navigation(move |_terrain: &Terrain| {
            counter.set(counter.get() + 1);
        });
        let mut sink = VecSink::only([WorldEventKind::ClusterSpawned, WorldEventKind::NavigationBuilt]);
        world.generate_with_events(&mut sink);
        assert_eq!(calls.get(), 1);

        let events = sink.into_inner();
        let nav = events
            .iter()
            .position(|e| matches!(e, WorldEvent::NavigationBuilt))
            .expect("navigation event");
        assert!(events[..nav].iter().all(|e| matches!(
            e,
            WorldEvent::ClusterSpawned { category: SpawnCategory::Asset, .. }
        )));
        assert!(events[nav + 1..].iter().all(|e| matches!(
            e,
            WorldEvent::ClusterSpawned { category: SpawnCategory::Creature, .. }
        )));
        assert!(nav > 0 && nav + 1 < events.len());
    }

    #[test]
    fn missing_navigation_builder_is_a_warning() {
        let mut world = assembler();
        let mut sink = VecSink::only([WorldEventKind::Warning]);
        world.generate_with_events(&mut sink);
        assert_eq!(sink.count(WorldEventKind::Warning), 1);
        assert!(world.cluster_count() > 0);
    }

    #[test]
    fn player_movement_suspends_far_chunks() {
        let mut world = assembler();
        world.generate();
        let mut sink = VecSink::only([WorldEventKind::ChunkActivationChanged]);
        let report = world.step_with_events(0.1, &Vec3::ZERO, &mut sink);
        assert!(report.toggled > 0);
        assert_eq!(sink.len(), report.toggled);

        let mut suspended = 0;
        for cluster in world.clusters() {
            let chunk = cluster.chunk().expect("registered");
            assert_eq!(cluster.is_active(), world.grid().is_chunk_active(chunk));
            if !cluster.is_active() {
                suspended += 1;
                for member in cluster.members(world.scene()) {
                    assert!(!world.scene().is_active(*member));
                }
            }
        }
        assert!(suspended > 0);

        let back = world.step(0.1, &Vec3::new(160.0, 0.0, 160.0));
        assert!(back.toggled > 0);
    }

    #[test]
    fn despawn_requests_return_members_to_the_pool() {
        let mut world = assembler();
        world.generate();
        let deer = world.catalog().find("deer").expect("deer template");
        let mut sink = VecSink::only([WorldEventKind::MemberDespawned]);
        let report = world.step_with_events(0.1, &Vec3::new(160.0, 0.0, 160.0), &mut sink);
        assert!(report.ticked > 0);
        assert!(sink.len() > 0);
        assert!(world.pool().expect("pooling enabled").available(deer) > 0);

        for id in 0..world.cluster_count() {
            let id = ClusterId::new(id as u32);
            if world.cluster_category(id) != Some(SpawnCategory::Creature) {
                continue;
            }
            let cluster = world.cluster(id).expect("exists");
            if cluster.is_active() {
                assert_eq!(cluster.live_count(world.scene()), 0);
            }
        }
    }

    #[test]
    fn without_a_pool_members_are_destroyed() {
        let mut world = WorldAssembler::try_new(
            config().with_pool(false),
            catalog(),
            vec![pines()],
            vec![deer()],
        )
        .expect("valid world");
        world.generate();
        let live: usize = world.clusters().map(|c| c.live_count(world.scene())).sum();
        assert_eq!(world.scene().len(), live);

        world.set_seed(3);
        let live: usize = world.clusters().map(|c| c.live_count(world.scene())).sum();
        assert_eq!(world.scene().len(), live);
    }

    #[test]
    fn catalog_documents_prewarm_the_pool() {
        let def = CatalogDef {
            templates: vec![
                crate::world::catalog::TemplateDef {
                    name: "pine".into(),
                    ..Default::default()
                },
            ],
            assets: vec![pines()],
            creatures: Vec::new(),
            prewarm: vec![crate::world::catalog::PrewarmEntry {
                template: "pine".into(),
                count: 500,
            }],
        };
        let mut world = WorldAssembler::from_catalog_def(config(), &def).expect("valid document");
        let summary = world.generate();
        let pool = world.pool().expect("pooling enabled");
        assert!(summary.members > 0);
        assert_eq!(pool.created(), 500.max(summary.members));
    }

    #[test]
    fn day_night_cycle_advances_with_steps() {
        let mut world = WorldAssembler::try_new(
            config().with_day_night(crate::population::DayNightCycle::new(10.0)),
            catalog(),
            Vec::new(),
            Vec::new(),
        )
        .expect("valid world");
        world.generate();
        assert!(!world.step(2.0, &()).is_night);
        assert!(world.step(4.0, &()).is_night);
        assert!(!world.step(4.0, &()).is_night);
    }
}
