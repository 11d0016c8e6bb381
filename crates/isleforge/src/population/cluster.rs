//! Spawn sites that keep a target population alive around an origin.
//!
//! A [`ClusterController`] checks its population on a fixed interval. Each check makes
//! at most one rate-limited attempt: a spawn while below target, a despawn otherwise.
//! Placement samples a disc of radius `spread` around the origin and rejects points
//! that leave the terrain, fall outside the height band, cross the world border or
//! crowd another cluster's members. Running out of attempts is not an error.
use glam::{EulerRot, Quat, Vec3};
use rand::Rng as RngCore;
use tracing::trace;

use crate::border::WorldBorder;
use crate::field::inverse_lerp;
use crate::grid::{ChunkCoord, SpatialGrid};
use crate::population::pool::ObjectPool;
use crate::population::rate::RateSettings;
use crate::population::scene::{InstanceId, Parent, Scene};
use crate::sampling::{index, inside_unit_circle, rand01, range_f32};
use crate::terrain::Terrain;
use crate::world::catalog::{SpawnDefinition, TemplateCatalog, TemplateId};

/// Candidate points tried per placement.
pub const SPAWN_ATTEMPTS: usize = 12;

/// Identifies a cluster within one generated world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(u32);

impl ClusterId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Population and placement parameters of a cluster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterParams {
    pub target_count: usize,
    pub spread: f32,
    pub scale_range: (f32, f32),
    /// Euler ranges in degrees.
    pub rotation_x: (f32, f32),
    pub rotation_y: (f32, f32),
    pub rotation_z: (f32, f32),
    /// Band of `inverse_lerp(min_world_height, max_world_height, y)`.
    pub height_band: (f32, f32),
    pub overlap_avoid: bool,
    pub overlap_radius: f32,
    /// Seconds between population checks.
    pub check_interval: f32,
    pub spawn_rate: RateSettings,
    pub despawn_rate: RateSettings,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            target_count: 0,
            spread: 10.0,
            scale_range: (1.0, 1.0),
            rotation_x: (0.0, 0.0),
            rotation_y: (0.0, 360.0),
            rotation_z: (0.0, 0.0),
            height_band: (0.0, 1.0),
            overlap_avoid: false,
            overlap_radius: 2.0,
            check_interval: 5.0,
            spawn_rate: RateSettings::default(),
            despawn_rate: RateSettings::default(),
        }
    }
}

impl ClusterParams {
    /// Parameters for a cluster of `target_count` members built from a definition.
    pub fn from_definition(def: &SpawnDefinition, target_count: usize) -> Self {
        Self {
            target_count,
            spread: def.cluster_spread,
            scale_range: def.scale_range,
            rotation_x: def.rotation_x,
            rotation_y: def.rotation_y,
            rotation_z: def.rotation_z,
            height_band: def.height_band,
            overlap_avoid: def.overlap_avoid,
            overlap_radius: def.overlap_radius,
            check_interval: def.check_interval,
            spawn_rate: def.spawn_rate,
            despawn_rate: def.despawn_rate,
        }
    }

    /// Clamp every field into its usable range.
    pub fn sanitized(mut self) -> Self {
        self.spread = self.spread.max(0.01);
        self.scale_range.1 = self.scale_range.1.max(self.scale_range.0);
        let (lo, hi) = self.height_band;
        self.height_band = (lo.clamp(0.0, 1.0), lo.max(hi).clamp(0.0, 1.0));
        self.overlap_radius = self.overlap_radius.max(0.0);
        self.check_interval = self.check_interval.max(0.1);
        self
    }
}

/// Conditions a population check is evaluated under.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClusterEnv {
    pub is_night: bool,
    pub player_position: Option<Vec3>,
}

/// Services a cluster needs to place and remove members.
pub struct PopulationContext<'a> {
    pub scene: &'a mut Scene,
    /// Without a pool, members are created and destroyed outright.
    pub pool: Option<&'a mut ObjectPool>,
    pub catalog: &'a TemplateCatalog,
    pub terrain: Option<&'a Terrain>,
    pub border: Option<&'a WorldBorder>,
    pub grid: Option<&'a SpatialGrid>,
    pub rng: &'a mut dyn RngCore,
}

/// What one [`ClusterController::update`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClusterStep {
    /// A population check ran this step.
    pub checked: bool,
    pub spawned: Option<InstanceId>,
    pub despawned: Option<InstanceId>,
}

/// One spawn site.
#[derive(Clone, Debug)]
pub struct ClusterController {
    id: ClusterId,
    template: TemplateId,
    origin: Vec3,
    params: ClusterParams,
    min_world_height: f32,
    max_world_height: f32,
    chunk: Option<ChunkCoord>,
    active: bool,
    next_check: f32,
}

impl ClusterController {
    pub fn new(
        id: ClusterId,
        template: TemplateId,
        origin: Vec3,
        params: ClusterParams,
        world_height: (f32, f32),
    ) -> Self {
        let (min_world_height, max_world_height) = world_height;
        Self {
            id,
            template,
            origin,
            params: params.sanitized(),
            min_world_height,
            max_world_height: max_world_height.max(min_world_height + 0.01),
            chunk: None,
            active: true,
            next_check: 0.0,
        }
    }

    pub fn id(&self) -> ClusterId {
        self.id
    }

    pub fn template(&self) -> TemplateId {
        self.template
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn params(&self) -> &ClusterParams {
        &self.params
    }

    /// World height range used for the height band.
    pub fn world_height(&self) -> (f32, f32) {
        (self.min_world_height, self.max_world_height)
    }

    pub fn chunk(&self) -> Option<ChunkCoord> {
        self.chunk
    }

    pub fn set_chunk(&mut self, chunk: ChunkCoord) {
        self.chunk = Some(chunk);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Suspend or resume checks. Resuming schedules a check on the next update.
    pub fn set_active(&mut self, active: bool) {
        if active && !self.active {
            self.next_check = 0.0;
        }
        self.active = active;
    }

    pub fn members<'s>(&self, scene: &'s Scene) -> &'s [InstanceId] {
        scene.children(Parent::Cluster(self.id))
    }

    pub fn live_count(&self, scene: &Scene) -> usize {
        scene.child_count(Parent::Cluster(self.id))
    }

    /// Place up to `target_count` members using at most `max(4, 2 * target)` attempts.
    pub fn spawn_initial_population(&mut self, ctx: &mut PopulationContext<'_>) -> Vec<InstanceId> {
        let target = self.params.target_count;
        let attempts = (target * 2).max(4);
        let mut spawned = Vec::with_capacity(target);
        for _ in 0..attempts {
            if spawned.len() >= target {
                break;
            }
            if let Some(id) = self.try_spawn_one(ctx) {
                spawned.push(id);
            }
        }
        trace!(
            "Cluster {:?} initial population {}/{}",
            self.id,
            spawned.len(),
            target
        );
        spawned
    }

    /// Advance the check timer by `dt` seconds and run a check when it expires.
    pub fn update(
        &mut self,
        dt: f32,
        env: &ClusterEnv,
        ctx: &mut PopulationContext<'_>,
    ) -> ClusterStep {
        if !self.active {
            return ClusterStep::default();
        }
        self.next_check -= dt;
        if self.next_check > 0.0 {
            return ClusterStep::default();
        }
        self.next_check = (self.next_check + self.params.check_interval).max(0.0);
        self.tick_once(env, ctx)
    }

    /// Run one population check immediately.
    pub fn tick_once(&mut self, env: &ClusterEnv, ctx: &mut PopulationContext<'_>) -> ClusterStep {
        let mut step = ClusterStep {
            checked: true,
            ..Default::default()
        };
        let distance = env
            .player_position
            .map_or(f32::INFINITY, |p| p.distance(self.origin));
        let live = self.live_count(ctx.scene);

        if live < self.params.target_count {
            if roll(&self.params.spawn_rate, env.is_night, distance, ctx.rng) {
                step.spawned = self.try_spawn_one(ctx);
            }
        } else if live > 0 && roll(&self.params.despawn_rate, env.is_night, distance, ctx.rng) {
            step.despawned = self.try_despawn_one(ctx);
        }
        step
    }

    /// Place one member. `None` if no valid position was found.
    pub fn try_spawn_one(&mut self, ctx: &mut PopulationContext<'_>) -> Option<InstanceId> {
        let position = self.find_spawn_position(ctx)?;
        let p = &self.params;
        let rotation = Quat::from_euler(
            EulerRot::YXZ,
            range_f32(ctx.rng, p.rotation_y.0, p.rotation_y.1).to_radians(),
            range_f32(ctx.rng, p.rotation_x.0, p.rotation_x.1).to_radians(),
            range_f32(ctx.rng, p.rotation_z.0, p.rotation_z.1).to_radians(),
        );
        let parent = Parent::Cluster(self.id);

        let id = match ctx.pool.as_deref_mut() {
            Some(pool) => pool.get(
                self.template,
                position,
                rotation,
                parent,
                ctx.scene,
                ctx.catalog,
            )?,
            None => {
                let instance = ctx.catalog.get(self.template)?.instantiate(self.template);
                let id = ctx.scene.spawn(instance);
                ctx.scene.set_parent(id, parent);
                if let Some(inst) = ctx.scene.get_mut(id) {
                    inst.transform.position = position;
                    inst.transform.rotation = rotation;
                }
                ctx.scene.set_active(id, true);
                id
            }
        };

        let factor = range_f32(ctx.rng, p.scale_range.0, p.scale_range.1);
        if let Some(inst) = ctx.scene.get_mut(id) {
            inst.transform.scale *= factor;
        }
        Some(id)
    }

    /// Remove a uniformly chosen member. `None` if the cluster is empty.
    pub fn try_despawn_one(&mut self, ctx: &mut PopulationContext<'_>) -> Option<InstanceId> {
        let members = self.members(ctx.scene);
        if members.is_empty() {
            return None;
        }
        let id = members[index(ctx.rng, members.len())];
        release(id, ctx);
        Some(id)
    }

    /// Release every member and return their ids.
    pub fn teardown(&mut self, ctx: &mut PopulationContext<'_>) -> Vec<InstanceId> {
        let members = self.members(ctx.scene).to_vec();
        for id in &members {
            release(*id, ctx);
        }
        members
    }

    /// Find a valid member position within `spread` of the origin.
    pub fn find_spawn_position(&self, ctx: &mut PopulationContext<'_>) -> Option<Vec3> {
        let p = &self.params;
        for _ in 0..SPAWN_ATTEMPTS {
            let offset = inside_unit_circle(ctx.rng) * p.spread;
            let x = self.origin.x + offset.x;
            let z = self.origin.z + offset.y;
            let mut y = self.origin.y;

            if let Some(terrain) = ctx.terrain {
                if !terrain.contains_xz(x, z) {
                    continue;
                }
                y = terrain.sample_height(x, z);
                let h01 = inverse_lerp(self.min_world_height, self.max_world_height, y);
                if h01 < p.height_band.0 || h01 > p.height_band.1 {
                    continue;
                }
            }

            let candidate = Vec3::new(x, y, z);

            if let (Some(border), Some(terrain)) = (ctx.border, ctx.terrain) {
                if !border.is_inside_world(candidate, terrain.origin(), terrain.size()) {
                    continue;
                }
            }

            if p.overlap_avoid && p.overlap_radius > 0.0 {
                if let Some(grid) = ctx.grid {
                    let coord = grid.world_to_chunk(candidate);
                    if grid.is_position_too_close(candidate, p.overlap_radius, coord, &*ctx.scene) {
                        continue;
                    }
                }
            }

            return Some(candidate);
        }
        None
    }
}

fn roll(rate: &RateSettings, is_night: bool, distance: f32, rng: &mut dyn RngCore) -> bool {
    rate.can_attempt(is_night, distance) && rand01(rng) < rate.chance(is_night)
}

fn release(id: InstanceId, ctx: &mut PopulationContext<'_>) {
    match ctx.pool.as_deref_mut() {
        Some(pool) => {
            pool.release(id, ctx.scene, ctx.catalog);
        }
        None => {
            ctx.scene.despawn(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::border::BorderSettings;
    use crate::field::{Curve, ScalarField};
    use crate::grid::GridSettings;
    use crate::population::scene::{Instance, Transform};
    use crate::world::catalog::Template;

    struct Fixture {
        scene: Scene,
        pool: ObjectPool,
        catalog: TemplateCatalog,
        rng: StdRng,
        template: TemplateId,
    }

    impl Fixture {
        fn new(seed: u64) -> Self {
            let mut catalog = TemplateCatalog::new();
            let template = catalog
                .register(Template::new("shrub").with_base_scale(Vec3::splat(2.0)))
                .expect("shrub registers");
            Self {
                scene: Scene::new(),
                pool: ObjectPool::new(),
                catalog,
                rng: StdRng::seed_from_u64(seed),
                template,
            }
        }

        fn ctx(&mut self) -> PopulationContext<'_> {
            PopulationContext {
                scene: &mut self.scene,
                pool: Some(&mut self.pool),
                catalog: &self.catalog,
                terrain: None,
                border: None,
                grid: None,
                rng: &mut self.rng,
            }
        }
    }

    fn params(target: usize) -> ClusterParams {
        ClusterParams {
            target_count: target,
            spread: 5.0,
            check_interval: 2.0,
            spawn_rate: RateSettings::always(1.0),
            despawn_rate: RateSettings::always(1.0),
            ..Default::default()
        }
    }

    fn flat_terrain(height: f32) -> Terrain {
        let heights = ScalarField::from_fn(11, 11, |_, _| height);
        Terrain::from_heights(heights, Vec3::ZERO, Vec3::new(100.0, 50.0, 100.0), 1.0, &Curve::Linear)
    }

    #[test]
    fn reaches_target_within_target_intervals() {
        let mut fx = Fixture::new(1);
        let target = 6;
        let mut cluster = ClusterController::new(
            ClusterId::new(0),
            fx.template,
            Vec3::new(10.0, 0.0, 10.0),
            params(target),
            (0.0, 10.0),
        );
        let env = ClusterEnv::default();
        for _ in 0..target {
            let step = cluster.update(2.0, &env, &mut fx.ctx());
            assert!(step.checked);
        }
        assert_eq!(cluster.live_count(&fx.scene), target);
    }

    #[test]
    fn checks_follow_the_interval() {
        let mut fx = Fixture::new(2);
        let mut cluster = ClusterController::new(
            ClusterId::new(0),
            fx.template,
            Vec3::ZERO,
            params(10),
            (0.0, 10.0),
        );
        let env = ClusterEnv::default();
        assert!(cluster.update(0.5, &env, &mut fx.ctx()).checked);
        assert!(!cluster.update(0.5, &env, &mut fx.ctx()).checked);
        assert!(!cluster.update(0.9, &env, &mut fx.ctx()).checked);
        assert!(cluster.update(0.2, &env, &mut fx.ctx()).checked);
    }

    #[test]
    fn reactivation_checks_immediately() {
        let mut fx = Fixture::new(3);
        let mut cluster = ClusterController::new(
            ClusterId::new(0),
            fx.template,
            Vec3::ZERO,
            params(10),
            (0.0, 10.0),
        );
        let env = ClusterEnv::default();
        assert!(cluster.update(0.1, &env, &mut fx.ctx()).checked);
        cluster.set_active(false);
        assert!(!cluster.update(100.0, &env, &mut fx.ctx()).checked);
        cluster.set_active(true);
        assert!(cluster.update(0.01, &env, &mut fx.ctx()).checked);
    }

    #[test]
    fn at_target_a_check_despawns() {
        let mut fx = Fixture::new(4);
        let mut cluster = ClusterController::new(
            ClusterId::new(0),
            fx.template,
            Vec3::ZERO,
            params(2),
            (0.0, 10.0),
        );
        let spawned = cluster.spawn_initial_population(&mut fx.ctx());
        assert_eq!(spawned.len(), 2);

        let step = cluster.tick_once(&ClusterEnv::default(), &mut fx.ctx());
        let gone = step.despawned.expect("a member is released");
        assert!(spawned.contains(&gone));
        assert_eq!(cluster.live_count(&fx.scene), 1);
        assert_eq!(fx.pool.available(fx.template), 1);
    }

    #[test]
    fn rate_gates_block_attempts() {
        let mut fx = Fixture::new(5);
        let mut p = params(3);
        p.spawn_rate = RateSettings::always(1.0).with_player_distance(50.0, 0.0);
        let mut cluster =
            ClusterController::new(ClusterId::new(0), fx.template, Vec3::ZERO, p, (0.0, 10.0));
        let near = ClusterEnv {
            is_night: false,
            player_position: Some(Vec3::new(10.0, 0.0, 0.0)),
        };
        assert_eq!(cluster.tick_once(&near, &mut fx.ctx()).spawned, None);
        let far = ClusterEnv {
            player_position: Some(Vec3::new(80.0, 0.0, 0.0)),
            ..near
        };
        assert!(cluster.tick_once(&far, &mut fx.ctx()).spawned.is_some());
    }

    #[test]
    fn members_get_randomized_scale_over_base() {
        let mut fx = Fixture::new(6);
        let mut p = params(1);
        p.scale_range = (1.5, 1.5);
        let mut cluster =
            ClusterController::new(ClusterId::new(0), fx.template, Vec3::ZERO, p, (0.0, 10.0));
        let id = cluster.try_spawn_one(&mut fx.ctx()).expect("unconstrained spawn");
        let inst = fx.scene.get(id).expect("live");
        assert_eq!(inst.transform.scale, Vec3::splat(3.0));
        assert!(inst.transform.position.length() <= 5.0 + 1e-4);
    }

    #[test]
    fn height_band_and_terrain_bounds_reject_candidates() {
        let mut fx = Fixture::new(7);
        let template = fx.template;
        let terrain = flat_terrain(0.5);
        let world_height = (terrain.min_world_height(), terrain.max_world_height());

        let mut high_only = params(1);
        high_only.height_band = (0.9, 1.0);
        let cluster = ClusterController::new(
            ClusterId::new(0),
            fx.template,
            Vec3::new(50.0, 25.0, 50.0),
            high_only,
            world_height,
        );
        let mut ctx = fx.ctx();
        ctx.terrain = Some(&terrain);
        assert_eq!(cluster.find_spawn_position(&mut ctx), None);

        let mut mid = params(1);
        mid.height_band = (0.4, 0.6);
        let cluster = ClusterController::new(
            ClusterId::new(1),
            template,
            Vec3::new(50.0, 0.0, 50.0),
            mid,
            world_height,
        );
        let pos = cluster.find_spawn_position(&mut ctx).expect("flat ground in band");
        assert!((pos.y - 25.0).abs() < 1e-4);

        let off_map = ClusterController::new(
            ClusterId::new(2),
            template,
            Vec3::new(-500.0, 0.0, -500.0),
            params(1),
            world_height,
        );
        assert_eq!(off_map.find_spawn_position(&mut ctx), None);
    }

    #[test]
    fn border_rejects_candidates_outside_the_world() {
        let mut fx = Fixture::new(8);
        let terrain = flat_terrain(0.5);
        let border = WorldBorder::new(BorderSettings::default().with_shape(0.5, 0.0), 42);
        let world_height = (terrain.min_world_height(), terrain.max_world_height());
        let mut corner = params(1);
        corner.spread = 0.5;
        let cluster = ClusterController::new(
            ClusterId::new(0),
            fx.template,
            Vec3::new(0.5, 0.0, 0.5),
            corner,
            world_height,
        );
        let mut ctx = fx.ctx();
        ctx.terrain = Some(&terrain);
        ctx.border = Some(&border);
        assert_eq!(cluster.find_spawn_position(&mut ctx), None);
    }

    #[test]
    fn overlap_with_a_neighbouring_cluster_rejects_candidates() {
        let mut fx = Fixture::new(9);
        let mut grid = SpatialGrid::new(GridSettings::default());
        let other = ClusterId::new(7);
        grid.register_cluster(other, Vec3::new(95.0, 0.0, 5.0));
        let blocker = fx
            .scene
            .spawn(Instance::untemplated(Transform::from_position(Vec3::new(100.0, 0.0, 5.0))));
        fx.scene.set_parent(blocker, Parent::Cluster(other));

        let mut p = params(1);
        p.overlap_avoid = true;
        p.overlap_radius = 50.0;
        let cluster =
            ClusterController::new(ClusterId::new(0), fx.template, Vec3::new(105.0, 0.0, 5.0), p, (0.0, 10.0));
        let mut ctx = fx.ctx();
        ctx.grid = Some(&grid);
        assert_eq!(cluster.find_spawn_position(&mut ctx), None);

        ctx.grid = None;
        assert!(cluster.find_spawn_position(&mut ctx).is_some());
    }

    #[test]
    fn teardown_returns_everyone_to_the_pool() {
        let mut fx = Fixture::new(10);
        let mut cluster = ClusterController::new(
            ClusterId::new(0),
            fx.template,
            Vec3::ZERO,
            params(5),
            (0.0, 10.0),
        );
        let spawned = cluster.spawn_initial_population(&mut fx.ctx());
        let released = cluster.teardown(&mut fx.ctx());
        assert_eq!(spawned.len(), released.len());
        assert_eq!(cluster.live_count(&fx.scene), 0);
        assert_eq!(fx.pool.available(fx.template), spawned.len());
    }

    #[test]
    fn without_a_pool_members_are_destroyed() {
        let mut fx = Fixture::new(11);
        let mut cluster = ClusterController::new(
            ClusterId::new(0),
            fx.template,
            Vec3::ZERO,
            params(1),
            (0.0, 10.0),
        );
        let mut ctx = fx.ctx();
        ctx.pool = None;
        let id = cluster.try_spawn_one(&mut ctx).expect("spawned");
        assert!(ctx.scene.is_active(id));
        assert_eq!(cluster.try_despawn_one(&mut ctx), Some(id));
        assert!(!ctx.scene.contains(id));
    }

    #[test]
    fn parameters_are_sanitized() {
        let fx = Fixture::new(12);
        let raw = ClusterParams {
            spread: 0.0,
            scale_range: (2.0, 1.0),
            height_band: (0.8, 0.2),
            overlap_radius: -1.0,
            check_interval: 0.0,
            ..Default::default()
        };
        let cluster = ClusterController::new(ClusterId::new(0), fx.template, Vec3::ZERO, raw, (5.0, 5.0));
        let p = cluster.params();
        assert_eq!(p.spread, 0.01);
        assert_eq!(p.scale_range, (2.0, 2.0));
        assert_eq!(p.height_band, (0.8, 0.8));
        assert_eq!(p.overlap_radius, 0.0);
        assert_eq!(p.check_interval, 0.1);
        assert_eq!(cluster.world_height(), (5.0, 5.01));
    }
}
