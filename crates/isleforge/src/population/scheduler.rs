//! Budgeted round-robin ticking of population members.
//!
//! A [`ChunkScheduler`] holds one registration per member and advances a cursor
//! through them, visiting at most `budget` entries per [`ChunkScheduler::run`]. Dead or
//! disabled members are removed in place; removal at the cursor leaves the cursor
//! where it is so the next entry slides into the visited slot. A periodic sweep drops
//! dead registrations anywhere in the list.
//!
//! Behaviours never touch the scheduler directly. A tick may request its own despawn
//! through [`TickContext`]; the request is collected into the [`TickReport`] and the
//! owner applies it after the pass.
use tracing::trace;

use crate::population::scene::{InstanceId, Scene, TickOutcome, Transform};

/// Per-instance behaviour driven by a [`ChunkScheduler`].
pub trait Tickable {
    fn tick(&mut self, ctx: &mut TickContext<'_>);
}

/// State handed to a [`Tickable`] for one tick.
pub struct TickContext<'a> {
    id: InstanceId,
    now: f32,
    pub transform: &'a mut Transform,
    despawn: bool,
}

impl<'a> TickContext<'a> {
    pub fn new(id: InstanceId, now: f32, transform: &'a mut Transform) -> Self {
        Self {
            id,
            now,
            transform,
            despawn: false,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Simulation time in seconds.
    pub fn now(&self) -> f32 {
        self.now
    }

    /// Ask the owner to release this instance once the pass completes.
    pub fn request_despawn(&mut self) {
        self.despawn = true;
    }

    pub fn despawn_requested(&self) -> bool {
        self.despawn
    }
}

/// Scheduler limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Entries visited per run. Zero visits every entry.
    pub budget: usize,
    /// Runs between full sweeps of dead registrations. Zero disables sweeping.
    pub sweep_interval_frames: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            budget: 256,
            sweep_interval_frames: 120,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Registration {
    member: InstanceId,
    next_tick: f32,
}

/// Summary of one [`ChunkScheduler::run`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Entries inspected, including removed ones.
    pub visited: usize,
    /// Members whose behaviour ran.
    pub ticked: Vec<InstanceId>,
    /// Registrations dropped because the member was dead or disabled.
    pub removed: usize,
    /// Members that asked to be despawned. Already unregistered.
    pub despawn_requests: Vec<InstanceId>,
    /// Whether a full sweep ran this pass.
    pub swept: bool,
}

/// Round-robin scheduler for the members of one chunk.
#[derive(Clone, Debug, Default)]
pub struct ChunkScheduler {
    settings: SchedulerSettings,
    entries: Vec<Registration>,
    cursor: usize,
    frame: u64,
}

impl ChunkScheduler {
    pub fn new(settings: SchedulerSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub fn set_budget(&mut self, budget: usize) {
        self.settings.budget = budget;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn contains(&self, member: InstanceId) -> bool {
        self.entries.iter().any(|e| e.member == member)
    }

    /// Register a member. Returns `false` if it was already registered.
    pub fn register(&mut self, member: InstanceId) -> bool {
        if self.contains(member) {
            return false;
        }
        self.entries.push(Registration {
            member,
            next_tick: f32::NEG_INFINITY,
        });
        true
    }

    /// Unregister a member. Returns `false` if it was not registered.
    pub fn unregister(&mut self, member: InstanceId) -> bool {
        match self.entries.iter().position(|e| e.member == member) {
            Some(i) => {
                self.remove_at(i);
                true
            }
            None => false,
        }
    }

    /// Drop all registrations.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    /// Visit up to `budget` entries starting at the cursor.
    pub fn run(&mut self, now: f32, scene: &mut Scene) -> TickReport {
        let mut report = TickReport::default();
        self.frame = self.frame.wrapping_add(1);

        if self.settings.sweep_interval_frames > 0
            && self.frame % self.settings.sweep_interval_frames == 0
        {
            report.removed += self.sweep(scene);
            report.swept = true;
        }

        let steps = match self.settings.budget {
            0 => self.entries.len(),
            b => b.min(self.entries.len()),
        };

        while report.visited < steps && !self.entries.is_empty() {
            if self.cursor >= self.entries.len() {
                self.cursor = 0;
            }
            report.visited += 1;

            let entry = self.entries[self.cursor];
            if !scene.is_active(entry.member) {
                self.entries.remove(self.cursor);
                report.removed += 1;
                continue;
            }
            if now < entry.next_tick {
                self.cursor += 1;
                continue;
            }

            match scene.tick(entry.member, now) {
                TickOutcome::Dead => {
                    self.entries.remove(self.cursor);
                    report.removed += 1;
                    continue;
                }
                TickOutcome::Idle => {}
                TickOutcome::Ticked { despawn_requested } => {
                    report.ticked.push(entry.member);
                    if despawn_requested {
                        self.entries.remove(self.cursor);
                        report.despawn_requests.push(entry.member);
                        continue;
                    }
                }
            }

            let interval = scene
                .get(entry.member)
                .and_then(|i| i.tick_interval())
                .unwrap_or(0.0);
            self.entries[self.cursor].next_tick = now + interval;
            self.cursor += 1;
        }

        if self.cursor >= self.entries.len() {
            self.cursor = 0;
        }

        trace!(
            "Scheduler pass visited {} of {} entries, ticked {}",
            report.visited,
            self.entries.len() + report.removed + report.despawn_requests.len(),
            report.ticked.len()
        );
        report
    }

    /// Remove every registration whose member is dead or disabled.
    pub fn sweep(&mut self, scene: &Scene) -> usize {
        let before = self.entries.len();
        let mut removed_before_cursor = 0;
        let mut index = 0;
        let cursor = self.cursor;
        self.entries.retain(|e| {
            let keep = scene.is_active(e.member);
            if !keep && index < cursor {
                removed_before_cursor += 1;
            }
            index += 1;
            keep
        });
        self.cursor -= removed_before_cursor;
        if self.cursor >= self.entries.len() {
            self.cursor = 0;
        }
        before - self.entries.len()
    }

    fn remove_at(&mut self, i: usize) {
        self.entries.remove(i);
        if i < self.cursor {
            self.cursor -= 1;
        }
        if self.cursor >= self.entries.len() {
            self.cursor = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    use glam::Vec3;

    use super::*;
    use crate::population::scene::Instance;

    struct Recorder {
        log: Rc<RefCell<Vec<InstanceId>>>,
        despawn_after: Option<usize>,
        ticks: usize,
    }

    impl Tickable for Recorder {
        fn tick(&mut self, ctx: &mut TickContext<'_>) {
            self.ticks += 1;
            self.log.borrow_mut().push(ctx.id());
            if self.despawn_after == Some(self.ticks) {
                ctx.request_despawn();
            }
        }
    }

    fn populate(
        scene: &mut Scene,
        sched: &mut ChunkScheduler,
        n: usize,
        log: &Rc<RefCell<Vec<InstanceId>>>,
    ) -> Vec<InstanceId> {
        (0..n)
            .map(|i| {
                let id = scene.spawn(
                    Instance::untemplated(Transform::from_position(Vec3::splat(i as f32)))
                        .with_behaviour(Box::new(Recorder {
                            log: Rc::clone(log),
                            despawn_after: None,
                            ticks: 0,
                        })),
                );
                sched.register(id);
                id
            })
            .collect()
    }

    fn scheduler(budget: usize) -> ChunkScheduler {
        ChunkScheduler::new(SchedulerSettings {
            budget,
            sweep_interval_frames: 0,
        })
    }

    #[test]
    fn budget_limits_each_pass_and_covers_everyone() {
        let mut scene = Scene::new();
        let mut sched = scheduler(4);
        let log = Rc::new(RefCell::new(Vec::new()));
        let ids = populate(&mut scene, &mut sched, 10, &log);

        let first = sched.run(0.0, &mut scene);
        assert_eq!(first.ticked.len(), 4);
        let distinct: HashSet<_> = first.ticked.iter().copied().collect();
        assert_eq!(distinct.len(), 4);

        sched.run(0.0, &mut scene);
        let third = sched.run(0.0, &mut scene);
        assert_eq!(third.ticked.len(), 4);

        // ceil(10 / 4) = 3 passes cover every member.
        let seen: HashSet<_> = log.borrow().iter().copied().collect();
        assert_eq!(seen, ids.iter().copied().collect());
    }

    #[test]
    fn unbounded_budget_ticks_each_member_once() {
        let mut scene = Scene::new();
        let mut sched = scheduler(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        populate(&mut scene, &mut sched, 7, &log);

        let report = sched.run(0.0, &mut scene);
        assert_eq!(report.ticked.len(), 7);
        let distinct: HashSet<_> = report.ticked.iter().copied().collect();
        assert_eq!(distinct.len(), 7);
    }

    #[test]
    fn removal_at_cursor_does_not_skip_the_next_member() {
        let mut scene = Scene::new();
        let mut sched = scheduler(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let ids = populate(&mut scene, &mut sched, 5, &log);

        scene.despawn(ids[2]);
        let report = sched.run(0.0, &mut scene);
        assert_eq!(report.removed, 1);
        assert_eq!(report.ticked, vec![ids[0], ids[1], ids[3], ids[4]]);
        assert_eq!(sched.len(), 4);
    }

    #[test]
    fn unregister_keeps_cursor_in_bounds() {
        let mut scene = Scene::new();
        let mut sched = scheduler(3);
        let log = Rc::new(RefCell::new(Vec::new()));
        let ids = populate(&mut scene, &mut sched, 4, &log);

        sched.run(0.0, &mut scene);
        assert_eq!(sched.cursor(), 3);
        assert!(sched.unregister(ids[3]));
        assert!(sched.cursor() < sched.len());
        assert!(!sched.unregister(ids[3]));

        // Removing before the cursor shifts it back so nobody is skipped.
        sched.set_budget(1);
        assert_eq!(sched.run(0.0, &mut scene).ticked, vec![ids[0]]);
        assert_eq!(sched.cursor(), 1);
        assert!(sched.unregister(ids[0]));
        assert_eq!(sched.cursor(), 0);
        assert_eq!(sched.run(0.0, &mut scene).ticked, vec![ids[1]]);
    }

    #[test]
    fn register_is_idempotent() {
        let mut scene = Scene::new();
        let mut sched = scheduler(0);
        let id = scene.spawn(Instance::untemplated(Transform::default()));
        assert!(sched.register(id));
        assert!(!sched.register(id));
        assert_eq!(sched.len(), 1);
    }

    #[test]
    fn despawn_requests_unregister_immediately() {
        let mut scene = Scene::new();
        let mut sched = scheduler(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let quitter = scene.spawn(Instance::untemplated(Transform::default()).with_behaviour(
            Box::new(Recorder {
                log: Rc::clone(&log),
                despawn_after: Some(1),
                ticks: 0,
            }),
        ));
        sched.register(quitter);
        let others = populate(&mut scene, &mut sched, 2, &log);

        let report = sched.run(0.0, &mut scene);
        assert_eq!(report.despawn_requests, vec![quitter]);
        assert_eq!(report.ticked, vec![quitter, others[0], others[1]]);
        assert!(!sched.contains(quitter));
    }

    #[test]
    fn intervals_delay_the_next_tick() {
        let mut scene = Scene::new();
        let mut sched = scheduler(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let id = scene.spawn(
            Instance::untemplated(Transform::default())
                .with_behaviour(Box::new(Recorder {
                    log: Rc::clone(&log),
                    despawn_after: None,
                    ticks: 0,
                }))
                .with_tick_interval(Some(1.0)),
        );
        sched.register(id);

        assert_eq!(sched.run(0.0, &mut scene).ticked.len(), 1);
        assert_eq!(sched.run(0.5, &mut scene).ticked.len(), 0);
        assert_eq!(sched.run(1.0, &mut scene).ticked.len(), 1);
    }

    #[test]
    fn periodic_sweep_drops_dead_entries_behind_the_cursor() {
        let mut scene = Scene::new();
        let mut sched = ChunkScheduler::new(SchedulerSettings {
            budget: 2,
            sweep_interval_frames: 2,
        });
        let log = Rc::new(RefCell::new(Vec::new()));
        let ids = populate(&mut scene, &mut sched, 4, &log);

        let first = sched.run(0.0, &mut scene);
        assert!(!first.swept);
        assert_eq!(sched.cursor(), 2);

        scene.set_active(ids[0], false);
        scene.despawn(ids[1]);
        let second = sched.run(0.0, &mut scene);
        assert!(second.swept);
        assert_eq!(second.removed, 2);
        assert_eq!(second.ticked, vec![ids[2], ids[3]]);
        assert_eq!(sched.len(), 2);
    }
}
