//! Event types and sinks for observing world generation and simulation.
//!
//! [`crate::world::assembler::WorldAssembler::generate_with_events`] and
//! [`crate::world::assembler::WorldAssembler::step_with_events`] report through an
//! [`EventSink`]. Sinks may decline whole event kinds via [`EventSink::wants`], in
//! which case the assembler skips building those events.
use glam::Vec3;

use crate::grid::ChunkCoord;
use crate::population::cluster::ClusterId;
use crate::population::scene::InstanceId;
use crate::world::assembler::GenerationSummary;
use crate::world::catalog::SpawnCategory;

/// Describes events emitted while generating or stepping a world.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum WorldEvent {
    /// Emitted when generation starts.
    GenerationStarted {
        /// Terrain and border seed.
        seed: i32,
        /// Seed of the spawn masks and placement randomness.
        spawn_seed: i32,
    },

    /// Emitted once the heightfield is shaped and committed.
    TerrainCommitted {
        /// Samples per side.
        resolution: usize,
        min_world_height: f32,
        max_world_height: f32,
    },

    /// Emitted after the navigation builder ran.
    NavigationBuilt,

    /// Emitted when a cluster is created and has placed its initial population.
    ClusterSpawned {
        cluster: ClusterId,
        /// Display name of the spawn definition.
        definition: String,
        category: SpawnCategory,
        chunk: ChunkCoord,
        origin: Vec3,
        /// Population the cluster maintains.
        target: usize,
        /// Members placed by the initial population pass.
        initial: usize,
    },

    /// Emitted when a cluster places a member.
    MemberSpawned {
        cluster: ClusterId,
        member: InstanceId,
        position: Vec3,
    },

    /// Emitted when a member leaves the world, by cluster despawn or on its own request.
    MemberDespawned {
        cluster: Option<ClusterId>,
        member: InstanceId,
    },

    /// Emitted when the player's movement flips a chunk's activation.
    ChunkActivationChanged { coord: ChunkCoord, active: bool },

    /// Emitted when generation finishes.
    GenerationFinished {
        /// Clusters and members created.
        summary: GenerationSummary,
    },

    /// Non-fatal warning.
    Warning {
        /// Context string (e.g. definition name, phase).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Discriminant of [`WorldEvent`], used for filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorldEventKind {
    GenerationStarted,
    TerrainCommitted,
    NavigationBuilt,
    ClusterSpawned,
    MemberSpawned,
    MemberDespawned,
    ChunkActivationChanged,
    GenerationFinished,
    Warning,
}

impl WorldEvent {
    pub fn kind(&self) -> WorldEventKind {
        match self {
            WorldEvent::GenerationStarted { .. } => WorldEventKind::GenerationStarted,
            WorldEvent::TerrainCommitted { .. } => WorldEventKind::TerrainCommitted,
            WorldEvent::NavigationBuilt => WorldEventKind::NavigationBuilt,
            WorldEvent::ClusterSpawned { .. } => WorldEventKind::ClusterSpawned,
            WorldEvent::MemberSpawned { .. } => WorldEventKind::MemberSpawned,
            WorldEvent::MemberDespawned { .. } => WorldEventKind::MemberDespawned,
            WorldEvent::ChunkActivationChanged { .. } => WorldEventKind::ChunkActivationChanged,
            WorldEvent::GenerationFinished { .. } => WorldEventKind::GenerationFinished,
            WorldEvent::Warning { .. } => WorldEventKind::Warning,
        }
    }

    pub fn warning(context: impl Into<String>, message: impl Into<String>) -> Self {
        WorldEvent::Warning {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// A generic event sink that accepts [`WorldEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: WorldEvent);

    /// Whether events of `kind` should be built and sent at all.
    #[inline]
    fn wants(&self, _kind: WorldEventKind) -> bool {
        true
    }

    fn send_many<I>(&mut self, events: I)
    where
        Self: Sized,
        I: IntoIterator<Item = WorldEvent>,
    {
        for e in events {
            self.send(e);
        }
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: WorldEvent) {}

    #[inline]
    fn wants(&self, _kind: WorldEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(WorldEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(WorldEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(WorldEvent),
{
    #[inline]
    fn send(&mut self, event: WorldEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects events in a `Vec`, optionally only some kinds.
#[derive(Default)]
pub struct VecSink {
    events: Vec<WorldEvent>,
    only: Option<Vec<WorldEventKind>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            events: Vec::with_capacity(cap),
            only: None,
        }
    }

    /// Collect only the listed kinds.
    pub fn only(kinds: impl IntoIterator<Item = WorldEventKind>) -> Self {
        Self {
            events: Vec::new(),
            only: Some(kinds.into_iter().collect()),
        }
    }

    pub fn into_inner(self) -> Vec<WorldEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[WorldEvent] {
        &self.events
    }

    pub fn count(&self, kind: WorldEventKind) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: WorldEvent) {
        if self.wants(event.kind()) {
            self.events.push(event);
        }
    }

    fn wants(&self, kind: WorldEventKind) -> bool {
        self.only.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<S: EventSink> {
    pub(crate) sinks: Vec<S>,
}

impl<S: EventSink> MultiSink<S> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: S) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn into_inner(self) -> Vec<S> {
        self.sinks
    }
}

impl<S: EventSink> Default for MultiSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> EventSink for MultiSink<S> {
    fn send(&mut self, event: WorldEvent) {
        let kind = event.kind();
        let mut targets: Vec<usize> = (0..self.sinks.len())
            .filter(|&i| self.sinks[i].wants(kind))
            .collect();
        let Some(last) = targets.pop() else {
            return;
        };
        for i in targets {
            self.sinks[i].send(event.clone());
        }
        self.sinks[last].send(event);
    }

    fn wants(&self, kind: WorldEventKind) -> bool {
        self.sinks.iter().any(|s| s.wants(kind))
    }
}

/// Minimal adapter trait for types that can expose an [`EventSink`].
pub trait AsEventSink {
    fn as_event_sink(&mut self) -> &mut dyn EventSink;
}

impl<S: EventSink> AsEventSink for S {
    fn as_event_sink(&mut self) -> &mut dyn EventSink {
        self
    }
}
