//! Chunked spatial partition of the world.
//!
//! The world is divided into square chunks of `chunk_size` world units, addressed by
//! [`ChunkCoord`] (`floor(x / size)`, `floor(z / size)`). Chunks are created lazily
//! when the first cluster registers in them and live until [`SpatialGrid::clear_all`].
//! Each chunk owns the ids of its clusters and a [`ChunkScheduler`] for their members.
//!
//! Chunk activation follows the player: whenever the player's chunk changes, every
//! chunk is active iff its Chebyshev distance to the player's chunk is at most
//! `active_radius`. Inactive chunks are skipped by overlap queries and their
//! schedulers are not run.
use std::collections::HashMap;

use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::population::cluster::ClusterId;
use crate::population::scheduler::{ChunkScheduler, SchedulerSettings};

/// Integer chunk coordinate on the XZ plane.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chebyshev distance in chunks.
    pub fn chebyshev(&self, other: ChunkCoord) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    /// This chunk and its eight neighbours.
    pub fn neighbourhood(self) -> impl Iterator<Item = ChunkCoord> {
        (-1..=1).flat_map(move |dz| (-1..=1).map(move |dx| ChunkCoord::new(self.x + dx, self.z + dz)))
    }
}

/// Answers whether a cluster has a member near a position.
pub trait ClusterProximity {
    /// True if any member of `cluster` lies strictly within `sqrt(radius_sq)` of `position`.
    fn any_member_within(&self, cluster: ClusterId, position: Vec3, radius_sq: f32) -> bool;
}

/// Chunking and activation parameters.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSettings {
    pub chunk_size: f32,
    /// Chunks within this Chebyshev distance of the player are active.
    pub active_radius: i32,
    /// Members ticked per chunk per frame. Zero ticks all.
    pub tick_budget: usize,
    /// Frames between scheduler sweeps. Zero disables sweeping.
    pub sweep_interval_frames: u64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            chunk_size: 100.0,
            active_radius: 2,
            tick_budget: 256,
            sweep_interval_frames: 120,
        }
    }
}

impl GridSettings {
    pub fn with_chunk_size(mut self, chunk_size: f32) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_active_radius(mut self, radius: i32) -> Self {
        self.active_radius = radius;
        self
    }

    pub fn with_tick_budget(mut self, budget: usize) -> Self {
        self.tick_budget = budget;
        self
    }

    /// Validates the settings, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if !(self.chunk_size > 0.0) || !self.chunk_size.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "chunk_size must be a finite value > 0, got {}",
                self.chunk_size
            )));
        }
        if self.active_radius < 0 {
            return Err(Error::InvalidConfig("active_radius must be >= 0".into()));
        }
        Ok(())
    }

    fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            budget: self.tick_budget,
            sweep_interval_frames: self.sweep_interval_frames,
        }
    }
}

/// One square of the world.
#[derive(Clone, Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    active: bool,
    clusters: Vec<ClusterId>,
    scheduler: ChunkScheduler,
}

impl Chunk {
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn clusters(&self) -> &[ClusterId] {
        &self.clusters
    }

    pub fn scheduler(&self) -> &ChunkScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut ChunkScheduler {
        &mut self.scheduler
    }
}

/// Chunk activation change caused by player movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkToggle {
    pub coord: ChunkCoord,
    pub active: bool,
}

/// Lazily populated chunk map with player-driven activation.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    settings: GridSettings,
    chunks: HashMap<ChunkCoord, Chunk>,
    player_chunk: Option<ChunkCoord>,
}

impl SpatialGrid {
    pub fn new(settings: GridSettings) -> Self {
        Self {
            settings,
            chunks: HashMap::new(),
            player_chunk: None,
        }
    }

    pub fn try_new(settings: GridSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::new(settings))
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    pub fn world_to_chunk(&self, position: Vec3) -> ChunkCoord {
        ChunkCoord::new(
            (position.x / self.settings.chunk_size).floor() as i32,
            (position.z / self.settings.chunk_size).floor() as i32,
        )
    }

    /// Last chunk the player was seen in.
    pub fn player_chunk(&self) -> Option<ChunkCoord> {
        self.player_chunk
    }

    /// Add a cluster to the chunk containing `origin`, creating the chunk if needed.
    /// Returns the chunk and whether it is currently active.
    pub fn register_cluster(&mut self, cluster: ClusterId, origin: Vec3) -> (ChunkCoord, bool) {
        let coord = self.world_to_chunk(origin);
        let active = self.activation_for(coord);
        let scheduler = self.settings.scheduler_settings();
        let chunk = self.chunks.entry(coord).or_insert_with(|| {
            debug!("Created chunk ({}, {})", coord.x, coord.z);
            Chunk {
                coord,
                active,
                clusters: Vec::with_capacity(8),
                scheduler: ChunkScheduler::new(scheduler),
            }
        });
        if !chunk.clusters.contains(&cluster) {
            chunk.clusters.push(cluster);
        }
        if self.player_chunk.is_some() {
            chunk.active = active;
        }
        (coord, chunk.active)
    }

    /// Whether any cluster in the 3x3 chunks around `coord` has a member within
    /// `radius` of `position`. Inactive chunks are skipped.
    pub fn is_position_too_close<P>(
        &self,
        position: Vec3,
        radius: f32,
        coord: ChunkCoord,
        proximity: &P,
    ) -> bool
    where
        P: ClusterProximity + ?Sized,
    {
        let radius_sq = radius * radius;
        coord.neighbourhood().any(|c| {
            self.chunks.get(&c).is_some_and(|chunk| {
                chunk.active
                    && chunk
                        .clusters
                        .iter()
                        .any(|id| proximity.any_member_within(*id, position, radius_sq))
            })
        })
    }

    /// Track the player. When the player's chunk changes, activation is recomputed
    /// for every chunk and the chunks whose state flipped are returned.
    pub fn update_player(&mut self, position: Vec3) -> Vec<ChunkToggle> {
        let current = self.world_to_chunk(position);
        let forced = self.player_chunk.is_none();
        if self.player_chunk == Some(current) {
            return Vec::new();
        }
        self.player_chunk = Some(current);

        let radius = self.settings.active_radius;
        let mut toggled = Vec::new();
        for chunk in self.chunks.values_mut() {
            let active = chunk.coord.chebyshev(current) <= radius;
            if forced || chunk.active != active {
                if chunk.active != active {
                    toggled.push(ChunkToggle {
                        coord: chunk.coord,
                        active,
                    });
                }
                chunk.active = active;
            }
        }
        toggled.sort_by_key(|t| t.coord);
        debug!(
            "Player entered chunk ({}, {}); {} chunks toggled",
            current.x,
            current.z,
            toggled.len()
        );
        toggled
    }

    /// Whether `coord` is active. Chunks that do not exist yet report the state they
    /// would be created with.
    pub fn is_chunk_active(&self, coord: ChunkCoord) -> bool {
        match self.chunks.get(&coord) {
            Some(chunk) => chunk.active,
            None => self.activation_for(coord),
        }
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn chunk_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord)
    }

    pub fn scheduler_mut(&mut self, coord: ChunkCoord) -> Option<&mut ChunkScheduler> {
        self.chunks.get_mut(&coord).map(|c| &mut c.scheduler)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn chunks_mut(&mut self) -> impl Iterator<Item = &mut Chunk> {
        self.chunks.values_mut()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Drop every chunk and forget the player's chunk.
    pub fn clear_all(&mut self) {
        self.chunks.clear();
        self.player_chunk = None;
    }

    fn activation_for(&self, coord: ChunkCoord) -> bool {
        match self.player_chunk {
            Some(player) => coord.chebyshev(player) <= self.settings.active_radius,
            None => true,
        }
    }
}
