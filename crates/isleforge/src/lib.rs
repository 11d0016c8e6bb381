#![forbid(unsafe_code)]
//! isleforge: bounded procedural worlds with noise-shaped borders and chunked,
//! budget-ticked populations.
//!
//! Modules:
//! - field: scalar grids, fractal noise, falloff masks and response curves
//! - border: irregular world border and its height/spawn-mask shaping
//! - terrain: heightfield pipeline, region table, committed terrain sampling
//! - grid: chunk partition, activation around the player, overlap queries
//! - population: instance scene, object pool, clusters, rate gates, scheduler
//! - world: template catalog, configuration, events, assembler
//!
//! For a walkthrough, see the README and the `isleforge_examples` crate.
pub mod border;
pub mod error;
pub mod field;
pub mod grid;
pub mod population;
pub mod sampling;
pub mod terrain;
pub mod world;

/// Convenient re-exports for common types. Import with `use isleforge::prelude::*;`.
pub mod prelude {
    pub use crate::border::{BorderSettings, WorldBorder};
    pub use crate::error::{Error, Result};
    pub use crate::field::{
        Curve, CurveKey, FalloffSettings, Heightfield, NoiseField, NoiseSettings, ScalarField,
        SpawnEligibilityField,
    };
    pub use crate::grid::{ChunkCoord, ClusterProximity, GridSettings, SpatialGrid};
    pub use crate::population::{
        ChunkScheduler, ClusterController, ClusterId, ClusterParams, DayNightCycle, InstanceId,
        ObjectPool, Parent, RateSettings, Scene, TickContext, Tickable, TimeFilter, Transform,
    };
    pub use crate::terrain::{
        RegionShaderParams, RegionTable, Terrain, TerrainGenerator, TerrainRegion,
        TerrainSettings,
    };
    pub use crate::world::{
        CatalogDef, EventSink, FnSink, GenerationSummary, MultiSink, NavigationBuilder,
        PlayerLocator, SpawnCategory, SpawnDefinition, StepReport, Template, TemplateCatalog,
        TemplateId, VecSink, WorldAssembler, WorldConfig, WorldEvent, WorldEventKind,
    };
}
