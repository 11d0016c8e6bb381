//! Runtime population: the instance scene, pooling, spawn clusters and budgeted ticking.
pub mod cluster;
pub mod daynight;
pub mod pool;
pub mod rate;
pub mod scene;
pub mod scheduler;

pub use cluster::{
    ClusterController, ClusterEnv, ClusterId, ClusterParams, ClusterStep, PopulationContext,
};
pub use daynight::DayNightCycle;
pub use pool::ObjectPool;
pub use rate::{RateSettings, TimeFilter};
pub use scene::{Instance, InstanceId, Parent, Scene, TickOutcome, Transform};
pub use scheduler::{ChunkScheduler, SchedulerSettings, TickContext, TickReport, Tickable};
