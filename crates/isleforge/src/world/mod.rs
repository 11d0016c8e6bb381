//! World assembly: template catalog, configuration, events and the assembler that
//! wires terrain, grid, pool and clusters together.
pub mod assembler;
pub mod catalog;
pub mod config;
pub mod events;

pub use assembler::{
    GenerationSummary, NavigationBuilder, PlayerLocator, StepReport, WorldAssembler,
};
pub use catalog::{
    BehaviourFactory, CatalogDef, PrewarmEntry, SpawnCategory, SpawnDefinition, Template,
    TemplateCatalog, TemplateDef, TemplateId,
};
pub use config::WorldConfig;
pub use events::{
    AsEventSink, EventSink, FnSink, MultiSink, VecSink, WorldEvent, WorldEventKind,
};
