//! Instance templates and spawn definitions.
//!
//! A [`TemplateCatalog`] owns the templates instances are created from. Spawn
//! definitions reference templates by name and are resolved against the catalog when
//! the world is assembled; an unknown name fails assembly with
//! [`Error::MissingTemplate`]. With the `ron` feature, [`CatalogDef`] loads templates
//! and definitions from a RON document.
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::population::rate::RateSettings;
use crate::population::scene::Instance;
use crate::population::scheduler::Tickable;

/// Index of a template in its catalog.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(u32);

impl TemplateId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Creates a fresh behaviour for each new instance of a template.
pub type BehaviourFactory = Arc<dyn Fn() -> Box<dyn Tickable> + Send + Sync>;

/// Blueprint for scene instances.
#[derive(Clone)]
pub struct Template {
    name: String,
    base_scale: Vec3,
    tick_interval: Option<f32>,
    behaviour: Option<BehaviourFactory>,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("base_scale", &self.base_scale)
            .field("tick_interval", &self.tick_interval)
            .field("has_behaviour", &self.behaviour.is_some())
            .finish()
    }
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_scale: Vec3::ONE,
            tick_interval: None,
            behaviour: None,
        }
    }

    pub fn with_base_scale(mut self, scale: Vec3) -> Self {
        self.base_scale = scale;
        self
    }

    pub fn with_tick_interval(mut self, interval: f32) -> Self {
        self.tick_interval = Some(interval);
        self
    }

    pub fn with_behaviour<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Tickable> + Send + Sync + 'static,
    {
        self.behaviour = Some(Arc::new(factory));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_scale(&self) -> Vec3 {
        self.base_scale
    }

    pub fn tick_interval(&self) -> Option<f32> {
        self.tick_interval
    }

    pub fn has_behaviour(&self) -> bool {
        self.behaviour.is_some()
    }

    /// Build an inactive instance tagged with `id`.
    pub fn instantiate(&self, id: TemplateId) -> Instance {
        let mut instance =
            Instance::templated(id, self.base_scale).with_tick_interval(self.tick_interval);
        if let Some(factory) = &self.behaviour {
            instance = instance.with_behaviour(factory());
        }
        instance
    }
}

/// Name-indexed template storage.
#[derive(Clone, Debug, Default)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
    by_name: HashMap<String, TemplateId>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template. Names must be unique.
    pub fn register(&mut self, template: Template) -> Result<TemplateId> {
        if self.by_name.contains_key(&template.name) {
            return Err(Error::DuplicateTemplate {
                name: template.name,
            });
        }
        let id = TemplateId(self.templates.len() as u32);
        self.by_name.insert(template.name.clone(), id);
        self.templates.push(template);
        Ok(id)
    }

    pub fn with_template(mut self, template: Template) -> Result<Self> {
        self.register(template)?;
        Ok(self)
    }

    pub fn get(&self, id: TemplateId) -> Option<&Template> {
        self.templates.get(id.index())
    }

    pub fn find(&self, name: &str) -> Option<TemplateId> {
        self.by_name.get(name).copied()
    }

    /// Look up a template by name, failing with [`Error::MissingTemplate`].
    pub fn resolve(&self, name: &str) -> Result<TemplateId> {
        self.find(name).ok_or_else(|| Error::MissingTemplate {
            name: name.to_string(),
        })
    }

    /// Attach a behaviour factory to an existing template.
    pub fn set_behaviour<F>(&mut self, name: &str, factory: F) -> Result<()>
    where
        F: Fn() -> Box<dyn Tickable> + Send + Sync + 'static,
    {
        let id = self.resolve(name)?;
        self.templates[id.index()].behaviour = Some(Arc::new(factory));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TemplateId, &Template)> {
        self.templates
            .iter()
            .enumerate()
            .map(|(i, t)| (TemplateId(i as u32), t))
    }
}

/// Which spawn pass a definition belongs to.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpawnCategory {
    /// Static scenery, placed before navigation is built.
    Asset,
    /// Creatures, placed after navigation is built.
    Creature,
}

/// How and where clusters of one template are scattered.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnDefinition {
    /// Display name, used in logs and events.
    pub name: String,
    /// Template name in the catalog.
    pub template: String,

    pub scale_range: (f32, f32),
    /// Euler rotation ranges in degrees.
    pub rotation_x: (f32, f32),
    pub rotation_y: (f32, f32),
    pub rotation_z: (f32, f32),

    /// Spawn-mask band a cell must fall into.
    pub spawn_threshold: (f32, f32),
    /// Normalized height band for both cluster origins and members.
    pub height_band: (f32, f32),

    /// Only cells whose coordinates are multiples of `step` are considered. Zero
    /// considers every cell.
    pub step: u32,
    /// A cell passes the random gate with probability `random_spawn_chance * 0.1`.
    pub random_spawn_chance: f32,

    pub cluster_count: (u32, u32),
    pub cluster_spread: f32,

    pub overlap_avoid: bool,
    pub overlap_radius: f32,

    /// Seconds between population checks.
    pub check_interval: f32,
    pub spawn_rate: RateSettings,
    pub despawn_rate: RateSettings,
}

impl Default for SpawnDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            template: String::new(),
            scale_range: (1.0, 1.0),
            rotation_x: (0.0, 0.0),
            rotation_y: (0.0, 360.0),
            rotation_z: (0.0, 0.0),
            spawn_threshold: (0.0, 1.0),
            height_band: (0.0, 1.0),
            step: 0,
            random_spawn_chance: 1.0,
            cluster_count: (1, 3),
            cluster_spread: 10.0,
            overlap_avoid: false,
            overlap_radius: 2.0,
            check_interval: 5.0,
            spawn_rate: RateSettings::default(),
            despawn_rate: RateSettings::default(),
        }
    }
}

impl SpawnDefinition {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            ..Default::default()
        }
    }

    pub fn with_step(mut self, step: u32) -> Self {
        self.step = step;
        self
    }

    pub fn with_random_spawn_chance(mut self, chance: f32) -> Self {
        self.random_spawn_chance = chance;
        self
    }

    pub fn with_spawn_threshold(mut self, min: f32, max: f32) -> Self {
        self.spawn_threshold = (min, max);
        self
    }

    pub fn with_height_band(mut self, min: f32, max: f32) -> Self {
        self.height_band = (min, max);
        self
    }

    pub fn with_cluster(mut self, min_count: u32, max_count: u32, spread: f32) -> Self {
        self.cluster_count = (min_count, max_count);
        self.cluster_spread = spread;
        self
    }

    pub fn with_overlap(mut self, radius: f32) -> Self {
        self.overlap_avoid = true;
        self.overlap_radius = radius;
        self
    }

    pub fn with_rates(mut self, spawn: RateSettings, despawn: RateSettings) -> Self {
        self.spawn_rate = spawn;
        self.despawn_rate = despawn;
        self
    }

    pub fn with_check_interval(mut self, seconds: f32) -> Self {
        self.check_interval = seconds;
        self
    }

    /// Whether this definition gates a cell by its step and spawn-mask value.
    pub fn accepts_cell(&self, x: usize, y: usize, spawn_rate: f32) -> bool {
        if self.step > 0 {
            let step = self.step as usize;
            if x % step != 0 || y % step != 0 {
                return false;
            }
        }
        spawn_rate >= self.spawn_threshold.0 && spawn_rate <= self.spawn_threshold.1
    }

    /// Whether a normalized height lies in the definition's band.
    pub fn accepts_height(&self, height01: f32) -> bool {
        height01 >= self.height_band.0 && height01 <= self.height_band.1
    }

    /// Cluster target bounds with `min >= 1` and `max >= min`.
    pub fn cluster_bounds(&self) -> (u32, u32) {
        let min = self.cluster_count.0.max(1);
        (min, self.cluster_count.1.max(min))
    }
}

/// Template description without behaviour, as loaded from data.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateDef {
    pub name: String,
    pub base_scale: Vec3,
    pub tick_interval: Option<f32>,
}

impl Default for TemplateDef {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_scale: Vec3::ONE,
            tick_interval: None,
        }
    }
}

/// Number of instances to create up front for a template.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrewarmEntry {
    pub template: String,
    pub count: usize,
}

/// Templates, spawn definitions and prewarm counts as one document.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogDef {
    pub templates: Vec<TemplateDef>,
    pub assets: Vec<SpawnDefinition>,
    pub creatures: Vec<SpawnDefinition>,
    pub prewarm: Vec<PrewarmEntry>,
}

impl CatalogDef {
    /// Parse a RON document.
    #[cfg(feature = "ron")]
    pub fn from_ron_str(source: &str) -> Result<Self> {
        ron::de::from_str(source).map_err(|e| Error::Catalog(e.to_string()))
    }

    /// Build the template catalog. Behaviours are attached afterwards with
    /// [`TemplateCatalog::set_behaviour`].
    pub fn build_catalog(&self) -> Result<TemplateCatalog> {
        let mut catalog = TemplateCatalog::new();
        for def in &self.templates {
            let mut template = Template::new(def.name.clone()).with_base_scale(def.base_scale);
            template.tick_interval = def.tick_interval;
            catalog.register(template)?;
        }
        Ok(catalog)
    }

    /// Definitions of one spawn pass.
    pub fn definitions(&self, category: SpawnCategory) -> &[SpawnDefinition] {
        match category {
            SpawnCategory::Asset => &self.assets,
            SpawnCategory::Creature => &self.creatures,
        }
    }
}
