//! Per-template instance pool.
//!
//! Released instances are deactivated, moved under their template's pool container
//! and pushed onto that template's free stack. [`ObjectPool::get`] pops from the
//! stack before creating anything new, resets the scale to the template's base, then
//! places, reparents and activates the instance.
use std::collections::HashMap;

use glam::{Quat, Vec3};
use tracing::{debug, warn};

use crate::population::scene::{InstanceId, Parent, Scene};
use crate::world::catalog::{TemplateCatalog, TemplateId};

/// Name of the container holding released instances of a template.
pub fn container_name(template_name: &str) -> String {
    format!("{template_name}_Pool")
}

/// Free stacks of released instances, one per template.
#[derive(Clone, Debug, Default)]
pub struct ObjectPool {
    stacks: HashMap<TemplateId, Vec<InstanceId>>,
    containers: HashMap<TemplateId, String>,
    created: usize,
}

impl ObjectPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check out an instance of `template`, reusing a released one if available.
    /// Returns `None` if the template is not in the catalog.
    pub fn get(
        &mut self,
        template: TemplateId,
        position: Vec3,
        rotation: Quat,
        parent: Parent,
        scene: &mut Scene,
        catalog: &TemplateCatalog,
    ) -> Option<InstanceId> {
        let id = match self.pop_live(template, scene) {
            Some(id) => id,
            None => self.create(template, scene, catalog)?,
        };

        scene.reset_scale(id);
        scene.set_parent(id, parent);
        if let Some(instance) = scene.get_mut(id) {
            instance.transform.position = position;
            instance.transform.rotation = rotation;
        }
        scene.set_active(id, true);
        Some(id)
    }

    /// Return an instance to its template's stack. Untemplated instances are
    /// destroyed. Returns `false` for stale handles and instances already pooled.
    pub fn release(&mut self, id: InstanceId, scene: &mut Scene, catalog: &TemplateCatalog) -> bool {
        let Some(instance) = scene.get(id) else {
            return false;
        };
        let Some(template) = instance.template() else {
            return scene.despawn(id);
        };
        if instance.parent() == Parent::PoolContainer(template) {
            return false;
        }

        scene.set_active(id, false);
        scene.set_parent(id, Parent::PoolContainer(template));
        if !self.containers.contains_key(&template) {
            let name = catalog
                .get(template)
                .map(|t| container_name(t.name()))
                .unwrap_or_else(|| container_name(&format!("template{}", template.index())));
            debug!("Created pool container '{}'", name);
            self.containers.insert(template, name);
        }
        self.stacks.entry(template).or_default().push(id);
        true
    }

    /// Create and immediately release `count` instances of each listed template.
    pub fn prewarm(
        &mut self,
        entries: &[(TemplateId, usize)],
        scene: &mut Scene,
        catalog: &TemplateCatalog,
    ) -> usize {
        let mut total = 0;
        for &(template, count) in entries {
            if count == 0 {
                continue;
            }
            for _ in 0..count {
                let Some(id) = self.create(template, scene, catalog) else {
                    warn!(
                        "Prewarm skipped unknown template #{}",
                        template.index()
                    );
                    break;
                };
                if self.release(id, scene, catalog) {
                    total += 1;
                }
            }
        }
        debug!("Prewarmed {} pooled instances", total);
        total
    }

    /// Released instances waiting on `template`'s stack.
    pub fn available(&self, template: TemplateId) -> usize {
        self.stacks.get(&template).map_or(0, Vec::len)
    }

    /// Instances created by this pool so far.
    pub fn created(&self) -> usize {
        self.created
    }

    pub fn container(&self, template: TemplateId) -> Option<&str> {
        self.containers.get(&template).map(String::as_str)
    }

    /// Forget every stacked instance. Used when the scene itself is cleared.
    pub fn clear(&mut self) {
        self.stacks.clear();
        self.containers.clear();
    }

    fn pop_live(&mut self, template: TemplateId, scene: &Scene) -> Option<InstanceId> {
        let stack = self.stacks.get_mut(&template)?;
        while let Some(id) = stack.pop() {
            if scene.contains(id) {
                return Some(id);
            }
        }
        None
    }

    fn create(
        &mut self,
        template: TemplateId,
        scene: &mut Scene,
        catalog: &TemplateCatalog,
    ) -> Option<InstanceId> {
        let instance = catalog.get(template)?.instantiate(template);
        self.created += 1;
        Some(scene.spawn(instance))
    }
}
