//! Generational arena of scene instances.
//!
//! Instances are addressed by [`InstanceId`], an index plus a generation counter.
//! Destroying an instance bumps the slot generation, so stale ids held elsewhere
//! (scheduler registrations, pool stacks) resolve to `None` instead of aliasing a
//! newer instance. Parent/child links are kept as an index from [`Parent`] to its
//! children so a cluster's live population is simply its child count.
use std::collections::HashMap;
use std::fmt;

use glam::{Quat, Vec3};

use crate::grid::ClusterProximity;
use crate::population::cluster::ClusterId;
use crate::population::scheduler::{TickContext, Tickable};
use crate::world::catalog::TemplateId;

/// Handle to an instance in a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId {
    index: u32,
    generation: u32,
}

impl InstanceId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Position, rotation and scale of an instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

/// Owner of an instance in the scene hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Parent {
    Root,
    Cluster(ClusterId),
    /// Per-template container holding released pooled instances.
    PoolContainer(TemplateId),
}

/// A live scene object.
pub struct Instance {
    template: Option<TemplateId>,
    pub transform: Transform,
    base_scale: Vec3,
    active: bool,
    parent: Parent,
    behaviour: Option<Box<dyn Tickable>>,
    tick_interval: Option<f32>,
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("template", &self.template)
            .field("transform", &self.transform)
            .field("base_scale", &self.base_scale)
            .field("active", &self.active)
            .field("parent", &self.parent)
            .field("has_behaviour", &self.behaviour.is_some())
            .field("tick_interval", &self.tick_interval)
            .finish()
    }
}

impl Instance {
    /// An instance that is not tied to any template. Released to a pool, it is
    /// destroyed rather than stacked.
    pub fn untemplated(transform: Transform) -> Self {
        Self {
            template: None,
            transform,
            base_scale: transform.scale,
            active: true,
            parent: Parent::Root,
            behaviour: None,
            tick_interval: None,
        }
    }

    /// An instance created from `template`, remembering `base_scale` for resets.
    pub fn templated(template: TemplateId, base_scale: Vec3) -> Self {
        Self {
            template: Some(template),
            transform: Transform {
                scale: base_scale,
                ..Default::default()
            },
            base_scale,
            active: false,
            parent: Parent::Root,
            behaviour: None,
            tick_interval: None,
        }
    }

    pub fn with_behaviour(mut self, behaviour: Box<dyn Tickable>) -> Self {
        self.behaviour = Some(behaviour);
        self
    }

    pub fn with_tick_interval(mut self, interval: Option<f32>) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn template(&self) -> Option<TemplateId> {
        self.template
    }

    pub fn base_scale(&self) -> Vec3 {
        self.base_scale
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn parent(&self) -> Parent {
        self.parent
    }

    pub fn has_behaviour(&self) -> bool {
        self.behaviour.is_some()
    }

    pub fn tick_interval(&self) -> Option<f32> {
        self.tick_interval
    }
}

/// Result of ticking one instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The instance is destroyed or inactive.
    Dead,
    /// The instance is live but carries no behaviour.
    Idle,
    /// The behaviour ran.
    Ticked { despawn_requested: bool },
}

struct Slot {
    generation: u32,
    entry: Option<Instance>,
}

/// Arena of instances with parent/child bookkeeping.
#[derive(Default)]
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    children: HashMap<Parent, Vec<InstanceId>>,
    live: usize,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("live", &self.live)
            .field("slots", &self.slots.len())
            .field("parents", &self.children.len())
            .finish()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live instances, active or not.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Insert an instance under `instance.parent()` and return its handle.
    pub fn spawn(&mut self, instance: Instance) -> InstanceId {
        let parent = instance.parent;
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(instance);
                InstanceId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(instance),
                });
                InstanceId {
                    index,
                    generation: 0,
                }
            }
        };
        self.children.entry(parent).or_default().push(id);
        self.live += 1;
        id
    }

    /// Destroy an instance. Returns `false` for stale handles.
    pub fn despawn(&mut self, id: InstanceId) -> bool {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return false;
        };
        if slot.generation != id.generation {
            return false;
        }
        let Some(instance) = slot.entry.take() else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        self.unlink(instance.parent, id);
        true
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: InstanceId) -> Option<&Instance> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    /// Whether the instance exists and is active.
    pub fn is_active(&self, id: InstanceId) -> bool {
        self.get(id).is_some_and(|i| i.active)
    }

    pub fn set_active(&mut self, id: InstanceId, active: bool) -> bool {
        match self.get_mut(id) {
            Some(instance) => {
                instance.active = active;
                true
            }
            None => false,
        }
    }

    /// Move an instance under a new parent. No-op if it is already there.
    pub fn set_parent(&mut self, id: InstanceId, parent: Parent) -> bool {
        let Some(instance) = self.get_mut(id) else {
            return false;
        };
        let old = instance.parent;
        if old == parent {
            return true;
        }
        instance.parent = parent;
        self.unlink(old, id);
        self.children.entry(parent).or_default().push(id);
        true
    }

    pub fn reset_scale(&mut self, id: InstanceId) -> bool {
        match self.get_mut(id) {
            Some(instance) => {
                instance.transform.scale = instance.base_scale;
                true
            }
            None => false,
        }
    }

    /// Children of `parent`, in no particular order.
    pub fn children(&self, parent: Parent) -> &[InstanceId] {
        self.children.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn child_count(&self, parent: Parent) -> usize {
        self.children(parent).len()
    }

    /// Run the instance's behaviour for `now`.
    pub fn tick(&mut self, id: InstanceId, now: f32) -> TickOutcome {
        let Some(instance) = self.get_mut(id) else {
            return TickOutcome::Dead;
        };
        if !instance.active {
            return TickOutcome::Dead;
        }
        let Instance {
            transform,
            behaviour,
            ..
        } = instance;
        let Some(behaviour) = behaviour.as_mut() else {
            return TickOutcome::Idle;
        };
        let mut ctx = TickContext::new(id, now, transform);
        behaviour.tick(&mut ctx);
        TickOutcome::Ticked {
            despawn_requested: ctx.despawn_requested(),
        }
    }

    /// Destroy every instance. Outstanding handles become stale.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.children.clear();
        self.live = 0;
    }

    fn unlink(&mut self, parent: Parent, id: InstanceId) {
        if let Some(list) = self.children.get_mut(&parent) {
            if let Some(pos) = list.iter().position(|c| *c == id) {
                list.swap_remove(pos);
            }
            if list.is_empty() {
                self.children.remove(&parent);
            }
        }
    }
}

impl ClusterProximity for Scene {
    fn any_member_within(&self, cluster: ClusterId, position: Vec3, radius_sq: f32) -> bool {
        self.children(Parent::Cluster(cluster)).iter().any(|id| {
            self.get(*id)
                .is_some_and(|i| (i.transform.position - position).length_squared() < radius_sq)
        })
    }
}
