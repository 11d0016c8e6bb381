use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Quat, Vec3};
use isleforge::population::{TickContext, Tickable};
use isleforge::sampling::range_f32;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Rocks an instance back and forth about a tilted horizontal axis.
#[derive(Clone, Debug)]
pub struct WindSway {
    pub max_tilt_degrees: f32,
    pub speed: f32,
    axis: Vec3,
    base: Option<Quat>,
}

impl WindSway {
    pub fn new(speed: f32) -> Self {
        Self {
            max_tilt_degrees: 6.0,
            speed,
            axis: Vec3::new(1.0, 0.0, 0.3).normalize(),
            base: None,
        }
    }
}

impl Tickable for WindSway {
    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        let base = *self.base.get_or_insert(ctx.transform.rotation);
        let angle = (ctx.now() * self.speed).sin() * self.max_tilt_degrees;
        ctx.transform.rotation = Quat::from_axis_angle(self.axis, angle.to_radians()) * base;
    }
}

/// Factory for [`WindSway`] with per-instance speeds in `1.2 ± 1.0`.
pub fn wind_sway_factory(seed: u64) -> impl Fn() -> Box<dyn Tickable> + Send + Sync + 'static {
    let counter = AtomicU64::new(0);
    move || {
        let n = counter.fetch_add(1, Ordering::Relaxed);
        let mut rng = StdRng::seed_from_u64(seed ^ n.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Box::new(WindSway::new(range_f32(&mut rng, 0.2, 2.2))) as Box<dyn Tickable>
    }
}

/// Walks in a straight line and leaves after `lifetime` seconds.
#[derive(Clone, Debug)]
pub struct Grazer {
    pub heading: Vec3,
    pub speed: f32,
    pub lifetime: f32,
    last: Option<f32>,
    born: Option<f32>,
}

impl Grazer {
    pub fn new(heading: Vec3, speed: f32, lifetime: f32) -> Self {
        Self {
            heading: heading.normalize_or_zero(),
            speed,
            lifetime,
            last: None,
            born: None,
        }
    }
}

impl Tickable for Grazer {
    fn tick(&mut self, ctx: &mut TickContext<'_>) {
        let now = ctx.now();
        let born = *self.born.get_or_insert(now);
        let dt = now - self.last.unwrap_or(now);
        self.last = Some(now);
        ctx.transform.position += self.heading * self.speed * dt;
        if now - born >= self.lifetime {
            ctx.request_despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use isleforge::population::{Instance, Scene, Transform};

    use super::*;

    fn tick(behaviour: &mut dyn Tickable, transform: &mut Transform, now: f32) -> bool {
        let id = Scene::new().spawn(Instance::untemplated(Transform::default()));
        let mut ctx = TickContext::new(id, now, transform);
        behaviour.tick(&mut ctx);
        ctx.despawn_requested()
    }

    #[test]
    fn wind_sway_stays_within_tilt() {
        let mut sway = WindSway::new(1.0);
        let mut transform = Transform::default();
        for i in 0..50 {
            tick(&mut sway, &mut transform, i as f32 * 0.1);
            let angle = transform.rotation.angle_between(Quat::IDENTITY).to_degrees();
            assert!(angle <= 6.0 + 1e-3);
        }
    }

    #[test]
    fn grazer_leaves_after_its_lifetime() {
        let mut grazer = Grazer::new(Vec3::X, 2.0, 1.0);
        let mut transform = Transform::default();
        assert!(!tick(&mut grazer, &mut transform, 0.0));
        assert!(!tick(&mut grazer, &mut transform, 0.5));
        assert!((transform.position.x - 1.0).abs() < 1e-5);
        assert!(tick(&mut grazer, &mut transform, 1.0));
    }
}
