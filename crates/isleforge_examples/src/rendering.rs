use std::path::Path;

use glam::Vec3;
use image::{Rgb, RgbImage};
use isleforge::field::inverse_lerp;
use isleforge::prelude::*;
use tracing::info;

/// Install a `fmt` subscriber that honours `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Marker drawn for cluster members of one spawn category.
#[derive(Clone, Copy, Debug)]
pub struct ClusterStyle {
    pub color: [u8; 3],
    pub radius: i32,
}

#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub image_size: (u32, u32),
    pub border_color: [u8; 3],
    pub asset_style: ClusterStyle,
    pub creature_style: ClusterStyle,
    /// Darken cells in chunks the player cannot see.
    pub shade_inactive: bool,
}

impl RenderConfig {
    pub fn new(image_size: (u32, u32)) -> Self {
        Self {
            image_size,
            border_color: [255, 80, 80],
            asset_style: ClusterStyle {
                color: [20, 90, 30],
                radius: 1,
            },
            creature_style: ClusterStyle {
                color: [240, 200, 60],
                radius: 2,
            },
            shade_inactive: true,
        }
    }

    pub fn with_border_color(mut self, color: [u8; 3]) -> Self {
        self.border_color = color;
        self
    }
}

/// Colour of a normalized height under the region table, blending across each
/// region's start.
pub fn region_colour(params: &RegionShaderParams, height01: f32) -> [f32; 3] {
    if params.count == 0 {
        return [height01, height01, height01];
    }
    let mut colour = [0.0f32; 3];
    for i in 0..params.count {
        let half = params.blends[i] * 0.5 + 1e-4;
        let w = inverse_lerp(-half, half, height01 - params.heights[i]);
        let c = params.colours[i];
        for k in 0..3 {
            colour[k] = colour[k] * (1.0 - w) + c[k] * w;
        }
    }
    colour
}

fn to_rgb(c: [f32; 3]) -> Rgb<u8> {
    Rgb([
        (c[0].clamp(0.0, 1.0) * 255.0) as u8,
        (c[1].clamp(0.0, 1.0) * 255.0) as u8,
        (c[2].clamp(0.0, 1.0) * 255.0) as u8,
    ])
}

/// Write a scalar field as a greyscale PNG, min/max stretched.
pub fn render_field_to_png(field: &ScalarField, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let (lo, hi) = field.min_max().unwrap_or((0.0, 1.0));
    let img = RgbImage::from_fn(field.width() as u32, field.height() as u32, |x, y| {
        let v = inverse_lerp(lo, hi, field.get(x as usize, y as usize));
        let g = (v * 255.0) as u8;
        Rgb([g, g, g])
    });
    img.save(path.as_ref())?;
    info!("Wrote {}", path.as_ref().display());
    Ok(())
}

/// Render the terrain coloured by region, the border outline and every live member.
pub fn render_world_to_png(
    world: &WorldAssembler,
    config: &RenderConfig,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let terrain = world
        .terrain()
        .ok_or_else(|| anyhow::anyhow!("world has not been generated"))?;
    let (w, h) = config.image_size;
    let origin = terrain.origin();
    let size = terrain.size();
    let res = terrain.resolution();

    let to_world = |px: u32, py: u32| {
        let u = (px as f32 + 0.5) / w as f32;
        let v = (py as f32 + 0.5) / h as f32;
        Vec3::new(origin.x + u * size.x, 0.0, origin.z + v * size.z)
    };

    let mut img = RgbImage::from_fn(w, h, |px, py| {
        let p = to_world(px, py);
        let cx = (((p.x - origin.x) / size.x) * (res - 1) as f32).round() as usize;
        let cy = (((p.z - origin.z) / size.z) * (res - 1) as f32).round() as usize;
        let mut c = region_colour(
            terrain.region_params(),
            terrain.normalized_height(cx.min(res - 1), cy.min(res - 1)),
        );
        if config.shade_inactive && !world.grid().is_chunk_active(world.grid().world_to_chunk(p)) {
            c = c.map(|v| v * 0.5);
        }
        to_rgb(c)
    });

    // Border outline: pixels inside whose right or lower neighbour is outside.
    let border = world.border();
    for py in 0..h.saturating_sub(1) {
        for px in 0..w.saturating_sub(1) {
            let inside = |x: u32, y: u32| border.is_inside_world(to_world(x, y), origin, size);
            let here = inside(px, py);
            if here != inside(px + 1, py) || here != inside(px, py + 1) {
                img.put_pixel(px, py, Rgb(config.border_color));
            }
        }
    }

    for cluster in world.clusters() {
        let style = match world.cluster_category(cluster.id()) {
            Some(SpawnCategory::Creature) => config.creature_style,
            _ => config.asset_style,
        };
        for member in cluster.members(world.scene()) {
            let Some(instance) = world.scene().get(*member) else {
                continue;
            };
            if !instance.is_active() {
                continue;
            }
            let p = instance.transform.position;
            let px = ((p.x - origin.x) / size.x * w as f32) as i32;
            let py = ((p.z - origin.z) / size.z * h as f32) as i32;
            draw_disc(&mut img, px, py, style.radius, Rgb(style.color));
        }
    }

    img.save(path.as_ref())?;
    info!("Wrote {}", path.as_ref().display());
    Ok(())
}

fn draw_disc(img: &mut RgbImage, cx: i32, cy: i32, radius: i32, color: Rgb<u8>) {
    let (w, h) = (img.width() as i32, img.height() as i32);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x >= 0 && y >= 0 && x < w && y < h {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}
