#![forbid(unsafe_code)]

mod behaviours;
mod rendering;
mod scenes;

pub use behaviours::{wind_sway_factory, Grazer, WindSway};
pub use rendering::{
    init_tracing, region_colour, render_field_to_png, render_world_to_png, ClusterStyle,
    RenderConfig,
};
pub use scenes::{island_config, island_regions};
