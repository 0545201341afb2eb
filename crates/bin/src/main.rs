//! Serpent - headless snake simulation runner

use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod demo;

/// Runner configuration: the simulation tunables plus the demo world.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub sim: snake::Config,
    #[serde(default)]
    pub demo: DemoConfig,
}

impl RunnerConfig {
    /// Load from serpent.toml, creating it with defaults if missing.
    pub fn load() -> anyhow::Result<Self> {
        let config: Self = snake::config::load_or_create("serpent.toml")?;
        config.sim.validate()?;
        Ok(config)
    }
}

/// Demo world and pacing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DemoConfig {
    /// World width in tiles.
    #[serde(default = "default_width")]
    pub width: usize,
    /// World height in tiles.
    #[serde(default = "default_height")]
    pub height: usize,
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    /// Number of random wall blocks.
    #[serde(default = "default_walls")]
    pub walls: usize,
    #[serde(default = "default_pedestrians")]
    pub pedestrians: usize,
    #[serde(default = "default_vehicles")]
    pub vehicles: usize,
    /// Bonus boxes kept on the map.
    #[serde(default = "default_bonus_boxes")]
    pub bonus_boxes: usize,
    /// Frames to run before stopping. Zero runs until the snake dies.
    #[serde(default = "default_frames")]
    pub frames: u64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Frames between status lines.
    #[serde(default = "default_report_every")]
    pub report_every: u64,
    /// Frames to keep ticking after death while effects are still running.
    #[serde(default = "default_settle_frames")]
    pub settle_frames: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            tile_size: default_tile_size(),
            walls: default_walls(),
            pedestrians: default_pedestrians(),
            vehicles: default_vehicles(),
            bonus_boxes: default_bonus_boxes(),
            frames: default_frames(),
            tick_interval_ms: default_tick_interval_ms(),
            report_every: default_report_every(),
            settle_frames: default_settle_frames(),
        }
    }
}

fn default_width() -> usize {
    80
}
fn default_height() -> usize {
    60
}
fn default_tile_size() -> f32 {
    16.0
}
fn default_walls() -> usize {
    24
}
fn default_pedestrians() -> usize {
    150
}
fn default_vehicles() -> usize {
    12
}
fn default_bonus_boxes() -> usize {
    8
}
fn default_frames() -> u64 {
    3600
}
fn default_tick_interval_ms() -> u64 {
    16
}
fn default_report_every() -> u64 {
    300
}
fn default_settle_frames() -> u64 {
    600
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Serpent v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = RunnerConfig::load()?;
    info!("Loaded configuration");
    info!("  World: {}x{} tiles of {}px", config.demo.width, config.demo.height, config.demo.tile_size);
    info!("  Pedestrians: {}, vehicles: {}", config.demo.pedestrians, config.demo.vehicles);
    info!("  Tick: {}ms", config.demo.tick_interval_ms);

    demo::run(config).await?;

    Ok(())
}
