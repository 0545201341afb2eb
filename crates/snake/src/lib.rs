//! Per-frame simulation core for the player snake.

pub mod bonus;
pub mod config;
pub mod context;
pub mod error;
pub mod explosion;
pub mod geometry;
pub mod particles;
pub mod pool;
pub mod population;
pub mod powerups;
pub mod query;
pub mod rng;
pub mod snake;
pub mod strike;
pub mod world;

// Re-export commonly used types
pub use bonus::{BonusBox, BonusField, BonusList};
pub use config::Config;
pub use context::{CameraShake, FrameContext, ShakeRecorder};
pub use error::ConfigError;
pub use particles::{Particle, ParticleBuffer, ParticleKind, ParticleSink};
pub use population::{PedState, Pedestrian, Population, Vehicle, VehicleKind};
pub use powerups::{Outcome, PowerUp};
pub use snake::{Hud, Mode, PathHistory, Snake, SnakeInput};
pub use strike::{ExploderFlavor, StrikeKind, StrikeState};
pub use world::{Color, Terrain, TileGrid, TileKind};
