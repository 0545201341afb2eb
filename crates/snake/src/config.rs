//! Simulation configuration.

use crate::error::ConfigError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub movement: MovementConfig,
    #[serde(default)]
    pub avoidance: AvoidanceConfig,
    #[serde(default)]
    pub combat: CombatConfig,
    #[serde(default)]
    pub powerups: PowerUpConfig,
    #[serde(default)]
    pub strike: StrikeConfig,
}

impl Config {
    /// Load and validate configuration from `path`, writing the defaults
    /// there if the file does not exist yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = load_or_create(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("movement.base_speed", self.movement.base_speed)?;
        positive("movement.turn_rate", self.movement.turn_rate)?;
        positive("movement.max_dt", self.movement.max_dt)?;
        positive("movement.path_spacing", self.movement.path_spacing)?;
        positive("movement.segment_spacing", self.movement.segment_spacing)?;
        positive("movement.max_health", self.movement.max_health)?;
        if self.movement.path_capacity < 2 {
            return Err(ConfigError::OutOfRange {
                field: "movement.path_capacity",
                reason: format!("must be at least 2, got {}", self.movement.path_capacity),
            });
        }
        positive("avoidance.ray_step", self.avoidance.ray_step)?;
        positive("combat.combo_window", self.combat.combo_window)?;
        positive("combat.wanted_max", self.combat.wanted_max)?;
        positive("powerups.vacuum_max_time", self.powerups.vacuum_max_time)?;
        positive("strike.window", self.strike.window)?;

        let s = &self.strike;
        confirm_range("strike.carpet_bomb", s.carpet_bomb_min, s.carpet_bomb_max)?;
        confirm_range("strike.air_support", s.air_support_min, s.air_support_max)?;
        confirm_range("strike.exploders", s.exploders_min, s.exploders_max)?;
        Ok(())
    }
}

/// Read a TOML file into `T`, first writing `T::default()` to it if the
/// file does not exist. Validation is left to the caller.
pub fn load_or_create<T>(path: impl AsRef<Path>) -> Result<T, ConfigError>
where
    T: Serialize + DeserializeOwned + Default,
{
    let path = path.as_ref();
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if path.exists() {
        let contents = std::fs::read_to_string(path).map_err(io_err)?;
        Ok(toml::from_str(&contents)?)
    } else {
        info!("No {} found, creating default config", path.display());
        let default_config = T::default();
        std::fs::write(path, toml::to_string_pretty(&default_config)?).map_err(io_err)?;
        Ok(default_config)
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            reason: format!("must be positive, got {value}"),
        })
    }
}

fn confirm_range(field: &'static str, min: u32, max: u32) -> Result<(), ConfigError> {
    if min >= 1 && min <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            reason: format!("confirmation range {min}..={max} must satisfy 1 <= min <= max"),
        })
    }
}

/// Movement, steering and body configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MovementConfig {
    /// Base speed in pixels per second.
    #[serde(default = "default_base_speed")]
    pub base_speed: f32,
    /// Maximum turn rate in radians per second.
    #[serde(default = "default_turn_rate")]
    pub turn_rate: f32,
    /// Upper clamp for the frame delta.
    #[serde(default = "default_max_dt")]
    pub max_dt: f32,
    /// Cursor distance from the head under which the snake idles.
    #[serde(default = "default_idle_radius")]
    pub idle_radius: f32,
    /// Half-width of the idle figure-eight.
    #[serde(default = "default_idle_amplitude")]
    pub idle_amplitude: f32,
    /// Angular speed of the idle figure-eight (rad/s).
    #[serde(default = "default_idle_frequency")]
    pub idle_frequency: f32,
    /// Number of points kept in the path history.
    #[serde(default = "default_path_capacity")]
    pub path_capacity: usize,
    /// Minimum head travel before a new path point is recorded.
    #[serde(default = "default_path_spacing")]
    pub path_spacing: f32,
    /// Arc length between two body segments.
    #[serde(default = "default_segment_spacing")]
    pub segment_spacing: f32,
    #[serde(default = "default_start_length")]
    pub start_length: u32,
    #[serde(default = "default_max_health")]
    pub max_health: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            base_speed: default_base_speed(),
            turn_rate: default_turn_rate(),
            max_dt: default_max_dt(),
            idle_radius: default_idle_radius(),
            idle_amplitude: default_idle_amplitude(),
            idle_frequency: default_idle_frequency(),
            path_capacity: default_path_capacity(),
            path_spacing: default_path_spacing(),
            segment_spacing: default_segment_spacing(),
            start_length: default_start_length(),
            max_health: default_max_health(),
        }
    }
}

fn default_base_speed() -> f32 {
    120.0
}
fn default_turn_rate() -> f32 {
    5.0
}
fn default_max_dt() -> f32 {
    0.1
}
fn default_idle_radius() -> f32 {
    12.0
}
fn default_idle_amplitude() -> f32 {
    10.0
}
fn default_idle_frequency() -> f32 {
    2.5
}
fn default_path_capacity() -> usize {
    600
}
fn default_path_spacing() -> f32 {
    2.0
}
fn default_segment_spacing() -> f32 {
    6.0
}
fn default_start_length() -> u32 {
    10
}
fn default_max_health() -> f32 {
    100.0
}

/// Wall avoidance and stuck recovery.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AvoidanceConfig {
    #[serde(default = "default_look_ahead")]
    pub look_ahead: f32,
    #[serde(default = "default_scan_distance")]
    pub scan_distance: f32,
    /// Sampling step for rays and feelers.
    #[serde(default = "default_ray_step")]
    pub ray_step: f32,
    /// Per-frame displacement under which the head counts as stuck.
    #[serde(default = "default_stuck_epsilon")]
    pub stuck_epsilon: f32,
    #[serde(default = "default_stuck_grace")]
    pub stuck_grace: f32,
    /// Length of clear path required by the fan search.
    #[serde(default = "default_feeler_len")]
    pub feeler_len: f32,
    #[serde(default = "default_bounce_time")]
    pub bounce_time: f32,
    /// Initial ring-search radius, in tiles.
    #[serde(default = "default_relocate_radius")]
    pub relocate_radius: i32,
    /// Extra tiles of ring-search radius per consecutive failure.
    #[serde(default = "default_relocate_growth")]
    pub relocate_growth: i32,
    #[serde(default = "default_ghost_feeler_len")]
    pub ghost_feeler_len: f32,
    #[serde(default = "default_ghost_stuck_grace")]
    pub ghost_stuck_grace: f32,
    #[serde(default = "default_ghost_relocate_radius")]
    pub ghost_relocate_radius: i32,
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            look_ahead: default_look_ahead(),
            scan_distance: default_scan_distance(),
            ray_step: default_ray_step(),
            stuck_epsilon: default_stuck_epsilon(),
            stuck_grace: default_stuck_grace(),
            feeler_len: default_feeler_len(),
            bounce_time: default_bounce_time(),
            relocate_radius: default_relocate_radius(),
            relocate_growth: default_relocate_growth(),
            ghost_feeler_len: default_ghost_feeler_len(),
            ghost_stuck_grace: default_ghost_stuck_grace(),
            ghost_relocate_radius: default_ghost_relocate_radius(),
        }
    }
}

fn default_look_ahead() -> f32 {
    48.0
}
fn default_scan_distance() -> f32 {
    64.0
}
fn default_ray_step() -> f32 {
    4.0
}
fn default_stuck_epsilon() -> f32 {
    0.5
}
fn default_stuck_grace() -> f32 {
    0.25
}
fn default_feeler_len() -> f32 {
    24.0
}
fn default_bounce_time() -> f32 {
    0.4
}
fn default_relocate_radius() -> i32 {
    6
}
fn default_relocate_growth() -> i32 {
    4
}
fn default_ghost_feeler_len() -> f32 {
    10.0
}
fn default_ghost_stuck_grace() -> f32 {
    0.4
}
fn default_ghost_relocate_radius() -> i32 {
    3
}

/// Eating, scoring and pickups.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CombatConfig {
    /// Kill-streak window in seconds.
    #[serde(default = "default_combo_window")]
    pub combo_window: f32,
    #[serde(default = "default_pickup_radius")]
    pub pickup_radius: f32,
    /// Forward reach of the heading-aligned pickup box.
    #[serde(default = "default_orbit_reach")]
    pub orbit_reach: f32,
    #[serde(default = "default_orbit_half_width")]
    pub orbit_half_width: f32,
    #[serde(default = "default_wanted_max")]
    pub wanted_max: f32,
    /// Wanted level lost per second once the cooldown has elapsed.
    #[serde(default = "default_wanted_decay")]
    pub wanted_decay: f32,
    /// Seconds without a kill before the wanted level starts decaying.
    #[serde(default = "default_wanted_cooldown")]
    pub wanted_cooldown: f32,
    /// Damage per second from touching a vehicle too strong to ram.
    #[serde(default = "default_contact_damage")]
    pub contact_damage: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            combo_window: default_combo_window(),
            pickup_radius: default_pickup_radius(),
            orbit_reach: default_orbit_reach(),
            orbit_half_width: default_orbit_half_width(),
            wanted_max: default_wanted_max(),
            wanted_decay: default_wanted_decay(),
            wanted_cooldown: default_wanted_cooldown(),
            contact_damage: default_contact_damage(),
        }
    }
}

fn default_combo_window() -> f32 {
    2.0
}
fn default_pickup_radius() -> f32 {
    14.0
}
fn default_orbit_reach() -> f32 {
    24.0
}
fn default_orbit_half_width() -> f32 {
    10.0
}
fn default_wanted_max() -> f32 {
    5.0
}
fn default_wanted_decay() -> f32 {
    0.02
}
fn default_wanted_cooldown() -> f32 {
    10.0
}
fn default_contact_damage() -> f32 {
    20.0
}

/// Power-up durations and tunables.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PowerUpConfig {
    #[serde(default = "default_speed_boost_time")]
    pub speed_boost_time: f32,
    #[serde(default = "default_berserk_time")]
    pub berserk_time: f32,
    #[serde(default = "default_bash_time")]
    pub bash_time: f32,
    #[serde(default = "default_autopilot_time")]
    pub autopilot_time: f32,
    #[serde(default = "default_fire_ring_time")]
    pub fire_ring_time: f32,
    #[serde(default = "default_spread_bombs_time")]
    pub spread_bombs_time: f32,
    #[serde(default = "default_missiles_time")]
    pub missiles_time: f32,
    #[serde(default = "default_gatling_time")]
    pub gatling_time: f32,
    #[serde(default = "default_swarm_time")]
    pub swarm_time: f32,
    #[serde(default = "default_clones_time")]
    pub clones_time: f32,
    #[serde(default = "default_vacuum_time")]
    pub vacuum_time: f32,
    #[serde(default = "default_heal_amount")]
    pub heal_amount: f32,
    #[serde(default = "default_bolt_count")]
    pub bolt_count: usize,
    #[serde(default = "default_bolt_radius")]
    pub bolt_radius: f32,
    #[serde(default = "default_ignite_chance")]
    pub ignite_chance: f32,
    #[serde(default = "default_max_ghosts")]
    pub max_ghosts: u32,
    #[serde(default = "default_clone_count")]
    pub clone_count: usize,
    #[serde(default = "default_clone_offset")]
    pub clone_offset: f32,
    #[serde(default = "default_vacuum_max_time")]
    pub vacuum_max_time: f32,
    #[serde(default = "default_vacuum_peak_radius")]
    pub vacuum_peak_radius: f32,
}

impl Default for PowerUpConfig {
    fn default() -> Self {
        Self {
            speed_boost_time: default_speed_boost_time(),
            berserk_time: default_berserk_time(),
            bash_time: default_bash_time(),
            autopilot_time: default_autopilot_time(),
            fire_ring_time: default_fire_ring_time(),
            spread_bombs_time: default_spread_bombs_time(),
            missiles_time: default_missiles_time(),
            gatling_time: default_gatling_time(),
            swarm_time: default_swarm_time(),
            clones_time: default_clones_time(),
            vacuum_time: default_vacuum_time(),
            heal_amount: default_heal_amount(),
            bolt_count: default_bolt_count(),
            bolt_radius: default_bolt_radius(),
            ignite_chance: default_ignite_chance(),
            max_ghosts: default_max_ghosts(),
            clone_count: default_clone_count(),
            clone_offset: default_clone_offset(),
            vacuum_max_time: default_vacuum_max_time(),
            vacuum_peak_radius: default_vacuum_peak_radius(),
        }
    }
}

fn default_speed_boost_time() -> f32 {
    6.0
}
fn default_berserk_time() -> f32 {
    8.0
}
fn default_bash_time() -> f32 {
    8.0
}
fn default_autopilot_time() -> f32 {
    10.0
}
fn default_fire_ring_time() -> f32 {
    10.0
}
fn default_spread_bombs_time() -> f32 {
    8.0
}
fn default_missiles_time() -> f32 {
    8.0
}
fn default_gatling_time() -> f32 {
    6.0
}
fn default_swarm_time() -> f32 {
    8.0
}
fn default_clones_time() -> f32 {
    12.0
}
fn default_vacuum_time() -> f32 {
    6.0
}
fn default_heal_amount() -> f32 {
    40.0
}
fn default_bolt_count() -> usize {
    4
}
fn default_bolt_radius() -> f32 {
    28.0
}
fn default_ignite_chance() -> f32 {
    0.02
}
fn default_max_ghosts() -> u32 {
    6
}
fn default_clone_count() -> usize {
    2
}
fn default_clone_offset() -> f32 {
    40.0
}
fn default_vacuum_max_time() -> f32 {
    2.0
}
fn default_vacuum_peak_radius() -> f32 {
    25.0
}

/// Targeted strike abilities.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrikeConfig {
    /// Targeting window in seconds.
    #[serde(default = "default_strike_window")]
    pub window: f32,
    #[serde(default = "default_carpet_bomb_min")]
    pub carpet_bomb_min: u32,
    #[serde(default = "default_carpet_bomb_max")]
    pub carpet_bomb_max: u32,
    #[serde(default = "default_air_support_min")]
    pub air_support_min: u32,
    #[serde(default = "default_air_support_max")]
    pub air_support_max: u32,
    #[serde(default = "default_exploders_min")]
    pub exploders_min: u32,
    #[serde(default = "default_exploders_max")]
    pub exploders_max: u32,
    #[serde(default = "default_worm_life")]
    pub worm_life: f32,
    #[serde(default = "default_heli_attack_window")]
    pub heli_attack_window: f32,
}

impl Default for StrikeConfig {
    fn default() -> Self {
        Self {
            window: default_strike_window(),
            carpet_bomb_min: default_carpet_bomb_min(),
            carpet_bomb_max: default_carpet_bomb_max(),
            air_support_min: default_air_support_min(),
            air_support_max: default_air_support_max(),
            exploders_min: default_exploders_min(),
            exploders_max: default_exploders_max(),
            worm_life: default_worm_life(),
            heli_attack_window: default_heli_attack_window(),
        }
    }
}

fn default_strike_window() -> f32 {
    8.0
}
fn default_carpet_bomb_min() -> u32 {
    3
}
fn default_carpet_bomb_max() -> u32 {
    5
}
fn default_air_support_min() -> u32 {
    1
}
fn default_air_support_max() -> u32 {
    3
}
fn default_exploders_min() -> u32 {
    1
}
fn default_exploders_max() -> u32 {
    3
}
fn default_worm_life() -> f32 {
    10.0
}
fn default_heli_attack_window() -> f32 {
    6.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml("[movement]\nbase_speed = 200.0\n").unwrap();
        assert_eq!(config.movement.base_speed, 200.0);
        assert_eq!(config.movement.turn_rate, default_turn_rate());
        assert_eq!(config.strike.carpet_bomb_max, 5);
    }

    #[test]
    fn test_rejects_inverted_confirmation_range() {
        let err = Config::from_toml("[strike]\ncarpet_bomb_min = 4\ncarpet_bomb_max = 2\n");
        assert!(matches!(
            err,
            Err(ConfigError::OutOfRange { field: "strike.carpet_bomb", .. })
        ));
    }

    #[test]
    fn test_rejects_zero_speed() {
        let err = Config::from_toml("[movement]\nbase_speed = 0.0\n");
        assert!(matches!(err, Err(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn test_load_writes_defaults_then_reads_back() {
        let path = std::env::temp_dir().join(format!("serpent-config-{}.toml", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let config = Config::load(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.movement.base_speed, default_base_speed());

        std::fs::write(&path, "[movement]\nbase_speed = 150.0\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.movement.base_speed, 150.0);

        std::fs::write(&path, "[movement]\nbase_speed = -1.0\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::OutOfRange { .. })));
        let _ = std::fs::remove_file(&path);
    }
}

