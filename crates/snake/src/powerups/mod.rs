//! Power-up sub-simulations.
//!
//! Each power-up owns a [`Timer`] and, where it spawns things, its own pool.
//! The snake advances every system once per frame in a fixed order through
//! [`PowerUpSystem::update`], whatever mode it is in. Systems never touch
//! the snake directly: they read an [`Owner`] snapshot and report rewards in
//! an [`Outcome`] that the snake applies afterwards.

mod bombs;
mod clones;
mod fire_ring;
mod gatling;
mod missiles;
mod swarm;
mod vacuum;

pub use bombs::{BeltBomb, BeltBombs, SpreadBomb, SpreadBombs};
pub use clones::{CloneSnake, Clones};
pub use fire_ring::{BoltOrbit, FireRing};
pub use gatling::{Gatling, SnakeRound};
pub use missiles::{HomingMissile, MissileLauncher};
pub use swarm::{GhostSnake, Swarm};
pub use vacuum::{Vacuum, VacuumBubble};

use crate::config::Config;
use crate::context::FrameContext;
use crate::snake::PathHistory;
use crate::strike::StrikeKind;
use glam::Vec2;
use tracing::info;

/// Score per pedestrian, by the path that killed it. These differ on
/// purpose and are kept per path.
pub mod rewards {
    pub const FIRE_BOLT_KILL: u64 = 25;
    pub const GATLING_KILL: u64 = 30;
    pub const EXPLOSION_KILL: u64 = 40;
    pub const VACUUM_KILL: u64 = 50;
    pub const VACUUM_VEHICLE: u64 = 200;
    pub const SWARM_EAT: u64 = 100;
    pub const CLONE_EAT: u64 = 100;
    pub const STRIKE_KILL: u64 = 20;
    /// Wanted level raised per explosion kill.
    pub const WANTED_PER_BLAST_KILL: f32 = 0.05;
}

/// Everything a bonus box can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUp {
    SpeedBoost,
    Berserk,
    Bash,
    Autopilot,
    FireRing,
    SpreadBombs,
    BeltBombs,
    Missiles,
    Gatling,
    Swarm,
    Clones,
    Vacuum,
    Heal,
    Strike(StrikeKind),
}

/// Result of advancing a timer by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Was not running.
    Idle,
    /// Running after this frame.
    Active,
    /// Ran out during this frame.
    Expired,
}

/// Countdown in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timer {
    remaining: f32,
}

impl Timer {
    /// (Re)start with a full duration.
    #[inline]
    pub fn start(&mut self, seconds: f32) {
        self.remaining = seconds.max(0.0);
    }

    /// Stop immediately. The next tick reports [`Tick::Idle`].
    #[inline]
    pub fn cancel(&mut self) {
        self.remaining = 0.0;
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    #[inline]
    pub fn remaining(&self) -> f32 {
        self.remaining.max(0.0)
    }

    pub fn tick(&mut self, dt: f32) -> Tick {
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            return Tick::Idle;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            Tick::Expired
        } else {
            Tick::Active
        }
    }
}

/// Repeating cadence driven by a timer: fires every `interval` seconds while
/// the owning power-up is active.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cadence {
    cooldown: f32,
}

impl Cadence {
    /// Number of shots due this frame.
    pub fn due(&mut self, dt: f32, interval: f32) -> u32 {
        self.cooldown -= dt;
        let mut shots = 0;
        while self.cooldown <= 0.0 {
            self.cooldown += interval.max(1e-3);
            shots += 1;
        }
        shots
    }

    pub fn reset(&mut self) {
        self.cooldown = 0.0;
    }
}

/// Read-only view of the snake handed to each power-up.
#[derive(Debug, Clone, Copy)]
pub struct Owner<'s> {
    pub head: Vec2,
    pub prev_head: Vec2,
    pub heading: f32,
    pub speed: f32,
    pub path: &'s PathHistory,
    pub segment_spacing: f32,
    pub length: u32,
    pub alive: bool,
    pub fire_ring_active: bool,
}

impl Owner<'_> {
    /// Position of body segment `index` (0 is the head).
    pub fn segment(&self, index: u32) -> Vec2 {
        self.path.sample(self.head, index as f32 * self.segment_spacing)
    }
}

/// Rewards and side effects reported back to the snake.
#[derive(Debug, Default)]
pub struct Outcome {
    pub score: u64,
    /// Kills that advance the kill streak.
    pub streak_kills: u32,
    /// Kills that do not advance the streak.
    pub kills: u32,
    pub wanted: f32,
    /// Body length handed back by reintegrating ghosts.
    pub length_restored: u32,
    pub collected: Vec<PowerUp>,
}

impl Outcome {
    /// Book a blast's kills at the explosion rate.
    pub fn blast(&mut self, kills: u32) {
        self.kills += kills;
        self.score += u64::from(kills) * rewards::EXPLOSION_KILL;
        self.wanted += kills as f32 * rewards::WANTED_PER_BLAST_KILL;
    }
}

/// One independently timed sub-simulation.
pub trait PowerUpSystem {
    fn name(&self) -> &'static str;

    /// Advance one frame. Returns the state of the system's own timer.
    fn update(
        &mut self,
        owner: &Owner<'_>,
        ctx: &mut FrameContext<'_>,
        config: &Config,
        dt: f32,
        out: &mut Outcome,
    ) -> Tick;

    /// Whether the system still has anything running.
    fn is_busy(&self) -> bool;
}

/// Every pooled power-up, advanced in a fixed order each frame.
#[derive(Debug, Clone, Default)]
pub struct Arsenal {
    pub fire_ring: FireRing,
    pub spread_bombs: SpreadBombs,
    pub belt_bombs: BeltBombs,
    pub missiles: MissileLauncher,
    pub gatling: Gatling,
    pub swarm: Swarm,
    pub clones: Clones,
    pub vacuum: Vacuum,
}

impl Arsenal {
    /// Systems in update order.
    pub fn systems_mut(&mut self) -> [&mut dyn PowerUpSystem; 8] {
        [
            &mut self.fire_ring,
            &mut self.spread_bombs,
            &mut self.belt_bombs,
            &mut self.missiles,
            &mut self.gatling,
            &mut self.swarm,
            &mut self.clones,
            &mut self.vacuum,
        ]
    }

    /// Advance every system once.
    pub fn update(&mut self, owner: &Owner<'_>, ctx: &mut FrameContext<'_>, config: &Config, dt: f32, out: &mut Outcome) {
        for system in self.systems_mut() {
            if system.update(owner, ctx, config, dt, out) == Tick::Expired {
                info!("{} ended", system.name());
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.fire_ring.is_busy()
            || self.spread_bombs.is_busy()
            || self.belt_bombs.is_busy()
            || self.missiles.is_busy()
            || self.gatling.is_busy()
            || self.swarm.is_busy()
            || self.clones.is_busy()
            || self.vacuum.is_busy()
    }
}

/// Timers with no pool: they only scale or alter the snake's own movement.
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub speed_boost: Timer,
    pub berserk: Timer,
    pub bash: Timer,
    pub autopilot: Timer,
}

impl Modifiers {
    pub const BOOST_MULT: f32 = 1.6;
    pub const BERSERK_MULT: f32 = 1.4;
    pub const AUTOPILOT_MULT: f32 = 1.3;

    /// Advance every modifier. Returns the names of those that expired.
    pub fn tick(&mut self, dt: f32) -> Vec<&'static str> {
        let mut expired = Vec::new();
        for (name, timer) in [
            ("speed boost", &mut self.speed_boost),
            ("berserk", &mut self.berserk),
            ("bash", &mut self.bash),
            ("autopilot", &mut self.autopilot),
        ] {
            if timer.tick(dt) == Tick::Expired {
                expired.push(name);
            }
        }
        expired
    }

    /// Product of the active movement multipliers.
    pub fn speed_multiplier(&self) -> f32 {
        let mut mult = 1.0;
        if self.autopilot.is_active() {
            mult *= Self::AUTOPILOT_MULT;
        }
        if self.speed_boost.is_active() {
            mult *= Self::BOOST_MULT;
        }
        if self.berserk.is_active() {
            mult *= Self::BERSERK_MULT;
        }
        mult
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_reports_expiry_once() {
        let mut t = Timer::default();
        assert_eq!(t.tick(0.1), Tick::Idle);
        t.start(0.25);
        assert_eq!(t.tick(0.1), Tick::Active);
        assert_eq!(t.tick(0.1), Tick::Active);
        assert_eq!(t.tick(0.1), Tick::Expired);
        assert_eq!(t.tick(0.1), Tick::Idle);
    }

    #[test]
    fn test_cancel_ends_without_expiry() {
        let mut t = Timer::default();
        t.start(5.0);
        t.cancel();
        assert!(!t.is_active());
        assert_eq!(t.tick(0.1), Tick::Idle);
    }

    #[test]
    fn test_cadence_fires_on_interval() {
        let mut c = Cadence::default();
        assert_eq!(c.due(0.016, 0.5), 1);
        assert_eq!(c.due(0.3, 0.5), 0);
        assert_eq!(c.due(0.3, 0.5), 1);
        assert_eq!(c.due(1.0, 0.5), 2);
    }

    #[test]
    fn test_modifier_multipliers_revert() {
        let mut m = Modifiers::default();
        assert_eq!(m.speed_multiplier(), 1.0);
        m.speed_boost.start(0.1);
        m.berserk.start(1.0);
        let both = Modifiers::BOOST_MULT * Modifiers::BERSERK_MULT;
        assert!((m.speed_multiplier() - both).abs() < 1e-6);
        assert_eq!(m.tick(0.2), vec!["speed boost"]);
        assert!((m.speed_multiplier() - Modifiers::BERSERK_MULT).abs() < 1e-6);
    }
}
