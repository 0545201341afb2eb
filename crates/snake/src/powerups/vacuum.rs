//! Vacuum bubbles: grow, suck in and swallow, then collapse.

use super::{rewards, Cadence, Outcome, Owner, PowerUpSystem, Tick, Timer};
use crate::config::Config;
use crate::context::FrameContext;
use crate::explosion::destroy_vehicle;
use crate::pool::{sweep, Keep};
use crate::population::VehicleKind;
use glam::Vec2;
use std::f32::consts::PI;

const SPAWN_INTERVAL: f32 = 1.0;
const PULL_STRENGTH: f32 = 120.0;
/// Vehicles feel this share of the pull.
const VEHICLE_PULL: f32 = 0.4;
const KILL_FRACTION: f32 = 0.4;
const VEHICLE_KILL_FRACTION: f32 = 0.3;
/// Spacing of the lattice restored to background each frame.
const CLEAN_STEP: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VacuumBubble {
    pub center: Vec2,
    pub elapsed: f32,
    pub max_time: f32,
    pub peak_radius: f32,
}

impl VacuumBubble {
    pub fn new(center: Vec2, max_time: f32, peak_radius: f32) -> Self {
        Self {
            center,
            elapsed: 0.0,
            max_time,
            peak_radius,
        }
    }

    /// Bell-shaped radius over the bubble's life, zero at both ends.
    pub fn radius(&self) -> f32 {
        if self.max_time <= 0.0 || self.elapsed <= 0.0 || self.elapsed >= self.max_time {
            return 0.0;
        }
        (self.peak_radius * (PI * self.elapsed / self.max_time).sin()).max(0.0)
    }

    pub fn is_spent(&self) -> bool {
        self.elapsed >= self.max_time
    }

    /// Wipe decals under the bubble back to the background color.
    fn clean(&self, ctx: &mut FrameContext<'_>, radius: f32) {
        let background = ctx.terrain.background_color();
        let r_sq = radius * radius;
        let n = (radius / CLEAN_STEP) as i32;
        for j in -n..=n {
            for i in -n..=n {
                let offset = Vec2::new(i as f32, j as f32) * CLEAN_STEP;
                if offset.length_squared() <= r_sq {
                    ctx.terrain.paint(self.center + offset, background);
                }
            }
        }
    }

    fn pull(&self, ctx: &mut FrameContext<'_>, radius: f32, dt: f32, out: &mut Outcome) {
        let reach = 2.0 * radius;
        let kill_sq = (KILL_FRACTION * radius).powi(2);
        for ped in ctx.population.pedestrians.iter_mut().filter(|p| p.alive) {
            let to_center = self.center - ped.pos;
            let d = to_center.length();
            if d > reach {
                continue;
            }
            if d * d <= kill_sq {
                ped.alive = false;
                ped.health = 0.0;
                out.kills += 1;
                out.score += rewards::VACUUM_KILL;
                continue;
            }
            let strength = PULL_STRENGTH * (1.0 - d / reach);
            ped.pos += to_center / d * (strength * dt).min(d);
        }

        let vehicle_kill = VEHICLE_KILL_FRACTION * radius;
        let mut swallowed = Vec::new();
        for (i, v) in ctx.population.vehicles.iter_mut().enumerate() {
            if !v.alive || v.kind != VehicleKind::Car {
                continue;
            }
            let to_center = self.center - v.pos;
            let d = to_center.length();
            if d > radius {
                continue;
            }
            if d <= vehicle_kill {
                swallowed.push(i);
                continue;
            }
            let strength = PULL_STRENGTH * VEHICLE_PULL * (1.0 - d / reach);
            v.pos += to_center / d * (strength * dt).min(d);
        }
        for i in swallowed {
            if let Some(kills) = destroy_vehicle(ctx, i) {
                out.score += rewards::VACUUM_VEHICLE;
                out.blast(kills);
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Vacuum {
    pub timer: Timer,
    cadence: Cadence,
    pub bubbles: Vec<VacuumBubble>,
}

impl Vacuum {
    pub fn activate(&mut self, config: &Config) {
        if !self.timer.is_active() {
            self.cadence.reset();
        }
        self.timer.start(config.powerups.vacuum_time);
    }
}

impl PowerUpSystem for Vacuum {
    fn name(&self) -> &'static str {
        "vacuum"
    }

    fn update(
        &mut self,
        owner: &Owner<'_>,
        ctx: &mut FrameContext<'_>,
        config: &Config,
        dt: f32,
        out: &mut Outcome,
    ) -> Tick {
        let tick = self.timer.tick(dt);
        if tick == Tick::Active && owner.alive {
            let pu = &config.powerups;
            for _ in 0..self.cadence.due(dt, SPAWN_INTERVAL) {
                self.bubbles
                    .push(VacuumBubble::new(owner.head, pu.vacuum_max_time, pu.vacuum_peak_radius));
            }
        }

        sweep(&mut self.bubbles, |_, bubble| {
            bubble.elapsed += dt;
            if bubble.is_spent() {
                return Keep::Remove;
            }
            let radius = bubble.radius();
            if radius > 0.0 {
                bubble.clean(ctx, radius);
                bubble.pull(ctx, radius, dt, out);
            }
            Keep::Alive
        });
        tick
    }

    fn is_busy(&self) -> bool {
        self.timer.is_active() || !self.bubbles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::BonusList;
    use crate::particles::ParticleBuffer;
    use crate::population::{Pedestrian, Population, Vehicle};
    use crate::world::{Color, Terrain, TileGrid};

    #[test]
    fn test_radius_bell() {
        let mut b = VacuumBubble::new(Vec2::ZERO, 2.0, 25.0);
        assert_eq!(b.radius(), 0.0);
        b.elapsed = 1.0;
        assert!((b.radius() - 25.0).abs() < 1e-4);
        b.elapsed = 2.0;
        assert_eq!(b.radius(), 0.0);
        assert!(b.is_spent());
    }

    #[test]
    fn test_pull_and_swallow() {
        let mut grid = TileGrid::new(20, 20, 16.0);
        let center = Vec2::new(100.0, 100.0);
        grid.paint(center, Color::BLOOD);
        let mut pop = Population::new();
        pop.pedestrians.push(Pedestrian::new(center + Vec2::new(5.0, 0.0)));
        pop.pedestrians.push(Pedestrian::new(center + Vec2::new(40.0, 0.0)));
        pop.vehicles.push(Vehicle::new(VehicleKind::Car, center + Vec2::new(0.0, 4.0)));
        pop.vehicles.push(Vehicle::new(VehicleKind::Tank, center + Vec2::new(0.0, 4.0)));
        let mut particles = ParticleBuffer::new();
        let mut bonuses = BonusList::new();

        let mut bubble = VacuumBubble::new(center, 2.0, 25.0);
        bubble.elapsed = 1.0;
        {
            let mut ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0);
            bubble.clean(&mut ctx, 25.0);
        }
        assert_eq!(grid.color_at(center), grid.background_color());

        let mut out = Outcome::default();
        {
            let mut ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0);
            bubble.pull(&mut ctx, 25.0, 0.1, &mut out);
        }
        assert!(!pop.pedestrians[0].alive);
        assert!(pop.pedestrians[1].alive);
        assert!(pop.pedestrians[1].pos.x < center.x + 40.0);
        // Only cars are swallowed.
        assert!(!pop.vehicles[0].alive);
        assert!(pop.vehicles[1].alive);
        assert_eq!(out.kills, 1);
        assert_eq!(out.score, rewards::VACUUM_KILL + rewards::VACUUM_VEHICLE);
    }
}
