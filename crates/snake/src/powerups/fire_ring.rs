//! Orbiting fire bolts.

use super::{rewards, Outcome, Owner, PowerUpSystem, Tick, Timer};
use crate::config::Config;
use crate::context::FrameContext;
use crate::rng::{tags, EffectSeed};
use crate::world::{Color, TileKind};
use glam::Vec2;
use std::f32::consts::TAU;

/// Angular speed of every orbit, rad/s.
const ORBIT_SPEED: f32 = 4.0;
/// Kill radius around a bolt.
const BOLT_KILL_RADIUS: f32 = 6.0;

/// Bolt ring around a center point. Ghosts and clones carry their own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoltOrbit {
    pub phase: f32,
    pub count: usize,
    pub radius: f32,
}

impl BoltOrbit {
    pub fn new(count: usize, radius: f32) -> Self {
        Self {
            phase: 0.0,
            count,
            radius,
        }
    }

    /// Small orbit carried by ghosts and clones.
    pub fn minor() -> Self {
        Self::new(2, 12.0)
    }

    pub fn advance(&mut self, dt: f32) {
        self.phase = (self.phase + ORBIT_SPEED * dt).rem_euclid(TAU);
    }

    pub fn positions(&self, center: Vec2) -> impl Iterator<Item = Vec2> + '_ {
        let step = TAU / self.count.max(1) as f32;
        (0..self.count).map(move |i| {
            let a = self.phase + i as f32 * step;
            center + Vec2::new(a.cos(), a.sin()) * self.radius
        })
    }

    /// Advance and burn at every bolt. `id` separates the ignite rolls of
    /// different orbits in the same frame.
    pub fn burn_around(
        &mut self,
        center: Vec2,
        id: u64,
        ctx: &mut FrameContext<'_>,
        ignite_chance: f32,
        dt: f32,
        out: &mut Outcome,
    ) {
        self.advance(dt);
        let bolts: Vec<Vec2> = self.positions(center).collect();
        for (i, bolt) in bolts.into_iter().enumerate() {
            burn_bolt(ctx, bolt, id * 64 + i as u64, ignite_chance, out);
        }
    }
}

/// Effects of one bolt for one frame.
pub fn burn_bolt(ctx: &mut FrameContext<'_>, pos: Vec2, id: u64, ignite_chance: f32, out: &mut Outcome) {
    ctx.terrain.paint(pos, Color::ASH);

    for victim in ctx.population.kill_pedestrians_in(pos, BOLT_KILL_RADIUS) {
        ctx.particles.blood(victim, 4);
        out.kills += 1;
        out.score += rewards::FIRE_BOLT_KILL;
    }

    let kind = ctx.terrain.tile_kind(pos);
    if matches!(kind, TileKind::Tree | TileKind::Building) {
        let roll = EffectSeed::new(tags::IGNITE).with_pos(pos).with_f32(ctx.time).with_u64(id);
        if roll.chance(ignite_chance) {
            if kind == TileKind::Tree {
                ctx.terrain.burn_tree(pos);
            } else {
                ctx.terrain.burn_building(pos);
            }
        }
    }
}

/// The main ring around the head.
#[derive(Debug, Clone, Default)]
pub struct FireRing {
    pub timer: Timer,
    pub orbit: Option<BoltOrbit>,
}

impl FireRing {
    pub fn activate(&mut self, config: &Config) {
        self.timer.start(config.powerups.fire_ring_time);
        self.orbit = Some(BoltOrbit::new(config.powerups.bolt_count, config.powerups.bolt_radius));
    }
}

impl PowerUpSystem for FireRing {
    fn name(&self) -> &'static str {
        "fire ring"
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
        if tick != Tick::Active {
            self.orbit = None;
            return tick;
        }
        if let Some(orbit) = self.orbit.as_mut() {
            orbit.burn_around(owner.head, 0, ctx, config.powerups.ignite_chance, dt, out);
        }
        tick
    }

    fn is_busy(&self) -> bool {
        self.timer.is_active()
    }
}
