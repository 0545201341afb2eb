//! Gatling rounds.
//!
//! Rounds are fast enough to skip over thin walls and small targets in one
//! frame, so each frame's travel segment is sampled for the first hit.

use super::{rewards, Cadence, Outcome, Owner, PowerUpSystem, Tick, Timer};
use crate::config::Config;
use crate::context::FrameContext;
use crate::explosion::destroy_vehicle;
use crate::geometry::heading_vec;
use crate::particles::{burst, ParticleKind};
use crate::pool::{sweep, Keep};
use crate::rng::{tags, EffectSeed};
use crate::world::Color;
use glam::Vec2;
use rand::Rng;

const FIRE_INTERVAL: f32 = 0.08;
const SPREAD: f32 = 0.08;
const SPEED: f32 = 600.0;
const LIFE: f32 = 0.8;
const SAMPLE_STEP: f32 = 3.0;
const PED_HIT_RADIUS: f32 = 5.0;
const VEHICLE_HIT_RADIUS: f32 = 10.0;
const VEHICLE_DAMAGE: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnakeRound {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
}

/// What a round ran into.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RoundHit {
    Wall(Vec2),
    Pedestrian(usize),
    Vehicle(usize),
}

impl SnakeRound {
    /// First hit along `from`..`to`, sampled every few pixels.
    fn trace(ctx: &FrameContext<'_>, from: Vec2, to: Vec2) -> Option<RoundHit> {
        let span = to - from;
        let len = span.length();
        let steps = (len / SAMPLE_STEP).ceil().max(1.0) as usize;
        let ped_sq = PED_HIT_RADIUS * PED_HIT_RADIUS;
        let car_sq = VEHICLE_HIT_RADIUS * VEHICLE_HIT_RADIUS;

        for s in 1..=steps {
            let p = from + span * (s as f32 / steps as f32);
            if ctx.terrain.is_blocked(p) {
                return Some(RoundHit::Wall(p));
            }
            let pop = &*ctx.population;
            if let Some(i) = pop
                .pedestrians
                .iter()
                .position(|ped| ped.alive && ped.pos.distance_squared(p) <= ped_sq)
            {
                return Some(RoundHit::Pedestrian(i));
            }
            if let Some(i) = pop
                .vehicles
                .iter()
                .position(|v| v.alive && v.pos.distance_squared(p) <= car_sq)
            {
                return Some(RoundHit::Vehicle(i));
            }
        }
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct Gatling {
    pub timer: Timer,
    cadence: Cadence,
    /// Rounds fired since creation, used to seed the spread.
    shots_fired: u64,
    pub rounds: Vec<SnakeRound>,
}

impl Gatling {
    pub fn activate(&mut self, config: &Config) {
        if !self.timer.is_active() {
            self.cadence.reset();
        }
        self.timer.start(config.powerups.gatling_time);
    }

    fn fire(&mut self, owner: &Owner<'_>, time: f32) {
        let mut rng = EffectSeed::new(tags::GATLING)
            .with_f32(time)
            .with_u64(self.shots_fired)
            .rng();
        let angle = owner.heading + rng.random_range(-SPREAD..=SPREAD);
        self.rounds.push(SnakeRound {
            pos: owner.head,
            vel: heading_vec(angle) * SPEED,
            life: LIFE,
        });
        self.shots_fired += 1;
    }
}

impl PowerUpSystem for Gatling {
    fn name(&self) -> &'static str {
        "gatling"
    }

    fn update(
        &mut self,
        owner: &Owner<'_>,
        ctx: &mut FrameContext<'_>,
        _config: &Config,
        dt: f32,
        out: &mut Outcome,
    ) -> Tick {
        let tick = self.timer.tick(dt);
        if tick == Tick::Active && owner.alive {
            for _ in 0..self.cadence.due(dt, FIRE_INTERVAL) {
                self.fire(owner, ctx.time);
            }
        }

        sweep(&mut self.rounds, |_, round| {
            let from = round.pos;
            let to = from + round.vel * dt;
            round.life -= dt;

            match SnakeRound::trace(ctx, from, to) {
                Some(RoundHit::Wall(p)) => {
                    ctx.terrain.paint_temp(p, Color::SPARK, 0.3);
                    burst(&mut *ctx.particles, p, 3, ParticleKind::Spark, Color::SPARK, 80.0);
                    Keep::Remove
                }
                Some(RoundHit::Pedestrian(i)) => {
                    let ped = &mut ctx.population.pedestrians[i];
                    ped.alive = false;
                    ped.health = 0.0;
                    let pos = ped.pos;
                    ctx.particles.blood(pos, 5);
                    out.kills += 1;
                    out.score += rewards::GATLING_KILL;
                    Keep::Remove
                }
                Some(RoundHit::Vehicle(i)) => {
                    let vehicle = &mut ctx.population.vehicles[i];
                    vehicle.health -= VEHICLE_DAMAGE;
                    if vehicle.health <= 0.0 {
                        let score = vehicle.kind.score();
                        if let Some(kills) = destroy_vehicle(ctx, i) {
                            out.score += score;
                            out.blast(kills);
                        }
                    }
                    Keep::Remove
                }
                None => {
                    round.pos = to;
                    Keep::from_alive(round.life > 0.0 && ctx.terrain.in_bounds(to))
                }
            }
        });
        tick
    }

    fn is_busy(&self) -> bool {
        self.timer.is_active() || !self.rounds.is_empty()
    }
}
