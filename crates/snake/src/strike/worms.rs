//! Worm packs: short-lived hunters that eat pedestrians.

use crate::config::StrikeConfig;
use crate::context::FrameContext;
use crate::geometry::{heading_vec, steer_toward, vec_heading};
use crate::pool::{sweep, Keep};
use crate::powerups::{rewards, Outcome};
use crate::query::{clear_direction, is_walkable};
use crate::rng::{effect_rng, random_direction, tags};
use glam::Vec2;
use rand::Rng;

const SPEED: f32 = 90.0;
const TURN_RATE: f32 = 5.0;
const HUNT_RANGE: f32 = 200.0;
const EAT_RADIUS: f32 = 7.0;
const SPAWN_SPREAD: f32 = 24.0;
const FEELER_LEN: f32 = 12.0;
const RAY_STEP: f32 = 4.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StrikeWorm {
    pub pos: Vec2,
    pub heading: f32,
    pub life: f32,
}

/// Spawn 3 to 5 worms around `point`. The pack depends only on the
/// arguments.
pub fn spawn_worm_pack(point: Vec2, time: f32, counter: u64, config: &StrikeConfig) -> Vec<StrikeWorm> {
    let mut rng = effect_rng(tags::WORM_PACK, point, time, counter);
    let count = rng.random_range(3..=5);
    (0..count)
        .map(|_| {
            let dir = random_direction(&mut rng);
            let dist = rng.random_range(4.0..SPAWN_SPREAD);
            StrikeWorm {
                pos: point + dir * dist,
                heading: vec_heading(dir),
                life: config.worm_life,
            }
        })
        .collect()
}

impl StrikeWorm {
    fn crawl(&mut self, ctx: &FrameContext<'_>, dt: f32) {
        let target = ctx
            .population
            .nearest_pedestrian(self.pos, HUNT_RANGE)
            .map(|i| ctx.population.pedestrians[i].pos);
        if let Some(target) = target {
            self.heading = steer_toward(self.heading, vec_heading(target - self.pos), TURN_RATE * dt);
        }

        let next = self.pos + heading_vec(self.heading) * SPEED * dt;
        if is_walkable(&*ctx.terrain, next) {
            self.pos = next;
        } else if let Some(h) = clear_direction(&*ctx.terrain, self.pos, self.heading, FEELER_LEN, RAY_STEP) {
            self.heading = h;
        }
    }
}

pub(super) fn update(worms: &mut Vec<StrikeWorm>, ctx: &mut FrameContext<'_>, dt: f32, out: &mut Outcome) {
    sweep(worms, |_, worm| {
        worm.crawl(ctx, dt);
        for victim in ctx.population.kill_pedestrians_in(worm.pos, EAT_RADIUS) {
            ctx.particles.blood(victim, 5);
            out.kills += 1;
            out.score += rewards::STRIKE_KILL;
        }
        worm.life -= dt;
        Keep::from_alive(worm.life > 0.0)
    });
}
