//! Timed exploders: walking bombs with a seeded fuse.

use super::ExploderFlavor;
use crate::context::FrameContext;
use crate::explosion::explode;
use crate::geometry::{heading_vec, steer_toward, vec_heading, wrap_angle};
use crate::pool::{drain_expired, Keep};
use crate::powerups::Outcome;
use crate::query::{clear_direction, is_walkable};
use crate::rng::{effect_rng, random_direction, tags, EffectSeed};
use glam::Vec2;
use rand::Rng;
use std::f32::consts::PI;
use tracing::debug;

const MIN_FUSE: f32 = 4.0;
const MAX_FUSE: f32 = 7.0;
const SPAWN_SPREAD: f32 = 20.0;
/// Largest heading change a pig makes per second.
const PIG_JITTER: f32 = 2.5;
const SEEK_RANGE: f32 = 240.0;
const SEEK_TURN: f32 = 4.0;
const FEELER_LEN: f32 = 12.0;
const RAY_STEP: f32 = 4.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TimedExploder {
    pub id: u64,
    pub pos: Vec2,
    pub heading: f32,
    pub fuse: f32,
    pub flavor: ExploderFlavor,
}

/// Spawn 2 to 4 exploders around `point`.
pub fn spawn_exploders(flavor: ExploderFlavor, point: Vec2, time: f32, counter: u64) -> Vec<TimedExploder> {
    let mut rng = effect_rng(tags::EXPLODERS, point, time, counter);
    let count = rng.random_range(2..=4);
    (0..count)
        .map(|k| {
            let dir = random_direction(&mut rng);
            TimedExploder {
                id: counter * 8 + k,
                pos: point + dir * rng.random_range(0.0..SPAWN_SPREAD),
                heading: vec_heading(dir),
                fuse: rng.random_range(MIN_FUSE..=MAX_FUSE),
                flavor,
            }
        })
        .collect()
}

impl TimedExploder {
    fn walk(&mut self, ctx: &FrameContext<'_>, dt: f32) {
        match self.flavor {
            ExploderFlavor::Pig => {
                let mut rng = EffectSeed::new(tags::EXPLODER_STEP)
                    .with_u64(self.id)
                    .with_f32(ctx.time)
                    .rng();
                self.heading = wrap_angle(self.heading + rng.random_range(-PIG_JITTER..=PIG_JITTER) * dt);
            }
            ExploderFlavor::Snake => {
                let target = ctx
                    .population
                    .nearest_pedestrian(self.pos, SEEK_RANGE)
                    .map(|i| ctx.population.pedestrians[i].pos);
                if let Some(target) = target {
                    self.heading = steer_toward(self.heading, vec_heading(target - self.pos), SEEK_TURN * dt);
                }
            }
            ExploderFlavor::Vehicle => {}
        }

        let step = heading_vec(self.heading) * self.flavor.speed() * dt;
        let next = self.pos + step;
        if is_walkable(&*ctx.terrain, next) {
            self.pos = next;
            return;
        }
        match self.flavor {
            ExploderFlavor::Vehicle => {
                // Reflect off whichever axis is blocked.
                let mut dir = heading_vec(self.heading);
                if !is_walkable(&*ctx.terrain, self.pos + Vec2::new(step.x, 0.0)) {
                    dir.x = -dir.x;
                }
                if !is_walkable(&*ctx.terrain, self.pos + Vec2::new(0.0, step.y)) {
                    dir.y = -dir.y;
                }
                self.heading = vec_heading(dir);
            }
            ExploderFlavor::Pig => self.heading = wrap_angle(self.heading + PI),
            ExploderFlavor::Snake => {
                if let Some(h) = clear_direction(&*ctx.terrain, self.pos, self.heading, FEELER_LEN, RAY_STEP) {
                    self.heading = h;
                }
            }
        }
    }
}

pub(super) fn update(exploders: &mut Vec<TimedExploder>, ctx: &mut FrameContext<'_>, dt: f32, out: &mut Outcome) {
    let ctx_ref = &*ctx;
    let spent = drain_expired(exploders, |e| {
        e.walk(ctx_ref, dt);
        e.fuse -= dt;
        Keep::from_alive(e.fuse > 0.0)
    });
    for e in spent {
        let kills = explode(ctx, e.pos, e.flavor.blast_radius());
        debug!("{:?} exploder went off, {} kills", e.flavor, kills);
        out.blast(kills);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::BonusList;
    use crate::particles::ParticleBuffer;
    use crate::population::{Pedestrian, Population};
    use crate::world::{TileGrid, TileKind};

    #[test]
    fn test_spawn_counts_and_fuses() {
        for counter in 0..20 {
            let pack = spawn_exploders(ExploderFlavor::Pig, Vec2::new(80.0, 80.0), 1.0, counter);
            assert!((2..=4).contains(&pack.len()));
            for e in &pack {
                assert!((MIN_FUSE..=MAX_FUSE).contains(&e.fuse));
            }
        }
    }

    #[test]
    fn test_vehicle_bounces_off_wall() {
        let mut grid = TileGrid::new(20, 20, 16.0);
        grid.fill_rect(10, 0, 10, 19, TileKind::Wall);
        let mut pop = Population::new();
        let mut particles = ParticleBuffer::new();
        let mut bonuses = BonusList::new();
        let ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0);

        let mut e = TimedExploder {
            id: 0,
            pos: Vec2::new(150.0, 100.0),
            heading: 0.0,
            fuse: 5.0,
            flavor: ExploderFlavor::Vehicle,
        };
        for _ in 0..20 {
            e.walk(&ctx, 0.05);
            assert!(e.pos.x < 160.0);
        }
        assert!(heading_vec(e.heading).x < 0.0);
    }

    #[test]
    fn test_fuse_detonates() {
        let mut grid = TileGrid::new(20, 20, 16.0);
        let mut pop = Population::new();
        pop.pedestrians.push(Pedestrian::new(Vec2::new(100.0, 100.0)));
        let mut particles = ParticleBuffer::new();
        let mut bonuses = BonusList::new();
        let mut ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0);

        let mut exploders = vec![TimedExploder {
            id: 0,
            pos: Vec2::new(100.0, 100.0),
            heading: 0.0,
            fuse: 0.05,
            flavor: ExploderFlavor::Snake,
        }];
        let mut out = Outcome::default();
        update(&mut exploders, &mut ctx, 0.1, &mut out);
        assert!(exploders.is_empty());
        assert_eq!(out.kills, 1);
    }
}
