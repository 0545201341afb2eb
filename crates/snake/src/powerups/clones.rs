//! Mirror clones flying in formation beside the head.

use super::{rewards, BoltOrbit, Outcome, Owner, PowerUpSystem, Tick, Timer};
use crate::bonus::boxes_hit;
use crate::config::Config;
use crate::context::FrameContext;
use crate::geometry::heading_vec;
use crate::pool::{sweep, Keep};
use crate::query::is_walkable;
use crate::snake::PathHistory;
use glam::Vec2;
use tracing::info;

/// Clones may outrun the head by this factor to reach their slot.
const CATCH_UP: f32 = 1.5;
const EAT_RADIUS: f32 = 8.0;
const TRAIL_CAPACITY: usize = 120;

#[derive(Debug, Clone)]
pub struct CloneSnake {
    /// Offset from the head along the heading's perpendicular.
    pub offset: f32,
    pub pos: Vec2,
    pub heading: f32,
    pub path: PathHistory,
    pub bolts: BoltOrbit,
}

impl CloneSnake {
    fn new(offset: f32, owner: &Owner<'_>, spacing: f32) -> Self {
        let pos = Self::slot(owner, offset);
        let mut path = PathHistory::new(TRAIL_CAPACITY, spacing);
        path.record(pos);
        Self {
            offset,
            pos,
            heading: owner.heading,
            path,
            bolts: BoltOrbit::minor(),
        }
    }

    fn slot(owner: &Owner<'_>, offset: f32) -> Vec2 {
        owner.head + heading_vec(owner.heading).perp() * offset
    }

    /// Move toward the formation slot. Blocked steps are skipped, the clone
    /// catches up once the slot is reachable again.
    fn follow(&mut self, owner: &Owner<'_>, ctx: &FrameContext<'_>, dt: f32) {
        self.heading = owner.heading;
        let to_slot = Self::slot(owner, self.offset) - self.pos;
        let dist = to_slot.length();
        if dist <= f32::EPSILON {
            return;
        }
        let step = (owner.speed * CATCH_UP * dt).min(dist);
        let next = self.pos + to_slot / dist * step;
        if is_walkable(&*ctx.terrain, next) {
            self.pos = next;
            self.path.record(next);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Clones {
    pub timer: Timer,
    pub clones: Vec<CloneSnake>,
}

impl Clones {
    pub fn activate(&mut self, owner: &Owner<'_>, config: &Config) {
        if self.clones.is_empty() {
            let pu = &config.powerups;
            let spacing = config.movement.path_spacing;
            self.clones = (0..pu.clone_count)
                .map(|i| {
                    // Alternate sides, widening every pair.
                    let rank = (i / 2 + 1) as f32;
                    let side = if i % 2 == 0 { 1.0 } else { -1.0 };
                    CloneSnake::new(side * rank * pu.clone_offset, owner, spacing)
                })
                .collect();
            info!("Clones deployed: {}", self.clones.len());
        }
        self.timer.start(config.powerups.clones_time);
    }
}

impl PowerUpSystem for Clones {
    fn name(&self) -> &'static str {
        "clones"
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
            if !self.clones.is_empty() {
                info!("Clones dismissed");
            }
            self.clones.clear();
            return tick;
        }

        sweep(&mut self.clones, |i, clone| {
            let prev = clone.pos;
            clone.follow(owner, ctx, dt);

            for victim in ctx.population.eat_pedestrians_in(clone.pos, EAT_RADIUS) {
                ctx.particles.blood(victim, 6);
                out.score += rewards::CLONE_EAT;
                out.streak_kills += 1;
            }
            for b in boxes_hit(&*ctx.bonuses, clone.pos, prev, clone.heading, &config.combat) {
                if let Some(kind) = ctx.bonuses.collect(b, clone.pos) {
                    out.collected.push(kind);
                }
            }
            if owner.fire_ring_active {
                clone.bolts
                    .burn_around(clone.pos, 32 + i as u64, ctx, config.powerups.ignite_chance, dt, out);
            }
            Keep::Alive
        });
        tick
    }

    fn is_busy(&self) -> bool {
        self.timer.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::BonusList;
    use crate::particles::ParticleBuffer;
    use crate::population::{Pedestrian, Population};
    use crate::world::TileGrid;

    fn owner(path: &PathHistory, head: Vec2) -> Owner<'_> {
        Owner {
            head,
            prev_head: head,
            heading: 0.0,
            speed: 120.0,
            path,
            segment_spacing: 6.0,
            length: 10,
            alive: true,
            fire_ring_active: false,
        }
    }

    #[test]
    fn test_clones_take_both_sides() {
        let path = PathHistory::new(16, 2.0);
        let config = Config::default();
        let mut clones = Clones::default();
        clones.activate(&owner(&path, Vec2::new(100.0, 100.0)), &config);
        assert_eq!(clones.clones.len(), 2);
        let ys: Vec<f32> = clones.clones.iter().map(|c| c.pos.y).collect();
        assert!(ys.contains(&140.0));
        assert!(ys.contains(&60.0));
    }

    #[test]
    fn test_clones_eat_and_expire() {
        let path = PathHistory::new(16, 2.0);
        let config = Config::default();
        let mut grid = TileGrid::new(20, 20, 16.0);
        let mut pop = Population::new();
        pop.pedestrians.push(Pedestrian::new(Vec2::new(100.0, 140.0)));
        let mut particles = ParticleBuffer::new();
        let mut bonuses = BonusList::new();
        let mut clones = Clones::default();
        let me = owner(&path, Vec2::new(100.0, 100.0));
        clones.activate(&me, &config);

        let mut out = Outcome::default();
        {
            let mut ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0);
            assert_eq!(clones.update(&me, &mut ctx, &config, 0.016, &mut out), Tick::Active);
        }
        assert_eq!(out.score, rewards::CLONE_EAT);
        assert_eq!(pop.alive_pedestrians(), 0);

        clones.timer.start(0.01);
        let mut ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0);
        assert_eq!(clones.update(&me, &mut ctx, &config, 0.016, &mut out), Tick::Expired);
        assert!(clones.clones.is_empty());
    }
}
