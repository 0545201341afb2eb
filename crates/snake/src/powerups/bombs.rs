//! Spread bombs dropped on a cadence, and belt bombs laid along the body.

use super::{Cadence, Outcome, Owner, PowerUpSystem, Tick, Timer};
use crate::config::Config;
use crate::context::FrameContext;
use crate::explosion::explode;
use crate::pool::{drain_expired, Keep};
use glam::Vec2;
use tracing::debug;

const SPREAD_INTERVAL: f32 = 0.5;
const SPREAD_FUSE: f32 = 1.5;
const SPREAD_RADIUS: f32 = 40.0;

/// Every n-th body segment gets a belt bomb.
const BELT_SEGMENT_STRIDE: u32 = 4;
const BELT_FUSE: f32 = 0.8;
const BELT_FUSE_STAGGER: f32 = 0.1;
const BELT_RADIUS: f32 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadBomb {
    pub pos: Vec2,
    pub fuse: f32,
}

#[derive(Debug, Clone, Default)]
pub struct SpreadBombs {
    pub timer: Timer,
    cadence: Cadence,
    pub bombs: Vec<SpreadBomb>,
}

impl SpreadBombs {
    pub fn activate(&mut self, config: &Config) {
        if !self.timer.is_active() {
            self.cadence.reset();
        }
        self.timer.start(config.powerups.spread_bombs_time);
    }
}

impl PowerUpSystem for SpreadBombs {
    fn name(&self) -> &'static str {
        "spread bombs"
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
            for _ in 0..self.cadence.due(dt, SPREAD_INTERVAL) {
                self.bombs.push(SpreadBomb {
                    pos: owner.head,
                    fuse: SPREAD_FUSE,
                });
            }
        }

        let expired = drain_expired(&mut self.bombs, |bomb| {
            bomb.fuse -= dt;
            Keep::from_alive(bomb.fuse > 0.0)
        });
        for bomb in expired {
            out.blast(explode(ctx, bomb.pos, SPREAD_RADIUS));
        }
        tick
    }

    fn is_busy(&self) -> bool {
        self.timer.is_active() || !self.bombs.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeltBomb {
    pub pos: Vec2,
    pub fuse: f32,
}

/// One-shot: every activation lays a belt, no timer of its own.
#[derive(Debug, Clone, Default)]
pub struct BeltBombs {
    pub bombs: Vec<BeltBomb>,
}

impl BeltBombs {
    /// Lay a bomb on every few body segments, fuses staggered from the head
    /// back so the belt goes off as a ripple.
    pub fn lay(&mut self, owner: &Owner<'_>) {
        let mut laid = 0;
        let mut segment = BELT_SEGMENT_STRIDE;
        while segment <= owner.length {
            self.bombs.push(BeltBomb {
                pos: owner.segment(segment),
                fuse: BELT_FUSE + BELT_FUSE_STAGGER * laid as f32,
            });
            laid += 1;
            segment += BELT_SEGMENT_STRIDE;
        }
        debug!("Belt bombs laid: {}", laid);
    }
}

impl PowerUpSystem for BeltBombs {
    fn name(&self) -> &'static str {
        "belt bombs"
    }

    fn update(
        &mut self,
        _owner: &Owner<'_>,
        ctx: &mut FrameContext<'_>,
        _config: &Config,
        dt: f32,
        out: &mut Outcome,
    ) -> Tick {
        if self.bombs.is_empty() {
            return Tick::Idle;
        }
        let expired = drain_expired(&mut self.bombs, |bomb| {
            bomb.fuse -= dt;
            Keep::from_alive(bomb.fuse > 0.0)
        });
        for bomb in expired {
            out.blast(explode(ctx, bomb.pos, BELT_RADIUS));
        }
        if self.bombs.is_empty() { Tick::Expired } else { Tick::Active }
    }

    fn is_busy(&self) -> bool {
        !self.bombs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::BonusList;
    use crate::particles::ParticleBuffer;
    use crate::population::{Pedestrian, Population};
    use crate::snake::PathHistory;
    use crate::world::TileGrid;

    fn owner(path: &PathHistory, head: Vec2, length: u32) -> Owner<'_> {
        Owner {
            head,
            prev_head: head,
            heading: 0.0,
            speed: 120.0,
            path,
            segment_spacing: 6.0,
            length,
            alive: true,
            fire_ring_active: false,
        }
    }

    #[test]
    fn test_belt_lays_every_fourth_segment() {
        let head = Vec2::new(200.0, 100.0);
        let mut path = PathHistory::new(64, 2.0);
        path.rebuild(head, 0.0, 40);
        let mut belt = BeltBombs::default();
        belt.lay(&owner(&path, head, 10));

        assert_eq!(belt.bombs.len(), 2);
        assert_eq!(belt.bombs[0].fuse, 0.8);
        assert!((belt.bombs[1].fuse - 0.9).abs() < 1e-6);
        assert!(belt.bombs[0].pos.distance(Vec2::new(176.0, 100.0)) < 1e-3);
        assert!(belt.bombs[1].pos.distance(Vec2::new(152.0, 100.0)) < 1e-3);
    }

    #[test]
    fn test_belt_goes_off_head_first() {
        let head = Vec2::new(200.0, 100.0);
        let mut path = PathHistory::new(64, 2.0);
        path.rebuild(head, 0.0, 40);
        let mut grid = TileGrid::new(40, 40, 16.0);
        let mut pop = Population::new();
        pop.pedestrians.push(Pedestrian::new(Vec2::new(176.0, 110.0)));
        let mut particles = ParticleBuffer::new();
        let mut bonuses = BonusList::new();
        let mut ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0);
        let config = Config::default();

        let owner = owner(&path, head, 10);
        let mut belt = BeltBombs::default();
        belt.lay(&owner);
        let mut out = Outcome::default();
        assert_eq!(belt.update(&owner, &mut ctx, &config, 0.85, &mut out), Tick::Active);
        assert_eq!(belt.bombs.len(), 1);
        assert_eq!(out.kills, 1);
        assert_eq!(out.score, crate::powerups::rewards::EXPLOSION_KILL);
        assert_eq!(belt.update(&owner, &mut ctx, &config, 0.1, &mut out), Tick::Expired);
        assert!(!belt.is_busy());
    }

    #[test]
    fn test_spread_bombs_drop_on_cadence_and_detonate() {
        let head = Vec2::new(100.0, 100.0);
        let path = PathHistory::new(16, 2.0);
        let mut grid = TileGrid::new(40, 40, 16.0);
        let mut pop = Population::new();
        pop.pedestrians.push(Pedestrian::new(Vec2::new(110.0, 100.0)));
        let mut particles = ParticleBuffer::new();
        let mut bonuses = BonusList::new();
        let mut ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0);
        let config = Config::default();
        let owner = owner(&path, head, 10);

        let mut spread = SpreadBombs::default();
        spread.activate(&config);
        let mut out = Outcome::default();
        spread.update(&owner, &mut ctx, &config, 0.25, &mut out);
        assert_eq!(spread.bombs.len(), 1);
        assert_eq!(spread.bombs[0].pos, head);
        spread.update(&owner, &mut ctx, &config, 0.25, &mut out);
        assert_eq!(spread.bombs.len(), 2);

        for _ in 0..3 {
            spread.update(&owner, &mut ctx, &config, 0.25, &mut out);
        }
        assert!(ctx.population.pedestrians[0].alive);
        spread.update(&owner, &mut ctx, &config, 0.25, &mut out);
        assert!(!ctx.population.pedestrians[0].alive);
        assert_eq!(out.kills, 1);
    }
}
