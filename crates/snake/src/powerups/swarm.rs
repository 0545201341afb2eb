//! Ghost swarm.
//!
//! On activation the body splits into ghosts that hunt on their own while
//! the head stays frozen. Each ghost carries the body length it took and
//! hands it back exactly once when it rejoins the head.

use super::{rewards, BoltOrbit, Outcome, Owner, PowerUpSystem, Tick, Timer};
use crate::bonus::boxes_hit;
use crate::config::Config;
use crate::context::FrameContext;
use crate::geometry::{heading_vec, steer_toward, vec_heading};
use crate::pool::{sweep, Keep};
use crate::query::{clear_direction, escape_tile, is_walkable};
use crate::rng::{random_direction, tags, EffectSeed};
use glam::Vec2;
use rand::Rng;
use tracing::{debug, info};

const MIN_LENGTH: u32 = 6;
/// Length the head keeps for itself.
const KEEP_LENGTH: u32 = 3;
const SPEED: f32 = 140.0;
const RETURN_SPEED: f32 = 220.0;
const TURN_RATE: f32 = 6.0;
const HUNT_RANGE: f32 = 160.0;
const WANDER_MIN: f32 = 40.0;
const WANDER_MAX: f32 = 120.0;
const EAT_RADIUS: f32 = 8.0;
const REJOIN_RADIUS: f32 = 10.0;
const WAYPOINT_REACHED: f32 = 8.0;
const FAN_SPREAD: f32 = 0.6;
/// Seconds after expiry before stragglers are pulled home regardless.
const FAILSAFE: f32 = 6.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GhostSnake {
    pub id: u64,
    pub pos: Vec2,
    pub heading: f32,
    pub target: Vec2,
    pub returning: bool,
    /// Body length this ghost owes the head.
    pub seg_len: u32,
    restored: bool,
    waypoint: Option<Vec2>,
    last_pos: Vec2,
    stuck_time: f32,
    pub bolts: BoltOrbit,
}

impl GhostSnake {
    fn new(id: u64, pos: Vec2, heading: f32, seg_len: u32) -> Self {
        Self {
            id,
            pos,
            heading,
            target: pos,
            returning: false,
            seg_len,
            restored: false,
            waypoint: None,
            last_pos: pos,
            stuck_time: 0.0,
            bolts: BoltOrbit::minor(),
        }
    }

    /// Hand the carried length back. Only the first call returns anything.
    fn reintegrate(&mut self) -> u32 {
        if self.restored {
            return 0;
        }
        self.restored = true;
        self.seg_len
    }

    fn pick_waypoint(&self, ctx: &FrameContext<'_>) -> Option<Vec2> {
        let mut rng = EffectSeed::new(tags::GHOST_WANDER)
            .with_u64(self.id)
            .with_pos(self.pos)
            .with_f32(ctx.time)
            .rng();
        (0..8).find_map(|_| {
            let p = self.pos + random_direction(&mut rng) * rng.random_range(WANDER_MIN..WANDER_MAX);
            is_walkable(&*ctx.terrain, p).then_some(p)
        })
    }

    /// Nearest pedestrian or bonus box in range.
    fn hunt_target(&self, ctx: &FrameContext<'_>) -> Option<Vec2> {
        let ped = ctx
            .population
            .nearest_edible(self.pos, HUNT_RANGE)
            .map(|i| ctx.population.pedestrians[i].pos);
        let range_sq = HUNT_RANGE * HUNT_RANGE;
        let bonus = ctx
            .bonuses
            .boxes()
            .iter()
            .filter(|b| b.alive && b.pos.distance_squared(self.pos) <= range_sq)
            .map(|b| b.pos)
            .min_by(|a, b| {
                a.distance_squared(self.pos)
                    .total_cmp(&b.distance_squared(self.pos))
            });
        match (ped, bonus) {
            (Some(p), Some(b)) => {
                if p.distance_squared(self.pos) <= b.distance_squared(self.pos) {
                    Some(p)
                } else {
                    Some(b)
                }
            }
            (p, b) => p.or(b),
        }
    }

    /// Fly straight home, through walls. Returns true on arrival.
    fn fly_home(&mut self, head: Vec2, dt: f32) -> bool {
        self.target = head;
        let to_head = head - self.pos;
        let dist = to_head.length();
        let step = RETURN_SPEED * dt;
        if dist <= REJOIN_RADIUS + step {
            self.pos = head;
            return true;
        }
        self.heading = vec_heading(to_head);
        self.pos += to_head / dist * step;
        false
    }

    fn hunt(&mut self, owner: &Owner<'_>, ctx: &mut FrameContext<'_>, config: &Config, dt: f32, out: &mut Outcome) {
        self.target = match self.hunt_target(ctx) {
            Some(t) => {
                self.waypoint = None;
                t
            }
            None => {
                if self.waypoint.is_none_or(|w| w.distance(self.pos) <= WAYPOINT_REACHED) {
                    self.waypoint = self.pick_waypoint(ctx);
                }
                self.waypoint.unwrap_or(self.pos)
            }
        };

        if self.target.distance_squared(self.pos) > 1.0 {
            self.heading = steer_toward(self.heading, vec_heading(self.target - self.pos), TURN_RATE * dt);
        }
        let next = self.pos + heading_vec(self.heading) * SPEED * dt;
        if is_walkable(&*ctx.terrain, next) {
            self.pos = next;
        }

        self.check_stuck(ctx, config, dt);
        self.eat(ctx, out);
        self.collect(ctx, config, out);

        if owner.fire_ring_active {
            self.bolts
                .burn_around(self.pos, 1 + self.id, ctx, config.powerups.ignite_chance, dt, out);
        }
        self.last_pos = self.pos;
    }

    /// Local version of the head's stuck escalation.
    fn check_stuck(&mut self, ctx: &FrameContext<'_>, config: &Config, dt: f32) {
        let av = &config.avoidance;
        if self.pos.distance(self.last_pos) >= av.stuck_epsilon * 0.5 {
            self.stuck_time = 0.0;
            return;
        }
        self.stuck_time += dt;
        if self.stuck_time <= av.ghost_stuck_grace {
            return;
        }
        self.stuck_time = 0.0;
        self.waypoint = None;

        if let Some(h) = clear_direction(&*ctx.terrain, self.pos, self.heading, av.ghost_feeler_len, av.ray_step) {
            self.heading = h;
            self.waypoint = Some(self.pos + heading_vec(h) * av.ghost_feeler_len);
        } else if let Some(tile) =
            escape_tile(&*ctx.terrain, self.pos, av.ghost_relocate_radius, av.ghost_feeler_len, av.ray_step)
        {
            debug!("Ghost {} relocated to ({:.0}, {:.0})", self.id, tile.x, tile.y);
            self.pos = tile;
        }
    }

    fn eat(&self, ctx: &mut FrameContext<'_>, out: &mut Outcome) {
        for victim in ctx.population.eat_pedestrians_in(self.pos, EAT_RADIUS) {
            ctx.particles.blood(victim, 6);
            out.score += rewards::SWARM_EAT;
            out.streak_kills += 1;
        }
    }

    fn collect(&self, ctx: &mut FrameContext<'_>, config: &Config, out: &mut Outcome) {
        let hits = boxes_hit(&*ctx.bonuses, self.pos, self.last_pos, self.heading, &config.combat);
        for i in hits {
            if let Some(kind) = ctx.bonuses.collect(i, self.pos) {
                out.collected.push(kind);
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Swarm {
    pub timer: Timer,
    pub ghosts: Vec<GhostSnake>,
    /// Seconds since the timer expired with ghosts still out.
    overdue: f32,
    next_id: u64,
}

impl Swarm {
    /// Whether the swarm currently holds the body.
    pub fn is_out(&self) -> bool {
        !self.ghosts.is_empty()
    }

    /// Total length carried by ghosts that have not rejoined.
    pub fn detached_length(&self) -> u32 {
        self.ghosts.iter().filter(|g| !g.restored).map(|g| g.seg_len).sum()
    }

    /// Split the body into ghosts. Returns the length taken from the head,
    /// zero if the body is too short or a swarm is already out.
    pub fn launch(&mut self, owner: &Owner<'_>, config: &Config) -> u32 {
        if self.is_out() {
            self.timer.start(config.powerups.swarm_time);
            return 0;
        }
        if owner.length < MIN_LENGTH {
            return 0;
        }
        let spare = owner.length - KEEP_LENGTH;
        let count = config.powerups.max_ghosts.min(spare / 2).max(1);
        let per_ghost = spare / count;
        if per_ghost == 0 {
            return 0;
        }

        let stride = (owner.length / count).max(1);
        let mid = (count as f32 - 1.0) / 2.0;
        for k in 0..count {
            let pos = owner.segment((k + 1) * stride);
            let heading = owner.heading + (k as f32 - mid) * FAN_SPREAD;
            self.ghosts.push(GhostSnake::new(self.next_id, pos, heading, per_ghost));
            self.next_id += 1;
        }
        self.timer.start(config.powerups.swarm_time);
        self.overdue = 0.0;

        let taken = count * per_ghost;
        info!("Swarm launched: {} ghosts carrying {} segments", count, taken);
        taken
    }
}

impl PowerUpSystem for Swarm {
    fn name(&self) -> &'static str {
        "swarm"
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
        if self.ghosts.is_empty() {
            return tick;
        }
        if !self.timer.is_active() {
            for ghost in self.ghosts.iter_mut() {
                ghost.returning = true;
            }
            self.overdue += dt;
        }

        let snap_home = self.overdue > FAILSAFE;
        sweep(&mut self.ghosts, |_, ghost| {
            let home = if snap_home {
                ghost.pos = owner.head;
                true
            } else if ghost.returning {
                ghost.fly_home(owner.head, dt)
            } else {
                ghost.hunt(owner, ctx, config, dt, out);
                false
            };
            if home {
                let restored = ghost.reintegrate();
                out.length_restored += restored;
                debug!("Ghost {} rejoined with {} segments", ghost.id, restored);
                Keep::Remove
            } else {
                Keep::Alive
            }
        });

        if self.ghosts.is_empty() {
            self.overdue = 0.0;
            info!("Swarm reintegrated");
        }
        tick
    }

    fn is_busy(&self) -> bool {
        self.timer.is_active() || !self.ghosts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::BonusList;
    use crate::particles::ParticleBuffer;
    use crate::population::{PedState, Pedestrian, Population};
    use crate::world::{TileGrid, TileKind};

    #[test]
    fn test_reintegrate_once() {
        let mut ghost = GhostSnake::new(0, Vec2::ZERO, 0.0, 4);
        assert_eq!(ghost.reintegrate(), 4);
        assert_eq!(ghost.reintegrate(), 0);
    }

    #[test]
    fn test_fly_home_arrives() {
        let mut ghost = GhostSnake::new(0, Vec2::new(100.0, 0.0), 0.0, 2);
        let mut arrived = false;
        for _ in 0..100 {
            if ghost.fly_home(Vec2::ZERO, 0.05) {
                arrived = true;
                break;
            }
        }
        assert!(arrived);
        assert_eq!(ghost.pos, Vec2::ZERO);
    }

    #[test]
    fn test_stuck_ghost_turns_away_from_wall() {
        let mut grid = TileGrid::new(20, 20, 16.0);
        grid.fill_rect(7, 0, 7, 19, TileKind::Wall);
        let mut pop = Population::new();
        let mut particles = ParticleBuffer::new();
        let mut bonuses = BonusList::new();
        let ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0);
        let config = Config::default();

        let mut ghost = GhostSnake::new(0, Vec2::new(108.0, 100.0), 0.0, 2);
        ghost.check_stuck(&ctx, &config, 0.2);
        assert_eq!(ghost.heading, 0.0);
        ghost.check_stuck(&ctx, &config, 0.3);
        assert_ne!(ghost.heading, 0.0);
        assert!(ghost.waypoint.is_some());
        assert_eq!(ghost.stuck_time, 0.0);
    }

    #[test]
    fn test_sealed_ghost_relocates() {
        let mut grid = TileGrid::new(20, 20, 16.0);
        grid.fill_rect(9, 9, 11, 11, TileKind::Wall);
        grid.set_tile(10, 10, TileKind::Open);
        let mut pop = Population::new();
        let mut particles = ParticleBuffer::new();
        let mut bonuses = BonusList::new();
        let ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0);
        let config = Config::default();

        let start = Vec2::new(168.0, 168.0);
        let mut ghost = GhostSnake::new(0, start, 0.0, 2);
        ghost.check_stuck(&ctx, &config, 0.5);
        assert!(ghost.pos.distance(start) > 16.0);
        assert!(!ctx.terrain.is_blocked(ghost.pos));
    }

    #[test]
    fn test_ghost_passes_over_infected() {
        let mut grid = TileGrid::new(20, 20, 16.0);
        let mut pop = Population::new();
        pop.pedestrians.push(Pedestrian::new(Vec2::new(102.0, 100.0)));
        pop.pedestrians.push(Pedestrian::new(Vec2::new(100.0, 103.0)).with_state(PedState::Infected));
        let mut particles = ParticleBuffer::new();
        let mut bonuses = BonusList::new();
        let mut ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0);

        let ghost = GhostSnake::new(0, Vec2::new(100.0, 100.0), 0.0, 2);
        let mut out = Outcome::default();
        ghost.eat(&mut ctx, &mut out);
        assert_eq!(out.score, rewards::SWARM_EAT);
        assert_eq!(out.streak_kills, 1);
        assert!(ctx.population.pedestrians[1].alive);
    }
}

