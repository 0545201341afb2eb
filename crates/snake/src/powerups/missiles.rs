//! Homing missiles.

use super::{Cadence, Outcome, Owner, PowerUpSystem, Tick, Timer};
use crate::config::Config;
use crate::context::FrameContext;
use crate::explosion::explode;
use crate::geometry::{heading_vec, steer_toward, vec_heading};
use crate::pool::{drain_expired, Keep};
use glam::Vec2;
use tracing::debug;

const FIRE_INTERVAL: f32 = 0.6;
const START_SPEED: f32 = 150.0;
const ACCEL: f32 = 300.0;
const MAX_SPEED: f32 = 420.0;
const TURN_RATE: f32 = 4.0;
const SEEK_RANGE: f32 = 320.0;
const LIFE: f32 = 3.0;
const PROXIMITY: f32 = 10.0;
const BLAST_RADIUS: f32 = 28.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomingMissile {
    pub pos: Vec2,
    pub heading: f32,
    pub speed: f32,
    pub life: f32,
    /// Set when the missile should detonate this frame.
    pub detonate: bool,
}

impl HomingMissile {
    pub fn launch(pos: Vec2, heading: f32) -> Self {
        Self {
            pos,
            heading,
            speed: START_SPEED,
            life: LIFE,
            detonate: false,
        }
    }

    /// Nearest alive pedestrian or vehicle, whichever is closer.
    fn acquire(&self, ctx: &FrameContext<'_>) -> Option<Vec2> {
        let pop = &*ctx.population;
        let ped = pop.nearest_pedestrian(self.pos, SEEK_RANGE).map(|i| pop.pedestrians[i].pos);
        let car = pop.nearest_vehicle(self.pos, SEEK_RANGE).map(|i| pop.vehicles[i].pos);
        match (ped, car) {
            (Some(p), Some(c)) => {
                if p.distance_squared(self.pos) <= c.distance_squared(self.pos) {
                    Some(p)
                } else {
                    Some(c)
                }
            }
            (p, c) => p.or(c),
        }
    }

    /// Steer, accelerate, move. Returns false once it should detonate.
    fn fly(&mut self, ctx: &FrameContext<'_>, dt: f32) -> bool {
        let target = self.acquire(ctx);
        if let Some(target) = target {
            self.heading = steer_toward(self.heading, vec_heading(target - self.pos), TURN_RATE * dt);
        }
        self.speed = (self.speed + ACCEL * dt).min(MAX_SPEED);
        self.pos += heading_vec(self.heading) * self.speed * dt;
        self.life -= dt;

        let arrived = target.is_some_and(|t| t.distance(self.pos) <= PROXIMITY);
        self.detonate = arrived || self.life <= 0.0 || ctx.terrain.is_blocked(self.pos);
        !self.detonate
    }
}

#[derive(Debug, Clone, Default)]
pub struct MissileLauncher {
    pub timer: Timer,
    cadence: Cadence,
    pub missiles: Vec<HomingMissile>,
}

impl MissileLauncher {
    pub fn activate(&mut self, config: &Config) {
        if !self.timer.is_active() {
            self.cadence.reset();
        }
        self.timer.start(config.powerups.missiles_time);
    }
}

impl PowerUpSystem for MissileLauncher {
    fn name(&self) -> &'static str {
        "missiles"
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
                self.missiles.push(HomingMissile::launch(owner.head, owner.heading));
            }
        }

        let spent = drain_expired(&mut self.missiles, |m| Keep::from_alive(m.fly(ctx, dt)));
        for missile in spent {
            let kills = explode(ctx, missile.pos, BLAST_RADIUS);
            debug!("Missile detonated at ({:.0}, {:.0}), {} kills", missile.pos.x, missile.pos.y, kills);
            out.blast(kills);
        }
        tick
    }

    fn is_busy(&self) -> bool {
        self.timer.is_active() || !self.missiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::BonusList;
    use crate::particles::ParticleBuffer;
    use crate::population::{Pedestrian, Population, Vehicle, VehicleKind};
    use crate::snake::PathHistory;
    use crate::world::{TileGrid, TileKind};

    struct Scene {
        grid: TileGrid,
        pop: Population,
        particles: ParticleBuffer,
        bonuses: BonusList,
    }

    impl Scene {
        fn new() -> Self {
            Self {
                grid: TileGrid::new(40, 40, 16.0),
                pop: Population::new(),
                particles: ParticleBuffer::new(),
                bonuses: BonusList::new(),
            }
        }

        fn ctx(&mut self) -> FrameContext<'_> {
            FrameContext::new(&mut self.grid, &mut self.pop, &mut self.particles, &mut self.bonuses, 0.0)
        }
    }

    #[test]
    fn test_acquire_prefers_closer_target() {
        let mut scene = Scene::new();
        scene.pop.pedestrians.push(Pedestrian::new(Vec2::new(200.0, 100.0)));
        scene.pop.vehicles.push(Vehicle::new(VehicleKind::Car, Vec2::new(140.0, 100.0)));
        let missile = HomingMissile::launch(Vec2::new(100.0, 100.0), 0.0);
        assert_eq!(missile.acquire(&scene.ctx()), Some(Vec2::new(140.0, 100.0)));

        scene.pop.pedestrians.push(Pedestrian::new(Vec2::new(100.0, 120.0)));
        assert_eq!(missile.acquire(&scene.ctx()), Some(Vec2::new(100.0, 120.0)));

        scene.pop.pedestrians.clear();
        scene.pop.vehicles.clear();
        scene.pop.pedestrians.push(Pedestrian::new(Vec2::new(500.0, 100.0)));
        assert_eq!(missile.acquire(&scene.ctx()), None);
    }

    #[test]
    fn test_detonates_near_target() {
        let mut scene = Scene::new();
        scene.pop.pedestrians.push(Pedestrian::new(Vec2::new(105.0, 100.0)));
        let mut missile = HomingMissile::launch(Vec2::new(100.0, 100.0), 0.0);
        assert!(!missile.fly(&scene.ctx(), 0.01));
        assert!(missile.detonate);
    }

    #[test]
    fn test_detonates_on_wall() {
        let mut scene = Scene::new();
        scene.grid.fill_rect(7, 0, 7, 39, TileKind::Wall);
        let mut missile = HomingMissile::launch(Vec2::new(110.0, 100.0), 0.0);
        assert!(!missile.fly(&scene.ctx(), 0.02));
        assert!(missile.detonate);
    }

    #[test]
    fn test_detonates_when_spent() {
        let mut scene = Scene::new();
        let mut missile = HomingMissile::launch(Vec2::new(300.0, 300.0), 0.0);
        assert!(missile.fly(&scene.ctx(), 0.02));
        assert!(missile.speed > START_SPEED);
        missile.life = 0.01;
        assert!(!missile.fly(&scene.ctx(), 0.02));
    }

    #[test]
    fn test_launcher_fires_on_cadence() {
        let mut scene = Scene::new();
        let config = Config::default();
        let path = PathHistory::new(16, 2.0);
        let owner = Owner {
            head: Vec2::new(100.0, 320.0),
            prev_head: Vec2::new(100.0, 320.0),
            heading: 0.0,
            speed: 120.0,
            path: &path,
            segment_spacing: 6.0,
            length: 10,
            alive: true,
            fire_ring_active: false,
        };
        let mut launcher = MissileLauncher::default();
        launcher.activate(&config);
        let mut out = Outcome::default();

        launcher.update(&owner, &mut scene.ctx(), &config, 0.25, &mut out);
        assert_eq!(launcher.missiles.len(), 1);
        launcher.update(&owner, &mut scene.ctx(), &config, 0.25, &mut out);
        assert_eq!(launcher.missiles.len(), 1);
        launcher.update(&owner, &mut scene.ctx(), &config, 0.25, &mut out);
        assert_eq!(launcher.missiles.len(), 2);
        assert!(launcher.is_busy());
    }
}
