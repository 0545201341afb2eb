//! Demo world and frame loop.

use crate::{DemoConfig, RunnerConfig};
use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use snake::query::{is_walkable, nearest_open_tile};
use snake::strike::ExploderFlavor;
use snake::{
    BonusBox, BonusList, FrameContext, Mode, ParticleBuffer, PedState, Pedestrian, Population, PowerUp,
    ShakeRecorder, Snake, SnakeInput, StrikeKind, Terrain, TileGrid, TileKind, Vehicle, VehicleKind,
};
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

const BONUS_POOL: [PowerUp; 20] = [
    PowerUp::SpeedBoost,
    PowerUp::Berserk,
    PowerUp::Bash,
    PowerUp::Autopilot,
    PowerUp::FireRing,
    PowerUp::SpreadBombs,
    PowerUp::BeltBombs,
    PowerUp::Missiles,
    PowerUp::Gatling,
    PowerUp::Swarm,
    PowerUp::Clones,
    PowerUp::Vacuum,
    PowerUp::Heal,
    PowerUp::Strike(StrikeKind::WormPack),
    PowerUp::Strike(StrikeKind::HeliGun),
    PowerUp::Strike(StrikeKind::HeliMissile),
    PowerUp::Strike(StrikeKind::CarpetBomb),
    PowerUp::Strike(StrikeKind::AirSupport),
    PowerUp::Strike(StrikeKind::Exploders(ExploderFlavor::Pig)),
    PowerUp::Strike(StrikeKind::Exploders(ExploderFlavor::Snake)),
];

/// Everything the snake runs against.
struct DemoWorld {
    grid: TileGrid,
    population: Population,
    particles: ParticleBuffer,
    bonuses: BonusList,
    camera: ShakeRecorder,
    time: f32,
}

impl DemoWorld {
    fn generate(config: &DemoConfig, rng: &mut impl Rng) -> Self {
        let mut grid = TileGrid::new(config.width, config.height, config.tile_size);
        let (w, h) = (config.width as i32, config.height as i32);
        let kinds = [TileKind::Wall, TileKind::Building, TileKind::Tree, TileKind::Water];
        for _ in 0..config.walls {
            let x = rng.random_range(0..w);
            let y = rng.random_range(0..h);
            let kind = kinds.choose(rng).copied().unwrap_or(TileKind::Wall);
            grid.fill_rect(x, y, (x + rng.random_range(0..4)).min(w - 1), (y + rng.random_range(0..4)).min(h - 1), kind);
        }

        let mut world = Self {
            grid,
            population: Population::new(),
            particles: ParticleBuffer::new(),
            bonuses: BonusList::new(),
            camera: ShakeRecorder::default(),
            time: 0.0,
        };

        for _ in 0..config.pedestrians {
            let Some(pos) = world.open_point(rng) else { continue };
            let ped = match rng.random_range(0..10) {
                0 => Pedestrian::new(pos).with_state(PedState::Infected),
                1 => Pedestrian::new(pos).with_state(PedState::Hostile),
                2 => Pedestrian::new(pos).armed(),
                _ => Pedestrian::new(pos),
            };
            world.population.pedestrians.push(ped);
        }
        let vehicle_kinds = [VehicleKind::Car, VehicleKind::Car, VehicleKind::Police, VehicleKind::Tank, VehicleKind::Helicopter];
        for _ in 0..config.vehicles {
            let Some(pos) = world.open_point(rng) else { continue };
            let kind = vehicle_kinds.choose(rng).copied().unwrap_or(VehicleKind::Car);
            world.population.vehicles.push(Vehicle::new(kind, pos));
        }
        world.restock_bonuses(config.bonus_boxes, rng);
        world
    }

    fn open_point(&self, rng: &mut impl Rng) -> Option<Vec2> {
        let bounds = self.grid.bounds();
        (0..16).find_map(|_| {
            let p = Vec2::new(rng.random_range(0.0..bounds.x), rng.random_range(0.0..bounds.y));
            is_walkable(&self.grid, p).then_some(p)
        })
    }

    fn restock_bonuses(&mut self, target: usize, rng: &mut impl Rng) {
        self.bonuses.boxes.retain(|b| b.alive);
        while self.bonuses.boxes.len() < target {
            let Some(pos) = self.open_point(rng) else { break };
            let kind = BONUS_POOL.choose(rng).copied().unwrap_or(PowerUp::Heal);
            self.bonuses.boxes.push(BonusBox::new(pos, kind));
        }
    }

    /// Scripted player: chase the nearest pedestrian and click targets on
    /// the densest spot while a strike is armed.
    fn input_for(&self, snake: &Snake) -> SnakeInput {
        let target = self
            .population
            .nearest_pedestrian(snake.head, f32::INFINITY)
            .map(|i| self.population.pedestrians[i].pos)
            .unwrap_or(self.grid.bounds() / 2.0);
        let mut input = SnakeInput::toward(target);
        if snake.strike.is_targeting() && self.time.fract() < 1.0 / 60.0 {
            input.confirm = Some(target);
        }
        input
    }

    fn step(&mut self, snake: &mut Snake, dt: f32) {
        let input = self.input_for(snake);
        let mut ctx = FrameContext::new(
            &mut self.grid,
            &mut self.population,
            &mut self.particles,
            &mut self.bonuses,
            self.time,
        )
        .with_camera(&mut self.camera);
        snake.update(dt, &input, &mut ctx);

        self.grid.tick(dt);
        self.particles.tick(dt);
        self.camera.duration = (self.camera.duration - dt).max(0.0);
        if self.camera.duration == 0.0 {
            self.camera.intensity = 0.0;
        }
        self.time += dt;
    }
}

/// Run the demo until the frame budget is spent or the snake dies.
pub async fn run(config: RunnerConfig) -> anyhow::Result<()> {
    let demo = &config.demo;
    let mut rng = rand::rng();
    let mut world = DemoWorld::generate(demo, &mut rng);

    let center = world.grid.bounds() / 2.0;
    let spawn = nearest_open_tile(&world.grid, center, demo.width.max(demo.height) as i32)
        .ok_or_else(|| anyhow::anyhow!("demo world has no open tile to spawn on"))?;
    let mut snake = Snake::new(config.sim.clone(), spawn, 0.0);
    info!(
        "World initialized: {} pedestrians, {} vehicles, {} bonus boxes, {} solid tiles",
        world.population.alive_pedestrians(),
        world.population.alive_vehicles(),
        world.bonuses.alive_count(),
        world.grid.solid_count()
    );

    let tick = Duration::from_millis(demo.tick_interval_ms.max(1));
    let dt = tick.as_secs_f32();
    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut frame = 0u64;
    loop {
        ticker.tick().await;

        let tick_start = std::time::Instant::now();
        world.step(&mut snake, dt);
        let tick_ms = tick_start.elapsed().as_secs_f64() * 1000.0;
        if tick_ms > demo.tick_interval_ms as f64 * 0.9 {
            warn!("Slow tick #{}: {:.3}ms", frame, tick_ms);
        }

        frame += 1;
        if frame % 120 == 0 {
            world.restock_bonuses(demo.bonus_boxes, &mut rng);
        }
        if demo.report_every > 0 && frame % demo.report_every == 0 {
            info!(
                "Frame {}: score {}, length {}, health {:.0}, level {} {:?}, wanted {:.2}, mode {:?}{}, {} pedestrians left",
                frame,
                snake.score,
                snake.length,
                snake.health,
                snake.evolution_level,
                snake.evolution_color(),
                snake.wanted_level,
                snake.mode(),
                if snake.is_idle() { " (idle)" } else { "" },
                world.population.alive_pedestrians()
            );
        }
        if let Some(message) = snake.hud.message() {
            debug!("HUD: {}", message);
        }

        if snake.mode() == Mode::Dead {
            info!("Snake died on frame {}", frame);
            // Let pooled effects and dispatched squads finish.
            let mut settle = 0;
            while snake.effects_busy() && settle < demo.settle_frames {
                ticker.tick().await;
                world.step(&mut snake, dt);
                settle += 1;
            }
            debug!("Effects settled after {} frames", settle);
            break;
        }
        if demo.frames > 0 && frame >= demo.frames {
            break;
        }
    }

    info!(
        "Finished after {} frames: score {}, length {}, level {}, {} shakes",
        frame, snake.score, snake.length, snake.evolution_level, world.camera.requests
    );
    Ok(())
}
