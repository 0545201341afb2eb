//! The player snake.
//!
//! [`Snake::update`] is the single per-frame entry point. It runs the active
//! mode (dead, swarm, autopilot or normal), then advances every power-up and
//! strike pool in a fixed order whatever the mode, then applies what those
//! systems reported.

mod avoidance;
mod combat;
mod movement;

pub use movement::PathHistory;

use crate::config::Config;
use crate::context::FrameContext;
use crate::geometry::{vec_heading, wrap_angle};
use crate::powerups::{Arsenal, Modifiers, Outcome, Owner, PowerUp, PowerUpSystem};
use crate::strike::{StrikeKind, StrikeSquads, StrikeState, WindowEnd};
use glam::Vec2;
use tracing::{debug, info};

/// Seconds a HUD message stays up.
const HUD_DURATION: f32 = 2.0;

/// Player input for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SnakeInput {
    /// Cursor position in world pixels.
    pub cursor: Vec2,
    /// Directional input, if any. Takes precedence over the cursor.
    pub direction: Option<Vec2>,
    /// Targeting click this frame.
    pub confirm: Option<Vec2>,
}

impl SnakeInput {
    pub fn toward(cursor: Vec2) -> Self {
        Self {
            cursor,
            ..Self::default()
        }
    }
}

/// Top-level behavior for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Dead,
    /// The body is out hunting as ghosts; the head is frozen.
    Swarm,
    /// Autopilot steers.
    Ai,
    Normal,
}

/// Transient banner text.
#[derive(Debug, Clone, Default)]
pub struct Hud {
    message: Option<String>,
    remaining: f32,
}

impl Hud {
    pub fn show(&mut self, text: impl Into<String>) {
        self.message = Some(text.into());
        self.remaining = HUD_DURATION;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn tick(&mut self, dt: f32) {
        if self.message.is_none() {
            return;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.message = None;
        }
    }
}

/// Stuck detection and escape bookkeeping.
#[derive(Debug, Clone, Copy, Default)]
struct Stuck {
    time: f32,
    free_time: f32,
    failures: i32,
    /// While positive, steering input is ignored.
    bounce: f32,
}

/// The player entity.
#[derive(Debug, Clone)]
pub struct Snake {
    config: Config,
    pub path: PathHistory,
    pub head: Vec2,
    prev_head: Vec2,
    pub heading: f32,
    pub length: u32,
    pub health: f32,
    pub dead: bool,
    pub score: u64,
    pub evolution_points: u32,
    pub evolution_level: u8,
    pub wanted_level: f32,
    /// Seconds since the last kill of any kind.
    since_kill: f32,
    pub streak: u32,
    combo_timer: f32,
    pub hud: Hud,
    idle_anchor: Option<(Vec2, f32)>,
    idle_phase: f32,
    stuck: Stuck,
    autopilot_waypoint: Option<Vec2>,
    pub modifiers: Modifiers,
    pub arsenal: Arsenal,
    pub strike: StrikeState,
    pub squads: StrikeSquads,
}

impl Snake {
    /// Spawn at `head` facing `heading`, with a straight body behind.
    pub fn new(config: Config, head: Vec2, heading: f32) -> Self {
        let m = &config.movement;
        let mut path = PathHistory::new(m.path_capacity, m.path_spacing);
        let trail = (m.start_length as f32 * m.segment_spacing / m.path_spacing).ceil() as usize + 1;
        path.rebuild(head, heading, trail);
        Self {
            path,
            head,
            prev_head: head,
            heading: wrap_angle(heading),
            length: m.start_length,
            health: m.max_health,
            dead: false,
            score: 0,
            evolution_points: 0,
            evolution_level: 0,
            wanted_level: 0.0,
            since_kill: 0.0,
            streak: 0,
            combo_timer: 0.0,
            hud: Hud::default(),
            idle_anchor: None,
            idle_phase: 0.0,
            stuck: Stuck::default(),
            autopilot_waypoint: None,
            modifiers: Modifiers::default(),
            arsenal: Arsenal::default(),
            strike: StrikeState::default(),
            squads: StrikeSquads::default(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        if self.dead {
            Mode::Dead
        } else if self.arsenal.swarm.is_out() {
            Mode::Swarm
        } else if self.modifiers.autopilot.is_active() {
            Mode::Ai
        } else {
            Mode::Normal
        }
    }

    /// Whether the head is tracing its idle figure-8.
    pub fn is_idle(&self) -> bool {
        self.idle_anchor.is_some()
    }

    /// Body length currently out with the swarm.
    pub fn detached_length(&self) -> u32 {
        self.arsenal.swarm.detached_length()
    }

    /// Positions of every body segment, head first.
    pub fn segments(&self) -> Vec<Vec2> {
        let spacing = self.config.movement.segment_spacing;
        (0..self.length)
            .map(|i| self.path.sample(self.head, i as f32 * spacing))
            .collect()
    }

    fn owner(&self) -> Owner<'_> {
        Owner {
            head: self.head,
            prev_head: self.prev_head,
            heading: self.heading,
            speed: self.speed(),
            path: &self.path,
            segment_spacing: self.config.movement.segment_spacing,
            length: self.length,
            alive: !self.dead,
            fire_ring_active: self.arsenal.fire_ring.timer.is_active(),
        }
    }

    /// Advance one frame.
    pub fn update(&mut self, dt: f32, input: &SnakeInput, ctx: &mut FrameContext<'_>) {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.movement.max_dt)
        } else {
            0.0
        };
        self.prev_head = self.head;

        match self.mode() {
            Mode::Dead | Mode::Swarm => {}
            Mode::Ai => {
                self.idle_anchor = None;
                let desired = self.autopilot_heading(ctx);
                self.drive(desired, dt, ctx);
            }
            Mode::Normal => self.update_normal(dt, input, ctx),
        }
        if let Some(point) = input.confirm {
            self.confirm_target(point, ctx);
        }

        self.tick_streak(dt);
        self.hud.tick(dt);
        self.decay_wanted(dt);
        for name in self.modifiers.tick(dt) {
            debug!("{} wore off", name);
        }

        let out = self.run_systems(dt, ctx);
        self.apply_outcome(out);
        self.check_death();
    }

    fn update_normal(&mut self, dt: f32, input: &SnakeInput, ctx: &mut FrameContext<'_>) {
        let direction = input.direction.filter(|d| d.length_squared() > 1e-6);
        let desired = match direction {
            Some(d) => vec_heading(d),
            None => {
                if input.cursor.distance(self.head) <= self.config.movement.idle_radius {
                    self.idle(dt, ctx);
                    return;
                }
                vec_heading(input.cursor - self.head)
            }
        };
        self.idle_anchor = None;
        self.drive(desired, dt, ctx);
    }

    /// One frame of steered movement and everything that follows it.
    fn drive(&mut self, desired: f32, dt: f32, ctx: &mut FrameContext<'_>) {
        if self.stuck.bounce > 0.0 {
            self.stuck.bounce -= dt;
        } else {
            let desired = if self.modifiers.bash.is_active() {
                desired
            } else {
                self.avoid(desired, ctx)
            };
            self.steer(desired, dt);
        }
        self.integrate(dt, ctx);
        self.path.record(self.head);
        self.check_stuck(dt, ctx);

        self.eat(ctx);
        self.ram_vehicles(dt, ctx);
        self.collect_bonuses(ctx);
    }

    /// Advance the power-up pools, the targeting window and the strike
    /// squads, collecting what they report.
    fn run_systems(&mut self, dt: f32, ctx: &mut FrameContext<'_>) -> Outcome {
        let mut out = Outcome::default();
        let owner = Owner {
            head: self.head,
            prev_head: self.prev_head,
            heading: self.heading,
            speed: self.speed(),
            path: &self.path,
            segment_spacing: self.config.movement.segment_spacing,
            length: self.length,
            alive: !self.dead,
            fire_ring_active: self.arsenal.fire_ring.timer.is_active(),
        };
        self.arsenal.update(&owner, ctx, &self.config, dt, &mut out);

        if let Some(end) = self.strike.tick(dt, &self.config.strike) {
            if let WindowEnd::Completed {
                kind: StrikeKind::CarpetBomb,
                markers,
            } = &end
            {
                self.squads.dispatch_carpet(markers, ctx);
            }
            if let Some(message) = end.message() {
                info!("Targeting ended: {}", message);
                self.hud.show(message);
            }
        }

        self.squads.update(&owner, ctx, &self.config, dt, &mut out);
        out
    }

    /// Fold a frame's rewards into the snake.
    pub fn apply_outcome(&mut self, out: Outcome) {
        self.score += out.score;
        for _ in 0..out.streak_kills {
            self.register_kill();
        }
        if out.kills > 0 {
            self.since_kill = 0.0;
        }
        self.raise_wanted(out.wanted);
        if out.length_restored > 0 {
            self.length += out.length_restored;
            debug!("Length restored by {} to {}", out.length_restored, self.length);
        }
        for power in out.collected {
            self.activate(power);
        }
    }

    /// Apply a collected power-up.
    pub fn activate(&mut self, power: PowerUp) {
        if self.dead {
            return;
        }
        let pu = &self.config.powerups;
        match power {
            PowerUp::SpeedBoost => self.modifiers.speed_boost.start(pu.speed_boost_time),
            PowerUp::Berserk => self.modifiers.berserk.start(pu.berserk_time),
            PowerUp::Bash => self.modifiers.bash.start(pu.bash_time),
            PowerUp::Autopilot => {
                self.modifiers.autopilot.start(pu.autopilot_time);
                self.autopilot_waypoint = None;
            }
            PowerUp::Heal => {
                self.health = (self.health + pu.heal_amount).min(self.config.movement.max_health);
            }
            PowerUp::FireRing => self.arsenal.fire_ring.activate(&self.config),
            PowerUp::SpreadBombs => self.arsenal.spread_bombs.activate(&self.config),
            PowerUp::Missiles => self.arsenal.missiles.activate(&self.config),
            PowerUp::Gatling => self.arsenal.gatling.activate(&self.config),
            PowerUp::Vacuum => self.arsenal.vacuum.activate(&self.config),
            PowerUp::BeltBombs => {
                let mut belt = std::mem::take(&mut self.arsenal.belt_bombs);
                belt.lay(&self.owner());
                self.arsenal.belt_bombs = belt;
            }
            PowerUp::Clones => {
                let mut clones = std::mem::take(&mut self.arsenal.clones);
                clones.activate(&self.owner(), &self.config);
                self.arsenal.clones = clones;
            }
            PowerUp::Swarm => {
                let mut swarm = std::mem::take(&mut self.arsenal.swarm);
                let taken = swarm.launch(&self.owner(), &self.config);
                self.arsenal.swarm = swarm;
                if taken == 0 && !self.arsenal.swarm.is_out() {
                    debug!("Swarm not launched at length {}", self.length);
                    return;
                }
                self.length -= taken.min(self.length);
            }
            PowerUp::Strike(kind) => {
                self.strike.begin(kind, &self.config.strike);
                let (_, max) = kind.confirm_range(&self.config.strike);
                self.hud.show(format!("TARGET 0/{max}"));
            }
        }
        info!("Power-up activated: {:?}", power);
    }

    /// Feed a targeting click to the strike state machine.
    pub fn confirm_target(&mut self, point: Vec2, ctx: &FrameContext<'_>) {
        let Some(confirmation) = self.strike.confirm(point, &self.config.strike) else {
            return;
        };
        self.hud.show(confirmation.prompt());
        self.squads.dispatch(&confirmation, ctx, &self.config.strike);
    }

    /// Mark dead once the body is too short or health is gone.
    pub fn check_death(&mut self) {
        if self.dead {
            return;
        }
        if self.length < 3 || self.health <= 0.0 {
            self.dead = true;
            self.strike = StrikeState::Inactive;
            info!(
                "Snake died: length {}, health {:.0}, score {}",
                self.length, self.health, self.score
            );
        }
    }

    /// Whether any power-up or strike entity is still running.
    pub fn effects_busy(&self) -> bool {
        self.arsenal.is_busy() || self.squads.is_busy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_snake_defaults() {
        let snake = Snake::new(Config::default(), Vec2::new(100.0, 100.0), 0.0);
        assert_eq!(snake.length, 10);
        assert_eq!(snake.health, 100.0);
        assert_eq!(snake.mode(), Mode::Normal);
        let segments = snake.segments();
        assert_eq!(segments.len(), 10);
        assert!((segments[9] - Vec2::new(46.0, 100.0)).length() < 1e-3);
    }

    #[test]
    fn test_hud_message_expires() {
        let mut hud = Hud::default();
        hud.show("EVOLVED!");
        hud.tick(1.0);
        assert_eq!(hud.message(), Some("EVOLVED!"));
        hud.tick(1.5);
        assert_eq!(hud.message(), None);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut snake = Snake::new(Config::default(), Vec2::ZERO, 0.0);
        snake.health = 90.0;
        snake.activate(PowerUp::Heal);
        assert_eq!(snake.health, 100.0);
    }

    #[test]
    fn test_death_on_short_body() {
        let mut snake = Snake::new(Config::default(), Vec2::ZERO, 0.0);
        snake.length = 2;
        snake.check_death();
        assert_eq!(snake.mode(), Mode::Dead);
    }

    #[test]
    fn test_swarm_on_short_body_does_nothing() {
        let mut snake = Snake::new(Config::default(), Vec2::new(100.0, 100.0), 0.0);
        snake.length = 5;
        snake.activate(PowerUp::Swarm);
        assert_eq!(snake.mode(), Mode::Normal);
        assert_eq!(snake.length, 5);
        assert_eq!(snake.detached_length(), 0);
        assert!(!snake.effects_busy());
    }

    #[test]
    fn test_effects_busy_while_bombs_tick() {
        let mut snake = Snake::new(Config::default(), Vec2::new(100.0, 100.0), 0.0);
        assert!(!snake.effects_busy());
        snake.activate(PowerUp::BeltBombs);
        assert!(snake.effects_busy());
    }

    #[test]
    fn test_head_collects_bonus_on_update() {
        use crate::bonus::{BonusBox, BonusList};
        use crate::particles::ParticleBuffer;
        use crate::population::Population;
        use crate::world::TileGrid;

        let mut grid = TileGrid::new(40, 40, 16.0);
        let mut pop = Population::new();
        let mut particles = ParticleBuffer::new();
        let mut bonuses = BonusList::new();
        bonuses.boxes.push(BonusBox::new(Vec2::new(106.0, 100.0), PowerUp::SpeedBoost));
        let mut ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0);

        let mut snake = Snake::new(Config::default(), Vec2::new(100.0, 100.0), 0.0);
        snake.update(1.0 / 60.0, &SnakeInput::toward(Vec2::new(300.0, 100.0)), &mut ctx);
        drop(ctx);
        assert!(snake.modifiers.speed_boost.is_active());
        assert!(!bonuses.boxes[0].alive);
    }
}

