//! Eating, ramming, damage, kill streaks, evolution and the wanted level.

use super::Snake;
use crate::bonus::boxes_hit;
use crate::context::FrameContext;
use crate::explosion::destroy_vehicle;
use crate::geometry::vec_heading;
use crate::particles::{burst, ParticleKind};
use crate::population::PedState;
use crate::powerups::rewards;
use crate::rng::{random_direction, tags, EffectSeed};
use crate::world::Color;
use glam::Vec2;
use rand::Rng;
use tracing::{debug, info};

/// Evolution points needed for each level.
pub const EVOLUTION_THRESHOLDS: [u32; 6] = [0, 10, 30, 60, 100, 160];

/// Display color per evolution level.
pub const EVOLUTION_COLORS: [Color; 6] = [
    Color::new(90, 200, 90),
    Color::new(80, 190, 200),
    Color::new(90, 110, 230),
    Color::new(170, 90, 220),
    Color::new(230, 160, 40),
    Color::new(240, 60, 50),
];

/// Kill-streak milestones: (streak, bonus, banner).
const STREAK_MILESTONES: [(u32, u64, &str); 5] = [
    (2, 100, "DOUBLE KILL"),
    (3, 250, "TRIPLE KILL"),
    (5, 500, "RAMPAGE"),
    (10, 1000, "UNSTOPPABLE"),
    (20, 2500, "GODLIKE"),
];

const ARMED_DAMAGE: f32 = 5.0;
const INFECTED_DAMAGE: f32 = 10.0;
const INFECTED_SHRINK: u32 = 3;
const VOMIT_PARTICLES: usize = 12;

const RAM_WANTED: f32 = 0.25;
const RAM_WANTED_PER_KILL: f32 = 0.05;
const AUTHORITY_WANTED: f32 = 0.25;

const AUTOPILOT_RANGE: f32 = 240.0;
const AUTOPILOT_WANDER: f32 = 160.0;
const AUTOPILOT_REACHED: f32 = 16.0;

/// Rewards for eating one pedestrian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Meal {
    score: u64,
    growth: u32,
    evolution: u32,
}

impl Snake {
    /// Pedestrian eat radius at the current level.
    pub fn eat_radius(&self) -> f32 {
        8.0 + 1.5 * f32::from(self.evolution_level)
    }

    pub fn evolution_color(&self) -> Color {
        EVOLUTION_COLORS[usize::from(self.evolution_level).min(EVOLUTION_COLORS.len() - 1)]
    }

    pub(super) fn eat(&mut self, ctx: &mut FrameContext<'_>) {
        let r_sq = self.eat_radius().powi(2);
        for i in 0..ctx.population.pedestrians.len() {
            let ped = &mut ctx.population.pedestrians[i];
            if !ped.alive || ped.pos.distance_squared(self.head) > r_sq {
                continue;
            }
            ped.alive = false;
            ped.health = 0.0;
            let (pos, state, armed) = (ped.pos, ped.state, ped.armed);

            if state == PedState::Infected {
                self.length = self.length.saturating_sub(INFECTED_SHRINK);
                self.take_damage(INFECTED_DAMAGE);
                burst(&mut *ctx.particles, pos, VOMIT_PARTICLES, ParticleKind::Vomit, Color::VOMIT, 50.0);
                ctx.terrain.paint_temp(pos, Color::VOMIT, 4.0);
                debug!("Ate an infected pedestrian, length now {}", self.length);
                continue;
            }

            let meal = match (state, armed) {
                (PedState::Hostile, _) => Meal { score: 200, growth: 3, evolution: 3 },
                (_, true) => Meal { score: 150, growth: 2, evolution: 2 },
                _ => Meal { score: 100, growth: 2, evolution: 1 },
            };
            if armed {
                self.take_damage(ARMED_DAMAGE);
            }
            ctx.particles.blood(pos, 8);
            self.score += meal.score;
            self.length += meal.growth;
            self.add_evolution(meal.evolution);
            self.register_kill();
        }
    }

    /// Count a streak kill and pay out any milestone.
    pub fn register_kill(&mut self) {
        self.streak = if self.combo_timer > 0.0 { self.streak + 1 } else { 1 };
        self.combo_timer = self.config.combat.combo_window;
        self.since_kill = 0.0;

        if let Some(&(_, bonus, banner)) = STREAK_MILESTONES.iter().find(|(n, _, _)| *n == self.streak) {
            self.score += bonus;
            self.hud.show(banner);
            info!("{} (+{})", banner, bonus);
        }
    }

    pub(super) fn tick_streak(&mut self, dt: f32) {
        if self.combo_timer <= 0.0 {
            return;
        }
        self.combo_timer -= dt;
        if self.combo_timer <= 0.0 {
            self.combo_timer = 0.0;
            self.streak = 0;
        }
    }

    /// Add evolution points and level up as thresholds are crossed.
    pub fn add_evolution(&mut self, points: u32) {
        self.evolution_points += points;
        let level = EVOLUTION_THRESHOLDS
            .iter()
            .rposition(|&t| self.evolution_points >= t)
            .unwrap_or(0) as u8;
        if level > self.evolution_level {
            self.evolution_level = level;
            self.hud.show("EVOLVED!");
            info!("Evolved to level {}", level);
        }
    }

    /// Damage the snake. Berserk halves it; health never drops below zero.
    pub fn take_damage(&mut self, amount: f32) {
        if self.dead || amount <= 0.0 {
            return;
        }
        let amount = if self.modifiers.berserk.is_active() { amount * 0.5 } else { amount };
        self.health = (self.health - amount).max(0.0);
    }

    pub(super) fn raise_wanted(&mut self, amount: f32) {
        self.wanted_level = (self.wanted_level + amount).clamp(0.0, self.config.combat.wanted_max);
    }

    pub(super) fn decay_wanted(&mut self, dt: f32) {
        self.since_kill += dt;
        if self.since_kill > self.config.combat.wanted_cooldown {
            let decayed = self.wanted_level - self.config.combat.wanted_decay * dt;
            self.wanted_level = decayed.clamp(0.0, self.config.combat.wanted_max);
        }
    }

    /// Destroy vehicles the head rams into, or take contact damage from the
    /// ones too strong to ram.
    pub(super) fn ram_vehicles(&mut self, dt: f32, ctx: &mut FrameContext<'_>) {
        let level = self.evolution_level;
        let berserk = self.modifiers.berserk.is_active();
        for i in 0..ctx.population.vehicles.len() {
            let v = &ctx.population.vehicles[i];
            if !v.alive {
                continue;
            }
            let kind = v.kind;
            let reach = kind.ram_radius() + 2.0 * f32::from(level);
            if v.pos.distance_squared(self.head) > reach * reach {
                continue;
            }
            let min_level = if berserk { 0 } else { kind.min_level() };
            if level < min_level {
                self.take_damage(self.config.combat.contact_damage * dt);
                continue;
            }
            let Some(kills) = destroy_vehicle(ctx, i) else {
                continue;
            };
            self.score += kind.score() + u64::from(kills) * rewards::EXPLOSION_KILL;
            let mut wanted = RAM_WANTED + RAM_WANTED_PER_KILL * kills as f32;
            if kind.is_authority() {
                wanted += AUTHORITY_WANTED;
            }
            self.raise_wanted(wanted);
            self.register_kill();
            info!("Rammed a {:?}: {} blast kills", kind, kills);
        }
    }

    pub(super) fn collect_bonuses(&mut self, ctx: &mut FrameContext<'_>) {
        let hits = boxes_hit(&*ctx.bonuses, self.head, self.prev_head, self.heading, &self.config.combat);
        for i in hits {
            if let Some(power) = ctx.bonuses.collect(i, self.head) {
                self.activate(power);
            }
        }
    }

    /// Autopilot heading: the nearest pedestrian or bonus box in range,
    /// else a seeded wander point.
    pub(super) fn autopilot_heading(&mut self, ctx: &FrameContext<'_>) -> f32 {
        let range_sq = AUTOPILOT_RANGE * AUTOPILOT_RANGE;
        let ped = ctx
            .population
            .nearest_pedestrian(self.head, AUTOPILOT_RANGE)
            .map(|i| ctx.population.pedestrians[i].pos);
        let bonus = ctx
            .bonuses
            .boxes()
            .iter()
            .filter(|b| b.alive && b.pos.distance_squared(self.head) <= range_sq)
            .map(|b| b.pos)
            .min_by(|a, b| a.distance_squared(self.head).total_cmp(&b.distance_squared(self.head)));
        let target = match (ped, bonus) {
            (Some(p), Some(b)) => Some(if p.distance_squared(self.head) <= b.distance_squared(self.head) { p } else { b }),
            (p, b) => p.or(b),
        };
        if let Some(target) = target {
            self.autopilot_waypoint = None;
            return vec_heading(target - self.head);
        }

        if self
            .autopilot_waypoint
            .is_none_or(|w| w.distance(self.head) <= AUTOPILOT_REACHED)
        {
            let mut rng = EffectSeed::new(tags::AUTOPILOT)
                .with_pos(self.head)
                .with_f32(ctx.time)
                .rng();
            let bounds = ctx.terrain.bounds();
            let point = self.head + random_direction(&mut rng) * rng.random_range(AUTOPILOT_REACHED..AUTOPILOT_WANDER);
            self.autopilot_waypoint = Some(point.clamp(Vec2::ZERO, bounds));
        }
        self.autopilot_waypoint
            .map_or(self.heading, |w| vec_heading(w - self.head))
    }
}
