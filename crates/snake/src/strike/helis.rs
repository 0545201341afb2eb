//! Helicopter squads: fly in from the nearest edge, circle the target point
//! firing, then leave.

use super::{far_outside, nearest_edge};
use crate::context::FrameContext;
use crate::explosion::explode;
use crate::geometry::{heading_vec, point_segment_distance, steer_toward, vec_heading};
use crate::pool::{drain_expired, sweep, Keep};
use crate::powerups::{rewards, Outcome};
use glam::Vec2;
use std::f32::consts::TAU;
use tracing::debug;

const SQUAD_SIZE: usize = 3;
const SQUAD_SPACING: f32 = 40.0;
const CRUISE_SPEED: f32 = 180.0;
const EXIT_SPEED: f32 = 220.0;
const EXIT_TIME: f32 = 5.0;
const TURN_RATE: f32 = 4.0;
const CIRCLE_RADIUS: f32 = 60.0;
/// Inbound helis start attacking this far outside the circle.
const ARRIVE_SLACK: f32 = 20.0;
/// Angular speed while circling, rad/s.
const CIRCLE_SPEED: f32 = CRUISE_SPEED / CIRCLE_RADIUS;

const GUN_INTERVAL: f32 = 0.25;
const GUN_RANGE: f32 = 180.0;
const SHOT_SPEED: f32 = 500.0;
const SHOT_LIFE: f32 = 0.6;
const SHOT_KILL_RADIUS: f32 = 5.0;

const MISSILE_INTERVAL: f32 = 1.2;
const MISSILE_SPEED: f32 = 260.0;
const MISSILE_LIFE: f32 = 2.5;
const MISSILE_RADIUS: f32 = 26.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeliWeapon {
    Gun,
    Missile,
}

impl HeliWeapon {
    fn interval(self) -> f32 {
        match self {
            HeliWeapon::Gun => GUN_INTERVAL,
            HeliWeapon::Missile => MISSILE_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeliPhase {
    /// Flying to the circle around the target.
    Inbound,
    /// Circling and firing; seconds left.
    Attack(f32),
    /// Leaving; seconds before removal.
    Exit(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrikeHeli {
    pub pos: Vec2,
    pub heading: f32,
    pub target: Vec2,
    pub weapon: HeliWeapon,
    pub phase: HeliPhase,
    /// Angle on the attack circle.
    pub orbit: f32,
    attack_window: f32,
    cooldown: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeliShot {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeliMissile {
    pub pos: Vec2,
    pub target: Vec2,
    pub life: f32,
}

/// A squad entering from the world edge nearest to `point`, spread along
/// that edge and spaced around the attack circle.
pub fn spawn_heli_squad(point: Vec2, weapon: HeliWeapon, bounds: Vec2, attack_window: f32) -> Vec<StrikeHeli> {
    let (edge, inward) = nearest_edge(point, bounds);
    let along = heading_vec(inward).perp();
    let mid = (SQUAD_SIZE as f32 - 1.0) / 2.0;
    (0..SQUAD_SIZE)
        .map(|i| {
            let offset = (i as f32 - mid) * SQUAD_SPACING;
            StrikeHeli {
                pos: edge + along * offset,
                heading: inward,
                target: point,
                weapon,
                phase: HeliPhase::Inbound,
                orbit: inward + std::f32::consts::PI + i as f32 * TAU / SQUAD_SIZE as f32,
                attack_window,
                cooldown: i as f32 * weapon.interval() / SQUAD_SIZE as f32,
            }
        })
        .collect()
}

impl StrikeHeli {
    fn circle_point(&self) -> Vec2 {
        self.target + heading_vec(self.orbit) * CIRCLE_RADIUS
    }

    fn fly_toward(&mut self, goal: Vec2, speed: f32, dt: f32) {
        let to_goal = goal - self.pos;
        if to_goal.length_squared() > 1.0 {
            self.heading = steer_toward(self.heading, vec_heading(to_goal), TURN_RATE * dt);
        }
        self.pos += heading_vec(self.heading) * (speed * dt).min(to_goal.length());
    }

    /// Advance one frame. Returns false once the heli has left.
    fn fly(
        &mut self,
        ctx: &FrameContext<'_>,
        shots: &mut Vec<HeliShot>,
        missiles: &mut Vec<HeliMissile>,
        dt: f32,
    ) -> bool {
        match self.phase {
            HeliPhase::Inbound => {
                let goal = self.circle_point();
                self.fly_toward(goal, CRUISE_SPEED, dt);
                if self.pos.distance(self.target) <= CIRCLE_RADIUS + ARRIVE_SLACK {
                    self.phase = HeliPhase::Attack(self.attack_window);
                }
                true
            }
            HeliPhase::Attack(remaining) => {
                self.orbit = (self.orbit + CIRCLE_SPEED * dt).rem_euclid(TAU);
                let goal = self.circle_point();
                self.fly_toward(goal, CRUISE_SPEED * 1.2, dt);
                self.fire(ctx, shots, missiles, dt);

                let remaining = remaining - dt;
                self.phase = if remaining > 0.0 {
                    HeliPhase::Attack(remaining)
                } else {
                    self.heading = vec_heading(self.pos - self.target);
                    HeliPhase::Exit(EXIT_TIME)
                };
                true
            }
            HeliPhase::Exit(remaining) => {
                self.pos += heading_vec(self.heading) * EXIT_SPEED * dt;
                let remaining = remaining - dt;
                self.phase = HeliPhase::Exit(remaining);
                remaining > 0.0 && !far_outside(&*ctx.terrain, self.pos, 0.0)
            }
        }
    }

    fn fire(&mut self, ctx: &FrameContext<'_>, shots: &mut Vec<HeliShot>, missiles: &mut Vec<HeliMissile>, dt: f32) {
        self.cooldown -= dt;
        if self.cooldown > 0.0 {
            return;
        }
        let pop = &*ctx.population;
        let target = pop
            .nearest_pedestrian(self.pos, GUN_RANGE)
            .map(|i| pop.pedestrians[i].pos)
            .or_else(|| pop.nearest_vehicle(self.pos, GUN_RANGE).map(|i| pop.vehicles[i].pos));
        let Some(target) = target else {
            return;
        };
        self.cooldown = self.weapon.interval();

        let dir = (target - self.pos).normalize_or_zero();
        match self.weapon {
            HeliWeapon::Gun => shots.push(HeliShot {
                pos: self.pos,
                vel: dir * SHOT_SPEED,
                life: SHOT_LIFE,
            }),
            HeliWeapon::Missile => missiles.push(HeliMissile {
                pos: self.pos,
                target,
                life: MISSILE_LIFE,
            }),
        }
    }
}

pub(super) fn update(
    helis: &mut Vec<StrikeHeli>,
    shots: &mut Vec<HeliShot>,
    missiles: &mut Vec<HeliMissile>,
    ctx: &mut FrameContext<'_>,
    dt: f32,
    out: &mut Outcome,
) {
    sweep(helis, |_, heli| Keep::from_alive(heli.fly(ctx, shots, missiles, dt)));

    sweep(shots, |_, shot| {
        let from = shot.pos;
        shot.pos += shot.vel * dt;
        shot.life -= dt;
        let hit = ctx
            .population
            .pedestrians
            .iter_mut()
            .find(|p| p.alive && point_segment_distance(p.pos, from, shot.pos) <= SHOT_KILL_RADIUS);
        if let Some(ped) = hit {
            ped.alive = false;
            ped.health = 0.0;
            let pos = ped.pos;
            ctx.particles.blood(pos, 4);
            out.kills += 1;
            out.score += rewards::STRIKE_KILL;
            return Keep::Remove;
        }
        Keep::from_alive(shot.life > 0.0)
    });

    // Missiles that run out of life before reaching the target fizzle.
    let spent = drain_expired(missiles, |m| {
        let to_target = m.target - m.pos;
        let step = MISSILE_SPEED * dt;
        m.life -= dt;
        if to_target.length() <= step {
            m.pos = m.target;
            return Keep::Remove;
        }
        m.pos += to_target.normalize_or_zero() * step;
        Keep::from_alive(m.life > 0.0)
    });
    for missile in spent.into_iter().filter(|m| m.pos == m.target) {
        let kills = explode(ctx, missile.pos, MISSILE_RADIUS);
        debug!("Heli missile hit ({:.0}, {:.0}), {} kills", missile.pos.x, missile.pos.y, kills);
        out.blast(kills);
    }
}
