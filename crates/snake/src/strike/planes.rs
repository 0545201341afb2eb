//! Bombing runs. A plane flies a straight leg through each drop point and
//! releases a bomb as it passes; bombs fall on a short fuse.

use super::far_outside;
use crate::context::FrameContext;
use crate::explosion::explode;
use crate::geometry::{heading_vec, vec_heading};
use crate::pool::{drain_expired, sweep, Keep};
use crate::powerups::Outcome;
use crate::rng::{effect_rng, tags};
use glam::Vec2;
use rand::Rng;
use std::collections::VecDeque;
use std::f32::consts::TAU;

const SPEED: f32 = 300.0;
/// Planes spawn and despawn this far outside the world.
const MARGIN: f32 = 64.0;
const BOMB_FUSE: f32 = 0.4;
const BOMB_RADIUS: f32 = 30.0;

const CARPET_STICK: usize = 5;
const CARPET_SPACING: f32 = 16.0;
const AIR_SUPPORT_STICK: usize = 6;
const AIR_SUPPORT_SPACING: f32 = 24.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StrikePlane {
    pub pos: Vec2,
    pub heading: f32,
    /// Remaining drop points, in flight order.
    pub drops: VecDeque<Vec2>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneBomb {
    pub pos: Vec2,
    pub fuse: f32,
}

/// `count` points spaced along `dir`, centered on `center`.
fn stick(center: Vec2, dir: Vec2, count: usize, spacing: f32) -> impl Iterator<Item = Vec2> {
    let mid = (count as f32 - 1.0) / 2.0;
    (0..count).map(move |k| center + dir * (k as f32 - mid) * spacing)
}

impl StrikePlane {
    /// A run through every marker in order, a short stick of bombs around
    /// each. The plane enters along the first leg from outside the world.
    pub fn carpet(markers: &[Vec2], bounds: Vec2) -> Self {
        let first = markers.first().copied().unwrap_or(bounds / 2.0);
        let approach = match markers.get(1) {
            Some(next) if next.distance_squared(first) > 1.0 => (*next - first).normalize(),
            _ => (first - bounds / 2.0).normalize_or(Vec2::X),
        };
        let start = first - approach * (bounds.length() + MARGIN);

        let mut drops = VecDeque::new();
        let mut from = start;
        for &marker in markers {
            let dir = (marker - from).normalize_or(approach);
            drops.extend(stick(marker, dir, CARPET_STICK, CARPET_SPACING));
            from = marker;
        }
        Self {
            pos: start,
            heading: vec_heading(approach),
            drops,
        }
    }

    /// A single pass over `point` on a seeded heading.
    pub fn air_support(point: Vec2, bounds: Vec2, time: f32, counter: u64) -> Self {
        let mut rng = effect_rng(tags::AIR_SUPPORT, point, time, counter);
        let heading = rng.random_range(0.0..TAU);
        let dir = heading_vec(heading);
        Self {
            pos: point - dir * (bounds.length() + MARGIN),
            heading,
            drops: stick(point, dir, AIR_SUPPORT_STICK, AIR_SUPPORT_SPACING).collect(),
        }
    }

    /// Advance one frame, releasing bombs over passed drop points. Returns
    /// false once every bomb is away and the plane has left the world.
    fn fly(&mut self, ctx: &FrameContext<'_>, bombs: &mut Vec<PlaneBomb>, dt: f32) -> bool {
        let mut travel = SPEED * dt;
        while let Some(&next) = self.drops.front() {
            let to_next = next - self.pos;
            let dist = to_next.length();
            if dist > travel {
                self.heading = vec_heading(to_next);
                break;
            }
            self.pos = next;
            travel -= dist;
            bombs.push(PlaneBomb {
                pos: next,
                fuse: BOMB_FUSE,
            });
            self.drops.pop_front();
        }
        self.pos += heading_vec(self.heading) * travel;
        !(self.drops.is_empty() && far_outside(&*ctx.terrain, self.pos, MARGIN))
    }
}

pub(super) fn update(planes: &mut Vec<StrikePlane>, bombs: &mut Vec<PlaneBomb>, ctx: &FrameContext<'_>, dt: f32) {
    sweep(planes, |_, plane| Keep::from_alive(plane.fly(ctx, bombs, dt)));
}

pub(super) fn update_bombs(bombs: &mut Vec<PlaneBomb>, ctx: &mut FrameContext<'_>, dt: f32, out: &mut Outcome) {
    let landed = drain_expired(bombs, |bomb| {
        bomb.fuse -= dt;
        Keep::from_alive(bomb.fuse > 0.0)
    });
    for bomb in landed {
        out.blast(explode(ctx, bomb.pos, BOMB_RADIUS));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::BonusList;
    use crate::particles::ParticleBuffer;
    use crate::population::Population;
    use crate::world::TileGrid;

    #[test]
    fn test_carpet_drops_stick_per_marker() {
        let markers = [Vec2::new(100.0, 100.0), Vec2::new(200.0, 100.0), Vec2::new(300.0, 150.0)];
        let plane = StrikePlane::carpet(&markers, Vec2::new(640.0, 480.0));
        assert_eq!(plane.drops.len(), markers.len() * CARPET_STICK);
        // Middle bomb of each stick sits on its marker.
        assert_eq!(plane.drops[2], markers[0]);
        assert_eq!(plane.drops[7], markers[1]);
    }

    #[test]
    fn test_air_support_seeded() {
        let bounds = Vec2::new(640.0, 480.0);
        let a = StrikePlane::air_support(Vec2::new(300.0, 200.0), bounds, 4.0, 1);
        let b = StrikePlane::air_support(Vec2::new(300.0, 200.0), bounds, 4.0, 1);
        assert_eq!(a, b);
        assert_eq!(a.drops.len(), AIR_SUPPORT_STICK);
    }

    #[test]
    fn test_plane_drops_everything_then_leaves() {
        let mut grid = TileGrid::new(40, 30, 16.0);
        let mut pop = Population::new();
        let mut particles = ParticleBuffer::new();
        let mut bonuses = BonusList::new();
        let mut ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0);

        let mut planes = vec![StrikePlane::air_support(Vec2::new(320.0, 240.0), ctx.terrain.bounds(), 0.0, 0)];
        let mut bombs = Vec::new();
        let mut dropped = 0;
        let mut out = Outcome::default();
        for _ in 0..1000 {
            update(&mut planes, &mut bombs, &ctx, 0.02);
            dropped = dropped.max(bombs.len());
            update_bombs(&mut bombs, &mut ctx, 0.02, &mut out);
            if planes.is_empty() {
                break;
            }
        }
        assert!(planes.is_empty());
        assert!(dropped > 0);
    }
}
