//! Steering, idle animation and forward integration.

use super::Snake;
use crate::context::FrameContext;
use crate::geometry::{heading_vec, lemniscate, steer_toward, vec_heading};
use crate::particles::{burst, ParticleKind};
use crate::world::Color;
use glam::Vec2;
use std::collections::VecDeque;

/// Trail of recent head positions, most recent first.
#[derive(Debug, Clone, PartialEq)]
pub struct PathHistory {
    points: VecDeque<Vec2>,
    capacity: usize,
    spacing: f32,
}

impl PathHistory {
    /// Create an empty history holding at most `capacity` points recorded
    /// at least `spacing` pixels apart.
    pub fn new(capacity: usize, spacing: f32) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity: capacity.max(2),
            spacing,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = &Vec2> {
        self.points.iter()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Push `head` to the front once it is far enough from the last point.
    /// Returns true if a point was recorded.
    pub fn record(&mut self, head: Vec2) -> bool {
        if self
            .points
            .front()
            .is_some_and(|last| last.distance_squared(head) < self.spacing * self.spacing)
        {
            return false;
        }
        self.points.push_front(head);
        self.points.truncate(self.capacity);
        true
    }

    /// Point at arc length `distance` behind `head`, following the trail.
    /// Past the end of the trail, the oldest point.
    pub fn sample(&self, head: Vec2, distance: f32) -> Vec2 {
        let mut remaining = distance.max(0.0);
        let mut prev = head;
        for &p in &self.points {
            let seg = p.distance(prev);
            if remaining <= seg {
                if seg <= f32::EPSILON {
                    return p;
                }
                return prev.lerp(p, remaining / seg);
            }
            remaining -= seg;
            prev = p;
        }
        prev
    }

    /// Replace the trail with a straight line of `count` points behind
    /// `head`, opposite to `heading`.
    pub fn rebuild(&mut self, head: Vec2, heading: f32, count: usize) {
        let back = -heading_vec(heading) * self.spacing;
        self.points.clear();
        self.points
            .extend((0..count.min(self.capacity)).map(|i| head + back * i as f32));
    }
}

impl Snake {
    /// Turn toward `target` by at most the configured turn rate.
    pub fn steer(&mut self, target: f32, dt: f32) {
        self.heading = steer_toward(self.heading, target, self.config.movement.turn_rate * dt);
    }

    /// Effective speed with every active multiplier applied.
    pub fn speed(&self) -> f32 {
        let evolution = 1.0 + 0.08 * f32::from(self.evolution_level);
        self.config.movement.base_speed * evolution * self.modifiers.speed_multiplier()
    }

    /// Trace the figure-8 around the idle anchor. The anchor is placed on
    /// entry so the curve starts at the current head. The curve is clamped
    /// to the map and holds where it would enter a blocked tile.
    pub(super) fn idle(&mut self, dt: f32, ctx: &FrameContext<'_>) {
        let amplitude = self.config.movement.idle_amplitude;
        let (anchor, facing) = match self.idle_anchor {
            Some(anchor) => anchor,
            None => {
                self.idle_phase = 0.0;
                let facing = self.heading;
                let start = Vec2::from_angle(facing).rotate(lemniscate(0.0, amplitude));
                let anchor = (self.head - start, facing);
                self.idle_anchor = Some(anchor);
                anchor
            }
        };
        self.idle_phase += self.config.movement.idle_frequency * dt;
        let bounds = ctx.terrain.bounds();
        let next = (anchor + Vec2::from_angle(facing).rotate(lemniscate(self.idle_phase, amplitude)))
            .clamp(Vec2::ZERO, (bounds - Vec2::splat(0.01)).max(Vec2::ZERO));
        if ctx.terrain.is_blocked(next) {
            return;
        }
        let delta = next - self.head;
        if delta.length_squared() > 1e-6 {
            self.heading = vec_heading(delta);
        }
        self.head = next;
    }

    /// Move along the heading, sub-stepped so no step skips a tile. Blocked
    /// steps slide along one axis or stop, unless bash is active.
    pub(super) fn integrate(&mut self, dt: f32, ctx: &mut FrameContext<'_>) {
        let travel = self.speed() * dt;
        if travel <= 0.0 {
            return;
        }
        let max_step = (ctx.terrain.tile_size() * 0.5).max(1.0);
        let steps = (travel / max_step).ceil().max(1.0) as usize;
        let step = heading_vec(self.heading) * (travel / steps as f32);
        let bashing = self.modifiers.bash.is_active();
        let mut smashed = false;

        for _ in 0..steps {
            let candidate = self.head + step;
            if bashing {
                if ctx.terrain.in_bounds(candidate) && ctx.terrain.is_blocked(candidate) && !smashed {
                    smashed = true;
                    burst(&mut *ctx.particles, candidate, 6, ParticleKind::Debris, Color::DEBRIS, 60.0);
                    ctx.shake(1.5, 0.1);
                }
                self.head = candidate;
                continue;
            }
            if !ctx.terrain.is_blocked(candidate) {
                self.head = candidate;
                continue;
            }
            let slide_x = self.head + Vec2::new(step.x, 0.0);
            let slide_y = self.head + Vec2::new(0.0, step.y);
            if step.x != 0.0 && !ctx.terrain.is_blocked(slide_x) {
                self.head = slide_x;
            } else if step.y != 0.0 && !ctx.terrain.is_blocked(slide_y) {
                self.head = slide_y;
            } else {
                break;
            }
        }

        let bounds = ctx.terrain.bounds();
        self.head = self.head.clamp(Vec2::ZERO, (bounds - Vec2::splat(0.01)).max(Vec2::ZERO));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::BonusList;
    use crate::config::Config;
    use crate::particles::ParticleBuffer;
    use crate::population::{Pedestrian, Population};
    use crate::snake::SnakeInput;
    use crate::world::{Terrain, TileGrid, TileKind};

    const DT: f32 = 1.0 / 60.0;

    /// Run `frames` idle frames with the cursor on the head, calling `check`
    /// after each one.
    fn idle_for(grid: &mut TileGrid, snake: &mut Snake, frames: usize, mut check: impl FnMut(&Snake, &TileGrid)) {
        let mut pop = Population::new();
        let mut particles = ParticleBuffer::new();
        let mut bonuses = BonusList::new();
        for _ in 0..frames {
            let input = SnakeInput::toward(snake.head);
            let mut ctx = FrameContext::new(&mut *grid, &mut pop, &mut particles, &mut bonuses, 0.0);
            snake.update(DT, &input, &mut ctx);
            drop(ctx);
            check(&*snake, &*grid);
        }
    }

    #[test]
    fn test_record_respects_spacing_and_capacity() {
        let mut path = PathHistory::new(4, 2.0);
        assert!(path.record(Vec2::ZERO));
        assert!(!path.record(Vec2::new(1.0, 0.0)));
        for i in 1..10 {
            path.record(Vec2::new(i as f32 * 2.0, 0.0));
        }
        assert_eq!(path.len(), 4);
        assert_eq!(path.points().next(), Some(&Vec2::new(18.0, 0.0)));
    }

    #[test]
    fn test_sample_walks_the_trail() {
        let mut path = PathHistory::new(16, 2.0);
        // An L-shaped trail: head at (0, 10), corner at origin, tail at (10, 0).
        path.record(Vec2::new(10.0, 0.0));
        path.record(Vec2::ZERO);
        path.record(Vec2::new(0.0, 10.0));
        let head = Vec2::new(0.0, 10.0);
        assert_eq!(path.sample(head, 0.0), head);
        assert!(path.sample(head, 5.0).distance(Vec2::new(0.0, 5.0)) < 1e-4);
        assert!(path.sample(head, 15.0).distance(Vec2::new(5.0, 0.0)) < 1e-4);
        assert_eq!(path.sample(head, 100.0), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_rebuild_lays_straight_trail() {
        let mut path = PathHistory::new(8, 2.0);
        path.rebuild(Vec2::new(50.0, 50.0), 0.0, 20);
        assert_eq!(path.len(), 8);
        let last = path.points().last().copied().unwrap();
        assert!((last - Vec2::new(36.0, 50.0)).length() < 1e-4);
    }

    #[test]
    fn test_idle_stays_inside_map_edge() {
        let mut grid = TileGrid::new(30, 30, 16.0);
        let mut snake = Snake::new(Config::default(), Vec2::new(100.0, 1.0), 0.0);
        idle_for(&mut grid, &mut snake, 240, |snake, grid| {
            assert!(snake.is_idle());
            assert!(grid.in_bounds(snake.head), "head left the map at {:?}", snake.head);
        });
    }

    #[test]
    fn test_idle_holds_at_wall_row() {
        let mut grid = TileGrid::new(30, 30, 16.0);
        grid.fill_rect(0, 5, 29, 5, TileKind::Wall);
        let start = Vec2::new(100.0, 97.0);
        let mut snake = Snake::new(Config::default(), start, 0.0);
        let mut moved = false;
        idle_for(&mut grid, &mut snake, 240, |snake, grid| {
            assert!(!grid.is_blocked(snake.head), "head entered a wall at {:?}", snake.head);
            moved |= snake.head.distance(start) > 1.0;
        });
        assert!(moved);
    }

    #[test]
    fn test_idle_frame_skips_eating_and_recording() {
        let mut grid = TileGrid::new(30, 30, 16.0);
        let mut pop = Population::new();
        pop.pedestrians.push(Pedestrian::new(Vec2::new(100.0, 100.0)));
        let mut particles = ParticleBuffer::new();
        let mut bonuses = BonusList::new();
        let mut ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0);

        let mut snake = Snake::new(Config::default(), Vec2::new(100.0, 100.0), 0.0);
        let trail = snake.path.len();
        let front = snake.path.points().next().copied();
        for _ in 0..30 {
            snake.update(DT, &SnakeInput::toward(snake.head), &mut ctx);
        }
        assert!(snake.is_idle());
        assert_eq!(snake.path.len(), trail);
        assert_eq!(snake.path.points().next().copied(), front);
        assert_eq!(snake.score, 0);
        assert_eq!(snake.length, 10);
        assert_eq!(snake.stuck.time, 0.0);
        assert_eq!(ctx.population.alive_pedestrians(), 1);
    }
}
