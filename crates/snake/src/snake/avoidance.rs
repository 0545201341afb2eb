//! Wall avoidance and stuck recovery for the head.
//!
//! Avoidance is proactive: the desired heading is bent toward a gap before
//! the head reaches a wall. Recovery is reactive: once the head has barely
//! moved for a grace period it first tries a clear heading, then teleports
//! to the nearest open tile in a ring that widens with repeated failures.

use super::Snake;
use crate::context::FrameContext;
use crate::query::{avoid_walls, clear_direction, escape_tile};
use tracing::debug;

/// Seconds of free movement that clear the failure count.
const FAILURE_RESET: f32 = 1.0;

impl Snake {
    /// Desired heading bent around the first wall ahead, if any.
    pub(super) fn avoid(&self, desired: f32, ctx: &FrameContext<'_>) -> f32 {
        let av = &self.config.avoidance;
        avoid_walls(&*ctx.terrain, self.head, desired, av.look_ahead, av.scan_distance, av.ray_step)
    }

    pub(super) fn check_stuck(&mut self, dt: f32, ctx: &FrameContext<'_>) {
        let av = &self.config.avoidance;
        if self.head.distance(self.prev_head) >= av.stuck_epsilon {
            self.stuck.time = 0.0;
            self.stuck.free_time += dt;
            if self.stuck.free_time >= FAILURE_RESET {
                self.stuck.failures = 0;
                self.stuck.free_time = 0.0;
            }
            return;
        }
        self.stuck.free_time = 0.0;
        self.stuck.time += dt;
        if self.stuck.time <= av.stuck_grace {
            return;
        }
        self.stuck.time = 0.0;

        if let Some(heading) = clear_direction(&*ctx.terrain, self.head, self.heading, av.feeler_len, av.ray_step) {
            debug!(
                "Stuck at ({:.0}, {:.0}), escaping at {:.2} rad",
                self.head.x, self.head.y, heading
            );
            self.heading = heading;
            self.stuck.bounce = av.bounce_time;
            self.stuck.failures += 1;
            return;
        }

        let radius = av.relocate_radius + self.stuck.failures * av.relocate_growth;
        match escape_tile(&*ctx.terrain, self.head, radius, av.feeler_len, av.ray_step) {
            Some(tile) => {
                debug!(
                    "Boxed in at ({:.0}, {:.0}), relocating to ({:.0}, {:.0})",
                    self.head.x, self.head.y, tile.x, tile.y
                );
                self.head = tile;
                self.prev_head = tile;
                let m = &self.config.movement;
                let trail = (self.length as f32 * m.segment_spacing / m.path_spacing).ceil() as usize + 1;
                self.path.rebuild(tile, self.heading, trail);
                self.stuck.failures += 1;
            }
            None => debug!("Boxed in with no open tile within {} tiles", radius),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::bonus::BonusList;
    use crate::config::Config;
    use crate::context::FrameContext;
    use crate::particles::ParticleBuffer;
    use crate::population::Population;
    use crate::snake::{Snake, SnakeInput};
    use crate::world::{TileGrid, TileKind};
    use glam::Vec2;

    #[test]
    fn test_boxed_in_head_relocates() {
        let mut grid = TileGrid::new(30, 30, 16.0);
        // Seal a one-tile cell around the head.
        grid.fill_rect(9, 9, 11, 11, TileKind::Wall);
        grid.set_tile(10, 10, TileKind::Open);
        let mut pop = Population::new();
        let mut particles = ParticleBuffer::new();
        let mut bonuses = BonusList::new();
        let mut ctx = FrameContext::new(&mut grid, &mut pop, &mut particles, &mut bonuses, 0.0);

        let start = Vec2::new(168.0, 168.0);
        let mut snake = Snake::new(Config::default(), start, 0.0);
        let input = SnakeInput::toward(Vec2::new(400.0, 168.0));
        for _ in 0..90 {
            snake.update(1.0 / 60.0, &input, &mut ctx);
        }
        assert!(snake.head.distance(start) > 16.0);
        assert!(!ctx.terrain.is_blocked(snake.head));
    }
}
