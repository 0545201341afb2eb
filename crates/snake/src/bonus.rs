//! Bonus boxes and the hit test used to pick them up.

use crate::config::CombatConfig;
use crate::geometry::{in_heading_box, point_segment_distance};
use crate::powerups::PowerUp;
use glam::Vec2;

#[derive(Debug, Clone)]
pub struct BonusBox {
    pub pos: Vec2,
    pub alive: bool,
    pub kind: PowerUp,
}

impl BonusBox {
    pub fn new(pos: Vec2, kind: PowerUp) -> Self {
        Self {
            pos,
            alive: true,
            kind,
        }
    }
}

/// The bonus system as seen by the core.
pub trait BonusField {
    fn boxes(&self) -> &[BonusBox];

    /// Collect the box at `index` on behalf of an entity standing at `at`.
    /// Returns the granted power-up, or `None` if the box was already gone.
    fn collect(&mut self, index: usize, at: Vec2) -> Option<PowerUp>;
}

/// Vec-backed bonus field.
#[derive(Debug, Default)]
pub struct BonusList {
    pub boxes: Vec<BonusBox>,
    /// Where each collected box was picked up from.
    pub collected_at: Vec<Vec2>,
}

impl BonusList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alive_count(&self) -> usize {
        self.boxes.iter().filter(|b| b.alive).count()
    }
}

impl BonusField for BonusList {
    fn boxes(&self) -> &[BonusBox] {
        &self.boxes
    }

    fn collect(&mut self, index: usize, at: Vec2) -> Option<PowerUp> {
        let bonus = self.boxes.get_mut(index)?;
        if !bonus.alive {
            return None;
        }
        bonus.alive = false;
        self.collected_at.push(at);
        Some(bonus.kind)
    }
}

/// Forgiving pickup test: plain radius, the heading-aligned orbit box, or
/// the segment swept since last frame. Fast circling near a box still
/// registers.
pub fn pickup_hit(
    box_pos: Vec2,
    pos: Vec2,
    prev_pos: Vec2,
    heading: f32,
    config: &CombatConfig,
) -> bool {
    let r = config.pickup_radius;
    box_pos.distance_squared(pos) <= r * r
        || in_heading_box(box_pos, pos, heading, config.orbit_reach, config.orbit_half_width)
        || point_segment_distance(box_pos, prev_pos, pos) <= r
}

/// Indices of alive boxes hit from `pos` this frame.
pub fn boxes_hit(
    field: &dyn BonusField,
    pos: Vec2,
    prev_pos: Vec2,
    heading: f32,
    config: &CombatConfig,
) -> Vec<usize> {
    field
        .boxes()
        .iter()
        .enumerate()
        .filter(|(_, b)| b.alive && pickup_hit(b.pos, pos, prev_pos, heading, config))
        .map(|(i, _)| i)
        .collect()
}
