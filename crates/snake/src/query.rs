//! Walkability queries over [`Terrain`].
//!
//! All searches return `Option`; callers hold their heading or stay put
//! when nothing is found.

use crate::geometry::{heading_vec, vec_heading, wrap_angle};
use crate::world::Terrain;
use glam::Vec2;

/// Fan offsets, in degrees from the current heading, tried by
/// [`clear_direction`]: perpendicular first, alternating sides, widening.
pub const FAN_OFFSETS_DEG: [f32; 11] = [
    90.0, -90.0, 60.0, -60.0, 120.0, -120.0, 30.0, -30.0, 150.0, -150.0, 180.0,
];

#[inline]
pub fn is_walkable(terrain: &dyn Terrain, pos: Vec2) -> bool {
    !terrain.is_blocked(pos)
}

/// First blocked sample when marching from `from` along `dir` up to `len`.
pub fn first_blocked(terrain: &dyn Terrain, from: Vec2, dir: Vec2, len: f32, step: f32) -> Option<Vec2> {
    let step = step.max(0.5);
    let mut d = step;
    while d <= len {
        let p = from + dir * d;
        if terrain.is_blocked(p) {
            return Some(p);
        }
        d += step;
    }
    None
}

/// Whether the next `len` pixels along `dir` are all walkable.
#[inline]
pub fn ray_clear(terrain: &dyn Terrain, from: Vec2, dir: Vec2, len: f32, step: f32) -> bool {
    first_blocked(terrain, from, dir, len, step).is_none()
}

/// Fan search for an escape heading. Returns the first heading whose next
/// `feeler_len` pixels are clear.
pub fn clear_direction(
    terrain: &dyn Terrain,
    from: Vec2,
    heading: f32,
    feeler_len: f32,
    step: f32,
) -> Option<f32> {
    FAN_OFFSETS_DEG.iter().find_map(|deg| {
        let candidate = wrap_angle(heading + deg.to_radians());
        ray_clear(terrain, from, heading_vec(candidate), feeler_len, step).then_some(candidate)
    })
}

/// Square-ring search outward from the tile under `from` for the nearest
/// walkable tile, up to `max_radius` rings. Returns that tile's center.
pub fn nearest_open_tile(terrain: &dyn Terrain, from: Vec2, max_radius: i32) -> Option<Vec2> {
    ring_search(terrain, from, 0, max_radius, |_| true)
}

/// Like [`nearest_open_tile`] but skips the tile under `from` and only
/// accepts tiles with a clear heading of at least `feeler_len`, so a head
/// moved there can keep going.
pub fn escape_tile(terrain: &dyn Terrain, from: Vec2, max_radius: i32, feeler_len: f32, step: f32) -> Option<Vec2> {
    ring_search(terrain, from, 1, max_radius, |c| {
        clear_direction(terrain, c, 0.0, feeler_len, step).is_some()
    })
}

fn ring_search(
    terrain: &dyn Terrain,
    from: Vec2,
    min_radius: i32,
    max_radius: i32,
    accept: impl Fn(Vec2) -> bool,
) -> Option<Vec2> {
    let ts = terrain.tile_size();
    let tx = (from.x / ts).floor() as i32;
    let ty = (from.y / ts).floor() as i32;
    let center = |x: i32, y: i32| Vec2::new((x as f32 + 0.5) * ts, (y as f32 + 0.5) * ts);

    for r in min_radius.max(0)..=max_radius.max(0) {
        let mut best: Option<(f32, Vec2)> = None;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx.abs() != r && dy.abs() != r {
                    continue;
                }
                let c = center(tx + dx, ty + dy);
                if terrain.is_blocked(c) || !accept(c) {
                    continue;
                }
                let d = c.distance_squared(from);
                if best.is_none_or(|(bd, _)| d < bd) {
                    best = Some((d, c));
                }
            }
        }
        if let Some((_, c)) = best {
            return Some(c);
        }
    }
    None
}

/// Proactive look-ahead. If the desired heading runs into a wall within
/// `look_ahead`, scan perpendicular from the hit point for the nearer gap and
/// return the heading toward it. Otherwise the desired heading is returned
/// unchanged.
pub fn avoid_walls(
    terrain: &dyn Terrain,
    from: Vec2,
    desired: f32,
    look_ahead: f32,
    scan_distance: f32,
    step: f32,
) -> f32 {
    let dir = heading_vec(desired);
    let Some(hit) = first_blocked(terrain, from, dir, look_ahead, step) else {
        return desired;
    };

    let left = dir.perp();
    let right = -left;
    let step = step.max(0.5);
    let mut d = step;
    while d <= scan_distance {
        for side in [left, right] {
            let gap = hit + side * d;
            if !terrain.is_blocked(gap) {
                return vec_heading(gap - from);
            }
        }
        d += step;
    }
    desired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{TileGrid, TileKind};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_clear_direction_prefers_perpendicular() {
        let mut grid = TileGrid::new(20, 20, 16.0);
        // Wall column directly ahead.
        grid.fill_rect(10, 0, 10, 19, TileKind::Wall);
        let from = Vec2::new(150.0, 160.0);
        let h = clear_direction(&grid, from, 0.0, 24.0, 4.0).unwrap();
        assert!(approx(h, std::f32::consts::FRAC_PI_2));
    }

    #[test]
    fn test_clear_direction_none_when_boxed_in() {
        let mut grid = TileGrid::new(5, 5, 16.0);
        grid.fill_rect(0, 0, 4, 4, TileKind::Wall);
        grid.set_tile(2, 2, TileKind::Open);
        assert_eq!(clear_direction(&grid, Vec2::new(40.0, 40.0), 0.0, 24.0, 4.0), None);
    }

    #[test]
    fn test_nearest_open_tile_rings() {
        let mut grid = TileGrid::new(9, 9, 10.0);
        grid.fill_rect(0, 0, 8, 8, TileKind::Wall);
        grid.set_tile(7, 4, TileKind::Open);
        let from = Vec2::new(45.0, 45.0);
        assert_eq!(nearest_open_tile(&grid, from, 2), None);
        assert_eq!(nearest_open_tile(&grid, from, 3), Some(Vec2::new(75.0, 45.0)));
    }

    #[test]
    fn test_nearest_open_tile_current_tile() {
        let grid = TileGrid::new(4, 4, 10.0);
        assert_eq!(nearest_open_tile(&grid, Vec2::new(12.0, 12.0), 0), Some(Vec2::new(15.0, 15.0)));
    }

    #[test]
    fn test_escape_tile_leaves_sealed_cell() {
        let mut grid = TileGrid::new(20, 20, 16.0);
        grid.fill_rect(9, 9, 11, 11, TileKind::Wall);
        grid.set_tile(10, 10, TileKind::Open);
        let from = Vec2::new(168.0, 168.0);

        assert_eq!(nearest_open_tile(&grid, from, 6), Some(from));
        let tile = escape_tile(&grid, from, 6, 24.0, 4.0).unwrap();
        assert!(tile.distance(from) > 16.0);
        assert!(!grid.is_blocked(tile));
        assert!(clear_direction(&grid, tile, 0.0, 24.0, 4.0).is_some());
    }

    #[test]
    fn test_escape_tile_skips_open_pockets() {
        let mut grid = TileGrid::new(12, 12, 16.0);
        grid.fill_rect(0, 0, 11, 11, TileKind::Wall);
        // A one-tile pocket next door and a roomy area further out.
        grid.set_tile(5, 5, TileKind::Open);
        grid.set_tile(6, 5, TileKind::Open);
        grid.fill_rect(8, 2, 11, 9, TileKind::Open);
        let from = Vec2::new(88.0, 88.0);
        let tile = escape_tile(&grid, from, 6, 40.0, 4.0).unwrap();
        assert!(tile.x > 128.0, "expected the open area, got {tile}");
    }

    #[test]
    fn test_avoid_walls_finds_gap() {
        let mut grid = TileGrid::new(20, 20, 16.0);
        // Wall ahead with a gap above (smaller y) the travel line.
        grid.fill_rect(6, 8, 6, 19, TileKind::Wall);
        let from = Vec2::new(80.0, 136.0);
        let h = avoid_walls(&grid, from, 0.0, 48.0, 64.0, 4.0);
        assert!(h < 0.0, "expected to veer toward the gap, got {h}");
    }

    #[test]
    fn test_avoid_walls_keeps_heading_without_gap() {
        let mut grid = TileGrid::new(20, 20, 16.0);
        grid.fill_rect(6, 0, 6, 19, TileKind::Wall);
        let from = Vec2::new(80.0, 136.0);
        assert_eq!(avoid_walls(&grid, from, 0.0, 48.0, 64.0, 4.0), 0.0);
    }
}
