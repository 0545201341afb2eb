//! Geometry helpers.
//!
//! Angles are radians, normalized to (-PI, PI]. Positions are world pixels.

use glam::Vec2;
use std::f32::consts::{PI, TAU};

/// Normalize an angle to (-PI, PI].
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let mut a = angle.rem_euclid(TAU);
    if a > PI {
        a -= TAU;
    }
    a
}

/// Signed shortest rotation from `from` to `to`, in (-PI, PI].
#[inline]
pub fn angle_diff(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}

/// Unit vector for a heading.
#[inline]
pub fn heading_vec(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Heading of a vector. Zero vectors map to 0.
#[inline]
pub fn vec_heading(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Rotate `heading` toward `target` by at most `max_turn` radians, taking
/// the shorter way round. Lands exactly on `target` when within reach.
#[inline]
pub fn steer_toward(heading: f32, target: f32, max_turn: f32) -> f32 {
    let max_turn = max_turn.max(0.0);
    let diff = angle_diff(heading, target);
    if diff.abs() <= max_turn {
        wrap_angle(target)
    } else {
        wrap_angle(heading + max_turn.copysign(diff))
    }
}

/// Distance from `p` to the segment `a`-`b`.
#[inline]
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Whether `p` lies inside a box that starts at `origin`, extends `reach`
/// along `heading`, and `half_width` to either side.
#[inline]
pub fn in_heading_box(p: Vec2, origin: Vec2, heading: f32, reach: f32, half_width: f32) -> bool {
    let forward = heading_vec(heading);
    let d = p - origin;
    let along = d.dot(forward);
    let across = d.perp_dot(forward).abs();
    (0.0..=reach).contains(&along) && across <= half_width
}

/// Index of the item nearest to `from` among those accepted by `filter`,
/// limited to `max_dist`.
pub fn nearest_index<T>(
    items: &[T],
    from: Vec2,
    max_dist: f32,
    pos: impl Fn(&T) -> Vec2,
    filter: impl Fn(&T) -> bool,
) -> Option<usize> {
    let mut best = None;
    let mut best_sq = max_dist * max_dist;
    for (i, item) in items.iter().enumerate() {
        if !filter(item) {
            continue;
        }
        let d = pos(item).distance_squared(from);
        if d <= best_sq {
            best_sq = d;
            best = Some(i);
        }
    }
    best
}

/// Point on a lemniscate of Bernoulli with half-width `amplitude` at
/// parameter `t`, in its local frame (x along the long axis).
#[inline]
pub fn lemniscate(t: f32, amplitude: f32) -> Vec2 {
    let s = t.sin();
    let c = t.cos();
    let denom = 1.0 + s * s;
    Vec2::new(amplitude * c / denom, amplitude * s * c / denom)
}
