//! 2D vector helpers on top of [`glam::DVec2`]
//!
//! `add`, `subtract` and `scale` are the plain `DVec2` operators. The distance
//! helpers spell out the component arithmetic so host and shader evaluate the
//! same expression in the same order.

use crate::constants::DIRECTION_EPSILON;
use glam::DVec2;

/// `(ax - bx)² + (ay - by)²`
#[inline]
pub fn squared_distance(a: DVec2, b: DVec2) -> f64 {
    let diff = a - b;
    let dx2 = diff.x * diff.x;
    let dy2 = diff.y * diff.y;
    dx2 + dy2
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: DVec2, b: DVec2) -> f64 {
    squared_distance(a, b).sqrt()
}

/// Unit vector pointing from `from` towards `to`.
///
/// Returns [`DVec2::ZERO`] when the points are closer than
/// [`DIRECTION_EPSILON`] instead of dividing by a vanishing length.
#[inline]
pub fn direction(from: DVec2, to: DVec2) -> DVec2 {
    let dir = to - from;
    let dist = distance(from, to);

    if dist < DIRECTION_EPSILON {
        return DVec2::ZERO;
    }
    DVec2::new(dir.x / dist, dir.y / dist)
}
