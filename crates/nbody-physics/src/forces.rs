//! Softened inverse-square gravity
//!
//! These are the scalar kernels. The host backend calls them from rayon
//! workers; the accelerator backend evaluates the same expressions in
//! `forces.wgsl`.

use glam::DVec2;

use crate::body::Body;
use crate::constants::SOFTENING;
use crate::vector::{direction, squared_distance};

/// Force magnitude between two bodies
/// F = G * m1 * m2 / (r² + ε)
#[inline]
pub fn force(b1: &Body, b2: &Body, g: f64) -> f64 {
    let dist_sq = squared_distance(b1.position(), b2.position()) + SOFTENING;
    b1.mass() * b2.mass() * g / dist_sq
}

/// Acceleration `target` receives from `source`.
///
/// Zero when the two positions coincide (including `target == source`),
/// because the direction guard yields a zero vector.
#[inline]
pub fn acceleration_contribution(target: &Body, source: &Body, g: f64) -> DVec2 {
    let magnitude = force(target, source, g) / target.mass();
    direction(target.position(), source.position()) * magnitude
}

/// Total acceleration on `bodies[index]`, summed over every body in ascending
/// order, the body itself included.
pub fn body_acceleration(bodies: &[Body], index: usize, g: f64) -> DVec2 {
    let target = &bodies[index];
    bodies.iter().fold(DVec2::ZERO, |acc, source| {
        acc + acceleration_contribution(target, source, g)
    })
}
