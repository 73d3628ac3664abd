//! Explicit Euler step with reflective axis-aligned walls

use crate::body::Body;

/// Reflect against the `[0, width] × [0, height]` box, then move.
///
/// Walls are tested against the position from before the move, and the move
/// uses the already-reflected velocity. A body can therefore end up one step
/// beyond a wall before it visibly bounces back.
#[inline]
pub fn reflect_and_advance(body: &mut Body, dt: f64, width: f64, height: f64) {
    let position = body.position();
    let mut velocity = body.velocity();

    if position.x < 0.0 || position.x > width {
        velocity.x *= -1.0;
    }
    if position.y < 0.0 || position.y > height {
        velocity.y *= -1.0;
    }

    body.set_velocity(velocity);
    body.set_position(position + velocity * dt);
}
