//! Random body generation for benchmark trials

use glam::DVec2;
use nbody_physics::{Body, PhysicsError, MAX_BODY_MASS, MIN_BODY_MASS, SPAWN_MARGIN};
use rand::Rng;

/// `count` bodies at rest, placed uniformly inside the world minus a margin,
/// with mass uniform in `[MIN_BODY_MASS, MAX_BODY_MASS)`.
pub fn generate_bodies<R: Rng>(
    count: usize,
    width: f64,
    height: f64,
    rng: &mut R,
) -> Result<Vec<Body>, PhysicsError> {
    let (x_min, x_max) = spawn_range(width);
    let (y_min, y_max) = spawn_range(height);

    (0..count)
        .map(|_| {
            let position = DVec2::new(
                rng.random_range(x_min..=x_max),
                rng.random_range(y_min..=y_max),
            );
            let mass = rng.random_range(MIN_BODY_MASS..MAX_BODY_MASS);
            Body::at_rest(position, mass)
        })
        .collect()
}

/// Interior of `[0, extent]` after the spawn margin; the whole extent when the
/// world is too small for one.
fn spawn_range(extent: f64) -> (f64, f64) {
    if extent > 2.0 * SPAWN_MARGIN {
        (SPAWN_MARGIN, extent - SPAWN_MARGIN)
    } else {
        (0.0, extent.max(0.0))
    }
}
