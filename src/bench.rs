//! Trial runner and cross-backend comparison helpers

use nbody_physics::Body;
use nbody_simulation::{step_frame, Backend, Result, SimulationParams};

/// Run `frames` frames and return the summed elapsed seconds of every
/// `compute_forces` and `advance` call.
pub fn run_trial<B: Backend + ?Sized>(
    backend: &B,
    bodies: &mut [Body],
    params: &SimulationParams,
    frames: usize,
) -> Result<f64> {
    let mut seconds = 0.0;
    for _ in 0..frames {
        seconds += step_frame(backend, bodies, params)?.total();
    }
    log::info!(
        "{} {} took: {:.6} seconds",
        backend.name(),
        bodies.len(),
        seconds
    );
    Ok(seconds)
}

/// Sum of x positions, a cheap fingerprint for comparing runs
pub fn position_checksum(bodies: &[Body]) -> f64 {
    bodies.iter().map(|b| b.position().x).sum()
}

/// Largest relative difference over every position and velocity component
pub fn max_relative_divergence(a: &[Body], b: &[Body]) -> f64 {
    a.iter()
        .zip(b)
        .flat_map(|(x, y)| {
            [
                (x.position().x, y.position().x),
                (x.position().y, y.position().y),
                (x.velocity().x, y.velocity().x),
                (x.velocity().y, y.velocity().y),
            ]
        })
        .map(|(p, q)| (p - q).abs() / p.abs().max(q.abs()).max(f64::MIN_POSITIVE))
        .fold(0.0, f64::max)
}
