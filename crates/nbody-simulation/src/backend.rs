//! Backend contract shared by the host and accelerator implementations

use nbody_physics::Body;

use crate::error::Result;
use crate::params::SimulationParams;

/// Execution strategy for the two per-frame kernels.
///
/// Implementations mutate `bodies` in place, never reorder or resize it, and
/// return the wall-clock seconds the call took. Effects on body state must be
/// identical across implementations up to floating-point tolerance.
pub trait Backend {
    /// Short label used in logs and timing tables
    fn name(&self) -> &str;

    /// Add the summed gravitational acceleration of every body to its
    /// velocity. Positions are left untouched.
    fn compute_forces(&self, bodies: &mut [Body], gravity: f64) -> Result<f64>;

    /// Reflect velocities of bodies outside `[0, width] × [0, height]`, then
    /// move every body by `velocity * dt`.
    fn advance(&self, bodies: &mut [Body], dt: f64, width: f64, height: f64) -> Result<f64>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn compute_forces(&self, bodies: &mut [Body], gravity: f64) -> Result<f64> {
        (**self).compute_forces(bodies, gravity)
    }

    fn advance(&self, bodies: &mut [Body], dt: f64, width: f64, height: f64) -> Result<f64> {
        (**self).advance(bodies, dt, width, height)
    }
}

/// Elapsed seconds of the two phases of one frame
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTiming {
    pub forces: f64,
    pub advance: f64,
}

impl FrameTiming {
    pub fn total(&self) -> f64 {
        self.forces + self.advance
    }
}

/// Run one frame: force accumulation followed by boundary integration
pub fn step_frame<B: Backend + ?Sized>(
    backend: &B,
    bodies: &mut [Body],
    params: &SimulationParams,
) -> Result<FrameTiming> {
    let forces = backend.compute_forces(bodies, params.gravity)?;
    let advance = backend.advance(bodies, params.dt, params.width, params.height)?;
    Ok(FrameTiming { forces, advance })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;
    use std::cell::RefCell;

    /// Records call order without touching bodies
    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<&'static str>>,
    }

    impl Backend for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn compute_forces(&self, _bodies: &mut [Body], _gravity: f64) -> Result<f64> {
            self.calls.borrow_mut().push("forces");
            Ok(1.5)
        }

        fn advance(&self, _bodies: &mut [Body], _dt: f64, _w: f64, _h: f64) -> Result<f64> {
            self.calls.borrow_mut().push("advance");
            Ok(0.25)
        }
    }

    #[test]
    fn test_step_frame_runs_forces_then_advance() {
        let recorder = Recorder::default();
        let mut bodies = vec![Body::at_rest(DVec2::ZERO, 1.0).unwrap()];

        let timing = step_frame(&recorder, &mut bodies, &SimulationParams::default()).unwrap();

        assert_eq!(*recorder.calls.borrow(), vec!["forces", "advance"]);
        assert_eq!(timing.forces, 1.5);
        assert_eq!(timing.advance, 0.25);
        assert_eq!(timing.total(), 1.75);
    }

    #[test]
    fn test_boxed_backend_forwards() {
        let boxed: Box<dyn Backend> = Box::new(Recorder::default());
        let mut bodies: Vec<Body> = Vec::new();
        assert_eq!(boxed.name(), "recorder");
        assert_eq!(step_frame(&boxed, &mut bodies, &SimulationParams::default()).unwrap().total(), 1.75);
    }
}
