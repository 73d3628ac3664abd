//! Simulation parameters threaded through every backend call

use bytemuck::{Pod, Zeroable};
use nbody_physics::{DEFAULT_DT, DEFAULT_GRAVITY, DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// Per-frame inputs for [`crate::step_frame`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationParams {
    /// Gravitational constant
    pub gravity: f64,
    /// Integration time step
    pub dt: f64,
    /// World extent along x; bodies reflect outside `[0, width]`
    pub width: f64,
    /// World extent along y; bodies reflect outside `[0, height]`
    pub height: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            dt: DEFAULT_DT,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

/// Uniform block shared by both compute shaders (matches WGSL `Params`)
///
/// Only the fields relevant to the dispatched kernel are meaningful; the
/// others are left at zero.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub(crate) struct GpuParams {
    pub gravity: f64,
    pub dt: f64,
    pub width: f64,
    pub height: f64,
    pub body_count: u32,
    pub _padding0: u32,
    pub _padding1: f64,
}

impl GpuParams {
    pub fn forces(body_count: u32, gravity: f64) -> Self {
        Self {
            gravity,
            body_count,
            ..Self::default()
        }
    }

    pub fn integrate(body_count: u32, dt: f64, width: f64, height: f64) -> Self {
        Self {
            dt,
            width,
            height,
            body_count,
            ..Self::default()
        }
    }
}
