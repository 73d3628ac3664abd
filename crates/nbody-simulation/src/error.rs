//! Error types for nbody-simulation.

use nbody_physics::PhysicsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Physics(#[from] PhysicsError),

    #[error("no suitable GPU adapter: {0}")]
    AdapterUnavailable(#[from] wgpu::RequestAdapterError),

    #[error("GPU adapter '{adapter}' does not support {feature}")]
    MissingFeature {
        adapter: String,
        feature: &'static str,
    },

    #[error("failed to create GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("body buffer of {requested} bytes exceeds the device limit of {limit} bytes")]
    BufferTooLarge { requested: u64, limit: u64 },

    #[error("{workgroups} workgroups exceed the device dispatch limit of {limit}")]
    DispatchTooLarge { workgroups: u32, limit: u32 },

    #[error("{requested} bodies exceed the accelerator capacity of {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },

    #[error("GPU readback failed: {0}")]
    Readback(String),

    #[error("failed to build host thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, SimulationError>;
