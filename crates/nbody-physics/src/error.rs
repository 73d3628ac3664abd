//! Error types for nbody-physics.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// Mass must be strictly positive and finite; the force law divides by it.
    #[error("body {index} has invalid mass {mass} (must be finite and > 0)")]
    InvalidMass { index: usize, mass: f64 },
}

pub type Result<T> = std::result::Result<T, PhysicsError>;
