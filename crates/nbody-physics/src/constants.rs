//! Numerical constants and benchmark defaults
//!
//! The softening term and direction guard are part of the force law and are
//! mirrored verbatim in the WGSL kernels. The remaining values are only
//! defaults; every backend call takes them as explicit parameters.

/// Softening parameter added to the squared distance to prevent singularities at r→0
pub const SOFTENING: f64 = 0.1;

/// Distance below which a direction is defined as the zero vector.
///
/// Self-interaction relies on this: a body is at distance exactly zero from
/// itself, so its own contribution vanishes without an explicit `i != j` skip.
pub const DIRECTION_EPSILON: f64 = 1e-6;

/// Default gravitational constant (benchmark units, not SI)
pub const DEFAULT_GRAVITY: f64 = 9.8;

/// Default integration time step
pub const DEFAULT_DT: f64 = 0.07;

/// Default world width
pub const DEFAULT_WIDTH: f64 = 1920.0;

/// Default world height
pub const DEFAULT_HEIGHT: f64 = 1080.0;

/// Distance from the world edge inside which generated bodies never spawn
pub const SPAWN_MARGIN: f64 = 100.0;

/// Lower bound (inclusive) of generated body masses
pub const MIN_BODY_MASS: f64 = 10.0;

/// Upper bound (exclusive) of generated body masses
pub const MAX_BODY_MASS: f64 = 100.0;
