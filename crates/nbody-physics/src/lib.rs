//! # N-Body Physics
//!
//! Shared math and data types for the brute-force gravity benchmark: 2D vector
//! helpers, the GPU-compatible [`Body`] layout and the softened inverse-square
//! force law. Both execution backends build on these definitions.

pub mod body;
pub mod constants;
pub mod error;
pub mod forces;
pub mod integrator;
pub mod vector;

pub use body::*;
pub use constants::*;
pub use error::*;
pub use forces::*;
pub use integrator::*;
pub use vector::*;
