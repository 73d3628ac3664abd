//! # N-Body Simulation Backends
//!
//! Interchangeable execution strategies for the brute-force gravity kernels:
//! a rayon-based host backend and a wgpu compute backend. Both implement
//! [`Backend`], so a benchmark driver can swap them without branching.

pub mod backend;
pub mod error;
pub mod gpu;
pub mod host;
pub mod params;

pub use backend::*;
pub use error::*;
pub use gpu::*;
pub use host::*;
pub use params::*;
