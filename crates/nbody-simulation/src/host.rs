//! Host multi-core backend (rayon)
//!
//! `compute_forces` schedules the outer body index dynamically across the
//! pool's workers. Every worker owns one private, full-length acceleration
//! buffer, so the O(n²) inner loop never writes shared memory. The private
//! buffers are then combined into one acceleration array, either one at a
//! time under a mutex or pairwise as a tree. Each index is filled by exactly
//! one worker, so both strategies produce the same values.

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use glam::DVec2;
use nbody_physics::{body_acceleration, reflect_and_advance, validate_bodies, Body};
use rayon::prelude::*;

use crate::backend::Backend;
use crate::error::Result;

/// How per-worker acceleration buffers are combined
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HostReduction {
    /// Serialized merge into a shared buffer under a mutex
    #[default]
    Locked,
    /// Pairwise `reduce` of the private buffers
    Tree,
}

/// CPU backend running both kernels on a rayon thread pool
pub struct HostBackend {
    pool: Option<rayon::ThreadPool>,
    reduction: HostReduction,
}

impl HostBackend {
    /// Backend on rayon's global pool with the locked merge
    pub fn new() -> Self {
        Self {
            pool: None,
            reduction: HostReduction::default(),
        }
    }

    /// Backend on a dedicated pool with a fixed worker count
    pub fn with_threads(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("nbody-host-{i}"))
            .build()?;
        log::info!("Host backend using dedicated pool of {} threads", pool.current_num_threads());
        Ok(Self {
            pool: Some(pool),
            reduction: HostReduction::default(),
        })
    }

    pub fn with_reduction(mut self, reduction: HostReduction) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn reduction(&self) -> HostReduction {
        self.reduction
    }

    /// Number of workers a call fans out to
    pub fn threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl Default for HostBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for HostBackend {
    fn name(&self) -> &str {
        "host"
    }

    fn compute_forces(&self, bodies: &mut [Body], gravity: f64) -> Result<f64> {
        validate_bodies(bodies)?;

        let start = Instant::now();
        let reduction = self.reduction;
        self.install(|| {
            let accelerations = match reduction {
                HostReduction::Locked => accumulate_locked(bodies, gravity),
                HostReduction::Tree => accumulate_tree(bodies, gravity),
            };

            bodies
                .par_iter_mut()
                .zip(accelerations.par_iter())
                .for_each(|(body, acceleration)| {
                    body.set_velocity(body.velocity() + *acceleration);
                });
        });
        let elapsed = start.elapsed().as_secs_f64();

        log::debug!(
            "host compute_forces: {} bodies, {:?} merge, {:.6}s",
            bodies.len(),
            reduction,
            elapsed
        );
        Ok(elapsed)
    }

    fn advance(&self, bodies: &mut [Body], dt: f64, width: f64, height: f64) -> Result<f64> {
        let start = Instant::now();
        self.install(|| {
            bodies
                .par_iter_mut()
                .for_each(|body| reflect_and_advance(body, dt, width, height));
        });
        let elapsed = start.elapsed().as_secs_f64();

        log::debug!("host advance: {} bodies, {:.6}s", bodies.len(), elapsed);
        Ok(elapsed)
    }
}

/// One private buffer per worker of the current pool. Only the slots of
/// indices a worker processed are written.
fn private_accelerations(bodies: &[Body], gravity: f64) -> Vec<Vec<DVec2>> {
    let n = bodies.len();
    let workers: Vec<Mutex<Vec<DVec2>>> = (0..rayon::current_num_threads())
        .map(|_| Mutex::new(vec![DVec2::ZERO; n]))
        .collect();

    (0..n).into_par_iter().for_each(|i| {
        let acceleration = body_acceleration(bodies, i, gravity);
        // Uncontended: a slot is only locked by the worker it belongs to
        let worker = rayon::current_thread_index().unwrap_or(0);
        let mut local = workers[worker].lock().unwrap_or_else(PoisonError::into_inner);
        local[i] = acceleration;
    });

    workers
        .into_iter()
        .map(|local| local.into_inner().unwrap_or_else(PoisonError::into_inner))
        .collect()
}

fn accumulate_locked(bodies: &[Body], gravity: f64) -> Vec<DVec2> {
    let shared = Mutex::new(vec![DVec2::ZERO; bodies.len()]);

    private_accelerations(bodies, gravity)
        .into_par_iter()
        .for_each(|local| {
            let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
            for (acc, contribution) in shared.iter_mut().zip(local) {
                *acc += contribution;
            }
        });

    shared.into_inner().unwrap_or_else(PoisonError::into_inner)
}

fn accumulate_tree(bodies: &[Body], gravity: f64) -> Vec<DVec2> {
    let n = bodies.len();
    private_accelerations(bodies, gravity).into_par_iter().reduce(
        || vec![DVec2::ZERO; n],
        |mut left, right| {
            for (acc, contribution) in left.iter_mut().zip(right) {
                *acc += contribution;
            }
            left
        },
    )
}
