//! N-body backend benchmark
//!
//! Runs the same randomly generated systems on the host (rayon) and
//! accelerator (wgpu) backends and writes the elapsed times as a CSV table.

mod bench;
mod generate;
mod report;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use nbody_physics::{DEFAULT_DT, DEFAULT_GRAVITY, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use nbody_simulation::{GpuBackend, HostBackend, HostReduction, SimulationParams};
use rand::rngs::StdRng;
use rand::SeedableRng;

use bench::{max_relative_divergence, position_checksum, run_trial};
use generate::generate_bodies;
use report::{TimingTable, ACCELERATOR_ROW, HOST_ROW, SPEEDUP_ROW};

#[derive(Parser, Debug)]
#[command(name = "nbody-bench")]
#[command(about = "Brute-force N-body timing: host multi-core vs GPU compute")]
struct Args {
    /// Body counts to benchmark, one trial each
    #[arg(long, value_delimiter = ',', default_value = "1000,5000,10000")]
    counts: Vec<usize>,

    /// Frames (force + advance) per trial
    #[arg(long, default_value_t = 1)]
    frames: usize,

    /// Gravitational constant
    #[arg(long, default_value_t = DEFAULT_GRAVITY)]
    gravity: f64,

    /// Integration time step
    #[arg(long, default_value_t = DEFAULT_DT)]
    dt: f64,

    /// World width
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: f64,

    /// World height
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: f64,

    /// Host worker threads (default: rayon global pool)
    #[arg(long)]
    threads: Option<usize>,

    /// How host workers merge their private acceleration buffers
    #[arg(long, value_enum, default_value_t = Reduction::Locked)]
    reduction: Reduction,

    /// Only run the host backend
    #[arg(long)]
    host_only: bool,

    /// Seed for body generation (default: OS entropy)
    #[arg(long)]
    seed: Option<u64>,

    /// Where to write the timing table
    #[arg(long, default_value = "data.csv")]
    output: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Reduction {
    Locked,
    Tree,
}

impl From<Reduction> for HostReduction {
    fn from(reduction: Reduction) -> Self {
        match reduction {
            Reduction::Locked => HostReduction::Locked,
            Reduction::Tree => HostReduction::Tree,
        }
    }
}

impl Args {
    fn params(&self) -> Result<SimulationParams> {
        if self.counts.is_empty() {
            bail!("at least one body count is required");
        }
        if self.frames == 0 {
            bail!("at least one frame per trial is required");
        }
        if !(self.width.is_finite() && self.width > 0.0 && self.height.is_finite() && self.height > 0.0) {
            bail!("world size must be positive, got {} x {}", self.width, self.height);
        }
        if !(self.dt.is_finite() && self.dt >= 0.0) {
            bail!("time step must be finite and non-negative, got {}", self.dt);
        }
        if !self.gravity.is_finite() {
            bail!("gravitational constant must be finite, got {}", self.gravity);
        }
        Ok(SimulationParams {
            gravity: self.gravity,
            dt: self.dt,
            width: self.width,
            height: self.height,
        })
    }
}

fn main() -> Result<()> {
    // Initialize logger (RUST_LOG=debug for per-call timings)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let params = args.params()?;

    let host = match args.threads {
        Some(threads) => HostBackend::with_threads(threads)?,
        None => HostBackend::new(),
    }
    .with_reduction(args.reduction.into());
    log::info!(
        "Host backend: {} workers, {:?} merge",
        host.threads(),
        host.reduction()
    );

    // One accelerator session for every trial, sized for the largest count.
    // Dropping it on an early return releases the device resources.
    let accelerator = if args.host_only {
        None
    } else {
        let max_count = args.counts.iter().copied().max().unwrap_or(0);
        let max_count = u32::try_from(max_count).context("body count does not fit the accelerator")?;
        Some(GpuBackend::init(max_count).context("accelerator initialization failed")?)
    };

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut table = TimingTable::new(args.counts.clone());

    for &count in &args.counts {
        log::info!("=========");
        let bodies = generate_bodies(count, params.width, params.height, &mut rng)?;

        let mut host_bodies = bodies.clone();
        let host_time = run_trial(&host, &mut host_bodies, &params, args.frames)?;
        table.record(HOST_ROW, host_time);

        if let Some(gpu) = &accelerator {
            let mut gpu_bodies = bodies;
            let gpu_time = run_trial(gpu, &mut gpu_bodies, &params, args.frames)?;
            table.record(ACCELERATOR_ROW, gpu_time);

            let speedup = host_time / gpu_time;
            table.record(SPEEDUP_ROW, speedup);
            log::info!("Accelerator speedup: {:.2}x", speedup);

            log::info!(
                "Position checksum host={:.6} accelerator={:.6}, max relative divergence {:.3e}",
                position_checksum(&host_bodies),
                position_checksum(&gpu_bodies),
                max_relative_divergence(&host_bodies, &gpu_bodies)
            );
        }
    }

    table
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    log::info!("Timing table written to {}", args.output.display());

    if let Some(gpu) = accelerator {
        gpu.shutdown();
    }

    Ok(())
}
