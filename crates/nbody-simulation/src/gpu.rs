//! Accelerator backend (wgpu compute, 64-bit floats)
//!
//! Every call uploads the bodies, runs one compute pass with one invocation
//! per body, copies the body buffer into a staging buffer and blocks until it
//! is mapped back into the caller's slice. Elapsed times include transfers.
//!
//! Device resources are sized once in [`GpuBackend::init`] for the largest
//! body count of the session and released on [`GpuBackend::shutdown`] or drop.

use std::sync::{mpsc, Mutex, PoisonError};
use std::time::Instant;

use nbody_physics::{validate_bodies, Body};

use crate::backend::Backend;
use crate::error::{Result, SimulationError};
use crate::params::GpuParams;

/// Invocations per workgroup (matches `@workgroup_size` in the shaders)
const WORKGROUP_SIZE: u32 = 64;

const BODY_SIZE: u64 = std::mem::size_of::<Body>() as u64;

/// wgpu-backed implementation of [`Backend`]
pub struct GpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,

    body_buffer: wgpu::Buffer,
    staging_buffer: wgpu::Buffer,
    params_buffer: wgpu::Buffer,

    force_pipeline: wgpu::ComputePipeline,
    integrate_pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,

    capacity: u32,
    // Serializes submissions; the staging buffer is mapped once per call
    submission: Mutex<()>,
}

impl GpuBackend {
    /// Acquire a device and allocate buffers for up to `max_body_count` bodies.
    ///
    /// Fails when no adapter is available, the adapter lacks
    /// `SHADER_F64`, or the buffers exceed device limits.
    pub fn init(max_body_count: u32) -> Result<Self> {
        pollster::block_on(Self::new(max_body_count))
    }

    pub async fn new(max_body_count: u32) -> Result<Self> {
        log::info!("Initializing accelerator backend for {} bodies...", max_body_count);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        let adapter_name = adapter.get_info().name;
        log::info!("✓ Using GPU: {}", adapter_name);

        if !adapter.features().contains(wgpu::Features::SHADER_F64) {
            return Err(SimulationError::MissingFeature {
                adapter: adapter_name,
                feature: "SHADER_F64",
            });
        }

        let limits = adapter.limits();
        // Zero-sized bindings are invalid, keep at least one slot
        let capacity = max_body_count.max(1);
        let buffer_size = u64::from(capacity) * BODY_SIZE;
        let binding_limit = u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size);
        if buffer_size > binding_limit {
            return Err(SimulationError::BufferTooLarge {
                requested: buffer_size,
                limit: binding_limit,
            });
        }
        let workgroups = workgroup_count(capacity);
        if workgroups > limits.max_compute_workgroups_per_dimension {
            return Err(SimulationError::DispatchTooLarge {
                workgroups,
                limit: limits.max_compute_workgroups_per_dimension,
            });
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("N-Body Device"),
                required_features: wgpu::Features::SHADER_F64,
                required_limits: limits,
                memory_hints: wgpu::MemoryHints::Performance,
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        // Body buffer: uploaded before and read back after every dispatch
        let body_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Body Buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Body Staging Buffer"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Params Buffer"),
            size: std::mem::size_of::<GpuParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::info!("Buffers created ({} bytes per body buffer)", buffer_size);

        let force_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Force Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/forces.wgsl").into()),
        });

        let integrate_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Integration Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/integrate.wgsl").into()),
        });

        log::info!("Shaders loaded");

        // Both kernels share one layout:
        // 0: bodies (storage, read/write)
        // 1: params (uniform)
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("N-Body Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("N-Body Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let force_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Force Pipeline"),
            layout: Some(&pipeline_layout),
            module: &force_shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let integrate_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Integration Pipeline"),
            layout: Some(&pipeline_layout),
            module: &integrate_shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        log::info!("Pipelines created");

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("N-Body Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: body_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        Ok(Self {
            device,
            queue,
            adapter_name,
            body_buffer,
            staging_buffer,
            params_buffer,
            force_pipeline,
            integrate_pipeline,
            bind_group,
            capacity,
            submission: Mutex::new(()),
        })
    }

    /// Release device resources. Dropping the backend has the same effect.
    pub fn shutdown(self) {
        log::info!("Shutting down accelerator backend ({})", self.adapter_name);
    }

    /// Largest body count accepted per call
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    fn check_capacity(&self, count: usize) -> Result<u32> {
        if count > self.capacity() {
            return Err(SimulationError::CapacityExceeded {
                requested: count,
                capacity: self.capacity(),
            });
        }
        Ok(count as u32)
    }

    /// Upload, dispatch `pipeline` over every body, and read the result back
    fn dispatch(
        &self,
        label: &str,
        pipeline: &wgpu::ComputePipeline,
        params: GpuParams,
        bodies: &mut [Body],
    ) -> Result<()> {
        let _guard = self.submission.lock().unwrap_or_else(PoisonError::into_inner);
        let size = bodies.len() as u64 * BODY_SIZE;

        self.queue
            .write_buffer(&self.body_buffer, 0, bytemuck::cast_slice(bodies));
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("N-Body Encoder"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(label),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(pipeline);
            compute_pass.set_bind_group(0, &self.bind_group, &[]);
            compute_pass.dispatch_workgroups(workgroup_count(params.body_count), 1, 1);
        }

        encoder.copy_buffer_to_buffer(&self.body_buffer, 0, &self.staging_buffer, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        self.read_back(bodies, size)
    }

    fn read_back(&self, bodies: &mut [Body], size: u64) -> Result<()> {
        let slice = self.staging_buffer.slice(..size);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map_err(|e| SimulationError::Readback(e.to_string()))?;

        receiver
            .recv()
            .map_err(|e| SimulationError::Readback(e.to_string()))?
            .map_err(|e| SimulationError::Readback(e.to_string()))?;

        {
            let data = slice.get_mapped_range();
            // Cast the (aligned) destination rather than the mapped bytes
            bytemuck::cast_slice_mut::<Body, u8>(bodies).copy_from_slice(&data);
        }
        self.staging_buffer.unmap();

        Ok(())
    }
}

impl Drop for GpuBackend {
    fn drop(&mut self) {
        self.body_buffer.destroy();
        self.staging_buffer.destroy();
        self.params_buffer.destroy();
        log::debug!("Accelerator buffers released");
    }
}

impl Backend for GpuBackend {
    fn name(&self) -> &str {
        "accelerator"
    }

    fn compute_forces(&self, bodies: &mut [Body], gravity: f64) -> Result<f64> {
        validate_bodies(bodies)?;
        let count = self.check_capacity(bodies.len())?;

        let start = Instant::now();
        if count > 0 {
            self.dispatch(
                "Force Compute Pass",
                &self.force_pipeline,
                GpuParams::forces(count, gravity),
                bodies,
            )?;
        }
        let elapsed = start.elapsed().as_secs_f64();

        log::debug!("accelerator compute_forces: {} bodies, {:.6}s", count, elapsed);
        Ok(elapsed)
    }

    fn advance(&self, bodies: &mut [Body], dt: f64, width: f64, height: f64) -> Result<f64> {
        let count = self.check_capacity(bodies.len())?;

        let start = Instant::now();
        if count > 0 {
            self.dispatch(
                "Integration Compute Pass",
                &self.integrate_pipeline,
                GpuParams::integrate(count, dt, width, height),
                bodies,
            )?;
        }
        let elapsed = start.elapsed().as_secs_f64();

        log::debug!("accelerator advance: {} bodies, {:.6}s", count, elapsed);
        Ok(elapsed)
    }
}

fn workgroup_count(body_count: u32) -> u32 {
    body_count.div_ceil(WORKGROUP_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workgroup_count_rounds_up() {
        assert_eq!(workgroup_count(0), 0);
        assert_eq!(workgroup_count(1), 1);
        assert_eq!(workgroup_count(64), 1);
        assert_eq!(workgroup_count(65), 2);
        assert_eq!(workgroup_count(10_000), 157);
    }

    #[test]
    fn test_shaders_mirror_physics_constants() {
        let forces = include_str!("shaders/forces.wgsl");
        assert!(forces.contains("const SOFTENING: f64 = 0.1lf;"));
        assert_eq!(nbody_physics::SOFTENING, 0.1);
        assert!(forces.contains("const DIRECTION_EPSILON: f64 = 0.000001lf;"));
        assert_eq!(nbody_physics::DIRECTION_EPSILON, 0.000001);
    }

    fn validate_wgsl(
        source: &str,
        capabilities: naga::valid::Capabilities,
    ) -> std::result::Result<(), String> {
        let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;
        naga::valid::Validator::new(naga::valid::ValidationFlags::all(), capabilities)
            .validate(&module)
            .map(|_| ())
            .map_err(|e| e.emit_to_string(source))
    }

    #[test]
    fn test_shaders_validate_with_f64() {
        for (name, source) in [
            ("forces.wgsl", include_str!("shaders/forces.wgsl")),
            ("integrate.wgsl", include_str!("shaders/integrate.wgsl")),
        ] {
            if let Err(e) = validate_wgsl(source, naga::valid::Capabilities::FLOAT64) {
                panic!("{name} failed validation:\n{e}");
            }
        }
    }

    #[test]
    fn test_shaders_require_f64() {
        for source in [
            include_str!("shaders/forces.wgsl"),
            include_str!("shaders/integrate.wgsl"),
        ] {
            assert!(validate_wgsl(source, naga::valid::Capabilities::empty()).is_err());
        }
    }

    #[test]
    fn test_shaders_use_declared_workgroup_size() {
        for source in [
            include_str!("shaders/forces.wgsl"),
            include_str!("shaders/integrate.wgsl"),
        ] {
            assert!(source.contains(&format!("@workgroup_size({WORKGROUP_SIZE})")));
        }
    }
}
