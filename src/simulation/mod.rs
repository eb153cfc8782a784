use std::mem::size_of;
use std::time::Instant;

use encase::ShaderSize;
use wgpu::{Buffer, BufferDescriptor, BufferUsages, Device};

use crate::common::{Particle, SimulationParams};
use crate::config::SimulationDescriptor;
use crate::context::GpuContext;
use crate::error::SimulationError;
use crate::kernels::{
    self, BindingSet, Kernel, KernelKind, CELL_IDS, LAMBDAS, LOOKUP, PARAMS, PARTICLES,
    PERMUTATION,
};
use crate::spatial_hash::{CellRange, SpatialHash};
use crate::sync;
use crate::wgpu_utilities::QueueUtilities;

pub mod layout;
mod schedule;

pub use schedule::{frame_schedule, Stage};

pub struct Simulation {
    descriptor: SimulationDescriptor,
    particle_count: u32,

    /// host copy of the particle buffer as of the last read-back
    particles: Vec<Particle>,
    /// cell ids the current spatial hash was built from
    cell_ids: Vec<u32>,
    spatial_hash: SpatialHash,

    pub particle_buffer: Buffer,
    cell_id_buffer: Buffer,
    lookup_buffer: Buffer,
    permutation_buffer: Buffer,
    lambda_buffer: Buffer,
    params_buffer: Buffer,

    kernels: Vec<Kernel>,
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.particle_buffer.destroy();
        self.cell_id_buffer.destroy();
        self.lookup_buffer.destroy();
        self.permutation_buffer.destroy();
        self.lambda_buffer.destroy();
        self.params_buffer.destroy();
    }
}

fn storage_buffer(device: &Device, label: &str, size: u64) -> Buffer {
    device.create_buffer(&BufferDescriptor {
        size,
        label: Some(label),
        usage: BufferUsages::STORAGE | BufferUsages::COPY_DST | BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    })
}

impl Simulation {
    pub fn new(
        context: &GpuContext,
        descriptor: &SimulationDescriptor,
    ) -> Result<Self, SimulationError> {
        descriptor.validate()?;
        let GpuContext { device, queue, .. } = context;
        let particle_count = descriptor.particle_count;
        let n = particle_count as u64;
        let c = descriptor.cell_count() as u64;

        let (particle_buffer, cell_id_buffer, lookup_buffer, permutation_buffer, lambda_buffer) =
            sync::blocking(device, "buffer allocation", || {
                let index_size = n * size_of::<u32>() as u64;
                (
                    storage_buffer(
                        device,
                        "Simulation::particle_buffer",
                        n * size_of::<Particle>() as u64,
                    ),
                    storage_buffer(device, "Simulation::cell_id_buffer", index_size),
                    storage_buffer(
                        device,
                        "Simulation::lookup_buffer",
                        c * size_of::<CellRange>() as u64,
                    ),
                    storage_buffer(device, "Simulation::permutation_buffer", index_size),
                    storage_buffer(
                        device,
                        "Simulation::lambda_buffer",
                        n * size_of::<f32>() as u64,
                    ),
                )
            })?;

        let params_buffer = device.create_buffer(&BufferDescriptor {
            size: SimulationParams::SHADER_SIZE.get(),
            label: Some("Simulation::params_buffer"),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let params = SimulationParams::from(descriptor);
        sync::blocking(device, "params upload", || {
            queue.write_encased_uniform_buffer(&params_buffer, &params)?;
            queue.submit(None);
            Ok::<(), SimulationError>(())
        })??;

        let shader_module = kernels::create_shader_module(device);
        let mut kinds = vec![
            KernelKind::ExternalForces,
            KernelKind::AssignCells,
            KernelKind::ComputeLambdas,
            KernelKind::ComputeDisplacements,
            KernelKind::UpdateParticles,
        ];
        if descriptor.confinement {
            kinds.push(KernelKind::Confinement);
        }
        let kernels = kinds
            .into_iter()
            .map(|kind| {
                let bindings = match kind {
                    KernelKind::ExternalForces | KernelKind::UpdateParticles => BindingSet::new()
                        .with(PARTICLES, &particle_buffer)
                        .with(PARAMS, &params_buffer),
                    KernelKind::AssignCells => BindingSet::new()
                        .with(PARTICLES, &particle_buffer)
                        .with(CELL_IDS, &cell_id_buffer)
                        .with(PARAMS, &params_buffer),
                    KernelKind::ComputeLambdas | KernelKind::ComputeDisplacements => {
                        BindingSet::new()
                            .with(PARTICLES, &particle_buffer)
                            .with(LOOKUP, &lookup_buffer)
                            .with(PERMUTATION, &permutation_buffer)
                            .with(LAMBDAS, &lambda_buffer)
                            .with(PARAMS, &params_buffer)
                    }
                    KernelKind::Confinement => BindingSet::new()
                        .with(PARTICLES, &particle_buffer)
                        .with(LOOKUP, &lookup_buffer)
                        .with(PERMUTATION, &permutation_buffer)
                        .with(PARAMS, &params_buffer),
                };
                Kernel::new(device, &shader_module, kind, &bindings)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let particles = layout::lattice(descriptor);
        sync::write_buffer(device, queue, &particle_buffer, &particles)?;

        log::info!(
            "Simulation ready: {} particles, {} cells, {} relaxation iterations",
            particle_count,
            c,
            descriptor.relaxation_iterations
        );

        Ok(Simulation {
            descriptor: descriptor.clone(),
            particle_count,
            particles,
            cell_ids: vec![0; particle_count as usize],
            spatial_hash: SpatialHash::new(particle_count as usize, c as usize),
            particle_buffer,
            cell_id_buffer,
            lookup_buffer,
            permutation_buffer,
            lambda_buffer,
            params_buffer,
            kernels,
        })
    }

    pub fn descriptor(&self) -> &SimulationDescriptor {
        &self.descriptor
    }

    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }

    /// Particle state as of the end of the last completed frame.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn cell_ids(&self) -> &[u32] {
        &self.cell_ids
    }

    pub fn spatial_hash(&self) -> &SpatialHash {
        &self.spatial_hash
    }

    /// Replaces the particle state on both sides of the boundary.
    pub fn upload_particles(
        &mut self,
        context: &GpuContext,
        particles: &[Particle],
    ) -> Result<(), SimulationError> {
        if particles.len() != self.particle_count as usize {
            return Err(SimulationError::InvalidConfig(format!(
                "expected {} particles, got {}",
                self.particle_count,
                particles.len()
            )));
        }
        sync::write_buffer(&context.device, &context.queue, &self.particle_buffer, particles)?;
        self.particles = particles.to_vec();
        Ok(())
    }

    /// Runs one full frame and returns the particle state it produced.
    pub fn step(&mut self, context: &GpuContext) -> Result<&[Particle], SimulationError> {
        let schedule = frame_schedule(
            self.descriptor.relaxation_iterations,
            self.descriptor.confinement,
            self.descriptor.shares_render_resources,
        );
        for stage in schedule {
            let start = Instant::now();
            self.run_stage(context, stage)?;
            log::trace!("{:?} took {:?}", stage, start.elapsed());
        }
        Ok(&self.particles)
    }

    fn kernel(&self, kind: KernelKind) -> Result<&Kernel, SimulationError> {
        self.kernels
            .iter()
            .find(|kernel| kernel.kind() == kind)
            .ok_or(SimulationError::MissingKernel(kind.signature().name))
    }

    fn run_stage(&mut self, context: &GpuContext, stage: Stage) -> Result<(), SimulationError> {
        let GpuContext { device, queue, .. } = context;
        match stage {
            Stage::Flush => sync::flush(device),
            Stage::Dispatch(kind) => {
                self.kernel(kind)?
                    .dispatch(device, queue, self.particle_count)?;
            }
            Stage::RebuildSpatialHash => self.rebuild_spatial_hash(context)?,
            Stage::ReadParticles => {
                self.particles = sync::read_buffer(
                    device,
                    queue,
                    &self.particle_buffer,
                    self.particle_count as usize,
                )?;
            }
        }
        Ok(())
    }

    /// Read-back, host rebuild and write-through of the neighbour index.
    ///
    /// Any failure leaves the device index stale, so the caller must abandon the frame.
    fn rebuild_spatial_hash(&mut self, context: &GpuContext) -> Result<(), SimulationError> {
        let GpuContext { device, queue, .. } = context;
        let cell_ids = sync::read_buffer::<u32>(
            device,
            queue,
            &self.cell_id_buffer,
            self.particle_count as usize,
        )?;

        self.spatial_hash.rebuild(&cell_ids);
        self.cell_ids = cell_ids;

        sync::write_buffer(
            device,
            queue,
            &self.permutation_buffer,
            self.spatial_hash.permutation(),
        )?;
        sync::write_buffer(device, queue, &self.lookup_buffer, self.spatial_hash.lookup())
    }
}
