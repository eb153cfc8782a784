use std::borrow::Cow;

use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, Buffer, CommandEncoderDescriptor,
    ComputePassDescriptor, ComputePipeline, ComputePipelineDescriptor, Device, Queue,
    ShaderModule, ShaderModuleDescriptor, ShaderSource,
};

use crate::error::SimulationError;
use crate::sync;

#[include_wgsl_oil::include_wgsl_oil("pbf.wgsl")]
mod shader {}

pub const PARTICLES: &str = "particles";
pub const CELL_IDS: &str = "cell_ids";
pub const LOOKUP: &str = "lookup";
pub const PERMUTATION: &str = "permutation";
pub const LAMBDAS: &str = "lambdas";
pub const PARAMS: &str = "params";

/// Binding index declared in the shader for a named global.
pub fn binding_index(name: &str) -> Option<u32> {
    match name {
        PARTICLES => Some(shader::globals::particles::binding::BINDING),
        CELL_IDS => Some(shader::globals::cell_ids::binding::BINDING),
        LOOKUP => Some(shader::globals::lookup::binding::BINDING),
        PERMUTATION => Some(shader::globals::permutation::binding::BINDING),
        LAMBDAS => Some(shader::globals::lambdas::binding::BINDING),
        PARAMS => Some(shader::globals::params::binding::BINDING),
        _ => None,
    }
}

/// Global work size for `count` items: `count` padded up to a whole number of groups.
///
/// Items at or beyond `count` are dispatched and must be ignored by the kernel.
pub fn dispatch_size(count: u32, workgroup_size: u32) -> u32 {
    count.div_ceil(workgroup_size) * workgroup_size
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelKind {
    ExternalForces,
    AssignCells,
    ComputeLambdas,
    ComputeDisplacements,
    UpdateParticles,
    Confinement,
}

#[derive(Debug, Clone, Copy)]
pub struct KernelSignature {
    pub name: &'static str,
    pub entry_point: &'static str,
    pub workgroup_size: [u32; 3],
    /// binding names in binding order
    pub bindings: &'static [&'static str],
}

impl KernelKind {
    pub const ALL: [KernelKind; 6] = [
        KernelKind::ExternalForces,
        KernelKind::AssignCells,
        KernelKind::ComputeLambdas,
        KernelKind::ComputeDisplacements,
        KernelKind::UpdateParticles,
        KernelKind::Confinement,
    ];

    pub fn signature(self) -> KernelSignature {
        use self::shader::entry_points as entry;

        match self {
            KernelKind::ExternalForces => KernelSignature {
                name: "external-force",
                entry_point: entry::apply_external_forces::NAME,
                workgroup_size: entry::apply_external_forces::WORKGROUP_SIZE,
                bindings: &[PARTICLES, PARAMS],
            },
            KernelKind::AssignCells => KernelSignature {
                name: "cell-assign",
                entry_point: entry::assign_cells::NAME,
                workgroup_size: entry::assign_cells::WORKGROUP_SIZE,
                bindings: &[PARTICLES, CELL_IDS, PARAMS],
            },
            KernelKind::ComputeLambdas => KernelSignature {
                name: "lambda",
                entry_point: entry::compute_lambdas::NAME,
                workgroup_size: entry::compute_lambdas::WORKGROUP_SIZE,
                bindings: &[PARTICLES, LOOKUP, PERMUTATION, LAMBDAS, PARAMS],
            },
            KernelKind::ComputeDisplacements => KernelSignature {
                name: "displacement",
                entry_point: entry::compute_displacements::NAME,
                workgroup_size: entry::compute_displacements::WORKGROUP_SIZE,
                bindings: &[PARTICLES, LOOKUP, PERMUTATION, LAMBDAS, PARAMS],
            },
            KernelKind::UpdateParticles => KernelSignature {
                name: "update",
                entry_point: entry::update_particles::NAME,
                workgroup_size: entry::update_particles::WORKGROUP_SIZE,
                bindings: &[PARTICLES, PARAMS],
            },
            KernelKind::Confinement => KernelSignature {
                name: "confinement",
                entry_point: entry::apply_confinement::NAME,
                workgroup_size: entry::apply_confinement::WORKGROUP_SIZE,
                bindings: &[PARTICLES, LOOKUP, PERMUTATION, PARAMS],
            },
        }
    }
}

/// Buffers for one kernel, addressed by binding name rather than position.
#[derive(Default)]
pub struct BindingSet<'a> {
    entries: Vec<(&'static str, &'a Buffer)>,
}

impl<'a> BindingSet<'a> {
    pub fn new() -> Self {
        BindingSet {
            entries: Vec::new(),
        }
    }

    pub fn with(mut self, name: &'static str, buffer: &'a Buffer) -> Self {
        self.entries.push((name, buffer));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(name, _)| *name).collect()
    }
}

impl KernelSignature {
    /// Checks `names` against the declared binding list, order included.
    pub fn validate(&self, names: &[&'static str]) -> Result<(), SimulationError> {
        let declared = self
            .bindings
            .iter()
            .all(|name| binding_index(name).is_some());
        if !declared || names != self.bindings {
            return Err(SimulationError::BindingMismatch {
                kernel: self.name,
                expected: self.bindings.to_vec(),
                found: names.to_vec(),
            });
        }
        Ok(())
    }
}

pub fn create_shader_module(device: &Device) -> ShaderModule {
    device.create_shader_module(ShaderModuleDescriptor {
        label: Some("pbf"),
        source: ShaderSource::Wgsl(Cow::Borrowed(shader::SOURCE)),
    })
}

pub struct Kernel {
    kind: KernelKind,
    pipeline: ComputePipeline,
    bind_group: BindGroup,
}

impl Kernel {
    pub fn new(
        device: &Device,
        shader_module: &ShaderModule,
        kind: KernelKind,
        bindings: &BindingSet,
    ) -> Result<Self, SimulationError> {
        let signature = kind.signature();
        signature.validate(&bindings.names())?;

        sync::blocking(device, "kernel build", || {
            let pipeline = device.create_compute_pipeline(&ComputePipelineDescriptor {
                label: Some(signature.name),
                layout: None,
                module: shader_module,
                entry_point: signature.entry_point,
            });

            let entries: Vec<BindGroupEntry> = bindings
                .entries
                .iter()
                .filter_map(|(name, buffer)| {
                    binding_index(name).map(|binding| BindGroupEntry {
                        binding,
                        resource: buffer.as_entire_binding(),
                    })
                })
                .collect();
            let bind_group = device.create_bind_group(&BindGroupDescriptor {
                label: Some(signature.name),
                layout: &pipeline.get_bind_group_layout(0),
                entries: &entries,
            });

            Kernel {
                kind,
                pipeline,
                bind_group,
            }
        })
    }

    pub fn kind(&self) -> KernelKind {
        self.kind
    }

    /// Work-group size the kernel was compiled for, re-read on every dispatch.
    pub fn preferred_workgroup_size(&self) -> u32 {
        self.kind.signature().workgroup_size[0]
    }

    /// Runs one work item per particle and blocks until the device is done.
    pub fn dispatch(
        &self,
        device: &Device,
        queue: &Queue,
        particle_count: u32,
    ) -> Result<(), SimulationError> {
        let workgroup_size = self.preferred_workgroup_size();
        let global_size = dispatch_size(particle_count, workgroup_size);

        sync::blocking(device, self.kind.signature().name, || {
            let mut command_encoder =
                device.create_command_encoder(&CommandEncoderDescriptor { label: None });
            {
                let mut compute_pass = command_encoder
                    .begin_compute_pass(&ComputePassDescriptor { label: None });
                compute_pass.set_pipeline(&self.pipeline);
                compute_pass.set_bind_group(0, &self.bind_group, &[]);
                compute_pass.dispatch_workgroups(global_size / workgroup_size, 1, 1);
            }
            queue.submit(Some(command_encoder.finish()));
        })
    }
}
