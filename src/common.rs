use bytemuck::{Pod, Zeroable};
use encase::ShaderType;
use glam::{UVec3, Vec3};

use crate::config::SimulationDescriptor;

#[repr(C, align(16))]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: [f32; 3],
    _padding_0: f32,
    pub velocity: [f32; 3],
    _padding_1: f32,
    /// position after unconstrained integration, before constraint projection
    pub predicted: [f32; 3],
    _padding_2: f32,
}
unsafe impl Zeroable for Particle {}
unsafe impl Pod for Particle {}

impl Particle {
    pub fn at_rest(position: Vec3) -> Self {
        Particle {
            position: position.to_array(),
            predicted: position.to_array(),
            ..Default::default()
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn velocity(&self) -> Vec3 {
        Vec3::from_array(self.velocity)
    }
}

/// Uniform block bound as `params` by every kernel.
#[derive(Debug, Clone, Copy, ShaderType)]
pub struct SimulationParams {
    pub grid_origin: Vec3,
    pub cell_size: f32,
    pub grid_dimensions: UVec3,
    pub particle_count: u32,
    pub gravity: Vec3,
    pub time_step: f32,
    pub bounds_min: Vec3,
    pub rest_density: f32,
    pub bounds_max: Vec3,
    pub particle_mass: f32,
    pub smoothing_radius: f32,
    pub relaxation_epsilon: f32,
    pub confinement_strength: f32,
    pub viscosity: f32,
}

impl From<&SimulationDescriptor> for SimulationParams {
    fn from(descriptor: &SimulationDescriptor) -> Self {
        SimulationParams {
            grid_origin: descriptor.grid_origin,
            cell_size: descriptor.cell_size,
            grid_dimensions: descriptor.grid_dimensions,
            particle_count: descriptor.particle_count,
            gravity: descriptor.gravity,
            time_step: descriptor.time_step,
            bounds_min: descriptor.bounds_min,
            rest_density: descriptor.rest_density,
            bounds_max: descriptor.bounds_max,
            particle_mass: descriptor.particle_mass,
            smoothing_radius: descriptor.smoothing_radius,
            relaxation_epsilon: descriptor.relaxation_epsilon,
            confinement_strength: descriptor.confinement_strength,
            viscosity: descriptor.viscosity,
        }
    }
}
