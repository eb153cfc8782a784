use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::common::Particle;

/// Per-particle instance data handed to an external renderer.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleInstance {
    pub colour: [f32; 4],
    pub matrix: [f32; 4 * 4],
}
unsafe impl Zeroable for ParticleInstance {}
unsafe impl Pod for ParticleInstance {}

impl ParticleInstance {
    pub fn from_particle(particle: &Particle, radius: f32) -> Self {
        let matrix =
            Mat4::from_translation(particle.position()) * Mat4::from_scale(Vec3::splat(radius));
        // slow particles are blue, fast ones fade towards white
        let speed = 1.0 - (-particle.velocity().length()).exp();
        ParticleInstance {
            colour: Vec4::new(speed, speed, 1.0, 1.0).to_array(),
            matrix: matrix.to_cols_array(),
        }
    }
}

pub fn derive_instances(particles: &[Particle], radius: f32) -> Vec<ParticleInstance> {
    particles
        .iter()
        .map(|particle| ParticleInstance::from_particle(particle, radius))
        .collect()
}
