use glam::{UVec3, Vec3};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::common::Particle;
use crate::config::SimulationDescriptor;

/// smallest `side` with `side³ >= count`
fn lattice_side(count: u32) -> u32 {
    let mut side = (count as f64).cbrt().floor() as u32;
    while side * side * side < count {
        side += 1;
    }
    side.max(1)
}

/// Places particles at rest on a cubic lattice centred in the domain.
pub fn lattice(descriptor: &SimulationDescriptor) -> Vec<Particle> {
    let side = lattice_side(descriptor.particle_count);
    let spacing = descriptor.particle_spacing;
    let centre = (descriptor.bounds_min + descriptor.bounds_max) * 0.5;
    let start = centre - Vec3::splat(spacing * (side - 1) as f32 * 0.5);
    let mut rng = StdRng::seed_from_u64(descriptor.seed);
    let jitter = descriptor.jitter;

    (0..descriptor.particle_count)
        .map(|i| {
            let coordinate = UVec3::new(i % side, (i / side) % side, i / (side * side));
            let mut position = start + coordinate.as_vec3() * spacing;
            if jitter > 0.0 {
                position += Vec3::new(
                    rng.gen_range(-jitter..=jitter),
                    rng.gen_range(-jitter..=jitter),
                    rng.gen_range(-jitter..=jitter),
                );
            }
            Particle::at_rest(position.clamp(descriptor.bounds_min, descriptor.bounds_max))
        })
        .collect()
}
