use std::path::Path;

use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::SimulationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationDescriptor {
    /// number of particles, fixed for the lifetime of the simulation
    pub particle_count: u32,

    /// minimum corner of the uniform hashing grid
    pub grid_origin: Vec3,
    /// number of cells within each axis of the hashing grid
    pub grid_dimensions: UVec3,
    /// edge length of a grid cell, should be at least `smoothing_radius`
    pub cell_size: f32,

    /// number of lambda/displacement passes per frame, zero skips the density solve
    pub relaxation_iterations: u32,
    pub time_step: f32,
    pub gravity: Vec3,
    pub rest_density: f32,
    pub particle_mass: f32,
    pub smoothing_radius: f32,
    /// constraint force mixing term added to the lambda denominator
    pub relaxation_epsilon: f32,
    pub bounds_min: Vec3,
    pub bounds_max: Vec3,
    /// run the confinement kernel after the position update
    pub confinement: bool,
    pub confinement_strength: f32,
    pub viscosity: f32,

    /// lattice spacing of the initial particle block
    pub particle_spacing: f32,
    /// maximum random offset applied to each initial lattice position
    pub jitter: f32,
    pub seed: u64,

    /// zero-based index into the enumerated adapters, as printed in the adapter listing;
    /// `None` picks the high performance default
    pub adapter_index: Option<usize>,
    /// flush outstanding device work before the first dispatch of every frame
    pub shares_render_resources: bool,
    /// stop after this many frames, `None` runs until the process is killed
    pub frame_limit: Option<u64>,
    /// scale applied to each particle's render instance
    pub render_radius: f32,
}

impl Default for SimulationDescriptor {
    fn default() -> Self {
        SimulationDescriptor {
            particle_count: 1000,
            grid_origin: Vec3::splat(-1.0),
            grid_dimensions: UVec3::splat(10),
            cell_size: 0.2,
            relaxation_iterations: 5,
            time_step: 1.0 / 60.0,
            gravity: Vec3::new(0.0, -9.8, 0.0),
            rest_density: 1000.0,
            particle_mass: 1.0,
            smoothing_radius: 0.2,
            relaxation_epsilon: 100.0,
            bounds_min: Vec3::splat(-1.0),
            bounds_max: Vec3::splat(1.0),
            confinement: false,
            confinement_strength: 0.0005,
            viscosity: 0.01,
            particle_spacing: 0.1,
            jitter: 0.0,
            seed: 0,
            adapter_index: None,
            shares_render_resources: false,
            frame_limit: None,
            render_radius: 0.02,
        }
    }
}

impl SimulationDescriptor {
    pub fn load_json(path: &Path) -> Result<Self, SimulationError> {
        let json = std::fs::read_to_string(path)?;
        let descriptor: SimulationDescriptor = serde_json::from_str(&json)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// total number of cells `C` in the hashing grid
    pub fn cell_count(&self) -> u32 {
        let UVec3 { x, y, z } = self.grid_dimensions;
        x * y * z
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.particle_count == 0 {
            return invalid("particle_count must be greater than zero");
        }
        if self.grid_dimensions.min_element() == 0 {
            return invalid("grid_dimensions must be non-zero on every axis");
        }
        let UVec3 { x, y, z } = self.grid_dimensions;
        if x as u64 * y as u64 * z as u64 > i32::MAX as u64 {
            return invalid("grid has more cells than a lookup offset can address");
        }
        if self.particle_count > i32::MAX as u32 {
            return invalid("particle_count exceeds the range of a lookup offset");
        }
        for (name, value) in [
            ("cell_size", self.cell_size),
            ("time_step", self.time_step),
            ("rest_density", self.rest_density),
            ("particle_mass", self.particle_mass),
            ("smoothing_radius", self.smoothing_radius),
            ("particle_spacing", self.particle_spacing),
        ] {
            if !(value > 0.0) {
                return invalid(format!("{name} must be positive"));
            }
        }
        if self.bounds_min.cmpge(self.bounds_max).any() {
            return invalid("bounds_min must be below bounds_max on every axis");
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> Result<(), SimulationError> {
    Err(SimulationError::InvalidConfig(message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_descriptor_is_valid() {
        let descriptor = SimulationDescriptor::default();
        assert!(descriptor.validate().is_ok());
        assert_eq!(descriptor.cell_count(), 1000);
        assert_eq!(descriptor.relaxation_iterations, 5);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let descriptor: SimulationDescriptor =
            serde_json::from_str(r#"{ "particle_count": 1200, "relaxation_iterations": 3 }"#)
                .unwrap();
        assert_eq!(descriptor.particle_count, 1200);
        assert_eq!(descriptor.relaxation_iterations, 3);
        assert_eq!(descriptor.grid_dimensions, UVec3::splat(10));
    }

    #[test]
    fn rejects_empty_grid() {
        let descriptor = SimulationDescriptor {
            grid_dimensions: UVec3::new(4, 0, 4),
            ..Default::default()
        };
        assert!(matches!(
            descriptor.validate(),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn accepts_frames_without_relaxation() {
        let descriptor = SimulationDescriptor {
            relaxation_iterations: 0,
            ..Default::default()
        };
        assert!(descriptor.validate().is_ok());
    }

    #[test]
    fn rejects_zero_particles() {
        let descriptor = SimulationDescriptor {
            particle_count: 0,
            ..Default::default()
        };
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn rejects_inverted_bounds() {
        let descriptor = SimulationDescriptor {
            bounds_min: Vec3::splat(1.0),
            bounds_max: Vec3::splat(-1.0),
            ..Default::default()
        };
        assert!(descriptor.validate().is_err());
    }
}
