//! Host-side orchestration of a Position Based Fluids simulation running as wgpu
//! compute kernels.
//!
//! Each frame is a fixed sequence of blocking dispatches and transfers (see
//! [`simulation::frame_schedule`]). Between cell assignment and the density
//! solve, cell ids are read back and the neighbour index is rebuilt on the host
//! by [`spatial_hash::SpatialHash`] before being written through to the device.

pub mod common;
pub mod config;
pub mod context;
pub mod error;
pub mod instances;
pub mod kernels;
pub mod simulation;
pub mod spatial_hash;
pub mod sync;
pub mod wgpu_utilities;

pub use common::Particle;
pub use config::SimulationDescriptor;
pub use context::GpuContext;
pub use error::SimulationError;
pub use simulation::Simulation;
