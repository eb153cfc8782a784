use crate::kernels::KernelKind;

/// One blocking step of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// wait for outstanding device work submitted by other users of the shared buffers
    Flush,
    Dispatch(KernelKind),
    /// read back cell ids, rebuild on the host and write the index buffers through
    RebuildSpatialHash,
    ReadParticles,
}

/// The fixed per-frame order of dispatches and transfers.
pub fn frame_schedule(relaxation_iterations: u32, confinement: bool, flush: bool) -> Vec<Stage> {
    let mut stages = Vec::with_capacity(7 + 2 * relaxation_iterations as usize);
    if flush {
        stages.push(Stage::Flush);
    }
    stages.push(Stage::Dispatch(KernelKind::ExternalForces));
    stages.push(Stage::Dispatch(KernelKind::AssignCells));
    stages.push(Stage::RebuildSpatialHash);
    for _ in 0..relaxation_iterations {
        stages.push(Stage::Dispatch(KernelKind::ComputeLambdas));
        stages.push(Stage::Dispatch(KernelKind::ComputeDisplacements));
    }
    stages.push(Stage::Dispatch(KernelKind::UpdateParticles));
    if confinement {
        stages.push(Stage::Dispatch(KernelKind::Confinement));
    }
    stages.push(Stage::ReadParticles);
    stages
}
