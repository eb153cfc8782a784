use std::{
    path::PathBuf,
    process,
    time::{Duration, Instant},
};

use futures::executor::block_on;

use pbf::{
    instances::derive_instances, GpuContext, Simulation, SimulationDescriptor, SimulationError,
};

const STATS_INTERVAL: Duration = Duration::from_millis(250);

fn main() {
    env_logger::init();

    if let Err(error) = block_on(async_main()) {
        log::error!("{error}");
        process::exit(1);
    }
}

async fn async_main() -> Result<(), SimulationError> {
    let descriptor = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            log::info!("Loading configuration from {:?}", path);
            SimulationDescriptor::load_json(&path)?
        }
        None => SimulationDescriptor::default(),
    };

    let context = GpuContext::new(&descriptor).await?;
    let mut simulation = Simulation::new(&context, &descriptor)?;

    let mut frame: u64 = 0;
    let mut frames_since_stats = 0u32;
    let mut last_stats = Instant::now();

    while descriptor.frame_limit.map_or(true, |limit| frame < limit) {
        let particles = simulation.step(&context)?;
        let instances = derive_instances(particles, descriptor.render_radius);
        log::trace!("frame {}: {} instances", frame, instances.len());

        frame += 1;
        frames_since_stats += 1;
        let elapsed = last_stats.elapsed();
        if elapsed > STATS_INTERVAL {
            let fps = frames_since_stats as f64 / elapsed.as_secs_f64();
            log::info!("FPS: {:.3}    Frame Time: {:.3} (ms)", fps, 1000.0 / fps);
            frames_since_stats = 0;
            last_stats = Instant::now();
        }
    }

    log::info!("Finished after {} frames", frame);
    Ok(())
}
