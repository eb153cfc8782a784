use wgpu::{
    Adapter, Backends, Device, DeviceDescriptor, Features, Instance, Limits, PowerPreference,
    Queue, RequestAdapterOptions,
};

use crate::config::SimulationDescriptor;
use crate::error::SimulationError;

pub struct GpuContext {
    pub device: Device,
    pub queue: Queue,
}

impl GpuContext {
    pub async fn new(descriptor: &SimulationDescriptor) -> Result<Self, SimulationError> {
        let instance = Instance::default();
        let adapter = Self::pick_adapter(&instance, descriptor.adapter_index).await?;

        let info = adapter.get_info();
        log::info!(
            "Using adapter: {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );
        let limits = adapter.limits();
        log::info!(
            "Max compute invocations per workgroup: {}",
            limits.max_compute_invocations_per_workgroup
        );

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("pbf"),
                    features: Features::empty(),
                    limits: Limits::downlevel_defaults().using_resolution(limits),
                },
                None,
            )
            .await?;

        Ok(GpuContext { device, queue })
    }

    async fn pick_adapter(
        instance: &Instance,
        adapter_index: Option<usize>,
    ) -> Result<Adapter, SimulationError> {
        let mut adapters: Vec<Adapter> = instance.enumerate_adapters(Backends::all()).collect();
        log::info!("Available adapters:");
        for (i, adapter) in adapters.iter().enumerate() {
            let info = adapter.get_info();
            log::info!("\t{}: {} ({:?})", i, info.name, info.backend);
        }

        match adapter_index {
            Some(index) => {
                let index = checked_adapter_index(index, adapters.len())?;
                Ok(adapters.swap_remove(index))
            }
            None => instance
                .request_adapter(&RequestAdapterOptions {
                    power_preference: PowerPreference::HighPerformance,
                    force_fallback_adapter: false,
                    compatible_surface: None,
                })
                .await
                .ok_or(SimulationError::NoAdapter),
        }
    }
}

/// `index` is zero-based, matching the numbers printed by the adapter listing.
fn checked_adapter_index(index: usize, available: usize) -> Result<usize, SimulationError> {
    if index < available {
        Ok(index)
    } else {
        Err(SimulationError::AdapterOutOfRange { index, available })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_numbers_select_the_same_adapter() {
        assert_eq!(checked_adapter_index(0, 1).unwrap(), 0);
        assert_eq!(checked_adapter_index(2, 3).unwrap(), 2);
    }

    #[test]
    fn index_past_last_listed_adapter_is_rejected() {
        assert!(matches!(
            checked_adapter_index(1, 1),
            Err(SimulationError::AdapterOutOfRange {
                index: 1,
                available: 1
            })
        ));
        assert!(checked_adapter_index(0, 0).is_err());
    }
}
