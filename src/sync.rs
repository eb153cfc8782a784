//! Blocking host/device boundary.
//!
//! Every helper here submits its work, waits for the device to go idle and
//! checks the error scopes before returning, so the caller never observes a
//! buffer that the device may still be writing.

use std::mem::size_of;

use bytemuck::Pod;
use futures::{channel::oneshot, executor::block_on};
use wgpu::{
    Buffer, BufferDescriptor, BufferUsages, CommandEncoderDescriptor, Device, ErrorFilter,
    Maintain, MapMode, Queue,
};

use crate::error::SimulationError;

/// Runs `f` inside validation and out-of-memory error scopes, then blocks until
/// the device has finished all submitted work.
pub fn blocking<T>(
    device: &Device,
    operation: &'static str,
    f: impl FnOnce() -> T,
) -> Result<T, SimulationError> {
    device.push_error_scope(ErrorFilter::OutOfMemory);
    device.push_error_scope(ErrorFilter::Validation);
    let value = f();
    device.poll(Maintain::Wait);
    let validation = block_on(device.pop_error_scope());
    let out_of_memory = block_on(device.pop_error_scope());
    match validation.or(out_of_memory) {
        Some(error) => Err(SimulationError::Device {
            operation,
            message: error.to_string(),
        }),
        None => Ok(value),
    }
}

/// Waits for any outstanding work, e.g. a renderer still reading shared buffers.
pub fn flush(device: &Device) {
    device.poll(Maintain::Wait);
}

/// Map-readable copy target that is destroyed however the read-back exits.
pub struct StagingBuffer {
    buffer: Buffer,
}

impl Drop for StagingBuffer {
    fn drop(&mut self) {
        self.buffer.destroy();
    }
}

impl StagingBuffer {
    pub fn new(device: &Device, size: u64) -> Self {
        let buffer = device.create_buffer(&BufferDescriptor {
            size,
            label: Some("staging_buffer"),
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        StagingBuffer { buffer }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }
}

/// Copies the first `length` elements of `buffer` back to the host.
pub fn read_buffer<T: Pod>(
    device: &Device,
    queue: &Queue,
    buffer: &Buffer,
    length: usize,
) -> Result<Vec<T>, SimulationError> {
    let size = (size_of::<T>() * length) as u64;
    let staging_buffer = StagingBuffer::new(device, size);

    blocking(device, "read-back", || {
        let mut command_encoder =
            device.create_command_encoder(&CommandEncoderDescriptor { label: None });
        command_encoder.copy_buffer_to_buffer(buffer, 0, staging_buffer.buffer(), 0, size);
        queue.submit(Some(command_encoder.finish()));
    })?;

    let buffer_slice = staging_buffer.buffer().slice(..);
    let (sender, receiver) = oneshot::channel();
    buffer_slice.map_async(MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device.poll(Maintain::Wait);
    block_on(receiver).map_err(|_| SimulationError::MapCanceled)??;

    // the mapped range is only guaranteed to be 8 byte aligned
    let mut values = vec![T::zeroed(); length];
    {
        let data = buffer_slice.get_mapped_range();
        bytemuck::cast_slice_mut::<T, u8>(&mut values).copy_from_slice(&data);
    }
    staging_buffer.buffer().unmap();

    Ok(values)
}

/// Writes `values` to the start of `buffer` and waits until the device sees them.
pub fn write_buffer<T: Pod>(
    device: &Device,
    queue: &Queue,
    buffer: &Buffer,
    values: &[T],
) -> Result<(), SimulationError> {
    blocking(device, "write-through", || {
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(values));
        queue.submit(None);
    })
}
