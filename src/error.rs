use thiserror::Error;
use wgpu::{BufferAsyncError, RequestDeviceError};

/// Every error in this crate is terminal for the frame loop; callers log it and exit.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("no compatible adapter found")]
    NoAdapter,

    #[error("adapter index {index} out of range, {available} adapter(s) available")]
    AdapterOutOfRange { index: usize, available: usize },

    #[error("failed to request device: {0}")]
    RequestDevice(#[from] RequestDeviceError),

    #[error("failed to map buffer: {0}")]
    BufferMap(#[from] BufferAsyncError),

    #[error("buffer mapping was canceled before completion")]
    MapCanceled,

    #[error("failed to encode uniform data: {0}")]
    Encode(#[from] encase::internal::Error),

    #[error("{operation} failed: {message}")]
    Device {
        operation: &'static str,
        message: String,
    },

    #[error("kernel `{kernel}` expects bindings {expected:?}, got {found:?}")]
    BindingMismatch {
        kernel: &'static str,
        expected: Vec<&'static str>,
        found: Vec<&'static str>,
    },

    #[error("kernel `{0}` was not built for this simulation")]
    MissingKernel(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
