// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("can't create surface {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no such adapter")]
    NoSuchAdapter,
    #[error("can't create device {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("out of GPU memory creating {0}")]
    OutOfMemory(&'static str),
    #[error("GPU rejected {label}: {message}")]
    Validation { label: &'static str, message: String },
    #[error("can't map readback buffer {0}")]
    Map(#[from] wgpu::BufferAsyncError),
    #[error("device poll failed {0}")]
    Poll(#[from] wgpu::PollError),
    #[error("surface texture unavailable {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

impl Error {
    /// What was being created when GPU memory ran out, for exhaustion failures.
    pub fn exhausted(&self) -> Option<&'static str> {
        match self {
            Error::OutOfMemory(label) => Some(*label),
            _ => None,
        }
    }
}
