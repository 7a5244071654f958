// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::imp::{BoundDevice, Error};
use crate::pixel_formats::as_bytes;
use crate::pixel_formats::sealed::ReprC;
use wgpu::BufferUsages;
use wgpu::util::DeviceExt;

/// A GPU buffer initialized from CPU values.  Destroyed on drop.
#[derive(Debug)]
pub struct Buffer {
    buffer: wgpu::Buffer,
}

impl Buffer {
    fn new<T: ReprC>(
        device: &BoundDevice,
        label: &'static str,
        contents: &[T],
        usage: BufferUsages,
    ) -> Result<Self, Error> {
        let buffer = device.scoped(label, |device| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: as_bytes(contents),
                usage,
            })
        })?;
        Ok(Buffer { buffer })
    }

    pub fn uniform<T: ReprC>(device: &BoundDevice, label: &'static str, value: &T) -> Result<Self, Error> {
        Self::new(
            device,
            label,
            std::slice::from_ref(value),
            BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        )
    }

    pub fn vertex<T: ReprC>(device: &BoundDevice, label: &'static str, vertices: &[T]) -> Result<Self, Error> {
        Self::new(
            device,
            label,
            vertices,
            BufferUsages::VERTEX | BufferUsages::COPY_DST,
        )
    }

    /// Overwrites the start of the buffer with `value`.
    pub fn write<T: ReprC>(&self, device: &BoundDevice, value: &T) {
        device
            .queue()
            .write_buffer(&self.buffer, 0, as_bytes(std::slice::from_ref(value)));
    }

    pub fn write_slice<T: ReprC>(&self, device: &BoundDevice, values: &[T]) {
        device.queue().write_buffer(&self.buffer, 0, as_bytes(values));
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.buffer.destroy();
    }
}
