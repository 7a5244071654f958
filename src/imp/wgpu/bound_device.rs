// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::imp::Error;
use std::sync::Arc;
use wgpu::{ErrorFilter, Limits, Trace};

#[derive(Debug)]
struct BoundDeviceResources {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter: wgpu::Adapter,
}

/// Device, queue and adapter, shared by every clone.
#[derive(Debug, Clone)]
pub struct BoundDevice {
    resources: Arc<BoundDeviceResources>,
}

impl BoundDevice {
    pub(crate) async fn bind(
        unbound_device: crate::images::device::UnboundDevice,
    ) -> Result<Self, Error> {
        let adapter = unbound_device.0.adapter;
        //start from the portable defaults, but take whatever texture size the
        //adapter offers since it bounds the atlas side
        let limits = Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits());
        let descriptor = wgpu::DeviceDescriptor {
            label: wgpu::Label::from("frame_shift device"),
            required_features: Default::default(),
            required_limits: limits,
            memory_hints: Default::default(),
            trace: Trace::Off,
        };
        let (device, queue) = adapter.request_device(&descriptor).await?;
        logwise::info_sync!(
            "bound device, max texture side {side}",
            side = device.limits().max_texture_dimension_2d
        );
        Ok(BoundDevice {
            resources: Arc::new(BoundDeviceResources {
                device,
                queue,
                adapter,
            }),
        })
    }

    pub(crate) fn device(&self) -> &wgpu::Device {
        &self.resources.device
    }

    pub(crate) fn queue(&self) -> &wgpu::Queue {
        &self.resources.queue
    }

    pub(crate) fn adapter(&self) -> &wgpu::Adapter {
        &self.resources.adapter
    }

    pub(crate) fn max_texture_side(&self) -> u32 {
        self.resources.device.limits().max_texture_dimension_2d
    }

    /**
    Runs `f` inside out-of-memory and validation error scopes.

    wgpu reports allocation failures asynchronously through the device's error handler,
    which panics by default.  Scoping turns them into an [Error] for the caller instead.
    */
    pub(crate) fn scoped<R>(
        &self,
        label: &'static str,
        f: impl FnOnce(&wgpu::Device) -> R,
    ) -> Result<R, Error> {
        let device = self.device();
        device.push_error_scope(ErrorFilter::OutOfMemory);
        device.push_error_scope(ErrorFilter::Validation);
        let r = f(device);
        let validation = pollster::block_on(device.pop_error_scope());
        let memory = pollster::block_on(device.pop_error_scope());
        if let Some(error) = memory {
            logwise::error_sync!(
                "out of memory creating {label}: {error}",
                label = logwise::privacy::LogIt(&label),
                error = logwise::privacy::LogIt(&error)
            );
            return Err(Error::OutOfMemory(label));
        }
        if let Some(error) = validation {
            logwise::error_sync!(
                "validation error creating {label}: {error}",
                label = logwise::privacy::LogIt(&label),
                error = logwise::privacy::LogIt(&error)
            );
            return Err(match error {
                wgpu::Error::OutOfMemory { .. } => Error::OutOfMemory(label),
                other => Error::Validation {
                    label,
                    message: other.to_string(),
                },
            });
        }
        Ok(r)
    }
}
