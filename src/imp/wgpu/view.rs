// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::imp::{BoundDevice, Error};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::sync::Arc;
use wgpu::{CompositeAlphaMode, TextureFormat};

/// A window surface and the format chosen for it.
#[derive(Debug)]
pub struct Surface {
    surface: wgpu::Surface<'static>,
    format: Option<TextureFormat>,
}

impl Surface {
    /**
    Creates a surface for `window`.

    The surface keeps the window alive, so the window outlives every frame presented to it.
    */
    pub fn new<W>(
        entry_point: &crate::entry_point::EntryPoint,
        window: Arc<W>,
    ) -> Result<Self, Error>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let surface = entry_point.0.0.create_surface(window)?;
        Ok(Surface {
            surface,
            format: None,
        })
    }

    pub(crate) fn wgpu_surface(&self) -> &wgpu::Surface<'static> {
        &self.surface
    }

    /// Picks a format on first use and (re)configures for `width`x`height`.
    pub(crate) fn configure(&mut self, device: &BoundDevice, width: u32, height: u32) -> TextureFormat {
        let format = match self.format {
            Some(format) => format,
            None => {
                let capabilities = self.surface.get_capabilities(device.adapter());
                //mask colors are integers, so avoid an sRGB conversion on the way out
                let selected = capabilities
                    .formats
                    .iter()
                    .copied()
                    .find(|f| !f.is_srgb())
                    .or_else(|| capabilities.formats.first().copied())
                    .unwrap_or(TextureFormat::Bgra8Unorm);
                logwise::info_sync!(
                    "Available surface formats: {formats}, Selected: {selected}",
                    formats = logwise::privacy::LogIt(&capabilities.formats),
                    selected = logwise::privacy::LogIt(&selected)
                );
                self.format = Some(selected);
                selected
            }
        };
        self.surface.configure(
            device.device(),
            &wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width,
                height,
                present_mode: wgpu::PresentMode::Fifo,
                desired_maximum_frame_latency: 1,
                alpha_mode: CompositeAlphaMode::Auto,
                view_formats: vec![],
            },
        );
        format
    }

    pub(crate) fn acquire(&self) -> Result<wgpu::SurfaceTexture, Error> {
        Ok(self.surface.get_current_texture()?)
    }
}
