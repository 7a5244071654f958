// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::bitmap::Bitmap;
use crate::imp::{BoundDevice, Error};
use crate::pixel_formats::{BYTES_PER_PIXEL, TEXTURE_FORMAT};
use wgpu::{Extent3d, TexelCopyBufferLayout, TexelCopyTextureInfo, TextureUsages};

/**
A 2D RGBA texture with its default view.

Dropping a texture destroys the GPU allocation right away rather than waiting for the
last wgpu handle to go.
*/
#[derive(Debug)]
pub struct Texture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl Texture {
    fn create(
        device: &BoundDevice,
        label: &'static str,
        width: u32,
        height: u32,
        usage: TextureUsages,
    ) -> Result<Self, Error> {
        let texture = device.scoped(label, |device| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TEXTURE_FORMAT,
                usage,
                view_formats: &[],
            })
        })?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            ..Default::default()
        });
        Ok(Texture {
            texture,
            view,
            width,
            height,
        })
    }

    /// A sampled texture holding `bitmap`.  The bitmap must not be empty.
    pub fn upload(device: &BoundDevice, label: &'static str, bitmap: &Bitmap) -> Result<Self, Error> {
        let texture = Self::create(
            device,
            label,
            bitmap.width(),
            bitmap.height(),
            TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        )?;
        texture.write(device, bitmap);
        Ok(texture)
    }

    /// A texture that can be drawn into, sampled by a later pass, and copied out.
    pub fn render_target(
        device: &BoundDevice,
        label: &'static str,
        width: u32,
        height: u32,
    ) -> Result<Self, Error> {
        Self::create(
            device,
            label,
            width,
            height,
            TextureUsages::RENDER_ATTACHMENT
                | TextureUsages::TEXTURE_BINDING
                | TextureUsages::COPY_SRC,
        )
    }

    /// Replaces the contents with a bitmap of the same size.
    pub fn write(&self, device: &BoundDevice, bitmap: &Bitmap) {
        assert_eq!(
            (bitmap.width(), bitmap.height()),
            (self.width, self.height),
            "bitmap size doesn't match texture"
        );
        device.queue().write_texture(
            TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bitmap.as_bytes(),
            TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width * BYTES_PER_PIXEL as u32),
                rows_per_image: None,
            },
            Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.texture.destroy();
    }
}
