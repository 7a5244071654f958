// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Blocking texture readback.

use crate::imp::{BoundDevice, Error, Texture};
use crate::pixel_formats::{BYTES_PER_PIXEL, aligned_bytes_per_row};

/**
Copies `texture` into a fresh buffer and returns its pixels tightly packed, top row first.

The copy is submitted on its own, then this waits on the map callback while polling
the device, so it returns only after the GPU has finished every earlier submission.
*/
pub fn read_texture(bound_device: &BoundDevice, source: &Texture) -> Result<Vec<u8>, Error> {
    let _interval = logwise::perfwarn_begin!("read_texture");
    let (width, height) = (source.width(), source.height());
    let padded_row = aligned_bytes_per_row(width);
    let buffer = bound_device.scoped("readback buffer", |device| {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: "readback buffer".into(),
            size: (padded_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        })
    })?;
    let mut encoder = bound_device
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: source.texture(),
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: None,
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    bound_device.queue().submit(std::iter::once(encoder.finish()));

    let (sender, mapped) = r#continue::continuation();
    buffer.map_async(wgpu::MapMode::Read, .., move |result| {
        sender.send(result);
    });
    let poll = bound_device.device().poll(wgpu::PollType::Wait);
    let map_result = pollster::block_on(mapped);
    let result = match (poll, map_result) {
        (Err(e), _) => Err(Error::from(e)),
        (_, Err(e)) => Err(Error::from(e)),
        (Ok(_), Ok(())) => {
            let pixels = {
                let mapped = buffer.slice(..).get_mapped_range();
                strip_padding(&mapped, padded_row, width, height)
            };
            buffer.unmap();
            Ok(pixels)
        }
    };
    buffer.destroy();
    result
}

/// Drops the per-row alignment padding from a mapped copy.
pub(crate) fn strip_padding(mapped: &[u8], padded_row: u32, width: u32, height: u32) -> Vec<u8> {
    let row_bytes = width as usize * BYTES_PER_PIXEL;
    let stride = padded_row as usize;
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let offset = row * stride;
        pixels.extend_from_slice(&mapped[offset..offset + row_bytes]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_row_padding() {
        let padded_row = aligned_bytes_per_row(2);
        let mut mapped = vec![0xee; padded_row as usize * 2];
        mapped[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let second = padded_row as usize;
        mapped[second..second + 8].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);
        assert_eq!(
            strip_padding(&mapped, padded_row, 2, 2),
            (1..=16).collect::<Vec<u8>>()
        );
    }
}
