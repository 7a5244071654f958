// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Pixel layout shared by frames, masks, atlases and render targets.
//!
//! Everything frame_shift touches on the GPU is 8-bit RGBA in linear (non-sRGB)
//! encoding.  Keeping a single format means a value written by the CPU is the
//! value the shader reads back, which the shift mask relies on: its channels are
//! integers, not colors.
//!
//! # Examples
//!
//! ```
//! use frame_shift::pixel_formats::Unorm4;
//!
//! let red = Unorm4 { r: 255, g: 0, b: 0, a: 255 };
//! assert_eq!(red.to_array(), [255, 0, 0, 255]);
//! ```

pub(crate) mod sealed {
    /// Marker trait indicating C-compatible memory layout.
    ///
    /// Types implementing this trait have predictable memory layout with:
    /// - No padding between fields
    /// - No uninitialized bytes
    /// - Stable field ordering
    ///
    /// # Safety
    ///
    /// This trait is unsafe to implement because incorrect implementation
    /// could lead to undefined behavior when casting to byte slices.
    pub unsafe trait ReprC {}
}

use sealed::ReprC;

/// Convert a slice of C-compatible values to raw bytes.
pub(crate) fn as_bytes<T: ReprC>(t: &[T]) -> &[u8] {
    //safe because we know that T is repr(C)
    //(we offloaded the safety check to the ReprC trait)
    unsafe { std::slice::from_raw_parts(t.as_ptr() as *const u8, std::mem::size_of_val(t)) }
}

/// The texture format of every frame_shift texture.
pub const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Bytes in one [`Unorm4`].
pub const BYTES_PER_PIXEL: usize = 4;

/// Rounds a row of `width` pixels up to wgpu's copy alignment.
///
/// Buffer/texture copies require `bytes_per_row` to be a multiple of
/// [`wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`].
pub(crate) fn aligned_bytes_per_row(width: u32) -> u32 {
    let unaligned = width * BYTES_PER_PIXEL as u32;
    unaligned.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT
}

/// C-compatible RGBA pixel with 8-bit normalized unsigned values.
///
/// Values range from 0-255 and are interpreted as 0.0-1.0 when sampled.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Unorm4 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}
unsafe impl ReprC for Unorm4 {}

impl Unorm4 {
    /// Fully transparent black.  Cleared mask pixels look like this.
    pub const TRANSPARENT: Unorm4 = Unorm4 {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub const fn from_array(rgba: [u8; 4]) -> Self {
        Unorm4 {
            r: rgba[0],
            g: rgba[1],
            b: rgba[2],
            a: rgba[3],
        }
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Unorm4 {
    fn from(value: [u8; 4]) -> Self {
        Unorm4::from_array(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unorm4_is_four_bytes() {
        assert_eq!(std::mem::size_of::<Unorm4>(), BYTES_PER_PIXEL);
        let pixels = [Unorm4::from_array([1, 2, 3, 4]), Unorm4::from_array([5, 6, 7, 8])];
        assert_eq!(as_bytes(&pixels), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn alignment_rounds_up() {
        assert_eq!(aligned_bytes_per_row(64), 256);
        assert_eq!(aligned_bytes_per_row(63), 256);
        assert_eq!(aligned_bytes_per_row(65), 512);
        assert_eq!(aligned_bytes_per_row(1), 256);
    }
}
