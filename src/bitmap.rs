// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
CPU-side RGBA rasters.

Frames, shift masks and composed atlases all live on the CPU as a [Bitmap] before they
are uploaded.  Rows are stored top-to-bottom with no padding.
*/
use crate::pixel_formats::{BYTES_PER_PIXEL, Unorm4, as_bytes};
use png::{BitDepth, ColorType, Transformations};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<Unorm4>,
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BitmapError {
    #[error("expected {expected} pixels for a {width}x{height} bitmap, found {found}")]
    Length {
        width: u32,
        height: u32,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PngError {
    #[error("can't open png {0}")]
    Io(#[from] std::io::Error),
    #[error("can't decode png {0}")]
    Decode(#[from] png::DecodingError),
    #[error("can't encode png {0}")]
    Encode(#[from] png::EncodingError),
}

impl Bitmap {
    /// A bitmap where every pixel is `fill`.
    pub fn new(width: u32, height: u32, fill: Unorm4) -> Self {
        Bitmap {
            width,
            height,
            pixels: vec![fill; width as usize * height as usize],
        }
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Unorm4>) -> Result<Self, BitmapError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(BitmapError::Length {
                width,
                height,
                expected,
                found: pixels.len(),
            });
        }
        Ok(Bitmap {
            width,
            height,
            pixels,
        })
    }

    /// Builds a bitmap from tightly packed RGBA bytes.
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self, BitmapError> {
        if bytes.len() % BYTES_PER_PIXEL != 0 {
            return Err(BitmapError::Length {
                width,
                height,
                expected: width as usize * height as usize,
                found: bytes.len() / BYTES_PER_PIXEL,
            });
        }
        let pixels = bytes
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|c| Unorm4::from_array([c[0], c[1], c[2], c[3]]))
            .collect();
        Self::from_pixels(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Unorm4] {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [Unorm4] {
        &mut self.pixels
    }

    pub fn as_bytes(&self) -> &[u8] {
        as_bytes(&self.pixels)
    }

    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Pixel at `(x, y)`, with `y = 0` the top row.
    ///
    /// # Panics
    /// If the coordinate is outside the bitmap.
    pub fn get(&self, x: u32, y: u32) -> Unorm4 {
        assert!(x < self.width && y < self.height, "({x},{y}) outside {}x{}", self.width, self.height);
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, pixel: Unorm4) {
        assert!(x < self.width && y < self.height, "({x},{y}) outside {}x{}", self.width, self.height);
        self.pixels[y as usize * self.width as usize + x as usize] = pixel;
    }

    /// Copies all of `src` into this bitmap with its top-left corner at `(x, y)`.
    pub(crate) fn blit(&mut self, src: &Bitmap, x: u32, y: u32) {
        assert!(x + src.width <= self.width, "blit exceeds width");
        assert!(y + src.height <= self.height, "blit exceeds height");
        let src_row = src.width as usize;
        for row in 0..src.height as usize {
            let dst_start = (y as usize + row) * self.width as usize + x as usize;
            let src_start = row * src_row;
            self.pixels[dst_start..dst_start + src_row]
                .copy_from_slice(&src.pixels[src_start..src_start + src_row]);
        }
    }

    /// Loads a PNG, expanding palette, grayscale and 16-bit images to RGBA8.
    pub fn load_png(path: impl AsRef<Path>) -> Result<Self, PngError> {
        let file = File::open(path.as_ref())?;
        let mut decoder = png::Decoder::new(BufReader::new(file));
        decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
        let mut reader = decoder.read_info()?;
        let (color_type, _) = reader.output_color_type();
        let (width, height) = {
            let info = reader.info();
            (info.width, info.height)
        };
        let mut buf = vec![0; width as usize * height as usize * color_type.samples()];
        reader.next_frame(&mut buf)?;

        let pixels: Vec<Unorm4> = match color_type {
            ColorType::Rgba => buf
                .chunks_exact(4)
                .map(|c| Unorm4::from_array([c[0], c[1], c[2], c[3]]))
                .collect(),
            ColorType::Rgb => buf
                .chunks_exact(3)
                .map(|c| Unorm4::from_array([c[0], c[1], c[2], 255]))
                .collect(),
            ColorType::GrayscaleAlpha => buf
                .chunks_exact(2)
                .map(|c| Unorm4::from_array([c[0], c[0], c[0], c[1]]))
                .collect(),
            //EXPAND turns Indexed into Rgb/Rgba, so only Grayscale is left
            _ => buf
                .iter()
                .map(|&v| Unorm4::from_array([v, v, v, 255]))
                .collect(),
        };
        logwise::trace_sync!(
            "loaded png {width}x{height}",
            width = width,
            height = height
        );
        Ok(Bitmap {
            width,
            height,
            pixels,
        })
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), PngError> {
        let file = File::create(path.as_ref())?;
        let mut encoder = png::Encoder::new(BufWriter::new(file), self.width, self.height);
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(self.as_bytes())?;
        writer.finish()?;
        Ok(())
    }
}
