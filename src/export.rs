// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Exporting a composited animation.

The [Exporter] renders every frame of an animation through a [FrameRenderer], one after
another, and hands each buffer to a [ContainerEncoder] together with its delay.  Once
every frame is submitted the encoder is finalized, which is the only asynchronous step.

```
# use frame_shift::animation::{Animation, Frame};
# use frame_shift::bitmap::Bitmap;
# use frame_shift::pixel_formats::Unorm4;
# use frame_shift::shift_mask::ShiftMask;
use frame_shift::export::{Exporter, GifEncoder};
use frame_shift::software::SoftwareCompositor;

# test_executors::sleep_on(async {
let frames = (0..2)
    .map(|i| Frame::new(Bitmap::new(4, 4, Unorm4::from_array([i * 100, 0, 0, 255])), Some(5)))
    .collect();
let animation = Animation::from_frames(frames).unwrap();
let mut renderer = SoftwareCompositor::new(4, 4);
renderer.configure(&animation, &ShiftMask::new(4, 4)).unwrap();

let encoder = GifEncoder::new(4, 4).unwrap();
let exported = Exporter::default()
    .export(&mut renderer, &animation, encoder)
    .await
    .unwrap();
assert_eq!(exported.frame_count, 2);
assert_eq!(exported.mime_type, "image/gif");
# });
```
*/
use crate::animation::{Animation, DEFAULT_DELAY_CENTISECONDS};
use crate::compositor::{Mode, RenderError};
use crate::config::Settings;
use crate::pixel_formats::BYTES_PER_PIXEL;
use std::future::Future;
use std::path::Path;

/// Something that can draw a frame of the configured animation into a buffer.
pub trait FrameRenderer {
    fn output_size(&self) -> (u32, u32);
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError>;
    /// Tightly packed RGBA rows, top row first, `width * height * 4` bytes.
    fn render_to_buffer(&mut self, frame: usize, mode: Mode) -> Result<Vec<u8>, RenderError>;
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EncodeError {
    #[error("{width}x{height} doesn't fit the container")]
    Dimensions { width: u32, height: u32 },
    #[error("frame has {found} bytes, expected {expected}")]
    FrameSize { expected: usize, found: usize },
    #[error("gif encoding failed: {0}")]
    Gif(#[from] gif::EncodingError),
    #[error("encoder worker stopped without a result")]
    Worker,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("can't render frame {frame}: {source}")]
    Render {
        frame: usize,
        #[source]
        source: RenderError,
    },
    #[error("can't encode: {0}")]
    Encode(#[from] EncodeError),
}

/**
A container format being written one frame at a time.

Frames arrive in display order.  [ContainerEncoder::finish] consumes the encoder and
resolves to the finished file.
*/
pub trait ContainerEncoder {
    fn mime_type(&self) -> &'static str;
    fn add_frame(&mut self, pixels: Vec<u8>, delay_centiseconds: u16) -> Result<(), EncodeError>;
    fn finish(self) -> impl Future<Output = Result<Vec<u8>, EncodeError>> + Send;
}

/// A finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedAnimation {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub frame_count: usize,
}

impl ExportedAnimation {
    pub fn write_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, &self.bytes)
    }
}

/// Quantizer speed handed to the gif crate; 1 is slowest, 30 fastest.
const GIF_QUANTIZE_SPEED: i32 = 10;

/**
Writes GIF89a with an infinite loop.

Frames are buffered as they arrive.  [ContainerEncoder::finish] quantizes and writes
them on a worker thread.
*/
#[derive(Debug)]
pub struct GifEncoder {
    width: u16,
    height: u16,
    frames: Vec<(Vec<u8>, u16)>,
}

impl GifEncoder {
    pub fn new(width: u32, height: u32) -> Result<Self, EncodeError> {
        let too_large = || EncodeError::Dimensions { width, height };
        Ok(GifEncoder {
            width: u16::try_from(width).map_err(|_| too_large())?,
            height: u16::try_from(height).map_err(|_| too_large())?,
            frames: Vec::new(),
        })
    }

    fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }
}

fn encode_gif(width: u16, height: u16, frames: Vec<(Vec<u8>, u16)>) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut bytes, width, height, &[])?;
        encoder.set_repeat(gif::Repeat::Infinite)?;
        for (mut pixels, delay) in frames {
            let mut frame = gif::Frame::from_rgba_speed(width, height, &mut pixels, GIF_QUANTIZE_SPEED);
            frame.delay = delay;
            encoder.write_frame(&frame)?;
        }
    }
    Ok(bytes)
}

impl ContainerEncoder for GifEncoder {
    fn mime_type(&self) -> &'static str {
        "image/gif"
    }

    fn add_frame(&mut self, pixels: Vec<u8>, delay_centiseconds: u16) -> Result<(), EncodeError> {
        let expected = self.frame_len();
        if pixels.len() != expected {
            return Err(EncodeError::FrameSize {
                expected,
                found: pixels.len(),
            });
        }
        self.frames.push((pixels, delay_centiseconds));
        Ok(())
    }

    fn finish(self) -> impl Future<Output = Result<Vec<u8>, EncodeError>> + Send {
        let (sender, finished) = r#continue::continuation();
        let GifEncoder {
            width,
            height,
            frames,
        } = self;
        let spawned = std::thread::Builder::new()
            .name("frame_shift gif encoder".to_string())
            .spawn(move || {
                sender.send(encode_gif(width, height, frames));
            });
        async move {
            match spawned {
                Ok(_handle) => finished.await,
                Err(e) => {
                    logwise::error_sync!(
                        "can't start gif encoder thread: {e}",
                        e = logwise::privacy::LogIt(&e)
                    );
                    Err(EncodeError::Worker)
                }
            }
        }
    }
}

/// Drives a renderer across an animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exporter {
    default_delay_centiseconds: u16,
}

impl Default for Exporter {
    fn default() -> Self {
        Exporter {
            default_delay_centiseconds: DEFAULT_DELAY_CENTISECONDS,
        }
    }
}

impl Exporter {
    pub fn with_settings(settings: &Settings) -> Self {
        Exporter {
            default_delay_centiseconds: settings.default_delay_centiseconds,
        }
    }

    pub fn default_delay_centiseconds(&self) -> u16 {
        self.default_delay_centiseconds
    }

    /**
    Renders each frame of `animation` in order and encodes it.

    `renderer` must already be configured with `animation`.  It is sized to the frames
    for the export and put back to its previous size afterwards, whether or not the
    export succeeds.  An animation with nothing to draw finishes the encoder with no
    frames.
    */
    pub async fn export<R, E>(
        &self,
        renderer: &mut R,
        animation: &Animation,
        mut encoder: E,
    ) -> Result<ExportedAnimation, ExportError>
    where
        R: FrameRenderer + ?Sized,
        E: ContainerEncoder,
    {
        let mime_type = encoder.mime_type();
        let frame_count = if animation.is_blank() {
            logwise::warn_sync!("exporting an animation with nothing to draw");
            0
        } else {
            let previous = renderer.output_size();
            let submitted = self.submit_frames(renderer, animation, &mut encoder);
            let restored = renderer.resize(previous.0, previous.1);
            let count = submitted?;
            //a failure to restore only matters once the frames are safely encoded
            restored.map_err(|source| ExportError::Render {
                frame: count,
                source,
            })?;
            count
        };
        let bytes = encoder.finish().await.inspect_err(|e| {
            logwise::error_sync!("encoder failed: {e}", e = logwise::privacy::LogIt(e));
        })?;
        logwise::info_sync!(
            "exported {frames} frames, {len} bytes",
            frames = frame_count,
            len = bytes.len()
        );
        Ok(ExportedAnimation {
            bytes,
            mime_type,
            frame_count,
        })
    }

    fn submit_frames<R, E>(
        &self,
        renderer: &mut R,
        animation: &Animation,
        encoder: &mut E,
    ) -> Result<usize, ExportError>
    where
        R: FrameRenderer + ?Sized,
        E: ContainerEncoder,
    {
        renderer
            .resize(animation.width(), animation.height())
            .map_err(|source| ExportError::Render { frame: 0, source })?;
        for (index, frame) in animation.frames().iter().enumerate() {
            let pixels = renderer
                .render_to_buffer(index, Mode::Normal)
                .map_err(|source| ExportError::Render {
                    frame: index,
                    source,
                })?;
            let delay = frame.delay_or(self.default_delay_centiseconds);
            logwise::trace_sync!("export frame {index} delay {delay}", index = index, delay = delay);
            encoder.add_frame(pixels, delay).inspect_err(|e| {
                logwise::error_sync!(
                    "encoder rejected frame {index}: {e}",
                    index = index,
                    e = logwise::privacy::LogIt(e)
                );
            })?;
        }
        Ok(animation.frame_count())
    }
}
