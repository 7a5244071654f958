// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Decoded animations.
//!
//! An [Animation] is a value: frames arrive already decoded, share one size, and are
//! never edited in place.  Replacing the animation means building a new one.

use crate::bitmap::Bitmap;

/// Delay used when a frame doesn't carry one, in hundredths of a second.
pub const DEFAULT_DELAY_CENTISECONDS: u16 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub bitmap: Bitmap,
    /// Display time in hundredths of a second, if the source specified one.
    pub delay_centiseconds: Option<u16>,
}

impl Frame {
    pub fn new(bitmap: Bitmap, delay_centiseconds: Option<u16>) -> Self {
        Frame {
            bitmap,
            delay_centiseconds,
        }
    }

    pub fn delay_or(&self, default: u16) -> u16 {
        self.delay_centiseconds.unwrap_or(default)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AnimationError {
    #[error("frame {index} is {found_width}x{found_height}, expected {width}x{height}")]
    MismatchedFrame {
        index: usize,
        width: u32,
        height: u32,
        found_width: u32,
        found_height: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Animation {
    width: u32,
    height: u32,
    frames: Vec<Frame>,
}

impl Animation {
    /// Builds an animation, checking that every frame is `width`x`height`.
    pub fn new(width: u32, height: u32, frames: Vec<Frame>) -> Result<Self, AnimationError> {
        for (index, frame) in frames.iter().enumerate() {
            if frame.bitmap.width() != width || frame.bitmap.height() != height {
                return Err(AnimationError::MismatchedFrame {
                    index,
                    width,
                    height,
                    found_width: frame.bitmap.width(),
                    found_height: frame.bitmap.height(),
                });
            }
        }
        Ok(Animation {
            width,
            height,
            frames,
        })
    }

    /// Uses the first frame's size.  An empty list yields a 0x0 animation.
    pub fn from_frames(frames: Vec<Frame>) -> Result<Self, AnimationError> {
        let (width, height) = frames
            .first()
            .map(|f| (f.bitmap.width(), f.bitmap.height()))
            .unwrap_or((0, 0));
        Self::new(width, height, frames)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Frame `index % frame_count`, or `None` for an empty animation.
    pub fn frame_wrapping(&self, index: usize) -> Option<&Frame> {
        if self.frames.is_empty() {
            None
        } else {
            self.frames.get(index % self.frames.len())
        }
    }

    /// True when there's nothing to draw: no frames, or frames with no area.
    pub fn is_blank(&self) -> bool {
        self.frames.is_empty() || self.width == 0 || self.height == 0
    }
}
