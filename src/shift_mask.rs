// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Per-pixel frame offsets.

A shift mask is an RGBA raster the size of one animation frame.  The RGB channels of each
pixel hold a signed frame offset in 24 bits: bit 7 of red is the sign, and the remaining
23 bits (red low 7, green, blue) are the magnitude.  Offsets are limited to
`±`[MAX_SHIFT], so the top three magnitude bits are always zero.

```
use frame_shift::shift_mask::{decode, encode};

assert_eq!(encode(-5), (0x80, 0, 5));
assert_eq!(decode(0x80, 0, 5), -5);
```

The same decoding runs in the compositor's fragment shader.  There, normalized samples are
scaled back with `round(c * 255)` before the bits are reassembled.
*/
use crate::bitmap::Bitmap;
use crate::pixel_formats::Unorm4;
use std::sync::atomic::{AtomicU64, Ordering};

/// Largest offset a mask may hold, in either direction.
pub const MAX_SHIFT: i32 = 0x0F_FFFF;

const SIGN_BIT: u8 = 0x80;

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

/// Versions are unique across every mask in the process.
fn next_version() -> u64 {
    NEXT_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// Encodes `delta` as `(r, g, b)`.
///
/// Callers clamp with [clamp_shift] first; values outside `±MAX_SHIFT` lose their high bits.
pub fn encode(delta: i32) -> (u8, u8, u8) {
    let magnitude = delta.unsigned_abs();
    let mut r = ((magnitude >> 16) & 0x7f) as u8;
    if delta < 0 {
        r |= SIGN_BIT;
    }
    let g = ((magnitude >> 8) & 0xff) as u8;
    let b = (magnitude & 0xff) as u8;
    (r, g, b)
}

/// Inverse of [encode].  A set sign bit with zero magnitude decodes to 0.
pub fn decode(r: u8, g: u8, b: u8) -> i32 {
    let magnitude = (((r & 0x7f) as i32) << 16) | ((g as i32) << 8) | b as i32;
    if r & SIGN_BIT != 0 { -magnitude } else { magnitude }
}

/// Clamps to `±MAX_SHIFT`.
pub fn clamp_shift(delta: i64) -> i32 {
    delta.clamp(-(MAX_SHIFT as i64), MAX_SHIFT as i64) as i32
}

/// Brush colour for a fractional shift weight: rounded, clamped, encoded, opaque.
pub fn shift_color(weight: f64) -> Unorm4 {
    let rounded = weight.round();
    let delta = if rounded.is_nan() {
        0
    } else {
        //float to int casts saturate, clamp_shift does the rest
        clamp_shift(rounded as i64)
    };
    let (r, g, b) = encode(delta);
    Unorm4 { r, g, b, a: 255 }
}

/// Axis-aligned pixel rectangle.  Parts outside the mask are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }
}

/// One-click edits covering the whole mask or half of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuickShift {
    /// Every pixel gets the offset.
    All,
    /// Every pixel is cleared.
    Clear,
    /// Left half shifted, right half cleared.
    Left,
    Right,
    /// Top half shifted, bottom half cleared.
    Top,
    Bottom,
}

/**
An editable mask raster.

Every mask and every mutation gets a fresh [ShiftMask::version], unique within the
process, so two masks share a version only when one is a clone of the other's current
state.  The compositor uses it to decide whether the uploaded mask texture is stale.
*/
#[derive(Debug, Clone)]
pub struct ShiftMask {
    bitmap: Bitmap,
    version: u64,
}

impl ShiftMask {
    /// An all-clear mask.
    pub fn new(width: u32, height: u32) -> Self {
        ShiftMask {
            bitmap: Bitmap::new(width, height, Unorm4::TRANSPARENT),
            version: next_version(),
        }
    }

    /// Wraps an existing raster, e.g. one loaded from disk.
    pub fn from_bitmap(bitmap: Bitmap) -> Self {
        ShiftMask {
            bitmap,
            version: next_version(),
        }
    }

    pub fn as_bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    pub fn into_bitmap(self) -> Bitmap {
        self.bitmap
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn shift_at(&self, x: u32, y: u32) -> i32 {
        let p = self.bitmap.get(x, y);
        decode(p.r, p.g, p.b)
    }

    /// Writes `delta` at `(x, y)`, clamping it first.
    pub fn set_shift(&mut self, x: u32, y: u32, delta: i64) {
        self.bitmap.set(x, y, shift_color(delta as f64));
        self.bump();
    }

    pub fn fill(&mut self, delta: i64) {
        let color = shift_color(delta as f64);
        self.bitmap.pixels_mut().fill(color);
        self.bump();
    }

    pub fn clear(&mut self) {
        self.bitmap.pixels_mut().fill(Unorm4::TRANSPARENT);
        self.bump();
    }

    pub fn fill_rect(&mut self, rect: Rect, delta: i64) {
        self.paint_rect(rect, shift_color(delta as f64));
    }

    pub fn clear_rect(&mut self, rect: Rect) {
        self.paint_rect(rect, Unorm4::TRANSPARENT);
    }

    pub fn apply_quick_shift(&mut self, shift: QuickShift, delta: i64) {
        let (w, h) = (self.width(), self.height());
        let (half_w, half_h) = (w / 2, h / 2);
        match shift {
            QuickShift::Clear => self.clear(),
            QuickShift::All => self.fill(delta),
            QuickShift::Left => {
                self.fill(delta);
                self.clear_rect(Rect::new(half_w, 0, w - half_w, h));
            }
            QuickShift::Right => {
                self.fill(delta);
                self.clear_rect(Rect::new(0, 0, half_w, h));
            }
            QuickShift::Top => {
                self.fill(delta);
                self.clear_rect(Rect::new(0, half_h, w, h - half_h));
            }
            QuickShift::Bottom => {
                self.fill(delta);
                self.clear_rect(Rect::new(0, 0, w, half_h));
            }
        }
    }

    fn paint_rect(&mut self, rect: Rect, color: Unorm4) {
        let width = self.width();
        let x_end = rect.x.saturating_add(rect.width).min(width);
        let y_end = rect.y.saturating_add(rect.height).min(self.height());
        if rect.x < x_end {
            let pixels = self.bitmap.pixels_mut();
            for y in rect.y..y_end {
                let row = y as usize * width as usize;
                pixels[row + rect.x as usize..row + x_end as usize].fill(color);
            }
        }
        self.bump();
    }

    fn bump(&mut self) {
        self.version = next_version();
    }
}

/// Masks are equal when their offsets are, whatever their versions.
impl PartialEq for ShiftMask {
    fn eq(&self, other: &Self) -> bool {
        self.bitmap == other.bitmap
    }
}

impl Eq for ShiftMask {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_full_range() {
        for delta in (-MAX_SHIFT..=MAX_SHIFT).step_by(997) {
            let (r, g, b) = encode(delta);
            assert_eq!(decode(r, g, b), delta);
        }
        for delta in [-MAX_SHIFT, -1, 0, 1, 255, 256, 65_535, 65_536, MAX_SHIFT] {
            let (r, g, b) = encode(delta);
            assert_eq!(decode(r, g, b), delta, "{delta}");
        }
    }

    #[test]
    fn zero_boundaries() {
        assert_eq!(decode(0, 0, 0), 0);
        assert_eq!(decode(0x80, 0, 0), 0);
        assert_eq!(encode(0), (0, 0, 0));
    }

    #[test]
    fn byte_layout() {
        assert_eq!(encode(0x0A_0B0C), (0x0A, 0x0B, 0x0C));
        assert_eq!(encode(-0x0A_0B0C), (0x8A, 0x0B, 0x0C));
    }

    #[test]
    fn clamp_law() {
        assert_eq!(clamp_shift(0), 0);
        assert_eq!(clamp_shift(-12), -12);
        assert_eq!(clamp_shift(i64::MAX), MAX_SHIFT);
        assert_eq!(clamp_shift(i64::MIN), -MAX_SHIFT);
        let samples = [i64::MIN, -2_000_000, -MAX_SHIFT as i64, -3, 0, 7, MAX_SHIFT as i64, 5_000_000];
        for pair in samples.windows(2) {
            assert!(clamp_shift(pair[0]) <= clamp_shift(pair[1]));
        }
    }

    #[test]
    fn shift_color_rounds_and_clamps() {
        assert_eq!(shift_color(2.6), Unorm4 { r: 0, g: 0, b: 3, a: 255 });
        assert_eq!(shift_color(-1.4), Unorm4 { r: 0x80, g: 0, b: 1, a: 255 });
        let big = shift_color(1e12);
        assert_eq!(decode(big.r, big.g, big.b), MAX_SHIFT);
        assert_eq!(shift_color(f64::NAN), Unorm4 { r: 0, g: 0, b: 0, a: 255 });
    }

    #[test]
    fn edits_bump_version() {
        let mut mask = ShiftMask::new(4, 4);
        let created = mask.version();
        mask.set_shift(1, 2, -9);
        assert_eq!(mask.shift_at(1, 2), -9);
        let edited = mask.version();
        assert!(edited > created);
        mask.clear();
        assert_eq!(mask.shift_at(1, 2), 0);
        assert_eq!(mask.as_bitmap().get(1, 2), Unorm4::TRANSPARENT);
        assert!(mask.version() > edited);
    }

    #[test]
    fn versions_differ_between_masks() {
        let mut a = ShiftMask::new(2, 2);
        let mut b = ShiftMask::new(2, 2);
        assert_ne!(a.version(), b.version());
        a.fill(1);
        b.fill(2);
        assert_ne!(a.version(), b.version());
        assert_ne!(
            ShiftMask::from_bitmap(a.as_bitmap().clone()).version(),
            a.version()
        );

        let copy = a.clone();
        assert_eq!(copy.version(), a.version());
        assert_eq!(copy, a);
        assert_ne!(a, b);
    }

    #[test]
    fn rects_are_clipped() {
        let mut mask = ShiftMask::new(3, 3);
        mask.fill_rect(Rect::new(2, 2, 10, 10), 4);
        assert_eq!(mask.shift_at(2, 2), 4);
        assert_eq!(mask.shift_at(1, 2), 0);
        mask.fill_rect(Rect::new(5, 5, 1, 1), 4);
        mask.clear_rect(Rect::new(0, 0, 3, 3));
        assert_eq!(mask.shift_at(2, 2), 0);
    }

    #[test]
    fn quick_shift_halves() {
        let mut mask = ShiftMask::new(5, 4);
        mask.apply_quick_shift(QuickShift::Left, 2);
        assert_eq!(mask.shift_at(1, 0), 2);
        assert_eq!(mask.shift_at(2, 0), 0);
        assert_eq!(mask.shift_at(4, 3), 0);

        mask.apply_quick_shift(QuickShift::Right, 2);
        assert_eq!(mask.shift_at(1, 0), 0);
        assert_eq!(mask.shift_at(2, 0), 2);

        mask.apply_quick_shift(QuickShift::Top, -1);
        assert_eq!(mask.shift_at(0, 1), -1);
        assert_eq!(mask.shift_at(0, 2), 0);

        mask.apply_quick_shift(QuickShift::Bottom, -1);
        assert_eq!(mask.shift_at(0, 1), 0);
        assert_eq!(mask.shift_at(0, 2), -1);

        mask.apply_quick_shift(QuickShift::All, 6);
        assert!((0..4).all(|y| (0..5).all(|x| mask.shift_at(x, y) == 6)));

        mask.apply_quick_shift(QuickShift::Clear, 6);
        assert!(mask.as_bitmap().pixels().iter().all(|p| *p == Unorm4::TRANSPARENT));
    }
}
