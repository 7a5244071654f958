// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Packs animation frames into texture atlases.

An animation can have far more frames than fit in one texture, so frames are laid out
row-major in a grid of equally sized cells, one frame per cell.  When an atlas is full the
next frame starts a new atlas.  Frames are never split across atlases and never skipped,
so each atlas covers a contiguous range `[first_frame, first_frame + frame_count)`.

The cell of frame `i` inside its atlas is

```text
cell_x = (i - first_frame) % cells_per_row
cell_y = (i - first_frame) / cells_per_row
```

[AtlasLayout] holds the grid, [pack_one] plans a single atlas, and [pack] plans and
composes all of them into CPU images ready for upload.
*/
use crate::animation::Frame;
use crate::bitmap::Bitmap;
use crate::pixel_formats::Unorm4;

/// Upper bound on atlas side regardless of what the hardware allows.
pub const APPLICATION_CEILING: u32 = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PackError {
    #[error("frame is {width}x{height} but atlases are limited to {side}x{side}")]
    FrameTooLarge { width: u32, height: u32, side: u32 },
    #[error("frames have no area ({width}x{height})")]
    ZeroSizedFrame { width: u32, height: u32 },
}

/// Side of the square atlas for a device.
pub fn atlas_side(hardware_limit: u32, ceiling: u32) -> u32 {
    hardware_limit.min(ceiling)
}

/// The cell grid for one frame size and one atlas side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasLayout {
    pub side: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    pub cells_per_row: u32,
    pub cell_rows: u32,
}

impl AtlasLayout {
    /// Fails when a frame can't fit in a single cell.
    pub fn new(frame_width: u32, frame_height: u32, side: u32) -> Result<Self, PackError> {
        if frame_width == 0 || frame_height == 0 {
            return Err(PackError::ZeroSizedFrame {
                width: frame_width,
                height: frame_height,
            });
        }
        if frame_width > side || frame_height > side {
            return Err(PackError::FrameTooLarge {
                width: frame_width,
                height: frame_height,
                side,
            });
        }
        Ok(AtlasLayout {
            side,
            frame_width,
            frame_height,
            cells_per_row: side / frame_width,
            cell_rows: side / frame_height,
        })
    }

    pub fn cells_per_atlas(&self) -> usize {
        self.cells_per_row as usize * self.cell_rows as usize
    }

    /// Grid cell `(x, y)` for the `offset`th frame of an atlas.
    pub fn cell(&self, offset: usize) -> (u32, u32) {
        let per_row = self.cells_per_row as usize;
        ((offset % per_row) as u32, (offset / per_row) as u32)
    }

    /// Texel coordinate of the top-left corner of the `offset`th cell.
    pub fn cell_origin(&self, offset: usize) -> (u32, u32) {
        let (x, y) = self.cell(offset);
        (x * self.frame_width, y * self.frame_height)
    }
}

/// Which frames one atlas holds, and how big its texture needs to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasPlan {
    pub first_frame: usize,
    pub frame_count: usize,
    pub layout: AtlasLayout,
}

impl AtlasPlan {
    pub fn end_frame(&self) -> usize {
        self.first_frame + self.frame_count
    }

    /// Texture size covering the used cells only.
    ///
    /// A partly filled atlas doesn't need the full side; columns are the occupied part of
    /// the first row and rows are however many rows were started.
    pub fn texture_size(&self) -> (u32, u32) {
        let per_row = self.layout.cells_per_row as usize;
        let columns = self.frame_count.min(per_row) as u32;
        let rows = self.frame_count.div_ceil(per_row) as u32;
        (columns * self.layout.frame_width, rows * self.layout.frame_height)
    }
}

/// Plans the atlas that starts at `first_frame`.  It holds as many frames as fit.
pub fn pack_one(layout: AtlasLayout, first_frame: usize, total_frames: usize) -> AtlasPlan {
    let remaining = total_frames.saturating_sub(first_frame);
    AtlasPlan {
        first_frame,
        frame_count: remaining.min(layout.cells_per_atlas()),
        layout,
    }
}

/// Plans every atlas for `total_frames` frames of the given size.
pub fn plan(
    total_frames: usize,
    frame_width: u32,
    frame_height: u32,
    side: u32,
) -> Result<Vec<AtlasPlan>, PackError> {
    let layout = AtlasLayout::new(frame_width, frame_height, side)?;
    let mut plans = Vec::new();
    let mut next = 0;
    while next < total_frames {
        let atlas = pack_one(layout, next, total_frames);
        next = atlas.end_frame();
        plans.push(atlas);
    }
    Ok(plans)
}

/// A planned atlas with its pixels composed on the CPU.
#[derive(Debug, Clone)]
pub struct AtlasImage {
    pub plan: AtlasPlan,
    pub bitmap: Bitmap,
}

impl AtlasImage {
    pub fn compose(plan: AtlasPlan, frames: &[Frame]) -> Self {
        let (width, height) = plan.texture_size();
        let mut bitmap = Bitmap::new(width, height, Unorm4::TRANSPARENT);
        for (offset, frame) in frames[plan.first_frame..plan.end_frame()].iter().enumerate() {
            let (x, y) = plan.layout.cell_origin(offset);
            bitmap.blit(&frame.bitmap, x, y);
        }
        AtlasImage { plan, bitmap }
    }

    /// Texel of `frame` at `(x, y)` within the frame.  `frame` must be in this atlas.
    pub fn frame_texel(&self, frame: usize, x: u32, y: u32) -> Unorm4 {
        let (cx, cy) = self.plan.layout.cell_origin(frame - self.plan.first_frame);
        self.bitmap.get(cx + x, cy + y)
    }
}

/// Packs all `frames` into atlases of at most `side`x`side`.
///
/// Every frame must be the same size.  An empty slice packs into no atlases.
pub fn pack(frames: &[Frame], side: u32) -> Result<Vec<AtlasImage>, PackError> {
    let Some(first) = frames.first() else {
        return Ok(Vec::new());
    };
    let plans = plan(frames.len(), first.bitmap.width(), first.bitmap.height(), side)?;
    Ok(plans
        .into_iter()
        .map(|p| AtlasImage::compose(p, frames))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(count: usize, w: u32, h: u32) -> Vec<Frame> {
        (0..count)
            .map(|i| Frame::new(Bitmap::new(w, h, Unorm4::from_array([i as u8, 0, 0, 255])), None))
            .collect()
    }

    #[test]
    fn boundary_split() {
        let plans = plan(5, 3, 3, 6).unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!((plans[0].first_frame, plans[0].end_frame()), (0, 4));
        assert_eq!((plans[1].first_frame, plans[1].end_frame()), (4, 5));
        assert_eq!(plans[0].texture_size(), (6, 6));
        assert_eq!(plans[1].texture_size(), (3, 3));
    }

    #[test]
    fn coverage_is_a_bijection() {
        for (count, w, h, side) in [(1, 1, 1, 1), (17, 3, 2, 8), (40, 5, 7, 16), (9, 4, 4, 4)] {
            let plans = plan(count, w, h, side).unwrap();
            let mut seen = vec![0usize; count];
            for p in &plans {
                assert!(p.frame_count > 0);
                for i in p.first_frame..p.end_frame() {
                    seen[i] += 1;
                }
            }
            assert!(seen.iter().all(|&n| n == 1), "{count} {w}x{h} side {side}");
            for pair in plans.windows(2) {
                assert_eq!(pair[0].end_frame(), pair[1].first_frame);
            }
        }
    }

    #[test]
    fn cell_addressing() {
        let layout = AtlasLayout::new(3, 2, 10).unwrap();
        assert_eq!(layout.cells_per_row, 3);
        assert_eq!(layout.cell_rows, 5);
        for offset in 0..layout.cells_per_atlas() {
            let (x, y) = layout.cell(offset);
            assert!(x < layout.cells_per_row && y < layout.cell_rows);
            assert_eq!((y * layout.cells_per_row + x) as usize, offset);
        }
    }

    #[test]
    fn rejects_oversized_frames() {
        assert_eq!(
            AtlasLayout::new(9, 2, 8),
            Err(PackError::FrameTooLarge {
                width: 9,
                height: 2,
                side: 8
            })
        );
        assert!(matches!(
            AtlasLayout::new(0, 2, 8),
            Err(PackError::ZeroSizedFrame { .. })
        ));
        assert_eq!(atlas_side(16384, APPLICATION_CEILING), 8192);
        assert_eq!(atlas_side(4096, APPLICATION_CEILING), 4096);
    }

    #[test]
    fn compose_places_frames_in_cells() {
        let source = frames(5, 3, 3);
        let atlases = pack(&source, 6).unwrap();
        assert_eq!(atlases.len(), 2);
        for atlas in &atlases {
            for i in atlas.plan.first_frame..atlas.plan.end_frame() {
                assert_eq!(atlas.frame_texel(i, 2, 1), source[i].bitmap.get(2, 1));
            }
        }
        assert!(pack(&[], 6).unwrap().is_empty());
    }
}
