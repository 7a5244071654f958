// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Per-animation GPU resources.

Configuring happens in two steps.  [StatePlan::prepare] validates the animation and mask
and composes the atlas images on the CPU; it touches no GPU state, so a rejected
configuration leaves nothing behind.  [RenderState::upload] then turns a plan into
textures and uniform buffers.

A [RenderState] is stamped with the generation it was built for.  Dropping it destroys
its atlas and mask textures immediately.
*/
use crate::animation::Animation;
use crate::atlas::{self, AtlasImage, AtlasPlan};
use crate::bitmap::Bitmap;
use crate::compositor::ConfigError;
use crate::imp::{self, Buffer, Texture};
use crate::pixel_formats::Unorm4;
use crate::pixel_formats::sealed::ReprC;
use crate::shift_mask::ShiftMask;

/// Grid description for one atlas, laid out for the fragment shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AtlasParams {
    first_frame: u32,
    frame_count: u32,
    cells_per_row: u32,
    _pad0: u32,
    frame_width: u32,
    frame_height: u32,
    _pad1: u32,
    _pad2: u32,
}
unsafe impl ReprC for AtlasParams {}

impl AtlasParams {
    pub(crate) fn new(plan: &AtlasPlan) -> Self {
        AtlasParams {
            first_frame: plan.first_frame as u32,
            frame_count: plan.frame_count as u32,
            cells_per_row: plan.layout.cells_per_row,
            _pad0: 0,
            frame_width: plan.layout.frame_width,
            frame_height: plan.layout.frame_height,
            _pad1: 0,
            _pad2: 0,
        }
    }
}

pub(crate) const ATLAS_PARAMS_SIZE: u64 = std::mem::size_of::<AtlasParams>() as u64;

/// Returns the mask to upload for frames of `width`x`height`.
///
/// An empty mask stands for "no shift anywhere".  Any other size must match the frames.
pub(crate) fn mask_for_frames(mask: &Bitmap, width: u32, height: u32) -> Result<Bitmap, ConfigError> {
    if mask.is_empty() {
        return Ok(Bitmap::new(width, height, Unorm4::TRANSPARENT));
    }
    if mask.width() != width || mask.height() != height {
        return Err(ConfigError::MaskSize {
            width,
            height,
            found_width: mask.width(),
            found_height: mask.height(),
        });
    }
    Ok(mask.clone())
}

/// A validated configuration, composed on the CPU and not yet uploaded.
#[derive(Debug, Clone)]
pub struct StatePlan {
    pub frame_width: u32,
    pub frame_height: u32,
    pub total_frames: usize,
    pub atlas_side: u32,
    pub atlases: Vec<AtlasImage>,
    pub mask: Bitmap,
    pub mask_version: u64,
}

impl StatePlan {
    /**
    Validates and packs `animation` with `mask`.

    Returns `Ok(None)` when the animation has nothing to draw (no frames, or frames with
    no area).  Oversized frames and mismatched masks are errors.
    */
    pub fn prepare(
        animation: &Animation,
        mask: &ShiftMask,
        atlas_side: u32,
    ) -> Result<Option<StatePlan>, ConfigError> {
        if animation.is_blank() {
            return Ok(None);
        }
        let (width, height) = (animation.width(), animation.height());
        let mask_bitmap = mask_for_frames(mask.as_bitmap(), width, height)?;
        let atlases = atlas::pack(animation.frames(), atlas_side)?;
        Ok(Some(StatePlan {
            frame_width: width,
            frame_height: height,
            total_frames: animation.frame_count(),
            atlas_side,
            atlases,
            mask: mask_bitmap,
            mask_version: mask.version(),
        }))
    }
}

#[derive(Debug)]
pub(crate) struct GpuAtlas {
    pub(crate) plan: AtlasPlan,
    pub(crate) texture: Texture,
    pub(crate) params: Buffer,
}

#[derive(Debug)]
pub struct RenderState {
    generation: u64,
    frame_width: u32,
    frame_height: u32,
    total_frames: usize,
    atlas_side: u32,
    atlases: Vec<GpuAtlas>,
    mask: Texture,
    mask_version: u64,
}

impl RenderState {
    /// Uploads every atlas and the mask.  On failure, whatever was already created is
    /// released before returning.
    pub(crate) fn upload(
        device: &imp::BoundDevice,
        generation: u64,
        plan: &StatePlan,
    ) -> Result<RenderState, imp::Error> {
        let _interval = logwise::perfwarn_begin!("RenderState::upload");
        let mut atlases = Vec::with_capacity(plan.atlases.len());
        for image in &plan.atlases {
            let texture = Texture::upload(device, "atlas", &image.bitmap)?;
            let params = Buffer::uniform(device, "atlas params", &AtlasParams::new(&image.plan))?;
            atlases.push(GpuAtlas {
                plan: image.plan,
                texture,
                params,
            });
        }
        let mask = Texture::upload(device, "shift mask", &plan.mask)?;
        logwise::info_sync!(
            "configured generation {generation}: {frames} frames in {atlases} atlases of side {side}",
            generation = generation,
            frames = plan.total_frames,
            atlases = atlases.len(),
            side = plan.atlas_side
        );
        Ok(RenderState {
            generation,
            frame_width: plan.frame_width,
            frame_height: plan.frame_height,
            total_frames: plan.total_frames,
            atlas_side: plan.atlas_side,
            atlases,
            mask,
            mask_version: plan.mask_version,
        })
    }

    /// Writes a new mask into the existing texture.  The bitmap must be frame-sized.
    pub(crate) fn replace_mask(&mut self, device: &imp::BoundDevice, mask: &Bitmap, version: u64) {
        self.mask.write(device, mask);
        self.mask_version = version;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    pub fn atlas_side(&self) -> u32 {
        self.atlas_side
    }

    pub fn atlas_count(&self) -> usize {
        self.atlases.len()
    }

    pub fn mask_version(&self) -> u64 {
        self.mask_version
    }

    pub(crate) fn atlases(&self) -> &[GpuAtlas] {
        &self.atlases
    }

    pub(crate) fn mask(&self) -> &Texture {
        &self.mask
    }
}

impl Drop for RenderState {
    fn drop(&mut self) {
        logwise::info_sync!(
            "releasing generation {generation} ({atlases} atlases)",
            generation = self.generation,
            atlases = self.atlases.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Frame;

    fn animation(count: usize, w: u32, h: u32) -> Animation {
        Animation::from_frames(
            (0..count)
                .map(|_| Frame::new(Bitmap::new(w, h, Unorm4::default()), None))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn blank_animations_plan_nothing() {
        let mask = ShiftMask::new(0, 0);
        assert!(StatePlan::prepare(&Animation::default(), &mask, 8).unwrap().is_none());
        assert!(StatePlan::prepare(&animation(3, 0, 2), &mask, 8).unwrap().is_none());
    }

    #[test]
    fn mismatched_mask_is_rejected() {
        let err = StatePlan::prepare(&animation(2, 2, 2), &ShiftMask::new(3, 2), 8).unwrap_err();
        assert!(matches!(err, ConfigError::MaskSize { found_width: 3, .. }));
    }

    #[test]
    fn empty_mask_becomes_zero_mask() {
        let plan = StatePlan::prepare(&animation(2, 2, 3), &ShiftMask::new(0, 0), 8)
            .unwrap()
            .unwrap();
        assert_eq!((plan.mask.width(), plan.mask.height()), (2, 3));
        assert!(plan.mask.pixels().iter().all(|p| *p == Unorm4::TRANSPARENT));
    }

    #[test]
    fn oversized_frames_fail_before_upload() {
        let err = StatePlan::prepare(&animation(1, 9, 2), &ShiftMask::new(9, 2), 8).unwrap_err();
        assert!(matches!(err, ConfigError::Pack(atlas::PackError::FrameTooLarge { .. })));
    }

    #[test]
    fn atlas_params_layout() {
        assert_eq!(ATLAS_PARAMS_SIZE, 32);
        let plan = atlas::plan(5, 3, 3, 6).unwrap();
        let params = AtlasParams::new(&plan[1]);
        assert_eq!(params.first_frame, 4);
        assert_eq!(params.frame_count, 1);
        assert_eq!(params.cells_per_row, 2);
    }
}
