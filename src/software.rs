// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A CPU rendition of the compositor.

[SoftwareCompositor] packs the same atlas images, decodes the same mask and walks the
atlases with the same ping-pong passes as the GPU path, using the same single-precision
arithmetic.  It needs no adapter, which makes it the reference in tests and a fallback
for machines without a usable GPU.
*/
use crate::animation::Animation;
use crate::atlas::AtlasImage;
use crate::compositor::{ConfigError, Mode, RenderError};
use crate::config::Settings;
use crate::export::FrameRenderer;
use crate::pixel_formats::{BYTES_PER_PIXEL, Unorm4, as_bytes};
use crate::render_state::{StatePlan, mask_for_frames};
use crate::shift_mask::{ShiftMask, decode};

/// Floored modulo rounded to the nearest integer, in `f32` like the fragment shader.
///
/// For integral `a` and positive integral `b` this equals `((a mod b) + b) mod b`.
pub fn mod_nearest(a: f32, b: f32) -> f32 {
    ((a - ((a + 0.5) / b).floor() * b) + 0.5).floor()
}

#[derive(Debug, Clone)]
pub struct SoftwareCompositor {
    settings: Settings,
    size: (u32, u32),
    plan: Option<StatePlan>,
}

impl SoftwareCompositor {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_settings(width, height, Settings::default())
    }

    pub fn with_settings(width: u32, height: u32, settings: Settings) -> Self {
        SoftwareCompositor {
            settings,
            size: (width.max(1), height.max(1)),
            plan: None,
        }
    }

    pub fn output_size(&self) -> (u32, u32) {
        self.size
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
    }

    /// Atlas count for the current configuration.
    pub fn atlas_count(&self) -> usize {
        self.plan.as_ref().map(|p| p.atlases.len()).unwrap_or(0)
    }

    pub fn configure(&mut self, animation: &Animation, mask: &ShiftMask) -> Result<(), ConfigError> {
        self.plan = StatePlan::prepare(animation, mask, self.settings.atlas_ceiling)?;
        Ok(())
    }

    /// Takes `mask` unless it is in the state already configured.
    pub fn update_mask(&mut self, mask: &ShiftMask) -> Result<bool, ConfigError> {
        let Some(plan) = self.plan.as_mut() else {
            return Ok(false);
        };
        if plan.mask_version == mask.version() {
            return Ok(false);
        }
        plan.mask = mask_for_frames(mask.as_bitmap(), plan.frame_width, plan.frame_height)?;
        plan.mask_version = mask.version();
        Ok(true)
    }

    /// Renders `frame` as tightly packed RGBA rows, top row first.
    pub fn render_to_buffer(&self, frame: usize, mode: Mode) -> Vec<u8> {
        let (width, height) = self.size;
        let Some(plan) = self.plan.as_ref() else {
            return vec![0; width as usize * height as usize * BYTES_PER_PIXEL];
        };
        let mut pixels = match mode {
            Mode::Normal => composite(plan, frame, width, height),
            Mode::MaskView => mask_view(plan, width, height),
        };
        if self.settings.readback_flip {
            pixels = flip_rows(pixels, width as usize);
        }
        as_bytes(&pixels).to_vec()
    }
}

/// Frame pixel sampled by output pixel `(x, y)`, mirroring the shader's uv mapping.
fn frame_pixel(x: u32, y: u32, width: u32, height: u32, plan: &StatePlan) -> (u32, u32) {
    let u = (x as f32 + 0.5) / width as f32;
    let v = (y as f32 + 0.5) / height as f32;
    let px = ((u * plan.frame_width as f32) as u32).min(plan.frame_width - 1);
    let py = ((v * plan.frame_height as f32) as u32).min(plan.frame_height - 1);
    (px, py)
}

fn shift_at(plan: &StatePlan, px: u32, py: u32) -> f32 {
    let p = plan.mask.get(px, py);
    decode(p.r, p.g, p.b) as f32
}

fn composite(plan: &StatePlan, frame: usize, width: u32, height: u32) -> Vec<Unorm4> {
    let total = plan.total_frames;
    let current = (frame % total.max(1)) as f32;
    let len = width as usize * height as usize;
    let (mut source, mut destination) = (vec![Unorm4::TRANSPARENT; len], vec![Unorm4::TRANSPARENT; len]);
    for atlas in &plan.atlases {
        shift_pass(plan, atlas, current, width, height, &source, &mut destination);
        (source, destination) = (destination, source);
    }
    source
}

fn shift_pass(
    plan: &StatePlan,
    atlas: &AtlasImage,
    current: f32,
    width: u32,
    height: u32,
    source: &[Unorm4],
    destination: &mut [Unorm4],
) {
    let total = plan.total_frames as f32;
    let first = atlas.plan.first_frame as f32;
    let count = atlas.plan.frame_count as f32;
    for y in 0..height {
        for x in 0..width {
            let i = y as usize * width as usize + x as usize;
            let (px, py) = frame_pixel(x, y, width, height, plan);
            let wanted = mod_nearest(current + shift_at(plan, px, py), total);
            let relative = wanted - first;
            destination[i] = if relative < 0.0 || relative >= count {
                source[i]
            } else {
                let texel = atlas.frame_texel(atlas.plan.first_frame + relative as usize, px, py);
                Unorm4 { a: 255, ..texel }
            };
        }
    }
}

fn unorm(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn mask_view(plan: &StatePlan, width: u32, height: u32) -> Vec<Unorm4> {
    let total = plan.total_frames as f32;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            let (px, py) = frame_pixel(x, y, width, height, plan);
            let shift = if total > 0.0 { shift_at(plan, px, py) / total } else { 0.0 };
            pixels.push(Unorm4 {
                r: unorm(shift.max(0.0)),
                g: 0,
                b: unorm((-shift).max(0.0)),
                a: 255,
            });
        }
    }
    pixels
}

fn flip_rows(pixels: Vec<Unorm4>, width: usize) -> Vec<Unorm4> {
    pixels
        .chunks_exact(width)
        .rev()
        .flatten()
        .copied()
        .collect()
}

impl FrameRenderer for SoftwareCompositor {
    fn output_size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        SoftwareCompositor::resize(self, width, height);
        Ok(())
    }

    fn render_to_buffer(&mut self, frame: usize, mode: Mode) -> Result<Vec<u8>, RenderError> {
        Ok(SoftwareCompositor::render_to_buffer(self, frame, mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Frame;
    use crate::bitmap::Bitmap;

    /// Frames where every pixel encodes its frame index and position.
    fn numbered(count: usize, w: u32, h: u32) -> Animation {
        let frames = (0..count)
            .map(|i| {
                let mut bitmap = Bitmap::new(w, h, Unorm4::TRANSPARENT);
                for y in 0..h {
                    for x in 0..w {
                        bitmap.set(x, y, Unorm4::from_array([i as u8, x as u8, y as u8, 255]));
                    }
                }
                Frame::new(bitmap, None)
            })
            .collect();
        Animation::from_frames(frames).unwrap()
    }

    fn renderer(side: u32, w: u32, h: u32) -> SoftwareCompositor {
        SoftwareCompositor::with_settings(
            w,
            h,
            Settings {
                atlas_ceiling: side,
                ..Settings::default()
            },
        )
    }

    #[test]
    fn zero_mask_shows_the_current_frame() {
        let animation = numbered(3, 2, 2);
        let mut compositor = renderer(4, 2, 2);
        compositor.configure(&animation, &ShiftMask::new(2, 2)).unwrap();
        assert_eq!(
            compositor.render_to_buffer(1, Mode::Normal),
            animation.frames()[1].bitmap.to_rgba_bytes()
        );
    }

    #[test]
    fn single_pixel_shift() {
        let animation = numbered(3, 2, 2);
        let mut mask = ShiftMask::new(2, 2);
        mask.set_shift(0, 0, 1);
        let mut compositor = renderer(4, 2, 2);
        compositor.configure(&animation, &mask).unwrap();
        let out = Bitmap::from_rgba_bytes(2, 2, &compositor.render_to_buffer(0, Mode::Normal)).unwrap();
        assert_eq!(out.get(0, 0), animation.frames()[1].bitmap.get(0, 0));
        for (x, y) in [(1, 0), (0, 1), (1, 1)] {
            assert_eq!(out.get(x, y), animation.frames()[0].bitmap.get(x, y));
        }
    }

    #[test]
    fn clear_mask_is_identity_across_atlases() {
        let animation = numbered(5, 3, 3);
        let mut compositor = renderer(6, 3, 3);
        compositor.configure(&animation, &ShiftMask::new(3, 3)).unwrap();
        assert_eq!(compositor.atlas_count(), 2);
        for (i, frame) in animation.frames().iter().enumerate() {
            assert_eq!(compositor.render_to_buffer(i, Mode::Normal), frame.bitmap.to_rgba_bytes());
        }
    }

    #[test]
    fn shifts_wrap_in_both_directions() {
        let animation = numbered(5, 3, 3);
        let mut mask = ShiftMask::new(3, 3);
        mask.set_shift(0, 0, -1);
        mask.set_shift(2, 2, 7);
        let mut compositor = renderer(6, 3, 3);
        compositor.configure(&animation, &mask).unwrap();
        let out = Bitmap::from_rgba_bytes(3, 3, &compositor.render_to_buffer(0, Mode::Normal)).unwrap();
        //-1 from frame 0 is frame 4, in the second atlas
        assert_eq!(out.get(0, 0).r, 4);
        //7 from frame 0 is frame 2
        assert_eq!(out.get(2, 2).r, 2);
        assert_eq!(out.get(1, 1).r, 0);
    }

    #[test]
    fn mod_nearest_matches_floored_modulo() {
        for total in 1..=7i64 {
            for current in 0..total {
                for delta in -20..=20i64 {
                    let expected = ((current + delta) % total + total) % total;
                    let got = mod_nearest((current + delta) as f32, total as f32);
                    assert_eq!(got, expected as f32, "{current}+{delta} mod {total}");
                }
            }
        }
        assert_eq!(mod_nearest(1_048_575.0 + 3.0, 1000.0), 578.0);
    }

    #[test]
    fn mask_view_colors() {
        let animation = numbered(4, 2, 1);
        let mut mask = ShiftMask::new(2, 1);
        mask.set_shift(0, 0, 2);
        mask.set_shift(1, 0, -1);
        let mut compositor = renderer(8, 2, 1);
        compositor.configure(&animation, &mask).unwrap();
        let out = compositor.render_to_buffer(0, Mode::MaskView);
        assert_eq!(&out[..4], &[128, 0, 0, 255]);
        assert_eq!(&out[4..], &[0, 0, 64, 255]);
    }

    #[test]
    fn nothing_configured_is_blank() {
        let mut compositor = renderer(8, 3, 2);
        assert_eq!(compositor.render_to_buffer(0, Mode::Normal), vec![0; 24]);
        compositor.configure(&Animation::default(), &ShiftMask::new(0, 0)).unwrap();
        assert_eq!(compositor.render_to_buffer(5, Mode::MaskView), vec![0; 24]);
    }

    #[test]
    fn mask_updates_follow_versions() {
        let animation = numbered(3, 2, 2);
        let mut mask = ShiftMask::new(2, 2);
        let mut compositor = renderer(4, 2, 2);
        compositor.configure(&animation, &mask).unwrap();
        assert!(!compositor.update_mask(&mask).unwrap());
        mask.fill(1);
        assert!(compositor.update_mask(&mask).unwrap());
        assert_eq!(
            compositor.render_to_buffer(0, Mode::Normal),
            animation.frames()[1].bitmap.to_rgba_bytes()
        );
    }

    #[test]
    fn a_different_mask_replaces_the_configured_one() {
        let animation = numbered(3, 2, 2);
        let mut first = ShiftMask::new(2, 2);
        first.fill(1);
        let mut second = ShiftMask::new(2, 2);
        second.fill(2);
        let mut compositor = renderer(4, 2, 2);
        compositor.configure(&animation, &first).unwrap();
        assert!(compositor.update_mask(&second).unwrap());
        assert_eq!(
            compositor.render_to_buffer(0, Mode::Normal),
            animation.frames()[2].bitmap.to_rgba_bytes()
        );
        assert!(!compositor.update_mask(&second.clone()).unwrap());
    }

    #[test]
    fn composites_are_opaque() {
        let see_through = Bitmap::new(2, 1, Unorm4::from_array([10, 20, 30, 0]));
        let animation = Animation::from_frames(vec![Frame::new(see_through, None)]).unwrap();
        let mut compositor = renderer(8, 2, 1);
        compositor.configure(&animation, &ShiftMask::new(2, 1)).unwrap();
        assert_eq!(
            compositor.render_to_buffer(0, Mode::Normal),
            vec![10, 20, 30, 255, 10, 20, 30, 255]
        );
    }

    #[test]
    fn flip_reverses_rows() {
        let animation = numbered(1, 1, 2);
        let mut compositor = SoftwareCompositor::with_settings(
            1,
            2,
            Settings {
                readback_flip: true,
                ..Settings::default()
            },
        );
        compositor.configure(&animation, &ShiftMask::new(1, 2)).unwrap();
        let out = compositor.render_to_buffer(0, Mode::Normal);
        assert_eq!(out, vec![0, 0, 1, 255, 0, 0, 0, 255]);
    }
}
