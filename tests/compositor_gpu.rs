// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! GPU compositor scenarios, checked against the software renderer.
//!
//! Every test needs an adapter.  Machines without one log a notice and pass.

use frame_shift::animation::{Animation, Frame};
use frame_shift::bitmap::Bitmap;
use frame_shift::compositor::{Compositor, ConfigError, Mode, RenderError};
use frame_shift::config::Settings;
use frame_shift::images::Engine;
use frame_shift::images::view::View;
use frame_shift::pixel_formats::Unorm4;
use frame_shift::render_state::StatePlan;
use frame_shift::shift_mask::{QuickShift, ShiftMask};
use frame_shift::software::SoftwareCompositor;
use std::sync::Arc;

fn engine() -> Option<Arc<Engine>> {
    match test_executors::sleep_on(Engine::headless()) {
        Ok(engine) => Some(engine),
        Err(e) => {
            logwise::warn_sync!(
                "no GPU available, skipping: {e}",
                e = logwise::privacy::LogIt(&e)
            );
            None
        }
    }
}

fn settings(side: u32) -> Settings {
    Settings {
        atlas_ceiling: side,
        ..Settings::default()
    }
}

/// Frames whose pixels encode frame index and position.
fn numbered(count: usize, w: u32, h: u32) -> Animation {
    let frames = (0..count)
        .map(|i| {
            let mut bitmap = Bitmap::new(w, h, Unorm4::TRANSPARENT);
            for y in 0..h {
                for x in 0..w {
                    bitmap.set(x, y, Unorm4::from_array([i as u8 * 10, x as u8, y as u8, 255]));
                }
            }
            Frame::new(bitmap, None)
        })
        .collect();
    Animation::from_frames(frames).unwrap()
}

fn pair(
    engine: &Arc<Engine>,
    side: u32,
    animation: &Animation,
    mask: &ShiftMask,
) -> (Compositor, SoftwareCompositor) {
    let (w, h) = (animation.width(), animation.height());
    let mut gpu = Compositor::with_settings(engine, View::headless(), w, h, settings(side)).unwrap();
    gpu.configure(animation, mask).unwrap();
    let mut cpu = SoftwareCompositor::with_settings(w, h, settings(side));
    cpu.configure(animation, mask).unwrap();
    (gpu, cpu)
}

#[test]
fn zero_mask_reproduces_frames() {
    let Some(engine) = engine() else { return };
    let animation = numbered(3, 2, 2);
    let (mut gpu, _) = pair(&engine, 4, &animation, &ShiftMask::new(2, 2));
    for (i, frame) in animation.frames().iter().enumerate() {
        assert_eq!(
            gpu.render_to_buffer(i, Mode::Normal).unwrap(),
            frame.bitmap.to_rgba_bytes()
        );
    }
}

#[test]
fn single_pixel_shift() {
    let Some(engine) = engine() else { return };
    let animation = numbered(3, 2, 2);
    let mut mask = ShiftMask::new(2, 2);
    mask.set_shift(0, 0, 1);
    let (mut gpu, _) = pair(&engine, 4, &animation, &mask);
    let out = Bitmap::from_rgba_bytes(2, 2, &gpu.render_to_buffer(0, Mode::Normal).unwrap()).unwrap();
    assert_eq!(out.get(0, 0), animation.frames()[1].bitmap.get(0, 0));
    assert_eq!(out.get(1, 1), animation.frames()[0].bitmap.get(1, 1));
}

#[test]
fn matches_software_across_atlases() {
    let Some(engine) = engine() else { return };
    let animation = numbered(7, 3, 3);
    let mut mask = ShiftMask::new(3, 3);
    mask.apply_quick_shift(QuickShift::Left, 2);
    mask.set_shift(2, 2, -3);
    let (mut gpu, cpu) = pair(&engine, 6, &animation, &mask);
    assert_eq!(gpu.render_state().unwrap().atlas_count(), 2);
    for frame in 0..animation.frame_count() + 2 {
        assert_eq!(
            gpu.render_to_buffer(frame, Mode::Normal).unwrap(),
            cpu.render_to_buffer(frame, Mode::Normal),
            "frame {frame}"
        );
    }
}

#[test]
fn mask_view_matches_software() {
    let Some(engine) = engine() else { return };
    let animation = numbered(4, 2, 1);
    let mut mask = ShiftMask::new(2, 1);
    mask.set_shift(0, 0, 2);
    mask.set_shift(1, 0, -1);
    let (mut gpu, cpu) = pair(&engine, 8, &animation, &mask);
    let ours = gpu.render_to_buffer(0, Mode::MaskView).unwrap();
    let reference = cpu.render_to_buffer(0, Mode::MaskView);
    //float to unorm conversion may round either way
    for (a, b) in ours.iter().zip(reference.iter()) {
        assert!(a.abs_diff(*b) <= 1, "{ours:?} vs {reference:?}");
    }
}

#[test]
fn screen_matches_capture() {
    let Some(engine) = engine() else { return };
    let animation = numbered(3, 4, 2);
    let mut mask = ShiftMask::new(4, 2);
    mask.apply_quick_shift(QuickShift::Top, 1);
    let (mut gpu, _) = pair(&engine, 8, &animation, &mask);
    gpu.render(2, Mode::Normal).unwrap();
    let screen = gpu.read_screen().unwrap().unwrap();
    assert_eq!(screen, gpu.render_to_buffer(2, Mode::Normal).unwrap());
}

#[test]
fn mask_updates_and_rejections() {
    let Some(engine) = engine() else { return };
    let animation = numbered(3, 2, 2);
    let mut mask = ShiftMask::new(2, 2);
    let (mut gpu, _) = pair(&engine, 4, &animation, &mask);
    assert!(!gpu.update_mask(&mask).unwrap());
    mask.fill(1);
    assert!(gpu.update_mask(&mask).unwrap());
    assert_eq!(
        gpu.render_to_buffer(0, Mode::Normal).unwrap(),
        animation.frames()[1].bitmap.to_rgba_bytes()
    );

    let generation = gpu.generation();
    let err = gpu.configure(&animation, &ShiftMask::new(3, 3)).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Configuration(ConfigError::MaskSize { .. })
    ));
    //the rejected configuration left the previous one in place
    assert_eq!(gpu.generation(), generation);
    assert!(gpu.render_state().is_some());
}

#[test]
fn blank_and_resized_output() {
    let Some(engine) = engine() else { return };
    let mut gpu = Compositor::with_settings(&engine, View::headless(), 3, 2, settings(8)).unwrap();
    assert_eq!(gpu.render_to_buffer(0, Mode::Normal).unwrap(), vec![0; 24]);
    gpu.configure(&Animation::default(), &ShiftMask::new(0, 0)).unwrap();
    gpu.render(4, Mode::Normal).unwrap();
    assert_eq!(gpu.read_screen().unwrap().unwrap(), vec![0; 24]);

    gpu.resize(0, 5).unwrap();
    assert_eq!(gpu.output_size(), (1, 5));
    assert_eq!(gpu.render_to_buffer(0, Mode::MaskView).unwrap().len(), 20);
}

#[test]
fn reconfigure_bumps_generation() {
    let Some(engine) = engine() else { return };
    let animation = numbered(2, 2, 2);
    let (mut gpu, _) = pair(&engine, 4, &animation, &ShiftMask::new(2, 2));
    let first = gpu.generation();
    let other = numbered(5, 2, 2);
    gpu.configure(&other, &ShiftMask::new(0, 0)).unwrap();
    assert_eq!(gpu.generation(), first + 1);
    assert_eq!(gpu.render_state().unwrap().total_frames(), 5);
    assert_eq!(
        gpu.render_to_buffer(4, Mode::Normal).unwrap(),
        other.frames()[4].bitmap.to_rgba_bytes()
    );
}

#[test]
fn a_different_mask_is_uploaded() {
    let Some(engine) = engine() else { return };
    let animation = numbered(3, 2, 2);
    let mut first = ShiftMask::new(2, 2);
    first.fill(1);
    let mut second = ShiftMask::new(2, 2);
    second.fill(2);
    let (mut gpu, _) = pair(&engine, 4, &animation, &first);
    assert!(gpu.update_mask(&second).unwrap());
    assert_eq!(
        gpu.render_to_buffer(0, Mode::Normal).unwrap(),
        animation.frames()[2].bitmap.to_rgba_bytes()
    );
    //a clone of what's uploaded is the same state
    assert!(!gpu.update_mask(&second.clone()).unwrap());
}

#[test]
fn failed_upload_is_lost_until_reconfigured() {
    let Some(engine) = engine() else { return };
    let animation = numbered(3, 2, 2);
    let mask = ShiftMask::new(2, 2);
    let (mut gpu, _) = pair(&engine, 4, &animation, &mask);

    let mut plan = StatePlan::prepare(&animation, &mask, gpu.atlas_side())
        .unwrap()
        .unwrap();
    //an atlas wider than the device allows can't be allocated
    let too_wide = engine.bound_device().max_texture_side() + 1;
    plan.atlases[0].bitmap = Bitmap::new(too_wide, 1, Unorm4::TRANSPARENT);
    let err = gpu.configure_prepared(Some(plan)).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Gpu(_) | RenderError::ResourceExhausted(_)
    ));
    assert!(gpu.render_state().is_none());
    assert!(matches!(
        gpu.render_to_buffer(0, Mode::Normal),
        Err(RenderError::Lost)
    ));
    assert!(matches!(gpu.render(0, Mode::Normal), Err(RenderError::Lost)));
    assert!(matches!(gpu.update_mask(&mask), Err(RenderError::Lost)));

    gpu.configure(&animation, &mask).unwrap();
    assert_eq!(
        gpu.render_to_buffer(1, Mode::Normal).unwrap(),
        animation.frames()[1].bitmap.to_rgba_bytes()
    );
}

#[test]
fn transparent_sources_composite_opaque() {
    let Some(engine) = engine() else { return };
    let see_through = Bitmap::new(2, 1, Unorm4::from_array([10, 20, 30, 0]));
    let animation = Animation::from_frames(vec![Frame::new(see_through, None)]).unwrap();
    let (mut gpu, cpu) = pair(&engine, 8, &animation, &ShiftMask::new(2, 1));
    let out = gpu.render_to_buffer(0, Mode::Normal).unwrap();
    assert_eq!(out, vec![10, 20, 30, 255, 10, 20, 30, 255]);
    assert_eq!(out, cpu.render_to_buffer(0, Mode::Normal));
}

#[test]
fn captures_dump_to_png() {
    let Some(engine) = engine() else { return };
    let dir = std::env::temp_dir().join(format!("frame_shift_dump_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    //dumps land in the working directory; nothing else here writes relative paths
    std::env::set_current_dir(&dir).unwrap();

    let animation = numbered(2, 3, 2);
    let settings = Settings {
        atlas_ceiling: 8,
        dump_frames: true,
        ..Settings::default()
    };
    let mut gpu = Compositor::with_settings(&engine, View::headless(), 3, 2, settings).unwrap();
    gpu.configure(&animation, &ShiftMask::new(3, 2)).unwrap();
    let pixels = gpu.render_to_buffer(1, Mode::Normal).unwrap();

    let dumped = Bitmap::load_png(dir.join("composite_1.png")).unwrap();
    assert_eq!((dumped.width(), dumped.height()), (3, 2));
    assert_eq!(dumped.to_rgba_bytes(), pixels);
    std::fs::remove_dir_all(&dir).unwrap();
}
