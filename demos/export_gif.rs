// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Exports a time-shifted GIF of a synthetic animation.
//!
//! A bar sweeps left to right over 24 frames.  The left half of the mask runs 6 frames
//! ahead, so the bar is drawn in two places at once.
//!
//! ```text
//! cargo run --example export_gif [output.gif]
//! ```

use frame_shift::animation::{Animation, Frame};
use frame_shift::bitmap::Bitmap;
use frame_shift::compositor::Compositor;
use frame_shift::config::Settings;
use frame_shift::export::{ExportedAnimation, Exporter, FrameRenderer, GifEncoder};
use frame_shift::images::Engine;
use frame_shift::images::view::View;
use frame_shift::pixel_formats::Unorm4;
use frame_shift::shift_mask::{QuickShift, ShiftMask};
use frame_shift::software::SoftwareCompositor;

const WIDTH: u32 = 96;
const HEIGHT: u32 = 64;
const FRAMES: u32 = 24;

fn sweep() -> Animation {
    let frames = (0..FRAMES)
        .map(|i| {
            let mut bitmap = Bitmap::new(WIDTH, HEIGHT, Unorm4::from_array([20, 20, 40, 255]));
            let bar = i * WIDTH / FRAMES;
            for y in 0..HEIGHT {
                for x in bar..(bar + 4).min(WIDTH) {
                    bitmap.set(x, y, Unorm4::from_array([250, 200, 40, 255]));
                }
            }
            Frame::new(bitmap, Some(4))
        })
        .collect();
    Animation::from_frames(frames).expect("frames share a size")
}

async fn export_with<R: FrameRenderer>(
    renderer: &mut R,
    animation: &Animation,
    settings: &Settings,
) -> ExportedAnimation {
    let encoder = GifEncoder::new(animation.width(), animation.height()).expect("fits a gif");
    Exporter::with_settings(settings)
        .export(renderer, animation, encoder)
        .await
        .expect("export")
}

fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| "frame_shift.gif".to_string());
    let animation = sweep();
    let mut mask = ShiftMask::new(WIDTH, HEIGHT);
    mask.apply_quick_shift(QuickShift::Left, 6);
    let settings = Settings::from_env();

    let exported = pollster::block_on(async {
        match Engine::headless().await {
            Ok(engine) => {
                let mut compositor =
                    Compositor::with_settings(&engine, View::headless(), WIDTH, HEIGHT, settings)
                        .expect("compositor");
                compositor.configure(&animation, &mask).expect("configure");
                export_with(&mut compositor, &animation, &settings).await
            }
            Err(e) => {
                eprintln!("no GPU ({e}), rendering on the CPU");
                let mut software = SoftwareCompositor::with_settings(WIDTH, HEIGHT, settings);
                software.configure(&animation, &mask).expect("configure");
                export_with(&mut software, &animation, &settings).await
            }
        }
    });
    exported.write_to(&path).expect("write gif");
    println!(
        "wrote {} frames ({} bytes, {}) to {path}",
        exported.frame_count,
        exported.bytes.len(),
        exported.mime_type
    );
}
