// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The GPU compositor.

A [Compositor] owns the render targets and pipelines for one [View], plus the
[RenderState] for the current animation.  Each request renders from scratch:

* [Mode::Normal] walks the atlases in packing order.  Every pass reads the previous
  pass's output and writes the other of two equally sized targets, replacing a pixel
  only when the frame that pixel wants lives in the atlas being drawn.  After the last
  pass every pixel has been resolved exactly once.
* [Mode::MaskView] draws the mask itself: red for forward shifts, blue for backward.

The finished target is then blitted to the view, or to a capture target for
[Compositor::render_to_buffer].

```no_run
# async fn demo() -> Result<(), Box<dyn std::error::Error>> {
use frame_shift::compositor::{Compositor, Mode};
use frame_shift::images::{Engine, view::View};
# let animation = frame_shift::animation::Animation::default();
# let mask = frame_shift::shift_mask::ShiftMask::new(0, 0);

let engine = Engine::headless().await?;
let mut compositor = Compositor::new(&engine, View::headless(), 64, 64)?;
compositor.configure(&animation, &mask)?;
let rgba = compositor.render_to_buffer(0, Mode::Normal)?;
assert_eq!(rgba.len(), 64 * 64 * 4);
# Ok(())
# }
```
*/
use crate::animation::Animation;
use crate::atlas::{self, PackError};
use crate::bitmap::Bitmap;
use crate::config::Settings;
use crate::export::FrameRenderer;
use crate::images::Engine;
use crate::images::camera::Camera;
use crate::images::projection::CameraProjection;
use crate::images::render_pass::{Bind, BindTarget, DrawCommand, PassDescriptor, Stage};
use crate::images::shader;
use crate::images::vertex_algorithms::{QUAD_VERTEX_COUNT, quad};
use crate::images::view::View;
use crate::imp::{self, BindResource, Buffer, PreparedPass, Texture};
use crate::pixel_formats::sealed::ReprC;
use crate::pixel_formats::{BYTES_PER_PIXEL, TEXTURE_FORMAT};
use crate::render_state::{ATLAS_PARAMS_SIZE, RenderState, StatePlan, mask_for_frames};
use crate::shift_mask::ShiftMask;
use std::sync::Arc;

/// What a render request draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// The displaced composite.
    #[default]
    Normal,
    /// The mask, scaled by frame count.
    MaskView,
}

/// A configuration that can't be rendered.  Reported before anything is allocated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("can't pack frames: {0}")]
    Pack(#[from] PackError),
    #[error("mask is {found_width}x{found_height} but frames are {width}x{height}")]
    MaskSize {
        width: u32,
        height: u32,
        found_width: u32,
        found_height: u32,
    },
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RenderError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),
    #[error("out of GPU memory creating {0}")]
    ResourceExhausted(&'static str),
    #[error("GPU error {0}")]
    Gpu(imp::Error),
    #[error("readback failed {0}")]
    Readback(imp::Error),
    #[error("surface unavailable {0}")]
    Surface(imp::Error),
    #[error("GPU resources were lost; configure or resize again")]
    Lost,
}

impl RenderError {
    fn from_gpu(error: imp::Error) -> Self {
        match error.exhausted() {
            Some(label) => RenderError::ResourceExhausted(label),
            None => RenderError::Gpu(error),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct FrameParams {
    current_frame: u32,
    total_frames: u32,
    _pad: [u32; 2],
}
unsafe impl ReprC for FrameParams {}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct BlitParams {
    flip: u32,
    _pad: [u32; 3],
}
unsafe impl ReprC for BlitParams {}

impl BlitParams {
    fn new(flip: bool) -> Self {
        BlitParams {
            flip: flip as u32,
            _pad: [0; 3],
        }
    }
}

const CAMERA_SIZE: u64 = std::mem::size_of::<CameraProjection>() as u64;
const FRAME_PARAMS_SIZE: u64 = std::mem::size_of::<FrameParams>() as u64;
const BLIT_PARAMS_SIZE: u64 = std::mem::size_of::<BlitParams>() as u64;

fn camera_bind() -> Bind {
    Bind::new(Stage::Vertex, BindTarget::Uniform(CAMERA_SIZE))
}

fn frame_shift_descriptor() -> PassDescriptor {
    PassDescriptor::new(
        "frame shift".to_string(),
        shader::quad_vertex_shader(),
        shader::frame_shift_fragment(),
        vec![
            camera_bind(),
            Bind::new(Stage::Fragment, BindTarget::Uniform(FRAME_PARAMS_SIZE)),
            Bind::new(Stage::Fragment, BindTarget::Uniform(ATLAS_PARAMS_SIZE)),
            Bind::new(Stage::Fragment, BindTarget::Texture),
            Bind::new(Stage::Fragment, BindTarget::Texture),
            Bind::new(Stage::Fragment, BindTarget::Texture),
        ],
        DrawCommand::TriangleStrip(QUAD_VERTEX_COUNT),
    )
}

fn mask_view_descriptor() -> PassDescriptor {
    PassDescriptor::new(
        "mask view".to_string(),
        shader::quad_vertex_shader(),
        shader::mask_view_fragment(),
        vec![
            camera_bind(),
            Bind::new(Stage::Fragment, BindTarget::Uniform(FRAME_PARAMS_SIZE)),
            Bind::new(Stage::Fragment, BindTarget::Texture),
        ],
        DrawCommand::TriangleStrip(QUAD_VERTEX_COUNT),
    )
}

fn blit_descriptor() -> PassDescriptor {
    PassDescriptor::new(
        "blit".to_string(),
        shader::quad_vertex_shader(),
        shader::blit_fragment(),
        vec![
            camera_bind(),
            Bind::new(Stage::Fragment, BindTarget::Uniform(BLIT_PARAMS_SIZE)),
            Bind::new(Stage::Fragment, BindTarget::Texture),
        ],
        DrawCommand::TriangleStrip(QUAD_VERTEX_COUNT),
    )
}

#[derive(Debug)]
struct Passes {
    frame_shift: PreparedPass,
    mask_view: PreparedPass,
    blit: PreparedPass,
    ///built for the surface's format, when there is a surface
    surface_blit: Option<PreparedPass>,
}

#[derive(Debug)]
struct Targets {
    ping: Texture,
    pong: Texture,
    capture: Texture,
    ///what a headless view displays
    screen: Option<Texture>,
}

impl Targets {
    fn new(device: &imp::BoundDevice, width: u32, height: u32, headless: bool) -> Result<Self, imp::Error> {
        Ok(Targets {
            ping: Texture::render_target(device, "ping target", width, height)?,
            pong: Texture::render_target(device, "pong target", width, height)?,
            capture: Texture::render_target(device, "capture target", width, height)?,
            screen: if headless {
                Some(Texture::render_target(device, "screen target", width, height)?)
            } else {
                None
            },
        })
    }
}

/// The read and write sides of one shift pass.  Each pass hands back the pair swapped.
#[derive(Debug, Clone, Copy)]
struct PingPong<'a> {
    source: &'a Texture,
    destination: &'a Texture,
}

impl<'a> PingPong<'a> {
    fn swapped(self) -> Self {
        PingPong {
            source: self.destination,
            destination: self.source,
        }
    }
}

#[derive(Debug)]
enum Slot {
    /// Nothing configured yet.
    Unconfigured,
    /// Configured with an animation that has nothing to draw.
    Blank,
    Ready(RenderState),
    /// An allocation failed; nothing renders until the next successful configure.
    Lost,
}

#[derive(Debug)]
pub struct Compositor {
    engine: Arc<Engine>,
    view: View,
    settings: Settings,
    camera: Camera,
    passes: Passes,
    quad: Buffer,
    camera_buffer: Buffer,
    frame_params: Buffer,
    display_params: Buffer,
    capture_params: Buffer,
    targets: Option<Targets>,
    slot: Slot,
    generation: u64,
    captures: u64,
}

impl Compositor {
    /// A compositor drawing `width`x`height` output to `view`, with settings from the environment.
    pub fn new(engine: &Arc<Engine>, view: View, width: u32, height: u32) -> Result<Self, RenderError> {
        Self::with_settings(engine, view, width, height, Settings::from_env())
    }

    pub fn with_settings(
        engine: &Arc<Engine>,
        mut view: View,
        width: u32,
        height: u32,
        settings: Settings,
    ) -> Result<Self, RenderError> {
        let (width, height) = (width.max(1), height.max(1));
        let device = &engine.bound_device().0;
        let surface_format = view.surface_mut().map(|s| s.configure(device, width, height));
        let passes = Passes {
            frame_shift: PreparedPass::new(device, &frame_shift_descriptor(), TEXTURE_FORMAT)
                .map_err(RenderError::from_gpu)?,
            mask_view: PreparedPass::new(device, &mask_view_descriptor(), TEXTURE_FORMAT)
                .map_err(RenderError::from_gpu)?,
            blit: PreparedPass::new(device, &blit_descriptor(), TEXTURE_FORMAT)
                .map_err(RenderError::from_gpu)?,
            surface_blit: surface_format
                .map(|format| PreparedPass::new(device, &blit_descriptor(), format))
                .transpose()
                .map_err(RenderError::from_gpu)?,
        };
        let mut camera = Camera::new((width, height));
        let projection = CameraProjection::from(&camera.projection());
        //the buffer starts out current
        camera.take_dirty();
        let frame_params = FrameParams {
            current_frame: 0,
            total_frames: 0,
            _pad: [0; 2],
        };
        let gpu = RenderError::from_gpu;
        let quad_buffer = Buffer::vertex(device, "quad", &quad(width, height)).map_err(gpu)?;
        let camera_buffer = Buffer::uniform(device, "camera", &projection).map_err(gpu)?;
        let frame_params = Buffer::uniform(device, "frame params", &frame_params).map_err(gpu)?;
        let display_params =
            Buffer::uniform(device, "display blit", &BlitParams::new(false)).map_err(gpu)?;
        let capture_params =
            Buffer::uniform(device, "capture blit", &BlitParams::new(settings.readback_flip))
                .map_err(gpu)?;
        let targets = Targets::new(device, width, height, view.is_headless()).map_err(gpu)?;
        logwise::info_sync!(
            "compositor ready at {width}x{height}",
            width = width,
            height = height
        );
        Ok(Compositor {
            engine: engine.clone(),
            view,
            settings,
            camera,
            passes,
            quad: quad_buffer,
            camera_buffer,
            frame_params,
            display_params,
            capture_params,
            targets: Some(targets),
            slot: Slot::Unconfigured,
            generation: 0,
            captures: 0,
        })
    }

    fn device(&self) -> &imp::BoundDevice {
        &self.engine.bound_device().0
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Side of the atlases this compositor packs into.
    pub fn atlas_side(&self) -> u32 {
        atlas::atlas_side(self.device().max_texture_side(), self.settings.atlas_ceiling)
    }

    /// Generation of the current render state.  Bumped by every [Compositor::configure].
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn render_state(&self) -> Option<&RenderState> {
        match &self.slot {
            Slot::Ready(state) => Some(state),
            _ => None,
        }
    }

    pub fn output_size(&self) -> (u32, u32) {
        self.camera.window_size()
    }

    /**
    Replaces the animation and mask.

    Validation happens first; a rejected configuration leaves the previous state in
    place.  Otherwise the previous generation is released before the new one is
    allocated.  An allocation failure leaves the compositor lost until the next successful
    configure.
    */
    pub fn configure(&mut self, animation: &Animation, mask: &ShiftMask) -> Result<(), RenderError> {
        let plan = StatePlan::prepare(animation, mask, self.atlas_side())?;
        self.configure_prepared(plan)
    }

    /**
    Replaces the current state with an already validated plan.

    `plan` comes from [StatePlan::prepare] with this compositor's [Compositor::atlas_side];
    `None` means nothing to draw.  Preparing is CPU-only, so it can happen elsewhere.  A
    plan the device can't hold fails like any other allocation, leaving the compositor
    lost.
    */
    pub fn configure_prepared(&mut self, plan: Option<StatePlan>) -> Result<(), RenderError> {
        self.generation += 1;
        //release before allocating, so the old atlases don't count against the new ones
        self.slot = Slot::Unconfigured;
        let Some(plan) = plan else {
            logwise::info_sync!(
                "configured generation {generation} with nothing to draw",
                generation = self.generation
            );
            self.slot = Slot::Blank;
            return Ok(());
        };
        match RenderState::upload(self.device(), self.generation, &plan) {
            Ok(state) => {
                self.slot = Slot::Ready(state);
                Ok(())
            }
            Err(e) => {
                logwise::error_sync!(
                    "configure failed, compositor lost: {e}",
                    e = logwise::privacy::LogIt(&e)
                );
                self.slot = Slot::Lost;
                Err(RenderError::from_gpu(e))
            }
        }
    }

    /**
    Uploads `mask` into the current state if it changed since it was last uploaded.

    Changes are detected through [ShiftMask::version], which is unique per mask state, so
    any other mask, or an edited one, is uploaded.  Returns whether anything was uploaded.
    */
    pub fn update_mask(&mut self, mask: &ShiftMask) -> Result<bool, RenderError> {
        let device = self.engine.bound_device().clone();
        match &mut self.slot {
            Slot::Ready(state) => {
                if state.mask_version() == mask.version() {
                    return Ok(false);
                }
                let (width, height) = state.frame_size();
                let bitmap = mask_for_frames(mask.as_bitmap(), width, height)?;
                state.replace_mask(&device.0, &bitmap, mask.version());
                logwise::trace_sync!("uploaded mask version {v}", v = mask.version());
                Ok(true)
            }
            Slot::Lost => Err(RenderError::Lost),
            Slot::Unconfigured | Slot::Blank => Ok(false),
        }
    }

    /// Resizes the output.  Sizes are clamped to at least 1x1.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        let (width, height) = (width.max(1), height.max(1));
        if self.targets.is_some() && self.output_size() == (width, height) {
            return Ok(());
        }
        logwise::info_sync!("resize to {width}x{height}", width = width, height = height);
        let device = self.engine.bound_device().clone();
        //drop the old targets first
        self.targets = None;
        if let Some(surface) = self.view.surface_mut() {
            surface.configure(&device.0, width, height);
        }
        self.camera.changed_size((width, height));
        if let Some(projection) = self.camera.take_dirty() {
            self.camera_buffer
                .write(&device.0, &CameraProjection::from(&projection));
        }
        self.quad.write_slice(&device.0, &quad(width, height));
        let targets = Targets::new(&device.0, width, height, self.view.is_headless())
            .map_err(RenderError::from_gpu)?;
        self.targets = Some(targets);
        Ok(())
    }

    /// Renders `frame` and shows it on the view.
    pub fn render(&mut self, frame: usize, mode: Mode) -> Result<(), RenderError> {
        let result = self.render_to_view(frame, mode);
        if let Err(RenderError::Surface(e)) = &result {
            logwise::warn_sync!(
                "can't acquire surface texture: {e}",
                e = logwise::privacy::LogIt(e)
            );
            //lost and outdated surfaces recover after a reconfigure
            let device = self.engine.bound_device().clone();
            let (width, height) = self.output_size();
            if let Some(surface) = self.view.surface_mut() {
                surface.configure(&device.0, width, height);
            }
        }
        result
    }

    fn render_to_view(&self, frame: usize, mode: Mode) -> Result<(), RenderError> {
        let device = self.device();
        let targets = self.targets.as_ref().ok_or(RenderError::Lost)?;
        let mut encoder = device
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render"),
            });
        let finished = self.composite(&mut encoder, targets, frame, mode)?;
        match self.view.surface() {
            None => {
                let screen = targets.screen.as_ref().ok_or(RenderError::Lost)?;
                self.blit_into(
                    &mut encoder,
                    &self.passes.blit,
                    finished,
                    screen.view(),
                    &self.display_params,
                );
                device.queue().submit(std::iter::once(encoder.finish()));
            }
            Some(surface) => {
                let surface_blit = self.passes.surface_blit.as_ref().ok_or(RenderError::Lost)?;
                let frame_texture = surface.acquire().map_err(RenderError::Surface)?;
                let surface_view = frame_texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                self.blit_into(
                    &mut encoder,
                    surface_blit,
                    finished,
                    &surface_view,
                    &self.display_params,
                );
                device.queue().submit(std::iter::once(encoder.finish()));
                frame_texture.present();
            }
        }
        Ok(())
    }

    /**
    Renders `frame` and returns it as tightly packed RGBA rows, top row first.

    The result is exactly `width * height * 4` bytes, and matches what [Compositor::render]
    shows for the same request.  With nothing configured the buffer is all zeros.
    */
    pub fn render_to_buffer(&mut self, frame: usize, mode: Mode) -> Result<Vec<u8>, RenderError> {
        let (width, height) = self.output_size();
        match self.slot {
            Slot::Unconfigured | Slot::Blank => {
                return Ok(vec![0; width as usize * height as usize * BYTES_PER_PIXEL]);
            }
            Slot::Lost => return Err(RenderError::Lost),
            Slot::Ready(_) => {}
        }
        let device = self.engine.bound_device().clone();
        let targets = self.targets.as_ref().ok_or(RenderError::Lost)?;
        let mut encoder = device
            .0
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render to buffer"),
            });
        let finished = self.composite(&mut encoder, targets, frame, mode)?;
        self.blit_into(
            &mut encoder,
            &self.passes.blit,
            finished,
            targets.capture.view(),
            &self.capture_params,
        );
        device.0.queue().submit(std::iter::once(encoder.finish()));
        let pixels = imp::read_texture(&device.0, &targets.capture)
            .map_err(RenderError::Readback)?;
        self.captures += 1;
        if self.settings.dump_frames {
            self.dump(&pixels, width, height);
        }
        Ok(pixels)
    }

    /// What a headless view currently shows.  `None` for window views.
    pub fn read_screen(&self) -> Result<Option<Vec<u8>>, RenderError> {
        let Some(targets) = self.targets.as_ref() else {
            return Err(RenderError::Lost);
        };
        let Some(screen) = targets.screen.as_ref() else {
            return Ok(None);
        };
        imp::read_texture(self.device(), screen)
            .map(Some)
            .map_err(RenderError::Readback)
    }

    /**
    Encodes the passes for one request and returns the target holding the result.

    `None` means there was nothing to draw; the blit then clears its destination.
    */
    fn composite<'t>(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        targets: &'t Targets,
        frame: usize,
        mode: Mode,
    ) -> Result<Option<&'t Texture>, RenderError> {
        let state = match &self.slot {
            Slot::Ready(state) => state,
            Slot::Unconfigured | Slot::Blank => return Ok(None),
            Slot::Lost => return Err(RenderError::Lost),
        };
        let device = self.device();
        let total_frames = state.total_frames() as u32;
        self.frame_params.write(
            device,
            &FrameParams {
                current_frame: (frame % state.total_frames().max(1)) as u32,
                total_frames,
                _pad: [0; 2],
            },
        );
        let mut pair = PingPong {
            source: &targets.ping,
            destination: &targets.pong,
        };
        match mode {
            Mode::Normal => {
                imp::clear(encoder, pair.source.view());
                for atlas in state.atlases() {
                    pair = self.shift_pass(encoder, state, atlas, pair);
                }
            }
            Mode::MaskView => {
                let bind_group = self.passes.mask_view.bind_group(
                    device,
                    &[
                        BindResource::Buffer(self.camera_buffer.buffer()),
                        BindResource::Buffer(self.frame_params.buffer()),
                        BindResource::Texture(state.mask().view()),
                    ],
                );
                self.passes.mask_view.encode(
                    encoder,
                    pair.destination.view(),
                    &bind_group,
                    self.quad.buffer(),
                );
                pair = pair.swapped();
            }
        }
        Ok(Some(pair.source))
    }

    /// One atlas pass: reads `pair.source`, writes `pair.destination`, hands back the swap.
    fn shift_pass<'t>(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        state: &RenderState,
        atlas: &crate::render_state::GpuAtlas,
        pair: PingPong<'t>,
    ) -> PingPong<'t> {
        logwise::trace_sync!(
            "shift pass over frames {first}..{end}",
            first = atlas.plan.first_frame,
            end = atlas.plan.end_frame()
        );
        let device = self.device();
        let bind_group = self.passes.frame_shift.bind_group(
            device,
            &[
                BindResource::Buffer(self.camera_buffer.buffer()),
                BindResource::Buffer(self.frame_params.buffer()),
                BindResource::Buffer(atlas.params.buffer()),
                BindResource::Texture(atlas.texture.view()),
                BindResource::Texture(state.mask().view()),
                BindResource::Texture(pair.source.view()),
            ],
        );
        self.passes.frame_shift.encode(
            encoder,
            pair.destination.view(),
            &bind_group,
            self.quad.buffer(),
        );
        pair.swapped()
    }

    fn blit_into(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pass: &PreparedPass,
        source: Option<&Texture>,
        destination: &wgpu::TextureView,
        params: &Buffer,
    ) {
        let Some(source) = source else {
            imp::clear(encoder, destination);
            return;
        };
        let bind_group = pass.bind_group(
            self.device(),
            &[
                BindResource::Buffer(self.camera_buffer.buffer()),
                BindResource::Buffer(params.buffer()),
                BindResource::Texture(source.view()),
            ],
        );
        pass.encode(encoder, destination, &bind_group, self.quad.buffer());
    }

    fn dump(&self, pixels: &[u8], width: u32, height: u32) {
        let path = format!("composite_{}.png", self.captures);
        let result = Bitmap::from_rgba_bytes(width, height, pixels)
            .map_err(|e| e.to_string())
            .and_then(|b| b.save_png(&path).map_err(|e| e.to_string()));
        match result {
            Ok(()) => {
                logwise::info_sync!("dumped {path}", path = logwise::privacy::LogIt(&path));
            }
            Err(e) => {
                logwise::error_sync!(
                    "can't dump {path}: {e}",
                    path = logwise::privacy::LogIt(&path),
                    e = logwise::privacy::LogIt(&e)
                );
            }
        }
    }
}

impl FrameRenderer for Compositor {
    fn output_size(&self) -> (u32, u32) {
        Compositor::output_size(self)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        Compositor::resize(self, width, height)
    }

    fn render_to_buffer(&mut self, frame: usize, mode: Mode) -> Result<Vec<u8>, RenderError> {
        Compositor::render_to_buffer(self, frame, mode)
    }
}
