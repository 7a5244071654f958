// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
frame_shift displaces every pixel of an animation in time.

A *shift mask* the size of the animation's frames says, per pixel, how many frames ahead
(or behind) that pixel should be shown.  Rendering frame `n` then shows, at each pixel,
the same pixel of frame `(n + shift) mod frame_count`.  Zero shift everywhere reproduces
the animation unchanged.

# Pieces

| module          | role                                                                  |
|-----------------|-----------------------------------------------------------------------|
| [shift_mask]    | packs signed shifts into RGB bytes, plus mask editing operations      |
| [atlas]         | tiles frames into square atlas images                                 |
| [render_state]  | the validated, uploaded resources for one animation                   |
| [compositor]    | the wgpu compositor, drawing the displaced frame one atlas at a time  |
| [software]      | the same algorithm on the CPU                                         |
| [export]        | renders every frame in order and feeds a container encoder            |

# How a frame is drawn

Frames are packed into as few atlases as the device's texture limit allows.  Each atlas is
one render pass.  A pass looks up, for each pixel, which frame that pixel wants; if the
frame lives in this pass's atlas the pass samples it, otherwise it keeps what the
previous pass produced.  Passes read and write two equally sized targets in turn, so after
the last atlas every pixel has been resolved exactly once.

# Backends

Rendering targets [wgpu](https://wgpu.rs), so it inherits wgpu's broad support for DX12,
Vulkan, Metal, WebGPU, Angle, WebGL, etc.  Frames can also be rendered without a GPU
through [software::SoftwareCompositor].
*/

pub mod animation;
pub mod atlas;
pub mod bitmap;
pub mod compositor;
pub mod config;
mod entry_point;
pub mod export;
pub mod images;
mod imp;
pub mod pixel_formats;
pub mod render_state;
pub mod shift_mask;
pub mod software;

pub use animation::{Animation, Frame};
pub use compositor::{Compositor, ConfigError, Mode, RenderError};
pub use entry_point::{EntryPoint, EntryPointError};
pub use export::{ContainerEncoder, ExportError, Exporter, FrameRenderer, GifEncoder};
/// Errors reported by the GPU backend.
pub use imp::Error as GpuError;
pub use shift_mask::ShiftMask;
