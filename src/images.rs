// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! The GPU-facing layer: engine, views, passes and their geometry. */

pub use engine::Engine;

pub mod render_pass;

pub(crate) mod device;
pub mod engine;

pub(crate) mod camera;
pub mod projection;
pub mod shader;
pub mod vertex_algorithms;
pub mod view;

pub use device::{BindError, BoundDevice, PickError};
