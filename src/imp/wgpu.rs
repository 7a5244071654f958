// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
mod bound_device;
mod buffer;
mod entry_point;
mod error;
mod prepared_pass;
mod readback;
mod texture;
mod unbound_device;
mod view;

pub use bound_device::BoundDevice;
pub use buffer::Buffer;
pub use entry_point::EntryPoint;
pub use error::Error;
pub use prepared_pass::{BindResource, PreparedPass, clear};
pub use readback::read_texture;
pub use texture::Texture;
pub use unbound_device::UnboundDevice;
pub use view::Surface;
