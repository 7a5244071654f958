// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Geometry for full-target passes.

Every pass draws one quad that exactly covers the output.  Positions are in world units
centered on the origin, so the orthographic [Projection](super::projection::Projection)
for the same size maps the quad edge to edge.  Texture coordinates put `(0, 0)` at the
top-left corner and `(1, 1)` at the bottom-right.
*/
use crate::pixel_formats::sealed::ReprC;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}
unsafe impl ReprC for QuadVertex {}

/// Number of vertices [quad] produces.  Drawn as a triangle strip.
pub const QUAD_VERTEX_COUNT: u32 = 4;

/// A `width`x`height` quad in strip order: top-left, bottom-left, top-right, bottom-right.
pub fn quad(width: u32, height: u32) -> [QuadVertex; 4] {
    let half_w = width as f32 / 2.0;
    let half_h = height as f32 / 2.0;
    [
        QuadVertex {
            position: [-half_w, half_h],
            uv: [0.0, 0.0],
        },
        QuadVertex {
            position: [-half_w, -half_h],
            uv: [0.0, 1.0],
        },
        QuadVertex {
            position: [half_w, half_h],
            uv: [1.0, 0.0],
        },
        QuadVertex {
            position: [half_w, -half_h],
            uv: [1.0, 1.0],
        },
    ]
}
