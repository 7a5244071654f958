// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Orthographic projection from output pixels to clip space.

World units are pixels with the origin at the center of the output and `+y` up.  Depth
`[-1, 1]` maps to wgpu's `[0, 1]` clip range, so flat geometry at `z = 0` lands at `0.5`.
*/
use crate::pixel_formats::sealed::ReprC;

const NEAR: f32 = -1.0;
const FAR: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    ///column-major
    matrix: [f32; 16],
}

impl Projection {
    pub fn orthographic(width: u32, height: u32) -> Projection {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        let (left, right) = (-w / 2.0, w / 2.0);
        let (bottom, top) = (-h / 2.0, h / 2.0);
        let sx = 2.0 / (right - left);
        let sy = 2.0 / (top - bottom);
        let sz = 1.0 / (FAR - NEAR);
        let tx = -(right + left) / (right - left);
        let ty = -(top + bottom) / (top - bottom);
        let tz = -NEAR / (FAR - NEAR);
        #[rustfmt::skip]
        let matrix = [
            sx, 0.0, 0.0, 0.0,
            0.0, sy, 0.0, 0.0,
            0.0, 0.0, sz, 0.0,
            tx, ty, tz, 1.0,
        ];
        Projection { matrix }
    }

    pub fn matrix(&self) -> &[f32; 16] {
        &self.matrix
    }

    pub fn project(&self, world_coord: WorldCoord) -> ScreenCoord {
        let m = &self.matrix;
        let v = [world_coord.x, world_coord.y, world_coord.z, 1.0];
        let row = |r: usize| (0..4).map(|c| m[c * 4 + r] * v[c]).sum::<f32>();
        let w = row(3);
        ScreenCoord {
            x: row(0) / w,
            y: row(1) / w,
            z: row(2) / w,
        }
    }
}

/// Clip-space coordinate after projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenCoord {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldCoord {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldCoord {
    pub fn new(x: f32, y: f32, z: f32) -> WorldCoord {
        WorldCoord { x, y, z }
    }
}

/// The camera uniform as the vertex shader sees it.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct CameraProjection {
    pub projection: [f32; 16],
}
unsafe impl ReprC for CameraProjection {}

impl From<&Projection> for CameraProjection {
    fn from(projection: &Projection) -> Self {
        CameraProjection {
            projection: projection.matrix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_map_to_clip_edges() {
        let p = Projection::orthographic(8, 2);
        assert_eq!(
            p.project(WorldCoord::new(-4.0, 1.0, 0.0)),
            ScreenCoord { x: -1.0, y: 1.0, z: 0.5 }
        );
        assert_eq!(
            p.project(WorldCoord::new(4.0, -1.0, 0.0)),
            ScreenCoord { x: 1.0, y: -1.0, z: 0.5 }
        );
        assert_eq!(p.project(WorldCoord::new(0.0, 0.0, -1.0)).z, 0.0);
    }

    #[test]
    fn zero_size_does_not_divide_by_zero() {
        let p = Projection::orthographic(0, 0);
        assert!(p.matrix().iter().all(|v| v.is_finite()));
    }
}
