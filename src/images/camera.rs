// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Camera utilities. */

use crate::images::projection::Projection;

/// Tracks the output size and the projection derived from it.
#[derive(Debug, Clone)]
pub struct Camera {
    window_size: (u32, u32),
    projection: Projection,
    dirty: bool,
}

impl Camera {
    fn rematrix(&mut self) {
        self.projection = Projection::orthographic(self.window_size.0, self.window_size.1);
        self.dirty = true;
    }

    pub fn new(window_size: (u32, u32)) -> Camera {
        Self {
            window_size,
            projection: Projection::orthographic(window_size.0, window_size.1),
            dirty: true,
        }
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    pub(crate) fn projection(&self) -> Projection {
        self.projection
    }

    /// The projection, if it changed since the last call.
    pub(crate) fn take_dirty(&mut self) -> Option<Projection> {
        if std::mem::replace(&mut self.dirty, false) {
            Some(self.projection)
        } else {
            None
        }
    }

    pub fn changed_size(&mut self, new_size: (u32, u32)) {
        if new_size != self.window_size {
            self.window_size = new_size;
            self.rematrix();
        }
    }
}
