// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::images::shader::{FragmentShader, VertexShader};

/// Which shader stage sees a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

/// What sits at a binding slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindTarget {
    /// A uniform buffer of exactly this many bytes.
    Uniform(u64),
    /// An RGBA texture read with `textureLoad`.
    Texture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bind {
    pub stage: Stage,
    pub target: BindTarget,
}

impl Bind {
    pub const fn new(stage: Stage, target: BindTarget) -> Self {
        Bind { stage, target }
    }
}

/**
Everything needed to build a pipeline for one kind of pass.

Binds are numbered by position: `binds[0]` is `@binding(0)` in group 0.
*/
#[derive(Debug, Clone)]
pub struct PassDescriptor {
    pub(crate) name: String,
    pub(crate) vertex_shader: VertexShader,
    pub(crate) fragment_shader: FragmentShader,
    pub(crate) binds: Vec<Bind>,
    pub(crate) draw_command: DrawCommand,
}

impl PassDescriptor {
    pub fn new(
        name: String,
        vertex_shader: VertexShader,
        fragment_shader: FragmentShader,
        binds: Vec<Bind>,
        draw_command: DrawCommand,
    ) -> Self {
        Self {
            name,
            vertex_shader,
            fragment_shader,
            binds,
            draw_command,
        }
    }

    pub(crate) fn name(&self) -> &str {
        self.name.as_str()
    }

    pub(crate) const fn draw_command(&self) -> &DrawCommand {
        &self.draw_command
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCommand {
    ///payload is the number of vertices
    TriangleStrip(u32),
}

impl DrawCommand {
    pub const fn vertex_count(&self) -> u32 {
        match self {
            DrawCommand::TriangleStrip(count) => *count,
        }
    }
}
