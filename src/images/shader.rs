// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! WGSL shader sources. */

#[derive(Debug, Clone)]
pub struct FragmentShader {
    pub(crate) label: &'static str,
    pub(crate) wgsl_code: String,
}
#[derive(Debug, Clone)]
pub struct VertexShader {
    pub(crate) label: &'static str,
    pub(crate) wgsl_code: String,
}

impl FragmentShader {
    pub fn new(label: &'static str, wgsl_code: String) -> Self {
        Self { label, wgsl_code }
    }
}

impl VertexShader {
    pub fn new(label: &'static str, wgsl_code: String) -> Self {
        Self { label, wgsl_code }
    }
}

/// Vertex stage shared by every pass: a quad through the camera projection.
pub(crate) fn quad_vertex_shader() -> VertexShader {
    VertexShader::new("quad vertex", include_str!("../shaders/quad.wgsl").to_string())
}

pub(crate) fn frame_shift_fragment() -> FragmentShader {
    FragmentShader::new(
        "frame shift fragment",
        include_str!("../shaders/frame_shift.wgsl").to_string(),
    )
}

pub(crate) fn mask_view_fragment() -> FragmentShader {
    FragmentShader::new(
        "mask view fragment",
        include_str!("../shaders/mask_view.wgsl").to_string(),
    )
}

pub(crate) fn blit_fragment() -> FragmentShader {
    FragmentShader::new("blit fragment", include_str!("../shaders/blit.wgsl").to_string())
}
