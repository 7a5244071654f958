// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::images::render_pass::{BindTarget, DrawCommand, PassDescriptor, Stage};
use crate::images::vertex_algorithms::QuadVertex;
use crate::imp::{BoundDevice, Error};
use wgpu::{
    BindGroupLayoutEntry, BindingType, BufferBindingType, BufferSize, ColorTargetState,
    MultisampleState, PipelineLayoutDescriptor, PolygonMode, PrimitiveState, PrimitiveTopology,
    RenderPipeline, RenderPipelineDescriptor, TextureFormat, TextureSampleType,
    TextureViewDimension, VertexBufferLayout, VertexState, VertexStepMode,
};

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

/// A resource for one binding slot, in the same order as the descriptor's binds.
#[derive(Debug, Clone, Copy)]
pub enum BindResource<'a> {
    Buffer(&'a wgpu::Buffer),
    Texture(&'a wgpu::TextureView),
}

/**
A pass that is prepared to be rendered (compiled, layout calculated, etc.)
*/
#[derive(Debug)]
pub struct PreparedPass {
    name: String,
    pipeline: RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    vertex_count: u32,
}

impl PreparedPass {
    pub fn new(
        bound_device: &BoundDevice,
        descriptor: &PassDescriptor,
        target_format: TextureFormat,
    ) -> Result<PreparedPass, Error> {
        let layouts: Vec<BindGroupLayoutEntry> = descriptor
            .binds
            .iter()
            .enumerate()
            .map(|(slot, bind)| {
                let visibility = match bind.stage {
                    Stage::Vertex => wgpu::ShaderStages::VERTEX,
                    Stage::Fragment => wgpu::ShaderStages::FRAGMENT,
                };
                let ty = match bind.target {
                    BindTarget::Uniform(size) => BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: BufferSize::new(size),
                    },
                    //read with textureLoad, never filtered
                    BindTarget::Texture => BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: false },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                };
                BindGroupLayoutEntry {
                    binding: slot as u32,
                    visibility,
                    ty,
                    count: None,
                }
            })
            .collect();

        let name = descriptor.name();
        let (pipeline, bind_group_layout) = bound_device.scoped("render pipeline", |device| {
            let bind_group_layout =
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(name),
                    entries: layouts.as_slice(),
                });
            let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(name),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });
            let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(descriptor.vertex_shader.label),
                source: wgpu::ShaderSource::Wgsl(std::borrow::Cow::Borrowed(
                    &descriptor.vertex_shader.wgsl_code,
                )),
            });
            let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(descriptor.fragment_shader.label),
                source: wgpu::ShaderSource::Wgsl(std::borrow::Cow::Borrowed(
                    &descriptor.fragment_shader.wgsl_code,
                )),
            });
            let vertex_buffers = [VertexBufferLayout {
                array_stride: std::mem::size_of::<QuadVertex>() as u64,
                step_mode: VertexStepMode::Vertex,
                attributes: &QUAD_ATTRIBUTES,
            }];
            let topology = match descriptor.draw_command() {
                DrawCommand::TriangleStrip(_) => PrimitiveTopology::TriangleStrip,
            };
            let render_descriptor = RenderPipelineDescriptor {
                label: Some(name),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: &vertex_module,
                    entry_point: None,
                    compilation_options: Default::default(),
                    buffers: &vertex_buffers,
                },
                primitive: PrimitiveState {
                    topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    unclipped_depth: false,
                    polygon_mode: PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment_module,
                    entry_point: None,
                    compilation_options: Default::default(),
                    //passes replace their target outright
                    targets: &[Some(ColorTargetState {
                        format: target_format,
                        blend: None,
                        write_mask: Default::default(),
                    })],
                }),
                multiview: None,
                cache: None,
            };
            (
                device.create_render_pipeline(&render_descriptor),
                bind_group_layout,
            )
        })?;
        logwise::trace_sync!(
            "Created render pipeline {name}",
            name = logwise::privacy::LogIt(&name)
        );
        Ok(PreparedPass {
            name: name.to_string(),
            pipeline,
            bind_group_layout,
            vertex_count: descriptor.draw_command().vertex_count(),
        })
    }

    /// Binds `resources` to slots `0..resources.len()`.
    pub fn bind_group(&self, bound_device: &BoundDevice, resources: &[BindResource<'_>]) -> wgpu::BindGroup {
        let entries: Vec<wgpu::BindGroupEntry<'_>> = resources
            .iter()
            .enumerate()
            .map(|(slot, resource)| wgpu::BindGroupEntry {
                binding: slot as u32,
                resource: match resource {
                    BindResource::Buffer(buffer) => buffer.as_entire_binding(),
                    BindResource::Texture(view) => wgpu::BindingResource::TextureView(view),
                },
            })
            .collect();
        bound_device
            .device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(self.name.as_str()),
                layout: &self.bind_group_layout,
                entries: &entries,
            })
    }

    /// Records one draw of this pass into `target`, clearing it first.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        bind_group: &wgpu::BindGroup,
        vertices: &wgpu::Buffer,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(self.name.as_str()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        render_pass.set_vertex_buffer(0, vertices.slice(..));
        render_pass.draw(0..self.vertex_count, 0..1);
    }
}

/// Clears `target` to transparent without drawing.
pub fn clear(encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
    let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("clear"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
}
