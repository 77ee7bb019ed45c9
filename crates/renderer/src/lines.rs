//! Debug line pipeline: colored segments through one view-projection.

use bytemuck::{Pod, Zeroable};
use corelib::debug_draw::LineSegment;
use glam::Mat4;
use wgpu::{
    BindGroup, Buffer, BufferUsages, ColorTargetState, ColorWrites, FragmentState,
    PipelineLayoutDescriptor, PrimitiveTopology, RenderPipeline, RenderPipelineDescriptor,
    ShaderModuleDescriptor, ShaderSource, ShaderStages, VertexBufferLayout, VertexState,
    VertexStepMode, util::DeviceExt,
};

use crate::GpuState;

const MIN_VERTEX_CAPACITY: usize = 256;

/// Vertex: position + color.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub pos: [f32; 3],
    pub color: [f32; 3],
}

impl LineVertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<LineVertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
    };
}

/// View-projection UBO (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ViewUniform {
    view_proj: [[f32; 4]; 4],
}

pub struct LineRenderer {
    pipeline: RenderPipeline,
    view_buf: Buffer,
    view_bg: BindGroup,
    vertex_buf: Buffer,
    capacity: usize,
    vertex_count: u32,
    scratch: Vec<LineVertex>,
}

impl LineRenderer {
    pub fn new(gpu: &GpuState) -> Self {
        let device = gpu.device();
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Lines WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/lines.wgsl").into()),
        });

        let view_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lines View BGL"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ViewUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });
        let view_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lines View UBO"),
            contents: bytemuck::bytes_of(&ViewUniform {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let view_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lines View BG"),
            layout: &view_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: view_buf.as_entire_binding(),
            }],
        });

        let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Lines PipelineLayout"),
            bind_group_layouts: &[&view_bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Lines Pipeline"),
            layout: Some(&layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[LineVertex::LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: gpu.surface_format(),
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(crate::depth_stencil_state()),
            multisample: crate::multisample_state(),
            multiview: None,
            cache: None,
        });

        let vertex_buf = create_vertex_buffer(device, MIN_VERTEX_CAPACITY);

        Self {
            pipeline,
            view_buf,
            view_bg,
            vertex_buf,
            capacity: MIN_VERTEX_CAPACITY,
            vertex_count: 0,
            scratch: Vec::with_capacity(MIN_VERTEX_CAPACITY),
        }
    }

    /// Upload this frame's segments and camera. Grows the vertex buffer
    /// when the segment count outgrows it.
    pub fn prepare(
        &mut self,
        gpu: &GpuState,
        view_proj: Mat4,
        segments: &[LineSegment],
        color: [f32; 3],
    ) {
        segments_to_vertices(segments, color, &mut self.scratch);
        self.vertex_count = self.scratch.len() as u32;

        if self.scratch.len() > self.capacity {
            self.capacity = self.scratch.len().next_power_of_two();
            log::debug!("Growing line vertex buffer to {} vertices", self.capacity);
            self.vertex_buf = create_vertex_buffer(gpu.device(), self.capacity);
        }

        let queue = gpu.queue();
        queue.write_buffer(
            &self.view_buf,
            0,
            bytemuck::bytes_of(&ViewUniform {
                view_proj: view_proj.to_cols_array_2d(),
            }),
        );
        if !self.scratch.is_empty() {
            queue.write_buffer(&self.vertex_buf, 0, bytemuck::cast_slice(&self.scratch));
        }
    }

    pub fn draw(&self, rpass: &mut wgpu::RenderPass<'_>) {
        if self.vertex_count == 0 {
            return;
        }
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.view_bg, &[]);
        rpass.set_vertex_buffer(0, self.vertex_buf.slice(..));
        rpass.draw(0..self.vertex_count, 0..1);
    }
}

fn create_vertex_buffer(device: &wgpu::Device, capacity: usize) -> Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Lines VB"),
        size: (capacity * std::mem::size_of::<LineVertex>()) as u64,
        usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Two vertices per segment, all in one color.
pub(crate) fn segments_to_vertices(
    segments: &[LineSegment],
    color: [f32; 3],
    out: &mut Vec<LineVertex>,
) {
    out.clear();
    out.extend(segments.iter().flat_map(|s| {
        [
            LineVertex {
                pos: s.start.to_array(),
                color,
            },
            LineVertex {
                pos: s.end.to_array(),
                color,
            },
        ]
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<LineVertex>(), 24);
        assert_eq!(std::mem::size_of::<ViewUniform>(), 64);
    }

    #[test]
    fn segments_expand_to_vertex_pairs() {
        let segs = [
            LineSegment::new(Vec3::ZERO, Vec3::X),
            LineSegment::new(Vec3::Y, Vec3::Z),
        ];
        let mut out = vec![LineVertex::zeroed()];
        segments_to_vertices(&segs, [1.0, 1.0, 0.0], &mut out);
        assert_eq!(out.len(), 4);
        assert_eq!(out[1].pos, [1.0, 0.0, 0.0]);
        assert_eq!(out[2].pos, [0.0, 1.0, 0.0]);
        assert!(out.iter().all(|v| v.color == [1.0, 1.0, 0.0]));
    }
}
