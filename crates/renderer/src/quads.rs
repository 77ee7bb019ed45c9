//! Textured quad pipeline: one mipmapped texture, one sampler per quad.

use asset::mipmap::{BASE_DIM, MipChain};
use asset::sampler::SamplerConfig;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::{
    AddressMode, BindGroup, Buffer, BufferUsages, ColorTargetState, ColorWrites, Extent3d,
    FilterMode, FragmentState, PipelineLayoutDescriptor, PrimitiveTopology, Queue, RenderPipeline,
    RenderPipelineDescriptor, ShaderModuleDescriptor, ShaderSource, ShaderStages, TextureDimension,
    TextureFormat, TextureUsages, VertexBufferLayout, VertexState, VertexStepMode,
    util::DeviceExt,
};

use crate::GpuState;

const TEXTURE_FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

/// Vertex: position + texcoord.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct QuadVertex {
    pub pos: [f32; 3],
    pub uv: [f32; 2],
}

impl QuadVertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
    };
}

/// Unit plane in XY, drawn as a 4-vertex triangle strip.
#[rustfmt::skip]
const QUAD: [QuadVertex; 4] = [
    QuadVertex { pos: [-1.0, -1.0, 0.0], uv: [0.0, 0.0] },
    QuadVertex { pos: [ 1.0, -1.0, 0.0], uv: [1.0, 0.0] },
    QuadVertex { pos: [-1.0,  1.0, 0.0], uv: [0.0, 1.0] },
    QuadVertex { pos: [ 1.0,  1.0, 0.0], uv: [1.0, 1.0] },
];

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct QuadUniform {
    mvp: [[f32; 4]; 4],
}

struct QuadInstance {
    uniform_buf: Buffer,
    bind_group: BindGroup,
}

pub struct QuadRenderer {
    pipeline: RenderPipeline,
    vertex_buf: Buffer,
    instances: Vec<QuadInstance>,
}

impl QuadRenderer {
    /// Upload `mips` once and create one quad instance per sampler config.
    pub fn new(gpu: &GpuState, mips: &MipChain, samplers: &[SamplerConfig]) -> Self {
        let device = gpu.device();

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Mip Checker Tex"),
            size: Extent3d {
                width: BASE_DIM,
                height: BASE_DIM,
                depth_or_array_layers: 1,
            },
            mip_level_count: mips.num_levels() as u32,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for level in mips.levels() {
            let data = level.to_texture_data();
            gpu.queue().write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: level.level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &data.data,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(data.width * data.bytes_per_pixel()),
                    rows_per_image: Some(data.height),
                },
                Extent3d {
                    width: data.width,
                    height: data.height,
                    depth_or_array_layers: 1,
                },
            );
        }
        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Quad WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/quad.wgsl").into()),
        });

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Quad BGL"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<QuadUniform>() as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let instances = samplers
            .iter()
            .enumerate()
            .map(|(i, config)| {
                let sampler = device.create_sampler(&sampler_descriptor(config));
                let uniform_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Quad UBO"),
                    contents: bytemuck::bytes_of(&QuadUniform {
                        mvp: Mat4::IDENTITY.to_cols_array_2d(),
                    }),
                    usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Quad BG"),
                    layout: &bgl,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: uniform_buf.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(&texture_view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&sampler),
                        },
                    ],
                });
                log::debug!("Quad {i}: {:?}", config);
                QuadInstance {
                    uniform_buf,
                    bind_group,
                }
            })
            .collect();

        let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Quad PipelineLayout"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Quad Pipeline"),
            layout: Some(&layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[QuadVertex::LAYOUT],
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
            // quads rotate through their back side
            primitive: wgpu::PrimitiveState {
                topology: PrimitiveTopology::TriangleStrip,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(crate::depth_stencil_state()),
            multisample: crate::multisample_state(),
            multiview: None,
            cache: None,
        });

        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad VB"),
            contents: bytemuck::cast_slice(&QUAD),
            usage: BufferUsages::VERTEX,
        });

        Self {
            pipeline,
            vertex_buf,
            instances,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Write one MVP per instance; extra matrices are ignored.
    pub fn prepare(&self, queue: &Queue, mvps: &[Mat4]) {
        for (inst, mvp) in self.instances.iter().zip(mvps) {
            queue.write_buffer(
                &inst.uniform_buf,
                0,
                bytemuck::bytes_of(&QuadUniform {
                    mvp: mvp.to_cols_array_2d(),
                }),
            );
        }
    }

    pub fn draw(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_pipeline(&self.pipeline);
        rpass.set_vertex_buffer(0, self.vertex_buf.slice(..));
        for inst in &self.instances {
            rpass.set_bind_group(0, &inst.bind_group, &[]);
            rpass.draw(0..QUAD.len() as u32, 0..1);
        }
    }
}

fn filter_mode(linear: bool) -> FilterMode {
    if linear {
        FilterMode::Linear
    } else {
        FilterMode::Nearest
    }
}

/// wgpu sampler for a config; magnification is always linear.
pub fn sampler_descriptor(config: &SamplerConfig) -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        label: Some("Mip Sampler"),
        address_mode_u: AddressMode::Repeat,
        address_mode_v: AddressMode::Repeat,
        address_mode_w: AddressMode::Repeat,
        mag_filter: FilterMode::Linear,
        min_filter: filter_mode(config.min_filter.is_linear()),
        mipmap_filter: filter_mode(config.min_filter.is_mipmap_linear()),
        lod_min_clamp: config.min_lod,
        lod_max_clamp: config.max_lod,
        anisotropy_clamp: config.max_anisotropy.max(1),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset::sampler::{MinFilter, mipmap_sampler_matrix};

    #[test]
    fn sampler_filters_follow_config() {
        let d = sampler_descriptor(&SamplerConfig::new(MinFilter::NearestMipmapLinear));
        assert_eq!(d.mag_filter, FilterMode::Linear);
        assert_eq!(d.min_filter, FilterMode::Nearest);
        assert_eq!(d.mipmap_filter, FilterMode::Linear);
        assert_eq!(d.anisotropy_clamp, 1);
    }

    #[test]
    fn anisotropic_samplers_are_fully_linear() {
        // wgpu rejects anisotropy unless every filter is linear
        for config in mipmap_sampler_matrix().iter().filter(|c| c.max_anisotropy > 1) {
            let d = sampler_descriptor(config);
            assert_eq!(d.min_filter, FilterMode::Linear);
            assert_eq!(d.mipmap_filter, FilterMode::Linear);
        }
    }

    #[test]
    fn lod_clamp_is_carried() {
        let m = mipmap_sampler_matrix();
        let d = sampler_descriptor(&m[5]);
        assert_eq!((d.lod_min_clamp, d.lod_max_clamp), (2.0, 4.0));
    }
}
