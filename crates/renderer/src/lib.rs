//! Renderer: wgpu device/surface/depth setup shared by the samples, plus
//! the debug-line and textured-quad pipelines they draw with.
//! wgpu = 26.x, winit = 0.30.x

use std::sync::Arc;

use thiserror::Error;
use wgpu::{
    CommandEncoderDescriptor, Device, DeviceDescriptor, Extent3d, Features, Instance,
    InstanceDescriptor, Limits, LoadOp, Operations, PowerPreference, PresentMode, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, StoreOp, Surface, SurfaceConfiguration,
    SurfaceError, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
    TextureViewDescriptor,
};
use winit::{dpi::PhysicalSize, window::Window};

mod lines;
mod quads;

pub use lines::{LineRenderer, LineVertex};
pub use quads::{QuadRenderer, QuadVertex, sampler_descriptor};

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// MSAA sample count of every pass and pipeline.
pub const SAMPLE_COUNT: u32 = 4;

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to open GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_format: TextureFormat,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Multisampled color + depth, resolved into the swapchain image
    msaa_view: TextureView,
    depth_view: TextureView,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an Arc<Window>.
    pub async fn new(window: Arc<Window>, backends: wgpu::Backends) -> Result<Self, RendererError> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Samples Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or(RendererError::NoSurfaceFormat)?;

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let msaa_view = create_attachment_view(&device, &surface_config, surface_format);
        let depth_view = create_attachment_view(&device, &surface_config, DEPTH_FORMAT);

        Ok(Self {
            surface,
            surface_format,
            surface_config,
            device,
            queue,
            msaa_view,
            depth_view,
            width,
            height,
        })
    }

    #[inline]
    pub fn device(&self) -> &Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    #[inline]
    pub fn surface_format(&self) -> TextureFormat {
        self.surface_format
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Resize: reconfigure surface & recreate the attachments.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.msaa_view =
            create_attachment_view(&self.device, &self.surface_config, self.surface_format);
        self.depth_view = create_attachment_view(&self.device, &self.surface_config, DEPTH_FORMAT);
    }

    /// One frame: acquire the swapchain image, clear color and depth, let
    /// `draw` record into the single render pass, submit and present.
    pub fn render_frame(
        &mut self,
        clear: wgpu::Color,
        draw: impl FnOnce(&mut wgpu::RenderPass<'_>),
    ) -> Result<(), SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &self.msaa_view,
                    depth_slice: None,
                    resolve_target: Some(&view),
                    ops: Operations {
                        load: LoadOp::Clear(clear),
                        store: StoreOp::Discard,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            draw(&mut rpass);
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }
}

/// Multisampled render attachment sized to the surface.
fn attachment_descriptor(
    sc: &SurfaceConfiguration,
    format: TextureFormat,
) -> TextureDescriptor<'static> {
    TextureDescriptor {
        label: Some(if format == DEPTH_FORMAT { "DepthTex" } else { "MsaaTex" }),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: SAMPLE_COUNT,
        dimension: TextureDimension::D2,
        format,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    }
}

fn create_attachment_view(
    device: &Device,
    sc: &SurfaceConfiguration,
    format: TextureFormat,
) -> TextureView {
    device
        .create_texture(&attachment_descriptor(sc, format))
        .create_view(&TextureViewDescriptor::default())
}

/// Shared depth state: write and test with less-equal.
fn depth_stencil_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::LessEqual,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Multisample state matching the render pass attachments.
fn multisample_state() -> wgpu::MultisampleState {
    wgpu::MultisampleState {
        count: SAMPLE_COUNT,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface_config(width: u32, height: u32) -> SurfaceConfiguration {
        SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: TextureFormat::Bgra8UnormSrgb,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        }
    }

    #[test]
    fn attachments_are_multisampled_and_surface_sized() {
        let sc = surface_config(640, 0);
        for format in [TextureFormat::Bgra8UnormSrgb, DEPTH_FORMAT] {
            let desc = attachment_descriptor(&sc, format);
            assert_eq!(desc.sample_count, SAMPLE_COUNT);
            assert_eq!(desc.format, format);
            assert_eq!((desc.size.width, desc.size.height), (640, 1));
            assert_eq!(desc.usage, TextureUsages::RENDER_ATTACHMENT);
        }
    }

    #[test]
    fn pipelines_sample_like_the_pass() {
        assert_eq!(multisample_state().count, SAMPLE_COUNT);
        assert_eq!(multisample_state().mask, !0);
    }
}
