//! Mipmap filtering sample: twelve rotating quads, one per sampler config.

use std::path::PathBuf;

use anyhow::Result;
use asset::{MipChain, SamplerConfig, mipmap_sampler_matrix};
use corelib::camera::Camera;
use corelib::{Mat4, Vec3};
use platform::Sample;
use renderer::{GpuState, QuadRenderer};
use winit::window::Window;

/// Rotation added per rendered frame, in degrees.
pub const ROTATION_STEP_DEG: f32 = 0.1;

const GRID_COLUMNS: usize = 4;

const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.5,
    g: 0.5,
    b: 0.5,
    a: 1.0,
};

pub struct MipmapSample {
    dump_dir: Option<PathBuf>,
    samplers: [SamplerConfig; 12],
    quads: Option<QuadRenderer>,
    rotation_deg: f32,
}

impl MipmapSample {
    pub fn new(dump_dir: Option<PathBuf>) -> Self {
        Self {
            dump_dir,
            samplers: mipmap_sampler_matrix(),
            quads: None,
            rotation_deg: 0.0,
        }
    }

    pub fn rotation_deg(&self) -> f32 {
        self.rotation_deg
    }

    fn step(&mut self) {
        self.rotation_deg += ROTATION_STEP_DEG;
    }
}

/// Grid cell of quad `index`: four columns, three rows, row 0 on top.
pub fn grid_offset(index: usize) -> Vec3 {
    let col = (index % GRID_COLUMNS) as f32;
    let row = (index / GRID_COLUMNS) as f32;
    Vec3::new((col - 1.5) * 2.0, (row - 1.0) * -2.0, 0.0)
}

/// One model-view-projection per quad, all sharing the same X rotation.
pub fn grid_mvps(aspect: f32, rotation_deg: f32, count: usize) -> Vec<Mat4> {
    let camera = Camera::new_perspective(
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::ZERO,
        Vec3::Y,
        90f32.to_radians(),
        0.01,
        10.0,
        aspect,
    );
    let view_proj = camera.proj_view();
    let rotation = Mat4::from_rotation_x(rotation_deg.to_radians());
    (0..count)
        .map(|i| view_proj * Mat4::from_translation(grid_offset(i)) * rotation)
        .collect()
}

impl Sample for MipmapSample {
    fn init(&mut self, gpu: &GpuState) -> Result<()> {
        let mips = MipChain::checkerboard();
        if let Some(dir) = &self.dump_dir {
            mips.save_png_levels(dir)?;
            log::info!("Wrote {} mip levels to {}", mips.num_levels(), dir.display());
        }
        self.quads = Some(QuadRenderer::new(gpu, &mips, &self.samplers));
        log::info!("Mipmap sample ready: {} samplers", self.samplers.len());
        Ok(())
    }

    fn frame(
        &mut self,
        gpu: &mut GpuState,
        _window: &Window,
        _frame_time: f64,
    ) -> Result<(), wgpu::SurfaceError> {
        self.step();
        let Some(quads) = self.quads.as_ref() else {
            return Ok(());
        };
        let mvps = grid_mvps(gpu.aspect(), self.rotation_deg, quads.len());
        quads.prepare(gpu.queue(), &mvps);
        gpu.render_frame(CLEAR, |rpass| quads.draw(rpass))
    }

    fn cleanup(&mut self) {
        self.quads = None;
    }
}
