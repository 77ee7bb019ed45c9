//! Platform layer: window, event loop and the per-sample callback cycle.
//!
//! A [`Sample`] is driven through `init` once, `frame` once per redraw,
//! `input` for every window event, and `cleanup` once before the GPU state
//! is dropped.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use renderer::GpuState;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

pub mod clock;

use clock::{FpsCounter, FrameClock, round_to_common_refresh_rate};

/// Window and backend options shared by all samples.
#[derive(Clone, Debug)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub backends: wgpu::Backends,
    pub show_fps: bool,
}

/// Application state of one sample program.
pub trait Sample {
    /// Called once after the window and GPU are up.
    fn init(&mut self, gpu: &GpuState) -> Result<()>;

    /// Called once per redraw with the frame time in seconds.
    fn frame(
        &mut self,
        gpu: &mut GpuState,
        window: &Window,
        frame_time: f64,
    ) -> Result<(), wgpu::SurfaceError>;

    /// Every window event, after the platform layer handled it.
    fn input(&mut self, _event: &WindowEvent) {}

    /// Release everything that must go before the GPU state.
    fn cleanup(&mut self) {}
}

/// Open a window and run `sample` until the window closes.
pub fn run_sample<S: Sample>(sample: S, config: WindowConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut runner = Runner {
        config,
        sample,
        window: None,
        gpu: None,
        clock: FrameClock::new(),
        fps: FpsCounter::new(Instant::now()),
        error: None,
    };
    event_loop
        .run_app(&mut runner)
        .map_err(|e| anyhow::anyhow!("Event loop error: {e:?}"))?;

    // exiting() normally did this already
    runner.shutdown();
    match runner.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct Runner<S: Sample> {
    config: WindowConfig,
    sample: S,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    clock: FrameClock,
    fps: FpsCounter,
    error: Option<anyhow::Error>,
}

impl<S: Sample> Runner<S> {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("Failed to create window")?,
        );
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        let gpu = pollster::block_on(GpuState::new(window.clone(), self.config.backends))
            .context("Failed to initialize GPU")?;
        self.sample.init(&gpu)?;

        self.window = Some(window);
        self.gpu = Some(gpu);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error.get_or_insert(err);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(gpu)) = (self.window.as_ref(), self.gpu.as_mut()) else {
            return;
        };

        let dt = round_to_common_refresh_rate(self.clock.lap());
        if self.config.show_fps {
            if let Some(fps) = self.fps.tick(Instant::now()) {
                log::info!("FPS: {fps:.1}");
            }
        }

        match self.sample.frame(gpu, window, dt.as_secs_f64()) {
            Ok(()) => {}
            Err(err) if GpuState::is_surface_lost(&err) => {
                log::warn!("Surface lost/outdated, reconfiguring");
                gpu.recreate_surface();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout, skipping frame");
            }
            Err(err) => {
                self.fail(event_loop, anyhow::anyhow!("Render error: {err:?}"));
            }
        }
    }

    /// Sample resources first, then the GPU state.
    fn shutdown(&mut self) {
        if self.gpu.is_none() {
            return;
        }
        self.sample.cleanup();
        self.gpu = None;
        self.window = None;
        log::info!("Sample shut down");
    }
}

impl<S: Sample> ApplicationHandler for Runner<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match &event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                log::info!("Resized: {}x{}", new_size.width, new_size.height);
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                log::info!("Scale factor changed: {:.3}", scale_factor);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
        self.sample.input(&event);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}
