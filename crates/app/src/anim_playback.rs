//! Skeletal animation playback sample: loads a skeleton and a clip in the
//! background, then draws the animated skeleton as bone wireframes.
//!
//! Keys: Space pauses, Up/Down change the playback speed, holding
//! Left/Right scrubs through the clip.

use std::path::PathBuf;

use anyhow::Result;
use asset::CharacterLoader;
use corelib::Character;
use corelib::camera::{Camera, orbit_eye};
use corelib::debug_draw::{BONE_COLOR, LineSegment, skeleton_lines};
use corelib::playback::Playback;
use corelib::{Mat4, Vec3};
use platform::Sample;
use renderer::{GpuState, LineRenderer};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::Window;

pub const LOAD_FAILED_MESSAGE: &str = "Failed loading character data!";

const TIME_FACTOR_STEP: f32 = 0.5;
/// Clip ratio per second while scrubbing.
const SCRUB_SPEED: f32 = 0.25;

const CAMERA_CENTER: Vec3 = Vec3::new(0.0, 1.0, 0.0);
const CAMERA_DISTANCE: f32 = 3.0;
const CAMERA_LATITUDE_DEG: f32 = 10.0;
const CAMERA_LONGITUDE_DEG: f32 = 20.0;

const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.1,
    b: 0.2,
    a: 1.0,
};

pub struct AnimPlaybackSample {
    assets_dir: PathBuf,
    loader: Option<CharacterLoader>,
    character: Option<Character>,
    playback: Playback,
    lines: Option<LineRenderer>,
    segments: Vec<LineSegment>,
    /// -1 / +1 while a scrub key is held.
    scrub: Option<f32>,
    failed: bool,
}

impl AnimPlaybackSample {
    pub fn new(assets_dir: PathBuf) -> Self {
        Self {
            assets_dir,
            loader: None,
            character: None,
            playback: Playback::new(),
            lines: None,
            segments: Vec::new(),
            scrub: None,
            failed: false,
        }
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn is_loaded(&self) -> bool {
        self.character.is_some()
    }

    pub fn load_failed(&self) -> bool {
        self.failed
    }

    fn start_loading(&mut self) {
        log::info!("Loading character data from {}", self.assets_dir.display());
        self.loader = Some(CharacterLoader::start(&self.assets_dir));
    }

    /// Pick up finished loads. Returns true the first time a failure is seen.
    fn poll_loader(&mut self) -> bool {
        let Some(loader) = self.loader.as_mut() else {
            return false;
        };
        for err in loader.poll() {
            log::error!("{err}");
        }
        if let Some((skeleton, animation)) = loader.take_ready() {
            match Character::new(skeleton, animation) {
                Ok(character) => {
                    log::info!(
                        "Character ready: {} joints, clip '{}'",
                        character.skeleton().num_joints(),
                        character.animation().name()
                    );
                    self.character = Some(character);
                }
                Err(err) => {
                    log::error!("{err}");
                    loader.mark_failed();
                }
            }
        }

        let state = loader.state();
        if !state.is_pending() {
            self.loader = None;
        }
        if state.load_failed && !self.failed {
            self.failed = true;
            log::error!("{LOAD_FAILED_MESSAGE}");
            return true;
        }
        false
    }

    /// Advance playback and rebuild the bone segments for this frame.
    fn update(&mut self, frame_time: f64) {
        self.segments.clear();
        let Some(character) = self.character.as_mut() else {
            return;
        };

        self.playback.advance(frame_time);
        if let Some(dir) = self.scrub {
            let ratio = self.playback.current_ratio() + dir * SCRUB_SPEED * frame_time as f32;
            self.playback.override_ratio(ratio);
        }
        let ratio = self.playback.ratio(character.animation().duration());

        let evaluated = character.evaluate(ratio).map(|_| ());
        if let Err(err) = evaluated {
            log::error!("Pose evaluation failed: {err}");
            self.character = None;
            self.failed = true;
            return;
        }
        skeleton_lines(character.skeleton(), &character.pose().models, &mut self.segments);
    }

    fn key(&mut self, code: KeyCode, state: ElementState, repeat: bool) {
        let pressed = state == ElementState::Pressed;
        match code {
            KeyCode::Space if pressed && !repeat => {
                let paused = self.playback.toggle_paused();
                log::info!("Playback {}", if paused { "paused" } else { "resumed" });
            }
            KeyCode::ArrowUp | KeyCode::ArrowDown if pressed => {
                let step = if code == KeyCode::ArrowUp {
                    TIME_FACTOR_STEP
                } else {
                    -TIME_FACTOR_STEP
                };
                self.playback.set_time_factor(self.playback.time_factor() + step);
                log::info!("Time factor: {:.1}", self.playback.time_factor());
            }
            KeyCode::ArrowLeft | KeyCode::ArrowRight => {
                if pressed {
                    self.scrub = Some(if code == KeyCode::ArrowRight { 1.0 } else { -1.0 });
                } else {
                    self.scrub = None;
                    self.playback.release_override();
                }
            }
            _ => {}
        }
    }
}

/// Fixed orbit camera looking at the character's chest.
pub fn view_proj(aspect: f32) -> Mat4 {
    let eye = orbit_eye(
        CAMERA_CENTER,
        CAMERA_DISTANCE,
        CAMERA_LATITUDE_DEG,
        CAMERA_LONGITUDE_DEG,
    );
    Camera::new_perspective(
        eye,
        CAMERA_CENTER,
        Vec3::Y,
        60f32.to_radians(),
        0.1,
        100.0,
        aspect,
    )
    .proj_view()
}

impl Sample for AnimPlaybackSample {
    fn init(&mut self, gpu: &GpuState) -> Result<()> {
        self.lines = Some(LineRenderer::new(gpu));
        self.start_loading();
        Ok(())
    }

    fn frame(
        &mut self,
        gpu: &mut GpuState,
        window: &Window,
        frame_time: f64,
    ) -> Result<(), wgpu::SurfaceError> {
        if self.poll_loader() {
            window.set_title(&format!("{} - {LOAD_FAILED_MESSAGE}", window.title()));
        }
        self.update(frame_time);

        let Some(lines) = self.lines.as_mut() else {
            return Ok(());
        };
        lines.prepare(gpu, view_proj(gpu.aspect()), &self.segments, BONE_COLOR);
        let lines = &*lines;
        gpu.render_frame(CLEAR, |rpass| lines.draw(rpass))
    }

    fn input(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(code),
                    state,
                    repeat,
                    ..
                },
            ..
        } = event
        {
            self.key(*code, *state, *repeat);
        }
    }

    fn cleanup(&mut self) {
        self.loader = None;
        self.character = None;
        self.lines = None;
        self.segments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo_rig::{demo_skeleton, walk_cycle};
    use asset::archive::{write_animation, write_skeleton};
    use asset::loader::{ANIMATION_FILE, SKELETON_FILE};
    use std::time::{Duration, Instant};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("anim-playback-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn wait_for_load(sample: &mut AnimPlaybackSample) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while sample.loader.is_some() && Instant::now() < deadline {
            sample.poll_loader();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn loaded_sample(name: &str) -> AnimPlaybackSample {
        let dir = temp_dir(name);
        let skeleton = demo_skeleton().unwrap();
        let clip = walk_cycle(&skeleton).unwrap();
        std::fs::write(dir.join(SKELETON_FILE), write_skeleton(&skeleton).unwrap()).unwrap();
        std::fs::write(dir.join(ANIMATION_FILE), write_animation(&clip).unwrap()).unwrap();

        let mut sample = AnimPlaybackSample::new(dir);
        sample.start_loading();
        wait_for_load(&mut sample);
        sample
    }

    #[test]
    fn nothing_drawn_until_loaded() {
        let mut sample = AnimPlaybackSample::new(temp_dir("idle"));
        sample.update(0.5);
        assert!(sample.segments.is_empty());
        assert_eq!(sample.playback().abs_time(), 0.0);
    }

    #[test]
    fn loads_and_draws_every_bone() {
        let mut sample = loaded_sample("draw");
        assert!(sample.is_loaded());
        assert!(!sample.load_failed());

        sample.update(0.25);
        // 18 non-root joints, 12 segments each
        assert_eq!(sample.segments.len(), 18 * 12);
        assert!((sample.playback().current_ratio() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn missing_files_fail_once() {
        let mut sample = AnimPlaybackSample::new(temp_dir("missing"));
        sample.start_loading();
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut reported = 0;
        while sample.loader.is_some() && Instant::now() < deadline {
            if sample.poll_loader() {
                reported += 1;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(reported, 1);
        assert!(sample.load_failed());
        assert!(!sample.is_loaded());
        sample.update(0.1);
        assert!(sample.segments.is_empty());
    }

    #[test]
    fn keys_drive_playback() {
        let mut sample = loaded_sample("keys");
        sample.key(KeyCode::Space, ElementState::Pressed, false);
        assert!(sample.playback().is_paused());
        sample.update(1.0);
        assert_eq!(sample.playback().abs_time(), 0.0);
        sample.key(KeyCode::Space, ElementState::Pressed, false);

        sample.key(KeyCode::ArrowUp, ElementState::Pressed, false);
        assert_eq!(sample.playback().time_factor(), 1.5);
        for _ in 0..30 {
            sample.key(KeyCode::ArrowDown, ElementState::Pressed, true);
        }
        assert_eq!(sample.playback().time_factor(), 0.0);

        sample.key(KeyCode::ArrowRight, ElementState::Pressed, false);
        sample.update(1.0);
        assert!(sample.playback().is_overridden());
        assert!((sample.playback().current_ratio() - SCRUB_SPEED).abs() < 1e-6);
        sample.key(KeyCode::ArrowRight, ElementState::Released, false);
        assert!(!sample.playback().is_overridden());
    }

    #[test]
    fn camera_sees_the_rig_center() {
        let p = view_proj(4.0 / 3.0).project_point3(CAMERA_CENTER);
        assert!(p.x.abs() < 1e-5 && p.y.abs() < 1e-5);
        assert!(p.z > 0.0 && p.z < 1.0);
    }
}
