//! Sample programs: mipmap filtering and skeletal animation playback.

pub mod anim_playback;
pub mod config;
pub mod demo_rig;
pub mod mipmap;

pub use anim_playback::AnimPlaybackSample;
pub use config::AppConfig;
pub use mipmap::MipmapSample;

/// Logger setup shared by the binaries; `RUST_LOG` overrides the default.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
