//! Skeletal animation playback sample.

use anyhow::Result;
use app::{AnimPlaybackSample, AppConfig, init_logging};

fn main() -> Result<()> {
    init_logging();
    let config = AppConfig::from_env();
    log::info!(
        "Starting animation sample. Backend: {:?}, assets={}, window_size={}x{}",
        config.backends,
        config.assets_dir.display(),
        config.width,
        config.height
    );

    platform::run_sample(
        AnimPlaybackSample::new(config.assets_dir.clone()),
        config.window("Animation Playback"),
    )?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
