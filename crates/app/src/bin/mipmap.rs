//! Mipmap filtering sample.

use anyhow::Result;
use app::{AppConfig, MipmapSample, init_logging};

fn main() -> Result<()> {
    init_logging();
    let config = AppConfig::from_env();
    log::info!(
        "Starting mipmap sample. Backend: {:?}, show_fps={}, window_size={}x{}",
        config.backends,
        config.show_fps,
        config.width,
        config.height
    );

    platform::run_sample(
        MipmapSample::new(config.dump_mips.clone()),
        config.window("Mipmapping"),
    )?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
