//! Writes the demo skeleton and walk cycle archives for `anim-playback`.

use anyhow::{Context, Result};
use app::demo_rig::{demo_skeleton, walk_cycle};
use app::{AppConfig, init_logging};
use asset::archive::{write_animation, write_skeleton};
use asset::loader::{ANIMATION_FILE, SKELETON_FILE};

fn main() -> Result<()> {
    init_logging();
    let config = AppConfig::from_env();
    let out = config.out_dir.unwrap_or(config.assets_dir);
    std::fs::create_dir_all(&out).with_context(|| format!("creating {}", out.display()))?;

    let skeleton = demo_skeleton()?;
    let clip = walk_cycle(&skeleton)?;

    let skeleton_path = out.join(SKELETON_FILE);
    let bytes = write_skeleton(&skeleton)?;
    std::fs::write(&skeleton_path, &bytes)
        .with_context(|| format!("writing {}", skeleton_path.display()))?;
    log::info!(
        "Wrote {} ({} joints, {} bytes)",
        skeleton_path.display(),
        skeleton.num_joints(),
        bytes.len()
    );

    let animation_path = out.join(ANIMATION_FILE);
    let bytes = write_animation(&clip)?;
    std::fs::write(&animation_path, &bytes)
        .with_context(|| format!("writing {}", animation_path.display()))?;
    log::info!(
        "Wrote {} ('{}', {:.2}s, {} bytes)",
        animation_path.display(),
        clip.name(),
        clip.duration(),
        bytes.len()
    );
    Ok(())
}
