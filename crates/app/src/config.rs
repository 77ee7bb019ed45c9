//! Command-line configuration shared by the sample binaries.

use std::path::PathBuf;

use platform::WindowConfig;

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;
pub const DEFAULT_ASSETS_DIR: &str = "assets";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backends: wgpu::Backends,
    pub show_fps: bool,
    pub width: u32,
    pub height: u32,
    /// Where `skeleton.ozz` / `animation.ozz` live.
    pub assets_dir: PathBuf,
    /// Mipmap sample: write every mip level as PNG here.
    pub dump_mips: Option<PathBuf>,
    /// bake-rig: output directory (defaults to `assets_dir`).
    pub out_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Parse the process arguments.
    pub fn from_env() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::parse(&args)
    }

    pub fn parse(args: &[String]) -> Self {
        let (width, height) = parse_size_args(args);
        Self {
            backends: parse_backend_arg(args),
            show_fps: parse_show_fps_arg(args),
            width,
            height,
            assets_dir: parse_path_arg(args, "--assets=")
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_DIR)),
            dump_mips: parse_path_arg(args, "--dump-mips="),
            out_dir: parse_path_arg(args, "--out="),
        }
    }

    pub fn window(&self, title: &str) -> WindowConfig {
        WindowConfig {
            title: title.to_string(),
            width: self.width,
            height: self.height,
            backends: self.backends,
            show_fps: self.show_fps,
        }
    }
}

fn parse_backend_arg(args: &[String]) -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all(); // default = auto
    for arg in args {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = match val.to_ascii_lowercase().as_str() {
                "auto" => wgpu::Backends::all(),
                "vulkan" | "vk" => wgpu::Backends::VULKAN,
                "dx12" | "d3d12" => wgpu::Backends::DX12,
                "metal" | "mtl" => wgpu::Backends::METAL,
                "gl" | "opengl" | "gles" => wgpu::Backends::GL,
                other => {
                    log::warn!("Unknown backend '{}', falling back to auto.", other);
                    wgpu::Backends::all()
                }
            };
        }
    }
    backends
}

fn parse_show_fps_arg(args: &[String]) -> bool {
    // --show-fps[=on|off], default off
    for arg in args {
        if arg == "--show-fps" {
            return true;
        }
        if let Some(val) = arg.strip_prefix("--show-fps=") {
            return matches!(
                val.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
    }
    false
}

fn parse_size_args(args: &[String]) -> (u32, u32) {
    let mut w: Option<u32> = None;
    let mut h: Option<u32> = None;

    for arg in args {
        if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (sw.parse::<u32>(), sh.parse::<u32>()) {
                    w = Some(pw);
                    h = Some(ph);
                }
            }
        } else if let Some(v) = arg.strip_prefix("--width=") {
            if let Ok(pw) = v.parse::<u32>() {
                w = Some(pw);
            }
        } else if let Some(v) = arg.strip_prefix("--height=") {
            if let Ok(ph) = v.parse::<u32>() {
                h = Some(ph);
            }
        }
    }

    let ww = w.unwrap_or(DEFAULT_WIDTH).max(1);
    let hh = h.unwrap_or(DEFAULT_HEIGHT).max(1);
    (ww, hh)
}

fn parse_path_arg(args: &[String], prefix: &str) -> Option<PathBuf> {
    args.iter()
        .rev()
        .find_map(|a| a.strip_prefix(prefix))
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults() {
        let c = AppConfig::parse(&[]);
        assert_eq!(c.backends, wgpu::Backends::all());
        assert!(!c.show_fps);
        assert_eq!((c.width, c.height), (DEFAULT_WIDTH, DEFAULT_HEIGHT));
        assert_eq!(c.assets_dir, PathBuf::from(DEFAULT_ASSETS_DIR));
        assert!(c.dump_mips.is_none());
    }

    #[test]
    fn backend_and_flags() {
        let c = AppConfig::parse(&args(&["--gpu-backend=VK", "--show-fps", "--size=1024X768"]));
        assert_eq!(c.backends, wgpu::Backends::VULKAN);
        assert!(c.show_fps);
        assert_eq!((c.width, c.height), (1024, 768));

        let c = AppConfig::parse(&args(&["--gpu-backend=glide", "--show-fps=off", "--width=0"]));
        assert_eq!(c.backends, wgpu::Backends::all());
        assert!(!c.show_fps);
        assert_eq!(c.width, 1);
    }

    #[test]
    fn paths() {
        let c = AppConfig::parse(&args(&["--assets=data/rig", "--dump-mips=/tmp/mips", "--out="]));
        assert_eq!(c.assets_dir, PathBuf::from("data/rig"));
        assert_eq!(c.dump_mips, Some(PathBuf::from("/tmp/mips")));
        assert!(c.out_dir.is_none());
    }
}
