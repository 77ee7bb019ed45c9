//! Texture data in CPU memory before GPU upload.

use std::path::Path;

use anyhow::Context;

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

impl TextureData {
    /// Create a new texture with given dimensions and RGBA8 format.
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            (width * height * 4) as usize,
            "Data size doesn't match RGBA8 format"
        );
        Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        }
    }

    /// Build from packed `0xAABBGGRR` texels (R in the lowest byte).
    pub fn from_packed_rgba(width: u32, height: u32, texels: &[u32]) -> Self {
        let data = texels.iter().flat_map(|t| t.to_le_bytes()).collect();
        Self::new_rgba8(width, height, data)
    }

    /// Write the texture as a PNG file.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        image::save_buffer(
            path,
            &self.data,
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
        )
        .with_context(|| format!("Failed to write PNG {}", path.display()))?;
        log::debug!("Wrote {}x{} texture to {:?}", self.width, self.height, path);
        Ok(())
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgba8 => 4,
        }
    }
}
