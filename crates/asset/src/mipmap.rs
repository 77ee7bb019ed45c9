//! Procedural checkerboard mip chain, 256x256 down to 1x1.

use std::path::Path;

use anyhow::Context;

use crate::texture::TextureData;

pub const BASE_DIM: u32 = 256;
pub const NUM_MIPS: usize = 9;

/// Opaque black, the "off" squares of every level.
pub const BLACK: u32 = 0xFF00_0000;

/// One color per level, packed `0xAABBGGRR`.
pub const MIP_COLORS: [u32; NUM_MIPS] = [
    0xFF0000FF, // red
    0xFF00FF00, // green
    0xFFFF0000, // blue
    0xFFFF00FF, // magenta
    0xFFFFFF00, // cyan
    0xFF00FFFF, // yellow
    0xFFFF00A0, // violet
    0xFFFFA0FF, // orange
    0xFFA000FF, // purple
];

/// Texel count of the whole chain.
pub const TOTAL_TEXELS: usize = level_offset(NUM_MIPS);

/// Edge length of `level`.
#[inline]
pub const fn mip_dim(level: usize) -> u32 {
    BASE_DIM >> level
}

/// First texel of `level` in the packed chain.
const fn level_offset(level: usize) -> usize {
    let mut sum = 0;
    let mut k = 0;
    while k < level {
        let d = mip_dim(k) as usize;
        sum += d * d;
        k += 1;
    }
    sum
}

/// All levels packed back to back in one buffer of exactly
/// [`TOTAL_TEXELS`] entries.
#[derive(Clone, Debug)]
pub struct MipChain {
    texels: Box<[u32; TOTAL_TEXELS]>,
}

/// Borrowed view of one level.
#[derive(Clone, Copy, Debug)]
pub struct MipLevel<'a> {
    pub level: usize,
    pub dim: u32,
    pub texels: &'a [u32],
}

impl MipChain {
    /// Each level alternates its color with black. The phase flips after
    /// every texel and once more at the end of every row, and carries over
    /// into the next level.
    pub fn checkerboard() -> Self {
        let mut texels = Box::new([BLACK; TOTAL_TEXELS]);
        let mut even_odd = false;
        let mut i = 0;
        for (level, &color) in MIP_COLORS.iter().enumerate() {
            let dim = mip_dim(level);
            for _y in 0..dim {
                for _x in 0..dim {
                    texels[i] = if even_odd { color } else { BLACK };
                    i += 1;
                    even_odd = !even_odd;
                }
                even_odd = !even_odd;
            }
        }
        Self { texels }
    }

    #[inline]
    pub fn num_levels(&self) -> usize {
        NUM_MIPS
    }

    /// Panics if `level >= NUM_MIPS`.
    pub fn level(&self, level: usize) -> MipLevel<'_> {
        let dim = mip_dim(level);
        let start = level_offset(level);
        let end = start + (dim * dim) as usize;
        MipLevel {
            level,
            dim,
            texels: &self.texels[start..end],
        }
    }

    pub fn levels(&self) -> impl Iterator<Item = MipLevel<'_>> + '_ {
        (0..NUM_MIPS).map(move |l| self.level(l))
    }

    /// Write `mip<N>.png` for every level into `dir`.
    pub fn save_png_levels(&self, dir: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        for level in self.levels() {
            level
                .to_texture_data()
                .save_png(dir.join(format!("mip{}.png", level.level)))?;
        }
        Ok(())
    }
}

impl MipLevel<'_> {
    #[inline]
    pub fn byte_size(&self) -> usize {
        self.texels.len() * 4
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.texels[(y * self.dim + x) as usize]
    }

    pub fn to_texture_data(&self) -> TextureData {
        TextureData::from_packed_rgba(self.dim, self.dim, self.texels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_sizes() {
        let chain = MipChain::checkerboard();
        assert_eq!(TOTAL_TEXELS, 87381);
        assert_eq!(chain.level(0).texels.len(), 65536);
        assert_eq!(chain.level(8).texels.len(), 1);
        for level in chain.levels() {
            let dim = level.dim as usize;
            assert_eq!(dim, 256 >> level.level);
            assert_eq!(level.byte_size(), dim * dim * 4);
            assert_eq!(level.to_texture_data().data.len(), level.byte_size());
        }
    }

    #[test]
    fn checker_phase_alternates_per_pixel_and_row() {
        let chain = MipChain::checkerboard();
        for level in chain.levels().take(NUM_MIPS - 1) {
            let color = MIP_COLORS[level.level];
            assert_eq!(level.pixel(0, 0), BLACK);
            assert_eq!(level.pixel(1, 0), color);
            assert_eq!(level.pixel(0, 1), color);
            assert_eq!(level.pixel(1, 1), BLACK);
            for y in 0..level.dim {
                for x in 0..level.dim {
                    let expected = if (x + y) % 2 == 1 { color } else { BLACK };
                    assert_eq!(level.pixel(x, y), expected, "level {} ({x},{y})", level.level);
                }
            }
        }
    }

    #[test]
    fn storage_is_one_exact_buffer() {
        let chain = MipChain::checkerboard();
        assert_eq!(std::mem::size_of_val(&*chain.texels), TOTAL_TEXELS * 4);
        let last = chain.level(NUM_MIPS - 1);
        let end = last.texels.as_ptr_range().end;
        assert_eq!(end, chain.texels.as_ptr_range().end);
    }

    #[test]
    fn dump_writes_every_level() {
        let dir = std::env::temp_dir().join(format!("svarog-mips-{}", std::process::id()));
        MipChain::checkerboard().save_png_levels(&dir).unwrap();
        for level in 0..NUM_MIPS {
            let img = image::open(dir.join(format!("mip{level}.png"))).unwrap();
            assert_eq!(img.width(), mip_dim(level));
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn last_level_is_black() {
        // one texel, then the row toggle restores the phase
        assert_eq!(MipChain::checkerboard().level(8).pixel(0, 0), BLACK);
    }
}
