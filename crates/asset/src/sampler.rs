//! Sampler parameter sets for the mipmap sample.

/// Minification filter combined with the filter used between mip levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MinFilter {
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl MinFilter {
    pub const ALL: [Self; 4] = [
        Self::NearestMipmapNearest,
        Self::LinearMipmapNearest,
        Self::NearestMipmapLinear,
        Self::LinearMipmapLinear,
    ];

    /// Linear filtering within a level.
    #[inline]
    pub fn is_linear(self) -> bool {
        matches!(self, Self::LinearMipmapNearest | Self::LinearMipmapLinear)
    }

    /// Linear blending between levels.
    #[inline]
    pub fn is_mipmap_linear(self) -> bool {
        matches!(self, Self::NearestMipmapLinear | Self::LinearMipmapLinear)
    }
}

/// Max LOD meaning "no clamp".
pub const UNCLAMPED_MAX_LOD: f32 = 32.0;

pub const ANISOTROPY_LEVELS: [u16; 4] = [2, 4, 8, 16];

/// Magnification is always linear; only these fields vary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerConfig {
    pub min_filter: MinFilter,
    pub min_lod: f32,
    pub max_lod: f32,
    /// 1 disables anisotropic filtering.
    pub max_anisotropy: u16,
}

impl SamplerConfig {
    pub const fn new(min_filter: MinFilter) -> Self {
        Self {
            min_filter,
            min_lod: 0.0,
            max_lod: UNCLAMPED_MAX_LOD,
            max_anisotropy: 1,
        }
    }
}

/// Twelve variants: the four min filters over the full LOD range, the same
/// four clamped to LOD [2,4], then linear-mipmap-linear at anisotropy 2..16.
pub fn mipmap_sampler_matrix() -> [SamplerConfig; 12] {
    let mut out = [SamplerConfig::new(MinFilter::LinearMipmapLinear); 12];
    for (i, filter) in MinFilter::ALL.into_iter().enumerate() {
        out[i] = SamplerConfig::new(filter);
        out[i + 4] = SamplerConfig {
            min_lod: 2.0,
            max_lod: 4.0,
            ..SamplerConfig::new(filter)
        };
    }
    for (i, aniso) in ANISOTROPY_LEVELS.into_iter().enumerate() {
        out[i + 8].max_anisotropy = aniso;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_layout() {
        let m = mipmap_sampler_matrix();
        for i in 0..4 {
            assert_eq!(m[i].min_filter, MinFilter::ALL[i]);
            assert_eq!((m[i].min_lod, m[i].max_lod), (0.0, UNCLAMPED_MAX_LOD));
            assert_eq!(m[i + 4].min_filter, MinFilter::ALL[i]);
            assert_eq!((m[i + 4].min_lod, m[i + 4].max_lod), (2.0, 4.0));
            assert_eq!(m[i].max_anisotropy, 1);
        }
        let aniso: Vec<u16> = m[8..].iter().map(|s| s.max_anisotropy).collect();
        assert_eq!(aniso, ANISOTROPY_LEVELS);
        assert!(m[8..].iter().all(|s| s.min_filter == MinFilter::LinearMipmapLinear));
        assert!(m[8..].iter().all(|s| s.max_lod == UNCLAMPED_MAX_LOD));
    }

    #[test]
    fn filter_flags() {
        assert!(!MinFilter::NearestMipmapNearest.is_linear());
        assert!(MinFilter::LinearMipmapNearest.is_linear());
        assert!(!MinFilter::LinearMipmapNearest.is_mipmap_linear());
        assert!(MinFilter::NearestMipmapLinear.is_mipmap_linear());
    }
}
