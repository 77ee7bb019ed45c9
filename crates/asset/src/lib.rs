//! Asset side of the samples: procedural textures, sampler presets,
//! skeleton/animation archives and capped background file loading.

pub mod archive;
pub mod fetch;
pub mod loader;
pub mod mipmap;
pub mod sampler;
pub mod texture;

pub use loader::{CharacterLoader, LoadError, LoadState};
pub use mipmap::MipChain;
pub use sampler::{MinFilter, SamplerConfig, mipmap_sampler_matrix};
