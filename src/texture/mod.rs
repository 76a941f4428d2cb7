//! Texture resolution: cache/archive/HTTP fallback chain, decode, and
//! mask composition (spec §4.3).

mod loader;

pub use loader::TextureLoader;
