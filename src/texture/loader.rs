//! Resolves texture names to pixel buffers through the cache/archive/
//! HTTP fallback chain and composes masks onto the alpha channel
//! (spec §4.3).

use crate::bmp;
use crate::cache::{ArchiveCache, ByteFetcher, ServerCredentials};
use crate::errors::Result;
use crate::pixel_buffer::PixelBuffer;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Substrings that flag a mask as carrying inverted polarity (spec §4.3,
/// "Mask polarity heuristic"). Exact legacy tokens are undocumented;
/// this is a small, auditable stand-in table behind the
/// `legacy-name-heuristics` feature, per spec §9's design note on
/// string-typed compatibility hacks.
#[cfg(feature = "legacy-name-heuristics")]
const INVERTED_MASK_TOKENS: &[&str] = &["invmask", "maskinv", "alphainv"];

#[cfg(feature = "legacy-name-heuristics")]
fn mask_polarity_is_inverted(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    INVERTED_MASK_TOKENS.iter().any(|token| lower.contains(token))
}

#[cfg(not(feature = "legacy-name-heuristics"))]
fn mask_polarity_is_inverted(_name: &str) -> bool {
    false
}

/// `(original-name, double-sided-flag)` — the texture cache key (spec §3).
type CacheKey = (String, bool);

pub struct TextureLoader<F: ByteFetcher> {
    archives: Arc<ArchiveCache<F>>,
    cache: RwLock<FxHashMap<CacheKey, Arc<PixelBuffer>>>,
}

impl<F: ByteFetcher> TextureLoader<F> {
    #[must_use]
    pub fn new(archives: Arc<ArchiveCache<F>>) -> Self {
        Self {
            archives,
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// Resolves `name` to a color (or mask) pixel buffer, trying the
    /// cache, then the per-server texture archive, then a direct HTTP
    /// fetch, decoding with the host image loader and falling back to
    /// the BMP decoder only for `.bmp` extensions (spec §4.3 steps 1-6).
    pub async fn load(
        &self,
        server: &str,
        name: &str,
        is_mask: bool,
        double_sided: bool,
        credentials: Option<&ServerCredentials>,
    ) -> Result<Option<Arc<PixelBuffer>>> {
        let normalized = normalize_name(name, is_mask);
        let key: CacheKey = (normalized.clone(), double_sided);

        if let Some(hit) = self.cache.read().get(&key).cloned() {
            return Ok(Some(hit));
        }

        let decoded = self
            .fetch_and_decode(server, &normalized, is_mask, double_sided, credentials)
            .await?;

        if let Some(buffer) = &decoded {
            self.cache.write().entry(key).or_insert_with(|| buffer.clone());
        }
        Ok(decoded)
    }

    async fn fetch_and_decode(
        &self,
        server: &str,
        normalized: &str,
        is_mask: bool,
        double_sided: bool,
        credentials: Option<&ServerCredentials>,
    ) -> Result<Option<Arc<PixelBuffer>>> {
        let basename = strip_extension(normalized);

        if let Ok(archive_path) = self.archives.fetch_texture(server, basename, credentials).await {
            if let Ok(mut handle) = self.archives.open_archive(&archive_path).await {
                let password = credentials.and_then(|c| c.password.as_deref());
                for candidate in texture_candidates(normalized, is_mask) {
                    if let Ok(Some(bytes)) = handle.read_entry(&candidate, password) {
                        if let Some(decoded) = decode_bytes(&bytes, &candidate, is_mask, double_sided) {
                            return Ok(Some(Arc::new(decoded)));
                        }
                    }
                }
            }
        }

        let direct_path = self
            .archives
            .fetch_texture_direct(server, normalized, credentials)
            .await?;
        let bytes = tokio::fs::read(&direct_path).await?;
        Ok(decode_bytes(&bytes, normalized, is_mask, double_sided).map(Arc::new))
    }

    /// Samples `mask` as grayscale and stores it as the alpha channel of
    /// `color`, resizing the mask to match when dimensions differ and
    /// flipping it vertically exactly once before sampling (spec §4.3,
    /// testable property 9).
    #[must_use]
    pub fn compose_mask(color: &PixelBuffer, mask: &PixelBuffer, mask_name: &str) -> PixelBuffer {
        let resized = if mask.width == color.width && mask.height == color.height {
            mask.clone()
        } else {
            mask.resize_bilinear(color.width, color.height)
        };
        let flipped = resized.flip_vertical();
        let invert = mask_polarity_is_inverted(mask_name);

        let mut out = color.clone();
        for y in 0..out.height {
            for x in 0..out.width {
                let gray = flipped.pixel(x, y)[0];
                let alpha = if invert { 255 - gray } else { gray };
                let mut rgba = out.pixel(x, y);
                rgba[3] = alpha;
                out.set_pixel(x, y, rgba);
            }
        }
        out
    }
}

fn decode_bytes(bytes: &[u8], name: &str, is_mask: bool, double_sided: bool) -> Option<PixelBuffer> {
    if let Ok(img) = image::load_from_memory(bytes) {
        let rgba = img.to_rgba8();
        return Some(PixelBuffer::new(rgba.width(), rgba.height(), rgba.into_raw()));
    }
    if name.to_ascii_lowercase().ends_with(".bmp") {
        return match (is_mask, double_sided) {
            (true, true) => bmp::decode_as_double_sided_mask(bytes),
            (true, false) => bmp::decode_as_mask(bytes),
            (false, _) => bmp::decode_plain(bytes),
        };
    }
    None
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) if i > 0 => &name[..i],
        _ => name,
    }
}

fn basename(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Appends `.jpg` (color) or `.bmp` (mask) when `name` has no extension
/// (spec §4.3 step 1).
#[must_use]
fn normalize_name(name: &str, is_mask: bool) -> String {
    let base = basename(name);
    if base.contains('.') {
        name.to_string()
    } else if is_mask {
        format!("{name}.bmp")
    } else {
        format!("{name}.jpg")
    }
}

/// Candidate entry names tried in priority order against the texture
/// archive: exact, lowercased, uppercased, extension toggles, and
/// basename-only (spec §4.3 step 3).
fn texture_candidates(normalized: &str, is_mask: bool) -> Vec<String> {
    let stem = strip_extension(normalized);
    let exts: &[&str] = if is_mask {
        &[".bmp", ".BMP"]
    } else {
        &[".jpg", ".JPG", ".jpeg", ".png"]
    };

    let mut candidates = vec![normalized.to_string(), normalized.to_lowercase(), normalized.to_uppercase()];
    for ext in exts {
        candidates.push(format!("{stem}{ext}"));
    }
    candidates.push(basename(normalized).to_string());
    candidates.dedup();
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_appends_jpg_for_color() {
        assert_eq!(normalize_name("brick", false), "brick.jpg");
    }

    #[test]
    fn normalize_appends_bmp_for_mask() {
        assert_eq!(normalize_name("brick", true), "brick.bmp");
    }

    #[test]
    fn normalize_leaves_existing_extension() {
        assert_eq!(normalize_name("brick.png", false), "brick.png");
    }

    #[test]
    fn compose_mask_increases_alpha_top_to_bottom_for_identity_gradient() {
        // The decoded mask buffer's rows go light -> dark top to bottom:
        // the legacy format's mask origin is inverted relative to color
        // (spec §4.3), so the raw buffer is the mirror image of the
        // gradient the author intended. `compose_mask`'s single vertical
        // flip corrects this, so the composed alpha should increase from
        // y=0 to y=height-1 (spec §8, testable property 9).
        let h = 4u32;
        let mut mask_rgba = Vec::new();
        for y in 0..h {
            let v = ((h - 1 - y) * 255 / (h - 1)) as u8;
            mask_rgba.extend_from_slice(&[v, v, v, 255]);
        }
        let mask = PixelBuffer::new(1, h, mask_rgba);
        let color = PixelBuffer::new(1, h, vec![255u8; (h * 4) as usize]);

        let composed = TextureLoader::<crate::cache::NullFetcher>::compose_mask(&color, &mask, "plain");
        let top_alpha = composed.pixel(0, 0)[3];
        let bottom_alpha = composed.pixel(0, h - 1)[3];
        assert!(bottom_alpha > top_alpha);
    }
}
