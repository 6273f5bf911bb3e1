//! Photo re-encoding to lossy WebP.

use image::DynamicImage;
use rv_core::{Error, Result};

/// Decode an uploaded image of any supported format and re-encode it as
/// lossy WebP at `quality` (1..=100).
///
/// CPU-bound; call from `spawn_blocking`.
pub fn reencode_to_webp(input: &[u8], quality: f32) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(input)
        .map_err(|e| Error::Image(format!("failed to decode image: {e}")))?;

    // the encoder only takes 8-bit RGB or RGBA
    let normalized = if decoded.color().has_alpha() {
        DynamicImage::ImageRgba8(decoded.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(decoded.to_rgb8())
    };

    let encoder = webp::Encoder::from_image(&normalized)
        .map_err(|e| Error::Image(format!("failed to prepare WebP encoder: {e}")))?;
    let encoded = encoder.encode(quality.clamp(1.0, 100.0));

    Ok(encoded.to_vec())
}
