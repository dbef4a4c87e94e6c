//! Image encoding: `DynamicImage` → JPEG for recompression, PNG for thumbnails.
//!
//! JPEG pages are stored as RGB; any alpha channel from the renderer is
//! dropped.

use crate::error::PdfEditError;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rendered page as baseline JPEG at `quality` (1–100).
pub fn encode_jpeg(img: &DynamicImage, quality: u8, page: u32) -> Result<Vec<u8>, PdfEditError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(|e| PdfEditError::ImageEncodingFailed {
            page,
            detail: e.to_string(),
        })?;
    debug!(
        "Page {} → JPEG q{} {}x{} ({} bytes)",
        page,
        quality,
        rgb.width(),
        rgb.height(),
        buf.len()
    );
    Ok(buf)
}

/// Encode a rendered page as PNG.
pub fn encode_png(img: &DynamicImage, page: u32) -> Result<Vec<u8>, PdfEditError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PdfEditError::ImageEncodingFailed {
            page,
            detail: e.to_string(),
        })?;
    Ok(buf)
}
