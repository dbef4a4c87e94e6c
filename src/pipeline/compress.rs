//! Recompression: rasterise every page, re-encode as JPEG, rebuild the PDF.
//!
//! The output keeps each page's size in points but replaces its content
//! with a single image, so text and vector graphics become pixels.

use crate::config::CompressionLevel;
use crate::error::PdfEditError;
use crate::pipeline::assemble::{self, JpegPage};
use crate::pipeline::{encode, load, render};
use crate::progress::{compression_percent, SaveProgressCallback};
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Result of [`compress_document`].
#[derive(Debug, Clone)]
pub struct CompressedDocument {
    pub bytes: Vec<u8>,
    pub original_size: u64,
    pub compressed_size: u64,
    pub page_count: u32,
}

impl CompressedDocument {
    /// `compressed_size / original_size`.
    pub fn ratio(&self) -> f64 {
        if self.original_size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.original_size as f64
        }
    }
}

/// Recompress every page of `bytes` at the quality of `level`.
///
/// `progress` receives one `on_page_compressing` call per finished page.
pub fn compress_document(
    pdfium: &Pdfium,
    name: &str,
    bytes: &[u8],
    level: CompressionLevel,
    scale: f32,
    password: Option<&str>,
    progress: Option<&dyn SaveProgressCallback>,
) -> Result<CompressedDocument, PdfEditError> {
    let document = load::open_document(pdfium, name, bytes, password)?;
    let total = load::page_count(&document);
    if total == 0 {
        return Err(PdfEditError::EmptyDocument {
            name: name.to_string(),
        });
    }

    let quality = level.jpeg_quality();
    info!(
        "Compressing '{}': {} pages at {} (JPEG q{}, scale {})",
        name, total, level, quality, scale
    );

    let mut pages = Vec::with_capacity(total as usize);
    for page_number in 1..=total {
        let image = render::render_page(&document, page_number, scale)?;
        let jpeg = encode::encode_jpeg(&image, quality, page_number)?;
        pages.push(JpegPage::from_render(
            jpeg,
            image.width(),
            image.height(),
            scale,
        ));

        if let Some(cb) = progress {
            let (done, of) = (page_number as usize, total as usize);
            cb.on_page_compressing(done, of, compression_percent(done, of));
        }
    }

    let out = assemble::assemble_jpeg_pdf(&pages)?;
    let result = CompressedDocument {
        original_size: bytes.len() as u64,
        compressed_size: out.len() as u64,
        page_count: total,
        bytes: out,
    };
    debug!(
        "'{}' compressed {} → {} bytes ({:.0}%)",
        name,
        result.original_size,
        result.compressed_size,
        result.ratio() * 100.0
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_of_compressed_document() {
        let doc = CompressedDocument {
            bytes: Vec::new(),
            original_size: 1000,
            compressed_size: 400,
            page_count: 2,
        };
        assert!((doc.ratio() - 0.4).abs() < 1e-9);
    }
}
