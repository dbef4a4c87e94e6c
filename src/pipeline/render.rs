//! Page rasterisation via pdfium.
//!
//! Pages render at a scale factor relative to their size in points, so a
//! 612 × 792 pt page at scale 2.0 becomes a 1224 × 1584 px image.

use crate::error::PdfEditError;
use crate::output::Thumbnail;
use crate::pipeline::encode;
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

/// Render 1-based `page_number` of `document` at `scale`.
pub fn render_page(
    document: &PdfDocument,
    page_number: u32,
    scale: f32,
) -> Result<DynamicImage, PdfEditError> {
    let total = document.pages().len() as u32;
    if page_number == 0 || page_number > total {
        return Err(PdfEditError::PageOutOfRange {
            page: page_number,
            total,
        });
    }

    let page = document
        .pages()
        .get((page_number - 1) as u16)
        .map_err(|e| PdfEditError::RasterisationFailed {
            page: page_number,
            detail: format!("{:?}", e),
        })?;

    let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| PdfEditError::RasterisationFailed {
            page: page_number,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        page_number,
        image.width(),
        image.height()
    );
    Ok(image)
}

/// Render a PNG thumbnail of 1-based `page_number`.
pub fn render_thumbnail(
    document: &PdfDocument,
    page_number: u32,
    scale: f32,
) -> Result<Thumbnail, PdfEditError> {
    let image = render_page(document, page_number, scale)?;
    let png = encode::encode_png(&image, page_number)?;
    Ok(Thumbnail {
        page_number,
        width: image.width(),
        height: image.height(),
        png,
    })
}
