//! Build a new document from an ordered list of page numbers.
//!
//! Page numbers are 1-based. Entries outside the document are skipped with
//! a warning rather than failing the whole save.

use crate::error::PdfEditError;
use crate::pipeline::load;
use pdfium_render::prelude::*;
use tracing::{debug, info, warn};

/// Result of [`build_with_page_order`].
#[derive(Debug, Clone)]
pub struct ReorderedDocument {
    pub bytes: Vec<u8>,
    pub page_count: u32,
    /// Requested pages that did not exist in the source.
    pub skipped: Vec<u32>,
}

/// Split `order` into the entries inside `1..=total` and the ones outside.
pub fn partition_order(order: &[u32], total: u32) -> (Vec<u32>, Vec<u32>) {
    order.iter().partition(|&&p| p >= 1 && p <= total)
}

/// Pages of a `total`-page document left after dropping `remove`, in
/// original order.
pub fn pages_after_removal(total: u32, remove: &[u32]) -> Vec<u32> {
    (1..=total).filter(|p| !remove.contains(p)).collect()
}

/// A 0-based pdfium page index for position `index`.
fn page_index(index: usize) -> Result<u16, PdfEditError> {
    u16::try_from(index).map_err(|_| {
        PdfEditError::DocumentAssembly(format!(
            "page index {} exceeds the {} pages a document can hold",
            index,
            u16::MAX as usize + 1
        ))
    })
}

/// Copy the pages listed in `order`, in that order, into a new document.
pub fn build_with_page_order(
    pdfium: &Pdfium,
    name: &str,
    bytes: &[u8],
    order: &[u32],
    password: Option<&str>,
) -> Result<ReorderedDocument, PdfEditError> {
    let source = load::open_document(pdfium, name, bytes, password)?;
    let total = load::page_count(&source);

    let (valid, skipped) = partition_order(order, total);
    for page in &skipped {
        warn!("Skipping page {} of '{}' (document has {} pages)", page, name, total);
    }
    if valid.is_empty() {
        return Err(PdfEditError::NoPagesSelected);
    }
    page_index(valid.len() - 1)?;

    let mut output = pdfium
        .create_new_pdf()
        .map_err(|e| PdfEditError::DocumentAssembly(format!("{:?}", e)))?;

    for (dest, &page) in valid.iter().enumerate() {
        let from = page_index((page - 1) as usize)?;
        output
            .pages_mut()
            .copy_page_from_document(&source, from, page_index(dest)?)
            .map_err(|e| {
                PdfEditError::DocumentAssembly(format!("copying page {}: {:?}", page, e))
            })?;
        debug!("Copied page {} → {}", page, dest + 1);
    }

    let out_bytes = output
        .save_to_bytes()
        .map_err(|e| PdfEditError::DocumentAssembly(format!("{:?}", e)))?;

    info!(
        "Reordered '{}': {} of {} pages kept",
        name,
        valid.len(),
        total
    );

    Ok(ReorderedDocument {
        bytes: out_bytes,
        page_count: valid.len() as u32,
        skipped,
    })
}

/// Drop the listed pages, keeping the rest in original order.
///
/// Refuses to remove every page.
pub fn remove_pages(
    pdfium: &Pdfium,
    name: &str,
    bytes: &[u8],
    remove: &[u32],
    password: Option<&str>,
) -> Result<ReorderedDocument, PdfEditError> {
    let total = {
        let source = load::open_document(pdfium, name, bytes, password)?;
        load::page_count(&source)
    };
    let keep = pages_after_removal(total, remove);
    if keep.is_empty() {
        return Err(PdfEditError::NoPagesSelected);
    }
    build_with_page_order(pdfium, name, bytes, &keep, password)
}
