//! Concatenate several documents into one.
//!
//! Inputs are appended in order into a fresh document. An input that cannot
//! be opened is skipped with a warning; the merge fails only when nothing
//! could be appended.

use crate::error::PdfEditError;
use crate::output::{DocumentInfo, PageOrigin};
use crate::pipeline::input::SourcePdf;
use crate::pipeline::load;
use pdfium_render::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

/// An input left out of a merge, and why.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedSource {
    pub name: String,
    pub reason: String,
}

/// Result of [`merge_documents`].
#[derive(Debug, Clone)]
pub struct MergedDocument {
    pub bytes: Vec<u8>,
    pub info: DocumentInfo,
    pub skipped_sources: Vec<SkippedSource>,
    /// Summed size of the inputs that were merged.
    pub original_size: u64,
}

/// Page origins for a merge of `(source_index, page_count)` parts, in order.
pub fn concat_origins(parts: &[(usize, u32)]) -> Vec<PageOrigin> {
    parts
        .iter()
        .flat_map(|&(document, pages)| (1..=pages).map(move |page| PageOrigin { document, page }))
        .collect()
}

/// Append every page of every source, in source order, into a new document.
pub fn merge_documents(
    pdfium: &Pdfium,
    sources: &[SourcePdf],
    password: Option<&str>,
) -> Result<MergedDocument, PdfEditError> {
    let mut merged = pdfium
        .create_new_pdf()
        .map_err(|e| PdfEditError::DocumentAssembly(format!("{:?}", e)))?;

    let mut parts = Vec::with_capacity(sources.len());
    let mut names = Vec::with_capacity(sources.len());
    let mut skipped = Vec::new();
    let mut original_size = 0u64;
    let mut first_error: Option<String> = None;

    for (index, source) in sources.iter().enumerate() {
        let appended = load::open_document(pdfium, &source.name, &source.bytes, password)
            .and_then(|document| {
                let pages = load::page_count(&document);
                if pages == 0 {
                    return Err(PdfEditError::EmptyDocument {
                        name: source.name.clone(),
                    });
                }
                merged
                    .pages_mut()
                    .append(&document)
                    .map_err(|e| PdfEditError::DocumentAssembly(format!("{:?}", e)))?;
                Ok(pages)
            });

        match appended {
            Ok(pages) => {
                debug!("Appended '{}' ({} pages)", source.name, pages);
                parts.push((index, pages));
                names.push(source.name.clone());
                original_size += source.len();
            }
            Err(e) => {
                warn!("Skipping '{}' in merge: {}", source.name, e);
                first_error.get_or_insert_with(|| e.to_string());
                skipped.push(SkippedSource {
                    name: source.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if parts.is_empty() {
        return Err(PdfEditError::AllSourcesFailed {
            total: sources.len(),
            first_error: first_error.unwrap_or_else(|| "no inputs".into()),
        });
    }

    let bytes = merged
        .save_to_bytes()
        .map_err(|e| PdfEditError::DocumentAssembly(format!("{:?}", e)))?;

    let mut info = load::describe(&merged, bytes.len() as u64);
    info.is_merged = sources.len() > 1;
    info.source_files = names;
    info.origins = concat_origins(&parts);

    info!(
        "Merged {} document(s) into {} pages ({} skipped)",
        parts.len(),
        info.page_count,
        skipped.len()
    );

    Ok(MergedDocument {
        bytes,
        info,
        skipped_sources: skipped,
        original_size,
    })
}
