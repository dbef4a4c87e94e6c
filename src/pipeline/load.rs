//! Open a document with pdfium and read back its page geometry and metadata.
//!
//! All functions here take a `&Pdfium` and must run on the worker thread.

use crate::error::PdfEditError;
use crate::output::{DocumentInfo, PageInfo};
use crate::pipeline::input::SourcePdf;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Load `bytes` as a PDF, mapping pdfium failures to [`PdfEditError`].
pub fn open_document<'a>(
    pdfium: &'a Pdfium,
    name: &str,
    bytes: &'a [u8],
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, PdfEditError> {
    pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| map_load_error(name, password.is_some(), e))
}

fn map_load_error(name: &str, had_password: bool, e: PdfiumError) -> PdfEditError {
    let detail = format!("{:?}", e);
    if detail.contains("Password") || detail.contains("password") {
        if had_password {
            PdfEditError::WrongPassword {
                name: name.to_string(),
            }
        } else {
            PdfEditError::PasswordRequired {
                name: name.to_string(),
            }
        }
    } else {
        PdfEditError::CorruptPdf {
            name: name.to_string(),
            detail,
        }
    }
}

/// Number of pages in `document`.
pub fn page_count(document: &PdfDocument) -> u32 {
    document.pages().len() as u32
}

/// Width, height and rotation of every page, in page order.
pub fn page_infos(document: &PdfDocument) -> Vec<PageInfo> {
    document
        .pages()
        .iter()
        .enumerate()
        .map(|(i, page)| PageInfo {
            page_number: i as u32 + 1,
            width: page.width().value,
            height: page.height().value,
            rotation: rotation_degrees(&page),
        })
        .collect()
}

fn rotation_degrees(page: &PdfPage) -> u16 {
    match page.rotation() {
        Ok(PdfPageRenderRotation::Degrees90) => 90,
        Ok(PdfPageRenderRotation::Degrees180) => 180,
        Ok(PdfPageRenderRotation::Degrees270) => 270,
        _ => 0,
    }
}

/// Summarise an open document. `file_size` is the size of the bytes it was
/// loaded from.
pub fn describe(document: &PdfDocument, file_size: u64) -> DocumentInfo {
    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().trim().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    let pages = page_infos(document);
    DocumentInfo {
        page_count: pages.len() as u32,
        pages,
        file_size_bytes: file_size,
        pdf_version: format!("{:?}", document.version()),
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        ..Default::default()
    }
}

/// Open `source` and describe it. Fails on documents without pages.
pub fn inspect(
    pdfium: &Pdfium,
    source: &SourcePdf,
    password: Option<&str>,
) -> Result<DocumentInfo, PdfEditError> {
    let document = open_document(pdfium, &source.name, &source.bytes, password)?;
    let mut info = describe(&document, source.len());
    if info.page_count == 0 {
        return Err(PdfEditError::EmptyDocument {
            name: source.name.clone(),
        });
    }
    info.source_files = vec![source.name.clone()];
    info!(
        "Loaded '{}': {} pages, {} bytes",
        source.name, info.page_count, info.file_size_bytes
    );
    debug!("'{}' version {}", source.name, info.pdf_version);
    Ok(info)
}
