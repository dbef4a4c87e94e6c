//! Result types: document info, thumbnails, save output and stats.

use crate::config::CompressionLevel;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// MIME type of every file this crate writes.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Name used when the input has no usable file name.
pub const DEFAULT_FILE_NAME: &str = "document.pdf";

/// Geometry of one page, in PDF points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    /// 1-based page number within the document.
    pub page_number: u32,
    pub width: f32,
    pub height: f32,
    /// Clockwise rotation in degrees (0, 90, 180, 270).
    pub rotation: u16,
}

/// Where a page of a merged document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOrigin {
    /// 0-based index of the source file in merge order.
    pub document: usize,
    /// 1-based page number inside that source file.
    pub page: u32,
}

/// What the session knows about the currently loaded document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub page_count: u32,
    pub pages: Vec<PageInfo>,
    pub file_size_bytes: u64,
    pub pdf_version: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub producer: Option<String>,
    /// True when the document is the result of merging several inputs.
    pub is_merged: bool,
    /// Input file names, in load/merge order.
    pub source_files: Vec<String>,
    /// Per-page origin; empty unless `is_merged`.
    pub origins: Vec<PageOrigin>,
}

/// A rendered page preview, PNG-encoded.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub page_number: u32,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl Thumbnail {
    /// `data:image/png;base64,…` URL for embedding in HTML.
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }
}

/// Numbers describing one save.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveStats {
    /// Pages in the output document.
    pub page_count: u32,
    /// Size of the loaded document in bytes.
    pub original_size: u64,
    /// Size of the produced document in bytes.
    pub output_size: u64,
    /// Compression level applied, or `None` if pages were not recompressed.
    pub compression: Option<CompressionLevel>,
    /// True when compression was requested but failed and was skipped.
    pub compression_failed: bool,
    pub reorder_duration_ms: u64,
    pub compress_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl SaveStats {
    /// `output_size / original_size`, or 1.0 for an empty original.
    pub fn ratio(&self) -> f64 {
        if self.original_size == 0 {
            1.0
        } else {
            self.output_size as f64 / self.original_size as f64
        }
    }
}

/// A finished document ready to be written.
#[derive(Debug, Clone)]
pub struct SaveOutput {
    pub bytes: Vec<u8>,
    /// Suggested file name, e.g. `report-modified.pdf`.
    pub file_name: String,
    pub stats: SaveStats,
}

impl SaveOutput {
    pub fn mime_type(&self) -> &'static str {
        PDF_MIME_TYPE
    }
}

/// Derive the output file name from the original one.
///
/// `report.pdf` → `report-modified.pdf`; a name without an extension gets
/// `.pdf` appended after the suffix.
pub fn output_file_name(original: &str, suffix: &str) -> String {
    let original = if original.trim().is_empty() {
        DEFAULT_FILE_NAME
    } else {
        original
    };
    match original.rfind('.') {
        Some(dot) if dot > 0 => {
            let (base, ext) = original.split_at(dot);
            format!("{base}{suffix}{ext}")
        }
        _ => format!("{original}{suffix}.pdf"),
    }
}

/// Human-readable size: KB below one megabyte, MB above, one decimal.
pub fn format_file_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    if bytes == 0 {
        return String::new();
    }
    if bytes < MB {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
