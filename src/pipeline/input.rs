//! Input handling: filter user-supplied files to PDFs and read them.
//!
//! A file is accepted when its extension is `.pdf` (any case) and its
//! content starts with `%PDF`. Non-PDF extensions are skipped with a
//! warning; a `.pdf` file with the wrong magic bytes is an error. Bytes are
//! read once and shared read-only from then on.

use crate::error::PdfEditError;
use crate::output::DEFAULT_FILE_NAME;
use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const PDF_MAGIC: &[u8] = b"%PDF";

/// One input document held in memory.
#[derive(Debug, Clone)]
pub struct SourcePdf {
    /// File name (no directory), used for messages and the output name.
    pub name: String,
    /// Where the bytes came from, if they came from disk.
    pub path: Option<PathBuf>,
    pub bytes: Arc<Vec<u8>>,
}

impl SourcePdf {
    /// Wrap an in-memory buffer, checking the PDF magic bytes.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, PdfEditError> {
        let mut name = name.into();
        if name.trim().is_empty() {
            name = DEFAULT_FILE_NAME.to_string();
        }
        check_magic(&name, &bytes)?;
        Ok(Self {
            name,
            path: None,
            bytes: Arc::new(bytes),
        })
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// True when `path` has a `.pdf` extension, case-insensitively.
pub fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// True when `bytes` begin with `%PDF`.
pub fn has_pdf_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

fn check_magic(name: &str, bytes: &[u8]) -> Result<(), PdfEditError> {
    if has_pdf_magic(bytes) {
        Ok(())
    } else {
        Err(PdfEditError::NotAPdf {
            name: name.to_string(),
            magic: bytes.iter().take(PDF_MAGIC.len()).copied().collect(),
        })
    }
}

/// Read one file into a [`SourcePdf`].
pub async fn read_source(path: &Path) -> Result<SourcePdf, PdfEditError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PdfEditError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => PdfEditError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => PdfEditError::CorruptPdf {
            name: path.display().to_string(),
            detail: e.to_string(),
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
    check_magic(&name, &bytes)?;

    debug!("Read {} ({} bytes)", path.display(), bytes.len());
    Ok(SourcePdf {
        name,
        path: Some(path.to_path_buf()),
        bytes: Arc::new(bytes),
    })
}

/// Keep only paths with a `.pdf` extension, warning about the rest.
pub fn filter_pdf_paths<P: AsRef<Path>>(paths: &[P]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter_map(|p| {
            let p: &Path = p.as_ref();
            if is_pdf_path(p) {
                Some(p.to_path_buf())
            } else {
                warn!("Skipping non-PDF input: {}", p.display());
                None
            }
        })
        .collect()
}

/// Filter `paths` to PDFs and read them all concurrently, preserving order.
pub async fn read_sources<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<SourcePdf>, PdfEditError> {
    let pdfs = filter_pdf_paths(paths);
    if pdfs.is_empty() {
        return Err(PdfEditError::NoPdfInputs { given: paths.len() });
    }
    let sources = try_join_all(pdfs.iter().map(|p| read_source(p))).await?;
    info!(
        "Read {} PDF file(s), {} bytes total",
        sources.len(),
        sources.iter().map(SourcePdf::len).sum::<u64>()
    );
    Ok(sources)
}
