//! Error types for the privatepdf library.
//!
//! Two error types reflect two failure modes:
//!
//! * [`PdfEditError`] — **Fatal** for one operation: loading, merging,
//!   reordering, compressing or saving could not complete. The session that
//!   issued the call stays usable, so the caller may fix the input and retry.
//!
//! * [`PageError`] — **Non-fatal**: one thumbnail could not be rendered.
//!   Yielded inside the thumbnail stream so the remaining pages still arrive.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the privatepdf library.
#[derive(Debug, Error)]
pub enum PdfEditError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{name}'\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: Vec<u8> },

    /// None of the supplied inputs was a PDF file.
    #[error("No PDF files among the {given} supplied input(s)")]
    NoPdfInputs { given: usize },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' could not be opened: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// The document has no pages at all.
    #[error("PDF '{name}' has no pages")]
    EmptyDocument { name: String },

    /// Every input of a merge failed to load.
    #[error("None of the {total} documents could be merged.\nFirst error: {first_error}")]
    AllSourcesFailed { total: usize, first_error: String },

    // ── Page-list errors ──────────────────────────────────────────────────
    /// Page number outside `1..=total`.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: u32, total: u32 },

    /// The page is not part of the kept-page list.
    #[error("Page {page} is not in the kept-page list")]
    PageNotKept { page: u32 },

    /// The page appears twice in a requested order.
    #[error("Page {page} appears more than once in the page order")]
    DuplicatePage { page: u32 },

    /// Removing this page would leave the document empty.
    #[error("Cannot remove page {page}: at least one page must remain")]
    LastPage { page: u32 },

    /// The requested page order selects no existing page.
    #[error("The page order selects no pages")]
    NoPagesSelected,

    /// A textual page list could not be parsed.
    #[error("Invalid page list '{input}': {reason}")]
    InvalidPageList { input: String, reason: String },

    /// An editing operation was issued before any document was opened.
    #[error("No document is loaded")]
    NoDocumentLoaded,

    // ── Rendering / compression errors ────────────────────────────────────
    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: u32, detail: String },

    /// JPEG or PNG encoding of a rendered page failed.
    #[error("Image encoding failed for page {page}: {detail}")]
    ImageEncodingFailed { page: u32, detail: String },

    /// Building or serialising an output PDF failed.
    #[error("Failed to write PDF document: {0}")]
    DocumentAssembly(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output path resolves to one of the opened input files.
    #[error("Refusing to overwrite input file '{path}'\nChoose another --output or --suffix.")]
    OutputOverwritesInput { path: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
If no system copy of pdfium is installed you can:\n\
  • Download a build from https://github.com/bblanchon/pdfium-binaries.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (or its directory).\n\
  • Place the library next to the privatepdf executable.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: u32, detail: String },

    /// PNG encoding of the thumbnail failed.
    #[error("Page {page}: encoding failed: {detail}")]
    EncodeFailed { page: u32, detail: String },
}

impl PageError {
    /// The 1-based page number this error belongs to.
    pub fn page(&self) -> u32 {
        match self {
            PageError::RenderFailed { page, .. } | PageError::EncodeFailed { page, .. } => *page,
        }
    }
}

impl From<PdfEditError> for PageError {
    fn from(e: PdfEditError) -> Self {
        match e {
            PdfEditError::ImageEncodingFailed { page, detail } => {
                PageError::EncodeFailed { page, detail }
            }
            PdfEditError::RasterisationFailed { page, detail } => {
                PageError::RenderFailed { page, detail }
            }
            other => PageError::RenderFailed {
                page: match &other {
                    PdfEditError::PageOutOfRange { page, .. } => *page,
                    _ => 0,
                },
                detail: other.to_string(),
            },
        }
    }
}
