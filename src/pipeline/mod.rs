//! Pipeline stages for editing and recompressing PDFs.
//!
//! Each submodule implements one step. Everything that touches pdfium takes
//! a `&Pdfium` and runs inside a [`crate::worker::PdfWorker`] job.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ load / merge ──▶ reorder ──▶ render ──▶ encode ──▶ assemble
//! (files)   (pdfium)         (pdfium)   (pdfium)   (JPEG)     (lopdf)
//! ```
//!
//! 1. [`input`]    — filter paths to PDFs, read and magic-check them
//! 2. [`load`]     — open a buffer, read page geometry and metadata
//! 3. [`merge`]    — append several documents into one
//! 4. [`reorder`]  — copy an ordered page list into a new document
//! 5. [`render`]   — rasterise a page, or a PNG thumbnail of it
//! 6. [`encode`]   — JPEG for recompression, PNG for thumbnails
//! 7. [`assemble`] — build an image-only PDF from JPEG pages
//!
//! [`compress`] chains 5–7 over every page of a document.

pub mod assemble;
pub mod compress;
pub mod encode;
pub mod input;
pub mod load;
pub mod merge;
pub mod render;
pub mod reorder;
