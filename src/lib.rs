//! # privatepdf
//!
//! Edit PDF documents locally: reorder, delete and merge pages, preview them
//! as thumbnails, and save a recompressed copy. Nothing leaves the machine.
//!
//! Parsing, rendering and page copying are done by pdfium through
//! `pdfium-render`. Recompression rasterises each page, re-encodes it as
//! JPEG and rebuilds an image-only PDF with `lopdf`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF file(s)
//!  │
//!  ├─ 1. Input    filter to .pdf, check %PDF, read bytes
//!  ├─ 2. Load     open one document, or merge several in order
//!  ├─ 3. Edit     remove / move pages in the kept-page list
//!  ├─ 4. Reorder  copy kept pages into a new document
//!  ├─ 5. Compress render → JPEG (q 90/70/50) → image-only PDF
//!  └─ 6. Output   <name>-modified.pdf
//! ```
//!
//! Every pdfium call runs on one background thread
//! ([`worker::PdfWorker`]); the async API awaits its jobs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use privatepdf::{CompressionLevel, EditConfig, EditSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EditConfig::builder()
//!         .compression(CompressionLevel::High)
//!         .build()?;
//!     let mut session = EditSession::new(config)?;
//!     let info = session.open_files(&["scan.pdf"]).await?;
//!     println!("{} pages", info.page_count);
//!
//!     session.remove_page(1)?;
//!     let output = session.save().await?;
//!     std::fs::write(&output.file_name, &output.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `privatepdf` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! ```toml
//! privatepdf = { version = "0.1", default-features = false }
//! ```
//!
//! ## Compression Levels
//!
//! | Level | JPEG quality | Effect |
//! |-------|--------------|--------|
//! | `low`    | 90 | Larger files, best quality |
//! | `medium` | 70 | Default |
//! | `high`   | 50 | Smallest files |
//!
//! Recompression turns text into pixels. Use
//! [`EditConfigBuilder::recompress(false)`](EditConfigBuilder::recompress)
//! to keep the reordered document as pdfium wrote it.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod pages;
pub mod pipeline;
pub mod progress;
pub mod session;
pub mod stream;
pub mod worker;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CompressionLevel, EditConfig, EditConfigBuilder};
pub use error::{PageError, PdfEditError};
pub use output::{
    format_file_size, output_file_name, DocumentInfo, PageInfo, PageOrigin, SaveOutput, SaveStats,
    Thumbnail,
};
pub use pages::{parse_page_list, DropPosition, KeptPages};
pub use pipeline::input::SourcePdf;
pub use progress::{NoopProgressCallback, ProgressCallback, SaveProgressCallback, SaveStage};
pub use session::{EditSession, LoadedDocument};
pub use stream::ThumbnailStream;
pub use worker::PdfWorker;
