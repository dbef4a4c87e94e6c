//! Progress-callback trait for save operations.
//!
//! Inject an [`Arc<dyn SaveProgressCallback>`] via
//! [`crate::config::EditConfigBuilder::progress_callback`] to receive events
//! while a session reorders, compresses and writes its output.
//!
//! # Example
//!
//! ```rust
//! use privatepdf::{EditConfig, SaveProgressCallback, SaveStage};
//! use std::sync::{Arc, atomic::{AtomicU8, Ordering}};
//!
//! struct LastPercent(AtomicU8);
//!
//! impl SaveProgressCallback for LastPercent {
//!     fn on_stage(&self, _stage: SaveStage, percent: u8) {
//!         self.0.store(percent, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = EditConfig::builder()
//!     .progress_callback(Arc::new(LastPercent(AtomicU8::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::SaveStats;
use std::fmt;
use std::sync::Arc;

/// Milestones of a save, each with a fixed progress percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStage {
    /// Save requested.
    Started,
    /// Copying kept pages into a new document.
    Reordering,
    /// The reordered document exists.
    Reordered,
    /// Rasterisation and JPEG re-encoding began.
    Compressing,
    /// All pages recompressed.
    Compressed,
    /// Compression failed; the uncompressed document is used instead.
    CompressionSkipped,
    /// Output bytes are final and being named / written.
    Finalizing,
    /// Output ready.
    Done,
}

impl SaveStage {
    /// Progress percentage reached when this stage begins.
    pub fn percent(self) -> u8 {
        match self {
            SaveStage::Started => 5,
            SaveStage::Reordering => 15,
            SaveStage::Reordered => 35,
            SaveStage::Compressing => 50,
            SaveStage::Compressed | SaveStage::CompressionSkipped => 92,
            SaveStage::Finalizing => 95,
            SaveStage::Done => 100,
        }
    }
}

impl fmt::Display for SaveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SaveStage::Started => "Starting PDF processing",
            SaveStage::Reordering => "Reordering pages",
            SaveStage::Reordered => "Pages reordered",
            SaveStage::Compressing => "Applying compression",
            SaveStage::Compressed => "Compression finished",
            SaveStage::CompressionSkipped => "Compression failed, using uncompressed PDF",
            SaveStage::Finalizing => "Preparing output",
            SaveStage::Done => "Output ready",
        };
        f.write_str(s)
    }
}

/// Percentage for "compressing page `page_num` of `total_pages`".
///
/// Compression spans 50–90 %: `50 + 40 · page / total`, capped at 90.
pub fn compression_percent(page_num: usize, total_pages: usize) -> u8 {
    if total_pages == 0 {
        return SaveStage::Compressing.percent();
    }
    let pct = 50.0 + 40.0 * page_num as f64 / total_pages as f64;
    pct.min(90.0) as u8
}

/// Called by an editing session while it saves a document.
///
/// Implementations must be `Send + Sync`: page events fire on the worker
/// thread. All methods default to no-ops.
pub trait SaveProgressCallback: Send + Sync {
    /// Called when the save reaches a new milestone.
    fn on_stage(&self, stage: SaveStage, percent: u8) {
        let _ = (stage, percent);
    }

    /// Called after page `page_num` (1-indexed) has been re-encoded as JPEG.
    fn on_page_compressing(&self, page_num: usize, total_pages: usize, percent: u8) {
        let _ = (page_num, total_pages, percent);
    }

    /// Called once the output is ready.
    fn on_save_complete(&self, stats: &SaveStats) {
        let _ = stats;
    }

    /// Called when the save fails. Progress is considered reset.
    fn on_save_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SaveProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::EditConfig`].
pub type ProgressCallback = Arc<dyn SaveProgressCallback>;
