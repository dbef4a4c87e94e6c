//! The editing session: one loaded document, its kept-page list, and the
//! operations a user performs on them.
//!
//! ```text
//!            open_files / open_bytes
//!   Empty ─────────────────────────────▶ Loaded ──┐ remove_page / move_page /
//!     ▲                                   │  ▲    │ set_page_order / reset_pages
//!     └──────────── close ────────────────┘  └────┘ thumbnail / save
//! ```
//!
//! Opening replaces the current document only on success; a failed open or
//! save leaves the session as it was.

use crate::config::EditConfig;
use crate::error::{PageError, PdfEditError};
use crate::output::{output_file_name, DocumentInfo, SaveOutput, SaveStats, Thumbnail};
use crate::pages::{DropPosition, KeptPages};
use crate::pipeline::input::{self, SourcePdf};
use crate::pipeline::merge::{self, SkippedSource};
use crate::pipeline::{compress, load, render, reorder};
use crate::progress::{SaveProgressCallback, SaveStage};
use crate::stream::{self, ThumbnailRequest, ThumbnailStream};
use crate::worker::PdfWorker;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A document held by the session, plus the user's edits to it.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    name: String,
    bytes: Arc<Vec<u8>>,
    info: DocumentInfo,
    kept: KeptPages,
    thumbnails: HashMap<u32, Thumbnail>,
    skipped_sources: Vec<SkippedSource>,
    /// Files the document was read from; saving never replaces these.
    source_paths: Vec<PathBuf>,
    /// Bytes read from the inputs, summed over merged files.
    original_size: u64,
}

impl LoadedDocument {
    /// Wrap freshly loaded bytes; every page starts out kept.
    pub fn new(
        name: impl Into<String>,
        bytes: Arc<Vec<u8>>,
        info: DocumentInfo,
    ) -> Result<Self, PdfEditError> {
        let name = name.into();
        if info.page_count == 0 {
            return Err(PdfEditError::EmptyDocument { name });
        }
        Ok(Self {
            kept: KeptPages::all(info.page_count)?,
            name,
            original_size: bytes.len() as u64,
            bytes,
            info,
            thumbnails: HashMap::new(),
            skipped_sources: Vec::new(),
            source_paths: Vec::new(),
        })
    }

    /// File name of the (first) input; the output name derives from it.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &Arc<Vec<u8>> {
        &self.bytes
    }

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    pub fn kept_pages(&self) -> &KeptPages {
        &self.kept
    }

    /// Inputs left out when this document was merged.
    pub fn skipped_sources(&self) -> &[SkippedSource] {
        &self.skipped_sources
    }

    /// Input size in bytes; for a merge, the sum over the merged inputs.
    pub fn original_size(&self) -> u64 {
        self.original_size
    }

    pub fn source_paths(&self) -> &[PathBuf] {
        &self.source_paths
    }

    pub fn cached_thumbnail(&self, page: u32) -> Option<&Thumbnail> {
        self.thumbnails.get(&page)
    }

    /// Pages still lacking a cached thumbnail, in kept order.
    pub fn pages_without_thumbnail(&self) -> Vec<u32> {
        self.kept
            .as_slice()
            .iter()
            .copied()
            .filter(|p| !self.thumbnails.contains_key(p))
            .collect()
    }

    fn check_page(&self, page: u32) -> Result<(), PdfEditError> {
        if page == 0 || page > self.info.page_count {
            Err(PdfEditError::PageOutOfRange {
                page,
                total: self.info.page_count,
            })
        } else {
            Ok(())
        }
    }

    pub fn remove_page(&mut self, page: u32) -> Result<(), PdfEditError> {
        self.check_page(page)?;
        self.kept.remove(page)
    }

    pub fn move_page(
        &mut self,
        dragged: u32,
        target: u32,
        position: DropPosition,
    ) -> Result<(), PdfEditError> {
        self.check_page(dragged)?;
        self.kept.move_page(dragged, target, position)
    }

    pub fn set_page_order(&mut self, order: Vec<u32>) -> Result<(), PdfEditError> {
        self.kept = KeptPages::from_order(order, self.info.page_count)?;
        Ok(())
    }

    pub fn reset_pages(&mut self) {
        self.kept.reset();
    }
}

/// An editing session bound to a pdfium worker.
///
/// # Example
/// ```rust,no_run
/// use privatepdf::{DropPosition, EditConfig, EditSession};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), privatepdf::PdfEditError> {
/// let mut session = EditSession::new(EditConfig::default())?;
/// session.open_files(&["a.pdf", "b.pdf"]).await?;
/// session.remove_page(2)?;
/// session.move_page(1, 3, DropPosition::After)?;
/// let (path, out) = session.save_to_path("out/".as_ref()).await?;
/// println!("{} ({} pages)", path.display(), out.stats.page_count);
/// # Ok(())
/// # }
/// ```
pub struct EditSession {
    worker: Arc<PdfWorker>,
    config: EditConfig,
    document: Option<LoadedDocument>,
}

impl EditSession {
    /// Start a session with its own pdfium worker.
    pub fn new(config: EditConfig) -> Result<Self, PdfEditError> {
        let worker = PdfWorker::spawn_pdfium()?;
        Ok(Self::with_worker(Arc::new(worker), config))
    }

    /// Start a session that shares `worker` with other sessions.
    pub fn with_worker(worker: Arc<PdfWorker>, config: EditConfig) -> Self {
        Self {
            worker,
            config,
            document: None,
        }
    }

    pub fn config(&self) -> &EditConfig {
        &self.config
    }

    pub fn worker(&self) -> &Arc<PdfWorker> {
        &self.worker
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    pub fn loaded(&self) -> Option<&LoadedDocument> {
        self.document.as_ref()
    }

    /// Info of the loaded document.
    pub fn document(&self) -> Option<&DocumentInfo> {
        self.document.as_ref().map(LoadedDocument::info)
    }

    pub fn kept_pages(&self) -> Option<&KeptPages> {
        self.document.as_ref().map(LoadedDocument::kept_pages)
    }

    fn loaded_ref(&self) -> Result<&LoadedDocument, PdfEditError> {
        self.document.as_ref().ok_or(PdfEditError::NoDocumentLoaded)
    }

    fn loaded_mut(&mut self) -> Result<&mut LoadedDocument, PdfEditError> {
        self.document.as_mut().ok_or(PdfEditError::NoDocumentLoaded)
    }

    // ── Loading ──────────────────────────────────────────────────────────

    /// Open files from disk. Non-PDF paths are skipped; one PDF is loaded
    /// as-is, several are merged in the given order.
    pub async fn open_files<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
    ) -> Result<&DocumentInfo, PdfEditError> {
        let sources = input::read_sources(paths).await?;
        self.open_sources(sources).await
    }

    /// Open a single in-memory document.
    pub async fn open_bytes(
        &mut self,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<&DocumentInfo, PdfEditError> {
        let source = SourcePdf::from_bytes(name, bytes)?;
        self.open_sources(vec![source]).await
    }

    /// Open already-read sources, merging when there is more than one.
    pub async fn open_sources(
        &mut self,
        sources: Vec<SourcePdf>,
    ) -> Result<&DocumentInfo, PdfEditError> {
        let first = sources
            .first()
            .ok_or(PdfEditError::NoPdfInputs { given: 0 })?
            .clone();
        let password = self.config.password.clone();
        let source_paths: Vec<PathBuf> = sources.iter().filter_map(|s| s.path.clone()).collect();

        let mut loaded = if sources.len() == 1 {
            let source = first.clone();
            let info = self
                .worker
                .run(move |pdfium| load::inspect(pdfium, &source, password.as_deref()))
                .await?;
            LoadedDocument::new(first.name, first.bytes, info)?
        } else {
            let merged = self
                .worker
                .run(move |pdfium| merge::merge_documents(pdfium, &sources, password.as_deref()))
                .await?;
            let name = merged
                .info
                .source_files
                .first()
                .cloned()
                .unwrap_or(first.name);
            let mut doc = LoadedDocument::new(name, Arc::new(merged.bytes), merged.info)?;
            doc.skipped_sources = merged.skipped_sources;
            doc.original_size = merged.original_size;
            doc
        };
        loaded.source_paths = source_paths;

        info!(
            "Opened '{}' ({} pages{})",
            loaded.name,
            loaded.info.page_count,
            if loaded.info.is_merged { ", merged" } else { "" }
        );
        Ok(self.document.insert(loaded).info())
    }

    /// Drop the loaded document and its thumbnails.
    pub fn close(&mut self) {
        if let Some(doc) = self.document.take() {
            debug!("Closed '{}'", doc.name);
        }
    }

    // ── Page edits ───────────────────────────────────────────────────────

    /// Remove `page` from the output. The last remaining page cannot be removed.
    pub fn remove_page(&mut self, page: u32) -> Result<(), PdfEditError> {
        self.loaded_mut()?.remove_page(page)
    }

    /// Drag `dragged` onto `target`, landing before or after it.
    pub fn move_page(
        &mut self,
        dragged: u32,
        target: u32,
        position: DropPosition,
    ) -> Result<(), PdfEditError> {
        self.loaded_mut()?.move_page(dragged, target, position)
    }

    /// Replace the kept-page list outright.
    pub fn set_page_order(&mut self, order: Vec<u32>) -> Result<(), PdfEditError> {
        self.loaded_mut()?.set_page_order(order)
    }

    /// Keep every page again, in original order.
    pub fn reset_pages(&mut self) -> Result<(), PdfEditError> {
        self.loaded_mut()?.reset_pages();
        Ok(())
    }

    // ── Thumbnails ───────────────────────────────────────────────────────

    /// Thumbnail of original page `page`, rendered on first request.
    pub async fn thumbnail(&mut self, page: u32) -> Result<Thumbnail, PdfEditError> {
        let doc = self.loaded_ref()?;
        doc.check_page(page)?;
        if let Some(t) = doc.cached_thumbnail(page) {
            return Ok(t.clone());
        }

        let name = doc.name.clone();
        let bytes = Arc::clone(&doc.bytes);
        let scale = self.config.thumbnail_scale;
        let password = self.config.password.clone();
        let thumb = self
            .worker
            .run(move |pdfium| {
                let document = load::open_document(pdfium, &name, &bytes, password.as_deref())?;
                render::render_thumbnail(&document, page, scale)
            })
            .await?;

        self.loaded_mut()?.thumbnails.insert(page, thumb.clone());
        Ok(thumb)
    }

    /// Render every missing thumbnail of the kept pages in one worker job.
    ///
    /// Pages that fail are returned; the rest are cached.
    pub async fn preload_thumbnails(&mut self) -> Result<Vec<PageError>, PdfEditError> {
        let doc = self.loaded_ref()?;
        let pages = doc.pages_without_thumbnail();
        if pages.is_empty() {
            return Ok(Vec::new());
        }

        let name = doc.name.clone();
        let bytes = Arc::clone(&doc.bytes);
        let scale = self.config.thumbnail_scale;
        let password = self.config.password.clone();
        let results = self
            .worker
            .run(move |pdfium| {
                let document = load::open_document(pdfium, &name, &bytes, password.as_deref())?;
                let rendered: Vec<_> = pages
                    .into_iter()
                    .map(|p| render::render_thumbnail(&document, p, scale).map_err(PageError::from))
                    .collect();
                Ok(rendered)
            })
            .await?;

        let doc = self.loaded_mut()?;
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(t) => {
                    doc.thumbnails.insert(t.page_number, t);
                }
                Err(e) => {
                    warn!("{}", e);
                    failures.push(e);
                }
            }
        }
        Ok(failures)
    }

    /// Stream thumbnails of the kept pages, in kept order, as they render.
    ///
    /// Streamed thumbnails are not cached.
    pub fn thumbnail_stream(&self) -> Result<ThumbnailStream, PdfEditError> {
        let doc = self.loaded_ref()?;
        stream::thumbnail_stream(
            &self.worker,
            ThumbnailRequest {
                name: doc.name.clone(),
                bytes: Arc::clone(&doc.bytes),
                pages: doc.kept.as_slice().to_vec(),
                scale: self.config.thumbnail_scale,
                password: self.config.password.clone(),
            },
        )
    }

    // ── Saving ───────────────────────────────────────────────────────────

    /// Produce the output document in memory: kept pages in order, then
    /// recompressed unless disabled.
    pub async fn save(&self) -> Result<SaveOutput, PdfEditError> {
        let doc = self.loaded_ref()?;
        let callback = self.config.progress_callback.clone();
        match self.save_document(doc, callback.clone()).await {
            Ok(output) => {
                if let Some(cb) = &callback {
                    cb.on_save_complete(&output.stats);
                }
                Ok(output)
            }
            Err(e) => {
                if let Some(cb) = &callback {
                    cb.on_save_error(&e.to_string());
                }
                Err(e)
            }
        }
    }

    async fn save_document(
        &self,
        doc: &LoadedDocument,
        callback: Option<Arc<dyn SaveProgressCallback>>,
    ) -> Result<SaveOutput, PdfEditError> {
        let stage = |s: SaveStage| {
            debug!("Save: {} ({}%)", s, s.percent());
            if let Some(cb) = &callback {
                cb.on_stage(s, s.percent());
            }
        };
        let started = Instant::now();
        stage(SaveStage::Started);

        // Reorder
        stage(SaveStage::Reordering);
        let name = doc.name.clone();
        let bytes = Arc::clone(&doc.bytes);
        let order = doc.kept.as_slice().to_vec();
        let password = self.config.password.clone();
        let pwd = password.clone();
        let reordered = self
            .worker
            .run(move |pdfium| {
                reorder::build_with_page_order(pdfium, &name, &bytes, &order, pwd.as_deref())
            })
            .await?;
        let reorder_ms = started.elapsed().as_millis() as u64;
        stage(SaveStage::Reordered);

        // Compress
        let mut stats = SaveStats {
            page_count: reordered.page_count,
            original_size: doc.original_size,
            reorder_duration_ms: reorder_ms,
            ..Default::default()
        };
        let compress_started = Instant::now();
        let output_bytes = if self.config.recompress {
            stage(SaveStage::Compressing);
            let level = self.config.compression;
            let scale = self.config.render_scale;
            let name = doc.name.clone();
            let reordered_bytes = Arc::new(reordered.bytes);
            let input = Arc::clone(&reordered_bytes);
            let cb = callback.clone();
            let compressed = self
                .worker
                .run(move |pdfium| {
                    compress::compress_document(
                        pdfium,
                        &name,
                        &input,
                        level,
                        scale,
                        password.as_deref(),
                        cb.as_deref(),
                    )
                })
                .await;

            match compressed {
                Ok(c) => {
                    stats.compression = Some(level);
                    stage(SaveStage::Compressed);
                    c.bytes
                }
                Err(e) if self.config.fallback_to_uncompressed => {
                    warn!("Compression failed, keeping uncompressed output: {}", e);
                    stats.compression_failed = true;
                    stage(SaveStage::CompressionSkipped);
                    Arc::try_unwrap(reordered_bytes).unwrap_or_else(|shared| (*shared).clone())
                }
                Err(e) => return Err(e),
            }
        } else {
            reordered.bytes
        };
        stats.compress_duration_ms = compress_started.elapsed().as_millis() as u64;

        stage(SaveStage::Finalizing);
        let file_name = output_file_name(&doc.name, &self.config.output_suffix);
        stats.output_size = output_bytes.len() as u64;
        stats.total_duration_ms = started.elapsed().as_millis() as u64;
        stage(SaveStage::Done);

        info!(
            "Saved '{}': {} pages, {} → {} bytes",
            file_name, stats.page_count, stats.original_size, stats.output_size
        );
        Ok(SaveOutput {
            bytes: output_bytes,
            file_name,
            stats,
        })
    }

    /// Save and write the result.
    ///
    /// `dest` may be a directory (the derived file name is used inside it)
    /// or a file path. The file is written to a temporary sibling first and
    /// renamed into place.
    /// Fails with [`PdfEditError::OutputOverwritesInput`] if the resolved
    /// path is one of the files the document was opened from.
    pub async fn save_to_path(&self, dest: &Path) -> Result<(PathBuf, SaveOutput), PdfEditError> {
        let doc = self.loaded_ref()?;
        let file_name = output_file_name(&doc.name, &self.config.output_suffix);
        let path = resolve_destination(dest, &file_name);
        if let Some(input) = overwritten_input(&path, &doc.source_paths) {
            return Err(PdfEditError::OutputOverwritesInput {
                path: input.to_path_buf(),
            });
        }

        let output = self.save().await?;
        let bytes = output.bytes.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&target, &bytes))
            .await
            .map_err(|e| PdfEditError::Internal(format!("Write task panicked: {}", e)))??;
        info!("Wrote {}", path.display());
        Ok((path, output))
    }
}

/// A directory destination gets `file_name` appended.
fn resolve_destination(dest: &Path, file_name: &str) -> PathBuf {
    if dest.is_dir() || dest.as_os_str().to_string_lossy().ends_with(['/', '\\']) {
        dest.join(file_name)
    } else {
        dest.to_path_buf()
    }
}

/// The input in `inputs` that `target` names, if any.
fn overwritten_input<'a>(target: &Path, inputs: &'a [PathBuf]) -> Option<&'a Path> {
    let target = std::fs::canonicalize(target).ok()?;
    inputs
        .iter()
        .map(PathBuf::as_path)
        .find(|input| std::fs::canonicalize(input).is_ok_and(|c| c == target))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PdfEditError> {
    let write_err = |source: std::io::Error| PdfEditError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::PageInfo;

    fn info(pages: u32) -> DocumentInfo {
        DocumentInfo {
            page_count: pages,
            pages: (1..=pages)
                .map(|n| PageInfo {
                    page_number: n,
                    width: 612.0,
                    height: 792.0,
                    rotation: 0,
                })
                .collect(),
            file_size_bytes: 100,
            ..Default::default()
        }
    }

    fn loaded(pages: u32) -> LoadedDocument {
        LoadedDocument::new("report.pdf", Arc::new(b"%PDF-1.7".to_vec()), info(pages)).unwrap()
    }

    #[test]
    fn new_document_keeps_every_page() {
        let doc = loaded(3);
        assert_eq!(doc.kept_pages().as_slice(), &[1, 2, 3]);
        assert_eq!(doc.pages_without_thumbnail(), vec![1, 2, 3]);
    }

    #[test]
    fn empty_document_is_rejected() {
        let err = LoadedDocument::new("x.pdf", Arc::new(Vec::new()), info(0)).unwrap_err();
        assert!(matches!(err, PdfEditError::EmptyDocument { .. }));
    }

    #[test]
    fn edits_validate_page_range() {
        let mut doc = loaded(3);
        assert!(matches!(
            doc.remove_page(4),
            Err(PdfEditError::PageOutOfRange { page: 4, total: 3 })
        ));
        assert!(matches!(
            doc.move_page(0, 1, DropPosition::Before),
            Err(PdfEditError::PageOutOfRange { .. })
        ));
    }

    #[test]
    fn edit_sequence_then_reset() {
        let mut doc = loaded(4);
        doc.remove_page(2).unwrap();
        doc.move_page(4, 1, DropPosition::Before).unwrap();
        assert_eq!(doc.kept_pages().as_slice(), &[4, 1, 3]);
        doc.set_page_order(vec![3, 1]).unwrap();
        assert_eq!(doc.kept_pages().removed(), vec![2, 4]);
        doc.reset_pages();
        assert_eq!(doc.kept_pages().as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn invalid_order_leaves_list_unchanged() {
        let mut doc = loaded(3);
        doc.remove_page(1).unwrap();
        assert!(doc.set_page_order(vec![1, 1]).is_err());
        assert_eq!(doc.kept_pages().as_slice(), &[2, 3]);
    }

    #[test]
    fn cached_thumbnails_are_skipped() {
        let mut doc = loaded(3);
        doc.thumbnails.insert(
            2,
            Thumbnail {
                page_number: 2,
                width: 1,
                height: 1,
                png: Vec::new(),
            },
        );
        doc.move_page(3, 1, DropPosition::Before).unwrap();
        assert_eq!(doc.pages_without_thumbnail(), vec![3, 1]);
        assert!(doc.cached_thumbnail(2).is_some());
    }

    #[test]
    fn destination_directory_gets_file_name() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_destination(dir.path(), "a-modified.pdf"),
            dir.path().join("a-modified.pdf")
        );
        let file = dir.path().join("custom.pdf");
        assert_eq!(resolve_destination(&file, "a-modified.pdf"), file);
    }

    #[test]
    fn merged_size_is_kept_separately() {
        let mut doc = loaded(2);
        assert_eq!(doc.original_size(), 8);
        doc.original_size = 5000;
        assert_eq!(doc.original_size(), 5000);
    }

    #[test]
    fn output_onto_input_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("report.pdf");
        std::fs::write(&input, b"%PDF-1.7").unwrap();
        let inputs = vec![input.clone()];

        let same = resolve_destination(dir.path(), "report.pdf");
        assert_eq!(overwritten_input(&same, &inputs), Some(input.as_path()));

        let dotted = dir.path().join(".").join("report.pdf");
        assert!(overwritten_input(&dotted, &inputs).is_some());

        let other = resolve_destination(dir.path(), "report-modified.pdf");
        assert_eq!(overwritten_input(&other, &inputs), None);
        assert_eq!(overwritten_input(&same, &[]), None);
    }

    #[test]
    fn atomic_write_creates_parent_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.pdf");
        write_atomic(&path, b"%PDF-1.7 test").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7 test");
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
