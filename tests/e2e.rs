//! End-to-end integration tests for privatepdf.
//!
//! Fixture PDFs are generated with `lopdf`; each page gets a distinct width
//! so page order can be read back from `DocumentInfo`. Tests that need the
//! pdfium library are gated behind the `E2E_ENABLED` environment variable.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/path/to/lib cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_merge -- --nocapture

use futures::StreamExt;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use once_cell::sync::Lazy;
use privatepdf::pipeline::reorder;
use privatepdf::{
    output_file_name, parse_page_list, CompressionLevel, DropPosition, EditConfig, EditSession,
    PdfEditError, PdfWorker, SaveProgressCallback, SaveStage,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// One pdfium worker shared by every test; pdfium is bound once per process.
static WORKER: Lazy<Option<Arc<PdfWorker>>> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    match PdfWorker::spawn_pdfium() {
        Ok(w) => Some(Arc::new(w)),
        Err(e) => {
            println!("pdfium unavailable: {e}");
            None
        }
    }
});

/// Skip this test unless E2E_ENABLED is set *and* pdfium can be bound.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        match WORKER.as_ref() {
            Some(w) => Arc::clone(w),
            None => {
                println!("SKIP — pdfium library not found (set PDFIUM_LIB_PATH)");
                return;
            }
        }
    }};
}

fn session(worker: Arc<PdfWorker>, config: EditConfig) -> EditSession {
    EditSession::with_worker(worker, config)
}

fn no_compress() -> EditConfig {
    EditConfig::builder().recompress(false).build().unwrap()
}

/// A PDF whose page `i` is `widths[i]` × 400 pt with a filled square on it.
fn fixture_pdf(widths: &[i64]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for &width in widths {
        let content = Content {
            operations: vec![
                Operation::new(
                    "rg",
                    vec![Object::Integer(0), Object::Integer(0), Object::Integer(1)],
                ),
                Operation::new(
                    "re",
                    vec![
                        Object::Integer(20),
                        Object::Integer(20),
                        Object::Integer(100),
                        Object::Integer(100),
                    ],
                ),
                Operation::new("f", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(width),
                    Object::Integer(400),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
        ]);
        page_ids.push(doc.add_object(page));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_ids.len() as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn write_fixture(dir: &Path, name: &str, widths: &[i64]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, fixture_pdf(widths)).unwrap();
    path
}

/// Page widths, rounded to whole points, of a PDF produced by the session.
async fn widths_of(worker: Arc<PdfWorker>, bytes: Vec<u8>) -> Vec<i64> {
    let mut s = session(worker, no_compress());
    let info = s.open_bytes("check.pdf", bytes).await.expect("output reopens");
    info.pages.iter().map(|p| p.width.round() as i64).collect()
}

// ── Fixture sanity (no pdfium) ───────────────────────────────────────────────

#[test]
fn test_fixture_has_requested_pages() {
    let bytes = fixture_pdf(&[300, 310, 320]);
    assert!(bytes.starts_with(b"%PDF"));
    let doc = Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 3);
}

#[test]
fn test_output_name_and_page_list() {
    assert_eq!(output_file_name("report.pdf", "-modified"), "report-modified.pdf");
    assert_eq!(parse_page_list("3,1-2").unwrap(), vec![3, 1, 2]);
}

// ── Loading & merging ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_open_single_file() {
    let worker = e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "single.pdf", &[300, 310, 320]);

    let mut s = session(worker, EditConfig::default());
    let info = s.open_files(&[&path]).await.expect("open should succeed").clone();

    assert_eq!(info.page_count, 3);
    assert!(!info.is_merged);
    assert_eq!(info.source_files, vec!["single.pdf"]);
    assert_eq!(
        info.pages.iter().map(|p| p.width.round() as i64).collect::<Vec<_>>(),
        vec![300, 310, 320]
    );
    assert!(info.pages.iter().all(|p| (p.height - 400.0).abs() < 0.5));
    assert_eq!(s.kept_pages().unwrap().as_slice(), &[1, 2, 3]);
}

#[tokio::test]
async fn test_merge_concatenates_in_order() {
    let worker = e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let a = write_fixture(dir.path(), "a.pdf", &[300, 310]);
    let b = write_fixture(dir.path(), "b.pdf", &[400, 410, 420]);
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "not a pdf").unwrap();

    let mut s = session(worker, EditConfig::default());
    let info = s.open_files(&[&a, &notes, &b]).await.unwrap().clone();

    assert_eq!(info.page_count, 5);
    assert!(info.is_merged);
    assert_eq!(info.source_files, vec!["a.pdf", "b.pdf"]);
    let origins: Vec<_> = info.origins.iter().map(|o| (o.document, o.page)).collect();
    assert_eq!(origins, vec![(0, 1), (0, 2), (1, 1), (1, 2), (1, 3)]);
    assert_eq!(
        info.pages.iter().map(|p| p.width.round() as i64).collect::<Vec<_>>(),
        vec![300, 310, 400, 410, 420]
    );

    let input_size = std::fs::metadata(&a).unwrap().len() + std::fs::metadata(&b).unwrap().len();
    assert_eq!(s.loaded().unwrap().original_size(), input_size);
    let out = s.save().await.unwrap();
    assert_eq!(out.stats.original_size, input_size);
}

#[tokio::test]
async fn test_merge_skips_unreadable_input() {
    let worker = e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let good = write_fixture(dir.path(), "good.pdf", &[300]);
    let bad = dir.path().join("bad.pdf");
    std::fs::write(&bad, b"%PDF-1.7\nthis is not really a pdf").unwrap();

    let mut s = session(worker, EditConfig::default());
    let info = s.open_files(&[&bad, &good]).await.unwrap().clone();

    assert_eq!(info.page_count, 1);
    let skipped = s.loaded().unwrap().skipped_sources();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].name, "bad.pdf");
}

#[tokio::test]
async fn test_open_rejects_non_pdf_inputs() {
    let worker = e2e_skip_unless_ready!();
    let mut s = session(worker, EditConfig::default());

    let err = s.open_files(&["a.txt", "b.png"]).await.unwrap_err();
    assert!(matches!(err, PdfEditError::NoPdfInputs { given: 2 }));
    assert!(!s.is_loaded());
}

#[tokio::test]
async fn test_failed_open_keeps_previous_document() {
    let worker = e2e_skip_unless_ready!();
    let mut s = session(worker, EditConfig::default());
    s.open_bytes("first.pdf", fixture_pdf(&[300, 310])).await.unwrap();

    let err = s
        .open_bytes("broken.pdf", b"%PDF-1.7\ngarbage".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PdfEditError::CorruptPdf { .. } | PdfEditError::EmptyDocument { .. }
    ));
    assert_eq!(s.document().unwrap().page_count, 2);
}

// ── Editing & saving ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reorder_and_remove_without_compression() {
    let worker = e2e_skip_unless_ready!();
    let mut s = session(Arc::clone(&worker), no_compress());
    s.open_bytes("report.pdf", fixture_pdf(&[300, 310, 320, 330]))
        .await
        .unwrap();

    s.remove_page(2).unwrap();
    s.move_page(4, 1, DropPosition::Before).unwrap();
    assert_eq!(s.kept_pages().unwrap().as_slice(), &[4, 1, 3]);

    let out = s.save().await.expect("save should succeed");
    assert_eq!(out.file_name, "report-modified.pdf");
    assert_eq!(out.mime_type(), "application/pdf");
    assert_eq!(out.stats.page_count, 3);
    assert!(out.stats.compression.is_none());

    assert_eq!(widths_of(worker, out.bytes).await, vec![330, 300, 320]);
}

#[tokio::test]
async fn test_remove_pages_keeps_the_rest_in_order() {
    let worker = e2e_skip_unless_ready!();
    let bytes = Arc::new(fixture_pdf(&[300, 310, 320]));

    let input = Arc::clone(&bytes);
    let removed = worker
        .run(move |pdfium| reorder::remove_pages(pdfium, "three.pdf", &input, &[2], None))
        .await
        .unwrap();
    assert_eq!(removed.page_count, 2);
    assert_eq!(widths_of(Arc::clone(&worker), removed.bytes).await, vec![300, 320]);

    let input = Arc::clone(&bytes);
    let err = worker
        .run(move |pdfium| reorder::remove_pages(pdfium, "three.pdf", &input, &[1, 2, 3], None))
        .await
        .unwrap_err();
    assert!(matches!(err, PdfEditError::NoPagesSelected));
}

#[tokio::test]
async fn test_last_page_cannot_be_removed() {
    let worker = e2e_skip_unless_ready!();
    let mut s = session(worker, no_compress());
    s.open_bytes("two.pdf", fixture_pdf(&[300, 310])).await.unwrap();

    s.remove_page(1).unwrap();
    let err = s.remove_page(2).unwrap_err();
    assert!(matches!(err, PdfEditError::LastPage { page: 2 }));
    assert_eq!(s.kept_pages().unwrap().len(), 1);

    s.reset_pages().unwrap();
    assert_eq!(s.kept_pages().unwrap().as_slice(), &[1, 2]);
}

#[tokio::test]
async fn test_compressed_save_keeps_page_sizes() {
    let worker = e2e_skip_unless_ready!();
    let config = EditConfig::builder()
        .compression(CompressionLevel::High)
        .build()
        .unwrap();
    let mut s = session(Arc::clone(&worker), config);
    s.open_bytes("scan.pdf", fixture_pdf(&[300, 310, 320]))
        .await
        .unwrap();
    s.set_page_order(vec![3, 1]).unwrap();

    let out = s.save().await.expect("compressed save should succeed");
    assert_eq!(out.stats.compression, Some(CompressionLevel::High));
    assert!(!out.stats.compression_failed);
    assert_eq!(out.stats.page_count, 2);

    let doc = Document::load_mem(&out.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
    let jpegs = doc
        .objects
        .values()
        .filter_map(|o| o.as_stream().ok())
        .filter(|st| {
            st.dict.get(b"Filter").and_then(Object::as_name).ok() == Some(b"DCTDecode".as_slice())
        })
        .count();
    assert_eq!(jpegs, 2);

    assert_eq!(widths_of(worker, out.bytes).await, vec![320, 300]);
}

#[tokio::test]
async fn test_save_to_directory_uses_derived_name() {
    let worker = e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "letter.pdf", &[300, 310]);
    let out_dir = dir.path().join("out");
    std::fs::create_dir_all(&out_dir).unwrap();

    let mut s = session(worker, no_compress());
    s.open_files(&[&input]).await.unwrap();
    let (path, out) = s.save_to_path(&out_dir).await.unwrap();

    assert_eq!(path, out_dir.join("letter-modified.pdf"));
    let written = std::fs::read(&path).unwrap();
    assert_eq!(written.len() as u64, out.stats.output_size);
    assert!(written.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_save_refuses_to_overwrite_input() {
    let worker = e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "letter.pdf", &[300, 310]);
    let before = std::fs::read(&input).unwrap();

    let mut config = no_compress();
    config.output_suffix = String::new();
    let mut s = session(Arc::clone(&worker), config);
    s.open_files(&[&input]).await.unwrap();
    let err = s.save_to_path(dir.path()).await.unwrap_err();
    assert!(matches!(err, PdfEditError::OutputOverwritesInput { .. }));

    let mut s = session(worker, no_compress());
    s.open_files(&[&input]).await.unwrap();
    let err = s.save_to_path(&input).await.unwrap_err();
    assert!(matches!(err, PdfEditError::OutputOverwritesInput { .. }));

    assert_eq!(std::fs::read(&input).unwrap(), before);
}

#[tokio::test]
async fn test_save_without_document_fails() {
    let worker = e2e_skip_unless_ready!();
    let s = session(worker, no_compress());
    assert!(matches!(
        s.save().await,
        Err(PdfEditError::NoDocumentLoaded)
    ));
}

// ── Progress ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    percents: Mutex<Vec<u8>>,
    stages: Mutex<Vec<SaveStage>>,
    pages: Mutex<Vec<usize>>,
    completed: Mutex<bool>,
}

impl SaveProgressCallback for Recorder {
    fn on_stage(&self, stage: SaveStage, percent: u8) {
        self.stages.lock().unwrap().push(stage);
        self.percents.lock().unwrap().push(percent);
    }

    fn on_page_compressing(&self, page_num: usize, _total_pages: usize, percent: u8) {
        self.pages.lock().unwrap().push(page_num);
        self.percents.lock().unwrap().push(percent);
    }

    fn on_save_complete(&self, _stats: &privatepdf::SaveStats) {
        *self.completed.lock().unwrap() = true;
    }
}

#[tokio::test]
async fn test_progress_runs_from_five_to_hundred() {
    let worker = e2e_skip_unless_ready!();
    let recorder = Arc::new(Recorder::default());
    let config = EditConfig::builder()
        .progress_callback(Arc::clone(&recorder) as Arc<dyn SaveProgressCallback>)
        .build()
        .unwrap();
    let mut s = session(worker, config);
    s.open_bytes("p.pdf", fixture_pdf(&[300, 310, 320, 330]))
        .await
        .unwrap();

    s.save().await.unwrap();

    let percents = recorder.percents.lock().unwrap().clone();
    assert_eq!(percents.first(), Some(&5));
    assert_eq!(percents.last(), Some(&100));
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
    assert!(percents.contains(&50) && percents.contains(&92));

    assert_eq!(*recorder.pages.lock().unwrap(), vec![1, 2, 3, 4]);
    assert!(recorder.stages.lock().unwrap().contains(&SaveStage::Compressed));
    assert!(*recorder.completed.lock().unwrap());
}

// ── Thumbnails ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_thumbnail_is_cached_png() {
    let worker = e2e_skip_unless_ready!();
    let mut s = session(worker, EditConfig::default());
    s.open_bytes("t.pdf", fixture_pdf(&[300, 310])).await.unwrap();

    let thumb = s.thumbnail(2).await.unwrap();
    assert_eq!(thumb.page_number, 2);
    assert_eq!(&thumb.png[..4], b"\x89PNG");
    assert!(thumb.data_url().starts_with("data:image/png;base64,"));
    // 310 pt × 0.7
    assert!((thumb.width as i64 - 217).abs() <= 1, "width {}", thumb.width);
    assert!(s.loaded().unwrap().cached_thumbnail(2).is_some());

    assert!(matches!(
        s.thumbnail(3).await,
        Err(PdfEditError::PageOutOfRange { page: 3, total: 2 })
    ));
}

#[tokio::test]
async fn test_thumbnail_stream_follows_kept_order() {
    let worker = e2e_skip_unless_ready!();
    let mut s = session(worker, EditConfig::default());
    s.open_bytes("t.pdf", fixture_pdf(&[300, 310, 320])).await.unwrap();
    s.move_page(3, 1, DropPosition::Before).unwrap();

    let pages: Vec<u32> = s
        .thumbnail_stream()
        .unwrap()
        .map(|item| item.expect("thumbnail renders").page_number)
        .collect()
        .await;
    assert_eq!(pages, vec![3, 1, 2]);
}

#[tokio::test]
async fn test_preload_fills_cache() {
    let worker = e2e_skip_unless_ready!();
    let mut s = session(worker, EditConfig::default());
    s.open_bytes("t.pdf", fixture_pdf(&[300, 310, 320])).await.unwrap();

    let failures = s.preload_thumbnails().await.unwrap();
    assert!(failures.is_empty());
    assert!(s.loaded().unwrap().pages_without_thumbnail().is_empty());
}
