//! Streaming thumbnail API: emit page previews as they are rendered.
//!
//! Rendering every thumbnail of a long document takes a while. The stream
//! yields each one as soon as the worker finishes it, so callers can show
//! the first pages immediately. Items arrive in the order requested. A page
//! that fails yields a [`PageError`] and the stream moves on to the next.

use crate::error::{PageError, PdfEditError};
use crate::output::Thumbnail;
use crate::pipeline::{load, render};
use crate::worker::PdfWorker;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, warn};

/// A boxed stream of thumbnail results.
pub type ThumbnailStream = Pin<Box<dyn Stream<Item = Result<Thumbnail, PageError>> + Send>>;

/// What to render.
#[derive(Debug, Clone)]
pub struct ThumbnailRequest {
    pub name: String,
    pub bytes: Arc<Vec<u8>>,
    /// 1-based page numbers, in the order they should be yielded.
    pub pages: Vec<u32>,
    pub scale: f32,
    pub password: Option<String>,
}

/// Queue one worker job that renders every requested page and stream the
/// results back.
///
/// Dropping the stream stops rendering after the page in progress.
pub fn thumbnail_stream(
    worker: &PdfWorker,
    request: ThumbnailRequest,
) -> Result<ThumbnailStream, PdfEditError> {
    // Room for every item, so the worker never waits on a slow consumer.
    let (tx, rx) = mpsc::channel(request.pages.len().max(1));

    worker.submit(move |pdfium| {
        let ThumbnailRequest {
            name,
            bytes,
            pages,
            scale,
            password,
        } = request;

        let document = match load::open_document(pdfium, &name, &bytes, password.as_deref()) {
            Ok(document) => document,
            Err(e) => {
                warn!("Thumbnails unavailable for '{}': {}", name, e);
                for page in pages {
                    let item = Err(PageError::RenderFailed {
                        page,
                        detail: e.to_string(),
                    });
                    if tx.blocking_send(item).is_err() {
                        break;
                    }
                }
                return;
            }
        };

        for page in pages {
            let item = render::render_thumbnail(&document, page, scale).map_err(PageError::from);
            if let Err(e) = &item {
                warn!("Thumbnail for page {} failed: {}", page, e);
            }
            if tx.blocking_send(item).is_err() {
                debug!("Thumbnail stream dropped; stopping at page {}", page);
                break;
            }
        }
    })?;

    Ok(Box::pin(ReceiverStream::new(rx)))
}
