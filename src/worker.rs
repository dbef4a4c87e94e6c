//! A single background thread that owns the PDF engine.
//!
//! pdfium is not async-safe and keeps per-thread state, so every document
//! call is packaged as a job and sent to one dedicated thread. Jobs run one
//! at a time in submission order. [`Worker::run`] awaits a job's result
//! through a oneshot channel; [`Worker::submit`] fires and forgets (the
//! thumbnail stream uses it to push results through its own channel).
//!
//! The engine type is generic so the scheduling can be tested without a
//! pdfium library on the machine.

use crate::engine;
use crate::error::PdfEditError;
use pdfium_render::prelude::Pdfium;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;
use tracing::{debug, error};

type Job<E> = Box<dyn FnOnce(&E) + Send>;

/// The worker used by editing sessions.
pub type PdfWorker = Worker<Pdfium>;

/// Owns a thread and the engine living on it.
///
/// Dropping the last handle lets queued jobs finish, then the thread exits.
/// Inside a tokio runtime the join is handed to the blocking pool so the
/// dropping task does not wait; elsewhere `drop` blocks until the thread
/// is done.
pub struct Worker<E> {
    tx: Option<mpsc::Sender<Job<E>>>,
    handle: Option<JoinHandle<()>>,
}

impl<E: 'static> Worker<E> {
    /// Start the thread and build the engine on it with `init`.
    ///
    /// Returns once the engine is ready; an `init` failure is returned here
    /// and the thread exits.
    pub fn spawn<F>(name: &str, init: F) -> Result<Self, PdfEditError>
    where
        F: FnOnce() -> Result<E, PdfEditError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Job<E>>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), PdfEditError>>(1);

        let thread_name = name.to_string();
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let engine = match init() {
                    Ok(engine) => {
                        let _ = ready_tx.send(Ok(()));
                        engine
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                debug!("{} ready", thread_name);

                while let Ok(job) = rx.recv() {
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| job(&engine))) {
                        error!("{} job panicked: {}", thread_name, panic_message(payload.as_ref()));
                    }
                }
                debug!("{} shutting down", thread_name);
            })
            .map_err(|e| PdfEditError::Internal(format!("Failed to spawn worker thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                tx: Some(tx),
                handle: Some(handle),
            }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(PdfEditError::Internal(
                    "Worker thread exited during startup".into(),
                ))
            }
        }
    }

    /// Queue `job` without waiting for it.
    pub fn submit<F>(&self, job: F) -> Result<(), PdfEditError>
    where
        F: FnOnce(&E) + Send + 'static,
    {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| PdfEditError::Internal("Worker is shut down".into()))?;
        tx.send(Box::new(job))
            .map_err(|_| PdfEditError::Internal("Worker thread is gone".into()))
    }

    /// Run `f` on the worker and await its result.
    ///
    /// A panic inside `f` comes back as [`PdfEditError::Internal`]; the
    /// worker keeps serving later jobs.
    pub async fn run<T, F>(&self, f: F) -> Result<T, PdfEditError>
    where
        T: Send + 'static,
        F: FnOnce(&E) -> Result<T, PdfEditError> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submit(move |engine| {
            let result = panic::catch_unwind(AssertUnwindSafe(|| f(engine))).unwrap_or_else(
                |payload| {
                    Err(PdfEditError::Internal(format!(
                        "Worker job panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                },
            );
            let _ = reply_tx.send(result);
        })?;

        reply_rx
            .await
            .map_err(|_| PdfEditError::Internal("Worker dropped the job".into()))?
    }
}

impl PdfWorker {
    /// Bind pdfium (see [`engine::bind_pdfium`]) on a new worker thread.
    pub fn spawn_pdfium() -> Result<Self, PdfEditError> {
        Self::spawn("pdfium-worker", engine::bind_pdfium)
    }
}

impl<E> Drop for Worker<E> {
    fn drop(&mut self) {
        // Closing the channel ends the thread's receive loop.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    runtime.spawn_blocking(move || {
                        let _ = handle.join();
                    });
                }
                Err(_) => {
                    let _ = handle.join();
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
