//! The chunked page scheduler shared by every extraction mode.
//!
//! ## Scheduling model
//!
//! Pages are processed in consecutive chunks of `max_workers` pages. Every
//! page in a chunk gets its own `spawn_blocking` task (pdfium and the OCR
//! process are blocking), and the next chunk starts only once the current
//! one has fully joined. That bounds open document handles and concurrent
//! OCR processes by `max_workers` without a semaphore, and keeps memory
//! proportional to one chunk of in-flight pages.
//!
//! Tasks finish in any order; results are sorted by page number once all
//! chunks are done.
//!
//! ## Failure and cancellation
//!
//! A worker panic is caught inside its task and becomes
//! [`PageError::WorkerPanicked`], so it follows the configured
//! [`PageErrorPolicy`] like any other page failure. The cancellation token
//! and the optional deadline are raced against every join; when either
//! fires, queued tasks are aborted and no further chunk is started.
//! Blocking tasks that are already running finish in the background and
//! their results are discarded.

use crate::backend::PdfBackend;
use crate::config::{ExtractionConfig, PageErrorPolicy};
use crate::error::{ExtractError, PageError};
use crate::output::PageResult;
use crate::worker::PageWorker;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// An opened document ready to be extracted page by page.
#[derive(Debug, Clone)]
pub struct ExtractionEngine {
    path: PathBuf,
    page_count: usize,
}

impl ExtractionEngine {
    /// Read the page count once; the backend's handle is closed again
    /// before this returns.
    pub async fn open(
        path: impl Into<PathBuf>,
        backend: Arc<dyn PdfBackend>,
    ) -> Result<Self, ExtractError> {
        let path = path.into();
        let probe = path.clone();
        let page_count = tokio::task::spawn_blocking(move || backend.page_count(&probe))
            .await
            .map_err(|e| ExtractError::Internal(format!("page count task failed: {}", e)))??;

        info!("{}: {} pages", path.display(), page_count);
        Ok(Self { path, page_count })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Run `worker` over every page.
    ///
    /// Returns one [`PageResult`] per page, sorted by page number, unless
    /// the call is cancelled, misses its deadline, or a page fails under
    /// [`PageErrorPolicy::Abort`].
    pub async fn run(
        &self,
        worker: Arc<dyn PageWorker>,
        config: &ExtractionConfig,
        cancel: &CancellationToken,
    ) -> Result<Vec<PageResult>, ExtractError> {
        let total = self.page_count;
        let chunk_size = config.max_workers.max(1);
        let deadline = config
            .timeout_secs
            .map(|secs| (secs, Instant::now() + Duration::from_secs(secs)));
        let callback = config.progress_callback.as_ref();

        info!(
            "Extracting {} pages with {} worker (max_workers={})",
            total,
            worker.name(),
            chunk_size
        );
        if let Some(cb) = callback {
            cb.on_extraction_start(total);
        }

        let mut results: Vec<PageResult> = Vec::with_capacity(total);
        let mut failed = 0usize;

        for first in (0..total).step_by(chunk_size) {
            let end = (first + chunk_size).min(total);

            if cancel.is_cancelled() {
                return Err(ExtractError::Cancelled {
                    completed: results.len(),
                    total,
                });
            }
            if let Some((secs, at)) = deadline {
                if Instant::now() >= at {
                    return Err(ExtractError::DeadlineExceeded {
                        secs,
                        completed: results.len(),
                        total,
                    });
                }
            }

            debug!("Chunk: pages {}-{}", first + 1, end);
            if let Some(cb) = callback {
                cb.on_chunk_start(first + 1, end);
            }

            let mut tasks = JoinSet::new();
            for index in first..end {
                let worker = Arc::clone(&worker);
                let path = self.path.clone();
                tasks.spawn_blocking(move || run_page(worker.as_ref(), &path, index));
            }

            loop {
                let joined = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tasks.abort_all();
                        warn!("Extraction cancelled after {}/{} pages", results.len(), total);
                        return Err(ExtractError::Cancelled { completed: results.len(), total });
                    }
                    _ = deadline_reached(deadline.map(|(_, at)| at)) => {
                        tasks.abort_all();
                        let secs = deadline.map_or(0, |(secs, _)| secs);
                        warn!("Extraction exceeded {}s deadline after {}/{} pages", secs, results.len(), total);
                        return Err(ExtractError::DeadlineExceeded { secs, completed: results.len(), total });
                    }
                    next = tasks.join_next() => next,
                };

                let Some(joined) = joined else { break };
                let (index, outcome) = joined
                    .map_err(|e| ExtractError::Internal(format!("page task failed: {}", e)))?;

                match outcome {
                    Ok(page) => {
                        if let Some(cb) = callback {
                            let len = page.text.as_ref().map_or(0, String::len);
                            cb.on_page_complete(page.page_number, total, len);
                        }
                        results.push(page);
                    }
                    Err(err) => {
                        warn!("{}", err);
                        if let Some(cb) = callback {
                            cb.on_page_error(index + 1, total, &err.to_string());
                        }
                        match config.on_page_error {
                            PageErrorPolicy::Record => {
                                failed += 1;
                                results.push(PageResult::failed(index, err));
                            }
                            PageErrorPolicy::Abort => {
                                tasks.abort_all();
                                if let Some(cb) = callback {
                                    cb.on_extraction_complete(total, results.len() - failed);
                                }
                                return Err(ExtractError::Page(err));
                            }
                        }
                    }
                }
            }
        }

        results.sort_by_key(|p| p.page_number);

        let succeeded = results.len() - failed;
        info!(
            "Extracted {}/{} pages ({} failed)",
            succeeded, total, failed
        );
        if let Some(cb) = callback {
            cb.on_extraction_complete(total, succeeded);
        }
        Ok(results)
    }
}

/// Extract one page, turning a panic into a page error.
fn run_page(
    worker: &dyn PageWorker,
    path: &Path,
    index: usize,
) -> (usize, Result<PageResult, PageError>) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| worker.extract_page(path, index)))
        .unwrap_or_else(|payload| {
            Err(PageError::WorkerPanicked {
                page: index + 1,
                detail: panic_message(payload.as_ref()),
            })
        });
    (index, outcome)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

async fn deadline_reached(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::TextSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Echoes the page number; sleeps longer on early pages so completion
    /// order differs from page order.
    struct EchoWorker {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        started: Mutex<Vec<usize>>,
    }

    impl EchoWorker {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                started: Mutex::new(Vec::new()),
            }
        }
    }

    impl PageWorker for EchoWorker {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn extract_page(&self, _: &Path, index: usize) -> Result<PageResult, PageError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.started.lock().unwrap().push(index);
            std::thread::sleep(Duration::from_millis(((7 - index % 7) * 3) as u64));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            match index {
                4 => Err(PageError::PageDecode {
                    page: 5,
                    detail: "broken".into(),
                }),
                6 => panic!("worker blew up"),
                _ => Ok(PageResult::text(index, format!("page {}", index + 1), TextSource::TextLayer)),
            }
        }
    }

    fn engine(pages: usize) -> ExtractionEngine {
        ExtractionEngine {
            path: PathBuf::from("doc.pdf"),
            page_count: pages,
        }
    }

    fn config(max_workers: usize, policy: PageErrorPolicy) -> ExtractionConfig {
        ExtractionConfig {
            max_workers,
            on_page_error: policy,
            ..ExtractionConfig::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn results_are_sorted_and_complete() {
        let worker = Arc::new(EchoWorker::new());
        let pages = engine(10)
            .run(worker.clone(), &config(3, PageErrorPolicy::Record), &CancellationToken::new())
            .await
            .unwrap();

        let numbers: Vec<usize> = pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, (1..=10).collect::<Vec<_>>());
        assert_eq!(pages[0].text.as_deref(), Some("page 1"));
        assert!(worker.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn chunks_do_not_overlap() {
        let worker = Arc::new(EchoWorker::new());
        engine(4)
            .run(worker.clone(), &config(2, PageErrorPolicy::Record), &CancellationToken::new())
            .await
            .unwrap();
        let started = worker.started.lock().unwrap().clone();
        // Pages 0 and 1 both start before either of 2 and 3.
        let pos = |i: usize| started.iter().position(|&p| p == i).unwrap();
        assert!(pos(0).max(pos(1)) < pos(2).min(pos(3)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn record_policy_keeps_failed_and_panicked_pages() {
        let worker = Arc::new(EchoWorker::new());
        let pages = engine(8)
            .run(worker, &config(8, PageErrorPolicy::Record), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(pages.len(), 8);
        assert!(matches!(pages[4].error, Some(PageError::PageDecode { page: 5, .. })));
        match &pages[6].error {
            Some(PageError::WorkerPanicked { page, detail }) => {
                assert_eq!(*page, 7);
                assert!(detail.contains("blew up"));
            }
            other => panic!("expected panic record, got {other:?}"),
        }
        assert!(pages[7].is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn abort_policy_returns_first_page_error() {
        let worker = Arc::new(EchoWorker::new());
        let err = engine(8)
            .run(worker, &config(2, PageErrorPolicy::Abort), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Page(PageError::PageDecode { page: 5, .. })));
    }

    #[tokio::test]
    async fn pre_cancelled_token_runs_nothing() {
        let worker = Arc::new(EchoWorker::new());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = engine(3)
            .run(worker.clone(), &config(2, PageErrorPolicy::Record), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Cancelled { completed: 0, total: 3 }));
        assert!(worker.started.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_document_yields_no_pages() {
        let worker = Arc::new(EchoWorker::new());
        let pages = engine(0)
            .run(worker, &config(4, PageErrorPolicy::Abort), &CancellationToken::new())
            .await
            .unwrap();
        assert!(pages.is_empty());
    }

    #[test]
    fn panic_messages_are_extracted() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic payload");
    }
}
