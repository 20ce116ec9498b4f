//! Index builder
//!
//! Owns the initialization state machine: at most one build runs at a time,
//! a completed build is final, a failed build can be retried, and the
//! finished index is published with a single reference swap so queries
//! either see no index or a complete one.
//!
//! Build checkpoints (progress %):
//!
//! | Step | Progress |
//! |------|----------|
//! | hub login (when a credential is configured) | 10 |
//! | load encoder | 20 → 50 |
//! | load and deduplicate catalog | 50 → 60 |
//! | encode records in batches | 60 → 80 |
//! | publish | 80 → 100 |

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;

use crate::catalog::CatalogStore;
use crate::config::IndexConfig;
use crate::embedding::{EmbeddingProvider, VectorEngine};
use crate::error::{IndexError, Result};
use crate::index::{CatalogIndex, CatalogStats, PublishedIndex};
use crate::state::{InitStatus, InitializationState, StatusSnapshot};

/// Result of an initialization request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// A previous run completed; nothing was done
    AlreadyCompleted,
    /// Another run is in flight; this request was coalesced into it
    AlreadyRunning,
    /// A background run was started
    Started,
    /// A foreground run completed
    Completed,
    /// A foreground run failed; see the status error
    Failed,
}

impl InitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::AlreadyCompleted | Self::Started | Self::Completed)
    }
}

struct Inner {
    config: IndexConfig,
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn CatalogStore>,
    state: Mutex<InitializationState>,
    published: RwLock<Option<Arc<PublishedIndex>>>,
    runs: AtomicUsize,
}

/// Handle to the process-wide index build
///
/// Cheap to clone; every clone drives the same state machine.
#[derive(Clone)]
pub struct IndexBuilder {
    inner: Arc<Inner>,
}

impl IndexBuilder {
    pub fn new(
        config: IndexConfig,
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                provider,
                store,
                state: Mutex::new(InitializationState::new()),
                published: RwLock::new(None),
                runs: AtomicUsize::new(0),
            }),
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.inner.config
    }

    /// Start a build unless one completed or is running
    ///
    /// With `background` the build runs on a spawned task and this returns
    /// `Started` at once. Otherwise it waits for the run and reports
    /// `Completed` or `Failed`. Build errors never surface here; they are
    /// recorded in the status.
    pub async fn initialize(&self, background: bool) -> InitOutcome {
        {
            let mut state = self.inner.state.lock();
            match state.status() {
                InitStatus::Completed => return InitOutcome::AlreadyCompleted,
                InitStatus::InProgress => {
                    log::info!("Initialization already running");
                    return InitOutcome::AlreadyRunning;
                }
                InitStatus::NotStarted | InitStatus::Failed => state.begin(),
            }
        }
        let run = self.inner.runs.fetch_add(1, Ordering::SeqCst) + 1;

        // The run owns its task, so dropping a foreground caller does not
        // strand the state in `InProgress`.
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { inner.run(run).await });

        if background {
            return InitOutcome::Started;
        }

        match handle.await {
            Ok(true) => InitOutcome::Completed,
            Ok(false) => InitOutcome::Failed,
            Err(e) => {
                let msg = format!("Initialization failed: build task aborted: {e}");
                log::error!("{}", msg);
                let mut state = self.inner.state.lock();
                if state.status() == InitStatus::InProgress {
                    state.fail(msg);
                }
                InitOutcome::Failed
            }
        }
    }

    /// Boolean form of [`initialize`](Self::initialize)
    ///
    /// A coalesced request counts as success in the background and as
    /// failure in the foreground, where the caller gets no outcome to wait on.
    pub async fn request_initialization(&self, background: bool) -> bool {
        match self.initialize(background).await {
            InitOutcome::AlreadyRunning => background,
            outcome => outcome.is_success(),
        }
    }

    /// Wait until the build completes, fails or `timeout` elapses
    ///
    /// Starts a background build when none was requested yet. Only the
    /// calling task is suspended; the loop exits at the deadline.
    pub async fn wait_until_ready(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let interval = self.inner.config.poll_interval;

        loop {
            let status = self.inner.state.lock().status();
            match status {
                InitStatus::Completed => return true,
                InitStatus::Failed => return false,
                InitStatus::InProgress => {}
                InitStatus::NotStarted => {
                    log::warn!("Initialization not started, starting now...");
                    self.initialize(true).await;
                }
            }

            let now = Instant::now();
            if now >= deadline {
                log::error!(
                    "Initialization timeout after {:.1} seconds",
                    timeout.as_secs_f64()
                );
                return false;
            }
            tokio::time::sleep(interval.min(deadline - now)).await;
        }
    }

    /// Consistent copy of the current state
    pub fn status(&self) -> StatusSnapshot {
        self.inner.state.lock().snapshot()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.state.lock().status() == InitStatus::Completed
    }

    /// Currently published index, if any
    ///
    /// Read under the state lock, so an index is only handed out once the
    /// status reads `Completed`.
    pub fn published(&self) -> Option<Arc<PublishedIndex>> {
        let state = self.inner.state.lock();
        if state.status() != InitStatus::Completed {
            return None;
        }
        self.inner.published.read().clone()
    }

    /// Diagnostics for the published index; `None` while nothing is loaded
    pub fn stats(&self) -> Option<CatalogStats> {
        self.published().map(|published| published.stats())
    }

    /// Number of build runs started so far
    pub fn runs_started(&self) -> usize {
        self.inner.runs.load(Ordering::SeqCst)
    }
}

impl Inner {
    async fn run(self: Arc<Self>, run: usize) -> bool {
        let started = Instant::now();
        log::info!(
            "Starting catalog index build #{} (model: {}, source: {})",
            run,
            self.config.model_id,
            self.config.source.display()
        );

        match self.build().await {
            Ok(published) => {
                let records = published.index().len();
                // Slot and status change together under the state lock
                let mut state = self.state.lock();
                *self.published.write() = Some(Arc::new(published));
                state.complete();
                drop(state);

                log::info!(
                    "Catalog index build completed in {:.2} seconds ({} records)",
                    started.elapsed().as_secs_f64(),
                    records
                );
                true
            }
            Err(e) => {
                let msg = format!("Initialization failed: {e}");
                log::error!("{}", msg);
                self.state.lock().fail(msg);
                false
            }
        }
    }

    async fn build(self: &Arc<Self>) -> Result<PublishedIndex> {
        let model_id = self.config.model_id.clone();
        let source: PathBuf = self.config.source.clone();

        match self.config.credential() {
            Some(token) => {
                log::info!("Logging in to model hub...");
                let provider = Arc::clone(&self.provider);
                let token = token.to_string();
                blocking(move || provider.authenticate(&token)).await?;
                self.advance(10, "Logged in to model hub");
            }
            None => log::warn!("No hub credential configured. Public models only."),
        }

        log::info!("Loading model: {}", model_id);
        self.advance(20, "Loading embedding model...");
        let encoder = {
            let provider = Arc::clone(&self.provider);
            let model_id = model_id.clone();
            blocking(move || provider.load_encoder(&model_id)).await?
        };
        {
            let mut state = self.state.lock();
            state.mark_model_loaded();
            state.advance(50, "Model loaded successfully");
        }

        log::info!("Loading catalog from {}", source.display());
        self.advance(50, "Loading catalog...");
        let catalog = {
            let store = Arc::clone(&self.store);
            let source = source.clone();
            let schema = self.config.schema.clone();
            blocking(move || store.load(&source, &schema)).await?
        };
        if catalog.is_empty() {
            log::warn!("Catalog at {} has no records", source.display());
        }
        self.advance(60, format!("Catalog loaded ({} records)", catalog.len()));

        log::info!("Generating embeddings for {} records...", catalog.len());
        self.advance(60, "Generating embeddings...");
        let engine = VectorEngine::new(encoder, self.config.query_cache_size);
        let batch_size = self.config.batch_size;
        let (fields, records) = catalog.into_parts();
        let (records, vectors, engine) = {
            let inner = Arc::clone(self);
            blocking(move || {
                let texts: Vec<&str> = records.iter().map(|r| r.combined_text.as_str()).collect();
                let vectors = engine.embed_batches(&texts, batch_size, |done, total| {
                    let step = (20 * done / total.max(1)) as u8;
                    inner.advance(60 + step, format!("Generating embeddings ({done}/{total})"));
                })?;
                Ok((records, vectors, engine))
            })
            .await?
        };

        self.advance(80, "Publishing index...");
        let index = CatalogIndex::new(fields, records, vectors)?;
        if let Some(expected) = engine.dimension() {
            if !index.is_empty() && index.dimension() != expected {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    actual: index.dimension(),
                });
            }
        }
        log::info!(
            "Embeddings generated: {} x {}",
            index.len(),
            index.dimension()
        );

        Ok(PublishedIndex::new(index, engine, model_id, source))
    }

    fn advance(&self, progress: u8, message: impl Into<String>) {
        self.state.lock().advance(progress, message);
    }
}

/// Run blocking provider or store work off the async workers
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| IndexError::internal(format!("worker task failed: {e}")))?
}
