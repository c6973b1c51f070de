// ai
//! 🎬 *[a user changes the URL. then changes it again. then a third time.]*
//! 🎬 *[three requests race across the network. only one may reach the screen.]*
//! 🎬 *[the slow one arrives last, dusty and proud. the pipeline checks its ticket. denied.]* 🦆
//!
//! 🚦 The pipeline coordinator: fetch → normalize → search → sort → publish.
//!
//! ```text
//!   load(request) ──► attempt #n ──► Loading ──► fetch / override
//!                                                   │
//!                           wait out min_loading ◄──┘
//!                                   │
//!                  token still n? ──┼── yes ──► format ──► Ready / Failed
//!                                   └── no  ──► 🗑️ dropped, logged
//!
//!   set_search / set_sort ──► re-curate the fetched set, no network
//! ```
//!
//! 🧠 Knowledge graph:
//! - Attempt token: bumped under the state lock, checked under the same lock
//!   before anything is applied. Latest attempt wins, always.
//! - Hooks never run under the state lock. Curation works on a copy and only
//!   publishes if the state's revision hasn't moved in the meantime.
//! - Snapshots go out over a `tokio::sync::watch` channel. Renderers subscribe
//!   and read the latest; nobody gets a backlog.
//! - Failures keep the previous records on screen. No retry, the user can `reload()`.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, trace, warn};

use crate::errors::SourceError;
use crate::headers::HeaderConfig;
use crate::normalize::normalize_records;
use crate::record::{RawRecord, Record};
use crate::search::{self, SearchParams};
use crate::sort::{self, SortParams};
use crate::sources::{SourceAdapter, SourceBackend, SourceConfig, Transport};

/// 📦 Everything that decides *what* gets fetched. Two equal requests fetch once.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FetchRequest {
    pub source: SourceConfig,
    pub headers: HeaderConfig,
    /// 🎭 Rows handed in directly. Skips the network, still goes through formatting.
    pub data_override: Option<Vec<RawRecord>>,
    /// ⏳ Loading never finishes faster than this, measured from the start of the attempt.
    pub min_loading: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// 📸 What a renderer sees. `records` is already searched and sorted.
#[derive(Debug, Clone, Default)]
pub struct PipelineSnapshot {
    pub status: FetchStatus,
    pub records: Arc<Vec<Record>>,
    /// 💬 User-facing message of the last failed attempt.
    pub error: Option<String>,
    /// 🔒 The last attempt failed because the source rejected our credentials.
    pub auth_failed: bool,
}

impl PipelineSnapshot {
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }
}

pub type FormatHook = Arc<dyn Fn(Vec<RawRecord>) -> Vec<Record> + Send + Sync>;
pub type SearchHook = Arc<dyn Fn(&[Record], &SearchParams) -> Vec<Record> + Send + Sync>;
pub type SortHook = Arc<dyn Fn(Vec<Record>, &SortParams) -> Vec<Record> + Send + Sync>;

/// 🪝 Caller-supplied replacements for the built-in stages.
///
/// - `format` replaces normalization entirely.
/// - `search` replaces fuzzy search, and only runs for an active search.
/// - `sort` replaces the sorter and runs on every curation, enabled or not.
#[derive(Clone, Default)]
pub struct PipelineHooks {
    pub format: Option<FormatHook>,
    pub search: Option<SearchHook>,
    pub sort: Option<SortHook>,
}

impl fmt::Debug for PipelineHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineHooks")
            .field("format", &self.format.is_some())
            .field("search", &self.search.is_some())
            .field("sort", &self.sort.is_some())
            .finish()
    }
}

/// 🔍🔄 Search, then sort. Pure: same inputs, same output, nothing touched.
pub fn curate(
    records: &[Record],
    search_params: &SearchParams,
    sort_params: &SortParams,
    hooks: &PipelineHooks,
) -> Vec<Record> {
    let searched = match &hooks.search {
        Some(hook) if search_params.is_active() => hook(records, search_params),
        _ => search::search(records, search_params),
    };
    match &hooks.sort {
        Some(hook) => hook(searched, sort_params),
        None => sort::sort(searched, sort_params),
    }
}

#[derive(Debug, Default)]
struct PipelineState {
    generation: u64,
    request: Option<FetchRequest>,
    /// 🗄️ Formatted rows from the last successful attempt, before search and sort.
    fetched: Arc<Vec<Record>>,
    search: SearchParams,
    sort: SortParams,
    status: FetchStatus,
    error: Option<String>,
    auth_failed: bool,
    /// Bumped on every change that should reach the screen.
    revision: u64,
}

impl PipelineState {
    fn changed(&mut self) -> Curation {
        self.revision += 1;
        Curation {
            revision: self.revision,
            status: self.status,
            error: self.error.clone(),
            auth_failed: self.auth_failed,
            fetched: Arc::clone(&self.fetched),
            search: self.search.clone(),
            sort: self.sort.clone(),
        }
    }
}

/// 📋 A copy of what `curate` needs, so hooks run without the state lock.
struct Curation {
    revision: u64,
    status: FetchStatus,
    error: Option<String>,
    auth_failed: bool,
    fetched: Arc<Vec<Record>>,
    search: SearchParams,
    sort: SortParams,
}

#[derive(Debug)]
struct PipelineInner {
    transport: Transport,
    hooks: PipelineHooks,
    state: Mutex<PipelineState>,
    snapshots: watch::Sender<PipelineSnapshot>,
}

/// 🚦 The coordinator. Clone it freely, every clone drives the same state.
#[derive(Debug, Clone)]
pub struct Pipeline {
    inner: Arc<PipelineInner>,
}

impl Pipeline {
    pub fn new(transport: Transport, hooks: PipelineHooks) -> Self {
        let (snapshots, _) = watch::channel(PipelineSnapshot::default());
        Self {
            inner: Arc::new(PipelineInner {
                transport,
                hooks,
                state: Mutex::new(PipelineState::default()),
                snapshots,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.inner.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.inner.snapshots.borrow().clone()
    }

    /// 🚀 Start an attempt for `request`, unless it's the one we already have.
    ///
    /// Returns the background task when the attempt has to wait on the network
    /// or the minimum loading duration. `None` means the outcome is already
    /// published (or nothing changed). Spawning needs a tokio runtime.
    pub fn load(&self, request: FetchRequest) -> Option<JoinHandle<()>> {
        if self.lock().request.as_ref() == Some(&request) {
            debug!("🔁 Same request as last time, nothing to fetch");
            return None;
        }
        self.start_attempt(request)
    }

    /// 🔄 Same request, fresh attempt. No-op before the first `load`.
    pub fn reload(&self) -> Option<JoinHandle<()>> {
        let request = self.lock().request.clone()?;
        self.start_attempt(request)
    }

    /// 🔍 New search params. Re-curates what we have, never re-fetches.
    pub fn set_search(&self, params: SearchParams) {
        let curation = {
            let mut state = self.lock();
            state.search = params;
            state.changed()
        };
        self.publish(curation);
    }

    /// 🔄 New sort params. Same deal as search.
    pub fn set_sort(&self, params: SortParams) {
        let curation = {
            let mut state = self.lock();
            state.sort = params;
            state.changed()
        };
        self.publish(curation);
    }

    fn lock(&self) -> MutexGuard<'_, PipelineState> {
        // -- a panic elsewhere doesn't make the last published state wrong
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn start_attempt(&self, request: FetchRequest) -> Option<JoinHandle<()>> {
        let started = Instant::now();
        let mut state = self.lock();
        state.generation += 1;
        let token = state.generation;
        state.request = Some(request.clone());
        state.error = None;
        state.auth_failed = false;

        let url = request.source.resolve_url().map(str::to_string);
        debug!(
            attempt = token,
            source = request.source.title(),
            url = url.as_deref().unwrap_or("<unresolved>"),
            "🚦 Starting fetch attempt"
        );

        if url.is_none() && request.data_override.is_none() {
            state.fetched = Arc::new(Vec::new());
            state.status = FetchStatus::Idle;
            let curation = state.changed();
            drop(state);
            self.publish(curation);
            return None;
        }

        if request.min_loading.is_zero() {
            if let Some(rows) = request.data_override.clone() {
                // -- 🪝 hooks never run under the lock
                drop(state);
                let records = self.format(rows);
                self.apply(token, Ok(records));
                return None;
            }
        }

        state.status = FetchStatus::Loading;
        let curation = state.changed();
        drop(state);
        self.publish(curation);

        let pipeline = self.clone();
        Some(tokio::spawn(async move {
            pipeline.run_attempt(token, request, url, started).await;
        }))
    }

    async fn run_attempt(
        self,
        token: u64,
        request: FetchRequest,
        url: Option<String>,
        started: Instant,
    ) {
        let outcome: Result<Vec<RawRecord>, SourceError> = match (request.data_override, url) {
            (Some(rows), _) => Ok(rows),
            (None, Some(url)) => {
                let backend = SourceBackend::from_config(&request.source);
                backend
                    .fetch_and_parse(&self.inner.transport, &url, &request.headers.merged())
                    .await
            }
            (None, None) => Ok(Vec::new()),
        };

        if let Some(remaining) = request.min_loading.checked_sub(started.elapsed()) {
            trace!(attempt = token, ?remaining, "⏳ Holding the loading state");
            tokio::time::sleep(remaining).await;
        }

        let formatted = outcome.map(|rows| {
            trace!(attempt = token, rows = rows.len(), "📦 Rows fetched");
            self.format(rows)
        });
        self.apply(token, formatted);
    }

    /// ✅ Land an attempt's outcome, unless a newer attempt owns the screen.
    fn apply(&self, token: u64, outcome: Result<Vec<Record>, SourceError>) {
        let mut state = self.lock();
        if state.generation != token {
            warn!(
                attempt = token,
                current = state.generation,
                "🗑️ Dropping a stale result, a newer attempt owns the screen"
            );
            return;
        }

        match outcome {
            Ok(records) => {
                debug!(attempt = token, records = records.len(), "✅ Fetch attempt ready");
                state.fetched = Arc::new(records);
                state.status = FetchStatus::Ready;
            }
            Err(err) => {
                error!(attempt = token, error = %err, "💀 Fetch attempt failed");
                state.status = FetchStatus::Failed;
                state.auth_failed = err.is_authentication();
                state.error = Some(err.to_string());
            }
        }
        let curation = state.changed();
        drop(state);
        self.publish(curation);
    }

    fn format(&self, rows: Vec<RawRecord>) -> Vec<Record> {
        match &self.inner.hooks.format {
            Some(hook) => hook(rows),
            None => normalize_records(rows),
        }
    }

    /// 📸 Curate outside the lock, then send only if no newer change slipped in.
    /// A newer change publishes its own snapshot.
    fn publish(&self, curation: Curation) {
        let records = curate(
            &curation.fetched,
            &curation.search,
            &curation.sort,
            &self.inner.hooks,
        );

        let state = self.lock();
        if state.revision != curation.revision {
            trace!(
                revision = curation.revision,
                current = state.revision,
                "⏭️ Skipping an outdated snapshot"
            );
            return;
        }
        self.inner.snapshots.send_replace(PipelineSnapshot {
            status: curation.status,
            records: Arc::new(records),
            error: curation.error,
            auth_failed: curation.auth_failed,
        });
    }
}
