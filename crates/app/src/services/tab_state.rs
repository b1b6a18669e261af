//! Operation coordinator for a repository tab.
//!
//! Every interaction with the repository handle goes through [`TabState`]:
//! operations are serialized, failures are reported to the error sink instead
//! of reaching the UI loop, and panels learn what to reload through the
//! refresh bus.
//!
//! Bus overflow policy: both buses are bounded `tokio::sync::broadcast`
//! channels. A subscriber that falls more than `capacity` events behind loses
//! the oldest ones (drop-oldest); [`RefreshSubscription`] logs how many were
//! skipped and continues with the oldest event still buffered.

use gitpane_core::app::{OperationOutcome, RefreshPolicy};
use gitpane_core::domain::{Commit, ObjectId, RefreshType, SelectedItem, TaskEvent};
use gitpane_core::error::OperationError;
use gitpane_core::ports::{Clock, CoordinatorConfig, ErrorRecord, ErrorSink, RepositoryPort, SystemClock};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Observable busy state of a tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperationState {
    /// An operation is in flight or within its settle delay
    pub running: bool,
    /// An operation has been running longer than the processing delay
    pub processing: bool,
}

#[derive(Debug, Default)]
struct Counters {
    running: usize,
    processing: usize,
}

/// Derives [`OperationState`] from per-operation counters so overlapping
/// operations do not clear each other's flags.
struct OperationTracker {
    counters: Mutex<Counters>,
    state_tx: watch::Sender<OperationState>,
}

impl OperationTracker {
    fn new() -> Self {
        let (state_tx, _) = watch::channel(OperationState::default());
        Self {
            counters: Mutex::new(Counters::default()),
            state_tx,
        }
    }

    fn update(&self, change: impl FnOnce(&mut Counters)) {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        change(&mut counters);
        let state = OperationState {
            running: counters.running > 0,
            processing: counters.processing > 0,
        };
        self.state_tx.send_if_modified(|current| {
            let modified = *current != state;
            *current = state;
            modified
        });
    }

    /// Hold `running` until the returned guard is dropped, wherever the
    /// owning task ends up
    fn running(self: &Arc<Self>) -> RunningGuard {
        self.update(|c| c.running += 1);
        RunningGuard { tracker: self.clone() }
    }

    fn processing(&self) -> ProcessingGuard<'_> {
        self.update(|c| c.processing += 1);
        ProcessingGuard { tracker: self }
    }
}

struct RunningGuard {
    tracker: Arc<OperationTracker>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.tracker.update(|c| c.running = c.running.saturating_sub(1));
    }
}

struct ProcessingGuard<'a> {
    tracker: &'a OperationTracker,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.tracker
            .update(|c| c.processing = c.processing.saturating_sub(1));
    }
}

/// Await `work`, raising the processing flag only if it outlasts `delay`
async fn with_processing_indicator<F: Future + Unpin>(
    tracker: &OperationTracker,
    delay: Duration,
    mut work: F,
) -> F::Output {
    tokio::select! {
        biased;
        output = &mut work => output,
        _ = tokio::time::sleep(delay) => {
            let _guard = tracker.processing();
            work.await
        }
    }
}

struct TabInner {
    errors: Arc<dyn ErrorSink>,
    clock: Arc<dyn Clock>,
    config: CoordinatorConfig,
    repository: RwLock<Option<Arc<dyn RepositoryPort>>>,
    /// One repository operation at a time, FIFO
    operation_lock: tokio::sync::Mutex<()>,
    tracker: Arc<OperationTracker>,
    refresh_tx: broadcast::Sender<RefreshType>,
    task_tx: broadcast::Sender<TaskEvent>,
    selected_tx: watch::Sender<SelectedItem>,
    cancel: CancellationToken,
}

/// Coordinator of repository operations, refresh signals and selection for
/// one tab. Cheap to clone; clones share state.
///
/// The `run_*` and `select_ref` methods spawn onto the current tokio runtime
/// and must be called from within one.
#[derive(Clone)]
pub struct TabState {
    inner: Arc<TabInner>,
}

impl TabState {
    pub fn new(errors: Arc<dyn ErrorSink>, config: CoordinatorConfig) -> Self {
        Self::with_clock(errors, config, Arc::new(SystemClock))
    }

    pub fn with_clock(errors: Arc<dyn ErrorSink>, config: CoordinatorConfig, clock: Arc<dyn Clock>) -> Self {
        let (refresh_tx, _) = broadcast::channel(config.refresh_bus_capacity.max(1));
        let (task_tx, _) = broadcast::channel(config.task_bus_capacity.max(1));
        let (selected_tx, _) = watch::channel(SelectedItem::default());

        Self {
            inner: Arc::new(TabInner {
                errors,
                clock,
                config,
                repository: RwLock::new(None),
                operation_lock: tokio::sync::Mutex::new(()),
                tracker: Arc::new(OperationTracker::new()),
                refresh_tx,
                task_tx,
                selected_tx,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn attach(&self, repository: Arc<dyn RepositoryPort>) {
        info!("Attaching repository {}", repository.meta());
        *self.inner.repository.write().unwrap_or_else(PoisonError::into_inner) = Some(repository);
    }

    pub fn detach(&self) -> Option<Arc<dyn RepositoryPort>> {
        self.inner
            .repository
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn repository(&self) -> Option<Arc<dyn RepositoryPort>> {
        self.inner
            .repository
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Run `body` against the repository handle on the blocking pool.
    ///
    /// `running` is set before this returns. On completion the refresh
    /// category of `policy` is published (see [`RefreshPolicy::refresh_for`])
    /// and `running` is released after the settle delay.
    pub fn run_with_refresh<T, F>(&self, policy: RefreshPolicy, body: F) -> JoinHandle<OperationOutcome<T>>
    where
        T: Send + 'static,
        F: FnOnce(&dyn RepositoryPort) -> anyhow::Result<T> + Send + 'static,
    {
        let running = self.inner.tracker.running();
        let tab = self.clone();

        tokio::spawn(async move {
            debug!(refresh_type = %policy.refresh_type, "Operation started");
            let result = tab.execute(body).await;
            let outcome = tab.report(policy.show_error, result);

            if let Some(refresh_type) = policy.refresh_for(!outcome.is_success()) {
                tab.publish_refresh(refresh_type);
            }

            tab.release_after_settle(running);
            outcome
        })
    }

    /// Run UI-only async work with the same busy and error handling as
    /// repository operations. Never publishes a refresh and does not wait
    /// for the repository lock.
    pub fn run_without_repository<T, Fut>(&self, show_error: bool, body: Fut) -> JoinHandle<OperationOutcome<T>>
    where
        T: Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let running = self.inner.tracker.running();
        let tab = self.clone();

        tokio::spawn(async move {
            let result = tab.supervise(tokio::spawn(body)).await;
            let outcome = tab.report(show_error, result);
            drop(running);
            outcome
        })
    }

    async fn execute<T, F>(&self, body: F) -> Result<T, OperationError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn RepositoryPort) -> anyhow::Result<T> + Send + 'static,
    {
        let _permit = tokio::select! {
            biased;
            _ = self.inner.cancel.cancelled() => return Err(OperationError::Cancelled),
            permit = self.inner.operation_lock.lock() => permit,
        };

        let repository = self.repository().ok_or(OperationError::NoRepository)?;
        let handle = tokio::task::spawn_blocking(move || body(repository.as_ref()));
        self.supervise(handle).await
    }

    /// Await a spawned body, translating panics and honoring cancellation
    async fn supervise<T>(&self, mut handle: JoinHandle<anyhow::Result<T>>) -> Result<T, OperationError> {
        let delay = self.inner.config.processing_delay();

        let joined = tokio::select! {
            biased;
            _ = self.inner.cancel.cancelled() => {
                handle.abort();
                return Err(OperationError::Cancelled);
            }
            joined = with_processing_indicator(&self.inner.tracker, delay, &mut handle) => joined,
        };

        match joined {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(OperationError::from_body(error)),
            Err(join_error) if join_error.is_cancelled() => Err(OperationError::Cancelled),
            Err(join_error) => Err(OperationError::Panicked {
                message: join_error.to_string(),
            }),
        }
    }

    fn report<T>(&self, show_error: bool, result: Result<T, OperationError>) -> OperationOutcome<T> {
        match result {
            Ok(value) => {
                debug!("Operation succeeded");
                OperationOutcome::Succeeded(value)
            }
            Err(OperationError::Cancelled) => {
                debug!("Operation cancelled");
                OperationOutcome::Cancelled
            }
            Err(error) => {
                if show_error {
                    let (message, cause) = match &error {
                        OperationError::Repository { source } => (format!("{:#}", source), format!("{:?}", source)),
                        other => (other.to_string(), other.to_string()),
                    };
                    self.inner
                        .errors
                        .add_error(ErrorRecord::new(self.inner.clock.now_millis(), message, cause));
                } else {
                    warn!("Operation failed (not reported): {}", error);
                }
                OperationOutcome::Failed(error)
            }
        }
    }

    /// The file watcher can notify a change well after the operation that
    /// caused it; keep `running` set until it has had time to do so.
    fn release_after_settle(&self, running: RunningGuard) {
        let delay = self.inner.config.settle_delay();
        if delay.is_zero() {
            return;
        }

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            drop(running);
        });
    }

    /// Publish a refresh category directly. `RefreshType::None` is ignored.
    pub fn publish_refresh(&self, refresh_type: RefreshType) {
        if !refresh_type.is_publishable() {
            return;
        }
        debug!(%refresh_type, "Publishing refresh");
        // Err only means nobody is subscribed
        let _ = self.inner.refresh_tx.send(refresh_type);
    }

    /// Subscribe to refresh events in `filters`, starting from now
    pub fn filtered_refresh_stream(&self, filters: &[RefreshType]) -> RefreshSubscription {
        RefreshSubscription {
            rx: self.inner.refresh_tx.subscribe(),
            filters: filters.to_vec(),
        }
    }

    pub fn emit_task_event(&self, event: TaskEvent) {
        debug!(?event, "Emitting task event");
        let _ = self.inner.task_tx.send(event);
    }

    /// Task events emitted from now on
    pub fn subscribe_task_events(&self) -> broadcast::Receiver<TaskEvent> {
        self.inner.task_tx.subscribe()
    }

    pub fn selected_item(&self) -> watch::Receiver<SelectedItem> {
        self.inner.selected_tx.subscribe()
    }

    pub fn current_selection(&self) -> SelectedItem {
        self.inner.selected_tx.borrow().clone()
    }

    pub fn set_selection(&self, item: SelectedItem, scroll_to_item: bool) {
        self.inner.selected_tx.send_replace(item.clone());

        if scroll_to_item {
            self.emit_task_event(TaskEvent::ScrollToGraphItem(item));
        }
    }

    pub fn select_stash(&self, stash: Commit) {
        self.set_selection(SelectedItem::Stash(stash), false);
    }

    pub fn select_none(&self) {
        self.set_selection(SelectedItem::None, false);
    }

    pub fn select_uncommitted_changes(&self) {
        self.set_selection(SelectedItem::UncommittedChanges, false);
    }

    /// Select the commit `id` resolves to and scroll the log to it.
    /// `None` clears the selection without scrolling.
    pub fn select_ref(&self, id: Option<ObjectId>) -> JoinHandle<OperationOutcome<()>> {
        let Some(id) = id else {
            self.select_none();
            return tokio::spawn(async { OperationOutcome::Succeeded(()) });
        };

        let tab = self.clone();
        self.run_with_refresh(RefreshPolicy::none(), move |repository| {
            let commit = repository.resolve_commit(&id)?;
            tab.set_selection(SelectedItem::Ref(commit), true);
            Ok(())
        })
    }

    pub fn operation_state(&self) -> watch::Receiver<OperationState> {
        self.inner.tracker.state_tx.subscribe()
    }

    pub fn is_operation_running(&self) -> bool {
        self.inner.tracker.state_tx.borrow().running
    }

    pub fn is_processing(&self) -> bool {
        self.inner.tracker.state_tx.borrow().processing
    }

    /// Tear down the tab: in-flight operations resolve to `Cancelled` and
    /// queued ones never start.
    pub fn close(&self) {
        info!("Closing tab");
        self.inner.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Completes once the tab is closed
    pub async fn closed(&self) {
        self.inner.cancel.cancelled().await
    }
}

/// Refresh events limited to a set of categories.
///
/// Each subscription is independent; a new one only sees events published
/// after it was created.
pub struct RefreshSubscription {
    rx: broadcast::Receiver<RefreshType>,
    filters: Vec<RefreshType>,
}

impl RefreshSubscription {
    /// Next matching event, `None` once the tab is dropped
    pub async fn recv(&mut self) -> Option<RefreshType> {
        loop {
            match self.rx.recv().await {
                Ok(refresh_type) => {
                    if self.accept(refresh_type) {
                        return Some(refresh_type);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Refresh subscriber lagged, oldest events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-published matching event without waiting
    pub fn try_recv(&mut self) -> Option<RefreshType> {
        loop {
            match self.rx.try_recv() {
                Ok(refresh_type) => {
                    if self.accept(refresh_type) {
                        return Some(refresh_type);
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Refresh subscriber lagged, oldest events dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn filters(&self) -> &[RefreshType] {
        &self.filters
    }

    fn accept(&self, refresh_type: RefreshType) -> bool {
        trace!(filters = ?self.filters, %refresh_type, "Filtering refresh");
        refresh_type.matches(&self.filters)
    }
}
