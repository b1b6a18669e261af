//! Integration tests for the operation coordinator

use anyhow::{anyhow, Result};
use gitpane_app::adapters::git::Git2Repository;
use gitpane_app::services::errors_manager::ErrorsManager;
use gitpane_app::services::tab_state::TabState;
use gitpane_core::app::{OperationOutcome, RefreshPolicy};
use gitpane_core::domain::{
    Author, Commit, DiffTarget, FileChange, ObjectId, RefreshType, RepoMeta, RepoState, SelectedItem, TaskEvent,
    Timestamp,
};
use gitpane_core::error::OperationError;
use gitpane_core::ports::{CoordinatorConfig, FixedClock, RepositoryPort};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast::error::TryRecvError;

const HEAD_ID: &str = "1111111111111111111111111111111111111111";

fn commit(id: &str, summary: &str) -> Commit {
    Commit {
        id: ObjectId::parse(id).unwrap(),
        author: Author {
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
        },
        summary: summary.to_string(),
        message: format!("{}\n", summary),
        timestamp: Timestamp::new(1_700_000_000, 0),
        parent_ids: vec![],
    }
}

/// In-memory repository with a single commit
struct MockRepository {
    commits: Vec<Commit>,
    calls: Mutex<Vec<String>>,
}

impl MockRepository {
    fn new() -> Self {
        Self {
            commits: vec![commit(HEAD_ID, "Initial commit")],
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

impl RepositoryPort for MockRepository {
    fn meta(&self) -> RepoMeta {
        RepoMeta::from_path(&PathBuf::from("/mock/repo"))
    }

    fn resolve_commit(&self, id: &ObjectId) -> Result<Commit> {
        self.commits
            .iter()
            .find(|c| c.id.as_str().starts_with(id.as_str()))
            .cloned()
            .ok_or_else(|| OperationError::NotFound { id: id.to_string() }.into())
    }

    fn log(&self, limit: usize) -> Result<Vec<Commit>> {
        Ok(self.commits.iter().take(limit).cloned().collect())
    }

    fn stashes(&self) -> Result<Vec<Commit>> {
        Ok(vec![])
    }

    fn current_branch(&self) -> Result<Option<String>> {
        Ok(Some("main".to_string()))
    }

    fn state(&self) -> Result<RepoState> {
        Ok(RepoState::Clean)
    }

    fn uncommitted_changes(&self) -> Result<Vec<FileChange>> {
        Ok(vec![])
    }

    fn diff_lines(&self, _target: &DiffTarget, _context_lines: u32) -> Result<Vec<String>> {
        Ok(vec![])
    }

    fn remotes(&self) -> Result<Vec<String>> {
        Ok(vec![])
    }

    fn submodules(&self) -> Result<Vec<String>> {
        Ok(vec![])
    }

    fn stage_all(&self) -> Result<()> {
        self.record("stage_all");
        Ok(())
    }

    fn unstage_all(&self) -> Result<()> {
        self.record("unstage_all");
        Ok(())
    }

    fn commit(&self, _message: &str) -> Result<ObjectId> {
        self.record("commit");
        Ok(self.commits[0].id.clone())
    }

    fn checkout(&self, _branch: &str) -> Result<()> {
        Err(anyhow!("checkout is not supported"))
    }

    fn create_branch(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    fn stash_save(&self, _message: Option<&str>) -> Result<ObjectId> {
        Err(anyhow!("No local changes to save"))
    }

    fn stash_pop(&self, _index: usize) -> Result<()> {
        Ok(())
    }

    fn stash_drop(&self, _index: usize) -> Result<()> {
        Ok(())
    }

    fn fetch(&self, _remote: &str, _prune: bool) -> Result<()> {
        Ok(())
    }
}

fn new_tab(config: CoordinatorConfig) -> (TabState, Arc<ErrorsManager>) {
    let errors = Arc::new(ErrorsManager::new());
    let tab = TabState::with_clock(errors.clone(), config, Arc::new(FixedClock(42)));
    (tab, errors)
}

fn attached_tab() -> (TabState, Arc<ErrorsManager>) {
    let (tab, errors) = new_tab(CoordinatorConfig::default());
    tab.attach(Arc::new(MockRepository::new()));
    (tab, errors)
}

#[tokio::test]
async fn test_refresh_none_never_publishes() -> Result<()> {
    let (tab, errors) = attached_tab();
    let mut all = tab.filtered_refresh_stream(&RefreshType::ALL);

    let ok = tab.run_with_refresh(RefreshPolicy::none(), |_| Ok(())).await?;
    let failed = tab
        .run_with_refresh(RefreshPolicy::none().refresh_even_if_crashes(), |_| -> Result<()> {
            Err(anyhow!("boom"))
        })
        .await?;

    assert!(ok.is_success());
    assert!(failed.is_failure());
    assert_eq!(all.try_recv(), None);
    assert_eq!(errors.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_successful_operation_publishes_its_refresh() -> Result<()> {
    let (tab, _errors) = attached_tab();
    let mut all = tab.filtered_refresh_stream(&RefreshType::ALL);

    let outcome = tab
        .run_with_refresh(RefreshPolicy::new(RefreshType::UncommittedChanges), |repo| repo.stage_all())
        .await?;

    assert!(outcome.is_success());
    assert_eq!(all.try_recv(), Some(RefreshType::UncommittedChanges));
    assert_eq!(all.try_recv(), None);
    Ok(())
}

#[tokio::test]
async fn test_failed_operation_refreshes_only_when_requested() -> Result<()> {
    let (tab, errors) = attached_tab();
    let mut all = tab.filtered_refresh_stream(&RefreshType::ALL);

    let outcome = tab
        .run_with_refresh(RefreshPolicy::new(RefreshType::Stashes), |repo| repo.stash_save(None))
        .await?;
    assert!(outcome.is_failure());
    assert_eq!(all.try_recv(), None);

    let outcome = tab
        .run_with_refresh(
            RefreshPolicy::new(RefreshType::Stashes).refresh_even_if_crashes(),
            |repo| repo.stash_save(None),
        )
        .await?;
    assert!(outcome.is_failure());
    assert_eq!(all.try_recv(), Some(RefreshType::Stashes));

    let reported = errors.drain();
    assert_eq!(reported.len(), 2);
    assert_eq!(reported[0].message, "No local changes to save");
    assert_eq!(reported[0].timestamp_millis, 42);
    Ok(())
}

#[tokio::test]
async fn test_silent_failures_are_not_reported() -> Result<()> {
    let (tab, errors) = attached_tab();

    let outcome = tab
        .run_with_refresh(RefreshPolicy::new(RefreshType::AllData).silent(), |repo| {
            repo.checkout("missing")
        })
        .await?;

    assert!(outcome.is_failure());
    assert!(errors.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_no_repository_is_a_distinct_failure() -> Result<()> {
    let (tab, errors) = new_tab(CoordinatorConfig::default());
    let mut all = tab.filtered_refresh_stream(&RefreshType::ALL);

    let outcome = tab
        .run_with_refresh(RefreshPolicy::new(RefreshType::OnlyLog), |_| Ok(()))
        .await?;

    assert!(matches!(outcome, OperationOutcome::Failed(OperationError::NoRepository)));
    assert_eq!(all.try_recv(), None);
    assert_eq!(
        errors.latest().map(|e| e.message),
        Some("No repository is attached".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn test_reported_message_keeps_root_cause() -> Result<()> {
    let dir = TempDir::new()?;
    git2::Repository::init(dir.path())?;
    let (tab, errors) = new_tab(CoordinatorConfig::default());
    tab.attach(Arc::new(Git2Repository::open(dir.path())?));

    let outcome = tab
        .run_with_refresh(RefreshPolicy::new(RefreshType::Stashes), |repo| repo.stash_drop(0))
        .await?;
    assert!(outcome.is_failure());

    let message = errors.latest().map(|e| e.message).unwrap_or_default();
    assert!(message.starts_with("Failed to drop stash@{0}: "), "got {:?}", message);
    assert!(message.len() > "Failed to drop stash@{0}: ".len());
    Ok(())
}

#[tokio::test]
async fn test_detach_leaves_no_repository() -> Result<()> {
    let (tab, _errors) = attached_tab();
    assert!(tab.repository().is_some());

    assert!(tab.detach().is_some());
    assert!(tab.repository().is_none());

    let outcome = tab.run_with_refresh(RefreshPolicy::none(), |_| Ok(())).await?;
    assert!(matches!(outcome, OperationOutcome::Failed(OperationError::NoRepository)));
    Ok(())
}

#[tokio::test]
async fn test_panicking_body_becomes_failure() -> Result<()> {
    let (tab, errors) = attached_tab();

    let outcome = tab
        .run_with_refresh(RefreshPolicy::none(), |_| -> Result<()> { panic!("body exploded") })
        .await?;

    assert!(matches!(outcome, OperationOutcome::Failed(OperationError::Panicked { .. })));
    assert_eq!(errors.len(), 1);
    assert!(!tab.is_processing());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_aborted_operation_releases_running() -> Result<()> {
    let (tab, _errors) = attached_tab();

    let ui_work = tab.run_without_repository(true, async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        Ok(())
    });
    assert!(tab.is_operation_running());
    ui_work.abort();
    assert!(ui_work.await.is_err_and(|e| e.is_cancelled()));
    assert!(!tab.is_operation_running());

    let (release, released) = std::sync::mpsc::channel::<()>();
    let (started_tx, started) = tokio::sync::oneshot::channel::<()>();
    let repo_work = tab.run_with_refresh(RefreshPolicy::new(RefreshType::OnlyLog), move |_| {
        let _ = started_tx.send(());
        let _ = released.recv();
        Ok(())
    });
    started.await?;
    repo_work.abort();
    assert!(repo_work.await.is_err_and(|e| e.is_cancelled()));
    assert!(!tab.is_operation_running());

    // The detached body finishing later must not touch the flag
    let _ = release.send(());
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(!tab.is_operation_running());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_running_holds_through_settle_delay() -> Result<()> {
    let (tab, _errors) = attached_tab();
    let mut state = tab.operation_state();
    assert!(!tab.is_operation_running());

    let handle = tab.run_with_refresh(RefreshPolicy::new(RefreshType::UncommittedChanges), |repo| {
        repo.stage_all()
    });
    assert!(tab.is_operation_running());

    assert!(handle.await?.is_success());
    assert!(tab.is_operation_running());

    tokio::time::advance(Duration::from_millis(499)).await;
    tokio::task::yield_now().await;
    assert!(tab.is_operation_running());

    tokio::time::advance(Duration::from_millis(2)).await;
    state.wait_for(|s| !s.running).await?;
    assert!(!tab.is_operation_running());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_processing_is_debounced() -> Result<()> {
    let (tab, _errors) = attached_tab();

    // Short work never shows the indicator
    let quick = tab.run_without_repository(true, async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(())
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!tab.is_processing());
    assert!(quick.await?.is_success());
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!tab.is_processing());

    // Long work shows it once past the delay
    let (release, released) = tokio::sync::oneshot::channel::<()>();
    let slow = tab.run_without_repository(true, async move {
        let _ = released.await;
        Ok(())
    });

    tokio::time::sleep(Duration::from_millis(299)).await;
    assert!(!tab.is_processing());
    tokio::time::sleep(Duration::from_millis(2)).await;
    assert!(tab.is_processing());

    let _ = release.send(());
    assert!(slow.await?.is_success());
    assert!(!tab.is_processing());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_blocking_body_raises_processing() -> Result<()> {
    let (tab, _errors) = attached_tab();
    let mut state = tab.operation_state();
    let (release, released) = std::sync::mpsc::channel::<()>();
    let (started_tx, started) = tokio::sync::oneshot::channel::<()>();

    let handle = tab.run_with_refresh(RefreshPolicy::none(), move |_| {
        let _ = started_tx.send(());
        let _ = released.recv();
        Ok(())
    });

    started.await?;
    tokio::time::advance(Duration::from_millis(299)).await;
    tokio::task::yield_now().await;
    assert!(!tab.is_processing());

    tokio::time::advance(Duration::from_millis(2)).await;
    state.wait_for(|s| s.processing).await?;

    release.send(())?;
    assert!(handle.await?.is_success());
    assert!(!tab.is_processing());
    Ok(())
}

#[tokio::test]
async fn test_without_repository_never_refreshes() -> Result<()> {
    let (tab, errors) = new_tab(CoordinatorConfig::default());
    let mut all = tab.filtered_refresh_stream(&RefreshType::ALL);

    let outcome = tab
        .run_without_repository(true, async { Err::<(), _>(anyhow!("dialog failed")) })
        .await?;

    assert!(outcome.is_failure());
    assert_eq!(all.try_recv(), None);
    assert_eq!(errors.len(), 1);
    // Ends immediately, no settle delay
    assert!(!tab.is_operation_running());
    Ok(())
}

#[tokio::test]
async fn test_select_ref_none_clears_without_scroll() -> Result<()> {
    let (tab, _errors) = attached_tab();
    let mut tasks = tab.subscribe_task_events();

    assert!(tab.select_ref(None).await?.is_success());

    assert_eq!(tab.current_selection(), SelectedItem::None);
    assert_eq!(tasks.try_recv(), Err(TryRecvError::Empty));
    Ok(())
}

#[tokio::test]
async fn test_select_ref_scrolls_to_resolved_commit() -> Result<()> {
    let (tab, _errors) = attached_tab();
    let mut tasks = tab.subscribe_task_events();
    let selection = tab.selected_item();

    let outcome = tab.select_ref(Some(ObjectId::parse("1111111")?)).await?;
    assert!(outcome.is_success());

    let expected = SelectedItem::Ref(commit(HEAD_ID, "Initial commit"));
    assert_eq!(*selection.borrow(), expected);
    assert_eq!(tasks.try_recv(), Ok(TaskEvent::ScrollToGraphItem(expected)));
    Ok(())
}

#[tokio::test]
async fn test_select_ref_missing_commit_is_reported() -> Result<()> {
    let (tab, errors) = attached_tab();
    let mut all = tab.filtered_refresh_stream(&RefreshType::ALL);
    let mut tasks = tab.subscribe_task_events();

    let outcome = tab.select_ref(Some(ObjectId::parse("deadbeef")?)).await?;

    assert!(matches!(outcome, OperationOutcome::Failed(OperationError::NotFound { .. })));
    assert_eq!(tab.current_selection(), SelectedItem::UncommittedChanges);
    assert_eq!(tasks.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(all.try_recv(), None);
    assert_eq!(
        errors.latest().map(|e| e.message),
        Some("Object not found: deadbeef".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn test_select_stash_does_not_scroll() {
    let (tab, _errors) = attached_tab();
    let mut tasks = tab.subscribe_task_events();
    let stash = commit("2222222222222222222222222222222222222222", "WIP on main");

    tab.select_stash(stash.clone());

    assert_eq!(tab.current_selection(), SelectedItem::Stash(stash));
    assert_eq!(tasks.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn test_filtered_stream_only_sees_its_categories() {
    let (tab, _errors) = attached_tab();
    let mut sub = tab.filtered_refresh_stream(&[RefreshType::Stashes, RefreshType::Remotes]);

    tab.publish_refresh(RefreshType::OnlyLog);
    tab.publish_refresh(RefreshType::Stashes);
    tab.publish_refresh(RefreshType::AllData);
    tab.publish_refresh(RefreshType::Remotes);

    assert_eq!(sub.recv().await, Some(RefreshType::Stashes));
    assert_eq!(sub.recv().await, Some(RefreshType::Remotes));
    assert_eq!(sub.try_recv(), None);
}

#[tokio::test]
async fn test_subscribers_are_independent() {
    let (tab, _errors) = attached_tab();
    let mut first = tab.filtered_refresh_stream(&[RefreshType::OnlyLog]);
    tab.publish_refresh(RefreshType::OnlyLog);
    let mut late = tab.filtered_refresh_stream(&[RefreshType::OnlyLog]);

    assert_eq!(first.try_recv(), Some(RefreshType::OnlyLog));
    assert_eq!(late.try_recv(), None);
}

#[tokio::test]
async fn test_lagging_subscriber_drops_oldest() {
    let config = CoordinatorConfig {
        refresh_bus_capacity: 2,
        ..CoordinatorConfig::default()
    };
    let (tab, _errors) = new_tab(config);
    let mut sub = tab.filtered_refresh_stream(&RefreshType::ALL);

    tab.publish_refresh(RefreshType::OnlyLog);
    tab.publish_refresh(RefreshType::Stashes);
    tab.publish_refresh(RefreshType::Remotes);

    assert_eq!(sub.recv().await, Some(RefreshType::Stashes));
    assert_eq!(sub.recv().await, Some(RefreshType::Remotes));
    assert_eq!(sub.try_recv(), None);
}

#[tokio::test]
async fn test_task_events_are_not_replayed() {
    let (tab, _errors) = attached_tab();

    tab.emit_task_event(TaskEvent::ScrollToGraphItem(SelectedItem::None));
    let mut late = tab.subscribe_task_events();
    assert_eq!(late.try_recv(), Err(TryRecvError::Empty));

    tab.emit_task_event(TaskEvent::ScrollToGraphItem(SelectedItem::UncommittedChanges));
    assert_eq!(
        late.try_recv(),
        Ok(TaskEvent::ScrollToGraphItem(SelectedItem::UncommittedChanges))
    );
    assert_eq!(late.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn test_operations_run_one_at_a_time_in_order() -> Result<()> {
    let (tab, _errors) = attached_tab();
    let order = Arc::new(Mutex::new(Vec::new()));
    let active = Arc::new(Mutex::new((0usize, 0usize))); // (current, max)

    let handles: Vec<_> = (0..3)
        .map(|i| {
            let order = order.clone();
            let active = active.clone();
            tab.run_with_refresh(RefreshPolicy::none(), move |_| {
                {
                    let mut a = active.lock().unwrap();
                    a.0 += 1;
                    a.1 = a.1.max(a.0);
                }
                std::thread::sleep(Duration::from_millis(20));
                order.lock().unwrap().push(i);
                active.lock().unwrap().0 -= 1;
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await?.is_success());
    }

    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    assert_eq!(active.lock().unwrap().1, 1);
    Ok(())
}

#[tokio::test]
async fn test_close_cancels_without_reporting() -> Result<()> {
    let (tab, errors) = attached_tab();
    let mut all = tab.filtered_refresh_stream(&RefreshType::ALL);
    let (release, released) = std::sync::mpsc::channel::<()>();

    let in_flight = tab.run_with_refresh(
        RefreshPolicy::new(RefreshType::AllData).refresh_even_if_crashes(),
        move |_| {
            let _ = released.recv();
            Ok(())
        },
    );
    tokio::time::sleep(Duration::from_millis(20)).await;

    tab.close();
    assert!(tab.is_closed());
    assert!(in_flight.await?.is_cancelled());

    // Queued after close: never starts
    let queued = tab.run_with_refresh(RefreshPolicy::new(RefreshType::OnlyLog), |repo| repo.stage_all());
    assert!(queued.await?.is_cancelled());

    let _ = release.send(());
    assert!(errors.is_empty());
    // Cancellation counts as a failure for the refresh policy
    assert_eq!(all.try_recv(), Some(RefreshType::AllData));
    assert_eq!(all.try_recv(), None);
    Ok(())
}
