use anyhow::{bail, Result};
use gitpane_core::app::{Command, OperationOutcome, RefreshPolicy};
use gitpane_core::domain::{DiffTarget, Event, RefreshType, SelectedItem};
use gitpane_core::ports::{RepositoryPort, UiConfig};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

use super::tab_state::{RefreshSubscription, TabState};

/// Independently refreshed data panels of a tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Log,
    Stashes,
    Status,
    RepoState,
    Remotes,
    Submodules,
}

impl Panel {
    pub const ALL: [Panel; 6] = [
        Panel::Log,
        Panel::Stashes,
        Panel::Status,
        Panel::RepoState,
        Panel::Remotes,
        Panel::Submodules,
    ];

    /// Refresh categories that make this panel stale
    pub fn filters(self) -> &'static [RefreshType] {
        match self {
            Panel::Log => &[
                RefreshType::AllData,
                RefreshType::OnlyLog,
                RefreshType::UncommittedChangesAndLog,
            ],
            Panel::Stashes => &[
                RefreshType::AllData,
                RefreshType::Stashes,
                RefreshType::UncommittedChangesAndLog,
            ],
            Panel::Status => &[
                RefreshType::AllData,
                RefreshType::UncommittedChanges,
                RefreshType::UncommittedChangesAndLog,
            ],
            Panel::RepoState => &[RefreshType::AllData, RefreshType::RepoState],
            Panel::Remotes => &[RefreshType::AllData, RefreshType::Remotes],
            Panel::Submodules => &[RefreshType::AllData, RefreshType::Submodules],
        }
    }

    /// Read this panel's data from the repository
    pub fn load(self, repository: &dyn RepositoryPort, ui: &UiConfig) -> Result<Vec<Event>> {
        let events = match self {
            Panel::Log => vec![
                Event::BranchLoaded {
                    branch: repository.current_branch()?,
                },
                Event::LogLoaded {
                    commits: repository.log(ui.log_limit)?,
                },
            ],
            Panel::Stashes => vec![Event::StashesLoaded {
                stashes: repository.stashes()?,
            }],
            Panel::Status => vec![Event::ChangesLoaded {
                changes: repository.uncommitted_changes()?,
            }],
            Panel::RepoState => vec![Event::RepoStateLoaded {
                state: repository.state()?,
            }],
            Panel::Remotes => vec![Event::RemotesLoaded {
                remotes: repository.remotes()?,
            }],
            Panel::Submodules => vec![Event::SubmodulesLoaded {
                submodules: repository.submodules()?,
            }],
        };
        Ok(events)
    }
}

/// Refresh categories after which an uncommitted-changes diff is stale
const DIFF_FILTERS: [RefreshType; 3] = [
    RefreshType::AllData,
    RefreshType::UncommittedChanges,
    RefreshType::UncommittedChangesAndLog,
];

/// Diff shown for a selection when none was requested explicitly
pub fn diff_target_for(selection: &SelectedItem) -> Option<DiffTarget> {
    match selection {
        SelectedItem::None => None,
        SelectedItem::UncommittedChanges => Some(DiffTarget::UncommittedChanges {
            path: None,
            staged: false,
        }),
        SelectedItem::Ref(commit) | SelectedItem::Stash(commit) => Some(DiffTarget::Commit {
            id: commit.id.clone(),
        }),
    }
}

/// Maps UI commands onto coordinated operations and keeps the panels fed.
///
/// Panel data reaches the UI as [`Event`]s on the receiver returned by
/// [`AppService::new`].
pub struct AppService {
    tab: TabState,
    ui: UiConfig,

    // Event bus to the UI
    event_tx: mpsc::UnboundedSender<Event>,

    /// What the diff panel shows, reloaded on uncommitted-changes refreshes
    diff_target: Arc<Mutex<Option<DiffTarget>>>,

    // Background watchers
    tasks: JoinSet<()>,
}

impl AppService {
    pub fn new(tab: TabState, ui: UiConfig) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let initial_target = diff_target_for(&tab.current_selection());

        let service = Self {
            tab,
            ui,
            event_tx,
            diff_target: Arc::new(Mutex::new(initial_target)),
            tasks: JoinSet::new(),
        };

        (service, event_rx)
    }

    pub fn tab(&self) -> &TabState {
        &self.tab
    }

    /// Start the panel watchers and trigger the initial load
    pub fn start(&mut self) {
        info!("Starting AppService");

        for panel in Panel::ALL {
            self.spawn_panel_watcher(panel);
        }
        self.spawn_diff_watcher();

        self.tab.publish_refresh(RefreshType::AllData);
    }

    /// Handle a command. Returns the handle of the operation it started, if any.
    pub fn handle_command(&mut self, cmd: Command) -> Option<JoinHandle<OperationOutcome<()>>> {
        debug!("Handling command: {:?}", cmd);
        let tab = &self.tab;

        let handle = match cmd {
            Command::StageAll => {
                tab.run_with_refresh(RefreshPolicy::new(RefreshType::UncommittedChanges), |repo| repo.stage_all())
            }
            Command::UnstageAll => {
                tab.run_with_refresh(RefreshPolicy::new(RefreshType::UncommittedChanges), |repo| repo.unstage_all())
            }
            Command::Commit { message } => {
                tab.run_with_refresh(RefreshPolicy::new(RefreshType::UncommittedChangesAndLog), move |repo| {
                    if message.trim().is_empty() {
                        bail!("Commit message is empty");
                    }
                    let id = repo.commit(&message)?;
                    info!("Created commit {}", id.short(8));
                    Ok(())
                })
            }
            Command::Checkout { branch } => {
                tab.run_with_refresh(RefreshPolicy::new(RefreshType::AllData), move |repo| repo.checkout(&branch))
            }
            Command::CreateBranch { name } => {
                tab.run_with_refresh(RefreshPolicy::new(RefreshType::OnlyLog), move |repo| repo.create_branch(&name))
            }
            Command::StashSave { message } => tab.run_with_refresh(
                RefreshPolicy::new(RefreshType::UncommittedChangesAndLog).refresh_even_if_crashes(),
                move |repo| repo.stash_save(message.as_deref()).map(|_| ()),
            ),
            Command::StashPop { index } => tab.run_with_refresh(
                RefreshPolicy::new(RefreshType::UncommittedChangesAndLog).refresh_even_if_crashes(),
                move |repo| repo.stash_pop(index),
            ),
            Command::StashDrop { index } => {
                tab.run_with_refresh(RefreshPolicy::new(RefreshType::Stashes), move |repo| repo.stash_drop(index))
            }
            Command::Fetch { remote, prune } => {
                tab.run_with_refresh(RefreshPolicy::new(RefreshType::Remotes), move |repo| repo.fetch(&remote, prune))
            }
            Command::SelectCommit { id } => tab.select_ref(id),
            Command::SelectStash { stash } => {
                tab.select_stash(stash);
                return None;
            }
            Command::SelectUncommitted => {
                tab.select_uncommitted_changes();
                return None;
            }
            Command::ShowDiff { target } => {
                self.set_diff_target(Some(target.clone()));
                load_diff(&self.tab, Some(target), self.ui.diff_context_lines, self.event_tx.clone())
            }
            Command::RefreshAll => {
                tab.publish_refresh(RefreshType::AllData);
                return None;
            }
            Command::Quit => {
                info!("Quit command received");
                tab.close();
                return None;
            }
        };

        Some(handle)
    }

    fn set_diff_target(&self, target: Option<DiffTarget>) {
        *self.diff_target.lock().unwrap_or_else(PoisonError::into_inner) = target;
    }

    fn spawn_panel_watcher(&mut self, panel: Panel) {
        // Subscribe before spawning so the initial refresh is not missed
        let mut refreshes = self.tab.filtered_refresh_stream(panel.filters());
        let tab = self.tab.clone();
        let ui = self.ui.clone();
        let event_tx = self.event_tx.clone();

        self.tasks.spawn(async move {
            loop {
                tokio::select! {
                    _ = tab.closed() => break,
                    refresh = refreshes.recv() => {
                        let Some(refresh_type) = refresh else { break };
                        coalesce(&mut refreshes);
                        debug!(?panel, %refresh_type, "Reloading panel");

                        let ui = ui.clone();
                        let event_tx = event_tx.clone();
                        let load = tab.run_with_refresh(RefreshPolicy::none(), move |repo| {
                            for event in panel.load(repo, &ui)? {
                                let _ = event_tx.send(event);
                            }
                            Ok(())
                        });
                        if let Err(e) = load.await {
                            error!(?panel, "Panel load task failed: {}", e);
                        }
                    }
                }
            }
            debug!(?panel, "Panel watcher stopped");
        });
    }

    fn spawn_diff_watcher(&mut self) {
        let mut refreshes = self.tab.filtered_refresh_stream(&DIFF_FILTERS);
        let mut selection = self.tab.selected_item();
        let tab = self.tab.clone();
        let current = self.diff_target.clone();
        let context_lines = self.ui.diff_context_lines;
        let event_tx = self.event_tx.clone();

        self.tasks.spawn(async move {
            loop {
                let target = tokio::select! {
                    _ = tab.closed() => break,
                    changed = selection.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let target = diff_target_for(&selection.borrow_and_update());
                        *current.lock().unwrap_or_else(PoisonError::into_inner) = target.clone();
                        target
                    }
                    refresh = refreshes.recv() => {
                        if refresh.is_none() {
                            break;
                        }
                        coalesce(&mut refreshes);
                        let target = current.lock().unwrap_or_else(PoisonError::into_inner).clone();
                        // Commit diffs never go stale
                        if !matches!(target, Some(DiffTarget::UncommittedChanges { .. })) {
                            continue;
                        }
                        target
                    }
                };

                if let Err(e) = load_diff(&tab, target, context_lines, event_tx.clone()).await {
                    error!("Diff load task failed: {}", e);
                }
            }
            debug!("Diff watcher stopped");
        });
    }
}

/// Drop queued duplicates; one reload covers them all
fn coalesce(refreshes: &mut RefreshSubscription) {
    let mut skipped = 0;
    while refreshes.try_recv().is_some() {
        skipped += 1;
    }
    if skipped > 0 {
        debug!(skipped, "Coalesced queued refreshes");
    }
}

fn load_diff(
    tab: &TabState,
    target: Option<DiffTarget>,
    context_lines: u32,
    event_tx: mpsc::UnboundedSender<Event>,
) -> JoinHandle<OperationOutcome<()>> {
    tab.run_with_refresh(RefreshPolicy::none(), move |repo| {
        let lines = match &target {
            Some(target) => repo.diff_lines(target, context_lines)?,
            None => Vec::new(),
        };
        let _ = event_tx.send(Event::DiffLoaded { target, lines });
        Ok(())
    })
}

impl Drop for AppService {
    fn drop(&mut self) {
        // Abort all background watchers when the service is dropped
        self.tasks.abort_all();
    }
}
