use super::{
    commit::Commit,
    diff::DiffTarget,
    repo::{FileChange, RepoState},
    selection::SelectedItem,
};

/// One-shot UI directive unrelated to data refresh.
///
/// Delivered at most once to each subscriber present when it is emitted.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    ScrollToGraphItem(SelectedItem),
}

/// Data events pushed from the panel loaders to the UI
#[derive(Debug, Clone)]
pub enum Event {
    /// Commit log (newest first) was loaded
    LogLoaded { commits: Vec<Commit> },

    /// Current branch name, `None` when HEAD is detached or unborn
    BranchLoaded { branch: Option<String> },

    StashesLoaded { stashes: Vec<Commit> },

    /// Uncommitted changes (index and working tree) were loaded
    ChangesLoaded { changes: Vec<FileChange> },

    DiffLoaded { target: Option<DiffTarget>, lines: Vec<String> },

    RepoStateLoaded { state: RepoState },

    RemotesLoaded { remotes: Vec<String> },

    SubmodulesLoaded { submodules: Vec<String> },
}
