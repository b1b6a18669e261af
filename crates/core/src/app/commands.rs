use crate::domain::{Commit, DiffTarget, ObjectId};

/// Commands that can be sent to the application service
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Stage every working tree change
    StageAll,

    /// Reset the index to HEAD
    UnstageAll,

    Commit { message: String },

    /// Check out a local branch
    Checkout { branch: String },

    /// Create a branch at HEAD
    CreateBranch { name: String },

    StashSave { message: Option<String> },

    StashPop { index: usize },

    StashDrop { index: usize },

    /// Fetch from a remote
    Fetch { remote: String, prune: bool },

    /// Select a commit in the log; `None` clears the selection
    SelectCommit { id: Option<ObjectId> },

    SelectStash { stash: Commit },

    /// Select the uncommitted changes entry
    SelectUncommitted,

    /// Load a diff for the diff panel
    ShowDiff { target: DiffTarget },

    /// Reload every panel
    RefreshAll,

    /// Quit the application
    Quit,
}
