use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Identity of the repository a tab is attached to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoMeta {
    pub name: String,
    /// Working directory (or the git dir for bare repositories)
    pub path: PathBuf,
}

impl RepoMeta {
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Self {
            name,
            path: path.to_path_buf(),
        }
    }
}

impl std::fmt::Display for RepoMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.path.display())
    }
}

/// In-progress multi-step operation the repository is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepoState {
    #[default]
    Clean,
    Merge,
    Revert,
    CherryPick,
    Bisect,
    Rebase,
    RebaseInteractive,
    RebaseMerge,
    ApplyMailbox,
}

impl RepoState {
    pub fn is_clean(self) -> bool {
        self == RepoState::Clean
    }

    pub fn label(self) -> &'static str {
        match self {
            RepoState::Clean => "clean",
            RepoState::Merge => "merging",
            RepoState::Revert => "reverting",
            RepoState::CherryPick => "cherry-picking",
            RepoState::Bisect => "bisecting",
            RepoState::Rebase => "rebasing",
            RepoState::RebaseInteractive => "rebasing (interactive)",
            RepoState::RebaseMerge => "rebasing (merge)",
            RepoState::ApplyMailbox => "applying patches",
        }
    }
}

/// Kind of change recorded for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    TypeChange,
    Untracked,
    Conflicted,
}

impl FileStatus {
    /// Single character indicator for list views
    pub fn indicator(self) -> char {
        match self {
            FileStatus::Added => 'A',
            FileStatus::Modified => 'M',
            FileStatus::Deleted => 'D',
            FileStatus::Renamed => 'R',
            FileStatus::TypeChange => 'T',
            FileStatus::Untracked => '?',
            FileStatus::Conflicted => 'U',
        }
    }
}

/// One entry of the uncommitted changes panel.
///
/// A path changed both in the index and the working tree appears twice,
/// once with `staged` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: PathBuf,
    pub status: FileStatus,
    pub staged: bool,
}
