use crate::domain::{Commit, DiffTarget, FileChange, ObjectId, RepoMeta, RepoState};
use anyhow::Result;

/// Port for the live connection to an on-disk repository.
///
/// Every method is blocking; the coordinator calls them from the blocking
/// pool. Resolution misses are reported as `OperationError::NotFound` wrapped
/// in the returned `anyhow::Error`.
pub trait RepositoryPort: Send + Sync {
    fn meta(&self) -> RepoMeta;

    /// Resolve an object id (full or abbreviated) to a commit
    fn resolve_commit(&self, id: &ObjectId) -> Result<Commit>;

    /// Commits reachable from HEAD, newest first
    fn log(&self, limit: usize) -> Result<Vec<Commit>>;

    /// Stash entries, most recent first
    fn stashes(&self) -> Result<Vec<Commit>>;

    /// Current branch name; `None` when HEAD is detached or unborn
    fn current_branch(&self) -> Result<Option<String>>;

    fn state(&self) -> Result<RepoState>;

    fn uncommitted_changes(&self) -> Result<Vec<FileChange>>;

    /// Textual diff as lines prefixed `+`, `-`, ` ` or `@@ `
    fn diff_lines(&self, target: &DiffTarget, context_lines: u32) -> Result<Vec<String>>;

    fn remotes(&self) -> Result<Vec<String>>;

    fn submodules(&self) -> Result<Vec<String>>;

    fn stage_all(&self) -> Result<()>;

    fn unstage_all(&self) -> Result<()>;

    /// Commit the index on top of HEAD, returning the new commit id
    fn commit(&self, message: &str) -> Result<ObjectId>;

    /// Check out a local branch by short name
    fn checkout(&self, branch: &str) -> Result<()>;

    /// Create a branch at HEAD without checking it out
    fn create_branch(&self, name: &str) -> Result<()>;

    /// Stash working tree and index changes
    fn stash_save(&self, message: Option<&str>) -> Result<ObjectId>;

    fn stash_pop(&self, index: usize) -> Result<()>;

    fn stash_drop(&self, index: usize) -> Result<()>;

    fn fetch(&self, remote: &str, prune: bool) -> Result<()>;
}
