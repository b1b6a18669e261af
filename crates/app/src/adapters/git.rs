use anyhow::{anyhow, Context, Result};
use git2::{
    build::CheckoutBuilder, BranchType, DiffFormat, DiffOptions, ErrorCode, IndexAddOption,
    ObjectType, Oid, Repository as GitRepository, RepositoryState, Status, StatusOptions,
};
use gitpane_core::domain::{
    Author, Commit, DiffTarget, FileChange, FileStatus, ObjectId, RepoMeta, RepoState, Timestamp,
};
use gitpane_core::error::OperationError;
use gitpane_core::ports::RepositoryPort;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Repository handle that implements RepositoryPort using git2
pub struct Git2Repository {
    /// git2 handles are not Sync; every call takes the lock
    repo: Mutex<GitRepository>,
    meta: RepoMeta,
}

impl Git2Repository {
    /// Open the repository containing `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = GitRepository::discover(path)
            .with_context(|| format!("Failed to open git repository at {}", path.display()))?;

        let root = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        debug!("Opened repository at {}", root.display());

        Ok(Self {
            repo: Mutex::new(repo),
            meta: RepoMeta::from_path(&root),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, GitRepository>> {
        self.repo
            .lock()
            .map_err(|_| anyhow!("Repository handle lock poisoned"))
    }
}

fn object_id(oid: Oid) -> Result<ObjectId> {
    Ok(ObjectId::parse(&oid.to_string())?)
}

fn to_commit(commit: &git2::Commit<'_>) -> Result<Commit> {
    let author = commit.author();
    let parent_ids = commit
        .parent_ids()
        .map(object_id)
        .collect::<Result<Vec<_>>>()?;

    Ok(Commit {
        id: object_id(commit.id())?,
        author: Author {
            name: author.name().unwrap_or("").to_string(),
            email: author.email().unwrap_or("").to_string(),
        },
        summary: commit.summary().unwrap_or("").to_string(),
        message: commit.message().unwrap_or("").to_string(),
        timestamp: Timestamp::new(commit.time().seconds(), commit.time().offset_minutes()),
        parent_ids,
    })
}

fn is_unborn(error: &git2::Error) -> bool {
    matches!(error.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound)
}

/// HEAD commit, `None` for an unborn branch
fn head_commit(repo: &GitRepository) -> Result<Option<git2::Commit<'_>>> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_commit().context("HEAD does not point to a commit")?)),
        Err(e) if is_unborn(&e) => Ok(None),
        Err(e) => Err(e).context("Failed to read HEAD"),
    }
}

fn find_commit<'r>(repo: &'r GitRepository, id: &ObjectId) -> Result<git2::Commit<'r>> {
    let object = if id.is_abbreviated() {
        repo.revparse_single(id.as_str())
    } else {
        Oid::from_str(id.as_str()).and_then(|oid| repo.find_object(oid, None))
    };

    match object.and_then(|object| object.peel_to_commit()) {
        Ok(commit) => Ok(commit),
        Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::Ambiguous) => {
            Err(OperationError::NotFound { id: id.to_string() }.into())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to resolve {}", id)),
    }
}

fn to_repo_state(state: RepositoryState) -> RepoState {
    match state {
        RepositoryState::Clean => RepoState::Clean,
        RepositoryState::Merge => RepoState::Merge,
        RepositoryState::Revert | RepositoryState::RevertSequence => RepoState::Revert,
        RepositoryState::CherryPick | RepositoryState::CherryPickSequence => RepoState::CherryPick,
        RepositoryState::Bisect => RepoState::Bisect,
        RepositoryState::Rebase => RepoState::Rebase,
        RepositoryState::RebaseInteractive => RepoState::RebaseInteractive,
        RepositoryState::RebaseMerge => RepoState::RebaseMerge,
        RepositoryState::ApplyMailbox | RepositoryState::ApplyMailboxOrRebase => {
            RepoState::ApplyMailbox
        }
    }
}

fn index_status(status: Status) -> Option<FileStatus> {
    if status.contains(Status::INDEX_NEW) {
        Some(FileStatus::Added)
    } else if status.contains(Status::INDEX_MODIFIED) {
        Some(FileStatus::Modified)
    } else if status.contains(Status::INDEX_DELETED) {
        Some(FileStatus::Deleted)
    } else if status.contains(Status::INDEX_RENAMED) {
        Some(FileStatus::Renamed)
    } else if status.contains(Status::INDEX_TYPECHANGE) {
        Some(FileStatus::TypeChange)
    } else {
        None
    }
}

fn workdir_status(status: Status) -> Option<FileStatus> {
    if status.contains(Status::CONFLICTED) {
        Some(FileStatus::Conflicted)
    } else if status.contains(Status::WT_NEW) {
        Some(FileStatus::Untracked)
    } else if status.contains(Status::WT_MODIFIED) {
        Some(FileStatus::Modified)
    } else if status.contains(Status::WT_DELETED) {
        Some(FileStatus::Deleted)
    } else if status.contains(Status::WT_RENAMED) {
        Some(FileStatus::Renamed)
    } else if status.contains(Status::WT_TYPECHANGE) {
        Some(FileStatus::TypeChange)
    } else {
        None
    }
}

impl RepositoryPort for Git2Repository {
    fn meta(&self) -> RepoMeta {
        self.meta.clone()
    }

    fn resolve_commit(&self, id: &ObjectId) -> Result<Commit> {
        let repo = self.lock()?;
        let commit = find_commit(&repo, id)?;
        to_commit(&commit)
    }

    fn log(&self, limit: usize) -> Result<Vec<Commit>> {
        let repo = self.lock()?;
        if head_commit(&repo)?.is_none() {
            return Ok(Vec::new());
        }

        let mut revwalk = repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;

        let mut commits = Vec::new();
        for oid in revwalk.take(limit) {
            let commit = repo.find_commit(oid?)?;
            commits.push(to_commit(&commit)?);
        }

        Ok(commits)
    }

    fn stashes(&self) -> Result<Vec<Commit>> {
        let mut repo = self.lock()?;

        let mut oids = Vec::new();
        repo.stash_foreach(|_index, _message, oid| {
            oids.push(*oid);
            true
        })
        .context("Failed to list stashes")?;

        oids.into_iter()
            .map(|oid| to_commit(&repo.find_commit(oid)?))
            .collect()
    }

    fn current_branch(&self) -> Result<Option<String>> {
        let repo = self.lock()?;
        let branch = match repo.head() {
            Ok(head) if head.is_branch() => Ok(head.shorthand().map(|s| s.to_string())),
            Ok(_) => Ok(None),
            Err(e) if is_unborn(&e) => {
                // Unborn branch: HEAD still names it symbolically
                let head = repo.find_reference("HEAD")?;
                Ok(head
                    .symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(|s| s.to_string()))
            }
            Err(e) => Err(e).context("Failed to read HEAD"),
        };
        branch
    }

    fn state(&self) -> Result<RepoState> {
        Ok(to_repo_state(self.lock()?.state()))
    }

    fn uncommitted_changes(&self) -> Result<Vec<FileChange>> {
        let repo = self.lock()?;

        let mut status_options = StatusOptions::new();
        status_options.include_untracked(true);
        status_options.recurse_untracked_dirs(true);
        status_options.include_ignored(false);

        let statuses = repo
            .statuses(Some(&mut status_options))
            .context("Failed to get git status")?;

        let mut changes = Vec::new();
        for entry in statuses.iter() {
            let Some(path) = entry.path() else {
                continue;
            };
            let status = entry.status();

            if let Some(file_status) = index_status(status) {
                changes.push(FileChange {
                    path: path.into(),
                    status: file_status,
                    staged: true,
                });
            }
            if let Some(file_status) = workdir_status(status) {
                changes.push(FileChange {
                    path: path.into(),
                    status: file_status,
                    staged: false,
                });
            }
        }

        Ok(changes)
    }

    fn diff_lines(&self, target: &DiffTarget, context_lines: u32) -> Result<Vec<String>> {
        let repo = self.lock()?;

        let mut opts = DiffOptions::new();
        opts.context_lines(context_lines);

        let diff = match target {
            DiffTarget::UncommittedChanges { path, staged } => {
                if let Some(path) = path {
                    opts.pathspec(path);
                }
                if *staged {
                    let head_tree = head_commit(&repo)?.map(|c| c.tree()).transpose()?;
                    repo.diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))?
                } else {
                    opts.include_untracked(true)
                        .recurse_untracked_dirs(true)
                        .show_untracked_content(true);
                    repo.diff_index_to_workdir(None, Some(&mut opts))?
                }
            }
            DiffTarget::Commit { id } => {
                let commit = find_commit(&repo, id)?;
                let tree = commit.tree()?;
                let parent_tree = if commit.parent_count() > 0 {
                    Some(commit.parent(0)?.tree()?)
                } else {
                    None
                };
                repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))?
            }
        };

        let mut lines = Vec::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            let content = String::from_utf8_lossy(line.content());
            let content = content.trim_end_matches(|c| c == '\n' || c == '\r');
            match line.origin() {
                origin @ ('+' | '-' | ' ') => lines.push(format!("{}{}", origin, content)),
                'H' => lines.push(content.to_string()),
                // File headers and end-of-file markers are not rendered
                _ => {}
            }
            true
        })
        .context("Failed to format diff")?;

        Ok(lines)
    }

    fn remotes(&self) -> Result<Vec<String>> {
        let repo = self.lock()?;
        let remotes = repo.remotes().context("Failed to list remotes")?;
        Ok(remotes.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn submodules(&self) -> Result<Vec<String>> {
        let repo = self.lock()?;
        let submodules = repo.submodules().context("Failed to list submodules")?;
        Ok(submodules
            .iter()
            .map(|s| s.name().unwrap_or("").to_string())
            .collect())
    }

    fn stage_all(&self) -> Result<()> {
        let repo = self.lock()?;
        let mut index = repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        // add_all does not record deletions
        index.update_all(["*"].iter(), None)?;
        index.write().context("Failed to write index")?;
        Ok(())
    }

    fn unstage_all(&self) -> Result<()> {
        let repo = self.lock()?;
        match head_commit(&repo)? {
            Some(commit) => {
                repo.reset_default(Some(commit.as_object()), ["*"])?;
            }
            None => {
                let mut index = repo.index()?;
                index.clear()?;
                index.write().context("Failed to write index")?;
            }
        }
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<ObjectId> {
        let repo = self.lock()?;
        let signature = repo
            .signature()
            .context("Failed to build signature, set user.name and user.email")?;

        let mut index = repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        let parent = head_commit(&repo)?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .context("Failed to create commit")?;
        object_id(oid)
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        let repo = self.lock()?;
        let local = match repo.find_branch(branch, BranchType::Local) {
            Ok(local) => local,
            Err(e) if e.code() == ErrorCode::NotFound => {
                return Err(OperationError::NotFound {
                    id: branch.to_string(),
                }
                .into())
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to find branch {}", branch)),
        };

        let reference = local.get();
        let refname = reference
            .name()
            .ok_or_else(|| anyhow!("Branch {} has a non UTF-8 name", branch))?
            .to_string();
        let target = reference.peel(ObjectType::Commit)?;

        repo.checkout_tree(&target, Some(CheckoutBuilder::new().safe()))
            .with_context(|| format!("Failed to check out {}", branch))?;
        repo.set_head(&refname)?;
        Ok(())
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        let repo = self.lock()?;
        let head = head_commit(&repo)?.ok_or_else(|| anyhow!("Cannot branch from an unborn HEAD"))?;
        repo.branch(name, &head, false)
            .with_context(|| format!("Failed to create branch {}", name))?;
        Ok(())
    }

    fn stash_save(&self, message: Option<&str>) -> Result<ObjectId> {
        let mut repo = self.lock()?;
        let signature = repo
            .signature()
            .context("Failed to build signature, set user.name and user.email")?;
        let oid = repo
            .stash_save2(&signature, message, None)
            .context("Failed to stash changes")?;
        object_id(oid)
    }

    fn stash_pop(&self, index: usize) -> Result<()> {
        let mut repo = self.lock()?;
        repo.stash_pop(index, None)
            .with_context(|| format!("Failed to pop stash@{{{}}}", index))?;
        Ok(())
    }

    fn stash_drop(&self, index: usize) -> Result<()> {
        let mut repo = self.lock()?;
        repo.stash_drop(index)
            .with_context(|| format!("Failed to drop stash@{{{}}}", index))?;
        Ok(())
    }

    fn fetch(&self, remote: &str, prune: bool) -> Result<()> {
        let repo = self.lock()?;
        let mut remote_obj = repo
            .find_remote(remote)
            .with_context(|| format!("Remote '{}' not found", remote))?;

        let mut fetch_options = git2::FetchOptions::new();
        if prune {
            fetch_options.prune(git2::FetchPrune::On);
        }

        remote_obj
            .fetch(&[] as &[&str], Some(&mut fetch_options), None)
            .context("Failed to fetch from remote")?;

        Ok(())
    }
}
