use crate::domain::{Commit, DiffTarget, Event, FileChange, RepoState};

/// Read-only projection of the tab's repository data for UI consumption
#[derive(Debug, Default)]
pub struct ReadProjection {
    /// Commit log, newest first
    pub commits: Vec<Commit>,

    pub branch: Option<String>,

    pub stashes: Vec<Commit>,

    /// Uncommitted changes (staged entries first)
    pub changes: Vec<FileChange>,

    /// What the diff panel currently shows
    pub diff_target: Option<DiffTarget>,
    pub diff_lines: Vec<String>,

    pub state: RepoState,

    pub remotes: Vec<String>,

    pub submodules: Vec<String>,
}

impl ReadProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an event to update the projection
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::LogLoaded { commits } => {
                self.commits = commits.clone();
            }

            Event::BranchLoaded { branch } => {
                self.branch = branch.clone();
            }

            Event::StashesLoaded { stashes } => {
                self.stashes = stashes.clone();
            }

            Event::ChangesLoaded { changes } => {
                let mut changes = changes.clone();
                changes.sort_by(|a, b| b.staged.cmp(&a.staged).then_with(|| a.path.cmp(&b.path)));
                self.changes = changes;
            }

            Event::DiffLoaded { target, lines } => {
                self.diff_target = target.clone();
                self.diff_lines = lines.clone();
            }

            Event::RepoStateLoaded { state } => {
                self.state = *state;
            }

            Event::RemotesLoaded { remotes } => {
                self.remotes = remotes.clone();
            }

            Event::SubmodulesLoaded { submodules } => {
                self.submodules = submodules.clone();
            }
        }
    }

    /// Position of a commit in the log
    pub fn commit_index(&self, id: &crate::domain::ObjectId) -> Option<usize> {
        self.commits.iter().position(|commit| &commit.id == id)
    }

    pub fn staged_count(&self) -> usize {
        self.changes.iter().filter(|change| change.staged).count()
    }

    pub fn unstaged_count(&self) -> usize {
        self.changes.len() - self.staged_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FileStatus, ObjectId};
    use std::path::PathBuf;

    fn change(path: &str, staged: bool) -> FileChange {
        FileChange {
            path: PathBuf::from(path),
            status: FileStatus::Modified,
            staged,
        }
    }

    #[test]
    fn test_changes_sorted_staged_first() {
        let mut projection = ReadProjection::new();
        projection.apply(&Event::ChangesLoaded {
            changes: vec![change("b.txt", false), change("c.txt", true), change("a.txt", false)],
        });

        let paths: Vec<_> = projection
            .changes
            .iter()
            .map(|c| (c.path.to_string_lossy().to_string(), c.staged))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("c.txt".to_string(), true),
                ("a.txt".to_string(), false),
                ("b.txt".to_string(), false),
            ]
        );
        assert_eq!(projection.staged_count(), 1);
        assert_eq!(projection.unstaged_count(), 2);
    }

    #[test]
    fn test_diff_replaced_on_each_load() {
        let mut projection = ReadProjection::new();
        let target = DiffTarget::Commit {
            id: ObjectId::parse("abcd").unwrap(),
        };
        projection.apply(&Event::DiffLoaded {
            target: Some(target.clone()),
            lines: vec!["+a".to_string()],
        });
        assert_eq!(projection.diff_target, Some(target));

        projection.apply(&Event::DiffLoaded {
            target: None,
            lines: vec![],
        });
        assert!(projection.diff_target.is_none());
        assert!(projection.diff_lines.is_empty());
    }

    #[test]
    fn test_repo_state_applied() {
        let mut projection = ReadProjection::new();
        projection.apply(&Event::RepoStateLoaded {
            state: RepoState::Rebase,
        });
        assert_eq!(projection.state, RepoState::Rebase);
    }
}
