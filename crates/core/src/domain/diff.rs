use super::commit::ObjectId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a diff is computed for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffTarget {
    /// Working tree against the index, or the index against HEAD when `staged`
    UncommittedChanges { path: Option<PathBuf>, staged: bool },
    /// A commit against its first parent (or the empty tree for root commits)
    Commit { id: ObjectId },
}

/// Classification of a single line of textual diff output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineKind {
    Added,
    Removed,
    HunkHeader,
    Context,
}

impl DiffLineKind {
    pub fn classify(line: &str) -> Self {
        if line.starts_with('+') {
            DiffLineKind::Added
        } else if line.starts_with('-') {
            DiffLineKind::Removed
        } else if line.starts_with("@@") {
            DiffLineKind::HunkHeader
        } else {
            DiffLineKind::Context
        }
    }
}

/// Classify every line, preserving input order
pub fn classify_lines<S: AsRef<str>>(lines: &[S]) -> Vec<DiffLineKind> {
    lines
        .iter()
        .map(|line| DiffLineKind::classify(line.as_ref()))
        .collect()
}
