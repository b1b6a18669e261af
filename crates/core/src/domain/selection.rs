use super::commit::{Commit, ObjectId};

/// The single entity the UI currently focuses on
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SelectedItem {
    None,
    /// Working tree and index changes; the initial selection of a tab
    #[default]
    UncommittedChanges,
    /// A commit reached through the log or a ref
    Ref(Commit),
    Stash(Commit),
}

impl SelectedItem {
    /// Commit behind the selection, if any
    pub fn commit(&self) -> Option<&Commit> {
        match self {
            SelectedItem::Ref(commit) | SelectedItem::Stash(commit) => Some(commit),
            SelectedItem::None | SelectedItem::UncommittedChanges => None,
        }
    }

    pub fn commit_id(&self) -> Option<&ObjectId> {
        self.commit().map(|commit| &commit.id)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, SelectedItem::None)
    }
}
