use serde::{Deserialize, Serialize};

/// Coarse label describing which data domain became stale after an operation.
///
/// Panels subscribe to the subset they care about and reload on a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefreshType {
    /// Nothing to refresh. Never published.
    None,
    AllData,
    RepoState,
    OnlyLog,
    Stashes,
    Submodules,
    UncommittedChanges,
    UncommittedChangesAndLog,
    Remotes,
}

impl RefreshType {
    pub const ALL: [RefreshType; 9] = [
        RefreshType::None,
        RefreshType::AllData,
        RefreshType::RepoState,
        RefreshType::OnlyLog,
        RefreshType::Stashes,
        RefreshType::Submodules,
        RefreshType::UncommittedChanges,
        RefreshType::UncommittedChangesAndLog,
        RefreshType::Remotes,
    ];

    /// Whether publishing this category would reach anyone
    pub fn is_publishable(self) -> bool {
        self != RefreshType::None
    }

    /// Whether this category is in the given interest set
    pub fn matches(self, filters: &[RefreshType]) -> bool {
        filters.contains(&self)
    }
}

impl std::fmt::Display for RefreshType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RefreshType::None => "none",
            RefreshType::AllData => "all-data",
            RefreshType::RepoState => "repo-state",
            RefreshType::OnlyLog => "only-log",
            RefreshType::Stashes => "stashes",
            RefreshType::Submodules => "submodules",
            RefreshType::UncommittedChanges => "uncommitted-changes",
            RefreshType::UncommittedChangesAndLog => "uncommitted-changes-and-log",
            RefreshType::Remotes => "remotes",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_not_publishable() {
        let unpublishable: Vec<_> = RefreshType::ALL
            .into_iter()
            .filter(|t| !t.is_publishable())
            .collect();
        assert_eq!(unpublishable, vec![RefreshType::None]);
    }

    #[test]
    fn test_matches_filter_set() {
        let filters = [RefreshType::Stashes, RefreshType::Remotes];
        assert!(RefreshType::Stashes.matches(&filters));
        assert!(RefreshType::Remotes.matches(&filters));
        assert!(!RefreshType::OnlyLog.matches(&filters));
        assert!(!RefreshType::AllData.matches(&filters));
    }
}
