use gitpane_core::app::ReadProjection;
use gitpane_core::domain::{Commit, Event, RepoMeta, SelectedItem, TaskEvent};
use gitpane_core::ports::ErrorRecord;

use super::theme::Theme;
use crate::services::tab_state::OperationState;

/// The TUI Model - the complete UI state.
/// Separate from the core ReadProjection to allow UI-specific state.
#[derive(Debug, Default)]
pub struct TuiModel {
    /// Repository data pushed by the panel loaders
    pub projection: ReadProjection,

    pub repo: Option<RepoMeta>,

    /// Mirror of the tab's current selection
    pub selection: SelectedItem,

    /// Mirror of the tab's busy state
    pub operation: OperationState,

    pub ui_state: UiState,

    pub input: InputState,

    /// Reported operation errors, oldest first
    pub errors: Vec<ErrorRecord>,

    pub theme: Theme,

    pub should_quit: bool,
}

/// Cursor and scroll positions
#[derive(Debug, Default)]
pub struct UiState {
    pub focus: Focus,

    /// Cursor in the commit log
    pub log_cursor: usize,

    /// Cursor in the stash list
    pub stash_cursor: usize,

    pub diff_scroll: usize,

    /// Whether the uncommitted diff shows the index instead of the working tree
    pub show_staged: bool,

    pub terminal_width: u16,
    pub terminal_height: u16,
}

/// Panel receiving navigation keys
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Log,
    Stashes,
}

#[derive(Debug, Default)]
pub struct InputState {
    pub mode: InputMode,
    pub text: String,
}

/// Text entry prompts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    None,
    CommitMessage,
    StashMessage,
    NewBranch,
    CheckoutBranch,
}

impl InputMode {
    pub fn prompt(self) -> &'static str {
        match self {
            InputMode::None => "",
            InputMode::CommitMessage => "Commit message:",
            InputMode::StashMessage => "Stash message (optional):",
            InputMode::NewBranch => "New branch name:",
            InputMode::CheckoutBranch => "Checkout branch:",
        }
    }
}

impl TuiModel {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            ..Self::default()
        }
    }

    /// Apply a data event to the projection and keep cursors in range
    pub fn apply_event(&mut self, event: &Event) {
        self.projection.apply(event);

        match event {
            Event::LogLoaded { commits } => {
                self.ui_state.log_cursor = self.ui_state.log_cursor.min(commits.len().saturating_sub(1));
            }
            Event::StashesLoaded { stashes } => {
                self.ui_state.stash_cursor = self.ui_state.stash_cursor.min(stashes.len().saturating_sub(1));
                if stashes.is_empty() {
                    self.ui_state.focus = Focus::Log;
                }
            }
            Event::DiffLoaded { .. } => {
                self.ui_state.diff_scroll = 0;
            }
            _ => {}
        }
    }

    pub fn handle_task_event(&mut self, event: &TaskEvent) {
        match event {
            TaskEvent::ScrollToGraphItem(item) => {
                if let Some(index) = item.commit_id().and_then(|id| self.projection.commit_index(id)) {
                    self.ui_state.focus = Focus::Log;
                    self.ui_state.log_cursor = index;
                }
            }
        }
    }

    pub fn commit_under_cursor(&self) -> Option<&Commit> {
        self.projection.commits.get(self.ui_state.log_cursor)
    }

    pub fn stash_under_cursor(&self) -> Option<&Commit> {
        self.projection.stashes.get(self.ui_state.stash_cursor)
    }

    pub fn move_cursor_up(&mut self) {
        let cursor = match self.ui_state.focus {
            Focus::Log => &mut self.ui_state.log_cursor,
            Focus::Stashes => &mut self.ui_state.stash_cursor,
        };
        *cursor = cursor.saturating_sub(1);
    }

    pub fn move_cursor_down(&mut self) {
        let (cursor, len) = match self.ui_state.focus {
            Focus::Log => (&mut self.ui_state.log_cursor, self.projection.commits.len()),
            Focus::Stashes => (&mut self.ui_state.stash_cursor, self.projection.stashes.len()),
        };
        if *cursor + 1 < len {
            *cursor += 1;
        }
    }

    pub fn toggle_focus(&mut self) {
        self.ui_state.focus = match self.ui_state.focus {
            Focus::Log if !self.projection.stashes.is_empty() => Focus::Stashes,
            _ => Focus::Log,
        };
    }

    pub fn add_errors(&mut self, errors: Vec<ErrorRecord>) {
        self.errors.extend(errors);
    }

    pub fn latest_error(&self) -> Option<&ErrorRecord> {
        self.errors.last()
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn start_input(&mut self, mode: InputMode) {
        self.input.mode = mode;
        self.input.text.clear();
    }

    pub fn is_inputting(&self) -> bool {
        self.input.mode != InputMode::None
    }
}
