use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use gitpane_core::app::Command;
use gitpane_core::domain::{DiffTarget, SelectedItem};

use super::model::{Focus, InputMode, TuiModel};

/// Remote used by the fetch keys
const DEFAULT_REMOTE: &str = "origin";

/// Lines moved per diff scroll key press
const DIFF_SCROLL_STEP: usize = 10;

/// Messages that can be sent from the TUI to the application service
#[derive(Debug, Clone, PartialEq)]
pub enum TuiMessage {
    /// Send a command to the app service
    Command(Command),

    /// No action needed
    None,
}

/// The Update function - handles user input and updates the model
/// This is the core of the MVU pattern's Update component
pub struct TuiUpdate;

impl TuiUpdate {
    /// Handle a key press and update the model accordingly
    /// Returns a TuiMessage that should be sent to the app service
    pub fn handle_key(model: &mut TuiModel, key: KeyCode, modifiers: KeyModifiers) -> Result<TuiMessage> {
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            model.should_quit = true;
            return Ok(TuiMessage::Command(Command::Quit));
        }

        if model.is_inputting() {
            return Self::handle_input_keys(model, key);
        }

        Self::handle_normal_keys(model, key)
    }

    /// Handle terminal resize
    pub fn handle_resize(model: &mut TuiModel, width: u16, height: u16) -> Result<TuiMessage> {
        model.ui_state.terminal_width = width;
        model.ui_state.terminal_height = height;
        Ok(TuiMessage::None)
    }

    /// Handle keys when in text input mode
    fn handle_input_keys(model: &mut TuiModel, key: KeyCode) -> Result<TuiMessage> {
        match key {
            KeyCode::Char(c) => {
                model.input.text.push(c);
                Ok(TuiMessage::None)
            }

            KeyCode::Backspace => {
                model.input.text.pop();
                Ok(TuiMessage::None)
            }

            KeyCode::Enter => {
                let text = std::mem::take(&mut model.input.text);
                let mode = std::mem::take(&mut model.input.mode);
                Ok(Self::process_input_submission(mode, text))
            }

            KeyCode::Esc => {
                model.start_input(InputMode::None);
                Ok(TuiMessage::None)
            }

            _ => Ok(TuiMessage::None),
        }
    }

    /// Process submitted input text
    fn process_input_submission(mode: InputMode, text: String) -> TuiMessage {
        let trimmed = text.trim();
        match mode {
            InputMode::None => TuiMessage::None,

            InputMode::CommitMessage => TuiMessage::Command(Command::Commit { message: text }),

            InputMode::StashMessage => TuiMessage::Command(Command::StashSave {
                message: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            }),

            InputMode::NewBranch if !trimmed.is_empty() => TuiMessage::Command(Command::CreateBranch {
                name: trimmed.to_string(),
            }),

            InputMode::CheckoutBranch if !trimmed.is_empty() => TuiMessage::Command(Command::Checkout {
                branch: trimmed.to_string(),
            }),

            InputMode::NewBranch | InputMode::CheckoutBranch => TuiMessage::None,
        }
    }

    fn handle_normal_keys(model: &mut TuiModel, key: KeyCode) -> Result<TuiMessage> {
        let msg = match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                model.should_quit = true;
                TuiMessage::Command(Command::Quit)
            }

            // Navigation
            KeyCode::Up | KeyCode::Char('k') => {
                model.move_cursor_up();
                TuiMessage::None
            }

            KeyCode::Down | KeyCode::Char('j') => {
                model.move_cursor_down();
                TuiMessage::None
            }

            KeyCode::Tab => {
                model.toggle_focus();
                TuiMessage::None
            }

            KeyCode::PageDown | KeyCode::Char('J') => {
                let max = model.projection.diff_lines.len().saturating_sub(1);
                model.ui_state.diff_scroll = (model.ui_state.diff_scroll + DIFF_SCROLL_STEP).min(max);
                TuiMessage::None
            }

            KeyCode::PageUp | KeyCode::Char('K') => {
                model.ui_state.diff_scroll = model.ui_state.diff_scroll.saturating_sub(DIFF_SCROLL_STEP);
                TuiMessage::None
            }

            // Selection
            KeyCode::Enter => match model.ui_state.focus {
                Focus::Log => match model.commit_under_cursor() {
                    Some(commit) => TuiMessage::Command(Command::SelectCommit {
                        id: Some(commit.id.clone()),
                    }),
                    None => TuiMessage::None,
                },
                Focus::Stashes => match model.stash_under_cursor() {
                    Some(stash) => TuiMessage::Command(Command::SelectStash { stash: stash.clone() }),
                    None => TuiMessage::None,
                },
            },

            KeyCode::Char('u') => {
                model.ui_state.show_staged = false;
                TuiMessage::Command(Command::SelectUncommitted)
            }

            KeyCode::Char('n') => TuiMessage::Command(Command::SelectCommit { id: None }),

            KeyCode::Char('t') if model.selection == SelectedItem::UncommittedChanges => {
                model.ui_state.show_staged = !model.ui_state.show_staged;
                TuiMessage::Command(Command::ShowDiff {
                    target: DiffTarget::UncommittedChanges {
                        path: None,
                        staged: model.ui_state.show_staged,
                    },
                })
            }

            // Index and commits
            KeyCode::Char('a') => TuiMessage::Command(Command::StageAll),

            KeyCode::Char('A') => TuiMessage::Command(Command::UnstageAll),

            KeyCode::Char('c') => {
                model.start_input(InputMode::CommitMessage);
                TuiMessage::None
            }

            // Stashes
            KeyCode::Char('s') => {
                model.start_input(InputMode::StashMessage);
                TuiMessage::None
            }

            KeyCode::Char('p') if !model.projection.stashes.is_empty() => TuiMessage::Command(Command::StashPop {
                index: Self::stash_index(model),
            }),

            KeyCode::Char('D') if model.ui_state.focus == Focus::Stashes && model.stash_under_cursor().is_some() => {
                TuiMessage::Command(Command::StashDrop {
                    index: model.ui_state.stash_cursor,
                })
            }

            // Branches
            KeyCode::Char('b') => {
                model.start_input(InputMode::NewBranch);
                TuiMessage::None
            }

            KeyCode::Char('o') => {
                model.start_input(InputMode::CheckoutBranch);
                TuiMessage::None
            }

            // Remotes
            KeyCode::Char('f') => TuiMessage::Command(Command::Fetch {
                remote: DEFAULT_REMOTE.to_string(),
                prune: false,
            }),

            KeyCode::Char('F') => TuiMessage::Command(Command::Fetch {
                remote: DEFAULT_REMOTE.to_string(),
                prune: true,
            }),

            KeyCode::Char('r') | KeyCode::F(5) => TuiMessage::Command(Command::RefreshAll),

            KeyCode::Char('x') => {
                model.clear_errors();
                TuiMessage::None
            }

            _ => TuiMessage::None,
        };

        Ok(msg)
    }

    /// Stash acted on by pop: the one under the cursor when the stash list
    /// has focus, otherwise the most recent
    fn stash_index(model: &TuiModel) -> usize {
        match model.ui_state.focus {
            Focus::Stashes => model.ui_state.stash_cursor,
            Focus::Log => 0,
        }
    }
}
