use chrono::{DateTime, FixedOffset};
use gitpane_core::domain::{Commit, DiffTarget, FileChange, Timestamp};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::diff::DiffView;
use super::model::{Focus, TuiModel};

/// The View component of MVU - responsible for rendering the model
pub struct TuiView;

impl TuiView {
    /// Render the entire TUI based on the current model state
    pub fn render(model: &TuiModel, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(0),    // Panels
                Constraint::Length(2), // Status and key hints
            ])
            .split(frame.area());

        Self::render_header(model, frame, chunks[0]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[1]);

        let stash_height = stash_panel_height(model.projection.stashes.len());
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),
                Constraint::Length(stash_height),
                Constraint::Percentage(30),
            ])
            .split(columns[0]);

        Self::render_log(model, frame, left[0]);
        Self::render_stashes(model, frame, left[1]);
        Self::render_changes(model, frame, left[2]);
        Self::render_diff(model, frame, columns[1]);

        Self::render_status_bar(model, frame, chunks[2]);
    }

    fn render_header(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let theme = &model.theme;
        let mut spans = vec![Span::styled(
            " gitpane ",
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        )];

        if let Some(repo) = &model.repo {
            spans.push(Span::raw(format!("{} ", repo)));
        }

        let branch = model.projection.branch.as_deref().unwrap_or("(detached)");
        spans.push(Span::styled(
            format!("[{}] ", branch),
            Style::default().fg(theme.accent),
        ));

        if !model.projection.state.is_clean() {
            spans.push(Span::styled(
                format!("{} ", model.projection.state.label().to_uppercase()),
                Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
            ));
        }

        if model.operation.processing {
            spans.push(Span::styled("[PROCESSING...]", Style::default().fg(theme.muted)));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn panel_block(model: &TuiModel, title: String, focused: bool) -> Block<'static> {
        let border = if focused { model.theme.accent } else { model.theme.muted };
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(title)
    }

    fn render_log(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let selected_id = model.selection.commit_id();
        let items: Vec<ListItem> = model
            .projection
            .commits
            .iter()
            .map(|commit| {
                let marker = if Some(&commit.id) == selected_id { "● " } else { "  " };
                Self::commit_item(model, marker, commit)
            })
            .collect();

        let focused = model.ui_state.focus == Focus::Log;
        let title = format!("Log ({})", model.projection.commits.len());
        Self::render_list(model, frame, area, items, title, focused, model.ui_state.log_cursor);
    }

    fn render_stashes(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = model
            .projection
            .stashes
            .iter()
            .enumerate()
            .map(|(index, stash)| Self::commit_item(model, &format!("{{{}}} ", index), stash))
            .collect();

        let focused = model.ui_state.focus == Focus::Stashes;
        let title = format!("Stashes ({})", model.projection.stashes.len());
        Self::render_list(model, frame, area, items, title, focused, model.ui_state.stash_cursor);
    }

    fn render_list(
        model: &TuiModel,
        frame: &mut Frame,
        area: Rect,
        items: Vec<ListItem>,
        title: String,
        focused: bool,
        cursor: usize,
    ) {
        let highlight = if focused {
            model.theme.selected_style()
        } else {
            Style::default()
        };
        let list = List::new(items)
            .block(Self::panel_block(model, title, focused))
            .highlight_style(highlight);

        let mut state = ListState::default().with_selected(Some(cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn commit_item<'a>(model: &TuiModel, marker: &str, commit: &'a Commit) -> ListItem<'a> {
        let theme = &model.theme;
        ListItem::new(Line::from(vec![
            Span::raw(marker.to_string()),
            Span::styled(commit.id.short(7).to_string(), Style::default().fg(theme.accent)),
            Span::raw(" "),
            Span::styled(commit.summary.as_str(), Style::default().fg(theme.foreground)),
            Span::styled(
                format!("  {} {}", commit.author.name, format_timestamp(&commit.timestamp)),
                Style::default().fg(theme.muted),
            ),
        ]))
    }

    fn render_changes(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let theme = &model.theme;
        let items: Vec<ListItem> = model
            .projection
            .changes
            .iter()
            .map(|change: &FileChange| {
                let style = if change.staged {
                    Style::default().fg(theme.foreground).bg(theme.diff_added)
                } else {
                    Style::default().fg(theme.foreground)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{} ", change.status.indicator()), style),
                    Span::raw(change.path.display().to_string()),
                ]))
            })
            .collect();

        let selected = model.selection == gitpane_core::domain::SelectedItem::UncommittedChanges;
        let title = format!(
            "Changes ({} staged, {} unstaged)",
            model.projection.staged_count(),
            model.projection.unstaged_count()
        );
        let list = List::new(items).block(Self::panel_block(model, title, selected));
        frame.render_widget(list, area);
    }

    fn render_diff(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let title = match &model.projection.diff_target {
            None => "Diff".to_string(),
            Some(DiffTarget::UncommittedChanges { staged: true, .. }) => "Diff (staged)".to_string(),
            Some(DiffTarget::UncommittedChanges { staged: false, .. }) => "Diff (working tree)".to_string(),
            Some(DiffTarget::Commit { id }) => format!("Diff {}", id.short(7)),
        };

        let view = DiffView::new(&model.projection.diff_lines)
            .theme(model.theme)
            .scroll(model.ui_state.diff_scroll)
            .block(Self::panel_block(model, title, false));
        frame.render_widget(view, area);
    }

    /// Render the status/input bar at the bottom
    fn render_status_bar(model: &TuiModel, frame: &mut Frame, area: Rect) {
        let theme = &model.theme;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);

        let status = if model.is_inputting() {
            Paragraph::new(format!("{} {}", model.input.mode.prompt(), model.input.text))
                .style(Style::default().fg(theme.accent))
        } else if let Some(error) = model.latest_error() {
            let more = match model.errors.len() {
                1 => String::new(),
                n => format!(" (+{} more)", n - 1),
            };
            Paragraph::new(format!("Error: {}{}", error.message, more)).style(Style::default().fg(theme.error))
        } else {
            Paragraph::new(format!(
                "remotes: {} | submodules: {}",
                list_or_dash(&model.projection.remotes),
                list_or_dash(&model.projection.submodules)
            ))
            .style(Style::default().fg(theme.muted))
        };
        frame.render_widget(status, chunks[0]);

        let hints = if model.is_inputting() {
            "Enter Submit | Esc Cancel"
        } else {
            "j/k Move | Tab Focus | Enter Select | u Changes | a/A Stage/Unstage | c Commit | s/p Stash/Pop | b/o Branch/Checkout | f Fetch | r Refresh | x Dismiss | q Quit"
        };
        frame.render_widget(Paragraph::new(hints).style(Style::default().fg(theme.muted)), chunks[1]);
    }
}

/// Stash list height including borders, kept between 3 and 8 rows
fn stash_panel_height(stashes: usize) -> u16 {
    u16::try_from(stashes)
        .unwrap_or(u16::MAX)
        .saturating_add(2)
        .clamp(3, 8)
}

fn list_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

/// Commit time in the author's own offset
fn format_timestamp(timestamp: &Timestamp) -> String {
    let offset = FixedOffset::east_opt(timestamp.offset_minutes * 60);
    match (DateTime::from_timestamp(timestamp.seconds, 0), offset) {
        (Some(utc), Some(offset)) => utc.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string(),
        _ => timestamp.seconds.to_string(),
    }
}
