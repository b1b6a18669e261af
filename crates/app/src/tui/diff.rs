//! Diff viewer widget

use gitpane_core::domain::DiffLineKind;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Widget},
};

use super::theme::Theme;

/// Renders diff lines one per row, in order, truncated to the row width
pub struct DiffView<'a> {
    lines: &'a [String],
    theme: Theme,
    scroll: usize,
    block: Option<Block<'a>>,
}

impl<'a> DiffView<'a> {
    pub fn new(lines: &'a [String]) -> Self {
        Self {
            lines,
            theme: Theme::default(),
            scroll: 0,
            block: None,
        }
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// First line to show
    pub fn scroll(mut self, offset: usize) -> Self {
        self.scroll = offset;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn style_for(&self, kind: DiffLineKind) -> Style {
        match kind {
            DiffLineKind::Added => self.theme.added_style(),
            DiffLineKind::Removed => self.theme.removed_style(),
            DiffLineKind::HunkHeader => self.theme.hunk_style(),
            DiffLineKind::Context => self.theme.context_style(),
        }
    }
}

impl Widget for DiffView<'_> {
    fn render(mut self, area: Rect, buf: &mut Buffer) {
        let inner = match self.block.take() {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        if self.lines.is_empty() {
            let msg = "No changes to display";
            let x = inner.x + inner.width.saturating_sub(msg.len() as u16) / 2;
            let y = inner.y + inner.height / 2;
            buf.set_stringn(x, y, msg, inner.width as usize, Style::default().fg(self.theme.muted));
            return;
        }

        let visible = self.lines.iter().skip(self.scroll).take(inner.height as usize);
        for (row, line) in visible.enumerate() {
            let y = inner.y + row as u16;
            let style = self.style_for(DiffLineKind::classify(line));

            // Added and removed rows are highlighted across the full width
            buf.set_style(Rect::new(inner.x, y, inner.width, 1), style);
            buf.set_stringn(inner.x, y, line, inner.width as usize, style);
        }
    }
}
