use gitpane_core::ports::ThemeName;
use ratatui::style::{Color, Modifier, Style};

/// Colors used across the panels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub foreground: Color,
    pub muted: Color,
    pub accent: Color,
    pub selection: Color,
    pub error: Color,
    pub diff_added: Color,
    pub diff_removed: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            foreground: Color::White,
            muted: Color::DarkGray,
            accent: Color::Cyan,
            selection: Color::Rgb(0x3a, 0x3d, 0x41),
            error: Color::Red,
            diff_added: Color::Rgb(0x56, 0x6f, 0x5a),
            diff_removed: Color::Rgb(0x6f, 0x58, 0x5e),
        }
    }

    pub fn light() -> Self {
        Self {
            foreground: Color::Black,
            muted: Color::Gray,
            accent: Color::Blue,
            selection: Color::Rgb(0xd0, 0xdc, 0xf0),
            error: Color::Red,
            diff_added: Color::Rgb(0xd7, 0xeb, 0xd0),
            diff_removed: Color::Rgb(0xf0, 0xd4, 0xd4),
        }
    }

    pub fn from_name(name: ThemeName) -> Self {
        match name {
            ThemeName::Dark => Self::dark(),
            ThemeName::Light => Self::light(),
        }
    }

    pub fn added_style(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.diff_added)
    }

    pub fn removed_style(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.diff_removed)
    }

    pub fn hunk_style(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn context_style(&self) -> Style {
        Style::default().fg(self.foreground)
    }

    pub fn selected_style(&self) -> Style {
        Style::default().bg(self.selection).add_modifier(Modifier::BOLD)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
