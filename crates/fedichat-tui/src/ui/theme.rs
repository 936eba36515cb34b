use ratatui::style::{Color, Modifier, Style};

pub const ACCENT: Color = Color::Cyan;
pub const ERROR: Color = Color::Red;
pub const TEXT_DIM: Color = Color::DarkGray;

pub fn text_primary() -> Style {
    Style::default().fg(Color::White)
}

pub fn text_muted() -> Style {
    Style::default().fg(Color::Gray)
}

pub fn text_dim() -> Style {
    Style::default().fg(TEXT_DIM)
}

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn error() -> Style {
    Style::default().fg(ERROR).add_modifier(Modifier::BOLD)
}

pub fn unread_badge() -> Style {
    Style::default().fg(Color::Black).bg(ACCENT)
}

pub fn selected_row() -> Style {
    Style::default().add_modifier(Modifier::REVERSED)
}

pub fn bot_badge() -> Style {
    Style::default().fg(Color::Magenta)
}
