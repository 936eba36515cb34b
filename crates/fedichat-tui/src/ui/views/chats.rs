//! Renders the chat list from the bound row states.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::chat_row::{ChatRowState, RowKind};
use crate::ui::format::truncate_with_ellipsis;
use crate::ui::theme;

pub fn render(f: &mut Frame, app: &App) {
    let [list_area, status_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(f.area());

    render_list(f, app, list_area);
    render_status(f, app, status_area);
}

fn render_list(f: &mut Frame, app: &App, area: Rect) {
    let height = area.height.saturating_sub(2) as usize;
    let offset = app.selected.saturating_sub(height.saturating_sub(1));
    let width = (area.width as usize).saturating_sub(4);

    let mut lines: Vec<Line> = Vec::new();
    for (index, row) in app.rows.iter().enumerate().skip(offset).take(height) {
        let mut line = row_line(row, width);
        if index == app.selected {
            line = line.style(theme::selected_row());
        }
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled("No chats yet", theme::text_muted())));
    }

    let list = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(" Chats ", theme::accent())),
    );
    f.render_widget(list, area);
}

fn row_line(row: &ChatRowState, width: usize) -> Line<'static> {
    if row.kind == RowKind::LoadMore {
        let label = if row.loading {
            "Loading..."
        } else {
            "Load more"
        };
        return Line::from(Span::styled(format!("  ··· {label} ···"), theme::text_dim()));
    }

    let mut spans: Vec<Span> = vec![
        Span::styled(format!(" {} ", row.avatar_glyph), theme::accent()),
        Span::styled(row.display_name.clone(), theme::text_primary()),
    ];
    if row.bot_badge {
        spans.push(Span::styled(" [bot]", theme::bot_badge()));
    }
    spans.push(Span::styled(format!(" {}", row.handle), theme::text_dim()));
    if row.unread > 0 {
        spans.push(Span::styled(format!(" {} ", row.unread), theme::unread_badge()));
    }

    let mut preview = row.preview.clone();
    if row.has_attachment {
        preview = format!("📎 {preview}");
    }
    let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let remaining = width
        .saturating_sub(used)
        .saturating_sub(row.timestamp.chars().count() + 3);
    spans.push(Span::styled(
        format!("  {}", truncate_with_ellipsis(&preview, remaining)),
        theme::text_muted(),
    ));
    spans.push(Span::styled(
        format!("  {}", row.timestamp),
        theme::text_dim(),
    ));
    Line::from(spans)
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let line = if app.fetch_failed {
        Line::from(Span::styled(
            " Refresh failed - press r to retry ",
            theme::error(),
        ))
    } else {
        Line::from(vec![
            Span::styled(" q", theme::accent()),
            Span::styled(" quit  ", theme::text_dim()),
            Span::styled("r", theme::accent()),
            Span::styled(" refresh  ", theme::text_dim()),
            Span::styled("j/k", theme::accent()),
            Span::styled(" select  ", theme::text_dim()),
            Span::styled("enter", theme::accent()),
            Span::styled(" load gap  ", theme::text_dim()),
            Span::styled("G", theme::accent()),
            Span::styled(" older", theme::text_dim()),
        ])
    };
    f.render_widget(Paragraph::new(line), area);
}
