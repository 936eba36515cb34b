use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use tokio::sync::mpsc;

use fedichat_core::{TimelineCommand, TimelineHandle, TimelineUpdate};

use crate::app::App;
use crate::ui::views::chats;
use crate::ui::Tui;

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

pub(crate) async fn run_app(
    terminal: &mut Tui,
    app: &mut App,
    handle: TimelineHandle,
    mut update_rx: mpsc::Receiver<TimelineUpdate>,
) -> Result<()> {
    let mut event_stream = EventStream::new();

    loop {
        terminal.draw(|f| chats::render(f, app))?;

        tokio::select! {
            update = update_rx.recv() => {
                let Some(update) = update else { break };
                app.apply_update(update, now_ms());
            }
            event = event_stream.next() => {
                let Some(Ok(event)) = event else { break };
                if let Event::Key(key) = event {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    handle_key(app, &handle, key.code, key.modifiers).await?;
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

async fn handle_key(
    app: &mut App,
    handle: &TimelineHandle,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<()> {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        KeyCode::Char('r') => handle.send(TimelineCommand::Refresh).await?,
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            if app.at_bottom() {
                handle.send(TimelineCommand::LoadOlder).await?;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('G') | KeyCode::End => {
            handle.send(TimelineCommand::LoadOlder).await?;
        }
        KeyCode::Enter => {
            if let Some(boundary_id) = app.selected_gap() {
                handle
                    .send(TimelineCommand::ExpandGap { boundary_id })
                    .await?;
            }
        }
        _ => {}
    }
    Ok(())
}
