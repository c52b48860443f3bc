use cadenza_core::{commands::AudioCommand, engine::AudioEngineHandle, track::format_duration};
use ratatui::{
    Frame,
    crossterm::event::KeyCode,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use crate::{
    router::{RouteAction, RouteHandler, Tab},
    state::AppState,
};

/// Queue route
#[derive(Debug, Clone)]
pub struct QueueRoute;

impl RouteHandler for QueueRoute {
    fn render(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        draw_queue_panel(frame, area, state);
    }

    fn handle_input(
        &mut self,
        key: KeyCode,
        state: &mut AppState,
        handle: &AudioEngineHandle,
    ) -> anyhow::Result<RouteAction> {
        match key {
            KeyCode::Up => state.queue.prev(),
            KeyCode::Down => state.queue.next(),
            KeyCode::Enter => {
                if let Some(idx) = state.queue.selected() {
                    handle.cmd_tx.send(AudioCommand::PlayQueueIndex(idx))?;
                }
            }
            // Move the selected item, the selection travels with it
            KeyCode::Char('K') => {
                if let Some(idx) = state.queue.selected().filter(|i| *i > 0) {
                    handle.cmd_tx.send(AudioCommand::MoveItem {
                        from: idx,
                        to: idx - 1,
                    })?;
                    state.queue.select(idx - 1);
                }
            }
            KeyCode::Char('J') => {
                if let Some(idx) = state
                    .queue
                    .selected()
                    .filter(|i| i + 1 < state.queue.len())
                {
                    handle.cmd_tx.send(AudioCommand::MoveItem {
                        from: idx,
                        to: idx + 1,
                    })?;
                    state.queue.select(idx + 1);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(idx) = state.queue.selected() {
                    handle.cmd_tx.send(AudioCommand::RemoveItem(idx))?;
                }
            }
            KeyCode::Char('c') => {
                handle.cmd_tx.send(AudioCommand::ClearQueue)?;
            }
            _ => {}
        }
        Ok(RouteAction::None)
    }

    fn tab(&self) -> Tab {
        Tab::Queue
    }

    fn help_items(&self, _state: &AppState) -> Vec<(&'static str, &'static str)> {
        vec![
            ("↑/↓", "Navigate"),
            ("Enter", "Play"),
            ("J/K", "Move"),
            ("D", "Remove"),
            ("C", "Clear"),
            ("Z", "Shuffle"),
            ("L", "Repeat"),
            ("Q", "Quit"),
        ]
    }
}

/// Draw the queue panel
pub fn draw_queue_panel(f: &mut Frame, area: Rect, state: &AppState) {
    let title = format!(
        " Queue ({} tracks{}) ",
        state.queue.len(),
        if state.queue.shuffle() { ", shuffled" } else { "" }
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if state.queue.is_empty() {
        let empty_msg = Paragraph::new("Queue is empty. Add files from Browser.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(empty_msg, area);
        return;
    }

    // With shuffle on, show where each item falls in playback order
    let positions = state.queue.shuffle().then(|| state.queue.order_positions());

    let items: Vec<ListItem> = state
        .queue
        .items()
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let is_current = state.queue.current_index() == Some(i);
            let prefix = if is_current { "▶ " } else { "  " };
            let style = if is_current {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let mut spans = vec![Span::styled(
                format!("{}{}", prefix, track.display_title()),
                style,
            )];
            spans.push(Span::styled(
                format!("  {}", track.artist),
                Style::default().fg(Color::Gray),
            ));
            if track.is_duration_known() {
                spans.push(Span::styled(
                    format!("  {}", format_duration(track.duration_ms)),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            if let Some(pos) = positions.as_ref().and_then(|p| p.get(&track.id)) {
                spans.push(Span::styled(
                    format!("  🔀{}", pos),
                    Style::default().fg(Color::Magenta),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    let mut list_state = state.queue.list_state.clone();
    f.render_stateful_widget(list, area, &mut list_state);
}
