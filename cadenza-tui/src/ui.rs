use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use strum::IntoEnumIterator;

use crate::{
    router::{Router, Tab},
    state::AppState,
};

/// Draw the TUI interface
pub fn draw(f: &mut Frame, state: &AppState, router: &Router) {
    // Main horizontal split: Sidebar (left) and Main Content (right)
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([
            Constraint::Length(15), // Sidebar navigation
            Constraint::Min(40),    // Main content area
        ])
        .split(f.area());

    draw_sidebar(f, main_chunks[0], router.current().tab());
    draw_main_content(f, main_chunks[1], state, router);
}

/// Draw the sidebar navigation
fn draw_sidebar(f: &mut Frame, area: Rect, active: Tab) {
    let block = Block::default()
        .title(" Navigation ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let nav_text: Vec<Line> = Tab::iter()
        .map(|tab| {
            let is_active = tab == active;
            let prefix = if is_active { "▶ " } else { "  " };
            let style = if is_active {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(Span::styled(format!("{}{}", prefix, tab), style))
        })
        .collect();

    f.render_widget(Paragraph::new(nav_text), inner);
}

/// Draw the active route with the shared footers below it
fn draw_main_content(f: &mut Frame, area: Rect, state: &AppState, router: &Router) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Route content
            Constraint::Length(3), // Controls info
            Constraint::Length(3), // Status bar
        ])
        .split(area);

    let route = router.current();
    route.render(f, chunks[0], state);
    draw_controls(f, chunks[1], &route.help_items(state));
    draw_status(f, chunks[2], state);
}

/// Draw the controls help section
fn draw_controls(f: &mut Frame, area: Rect, items: &[(&str, &str)]) {
    let mut controls = Vec::with_capacity(items.len() * 2);
    for (key, label) in items {
        let color = match *key {
            "Q" => Color::Red,
            "Tab" => Color::Magenta,
            _ => Color::Yellow,
        };
        controls.push(Span::styled(format!("[{}]", key), Style::default().fg(color)));
        controls.push(Span::raw(format!(" {}  ", label)));
    }

    let paragraph = Paragraph::new(Line::from(controls))
        .block(Block::default().borders(Borders::ALL).title(" Controls "));

    f.render_widget(paragraph, area);
}

/// Draw the status section
fn draw_status(f: &mut Frame, area: Rect, state: &AppState) {
    let status_style = if state.audio.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else if state.audio.is_playing {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Yellow)
    };

    let shuffle = if state.queue.shuffle() { "🔀 On" } else { "🔀 Off" };
    let mut status_text = format!(
        "{}  |  Vol: {:3.0}%  |  Queue: {}  |  {}  |  {}",
        state.audio.status_message,
        state.audio.volume * 100.0,
        state.queue.len(),
        shuffle,
        state.queue.repeat()
    );
    if !state.audio.device.is_empty() {
        status_text.push_str(&format!("  |  🔊 {}", state.audio.device));
    }

    let paragraph = Paragraph::new(status_text)
        .style(status_style)
        .block(Block::default().borders(Borders::ALL).title(" Status "));

    f.render_widget(paragraph, area);
}
