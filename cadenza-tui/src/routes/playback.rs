use cadenza_core::{commands::AudioCommand, engine::AudioEngineHandle, queue::RepeatMode};
use ratatui::{
    Frame,
    crossterm::event::KeyCode,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
};
use strum::IntoEnumIterator;

use crate::{
    router::{RouteAction, RouteHandler, Tab},
    state::AppState,
    states::AudioState,
};

const SEEK_STEP_SECS: f32 = 5.0;

// ==================================================================
// Playback Route Implementation
// ==================================================================

#[derive(Debug, Clone)]
pub struct PlaybackRoute;

impl RouteHandler for PlaybackRoute {
    fn render(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        draw_playback_panel(frame, area, state);
    }

    fn handle_input(
        &mut self,
        key: KeyCode,
        state: &mut AppState,
        handle: &AudioEngineHandle,
    ) -> anyhow::Result<RouteAction> {
        match key {
            KeyCode::Up => {
                let volume = state.audio.volume_up();
                handle.cmd_tx.send(AudioCommand::SetVolume(volume))?;
            }
            KeyCode::Down => {
                let volume = state.audio.volume_down();
                handle.cmd_tx.send(AudioCommand::SetVolume(volume))?;
            }
            KeyCode::Right => {
                let new_pos = state.audio.position + SEEK_STEP_SECS;
                handle.cmd_tx.send(AudioCommand::Seek(new_pos))?;
            }
            KeyCode::Left => {
                let new_pos = (state.audio.position - SEEK_STEP_SECS).max(0.0);
                handle.cmd_tx.send(AudioCommand::Seek(new_pos))?;
            }
            KeyCode::Char('s') => {
                handle.cmd_tx.send(AudioCommand::Stop)?;
            }
            _ => {}
        }
        Ok(RouteAction::None)
    }

    fn tab(&self) -> Tab {
        Tab::Playback
    }

    fn help_items(&self, _state: &AppState) -> Vec<(&'static str, &'static str)> {
        vec![
            ("Space", "Play/Pause"),
            ("N/P", "Next/Prev"),
            ("S", "Stop"),
            ("←/→", "Seek"),
            ("↑/↓", "Volume"),
            ("Z", "Shuffle"),
            ("L", "Repeat"),
            ("Q", "Quit"),
        ]
    }
}

/// Draw the playback panel
pub fn draw_playback_panel(f: &mut Frame, area: Rect, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Now playing info
            Constraint::Length(3), // Progress bar
            Constraint::Length(3), // Modes
            Constraint::Min(0),    // Up next
        ])
        .split(area);

    draw_now_playing(f, chunks[0], state);
    draw_progress(f, chunks[1], state);
    draw_modes(f, chunks[2], state);
    draw_up_next(f, chunks[3], state);
}

/// Draw the now playing section
fn draw_now_playing(f: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title(" 🎵 Now Playing ")
        .borders(Borders::ALL)
        .border_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    let inner = block.inner(area);
    f.render_widget(block, area);

    if let Some(track) = &state.audio.now_playing {
        let text = vec![
            Line::from(vec![Span::styled(
                track.display_title(),
                Style::default().fg(Color::White).bold(),
            )]),
            Line::from(vec![Span::styled(
                track.artist.as_str(),
                Style::default().fg(Color::Gray),
            )]),
            Line::from(vec![Span::styled(
                track.album.as_str(),
                Style::default().fg(Color::DarkGray),
            )]),
        ];

        f.render_widget(Paragraph::new(text), inner);
    } else {
        let text = Paragraph::new("Nothing playing").style(Style::default().fg(Color::DarkGray));
        f.render_widget(text, inner);
    }
}

/// Draw the progress bar
fn draw_progress(f: &mut Frame, area: Rect, state: &AppState) {
    let progress_pct = (state.audio.progress() * 100.0) as u16;
    let duration_str = if state.audio.duration > 0.0 {
        AudioState::format_time(state.audio.duration)
    } else {
        "--:--".to_string()
    };
    let label = format!(
        "{} / {}",
        AudioState::format_time(state.audio.position),
        duration_str
    );

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
        .percent(progress_pct)
        .label(label);

    f.render_widget(gauge, area);
}

/// Shuffle flag and the repeat modes, active one highlighted
fn draw_modes(f: &mut Frame, area: Rect, state: &AppState) {
    let active = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let inactive = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled(
            "🔀 Shuffle",
            if state.queue.shuffle() { active } else { inactive },
        ),
        Span::raw("   "),
    ];
    for mode in RepeatMode::iter() {
        let style = if mode == state.queue.repeat() {
            active
        } else {
            inactive
        };
        spans.push(Span::styled(mode.to_string(), style));
        spans.push(Span::raw("  "));
    }
    spans.push(Span::styled(
        format!(" Vol: {:3.0}%", state.audio.volume * 100.0),
        Style::default().fg(Color::Gray),
    ));

    let paragraph = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" Modes "));
    f.render_widget(paragraph, area);
}

fn draw_up_next(f: &mut Frame, area: Rect, state: &AppState) {
    let text = match state.queue.up_next() {
        Some(track) => Line::from(vec![
            Span::styled(track.display_title(), Style::default().fg(Color::White)),
            Span::styled(
                format!("  {}", track.artist),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        None => Line::from(Span::styled("End of queue", Style::default().fg(Color::DarkGray))),
    };

    let paragraph = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(" Up Next "));
    f.render_widget(paragraph, area);
}
