use cadenza_core::{commands::AudioCommand, engine::AudioEngineHandle};
use ratatui::{
    Frame,
    crossterm::event::KeyCode,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};
use strum::IntoEnumIterator;

use crate::{
    router::{RouteAction, RouteHandler, Tab},
    routes::playback::PlaybackRoute,
    state::{AppState, BrowserFileDialog, DialogChoice},
};

/// Browser route - handles both browsing and file dialog as internal state
#[derive(Debug, Clone)]
pub struct BrowserRoute;

impl RouteHandler for BrowserRoute {
    fn render(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        draw_browser_panel(frame, area, state);
        if state.is_dialog_open() {
            draw_browser_dialog(frame, frame.area(), state);
        }
    }

    fn handle_input(
        &mut self,
        key: KeyCode,
        state: &mut AppState,
        handle: &AudioEngineHandle,
    ) -> anyhow::Result<RouteAction> {
        if state.browser.is_dialog_open() {
            return handle_dialog_input(key, state, handle);
        }

        match key {
            KeyCode::Up => state.browser.prev(),
            KeyCode::Down => state.browser.next(),
            KeyCode::Enter => {
                if let Some(path) = state.browser.enter() {
                    state.browser.open_dialog(path);
                }
            }
            KeyCode::Backspace => {
                if let Some(parent) = state.browser.current_dir.parent() {
                    let parent = parent.to_path_buf();
                    state.browser.change_dir(parent);
                }
            }
            KeyCode::Char('a') => {
                let files = state.browser.files();
                if !files.is_empty() {
                    state.audio.status_message = format!("Queued {} files", files.len());
                    handle.cmd_tx.send(AudioCommand::AppendPaths(files))?;
                }
            }
            KeyCode::Char('r') => {
                handle.cmd_tx.send(AudioCommand::ScanDirectory(
                    state.browser.current_dir.clone(),
                ))?;
                state.audio.status_message =
                    format!("Scanning {}...", state.browser.current_dir.display());
            }
            _ => {}
        }
        Ok(RouteAction::None)
    }

    fn tab(&self) -> Tab {
        Tab::Browser
    }

    fn help_items(&self, state: &AppState) -> Vec<(&'static str, &'static str)> {
        if state.is_dialog_open() {
            return vec![("↑/↓", "Choose"), ("Enter", "Confirm"), ("Esc", "Cancel")];
        }
        vec![
            ("↑/↓", "Nav"),
            ("Enter", "Select"),
            ("Bksp", "Up"),
            ("A", "Add Folder"),
            ("R", "Scan Library"),
            ("Q", "Quit"),
        ]
    }
}

fn handle_dialog_input(
    key: KeyCode,
    state: &mut AppState,
    handle: &AudioEngineHandle,
) -> anyhow::Result<RouteAction> {
    match key {
        KeyCode::Up | KeyCode::Down => state.browser.dialog_toggle(),
        KeyCode::Esc => state.browser.close_dialog(),
        KeyCode::Enter => {
            let BrowserFileDialog::Open { path, selected } = state.browser.dialog.clone() else {
                return Ok(RouteAction::None);
            };
            state.browser.close_dialog();

            match selected {
                DialogChoice::PlayNow => {
                    // The folder becomes the queue, starting at the picked file
                    let paths = state.browser.files();
                    let start = paths.iter().position(|f| *f == path).unwrap_or(0);
                    handle.cmd_tx.send(AudioCommand::PlayPaths { paths, start })?;
                    return Ok(RouteAction::Replace(Box::new(PlaybackRoute)));
                }
                DialogChoice::AddToQueue => {
                    let name = path.file_name().map(|s| s.to_string_lossy().to_string());
                    state.audio.status_message =
                        format!("Queued {}", name.as_deref().unwrap_or("file"));
                    handle.cmd_tx.send(AudioCommand::AppendPaths(vec![path]))?;
                }
            }
        }
        _ => {}
    }
    Ok(RouteAction::None)
}

pub fn draw_browser_panel(f: &mut Frame, area: Rect, state: &AppState) {
    let title = format!(" Browser: {} ", state.browser.current_dir.to_string_lossy());

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let items: Vec<ListItem> = state
        .browser
        .items
        .iter()
        .map(|item| {
            let icon = if item.is_dir { "📁" } else { "🎵" };
            let color = if item.is_dir {
                Color::Blue
            } else {
                Color::White
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", icon), Style::default().fg(color)),
                Span::raw(&item.name),
            ]))
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

    // render_stateful_widget needs a mutable ListState, render only has &AppState
    let mut list_state = state.browser.list_state.clone();
    f.render_stateful_widget(list, area, &mut list_state);
}

/// Draw the browser file dialog overlay
fn draw_browser_dialog(f: &mut Frame, area: Rect, state: &AppState) {
    let BrowserFileDialog::Open { path, selected } = &state.browser.dialog else {
        return;
    };

    let dialog_width = 40.min(area.width);
    let dialog_height = 6.min(area.height);
    let x = (area.width.saturating_sub(dialog_width)) / 2;
    let y = (area.height.saturating_sub(dialog_height)) / 2;
    let dialog_area = Rect::new(x, y, dialog_width, dialog_height);

    f.render_widget(Clear, dialog_area);

    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());

    let block = Block::default()
        .title(format!(" {} ", filename))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(dialog_area);
    f.render_widget(block, dialog_area);

    let text: Vec<Line> = DialogChoice::iter()
        .map(|choice| {
            let is_selected = choice == *selected;
            let style = if is_selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            let prefix = if is_selected { "> " } else { "  " };
            Line::from(Span::styled(format!("{}{}", prefix, choice), style))
        })
        .collect();

    f.render_widget(Paragraph::new(text), inner);
}
