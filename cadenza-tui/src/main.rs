use std::fs::canonicalize;
use std::time::Duration;
use std::{io, path::Path, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use ratatui::{
    DefaultTerminal,
    backend::CrosstermBackend,
    crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
};

use cadenza_core::{
    commands::AudioCommand,
    engine::{AudioEngine, AudioEngineHandle},
    scanner::{self, ScanOptions},
    track::Track,
};

mod cli;
mod config;
mod router;
mod routes;
mod state;
mod states;
mod ui;

use cli::Args;
use config::AppConfig;
use router::{Router, Tab};
use state::AppState;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    // Initialize tui_logger for TUI log display
    tui_logger::init_logger(log::LevelFilter::Debug)
        .map_err(|e| anyhow::anyhow!("Failed to init tui_logger: {e}"))?;
    tui_logger::set_default_level(log::LevelFilter::Debug);

    log::info!("Starting Cadenza");

    let (engine_thread, handle) = AudioEngine::spawn(config.engine_settings())?;

    let result = run_tui(&handle, &config, &args);

    // Ensure clean shutdown
    let _ = handle.cmd_tx.send(AudioCommand::Quit);
    if engine_thread.join().is_err() {
        log::error!("Audio engine thread panicked");
    }
    result
}

fn run_tui(handle: &AudioEngineHandle, config: &AppConfig, args: &Args) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut state = AppState::new(config);
    state.audio.device = handle.device.clone();
    let mut router = Router::new(Tab::Playback.route());

    let result = setup_initial_state(&mut state, handle, config, args)
        .and_then(|_| event_loop(&mut terminal, &mut state, &mut router, handle));

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    state: &mut AppState,
    router: &mut Router,
    handle: &AudioEngineHandle,
) -> anyhow::Result<()> {
    loop {
        // Handle audio engine responses
        while let Ok(response) = handle.resp_rx.try_recv() {
            state.handle_response(response);
        }
        if state.engine_stopped {
            log::warn!("Audio engine stopped, leaving");
            return Ok(());
        }

        terminal.draw(|f| ui::draw(f, state, router))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && handle_global_keys(key.code, state, handle, router)?
                {
                    return Ok(());
                }
            }
        }
    }
}

fn setup_initial_state(
    state: &mut AppState,
    handle: &AudioEngineHandle,
    config: &AppConfig,
    args: &Args,
) -> anyhow::Result<()> {
    if let Some(dir) = args.scan_dir(config) {
        log::info!("Scanning library at {:?}", dir);
        handle.cmd_tx.send(AudioCommand::ScanDirectory(dir))?;
        state.audio.status_message = "Scanning library...".to_string();
    }

    if args.paths.is_empty() {
        return Ok(());
    }

    // Set Browser Context based on the first path
    if let Some(dir) = args.paths.first().and_then(|p| browser_dir_for(p)) {
        if state.browser.change_dir(dir) {
            log::info!("Browser context set to: {:?}", state.browser.current_dir);
        }
    }

    let tracks = collect_tracks(&args.paths, &config.scan_options());
    if tracks.is_empty() {
        state.audio.status_message = "Nothing playable in the given paths".to_string();
        return Ok(());
    }

    log::info!("Adding {} tracks to queue from CLI", tracks.len());
    handle.cmd_tx.send(AudioCommand::ReplaceQueue(tracks))?;
    handle.cmd_tx.send(AudioCommand::PlayQueueIndex(0))?;
    state.audio.status_message = "Loading queue...".to_string();

    Ok(())
}

/// Directory the browser should open for a command-line path
fn browser_dir_for(path: &Path) -> Option<PathBuf> {
    let path = canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if path.is_dir() {
        Some(path)
    } else {
        path.parent().map(|p| p.to_path_buf())
    }
}

/// Turn command-line paths into tracks: directories are scanned, files are
/// read as given.
fn collect_tracks(paths: &[PathBuf], options: &ScanOptions) -> Vec<Track> {
    let mut tracks = Vec::new();
    for path in paths {
        if path.is_dir() {
            match scanner::scan_library(path, options) {
                Ok(found) => tracks.extend(found),
                Err(e) => log::warn!("{}", e),
            }
        } else if path.is_file() {
            tracks.push(scanner::read_track(path));
        } else {
            log::warn!("No such file: {:?}", path);
        }
    }
    tracks
}

/// Handle global keys and delegate route-specific input to router
fn handle_global_keys(
    key: KeyCode,
    state: &mut AppState,
    handle: &AudioEngineHandle,
    router: &mut Router,
) -> anyhow::Result<bool> {
    // Dialogs own every key but quit
    if !state.is_dialog_open() {
        match key {
            KeyCode::Char(' ') => {
                handle.cmd_tx.send(AudioCommand::TogglePlayback)?;
                return Ok(false);
            }
            KeyCode::Char('n') => {
                handle.cmd_tx.send(AudioCommand::Next)?;
                return Ok(false);
            }
            KeyCode::Char('p') => {
                handle.cmd_tx.send(AudioCommand::Previous)?;
                return Ok(false);
            }
            KeyCode::Char('l') => {
                handle.cmd_tx.send(AudioCommand::CycleRepeatMode)?;
                return Ok(false);
            }
            KeyCode::Char('z') => {
                handle.cmd_tx.send(AudioCommand::ToggleShuffle)?;
                return Ok(false);
            }
            KeyCode::Tab => {
                let next_route = router.current().tab().next().route();
                router.replace(next_route, state, handle)?;
                return Ok(false);
            }
            _ => {}
        }
    }
    if key == KeyCode::Char('q') {
        return Ok(true);
    }

    // Delegate to the current route's input handler
    let action = router
        .current_mut()
        .handle_input(key, state, handle)
        .context("Route failed to handle input")?;
    router.execute_action(action, state, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn collects_files_and_scanned_directories() {
        let dir = TempDir::new().unwrap();
        let album = dir.path().join("album");
        fs::create_dir(&album).unwrap();
        fs::write(album.join("b.mp3"), b"x").unwrap();
        fs::write(album.join("a.flac"), b"x").unwrap();
        let single = dir.path().join("single.wav");
        fs::write(&single, b"x").unwrap();

        let paths = vec![single.clone(), album, dir.path().join("missing.mp3")];
        let tracks = collect_tracks(&paths, &ScanOptions::default());
        let titles: Vec<&str> = tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["single", "a", "b"]);
    }

    #[test]
    fn browser_opens_parent_of_a_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("song.mp3");
        fs::write(&file, b"x").unwrap();
        let expected = canonicalize(dir.path()).unwrap();
        assert_eq!(browser_dir_for(&file), Some(expected.clone()));
        assert_eq!(browser_dir_for(dir.path()), Some(expected));
    }
}
