use cadenza_core::commands::AudioResponse;

use crate::config::AppConfig;
pub use crate::states::{AudioState, BrowserFileDialog, BrowserState, DialogChoice, QueueState};

/// Application state for the TUI
pub struct AppState {
    pub audio: AudioState,
    pub browser: BrowserState,
    pub queue: QueueState,
    /// Set when the engine reported shutdown
    pub engine_stopped: bool,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            audio: AudioState::new(config.volume),
            browser: BrowserState::new(config.music_directory.clone(), config.scan_options()),
            queue: QueueState::new(),
            engine_stopped: false,
        }
    }

    /// Handle response from the audio engine
    pub fn handle_response(&mut self, response: AudioResponse) {
        match response {
            AudioResponse::Playing => {
                self.audio.is_playing = true;
                self.audio.error_message = None;
                self.audio.status_message = "Playing".to_string();
            }
            AudioResponse::Paused => {
                self.audio.is_playing = false;
                self.audio.status_message = "Paused".to_string();
            }
            AudioResponse::Stopped => {
                self.audio.is_playing = false;
                self.audio.position = 0.0;
                if self.audio.error_message.is_none() {
                    self.audio.status_message = "Stopped".to_string();
                }
            }
            AudioResponse::TrackChanged { index, track } => {
                self.audio.duration = track.duration_ms as f32 / 1000.0;
                self.audio.position = 0.0;
                self.audio.error_message = None;
                self.audio.status_message = format!(
                    "Track {}/{}: {}",
                    index + 1,
                    self.queue.len().max(index + 1),
                    track.display_title()
                );
                self.audio.now_playing = Some(track);
                self.queue.set_current(Some(index));
                self.queue.select(index);
            }
            AudioResponse::QueueUpdated(snapshot) => {
                // Pick up durations resolved after loading
                if let Some(playing) = &mut self.audio.now_playing {
                    if let Some(fresh) = snapshot.items.iter().find(|t| t.id == playing.id) {
                        *playing = fresh.clone();
                    }
                }
                self.queue.apply_snapshot(snapshot);
            }
            AudioResponse::CursorChanged(index) => {
                self.queue.set_current(index);
            }
            AudioResponse::ModesChanged { shuffle, repeat } => {
                self.queue.set_modes(shuffle, repeat);
                self.audio.status_message = format!(
                    "Shuffle {} | Repeat {}",
                    if shuffle { "on" } else { "off" },
                    repeat
                );
            }
            AudioResponse::UpNext(index) => {
                self.queue.next_index = index;
            }
            AudioResponse::Position { current, total } => {
                self.audio.position = current;
                if total > 0.0 {
                    self.audio.duration = total;
                }
            }
            AudioResponse::ScanFinished { root, count } => {
                self.audio.status_message =
                    format!("Scanned {}: {} tracks", root.display(), count);
            }
            AudioResponse::Error(msg) => {
                self.audio.status_message = format!("Error: {}", msg);
                self.audio.error_message = Some(msg);
            }
            AudioResponse::Shutdown => {
                self.engine_stopped = true;
                self.audio.is_playing = false;
                self.audio.status_message = "Engine shutdown".to_string();
            }
        }
    }

    /// Check if dialog is open (convenience delegate)
    pub fn is_dialog_open(&self) -> bool {
        self.browser.is_dialog_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::{
        queue::{QueueSnapshot, RepeatMode},
        track::Track,
    };

    fn state() -> AppState {
        let config = AppConfig {
            music_directory: None,
            ..AppConfig::default()
        };
        AppState::new(&config)
    }

    fn snapshot_of(items: Vec<Track>, current_index: Option<usize>) -> QueueSnapshot {
        QueueSnapshot {
            order: items.iter().map(|t| t.id).collect(),
            items,
            current_index,
            shuffle: false,
            repeat: RepeatMode::Off,
        }
    }

    #[test]
    fn track_change_updates_now_playing_and_cursor() {
        let mut state = state();
        let tracks = vec![
            Track::new("/a.mp3", "A", "x", "y", 0),
            Track::new("/b.mp3", "B", "x", "y", 120_000),
        ];
        state.handle_response(AudioResponse::QueueUpdated(snapshot_of(tracks.clone(), None)));
        state.handle_response(AudioResponse::TrackChanged {
            index: 1,
            track: tracks[1].clone(),
        });
        state.handle_response(AudioResponse::Playing);

        assert!(state.audio.is_playing);
        assert_eq!(state.audio.duration, 120.0);
        assert_eq!(state.queue.current_index(), Some(1));
        assert_eq!(state.queue.selected(), Some(1));
    }

    #[test]
    fn resolved_duration_reaches_now_playing() {
        let mut state = state();
        let track = Track::new("/a.mp3", "A", "x", "y", 0);
        state.handle_response(AudioResponse::TrackChanged {
            index: 0,
            track: track.clone(),
        });
        let resolved = track.with_duration_ms(61_000);
        state.handle_response(AudioResponse::QueueUpdated(snapshot_of(vec![resolved], Some(0))));

        assert_eq!(state.audio.now_playing.unwrap().duration_ms, 61_000);
    }

    #[test]
    fn error_survives_following_stop() {
        let mut state = state();
        state.handle_response(AudioResponse::Error("cannot decode".to_string()));
        state.handle_response(AudioResponse::Stopped);
        assert_eq!(state.audio.status_message, "Error: cannot decode");
        assert!(!state.audio.is_playing);
    }

    #[test]
    fn modes_and_cursor_track_engine() {
        let mut state = state();
        state.handle_response(AudioResponse::ModesChanged {
            shuffle: true,
            repeat: RepeatMode::One,
        });
        state.handle_response(AudioResponse::CursorChanged(None));
        assert!(state.queue.shuffle());
        assert_eq!(state.queue.repeat(), RepeatMode::One);
        assert_eq!(state.queue.current_index(), None);
    }

    #[test]
    fn up_next_comes_from_engine() {
        let mut state = state();
        let tracks = vec![
            Track::new("/a.mp3", "A", "x", "y", 0),
            Track::new("/b.mp3", "B", "x", "y", 0),
        ];
        state.handle_response(AudioResponse::QueueUpdated(snapshot_of(tracks, Some(0))));
        state.handle_response(AudioResponse::UpNext(Some(1)));
        assert_eq!(state.queue.up_next().map(|t| t.title.as_str()), Some("B"));

        state.handle_response(AudioResponse::UpNext(None));
        assert!(state.queue.up_next().is_none());
    }
}
