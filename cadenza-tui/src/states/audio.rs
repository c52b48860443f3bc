use cadenza_core::track::{Track, format_duration};

/// Audio-related state (playback status, position, volume, now playing, messages)
#[derive(Debug, Clone)]
pub struct AudioState {
    /// Whether audio is currently playing
    pub is_playing: bool,
    /// Current playback position in seconds
    pub position: f32,
    /// Total duration in seconds
    pub duration: f32,
    /// Current volume (0.0 to 1.0)
    pub volume: f32,
    /// Last track the engine started
    pub now_playing: Option<Track>,
    /// Status message to display
    pub status_message: String,
    /// Error message if any
    pub error_message: Option<String>,
    /// Output device the engine plays on
    pub device: String,
}

impl AudioState {
    pub fn new(volume: f32) -> Self {
        Self {
            is_playing: false,
            position: 0.0,
            duration: 0.0,
            volume,
            now_playing: None,
            status_message: "Queue is empty. Pick files in the Browser tab.".to_string(),
            error_message: None,
            device: String::new(),
        }
    }

    /// Get the progress percentage (0.0 to 1.0)
    pub fn progress(&self) -> f32 {
        if self.duration > 0.0 {
            (self.position / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Format seconds as MM:SS (H:MM:SS past an hour)
    pub fn format_time(seconds: f32) -> String {
        format_duration((seconds.max(0.0) * 1000.0) as u64)
    }

    pub fn volume_up(&mut self) -> f32 {
        self.volume = (self.volume + 0.1).min(1.0);
        self.volume
    }

    pub fn volume_down(&mut self) -> f32 {
        self.volume = (self.volume - 0.1).max(0.0);
        self.volume
    }
}
