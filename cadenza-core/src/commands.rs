use std::path::PathBuf;

use crate::{
    queue::{QueueSnapshot, RepeatMode},
    track::Track,
};

/// Commands sent from the TUI to the audio engine
#[derive(Debug, Clone)]
pub enum AudioCommand {
    /// Replace the whole queue
    ReplaceQueue(Vec<Track>),
    /// Append tracks to the end of the queue
    AppendToQueue(Vec<Track>),
    /// Read tags for these files and append them to the queue
    AppendPaths(Vec<PathBuf>),
    /// Read tags for these files, make them the queue and play `start`
    PlayPaths { paths: Vec<PathBuf>, start: usize },
    /// Stop playback and empty the queue
    ClearQueue,
    /// Play the track at the given queue index
    PlayQueueIndex(usize),
    /// Start or resume playback
    Play,
    /// Pause playback
    Pause,
    /// Pause when playing, resume otherwise
    TogglePlayback,
    /// Stop playback and reset position
    Stop,
    /// Skip to next track in playback order
    Next,
    /// Skip to previous track in playback order
    Previous,
    /// Seek to position in seconds
    Seek(f32),
    /// Set volume (0.0 to 1.0)
    SetVolume(f32),
    ToggleShuffle,
    SetShuffle(bool),
    SetRepeatMode(RepeatMode),
    CycleRepeatMode,
    /// Move a queue item from one index to another
    MoveItem { from: usize, to: usize },
    /// Remove the queue item at the given index
    RemoveItem(usize),
    /// Scan a directory and replace the queue with what was found
    ScanDirectory(PathBuf),
    /// Shutdown the audio engine
    Quit,
}

/// Responses sent from the audio engine to the TUI
#[derive(Debug, Clone)]
pub enum AudioResponse {
    /// Playback has started
    Playing,
    /// Playback has been paused
    Paused,
    /// Playback has been stopped
    Stopped,
    /// A new track was loaded from the queue
    TrackChanged { index: usize, track: Track },
    /// Queue contents or playback order changed
    QueueUpdated(QueueSnapshot),
    /// The current queue index moved (selection, navigation or reordering)
    CursorChanged(Option<usize>),
    ModesChanged { shuffle: bool, repeat: RepeatMode },
    /// Queue index that plays when the current track finishes
    UpNext(Option<usize>),
    /// Current playback position in seconds and total duration
    Position { current: f32, total: f32 },
    /// A library scan finished with `count` tracks
    ScanFinished { root: PathBuf, count: usize },
    /// An error occurred
    Error(String),
    /// Engine is shutting down
    Shutdown,
}
