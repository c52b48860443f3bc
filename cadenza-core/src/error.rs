use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by an [`AudioOutput`](crate::output::AudioOutput)
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no audio output device available: {0}")]
    DeviceUnavailable(String),

    #[error("failed to open '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode '{path}': {reason}")]
    Decode { path: String, reason: String },

    #[error("unsupported source locator '{0}'")]
    UnsupportedSource(String),

    #[error("seek failed: {0}")]
    Seek(String),
}

/// Failures while scanning a music library
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),

    #[error("failed to walk '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}
