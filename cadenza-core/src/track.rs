use std::fmt::Display;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TRACK_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a queue item.
///
/// Two tracks are the same item iff their ids are equal; cloning a [`Track`]
/// keeps its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(u64);

impl TrackId {
    /// Allocate a new process-unique id
    pub fn next() -> Self {
        TrackId(NEXT_TRACK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A playable item in the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: TrackId,
    /// Display title
    pub title: String,
    /// Display subtitle
    pub artist: String,
    /// Grouping label
    pub album: String,
    /// Filesystem path or content reference, handed as-is to the output
    pub source: String,
    /// Length in milliseconds, 0 when unknown
    pub duration_ms: u64,
}

impl Track {
    pub fn new(
        source: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            id: TrackId::next(),
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            source: source.into(),
            duration_ms,
        }
    }

    /// Same item with a duration resolved by the output
    pub fn with_duration_ms(&self, duration_ms: u64) -> Self {
        Self {
            duration_ms,
            ..self.clone()
        }
    }

    /// Title, or the file stem of the source when the title is blank
    pub fn display_title(&self) -> String {
        if !self.title.trim().is_empty() {
            return self.title.clone();
        }
        Path::new(&self.source)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source.clone())
    }

    pub fn is_duration_known(&self) -> bool {
        self.duration_ms > 0
    }
}

impl Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Track:  {} - {}", self.display_title(), self.artist)?;
        writeln!(f, "Album:  {}", self.album)?;
        if self.is_duration_known() {
            writeln!(f, "Length: {}", format_duration(self.duration_ms))?;
        } else {
            writeln!(f, "Length: --:--")?;
        }
        Ok(())
    }
}

/// Format milliseconds as `MM:SS`, or `H:MM:SS` from one hour up
pub fn format_duration(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}
