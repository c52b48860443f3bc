use std::path::Path;

use lofty::{
    file::{AudioFile, TaggedFileExt},
    probe::Probe,
    tag::Accessor,
};
use walkdir::WalkDir;

use crate::{error::ScanError, track::Track};

pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg", "m4a", "aac"];

const UNKNOWN: &str = "Unknown";

/// Which files a library scan picks up
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Lowercase extensions without the dot
    pub extensions: Vec<String>,
    pub follow_links: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: SUPPORTED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            follow_links: true,
        }
    }
}

impl ScanOptions {
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false)
    }
}

/// Recursively collect audio files under `root` as tracks, sorted by title.
///
/// Files whose tags cannot be read are still included, titled after their
/// file stem.
pub fn scan_library(root: &Path, options: &ScanOptions) -> Result<Vec<Track>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut tracks = Vec::new();
    for entry in WalkDir::new(root).follow_links(options.follow_links) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(ScanError::Walk {
                    path: root.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_file() && options.accepts(entry.path()) {
            tracks.push(read_track(entry.path()));
        }
    }

    tracks.sort_by(|a, b| {
        a.title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.source.cmp(&b.source))
    });

    log::info!("Scanned {:?}: {} tracks", root, tracks.len());
    Ok(tracks)
}

/// Build a track from the file's tags, falling back to the file name
pub fn read_track(path: &Path) -> Track {
    let mut title = None;
    let mut artist = None;
    let mut album = None;
    let mut duration_ms = 0;

    match Probe::open(path).and_then(|p| p.read()) {
        Ok(tagged_file) => {
            duration_ms = tagged_file.properties().duration().as_millis() as u64;
            if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
                title = tag.title().map(|s| s.to_string());
                artist = tag.artist().map(|s| s.to_string());
                album = tag.album().map(|s| s.to_string());
            }
        }
        Err(e) => {
            log::warn!("Failed to read tags from {:?}: {}", path, e);
        }
    }

    let title = title.filter(|t| !t.trim().is_empty()).unwrap_or_else(|| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(UNKNOWN)
            .to_string()
    });

    Track::new(
        path.to_string_lossy().to_string(),
        title,
        artist.filter(|a| !a.is_empty()).unwrap_or_else(|| UNKNOWN.to_string()),
        album.filter(|a| !a.is_empty()).unwrap_or_else(|| UNKNOWN.to_string()),
        duration_ms,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"not really audio").unwrap();
        path
    }

    #[test]
    fn accepts_supported_extensions_case_insensitively() {
        let options = ScanOptions::default();
        assert!(options.accepts(Path::new("/a/b.MP3")));
        assert!(options.accepts(Path::new("b.flac")));
        assert!(!options.accepts(Path::new("notes.txt")));
        assert!(!options.accepts(Path::new("no_extension")));
    }

    #[test]
    fn scans_recursively_and_sorts_by_title() {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "b song.mp3");
        write_file(dir.path(), "A song.mp3");
        write_file(dir.path(), "notes.txt");
        let sub = dir.path().join("deep");
        fs::create_dir(&sub).unwrap();
        write_file(&sub, "c.flac");

        let tracks = scan_library(dir.path(), &ScanOptions::default()).unwrap();
        let titles: Vec<&str> = tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["A song", "b song", "c"]);
        assert!(tracks.iter().all(|t| t.artist == UNKNOWN && t.album == UNKNOWN));
    }

    #[test]
    fn honours_configured_extensions() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "one.mp3");
        write_file(dir.path(), "two.ogg");

        let options = ScanOptions {
            extensions: vec!["mp3".to_string()],
            ..ScanOptions::default()
        };
        let tracks = scan_library(dir.path(), &options).unwrap();
        assert_eq!(tracks.len(), 1);
        assert!(tracks[0].source.ends_with("one.mp3"));
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            scan_library(&missing, &ScanOptions::default()),
            Err(ScanError::NotADirectory(_))
        ));
    }
}
