use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::scanner::ScanOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// List a directory for the file browser: directories first, then playable
/// files, both by name. A `..` entry leads to the parent when there is one.
pub fn get_directory_content(path: &Path, options: &ScanOptions) -> io::Result<Vec<FileEntry>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(path)? {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        let is_dir = path.is_dir();

        if !is_dir && !options.accepts(&path) {
            continue;
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("???")
            .to_string();
        entries.push(FileEntry { name, path, is_dir });
    }

    entries.sort_by(|a, b| match (a.is_dir, b.is_dir) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });

    if let Some(parent) = path.parent() {
        entries.insert(
            0,
            FileEntry {
                name: "..".to_string(),
                path: parent.to_path_buf(),
                is_dir: true,
            },
        );
    }

    Ok(entries)
}
