use std::path::PathBuf;

use cadenza_core::{
    browser::{self, FileEntry},
    scanner::ScanOptions,
};
use ratatui::widgets::ListState;
use strum::{Display, EnumIter};

/// Options offered when a file is picked in the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
pub enum DialogChoice {
    #[strum(to_string = "▶ Play Now")]
    PlayNow,
    #[strum(to_string = "+ Add to Queue")]
    AddToQueue,
}

/// Dialog shown when selecting a file in browser
#[derive(Debug, Clone, Default)]
pub enum BrowserFileDialog {
    #[default]
    None,
    Open { path: PathBuf, selected: DialogChoice },
}

/// Browser state for file navigation
#[derive(Debug, Clone)]
pub struct BrowserState {
    pub current_dir: PathBuf,
    pub items: Vec<FileEntry>,
    pub list_state: ListState,
    pub dialog: BrowserFileDialog,
    pub options: ScanOptions,
}

impl BrowserState {
    pub fn new(start_dir: Option<PathBuf>, options: ScanOptions) -> Self {
        let current_dir = start_dir
            .filter(|dir| dir.is_dir())
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut state = Self {
            current_dir: PathBuf::new(),
            items: Vec::new(),
            list_state: ListState::default(),
            dialog: BrowserFileDialog::None,
            options,
        };
        state.change_dir(current_dir);
        state
    }

    /// List `dir` and make it the current directory. Keeps the old listing
    /// when `dir` cannot be read.
    pub fn change_dir(&mut self, dir: PathBuf) -> bool {
        match browser::get_directory_content(&dir, &self.options) {
            Ok(items) => {
                self.list_state
                    .select(if items.is_empty() { None } else { Some(0) });
                self.current_dir = dir;
                self.items = items;
                true
            }
            Err(e) => {
                log::warn!("Cannot open {:?}: {}", dir, e);
                false
            }
        }
    }

    pub fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn prev(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    /// Enter selected directory or return PathBuf if it's a file
    pub fn enter(&mut self) -> Option<PathBuf> {
        let i = self.list_state.selected()?;
        let item = self.items.get(i)?;
        if item.is_dir {
            let new_path = item.path.clone();
            self.change_dir(new_path);
            None
        } else {
            Some(item.path.clone())
        }
    }

    /// Playable files in the current directory, in listing order
    pub fn files(&self) -> Vec<PathBuf> {
        self.items
            .iter()
            .filter(|entry| !entry.is_dir)
            .map(|entry| entry.path.clone())
            .collect()
    }

    /// Open the browser file dialog for a given path
    pub fn open_dialog(&mut self, path: PathBuf) {
        self.dialog = BrowserFileDialog::Open {
            path,
            selected: DialogChoice::PlayNow,
        };
    }

    /// Navigate dialog selection
    pub fn dialog_toggle(&mut self) {
        if let BrowserFileDialog::Open { selected, .. } = &mut self.dialog {
            *selected = match selected {
                DialogChoice::PlayNow => DialogChoice::AddToQueue,
                DialogChoice::AddToQueue => DialogChoice::PlayNow,
            };
        }
    }

    /// Close the dialog
    pub fn close_dialog(&mut self) {
        self.dialog = BrowserFileDialog::None;
    }

    /// Check if dialog is open
    pub fn is_dialog_open(&self) -> bool {
        !matches!(self.dialog, BrowserFileDialog::None)
    }
}
