use std::path::PathBuf;

use cadenza_core::queue::RepeatMode;
use clap::Parser;

use crate::config::AppConfig;

/// Cadenza - a terminal music player with shuffle, repeat and a reorderable queue
#[derive(Parser, Debug)]
#[command(name = "cadenza", version, about)]
pub struct Args {
    /// Audio files or directories to put in the queue
    pub paths: Vec<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Start with shuffle on
    #[arg(long, short = 's')]
    pub shuffle: bool,

    /// Start with the given repeat mode (off, all, one)
    #[arg(long, short = 'r', value_name = "MODE")]
    pub repeat: Option<RepeatMode>,

    /// Scan a library directory into the queue, defaults to the configured music directory
    #[arg(long, value_name = "DIR", num_args = 0..=1)]
    pub scan: Option<Option<PathBuf>>,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Args {
    /// Overlay command-line flags on top of the loaded config
    pub fn apply(&self, config: &mut AppConfig) {
        if self.shuffle {
            config.shuffle = true;
        }
        if let Some(repeat) = self.repeat {
            config.repeat = repeat;
        }
    }

    /// Directory to scan at startup, if `--scan` was given
    pub fn scan_dir(&self, config: &AppConfig) -> Option<PathBuf> {
        match &self.scan {
            Some(Some(dir)) => Some(dir.clone()),
            Some(None) => config.music_directory.clone(),
            None => None,
        }
    }
}
