use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use cadenza_core::{
    engine::EngineSettings,
    queue::RepeatMode,
    scanner::{SUPPORTED_EXTENSIONS, ScanOptions},
};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.toml";

/// User settings read from `config.toml`. Every field has a default, so a
/// partial file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the browser opens and what `--scan` uses when given no directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub music_directory: Option<PathBuf>,
    /// Audio file extensions picked up by the browser and library scans
    pub extensions: Vec<String>,
    pub repeat: RepeatMode,
    pub shuffle: bool,
    /// Initial volume, 0.0 to 1.0
    pub volume: f32,
    /// Position refresh interval in milliseconds
    pub tick_ms: u64,
    /// Skip to the next track when one cannot be played
    pub skip_on_error: bool,
    /// Volume ramp on resume in milliseconds, 0 disables it
    pub fade_in_ms: u64,
    /// Volume ramp before pausing in milliseconds, 0 disables it
    pub fade_out_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            music_directory: dirs::audio_dir(),
            extensions: SUPPORTED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            repeat: RepeatMode::Off,
            shuffle: false,
            volume: 1.0,
            tick_ms: 200,
            skip_on_error: false,
            fade_in_ms: 800,
            fade_out_ms: 1500,
        }
    }
}

impl AppConfig {
    /// `<config_dir>/cadenza/config.toml`
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(dir.join("cadenza").join(CONFIG_FILE))
    }

    /// Load from an explicit path, or from the default location when `None`.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    log::debug!("No config at {:?}, using defaults", path);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        log::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.normalize();
        Ok(config)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn normalize(&mut self) {
        self.volume = self.volume.clamp(0.0, 1.0);
        self.tick_ms = self.tick_ms.max(10);
        for ext in &mut self.extensions {
            *ext = ext.trim_start_matches('.').to_lowercase();
        }
        self.extensions.retain(|ext| !ext.is_empty());
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            extensions: self.extensions.clone(),
            ..ScanOptions::default()
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            tick: Duration::from_millis(self.tick_ms),
            skip_on_error: self.skip_on_error,
            volume: self.volume,
            shuffle: self.shuffle,
            repeat: self.repeat,
            scan: self.scan_options(),
            fade_in: Duration::from_millis(self.fade_in_ms),
            fade_out: Duration::from_millis(self.fade_out_ms),
        }
    }
}
