use std::{fs::File, path::PathBuf, time::Duration};

use rodio::{
    Decoder, OutputStream, OutputStreamBuilder, Sink, Source,
    cpal::{
        self,
        traits::{DeviceTrait, HostTrait},
    },
};

use crate::error::PlaybackError;

/// Decode/output transport driven by the engine thread
pub trait AudioOutput {
    /// Replace whatever is loaded with `source` and start playing it.
    /// Returns the decoded duration when the container reports one.
    fn load(&mut self, source: &str) -> Result<Option<Duration>, PlaybackError>;

    fn play(&mut self);

    fn pause(&mut self);

    /// Drop the loaded item
    fn stop(&mut self);

    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError>;

    /// Volume from 0.0 to 1.0
    fn set_volume(&mut self, volume: f32);

    fn is_paused(&self) -> bool;

    /// The loaded item played to its end
    fn is_finished(&self) -> bool;

    fn position(&self) -> Duration;
}

/// Turn a source locator into a local path. Only plain paths and `file://`
/// URIs can be opened.
pub fn resolve_source(locator: &str) -> Result<PathBuf, PlaybackError> {
    if let Some(path) = locator.strip_prefix("file://") {
        return Ok(PathBuf::from(path));
    }
    if locator.contains("://") || locator.is_empty() {
        return Err(PlaybackError::UnsupportedSource(locator.to_string()));
    }
    Ok(PathBuf::from(locator))
}

/// [`AudioOutput`] on the default cpal device through a rodio sink
pub struct RodioOutput {
    // Dropping the stream silences the sink
    _stream: OutputStream,
    sink: Sink,
    device_name: String,
    loaded: bool,
}

impl RodioOutput {
    pub fn try_new_default() -> Result<Self, PlaybackError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| PlaybackError::DeviceUnavailable("no default output device".into()))?;

        let device_name = device.name().unwrap_or_else(|_| "(unknown)".to_string());

        let mut stream = OutputStreamBuilder::from_device(device)
            .map_err(|e| PlaybackError::DeviceUnavailable(e.to_string()))?
            .open_stream()
            .map_err(|e| PlaybackError::DeviceUnavailable(e.to_string()))?;
        // rodio prints to stderr on drop, which would tear the terminal UI
        stream.log_on_drop(false);

        let sink = Sink::connect_new(stream.mixer());
        sink.pause();

        log::info!("Audio output opened on '{}'", device_name);
        Ok(RodioOutput {
            _stream: stream,
            sink,
            device_name,
            loaded: false,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl AudioOutput for RodioOutput {
    fn load(&mut self, source: &str) -> Result<Option<Duration>, PlaybackError> {
        let path = resolve_source(source)?;
        let file = File::open(&path).map_err(|e| PlaybackError::Open {
            path: source.to_string(),
            source: e,
        })?;
        let decoder = Decoder::try_from(file).map_err(|e| PlaybackError::Decode {
            path: source.to_string(),
            reason: e.to_string(),
        })?;
        let duration = decoder.total_duration();

        self.sink.clear();
        self.sink.append(decoder);
        self.sink.play();
        self.loaded = true;
        log::debug!("Loaded '{}' ({:?})", source, duration);
        Ok(duration)
    }

    fn play(&mut self) {
        if self.loaded {
            self.sink.play();
        }
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn stop(&mut self) {
        self.sink.clear();
        self.loaded = false;
    }

    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError> {
        self.sink
            .try_seek(position)
            .map_err(|e| PlaybackError::Seek(e.to_string()))
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume.clamp(0.0, 1.0));
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn is_finished(&self) -> bool {
        self.loaded && self.sink.empty()
    }

    fn position(&self) -> Duration {
        if self.loaded {
            self.sink.get_pos()
        } else {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_plain_paths_and_file_uris() {
        assert_eq!(
            resolve_source("/music/a.mp3").unwrap(),
            PathBuf::from("/music/a.mp3")
        );
        assert_eq!(
            resolve_source("file:///music/b.mp3").unwrap(),
            PathBuf::from("/music/b.mp3")
        );
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(matches!(
            resolve_source("content://media/external/audio/1"),
            Err(PlaybackError::UnsupportedSource(_))
        ));
        assert!(resolve_source("").is_err());
    }
}
