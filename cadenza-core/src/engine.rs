use std::{
    path::PathBuf,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use anyhow::Context;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::{
    commands::{AudioCommand, AudioResponse},
    controller::{PlaybackSink, QueueController, QueueObserver},
    output::{AudioOutput, RodioOutput},
    queue::{QueueSnapshot, RepeatMode},
    scanner::{self, ScanOptions},
    track::{Track, format_duration},
};

/// Startup settings for the engine thread
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// How often position updates are published and end-of-track is checked
    pub tick: Duration,
    /// Move on to the next track when one fails to load
    pub skip_on_error: bool,
    pub volume: f32,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub scan: ScanOptions,
    /// Volume ramp when playback resumes
    pub fade_in: Duration,
    /// Volume ramp before a pause takes effect
    pub fade_out: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(200),
            skip_on_error: false,
            volume: 1.0,
            shuffle: false,
            repeat: RepeatMode::Off,
            scan: ScanOptions::default(),
            fade_in: Duration::from_millis(800),
            fade_out: Duration::from_millis(1500),
        }
    }
}

/// How often the volume is stepped while a fade runs
const FADE_STEP: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy, PartialEq)]
enum FadeKind {
    In,
    OutThenPause,
}

/// A linear volume ramp. Gains are fractions of the user volume.
#[derive(Debug, Clone, Copy)]
struct Fade {
    kind: FadeKind,
    from: f32,
    started: Instant,
    length: Duration,
}

impl Fade {
    fn progress(&self, now: Instant) -> f32 {
        if self.length.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / self.length.as_secs_f32()).min(1.0)
    }

    fn gain(&self, now: Instant) -> f32 {
        let t = self.progress(now);
        match self.kind {
            FadeKind::In => self.from + (1.0 - self.from) * t,
            FadeKind::OutThenPause => self.from * (1.0 - t),
        }
    }

    fn is_done(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }
}

/// The TUI's end of the engine channels
pub struct AudioEngineHandle {
    pub cmd_tx: Sender<AudioCommand>,
    pub resp_rx: Receiver<AudioResponse>,
    /// Name of the output device the engine opened
    pub device: String,
}

/// Controller notifications, queued so the engine loop applies them in order
#[derive(Debug)]
enum BridgeEvent {
    Load(Track, usize),
    Stop,
    Queue(QueueSnapshot),
    Cursor(Option<usize>),
    Modes(bool, RepeatMode),
}

struct ControllerBridge {
    tx: Sender<BridgeEvent>,
}

impl ControllerBridge {
    fn send(&self, event: BridgeEvent) {
        // The receiver lives in the engine that owns the controller
        let _ = self.tx.send(event);
    }
}

impl PlaybackSink for ControllerBridge {
    fn load_and_play(&self, track: &Track, index: usize) {
        self.send(BridgeEvent::Load(track.clone(), index));
    }

    fn stop(&self) {
        self.send(BridgeEvent::Stop);
    }
}

impl QueueObserver for ControllerBridge {
    fn queue_changed(&self, snapshot: &QueueSnapshot) {
        self.send(BridgeEvent::Queue(snapshot.clone()));
    }

    fn cursor_changed(&self, index: Option<usize>) {
        self.send(BridgeEvent::Cursor(index));
    }

    fn modes_changed(&self, shuffle: bool, repeat: RepeatMode) {
        self.send(BridgeEvent::Modes(shuffle, repeat));
    }
}

/// Owns the queue controller and the audio output on a dedicated thread
pub struct AudioEngine<O: AudioOutput> {
    output: O,
    controller: QueueController,
    bridge_rx: Receiver<BridgeEvent>,
    cmd_rx: Receiver<AudioCommand>,
    resp_tx: Sender<AudioResponse>,
    settings: EngineSettings,
    loaded: bool,
    fade: Option<Fade>,
    /// Last up-next index sent to the TUI
    up_next: Option<usize>,
    consecutive_failures: usize,
    last_tick: Instant,
}

impl AudioEngine<RodioOutput> {
    /// Open the default output device on a new thread and start the engine loop
    pub fn spawn(
        settings: EngineSettings,
    ) -> anyhow::Result<(thread::JoinHandle<()>, AudioEngineHandle)> {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (resp_tx, resp_rx) = crossbeam_channel::unbounded();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        let engine_thread = thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                // The output stream is created here so it never crosses threads
                let output = match RodioOutput::try_new_default() {
                    Ok(output) => {
                        let _ = ready_tx.send(Ok(output.device_name().to_string()));
                        output
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                AudioEngine::new(output, cmd_rx, resp_tx, settings).run();
            })
            .context("Failed to spawn audio engine thread")?;

        let device = ready_rx
            .recv()
            .context("Audio engine thread exited during startup")?
            .context("Cannot open audio output")?;

        let handle = AudioEngineHandle {
            cmd_tx,
            resp_rx,
            device,
        };
        Ok((engine_thread, handle))
    }
}

impl<O: AudioOutput> AudioEngine<O> {
    pub fn new(
        mut output: O,
        cmd_rx: Receiver<AudioCommand>,
        resp_tx: Sender<AudioResponse>,
        settings: EngineSettings,
    ) -> Self {
        let (bridge_tx, bridge_rx) = crossbeam_channel::unbounded();
        let bridge = Arc::new(ControllerBridge { tx: bridge_tx });
        let controller = QueueController::new(bridge.clone()).with_observer(bridge);

        let volume = settings.volume.clamp(0.0, 1.0);
        let settings = EngineSettings { volume, ..settings };
        output.set_volume(volume);
        controller.set_shuffle(settings.shuffle);
        controller.set_repeat_mode(settings.repeat);

        let mut engine = Self {
            output,
            controller,
            bridge_rx,
            cmd_rx,
            resp_tx,
            settings,
            loaded: false,
            fade: None,
            up_next: None,
            consecutive_failures: 0,
            last_tick: Instant::now(),
        };
        engine.drain_bridge();
        engine
    }

    /// Process commands until `Quit` or until every handle is dropped
    pub fn run(mut self) {
        log::info!("Audio engine started");
        loop {
            let wait = if self.fade.is_some() {
                FADE_STEP.min(self.settings.tick)
            } else {
                self.settings.tick
            };
            match self.cmd_rx.recv_timeout(wait) {
                Ok(cmd) => {
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log::info!("Command channel closed");
                    break;
                }
            }
            self.step_fade(Instant::now());
            if self.last_tick.elapsed() >= self.settings.tick {
                self.tick();
            }
        }

        self.output.stop();
        self.respond(AudioResponse::Shutdown);
        log::info!("Audio engine stopped");
    }

    pub fn controller(&self) -> &QueueController {
        &self.controller
    }

    /// Apply one command. Returns `false` when the engine should shut down.
    fn handle_command(&mut self, cmd: AudioCommand) -> bool {
        log::debug!("Engine command: {:?}", CommandLabel(&cmd));
        match cmd {
            AudioCommand::ReplaceQueue(items) => self.controller.replace_queue(items),
            AudioCommand::AppendToQueue(items) => {
                let added = self.controller.append(items);
                log::info!("Added {} tracks to queue", added);
            }
            AudioCommand::AppendPaths(paths) => {
                let added = self.controller.append(read_tracks(&paths));
                log::info!("Added {} tracks to queue", added);
            }
            AudioCommand::PlayPaths { paths, start } => {
                self.controller.replace_queue(read_tracks(&paths));
                self.consecutive_failures = 0;
                self.controller.select_and_play(start);
            }
            AudioCommand::ClearQueue => self.controller.clear(),
            AudioCommand::PlayQueueIndex(index) => {
                self.consecutive_failures = 0;
                self.controller.select_and_play(index);
            }
            AudioCommand::Play => self.resume(),
            AudioCommand::Pause => self.pause(),
            AudioCommand::TogglePlayback => {
                if self.is_playing() {
                    self.pause();
                } else {
                    self.resume();
                }
            }
            AudioCommand::Stop => self.stop_output(),
            AudioCommand::Next => {
                self.consecutive_failures = 0;
                self.controller.skip_forward();
            }
            AudioCommand::Previous => {
                self.consecutive_failures = 0;
                self.controller.skip_backward();
            }
            AudioCommand::Seek(seconds) => self.seek(seconds),
            AudioCommand::SetVolume(volume) => self.set_volume(volume),
            AudioCommand::ToggleShuffle => {
                self.controller.toggle_shuffle();
            }
            AudioCommand::SetShuffle(shuffle) => {
                self.controller.set_shuffle(shuffle);
            }
            AudioCommand::SetRepeatMode(mode) => {
                self.controller.set_repeat_mode(mode);
            }
            AudioCommand::CycleRepeatMode => {
                self.controller.cycle_repeat_mode();
            }
            AudioCommand::MoveItem { from, to } => {
                if !self.controller.move_item(from, to) {
                    log::debug!("Ignored move {} -> {}", from, to);
                }
            }
            AudioCommand::RemoveItem(index) => {
                let was_current = self.controller.current_index() == Some(index);
                if self.controller.remove_item(index).is_some() && was_current {
                    self.stop_output();
                }
            }
            AudioCommand::ScanDirectory(root) => self.scan(root),
            AudioCommand::Quit => return false,
        }
        self.drain_bridge();
        true
    }

    /// Publish the position and advance when the loaded track has ended
    fn tick(&mut self) {
        self.last_tick = Instant::now();
        if !self.loaded {
            return;
        }

        if self.output.is_finished() {
            log::debug!("Track finished");
            self.controller.notify_item_finished();
            self.drain_bridge();
            return;
        }

        let total = self
            .controller
            .current_item()
            .map(|t| t.duration_ms as f32 / 1000.0)
            .unwrap_or(0.0);
        self.respond(AudioResponse::Position {
            current: self.output.position().as_secs_f32(),
            total,
        });
    }

    fn drain_bridge(&mut self) {
        while let Ok(event) = self.bridge_rx.try_recv() {
            match event {
                BridgeEvent::Load(track, index) => self.load(track, index),
                BridgeEvent::Stop => self.stop_output(),
                BridgeEvent::Queue(snapshot) => self.respond(AudioResponse::QueueUpdated(snapshot)),
                BridgeEvent::Cursor(index) => self.respond(AudioResponse::CursorChanged(index)),
                BridgeEvent::Modes(shuffle, repeat) => {
                    self.respond(AudioResponse::ModesChanged { shuffle, repeat })
                }
            }
        }

        let up_next = self.controller.up_next();
        if up_next != self.up_next {
            self.up_next = up_next;
            self.respond(AudioResponse::UpNext(up_next));
        }
    }

    fn load(&mut self, track: Track, index: usize) {
        // A new track always starts at the user volume
        self.cancel_fade();
        match self.output.load(&track.source) {
            Ok(duration) => {
                self.loaded = true;
                self.consecutive_failures = 0;

                let track = match duration {
                    Some(duration) if !track.is_duration_known() => {
                        let resolved = track.with_duration_ms(duration.as_millis() as u64);
                        self.controller.update_current(resolved.clone());
                        resolved
                    }
                    _ => track,
                };

                log::info!(
                    "Playing [{}] {} - {} ({})",
                    index + 1,
                    track.display_title(),
                    track.artist,
                    format_duration(track.duration_ms)
                );
                self.respond(AudioResponse::TrackChanged { index, track });
                self.respond(AudioResponse::Playing);
            }
            Err(e) => {
                log::error!("Failed to play '{}': {}", track.source, e);
                self.loaded = false;
                self.consecutive_failures += 1;
                self.respond(AudioResponse::Error(e.to_string()));

                if self.settings.skip_on_error
                    && self.consecutive_failures < self.controller.len()
                {
                    self.controller.skip_forward();
                } else {
                    self.respond(AudioResponse::Stopped);
                }
            }
        }
    }

    /// Loaded, not paused, and not on the way to a pause
    fn is_playing(&self) -> bool {
        self.loaded
            && !self.output.is_paused()
            && !self.fade.is_some_and(|fade| fade.kind == FadeKind::OutThenPause)
    }

    fn resume(&mut self) {
        if self.loaded {
            if self.is_playing() {
                return;
            }
            // Pick up from wherever an interrupted fade-out had got to
            let from = if self.output.is_paused() {
                0.0
            } else {
                self.current_gain(Instant::now())
            };
            self.start_fade(FadeKind::In, from, self.settings.fade_in);
            self.output.play();
            self.respond(AudioResponse::Playing);
            return;
        }
        // Nothing loaded: restart the current item, or start from the top
        self.consecutive_failures = 0;
        match self.controller.current_index() {
            Some(index) => {
                self.controller.select_and_play(index);
            }
            None => {
                self.controller.skip_forward();
            }
        }
    }

    fn pause(&mut self) {
        if !self.is_playing() {
            return;
        }
        let from = self.current_gain(Instant::now());
        self.start_fade(FadeKind::OutThenPause, from, self.settings.fade_out);
    }

    fn finish_pause(&mut self) {
        self.fade = None;
        self.output.pause();
        self.output.set_volume(self.settings.volume);
        self.respond(AudioResponse::Paused);
    }

    fn start_fade(&mut self, kind: FadeKind, from: f32, length: Duration) {
        let fade = Fade {
            kind,
            from,
            started: Instant::now(),
            length,
        };
        log::debug!("Fade {:?} from {:.2} over {:?}", kind, from, length);
        self.fade = Some(fade);
        self.step_fade(fade.started);
    }

    /// Move the running fade, if any, to where it should be at `now`
    fn step_fade(&mut self, now: Instant) {
        let Some(fade) = self.fade else {
            return;
        };
        self.output.set_volume(fade.gain(now) * self.settings.volume);
        if fade.is_done(now) {
            match fade.kind {
                FadeKind::In => self.fade = None,
                FadeKind::OutThenPause => self.finish_pause(),
            }
        }
    }

    fn current_gain(&self, now: Instant) -> f32 {
        self.fade.map_or(1.0, |fade| fade.gain(now))
    }

    fn cancel_fade(&mut self) {
        if self.fade.take().is_some() {
            self.output.set_volume(self.settings.volume);
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.settings.volume = volume.clamp(0.0, 1.0);
        // A running fade scales to the new volume on its next step
        if self.fade.is_none() {
            self.output.set_volume(self.settings.volume);
        }
    }

    fn stop_output(&mut self) {
        self.cancel_fade();
        self.output.stop();
        self.loaded = false;
        self.respond(AudioResponse::Stopped);
    }

    fn seek(&mut self, seconds: f32) {
        if !self.loaded {
            return;
        }
        if let Err(e) = self.output.seek(Duration::from_secs_f32(seconds.max(0.0))) {
            log::warn!("{}", e);
            self.respond(AudioResponse::Error(e.to_string()));
        }
    }

    fn scan(&mut self, root: PathBuf) {
        match scanner::scan_library(&root, &self.settings.scan) {
            Ok(tracks) => {
                let count = tracks.len();
                self.controller.replace_queue(tracks);
                self.respond(AudioResponse::ScanFinished { root, count });
            }
            Err(e) => {
                log::error!("Library scan failed: {}", e);
                self.respond(AudioResponse::Error(e.to_string()));
            }
        }
    }

    fn respond(&self, response: AudioResponse) {
        if self.resp_tx.send(response).is_err() {
            log::debug!("Response channel closed");
        }
    }
}

fn read_tracks(paths: &[PathBuf]) -> Vec<Track> {
    paths.iter().map(|path| scanner::read_track(path)).collect()
}

/// Debug view of a command without dumping whole track lists
struct CommandLabel<'a>(&'a AudioCommand);

impl std::fmt::Debug for CommandLabel<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            AudioCommand::ReplaceQueue(items) => write!(f, "ReplaceQueue({} items)", items.len()),
            AudioCommand::AppendToQueue(items) => write!(f, "AppendToQueue({} items)", items.len()),
            AudioCommand::AppendPaths(paths) => write!(f, "AppendPaths({} files)", paths.len()),
            AudioCommand::PlayPaths { paths, start } => {
                write!(f, "PlayPaths({} files, start {})", paths.len(), start)
            }
            other => write!(f, "{:?}", other),
        }
    }
}
