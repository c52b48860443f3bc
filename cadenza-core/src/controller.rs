use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread,
};

use crate::{
    queue::{AdvanceTrigger, PlaybackQueue, QueueSnapshot, RepeatMode},
    track::Track,
};

/// The side that actually decodes and outputs audio
pub trait PlaybackSink: Send + Sync {
    /// Start playing `track`, which sits at `index` in the queue
    fn load_and_play(&self, track: &Track, index: usize);

    /// Stop output, nothing is left to play
    fn stop(&self);
}

/// The side that displays the queue. All methods default to no-ops.
pub trait QueueObserver: Send + Sync {
    fn queue_changed(&self, _snapshot: &QueueSnapshot) {}

    fn cursor_changed(&self, _index: Option<usize>) {}

    fn modes_changed(&self, _shuffle: bool, _repeat: RepeatMode) {}
}

/// Effects queued under the lock and dispatched after it is released
#[derive(Debug)]
enum Notification {
    Load(Track, usize),
    Stop,
    Queue(QueueSnapshot),
    Cursor(Option<usize>),
    Modes(bool, RepeatMode),
}

/// Serialises every queue operation behind one lock and notifies the
/// playback sink and observers of the outcome.
///
/// Notifications are sent after the lock is released, so a sink or observer
/// may call back into the controller. They still arrive in the order the
/// operations took the lock: each operation queues its notifications before
/// releasing it, and only one caller at a time delivers the queue. A caller
/// that finds delivery already running returns at once and leaves its
/// notifications to that caller.
pub struct QueueController {
    queue: Mutex<PlaybackQueue>,
    outbox: Mutex<Outbox>,
    sink: Arc<dyn PlaybackSink>,
    observers: Vec<Arc<dyn QueueObserver>>,
}

#[derive(Debug, Default)]
struct Outbox {
    pending: VecDeque<Notification>,
    delivering: bool,
}

impl QueueController {
    pub fn new(sink: Arc<dyn PlaybackSink>) -> Self {
        Self {
            queue: Mutex::new(PlaybackQueue::new()),
            outbox: Mutex::new(Outbox::default()),
            sink,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn QueueObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    // ==============================================
    // Presentation layer intents
    // ==============================================

    pub fn replace_queue(&self, items: Vec<Track>) {
        log::info!("Replacing queue with {} items", items.len());
        self.apply(|queue, out| {
            let before = queue.current_index();
            queue.replace(items);
            out.push(Notification::Queue(queue.snapshot()));
            push_cursor_change(queue, before, out);
        })
    }

    /// Append items to the end of the queue, returns how many were added
    pub fn append(&self, items: Vec<Track>) -> usize {
        self.apply(|queue, out| {
            let added = queue.append(items);
            if added > 0 {
                out.push(Notification::Queue(queue.snapshot()));
            }
            added
        })
    }

    pub fn clear(&self) {
        self.apply(|queue, out| {
            let before = queue.current_index();
            queue.clear();
            if before.is_some() {
                out.push(Notification::Stop);
            }
            out.push(Notification::Queue(queue.snapshot()));
            push_cursor_change(queue, before, out);
        })
    }

    /// Select the item at `index` (clamped) and ask the sink to play it
    pub fn select_and_play(&self, index: usize) -> Option<Track> {
        self.apply(|queue, out| {
            let before = queue.current_index();
            let track = queue.select(index).cloned()?;
            let index = queue.current_index()?;
            out.push(Notification::Load(track.clone(), index));
            push_cursor_change(queue, before, out);
            Some(track)
        })
    }

    pub fn toggle_shuffle(&self) -> bool {
        self.apply(|queue, out| {
            let shuffle = queue.toggle_shuffle();
            log::info!("Shuffle {}", if shuffle { "enabled" } else { "disabled" });
            out.push(Notification::Modes(shuffle, queue.repeat()));
            out.push(Notification::Queue(queue.snapshot()));
            shuffle
        })
    }

    pub fn set_shuffle(&self, shuffle: bool) -> bool {
        self.apply(|queue, out| {
            if queue.shuffle() == shuffle {
                return shuffle;
            }
            queue.set_shuffle(shuffle);
            out.push(Notification::Modes(shuffle, queue.repeat()));
            out.push(Notification::Queue(queue.snapshot()));
            shuffle
        })
    }

    pub fn set_repeat_mode(&self, mode: RepeatMode) -> RepeatMode {
        self.apply(|queue, out| {
            let mode = queue.set_repeat(mode);
            out.push(Notification::Modes(queue.shuffle(), mode));
            mode
        })
    }

    pub fn cycle_repeat_mode(&self) -> RepeatMode {
        self.apply(|queue, out| {
            let mode = queue.cycle_repeat();
            out.push(Notification::Modes(queue.shuffle(), mode));
            mode
        })
    }

    /// Drag-and-drop relocation. Returns `false` for a no-op move.
    pub fn move_item(&self, from: usize, to: usize) -> bool {
        self.apply(|queue, out| {
            let before = queue.current_index();
            if !queue.move_item(from, to) {
                return false;
            }
            out.push(Notification::Queue(queue.snapshot()));
            push_cursor_change(queue, before, out);
            true
        })
    }

    /// Swipe-to-dismiss. Removing the current item leaves nothing selected;
    /// whether to stop or advance is up to the caller.
    pub fn remove_item(&self, index: usize) -> Option<Track> {
        self.apply(|queue, out| {
            let before = queue.current_index();
            let removed = queue.remove(index)?;
            out.push(Notification::Queue(queue.snapshot()));
            push_cursor_change(queue, before, out);
            Some(removed)
        })
    }

    /// Store a track the sink resolved further (e.g. its duration)
    pub fn update_current(&self, track: Track) -> bool {
        self.apply(|queue, out| {
            if !queue.update_current(track) {
                return false;
            }
            out.push(Notification::Queue(queue.snapshot()));
            true
        })
    }

    // ==============================================
    // Playback engine callbacks
    // ==============================================

    /// The current item finished playing
    pub fn notify_item_finished(&self) -> Option<usize> {
        self.step(|queue| queue.advance(AdvanceTrigger::Completed), true)
    }

    pub fn skip_forward(&self) -> Option<usize> {
        self.step(|queue| queue.advance(AdvanceTrigger::Skip), false)
    }

    pub fn skip_backward(&self) -> Option<usize> {
        self.step(PlaybackQueue::retreat, false)
    }

    // ==============================================
    // Read accessors
    // ==============================================

    pub fn current_item(&self) -> Option<Track> {
        self.lock().current().cloned()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.lock().current_index()
    }

    pub fn queue(&self) -> Vec<Track> {
        self.lock().items().to_vec()
    }

    /// Index a completion of the current item would move to
    pub fn up_next(&self) -> Option<usize> {
        self.lock().peek_next(AdvanceTrigger::Completed)
    }

    pub fn playback_order(&self) -> Vec<Track> {
        self.lock().playback_order().into_iter().cloned().collect()
    }

    /// `(shuffle, repeat)`
    pub fn modes(&self) -> (bool, RepeatMode) {
        let queue = self.lock();
        (queue.shuffle(), queue.repeat())
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        self.lock().snapshot()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn step(
        &self,
        navigate: impl FnOnce(&mut PlaybackQueue) -> Option<usize>,
        stop_when_exhausted: bool,
    ) -> Option<usize> {
        self.apply(|queue, out| {
            let before = queue.current_index();
            match navigate(queue) {
                Some(index) => {
                    if let Some(track) = queue.get(index) {
                        out.push(Notification::Load(track.clone(), index));
                    }
                    push_cursor_change(queue, before, out);
                    Some(index)
                }
                None => {
                    if stop_when_exhausted {
                        out.push(Notification::Stop);
                    }
                    None
                }
            }
        })
    }

    fn apply<R>(&self, op: impl FnOnce(&mut PlaybackQueue, &mut Vec<Notification>) -> R) -> R {
        let mut produced = Vec::new();
        let result = {
            let mut queue = self.lock();
            let result = op(&mut *queue, &mut produced);
            // Queued while the state lock is held, so outbox order is lock order
            if !produced.is_empty() {
                self.outbox().pending.extend(produced);
            }
            result
        };
        self.deliver();
        result
    }

    /// Drain the outbox unless another caller (or an outer frame of this
    /// one) is already draining it
    fn deliver(&self) {
        {
            let mut outbox = self.outbox();
            if outbox.delivering || outbox.pending.is_empty() {
                return;
            }
            outbox.delivering = true;
        }
        let _guard = DeliveryGuard(self);
        loop {
            let next = {
                let mut outbox = self.outbox();
                let next = outbox.pending.pop_front();
                if next.is_none() {
                    outbox.delivering = false;
                }
                next
            };
            match next {
                Some(notification) => self.dispatch(notification),
                None => break,
            }
        }
    }

    fn dispatch(&self, notification: Notification) {
        match notification {
            Notification::Load(track, index) => self.sink.load_and_play(&track, index),
            Notification::Stop => self.sink.stop(),
            Notification::Queue(snapshot) => {
                for observer in &self.observers {
                    observer.queue_changed(&snapshot);
                }
            }
            Notification::Cursor(index) => {
                for observer in &self.observers {
                    observer.cursor_changed(index);
                }
            }
            Notification::Modes(shuffle, repeat) => {
                for observer in &self.observers {
                    observer.modes_changed(shuffle, repeat);
                }
            }
        }
    }

    // The queue has no invariant a panicking reader could break halfway
    fn lock(&self) -> MutexGuard<'_, PlaybackQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn outbox(&self) -> MutexGuard<'_, Outbox> {
        self.outbox.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the delivery slot if a sink or observer panics mid-delivery
struct DeliveryGuard<'a>(&'a QueueController);

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.outbox().delivering = false;
        }
    }
}

fn push_cursor_change(queue: &PlaybackQueue, before: Option<usize>, out: &mut Vec<Notification>) {
    let after = queue.current_index();
    if after != before {
        out.push(Notification::Cursor(after));
    }
}
