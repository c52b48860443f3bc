use std::collections::HashMap;

use cadenza_core::{
    queue::{QueueSnapshot, RepeatMode},
    track::{Track, TrackId},
};
use ratatui::widgets::ListState;

/// Queue-related state (track list, cursor, modes, list selection)
#[derive(Debug, Clone, Default)]
pub struct QueueState {
    pub snapshot: QueueSnapshot,
    pub list_state: ListState,
    /// Index the engine reported as playing after the current track
    pub next_index: Option<usize>,
}

impl QueueState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Track] {
        &self.snapshot.items
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.snapshot.current_index
    }

    pub fn shuffle(&self) -> bool {
        self.snapshot.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.snapshot.repeat
    }

    pub fn apply_snapshot(&mut self, snapshot: QueueSnapshot) {
        self.snapshot = snapshot;
        let len = self.snapshot.len();
        match self.list_state.selected() {
            _ if len == 0 => self.list_state.select(None),
            Some(i) if i >= len => self.list_state.select(Some(len - 1)),
            None => self.list_state.select(Some(0)),
            Some(_) => {}
        }
    }

    pub fn set_current(&mut self, index: Option<usize>) {
        self.snapshot.current_index = index;
    }

    pub fn set_modes(&mut self, shuffle: bool, repeat: RepeatMode) {
        self.snapshot.shuffle = shuffle;
        self.snapshot.repeat = repeat;
    }

    /// 1-based position of each item in playback order
    pub fn order_positions(&self) -> HashMap<TrackId, usize> {
        let mut positions = HashMap::new();
        for (pos, id) in self.snapshot.order.iter().enumerate() {
            positions.entry(*id).or_insert(pos + 1);
        }
        positions
    }

    /// Item a completed track would hand over to
    pub fn up_next(&self) -> Option<&Track> {
        self.snapshot.items.get(self.next_index?)
    }

    pub fn next(&mut self) {
        if self.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < self.len() => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn prev(&mut self) {
        if self.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => self.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn select(&mut self, index: usize) {
        if index < self.len() {
            self.list_state.select(Some(index));
        }
    }

    /// Get currently selected queue index
    pub fn selected(&self) -> Option<usize> {
        self.list_state.selected().filter(|i| *i < self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(n: usize) -> QueueSnapshot {
        let items: Vec<Track> = (0..n)
            .map(|i| Track::new(format!("/m/{i}.mp3"), format!("T{i}"), "", "", 0))
            .collect();
        let order = items.iter().rev().map(|t| t.id).collect();
        QueueSnapshot {
            items,
            order,
            ..QueueSnapshot::default()
        }
    }

    #[test]
    fn selection_is_clamped_to_new_snapshot() {
        let mut queue = QueueState::new();
        queue.apply_snapshot(snapshot(5));
        assert_eq!(queue.selected(), Some(0));

        queue.select(4);
        queue.apply_snapshot(snapshot(2));
        assert_eq!(queue.selected(), Some(1));

        queue.apply_snapshot(snapshot(0));
        assert_eq!(queue.selected(), None);
    }

    #[test]
    fn navigation_wraps() {
        let mut queue = QueueState::new();
        queue.apply_snapshot(snapshot(3));
        queue.prev();
        assert_eq!(queue.selected(), Some(2));
        queue.next();
        assert_eq!(queue.selected(), Some(0));
    }

    #[test]
    fn order_positions_follow_playback_order() {
        let mut queue = QueueState::new();
        queue.apply_snapshot(snapshot(3));
        let positions = queue.order_positions();
        let first = queue.items()[0].id;
        assert_eq!(positions[&first], 3);
    }

    #[test]
    fn up_next_resolves_against_latest_snapshot() {
        let mut queue = QueueState::new();
        queue.apply_snapshot(snapshot(3));
        assert!(queue.up_next().is_none());

        queue.next_index = Some(2);
        assert_eq!(queue.up_next().map(|t| t.title.as_str()), Some("T2"));

        // a stale index past the end shows nothing
        queue.apply_snapshot(snapshot(2));
        assert!(queue.up_next().is_none());
    }
}
