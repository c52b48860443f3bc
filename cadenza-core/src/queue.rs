//! Queue storage, navigation order (linear or shuffled) and the cursor.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::track::{Track, TrackId};

/// Repeat mode for queue playback
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    EnumIter,
    strum::Display,
    strum::EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum RepeatMode {
    /// Stop after the last item in playback order
    #[default]
    #[strum(to_string = "➡️ Off", serialize = "off")]
    Off,
    /// Cycle through the playback order
    #[strum(to_string = "🔁 All", serialize = "all")]
    All,
    /// Replay the current item when it finishes
    #[strum(to_string = "🔂 One", serialize = "one")]
    One,
}

impl RepeatMode {
    /// Off -> All -> One -> Off
    pub fn cycle(self) -> RepeatMode {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

/// What caused a move to the next item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceTrigger {
    /// The output finished playing the current item
    Completed,
    /// The user asked to skip forward
    Skip,
}

/// Owned copy of the queue state for readers outside the controller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub items: Vec<Track>,
    pub order: Vec<TrackId>,
    pub current_index: Option<usize>,
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

impl QueueSnapshot {
    pub fn current(&self) -> Option<&Track> {
        self.current_index.and_then(|i| self.items.get(i))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The playback queue state.
///
/// `items` is the canonical order shown to the user. `order` holds the same
/// ids in navigation order: equal to `items` with shuffle off, a random
/// permutation with shuffle on. `cursor` indexes `items`, never `order`.
#[derive(Debug, Clone, Default)]
pub struct PlaybackQueue {
    items: Vec<Track>,
    order: Vec<TrackId>,
    cursor: Option<usize>,
    shuffle: bool,
    repeat: RepeatMode,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole queue. The cursor survives only if it is still in range.
    pub fn replace(&mut self, items: Vec<Track>) {
        self.items = items;
        self.rebuild_order();
        if let Some(cursor) = self.cursor {
            if cursor >= self.items.len() {
                self.cursor = None;
            }
        }
    }

    /// Append items after the current ones, returns how many were added
    pub fn append(&mut self, items: Vec<Track>) -> usize {
        let mut ids: Vec<TrackId> = items.iter().map(|item| item.id).collect();
        if self.shuffle {
            ids.shuffle(&mut rand::rng());
        }
        self.order.extend(ids);
        let added = items.len();
        self.items.extend(items);
        added
    }

    /// Clear all items from queue
    pub fn clear(&mut self) {
        self.items.clear();
        self.order.clear();
        self.cursor = None;
    }

    /// Point the cursor at `index`, clamped to the last item
    pub fn select(&mut self, index: usize) -> Option<&Track> {
        if self.items.is_empty() {
            return None;
        }
        let index = index.min(self.items.len() - 1);
        self.cursor = Some(index);
        self.items.get(index)
    }

    /// Move the cursor to the next item in playback order.
    ///
    /// Returns the new cursor, or `None` when playback should stop. A
    /// completion at the end of the order only wraps with [`RepeatMode::All`];
    /// an explicit skip always wraps. With [`RepeatMode::One`] a completion
    /// replays the current item.
    pub fn advance(&mut self, trigger: AdvanceTrigger) -> Option<usize> {
        let next = self.peek_next(trigger);
        match next {
            Some(index) => self.cursor = Some(index),
            None if self.cursor.is_some() => {
                log::debug!("End of playback order reached, stopping");
            }
            None => {}
        }
        next
    }

    /// Where [`advance`](Self::advance) would put the cursor, without moving it
    pub fn peek_next(&self, trigger: AdvanceTrigger) -> Option<usize> {
        if self.repeat == RepeatMode::One && trigger == AdvanceTrigger::Completed {
            return self.cursor;
        }
        if self.items.is_empty() || self.order.is_empty() {
            return None;
        }

        let next = match self.cursor_order_position() {
            Some(pos) if pos + 1 < self.order.len() => pos + 1,
            Some(_) if self.repeat == RepeatMode::All || trigger == AdvanceTrigger::Skip => 0,
            Some(_) => return None,
            // Nothing selected yet: start from the top of the order
            None => 0,
        };
        self.index_at_order_position(next)
    }

    /// Move the cursor to the previous item in playback order, wrapping to the end
    pub fn retreat(&mut self) -> Option<usize> {
        if self.items.is_empty() || self.order.is_empty() {
            return None;
        }
        let last = self.order.len() - 1;
        let prev = match self.cursor_order_position() {
            Some(0) | None => last,
            Some(pos) => pos - 1,
        };
        self.move_cursor_to_order_position(prev)
    }

    /// Flip shuffle and rebuild the playback order, returns the new state
    pub fn toggle_shuffle(&mut self) -> bool {
        self.set_shuffle(!self.shuffle)
    }

    pub fn set_shuffle(&mut self, shuffle: bool) -> bool {
        self.shuffle = shuffle;
        self.rebuild_order();
        self.shuffle
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) -> RepeatMode {
        self.repeat = mode;
        self.repeat
    }

    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.set_repeat(self.repeat.cycle())
    }

    /// Relocate the item at `from` to `to`, keeping the cursor on the same item.
    ///
    /// Returns `false` (and changes nothing) when the indices are equal or out of range.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        let len = self.items.len();
        if from == to || from >= len || to >= len {
            return false;
        }

        let item = self.items.remove(from);
        self.items.insert(to, item);

        if let Some(cursor) = self.cursor {
            self.cursor = Some(if cursor == from {
                to
            } else if from < cursor && cursor <= to {
                cursor - 1
            } else if to <= cursor && cursor < from {
                cursor + 1
            } else {
                cursor
            });
        }

        // A shuffled order references ids, so only the linear order follows the move
        if !self.shuffle {
            self.order = self.linear_order();
        }
        true
    }

    /// Remove the item at `index`. Removing the current item clears the cursor.
    pub fn remove(&mut self, index: usize) -> Option<Track> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);

        if self.shuffle {
            if let Some(pos) = self.order.iter().position(|&id| id == removed.id) {
                self.order.remove(pos);
            }
        } else {
            self.order = self.linear_order();
        }

        self.cursor = match self.cursor {
            Some(cursor) if index < cursor => Some(cursor - 1),
            Some(cursor) if index == cursor => None,
            other => other,
        };
        Some(removed)
    }

    /// Replace the item with the same id at the cursor (duration resolved by the output)
    pub fn update_current(&mut self, track: Track) -> bool {
        match self.cursor.and_then(|i| self.items.get_mut(i)) {
            Some(current) if current.id == track.id => {
                *current = track;
                true
            }
            _ => false,
        }
    }

    /// Get current track
    pub fn current(&self) -> Option<&Track> {
        self.cursor.and_then(|i| self.items.get(i))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.cursor
    }

    /// Get item by index
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[Track] {
        &self.items
    }

    pub fn order_ids(&self) -> &[TrackId] {
        &self.order
    }

    /// Tracks in navigation order
    pub fn playback_order(&self) -> Vec<&Track> {
        self.order
            .iter()
            .filter_map(|&id| self.items.iter().find(|item| item.id == id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            items: self.items.clone(),
            order: self.order.clone(),
            current_index: self.cursor,
            shuffle: self.shuffle,
            repeat: self.repeat,
        }
    }

    fn linear_order(&self) -> Vec<TrackId> {
        self.items.iter().map(|item| item.id).collect()
    }

    /// Generate the navigation order, Fisher-Yates when shuffled
    fn rebuild_order(&mut self) {
        let mut order = self.linear_order();
        if self.shuffle {
            order.shuffle(&mut rand::rng());
        }
        self.order = order;
    }

    /// Position of the current item's id in `order` (first match)
    fn cursor_order_position(&self) -> Option<usize> {
        let id = self.current()?.id;
        self.order.iter().position(|&other| other == id)
    }

    fn index_at_order_position(&self, pos: usize) -> Option<usize> {
        let id = *self.order.get(pos)?;
        self.items.iter().position(|item| item.id == id)
    }

    fn move_cursor_to_order_position(&mut self, pos: usize) -> Option<usize> {
        let index = self.index_at_order_position(pos)?;
        self.cursor = Some(index);
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn tracks(names: &[&str]) -> Vec<Track> {
        names
            .iter()
            .map(|name| Track::new(format!("/music/{name}.mp3"), *name, "artist", "album", 0))
            .collect()
    }

    fn queue_of(names: &[&str]) -> PlaybackQueue {
        let mut queue = PlaybackQueue::new();
        queue.replace(tracks(names));
        queue
    }

    fn titles(queue: &PlaybackQueue) -> Vec<&str> {
        queue.items().iter().map(|t| t.title.as_str()).collect()
    }

    fn current_title(queue: &PlaybackQueue) -> Option<&str> {
        queue.current().map(|t| t.title.as_str())
    }

    #[test]
    fn replace_keeps_cursor_only_when_in_range() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.select(2);
        queue.replace(tracks(&["x", "y", "z", "w"]));
        assert_eq!(queue.current_index(), Some(2));

        queue.replace(tracks(&["x", "y"]));
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn replace_with_empty_is_valid() {
        let mut queue = queue_of(&["a"]);
        queue.select(0);
        queue.replace(Vec::new());
        assert!(queue.is_empty());
        assert!(queue.order_ids().is_empty());
        assert_eq!(queue.advance(AdvanceTrigger::Skip), None);
        assert_eq!(queue.retreat(), None);
    }

    #[test]
    fn select_clamps_to_last_item() {
        let mut queue = queue_of(&["a", "b", "c"]);
        assert_eq!(queue.select(10).map(|t| t.title.as_str()), Some("c"));
        assert_eq!(queue.current_index(), Some(2));
    }

    #[test]
    fn select_on_empty_queue_returns_none() {
        let mut queue = PlaybackQueue::new();
        assert!(queue.select(0).is_none());
        assert_eq!(queue.current_index(), None);
    }

    #[test]
    fn advance_without_cursor_starts_at_first_in_order() {
        let mut queue = queue_of(&["a", "b", "c"]);
        assert_eq!(queue.advance(AdvanceTrigger::Completed), Some(0));
    }

    #[test]
    fn retreat_without_cursor_starts_at_last_in_order() {
        let mut queue = queue_of(&["a", "b", "c"]);
        assert_eq!(queue.retreat(), Some(2));
    }

    #[test]
    fn completion_at_end_stops_with_repeat_off() {
        let mut queue = queue_of(&["a", "b"]);
        queue.select(1);
        assert_eq!(queue.advance(AdvanceTrigger::Completed), None);
        // cursor stays on the last item
        assert_eq!(queue.current_index(), Some(1));
    }

    #[test]
    fn skip_at_end_wraps_with_repeat_off() {
        let mut queue = queue_of(&["a", "b"]);
        queue.select(1);
        assert_eq!(queue.advance(AdvanceTrigger::Skip), Some(0));
    }

    #[test]
    fn completion_at_end_wraps_with_repeat_all() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.set_repeat(RepeatMode::All);
        queue.select(2);
        assert_eq!(queue.advance(AdvanceTrigger::Completed), Some(0));
    }

    #[test]
    fn repeat_one_replays_on_completion_but_not_on_skip() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.set_repeat(RepeatMode::One);
        queue.select(1);
        assert_eq!(queue.advance(AdvanceTrigger::Completed), Some(1));
        assert_eq!(queue.advance(AdvanceTrigger::Skip), Some(2));
        assert_eq!(queue.retreat(), Some(1));
    }

    #[test]
    fn peek_next_matches_advance_without_moving() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.set_shuffle(true);
        queue.select(1);
        for mode in [RepeatMode::Off, RepeatMode::All, RepeatMode::One] {
            queue.set_repeat(mode);
            for trigger in [AdvanceTrigger::Completed, AdvanceTrigger::Skip] {
                let peeked = queue.peek_next(trigger);
                assert_eq!(queue.current_index(), Some(1));
                let mut moved = queue.clone();
                assert_eq!(moved.advance(trigger), peeked);
            }
        }
    }

    #[test]
    fn retreat_wraps_to_end() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.select(0);
        assert_eq!(queue.retreat(), Some(2));
        assert_eq!(queue.retreat(), Some(1));
    }

    #[test]
    fn shuffled_navigation_follows_order() {
        let mut queue = queue_of(&["a", "b", "c", "d", "e"]);
        queue.toggle_shuffle();
        let order: Vec<TrackId> = queue.order_ids().to_vec();

        let first = queue.advance(AdvanceTrigger::Skip).unwrap();
        assert_eq!(queue.items()[first].id, order[0]);
        let second = queue.advance(AdvanceTrigger::Skip).unwrap();
        assert_eq!(queue.items()[second].id, order[1]);
        let back = queue.retreat().unwrap();
        assert_eq!(back, first);
    }

    #[test]
    fn shuffle_is_permutation_and_keeps_cursor_value() {
        let mut queue = queue_of(&["a", "b", "c", "d", "e", "f"]);
        queue.select(3);
        assert!(queue.toggle_shuffle());
        assert_eq!(queue.current_index(), Some(3));
        assert_eq!(current_title(&queue), Some("d"));

        let ids: HashSet<TrackId> = queue.items().iter().map(|t| t.id).collect();
        let order: HashSet<TrackId> = queue.order_ids().iter().copied().collect();
        assert_eq!(queue.order_ids().len(), queue.len());
        assert_eq!(ids, order);
    }

    #[test]
    fn unshuffle_restores_linear_order() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);
        queue.toggle_shuffle();
        assert!(!queue.toggle_shuffle());
        let linear: Vec<TrackId> = queue.items().iter().map(|t| t.id).collect();
        assert_eq!(queue.order_ids(), linear.as_slice());
    }

    #[test]
    fn set_and_cycle_repeat() {
        let mut queue = PlaybackQueue::new();
        assert_eq!(queue.repeat(), RepeatMode::Off);
        assert_eq!(queue.set_repeat(RepeatMode::One), RepeatMode::One);
        assert_eq!(queue.cycle_repeat(), RepeatMode::Off);
        assert_eq!(queue.cycle_repeat(), RepeatMode::All);
    }

    #[test]
    fn move_item_forward_past_cursor() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);
        queue.select(1);
        assert!(queue.move_item(1, 3));
        assert_eq!(titles(&queue), vec!["a", "c", "d", "b"]);
        assert_eq!(queue.current_index(), Some(3));
    }

    #[test]
    fn move_item_across_cursor_shifts_it() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);
        queue.select(2);
        queue.move_item(0, 3);
        assert_eq!(current_title(&queue), Some("c"));
        assert_eq!(queue.current_index(), Some(1));

        queue.move_item(3, 0);
        assert_eq!(current_title(&queue), Some("c"));
        assert_eq!(queue.current_index(), Some(2));
    }

    #[test]
    fn move_item_rejects_noop_and_out_of_range() {
        let mut queue = queue_of(&["a", "b"]);
        assert!(!queue.move_item(1, 1));
        assert!(!queue.move_item(0, 2));
        assert!(!queue.move_item(5, 0));
        assert_eq!(titles(&queue), vec!["a", "b"]);
    }

    #[test]
    fn linear_order_follows_reorder() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.select(0);
        queue.move_item(2, 0);
        // c, a, b: after a comes b
        assert_eq!(queue.advance(AdvanceTrigger::Completed), Some(2));
        assert_eq!(current_title(&queue), Some("b"));
    }

    #[test]
    fn shuffled_order_survives_reorder() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);
        queue.toggle_shuffle();
        let before = queue.order_ids().to_vec();
        queue.move_item(0, 3);
        assert_eq!(queue.order_ids(), before.as_slice());
    }

    #[test]
    fn remove_rebases_cursor() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);
        queue.select(2);
        assert_eq!(queue.remove(0).map(|t| t.title), Some("a".to_string()));
        assert_eq!(queue.current_index(), Some(1));
        assert_eq!(current_title(&queue), Some("c"));

        queue.remove(2);
        assert_eq!(queue.current_index(), Some(1));

        queue.remove(1);
        assert_eq!(queue.current_index(), None);
        assert_eq!(queue.order_ids().len(), queue.len());
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let mut queue = queue_of(&["a"]);
        assert!(queue.remove(3).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn remove_drops_id_from_shuffled_order() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);
        queue.toggle_shuffle();
        let removed = queue.remove(1).unwrap();
        assert_eq!(queue.order_ids().len(), 3);
        assert!(!queue.order_ids().contains(&removed.id));
    }

    #[test]
    fn duplicates_resolve_to_first_match() {
        let base = tracks(&["a", "b"]);
        let mut queue = PlaybackQueue::new();
        queue.replace(vec![base[0].clone(), base[1].clone(), base[0].clone()]);
        queue.select(2);
        // the cursor item is found at order position 0, so the next is "b"
        assert_eq!(queue.advance(AdvanceTrigger::Skip), Some(1));
        // and "a" resolves to queue index 0
        assert_eq!(queue.retreat(), Some(0));
    }

    #[test]
    fn append_extends_order_and_keeps_cursor() {
        let mut queue = queue_of(&["a", "b"]);
        queue.select(1);
        assert_eq!(queue.append(tracks(&["c", "d"])), 2);
        assert_eq!(titles(&queue), vec!["a", "b", "c", "d"]);
        assert_eq!(queue.order_ids().len(), 4);
        assert_eq!(queue.current_index(), Some(1));
        assert_eq!(queue.advance(AdvanceTrigger::Completed), Some(2));
    }

    #[test]
    fn update_current_requires_same_identity() {
        let mut queue = queue_of(&["a", "b"]);
        queue.select(0);
        let resolved = queue.current().unwrap().with_duration_ms(1000);
        assert!(queue.update_current(resolved));
        assert_eq!(queue.current().unwrap().duration_ms, 1000);

        let other = queue.get(1).unwrap().with_duration_ms(5);
        assert!(!queue.update_current(other));
    }

    #[test]
    fn repeat_mode_parses_and_displays() {
        use std::str::FromStr;
        assert_eq!(RepeatMode::from_str("all").unwrap(), RepeatMode::All);
        assert_eq!(RepeatMode::from_str("ONE").unwrap(), RepeatMode::One);
        assert!(RepeatMode::from_str("sometimes").is_err());
        assert_eq!(RepeatMode::Off.to_string(), "➡️ Off");
    }
}
