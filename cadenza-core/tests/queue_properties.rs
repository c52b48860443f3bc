use std::sync::{Arc, Mutex};

use cadenza_core::controller::{PlaybackSink, QueueController, QueueObserver};
use cadenza_core::queue::RepeatMode;
use cadenza_core::track::{Track, TrackId};

/// Records what the controller asks the engine to do
#[derive(Default)]
struct RecordingSink {
    loads: Mutex<Vec<(TrackId, usize)>>,
    stops: Mutex<usize>,
}

impl PlaybackSink for RecordingSink {
    fn load_and_play(&self, track: &Track, index: usize) {
        self.loads.lock().unwrap().push((track.id, index));
    }

    fn stop(&self) {
        *self.stops.lock().unwrap() += 1;
    }
}

#[derive(Default)]
struct CursorLog {
    cursors: Mutex<Vec<Option<usize>>>,
}

impl QueueObserver for CursorLog {
    fn cursor_changed(&self, index: Option<usize>) {
        self.cursors.lock().unwrap().push(index);
    }
}

fn tracks(titles: &[&str]) -> Vec<Track> {
    titles
        .iter()
        .map(|t| Track::new(format!("/music/{t}.flac"), *t, "Artist", "Album", 180_000))
        .collect()
}

fn controller_with(titles: &[&str]) -> (QueueController, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let controller = QueueController::new(sink.clone());
    controller.replace_queue(tracks(titles));
    (controller, sink)
}

fn current_title(controller: &QueueController) -> Option<String> {
    controller.current_item().map(|t| t.title)
}

#[test]
fn test_repeat_all_cycle_closes_from_any_start() {
    let titles = ["A", "B", "C", "D", "E"];
    for shuffle in [false, true] {
        for start in 0..titles.len() {
            let (controller, _) = controller_with(&titles);
            controller.set_shuffle(shuffle);
            controller.set_repeat_mode(RepeatMode::All);
            controller.select_and_play(start);
            let original = controller.current_item().map(|t| t.id);

            for _ in 0..controller.playback_order().len() {
                assert!(controller.notify_item_finished().is_some());
            }
            assert_eq!(controller.current_item().map(|t| t.id), original);
        }
    }
}

#[test]
fn test_repeat_one_completion_keeps_cursor() {
    let (controller, sink) = controller_with(&["A", "B", "C"]);
    controller.set_repeat_mode(RepeatMode::One);
    controller.select_and_play(2);

    for _ in 0..4 {
        assert_eq!(controller.notify_item_finished(), Some(2));
    }
    assert_eq!(controller.current_index(), Some(2));
    // the same item is reloaded each time
    assert_eq!(sink.loads.lock().unwrap().len(), 5);
}

#[test]
fn test_repeat_one_does_not_block_explicit_skips() {
    let (controller, _) = controller_with(&["A", "B", "C"]);
    controller.set_repeat_mode(RepeatMode::One);
    controller.select_and_play(0);

    assert_eq!(controller.skip_forward(), Some(1));
    assert_eq!(controller.skip_backward(), Some(0));
}

#[test]
fn test_repeat_off_end_of_queue() {
    let (controller, sink) = controller_with(&["A", "B", "C"]);
    controller.select_and_play(2);

    // completion past the end stops
    assert_eq!(controller.notify_item_finished(), None);
    assert_eq!(*sink.stops.lock().unwrap(), 1);
    assert_eq!(controller.current_index(), Some(2));

    // a user skip wraps instead
    assert_eq!(controller.skip_forward(), Some(0));
    assert_eq!(current_title(&controller).as_deref(), Some("A"));
}

#[test]
fn test_explicit_advance_wraps_with_repeat_all() {
    let (controller, _) = controller_with(&["A", "B", "C"]);
    controller.set_repeat_mode(RepeatMode::All);
    controller.select_and_play(2);

    assert_eq!(controller.skip_forward(), Some(0));
    assert_eq!(current_title(&controller).as_deref(), Some("A"));
}

#[test]
fn test_retreat_wraps_to_last() {
    let (controller, _) = controller_with(&["A", "B", "C"]);
    controller.select_and_play(0);
    assert_eq!(controller.skip_backward(), Some(2));
}

#[test]
fn test_shuffle_round_trip_restores_queue_order() {
    let titles: Vec<String> = (0..40).map(|i| format!("Track {i}")).collect();
    let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
    let (controller, _) = controller_with(&refs);
    controller.select_and_play(7);
    let queue_ids: Vec<TrackId> = controller.queue().iter().map(|t| t.id).collect();

    assert!(controller.toggle_shuffle());
    let mut shuffled: Vec<TrackId> = controller.playback_order().iter().map(|t| t.id).collect();
    assert_eq!(controller.current_index(), Some(7));
    shuffled.sort();
    let mut sorted = queue_ids.clone();
    sorted.sort();
    assert_eq!(shuffled, sorted);

    assert!(!controller.toggle_shuffle());
    let restored: Vec<TrackId> = controller.playback_order().iter().map(|t| t.id).collect();
    assert_eq!(restored, queue_ids);
    assert_eq!(controller.current_index(), Some(7));
}

#[test]
fn test_move_item_keeps_cursor_on_same_item() {
    let titles = ["A", "B", "C", "D", "E"];
    for cursor in 0..titles.len() {
        for from in 0..titles.len() {
            for to in 0..titles.len() {
                let (controller, _) = controller_with(&titles);
                controller.select_and_play(cursor);
                let before = controller.current_item().map(|t| t.id);

                controller.move_item(from, to);

                let after = controller.current_item().map(|t| t.id);
                assert_eq!(before, after, "cursor {cursor}, move {from} -> {to}");
            }
        }
    }
}

#[test]
fn test_move_item_example() {
    let sink = Arc::new(RecordingSink::default());
    let log = Arc::new(CursorLog::default());
    let controller = QueueController::new(sink.clone()).with_observer(log.clone());
    controller.replace_queue(tracks(&["A", "B", "C", "D"]));
    controller.select_and_play(1);

    assert!(controller.move_item(1, 3));

    let order: Vec<String> = controller.queue().into_iter().map(|t| t.title).collect();
    assert_eq!(order, vec!["A", "C", "D", "B"]);
    assert_eq!(controller.current_index(), Some(3));
    assert_eq!(*log.cursors.lock().unwrap(), vec![Some(1), Some(3)]);
    // reordering is not a track change
    assert_eq!(sink.loads.lock().unwrap().len(), 1);
}

#[test]
fn test_remove_item_cursor_rebasing() {
    let (controller, _) = controller_with(&["A", "B", "C", "D"]);
    controller.select_and_play(2);

    controller.remove_item(0);
    assert_eq!(controller.current_index(), Some(1));
    assert_eq!(current_title(&controller).as_deref(), Some("C"));

    controller.remove_item(2);
    assert_eq!(controller.current_index(), Some(1));

    controller.remove_item(1);
    assert_eq!(controller.current_index(), None);
    assert_eq!(controller.playback_order().len(), 1);
}

#[test]
fn test_remove_keeps_shuffled_order_consistent() {
    let (controller, _) = controller_with(&["A", "B", "C", "D", "E"]);
    controller.set_shuffle(true);
    let removed = controller.remove_item(3).unwrap();

    let order = controller.playback_order();
    assert_eq!(order.len(), 4);
    assert!(order.iter().all(|t| t.id != removed.id));
}

#[test]
fn test_select_clamps_and_empty_queue_is_none() {
    let (controller, sink) = controller_with(&["A", "B"]);
    let selected = controller.select_and_play(99).unwrap();
    assert_eq!(selected.title, "B");
    assert_eq!(sink.loads.lock().unwrap().last().map(|l| l.1), Some(1));

    let (empty, _) = controller_with(&[]);
    assert!(empty.select_and_play(0).is_none());
    assert!(empty.skip_forward().is_none());
    assert!(empty.notify_item_finished().is_none());
}

#[test]
fn test_concurrent_finish_and_skip_stay_consistent() {
    let (controller, _) = controller_with(&["A", "B", "C", "D", "E", "F"]);
    let controller = Arc::new(controller);
    controller.set_repeat_mode(RepeatMode::All);
    controller.select_and_play(0);

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let controller = controller.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    if i % 2 == 0 {
                        controller.notify_item_finished();
                    } else {
                        controller.skip_backward();
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.order.len(), snapshot.items.len());
    assert!(snapshot.current_index.is_some_and(|i| i < snapshot.items.len()));
}
