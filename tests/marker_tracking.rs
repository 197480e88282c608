//! Bobber tracking against scripted desktop frames
//!
//! Run with: cargo test --test marker_tracking -- --nocapture

mod common;

use std::sync::Arc;

use auto_angler::events::{EventSink, SessionEvent};
use auto_angler::fishing::{MarkerTracker, TrackerConfig};
use auto_angler::screen_reader::{CaptureArea, Region};
use common::{marker_template, FakeScreen, Scene};

fn debug_frames(rx: &std::sync::mpsc::Receiver<SessionEvent>) -> Vec<image::RgbImage> {
    rx.try_iter()
        .filter_map(|e| match e {
            SessionEvent::DebugImage(img) => Some(img),
            SessionEvent::Log(_) => None,
        })
        .collect()
}

#[test]
fn test_first_lookup_scans_whole_region() {
    let region = Region::new(100, 100, 50, 50);
    let screen = FakeScreen::new(&[Scene::new().marker_size(10).marker_at(105, 105)], region);
    let captures = screen.capture_log();
    let (events, rx) = EventSink::channel();

    let mut tracker = MarkerTracker::new(Arc::new(marker_template(10)), TrackerConfig::default());
    let found = tracker.locate(&screen, region, &events).expect("bobber should be found");

    assert_eq!(found.center, (10, 10));
    assert_eq!(found.size, (10, 10));
    assert!(found.score > 0.99, "score was {}", found.score);
    assert_eq!(found.image.dimensions(), (10, 10));
    assert_eq!(*captures.lock().unwrap(), vec![CaptureArea::Region(region)]);
    assert_eq!(tracker.state().consecutive_fail_count, 0);

    let frames = debug_frames(&rx);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].dimensions(), (50, 50));
}

#[test]
fn test_follow_up_lookup_uses_clamped_window() {
    let region = Region::new(100, 100, 50, 50);
    let scenes = [
        Scene::new().marker_size(10).marker_at(105, 105),
        Scene::new().marker_size(10).marker_at(108, 112),
    ];
    let screen = FakeScreen::new(&scenes, region);
    let captures = screen.capture_log();
    let (events, rx) = EventSink::channel();

    let mut tracker = MarkerTracker::new(Arc::new(marker_template(10)), TrackerConfig::default());
    tracker.locate(&screen, region, &events).expect("landing");
    let moved = tracker.locate(&screen, region, &events).expect("second sighting");

    // Translated back to region coordinates
    assert_eq!(moved.center, (13, 17));

    // Window around (10, 10) with radius 30 clamps to the region's top-left 40x40
    let log = captures.lock().unwrap().clone();
    assert_eq!(
        log,
        vec![
            CaptureArea::Region(region),
            CaptureArea::Region(Region::new(100, 100, 40, 40)),
            CaptureArea::Region(region),
        ]
    );

    // Debug frames always show the whole region
    for frame in debug_frames(&rx) {
        assert_eq!(frame.dimensions(), (50, 50));
    }
}

#[test]
fn test_miss_counts_and_still_renders() {
    let region = Region::new(200, 150, 120, 90);
    let screen = FakeScreen::new(&[Scene::new()], region);
    let (events, rx) = EventSink::channel();

    let mut tracker = MarkerTracker::new(Arc::new(marker_template(20)), TrackerConfig::default());
    assert!(tracker.locate(&screen, region, &events).is_none());
    assert!(tracker.locate(&screen, region, &events).is_none());

    assert_eq!(tracker.state().consecutive_fail_count, 2);
    assert!(tracker.last_center().is_none());

    let frames = debug_frames(&rx);
    assert_eq!(frames.len(), 2);
    // Miss marker is a red box around the frame center
    let px = frames[0].get_pixel(60, 35);
    assert_eq!(px.0, [255, 0, 0]);
}

#[test]
fn test_capture_failure_reads_as_absent() {
    let region = Region::new(200, 150, 120, 90);
    let screen = FakeScreen::new(&[Scene::new().marker_at(230, 170)], region)
        .failing_when(|_, _| true);
    let (events, rx) = EventSink::channel();

    let mut tracker = MarkerTracker::new(Arc::new(marker_template(20)), TrackerConfig::default());
    assert!(tracker.locate(&screen, region, &events).is_none());
    // Errors are not misses
    assert_eq!(tracker.state().consecutive_fail_count, 0);

    let mut saw_error = false;
    let mut saw_blank = false;
    for event in rx.try_iter() {
        match event {
            SessionEvent::Log(line) => saw_error |= line.contains("template matching"),
            SessionEvent::DebugImage(img) => {
                saw_blank |= img.dimensions() == (120, 90) && img.pixels().all(|p| p.0 == [0, 0, 0]);
            }
        }
    }
    assert!(saw_error);
    assert!(saw_blank);
}

#[test]
fn test_reset_forgets_last_sighting() {
    let region = Region::new(100, 100, 120, 100);
    let screen = FakeScreen::new(&[Scene::new().marker_at(150, 140)], region);
    let captures = screen.capture_log();
    let events = EventSink::disconnected();

    let mut tracker = MarkerTracker::new(Arc::new(marker_template(20)), TrackerConfig::default());
    assert!(tracker.locate(&screen, region, &events).is_some());
    tracker.reset();
    assert!(tracker.last_center().is_none());

    tracker.locate(&screen, region, &events);
    let log = captures.lock().unwrap().clone();
    assert_eq!(log.last(), Some(&CaptureArea::Region(region)));
    assert_eq!(log.len(), 2);
}

#[test]
fn test_center_always_inside_region() {
    let region = Region::new(100, 100, 120, 100);
    let events = EventSink::disconnected();

    for (dx, dy) in [(0, 0), (100, 80), (0, 80), (100, 0), (47, 33), (5, 71)] {
        let screen = FakeScreen::new(&[Scene::new().marker_at(100 + dx, 100 + dy)], region);
        let mut tracker =
            MarkerTracker::new(Arc::new(marker_template(20)), TrackerConfig::default());
        let found = tracker
            .locate(&screen, region, &events)
            .unwrap_or_else(|| panic!("marker at offset ({}, {}) not found", dx, dy));
        assert_eq!(found.center, (dx as i32 + 10, dy as i32 + 10));
        assert!(region.contains_relative(found.center.0, found.center.1));
    }
}
