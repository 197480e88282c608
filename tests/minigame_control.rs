//! Reel minigame control against a scripted scan strip

mod common;

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use auto_angler::events::EventSink;
use auto_angler::fishing::minigame::strip_region;
use auto_angler::fishing::{MinigameConfig, MinigameController, MinigameOutcome};
use auto_angler::input::MouseButton::Left;
use auto_angler::screen_reader::{CaptureArea, Region};
use auto_angler::utils::BotState;
use common::{FakeScreen, InputEvent, RecordingInput, Scene};

const BAR: Region = Region {
    left: 400,
    top: 300,
    width: 80,
    height: 30,
};

fn config() -> MinigameConfig {
    MinigameConfig {
        release_pause_chance: 0.0,
        tick: Duration::ZERO,
        ..MinigameConfig::default()
    }
}

/// Bar on screen with the strip lit at `index`, or dark
fn strip_scene(index: Option<u32>) -> Scene {
    let strip = strip_region(&BAR, &config());
    let scene = Scene::new().bar_at(BAR.left as u32, BAR.top as u32);
    match index {
        Some(i) => scene.light_at(strip.left as u32 + i, strip.top as u32),
        None => scene,
    }
}

fn play(screen: &FakeScreen, state: &BotState, config: MinigameConfig) -> (MinigameOutcome, Vec<InputEvent>) {
    let mut input = RecordingInput::default();
    let mut rng = StdRng::seed_from_u64(7);
    let outcome = MinigameController::new(config).run(
        BAR,
        screen,
        &mut input,
        state,
        &mut rng,
        &EventSink::disconnected(),
    );
    (outcome, input.snapshot())
}

fn running() -> BotState {
    let state = BotState::new();
    state.set_running(true);
    state
}

#[test]
fn test_dark_strip_finishes_immediately() {
    let strip = strip_region(&BAR, &config());
    let screen = FakeScreen::new(&[strip_scene(None)], strip);
    let captures = screen.capture_log();

    let (outcome, events) = play(&screen, &running(), config());

    assert_eq!(outcome, MinigameOutcome::Completed);
    assert_eq!(
        events,
        vec![InputEvent::Release(Left), InputEvent::Release(Left), InputEvent::Click]
    );
    assert_eq!(*captures.lock().unwrap(), vec![CaptureArea::Region(strip)]);
}

#[test]
fn test_holds_left_of_stop_point_and_releases_past_it() {
    let strip = strip_region(&BAR, &config());
    let scenes = [
        strip_scene(Some(50)),
        strip_scene(Some(180)),
        strip_scene(Some(181)),
        strip_scene(None),
    ];
    let screen = FakeScreen::new(&scenes, strip);

    let (outcome, events) = play(&screen, &running(), config());

    assert_eq!(outcome, MinigameOutcome::Completed);
    assert_eq!(
        events,
        vec![
            InputEvent::Release(Left),
            InputEvent::Press(Left),
            InputEvent::Press(Left),
            InputEvent::Release(Left),
            InputEvent::Release(Left),
            InputEvent::Click,
        ]
    );
}

#[test]
fn test_capture_error_while_holding_releases() {
    let strip = strip_region(&BAR, &config());
    let screen = FakeScreen::new(&[strip_scene(Some(20))], strip).failing_when(|call, _| call >= 1);

    let (outcome, events) = play(&screen, &running(), config());

    assert_eq!(outcome, MinigameOutcome::CaptureFailed);
    assert!(!outcome.is_success());
    assert_eq!(
        events,
        vec![
            InputEvent::Release(Left),
            InputEvent::Press(Left),
            InputEvent::Release(Left),
        ]
    );
}

#[test]
fn test_timeout_is_a_failure() {
    let strip = strip_region(&BAR, &config());
    let screen = FakeScreen::new(&[strip_scene(Some(20))], strip);
    let cfg = MinigameConfig {
        timeout: Duration::ZERO,
        ..config()
    };

    let (outcome, events) = play(&screen, &running(), cfg);

    assert_eq!(outcome, MinigameOutcome::TimedOut);
    assert_eq!(events.last(), Some(&InputEvent::Release(Left)));
    assert!(!events.contains(&InputEvent::Click));
}

#[test]
fn test_stop_request_cancels() {
    let strip = strip_region(&BAR, &config());
    let screen = FakeScreen::new(&[strip_scene(Some(20))], strip);
    let captures = screen.capture_log();

    let (outcome, events) = play(&screen, &BotState::new(), config());

    assert_eq!(outcome, MinigameOutcome::Cancelled);
    assert_eq!(events, vec![InputEvent::Release(Left), InputEvent::Release(Left)]);
    assert!(captures.lock().unwrap().is_empty());
}

#[test]
fn test_release_pause_still_ends_released() {
    let strip = strip_region(&BAR, &config());
    let scenes = [strip_scene(Some(200)), strip_scene(None)];
    let screen = FakeScreen::new(&scenes, strip);
    let cfg = MinigameConfig {
        release_pause_chance: 1.0,
        release_pause: (0.01, 0.02),
        ..config()
    };

    let (outcome, events) = play(&screen, &running(), cfg);

    assert_eq!(outcome, MinigameOutcome::Completed);
    assert!(!events.contains(&InputEvent::Press(Left)));
    assert_eq!(events.last(), Some(&InputEvent::Click));
}
