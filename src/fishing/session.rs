//! The fishing state machine.
//!
//! One cycle casts, waits for the bobber to land, watches it for a bite, hooks the fish
//! and plays the reel minigame. Cycles repeat until the run flag is cleared or a fatal
//! error ends the session. Every wait in here goes through [`BotState::wait`], so a stop
//! request is honored within one wait slice.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::bite_detector::BiteDetector;
use super::marker_tracker::{MarkerDetection, MarkerTracker, TrackerConfig};
use super::minigame::{MinigameConfig, MinigameController, MinigameOutcome};
use super::region_locator::{RegionLocator, BAR_SEARCH_INTERVAL};
use crate::events::EventSink;
use crate::input::{HoldGuard, InputController, MouseButton};
use crate::log_main::Journal;
use crate::screen_reader::{Region, ScreenCapture, Template};
use crate::utils::{BotState, SessionState, Tuning};

/// Random offset applied to the cast point, in pixels
pub const CAST_JITTER: i32 = 10;
/// Random offset applied to the hook click, in pixels
pub const CLICK_JITTER: i32 = 5;
/// Distance of the idle pointer position from the bottom-right screen corner
pub const SAFE_MARGIN: i32 = 50;

/// Screen reader and input injector a session drives
pub struct Devices {
    pub screen: Box<dyn ScreenCapture>,
    pub input: Box<dyn InputController>,
}

/// Every pause of the cycle. Ranges are in seconds and inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTimings {
    pub cast_move: Duration,
    pub cast_settle: Duration,
    pub landing_attempts: u32,
    pub landing_interval: Duration,
    pub recast_pause: Duration,
    pub bite_timeout: Duration,
    pub bite_poll: Duration,
    pub reaction_delay: (f64, f64),
    pub click_move: Duration,
    pub post_click_delay: (f64, f64),
    pub bar_search_interval: Duration,
    pub bar_missing_pause: Duration,
    pub cancel_pause: Duration,
    pub no_bite_pause: Duration,
    pub rest: (f64, f64),
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            cast_move: Duration::from_millis(100),
            cast_settle: Duration::from_secs(2),
            landing_attempts: 5,
            landing_interval: Duration::from_millis(200),
            recast_pause: Duration::from_secs(1),
            bite_timeout: Duration::from_secs(30),
            bite_poll: Duration::from_micros(500),
            reaction_delay: (0.5, 1.0),
            click_move: Duration::from_millis(100),
            post_click_delay: (0.1, 0.3),
            bar_search_interval: BAR_SEARCH_INTERVAL,
            bar_missing_pause: Duration::from_secs(5),
            cancel_pause: Duration::from_secs(1),
            no_bite_pause: Duration::from_secs(2),
            rest: (0.5, 1.2),
        }
    }
}

impl SessionTimings {
    /// No pauses at all, for dry runs against recorded frames
    pub fn immediate() -> Self {
        Self {
            cast_move: Duration::ZERO,
            cast_settle: Duration::ZERO,
            landing_attempts: 5,
            landing_interval: Duration::ZERO,
            recast_pause: Duration::ZERO,
            bite_timeout: Duration::from_millis(200),
            bite_poll: Duration::ZERO,
            reaction_delay: (0.0, 0.0),
            click_move: Duration::ZERO,
            post_click_delay: (0.0, 0.0),
            bar_search_interval: Duration::ZERO,
            bar_missing_pause: Duration::ZERO,
            cancel_pause: Duration::ZERO,
            no_bite_pause: Duration::ZERO,
            rest: (0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub region: Region,
    pub marker: Arc<Template>,
    pub bar: Arc<Template>,
    pub cancel_key: String,
    pub timings: SessionTimings,
    pub tracker: TrackerConfig,
    pub minigame: MinigameConfig,
}

impl SessionConfig {
    pub fn new(region: Region, marker: Arc<Template>, bar: Arc<Template>) -> Self {
        Self {
            region,
            marker,
            bar,
            cancel_key: "s".to_string(),
            timings: SessionTimings::default(),
            tracker: TrackerConfig::default(),
            minigame: MinigameConfig::default(),
        }
    }
}

/// How a single cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Stopped,
    LandingFailed,
    NoBite,
    BarNotFound,
    Minigame(MinigameOutcome),
}

enum BiteWatch {
    Bite,
    TimedOut,
    Stopped,
}

fn outcome_label(outcome: MinigameOutcome) -> &'static str {
    match outcome {
        MinigameOutcome::Completed => "completed",
        MinigameOutcome::TimedOut => "timed_out",
        MinigameOutcome::Cancelled => "cancelled",
        MinigameOutcome::CaptureFailed => "capture_failed",
    }
}

pub struct FishingSession {
    region: Region,
    cancel_key: String,
    timings: SessionTimings,
    tracker: MarkerTracker,
    bite: BiteDetector,
    locator: RegionLocator,
    minigame: MinigameController,
    screen: Box<dyn ScreenCapture>,
    input: Box<dyn InputController>,
    state: Arc<BotState>,
    events: EventSink,
    rng: StdRng,
    safe_point: Option<(i32, i32)>,
    minigame_region: Option<Region>,
    journal: Option<Journal>,
}

impl FishingSession {
    pub fn new(
        config: SessionConfig,
        devices: Devices,
        state: Arc<BotState>,
        events: EventSink,
    ) -> Self {
        let bite = BiteDetector::new(state.tuning().bite_threshold);
        let mut locator = RegionLocator::new(config.bar);
        locator.interval = config.timings.bar_search_interval;
        Self {
            region: config.region,
            cancel_key: config.cancel_key,
            timings: config.timings,
            tracker: MarkerTracker::new(config.marker, config.tracker),
            bite,
            locator,
            minigame: MinigameController::new(config.minigame),
            screen: devices.screen,
            input: devices.input,
            state,
            events,
            rng: StdRng::from_entropy(),
            safe_point: None,
            minigame_region: None,
            journal: None,
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Hand the devices back once the session is over
    pub fn into_devices(self) -> Devices {
        Devices {
            screen: self.screen,
            input: self.input,
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// The bar being played, only while a minigame is in progress
    pub fn minigame_region(&self) -> Option<Region> {
        self.minigame_region
    }

    pub fn tracker(&self) -> &MarkerTracker {
        &self.tracker
    }

    pub fn bite_detector(&self) -> &BiteDetector {
        &self.bite
    }

    /// Repeat cycles until stopped. Always leaves the run flag cleared and the button up.
    pub fn run(&mut self) {
        self.events.log("Entering fishing loop.");
        if let Some(journal) = &self.journal {
            journal.record_session_start();
        }

        while self.state.is_running() {
            match panic::catch_unwind(AssertUnwindSafe(|| self.run_cycle())) {
                Ok(Ok(CycleOutcome::Stopped)) => break,
                Ok(Ok(outcome)) => {
                    tracing::debug!("[SESSION] Cycle ended: {:?}", outcome);
                    self.enter(SessionState::Recovering);
                }
                Ok(Err(e)) => {
                    self.events.log(format!("Error occurred during fishing loop: {:#}", e));
                    self.events.log(format!("{:?}", e));
                    break;
                }
                Err(payload) => {
                    let reason = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    self.events.log(format!("Fishing worker panicked: {}", reason));
                    break;
                }
            }
        }

        self.input.release(MouseButton::Left);
        self.minigame_region = None;
        self.state.set_running(false);
        if let Some(journal) = &self.journal {
            journal.record_session_stop();
        }
        self.events.log("Fishing bot routine terminated finally.");
    }

    /// One cast-to-rest cycle
    pub fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let tuning = self.state.tuning();
        self.bite.set_threshold(tuning.bite_threshold);
        self.tracker.reset();
        self.bite.reset();
        self.minigame_region = None;

        self.enter(SessionState::Casting);
        self.cast(&tuning)?;
        if !self.state.wait(self.timings.cast_settle) {
            return Ok(CycleOutcome::Stopped);
        }

        self.enter(SessionState::AwaitingLanding);
        self.events.log("Attempting bobber landing and initial image detection...");
        let Some(landing) = self.await_landing() else {
            if !self.state.is_running() {
                return Ok(CycleOutcome::Stopped);
            }
            self.state.update_stats(|s| s.landing_failures += 1);
            self.events.log(format!(
                "Initial bobber landing detection failed. Recasting in {:.1} seconds.",
                self.timings.recast_pause.as_secs_f64()
            ));
            self.enter(SessionState::Recovering);
            if !self.state.wait(self.timings.recast_pause) {
                return Ok(CycleOutcome::Stopped);
            }
            return Ok(CycleOutcome::LandingFailed);
        };

        self.events.log(format!(
            "Bobber landed at {:?}. Minimum drop for a bite: {} px.",
            landing.center,
            self.bite.threshold()
        ));
        self.bite.record_baseline(landing);

        self.enter(SessionState::WaitingForBite);
        match self.watch_for_bite() {
            BiteWatch::Stopped => Ok(CycleOutcome::Stopped),
            BiteWatch::TimedOut => Ok(self.recover_from_no_bite()),
            BiteWatch::Bite => Ok(self.hook_and_reel()),
        }
    }

    fn enter(&self, activity: SessionState) {
        self.state.set_activity(activity);
        self.state.set_detail_message(activity.description());
    }

    fn random_secs(&mut self, (lo, hi): (f64, f64)) -> Duration {
        Duration::from_secs_f64(self.rng.gen_range(lo..=hi.max(lo)))
    }

    fn safe_point(&mut self) -> Result<(i32, i32)> {
        if let Some(point) = self.safe_point {
            return Ok(point);
        }
        let (width, height) = self
            .screen
            .screen_size()
            .context("Failed to read screen size")?;
        let (ox, oy) = self.screen.origin().context("Failed to read screen origin")?;
        let point = (
            ox + width as i32 - SAFE_MARGIN,
            oy + height as i32 - SAFE_MARGIN,
        );
        self.safe_point = Some(point);
        Ok(point)
    }

    fn cast(&mut self, tuning: &Tuning) -> Result<()> {
        let safe_point = self.safe_point()?;
        let hold = self.random_secs((tuning.min_cast_time, tuning.max_cast_time));

        let (cx, cy) = self.region.center();
        let x = cx + self.rng.gen_range(-CAST_JITTER..=CAST_JITTER);
        let y = cy + self.rng.gen_range(-CAST_JITTER..=CAST_JITTER);
        self.input.move_to(x, y, self.timings.cast_move);

        {
            let mut guard = HoldGuard::new(self.input.as_mut(), MouseButton::Left);
            guard.hold();
            self.state.wait(hold);
            guard.release();
        }

        self.events.log(format!(
            "Fishing bobber cast complete. Hold time: {:.2} seconds.",
            hold.as_secs_f64()
        ));
        self.input.move_to(safe_point.0, safe_point.1, Duration::ZERO);
        self.state.update_stats(|s| s.casts += 1);
        Ok(())
    }

    fn locate_marker(&mut self) -> Option<MarkerDetection> {
        let found = self
            .tracker
            .locate(self.screen.as_ref(), self.region, &self.events);
        let misses = self.tracker.state().consecutive_fail_count;
        self.state.update_stats(|s| s.marker_misses = misses);
        found
    }

    fn await_landing(&mut self) -> Option<MarkerDetection> {
        let attempts = self.timings.landing_attempts;
        for attempt in 1..=attempts {
            if let Some(landing) = self.locate_marker() {
                return Some(landing);
            }
            tracing::debug!("[SESSION] Landing check {}/{} found nothing", attempt, attempts);
            if !self.state.wait(self.timings.landing_interval) {
                return None;
            }
        }
        None
    }

    fn watch_for_bite(&mut self) -> BiteWatch {
        let started = Instant::now();
        while started.elapsed() < self.timings.bite_timeout {
            if !self.state.is_running() {
                return BiteWatch::Stopped;
            }
            let sighting = self.locate_marker();
            if self.bite.observe(sighting) {
                self.events.log(format!(
                    "Bobber drop distance exceeded! ({} px >= {} px)",
                    self.bite.last_distance().unwrap_or_default(),
                    self.bite.threshold()
                ));
                return BiteWatch::Bite;
            }
            if !self.state.wait(self.timings.bite_poll) {
                return BiteWatch::Stopped;
            }
        }

        if self.state.is_running() {
            BiteWatch::TimedOut
        } else {
            BiteWatch::Stopped
        }
    }

    fn press_cancel(&mut self) -> bool {
        self.events.log(format!(
            "Press Cancel key ({}) and wait {:.1} second.",
            self.cancel_key,
            self.timings.cancel_pause.as_secs_f64()
        ));
        self.input.press_key(&self.cancel_key);
        self.state.wait(self.timings.cancel_pause)
    }

    fn recover_from_no_bite(&mut self) -> CycleOutcome {
        self.enter(SessionState::Recovering);
        self.state.update_stats(|s| s.missed_bites += 1);
        self.events.log(format!(
            "Bite detection time exceeded ({} seconds).",
            self.timings.bite_timeout.as_secs()
        ));

        if !self.press_cancel() {
            return CycleOutcome::Stopped;
        }
        self.events.log(format!(
            "Waiting {:.1} seconds for the next loop.",
            self.timings.no_bite_pause.as_secs_f64()
        ));
        if !self.state.wait(self.timings.no_bite_pause) {
            return CycleOutcome::Stopped;
        }
        CycleOutcome::NoBite
    }

    /// Click on the last bobber position, or in place when it was never seen
    fn hook(&mut self) {
        let target = self
            .bite
            .previous()
            .map(|d| d.center)
            .or_else(|| self.tracker.last_center());

        match target {
            Some((cx, cy)) => {
                let x = self.region.left + cx + self.rng.gen_range(-CLICK_JITTER..=CLICK_JITTER);
                let y = self.region.top + cy + self.rng.gen_range(-CLICK_JITTER..=CLICK_JITTER);
                self.input.move_to(x, y, self.timings.click_move);
                self.input.click();
                self.events.log(format!("Clicked bobber at ({}, {}).", x, y));
            }
            None => {
                self.input.click();
                self.events.log("Last cast position click complete.");
            }
        }
    }

    fn hook_and_reel(&mut self) -> CycleOutcome {
        self.state.update_stats(|s| s.bites += 1);

        let reaction = self.random_secs(self.timings.reaction_delay);
        self.events.log(format!(
            "Bite detection successful! Clicking after {:.2} seconds.",
            reaction.as_secs_f64()
        ));
        if !self.state.wait(reaction) {
            return CycleOutcome::Stopped;
        }
        self.hook();

        let settle = self.random_secs(self.timings.post_click_delay);
        if !self.state.wait(settle) {
            return CycleOutcome::Stopped;
        }

        let Some(bar) = self.locator.locate(self.screen.as_ref(), &self.state, &self.events) else {
            if !self.state.is_running() {
                return CycleOutcome::Stopped;
            }
            self.state.update_stats(|s| s.bars_not_found += 1);
            self.journal_catch(false, "bar_not_found");
            self.events.log(format!(
                "Minigame bar not found after {} attempts. Waiting {:.1} seconds.",
                self.locator.attempts,
                self.timings.bar_missing_pause.as_secs_f64()
            ));
            self.enter(SessionState::Recovering);
            if !self.state.wait(self.timings.bar_missing_pause) {
                return CycleOutcome::Stopped;
            }
            return CycleOutcome::BarNotFound;
        };

        self.minigame_region = Some(bar);
        self.enter(SessionState::Minigame);
        let outcome = self.minigame.run(
            bar,
            self.screen.as_ref(),
            self.input.as_mut(),
            &self.state,
            &mut self.rng,
            &self.events,
        );
        self.minigame_region = None;

        if outcome == MinigameOutcome::Cancelled {
            return CycleOutcome::Stopped;
        }

        self.state.update_stats(|s| {
            if outcome.is_success() {
                s.catches += 1;
            } else {
                s.escapes += 1;
            }
        });
        self.journal_catch(outcome.is_success(), outcome_label(outcome));

        self.events.log("Post-processing after minigame.");
        if !self.press_cancel() {
            return CycleOutcome::Minigame(outcome);
        }

        let rest = self.random_secs(self.timings.rest);
        self.events.log(format!(
            "Resting {:.2} seconds before the next cast.",
            rest.as_secs_f64()
        ));
        self.state.wait(rest);
        CycleOutcome::Minigame(outcome)
    }

    fn journal_catch(&self, status: bool, outcome: &str) {
        if let Some(journal) = &self.journal {
            journal.log_catch(status, outcome);
        }
    }
}
