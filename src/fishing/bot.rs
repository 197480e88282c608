//! Start/stop handle that owns the worker thread

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::session::{Devices, FishingSession, SessionConfig, SessionTimings};
use crate::error::BotError;
use crate::events::EventSink;
use crate::log_main::Journal;
use crate::screen_reader::{Region, TemplateStore};
use crate::utils::{BotState, Settings};
use crate::window::{NoFocus, WindowFocus};

/// How long shutdown waits for the worker to notice the stop request
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

pub struct FishingBot {
    state: Arc<BotState>,
    events: EventSink,
    templates: TemplateStore,
    region: Option<Region>,
    cancel_key: String,
    timings: SessionTimings,
    focus: Box<dyn WindowFocus>,
    journal: Option<Journal>,
    seed: Option<u64>,
    /// Devices while no worker owns them
    devices: Option<Devices>,
    worker: Option<JoinHandle<Devices>>,
}

impl FishingBot {
    pub fn new(templates: TemplateStore, devices: Devices, events: EventSink) -> Self {
        Self {
            state: Arc::new(BotState::new()),
            events,
            templates,
            region: None,
            cancel_key: "s".to_string(),
            timings: SessionTimings::default(),
            focus: Box::new(NoFocus),
            journal: None,
            seed: None,
            devices: Some(devices),
            worker: None,
        }
    }

    pub fn with_focus(mut self, focus: Box<dyn WindowFocus>) -> Self {
        self.focus = focus;
        self
    }

    pub fn with_timings(mut self, timings: SessionTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Deterministic jitter and delays, for replaying a session
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Take region, tuning and cancel key from user settings
    pub fn apply_settings(&mut self, settings: &Settings) {
        if let Some(region) = settings.region {
            self.set_region(region);
        }
        // Refusal is already logged
        let _ = self.set_cast_time(settings.min_cast_time, settings.max_cast_time);
        self.set_bite_threshold(settings.bite_threshold);
        self.cancel_key = settings.cancel_key.clone();
    }

    pub fn state(&self) -> Arc<BotState> {
        self.state.clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    /// Set the casting area used by the next start; empty rectangles are ignored
    pub fn set_region(&mut self, region: Region) -> bool {
        if !region.is_valid() {
            tracing::warn!("[SESSION] Ignoring empty fishing area {}", region);
            return false;
        }
        self.region = Some(region);
        self.events.log(format!("Fishing area set: {}", region));
        true
    }

    /// Change the cast hold range; an invalid range is logged and leaves the old one
    pub fn set_cast_time(&self, min: f64, max: f64) -> Result<(), BotError> {
        self.state.set_cast_time(min, max).inspect_err(|e| {
            self.events.log(format!("Cast time ignored: {}", e));
        })
    }

    pub fn set_bite_threshold(&self, pixels: i32) {
        self.state.set_bite_threshold(pixels);
    }

    /// Launch the worker.
    ///
    /// Calling this while running changes nothing and returns `AlreadyRunning`.
    /// Missing templates or an unset region are logged and refused before any side effect.
    pub fn start(&mut self) -> Result<(), BotError> {
        if self.state.is_running() {
            return Err(BotError::AlreadyRunning);
        }

        let Some(marker) = self.templates.marker.clone() else {
            self.events
                .log("Bot start failed: Required template (bobber) is not loaded.");
            return Err(BotError::TemplateAbsent("bobber"));
        };
        let Some(bar) = self.templates.bar.clone() else {
            self.events
                .log("Bot start failed: Required template (minigame bar) is not loaded.");
            return Err(BotError::TemplateAbsent("minigame bar"));
        };
        let Some(region) = self.region else {
            self.events.log("Bot start failed: Fishing area is not set.");
            return Err(BotError::RegionUnset);
        };

        let devices = self.reclaim_devices()?;

        if self.focus.focus() {
            self.events.log("Game window focused.");
        } else {
            tracing::warn!("[SESSION] Could not focus the game window, starting anyway");
        }

        if !self.state.try_start() {
            self.devices = Some(devices);
            return Err(BotError::AlreadyRunning);
        }
        self.state.reset_stats();

        let mut config = SessionConfig::new(region, marker, bar);
        config.cancel_key = self.cancel_key.clone();
        config.timings = self.timings.clone();

        let mut session = FishingSession::new(config, devices, self.state.clone(), self.events.clone());
        if let Some(seed) = self.seed {
            session = session.with_rng(StdRng::seed_from_u64(seed));
        }
        if let Some(journal) = &self.journal {
            session = session.with_journal(journal.clone());
        }

        let spawned = thread::Builder::new()
            .name("fishing-worker".to_string())
            .spawn(move || {
                session.run();
                session.into_devices()
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                self.events.log(format!("Fishing bot started. Area: {}", region));
                Ok(())
            }
            Err(e) => {
                self.state.set_running(false);
                self.events.log(format!("Bot start failed: {}", e));
                Err(BotError::Spawn(e))
            }
        }
    }

    /// Ask the worker to stop; repeated calls are harmless
    pub fn stop(&self) {
        if self.state.is_running() {
            self.state.set_running(false);
            self.events.log("Fishing bot stop requested.");
        }
    }

    /// Stop and wait up to [`SHUTDOWN_GRACE`] for the worker to finish.
    ///
    /// Returns false when the worker was still busy; it is then left to finish on its own.
    pub fn shutdown(&mut self) -> bool {
        self.stop();
        let Some(handle) = self.worker.take() else {
            return true;
        };

        if !wait_for_finish(&handle, SHUTDOWN_GRACE) {
            tracing::warn!(
                "[SESSION] Worker did not stop within {:?}",
                SHUTDOWN_GRACE
            );
            self.worker = Some(handle);
            return false;
        }

        match handle.join() {
            Ok(devices) => self.devices = Some(devices),
            Err(_) => tracing::error!("[SESSION] Fishing worker exited abnormally"),
        }
        true
    }

    /// Devices for a new session, taking them back from a finished worker if needed
    fn reclaim_devices(&mut self) -> Result<Devices, BotError> {
        if let Some(devices) = self.devices.take() {
            return Ok(devices);
        }

        let Some(handle) = self.worker.take() else {
            return Err(BotError::WorkerLost);
        };
        if !wait_for_finish(&handle, SHUTDOWN_GRACE) {
            self.worker = Some(handle);
            self.events
                .log("Bot start failed: previous session is still shutting down.");
            return Err(BotError::StillStopping);
        }

        handle.join().map_err(|_| {
            self.events
                .log("Bot start failed: previous worker exited abnormally.");
            BotError::WorkerLost
        })
    }
}

impl Drop for FishingBot {
    fn drop(&mut self) {
        self.stop();
    }
}

fn wait_for_finish<T>(handle: &JoinHandle<T>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(10));
    }
    true
}
