//! Shared bot state for communication between the presentation thread and the worker

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;

use crate::error::BotError;

/// Longest single sleep inside a cancellable wait
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Where the fishing state machine currently is
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Casting,
    AwaitingLanding,
    WaitingForBite,
    Minigame,
    Recovering,
    Stopped,
}

impl SessionState {
    /// Get human-readable description of the state
    pub fn description(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Casting => "Casting fishing line...",
            SessionState::AwaitingLanding => "Waiting for bobber to land...",
            SessionState::WaitingForBite => "Waiting for fish to bite...",
            SessionState::Minigame => "Playing reel minigame...",
            SessionState::Recovering => "Recovering...",
            SessionState::Stopped => "Bot stopped",
        }
    }
}

/// Session counters
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SessionStats {
    pub casts: u32,
    pub landing_failures: u32,
    pub bites: u32,
    pub missed_bites: u32,
    pub bars_not_found: u32,
    pub catches: u32,
    pub escapes: u32,
    /// Mirror of the tracker's consecutive miss counter
    pub marker_misses: u32,
}

impl SessionStats {
    /// Minigames won over minigames played, in percent
    pub fn catch_rate(&self) -> f64 {
        let total = self.catches + self.escapes;
        if total > 0 {
            (self.catches as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Values the presentation layer may change while the worker runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub min_cast_time: f64,
    pub max_cast_time: f64,
    pub bite_threshold: i32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            min_cast_time: 0.15,
            max_cast_time: 0.35,
            bite_threshold: 6,
        }
    }
}

/// State shared between the starter/stopper and the single worker.
///
/// The run flag is the only value both sides write; everything else is written by one side.
#[derive(Debug)]
pub struct BotState {
    running: AtomicBool,
    activity: RwLock<SessionState>,
    stats: RwLock<SessionStats>,
    detail_message: RwLock<String>,
    tuning: RwLock<Tuning>,
}

impl Default for BotState {
    fn default() -> Self {
        Self::new()
    }
}

impl BotState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            activity: RwLock::new(SessionState::Idle),
            stats: RwLock::new(SessionStats::default()),
            detail_message: RwLock::new(String::new()),
            tuning: RwLock::new(Tuning::default()),
        }
    }

    /// Check if bot is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Set bot running state
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
        if !running {
            self.set_activity(SessionState::Stopped);
        }
    }

    /// Atomically flip the flag from stopped to running; false if it was already set
    pub fn try_start(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Sleep for `duration` while honoring a stop request.
    ///
    /// Checks the run flag before sleeping, between slices and after the last slice.
    /// Returns whether the bot is still running.
    pub fn wait(&self, duration: Duration) -> bool {
        if !self.is_running() {
            return false;
        }

        let deadline = Instant::now() + duration;
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(WAIT_SLICE));
            if !self.is_running() {
                return false;
            }
        }

        self.is_running()
    }

    /// Get current activity
    pub fn activity(&self) -> SessionState {
        *self.activity.read()
    }

    /// Set current activity
    pub fn set_activity(&self, activity: SessionState) {
        *self.activity.write() = activity;
    }

    pub fn detail_message(&self) -> String {
        self.detail_message.read().clone()
    }

    pub fn set_detail_message(&self, message: impl Into<String>) {
        *self.detail_message.write() = message.into();
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.read().clone()
    }

    /// Apply a change to the counters
    pub fn update_stats(&self, f: impl FnOnce(&mut SessionStats)) {
        f(&mut self.stats.write());
    }

    /// Reset stats for new session
    pub fn reset_stats(&self) {
        *self.stats.write() = SessionStats::default();
    }

    pub fn tuning(&self) -> Tuning {
        *self.tuning.read()
    }

    pub fn set_cast_time(&self, min: f64, max: f64) -> Result<(), BotError> {
        if !(min > 0.0 && max >= min) {
            return Err(BotError::InvalidCastRange { min, max });
        }
        let mut tuning = self.tuning.write();
        tuning.min_cast_time = min;
        tuning.max_cast_time = max;
        Ok(())
    }

    pub fn set_bite_threshold(&self, pixels: i32) {
        self.tuning.write().bite_threshold = pixels;
    }

    /// Get status as JSON string
    pub fn to_json(&self) -> String {
        let stats = self.stats();
        serde_json::json!({
            "running": self.is_running(),
            "activity": self.activity().description(),
            "detail": self.detail_message(),
            "stats": {
                "casts": stats.casts,
                "bites": stats.bites,
                "catches": stats.catches,
                "escapes": stats.escapes,
                "missed_bites": stats.missed_bites,
                "bars_not_found": stats.bars_not_found,
                "rate": format!("{:.2}", stats.catch_rate())
            }
        })
        .to_string()
    }
}
