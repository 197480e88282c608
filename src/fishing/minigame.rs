//! Reel minigame: hold the button while the indicator is left of the stop point,
//! release past it, and finish once the strip goes dark.

use std::thread;
use std::time::{Duration, Instant};

use image::RgbaImage;
use rand::Rng;

use crate::events::EventSink;
use crate::input::{HoldGuard, InputController, MouseButton};
use crate::screen_reader::{CaptureArea, Region, ScreenCapture};
use crate::utils::BotState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinigameConfig {
    pub timeout: Duration,
    /// Width of the one-pixel scan strip, centered on the bar
    pub scan_width: u32,
    /// Strip row below the bar's top edge
    pub scan_y_offset: i32,
    /// Indicator positions up to this index keep the button held
    pub reel_stop_x: usize,
    /// A pixel is lit when r + g + b exceeds this
    pub brightness_limit: u32,
    pub release_pause_chance: f64,
    /// Seconds, inclusive range
    pub release_pause: (f64, f64),
    pub tick: Duration,
}

impl Default for MinigameConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            scan_width: 260,
            scan_y_offset: 15,
            reel_stop_x: 180,
            brightness_limit: 400,
            release_pause_chance: 1.0 / 3.0,
            release_pause: (0.2, 0.3),
            tick: Duration::from_micros(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinigameOutcome {
    /// The strip went dark and the finishing click was sent
    Completed,
    TimedOut,
    Cancelled,
    CaptureFailed,
}

impl MinigameOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, MinigameOutcome::Completed)
    }
}

/// What to do with the button for one strip reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReelAction {
    Hold,
    Release,
    Finish,
}

pub fn decide(indicator: Option<usize>, reel_stop_x: usize) -> ReelAction {
    match indicator {
        None => ReelAction::Finish,
        Some(x) if x <= reel_stop_x => ReelAction::Hold,
        Some(_) => ReelAction::Release,
    }
}

/// Index of the first lit pixel on the strip's top row
pub fn first_bright_pixel(strip: &RgbaImage, brightness_limit: u32) -> Option<usize> {
    if strip.height() == 0 {
        return None;
    }
    (0..strip.width()).position(|x| {
        let p = strip.get_pixel(x, 0);
        p[0] as u32 + p[1] as u32 + p[2] as u32 > brightness_limit
    })
}

/// Screen rectangle of the scan strip for a located bar
pub fn strip_region(bar: &Region, config: &MinigameConfig) -> Region {
    let center_x = bar.left + (bar.width / 2) as i32;
    Region::new(
        center_x - (config.scan_width / 2) as i32,
        bar.top + config.scan_y_offset,
        config.scan_width,
        1,
    )
}

#[derive(Debug, Clone, Default)]
pub struct MinigameController {
    pub config: MinigameConfig,
}

impl MinigameController {
    pub fn new(config: MinigameConfig) -> Self {
        Self { config }
    }

    /// Play one minigame on `bar`.
    ///
    /// The button is always released before this returns, whatever the outcome.
    pub fn run<R: Rng>(
        &self,
        bar: Region,
        screen: &dyn ScreenCapture,
        input: &mut dyn InputController,
        state: &BotState,
        rng: &mut R,
        events: &EventSink,
    ) -> MinigameOutcome {
        let strip = strip_region(&bar, &self.config);
        tracing::debug!("[MINIGAME] Scanning strip {}", strip);

        let mut guard = HoldGuard::new(input, MouseButton::Left);
        // Start from a known released state
        guard.release();

        let started = Instant::now();
        loop {
            if !state.is_running() {
                guard.release();
                events.log("Minigame cancelled.");
                return MinigameOutcome::Cancelled;
            }
            if started.elapsed() >= self.config.timeout {
                guard.release();
                events.log(format!(
                    "Minigame time limit ({} seconds) exceeded.",
                    self.config.timeout.as_secs()
                ));
                return MinigameOutcome::TimedOut;
            }

            let pixels = match screen.capture(CaptureArea::Region(strip)) {
                Ok(pixels) => pixels,
                Err(e) => {
                    guard.release();
                    events.log(format!("Minigame tracking error: {:#}", e));
                    return MinigameOutcome::CaptureFailed;
                }
            };

            let indicator = first_bright_pixel(&pixels, self.config.brightness_limit);
            match decide(indicator, self.config.reel_stop_x) {
                ReelAction::Hold => guard.hold(),
                ReelAction::Release => {
                    guard.release();
                    if rng.gen_bool(self.config.release_pause_chance) {
                        let (lo, hi) = self.config.release_pause;
                        state.wait(Duration::from_secs_f64(rng.gen_range(lo..=hi)));
                    }
                }
                ReelAction::Finish => {
                    guard.release();
                    guard.click();
                    events.log("Target area disappearance detected! Minigame loop terminated.");
                    return MinigameOutcome::Completed;
                }
            }

            thread::sleep(self.config.tick);
        }
    }
}
