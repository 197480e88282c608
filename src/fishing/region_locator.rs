//! Finds the reel minigame bar on the whole screen

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::events::EventSink;
use crate::screen_reader::{best_match, CaptureArea, Region, ScreenCapture, Template};
use crate::utils::BotState;

/// Minimum correlation for the bar template
pub const BAR_MATCH_THRESHOLD: f64 = 0.5;
pub const MAX_BAR_SEARCH_ATTEMPTS: u32 = 5;
pub const BAR_SEARCH_INTERVAL: Duration = Duration::from_millis(300);

pub struct RegionLocator {
    template: Arc<Template>,
    pub threshold: f64,
    pub attempts: u32,
    pub interval: Duration,
}

impl RegionLocator {
    pub fn new(template: Arc<Template>) -> Self {
        Self {
            template,
            threshold: BAR_MATCH_THRESHOLD,
            attempts: MAX_BAR_SEARCH_ATTEMPTS,
            interval: BAR_SEARCH_INTERVAL,
        }
    }

    /// One full-screen scan; the bar's screen rectangle when it scores high enough
    pub fn locate_once(&self, screen: &dyn ScreenCapture) -> Result<Option<Region>> {
        let frame = screen.capture(CaptureArea::FullScreen)?;
        let gray = image::imageops::grayscale(&frame);
        let found = best_match(&gray, &self.template.image)?;

        tracing::debug!(
            "[BAR] Best score {:.3} at {:?} (threshold {:.2})",
            found.score,
            found.location,
            self.threshold
        );

        if found.score < self.threshold {
            return Ok(None);
        }

        let (ox, oy) = screen.origin()?;
        let (x, y) = found.location;
        Ok(Some(Region::new(
            ox + x,
            oy + y,
            self.template.width(),
            self.template.height(),
        )))
    }

    /// Scan up to `attempts` times, pausing `interval` between tries.
    ///
    /// Stops early and returns `None` once the bot is asked to stop.
    pub fn locate(
        &self,
        screen: &dyn ScreenCapture,
        state: &BotState,
        events: &EventSink,
    ) -> Option<Region> {
        for attempt in 1..=self.attempts {
            if !state.is_running() {
                return None;
            }

            match self.locate_once(screen) {
                Ok(Some(bar)) => {
                    events.log(format!("Minigame bar found: {}", bar));
                    return Some(bar);
                }
                Ok(None) => {
                    tracing::debug!("[BAR] Attempt {}/{} found nothing", attempt, self.attempts);
                }
                Err(e) => {
                    events.log(format!("Error during minigame bar search: {:#}", e));
                }
            }

            if attempt < self.attempts && !state.wait(self.interval) {
                return None;
            }
        }

        None
    }
}
