//! Bite detection from the bobber's vertical drop

use super::marker_tracker::MarkerDetection;

/// Pixels the bobber has to sink below its landing height
pub const DEFAULT_BITE_THRESHOLD: i32 = 6;

/// Compares each sighting against the landing baseline.
///
/// The baseline is recorded once per cast and never moves, so a slow drift counts
/// the same as a sudden dip.
#[derive(Debug, Clone)]
pub struct BiteDetector {
    threshold: i32,
    baseline_y: Option<i32>,
    previous: Option<MarkerDetection>,
    last_distance: Option<i32>,
}

impl Default for BiteDetector {
    fn default() -> Self {
        Self::new(DEFAULT_BITE_THRESHOLD)
    }
}

impl BiteDetector {
    pub fn new(threshold: i32) -> Self {
        Self {
            threshold,
            baseline_y: None,
            previous: None,
            last_distance: None,
        }
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: i32) {
        self.threshold = threshold;
    }

    pub fn reset(&mut self) {
        self.baseline_y = None;
        self.previous = None;
        self.last_distance = None;
    }

    /// Remember where the bobber settled after the cast
    pub fn record_baseline(&mut self, landing: MarkerDetection) {
        self.baseline_y = Some(landing.center.1);
        self.previous = Some(landing);
        self.last_distance = Some(0);
    }

    pub fn baseline(&self) -> Option<i32> {
        self.baseline_y
    }

    /// Latest sighting, used to aim the hook click
    pub fn previous(&self) -> Option<&MarkerDetection> {
        self.previous.as_ref()
    }

    /// Drop of the latest sighting below the baseline, in pixels
    pub fn last_distance(&self) -> Option<i32> {
        self.last_distance
    }

    /// Feed one tracker result; true when the bobber has sunk far enough.
    ///
    /// A missing sighting is never a bite. The first sighting of a cast becomes the baseline.
    pub fn observe(&mut self, current: Option<MarkerDetection>) -> bool {
        let Some(current) = current else {
            return false;
        };

        let Some(baseline) = self.baseline_y else {
            self.record_baseline(current);
            return false;
        };

        let distance = current.center.1 - baseline;
        self.last_distance = Some(distance);
        self.previous = Some(current);

        if distance >= self.threshold {
            tracing::debug!(
                "[BITE] Drop of {} px reached threshold {} px",
                distance,
                self.threshold
            );
            true
        } else {
            false
        }
    }
}
