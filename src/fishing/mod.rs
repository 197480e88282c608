//! Fishing automation: bobber tracking, bite detection, the reel minigame and the
//! session state machine that ties them together

pub mod bite_detector;
pub mod bot;
pub mod marker_tracker;
pub mod minigame;
pub mod region_locator;
pub mod session;

pub use bite_detector::BiteDetector;
pub use bot::FishingBot;
pub use marker_tracker::{MarkerDetection, MarkerTracker, SearchWindow, TrackerConfig};
pub use minigame::{MinigameConfig, MinigameController, MinigameOutcome};
pub use region_locator::RegionLocator;
pub use session::{CycleOutcome, Devices, FishingSession, SessionConfig, SessionTimings};
