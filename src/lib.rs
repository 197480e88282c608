//! Auto Angler - vision-driven fishing bot
//!
//! Captures a user-chosen casting area, tracks the bobber with template matching,
//! detects bites from its vertical drop and plays the reel minigame by sampling a
//! one-pixel strip of the minigame bar while simulating mouse and keyboard input.

pub mod error;
pub mod events;
pub mod fishing;
pub mod input;
pub mod log_main;
pub mod screen_reader;
pub mod utils;
pub mod window;

// Re-exports for convenience
pub use error::BotError;
pub use events::{EventSink, SessionEvent};
pub use fishing::{CycleOutcome, Devices, FishingBot, FishingSession, SessionTimings};
pub use input::{EnigoInput, HoldGuard, InputController, MouseButton};
pub use screen_reader::{CaptureArea, Region, ScreenCapture, ScreenService, Template, TemplateStore};
pub use utils::{bot_state, get_settings, keybinds, path::get_data_dir, BotState, Settings};
pub use window::{GameWindow, NoFocus, WindowFocus};
