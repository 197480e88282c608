//! Utility modules

pub mod bot_state;
pub mod keybinds;
pub mod path;
pub mod settings;

pub use bot_state::{BotState, SessionState, SessionStats, Tuning};
pub use settings::{get_settings, Settings};
