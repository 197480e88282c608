//! Error types shared across the bot

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("required template file is missing: '{0}'")]
    TemplateMissing(PathBuf),

    #[error("template load failed: '{0}', file may be corrupted")]
    TemplateUnreadable(PathBuf),

    #[error("required template '{0}' is not loaded")]
    TemplateAbsent(&'static str),

    #[error("fishing area is not set")]
    RegionUnset,

    #[error("bot is already running")]
    AlreadyRunning,

    #[error("previous session is still shutting down")]
    StillStopping,

    #[error("fishing worker exited abnormally")]
    WorkerLost,

    #[error("failed to spawn fishing worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("invalid cast time range {min:.2}s..{max:.2}s")]
    InvalidCastRange { min: f64, max: f64 },

    #[error("failed to parse settings file '{path}': {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
