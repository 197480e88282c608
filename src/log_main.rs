//! Session and catch journal kept as JSON files under `logs/`

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::path::get_data_dir;

pub const SESSIONS_FILE: &str = "sessions.json";
pub const FISHING_LOG_FILE: &str = "fishing_log.json";

/// Session entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub start: String,
    pub stop: Option<String>,
}

/// One bite that reached the hooking stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatchLogEntry {
    pub timestamp: String,
    #[serde(rename = "catch")]
    pub status: bool,
    /// How the attempt ended, e.g. "completed" or "bar_not_found"
    pub outcome: String,
}

/// Append-only journal rooted at a `logs` directory.
///
/// Write failures are logged and otherwise ignored.
#[derive(Debug, Clone)]
pub struct Journal {
    dir: PathBuf,
}

impl Journal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Journal under the application data directory
    pub fn in_data_dir() -> Self {
        Self::new(get_data_dir().join("logs"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn sessions_path(&self) -> PathBuf {
        self.dir.join(SESSIONS_FILE)
    }

    fn catches_path(&self) -> PathBuf {
        self.dir.join(FISHING_LOG_FILE)
    }

    pub fn load_sessions(&self) -> Vec<Session> {
        load_list(&self.sessions_path())
    }

    pub fn load_catches(&self) -> Vec<CatchLogEntry> {
        load_list(&self.catches_path())
    }

    /// Open a new session entry; a dangling open entry is closed first
    pub fn record_session_start(&self) {
        let now = Utc::now().to_rfc3339();
        let mut sessions = load_for_update(&self.sessions_path());
        if let Some(last) = sessions.last_mut() {
            if last.stop.is_none() {
                tracing::debug!("[JOURNAL] Closing session left open since {}", last.start);
                last.stop = Some(now.clone());
            }
        }
        sessions.push(Session { start: now, stop: None });
        save_list(&self.sessions_path(), &sessions);
    }

    /// Close the most recent open session, if any
    pub fn record_session_stop(&self) {
        let mut sessions = load_for_update(&self.sessions_path());
        match sessions.last_mut() {
            Some(last) if last.stop.is_none() => {
                last.stop = Some(Utc::now().to_rfc3339());
                save_list(&self.sessions_path(), &sessions);
            }
            _ => tracing::debug!("[JOURNAL] No active session to stop"),
        }
    }

    pub fn log_catch(&self, status: bool, outcome: impl Into<String>) {
        let mut data = load_for_update(&self.catches_path());
        data.push(CatchLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            status,
            outcome: outcome.into(),
        });
        save_list(&self.catches_path(), &data);
    }
}

fn read_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
}

fn load_list<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    read_list(path).unwrap_or_else(|e| {
        tracing::warn!("[JOURNAL] {:#}", e);
        Vec::new()
    })
}

/// Path an unreadable journal file is moved to before it is rewritten
pub fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".corrupt");
    path.with_file_name(name)
}

/// Load a list that is about to be rewritten.
///
/// An unreadable file is moved aside so the rewrite does not destroy its history.
fn load_for_update<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    match read_list(path) {
        Ok(list) => list,
        Err(e) => {
            let aside = corrupt_path(path);
            tracing::warn!("[JOURNAL] {:#}; moving it to {:?}", e, aside);
            if let Err(e) = fs::rename(path, &aside) {
                tracing::warn!("[JOURNAL] Failed to move {:?} aside: {}", path, e);
            }
            Vec::new()
        }
    }
}

fn save_list<T: Serialize>(path: &Path, data: &[T]) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    match serde_json::to_string_pretty(data) {
        Ok(content) => {
            if let Err(e) = fs::write(path, content) {
                tracing::warn!("[JOURNAL] Failed to write {:?}: {}", path, e);
            }
        }
        Err(e) => tracing::warn!("[JOURNAL] Failed to serialize {:?}: {}", path, e),
    }
}
