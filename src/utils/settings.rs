//! User settings read from `config/settings.json`

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::BotError;
use crate::screen_reader::Region;
use crate::utils::path::get_data_dir;

/// Settings structure. Every field falls back to its default when absent from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Casting area, screen-absolute
    pub region: Option<Region>,
    pub min_cast_time: f64,
    pub max_cast_time: f64,
    /// Downward bobber displacement (px) that counts as a bite
    pub bite_threshold: i32,
    /// Key pressed to dismiss the catch window
    pub cancel_key: String,
    pub start_key: String,
    pub stop_key: String,
    pub quit_key: String,
    pub window_title: String,
    pub marker_template: String,
    pub bar_template: String,
    pub save_debug_frames: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            region: None,
            min_cast_time: 0.15,
            max_cast_time: 0.35,
            bite_threshold: 6,
            cancel_key: "s".to_string(),
            start_key: "F1".to_string(),
            stop_key: "F2".to_string(),
            quit_key: "F12".to_string(),
            window_title: "Albion Online Client".to_string(),
            marker_template: "bobber_template.png".to_string(),
            bar_template: "bar_template.png".to_string(),
            save_debug_frames: false,
        }
    }
}

/// Get settings file path
pub fn get_settings_path() -> PathBuf {
    get_data_dir().join("config").join("settings.json")
}

/// Parse a settings file; a missing file is not an error
pub fn read_settings(path: &Path) -> Result<Settings, BotError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return Ok(Settings::default()),
    };

    serde_json::from_str(&content).map_err(|source| BotError::Settings {
        path: path.to_path_buf(),
        source,
    })
}

/// Get current settings, logging and falling back to defaults on a broken file
pub fn get_settings() -> Settings {
    let path = get_settings_path();
    match read_settings(&path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("[INIT] {}. Using defaults.", e);
            Settings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.bite_threshold, 6);
        assert_eq!(settings.start_key, "F1");
        assert!(settings.region.is_none());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = read_settings(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"bite_threshold": 9, "region": {"left": 5, "top": 6, "width": 70, "height": 80}}"#,
        )
        .unwrap();

        let settings = read_settings(&path).unwrap();
        assert_eq!(settings.bite_threshold, 9);
        assert_eq!(settings.region, Some(Region::new(5, 6, 70, 80)));
        assert_eq!(settings.cancel_key, "s");
    }

    #[test]
    fn test_broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(read_settings(&path), Err(BotError::Settings { .. })));
    }
}
