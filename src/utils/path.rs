//! Path utilities for finding data directories

use std::env;
use std::path::{Path, PathBuf};

/// Folder next to the data dir holding the reference templates
pub const TEMPLATES_FOLDER: &str = "templates";

/// Returns the folder where config, templates and logs live.
/// Uses the executable directory when it ships a `config` folder,
/// otherwise the current working directory.
pub fn get_data_dir() -> PathBuf {
    if let Ok(exe_path) = env::current_exe() {
        if let Some(parent) = exe_path.parent() {
            if parent.join("config").exists() {
                return parent.to_path_buf();
            }
        }
    }

    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Resolve the templates folder under a data dir, falling back to the data dir itself
/// for layouts that keep the template images at the top level
pub fn templates_dir(base: &Path) -> PathBuf {
    let nested = base.join(TEMPLATES_FOLDER);
    if nested.is_dir() {
        nested
    } else {
        base.to_path_buf()
    }
}
