//! Filesystem layout under a project's base directory.

use std::path::{Path, PathBuf};

/// Directory holding all td state for a project.
pub const TODOS_DIR: &str = ".todos";

pub fn todos_dir(base_dir: &Path) -> PathBuf {
    base_dir.join(TODOS_DIR)
}

pub fn db_path(base_dir: &Path) -> PathBuf {
    todos_dir(base_dir).join("issues.json")
}

pub fn config_path(base_dir: &Path) -> PathBuf {
    todos_dir(base_dir).join("config.toml")
}

pub fn session_path(base_dir: &Path) -> PathBuf {
    todos_dir(base_dir).join("session.toml")
}

pub fn log_path(base_dir: &Path) -> PathBuf {
    todos_dir(base_dir).join("monitor.log")
}
