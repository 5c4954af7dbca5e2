//! Small UI state persisted per project: the focused issue and the monitor's
//! pane-height triple.
//!
//! Stored as TOML at `<base>/.todos/config.toml`. A missing file yields
//! defaults; a malformed one is an error.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::paths;

/// Minimum fraction of the available height a single pane may take.
pub const MIN_PANE_HEIGHT: f64 = 0.1;

/// Default pane proportions (current work, task list, activity).
pub const DEFAULT_PANE_HEIGHTS: [f64; 3] = [0.25, 0.45, 0.30];

const SUM_TOLERANCE: f64 = 0.01;

/// Key-value persistence for the monitor's UI state.
pub trait ConfigStore: Send + Sync {
    fn get_focus(&self) -> Result<Option<String>>;

    fn set_focus(&self, issue_id: Option<&str>) -> Result<()>;

    /// Returns the saved triple, or `None` when unset or invalid.
    fn get_pane_heights(&self) -> Result<Option<[f64; 3]>>;

    fn set_pane_heights(&self, heights: [f64; 3]) -> Result<()>;
}

/// On-disk shape of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pane_heights: Option<Vec<f64>>,
}

/// Validates a pane-height list: three entries, each at least
/// [`MIN_PANE_HEIGHT`], summing to 1.0.
pub fn validate_pane_heights(heights: &[f64]) -> Option<[f64; 3]> {
    let [a, b, c] = heights else {
        return None;
    };
    let triple = [*a, *b, *c];
    if triple
        .iter()
        .any(|h| !h.is_finite() || *h < MIN_PANE_HEIGHT - f64::EPSILON)
    {
        return None;
    }
    let sum: f64 = triple.iter().sum();
    if (sum - 1.0).abs() > SUM_TOLERANCE {
        return None;
    }
    Some(triple)
}

/// TOML-file backed [`ConfigStore`].
#[derive(Debug, Clone)]
pub struct FileConfig {
    path: PathBuf,
}

impl FileConfig {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            path: paths::config_path(base_dir),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the config file, returning defaults if it does not exist.
    pub fn load(&self) -> Result<ConfigFile> {
        if !self.path.exists() {
            return Ok(ConfigFile::default());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config from {}", self.path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", self.path.display()))
    }

    fn save(&self, config: &ConfigFile) -> Result<()> {
        let content = toml::to_string(config).context("Failed to serialize config to TOML")?;
        write_atomic(&self.path, &content)
    }

    fn modify(&self, f: impl FnOnce(&mut ConfigFile)) -> Result<()> {
        let mut config = self.load()?;
        f(&mut config);
        self.save(&config)
    }
}

impl ConfigStore for FileConfig {
    fn get_focus(&self) -> Result<Option<String>> {
        Ok(self.load()?.focus.filter(|id| !id.is_empty()))
    }

    fn set_focus(&self, issue_id: Option<&str>) -> Result<()> {
        self.modify(|c| c.focus = issue_id.map(str::to_string))
    }

    fn get_pane_heights(&self) -> Result<Option<[f64; 3]>> {
        Ok(self
            .load()?
            .pane_heights
            .as_deref()
            .and_then(validate_pane_heights))
    }

    fn set_pane_heights(&self, heights: [f64; 3]) -> Result<()> {
        self.modify(|c| c.pane_heights = Some(heights.to_vec()))
    }
}

/// Writes `content` to `path` via a temp file and rename, creating parent
/// directories as needed.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, content)
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            tmp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config = FileConfig::new(dir.path());
        assert_eq!(config.get_focus().unwrap(), None);
        assert_eq!(config.get_pane_heights().unwrap(), None);
    }

    #[test]
    fn test_pane_heights_persist() {
        let dir = tempdir().unwrap();
        let config = FileConfig::new(dir.path());
        config.set_pane_heights([0.2, 0.5, 0.3]).unwrap();

        let reopened = FileConfig::new(dir.path());
        assert_eq!(
            reopened.get_pane_heights().unwrap(),
            Some([0.2, 0.5, 0.3])
        );
    }

    #[test]
    fn test_set_focus_preserves_pane_heights() {
        let dir = tempdir().unwrap();
        let config = FileConfig::new(dir.path());
        config.set_pane_heights([0.3, 0.4, 0.3]).unwrap();
        config.set_focus(Some("td-abc123")).unwrap();

        assert_eq!(config.get_focus().unwrap().as_deref(), Some("td-abc123"));
        assert!(config.get_pane_heights().unwrap().is_some());
    }

    #[test]
    fn test_invalid_pane_heights_are_ignored() {
        let dir = tempdir().unwrap();
        let config = FileConfig::new(dir.path());
        fs::create_dir_all(config.path().parent().unwrap()).unwrap();
        fs::write(config.path(), "pane_heights = [0.05, 0.5, 0.45]\n").unwrap();
        assert_eq!(config.get_pane_heights().unwrap(), None);

        fs::write(config.path(), "pane_heights = [0.5, 0.5]\n").unwrap();
        assert_eq!(config.get_pane_heights().unwrap(), None);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let config = FileConfig::new(dir.path());
        fs::create_dir_all(config.path().parent().unwrap()).unwrap();
        fs::write(config.path(), "pane_heights = [").unwrap();
        let err = config.get_focus().unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    #[test]
    fn test_validate_pane_heights_tolerates_rounding() {
        assert!(validate_pane_heights(&[0.333, 0.333, 0.334]).is_some());
        assert!(validate_pane_heights(&[0.1, 0.1, 0.8]).is_some());
        assert!(validate_pane_heights(&[0.4, 0.4, 0.4]).is_none());
    }
}
