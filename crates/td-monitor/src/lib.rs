//! Interactive terminal monitor for a td project.
//!
//! The monitor follows an Elm-style split:
//! - `update` is the only code that mutates [`state::AppState`]
//! - `render` draws a frozen state
//! - `runtime` executes the [`effects::UiEffect`]s the reducer returns and
//!   posts their results back as [`events::UiEvent`]s
//!
//! [`Monitor`] is the public entry point.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod keymap;
pub mod markdown;
pub mod overlays;
pub mod render;
pub mod runtime;
pub mod snapshot;
pub mod state;
pub mod terminal;
pub mod update;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use td_core::config::DEFAULT_PANE_HEIGHTS;
use td_core::{ConfigStore, Database, FileConfig, FileDb, SessionStore, paths};

use crate::events::UiEvent;
use crate::runtime::inbox::UiEventSender;
use crate::runtime::{MonitorRuntime, Services};
pub use crate::state::MonitorOptions;
use crate::state::{AppState, TuiState};

/// A monitor bound to one project directory.
pub struct Monitor {
    runtime: MonitorRuntime,
}

impl Monitor {
    /// Builds a monitor over already opened collaborators.
    ///
    /// Saved pane heights are restored; an unreadable config falls back to
    /// the default split.
    pub fn new(
        db: Arc<dyn Database>,
        config: Arc<dyn ConfigStore>,
        session_id: impl Into<String>,
        base_dir: PathBuf,
        options: MonitorOptions,
    ) -> Self {
        let pane_heights = match config.get_pane_heights() {
            Ok(heights) => heights.unwrap_or(DEFAULT_PANE_HEIGHTS),
            Err(error) => {
                tracing::warn!(error = %format!("{error:#}"), "pane_heights_unreadable");
                DEFAULT_PANE_HEIGHTS
            }
        };
        let tui = TuiState::new(session_id, base_dir, options, pane_heights);
        Self {
            runtime: MonitorRuntime::new(AppState::new(tui), Services { db, config }),
        }
    }

    /// Opens the project's database, config and session itself.
    ///
    /// Embedded monitors draw no footer and must be released with
    /// [`Monitor::close`].
    ///
    /// # Errors
    /// Returns an error if the database or session cannot be opened.
    pub fn embedded(base_dir: &Path, options: MonitorOptions) -> Result<Self> {
        let db_path = paths::db_path(base_dir);
        let db = FileDb::open(&db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;
        let session = SessionStore::get_or_create(base_dir).context("Failed to load session")?;
        let options = MonitorOptions {
            embedded: true,
            ..options
        };
        tracing::info!(session = %session.id, base = %base_dir.display(), "embedded_monitor_opened");
        Ok(Self::new(
            Arc::new(db),
            Arc::new(FileConfig::new(base_dir)),
            session.id,
            base_dir.to_path_buf(),
            options,
        ))
    }

    /// Runs until the user quits.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up or drawn to.
    pub fn run(&mut self) -> Result<()> {
        self.runtime.run()
    }

    /// Handle for posting notifications from other tasks.
    pub fn handle(&self) -> MonitorHandle {
        MonitorHandle {
            tx: self.runtime.inbox(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.runtime.state
    }

    /// Stops the refresh ticker and releases the database.
    pub fn close(self) {
        self.runtime.stop();
        tracing::debug!("monitor_closed");
    }
}

/// Cheap cloneable sender into a running monitor.
#[derive(Clone)]
pub struct MonitorHandle {
    tx: UiEventSender,
}

impl MonitorHandle {
    /// Shows an update notice in the footer.
    ///
    /// Returns `false` once the monitor has gone away.
    pub fn notify_update_available(&self, version: impl Into<String>) -> bool {
        self.tx
            .send(UiEvent::UpdateAvailable {
                version: version.into(),
            })
            .is_ok()
    }
}
