use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use td_core::{FileConfig, FileDb, SessionStore, paths};
use td_monitor::{Monitor, MonitorOptions};

/// Runs the monitor against the project at `base_dir`.
///
/// Needs an entered tokio runtime.
pub fn run(base_dir: &Path, options: MonitorOptions) -> Result<()> {
    let db_path = paths::db_path(base_dir);
    let db = FileDb::open(&db_path)
        .with_context(|| format!("open database {}", db_path.display()))?;
    let session = SessionStore::get_or_create(base_dir).context("load session")?;
    tracing::info!(session = %session.id, interval = ?options.refresh_interval, "monitor_starting");

    let mut monitor = Monitor::new(
        Arc::new(db),
        Arc::new(FileConfig::new(base_dir)),
        session.id,
        base_dir.to_path_buf(),
        options,
    );
    monitor.run()
}
