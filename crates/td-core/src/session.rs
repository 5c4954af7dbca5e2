//! Current session identity.
//!
//! A session is the identity an operator or agent works under. The monitor
//! only reads it to decide which in-review issues the current session may
//! review.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::write_atomic;
use crate::paths;

/// Environment variable that overrides the stored session ID.
pub const SESSION_ENV: &str = "TD_SESSION";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub started_at: DateTime<Utc>,
}

impl Session {
    fn generate(now: DateTime<Utc>) -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self {
            id: format!("ses_{}", &hex[..6]),
            started_at: now,
        }
    }
}

/// Loads or creates the session stored at `<base>/.todos/session.toml`.
pub struct SessionStore;

impl SessionStore {
    /// Returns the current session, honoring `TD_SESSION`.
    pub fn get_or_create(base_dir: &Path) -> Result<Session> {
        let env_id = std::env::var(SESSION_ENV).ok();
        Self::get_or_create_with(base_dir, env_id.as_deref())
    }

    /// Like [`SessionStore::get_or_create`] but with an explicit override.
    pub fn get_or_create_with(base_dir: &Path, override_id: Option<&str>) -> Result<Session> {
        let path = paths::session_path(base_dir);
        let mut session = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read session from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse session from {}", path.display()))?
        } else {
            let session = Session::generate(Utc::now());
            let content =
                toml::to_string(&session).context("Failed to serialize session to TOML")?;
            write_atomic(&path, &content)?;
            tracing::info!(target: "session", id = %session.id, "session_created");
            session
        };

        if let Some(id) = override_id.map(str::trim).filter(|id| !id.is_empty()) {
            session.id = id.to_string();
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_creates_and_reuses_session() {
        let dir = tempdir().unwrap();
        let first = SessionStore::get_or_create_with(dir.path(), None).unwrap();
        assert!(first.id.starts_with("ses_"));
        assert_eq!(first.id.len(), 10);

        let second = SessionStore::get_or_create_with(dir.path(), None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_override_wins() {
        let dir = tempdir().unwrap();
        let session = SessionStore::get_or_create_with(dir.path(), Some("sessX")).unwrap();
        assert_eq!(session.id, "sessX");
    }
}
