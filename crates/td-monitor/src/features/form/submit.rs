//! Persists a validated form.

use anyhow::{Context, Result};
use chrono::Utc;
use td_core::Database;
use td_core::db::DEPENDS_ON;
use td_types::{ActionLog, ActionType};

use super::FormSubmission;

/// Creates or updates the issue and logs the action. Returns the issue ID.
///
/// Runs on a blocking thread.
pub fn submit_form(db: &dyn Database, session_id: &str, submission: &FormSubmission) -> Result<String> {
    let now = Utc::now();
    match &submission.previous {
        None => {
            let created = db
                .create_issue(submission.issue.clone())
                .context("Failed to create issue")?;
            for dep in &submission.dependencies {
                db.add_dependency(&created.id, dep, DEPENDS_ON)
                    .with_context(|| format!("Failed to add dependency on {dep}"))?;
            }
            db.log_action(
                ActionLog::new(session_id, ActionType::Create, &created.id, now)
                    .with_snapshots(None, Some(&created)),
            )?;
            tracing::info!(target: "form", issue = %created.id, deps = submission.dependencies.len(), "issue_created");
            Ok(created.id)
        }
        Some(original) => {
            let id = &submission.issue.id;
            // Snapshot what is stored now, which may be newer than what the form loaded.
            let previous = db
                .get_issue(id)
                .with_context(|| format!("Failed to load issue {id}"))?
                .unwrap_or_else(|| original.clone());
            db.update_issue(&submission.issue)
                .with_context(|| format!("Failed to update {id}"))?;
            db.log_action(
                ActionLog::new(session_id, ActionType::Update, id, now)
                    .with_snapshots(Some(&previous), Some(&submission.issue)),
            )?;
            tracing::info!(target: "form", issue = %id, "issue_updated");
            Ok(id.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use td_core::FileDb;
    use td_types::{Issue, Status};

    use super::*;

    #[test]
    fn test_create_adds_dependencies_and_logs() {
        let db = FileDb::in_memory();
        db.create_issue(Issue::new("td-dep", "dep", Utc::now())).unwrap();

        let submission = FormSubmission {
            issue: Issue::new("", "Brand new", Utc::now()),
            dependencies: vec!["td-dep".into()],
            previous: None,
        };
        let id = submit_form(&db, "sessA", &submission).unwrap();

        assert!(!id.is_empty());
        assert_eq!(db.get_issue(&id).unwrap().unwrap().title, "Brand new");
        assert_eq!(db.get_dependencies(&id).unwrap(), vec!["td-dep"]);
        let actions = db.get_recent_actions_all(1).unwrap();
        assert_eq!(actions[0].action, ActionType::Create);
        assert_eq!(actions[0].entity_id, id);
        assert!(actions[0].previous.is_none());
    }

    #[test]
    fn test_create_with_unknown_dependency_fails() {
        let db = FileDb::in_memory();
        let submission = FormSubmission {
            issue: Issue::new("", "x", Utc::now()),
            dependencies: vec!["td-missing".into()],
            previous: None,
        };
        let err = submit_form(&db, "s", &submission).unwrap_err();
        assert!(format!("{err:#}").contains("td-missing"));
    }

    #[test]
    fn test_edit_logs_previous_snapshot() {
        let db = FileDb::in_memory();
        let original = db
            .create_issue(Issue::new("td-1", "Old title", Utc::now()))
            .unwrap();
        let mut edited = original.clone();
        edited.title = "New title".into();
        edited.status = Status::InProgress;

        let submission = FormSubmission {
            issue: edited,
            dependencies: Vec::new(),
            previous: Some(original),
        };
        assert_eq!(submit_form(&db, "s", &submission).unwrap(), "td-1");

        let stored = db.get_issue("td-1").unwrap().unwrap();
        assert_eq!(stored.title, "New title");
        let action = &db.get_recent_actions_all(1).unwrap()[0];
        assert_eq!(action.action, ActionType::Update);
        assert!(action.previous.as_deref().unwrap().contains("Old title"));
        assert!(action.new.as_deref().unwrap().contains("New title"));
    }
}
