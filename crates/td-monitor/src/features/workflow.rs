//! Workflow transitions: review, approve, close, reopen, delete.
//!
//! [`apply_workflow`] runs on a blocking thread against the database. Every
//! transition re-reads the issue, checks its precondition, writes the change,
//! logs an action and cascades the parent epic where that applies.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use td_core::Database;
use td_types::{ActionLog, ActionType, Issue, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowAction {
    Review,
    Approve,
    Close,
    Reopen,
    Delete,
}

impl WorkflowAction {
    pub fn label(self) -> &'static str {
        match self {
            WorkflowAction::Review => "review",
            WorkflowAction::Approve => "approve",
            WorkflowAction::Close => "close",
            WorkflowAction::Reopen => "reopen",
            WorkflowAction::Delete => "delete",
        }
    }

    /// Whether the transition may start from `issue` for `session_id`.
    pub fn allowed(self, issue: &Issue, session_id: &str) -> bool {
        match self {
            WorkflowAction::Review => {
                matches!(issue.status, Status::Open | Status::InProgress)
            }
            WorkflowAction::Approve => {
                issue.status == Status::InReview
                    && issue.implementer_session.as_deref() != Some(session_id)
            }
            WorkflowAction::Close => issue.status != Status::Closed,
            WorkflowAction::Reopen => issue.status == Status::Closed,
            WorkflowAction::Delete => true,
        }
    }
}

pub fn apply_workflow(
    db: &dyn Database,
    action: WorkflowAction,
    issue_id: &str,
    session_id: &str,
) -> Result<()> {
    let previous = db
        .get_issue(issue_id)
        .with_context(|| format!("Failed to load issue {issue_id}"))?
        .with_context(|| format!("Issue {issue_id} not found"))?;
    if !action.allowed(&previous, session_id) {
        bail!(
            "Cannot {} {issue_id} from status {}",
            action.label(),
            previous.status
        );
    }

    let now = Utc::now();
    let mut issue = previous.clone();
    issue.updated_at = now;
    let action_type = match action {
        WorkflowAction::Delete => {
            db.delete_issue(issue_id)
                .with_context(|| format!("Failed to delete {issue_id}"))?;
            db.log_action(
                ActionLog::new(session_id, ActionType::Delete, issue_id, now)
                    .with_snapshots(Some(&previous), None),
            )?;
            return Ok(());
        }
        WorkflowAction::Review => {
            issue.status = Status::InReview;
            if issue.implementer_session.is_none() {
                issue.implementer_session = Some(session_id.to_string());
            }
            ActionType::Review
        }
        WorkflowAction::Approve => {
            issue.status = Status::Closed;
            issue.reviewer_session = Some(session_id.to_string());
            issue.closed_at = Some(now);
            ActionType::Approve
        }
        WorkflowAction::Close => {
            issue.status = Status::Closed;
            issue.closed_at = Some(now);
            ActionType::Close
        }
        WorkflowAction::Reopen => {
            issue.status = Status::Open;
            issue.closed_at = None;
            ActionType::Reopen
        }
    };

    db.update_issue(&issue)
        .with_context(|| format!("Failed to update {issue_id}"))?;
    db.log_action(
        ActionLog::new(session_id, action_type, issue_id, now)
            .with_snapshots(Some(&previous), Some(&issue)),
    )?;
    if action != WorkflowAction::Reopen {
        let cascaded = db.cascade_up_parent_status(issue_id, issue.status, session_id)?;
        if cascaded {
            tracing::info!(target: "workflow", issue = issue_id, status = %issue.status, "parent_cascaded");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use td_core::{FileDb, ListOptions};

    use super::*;

    fn db_with(issues: Vec<Issue>) -> FileDb {
        let db = FileDb::in_memory();
        for issue in issues {
            db.create_issue(issue).unwrap();
        }
        db
    }

    fn issue(id: &str, status: Status) -> Issue {
        let mut issue = Issue::new(id, id, Utc::now());
        issue.status = status;
        issue
    }

    #[test]
    fn test_review_sets_status_and_logs() {
        let db = db_with(vec![issue("td-1", Status::InProgress)]);
        apply_workflow(&db, WorkflowAction::Review, "td-1", "sessA").unwrap();

        let updated = db.get_issue("td-1").unwrap().unwrap();
        assert_eq!(updated.status, Status::InReview);
        assert_eq!(updated.implementer_session.as_deref(), Some("sessA"));
        let actions = db.get_recent_actions_all(10).unwrap();
        assert_eq!(actions[0].action, ActionType::Review);
        assert_eq!(actions[0].entity_id, "td-1");
    }

    #[test]
    fn test_review_rejects_closed_issue() {
        let db = db_with(vec![issue("td-1", Status::Closed)]);
        assert!(apply_workflow(&db, WorkflowAction::Review, "td-1", "s").is_err());
        assert!(db.get_recent_actions_all(10).unwrap().is_empty());
    }

    #[test]
    fn test_self_approve_is_refused() {
        let mut i = issue("td-1", Status::InReview);
        i.implementer_session = Some("me".into());
        let db = db_with(vec![i]);
        assert!(apply_workflow(&db, WorkflowAction::Approve, "td-1", "me").is_err());

        apply_workflow(&db, WorkflowAction::Approve, "td-1", "other").unwrap();
        let closed = db.get_issue("td-1").unwrap().unwrap();
        assert_eq!(closed.status, Status::Closed);
        assert_eq!(closed.reviewer_session.as_deref(), Some("other"));
        assert!(closed.closed_at.is_some());
    }

    #[test]
    fn test_close_then_reopen() {
        let db = db_with(vec![issue("td-1", Status::Open)]);
        apply_workflow(&db, WorkflowAction::Close, "td-1", "s").unwrap();
        assert!(db.get_issue("td-1").unwrap().unwrap().closed_at.is_some());

        apply_workflow(&db, WorkflowAction::Reopen, "td-1", "s").unwrap();
        let reopened = db.get_issue("td-1").unwrap().unwrap();
        assert_eq!(reopened.status, Status::Open);
        assert!(reopened.closed_at.is_none());
    }

    #[test]
    fn test_close_cascades_to_epic() {
        let mut epic = issue("td-epic", Status::InProgress);
        epic.issue_type = td_types::IssueType::Epic;
        let mut child = issue("td-child", Status::InProgress);
        child.parent_id = Some("td-epic".into());
        let db = db_with(vec![epic, child]);

        apply_workflow(&db, WorkflowAction::Close, "td-child", "s").unwrap();
        let epic = db.get_issue("td-epic").unwrap().unwrap();
        assert_eq!(epic.status, Status::Closed);
    }

    #[test]
    fn test_delete_logs_previous_snapshot() {
        let db = db_with(vec![issue("td-1", Status::Open)]);
        apply_workflow(&db, WorkflowAction::Delete, "td-1", "s").unwrap();
        assert!(db.get_issue("td-1").unwrap().is_none());
        assert!(db.list_issues(&ListOptions::default()).unwrap().is_empty());
        let actions = db.get_recent_actions_all(1).unwrap();
        assert_eq!(actions[0].action, ActionType::Delete);
        assert!(actions[0].previous.as_deref().unwrap().contains("td-1"));
    }
}
