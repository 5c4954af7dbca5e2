//! Database writes: workflow transitions and form submission.

use std::sync::Arc;

use td_core::Database;

use super::{blocking, error_text};
use crate::events::UiEvent;
use crate::features::form::FormSubmission;
use crate::features::form::submit::submit_form;
use crate::features::workflow::{WorkflowAction, apply_workflow};

pub async fn run_workflow(
    db: Arc<dyn Database>,
    action: WorkflowAction,
    issue_id: String,
    session_id: String,
) -> UiEvent {
    let id = issue_id.clone();
    let result = blocking(move || apply_workflow(db.as_ref(), action, &id, &session_id)).await;
    match &result {
        Ok(()) => tracing::info!(action = action.label(), %issue_id, "workflow_applied"),
        Err(error) => tracing::debug!(action = action.label(), %issue_id, error = %error, "workflow_rejected"),
    }
    UiEvent::WorkflowFinished {
        action,
        issue_id,
        result: result.map_err(|e| error_text(&e)),
    }
}

pub async fn submit_issue_form(
    db: Arc<dyn Database>,
    session_id: String,
    submission: Box<FormSubmission>,
) -> UiEvent {
    let editing = submission.previous.is_some();
    let result = blocking(move || submit_form(db.as_ref(), &session_id, &submission)).await;
    if let Err(error) = &result {
        tracing::warn!(editing, error = %error, "form_submit_failed");
    }
    UiEvent::FormSubmitted {
        editing,
        result: result.map_err(|e| error_text(&e)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use td_core::FileDb;
    use td_types::{Issue, Status};

    use super::*;

    #[tokio::test]
    async fn test_workflow_result_reaches_event() {
        let db: Arc<dyn Database> = Arc::new(FileDb::in_memory());
        db.create_issue(Issue::new("td-1", "one", Utc::now())).unwrap();

        let event = run_workflow(Arc::clone(&db), WorkflowAction::Review, "td-1".into(), "sessY".into()).await;
        assert!(matches!(event, UiEvent::WorkflowFinished { result: Ok(()), .. }));
        assert_eq!(db.get_issue("td-1").unwrap().unwrap().status, Status::InReview);

        let event = run_workflow(db, WorkflowAction::Reopen, "td-1".into(), "sessY".into()).await;
        assert!(matches!(event, UiEvent::WorkflowFinished { result: Err(_), .. }));
    }

    #[tokio::test]
    async fn test_submit_create_reports_new_id() {
        let db: Arc<dyn Database> = Arc::new(FileDb::in_memory());
        let submission = FormSubmission {
            issue: Issue::new("", "Fresh", Utc::now()),
            dependencies: Vec::new(),
            previous: None,
        };
        let UiEvent::FormSubmitted { editing, result } =
            submit_issue_form(Arc::clone(&db), "sessY".into(), Box::new(submission)).await
        else {
            panic!("expected form result");
        };
        assert!(!editing);
        let id = result.unwrap();
        assert!(id.starts_with("td-"));
        assert_eq!(db.get_issue(&id).unwrap().unwrap().title, "Fresh");
    }
}
