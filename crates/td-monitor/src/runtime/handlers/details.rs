//! Issue modal data and markdown rendering.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use td_core::{Database, ListOptions};
use td_types::Issue;

use super::{blocking, error_text};
use crate::events::UiEvent;
use crate::markdown::render_markdown;
use crate::snapshot::IssueDetails;

/// Progress logs shown in the modal.
pub const DETAIL_LOG_LIMIT: usize = 20;

pub async fn fetch_issue_details(db: Arc<dyn Database>, issue_id: String) -> UiEvent {
    let id = issue_id.clone();
    let result = blocking(move || load_details(db.as_ref(), &id)).await;
    UiEvent::IssueDetails {
        issue_id,
        result: result.map(Box::new).map_err(|e| error_text(&e)),
    }
}

/// Only the issue itself is required; related data that fails to load is
/// left empty.
fn load_details(db: &dyn Database, issue_id: &str) -> Result<IssueDetails> {
    let issue = db
        .get_issue(issue_id)
        .with_context(|| format!("Failed to load issue {issue_id}"))?
        .ok_or_else(|| anyhow!("Issue {issue_id} not found"))?;

    let handoff = optional(issue_id, "handoff", db.get_latest_handoff(issue_id)).flatten();
    let logs = optional(issue_id, "logs", db.get_logs(issue_id, DETAIL_LOG_LIMIT)).unwrap_or_default();
    let comments = optional(issue_id, "comments", db.get_comments(issue_id)).unwrap_or_default();
    let blocked_by = optional(issue_id, "dependencies", db.get_dependencies(issue_id))
        .map(|ids| resolve(db, &ids))
        .unwrap_or_default();
    let blocks = optional(issue_id, "dependents", db.get_blocked_by(issue_id))
        .map(|ids| resolve(db, &ids))
        .unwrap_or_default();
    let parent_epic = issue
        .parent_id
        .as_deref()
        .and_then(|parent| optional(issue_id, "parent", db.get_issue(parent)).flatten())
        .filter(Issue::is_epic);
    let epic_tasks = if issue.is_epic() {
        let opts = ListOptions {
            epic_id: Some(issue.id.clone()),
            ..ListOptions::default()
        };
        optional(issue_id, "epic_tasks", db.list_issues(&opts)).unwrap_or_default()
    } else {
        Vec::new()
    };

    Ok(IssueDetails {
        issue: Some(issue),
        handoff,
        logs,
        comments,
        blocked_by,
        blocks,
        epic_tasks,
        parent_epic,
    })
}

fn optional<T>(issue_id: &str, what: &str, result: Result<T>) -> Option<T> {
    result
        .map_err(|error| tracing::debug!(issue_id, what, error = %error, "detail_section_unavailable"))
        .ok()
}

/// Looks up IDs, skipping ones that no longer resolve.
fn resolve(db: &dyn Database, ids: &[String]) -> Vec<Issue> {
    ids.iter()
        .filter_map(|id| db.get_issue(id).ok().flatten())
        .collect()
}

pub async fn render_issue_markdown(
    issue_id: String,
    description: String,
    acceptance: String,
    width: u16,
) -> UiEvent {
    let rendered = tokio::task::spawn_blocking(move || {
        let w = usize::from(width);
        (render_markdown(&description, w), render_markdown(&acceptance, w))
    })
    .await;
    match rendered {
        Ok((description, acceptance)) => UiEvent::MarkdownRendered {
            issue_id,
            width,
            description,
            acceptance,
        },
        Err(error) => {
            tracing::warn!(%issue_id, error = %error, "markdown_render_failed");
            UiEvent::MarkdownRendered {
                issue_id,
                width,
                description: Vec::new(),
                acceptance: Vec::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use td_core::FileDb;
    use td_core::db::DEPENDS_ON;
    use td_types::{IssueType, LogType};

    use super::*;

    fn add(db: &FileDb, id: &str, f: impl FnOnce(&mut Issue)) {
        let mut issue = Issue::new(id, format!("title {id}"), Utc::now());
        f(&mut issue);
        db.create_issue(issue).unwrap();
    }

    #[test]
    fn test_details_collect_related_data() {
        let db = FileDb::in_memory();
        add(&db, "td-epic", |i| i.issue_type = IssueType::Epic);
        add(&db, "td-a", |i| i.parent_id = Some("td-epic".into()));
        add(&db, "td-b", |i| i.parent_id = Some("td-epic".into()));
        db.add_dependency("td-b", "td-a", DEPENDS_ON).unwrap();
        for n in 0..25 {
            db.add_log("td-a", "sessX", LogType::Progress, &format!("step {n}"))
                .unwrap();
        }

        let a = load_details(&db, "td-a").unwrap();
        assert_eq!(a.parent_epic.as_ref().map(|p| p.id.as_str()), Some("td-epic"));
        assert_eq!(a.logs.len(), DETAIL_LOG_LIMIT);
        assert_eq!(a.blocks.len(), 1);
        assert!(a.blocked_by.is_empty());
        assert!(a.epic_tasks.is_empty());

        let b = load_details(&db, "td-b").unwrap();
        assert_eq!(b.blocked_by[0].id, "td-a");

        let epic = load_details(&db, "td-epic").unwrap();
        assert_eq!(epic.epic_tasks.len(), 2);
        assert!(epic.parent_epic.is_none());
    }

    #[test]
    fn test_parent_that_is_not_an_epic_is_ignored() {
        let db = FileDb::in_memory();
        add(&db, "td-task", |_| {});
        add(&db, "td-child", |i| i.parent_id = Some("td-task".into()));
        assert!(load_details(&db, "td-child").unwrap().parent_epic.is_none());
    }

    #[tokio::test]
    async fn test_missing_issue_is_an_error() {
        let db: Arc<dyn Database> = Arc::new(FileDb::in_memory());
        let UiEvent::IssueDetails { issue_id, result } =
            fetch_issue_details(db, "td-gone".into()).await
        else {
            panic!("expected details");
        };
        assert_eq!(issue_id, "td-gone");
        assert!(result.unwrap_err().contains("not found"));
    }

    #[tokio::test]
    async fn test_markdown_rendered_at_width() {
        let event = render_issue_markdown("td-1".into(), "# Title\n\nbody".into(), String::new(), 30).await;
        let UiEvent::MarkdownRendered {
            width, description, ..
        } = event
        else {
            panic!("expected markdown");
        };
        assert_eq!(width, 30);
        assert!(!description.is_empty());
        assert!(description.iter().all(|l| l.width() <= 30));
    }
}
