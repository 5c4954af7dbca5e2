//! Sample data so the monitor has something to show in a fresh project.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use td_core::db::DEPENDS_ON;
use td_core::{Database, FileDb, ListOptions, SessionStore, paths};
use td_types::{Handoff, Issue, IssueType, LogType, Priority, Status};

const OTHER_SESSION: &str = "ses_seed_reviewer";

pub fn run(base_dir: &Path) -> Result<()> {
    let db_path = paths::db_path(base_dir);
    let db = FileDb::open(&db_path)
        .with_context(|| format!("open database {}", db_path.display()))?;
    let session = SessionStore::get_or_create(base_dir).context("load session")?;

    let existing = db
        .list_issues(&ListOptions::default())
        .context("list issues")?
        .len();
    if existing > 0 {
        println!("{} already has {existing} issues; nothing seeded", db_path.display());
        return Ok(());
    }

    let created = seed(&db, &session.id)?;
    println!("Seeded {created} issues into {}", db_path.display());
    Ok(())
}

/// Creates a small project: one epic with children, work in every status,
/// a dependency chain, logs, a comment and a handoff. Returns the number of
/// issues created.
pub fn seed(db: &dyn Database, session_id: &str) -> Result<usize> {
    let now = Utc::now();
    let mut created = 0;
    let mut add = |f: &dyn Fn(&mut Issue)| -> Result<Issue> {
        let mut issue = Issue::new("", "", now);
        f(&mut issue);
        created += 1;
        db.create_issue(issue).context("create issue")
    };

    let epic = add(&|i| {
        i.title = "Monitor polish".into();
        i.issue_type = IssueType::Epic;
        i.priority = Priority::P1;
        i.description = "Rough edges found while dogfooding the monitor.".into();
    })?;
    let epic_id = epic.id.clone();

    let active = add(&|i| {
        i.title = "Keep cursor on the same issue across refreshes".into();
        i.issue_type = IssueType::Bug;
        i.status = Status::InProgress;
        i.parent_id = Some(epic_id.clone());
        i.implementer_session = Some(session_id.to_string());
        i.description = "Refreshing reorders rows and the cursor jumps.\n\n\
                         - remember the selected ID\n- restore it after the refresh"
            .into();
        i.acceptance = "Cursor stays on the selected issue after `R`.".into();
        i.points = 3;
    })?;
    let foundation = add(&|i| {
        i.title = "Persist pane heights".into();
        i.parent_id = Some(epic_id.clone());
        i.labels = vec!["ui".into()];
    })?;
    let dependent = add(&|i| {
        i.title = "Restore pane heights on start".into();
        i.parent_id = Some(epic_id.clone());
        i.labels = vec!["ui".into()];
    })?;
    db.add_dependency(&dependent.id, &foundation.id, DEPENDS_ON)
        .context("add dependency")?;

    let review = add(&|i| {
        i.title = "Markdown tables in the issue modal".into();
        i.issue_type = IssueType::Feature;
        i.status = Status::InReview;
        i.implementer_session = Some(OTHER_SESSION.to_string());
        i.description = "| column | meaning |\n|---|---|\n| id | issue ID |\n| rank | search rank |".into();
    })?;
    add(&|i| {
        i.title = "Terminal left in raw mode after a panic".into();
        i.issue_type = IssueType::Bug;
        i.status = Status::Blocked;
        i.priority = Priority::P0;
    })?;
    add(&|i| {
        i.title = "Bump ratatui".into();
        i.issue_type = IssueType::Chore;
        i.status = Status::Closed;
        i.closed_at = Some(now);
        i.minor = true;
    })?;

    db.add_log(&active.id, session_id, LogType::Progress, "Reproduced with a sorted task list")
        .context("add log")?;
    db.add_log(&active.id, session_id, LogType::Decision, "Track the selection by ID, not row")
        .context("add log")?;
    db.add_log(&review.id, OTHER_SESSION, LogType::Result, "Tables render through comfy-table")
        .context("add log")?;
    db.add_comment(&review.id, session_id, "Looks good, checking narrow widths next")
        .context("add comment")?;
    db.add_handoff(Handoff {
        id: 0,
        issue_id: review.id.clone(),
        session_id: OTHER_SESSION.to_string(),
        done: vec!["Table rendering".into()],
        remaining: vec!["Wide tables wrap badly".into()],
        decisions: vec!["Reuse comfy-table presets".into()],
        uncertain: Vec::new(),
        timestamp: now,
    })
    .context("add handoff")?;

    tracing::info!(created, "seeded");
    Ok(created)
}
