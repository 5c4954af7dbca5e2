use chrono::{DateTime, Utc};
use td_core::db::DEPENDS_ON;
use td_core::{ConfigStore, Database, FileConfig, FileDb, ListOptions, SessionStore, paths};
use td_types::{Handoff, Issue, IssueType, LogType, Status};
use tempfile::tempdir;

#[test]
fn test_project_state_survives_reopen() {
    let dir = tempdir().unwrap();
    let base = dir.path();
    let session = SessionStore::get_or_create_with(base, None).unwrap();

    {
        let db = FileDb::open(&paths::db_path(base)).unwrap();
        let mut epic = Issue::new("", "Parser rewrite", Utc::now());
        epic.issue_type = IssueType::Epic;
        let epic = db.create_issue(epic).unwrap();

        let mut child = Issue::new("", "Tokenizer", Utc::now());
        child.parent_id = Some(epic.id.clone());
        let child = db.create_issue(child).unwrap();
        let follow = db
            .create_issue(Issue::new("", "Error recovery", Utc::now()))
            .unwrap();
        db.add_dependency(&follow.id, &child.id, DEPENDS_ON).unwrap();
        db.add_log(&child.id, &session.id, LogType::Progress, "lexer done")
            .unwrap();
        db.add_handoff(Handoff {
            id: 0,
            issue_id: child.id.clone(),
            session_id: session.id.clone(),
            done: vec!["lexer".into()],
            remaining: Vec::new(),
            decisions: Vec::new(),
            uncertain: Vec::new(),
            timestamp: Utc::now(),
        })
        .unwrap();

        let config = FileConfig::new(base);
        config.set_focus(Some(&child.id)).unwrap();
        config.set_pane_heights([0.2, 0.5, 0.3]).unwrap();
    }

    let db = FileDb::open(&paths::db_path(base)).unwrap();
    let all = db.list_issues(&ListOptions::default()).unwrap();
    assert_eq!(all.len(), 3);

    let focus = FileConfig::new(base).get_focus().unwrap().unwrap();
    let focused = db.get_issue(&focus).unwrap().unwrap();
    assert_eq!(focused.title, "Tokenizer");
    assert_eq!(db.get_logs(&focus, 10).unwrap().len(), 1);
    assert_eq!(db.get_blocked_by(&focus).unwrap().len(), 1);
    assert!(db.get_latest_handoff(&focus).unwrap().is_some());
    assert_eq!(
        db.get_recent_handoffs(10, DateTime::<Utc>::MIN_UTC).unwrap().len(),
        1
    );

    assert_eq!(
        FileConfig::new(base).get_pane_heights().unwrap(),
        Some([0.2, 0.5, 0.3])
    );
    assert_eq!(
        SessionStore::get_or_create_with(base, None).unwrap().id,
        session.id
    );
}

#[test]
fn test_ranked_search_with_filters() {
    let db = FileDb::in_memory();
    for (title, status) in [
        ("Fix login redirect", Status::Open),
        ("Login page copy", Status::Closed),
        ("Cache warmup", Status::Open),
    ] {
        let mut issue = Issue::new("", title, Utc::now());
        issue.status = status;
        db.create_issue(issue).unwrap();
    }

    let open = ListOptions::with_statuses([Status::Open]);
    let hits = db.search_issues_ranked("login", &open).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].issue.title, "Fix login redirect");

    let everything = db
        .search_issues_ranked("status=closed", &ListOptions::default())
        .unwrap();
    assert_eq!(everything.len(), 1);
    assert_eq!(everything[0].issue.title, "Login page copy");
}
