//! Panel refresh, stats and handoff listing.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use td_core::{ConfigStore, Database, ListOptions};
use td_types::{Issue, Status};

use super::{blocking, error_text};
use crate::effects::FetchRequest;
use crate::events::UiEvent;
use crate::snapshot::{ActivityItem, RecentHandoff, RefreshData, TaskListData};

/// Rows kept in the activity feed.
pub const ACTIVITY_LIMIT: usize = 50;
/// Handoffs listed by the handoffs overlay.
pub const HANDOFFS_LIMIT: usize = 50;
/// Handoffs counted in the footer.
const RECENT_HANDOFFS_LIMIT: usize = 20;
/// A session counts as active if it wrote anything this recently.
const ACTIVE_WINDOW_MINUTES: i64 = 5;

/// Reads everything the panels show, fanning the reads out concurrently.
///
/// Current work and the task list are primary: their failure fails the
/// refresh. Activity, handoffs and sessions degrade to empty.
pub async fn fetch_data(
    db: Arc<dyn Database>,
    config: Arc<dyn ConfigStore>,
    request: FetchRequest,
) -> UiEvent {
    let seq = request.seq;
    let started = Instant::now();

    let current = {
        let db = Arc::clone(&db);
        blocking(move || load_current_work(db.as_ref(), config.as_ref()))
    };
    let activity = {
        let db = Arc::clone(&db);
        blocking(move || load_activity(db.as_ref()))
    };
    let tasks = {
        let db = Arc::clone(&db);
        let request = request.clone();
        blocking(move || load_task_list(db.as_ref(), &request))
    };
    let footer = {
        let db = Arc::clone(&db);
        let since = request.handoffs_since;
        blocking(move || load_footer(db.as_ref(), since))
    };

    let (current, activity, tasks, footer) = tokio::join!(current, activity, tasks, footer);

    let result = assemble(current, activity, tasks, footer);

    tracing::debug!(
        seq,
        ok = result.is_ok(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "refresh_finished"
    );
    UiEvent::RefreshData {
        seq,
        result: result.map(Box::new).map_err(|e| error_text(&e)),
    }
}

type CurrentWork = (Option<Issue>, Vec<Issue>);
type FooterData = (Vec<RecentHandoff>, Vec<String>);

fn assemble(
    current: Result<CurrentWork>,
    activity: Result<Vec<ActivityItem>>,
    tasks: Result<TaskListData>,
    footer: Result<FooterData>,
) -> Result<RefreshData> {
    let (focused, in_progress) = current?;
    let task_list = tasks?;
    let activity = activity.unwrap_or_else(|error| {
        tracing::debug!(error = %error, "activity_unavailable");
        Vec::new()
    });
    let (recent_handoffs, active_sessions) = footer.unwrap_or_else(|error| {
        tracing::debug!(error = %error, "footer_data_unavailable");
        (Vec::new(), Vec::new())
    });
    Ok(RefreshData {
        focused,
        in_progress,
        activity,
        task_list,
        recent_handoffs,
        active_sessions,
    })
}

fn load_current_work(
    db: &dyn Database,
    config: &dyn ConfigStore,
) -> Result<CurrentWork> {
    let focused = match config.get_focus() {
        Ok(Some(id)) => db.get_issue(&id).unwrap_or_else(|error| {
            tracing::debug!(issue_id = %id, error = %error, "focused_issue_unavailable");
            None
        }),
        Ok(None) => None,
        Err(error) => {
            tracing::debug!(error = %error, "focus_unavailable");
            None
        }
    };
    let in_progress = db
        .list_issues(&ListOptions::with_statuses([Status::InProgress]))
        .context("Failed to list in-progress issues")?;
    Ok((focused, in_progress))
}

/// Logs, actions and comments merged newest first.
fn load_activity(db: &dyn Database) -> Result<Vec<ActivityItem>> {
    let mut items: Vec<ActivityItem> = Vec::new();
    items.extend(
        db.get_recent_logs_all(ACTIVITY_LIMIT)
            .context("Failed to read logs")?
            .iter()
            .map(ActivityItem::from_log),
    );
    items.extend(
        db.get_recent_actions_all(ACTIVITY_LIMIT)
            .context("Failed to read actions")?
            .iter()
            .map(ActivityItem::from_action),
    );
    items.extend(
        db.get_recent_comments_all(ACTIVITY_LIMIT)
            .context("Failed to read comments")?
            .iter()
            .map(ActivityItem::from_comment),
    );
    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.key.cmp(&b.key)));
    items.truncate(ACTIVITY_LIMIT);
    Ok(items)
}

/// Issues with `statuses`, through ranked search when a query is set.
fn list(db: &dyn Database, request: &FetchRequest, mut opts: ListOptions) -> Result<Vec<Issue>> {
    if request.query.trim().is_empty() {
        let (field, desc) = request.sort.order();
        opts.sort_by = Some(field);
        opts.sort_desc = desc;
        return db.list_issues(&opts);
    }
    Ok(db
        .search_issues_ranked(&request.query, &opts)?
        .into_iter()
        .map(|hit| hit.issue)
        .collect())
}

fn load_task_list(db: &dyn Database, request: &FetchRequest) -> Result<TaskListData> {
    // Open and explicitly blocked issues come from one listing so both
    // categories keep the sort (or rank) order of a single result.
    let candidates = list(
        db,
        request,
        ListOptions::with_statuses([Status::Open, Status::Blocked]),
    )
    .context("Failed to list open issues")?;

    let mut ready = Vec::new();
    let mut blocked = Vec::new();
    for issue in candidates {
        if issue.status == Status::Blocked || has_open_dependency(db, &issue.id)? {
            blocked.push(issue);
        } else {
            ready.push(issue);
        }
    }

    let reviewable = list(
        db,
        request,
        ListOptions {
            reviewable_by: Some(request.session_id.clone()),
            ..ListOptions::with_statuses([Status::InReview])
        },
    )
    .context("Failed to list reviewable issues")?;

    let closed = if request.include_closed {
        list(db, request, ListOptions::with_statuses([Status::Closed]))
            .context("Failed to list closed issues")?
    } else {
        Vec::new()
    };

    Ok(TaskListData {
        reviewable,
        ready,
        blocked,
        closed,
    })
}

/// Whether any dependency of `id` exists and is not closed.
fn has_open_dependency(db: &dyn Database, id: &str) -> Result<bool> {
    for dep in db
        .get_dependencies(id)
        .with_context(|| format!("Failed to read dependencies of {id}"))?
    {
        if db
            .get_issue(&dep)?
            .is_some_and(|issue| issue.status != Status::Closed)
        {
            return Ok(true);
        }
    }
    Ok(false)
}

fn load_footer(
    db: &dyn Database,
    handoffs_since: DateTime<Utc>,
) -> Result<FooterData> {
    let handoffs = db
        .get_recent_handoffs(RECENT_HANDOFFS_LIMIT, handoffs_since)
        .context("Failed to read recent handoffs")?
        .into_iter()
        .map(|h| RecentHandoff {
            issue_id: h.issue_id,
            session_id: h.session_id,
            timestamp: h.timestamp,
        })
        .collect();
    let sessions = db
        .get_active_sessions(Utc::now() - Duration::minutes(ACTIVE_WINDOW_MINUTES))
        .context("Failed to read active sessions")?;
    Ok((handoffs, sessions))
}

pub async fn fetch_stats(db: Arc<dyn Database>) -> UiEvent {
    let result = blocking(move || db.get_extended_stats().context("Failed to load stats")).await;
    UiEvent::StatsData(result.map_err(|e| error_text(&e)))
}

pub async fn fetch_handoffs(db: Arc<dyn Database>) -> UiEvent {
    let result = blocking(move || {
        db.get_recent_handoffs(HANDOFFS_LIMIT, DateTime::<Utc>::MIN_UTC)
            .context("Failed to load handoffs")
    })
    .await;
    UiEvent::HandoffsData(result.map_err(|e| error_text(&e)))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use td_core::db::DEPENDS_ON;
    use td_core::{FileConfig, FileDb};
    use td_types::{Handoff, LogType, Priority};
    use tempfile::tempdir;

    use super::*;
    use crate::features::search::SortMode;

    fn request(session: &str) -> FetchRequest {
        FetchRequest {
            seq: 7,
            query: String::new(),
            sort: SortMode::Priority,
            include_closed: false,
            session_id: session.into(),
            handoffs_since: DateTime::<Utc>::MIN_UTC,
        }
    }

    fn add(db: &FileDb, id: &str, status: Status) -> Issue {
        let mut issue = Issue::new(id, format!("title {id}"), Utc::now());
        issue.status = status;
        db.create_issue(issue).unwrap()
    }

    fn services(dir: &Path) -> (Arc<FileDb>, Arc<FileConfig>) {
        (Arc::new(FileDb::in_memory()), Arc::new(FileConfig::new(dir)))
    }

    #[test]
    fn test_task_list_categories() {
        let db = FileDb::in_memory();
        add(&db, "td-ready", Status::Open);
        add(&db, "td-dep", Status::InProgress);
        add(&db, "td-waits", Status::Open);
        db.add_dependency("td-waits", "td-dep", DEPENDS_ON).unwrap();
        add(&db, "td-done", Status::Closed);
        add(&db, "td-free", Status::Open);
        db.add_dependency("td-free", "td-done", DEPENDS_ON).unwrap();
        add(&db, "td-stuck", Status::Blocked);
        let mut mine = Issue::new("td-mine", "mine", Utc::now());
        mine.status = Status::InReview;
        mine.implementer_session = Some("sessY".into());
        db.create_issue(mine).unwrap();
        let mut theirs = Issue::new("td-theirs", "theirs", Utc::now());
        theirs.status = Status::InReview;
        theirs.implementer_session = Some("sessX".into());
        db.create_issue(theirs).unwrap();

        let data = load_task_list(&db, &request("sessY")).unwrap();
        let ids = |v: &[Issue]| v.iter().map(|i| i.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&data.reviewable), ["td-theirs"]);
        let mut ready = ids(&data.ready);
        ready.sort();
        assert_eq!(ready, ["td-free", "td-ready"]);
        assert_eq!(ids(&data.blocked), ["td-stuck", "td-waits"]);
        assert!(data.closed.is_empty());

        let mut with_closed = request("sessY");
        with_closed.include_closed = true;
        let data = load_task_list(&db, &with_closed).unwrap();
        assert_eq!(ids(&data.closed), ["td-done"]);
    }

    #[test]
    fn test_blocked_category_follows_sort_mode() {
        let db = FileDb::in_memory();
        add(&db, "td-blocker", Status::InProgress);
        let mut waits = Issue::new("td-waits", "waits", Utc::now());
        waits.priority = Priority::P3;
        db.create_issue(waits).unwrap();
        db.add_dependency("td-waits", "td-blocker", DEPENDS_ON).unwrap();
        let mut stuck = Issue::new("td-stuck", "stuck", Utc::now());
        stuck.status = Status::Blocked;
        stuck.priority = Priority::P0;
        db.create_issue(stuck).unwrap();
        let mut mid = Issue::new("td-mid", "mid", Utc::now());
        mid.status = Status::Blocked;
        mid.priority = Priority::P1;
        db.create_issue(mid).unwrap();

        let data = load_task_list(&db, &request("sessY")).unwrap();
        let order: Vec<_> = data.blocked.iter().map(|i| (i.id.as_str(), i.priority)).collect();
        assert_eq!(
            order,
            [("td-stuck", Priority::P0), ("td-mid", Priority::P1), ("td-waits", Priority::P3)]
        );

        let mut created = request("sessY");
        created.sort = SortMode::CreatedDesc;
        let data = load_task_list(&db, &created).unwrap();
        let ids: Vec<_> = data.blocked.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["td-mid", "td-stuck", "td-waits"]);
    }

    #[test]
    fn test_only_unclosed_dependencies_block() {
        let db = FileDb::in_memory();
        for (blocker, status) in [
            ("td-b-open", Status::Open),
            ("td-b-progress", Status::InProgress),
            ("td-b-review", Status::InReview),
            ("td-b-blocked", Status::Blocked),
            ("td-b-closed", Status::Closed),
        ] {
            add(&db, blocker, status);
            let waiter = format!("td-w-{}", &blocker[5..]);
            add(&db, &waiter, Status::Open);
            db.add_dependency(&waiter, blocker, DEPENDS_ON).unwrap();
        }

        let data = load_task_list(&db, &request("sessY")).unwrap();
        let mut blocked: Vec<_> = data.blocked.iter().map(|i| i.id.as_str()).collect();
        blocked.sort_unstable();
        assert_eq!(
            blocked,
            [
                "td-b-blocked",
                "td-w-blocked",
                "td-w-open",
                "td-w-progress",
                "td-w-review",
            ]
        );
        let ready: Vec<_> = data.ready.iter().map(|i| i.id.as_str()).collect();
        assert!(ready.contains(&"td-w-closed"));
        assert!(ready.contains(&"td-b-open"));
    }

    #[test]
    fn test_toggling_closed_twice_restores_task_list() {
        let db = FileDb::in_memory();
        add(&db, "td-ready", Status::Open);
        add(&db, "td-stuck", Status::Blocked);
        add(&db, "td-done", Status::Closed);

        let mut req = request("sessY");
        let before = load_task_list(&db, &req).unwrap();
        req.include_closed = !req.include_closed;
        let toggled = load_task_list(&db, &req).unwrap();
        req.include_closed = !req.include_closed;
        let after = load_task_list(&db, &req).unwrap();

        assert_eq!(toggled.closed.len(), 1);
        assert_eq!(before, after);
    }

    #[test]
    fn test_query_filters_task_list() {
        let db = FileDb::in_memory();
        add(&db, "td-1", Status::Open);
        let mut bug = Issue::new("td-2", "login crash", Utc::now());
        bug.issue_type = td_types::IssueType::Bug;
        db.create_issue(bug).unwrap();

        let mut req = request("sessY");
        req.query = "type=bug".into();
        let data = load_task_list(&db, &req).unwrap();
        assert_eq!(data.ready.len(), 1);
        assert_eq!(data.ready[0].id, "td-2");
    }

    #[tokio::test]
    async fn test_fetch_data_builds_snapshot() {
        let dir = tempdir().unwrap();
        let (db, config) = services(dir.path());
        add(&db, "td-wip", Status::InProgress);
        add(&db, "td-focus", Status::Open);
        config.set_focus(Some("td-focus")).unwrap();
        db.add_log("td-wip", "sessX", LogType::Progress, "halfway").unwrap();
        db.add_handoff(Handoff {
            id: 0,
            issue_id: "td-wip".into(),
            session_id: "sessX".into(),
            done: vec![],
            remaining: vec![],
            decisions: vec![],
            uncertain: vec![],
            timestamp: Utc::now(),
        })
        .unwrap();

        let event = fetch_data(db, config, request("sessY")).await;
        let UiEvent::RefreshData { seq, result } = event else {
            panic!("expected refresh data");
        };
        assert_eq!(seq, 7);
        let data = result.unwrap();
        assert_eq!(data.focused.as_ref().map(|i| i.id.as_str()), Some("td-focus"));
        assert_eq!(data.in_progress.len(), 1);
        assert_eq!(data.activity.len(), 1);
        assert_eq!(data.recent_handoffs.len(), 1);
        assert_eq!(data.active_sessions, ["sessX"]);
        assert_eq!(data.task_list.ready.len(), 1);
    }

    #[tokio::test]
    async fn test_activity_is_capped_and_sorted() {
        let db = FileDb::in_memory();
        add(&db, "td-1", Status::Open);
        for i in 0..(ACTIVITY_LIMIT + 10) {
            db.add_log("td-1", "sessX", LogType::Progress, &format!("log {i}"))
                .unwrap();
        }
        db.add_comment("td-1", "sessX", "latest").unwrap();
        let items = load_activity(&db).unwrap();
        assert_eq!(items.len(), ACTIVITY_LIMIT);
        assert!(items.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_fetch_stats_and_handoffs() {
        let db: Arc<dyn Database> = Arc::new(FileDb::in_memory());
        let UiEvent::StatsData(Ok(stats)) = fetch_stats(Arc::clone(&db)).await else {
            panic!("expected stats");
        };
        assert_eq!(stats.total, 0);
        let UiEvent::HandoffsData(Ok(handoffs)) = fetch_handoffs(db).await else {
            panic!("expected handoffs");
        };
        assert!(handoffs.is_empty());
    }
}
