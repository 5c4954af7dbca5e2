//! JSON-file backed database.
//!
//! The whole store lives in memory behind a mutex. When opened with a path
//! it is rewritten after every mutation (temp file + rename), which keeps
//! each mutation atomic on disk.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use td_types::{
    ActionLog, ActionType, Comment, ExtendedStats, Handoff, Issue, IssueType, Log, LogType,
    Priority, Status,
};
use uuid::Uuid;

use super::query::{ParsedQuery, compare_issues};
use super::{Database, ListOptions, RankedIssue, SortField};
use crate::config::write_atomic;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Dependency {
    issue_id: String,
    depends_on: String,
    kind: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Store {
    #[serde(default)]
    issues: Vec<Issue>,
    #[serde(default)]
    dependencies: Vec<Dependency>,
    #[serde(default)]
    logs: Vec<Log>,
    #[serde(default)]
    actions: Vec<ActionLog>,
    #[serde(default)]
    comments: Vec<Comment>,
    #[serde(default)]
    handoffs: Vec<Handoff>,
    #[serde(default)]
    next_seq: u64,
}

impl Store {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn issue(&self, id: &str) -> Option<&Issue> {
        self.issues.iter().find(|i| i.id == id)
    }

    fn issue_mut(&mut self, id: &str) -> Option<&mut Issue> {
        self.issues.iter_mut().find(|i| i.id == id)
    }

    fn generate_id(&self) -> String {
        loop {
            let hex = Uuid::new_v4().simple().to_string();
            let id = format!("td-{}", &hex[..6]);
            if self.issue(&id).is_none() {
                return id;
            }
        }
    }

    fn push_action(&mut self, mut action: ActionLog) {
        action.id = self.next_seq();
        self.actions.push(action);
    }
}

/// The default [`Database`] implementation.
pub struct FileDb {
    store: Mutex<Store>,
    path: Option<PathBuf>,
}

impl FileDb {
    /// Opens (or lazily creates) the database stored at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let store = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read database {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse database {}", path.display()))?
        } else {
            Store::default()
        };
        tracing::debug!(target: "db", path = %path.display(), "database_opened");
        Ok(Self {
            store: Mutex::new(store),
            path: Some(path.to_path_buf()),
        })
    }

    /// Creates an empty database that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            store: Mutex::new(Store::default()),
            path: None,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Store>> {
        self.store
            .lock()
            .map_err(|e| anyhow!("database lock poisoned: {e}"))
    }

    fn read<R>(&self, f: impl FnOnce(&Store) -> R) -> Result<R> {
        let store = self.lock()?;
        Ok(f(&store))
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Store) -> Result<R>) -> Result<R> {
        let mut store = self.lock()?;
        let result = f(&mut store)?;
        if let Some(path) = &self.path {
            let json =
                serde_json::to_string_pretty(&*store).context("Failed to serialize database")?;
            write_atomic(path, &json)?;
        }
        Ok(result)
    }
}

fn matches_options(issue: &Issue, opts: &ListOptions) -> bool {
    if !opts.statuses.is_empty() && !opts.statuses.contains(&issue.status) {
        return false;
    }
    if !opts.types.is_empty() && !opts.types.contains(&issue.issue_type) {
        return false;
    }
    for parent in [&opts.parent_id, &opts.epic_id].into_iter().flatten() {
        if issue.parent_id.as_deref() != Some(parent.as_str()) {
            return false;
        }
    }
    if let Some(session) = &opts.reviewable_by {
        if issue.status != Status::InReview {
            return false;
        }
        if issue.implementer_session.as_deref() == Some(session.as_str()) {
            return false;
        }
    }
    true
}

fn newest_first<T>(mut items: Vec<T>, key: impl Fn(&T) -> DateTime<Utc>, limit: usize) -> Vec<T> {
    items.sort_by_key(|item| std::cmp::Reverse(key(item)));
    items.truncate(limit);
    items
}

fn count_by<T: Copy + PartialEq>(all: &[T], values: impl Iterator<Item = T>) -> Vec<(T, usize)> {
    let values: Vec<T> = values.collect();
    all.iter()
        .map(|v| (*v, values.iter().filter(|x| *x == v).count()))
        .collect()
}

impl Database for FileDb {
    fn get_issue(&self, id: &str) -> Result<Option<Issue>> {
        self.read(|s| s.issue(id).cloned())
    }

    fn create_issue(&self, mut issue: Issue) -> Result<Issue> {
        self.mutate(|s| {
            if issue.id.is_empty() {
                issue.id = s.generate_id();
            } else if s.issue(&issue.id).is_some() {
                bail!("issue {} already exists", issue.id);
            }
            s.issues.push(issue.clone());
            Ok(issue)
        })
    }

    fn update_issue(&self, issue: &Issue) -> Result<()> {
        self.mutate(|s| {
            let slot = s
                .issue_mut(&issue.id)
                .ok_or_else(|| anyhow!("issue {} not found", issue.id))?;
            *slot = issue.clone();
            Ok(())
        })
    }

    fn delete_issue(&self, id: &str) -> Result<()> {
        self.mutate(|s| {
            let before = s.issues.len();
            s.issues.retain(|i| i.id != id);
            if s.issues.len() == before {
                bail!("issue {id} not found");
            }
            s.dependencies
                .retain(|d| d.issue_id != id && d.depends_on != id);
            Ok(())
        })
    }

    fn list_issues(&self, opts: &ListOptions) -> Result<Vec<Issue>> {
        self.read(|s| {
            let mut issues: Vec<Issue> = s
                .issues
                .iter()
                .filter(|i| matches_options(i, opts))
                .cloned()
                .collect();
            let field = opts.sort_by.unwrap_or_default();
            issues.sort_by(|a, b| compare_issues(a, b, field, opts.sort_desc));
            if let Some(limit) = opts.limit {
                issues.truncate(limit);
            }
            issues
        })
    }

    fn search_issues_ranked(&self, query: &str, opts: &ListOptions) -> Result<Vec<RankedIssue>> {
        let parsed = ParsedQuery::parse(query);
        let (field, desc) = parsed.sort.map_or_else(
            || (opts.sort_by.unwrap_or(SortField::Priority), opts.sort_desc),
            |c| (c.field, c.desc),
        );
        self.read(|s| {
            let mut hits: Vec<RankedIssue> = s
                .issues
                .iter()
                .filter(|i| matches_options(i, opts))
                .filter_map(|i| {
                    parsed.rank(i).map(|rank| RankedIssue {
                        issue: i.clone(),
                        rank,
                    })
                })
                .collect();
            hits.sort_by(|a, b| {
                b.rank
                    .cmp(&a.rank)
                    .then_with(|| compare_issues(&a.issue, &b.issue, field, desc))
            });
            if let Some(limit) = opts.limit {
                hits.truncate(limit);
            }
            hits
        })
    }

    fn get_dependencies(&self, id: &str) -> Result<Vec<String>> {
        self.read(|s| {
            s.dependencies
                .iter()
                .filter(|d| d.issue_id == id)
                .map(|d| d.depends_on.clone())
                .collect()
        })
    }

    fn get_blocked_by(&self, id: &str) -> Result<Vec<String>> {
        self.read(|s| {
            s.dependencies
                .iter()
                .filter(|d| d.depends_on == id)
                .map(|d| d.issue_id.clone())
                .collect()
        })
    }

    fn add_dependency(&self, id: &str, depends_on: &str, kind: &str) -> Result<()> {
        self.mutate(|s| {
            if id == depends_on {
                bail!("issue {id} cannot depend on itself");
            }
            for needed in [id, depends_on] {
                if s.issue(needed).is_none() {
                    bail!("issue {needed} not found");
                }
            }
            let dep = Dependency {
                issue_id: id.to_string(),
                depends_on: depends_on.to_string(),
                kind: kind.to_string(),
            };
            if !s.dependencies.contains(&dep) {
                s.dependencies.push(dep);
            }
            Ok(())
        })
    }

    fn get_logs(&self, issue_id: &str, limit: usize) -> Result<Vec<Log>> {
        self.read(|s| {
            let logs: Vec<Log> = s
                .logs
                .iter()
                .filter(|l| l.issue_id == issue_id)
                .cloned()
                .collect();
            newest_first(logs, |l| l.timestamp, limit)
        })
    }

    fn get_comments(&self, issue_id: &str) -> Result<Vec<Comment>> {
        self.read(|s| {
            let mut comments: Vec<Comment> = s
                .comments
                .iter()
                .filter(|c| c.issue_id == issue_id)
                .cloned()
                .collect();
            comments.sort_by_key(|c| c.created_at);
            comments
        })
    }

    fn get_latest_handoff(&self, issue_id: &str) -> Result<Option<Handoff>> {
        self.read(|s| {
            s.handoffs
                .iter()
                .filter(|h| h.issue_id == issue_id)
                .max_by_key(|h| (h.timestamp, h.id))
                .cloned()
        })
    }

    fn get_recent_handoffs(&self, limit: usize, since: DateTime<Utc>) -> Result<Vec<Handoff>> {
        self.read(|s| {
            let handoffs: Vec<Handoff> = s
                .handoffs
                .iter()
                .filter(|h| h.timestamp >= since)
                .cloned()
                .collect();
            newest_first(handoffs, |h| h.timestamp, limit)
        })
    }

    fn get_recent_logs_all(&self, limit: usize) -> Result<Vec<Log>> {
        self.read(|s| newest_first(s.logs.clone(), |l| l.timestamp, limit))
    }

    fn get_recent_actions_all(&self, limit: usize) -> Result<Vec<ActionLog>> {
        self.read(|s| newest_first(s.actions.clone(), |a| a.timestamp, limit))
    }

    fn get_recent_comments_all(&self, limit: usize) -> Result<Vec<Comment>> {
        self.read(|s| newest_first(s.comments.clone(), |c| c.created_at, limit))
    }

    fn get_active_sessions(&self, since: DateTime<Utc>) -> Result<Vec<String>> {
        self.read(|s| {
            let mut latest: HashMap<&str, DateTime<Utc>> = HashMap::new();
            let seen = s
                .logs
                .iter()
                .map(|l| (l.session_id.as_str(), l.timestamp))
                .chain(s.actions.iter().map(|a| (a.session_id.as_str(), a.timestamp)));
            for (session, ts) in seen {
                if ts < since || session.is_empty() {
                    continue;
                }
                let entry = latest.entry(session).or_insert(ts);
                if ts > *entry {
                    *entry = ts;
                }
            }
            let mut sessions: Vec<(&str, DateTime<Utc>)> = latest.into_iter().collect();
            sessions.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            sessions.into_iter().map(|(s, _)| s.to_string()).collect()
        })
    }

    fn get_extended_stats(&self) -> Result<ExtendedStats> {
        let day_ago = Utc::now() - Duration::hours(24);
        self.read(|s| {
            let mut activity: HashMap<&str, usize> = HashMap::new();
            for session in s
                .logs
                .iter()
                .map(|l| l.session_id.as_str())
                .chain(s.actions.iter().map(|a| a.session_id.as_str()))
                .chain(s.comments.iter().map(|c| c.session_id.as_str()))
            {
                *activity.entry(session).or_default() += 1;
            }
            let most_active_session = activity
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
                .map(|(s, _)| s.to_string());

            ExtendedStats {
                total: s.issues.len(),
                by_status: count_by(&Status::ALL, s.issues.iter().map(|i| i.status)),
                by_type: count_by(&IssueType::ALL, s.issues.iter().map(|i| i.issue_type)),
                by_priority: count_by(&Priority::ALL, s.issues.iter().map(|i| i.priority)),
                total_points: s.issues.iter().map(|i| u64::from(i.points)).sum(),
                created_last_24h: s.issues.iter().filter(|i| i.created_at >= day_ago).count(),
                closed_last_24h: s
                    .issues
                    .iter()
                    .filter(|i| i.closed_at.is_some_and(|t| t >= day_ago))
                    .count(),
                total_logs: s.logs.len(),
                total_comments: s.comments.len(),
                total_handoffs: s.handoffs.len(),
                most_active_session,
            }
        })
    }

    fn log_action(&self, action: ActionLog) -> Result<()> {
        self.mutate(|s| {
            s.push_action(action);
            Ok(())
        })
    }

    fn cascade_up_parent_status(
        &self,
        child_id: &str,
        status: Status,
        session_id: &str,
    ) -> Result<bool> {
        self.mutate(|s| {
            let Some(parent_id) = s.issue(child_id).and_then(|c| c.parent_id.clone()) else {
                return Ok(false);
            };
            let Some(parent) = s.issue(&parent_id).filter(|p| p.is_epic()).cloned() else {
                return Ok(false);
            };
            if parent.status == status {
                return Ok(false);
            }
            let all_agree = s
                .issues
                .iter()
                .filter(|i| i.parent_id.as_deref() == Some(parent_id.as_str()))
                .all(|i| i.status == status);
            if !all_agree {
                return Ok(false);
            }

            let now = Utc::now();
            let mut updated = parent.clone();
            updated.status = status;
            updated.updated_at = now;
            updated.closed_at = status.is_closed().then_some(now);
            if let Some(slot) = s.issue_mut(&parent_id) {
                *slot = updated.clone();
            }
            s.push_action(
                ActionLog::new(session_id, ActionType::Cascade, &parent_id, now)
                    .with_snapshots(Some(&parent), Some(&updated)),
            );
            tracing::info!(target: "db", epic = %parent_id, status = %status, "cascade_parent_status");
            Ok(true)
        })
    }

    fn add_log(
        &self,
        issue_id: &str,
        session_id: &str,
        log_type: LogType,
        message: &str,
    ) -> Result<Log> {
        self.mutate(|s| {
            let log = Log {
                id: s.next_seq(),
                issue_id: issue_id.to_string(),
                session_id: session_id.to_string(),
                log_type,
                message: message.to_string(),
                timestamp: Utc::now(),
            };
            s.logs.push(log.clone());
            Ok(log)
        })
    }

    fn add_comment(&self, issue_id: &str, session_id: &str, text: &str) -> Result<Comment> {
        self.mutate(|s| {
            let comment = Comment {
                id: s.next_seq(),
                issue_id: issue_id.to_string(),
                session_id: session_id.to_string(),
                text: text.to_string(),
                created_at: Utc::now(),
            };
            s.comments.push(comment.clone());
            Ok(comment)
        })
    }

    fn add_handoff(&self, mut handoff: Handoff) -> Result<Handoff> {
        self.mutate(|s| {
            handoff.id = s.next_seq();
            s.handoffs.push(handoff.clone());
            Ok(handoff)
        })
    }
}
