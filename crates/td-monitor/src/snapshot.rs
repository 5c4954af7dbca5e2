//! Immutable data captured by a refresh or a detail fetch.
//!
//! Effects build these off the UI loop and hand them to the reducer by
//! value. A refresh always replaces the whole [`RefreshData`].

use chrono::{DateTime, Utc};
use td_types::{ActionLog, Comment, Handoff, Issue, Log};

/// Category of a task-list row, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Reviewable,
    Ready,
    Blocked,
    Closed,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Reviewable,
        Category::Ready,
        Category::Blocked,
        Category::Closed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Reviewable => "REVIEW",
            Category::Ready => "READY",
            Category::Blocked => "BLOCKED",
            Category::Closed => "CLOSED",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskListData {
    pub reviewable: Vec<Issue>,
    pub ready: Vec<Issue>,
    pub blocked: Vec<Issue>,
    pub closed: Vec<Issue>,
}

impl TaskListData {
    pub fn category(&self, category: Category) -> &[Issue] {
        match category {
            Category::Reviewable => &self.reviewable,
            Category::Ready => &self.ready,
            Category::Blocked => &self.blocked,
            Category::Closed => &self.closed,
        }
    }

    /// Flattens the categories into selectable rows.
    pub fn rows(&self) -> Vec<TaskListRow> {
        Category::ALL
            .iter()
            .flat_map(|&category| {
                self.category(category).iter().map(move |issue| TaskListRow {
                    issue: issue.clone(),
                    category,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskListRow {
    pub issue: Issue,
    pub category: Category,
}

/// Row of the current-work panel. The focused issue comes first.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWorkRow {
    pub issue: Issue,
    pub focused: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Log,
    Action,
    Comment,
}

impl ActivityKind {
    pub fn label(self) -> &'static str {
        match self {
            ActivityKind::Log => "log",
            ActivityKind::Action => "act",
            ActivityKind::Comment => "cmt",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityItem {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub kind: ActivityKind,
    pub issue_id: Option<String>,
    pub message: String,
    /// Unique within a refresh; used to keep the cursor across refreshes.
    pub key: String,
}

impl ActivityItem {
    pub fn from_log(log: &Log) -> Self {
        Self {
            timestamp: log.timestamp,
            session_id: log.session_id.clone(),
            kind: ActivityKind::Log,
            issue_id: Some(log.issue_id.clone()),
            message: format!("{}: {}", log.log_type.as_str(), log.message),
            key: format!("log:{}", log.id),
        }
    }

    pub fn from_action(action: &ActionLog) -> Self {
        Self {
            timestamp: action.timestamp,
            session_id: action.session_id.clone(),
            kind: ActivityKind::Action,
            issue_id: (!action.entity_id.is_empty()).then(|| action.entity_id.clone()),
            message: action.action.as_str().to_string(),
            key: format!("act:{}", action.id),
        }
    }

    pub fn from_comment(comment: &Comment) -> Self {
        Self {
            timestamp: comment.created_at,
            session_id: comment.session_id.clone(),
            kind: ActivityKind::Comment,
            issue_id: Some(comment.issue_id.clone()),
            message: comment.text.clone(),
            key: format!("cmt:{}", comment.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentHandoff {
    pub issue_id: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Everything a refresh shows in the three panels and the footer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshData {
    pub focused: Option<Issue>,
    pub in_progress: Vec<Issue>,
    pub activity: Vec<ActivityItem>,
    pub task_list: TaskListData,
    pub recent_handoffs: Vec<RecentHandoff>,
    pub active_sessions: Vec<String>,
}

impl RefreshData {
    pub fn current_work_rows(&self) -> Vec<CurrentWorkRow> {
        let mut rows = Vec::with_capacity(self.in_progress.len() + 1);
        if let Some(focused) = &self.focused {
            rows.push(CurrentWorkRow {
                issue: focused.clone(),
                focused: true,
            });
        }
        rows.extend(
            self.in_progress
                .iter()
                .filter(|i| self.focused.as_ref().is_none_or(|f| f.id != i.id))
                .map(|issue| CurrentWorkRow {
                    issue: issue.clone(),
                    focused: false,
                }),
        );
        rows
    }
}

/// Detail data for one modal entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueDetails {
    pub issue: Option<Issue>,
    pub handoff: Option<Handoff>,
    pub logs: Vec<Log>,
    pub comments: Vec<Comment>,
    /// Issues this one depends on.
    pub blocked_by: Vec<Issue>,
    /// Issues depending on this one.
    pub blocks: Vec<Issue>,
    pub epic_tasks: Vec<Issue>,
    pub parent_epic: Option<Issue>,
}
