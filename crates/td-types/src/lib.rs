//! Shared domain types for the td task database.
//!
//! These are plain data snapshots. They carry no behavior beyond parsing,
//! display labels and ordering helpers, so both the database layer and the
//! monitor can depend on them without pulling in each other.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Enumerations
// ============================================================================

/// Kind of work an issue represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    #[default]
    Task,
    Bug,
    Feature,
    Chore,
    Epic,
}

impl IssueType {
    pub const ALL: [IssueType; 5] = [
        IssueType::Task,
        IssueType::Bug,
        IssueType::Feature,
        IssueType::Chore,
        IssueType::Epic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IssueType::Task => "task",
            IssueType::Bug => "bug",
            IssueType::Feature => "feature",
            IssueType::Chore => "chore",
            IssueType::Epic => "epic",
        }
    }
}

/// Issue priority, `P0` being the most urgent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum Priority {
    P0,
    P1,
    #[default]
    P2,
    P3,
    P4,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::P0,
        Priority::P1,
        Priority::P2,
        Priority::P3,
        Priority::P4,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::P0 => "P0",
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
            Priority::P4 => "P4",
        }
    }
}

/// Workflow status of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Open,
    InProgress,
    InReview,
    Blocked,
    Closed,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Open,
        Status::InProgress,
        Status::InReview,
        Status::Blocked,
        Status::Closed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::InProgress => "in_progress",
            Status::InReview => "in_review",
            Status::Blocked => "blocked",
            Status::Closed => "closed",
        }
    }

    pub fn is_closed(self) -> bool {
        matches!(self, Status::Closed)
    }
}

macro_rules! impl_label_traits {
    ($ty:ty, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseLabelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(needle))
                    .ok_or_else(|| ParseLabelError {
                        kind: $what,
                        value: s.to_string(),
                    })
            }
        }
    };
}

impl_label_traits!(IssueType, "issue type");
impl_label_traits!(Priority, "priority");
impl_label_traits!(Status, "status");

/// Error returned when a label string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseLabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for ParseLabelError {}

// ============================================================================
// Issue
// ============================================================================

/// Snapshot of a single issue row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub priority: Priority,
    pub status: Status,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub acceptance: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub minor: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementer_session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_session: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Issue {
    /// Creates an open issue with the given ID and title, timestamped `now`.
    pub fn new(id: impl Into<String>, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            issue_type: IssueType::default(),
            priority: Priority::default(),
            status: Status::default(),
            description: String::new(),
            acceptance: String::new(),
            labels: Vec::new(),
            parent_id: None,
            points: 0,
            minor: false,
            implementer_session: None,
            reviewer_session: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }

    pub fn is_epic(&self) -> bool {
        self.issue_type == IssueType::Epic
    }
}

// ============================================================================
// Logs, actions, comments, handoffs
// ============================================================================

/// Category of a free-form progress log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    #[default]
    Progress,
    Blocker,
    Decision,
    Hypothesis,
    Tried,
    Result,
}

impl LogType {
    pub fn as_str(self) -> &'static str {
        match self {
            LogType::Progress => "progress",
            LogType::Blocker => "blocker",
            LogType::Decision => "decision",
            LogType::Hypothesis => "hypothesis",
            LogType::Tried => "tried",
            LogType::Result => "result",
        }
    }
}

/// A progress log written by a session against an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    pub id: u64,
    pub issue_id: String,
    pub session_id: String,
    pub log_type: LogType,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Kind of workflow action recorded for undo and activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Create,
    Update,
    Delete,
    Start,
    Review,
    Approve,
    Reject,
    Close,
    Reopen,
    AddDependency,
    Cascade,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Create => "create",
            ActionType::Update => "update",
            ActionType::Delete => "delete",
            ActionType::Start => "start",
            ActionType::Review => "review",
            ActionType::Approve => "approve",
            ActionType::Reject => "reject",
            ActionType::Close => "close",
            ActionType::Reopen => "reopen",
            ActionType::AddDependency => "add_dependency",
            ActionType::Cascade => "cascade",
        }
    }
}

/// A recorded workflow action. `previous` and `new` hold JSON snapshots
/// so the action can be undone by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLog {
    #[serde(default)]
    pub id: u64,
    pub session_id: String,
    pub action: ActionType,
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ActionLog {
    pub fn new(
        session_id: impl Into<String>,
        action: ActionType,
        entity_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            session_id: session_id.into(),
            action,
            entity_id: entity_id.into(),
            previous: None,
            new: None,
            timestamp: now,
        }
    }

    /// Attaches before/after snapshots serialized as JSON.
    #[must_use]
    pub fn with_snapshots(mut self, previous: Option<&Issue>, new: Option<&Issue>) -> Self {
        self.previous = previous.and_then(|i| serde_json::to_string(i).ok());
        self.new = new.and_then(|i| serde_json::to_string(i).ok());
        self
    }
}

/// A free-form comment on an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub issue_id: String,
    pub session_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Structured summary recorded when a session yields an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handoff {
    pub id: u64,
    pub issue_id: String,
    pub session_id: String,
    #[serde(default)]
    pub done: Vec<String>,
    #[serde(default)]
    pub remaining: Vec<String>,
    #[serde(default)]
    pub decisions: Vec<String>,
    #[serde(default)]
    pub uncertain: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Statistics
// ============================================================================

/// Aggregate counters shown by the stats overlay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedStats {
    pub total: usize,
    pub by_status: Vec<(Status, usize)>,
    pub by_type: Vec<(IssueType, usize)>,
    pub by_priority: Vec<(Priority, usize)>,
    pub total_points: u64,
    pub created_last_24h: usize,
    pub closed_last_24h: usize,
    pub total_logs: usize,
    pub total_comments: usize,
    pub total_handoffs: usize,
    pub most_active_session: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_labels() {
        for status in Status::ALL {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
        assert!("IN_REVIEW".parse::<Status>().is_ok());
        assert!("done".parse::<Status>().is_err());
    }

    #[test]
    fn test_priority_orders_most_urgent_first() {
        assert!(Priority::P0 < Priority::P4);
        assert_eq!("p1".parse::<Priority>().unwrap(), Priority::P1);
    }

    #[test]
    fn test_issue_serializes_type_field() {
        let now = Utc::now();
        let mut issue = Issue::new("td-1", "title", now);
        issue.issue_type = IssueType::Epic;
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "epic");
        assert_eq!(json["status"], "open");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_parse_error_names_kind() {
        let err = "huge".parse::<IssueType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown issue type: \"huge\"");
    }
}
