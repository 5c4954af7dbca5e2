//! Issue database contract.
//!
//! The monitor only sees the [`Database`] trait. Calls are blocking and are
//! expected to run off the UI loop. Every mutating call is atomic.

mod memory;
pub mod query;

use anyhow::Result;
use chrono::{DateTime, Utc};
pub use memory::FileDb;
use td_types::{
    ActionLog, Comment, ExtendedStats, Handoff, Issue, IssueType, Log, LogType, Status,
};

/// Field used to order listings and search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Priority,
    Created,
    Updated,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Priority => "priority",
            SortField::Created => "created",
            SortField::Updated => "updated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "priority" => Some(SortField::Priority),
            "created" => Some(SortField::Created),
            "updated" => Some(SortField::Updated),
            _ => None,
        }
    }
}

/// Filters for [`Database::list_issues`]. Empty collections mean "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub statuses: Vec<Status>,
    pub types: Vec<IssueType>,
    pub parent_id: Option<String>,
    /// Direct children of this epic.
    pub epic_id: Option<String>,
    /// Keep only `in_review` issues not implemented by this session.
    pub reviewable_by: Option<String>,
    pub sort_by: Option<SortField>,
    pub sort_desc: bool,
    pub limit: Option<usize>,
}

impl ListOptions {
    pub fn with_statuses(statuses: impl IntoIterator<Item = Status>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
            ..Self::default()
        }
    }
}

/// A search hit with its relevance rank (higher is better).
#[derive(Debug, Clone, PartialEq)]
pub struct RankedIssue {
    pub issue: Issue,
    pub rank: u32,
}

/// Kind of edge between two issues.
pub const DEPENDS_ON: &str = "depends_on";

pub trait Database: Send + Sync {
    fn get_issue(&self, id: &str) -> Result<Option<Issue>>;

    /// Stores a new issue. An empty ID is replaced by a generated one.
    fn create_issue(&self, issue: Issue) -> Result<Issue>;

    fn update_issue(&self, issue: &Issue) -> Result<()>;

    fn delete_issue(&self, id: &str) -> Result<()>;

    fn list_issues(&self, opts: &ListOptions) -> Result<Vec<Issue>>;

    /// Evaluates a task query. See [`query`] for the syntax.
    fn search_issues_ranked(&self, query: &str, opts: &ListOptions) -> Result<Vec<RankedIssue>>;

    /// IDs this issue depends on.
    fn get_dependencies(&self, id: &str) -> Result<Vec<String>>;

    /// IDs of issues that depend on this one.
    fn get_blocked_by(&self, id: &str) -> Result<Vec<String>>;

    fn add_dependency(&self, id: &str, depends_on: &str, kind: &str) -> Result<()>;

    fn get_logs(&self, issue_id: &str, limit: usize) -> Result<Vec<Log>>;

    fn get_comments(&self, issue_id: &str) -> Result<Vec<Comment>>;

    fn get_latest_handoff(&self, issue_id: &str) -> Result<Option<Handoff>>;

    fn get_recent_handoffs(&self, limit: usize, since: DateTime<Utc>) -> Result<Vec<Handoff>>;

    fn get_recent_logs_all(&self, limit: usize) -> Result<Vec<Log>>;

    fn get_recent_actions_all(&self, limit: usize) -> Result<Vec<ActionLog>>;

    fn get_recent_comments_all(&self, limit: usize) -> Result<Vec<Comment>>;

    /// Distinct sessions with a log or action at or after `since`, most
    /// recent first.
    fn get_active_sessions(&self, since: DateTime<Utc>) -> Result<Vec<String>>;

    fn get_extended_stats(&self) -> Result<ExtendedStats>;

    fn log_action(&self, action: ActionLog) -> Result<()>;

    /// Promotes the parent epic of `child_id` to `status` when every child of
    /// that epic already has it. Returns whether the epic changed.
    fn cascade_up_parent_status(&self, child_id: &str, status: Status, session_id: &str)
    -> Result<bool>;

    fn add_log(
        &self,
        issue_id: &str,
        session_id: &str,
        log_type: LogType,
        message: &str,
    ) -> Result<Log>;

    fn add_comment(&self, issue_id: &str, session_id: &str, text: &str) -> Result<Comment>;

    fn add_handoff(&self, handoff: Handoff) -> Result<Handoff>;
}
