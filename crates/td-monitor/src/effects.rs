//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They carry everything they need by value; the reducer never performs I/O.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::features::form::{FormField, FormSubmission};
use crate::features::search::SortMode;
use crate::features::workflow::WorkflowAction;

/// Inputs of one panel refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub query: String,
    pub sort: SortMode,
    pub include_closed: bool,
    pub session_id: String,
    /// Handoffs at or after this instant are listed in the footer data.
    pub handoffs_since: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum UiEffect {
    Quit,

    FetchData(FetchRequest),

    FetchIssueDetails { issue_id: String },

    RenderMarkdown {
        issue_id: String,
        description: String,
        acceptance: String,
        width: u16,
    },

    FetchStats,

    FetchHandoffs,

    Workflow {
        action: WorkflowAction,
        issue_id: String,
    },

    SetPaneHeights { heights: [f64; 3] },

    CopyToClipboard { text: String, label: String },

    /// Hands the terminal to `$VISUAL`/`$EDITOR` for one field.
    OpenEditor { field: FormField, content: String },

    ScheduleClearStatus { generation: u64, after: Duration },

    SubmitForm(Box<FormSubmission>),
}
