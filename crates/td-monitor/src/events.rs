//! UI event types.
//!
//! Events are messages delivered to the reducer: terminal input, timers and
//! results of effects. Every effect concludes by posting one of these.

use crossterm::event::Event;
use ratatui::text::Line;
use td_types::{ExtendedStats, Handoff};

use crate::features::form::FormField;
use crate::features::workflow::WorkflowAction;
use crate::snapshot::{IssueDetails, RefreshData};

#[derive(Debug, Clone)]
pub enum UiEvent {
    /// Render cadence.
    Tick,

    /// Current terminal size, sent first on every loop iteration.
    Frame { width: u16, height: u16 },

    /// Raw terminal input.
    Terminal(Event),

    /// Periodic refresh timer fired.
    RefreshTick,

    /// Result of a panel refresh. `seq` matches the request.
    RefreshData {
        seq: u64,
        result: Result<Box<RefreshData>, String>,
    },

    IssueDetails {
        issue_id: String,
        result: Result<Box<IssueDetails>, String>,
    },

    MarkdownRendered {
        issue_id: String,
        width: u16,
        description: Vec<Line<'static>>,
        acceptance: Vec<Line<'static>>,
    },

    HandoffsData(Result<Vec<Handoff>, String>),

    StatsData(Result<ExtendedStats, String>),

    /// Clears the status toast if it is still the one with `generation`.
    ClearStatus { generation: u64 },

    PaneHeightsSaved(Result<(), String>),

    EditorFinished {
        field: FormField,
        result: Result<String, String>,
    },

    UpdateAvailable { version: String },

    WorkflowFinished {
        action: WorkflowAction,
        issue_id: String,
        result: Result<(), String>,
    },

    /// Form submission finished. `Ok` carries the issue ID.
    FormSubmitted {
        editing: bool,
        result: Result<String, String>,
    },

    ClipboardFinished {
        label: String,
        result: Result<(), String>,
    },
}
