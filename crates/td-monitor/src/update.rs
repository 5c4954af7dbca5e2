//! Reducer.
//!
//! `update` applies one event to the state and returns the effects to run.
//! It never blocks and never performs I/O; failures arriving in events are
//! turned into state (panel error, modal error, toast).

use std::time::Instant;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};
use td_types::Issue;

use crate::common::format::issue_markdown;
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::features::form::{FormField, FormState};
use crate::features::modal::RenderedMarkdown;
use crate::features::modal::update::{ModalContext, handle_command as handle_modal_command, reveal_task};
use crate::features::panels::Panel;
use crate::features::panels::update::{MouseOutcome, handle_mouse as handle_panel_mouse, handle_navigation};
use crate::features::search::SearchState;
use crate::features::workflow::WorkflowAction;
use crate::keymap::{Command, Context};
use crate::overlays::{
    ConfirmState, HandoffsState, HelpState, Overlay, OverlayTransition, OverlayUpdate, StatsState,
};
use crate::snapshot::{Category, IssueDetails, RefreshData};
use crate::state::{AppState, TuiState};

/// Modal rows moved per wheel notch.
const MODAL_WHEEL_STEP: isize = 3;

pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => Vec::new(),
        UiEvent::Frame { width, height } => handle_resize(app, width, height),
        UiEvent::Terminal(event) => handle_terminal_event(app, event),
        UiEvent::RefreshTick => {
            if app.tui.fetch.in_flight {
                Vec::new()
            } else {
                vec![app.tui.fetch_effect()]
            }
        }
        UiEvent::RefreshData { seq, result } => {
            handle_refresh(&mut app.tui, seq, result);
            Vec::new()
        }
        UiEvent::IssueDetails { issue_id, result } => handle_issue_details(app, &issue_id, result),
        UiEvent::MarkdownRendered {
            issue_id,
            width,
            description,
            acceptance,
        } => {
            let geometry = app.modal_geometry();
            if let Some(entry) = app.modals.current_mut()
                && entry.issue_id == issue_id
            {
                entry.markdown = Some(RenderedMarkdown {
                    width,
                    description,
                    acceptance,
                });
                entry.recount(usize::from(geometry.width()), geometry.visible_height());
            }
            Vec::new()
        }
        UiEvent::HandoffsData(result) => {
            if let Some(Overlay::Handoffs(handoffs)) = app.overlay.as_mut() {
                handoffs.set_items(result);
            }
            Vec::new()
        }
        UiEvent::StatsData(result) => {
            if let Some(Overlay::Stats(stats)) = app.overlay.as_mut() {
                stats.stats = Some(result);
                stats.scroll = 0;
            }
            Vec::new()
        }
        UiEvent::ClearStatus { generation } => {
            app.tui.clear_status(generation);
            Vec::new()
        }
        UiEvent::PaneHeightsSaved(result) => {
            if let Err(error) = result {
                tracing::warn!(%error, "pane_heights_persist_failed");
            }
            Vec::new()
        }
        UiEvent::EditorFinished { field, result } => handle_editor_finished(app, field, result),
        UiEvent::UpdateAvailable { version } => {
            app.tui.update_available = Some(version);
            Vec::new()
        }
        UiEvent::WorkflowFinished {
            action,
            issue_id,
            result,
        } => handle_workflow_finished(app, action, &issue_id, result),
        UiEvent::FormSubmitted { editing, result } => handle_form_submitted(app, editing, result),
        UiEvent::ClipboardFinished { label, result } => match result {
            Ok(()) => vec![app.tui.set_status(format!("Copied {label}"), false)],
            Err(error) => vec![app.tui.set_status(format!("Copy failed: {error}"), true)],
        },
    }
}

// ============================================================================
// Data events
// ============================================================================

fn handle_resize(app: &mut AppState, width: u16, height: u16) -> Vec<UiEffect> {
    if app.tui.width == width && app.tui.height == height {
        return Vec::new();
    }
    app.tui.width = width;
    app.tui.height = height;
    relayout(&mut app.tui);
    refresh_modal_geometry(app)
}

fn relayout(tui: &mut TuiState) {
    tui.relayout();
    let heights = tui.visible_heights();
    tui.panels.reclamp(heights);
}

/// Re-estimates the open modal for the current size and asks for markdown
/// at the new width.
fn refresh_modal_geometry(app: &mut AppState) -> Vec<UiEffect> {
    let geometry = app.modal_geometry();
    let Some(entry) = app.modals.current_mut() else {
        return Vec::new();
    };
    entry.recount(usize::from(geometry.width()), geometry.visible_height());
    entry.markdown_request(geometry.width()).into_iter().collect()
}

fn handle_refresh(tui: &mut TuiState, seq: u64, result: Result<Box<RefreshData>, String>) {
    if seq >= tui.fetch.next_seq {
        tui.fetch.in_flight = false;
    }
    if seq < tui.fetch.applied_seq {
        tracing::debug!(seq, applied = tui.fetch.applied_seq, "stale_refresh_dropped");
        return;
    }
    tui.fetch.applied_seq = seq;
    match result {
        Ok(data) => {
            tui.err = None;
            let heights = tui.visible_heights();
            tui.panels.apply_refresh(&data, heights);
            tui.active_sessions = data.active_sessions;
            tui.recent_handoffs = data.recent_handoffs.len();
            tui.last_refresh = Some(chrono::Utc::now());
        }
        Err(error) => {
            tracing::warn!(%error, "refresh_failed");
            tui.err = Some(error);
        }
    }
}

fn handle_issue_details(
    app: &mut AppState,
    issue_id: &str,
    result: Result<Box<IssueDetails>, String>,
) -> Vec<UiEffect> {
    let geometry = app.modal_geometry();
    let Some(entry) = app.modals.current_mut() else {
        return Vec::new();
    };
    if entry.issue_id != issue_id {
        tracing::debug!(issue_id, current = %entry.issue_id, "stale_details_dropped");
        return Vec::new();
    }
    entry.apply_details(result);
    entry.recount(usize::from(geometry.width()), geometry.visible_height());
    if entry.tasks_focused {
        reveal_task(entry, geometry);
    }
    entry.markdown_request(geometry.width()).into_iter().collect()
}

fn handle_editor_finished(
    app: &mut AppState,
    field: FormField,
    result: Result<String, String>,
) -> Vec<UiEffect> {
    match result {
        Ok(text) => {
            if let Some(form) = app.overlay.as_mut().and_then(Overlay::as_form_mut) {
                form.set_field_text(field, &text);
            }
            Vec::new()
        }
        Err(error) => vec![app.tui.set_status(format!("Editor failed: {error}"), true)],
    }
}

fn handle_workflow_finished(
    app: &mut AppState,
    action: WorkflowAction,
    issue_id: &str,
    result: Result<(), String>,
) -> Vec<UiEffect> {
    let mut effects = Vec::new();
    match (&result, action) {
        (Ok(()), WorkflowAction::Reopen) => {
            effects.push(app.tui.set_status(format!("REOPENED {issue_id}"), false));
        }
        (Err(error), WorkflowAction::Reopen) => {
            effects.push(app.tui.set_status(format!("Reopen failed: {error}"), true));
        }
        (Err(error), _) => {
            tracing::debug!(action = action.label(), issue_id, %error, "workflow_noop");
        }
        (Ok(()), _) => {}
    }

    if result.is_ok() {
        if action == WorkflowAction::Delete {
            app.modals.remove_issue(issue_id);
        } else if app.modals.current().is_some_and(|e| e.issue_id == issue_id) {
            effects.push(UiEffect::FetchIssueDetails {
                issue_id: issue_id.to_string(),
            });
        }
    }
    effects.push(app.tui.fetch_effect());
    effects
}

fn handle_form_submitted(
    app: &mut AppState,
    editing: bool,
    result: Result<String, String>,
) -> Vec<UiEffect> {
    match result {
        Ok(issue_id) => {
            if matches!(app.overlay, Some(Overlay::Form(_))) {
                app.overlay = None;
            }
            let verb = if editing { "Updated" } else { "Created" };
            let mut effects = vec![app.tui.set_status(format!("{verb} {issue_id}"), false)];
            if app.modals.current().is_some_and(|e| e.issue_id == issue_id) {
                effects.push(UiEffect::FetchIssueDetails { issue_id });
            }
            effects.push(app.tui.fetch_effect());
            effects
        }
        Err(error) => {
            if let Some(form) = app.overlay.as_mut().and_then(Overlay::as_form_mut) {
                form.submitting = false;
                form.submit_error = Some(error);
            }
            Vec::new()
        }
    }
}

// ============================================================================
// Terminal input
// ============================================================================

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, key),
        Event::Mouse(mouse) => handle_mouse(app, mouse),
        Event::Paste(text) => handle_paste(app, &text),
        Event::Resize(width, height) => handle_resize(app, width, height),
        _ => Vec::new(),
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let context = app.context();
    let command = app.tui.keymap.resolve(context, &key);
    if command == Some(Command::Quit) {
        return vec![UiEffect::Quit];
    }

    if let Some(mut overlay) = app.overlay.take() {
        let update = overlay.handle_key(&app.tui, command, key);
        return apply_overlay_update(app, overlay, update);
    }

    match context {
        Context::Search => handle_search_key(app, command, key),
        Context::Modal | Context::ParentEpicFocused | Context::EpicTasks => {
            handle_modal_key(app, context, command)
        }
        _ => command.map_or_else(Vec::new, |command| handle_main_command(app, command)),
    }
}

fn apply_overlay_update(app: &mut AppState, overlay: Overlay, update: OverlayUpdate) -> Vec<UiEffect> {
    let mut effects = update.effects;
    match update.transition {
        OverlayTransition::Stay => app.overlay = Some(overlay),
        OverlayTransition::Close => {}
        OverlayTransition::OpenIssue(issue_id) => {
            effects.push(app.modals.push(issue_id, None));
        }
    }
    effects
}

fn handle_search_key(app: &mut AppState, command: Option<Command>, key: KeyEvent) -> Vec<UiEffect> {
    match command {
        Some(Command::SearchBackspace) => {
            if app.tui.search.query.pop().is_some() {
                search_changed(&mut app.tui)
            } else {
                Vec::new()
            }
        }
        Some(Command::CommitSearch) => {
            app.tui.search.editing = false;
            relayout(&mut app.tui);
            Vec::new()
        }
        Some(Command::ClearSearch) => {
            app.tui.search.clear();
            search_changed(&mut app.tui)
        }
        Some(Command::QueryHelp) => {
            app.overlay = Some(Overlay::Help(HelpState::query_language()));
            Vec::new()
        }
        _ => match key.code {
            KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                app.tui.search.query.push(c);
                search_changed(&mut app.tui)
            }
            _ => Vec::new(),
        },
    }
}

/// The query changed: the bar may appear or vanish and results refetch.
fn search_changed(tui: &mut TuiState) -> Vec<UiEffect> {
    relayout(tui);
    vec![tui.fetch_effect()]
}

fn handle_modal_key(app: &mut AppState, context: Context, command: Option<Command>) -> Vec<UiEffect> {
    let Some(command) = command else {
        return Vec::new();
    };
    if is_issue_action(command) {
        return handle_issue_action(app, command);
    }
    if command == Command::Help {
        app.overlay = Some(Overlay::Help(HelpState::keys(&app.tui.keymap, context)));
        return Vec::new();
    }
    let geometry = app.modal_geometry();
    let tui = &mut app.tui;
    let mut ctx = ModalContext {
        panels: &mut tui.panels,
        layout: &tui.layout,
        geometry,
    };
    handle_modal_command(&mut app.modals, &mut ctx, context, command)
}

fn handle_main_command(app: &mut AppState, command: Command) -> Vec<UiEffect> {
    if handle_navigation(&mut app.tui.panels, &app.tui.layout, command) {
        return Vec::new();
    }
    if is_issue_action(command) {
        return handle_issue_action(app, command);
    }
    let tui = &mut app.tui;
    match command {
        Command::Select => {
            let panel = tui.panels.active;
            match tui.panels.selected_issue_id(panel) {
                Some(issue_id) => vec![app.modals.push(issue_id, Some(panel))],
                None => Vec::new(),
            }
        }
        Command::StartSearch => {
            tui.search.editing = true;
            relayout(tui);
            Vec::new()
        }
        Command::ClearSearch => {
            if tui.search == SearchState::default() {
                return Vec::new();
            }
            tui.search.clear();
            search_changed(tui)
        }
        Command::CycleSort => {
            tui.search.cycle_sort();
            search_changed(tui)
        }
        Command::CycleTypeFilter => {
            tui.search.cycle_type_filter();
            let label = tui.search.type_filter.label();
            let mut effects = search_changed(tui);
            effects.push(tui.set_status(format!("Type filter: {label}"), false));
            effects
        }
        Command::ToggleClosed => {
            tui.include_closed = !tui.include_closed;
            vec![tui.fetch_effect()]
        }
        Command::Refresh => {
            tui.err = None;
            vec![tui.fetch_effect()]
        }
        Command::Handoffs => {
            app.overlay = Some(Overlay::Handoffs(HandoffsState::default()));
            vec![UiEffect::FetchHandoffs]
        }
        Command::Stats => {
            app.overlay = Some(Overlay::Stats(StatsState::default()));
            vec![UiEffect::FetchStats]
        }
        Command::Help => {
            app.overlay = Some(Overlay::Help(HelpState::keys(&tui.keymap, Context::Main)));
            Vec::new()
        }
        _ => Vec::new(),
    }
}

// ============================================================================
// Issue actions
// ============================================================================

fn is_issue_action(command: Command) -> bool {
    matches!(
        command,
        Command::MarkForReview
            | Command::Approve
            | Command::CloseIssue
            | Command::Reopen
            | Command::Delete
            | Command::NewIssue
            | Command::EditIssue
            | Command::CopyId
            | Command::CopyMarkdown
    )
}

/// ID the action applies to: the modal's issue, else the active panel's row.
fn target_issue_id(app: &AppState) -> Option<String> {
    if let Some(entry) = app.modals.current() {
        return Some(entry.issue_id.clone());
    }
    let panel = app.tui.panels.active;
    app.tui.panels.selected_issue_id(panel)
}

/// Full issue for the target, when one is loaded.
fn target_issue(app: &AppState) -> Option<Issue> {
    if let Some(entry) = app.modals.current() {
        return entry.issue().cloned();
    }
    let panels = &app.tui.panels;
    panels
        .issue_at(panels.active, panels.cursor(panels.active).cursor)
        .cloned()
}

fn handle_issue_action(app: &mut AppState, command: Command) -> Vec<UiEffect> {
    match command {
        Command::MarkForReview => run_workflow(app, WorkflowAction::Review, true),
        Command::CloseIssue => run_workflow(app, WorkflowAction::Close, true),
        Command::Reopen => run_workflow(app, WorkflowAction::Reopen, false),
        Command::Approve => approve(app),
        Command::Delete => {
            if let Some(issue_id) = target_issue_id(app) {
                let title = target_issue(app).map(|i| i.title).unwrap_or_default();
                app.overlay = Some(Overlay::Confirm(ConfirmState::new(issue_id, title)));
            }
            Vec::new()
        }
        Command::NewIssue => {
            let parent = app
                .modals
                .current()
                .and_then(|e| e.issue())
                .filter(|i| i.is_epic())
                .map(|i| i.id.clone());
            app.overlay = Some(Overlay::Form(Box::new(FormState::create(parent))));
            Vec::new()
        }
        Command::EditIssue => {
            if let Some(issue) = target_issue(app) {
                app.overlay = Some(Overlay::Form(Box::new(FormState::edit(issue))));
            }
            Vec::new()
        }
        Command::CopyId => match target_issue_id(app) {
            Some(issue_id) => vec![UiEffect::CopyToClipboard {
                text: issue_id.clone(),
                label: issue_id,
            }],
            None => Vec::new(),
        },
        Command::CopyMarkdown => match target_issue(app) {
            Some(issue) => vec![UiEffect::CopyToClipboard {
                text: issue_markdown(&issue),
                label: format!("{} as markdown", issue.id),
            }],
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn run_workflow(app: &mut AppState, action: WorkflowAction, close_modal: bool) -> Vec<UiEffect> {
    let Some(issue_id) = target_issue_id(app) else {
        return Vec::new();
    };
    if let Some(issue) = target_issue(app)
        && !action.allowed(&issue, &app.tui.session_id)
    {
        return Vec::new();
    }
    if close_modal {
        app.modals.clear();
    }
    vec![UiEffect::Workflow { action, issue_id }]
}

/// Approve works on a Reviewable task-list row only. The row's ID is
/// forgotten so the cursor keeps its index once the row leaves the group.
fn approve(app: &mut AppState) -> Vec<UiEffect> {
    let panels = &mut app.tui.panels;
    if panels.active != Panel::TaskList {
        return Vec::new();
    }
    let row = panels.cursor(Panel::TaskList).cursor;
    let Some(task) = panels.task_rows.get(row) else {
        return Vec::new();
    };
    if task.category != Category::Reviewable
        || !WorkflowAction::Approve.allowed(&task.issue, &app.tui.session_id)
    {
        return Vec::new();
    }
    let issue_id = task.issue.id.clone();
    if app.modals.current().is_some_and(|e| e.issue_id != issue_id) {
        return Vec::new();
    }
    panels.clear_selected_id(Panel::TaskList);
    vec![UiEffect::Workflow {
        action: WorkflowAction::Approve,
        issue_id,
    }]
}

// ============================================================================
// Mouse and paste
// ============================================================================

fn handle_mouse(app: &mut AppState, mouse: MouseEvent) -> Vec<UiEffect> {
    if app.overlay.is_some() {
        return Vec::new();
    }
    if app.modals.is_open() {
        let vh = app.modal_geometry().visible_height();
        if let Some(entry) = app.modals.current_mut() {
            match mouse.kind {
                MouseEventKind::ScrollDown => entry.scroll_by(MODAL_WHEEL_STEP, vh),
                MouseEventKind::ScrollUp => entry.scroll_by(-MODAL_WHEEL_STEP, vh),
                _ => {}
            }
        }
        return Vec::new();
    }

    let tui = &mut app.tui;
    match handle_panel_mouse(&mut tui.panels, &tui.layout, mouse, Instant::now()) {
        MouseOutcome::None => Vec::new(),
        MouseOutcome::OpenIssue { panel, issue_id } => vec![app.modals.push(issue_id, Some(panel))],
        MouseOutcome::Resized => {
            relayout(tui);
            Vec::new()
        }
        MouseOutcome::DragFinished(heights) => {
            relayout(tui);
            vec![UiEffect::SetPaneHeights { heights }]
        }
    }
}

fn handle_paste(app: &mut AppState, text: &str) -> Vec<UiEffect> {
    if let Some(form) = app.overlay.as_mut().and_then(Overlay::as_form_mut) {
        form.paste(text);
        return Vec::new();
    }
    if app.overlay.is_none() && !app.modals.is_open() && app.tui.search.editing {
        let line: String = text.chars().filter(|c| !c.is_control()).collect();
        if !line.is_empty() {
            app.tui.search.query.push_str(&line);
            return search_changed(&mut app.tui);
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::Utc;
    use crossterm::event::{MouseButton, MouseEvent};
    use ratatui::text::Line;
    use td_types::{ExtendedStats, Status};

    use super::*;
    use crate::features::modal::content;
    use crate::snapshot::TaskListData;
    use crate::state::MonitorOptions;

    fn app() -> AppState {
        let mut app = AppState::new(TuiState::new(
            "sessY",
            PathBuf::from("."),
            MonitorOptions::default(),
            [0.3, 0.4, 0.3],
        ));
        update(&mut app, UiEvent::Frame { width: 100, height: 40 });
        app
    }

    fn issue(id: &str, status: Status) -> Issue {
        let mut issue = Issue::new(id, format!("title {id}"), Utc::now());
        issue.status = status;
        issue
    }

    fn refresh(app: &mut AppState, data: RefreshData) {
        let effects = app.init();
        let UiEffect::FetchData(request) = &effects[0] else {
            panic!("expected a fetch");
        };
        update(
            app,
            UiEvent::RefreshData {
                seq: request.seq,
                result: Ok(Box::new(data)),
            },
        );
    }

    fn key(app: &mut AppState, code: KeyCode) -> Vec<UiEffect> {
        update(
            app,
            UiEvent::Terminal(Event::Key(KeyEvent::new(code, KeyModifiers::NONE))),
        )
    }

    fn ready(ids: &[&str]) -> RefreshData {
        RefreshData {
            task_list: TaskListData {
                ready: ids.iter().map(|id| issue(id, Status::Open)).collect(),
                ..TaskListData::default()
            },
            ..RefreshData::default()
        }
    }

    fn click(app: &mut AppState, kind: MouseEventKind, column: u16, row: u16) -> Vec<UiEffect> {
        update(
            app,
            UiEvent::Terminal(Event::Mouse(MouseEvent {
                kind,
                column,
                row,
                modifiers: KeyModifiers::NONE,
            })),
        )
    }

    #[test]
    fn test_review_from_current_work() {
        let mut app = app();
        refresh(
            &mut app,
            RefreshData {
                in_progress: vec![issue("td-1", Status::InProgress)],
                ..RefreshData::default()
            },
        );
        let effects = key(&mut app, KeyCode::Char('r'));
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::Workflow { action: WorkflowAction::Review, issue_id }] if issue_id == "td-1"
        ));
        assert!(!app.modals.is_open());

        let effects = update(
            &mut app,
            UiEvent::WorkflowFinished {
                action: WorkflowAction::Review,
                issue_id: "td-1".into(),
                result: Ok(()),
            },
        );
        assert!(matches!(effects.as_slice(), [UiEffect::FetchData(_)]));
        assert!(app.tui.status.is_none());
    }

    #[test]
    fn test_review_closes_modal() {
        let mut app = app();
        refresh(&mut app, ready(&["td-1"]));
        app.tui.panels.active = Panel::TaskList;
        key(&mut app, KeyCode::Enter);
        update(
            &mut app,
            UiEvent::IssueDetails {
                issue_id: "td-1".into(),
                result: Ok(Box::new(IssueDetails {
                    issue: Some(issue("td-1", Status::Open)),
                    ..IssueDetails::default()
                })),
            },
        );
        let effects = key(&mut app, KeyCode::Char('r'));
        assert_eq!(effects.len(), 1);
        assert!(!app.modals.is_open());
    }

    #[test]
    fn test_approve_requires_reviewable_row() {
        let mut app = app();
        let mut theirs = issue("td-a", Status::InReview);
        theirs.implementer_session = Some("sessX".into());
        let mut data = ready(&["td-r"]);
        data.task_list.reviewable = vec![theirs];
        refresh(&mut app, data);

        assert!(key(&mut app, KeyCode::Char('a')).is_empty());

        app.tui.panels.active = Panel::TaskList;
        let effects = key(&mut app, KeyCode::Char('a'));
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::Workflow { action: WorkflowAction::Approve, issue_id }] if issue_id == "td-a"
        ));
        assert!(app.tui.panels.cursor(Panel::TaskList).selected_id.is_none());

        key(&mut app, KeyCode::Char('j'));
        assert!(key(&mut app, KeyCode::Char('a')).is_empty());
    }

    #[test]
    fn test_reopen_reports_status_and_failure() {
        let mut app = app();
        let effects = update(
            &mut app,
            UiEvent::WorkflowFinished {
                action: WorkflowAction::Reopen,
                issue_id: "td-9".into(),
                result: Ok(()),
            },
        );
        assert_eq!(app.tui.status.as_ref().unwrap().text, "REOPENED td-9");
        assert!(matches!(effects[0], UiEffect::ScheduleClearStatus { .. }));

        update(
            &mut app,
            UiEvent::WorkflowFinished {
                action: WorkflowAction::Close,
                issue_id: "td-9".into(),
                result: Err("locked".into()),
            },
        );
        assert_eq!(app.tui.status.as_ref().unwrap().text, "REOPENED td-9");

        update(
            &mut app,
            UiEvent::WorkflowFinished {
                action: WorkflowAction::Reopen,
                issue_id: "td-9".into(),
                result: Err("locked".into()),
            },
        );
        let status = app.tui.status.as_ref().unwrap();
        assert!(status.is_error);
    }

    #[test]
    fn test_delete_confirm_flow() {
        let mut app = app();
        refresh(&mut app, ready(&["td-1"]));
        app.tui.panels.active = Panel::TaskList;
        key(&mut app, KeyCode::Enter);
        key(&mut app, KeyCode::Char('d'));
        assert_eq!(app.context(), Context::Confirm);

        let effects = key(&mut app, KeyCode::Char('y'));
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::Workflow { action: WorkflowAction::Delete, issue_id }] if issue_id == "td-1"
        ));
        assert!(app.overlay.is_none());
        assert!(app.modals.is_open());

        update(
            &mut app,
            UiEvent::WorkflowFinished {
                action: WorkflowAction::Delete,
                issue_id: "td-1".into(),
                result: Ok(()),
            },
        );
        assert!(!app.modals.is_open());
    }

    #[test]
    fn test_double_click_opens_modal() {
        let mut app = app();
        refresh(&mut app, ready(&["td-0", "td-1", "td-2"]));
        let pane = app.tui.layout.pane(Panel::TaskList);
        // border, title, READY header, td-0, td-1
        let y = pane.y + 4;

        let effects = click(&mut app, MouseEventKind::Down(MouseButton::Left), 50, y);
        assert!(effects.is_empty());
        assert_eq!(app.tui.panels.active, Panel::TaskList);
        assert_eq!(app.tui.panels.cursor(Panel::TaskList).cursor, 1);

        let effects = click(&mut app, MouseEventKind::Down(MouseButton::Left), 50, y);
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::FetchIssueDetails { issue_id }] if issue_id == "td-1"
        ));
        let entry = app.modals.current().unwrap();
        assert_eq!(entry.source, Some(Panel::TaskList));
        assert!(entry.loading);
    }

    #[test]
    fn test_divider_drag_persists_on_release() {
        let mut app = AppState::new(TuiState::new(
            "sessY",
            PathBuf::from("."),
            MonitorOptions::default(),
            [0.33, 0.33, 0.34],
        ));
        update(&mut app, UiEvent::Frame { width: 100, height: 103 });
        assert_eq!(app.tui.layout.available, 100);
        let start = app.tui.layout.dividers[0].y + 1;

        click(&mut app, MouseEventKind::Down(MouseButton::Left), 10, start);
        click(&mut app, MouseEventKind::Drag(MouseButton::Left), 10, start + 10);
        let effects = click(&mut app, MouseEventKind::Up(MouseButton::Left), 10, start + 10);

        let [UiEffect::SetPaneHeights { heights }] = effects.as_slice() else {
            panic!("expected a persist effect");
        };
        assert!((heights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(heights.iter().all(|&h| h >= 0.1));
        assert!((heights[0] - heights[1] - 0.2).abs() < 1e-9);
        assert_eq!(app.tui.panels.pane_heights, *heights);
    }

    #[test]
    fn test_stale_refresh_is_dropped() {
        let mut app = app();
        let UiEffect::FetchData(old) = app.tui.fetch_effect() else {
            panic!("expected a fetch");
        };
        let UiEffect::FetchData(new) = app.tui.fetch_effect() else {
            panic!("expected a fetch");
        };
        update(
            &mut app,
            UiEvent::RefreshData {
                seq: new.seq,
                result: Ok(Box::new(ready(&["td-new"]))),
            },
        );
        assert!(!app.tui.fetch.in_flight);
        update(
            &mut app,
            UiEvent::RefreshData {
                seq: old.seq,
                result: Ok(Box::new(ready(&["td-old"]))),
            },
        );
        assert_eq!(app.tui.panels.task_rows[0].issue.id, "td-new");
        assert_eq!(update(&mut app, UiEvent::RefreshTick).len(), 1);
    }

    #[test]
    fn test_refresh_tick_skipped_while_in_flight() {
        let mut app = app();
        app.init();
        assert!(update(&mut app, UiEvent::RefreshTick).is_empty());
    }

    #[test]
    fn test_refresh_error_is_kept_until_manual_refresh() {
        let mut app = app();
        update(
            &mut app,
            UiEvent::RefreshData {
                seq: 0,
                result: Err("db gone".into()),
            },
        );
        assert_eq!(app.tui.err.as_deref(), Some("db gone"));
        let effects = key(&mut app, KeyCode::Char('R'));
        assert!(app.tui.err.is_none());
        assert!(matches!(effects.as_slice(), [UiEffect::FetchData(_)]));
    }

    #[test]
    fn test_changed_description_is_rendered_again() {
        fn details_with(text: &str) -> UiEvent {
            let mut issue = issue("td-1", Status::Open);
            issue.description = text.into();
            UiEvent::IssueDetails {
                issue_id: "td-1".into(),
                result: Ok(Box::new(IssueDetails {
                    issue: Some(issue),
                    ..IssueDetails::default()
                })),
            }
        }
        fn shown(app: &AppState) -> String {
            let entry = app.modals.current().unwrap();
            let width = usize::from(app.modal_geometry().width());
            content::build(entry, width)
                .lines
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n")
        }

        let mut app = app();
        let _ = app.modals.push("td-1", None);
        let effects = update(&mut app, details_with("OLD TEXT"));
        let [UiEffect::RenderMarkdown { width, .. }] = effects.as_slice() else {
            panic!("expected a markdown request");
        };
        let width = *width;
        update(
            &mut app,
            UiEvent::MarkdownRendered {
                issue_id: "td-1".into(),
                width,
                description: vec![Line::from("OLD TEXT")],
                acceptance: Vec::new(),
            },
        );
        assert!(shown(&app).contains("OLD TEXT"));

        let effects = update(&mut app, details_with("NEW TEXT"));
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::RenderMarkdown { description, .. }] if description == "NEW TEXT"
        ));
        let text = shown(&app);
        assert!(text.contains("NEW TEXT"));
        assert!(!text.contains("OLD TEXT"));

        // Same text again keeps the rendered markdown.
        update(
            &mut app,
            UiEvent::MarkdownRendered {
                issue_id: "td-1".into(),
                width,
                description: vec![Line::from("NEW TEXT")],
                acceptance: Vec::new(),
            },
        );
        assert!(update(&mut app, details_with("NEW TEXT")).is_empty());
        assert!(app.modals.current().unwrap().markdown.is_some());
    }

    #[test]
    fn test_stale_details_and_stats_are_ignored() {
        let mut app = app();
        let _ = app.modals.push("td-2", None);
        update(
            &mut app,
            UiEvent::IssueDetails {
                issue_id: "td-1".into(),
                result: Ok(Box::new(IssueDetails {
                    issue: Some(issue("td-1", Status::Open)),
                    ..IssueDetails::default()
                })),
            },
        );
        assert!(app.modals.current().unwrap().loading);

        update(&mut app, UiEvent::StatsData(Ok(ExtendedStats::default())));
        assert!(app.overlay.is_none());
    }

    #[test]
    fn test_search_typing_and_escape() {
        let mut app = app();
        key(&mut app, KeyCode::Char('/'));
        assert_eq!(app.context(), Context::Search);
        assert!(app.tui.layout.search.is_some());

        key(&mut app, KeyCode::Char('l'));
        key(&mut app, KeyCode::Char(' '));
        let effects = key(&mut app, KeyCode::Char('q'));
        assert_eq!(app.tui.search.query, "l q");
        assert!(matches!(effects.as_slice(), [UiEffect::FetchData(r)] if r.query == "l q"));

        key(&mut app, KeyCode::Char('?'));
        assert_eq!(app.context(), Context::Help);
        key(&mut app, KeyCode::Esc);
        assert_eq!(app.context(), Context::Search);

        key(&mut app, KeyCode::Enter);
        assert_eq!(app.context(), Context::Main);
        assert_eq!(app.tui.search.query, "l q");

        key(&mut app, KeyCode::Char('/'));
        key(&mut app, KeyCode::Esc);
        assert!(app.tui.search.query.is_empty());
        assert!(app.tui.layout.search.is_none());
    }

    #[test]
    fn test_toggle_closed_twice_requests_original_view() {
        let mut app = app();
        let fetched = |effects: Vec<UiEffect>| match effects.as_slice() {
            [UiEffect::FetchData(request)] => request.clone(),
            other => panic!("expected one fetch, got {other:?}"),
        };
        let before = app.tui.fetch_effect();
        let UiEffect::FetchData(before) = before else {
            panic!("expected a fetch");
        };

        let on = fetched(key(&mut app, KeyCode::Char('c')));
        assert!(on.include_closed);
        let off = fetched(key(&mut app, KeyCode::Char('c')));
        assert!(!off.include_closed);
        assert_eq!(
            (off.query, off.sort, off.session_id),
            (before.query, before.sort, before.session_id)
        );
    }

    #[test]
    fn test_type_filter_reports_status() {
        let mut app = app();
        let effects = key(&mut app, KeyCode::Char('t'));
        assert!(effects.iter().any(|e| matches!(e, UiEffect::FetchData(_))));
        assert!(effects.iter().any(|e| matches!(e, UiEffect::ScheduleClearStatus { .. })));
        assert!(app.tui.status.as_ref().unwrap().text.starts_with("Type filter"));
    }

    #[test]
    fn test_new_issue_over_epic_prefills_parent() {
        let mut app = app();
        let mut epic = issue("td-epic", Status::Open);
        epic.issue_type = td_types::IssueType::Epic;
        let _ = app.modals.push("td-epic", None);
        update(
            &mut app,
            UiEvent::IssueDetails {
                issue_id: "td-epic".into(),
                result: Ok(Box::new(IssueDetails {
                    issue: Some(epic),
                    ..IssueDetails::default()
                })),
            },
        );
        key(&mut app, KeyCode::Char('n'));
        let Some(Overlay::Form(form)) = &app.overlay else {
            panic!("expected the form");
        };
        assert_eq!(form.values.parent, "td-epic");
    }

    #[test]
    fn test_form_submit_error_keeps_form_open() {
        let mut app = app();
        app.overlay = Some(Overlay::Form(Box::new(FormState::create(None))));
        update(
            &mut app,
            UiEvent::FormSubmitted {
                editing: false,
                result: Err("disk full".into()),
            },
        );
        let Some(Overlay::Form(form)) = &app.overlay else {
            panic!("expected the form");
        };
        assert_eq!(form.submit_error.as_deref(), Some("disk full"));

        let effects = update(
            &mut app,
            UiEvent::FormSubmitted {
                editing: false,
                result: Ok("td-new".into()),
            },
        );
        assert!(app.overlay.is_none());
        assert!(effects.iter().any(|e| matches!(e, UiEffect::FetchData(_))));
    }

    #[test]
    fn test_handoffs_enter_opens_modal() {
        let mut app = app();
        let effects = key(&mut app, KeyCode::Char('H'));
        assert!(matches!(effects.as_slice(), [UiEffect::FetchHandoffs]));
        update(
            &mut app,
            UiEvent::HandoffsData(Ok(vec![td_types::Handoff {
                id: 1,
                issue_id: "td-7".into(),
                session_id: "sessX".into(),
                done: vec![],
                remaining: vec![],
                decisions: vec![],
                uncertain: vec![],
                timestamp: Utc::now(),
            }])),
        );
        let effects = key(&mut app, KeyCode::Enter);
        assert!(app.overlay.is_none());
        assert_eq!(app.modals.current().unwrap().issue_id, "td-7");
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_quit_from_main_and_modal() {
        let mut app = app();
        assert!(matches!(key(&mut app, KeyCode::Char('q')).as_slice(), [UiEffect::Quit]));
        let _ = app.modals.push("td-1", None);
        assert!(key(&mut app, KeyCode::Char('q')).is_empty());
        assert!(!app.modals.is_open());
    }

    #[test]
    fn test_resize_reclamps_cursor() {
        let mut app = app();
        let ids: Vec<String> = (0..60).map(|i| format!("td-{i}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        refresh(&mut app, ready(&refs));
        app.tui.panels.active = Panel::TaskList;
        key(&mut app, KeyCode::Char('G'));

        for (width, height) in [(40, 12), (100, 40), (3, 3), (200, 80)] {
            update(&mut app, UiEvent::Frame { width, height });
            let state = app.tui.panels.cursor(Panel::TaskList);
            assert_eq!(state.cursor, 59);
            assert!(state.offset <= state.cursor);
        }
    }

    #[test]
    fn test_arbitrary_events_never_panic() {
        let mut app = app();
        let codes = [
            KeyCode::Char('j'),
            KeyCode::Char('k'),
            KeyCode::Enter,
            KeyCode::Esc,
            KeyCode::Tab,
            KeyCode::Char('G'),
            KeyCode::Char('l'),
            KeyCode::Char('h'),
            KeyCode::Char('S'),
            KeyCode::Char('?'),
            KeyCode::Char('/'),
            KeyCode::Backspace,
        ];
        refresh(&mut app, ready(&["td-1", "td-2"]));
        for round in 0..4 {
            for code in codes {
                key(&mut app, code);
                click(&mut app, MouseEventKind::ScrollDown, 10, 10 + round);
            }
            update(&mut app, UiEvent::Frame { width: 20 + round, height: 5 + round });
        }
    }
}
