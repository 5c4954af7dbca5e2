//! Overlays drawn on top of the main view and the issue modal.
//!
//! Each overlay owns its state, key handler and render function. Only one
//! is open at a time; it takes keyboard input until it closes.
//!
//! - `confirm.rs`: delete confirmation
//! - `handoffs.rs`: recent handoffs list
//! - `stats.rs`: database statistics
//! - `help.rs`: keymap and query-language help
//! - `render_utils.rs`: shared popup drawing

pub mod confirm;
pub mod handoffs;
pub mod help;
pub mod render_utils;
pub mod stats;

pub use confirm::ConfirmState;
use crossterm::event::KeyEvent;
pub use handoffs::HandoffsState;
pub use help::HelpState;
use ratatui::Frame;
use ratatui::layout::Rect;
pub use stats::StatsState;

use crate::effects::UiEffect;
use crate::features::form::FormState;
use crate::keymap::{Command, Context};
use crate::state::TuiState;

/// Transition returned by overlay key handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayTransition {
    Stay,
    Close,
    /// Close and open the issue modal on this ID.
    OpenIssue(String),
}

/// Update returned by overlay key handlers.
#[derive(Debug)]
pub struct OverlayUpdate {
    pub transition: OverlayTransition,
    pub effects: Vec<UiEffect>,
}

impl OverlayUpdate {
    fn new(transition: OverlayTransition) -> Self {
        Self {
            transition,
            effects: Vec::new(),
        }
    }

    pub fn stay() -> Self {
        Self::new(OverlayTransition::Stay)
    }

    pub fn close() -> Self {
        Self::new(OverlayTransition::Close)
    }

    pub fn open_issue(issue_id: impl Into<String>) -> Self {
        Self::new(OverlayTransition::OpenIssue(issue_id.into()))
    }

    #[must_use]
    pub fn with_ui_effects(mut self, effects: Vec<UiEffect>) -> Self {
        self.effects = effects;
        self
    }
}

#[derive(Debug)]
pub enum Overlay {
    Confirm(ConfirmState),
    Form(Box<FormState>),
    Handoffs(HandoffsState),
    Stats(StatsState),
    Help(HelpState),
}

impl Overlay {
    /// Key context while this overlay is open.
    pub fn context(&self) -> Context {
        match self {
            Overlay::Confirm(_) => Context::Confirm,
            Overlay::Form(_) => Context::Form,
            Overlay::Handoffs(_) => Context::Handoffs,
            Overlay::Stats(_) => Context::Stats,
            Overlay::Help(_) => Context::Help,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        match self {
            Overlay::Confirm(c) => c.render(frame, area),
            Overlay::Form(f) => f.render(frame, area),
            Overlay::Handoffs(h) => h.render(frame, area),
            Overlay::Stats(s) => s.render(frame, area),
            Overlay::Help(h) => h.render(frame, area),
        }
    }

    pub fn handle_key(
        &mut self,
        tui: &TuiState,
        command: Option<Command>,
        key: KeyEvent,
    ) -> OverlayUpdate {
        let screen = tui.screen();
        match self {
            Overlay::Confirm(c) => c.handle_command(command),
            Overlay::Form(f) => f.handle_key(command, key),
            Overlay::Handoffs(h) => h.handle_command(screen, command),
            Overlay::Stats(s) => s.handle_command(screen, command),
            Overlay::Help(h) => h.handle_command(screen, command),
        }
    }

    pub fn as_form_mut(&mut self) -> Option<&mut FormState> {
        match self {
            Overlay::Form(f) => Some(f.as_mut()),
            _ => None,
        }
    }
}

/// Moves a scroll offset by `delta` within `[0, max]`.
pub(crate) fn step_scroll(scroll: &mut usize, delta: isize, total: usize, visible: usize) {
    let max = total.saturating_sub(visible);
    *scroll = scroll.saturating_add_signed(delta).min(max);
}
