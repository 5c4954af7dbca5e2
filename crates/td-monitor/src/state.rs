//! Application state.
//!
//! `AppState` is split into the main view state (`TuiState`), the issue
//! modal stack and the single open overlay, so overlay handlers can borrow
//! the rest of the state while mutating themselves.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ratatui::layout::Rect;

use crate::effects::{FetchRequest, UiEffect};
use crate::features::modal::{ModalGeometry, ModalStack};
use crate::features::panels::{MainLayout, Panel, PanelsState};
use crate::features::search::SearchState;
use crate::keymap::{Context, Keymap};
use crate::overlays::Overlay;

/// How long a status toast stays up.
pub const STATUS_DURATION: Duration = Duration::from_secs(2);

/// Runtime options chosen by the embedding program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorOptions {
    pub refresh_interval: Duration,
    /// Version shown in the footer.
    pub version: String,
    /// Embedded monitors have no footer.
    pub embedded: bool,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(2),
            version: env!("CARGO_PKG_VERSION").to_string(),
            embedded: false,
        }
    }
}

/// Transient message in the footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub generation: u64,
}

/// Sequencing of panel refreshes. Results older than the last applied one
/// are dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchTracker {
    pub next_seq: u64,
    pub applied_seq: u64,
    pub in_flight: bool,
}

#[derive(Debug)]
pub struct TuiState {
    pub should_quit: bool,
    pub session_id: String,
    pub base_dir: PathBuf,
    pub options: MonitorOptions,
    pub started_at: DateTime<Utc>,
    pub width: u16,
    pub height: u16,
    pub layout: MainLayout,
    pub panels: PanelsState,
    pub search: SearchState,
    pub include_closed: bool,
    pub status: Option<StatusMessage>,
    status_generation: u64,
    /// Last refresh failure.
    pub err: Option<String>,
    pub fetch: FetchTracker,
    pub last_refresh: Option<DateTime<Utc>>,
    pub active_sessions: Vec<String>,
    pub recent_handoffs: usize,
    pub update_available: Option<String>,
    pub keymap: Keymap,
}

impl TuiState {
    pub fn new(
        session_id: impl Into<String>,
        base_dir: PathBuf,
        options: MonitorOptions,
        pane_heights: [f64; 3],
    ) -> Self {
        let mut state = Self {
            should_quit: false,
            session_id: session_id.into(),
            base_dir,
            options,
            started_at: Utc::now(),
            width: 80,
            height: 24,
            layout: MainLayout::default(),
            panels: PanelsState::new(pane_heights),
            search: SearchState::default(),
            include_closed: false,
            status: None,
            status_generation: 0,
            err: None,
            fetch: FetchTracker::default(),
            last_refresh: None,
            active_sessions: Vec::new(),
            recent_handoffs: 0,
            update_available: None,
            keymap: Keymap::default(),
        };
        state.relayout();
        state
    }

    pub fn screen(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Recomputes the main layout from size, pane heights and bar visibility.
    pub fn relayout(&mut self) {
        self.layout = MainLayout::compute(
            self.screen(),
            self.panels.pane_heights,
            self.search.bar_visible(),
            !self.options.embedded,
        );
    }

    pub fn visible_height(&self, panel: Panel) -> usize {
        self.layout.visible_height(panel)
    }

    pub fn visible_heights(&self) -> [usize; 3] {
        Panel::ALL.map(|p| self.visible_height(p))
    }

    /// Starts a new panel refresh.
    pub fn fetch_effect(&mut self) -> UiEffect {
        self.fetch.next_seq += 1;
        self.fetch.in_flight = true;
        UiEffect::FetchData(FetchRequest {
            seq: self.fetch.next_seq,
            query: self.search.query.clone(),
            sort: self.search.sort,
            include_closed: self.include_closed,
            session_id: self.session_id.clone(),
            handoffs_since: self.started_at,
        })
    }

    /// Shows a toast and schedules its removal.
    pub fn set_status(&mut self, text: impl Into<String>, is_error: bool) -> UiEffect {
        self.status_generation += 1;
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error,
            generation: self.status_generation,
        });
        UiEffect::ScheduleClearStatus {
            generation: self.status_generation,
            after: STATUS_DURATION,
        }
    }

    /// Clears the toast unless a newer one replaced it.
    pub fn clear_status(&mut self, generation: u64) {
        if self
            .status
            .as_ref()
            .is_some_and(|s| s.generation == generation)
        {
            self.status = None;
        }
    }
}

#[derive(Debug)]
pub struct AppState {
    pub tui: TuiState,
    pub modals: ModalStack,
    pub overlay: Option<Overlay>,
}

impl AppState {
    pub fn new(tui: TuiState) -> Self {
        Self {
            tui,
            modals: ModalStack::default(),
            overlay: None,
        }
    }

    /// Effects to run before the first frame.
    pub fn init(&mut self) -> Vec<UiEffect> {
        vec![self.tui.fetch_effect()]
    }

    /// Context that selects the active key bindings.
    pub fn context(&self) -> Context {
        if let Some(overlay) = &self.overlay {
            return overlay.context();
        }
        if let Some(entry) = self.modals.current() {
            return if entry.parent_focused {
                Context::ParentEpicFocused
            } else if entry.tasks_focused {
                Context::EpicTasks
            } else {
                Context::Modal
            };
        }
        if self.tui.search.editing {
            Context::Search
        } else {
            Context::Main
        }
    }

    pub fn modal_geometry(&self) -> ModalGeometry {
        ModalGeometry::new(self.tui.screen())
    }
}
