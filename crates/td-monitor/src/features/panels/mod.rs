//! The three stacked panels of the main view.
//!
//! - `layout.rs`: geometry, hit-testing, divider drag math
//! - `scroll.rs`: header-aware scroll/selection engine
//! - `update.rs`: keyboard and mouse handling
//! - `render.rs`: panel drawing

pub mod layout;
pub mod render;
pub mod scroll;
pub mod update;

use std::time::Instant;

pub use layout::MainLayout;
use scroll::Group;
use td_types::Issue;

use crate::snapshot::{ActivityItem, CurrentWorkRow, RefreshData, TaskListRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    CurrentWork,
    TaskList,
    Activity,
}

impl Panel {
    pub const ALL: [Panel; 3] = [Panel::CurrentWork, Panel::TaskList, Panel::Activity];

    pub fn index(self) -> usize {
        match self {
            Panel::CurrentWork => 0,
            Panel::TaskList => 1,
            Panel::Activity => 2,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Panel::CurrentWork => "Current Work",
            Panel::TaskList => "Tasks",
            Panel::Activity => "Activity",
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % 3]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + 2) % 3]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelCursor {
    pub cursor: usize,
    pub offset: usize,
    /// Entity under the cursor, used to find the row again after a refresh.
    pub selected_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DividerDrag {
    pub divider: usize,
    pub start_y: u16,
    pub start_heights: [f64; 3],
}

#[derive(Debug, Clone, Copy)]
pub struct LastClick {
    pub panel: Panel,
    pub row: usize,
    pub at: Instant,
}

#[derive(Debug, Clone)]
pub struct PanelsState {
    pub active: Panel,
    pub cursors: [PanelCursor; 3],
    pub current_work: Vec<CurrentWorkRow>,
    pub task_rows: Vec<TaskListRow>,
    pub activity: Vec<ActivityItem>,
    pub pane_heights: [f64; 3],
    pub drag: Option<DividerDrag>,
    pub last_click: Option<LastClick>,
}

impl PanelsState {
    pub fn new(pane_heights: [f64; 3]) -> Self {
        Self {
            active: Panel::CurrentWork,
            cursors: Default::default(),
            current_work: Vec::new(),
            task_rows: Vec::new(),
            activity: Vec::new(),
            pane_heights,
            drag: None,
            last_click: None,
        }
    }

    pub fn cursor(&self, panel: Panel) -> &PanelCursor {
        &self.cursors[panel.index()]
    }

    fn cursor_mut(&mut self, panel: Panel) -> &mut PanelCursor {
        &mut self.cursors[panel.index()]
    }

    pub fn row_count(&self, panel: Panel) -> usize {
        match panel {
            Panel::CurrentWork => self.current_work.len(),
            Panel::TaskList => self.task_rows.len(),
            Panel::Activity => self.activity.len(),
        }
    }

    /// Sub-header label of every row.
    pub fn groups(&self, panel: Panel) -> Vec<Group> {
        match panel {
            Panel::CurrentWork => self
                .current_work
                .iter()
                .map(|r| Some(if r.focused { "FOCUSED" } else { "IN PROGRESS" }))
                .collect(),
            Panel::TaskList => self
                .task_rows
                .iter()
                .map(|r| Some(r.category.label()))
                .collect(),
            Panel::Activity => vec![None; self.activity.len()],
        }
    }

    /// Stable identity of a row.
    fn row_key(&self, panel: Panel, row: usize) -> Option<String> {
        match panel {
            Panel::CurrentWork => self.current_work.get(row).map(|r| r.issue.id.clone()),
            Panel::TaskList => self.task_rows.get(row).map(|r| r.issue.id.clone()),
            Panel::Activity => self.activity.get(row).map(|a| a.key.clone()),
        }
    }

    /// Issue shown by a row, if any.
    pub fn issue_id_at(&self, panel: Panel, row: usize) -> Option<String> {
        match panel {
            Panel::Activity => self.activity.get(row).and_then(|a| a.issue_id.clone()),
            _ => self.row_key(panel, row),
        }
    }

    pub fn issue_at(&self, panel: Panel, row: usize) -> Option<&Issue> {
        match panel {
            Panel::CurrentWork => self.current_work.get(row).map(|r| &r.issue),
            Panel::TaskList => self.task_rows.get(row).map(|r| &r.issue),
            Panel::Activity => None,
        }
    }

    pub fn selected_issue_id(&self, panel: Panel) -> Option<String> {
        self.issue_id_at(panel, self.cursor(panel).cursor)
    }

    /// Places the cursor on `row` (clamped) and scrolls it into view.
    pub fn set_cursor(&mut self, panel: Panel, row: usize, visible_height: usize) {
        let count = self.row_count(panel);
        let groups = self.groups(panel);
        let key = if count == 0 {
            None
        } else {
            self.row_key(panel, row.min(count - 1))
        };
        let state = self.cursor_mut(panel);
        if count == 0 {
            *state = PanelCursor::default();
            return;
        }
        state.cursor = row.min(count - 1);
        state.offset = scroll::ensure_visible(&groups, state.cursor, state.offset, visible_height);
        state.selected_id = key;
    }

    /// Moves the cursor by `delta` rows. Past either edge it stops; an empty
    /// panel is left untouched.
    pub fn move_cursor(&mut self, panel: Panel, delta: isize, visible_height: usize) {
        let count = self.row_count(panel);
        if count == 0 {
            return;
        }
        let current = self.cursor(panel).cursor;
        let target = current.saturating_add_signed(delta).min(count - 1);
        self.set_cursor(panel, target, visible_height);
    }

    /// Scrolls the viewport (mouse wheel) and pulls the cursor into view.
    pub fn scroll_by(&mut self, panel: Panel, delta: isize, visible_height: usize) {
        let groups = self.groups(panel);
        if groups.is_empty() {
            return;
        }
        let max = scroll::max_offset(&groups, visible_height);
        let offset = self.cursor(panel).offset.saturating_add_signed(delta).min(max);
        let lines = scroll::layout_lines(&groups, offset, scroll::capacity(offset, visible_height));
        let visible: Vec<usize> = lines
            .iter()
            .filter_map(|l| match l {
                scroll::PanelLine::Row(r) => Some(*r),
                _ => None,
            })
            .collect();
        let cursor = self.cursor(panel).cursor;
        let cursor = match (visible.first(), visible.last()) {
            (Some(&first), _) if cursor < first => first,
            (_, Some(&last)) if cursor > last => last,
            _ => cursor,
        };
        let key = self.row_key(panel, cursor);
        let state = self.cursor_mut(panel);
        state.offset = offset;
        state.cursor = cursor;
        state.selected_id = key;
    }

    /// Replaces all rows from a refresh, restoring cursors by entity ID.
    pub fn apply_refresh(&mut self, data: &RefreshData, visible_heights: [usize; 3]) {
        self.current_work = data.current_work_rows();
        self.task_rows = data.task_list.rows();
        self.activity = data.activity.clone();

        for panel in Panel::ALL {
            let saved = self.cursor(panel).selected_id.clone();
            let count = self.row_count(panel);
            let restored = saved.and_then(|id| {
                (0..count).find(|&row| self.row_key(panel, row).as_deref() == Some(id.as_str()))
            });
            let row = restored.unwrap_or(self.cursor(panel).cursor);
            self.set_cursor(panel, row, visible_heights[panel.index()]);
        }
    }

    /// Re-clamps every panel after a resize.
    pub fn reclamp(&mut self, visible_heights: [usize; 3]) {
        for panel in Panel::ALL {
            let groups = self.groups(panel);
            let vh = visible_heights[panel.index()];
            let state = self.cursor_mut(panel);
            state.offset = scroll::clamp_offset(&groups, state.offset, vh);
            if !groups.is_empty() {
                state.cursor = state.cursor.min(groups.len() - 1);
                state.offset = scroll::ensure_visible(&groups, state.cursor, state.offset, vh);
            }
        }
    }

    /// Forgets the selected entity so the next refresh keeps the index.
    pub fn clear_selected_id(&mut self, panel: Panel) {
        self.cursor_mut(panel).selected_id = None;
    }
}
