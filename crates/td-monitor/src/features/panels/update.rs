//! Keyboard navigation and mouse handling for the three panels.

use std::time::{Duration, Instant};

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use super::layout::{self, MainLayout};
use super::{DividerDrag, LastClick, Panel, PanelsState, scroll};
use crate::keymap::Command;

/// Two clicks on the same row within this window open the issue.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);

/// Rows moved per wheel notch.
const WHEEL_STEP: isize = 3;

/// Applies a cursor or focus command. Returns false for commands that are
/// not panel navigation.
pub fn handle_navigation(panels: &mut PanelsState, layout: &MainLayout, command: Command) -> bool {
    let panel = panels.active;
    let vh = layout.visible_height(panel);
    let half = isize::try_from(vh / 2).unwrap_or(isize::MAX).max(1);
    match command {
        Command::Down => panels.move_cursor(panel, 1, vh),
        Command::Up => panels.move_cursor(panel, -1, vh),
        Command::HalfPageDown => panels.move_cursor(panel, half, vh),
        Command::HalfPageUp => panels.move_cursor(panel, -half, vh),
        Command::Top => {
            if panels.row_count(panel) > 0 {
                panels.set_cursor(panel, 0, vh);
            }
        }
        Command::Bottom => {
            let count = panels.row_count(panel);
            if count > 0 {
                panels.set_cursor(panel, count - 1, vh);
            }
        }
        Command::NextPanel => panels.active = panel.next(),
        Command::PrevPanel => panels.active = panel.prev(),
        Command::FocusPanel(target) => panels.active = target,
        _ => return false,
    }
    true
}

/// Row under screen line `y` of `panel`, accounting for the border, the
/// title line, the `▲` line and sub-headers.
pub fn hit_test_row(panels: &PanelsState, layout: &MainLayout, panel: Panel, y: u16) -> Option<usize> {
    let pane = layout.pane(panel);
    let top = pane.y + 2;
    if y < top || y >= pane.y + pane.height.saturating_sub(1) {
        return None;
    }
    let offset = panels.cursor(panel).offset;
    let mut line = usize::from(y - top);
    if offset > 0 {
        line = line.checked_sub(1)?;
    }
    scroll::row_at_line(&panels.groups(panel), offset, line, layout.visible_height(panel))
}

/// Result of a mouse event the reducer must act on.
#[derive(Debug, Clone, PartialEq)]
pub enum MouseOutcome {
    None,
    /// Double-click on a row showing an issue.
    OpenIssue { panel: Panel, issue_id: String },
    /// Pane heights changed during a drag.
    Resized,
    /// Drag released; heights should be persisted.
    DragFinished([f64; 3]),
}

pub fn handle_mouse(
    panels: &mut PanelsState,
    layout: &MainLayout,
    event: MouseEvent,
    now: Instant,
) -> MouseOutcome {
    let (x, y) = (event.column, event.row);
    match event.kind {
        MouseEventKind::ScrollDown | MouseEventKind::ScrollUp => {
            if let Some(panel) = layout.hit_test_panel(x, y) {
                let delta = if event.kind == MouseEventKind::ScrollDown {
                    WHEEL_STEP
                } else {
                    -WHEEL_STEP
                };
                panels.scroll_by(panel, delta, layout.visible_height(panel));
            }
            MouseOutcome::None
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(divider) = layout.hit_test_divider(x, y) {
                panels.drag = Some(DividerDrag {
                    divider,
                    start_y: y,
                    start_heights: panels.pane_heights,
                });
                panels.last_click = None;
                return MouseOutcome::None;
            }
            let Some(panel) = layout.hit_test_panel(x, y) else {
                return MouseOutcome::None;
            };
            panels.active = panel;
            let Some(row) = hit_test_row(panels, layout, panel, y) else {
                panels.last_click = None;
                return MouseOutcome::None;
            };
            panels.set_cursor(panel, row, layout.visible_height(panel));

            let is_double = panels.last_click.is_some_and(|last| {
                last.panel == panel
                    && last.row == row
                    && now.saturating_duration_since(last.at) <= DOUBLE_CLICK_WINDOW
            });
            if is_double {
                panels.last_click = None;
                if let Some(issue_id) = panels.issue_id_at(panel, row) {
                    return MouseOutcome::OpenIssue { panel, issue_id };
                }
                return MouseOutcome::None;
            }
            panels.last_click = Some(LastClick { panel, row, at: now });
            MouseOutcome::None
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            let Some(drag) = panels.drag else {
                return MouseOutcome::None;
            };
            if layout.available == 0 {
                return MouseOutcome::None;
            }
            let delta = (f64::from(y) - f64::from(drag.start_y)) / f64::from(layout.available);
            panels.pane_heights = layout::drag_heights(drag.start_heights, drag.divider, delta);
            MouseOutcome::Resized
        }
        MouseEventKind::Up(MouseButton::Left) => match panels.drag.take() {
            Some(_) => MouseOutcome::DragFinished(panels.pane_heights),
            None => MouseOutcome::None,
        },
        _ => MouseOutcome::None,
    }
}
