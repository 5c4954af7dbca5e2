//! Modal key handling: scrolling, sub-focus and prev/next navigation.

use super::{ModalEntry, ModalGeometry, ModalStack, content};
use crate::effects::UiEffect;
use crate::features::panels::{MainLayout, PanelsState};
use crate::keymap::{Command, Context};

/// What modal handling may touch besides the stack.
pub struct ModalContext<'a> {
    pub panels: &'a mut PanelsState,
    pub layout: &'a MainLayout,
    pub geometry: ModalGeometry,
}

/// Applies a navigation command in one of the modal contexts.
pub fn handle_command(
    modals: &mut ModalStack,
    ctx: &mut ModalContext<'_>,
    context: Context,
    command: Command,
) -> Vec<UiEffect> {
    let vh = ctx.geometry.visible_height();
    let depth = modals.depth();
    let Some(entry) = modals.current_mut() else {
        return vec![];
    };

    match (context, command) {
        (Context::ParentEpicFocused, Command::Select) => {
            let Some(parent) = entry.details.parent_epic.as_ref().map(|p| p.id.clone()) else {
                return vec![];
            };
            entry.parent_focused = false;
            vec![modals.push(parent, None)]
        }
        (Context::ParentEpicFocused, Command::Down) => {
            entry.parent_focused = false;
            entry.scroll_by(1, vh);
            vec![]
        }
        (Context::ParentEpicFocused, Command::Back) => {
            entry.parent_focused = false;
            vec![]
        }

        (Context::EpicTasks, Command::Down) => {
            if entry.epic_cursor + 1 < entry.task_count() {
                entry.epic_cursor += 1;
                reveal_task(entry, ctx.geometry);
            } else {
                entry.tasks_focused = false;
            }
            vec![]
        }
        (Context::EpicTasks, Command::Up) => {
            entry.epic_cursor = entry.epic_cursor.saturating_sub(1);
            reveal_task(entry, ctx.geometry);
            vec![]
        }
        (Context::EpicTasks, Command::Select) => {
            let Some(task) = entry.details.epic_tasks.get(entry.epic_cursor) else {
                return vec![];
            };
            let id = task.id.clone();
            vec![modals.push(id, None)]
        }
        (Context::EpicTasks, Command::Back) => {
            entry.tasks_focused = false;
            vec![]
        }

        (Context::Modal, Command::Back) => {
            modals.pop();
            vec![]
        }
        (Context::Modal, Command::Down) => {
            if entry.scroll == 0 && entry.has_parent_row() && !entry.parent_focused {
                entry.parent_focused = true;
            } else {
                entry.scroll_by(1, vh);
            }
            vec![]
        }
        (Context::Modal, Command::Up) => {
            entry.scroll_by(-1, vh);
            vec![]
        }
        (Context::Modal, Command::HalfPageDown) => {
            entry.scroll_by(half(vh), vh);
            vec![]
        }
        (Context::Modal, Command::HalfPageUp) => {
            entry.scroll_by(-half(vh), vh);
            vec![]
        }
        (Context::Modal, Command::Top) => {
            entry.scroll = 0;
            vec![]
        }
        (Context::Modal, Command::Bottom) => {
            entry.scroll = entry.max_scroll(vh);
            vec![]
        }
        (Context::Modal, Command::PrevIssue | Command::NextIssue) if depth == 1 => {
            navigate(modals, ctx, command == Command::NextIssue)
        }
        _ => vec![],
    }
}

fn half(visible_height: usize) -> isize {
    isize::try_from(visible_height / 2).unwrap_or(isize::MAX).max(1)
}

/// Scrolls so the focused epic task row is on screen.
pub fn reveal_task(entry: &mut ModalEntry, geometry: ModalGeometry) {
    let vh = geometry.visible_height();
    let built = content::build(entry, usize::from(geometry.width()));
    let Some(&line) = built.task_lines.get(entry.epic_cursor) else {
        return;
    };
    if line < entry.scroll {
        entry.scroll = line;
    } else if line >= entry.scroll + vh {
        entry.scroll = line + 1 - vh;
    }
    entry.content_lines = built.lines.len();
    entry.clamp_scroll(vh);
}

/// Replaces the base modal with the previous/next issue of its source
/// panel and moves that panel's cursor along.
fn navigate(modals: &mut ModalStack, ctx: &mut ModalContext<'_>, forward: bool) -> Vec<UiEffect> {
    let Some(entry) = modals.current() else {
        return vec![];
    };
    let Some(panel) = entry.source else {
        return vec![];
    };
    let panels = &mut *ctx.panels;
    let count = panels.row_count(panel);
    let shows = |row: usize| panels.issue_id_at(panel, row).as_deref() == Some(entry.issue_id.as_str());

    let cursor = panels.cursor(panel).cursor;
    let Some(row) = (if shows(cursor) {
        Some(cursor)
    } else {
        (0..count).find(|&r| shows(r))
    }) else {
        return vec![];
    };

    let has_issue = |r: &usize| panels.issue_id_at(panel, *r).is_some();
    let target = if forward {
        (row + 1..count).find(has_issue)
    } else {
        (0..row).rev().find(has_issue)
    };
    let Some(target) = target else {
        return vec![];
    };
    let Some(issue_id) = panels.issue_id_at(panel, target) else {
        return vec![];
    };

    panels.active = panel;
    panels.set_cursor(panel, target, ctx.layout.visible_height(panel));
    modals.replace_top(issue_id).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use ratatui::layout::Rect;
    use td_types::{Issue, IssueType};

    use super::*;
    use crate::features::panels::Panel;
    use crate::snapshot::{IssueDetails, RefreshData, TaskListData};

    fn panels_with(ids: &[&str]) -> PanelsState {
        let mut panels = PanelsState::new([0.3, 0.4, 0.3]);
        let data = RefreshData {
            task_list: TaskListData {
                ready: ids.iter().map(|id| Issue::new(*id, *id, Utc::now())).collect(),
                ..TaskListData::default()
            },
            ..RefreshData::default()
        };
        panels.apply_refresh(&data, [10, 10, 10]);
        panels
    }

    fn screen() -> Rect {
        Rect::new(0, 0, 100, 40)
    }

    fn run(
        modals: &mut ModalStack,
        panels: &mut PanelsState,
        context: Context,
        command: Command,
    ) -> Vec<UiEffect> {
        let layout = MainLayout::compute(screen(), panels.pane_heights, false, true);
        let mut ctx = ModalContext {
            panels,
            layout: &layout,
            geometry: ModalGeometry::new(screen()),
        };
        handle_command(modals, &mut ctx, context, command)
    }

    #[test]
    fn test_horizontal_navigation_follows_source_panel() {
        let mut panels = panels_with(&["td-1", "td-2", "td-3"]);
        panels.set_cursor(Panel::TaskList, 1, 10);
        let mut modals = ModalStack::default();
        modals.push("td-2", Some(Panel::TaskList));
        modals.current_mut().unwrap().scroll = 4;

        let effects = run(&mut modals, &mut panels, Context::Modal, Command::NextIssue);
        let top = modals.current().unwrap();
        assert_eq!(top.issue_id, "td-3");
        assert_eq!(top.scroll, 0);
        assert!(top.loading);
        assert_eq!(panels.cursor(Panel::TaskList).cursor, 2);
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::FetchIssueDetails { issue_id }] if issue_id == "td-3"
        ));

        let effects = run(&mut modals, &mut panels, Context::Modal, Command::NextIssue);
        assert!(effects.is_empty());
        assert_eq!(modals.current().unwrap().issue_id, "td-3");
        assert_eq!(modals.depth(), 1);
    }

    #[test]
    fn test_no_navigation_above_depth_one() {
        let mut panels = panels_with(&["td-1", "td-2"]);
        let mut modals = ModalStack::default();
        modals.push("td-1", Some(Panel::TaskList));
        modals.push("td-9", None);
        let effects = run(&mut modals, &mut panels, Context::Modal, Command::NextIssue);
        assert!(effects.is_empty());
        assert_eq!(modals.current().unwrap().issue_id, "td-9");
    }

    #[test]
    fn test_first_down_focuses_parent_row() {
        let mut panels = panels_with(&[]);
        let mut modals = ModalStack::default();
        modals.push("td-1", None);
        modals.current_mut().unwrap().apply_details(Ok(Box::new(IssueDetails {
            issue: Some(Issue::new("td-1", "child", Utc::now())),
            parent_epic: Some(Issue::new("td-epic", "epic", Utc::now())),
            ..IssueDetails::default()
        })));

        run(&mut modals, &mut panels, Context::Modal, Command::Down);
        assert!(modals.current().unwrap().parent_focused);

        let effects = run(&mut modals, &mut panels, Context::ParentEpicFocused, Command::Select);
        assert_eq!(modals.depth(), 2);
        assert_eq!(modals.current().unwrap().issue_id, "td-epic");
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_last_task_down_returns_to_scrolling() {
        let mut epic = Issue::new("td-epic", "epic", Utc::now());
        epic.issue_type = IssueType::Epic;
        let mut panels = panels_with(&[]);
        let mut modals = ModalStack::default();
        modals.push("td-epic", None);
        modals.current_mut().unwrap().apply_details(Ok(Box::new(IssueDetails {
            issue: Some(epic),
            epic_tasks: vec![
                Issue::new("td-a", "a", Utc::now()),
                Issue::new("td-b", "b", Utc::now()),
            ],
            ..IssueDetails::default()
        })));
        assert!(modals.current().unwrap().tasks_focused);

        run(&mut modals, &mut panels, Context::EpicTasks, Command::Down);
        assert_eq!(modals.current().unwrap().epic_cursor, 1);
        run(&mut modals, &mut panels, Context::EpicTasks, Command::Down);
        assert!(!modals.current().unwrap().tasks_focused);

        modals.current_mut().unwrap().tasks_focused = true;
        let effects = run(&mut modals, &mut panels, Context::EpicTasks, Command::Select);
        assert_eq!(modals.current().unwrap().issue_id, "td-b");
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut panels = panels_with(&[]);
        let mut modals = ModalStack::default();
        modals.push("td-1", None);
        let entry = modals.current_mut().unwrap();
        entry.content_lines = 3;
        run(&mut modals, &mut panels, Context::Modal, Command::Bottom);
        assert_eq!(modals.current().unwrap().scroll, 0);
        run(&mut modals, &mut panels, Context::Modal, Command::HalfPageDown);
        assert_eq!(modals.current().unwrap().scroll, 0);
    }
}
