use chrono::{DateTime, Utc};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use td_types::Issue;

use super::layout::MainLayout;
use super::scroll::{self, PanelLine};
use super::{Panel, PanelsState};
use crate::common::format::{dim, header_style, priority_span, relative_time, selected_style, status_span, type_icon};
use crate::common::text::first_line;
use crate::common::{pad_to_width, sanitize_for_display, truncate_with_ellipsis};
use crate::snapshot::{ActivityItem, ActivityKind};

pub fn render_panels(frame: &mut Frame, panels: &PanelsState, layout: &MainLayout, now: DateTime<Utc>) {
    for panel in Panel::ALL {
        render_panel(frame, panels, layout, panel, now);
    }
}

fn render_panel(
    frame: &mut Frame,
    panels: &PanelsState,
    layout: &MainLayout,
    panel: Panel,
    now: DateTime<Utc>,
) {
    let area = layout.pane(panel);
    if area.height < 3 || area.width < 4 {
        return;
    }
    let active = panels.active == panel;
    let border = if active { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let count = panels.row_count(panel);
    let state = panels.cursor(panel);
    let width = usize::from(inner.width);

    let mut lines: Vec<Line> = Vec::with_capacity(usize::from(inner.height));
    lines.push(title_line(panel, count, active));

    if count == 0 {
        lines.push(Line::from(Span::styled(empty_text(panel), dim())));
        frame.render_widget(Paragraph::new(lines), inner);
        return;
    }

    let vh = layout.visible_height(panel);
    let groups = panels.groups(panel);
    if state.offset > 0 {
        lines.push(indicator("▲ more above", width));
    }
    let body = scroll::layout_lines(&groups, state.offset, scroll::capacity(state.offset, vh));
    let last_row = body.iter().rev().find_map(|l| match l {
        PanelLine::Row(r) => Some(*r),
        _ => None,
    });
    for line in body {
        lines.push(match line {
            PanelLine::Header(label) => Line::from(Span::styled(label, header_style())),
            PanelLine::Blank => Line::default(),
            PanelLine::Row(row) => {
                let selected = row == state.cursor;
                let line = row_line(panels, panel, row, width, now);
                match (selected, active) {
                    (true, true) => line.style(selected_style()),
                    (true, false) => line.style(Style::default().add_modifier(Modifier::BOLD)),
                    _ => line,
                }
            }
        });
    }

    let more_below = last_row.is_some_and(|r| r + 1 < count);
    let bottom = inner.height.saturating_sub(1);
    frame.render_widget(Paragraph::new(lines), inner);
    if more_below && inner.height > 1 {
        frame.render_widget(
            Paragraph::new(indicator("▼ more below", width)),
            Rect::new(inner.x, inner.y + bottom, inner.width, 1),
        );
    }
}

fn title_line(panel: Panel, count: usize, active: bool) -> Line<'static> {
    let style = if active {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    Line::from(vec![
        Span::styled(format!("{}. {}", panel.index() + 1, panel.title()), style),
        Span::styled(format!(" ({count})"), dim()),
    ])
}

fn empty_text(panel: Panel) -> &'static str {
    match panel {
        Panel::CurrentWork => "Nothing in progress",
        Panel::TaskList => "No tasks",
        Panel::Activity => "No recent activity",
    }
}

fn indicator(text: &str, width: usize) -> Line<'static> {
    Line::from(Span::styled(
        truncate_with_ellipsis(text, width),
        Style::default().fg(Color::DarkGray),
    ))
}

fn row_line(panels: &PanelsState, panel: Panel, row: usize, width: usize, now: DateTime<Utc>) -> Line<'static> {
    match panel {
        Panel::Activity => panels
            .activity
            .get(row)
            .map(|item| activity_line(item, width, now))
            .unwrap_or_default(),
        _ => panels
            .issue_at(panel, row)
            .map(|issue| issue_line(issue, width))
            .unwrap_or_default(),
    }
}

/// `◆ td-abc123 P1 [open] Title…`
pub fn issue_line(issue: &Issue, width: usize) -> Line<'static> {
    let id = format!(" {} ", pad_to_width(&issue.id, 10));
    let status = status_span(issue.status);
    let used = 2 + id.chars().count() + 3 + status.content.chars().count() + 1;
    let title = truncate_with_ellipsis(
        &sanitize_for_display(first_line(&issue.title)),
        width.saturating_sub(used),
    );
    Line::from(vec![
        Span::raw(format!(" {}", type_icon(issue.issue_type))),
        Span::styled(id, Style::default().fg(Color::Gray)),
        priority_span(issue.priority),
        Span::raw(" "),
        status,
        Span::raw(" "),
        Span::raw(title),
    ])
}

fn activity_line(item: &ActivityItem, width: usize, now: DateTime<Utc>) -> Line<'static> {
    let kind_color = match item.kind {
        ActivityKind::Log => Color::Blue,
        ActivityKind::Action => Color::Yellow,
        ActivityKind::Comment => Color::Green,
    };
    let head = format!(
        " {:>4} {} ",
        relative_time(item.timestamp, now),
        pad_to_width(&item.session_id, 10)
    );
    let issue = item
        .issue_id
        .as_deref()
        .map_or_else(String::new, |id| format!("{id} "));
    let used = head.chars().count() + 4 + issue.chars().count();
    let message = truncate_with_ellipsis(
        &sanitize_for_display(first_line(&item.message)),
        width.saturating_sub(used),
    );
    Line::from(vec![
        Span::styled(head, dim()),
        Span::styled(format!("{} ", item.kind.label()), Style::default().fg(kind_color)),
        Span::styled(issue, Style::default().fg(Color::Gray)),
        Span::raw(message),
    ])
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use td_types::Issue;

    use super::*;
    use crate::snapshot::{RefreshData, TaskListData};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> Vec<String> {
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn test_issue_line_fits_width() {
        let mut issue = Issue::new("td-abc123", "A very long title ".repeat(10), Utc::now());
        issue.title.push('!');
        let line = issue_line(&issue, 40);
        assert!(line.width() <= 40);
    }

    #[test]
    fn test_render_shows_headers_and_more_below() {
        let mut panels = PanelsState::new([0.2, 0.6, 0.2]);
        let area = Rect::new(0, 0, 60, 30);
        let layout = MainLayout::compute(area, panels.pane_heights, false, false);
        let data = RefreshData {
            task_list: TaskListData {
                ready: (0..40)
                    .map(|i| Issue::new(format!("td-{i}"), "task", Utc::now()))
                    .collect(),
                ..TaskListData::default()
            },
            ..RefreshData::default()
        };
        panels.apply_refresh(&data, Panel::ALL.map(|p| layout.visible_height(p)));

        let mut terminal = Terminal::new(TestBackend::new(60, 30)).unwrap();
        terminal
            .draw(|frame| render_panels(frame, &panels, &layout, Utc::now()))
            .unwrap();
        let text = buffer_text(&terminal);
        let pane = layout.pane(Panel::TaskList);
        assert!(text[usize::from(pane.y) + 1].contains("2. Tasks (40)"));
        assert!(text[usize::from(pane.y) + 2].contains("READY"));
        assert!(text[usize::from(pane.y + pane.height) - 2].contains("▼ more below"));
        assert!(text.iter().any(|l| l.contains("Nothing in progress")));
    }
}
