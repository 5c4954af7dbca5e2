//! Modal content lines.
//!
//! Rendering and scroll clamping both call [`build`], so the scroll range
//! always matches what is drawn at the current width.

use std::fmt::Write as _;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use td_types::{Handoff, Issue};

use super::ModalEntry;
use crate::common::format::{dim, header_style, priority_span, selected_style, status_span, timestamp, type_icon};
use crate::common::{sanitize_for_display, truncate_with_ellipsis};
use crate::markdown::wrap_text;

#[derive(Debug, Clone, Default)]
pub struct ModalContent {
    pub lines: Vec<Line<'static>>,
    /// Line of the parent-epic row.
    pub parent_line: Option<usize>,
    /// Line of each epic task row.
    pub task_lines: Vec<usize>,
}

pub fn build(entry: &ModalEntry, width: usize) -> ModalContent {
    let width = width.max(10);
    let mut content = ModalContent::default();
    let lines = &mut content.lines;

    let Some(issue) = entry.issue() else {
        if let Some(err) = &entry.error {
            lines.push(Line::from(Span::styled(
                format!("Error: {err}"),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled("Loading…", dim())));
        }
        return content;
    };

    for row in wrap_text(&sanitize_for_display(&issue.title), width) {
        lines.push(Line::from(Span::styled(
            row,
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }

    let mut meta = vec![
        Span::raw(format!("{} {}  ", type_icon(issue.issue_type), issue.issue_type)),
        status_span(issue.status),
        Span::raw("  "),
        priority_span(issue.priority),
    ];
    if issue.points > 0 {
        meta.push(Span::raw(format!("  {} pts", issue.points)));
    }
    if issue.minor {
        meta.push(Span::styled("  minor", dim()));
    }
    lines.push(Line::from(meta));

    if !issue.labels.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Labels: ", dim()),
            Span::raw(truncate_with_ellipsis(&issue.labels.join(", "), width.saturating_sub(8))),
        ]));
    }
    let mut sessions = Vec::new();
    if let Some(s) = &issue.implementer_session {
        sessions.push(format!("implementer {s}"));
    }
    if let Some(s) = &issue.reviewer_session {
        sessions.push(format!("reviewer {s}"));
    }
    if !sessions.is_empty() {
        lines.push(Line::from(Span::styled(sessions.join(" · "), dim())));
    }
    let mut dates = format!(
        "created {} · updated {}",
        timestamp(issue.created_at),
        timestamp(issue.updated_at)
    );
    if let Some(closed) = issue.closed_at {
        let _ = write!(dates, " · closed {}", timestamp(closed));
    }
    lines.push(Line::from(Span::styled(
        truncate_with_ellipsis(&dates, width),
        dim(),
    )));

    if let Some(parent) = &entry.details.parent_epic {
        content.parent_line = Some(lines.len());
        let text = truncate_with_ellipsis(&format!("↑ Epic {} {}", parent.id, parent.title), width);
        let style = if entry.parent_focused {
            selected_style().fg(Color::Magenta)
        } else {
            Style::default().fg(Color::Magenta)
        };
        lines.push(Line::from(Span::styled(text, style)));
    }

    let markdown = entry
        .markdown
        .as_ref()
        .filter(|md| usize::from(md.width) == width);
    if !issue.description.trim().is_empty() {
        section(lines, "DESCRIPTION");
        match markdown {
            Some(md) => lines.extend(md.description.iter().cloned()),
            None => plain(lines, &issue.description, width),
        }
    }
    if !issue.acceptance.trim().is_empty() {
        section(lines, "ACCEPTANCE");
        match markdown {
            Some(md) => lines.extend(md.acceptance.iter().cloned()),
            None => plain(lines, &issue.acceptance, width),
        }
    }

    if !entry.details.epic_tasks.is_empty() {
        section(lines, &format!("TASKS ({})", entry.details.epic_tasks.len()));
        for (i, task) in entry.details.epic_tasks.iter().enumerate() {
            content.task_lines.push(lines.len());
            let selected = entry.tasks_focused && i == entry.epic_cursor;
            lines.push(issue_row(task, width, selected));
        }
    }
    if !entry.details.blocked_by.is_empty() {
        section(lines, &format!("BLOCKED BY ({})", entry.details.blocked_by.len()));
        for dep in &entry.details.blocked_by {
            lines.push(issue_row(dep, width, false));
        }
    }
    if !entry.details.blocks.is_empty() {
        section(lines, &format!("BLOCKS ({})", entry.details.blocks.len()));
        for dep in &entry.details.blocks {
            lines.push(issue_row(dep, width, false));
        }
    }

    if let Some(handoff) = &entry.details.handoff {
        section(lines, "LATEST HANDOFF");
        handoff_lines(lines, handoff, width);
    }

    if !entry.details.logs.is_empty() {
        section(lines, &format!("LOGS ({})", entry.details.logs.len()));
        for log in &entry.details.logs {
            lines.push(Line::from(vec![
                Span::styled(timestamp(log.timestamp), dim()),
                Span::styled(format!(" [{}] ", log.log_type.as_str()), Style::default().fg(Color::Cyan)),
                Span::styled(log.session_id.clone(), dim()),
            ]));
            indented(lines, &log.message, width);
        }
    }

    if !entry.details.comments.is_empty() {
        section(lines, &format!("COMMENTS ({})", entry.details.comments.len()));
        for comment in &entry.details.comments {
            lines.push(Line::from(vec![
                Span::styled(timestamp(comment.created_at), dim()),
                Span::raw(" "),
                Span::styled(comment.session_id.clone(), Style::default().fg(Color::Blue)),
            ]));
            indented(lines, &comment.text, width);
        }
    }

    content
}

fn section(lines: &mut Vec<Line<'static>>, title: &str) {
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(title.to_string(), header_style())));
}

fn plain(lines: &mut Vec<Line<'static>>, text: &str, width: usize) {
    let text = sanitize_for_display(text);
    for raw in text.trim_end().split('\n') {
        lines.extend(wrap_text(raw, width).into_iter().map(Line::from));
    }
}

fn indented(lines: &mut Vec<Line<'static>>, text: &str, width: usize) {
    let text = sanitize_for_display(text);
    for raw in text.trim_end().split('\n') {
        lines.extend(
            wrap_text(raw, width.saturating_sub(2))
                .into_iter()
                .map(|row| Line::from(format!("  {row}"))),
        );
    }
}

fn issue_row(issue: &Issue, width: usize, selected: bool) -> Line<'static> {
    let marker = if selected { "▸ " } else { "  " };
    let prefix = format!("{marker}{} ", type_icon(issue.issue_type));
    let status = status_span(issue.status);
    let used = prefix.chars().count() + status.content.chars().count() + issue.id.len() + 2;
    let title = truncate_with_ellipsis(&issue.title, width.saturating_sub(used));
    let line = Line::from(vec![
        Span::raw(prefix),
        status,
        Span::raw(" "),
        Span::styled(issue.id.clone(), Style::default().fg(Color::Cyan)),
        Span::raw(format!(" {title}")),
    ]);
    if selected {
        line.style(selected_style())
    } else {
        line
    }
}

fn handoff_lines(lines: &mut Vec<Line<'static>>, handoff: &Handoff, width: usize) {
    lines.push(Line::from(Span::styled(
        format!("{} · {}", handoff.session_id, timestamp(handoff.timestamp)),
        dim(),
    )));
    for (label, items) in [
        ("Done", &handoff.done),
        ("Remaining", &handoff.remaining),
        ("Decisions", &handoff.decisions),
        ("Uncertain", &handoff.uncertain),
    ] {
        if items.is_empty() {
            continue;
        }
        lines.push(Line::from(Span::styled(
            format!("{label}:"),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for item in items {
            let rows = wrap_text(&sanitize_for_display(item), width.saturating_sub(4));
            for (i, row) in rows.into_iter().enumerate() {
                let bullet = if i == 0 { "  • " } else { "    " };
                lines.push(Line::from(format!("{bullet}{row}")));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use td_types::{Log, LogType};

    use super::*;
    use crate::features::modal::RenderedMarkdown;
    use crate::snapshot::IssueDetails;

    fn loaded(issue: Issue) -> ModalEntry {
        let mut entry = ModalEntry::new(issue.id.clone(), None);
        entry.apply_details(Ok(Box::new(IssueDetails {
            issue: Some(issue),
            ..IssueDetails::default()
        })));
        entry
    }

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_loading_and_error_placeholders() {
        let entry = ModalEntry::new("td-1", None);
        assert_eq!(text(&build(&entry, 40).lines[0]), "Loading…");

        let mut failed = ModalEntry::new("td-1", None);
        failed.apply_details(Err("db down".into()));
        assert!(text(&build(&failed, 40).lines[0]).contains("db down"));
    }

    #[test]
    fn test_rendered_markdown_used_only_at_matching_width() {
        let mut issue = Issue::new("td-1", "Title", Utc::now());
        issue.description = "raw text".into();
        let mut entry = loaded(issue);
        entry.markdown = Some(RenderedMarkdown {
            width: 40,
            description: vec![Line::from("rendered"), Line::from("two")],
            acceptance: Vec::new(),
        });

        let at_40: Vec<String> = build(&entry, 40).lines.iter().map(text).collect();
        assert!(at_40.contains(&"rendered".to_string()));
        let at_60: Vec<String> = build(&entry, 60).lines.iter().map(text).collect();
        assert!(at_60.contains(&"raw text".to_string()));
    }

    #[test]
    fn test_task_and_parent_lines_are_tracked() {
        let mut epic = Issue::new("td-epic", "Epic", Utc::now());
        epic.issue_type = td_types::IssueType::Epic;
        let mut entry = ModalEntry::new("td-epic", None);
        entry.apply_details(Ok(Box::new(IssueDetails {
            issue: Some(epic),
            epic_tasks: vec![
                Issue::new("td-a", "first", Utc::now()),
                Issue::new("td-b", "second", Utc::now()),
            ],
            parent_epic: Some(Issue::new("td-root", "root", Utc::now())),
            ..IssueDetails::default()
        })));

        let content = build(&entry, 50);
        let parent = content.parent_line.unwrap();
        assert!(text(&content.lines[parent]).contains("td-root"));
        assert_eq!(content.task_lines.len(), 2);
        assert!(text(&content.lines[content.task_lines[1]]).contains("td-b"));
        assert!(text(&content.lines[content.task_lines[0]]).starts_with("▸"));
    }

    #[test]
    fn test_line_count_matches_for_wrapped_logs() {
        let mut entry = loaded(Issue::new("td-1", "t", Utc::now()));
        entry.details.logs = vec![Log {
            id: 1,
            issue_id: "td-1".into(),
            session_id: "s".into(),
            log_type: LogType::Progress,
            message: "word ".repeat(40),
            timestamp: Utc::now(),
        }];
        let narrow = build(&entry, 20).lines.len();
        let wide = build(&entry, 200).lines.len();
        assert!(narrow > wide);
        entry.recount(20, 5);
        assert_eq!(entry.content_lines, narrow);
    }
}
