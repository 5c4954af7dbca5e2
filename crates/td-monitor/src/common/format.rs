//! Colors and short labels shared by panels, modal and overlays.

use chrono::{DateTime, Utc};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use td_types::{Issue, IssueType, Priority, Status};

pub fn status_color(status: Status) -> Color {
    match status {
        Status::Open => Color::White,
        Status::InProgress => Color::Yellow,
        Status::InReview => Color::Magenta,
        Status::Blocked => Color::Red,
        Status::Closed => Color::DarkGray,
    }
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::P0 => Color::Red,
        Priority::P1 => Color::LightRed,
        Priority::P2 => Color::Yellow,
        Priority::P3 => Color::Blue,
        Priority::P4 => Color::DarkGray,
    }
}

pub fn type_icon(issue_type: IssueType) -> &'static str {
    match issue_type {
        IssueType::Task => "·",
        IssueType::Bug => "✗",
        IssueType::Feature => "+",
        IssueType::Chore => "~",
        IssueType::Epic => "◆",
    }
}

pub fn status_span(status: Status) -> Span<'static> {
    Span::styled(
        format!("[{}]", status.as_str()),
        Style::default().fg(status_color(status)),
    )
}

pub fn priority_span(priority: Priority) -> Span<'static> {
    Span::styled(
        priority.as_str(),
        Style::default()
            .fg(priority_color(priority))
            .add_modifier(Modifier::BOLD),
    )
}

/// Short relative age like `42s`, `5m`, `3h` or `2d`.
pub fn relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - ts).num_seconds().max(0);
    match secs {
        0..60 => format!("{secs}s"),
        60..3600 => format!("{}m", secs / 60),
        3600..86_400 => format!("{}h", secs / 3600),
        _ => format!("{}d", secs / 86_400),
    }
}

pub fn timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

pub fn selected_style() -> Style {
    Style::default()
        .bg(Color::Rgb(40, 44, 60))
        .add_modifier(Modifier::BOLD)
}

pub fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn header_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

/// Markdown summary of an issue for the clipboard.
pub fn issue_markdown(issue: &Issue) -> String {
    let mut out = format!("## {}: {}\n\n", issue.id, issue.title);
    out.push_str(&format!(
        "- **Type:** {}\n- **Priority:** {}\n- **Status:** {}\n",
        issue.issue_type, issue.priority, issue.status
    ));
    if !issue.labels.is_empty() {
        out.push_str(&format!("- **Labels:** {}\n", issue.labels.join(", ")));
    }
    if let Some(parent) = &issue.parent_id {
        out.push_str(&format!("- **Parent:** {parent}\n"));
    }
    if issue.points > 0 {
        out.push_str(&format!("- **Points:** {}\n", issue.points));
    }
    let description = issue.description.trim();
    if !description.is_empty() {
        out.push_str("\n### Description\n\n");
        out.push_str(description);
        out.push('\n');
    }
    let acceptance = issue.acceptance.trim();
    if !acceptance.is_empty() {
        out.push_str("\n### Acceptance\n\n");
        out.push_str(acceptance);
        out.push('\n');
    }
    out
}
