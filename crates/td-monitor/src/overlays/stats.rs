use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use td_types::ExtendedStats;

use super::render_utils::{InputHint, OverlayConfig, OverlayLayout, OverlaySize, render_overlay};
use super::{OverlayUpdate, step_scroll};
use crate::common::Scrollbar;
use crate::common::format::{dim, header_style, priority_color, status_color};
use crate::keymap::Command;

const SIZE: OverlaySize = OverlaySize::Fixed {
    width: 60,
    height: 32,
};

#[derive(Debug, Clone, Default)]
pub struct StatsState {
    /// `None` while loading.
    pub stats: Option<Result<ExtendedStats, String>>,
    pub scroll: usize,
}

impl StatsState {
    pub fn lines(&self) -> Vec<Line<'static>> {
        match &self.stats {
            None => vec![Line::from(Span::styled("Loading…", dim()))],
            Some(Err(e)) => vec![Line::from(Span::styled(
                format!("Error: {e}"),
                Style::default().fg(Color::Red),
            ))],
            Some(Ok(stats)) => stats_lines(stats),
        }
    }

    pub fn handle_command(&mut self, screen: Rect, command: Option<Command>) -> OverlayUpdate {
        let visible = usize::from(OverlayLayout::compute(screen, SIZE, true).body.height);
        let total = self.lines().len();
        match command {
            Some(Command::Back | Command::Cancel) => return OverlayUpdate::close(),
            Some(Command::Down) => step_scroll(&mut self.scroll, 1, total, visible),
            Some(Command::Up) => step_scroll(&mut self.scroll, -1, total, visible),
            _ => {}
        }
        OverlayUpdate::stay()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let hints = [InputHint::new("j/k", "scroll"), InputHint::new("Esc", "close")];
        let layout = render_overlay(
            frame,
            area,
            &OverlayConfig {
                title: "Stats",
                border_color: Color::Green,
                size: SIZE,
                hints: &hints,
            },
        );
        let lines = self.lines();
        let visible = usize::from(layout.body.height);
        let scroll = self.scroll.min(lines.len().saturating_sub(visible));
        let total = lines.len();
        let shown: Vec<Line> = lines.into_iter().skip(scroll).take(visible).collect();
        frame.render_widget(Paragraph::new(shown), layout.body);
        frame.render_widget(Scrollbar::new(total, visible, scroll), layout.body);
    }
}

fn stats_lines(stats: &ExtendedStats) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled("OVERVIEW", header_style())),
        kv("Issues", stats.total.to_string()),
        kv("Points", stats.total_points.to_string()),
        kv("Created (24h)", stats.created_last_24h.to_string()),
        kv("Closed (24h)", stats.closed_last_24h.to_string()),
        Line::default(),
        Line::from(Span::styled("BY STATUS", header_style())),
    ];
    for (status, count) in &stats.by_status {
        lines.push(bar(status.as_str(), *count, stats.total, status_color(*status)));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled("BY TYPE", header_style())));
    for (issue_type, count) in &stats.by_type {
        lines.push(bar(issue_type.as_str(), *count, stats.total, Color::Cyan));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled("BY PRIORITY", header_style())));
    for (priority, count) in &stats.by_priority {
        lines.push(bar(priority.as_str(), *count, stats.total, priority_color(*priority)));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled("ACTIVITY", header_style())));
    lines.push(kv("Logs", stats.total_logs.to_string()));
    lines.push(kv("Comments", stats.total_comments.to_string()));
    lines.push(kv("Handoffs", stats.total_handoffs.to_string()));
    lines.push(kv(
        "Most active",
        stats
            .most_active_session
            .clone()
            .unwrap_or_else(|| "-".to_string()),
    ));
    lines
}

fn kv(label: &str, value: String) -> Line<'static> {
    Line::from(vec![Span::styled(format!("  {label:<16}"), dim()), Span::raw(value)])
}

const BAR_WIDTH: usize = 20;

fn bar(label: &str, count: usize, total: usize, color: Color) -> Line<'static> {
    let filled = (count * BAR_WIDTH).checked_div(total).unwrap_or(0);
    Line::from(vec![
        Span::raw(format!("  {label:<12}")),
        Span::styled("█".repeat(filled), Style::default().fg(color)),
        Span::styled("─".repeat(BAR_WIDTH - filled), dim()),
        Span::raw(format!(" {count}")),
    ])
}

#[cfg(test)]
mod tests {
    use td_types::Status;

    use super::*;

    #[test]
    fn test_loading_and_error_placeholders() {
        let mut state = StatsState::default();
        assert_eq!(state.lines()[0].to_string(), "Loading…");
        state.stats = Some(Err("boom".into()));
        assert_eq!(state.lines()[0].to_string(), "Error: boom");
    }

    #[test]
    fn test_bars_scale_to_total() {
        let stats = ExtendedStats {
            total: 4,
            by_status: vec![(Status::Open, 4), (Status::Closed, 0)],
            ..ExtendedStats::default()
        };
        let lines = stats_lines(&stats);
        let open = lines.iter().find(|l| l.to_string().contains("open")).unwrap();
        assert!(open.to_string().contains(&"█".repeat(BAR_WIDTH)));
        let closed = lines.iter().find(|l| l.to_string().contains("closed")).unwrap();
        assert!(!closed.to_string().contains('█'));
    }
}
