use chrono::Utc;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use td_types::Handoff;

use super::OverlayUpdate;
use super::render_utils::{InputHint, OverlayConfig, OverlayLayout, OverlaySize, render_overlay};
use crate::common::format::{dim, relative_time, selected_style};
use crate::common::{Scrollbar, pad_to_width, sanitize_for_display, truncate_with_ellipsis};
use crate::keymap::Command;

const SIZE: OverlaySize = OverlaySize::Percent { x: 80, y: 70 };

/// Recent handoffs across all issues.
#[derive(Debug, Clone, Default)]
pub struct HandoffsState {
    /// `None` while loading.
    pub items: Option<Result<Vec<Handoff>, String>>,
    pub cursor: usize,
    pub offset: usize,
}

impl HandoffsState {
    fn len(&self) -> usize {
        match &self.items {
            Some(Ok(items)) => items.len(),
            _ => 0,
        }
    }

    pub fn set_items(&mut self, items: Result<Vec<Handoff>, String>) {
        self.items = Some(items);
        self.cursor = self.cursor.min(self.len().saturating_sub(1));
        self.offset = 0;
    }

    pub fn selected(&self) -> Option<&Handoff> {
        match &self.items {
            Some(Ok(items)) => items.get(self.cursor),
            _ => None,
        }
    }

    fn move_cursor(&mut self, delta: isize, visible: usize) {
        let len = self.len();
        if len == 0 {
            return;
        }
        self.cursor = self.cursor.saturating_add_signed(delta).min(len - 1);
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + visible {
            self.offset = self.cursor + 1 - visible;
        }
    }

    pub fn handle_command(&mut self, screen: Rect, command: Option<Command>) -> OverlayUpdate {
        let visible = usize::from(OverlayLayout::compute(screen, SIZE, true).body.height).max(1);
        match command {
            Some(Command::Back | Command::Cancel) => OverlayUpdate::close(),
            Some(Command::Down) => {
                self.move_cursor(1, visible);
                OverlayUpdate::stay()
            }
            Some(Command::Up) => {
                self.move_cursor(-1, visible);
                OverlayUpdate::stay()
            }
            Some(Command::Select) => match self.selected() {
                Some(handoff) => OverlayUpdate::open_issue(handoff.issue_id.clone()),
                None => OverlayUpdate::stay(),
            },
            _ => OverlayUpdate::stay(),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let hints = [
            InputHint::new("j/k", "move"),
            InputHint::new("Enter", "open"),
            InputHint::new("Esc", "close"),
        ];
        let layout = render_overlay(
            frame,
            area,
            &OverlayConfig {
                title: "Handoffs",
                border_color: Color::Yellow,
                size: SIZE,
                hints: &hints,
            },
        );

        let items = match &self.items {
            None => {
                frame.render_widget(
                    Paragraph::new(Line::from(Span::styled("Loading…", dim()))),
                    layout.body,
                );
                return;
            }
            Some(Err(e)) => {
                frame.render_widget(
                    Paragraph::new(Line::from(Span::styled(
                        format!("Error: {e}"),
                        Style::default().fg(Color::Red),
                    ))),
                    layout.body,
                );
                return;
            }
            Some(Ok(items)) if items.is_empty() => {
                frame.render_widget(
                    Paragraph::new(Line::from(Span::styled("No handoffs yet", dim()))),
                    layout.body,
                );
                return;
            }
            Some(Ok(items)) => items,
        };

        let visible = usize::from(layout.body.height);
        let width = usize::from(layout.body.width.saturating_sub(1));
        let now = Utc::now();
        let lines: Vec<Line> = items
            .iter()
            .enumerate()
            .skip(self.offset)
            .take(visible)
            .map(|(i, h)| {
                let summary = h
                    .remaining
                    .first()
                    .or_else(|| h.done.first())
                    .map_or("", String::as_str);
                let head = format!(
                    "{:>4}  {}  {}  ",
                    relative_time(h.timestamp, now),
                    pad_to_width(&h.issue_id, 10),
                    pad_to_width(&h.session_id, 10),
                );
                let text = truncate_with_ellipsis(
                    &format!("{head}{}", sanitize_for_display(summary)),
                    width,
                );
                let line = Line::from(text);
                if i == self.cursor {
                    line.style(selected_style())
                } else {
                    line
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), layout.body);
        frame.render_widget(Scrollbar::new(items.len(), visible, self.offset), layout.body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlays::OverlayTransition;

    fn handoff(id: &str) -> Handoff {
        Handoff {
            id: 0,
            issue_id: id.to_string(),
            session_id: "ses_a".to_string(),
            done: vec![],
            remaining: vec![],
            decisions: vec![],
            uncertain: vec![],
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_enter_opens_selected_issue() {
        let screen = Rect::new(0, 0, 120, 40);
        let mut state = HandoffsState::default();
        assert_eq!(
            state.handle_command(screen, Some(Command::Select)).transition,
            OverlayTransition::Stay
        );

        state.set_items(Ok(vec![handoff("td-1"), handoff("td-2")]));
        state.handle_command(screen, Some(Command::Down));
        state.handle_command(screen, Some(Command::Down));
        assert_eq!(state.cursor, 1);
        assert_eq!(
            state.handle_command(screen, Some(Command::Select)).transition,
            OverlayTransition::OpenIssue("td-2".to_string())
        );
    }

    #[test]
    fn test_offset_follows_cursor() {
        let mut state = HandoffsState::default();
        state.set_items(Ok((0..10).map(|i| handoff(&format!("td-{i}"))).collect()));
        for _ in 0..5 {
            state.move_cursor(1, 3);
        }
        assert_eq!(state.cursor, 5);
        assert_eq!(state.offset, 3);
        state.move_cursor(-5, 3);
        assert_eq!(state.offset, 0);
    }
}
