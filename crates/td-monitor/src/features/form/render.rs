use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::{FieldKind, FormField, FormState};
use crate::common::format::dim;
use crate::common::truncate_with_ellipsis;
use crate::overlays::render_utils::{InputHint, OverlayConfig, OverlaySize, render_overlay};

const LABEL_WIDTH: usize = 13;
/// Lines shown for a focused multi-line field.
const MULTILINE_ROWS: usize = 6;

pub(super) const SIZE: OverlaySize = OverlaySize::Percent { x: 70, y: 80 };

impl FormState {
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let title = self.title();
        let hints = [
            InputHint::new("Ctrl+S", "save"),
            InputHint::new("Tab", "next"),
            InputHint::new("Ctrl+X", if self.extended { "fewer" } else { "more" }),
            InputHint::new("Ctrl+O", "editor"),
            InputHint::new("Esc", "cancel"),
        ];
        let layout = render_overlay(
            frame,
            area,
            &OverlayConfig {
                title: &title,
                border_color: Color::Cyan,
                size: SIZE,
                hints: &hints,
            },
        );

        let value_width = usize::from(layout.body.width).saturating_sub(LABEL_WIDTH + 1);
        let (lines, focus_line) = self.body_lines(value_width);
        let height = usize::from(layout.body.height);
        let scroll = (focus_line + 2).saturating_sub(height);
        let visible: Vec<Line<'static>> = lines.into_iter().skip(scroll).take(height).collect();
        frame.render_widget(Paragraph::new(visible), layout.body);
    }

    fn body_lines(&self, value_width: usize) -> (Vec<Line<'static>>, usize) {
        let mut lines = Vec::new();
        let mut focus_line = 0;
        let values = &self.values;

        for field in self.fields() {
            let focused = field == self.focus;
            if focused {
                focus_line = lines.len();
            }
            let label_style = if focused {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            let marker = if focused { "›" } else { " " };
            let label = Span::styled(
                format!("{marker}{:<width$}", field.label(), width = LABEL_WIDTH),
                label_style,
            );

            match field.kind() {
                FieldKind::Select => {
                    let value = match field {
                        FormField::Type => values.issue_type.as_str(),
                        FormField::Priority => values.priority.as_str(),
                        _ => values.status.as_str(),
                    };
                    let text = if focused {
                        format!("‹ {value} ›")
                    } else {
                        value.to_string()
                    };
                    lines.push(Line::from(vec![label, Span::raw(text)]));
                }
                FieldKind::Toggle => {
                    let mark = if values.minor { "[x]" } else { "[ ]" };
                    lines.push(Line::from(vec![label, Span::raw(mark)]));
                }
                FieldKind::Text | FieldKind::MultiLine if focused => {
                    let rows = self.buffer_lines(value_width);
                    let mut rows = rows.into_iter();
                    let first = rows.next().unwrap_or_default();
                    let mut spans = vec![label];
                    spans.extend(first.spans);
                    lines.push(Line::from(spans));
                    let indent = " ".repeat(LABEL_WIDTH + 1);
                    for row in rows {
                        let mut spans = vec![Span::raw(indent.clone())];
                        spans.extend(row.spans);
                        lines.push(Line::from(spans));
                    }
                }
                FieldKind::Text | FieldKind::MultiLine => {
                    let raw = values.text(field).unwrap_or_default();
                    let mut text_lines = raw.lines();
                    let first = text_lines.next().unwrap_or("");
                    let extra = text_lines.count();
                    let mut spans = vec![
                        label,
                        Span::raw(truncate_with_ellipsis(first, value_width)),
                    ];
                    if extra > 0 {
                        spans.push(Span::styled(format!("  (+{extra} lines)"), dim()));
                    }
                    lines.push(Line::from(spans));
                }
            }

            if let Some(err) = self.error.as_ref().filter(|e| e.field == field) {
                lines.push(Line::from(Span::styled(
                    format!("{}{}", " ".repeat(LABEL_WIDTH + 1), err.message),
                    Style::default().fg(Color::Red),
                )));
            }
        }

        lines.push(Line::default());
        if !self.extended {
            lines.push(Line::from(Span::styled(
                "Ctrl+X shows points, acceptance, dependencies and minor",
                dim(),
            )));
        }
        if self.submitting {
            lines.push(Line::from(Span::styled("Saving…", Style::default().fg(Color::Yellow))));
        }
        if let Some(err) = &self.submit_error {
            lines.push(Line::from(Span::styled(
                format!("Save failed: {err}"),
                Style::default().fg(Color::Red),
            )));
        }
        (lines, focus_line)
    }

    /// Buffer rows around the cursor with the cursor cell highlighted.
    fn buffer_lines(&self, value_width: usize) -> Vec<Line<'static>> {
        let (row, col) = self.buffer.cursor();
        let all = self.buffer.lines();
        let start = (row + 1).saturating_sub(MULTILINE_ROWS);
        let cursor_style = Style::default().add_modifier(Modifier::REVERSED);

        all.iter()
            .enumerate()
            .skip(start)
            .take(MULTILINE_ROWS)
            .map(|(i, line)| {
                let chars: Vec<char> = line.chars().collect();
                if i != row {
                    return Line::from(truncate_with_ellipsis(line, value_width));
                }
                // Keep the cursor in view on long lines.
                let first = (col + 1).saturating_sub(value_width.max(1));
                let before: String = chars[first..col.min(chars.len())].iter().collect();
                let at = chars.get(col).map_or(" ".to_string(), char::to_string);
                let after: String = chars.iter().skip(col + 1).collect();
                let room = value_width.saturating_sub(before.chars().count() + 1);
                Line::from(vec![
                    Span::raw(before),
                    Span::styled(at, cursor_style),
                    Span::raw(truncate_with_ellipsis(&after, room)),
                ])
            })
            .collect()
    }
}
