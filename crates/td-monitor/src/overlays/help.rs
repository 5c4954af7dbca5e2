//! Help overlay: the keymap for the context it was opened from, or the
//! task query language when opened from the search bar.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::render_utils::{InputHint, OverlayConfig, OverlayLayout, OverlaySize, render_overlay};
use super::{OverlayUpdate, step_scroll};
use crate::common::Scrollbar;
use crate::common::format::{dim, header_style};
use crate::keymap::{Command, Context, Keymap};

const SIZE: OverlaySize = OverlaySize::Percent { x: 60, y: 70 };
const KEY_COLUMN: usize = 22;

const QUERY_HELP: &[(&str, &str)] = &[
    ("login page", "issues containing every word (ID, title, body, labels)"),
    ("\"two words\"", "quoted phrase is a single term"),
    ("type=bug", "filter by type: task bug feature chore epic"),
    ("status=open", "filter by status: open in_progress in_review blocked closed"),
    ("priority=P1", "filter by priority P0 to P4"),
    ("label=ui", "issues carrying the label"),
    ("parent=td-abc123", "children of an issue"),
    ("sort:created", "order by created, updated or priority"),
    ("sort:-updated", "leading '-' reverses the order"),
];

#[derive(Debug, Clone)]
pub struct HelpState {
    pub title: String,
    pub lines: Vec<Line<'static>>,
    pub scroll: usize,
}

impl HelpState {
    /// Keymap help for `context`.
    pub fn keys(keymap: &Keymap, context: Context) -> Self {
        let mut lines = vec![Line::from(Span::styled(
            format!("{} keys", context.title()),
            header_style(),
        ))];
        lines.push(Line::default());
        lines.extend(
            keymap
                .help_entries(context)
                .into_iter()
                .map(|entry| row(&entry.keys, entry.description)),
        );
        if context != Context::Main {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("Main keys", header_style())));
            lines.push(Line::default());
            lines.extend(
                keymap
                    .help_entries(Context::Main)
                    .into_iter()
                    .map(|entry| row(&entry.keys, entry.description)),
            );
        }
        Self {
            title: "Help".to_string(),
            lines,
            scroll: 0,
        }
    }

    /// Task query language reference.
    pub fn query_language() -> Self {
        let mut lines = vec![
            Line::from(Span::styled("Search syntax", header_style())),
            Line::default(),
        ];
        lines.extend(QUERY_HELP.iter().map(|(example, text)| row(example, text)));
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Tokens combine with AND. s and t rewrite the sort: and type= clauses.",
            dim(),
        )));
        Self {
            title: "Query language".to_string(),
            lines,
            scroll: 0,
        }
    }

    pub fn handle_command(&mut self, screen: Rect, command: Option<Command>) -> OverlayUpdate {
        let visible = usize::from(OverlayLayout::compute(screen, SIZE, true).body.height);
        match command {
            Some(Command::Back | Command::Cancel) => OverlayUpdate::close(),
            Some(Command::Down) => {
                step_scroll(&mut self.scroll, 1, self.lines.len(), visible);
                OverlayUpdate::stay()
            }
            Some(Command::Up) => {
                step_scroll(&mut self.scroll, -1, self.lines.len(), visible);
                OverlayUpdate::stay()
            }
            _ => OverlayUpdate::stay(),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let hints = [InputHint::new("j/k", "scroll"), InputHint::new("Esc", "close")];
        let layout = render_overlay(
            frame,
            area,
            &OverlayConfig {
                title: &self.title,
                border_color: Color::Blue,
                size: SIZE,
                hints: &hints,
            },
        );
        let visible = usize::from(layout.body.height);
        let scroll = self.scroll.min(self.lines.len().saturating_sub(visible));
        let shown: Vec<Line> = self.lines.iter().skip(scroll).take(visible).cloned().collect();
        frame.render_widget(Paragraph::new(shown), layout.body);
        frame.render_widget(Scrollbar::new(self.lines.len(), visible, scroll), layout.body);
    }
}

fn row(keys: &str, description: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {keys:<KEY_COLUMN$}"),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(description.to_string()),
    ])
}
