use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use super::OverlayUpdate;
use super::render_utils::{InputHint, OverlayConfig, OverlaySize, render_overlay};
use crate::common::sanitize_for_display;
use crate::effects::UiEffect;
use crate::features::workflow::WorkflowAction;
use crate::keymap::Command;

/// A staged delete waiting for y/n.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmState {
    pub issue_id: String,
    pub title: String,
}

impl ConfirmState {
    pub fn new(issue_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            issue_id: issue_id.into(),
            title: title.into(),
        }
    }

    pub fn handle_command(&self, command: Option<Command>) -> OverlayUpdate {
        match command {
            Some(Command::Confirm) => OverlayUpdate::close().with_ui_effects(vec![UiEffect::Workflow {
                action: WorkflowAction::Delete,
                issue_id: self.issue_id.clone(),
            }]),
            Some(Command::Cancel) => OverlayUpdate::close(),
            _ => OverlayUpdate::stay(),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let hints = [InputHint::new("y", "delete"), InputHint::new("n", "cancel")];
        let layout = render_overlay(
            frame,
            area,
            &OverlayConfig {
                title: "Delete issue",
                border_color: Color::Red,
                size: OverlaySize::Fixed {
                    width: 56,
                    height: 7,
                },
                hints: &hints,
            },
        );

        let text = vec![
            Line::from(vec![
                Span::raw("Delete "),
                Span::styled(
                    self.issue_id.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("?"),
            ]),
            Line::from(Span::styled(
                sanitize_for_display(&self.title).into_owned(),
                Style::default().fg(Color::Gray),
            )),
        ];
        frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), layout.body);
    }
}
