use std::fmt::Write as _;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use super::{ModalEntry, ModalGeometry, ModalStack, content, modal_area};
use crate::common::Scrollbar;
use crate::common::format::{status_color, type_icon};
use crate::overlays::render_utils::{InputHint, render_hints};

impl ModalStack {
    pub fn render(&self, frame: &mut Frame, screen: Rect) {
        let Some(entry) = self.current() else {
            return;
        };
        let area = modal_area(screen);
        let geometry = ModalGeometry::new(screen);
        frame.render_widget(Clear, area);

        let border = entry
            .issue()
            .map_or(Color::Cyan, |issue| status_color(issue.status));
        let mut title = match entry.issue() {
            Some(issue) => format!(" {} {} ", type_icon(issue.issue_type), issue.id),
            None => format!(" {} ", entry.issue_id),
        };
        if self.depth() > 1 {
            let _ = write!(title, "[{}] ", self.depth());
        }
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(title);
        frame.render_widget(block, area);

        let built = content::build(entry, usize::from(geometry.width()));
        let height = geometry.visible_height();
        let scroll = entry.scroll.min(built.lines.len().saturating_sub(height));
        let visible: Vec<_> = built.lines.iter().skip(scroll).take(height).cloned().collect();
        frame.render_widget(Paragraph::new(visible), geometry.content);

        let track = Rect {
            width: geometry.content.width + 1,
            ..geometry.content
        };
        frame.render_widget(Scrollbar::new(built.lines.len(), height, scroll), track);

        render_hints(frame, geometry.hints, &hints(entry, self.depth()), Color::Cyan);
    }
}

fn hints(entry: &ModalEntry, depth: usize) -> Vec<InputHint<'static>> {
    if entry.parent_focused {
        return vec![
            InputHint::new("Enter", "open epic"),
            InputHint::new("k/Esc", "unfocus"),
        ];
    }
    if entry.tasks_focused {
        return vec![
            InputHint::new("j/k", "task"),
            InputHint::new("Enter", "open task"),
            InputHint::new("Esc", "unfocus"),
        ];
    }
    let mut hints = vec![InputHint::new("j/k", "scroll")];
    if depth == 1 {
        hints.push(InputHint::new("h/l", "prev/next"));
    }
    hints.extend([
        InputHint::new("r", "review"),
        InputHint::new("x", "close"),
        InputHint::new("e", "edit"),
        InputHint::new("Esc", "back"),
    ]);
    hints
}
