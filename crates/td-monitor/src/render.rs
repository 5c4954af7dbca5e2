//! Pure view functions.
//!
//! Everything here takes `&AppState`, draws to a ratatui `Frame` and never
//! mutates state or returns effects. Layers, bottom to top: search bar,
//! panels, footer, issue modal, overlay.

use chrono::Utc;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::common::format::dim;
use crate::common::truncate_with_ellipsis;
use crate::features::panels::render::render_panels;
use crate::overlays::render_utils::{InputLine, render_input_line, render_separator};
use crate::state::{AppState, TuiState};

pub fn render(app: &AppState, frame: &mut Frame) {
    let screen = frame.area();
    let state = &app.tui;

    if let Some(area) = state.layout.search {
        render_search_bar(frame, state, area);
    }
    render_panels(frame, &state.panels, &state.layout, Utc::now());
    if let Some(area) = state.layout.footer {
        render_footer(frame, state, area);
    }

    app.modals.render(frame, screen);
    if let Some(overlay) = &app.overlay {
        overlay.render(frame, screen);
    }
}

fn render_search_bar(frame: &mut Frame, state: &TuiState, area: Rect) {
    if area.height == 0 {
        return;
    }
    let editing = state.search.editing;
    render_input_line(
        frame,
        Rect { height: 1, ..area },
        &InputLine {
            value: &state.search.query,
            placeholder: Some("type=bug status=open sort:-created …"),
            prompt: "Search: ",
            prompt_color: if editing { Color::Yellow } else { Color::DarkGray },
            text_color: Color::White,
            placeholder_color: Color::DarkGray,
            cursor_color: editing.then_some(Color::Yellow),
        },
    );
    render_separator(frame, area, 1);
}

fn render_footer(frame: &mut Frame, state: &TuiState, area: Rect) {
    if area.height == 0 {
        return;
    }
    render_separator(frame, area, 0);
    let width = usize::from(area.width);
    let lines = vec![info_line(state, width), message_line(state, width)];
    let body = Rect {
        y: area.y + 1,
        height: area.height - 1,
        ..area
    };
    frame.render_widget(Paragraph::new(lines), body);
}

/// Session, sort, filters and version.
fn info_line(state: &TuiState, width: usize) -> Line<'static> {
    let mut spans = vec![
        Span::styled(" session ", dim()),
        Span::styled(
            state.session_id.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
    ];
    if !state.active_sessions.is_empty() {
        spans.push(Span::styled(
            format!(" · {} active", state.active_sessions.len()),
            dim(),
        ));
    }
    spans.push(Span::styled(" · sort ", dim()));
    spans.push(Span::raw(state.search.sort.label()));
    spans.push(Span::styled(" · type ", dim()));
    spans.push(Span::raw(state.search.type_filter.label()));
    if state.include_closed {
        spans.push(Span::styled(" · +closed", Style::default().fg(Color::Magenta)));
    }
    if state.recent_handoffs > 0 {
        spans.push(Span::styled(
            format!(" · {} handoffs", state.recent_handoffs),
            Style::default().fg(Color::Green),
        ));
    }

    let used: usize = spans.iter().map(Span::width).sum();
    let version = format!("v{} ", state.options.version);
    if used + version.len() < width {
        spans.push(Span::raw(" ".repeat(width - used - version.len())));
        spans.push(Span::styled(version, dim()));
    }
    Line::from(spans)
}

/// Toast, refresh error, update notice, or the key hint line.
fn message_line(state: &TuiState, width: usize) -> Line<'static> {
    let text_width = width.saturating_sub(1);
    if let Some(status) = &state.status {
        let color = if status.is_error { Color::Red } else { Color::Green };
        return Line::from(Span::styled(
            format!(" {}", truncate_with_ellipsis(&status.text, text_width)),
            Style::default().fg(color),
        ));
    }
    if let Some(err) = &state.err {
        return Line::from(Span::styled(
            format!(" {}", truncate_with_ellipsis(&format!("Refresh failed: {err}"), text_width)),
            Style::default().fg(Color::Red),
        ));
    }
    if let Some(version) = &state.update_available {
        return Line::from(Span::styled(
            format!(" Update available: {version}"),
            Style::default().fg(Color::Yellow),
        ));
    }
    Line::from(Span::styled(
        truncate_with_ellipsis(
            " Tab panels · Enter open · / search · r review · a approve · ? help · q quit",
            width,
        ),
        dim(),
    ))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::overlays::{ConfirmState, Overlay};
    use crate::state::MonitorOptions;

    fn draw(app: &AppState) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(app.tui.width, app.tui.height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect()
            })
            .collect()
    }

    fn app(embedded: bool) -> AppState {
        let options = MonitorOptions {
            embedded,
            version: "9.9.9".into(),
            ..MonitorOptions::default()
        };
        let mut tui = TuiState::new("sessY", PathBuf::from("."), options, [0.3, 0.4, 0.3]);
        tui.width = 90;
        tui.height = 30;
        tui.relayout();
        AppState::new(tui)
    }

    #[test]
    fn test_footer_shows_session_status_and_version() {
        let mut app = app(false);
        let _ = app.tui.set_status("Copied td-1", false);
        let text = draw(&app);
        assert!(text[28].contains("sessY"));
        assert!(text[28].contains("v9.9.9"));
        assert!(text[29].contains("Copied td-1"));
    }

    #[test]
    fn test_embedded_has_no_footer() {
        let app = app(true);
        let text = draw(&app);
        assert!(text.iter().all(|l| !l.contains("sessY")));
    }

    #[test]
    fn test_search_bar_and_overlay_draw_on_top() {
        let mut app = app(false);
        app.tui.search.editing = true;
        app.tui.search.query = "login".into();
        app.tui.relayout();
        app.overlay = Some(Overlay::Confirm(ConfirmState::new("td-1", "Fix login")));
        let text = draw(&app);
        assert!(text[0].contains("Search: login"));
        assert!(text.iter().any(|l| l.contains("td-1")));
    }

    #[test]
    fn test_tiny_terminal_does_not_panic() {
        let mut app = app(false);
        for (w, h) in [(1, 1), (5, 3), (20, 4)] {
            app.tui.width = w;
            app.tui.height = h;
            app.tui.relayout();
            draw(&app);
        }
    }
}
