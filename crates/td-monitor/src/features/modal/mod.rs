//! Issue detail modal stack.
//!
//! Each entry shows one issue. Entries above the first are opened from
//! inside a modal (parent epic, epic task) and only scroll; the base entry
//! remembers the panel it came from so `h`/`l` can walk that panel's rows.
//!
//! - `content.rs`: builds the modal's lines (shared by render and scroll math)
//! - `update.rs`: navigation and sub-focus handling
//! - `render.rs`: drawing

pub mod content;
mod render;
pub mod update;

use ratatui::layout::Rect;
use ratatui::text::Line;
use td_types::Issue;

use crate::effects::UiEffect;
use crate::features::panels::Panel;
use crate::overlays::render_utils::centered_rect;
use crate::snapshot::IssueDetails;

/// Markdown rendered off the loop for one width.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMarkdown {
    pub width: u16,
    pub description: Vec<Line<'static>>,
    pub acceptance: Vec<Line<'static>>,
}

#[derive(Debug, Clone)]
pub struct ModalEntry {
    pub issue_id: String,
    /// Panel the base modal was opened from.
    pub source: Option<Panel>,
    pub scroll: usize,
    pub content_lines: usize,
    pub loading: bool,
    pub error: Option<String>,
    pub details: IssueDetails,
    pub markdown: Option<RenderedMarkdown>,
    /// Width of the last markdown request, so a resize asks again.
    pub markdown_requested: Option<u16>,
    pub epic_cursor: usize,
    pub parent_focused: bool,
    pub tasks_focused: bool,
}

impl ModalEntry {
    pub fn new(issue_id: impl Into<String>, source: Option<Panel>) -> Self {
        Self {
            issue_id: issue_id.into(),
            source,
            scroll: 0,
            content_lines: 0,
            loading: true,
            error: None,
            details: IssueDetails::default(),
            markdown: None,
            markdown_requested: None,
            epic_cursor: 0,
            parent_focused: false,
            tasks_focused: false,
        }
    }

    pub fn issue(&self) -> Option<&Issue> {
        self.details.issue.as_ref()
    }

    pub fn has_parent_row(&self) -> bool {
        self.details.parent_epic.is_some()
    }

    pub fn task_count(&self) -> usize {
        self.details.epic_tasks.len()
    }

    pub fn max_scroll(&self, visible_height: usize) -> usize {
        self.content_lines.saturating_sub(visible_height)
    }

    pub fn clamp_scroll(&mut self, visible_height: usize) {
        self.scroll = self.scroll.min(self.max_scroll(visible_height));
    }

    pub fn scroll_by(&mut self, delta: isize, visible_height: usize) {
        self.scroll = self
            .scroll
            .saturating_add_signed(delta)
            .min(self.max_scroll(visible_height));
    }

    /// Re-counts content lines for `width` and clamps the scroll.
    pub fn recount(&mut self, width: usize, visible_height: usize) {
        self.content_lines = content::build(self, width).lines.len();
        self.clamp_scroll(visible_height);
    }

    /// Stores fetched details. Returns false when the fetch failed.
    pub fn apply_details(&mut self, result: Result<Box<IssueDetails>, String>) -> bool {
        self.loading = false;
        match result {
            Ok(details) if details.issue.is_some() => {
                self.error = None;
                let text_changed = match (self.issue(), details.issue.as_ref()) {
                    (Some(old), Some(new)) => {
                        old.description != new.description || old.acceptance != new.acceptance
                    }
                    _ => true,
                };
                if text_changed {
                    // Rendered markdown belongs to the old text.
                    self.markdown = None;
                    self.markdown_requested = None;
                }
                self.details = *details;
                self.epic_cursor = self.epic_cursor.min(self.task_count().saturating_sub(1));
                let is_epic = self.issue().is_some_and(Issue::is_epic);
                if is_epic && self.task_count() > 0 {
                    self.tasks_focused = true;
                    self.parent_focused = false;
                    self.epic_cursor = 0;
                }
                true
            }
            Ok(_) => {
                self.error = Some(format!("Issue {} not found", self.issue_id));
                false
            }
            Err(err) => {
                self.error = Some(err);
                false
            }
        }
    }

    /// Asks for markdown at `width` unless already requested for it.
    pub fn markdown_request(&mut self, width: u16) -> Option<UiEffect> {
        let issue = self.details.issue.as_ref()?;
        if self.markdown_requested == Some(width)
            || (issue.description.trim().is_empty() && issue.acceptance.trim().is_empty())
        {
            return None;
        }
        self.markdown_requested = Some(width);
        Some(UiEffect::RenderMarkdown {
            issue_id: self.issue_id.clone(),
            description: issue.description.clone(),
            acceptance: issue.acceptance.clone(),
            width,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModalStack {
    entries: Vec<ModalEntry>,
}

impl ModalStack {
    /// Opens a modal on top and returns the fetch for it.
    pub fn push(&mut self, issue_id: impl Into<String>, source: Option<Panel>) -> UiEffect {
        let source = if self.entries.is_empty() { source } else { None };
        let entry = ModalEntry::new(issue_id, source);
        let effect = UiEffect::FetchIssueDetails {
            issue_id: entry.issue_id.clone(),
        };
        self.entries.push(entry);
        effect
    }

    pub fn pop(&mut self) -> Option<ModalEntry> {
        self.entries.pop()
    }

    /// Replaces the top entry in place, keeping its source panel.
    pub fn replace_top(&mut self, issue_id: impl Into<String>) -> Option<UiEffect> {
        let top = self.entries.last_mut()?;
        *top = ModalEntry::new(issue_id, top.source);
        Some(UiEffect::FetchIssueDetails {
            issue_id: top.issue_id.clone(),
        })
    }

    pub fn current(&self) -> Option<&ModalEntry> {
        self.entries.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut ModalEntry> {
        self.entries.last_mut()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn is_open(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops every entry showing `issue_id` (after a delete).
    pub fn remove_issue(&mut self, issue_id: &str) {
        self.entries.retain(|e| e.issue_id != issue_id);
    }
}

/// Modal rectangle within the screen.
pub fn modal_area(screen: Rect) -> Rect {
    centered_rect(80, 85, screen)
}

/// Content geometry of the modal: width for text (scrollbar column
/// excluded) and rows for content (borders and hint line excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalGeometry {
    pub content: Rect,
    pub hints: Rect,
}

impl ModalGeometry {
    pub fn new(screen: Rect) -> Self {
        let area = modal_area(screen);
        let inner_w = area.width.saturating_sub(2);
        let inner_h = area.height.saturating_sub(2);
        let content_h = inner_h.saturating_sub(1);
        Self {
            content: Rect::new(area.x + 1, area.y + 1, inner_w.saturating_sub(1), content_h),
            hints: Rect::new(area.x + 1, area.y + 1 + content_h, inner_w, inner_h.min(1)),
        }
    }

    pub fn width(&self) -> u16 {
        self.content.width
    }

    pub fn visible_height(&self) -> usize {
        usize::from(self.content.height).max(1)
    }
}
