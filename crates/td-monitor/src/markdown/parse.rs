use comfy_table::{ContentArrangement, Table};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use super::wrap::{WrapOptions, wrap_chars, wrap_pieces};
use super::{Piece, Tone};
use crate::common::sanitize_for_display;

/// Renders markdown into lines pre-wrapped at `width` columns.
///
/// Never returns an empty vector: blank input yields a single empty line.
pub fn render_markdown(text: &str, width: usize) -> Vec<Line<'static>> {
    let text = sanitize_for_display(text);
    if text.trim().is_empty() {
        return vec![Line::default()];
    }

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    let mut renderer = MarkdownRenderer::new(width.max(1));
    for event in Parser::new_ext(&text, options) {
        renderer.process_event(event);
    }

    renderer
        .finish()
        .into_iter()
        .map(|pieces| {
            Line::from(
                pieces
                    .into_iter()
                    .map(|p| Span::styled(p.text, p.tone.style()))
                    .collect::<Vec<_>>(),
            )
        })
        .collect()
}

#[derive(Debug, Default)]
struct TableBuffer {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    current_row: Vec<String>,
    current_cell: String,
}

impl TableBuffer {
    fn clear(&mut self) {
        *self = Self::default();
    }

    fn finish_cell(&mut self) {
        let cell = std::mem::take(&mut self.current_cell);
        self.current_row.push(cell.trim().to_string());
    }

    fn finish_row(&mut self, is_header: bool) {
        let row = std::mem::take(&mut self.current_row);
        if is_header {
            self.header = row;
        } else {
            self.rows.push(row);
        }
    }

    fn render(&self, max_width: usize) -> Vec<String> {
        let mut table = Table::new();
        table.set_width(u16::try_from(max_width).unwrap_or(u16::MAX));
        table.set_content_arrangement(ContentArrangement::Dynamic);
        if !self.header.is_empty() {
            table.set_header(&self.header);
        }
        for row in &self.rows {
            table.add_row(row);
        }
        table.to_string().lines().map(String::from).collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct ListState {
    ordered: bool,
    next_item: u64,
}

struct MarkdownRenderer {
    width: usize,
    lines: Vec<Vec<Piece>>,
    current: Vec<Piece>,
    tone_stack: Vec<Tone>,
    in_code_block: bool,
    code_lang: Option<String>,
    list_stack: Vec<ListState>,
    quote_depth: usize,
    in_table: bool,
    in_table_head: bool,
    table: TableBuffer,
}

impl MarkdownRenderer {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            current: Vec::new(),
            tone_stack: vec![Tone::Plain],
            in_code_block: false,
            code_lang: None,
            list_stack: Vec::new(),
            quote_depth: 0,
            in_table: false,
            in_table_head: false,
            table: TableBuffer::default(),
        }
    }

    fn tone(&self) -> Tone {
        self.tone_stack.last().copied().unwrap_or(Tone::Plain)
    }

    fn push_tone(&mut self, tone: Tone) {
        self.tone_stack.push(tone);
    }

    fn pop_tone(&mut self) {
        if self.tone_stack.len() > 1 {
            self.tone_stack.pop();
        }
    }

    fn blank_line(&mut self) {
        self.lines.push(Vec::new());
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.add_text(&text),
            Event::Code(code) => self.add_inline_code(&code),
            Event::SoftBreak => self.add_text(" "),
            Event::HardBreak => {
                if self.in_table {
                    self.table.current_cell.push(' ');
                } else {
                    self.current.push(Piece::new("\n", self.tone()));
                }
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.current.push(Piece::new(marker, Tone::Bullet));
            }
            Event::Rule => {
                self.flush_paragraph();
                self.lines
                    .push(vec![Piece::new("─".repeat(self.width.min(40)), Tone::CodeFence)]);
            }
            // Raw HTML is dropped so it cannot inject terminal sequences.
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_paragraph();
                self.push_tone(match level {
                    HeadingLevel::H1 => Tone::H1,
                    HeadingLevel::H2 => Tone::H2,
                    _ => Tone::H3,
                });
            }
            Tag::CodeBlock(kind) => {
                self.flush_paragraph();
                self.in_code_block = true;
                self.code_lang = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                };
                self.push_tone(Tone::CodeBlock);
            }
            Tag::List(start) => {
                self.flush_list_item();
                self.list_stack.push(ListState {
                    ordered: start.is_some(),
                    next_item: start.unwrap_or(1),
                });
            }
            Tag::Item => self.flush_list_item(),
            Tag::BlockQuote(_) => {
                self.flush_paragraph();
                self.quote_depth += 1;
                self.push_tone(Tone::Quote);
            }
            Tag::Emphasis => self.push_tone(Tone::Emphasis),
            Tag::Strong => self.push_tone(Tone::Strong),
            Tag::Link { .. } => self.push_tone(Tone::Link),
            Tag::Strikethrough => self.push_tone(self.tone()),
            Tag::Table(_) => {
                self.flush_paragraph();
                self.in_table = true;
                self.table.clear();
            }
            Tag::TableHead => self.in_table_head = true,
            Tag::TableCell => self.table.current_cell.clear(),
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.list_stack.is_empty() {
                    self.flush_paragraph();
                    self.blank_line();
                } else {
                    self.flush_list_item();
                }
            }
            TagEnd::Heading(_) => {
                self.flush_paragraph();
                self.pop_tone();
                self.blank_line();
            }
            TagEnd::CodeBlock => {
                self.flush_code_block();
                self.in_code_block = false;
                self.pop_tone();
                self.blank_line();
            }
            TagEnd::List(_) => {
                self.flush_list_item();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => {
                self.flush_list_item();
                if let Some(list) = self.list_stack.last_mut() {
                    list.next_item += 1;
                }
            }
            TagEnd::BlockQuote(_) => {
                self.flush_paragraph();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.pop_tone();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.pop_tone();
            }
            TagEnd::Table => {
                for line in self.table.render(self.width) {
                    self.lines.push(vec![Piece::new(line, Tone::Plain)]);
                }
                self.table.clear();
                self.in_table = false;
                self.blank_line();
            }
            TagEnd::TableHead => {
                self.table.finish_row(true);
                self.in_table_head = false;
            }
            TagEnd::TableRow => {
                if !self.in_table_head {
                    self.table.finish_row(false);
                }
            }
            TagEnd::TableCell => self.table.finish_cell(),
            _ => {}
        }
    }

    fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.in_table {
            self.table.current_cell.push_str(&text.replace('\n', " "));
            return;
        }
        self.current.push(Piece::new(text, self.tone()));
    }

    fn add_inline_code(&mut self, code: &str) {
        if self.in_table {
            self.table
                .current_cell
                .push_str(&format!("`{}`", code.replace('\n', " ")));
            return;
        }
        self.current.push(Piece::new(code, Tone::CodeInline));
    }

    fn flush_paragraph(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let pieces = std::mem::take(&mut self.current);
        let opts = if self.quote_depth > 0 {
            let bar = vec![Piece::new("│ ".repeat(self.quote_depth), Tone::CodeFence)];
            WrapOptions {
                width: self.width,
                first_prefix: bar.clone(),
                rest_prefix: bar,
            }
        } else {
            WrapOptions::new(self.width)
        };
        self.lines.extend(wrap_pieces(&pieces, &opts));
    }

    fn flush_code_block(&mut self) {
        let text: String = std::mem::take(&mut self.current)
            .into_iter()
            .map(|p| p.text)
            .collect();
        let fence = match self.code_lang.take() {
            Some(lang) => format!("```{lang}"),
            None => "```".to_string(),
        };
        self.lines.push(vec![Piece::new(fence, Tone::CodeFence)]);
        let body_width = self.width.saturating_sub(2).max(1);
        for line in text.trim_end_matches('\n').split('\n') {
            for part in wrap_chars(line, body_width) {
                self.lines.push(vec![
                    Piece::new("  ", Tone::Plain),
                    Piece::new(part, Tone::CodeBlock),
                ]);
            }
        }
        self.lines.push(vec![Piece::new("```", Tone::CodeFence)]);
    }

    fn flush_list_item(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let pieces = std::mem::take(&mut self.current);
        let (marker, tone) = match self.list_stack.last() {
            Some(list) if list.ordered => (format!("{}. ", list.next_item), Tone::Number),
            _ => ("• ".to_string(), Tone::Bullet),
        };
        let indent = "  ".repeat(self.list_stack.len().saturating_sub(1));
        let opts = WrapOptions {
            width: self.width,
            first_prefix: vec![Piece::new(indent.clone(), Tone::Plain), Piece::new(marker.clone(), tone)],
            rest_prefix: vec![Piece::new(
                format!("{indent}{}", " ".repeat(marker.width())),
                Tone::Plain,
            )],
        };
        self.lines.extend(wrap_pieces(&pieces, &opts));
    }

    fn finish(mut self) -> Vec<Vec<Piece>> {
        if self.in_code_block {
            self.flush_code_block();
        } else if self.list_stack.is_empty() {
            self.flush_paragraph();
        } else {
            self.flush_list_item();
        }

        while self.lines.last().is_some_and(|l| l.iter().all(|p| p.text.trim().is_empty())) {
            self.lines.pop();
        }
        if self.lines.is_empty() {
            self.lines.push(Vec::new());
        }
        self.lines
    }
}
