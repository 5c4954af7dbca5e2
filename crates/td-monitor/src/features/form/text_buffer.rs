//! Minimal text buffer for form fields.
//!
//! Stores lines plus a `(row, col)` cursor in char units. Single-line
//! buffers ignore Enter.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Up,
    Down,
    Forward,
    Back,
    Head,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    lines: Vec<String>,
    cursor_row: usize,
    cursor_col: usize,
    multiline: bool,
}

impl TextBuffer {
    /// Loads `text` with the cursor at its end.
    pub fn new(text: &str, multiline: bool) -> Self {
        let mut lines: Vec<String> = if multiline {
            text.split('\n').map(str::to_string).collect()
        } else {
            vec![text.replace('\n', " ")]
        };
        if lines.is_empty() {
            lines.push(String::new());
        }
        let cursor_row = lines.len() - 1;
        let cursor_col = line_char_len(&lines[cursor_row]);
        Self {
            lines,
            cursor_row,
            cursor_col,
            multiline,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_col)
    }

    pub fn insert_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let text = if self.multiline {
            text.to_string()
        } else {
            text.replace('\n', " ")
        };
        let row = self.cursor_row;

        if !text.contains('\n') {
            let line = &mut self.lines[row];
            let byte_idx = char_to_byte_index(line, self.cursor_col);
            line.insert_str(byte_idx, &text);
            self.cursor_col += text.chars().count();
            return;
        }

        let current = self.lines[row].clone();
        let (prefix, suffix) = current.split_at(char_to_byte_index(&current, self.cursor_col));
        let parts: Vec<&str> = text.split('\n').collect();
        let last = parts.len() - 1;

        let mut new_lines = Vec::with_capacity(parts.len());
        new_lines.push(format!("{prefix}{}", parts[0]));
        new_lines.extend(parts[1..last].iter().map(|p| (*p).to_string()));
        new_lines.push(format!("{}{suffix}", parts[last]));

        self.lines.splice(row..=row, new_lines);
        self.cursor_row = row + last;
        self.cursor_col = parts[last].chars().count();
    }

    pub fn insert_char(&mut self, ch: char) {
        let mut buf = [0u8; 4];
        self.insert_str(ch.encode_utf8(&mut buf));
    }

    /// Backspace.
    pub fn delete_prev_char(&mut self) {
        if self.cursor_col > 0 {
            let col = self.cursor_col - 1;
            let line = &mut self.lines[self.cursor_row];
            let start = char_to_byte_index(line, col);
            let end = char_to_byte_index(line, col + 1);
            line.replace_range(start..end, "");
            self.cursor_col = col;
            return;
        }
        if self.cursor_row == 0 {
            return;
        }
        let row = self.cursor_row;
        let prev_len = line_char_len(&self.lines[row - 1]);
        let current = self.lines.remove(row);
        self.lines[row - 1].push_str(&current);
        self.cursor_row -= 1;
        self.cursor_col = prev_len;
    }

    /// Delete.
    pub fn delete_next_char(&mut self) {
        let row = self.cursor_row;
        let col = self.cursor_col;
        if col >= line_char_len(&self.lines[row]) {
            if row + 1 < self.lines.len() {
                let next = self.lines.remove(row + 1);
                self.lines[row].push_str(&next);
            }
            return;
        }
        let line = &mut self.lines[row];
        let start = char_to_byte_index(line, col);
        let end = char_to_byte_index(line, col + 1);
        line.replace_range(start..end, "");
    }

    pub fn move_cursor(&mut self, movement: CursorMove) {
        match movement {
            CursorMove::Up if self.cursor_row > 0 => {
                self.cursor_row -= 1;
                self.clamp_col();
            }
            CursorMove::Down if self.cursor_row + 1 < self.lines.len() => {
                self.cursor_row += 1;
                self.clamp_col();
            }
            CursorMove::Forward => {
                if self.cursor_col < line_char_len(&self.lines[self.cursor_row]) {
                    self.cursor_col += 1;
                } else if self.cursor_row + 1 < self.lines.len() {
                    self.cursor_row += 1;
                    self.cursor_col = 0;
                }
            }
            CursorMove::Back => {
                if self.cursor_col > 0 {
                    self.cursor_col -= 1;
                } else if self.cursor_row > 0 {
                    self.cursor_row -= 1;
                    self.cursor_col = line_char_len(&self.lines[self.cursor_row]);
                }
            }
            CursorMove::Head => self.cursor_col = 0,
            CursorMove::End => self.cursor_col = line_char_len(&self.lines[self.cursor_row]),
            CursorMove::Up | CursorMove::Down => {}
        }
    }

    /// Basic editing keys. Returns whether the key was consumed.
    pub fn input(&mut self, key: KeyEvent) -> bool {
        if matches!(key.kind, KeyEventKind::Release) {
            return false;
        }
        match key.code {
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.insert_char(ch);
            }
            KeyCode::Enter if self.multiline => self.insert_str("\n"),
            KeyCode::Backspace => self.delete_prev_char(),
            KeyCode::Delete => self.delete_next_char(),
            KeyCode::Left => self.move_cursor(CursorMove::Back),
            KeyCode::Right => self.move_cursor(CursorMove::Forward),
            KeyCode::Up if self.multiline => self.move_cursor(CursorMove::Up),
            KeyCode::Down if self.multiline => self.move_cursor(CursorMove::Down),
            KeyCode::Home => self.move_cursor(CursorMove::Head),
            KeyCode::End => self.move_cursor(CursorMove::End),
            _ => return false,
        }
        true
    }

    fn clamp_col(&mut self) {
        self.cursor_col = self
            .cursor_col
            .min(line_char_len(&self.lines[self.cursor_row]));
    }
}

fn line_char_len(line: &str) -> usize {
    line.chars().count()
}

fn char_to_byte_index(line: &str, char_idx: usize) -> usize {
    line.char_indices()
        .nth(char_idx)
        .map_or(line.len(), |(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_insert_and_backspace() {
        let mut buf = TextBuffer::new("ab", false);
        buf.insert_char('c');
        assert_eq!(buf.text(), "abc");
        buf.move_cursor(CursorMove::Back);
        buf.delete_prev_char();
        assert_eq!(buf.text(), "ac");
        assert_eq!(buf.cursor(), (0, 1));
    }

    #[test]
    fn test_multiline_insert_splits_lines() {
        let mut buf = TextBuffer::new("hello", true);
        buf.move_cursor(CursorMove::Head);
        buf.insert_str("one\ntwo\n");
        assert_eq!(buf.lines(), ["one", "two", "hello"]);
        assert_eq!(buf.cursor(), (2, 0));
        buf.delete_prev_char();
        assert_eq!(buf.text(), "one\ntwohello");
    }

    #[test]
    fn test_single_line_ignores_enter() {
        let mut buf = TextBuffer::new("a\nb", false);
        assert_eq!(buf.text(), "a b");
        assert!(!buf.input(key(KeyCode::Enter)));
        assert_eq!(buf.text(), "a b");
    }

    #[test]
    fn test_unicode_cursor() {
        let mut buf = TextBuffer::new("héllo", false);
        buf.move_cursor(CursorMove::Head);
        buf.move_cursor(CursorMove::Forward);
        buf.move_cursor(CursorMove::Forward);
        buf.delete_prev_char();
        assert_eq!(buf.text(), "hllo");
    }
}
