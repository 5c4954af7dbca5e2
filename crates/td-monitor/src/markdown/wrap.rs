use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::{Piece, Tone};

/// Options for wrapping pieces with hanging indents.
#[derive(Debug, Clone, Default)]
pub(crate) struct WrapOptions {
    pub width: usize,
    /// Prefix for the first line (e.g. a list bullet).
    pub first_prefix: Vec<Piece>,
    /// Prefix for continuation lines.
    pub rest_prefix: Vec<Piece>,
}

impl WrapOptions {
    pub(crate) fn new(width: usize) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }
}

fn pieces_width(pieces: &[Piece]) -> usize {
    pieces.iter().map(|p| p.text.width()).sum()
}

struct WrapContext<'a> {
    lines: Vec<Vec<Piece>>,
    current: Vec<Piece>,
    current_width: usize,
    is_first_line: bool,
    first_width: usize,
    rest_width: usize,
    opts: &'a WrapOptions,
}

impl WrapContext<'_> {
    fn flush_line(&mut self) {
        let mut line = if self.is_first_line {
            self.opts.first_prefix.clone()
        } else {
            self.opts.rest_prefix.clone()
        };
        line.append(&mut self.current);
        self.lines.push(line);
        self.is_first_line = false;
        self.current_width = 0;
    }

    fn avail(&self) -> usize {
        if self.is_first_line {
            self.first_width
        } else {
            self.rest_width
        }
    }

    fn push(&mut self, piece: Piece) {
        self.current_width += piece.text.width();
        self.current.push(piece);
    }

    fn push_space(&mut self, tone: Tone) {
        if !self.current.is_empty() && self.current_width < self.avail() {
            self.push(Piece::new(" ", tone));
        }
    }
}

/// Wraps pieces to `opts.width`, preserving tones across breaks.
///
/// Normal text breaks at word boundaries and collapses whitespace. Code keeps
/// its whitespace and breaks by character.
pub(crate) fn wrap_pieces(pieces: &[Piece], opts: &WrapOptions) -> Vec<Vec<Piece>> {
    if opts.width == 0 || pieces.is_empty() {
        let mut line = opts.first_prefix.clone();
        line.extend(pieces.iter().cloned());
        return vec![line];
    }

    let mut ctx = WrapContext {
        lines: Vec::new(),
        current: Vec::new(),
        current_width: 0,
        is_first_line: true,
        first_width: opts.width.saturating_sub(pieces_width(&opts.first_prefix)).max(1),
        rest_width: opts.width.saturating_sub(pieces_width(&opts.rest_prefix)).max(1),
        opts,
    };

    for piece in pieces {
        for (i, part) in piece.text.split('\n').enumerate() {
            if i > 0 {
                ctx.flush_line();
            }
            if part.is_empty() {
                continue;
            }
            let part = Piece::new(part, piece.tone);
            if part.tone.is_code() {
                wrap_code(&part, &mut ctx);
            } else {
                wrap_words(&part, &mut ctx);
            }
        }
    }

    if !ctx.current.is_empty() {
        ctx.flush_line();
    }
    if ctx.lines.is_empty() {
        ctx.lines.push(opts.first_prefix.clone());
    }
    ctx.lines
}

fn wrap_code(piece: &Piece, ctx: &mut WrapContext) {
    let width = piece.text.width();
    if ctx.current_width + width <= ctx.avail() {
        ctx.push(piece.clone());
        return;
    }
    if width <= ctx.rest_width && ctx.current_width > 0 {
        ctx.flush_line();
        ctx.push(piece.clone());
        return;
    }
    let first_room = ctx.avail().saturating_sub(ctx.current_width).max(1);
    let mut rest = piece.text.as_str();
    let mut room = first_room;
    while !rest.is_empty() {
        let (head, tail) = split_at_width(rest, room);
        ctx.push(Piece::new(head, piece.tone));
        rest = tail;
        if !rest.is_empty() {
            ctx.flush_line();
            room = ctx.avail();
        }
    }
}

fn wrap_words(piece: &Piece, ctx: &mut WrapContext) {
    let leading = piece.text.starts_with(char::is_whitespace);
    let trailing = piece.text.ends_with(char::is_whitespace);
    let words: Vec<&str> = piece.text.split_whitespace().collect();

    if words.is_empty() {
        ctx.push_space(piece.tone);
        return;
    }
    if leading {
        ctx.push_space(piece.tone);
    }

    for (i, word) in words.iter().enumerate() {
        let word_width = word.width();
        if i > 0 {
            if ctx.current_width + 1 + word_width <= ctx.avail() {
                ctx.push(Piece::new(" ", piece.tone));
            } else {
                ctx.flush_line();
            }
        }

        if word_width <= ctx.avail().saturating_sub(ctx.current_width) {
            ctx.push(Piece::new(*word, piece.tone));
        } else if word_width <= ctx.rest_width && ctx.current_width > 0 {
            ctx.flush_line();
            ctx.push(Piece::new(*word, piece.tone));
        } else {
            if ctx.current_width > 0 {
                ctx.flush_line();
            }
            for part in wrap_chars(word, ctx.avail()) {
                if ctx.current_width > 0 {
                    ctx.flush_line();
                }
                ctx.push(Piece::new(part, piece.tone));
            }
        }
    }

    if trailing {
        ctx.push_space(piece.tone);
    }
}

/// Splits off the longest prefix fitting `max_width`, always at least one
/// character.
fn split_at_width(text: &str, max_width: usize) -> (&str, &str) {
    let mut width = 0;
    for (idx, ch) in text.char_indices() {
        let ch_width = ch.width().unwrap_or(0);
        if idx > 0 && width + ch_width > max_width {
            return text.split_at(idx);
        }
        width += ch_width;
    }
    (text, "")
}

/// Wraps plain text at word boundaries. Empty input yields one empty line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for word in text.split_whitespace() {
        let word_width = word.width();
        if !current.is_empty() && current_width + 1 + word_width <= width {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if word_width > width {
            let mut parts = wrap_chars(word, width);
            if let Some(last) = parts.pop() {
                lines.extend(parts);
                current_width = last.width();
                current = last;
            }
        } else {
            current = word.to_string();
            current_width = word_width;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Breaks a string at character boundaries so each part fits `width`.
///
/// Tabs must be expanded by the caller; `unicode_width` reports them as zero.
pub fn wrap_chars(text: &str, width: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if ch_width == 0 {
            current.push(ch);
            continue;
        }
        if current_width + ch_width > width && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(ch);
        current_width += ch_width;
    }

    if !current.is_empty() {
        parts.push(current);
    }
    if parts.is_empty() {
        parts.push(String::new());
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &[Piece]) -> String {
        line.iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn test_wrap_text_split() {
        assert_eq!(wrap_text("hello world", 20), vec!["hello world"]);
        assert_eq!(wrap_text("hello world", 8), vec!["hello", "world"]);
        assert_eq!(wrap_text("", 8), vec![""]);
    }

    #[test]
    fn test_wrap_text_long_word() {
        assert_eq!(
            wrap_text("supercalifragilistic", 10),
            vec!["supercalif", "ragilistic"]
        );
    }

    #[test]
    fn test_wrap_chars_cjk() {
        assert_eq!(wrap_chars("你好世界很长", 4), vec!["你好", "世界", "很长"]);
    }

    #[test]
    fn test_wrap_pieces_keeps_tones_across_break() {
        let pieces = vec![
            Piece::new("hello ", Tone::Plain),
            Piece::new("bold words here", Tone::Strong),
        ];
        let lines = wrap_pieces(&pieces, &WrapOptions::new(12));
        assert_eq!(lines.len(), 2);
        assert_eq!(text_of(&lines[0]), "hello bold");
        assert_eq!(text_of(&lines[1]), "words here");
        assert!(lines[1].iter().all(|p| p.tone == Tone::Strong));
    }

    #[test]
    fn test_wrap_pieces_hanging_indent() {
        let opts = WrapOptions {
            width: 10,
            first_prefix: vec![Piece::new("• ", Tone::Bullet)],
            rest_prefix: vec![Piece::new("  ", Tone::Plain)],
        };
        let lines = wrap_pieces(&[Piece::new("one two three", Tone::Plain)], &opts);
        assert_eq!(text_of(&lines[0]), "• one two");
        assert_eq!(text_of(&lines[1]), "  three");
    }

    #[test]
    fn test_wrap_pieces_never_exceeds_width() {
        let pieces = vec![Piece::new("x".repeat(25), Tone::CodeInline)];
        let lines = wrap_pieces(&pieces, &WrapOptions::new(10));
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| text_of(l).width() <= 10));
    }
}
