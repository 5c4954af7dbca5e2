//! Markdown rendering for issue descriptions and acceptance criteria.
//!
//! Output is pre-wrapped to the requested width so every returned line is
//! exactly one screen row. Rendering runs off the UI loop.

mod parse;
mod wrap;

pub use parse::render_markdown;
pub use wrap::{wrap_chars, wrap_text};

use ratatui::style::{Color, Modifier, Style};

/// Semantic style of a rendered fragment, mapped to a terminal style last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tone {
    Plain,
    Strong,
    Emphasis,
    CodeInline,
    CodeBlock,
    CodeFence,
    H1,
    H2,
    H3,
    Link,
    Quote,
    Bullet,
    Number,
}

impl Tone {
    pub(crate) fn is_code(self) -> bool {
        matches!(self, Tone::CodeInline | Tone::CodeBlock)
    }

    pub(crate) fn style(self) -> Style {
        match self {
            Tone::Plain => Style::default(),
            Tone::Strong => Style::default().add_modifier(Modifier::BOLD),
            Tone::Emphasis => Style::default().add_modifier(Modifier::ITALIC),
            Tone::CodeInline => Style::default().fg(Color::LightYellow),
            Tone::CodeBlock => Style::default().fg(Color::Gray),
            Tone::CodeFence => Style::default().fg(Color::DarkGray),
            Tone::H1 => Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            Tone::H2 => Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            Tone::H3 => Style::default().fg(Color::LightCyan),
            Tone::Link => Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            Tone::Quote => Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
            Tone::Bullet | Tone::Number => Style::default().fg(Color::Magenta),
        }
    }
}

/// A run of text sharing one tone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Piece {
    pub text: String,
    pub tone: Tone,
}

impl Piece {
    pub(crate) fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}
