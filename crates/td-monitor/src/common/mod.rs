//! Shared utilities for the monitor UI.
//!
//! - `clipboard.rs`: copy to the system clipboard
//! - `format.rs`: colors and labels for statuses, priorities and times
//! - `scrollbar.rs`: stable-thumb scrollbar widget
//! - `text.rs`: width-aware truncation and sanitizing

pub mod clipboard;
pub mod format;
pub mod scrollbar;
pub mod text;

pub use clipboard::{Clipboard, ClipboardError};
pub use scrollbar::Scrollbar;
pub use text::{
    pad_to_width, sanitize_for_display, truncate_start_with_ellipsis, truncate_with_ellipsis,
};
