//! External editor for long form fields.
//!
//! Runs synchronously: the runtime suspends the terminal around the call so
//! the child process owns it.

use std::env;
use std::fs;
use std::io::Write;
use std::process::Command;

use anyhow::{Context, Result, bail};

const FALLBACK_EDITOR: &str = "vim";

/// `$VISUAL`, then `$EDITOR`, then vim.
pub fn editor_command() -> String {
    pick_editor(env::var("VISUAL").ok(), env::var("EDITOR").ok())
}

fn pick_editor(visual: Option<String>, editor: Option<String>) -> String {
    [visual, editor]
        .into_iter()
        .flatten()
        .find(|cmd| !cmd.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

/// Writes `content` to a temporary `.md` file, runs `command` on it and
/// returns the edited text. The file is removed afterwards.
///
/// `command` may carry arguments (`code --wait`).
///
/// # Errors
/// Returns an error if the file cannot be written or read back, the editor
/// cannot be started, or it exits unsuccessfully.
pub fn edit_in_editor(command: &str, content: &str) -> Result<String> {
    let mut file = tempfile::Builder::new()
        .prefix("td-")
        .suffix(".md")
        .tempfile()
        .context("Failed to create temp file")?;
    file.write_all(content.as_bytes())
        .context("Failed to write temp file")?;
    file.flush().context("Failed to write temp file")?;

    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("Editor command is empty");
    };
    let status = Command::new(program)
        .args(parts)
        .arg(file.path())
        .status()
        .with_context(|| format!("Failed to start editor {program}"))?;
    tracing::debug!(editor = program, code = ?status.code(), "editor_exited");
    if !status.success() {
        bail!("{program} exited with {status}");
    }

    fs::read_to_string(file.path()).context("Failed to read edited file")
}
