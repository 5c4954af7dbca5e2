//! Key-to-command registry.
//!
//! Built once at startup and read-only afterwards. Each binding belongs to a
//! [`Context`]; the reducer resolves the context from state and looks the key
//! up here. The help overlay is generated from the same table.

use std::collections::HashMap;
use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::features::panels::Panel;

/// Mode selecting which binding set applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Main,
    Search,
    Modal,
    ParentEpicFocused,
    EpicTasks,
    Confirm,
    Form,
    Handoffs,
    Stats,
    Help,
}

impl Context {
    pub fn title(self) -> &'static str {
        match self {
            Context::Main => "Main",
            Context::Search => "Search",
            Context::Modal => "Issue",
            Context::ParentEpicFocused => "Parent epic",
            Context::EpicTasks => "Epic tasks",
            Context::Confirm => "Confirm",
            Context::Form => "Form",
            Context::Handoffs => "Handoffs",
            Context::Stats => "Stats",
            Context::Help => "Help",
        }
    }
}

/// Logical command produced by the keymap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Down,
    Up,
    HalfPageDown,
    HalfPageUp,
    Top,
    Bottom,
    NextPanel,
    PrevPanel,
    FocusPanel(Panel),
    Select,
    Back,
    PrevIssue,
    NextIssue,
    MarkForReview,
    Approve,
    CloseIssue,
    Reopen,
    Delete,
    StartSearch,
    ClearSearch,
    CycleSort,
    CycleTypeFilter,
    ToggleClosed,
    NewIssue,
    EditIssue,
    CopyId,
    CopyMarkdown,
    Handoffs,
    Stats,
    Help,
    Refresh,
    Confirm,
    Cancel,
    SearchBackspace,
    CommitSearch,
    QueryHelp,
    FormSubmit,
    FormToggleExtended,
    FormEditor,
    FormNextField,
    FormPrevField,
}

/// A key plus the modifiers that matter for lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyStroke {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyStroke {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        // Shift is already folded into the character (or BackTab).
        let modifiers = match code {
            KeyCode::Char(_) | KeyCode::BackTab => modifiers - KeyModifiers::SHIFT,
            _ => modifiers,
        };
        Self {
            code,
            modifiers: modifiers & (KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT),
        }
    }

    pub fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub fn char(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

impl From<&KeyEvent> for KeyStroke {
    fn from(key: &KeyEvent) -> Self {
        Self::new(key.code, key.modifiers)
    }
}

impl fmt::Display for KeyStroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            f.write_str("Ctrl+")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            f.write_str("Alt+")?;
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            f.write_str("Shift+")?;
        }
        match self.code {
            KeyCode::Char(' ') => f.write_str("Space"),
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Up => f.write_str("↑"),
            KeyCode::Down => f.write_str("↓"),
            KeyCode::Left => f.write_str("←"),
            KeyCode::Right => f.write_str("→"),
            KeyCode::Enter => f.write_str("Enter"),
            KeyCode::Esc => f.write_str("Esc"),
            KeyCode::Tab => f.write_str("Tab"),
            KeyCode::BackTab => f.write_str("Shift+Tab"),
            KeyCode::Backspace => f.write_str("Backspace"),
            KeyCode::Home => f.write_str("Home"),
            KeyCode::End => f.write_str("End"),
            KeyCode::PageUp => f.write_str("PgUp"),
            KeyCode::PageDown => f.write_str("PgDn"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[derive(Debug, Clone)]
struct Binding {
    context: Context,
    key: KeyStroke,
    command: Command,
    description: &'static str,
}

/// One help row: every key bound to a command in a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    pub keys: String,
    pub description: &'static str,
}

#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: Vec<Binding>,
    lookup: HashMap<(Context, KeyStroke), Command>,
}

impl Default for Keymap {
    fn default() -> Self {
        let mut map = Keymap {
            bindings: Vec::new(),
            lookup: HashMap::new(),
        };
        map.register_defaults();
        map
    }
}

impl Keymap {
    fn bind(
        &mut self,
        context: Context,
        keys: &[KeyStroke],
        command: Command,
        description: &'static str,
    ) {
        for &key in keys {
            self.lookup.insert((context, key), command);
            self.bindings.push(Binding {
                context,
                key,
                command,
                description,
            });
        }
    }

    pub fn resolve(&self, context: Context, key: &KeyEvent) -> Option<Command> {
        self.lookup.get(&(context, KeyStroke::from(key))).copied()
    }

    /// Help rows for `context`, one per command in registration order.
    pub fn help_entries(&self, context: Context) -> Vec<HelpEntry> {
        let mut entries: Vec<(Command, Vec<String>, &'static str)> = Vec::new();
        for binding in self.bindings.iter().filter(|b| b.context == context) {
            match entries.iter_mut().find(|(c, _, _)| *c == binding.command) {
                Some((_, keys, _)) => keys.push(binding.key.to_string()),
                None => entries.push((
                    binding.command,
                    vec![binding.key.to_string()],
                    binding.description,
                )),
            }
        }
        entries
            .into_iter()
            .map(|(_, keys, description)| HelpEntry {
                keys: keys.join("/"),
                description,
            })
            .collect()
    }

    #[allow(clippy::too_many_lines)]
    fn register_defaults(&mut self) {
        use Command as C;
        use Context as X;
        let k = KeyStroke::char;
        let ctrl = KeyStroke::ctrl;
        let key = KeyStroke::plain;

        self.bind(X::Main, &[k('q'), ctrl('c')], C::Quit, "Quit");
        self.bind(X::Main, &[key(KeyCode::Tab)], C::NextPanel, "Next panel");
        self.bind(X::Main, &[key(KeyCode::BackTab)], C::PrevPanel, "Previous panel");
        self.bind(X::Main, &[k('1')], C::FocusPanel(Panel::CurrentWork), "Focus current work");
        self.bind(X::Main, &[k('2')], C::FocusPanel(Panel::TaskList), "Focus task list");
        self.bind(X::Main, &[k('3')], C::FocusPanel(Panel::Activity), "Focus activity");
        self.bind(X::Main, &[k('j'), key(KeyCode::Down)], C::Down, "Cursor down");
        self.bind(X::Main, &[k('k'), key(KeyCode::Up)], C::Up, "Cursor up");
        self.bind(X::Main, &[ctrl('d')], C::HalfPageDown, "Half page down");
        self.bind(X::Main, &[ctrl('u')], C::HalfPageUp, "Half page up");
        self.bind(X::Main, &[k('g'), key(KeyCode::Home)], C::Top, "Top");
        self.bind(X::Main, &[k('G'), key(KeyCode::End)], C::Bottom, "Bottom");
        self.bind(X::Main, &[key(KeyCode::Enter)], C::Select, "Open issue");
        self.register_issue_actions(X::Main);
        self.bind(X::Main, &[k('/')], C::StartSearch, "Search");
        self.bind(X::Main, &[key(KeyCode::Esc)], C::ClearSearch, "Clear search");
        self.bind(X::Main, &[k('s')], C::CycleSort, "Cycle sort");
        self.bind(X::Main, &[k('t')], C::CycleTypeFilter, "Cycle type filter");
        self.bind(X::Main, &[k('c')], C::ToggleClosed, "Toggle closed issues");
        self.bind(X::Main, &[k('H')], C::Handoffs, "Handoffs");
        self.bind(X::Main, &[k('S')], C::Stats, "Stats");
        self.bind(X::Main, &[k('?')], C::Help, "Help");
        self.bind(X::Main, &[k('R')], C::Refresh, "Refresh");

        self.bind(X::Modal, &[key(KeyCode::Esc), k('q')], C::Back, "Close");
        self.bind(X::Modal, &[k('j'), key(KeyCode::Down)], C::Down, "Scroll down");
        self.bind(X::Modal, &[k('k'), key(KeyCode::Up)], C::Up, "Scroll up");
        self.bind(X::Modal, &[ctrl('d')], C::HalfPageDown, "Page down");
        self.bind(X::Modal, &[ctrl('u')], C::HalfPageUp, "Page up");
        self.bind(X::Modal, &[k('g')], C::Top, "Top");
        self.bind(X::Modal, &[k('G')], C::Bottom, "Bottom");
        self.bind(X::Modal, &[k('h'), key(KeyCode::Left)], C::PrevIssue, "Previous issue");
        self.bind(X::Modal, &[k('l'), key(KeyCode::Right)], C::NextIssue, "Next issue");
        self.register_issue_actions(X::Modal);
        self.bind(X::Modal, &[k('?')], C::Help, "Help");
        self.bind(X::Modal, &[ctrl('c')], C::Quit, "Quit");

        self.bind(X::ParentEpicFocused, &[key(KeyCode::Enter)], C::Select, "Open parent epic");
        self.bind(X::ParentEpicFocused, &[k('j'), key(KeyCode::Down)], C::Down, "Scroll down");
        self.bind(
            X::ParentEpicFocused,
            &[k('k'), key(KeyCode::Up), key(KeyCode::Esc)],
            C::Back,
            "Unfocus parent",
        );
        self.bind(X::ParentEpicFocused, &[ctrl('c')], C::Quit, "Quit");

        self.bind(X::EpicTasks, &[k('j'), key(KeyCode::Down)], C::Down, "Next task");
        self.bind(X::EpicTasks, &[k('k'), key(KeyCode::Up)], C::Up, "Previous task");
        self.bind(X::EpicTasks, &[key(KeyCode::Enter)], C::Select, "Open task");
        self.bind(
            X::EpicTasks,
            &[key(KeyCode::Esc), key(KeyCode::Tab)],
            C::Back,
            "Unfocus tasks",
        );
        self.bind(X::EpicTasks, &[ctrl('c')], C::Quit, "Quit");

        self.bind(X::Search, &[key(KeyCode::Backspace)], C::SearchBackspace, "Delete character");
        self.bind(X::Search, &[key(KeyCode::Enter)], C::CommitSearch, "Apply search");
        self.bind(X::Search, &[key(KeyCode::Esc)], C::ClearSearch, "Clear and exit");
        self.bind(X::Search, &[k('?')], C::QueryHelp, "Query help");
        self.bind(X::Search, &[ctrl('c')], C::Quit, "Quit");

        self.bind(X::Confirm, &[k('y'), k('Y'), key(KeyCode::Enter)], C::Confirm, "Confirm");
        self.bind(X::Confirm, &[k('n'), k('N'), key(KeyCode::Esc)], C::Cancel, "Cancel");

        self.bind(X::Form, &[ctrl('s')], C::FormSubmit, "Submit");
        self.bind(X::Form, &[key(KeyCode::Esc)], C::Cancel, "Cancel");
        self.bind(X::Form, &[ctrl('x')], C::FormToggleExtended, "Toggle extended fields");
        self.bind(X::Form, &[ctrl('o')], C::FormEditor, "Edit description in $EDITOR");
        self.bind(X::Form, &[key(KeyCode::Tab)], C::FormNextField, "Next field");
        self.bind(X::Form, &[key(KeyCode::BackTab)], C::FormPrevField, "Previous field");

        self.bind(X::Handoffs, &[k('j'), key(KeyCode::Down)], C::Down, "Down");
        self.bind(X::Handoffs, &[k('k'), key(KeyCode::Up)], C::Up, "Up");
        self.bind(X::Handoffs, &[key(KeyCode::Enter)], C::Select, "Open issue");
        self.bind(X::Handoffs, &[key(KeyCode::Esc), k('q'), k('H')], C::Back, "Close");

        self.bind(X::Stats, &[k('j'), key(KeyCode::Down)], C::Down, "Scroll down");
        self.bind(X::Stats, &[k('k'), key(KeyCode::Up)], C::Up, "Scroll up");
        self.bind(X::Stats, &[key(KeyCode::Esc), k('q'), k('S')], C::Back, "Close");

        self.bind(X::Help, &[k('j'), key(KeyCode::Down)], C::Down, "Scroll down");
        self.bind(X::Help, &[k('k'), key(KeyCode::Up)], C::Up, "Scroll up");
        self.bind(X::Help, &[key(KeyCode::Esc), k('q'), k('?')], C::Back, "Close");
    }

    fn register_issue_actions(&mut self, context: Context) {
        let k = KeyStroke::char;
        self.bind(context, &[k('r')], Command::MarkForReview, "Mark for review");
        self.bind(context, &[k('a')], Command::Approve, "Approve");
        self.bind(context, &[k('x')], Command::CloseIssue, "Close issue");
        self.bind(context, &[k('O')], Command::Reopen, "Reopen issue");
        self.bind(context, &[k('d')], Command::Delete, "Delete issue");
        self.bind(context, &[k('n')], Command::NewIssue, "New issue");
        self.bind(context, &[k('e')], Command::EditIssue, "Edit issue");
        self.bind(context, &[k('y')], Command::CopyId, "Copy ID");
        self.bind(context, &[k('Y')], Command::CopyMarkdown, "Copy as markdown");
    }
}
