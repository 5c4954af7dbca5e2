//! Issue create/edit form.
//!
//! Field values live in [`FormValues`]; the focused text field is edited
//! through a [`TextBuffer`] and written back on every focus change, so
//! toggling the extended section never loses input.

mod render;
pub mod submit;
pub mod text_buffer;

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use td_types::{Issue, IssueType, Priority, Status};
pub use text_buffer::TextBuffer;

use crate::effects::UiEffect;
use crate::keymap::Command;
use crate::overlays::OverlayUpdate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Title,
    Type,
    Priority,
    Status,
    Description,
    Labels,
    Parent,
    Points,
    Acceptance,
    Dependencies,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    MultiLine,
    Select,
    Toggle,
}

impl FormField {
    pub fn label(self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Type => "Type",
            FormField::Priority => "Priority",
            FormField::Status => "Status",
            FormField::Description => "Description",
            FormField::Labels => "Labels",
            FormField::Parent => "Parent",
            FormField::Points => "Points",
            FormField::Acceptance => "Acceptance",
            FormField::Dependencies => "Depends on",
            FormField::Minor => "Minor",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            FormField::Type | FormField::Priority | FormField::Status => FieldKind::Select,
            FormField::Description | FormField::Acceptance => FieldKind::MultiLine,
            FormField::Minor => FieldKind::Toggle,
            _ => FieldKind::Text,
        }
    }
}

/// Every form value, kept as the user entered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValues {
    pub title: String,
    pub issue_type: IssueType,
    pub priority: Priority,
    pub status: Status,
    pub description: String,
    pub labels: String,
    pub parent: String,
    pub points: String,
    pub acceptance: String,
    pub dependencies: String,
    pub minor: bool,
}

impl Default for FormValues {
    fn default() -> Self {
        Self {
            title: String::new(),
            issue_type: IssueType::default(),
            priority: Priority::default(),
            status: Status::default(),
            description: String::new(),
            labels: String::new(),
            parent: String::new(),
            points: String::new(),
            acceptance: String::new(),
            dependencies: String::new(),
            minor: false,
        }
    }
}

/// Validation failure tied to one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

impl FormValues {
    pub fn from_issue(issue: &Issue) -> Self {
        Self {
            title: issue.title.clone(),
            issue_type: issue.issue_type,
            priority: issue.priority,
            status: issue.status,
            description: issue.description.clone(),
            labels: issue.labels.join(", "),
            parent: issue.parent_id.clone().unwrap_or_default(),
            points: if issue.points == 0 {
                String::new()
            } else {
                issue.points.to_string()
            },
            acceptance: issue.acceptance.clone(),
            dependencies: String::new(),
            minor: issue.minor,
        }
    }

    fn text(&self, field: FormField) -> Option<&str> {
        Some(match field {
            FormField::Title => &self.title,
            FormField::Description => &self.description,
            FormField::Labels => &self.labels,
            FormField::Parent => &self.parent,
            FormField::Points => &self.points,
            FormField::Acceptance => &self.acceptance,
            FormField::Dependencies => &self.dependencies,
            _ => return None,
        })
    }

    fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        Some(match field {
            FormField::Title => &mut self.title,
            FormField::Description => &mut self.description,
            FormField::Labels => &mut self.labels,
            FormField::Parent => &mut self.parent,
            FormField::Points => &mut self.points,
            FormField::Acceptance => &mut self.acceptance,
            FormField::Dependencies => &mut self.dependencies,
            _ => return None,
        })
    }

    /// Builds the issue to store. `base` is the issue being edited.
    pub fn to_issue(&self, base: Option<&Issue>, now: DateTime<Utc>) -> Result<Issue, FieldError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(FieldError {
                field: FormField::Title,
                message: "Title is required".to_string(),
            });
        }
        let points = match self.points.trim() {
            "" => 0,
            raw => raw.parse::<u32>().map_err(|e| FieldError {
                field: FormField::Points,
                message: format!("Points must be a whole number ({e})"),
            })?,
        };

        let mut issue = match base {
            Some(base) => {
                let mut issue = base.clone();
                issue.status = self.status;
                issue
            }
            None => Issue::new("", title, now),
        };
        issue.title = title.to_string();
        issue.issue_type = self.issue_type;
        issue.priority = self.priority;
        issue.description = self.description.trim_end().to_string();
        issue.acceptance = self.acceptance.trim_end().to_string();
        issue.labels = split_list(&self.labels);
        issue.parent_id = Some(self.parent.trim().to_string()).filter(|p| !p.is_empty());
        issue.points = points;
        issue.minor = self.minor;
        issue.updated_at = now;
        Ok(issue)
    }

    pub fn dependency_ids(&self) -> Vec<String> {
        split_list(&self.dependencies)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Create,
    Edit { original: Box<Issue> },
}

/// Work handed to the runtime on Ctrl+S.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSubmission {
    pub issue: Issue,
    pub dependencies: Vec<String>,
    /// The issue before editing; `None` for a create.
    pub previous: Option<Issue>,
}

#[derive(Debug, Clone)]
pub struct FormState {
    pub mode: FormMode,
    pub values: FormValues,
    pub extended: bool,
    pub focus: FormField,
    pub buffer: TextBuffer,
    pub error: Option<FieldError>,
    /// Submit error reported by the database.
    pub submit_error: Option<String>,
    pub submitting: bool,
}

impl FormState {
    pub fn create(parent: Option<String>) -> Self {
        let values = FormValues {
            parent: parent.unwrap_or_default(),
            ..FormValues::default()
        };
        Self::with(FormMode::Create, values)
    }

    pub fn edit(issue: Issue) -> Self {
        let values = FormValues::from_issue(&issue);
        Self::with(
            FormMode::Edit {
                original: Box::new(issue),
            },
            values,
        )
    }

    fn with(mode: FormMode, values: FormValues) -> Self {
        let buffer = TextBuffer::new(&values.title, false);
        Self {
            mode,
            values,
            extended: false,
            focus: FormField::Title,
            buffer,
            error: None,
            submit_error: None,
            submitting: false,
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit { .. })
    }

    pub fn title(&self) -> String {
        match &self.mode {
            FormMode::Create => "New Issue".to_string(),
            FormMode::Edit { original } => format!("Edit {}", original.id),
        }
    }

    /// Fields shown for the current mode and section.
    pub fn fields(&self) -> Vec<FormField> {
        let edit = self.is_edit();
        let mut fields = vec![FormField::Title, FormField::Type, FormField::Priority];
        if self.extended && edit {
            fields.push(FormField::Status);
        }
        fields.extend([FormField::Description, FormField::Labels, FormField::Parent]);
        if self.extended {
            fields.extend([FormField::Points, FormField::Acceptance]);
            if !edit {
                fields.push(FormField::Dependencies);
            }
            fields.push(FormField::Minor);
        }
        fields
    }

    /// Writes the focused buffer back into the values.
    fn commit_buffer(&mut self) {
        let text = self.buffer.text();
        if let Some(slot) = self.values.text_mut(self.focus) {
            *slot = text;
        }
    }

    fn focus_field(&mut self, field: FormField) {
        self.commit_buffer();
        self.focus = field;
        let text = self.values.text(field).unwrap_or_default().to_string();
        self.buffer = TextBuffer::new(&text, field.kind() == FieldKind::MultiLine);
    }

    fn step_focus(&mut self, forward: bool) {
        let fields = self.fields();
        let idx = fields.iter().position(|&f| f == self.focus).unwrap_or(0);
        let next = if forward {
            (idx + 1) % fields.len()
        } else {
            (idx + fields.len() - 1) % fields.len()
        };
        self.focus_field(fields[next]);
    }

    pub fn toggle_extended(&mut self) {
        self.commit_buffer();
        self.extended = !self.extended;
        let focus = if self.fields().contains(&self.focus) {
            self.focus
        } else {
            FormField::Title
        };
        self.focus_field(focus);
    }

    /// Current values including unsaved buffer edits.
    pub fn snapshot(&self) -> FormValues {
        let mut values = self.values.clone();
        if let Some(slot) = values.text_mut(self.focus) {
            *slot = self.buffer.text();
        }
        values
    }

    /// Replaces a field with text returned by the external editor.
    pub fn set_field_text(&mut self, field: FormField, text: &str) {
        self.commit_buffer();
        if let Some(slot) = self.values.text_mut(field) {
            *slot = text.trim_end_matches('\n').to_string();
        }
        if self.focus == field {
            let value = self.values.text(field).unwrap_or_default().to_string();
            self.buffer = TextBuffer::new(&value, field.kind() == FieldKind::MultiLine);
        }
    }

    /// Bracketed paste into the focused text field.
    pub fn paste(&mut self, text: &str) {
        if matches!(self.focus.kind(), FieldKind::Text | FieldKind::MultiLine) {
            self.buffer.insert_str(text);
        }
    }

    fn cycle_select(&mut self, forward: bool) {
        fn step<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
            let idx = all.iter().position(|&v| v == current).unwrap_or(0);
            let n = all.len();
            all[if forward { (idx + 1) % n } else { (idx + n - 1) % n }]
        }
        match self.focus {
            FormField::Type => {
                self.values.issue_type = step(&IssueType::ALL, self.values.issue_type, forward);
            }
            FormField::Priority => {
                self.values.priority = step(&Priority::ALL, self.values.priority, forward);
            }
            FormField::Status => {
                self.values.status = step(&Status::ALL, self.values.status, forward);
            }
            FormField::Minor => self.values.minor = !self.values.minor,
            _ => {}
        }
    }

    /// Validates and builds the submission, recording any error inline.
    pub fn submission(&mut self, now: DateTime<Utc>) -> Option<FormSubmission> {
        self.commit_buffer();
        let base = match &self.mode {
            FormMode::Create => None,
            FormMode::Edit { original } => Some(original.as_ref()),
        };
        match self.values.to_issue(base, now) {
            Ok(issue) => {
                self.error = None;
                Some(FormSubmission {
                    issue,
                    dependencies: if base.is_none() {
                        self.values.dependency_ids()
                    } else {
                        Vec::new()
                    },
                    previous: base.cloned(),
                })
            }
            Err(err) => {
                if self.fields().contains(&err.field) {
                    self.focus_field(err.field);
                }
                self.error = Some(err);
                None
            }
        }
    }

    pub fn handle_key(&mut self, command: Option<Command>, key: KeyEvent) -> OverlayUpdate {
        match command {
            Some(Command::Cancel) => return OverlayUpdate::close(),
            Some(Command::FormSubmit) => {
                if self.submitting {
                    return OverlayUpdate::stay();
                }
                return match self.submission(Utc::now()) {
                    Some(submission) => {
                        self.submitting = true;
                        self.submit_error = None;
                        OverlayUpdate::stay()
                            .with_ui_effects(vec![UiEffect::SubmitForm(Box::new(submission))])
                    }
                    None => OverlayUpdate::stay(),
                };
            }
            Some(Command::FormToggleExtended) => {
                self.toggle_extended();
                return OverlayUpdate::stay();
            }
            Some(Command::FormEditor) => {
                let field = if self.focus.kind() == FieldKind::MultiLine {
                    self.focus
                } else {
                    FormField::Description
                };
                self.commit_buffer();
                let content = self.values.text(field).unwrap_or_default().to_string();
                return OverlayUpdate::stay()
                    .with_ui_effects(vec![UiEffect::OpenEditor { field, content }]);
            }
            Some(Command::FormNextField) => {
                self.step_focus(true);
                return OverlayUpdate::stay();
            }
            Some(Command::FormPrevField) => {
                self.step_focus(false);
                return OverlayUpdate::stay();
            }
            _ => {}
        }

        match self.focus.kind() {
            FieldKind::Select | FieldKind::Toggle => match key.code {
                KeyCode::Left => self.cycle_select(false),
                KeyCode::Right | KeyCode::Char(' ') => self.cycle_select(true),
                _ => {}
            },
            FieldKind::Text | FieldKind::MultiLine => {
                if self.buffer.input(key) && self.error.as_ref().is_some_and(|e| e.field == self.focus) {
                    self.error = None;
                }
            }
        }
        OverlayUpdate::stay()
    }
}
