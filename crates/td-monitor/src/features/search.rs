//! Search query, sort mode and type filter.
//!
//! The query is the single source of truth sent to the database. Sort and
//! type-filter cycling rewrite their clause inside it: old clauses are
//! removed, other tokens keep their order, and the new clause is appended.

use td_core::SortField;
use td_types::IssueType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Priority,
    CreatedDesc,
    UpdatedDesc,
}

impl SortMode {
    pub fn next(self) -> Self {
        match self {
            SortMode::Priority => SortMode::CreatedDesc,
            SortMode::CreatedDesc => SortMode::UpdatedDesc,
            SortMode::UpdatedDesc => SortMode::Priority,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::Priority => "priority",
            SortMode::CreatedDesc => "created",
            SortMode::UpdatedDesc => "updated",
        }
    }

    /// Clause written into the query. Priority is the database default.
    pub fn clause(self) -> Option<&'static str> {
        match self {
            SortMode::Priority => None,
            SortMode::CreatedDesc => Some("sort:-created"),
            SortMode::UpdatedDesc => Some("sort:-updated"),
        }
    }

    /// Field and direction for ordering category lists.
    pub fn order(self) -> (SortField, bool) {
        match self {
            SortMode::Priority => (SortField::Priority, false),
            SortMode::CreatedDesc => (SortField::Created, true),
            SortMode::UpdatedDesc => (SortField::Updated, true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    None,
    Epic,
    Task,
    Bug,
    Feature,
    Chore,
}

impl TypeFilter {
    pub fn next(self) -> Self {
        match self {
            TypeFilter::None => TypeFilter::Epic,
            TypeFilter::Epic => TypeFilter::Task,
            TypeFilter::Task => TypeFilter::Bug,
            TypeFilter::Bug => TypeFilter::Feature,
            TypeFilter::Feature => TypeFilter::Chore,
            TypeFilter::Chore => TypeFilter::None,
        }
    }

    pub fn issue_type(self) -> Option<IssueType> {
        match self {
            TypeFilter::None => None,
            TypeFilter::Epic => Some(IssueType::Epic),
            TypeFilter::Task => Some(IssueType::Task),
            TypeFilter::Bug => Some(IssueType::Bug),
            TypeFilter::Feature => Some(IssueType::Feature),
            TypeFilter::Chore => Some(IssueType::Chore),
        }
    }

    pub fn label(self) -> &'static str {
        self.issue_type().map_or("all", IssueType::as_str)
    }

    pub fn clause(self) -> Option<String> {
        self.issue_type().map(|t| format!("type={}", t.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub query: String,
    /// Typing goes into the query.
    pub editing: bool,
    pub sort: SortMode,
    pub type_filter: TypeFilter,
}

impl SearchState {
    pub fn bar_visible(&self) -> bool {
        self.editing || !self.query.is_empty()
    }

    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
        self.query = rewrite_clause(&self.query, is_sort_token, self.sort.clause());
    }

    pub fn cycle_type_filter(&mut self) {
        self.type_filter = self.type_filter.next();
        let clause = self.type_filter.clause();
        self.query = rewrite_clause(&self.query, is_type_token, clause.as_deref());
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.editing = false;
        self.sort = SortMode::default();
        self.type_filter = TypeFilter::default();
    }
}

fn is_sort_token(token: &str) -> bool {
    token.to_ascii_lowercase().starts_with("sort:")
}

fn is_type_token(token: &str) -> bool {
    token
        .split_once('=')
        .is_some_and(|(key, _)| key.eq_ignore_ascii_case("type"))
}

/// Drops tokens matching `is_clause` and appends `clause`.
pub fn rewrite_clause(query: &str, is_clause: fn(&str) -> bool, clause: Option<&str>) -> String {
    let mut tokens: Vec<&str> = query.split_whitespace().filter(|t| !is_clause(t)).collect();
    if let Some(clause) = clause {
        tokens.push(clause);
    }
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_sort_rewrites_clause() {
        let mut s = SearchState {
            query: "login sort:created bug".into(),
            ..SearchState::default()
        };
        s.cycle_sort();
        assert_eq!(s.sort, SortMode::CreatedDesc);
        assert_eq!(s.query, "login bug sort:-created");
        s.cycle_sort();
        assert_eq!(s.query, "login bug sort:-updated");
        s.cycle_sort();
        assert_eq!(s.query, "login bug");
    }

    #[test]
    fn test_three_sorts_and_six_filters_restore_query() {
        let mut s = SearchState {
            query: "fix  label=ui".into(),
            ..SearchState::default()
        };
        for _ in 0..3 {
            s.cycle_sort();
        }
        for _ in 0..6 {
            s.cycle_type_filter();
        }
        assert_eq!(s.query, "fix label=ui");
        assert_eq!(s.sort, SortMode::Priority);
        assert_eq!(s.type_filter, TypeFilter::None);
    }

    #[test]
    fn test_type_filter_replaces_existing_type() {
        let mut s = SearchState {
            query: "TYPE=bug x".into(),
            ..SearchState::default()
        };
        s.cycle_type_filter();
        assert_eq!(s.query, "x type=epic");
        assert_eq!(s.type_filter.label(), "epic");
    }

    #[test]
    fn test_bar_visibility() {
        let mut s = SearchState::default();
        assert!(!s.bar_visible());
        s.editing = true;
        assert!(s.bar_visible());
        s.editing = false;
        s.query = "x".into();
        assert!(s.bar_visible());
        s.clear();
        assert!(!s.bar_visible());
    }
}
