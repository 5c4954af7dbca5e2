//! Task query language used by ranked search.
//!
//! A query is a whitespace-separated list of tokens:
//!
//! - `key=value` filters exactly on `type`, `status`, `priority`, `label`
//!   or `parent` (case-insensitive)
//! - `sort:<created|updated|priority>` orders results, a leading `-` on the
//!   field reverses it
//! - anything else is a free term; every free term must appear in the ID,
//!   title, description or labels
//!
//! Double quotes group words into one free term.

use std::cmp::Ordering;

use td_types::{Issue, IssueType, Priority, Status};

use super::SortField;

const RANK_ID: u32 = 3;
const RANK_TITLE: u32 = 2;
const RANK_BODY: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Type(Option<IssueType>),
    Status(Option<Status>),
    Priority(Option<Priority>),
    Label(String),
    Parent(String),
}

impl Filter {
    fn parse(key: &str, value: &str) -> Option<Self> {
        let filter = match key.to_ascii_lowercase().as_str() {
            "type" => Filter::Type(value.parse().ok()),
            "status" => Filter::Status(value.parse().ok()),
            "priority" => Filter::Priority(value.parse().ok()),
            "label" => Filter::Label(value.to_lowercase()),
            "parent" => Filter::Parent(value.to_string()),
            _ => return None,
        };
        Some(filter)
    }

    /// Unknown values (e.g. `type=nope`) match nothing.
    fn matches(&self, issue: &Issue) -> bool {
        match self {
            Filter::Type(t) => *t == Some(issue.issue_type),
            Filter::Status(s) => *s == Some(issue.status),
            Filter::Priority(p) => *p == Some(issue.priority),
            Filter::Label(l) => issue.labels.iter().any(|x| x.to_lowercase() == *l),
            Filter::Parent(p) => issue
                .parent_id
                .as_deref()
                .is_some_and(|id| id.eq_ignore_ascii_case(p)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortClause {
    pub field: SortField,
    pub desc: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    pub filters: Vec<Filter>,
    pub sort: Option<SortClause>,
    pub terms: Vec<String>,
}

impl ParsedQuery {
    pub fn parse(query: &str) -> Self {
        let mut parsed = ParsedQuery::default();
        for token in tokenize(query) {
            if let Some(spec) = token.strip_prefix("sort:")
                && let Some(clause) = parse_sort(spec)
            {
                parsed.sort = Some(clause);
                continue;
            }
            if let Some((key, value)) = token.split_once('=')
                && !value.is_empty()
                && let Some(filter) = Filter::parse(key, value)
            {
                parsed.filters.push(filter);
                continue;
            }
            parsed.terms.push(token.to_lowercase());
        }
        parsed
    }

    /// Returns the rank of `issue`, or `None` if it does not match.
    pub fn rank(&self, issue: &Issue) -> Option<u32> {
        if !self.filters.iter().all(|f| f.matches(issue)) {
            return None;
        }
        let mut total = 0;
        for term in &self.terms {
            total += term_rank(issue, term)?;
        }
        Some(total)
    }
}

fn term_rank(issue: &Issue, term: &str) -> Option<u32> {
    if issue.id.to_lowercase().contains(term) {
        Some(RANK_ID)
    } else if issue.title.to_lowercase().contains(term) {
        Some(RANK_TITLE)
    } else if issue.description.to_lowercase().contains(term)
        || issue.labels.iter().any(|l| l.to_lowercase().contains(term))
    {
        Some(RANK_BODY)
    } else {
        None
    }
}

fn parse_sort(spec: &str) -> Option<SortClause> {
    let (desc, field) = match spec.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, spec),
    };
    SortField::parse(field).map(|field| SortClause { field, desc })
}

fn tokenize(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in query.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Orders two issues by `field`. Ties fall back to the ID so the order is
/// total.
pub fn compare_issues(a: &Issue, b: &Issue, field: SortField, desc: bool) -> Ordering {
    let primary = match field {
        SortField::Priority => a.priority.cmp(&b.priority),
        SortField::Created => a.created_at.cmp(&b.created_at),
        SortField::Updated => a.updated_at.cmp(&b.updated_at),
    };
    let primary = if desc { primary.reverse() } else { primary };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn issue(id: &str, title: &str) -> Issue {
        Issue::new(id, title, Utc::now())
    }

    #[test]
    fn test_parse_splits_filters_sort_and_terms() {
        let q = ParsedQuery::parse("login type=bug sort:-created \"two words\"");
        assert_eq!(q.filters, vec![Filter::Type(Some(IssueType::Bug))]);
        assert_eq!(
            q.sort,
            Some(SortClause {
                field: SortField::Created,
                desc: true
            })
        );
        assert_eq!(q.terms, vec!["login", "two words"]);
    }

    #[test]
    fn test_rank_prefers_id_then_title_then_body() {
        let mut a = issue("td-login", "other");
        a.description = "nothing".into();
        let b = issue("td-2", "Fix login");
        let mut c = issue("td-3", "other");
        c.labels = vec!["login-flow".into()];

        let q = ParsedQuery::parse("login");
        assert_eq!(q.rank(&a), Some(3));
        assert_eq!(q.rank(&b), Some(2));
        assert_eq!(q.rank(&c), Some(1));
        assert_eq!(q.rank(&issue("td-4", "nope")), None);
    }

    #[test]
    fn test_all_terms_must_match() {
        let i = issue("td-1", "Fix login page");
        assert!(ParsedQuery::parse("login page").rank(&i).is_some());
        assert!(ParsedQuery::parse("login signup").rank(&i).is_none());
    }

    #[test]
    fn test_unknown_filter_value_matches_nothing() {
        let i = issue("td-1", "x");
        assert!(ParsedQuery::parse("type=nope").rank(&i).is_none());
        assert!(ParsedQuery::parse("status=open").rank(&i).is_some());
    }

    #[test]
    fn test_unknown_key_is_a_free_term() {
        let q = ParsedQuery::parse("owner=me");
        assert!(q.filters.is_empty());
        assert_eq!(q.terms, vec!["owner=me"]);
    }
}
