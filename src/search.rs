// Substring search predicate for command history

use crate::error::{Result, StoreError};

/// How the search pattern is compared against command text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaseMode {
    #[default]
    Sensitive,
    /// ASCII case folding, the same folding SQLite's LIKE applies
    Insensitive,
}

impl CaseMode {
    pub fn from_sensitive(sensitive: bool) -> Self {
        if sensitive { CaseMode::Sensitive } else { CaseMode::Insensitive }
    }
}

/// A validated substring search over the `command` column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pattern: String,
    limit: i64,
    case: CaseMode,
}

impl SearchQuery {
    /// Rejects negative limits. A limit of zero is valid and yields nothing.
    pub fn new(pattern: impl Into<String>, limit: i64) -> Result<Self> {
        if limit < 0 {
            return Err(StoreError::invalid(format!("limit must not be negative: {}", limit)));
        }
        Ok(Self {
            pattern: pattern.into(),
            limit,
            case: CaseMode::default(),
        })
    }

    pub fn case(mut self, case: CaseMode) -> Self {
        self.case = case;
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn case_mode(&self) -> CaseMode {
        self.case
    }

    /// WHERE fragment and its bound parameter; `None` means every record matches
    pub(crate) fn to_sql(&self) -> Option<(&'static str, String)> {
        if self.pattern.is_empty() {
            return None;
        }
        match self.case {
            CaseMode::Sensitive => Some(("instr(command, ?1) > 0", self.pattern.clone())),
            CaseMode::Insensitive => Some((
                "command LIKE ?1 ESCAPE '\\'",
                format!("%{}%", escape_like(&self.pattern)),
            )),
        }
    }
}

fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
