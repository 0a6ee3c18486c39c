use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use log::debug;
use uuid::Uuid;

use crate::{compare::compare, error::RemapError, table::Table};

/// Id given to the filter created automatically on import.
pub const DEFAULT_FILTER_ID: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    Contains,
    NotContains,
    BeginsWith,
    NotBeginsWith,
    EndsWith,
    NotEndsWith,
}

impl ComparisonOperator {
    pub const ALL: [ComparisonOperator; 12] = [
        ComparisonOperator::Eq,
        ComparisonOperator::NotEq,
        ComparisonOperator::Lt,
        ComparisonOperator::Gt,
        ComparisonOperator::Le,
        ComparisonOperator::Ge,
        ComparisonOperator::Contains,
        ComparisonOperator::NotContains,
        ComparisonOperator::BeginsWith,
        ComparisonOperator::NotBeginsWith,
        ComparisonOperator::EndsWith,
        ComparisonOperator::NotEndsWith,
    ];

    pub fn as_str(self) -> &'static str {
        use ComparisonOperator::*;
        match self {
            Eq => "=",
            NotEq => "!=",
            Lt => "<",
            Gt => ">",
            Le => "<=",
            Ge => ">=",
            Contains => "contains",
            NotContains => "not contains",
            BeginsWith => "begins with",
            NotBeginsWith => "not begins with",
            EndsWith => "ends with",
            NotEndsWith => "not ends with",
        }
    }

    /// Equality and ordering operators; these may compare as dates or numbers.
    pub fn is_ordering(self) -> bool {
        use ComparisonOperator::*;
        matches!(self, Eq | NotEq | Lt | Gt | Le | Ge)
    }

    pub fn is_negated(self) -> bool {
        use ComparisonOperator::*;
        matches!(self, NotContains | NotBeginsWith | NotEndsWith)
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonOperator {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        ComparisonOperator::ALL
            .into_iter()
            .find(|op| op.as_str() == wanted)
            .ok_or_else(|| anyhow!("Unknown filter operator '{s}'"))
    }
}

/// One `column operator literal` predicate. Filters in a list are ANDed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub id: String,
    pub column: String,
    pub operator: ComparisonOperator,
    pub value: String,
}

impl Filter {
    /// A fresh `column = ""` filter with a random id.
    pub fn new(column: impl Into<String>) -> Self {
        Filter {
            id: Uuid::new_v4().to_string(),
            column: column.into(),
            operator: ComparisonOperator::Eq,
            value: String::new(),
        }
    }

    pub fn with_condition(
        column: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<String>,
    ) -> Self {
        Filter {
            operator,
            value: value.into(),
            ..Filter::new(column)
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} '{}'", self.column, self.operator, self.value)
    }
}

pub fn parse_filters(filters: &[String]) -> Result<Vec<Filter>> {
    filters.iter().map(|f| parse_filter(f)).collect()
}

fn parse_filter(filter: &str) -> Result<Filter> {
    let trimmed = filter.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Empty filter expression"));
    }

    // The earliest operator wins; at a shared position the longer one does,
    // so "not contains" beats "contains" and ">=" beats ">".
    let lowered = trimmed.to_ascii_lowercase();
    let (idx, len, op) = ComparisonOperator::ALL
        .into_iter()
        .filter_map(|op| {
            if op.is_ordering() {
                trimmed.find(op.as_str()).map(|idx| (idx, op.as_str().len(), op))
            } else {
                let needle = format!(" {} ", op.as_str());
                lowered.find(&needle).map(|idx| (idx, needle.len(), op))
            }
        })
        .min_by_key(|(idx, len, _)| (*idx, Reverse(*len)))
        .ok_or_else(|| anyhow!("Failed to parse filter expression '{trimmed}'"))?;

    let left = trimmed[..idx].trim();
    let right = trimmed[idx + len..].trim();
    if left.is_empty() {
        return Err(anyhow!("Filter expression '{trimmed}' is missing a column"));
    }
    Ok(Filter::with_condition(left, op, unquote(right)))
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Row mask for the AND of all filters; an empty list keeps every row.
pub fn filter_mask(table: &Table, filters: &[Filter]) -> Result<Vec<bool>, RemapError> {
    let mut mask = vec![true; table.len()];
    for filter in filters {
        let values = table
            .column(&filter.column)
            .ok_or_else(|| RemapError::UnknownColumn {
                column: filter.column.clone(),
            })?;
        let hits = compare(&values, filter.operator, &filter.value);
        for (keep, hit) in mask.iter_mut().zip(hits) {
            *keep &= hit;
        }
        debug!(
            "Filter {filter} leaves {} of {} row(s)",
            mask.iter().filter(|keep| **keep).count(),
            table.len()
        );
    }
    Ok(mask)
}

pub fn apply_filters(table: &Table, filters: &[Filter]) -> Result<Table, RemapError> {
    if filters.is_empty() {
        return Ok(table.clone());
    }
    let mask = filter_mask(table, filters)?;
    Ok(table.select_rows(&mask))
}
