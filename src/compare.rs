//! Per-comparison type inference for filter predicates.
//!
//! Financial exports store dates, amounts and free text alike as plain
//! strings, so the reading of a column is chosen per comparison: day-first
//! dates first, then numbers, then strings.

use std::cmp::Ordering;

use crate::data::{Value, parse_day_first, parse_number};
use crate::filter::ComparisonOperator;

/// Evaluates `operator literal` against every value, one flag per row.
pub fn compare(values: &[&Value], operator: ComparisonOperator, literal: &str) -> Vec<bool> {
    if operator.is_ordering() {
        if let Some(mask) = compare_dates(values, operator, literal) {
            return mask;
        }
        if let Some(target) = parse_number(literal) {
            return values
                .iter()
                .map(|value| {
                    value
                        .to_number()
                        .and_then(|number| number.partial_cmp(&target))
                        .is_some_and(|ordering| operator.accepts(ordering))
                })
                .collect();
        }
    }
    compare_strings(values, operator, literal)
}

fn compare_dates(
    values: &[&Value],
    operator: ComparisonOperator,
    literal: &str,
) -> Option<Vec<bool>> {
    let target = parse_day_first(literal)?;
    let parsed = values.iter().map(|v| v.to_datetime()).collect::<Vec<_>>();
    if parsed.iter().all(Option::is_none) {
        return None;
    }
    Some(
        parsed
            .into_iter()
            .map(|date| date.is_some_and(|date| operator.accepts(date.cmp(&target))))
            .collect(),
    )
}

fn compare_strings(values: &[&Value], operator: ComparisonOperator, literal: &str) -> Vec<bool> {
    use ComparisonOperator::*;
    let folded_literal = literal.to_lowercase();
    values
        .iter()
        .map(|value| {
            let text = value.as_display();
            match operator {
                Eq | NotEq | Lt | Gt | Le | Ge => operator.accepts(text.as_str().cmp(literal)),
                Contains | NotContains | BeginsWith | NotBeginsWith | EndsWith | NotEndsWith => {
                    let folded = text.to_lowercase();
                    let hit = match operator {
                        Contains | NotContains => folded.contains(&folded_literal),
                        BeginsWith | NotBeginsWith => folded.starts_with(&folded_literal),
                        _ => folded.ends_with(&folded_literal),
                    };
                    hit != operator.is_negated()
                }
            }
        })
        .collect()
}

impl ComparisonOperator {
    /// Whether an ordering between cell and literal satisfies this operator.
    fn accepts(self, ordering: Ordering) -> bool {
        use ComparisonOperator::*;
        match self {
            Eq => ordering == Ordering::Equal,
            NotEq => ordering != Ordering::Equal,
            Lt => ordering == Ordering::Less,
            Gt => ordering == Ordering::Greater,
            Le => ordering != Ordering::Greater,
            Ge => ordering != Ordering::Less,
            _ => false,
        }
    }
}
