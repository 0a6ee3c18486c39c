//! `+`-only sum formulas over column names and numeric literals.
//!
//! A formula such as `Doanh thu + Tiền thuế + 100` is split on `+`; each
//! trimmed token resolves to a column of the table (non-numeric cells count
//! as zero) or, failing that, to a numeric constant. A token that is neither
//! makes the whole formula missing for every row. A blank token, as in
//! `Doanh thu +` or an empty formula, is neither.

use log::debug;

use crate::{
    data::{Value, parse_number},
    table::Table,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SumTerm {
    Column(usize),
    Constant(f64),
}

/// Resolves every token of `expression` against the table header.
///
/// Returns `None` as soon as one token is blank or unknown.
pub fn parse_sum(table: &Table, expression: &str) -> Option<Vec<SumTerm>> {
    let mut terms = Vec::new();
    for token in expression.split('+').map(str::trim) {
        let term = match table.column_index(token) {
            Some(idx) => SumTerm::Column(idx),
            None => match parse_number(token) {
                Some(constant) => SumTerm::Constant(constant),
                None => {
                    debug!("Formula '{expression}' references unknown token '{token}'");
                    return None;
                }
            },
        };
        terms.push(term);
    }
    Some(terms)
}

/// Evaluates the formula per row: `Value::Number` sums, or `Value::Empty`
/// everywhere when the formula does not resolve.
pub fn evaluate_sum(table: &Table, expression: &str) -> Vec<Value> {
    let Some(terms) = parse_sum(table, expression) else {
        return vec![Value::Empty; table.len()];
    };
    table
        .rows()
        .iter()
        .map(|row| {
            let total = terms.iter().fold(0.0, |acc, term| {
                acc + match term {
                    SumTerm::Column(idx) => row[*idx].to_number_or_zero(),
                    SumTerm::Constant(constant) => *constant,
                }
            });
            Value::Number(total)
        })
        .collect()
}
